//! HTTP API handlers for gradebook-api

pub mod access;
pub mod account;
pub mod analysis;
pub mod auth;
pub mod billing;
pub mod children;
pub mod grades;
pub mod health;
pub mod reports;

pub use account::{get_account, register_account};
pub use analysis::request_analysis;
pub use auth::{auth_middleware, AuthUser};
pub use billing::{billing_webhook, link_subscription};
pub use children::{child_average, create_child, get_child, list_children};
pub use grades::{create_grade, delete_grade, list_grades, update_grade};
pub use health::health_routes;
pub use reports::{create_report, list_reports};
