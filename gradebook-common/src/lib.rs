//! # Gradebook Common Library
//!
//! Shared code for the Gradebook service including:
//! - Record types (users, children, grades, AI reports) and database setup
//! - Grade averaging
//! - Plan limits
//! - Ownership checks
//! - Bearer credential verification and webhook signatures
//! - Configuration loading

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod grades;
pub mod ownership;
pub mod plan;
pub mod time;

pub use error::{Error, Result};
pub use grades::{average, GradeSample};
pub use ownership::{check_ownership, guard, NotFoundOrForbidden, Owned, Ownership};
pub use plan::{max_children, Plan};
