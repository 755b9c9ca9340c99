//! Record store queries
//!
//! One module per table. Every query returns [`gradebook_common::Result`];
//! listings are newest first.

pub mod children;
pub mod grades;
pub mod reports;
pub mod users;

pub use children::NewChild;
pub use grades::{GradeUpdate, NewGrade};
