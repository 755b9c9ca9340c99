//! API module for shared HTTP API functionality
//!
//! # Design Principle
//!
//! This module contains ONLY:
//! - Pure functions (no HTTP framework dependencies)
//! - Identity verification behind the [`IdentityVerifier`] trait
//! - Shared wire types
//!
//! The service wraps these with framework-specific middleware (Axum).

pub mod auth;
pub mod signature;
pub mod types;

pub use auth::{extract_bearer_token, AuthError, Claims, IdentityVerifier, JwtVerifier};
pub use signature::{calculate_signature, validate_signature, SignatureError};
pub use types::{ErrorDetail, ErrorResponse};
