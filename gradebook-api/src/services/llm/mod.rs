//! Language-model backends
//!
//! [`LlmBackend`] is the seam between the analysis gateway and the hosted
//! model. [`OpenAiBackend`] talks to any OpenAI-compatible
//! `/chat/completions` endpoint; [`MockBackend`] serves canned replies to
//! tests.

pub mod mock;
pub mod openai;
pub mod traits;

pub use mock::MockBackend;
pub use openai::OpenAiBackend;
pub use traits::*;
