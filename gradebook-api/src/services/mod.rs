//! Services behind the HTTP handlers

pub mod analysis;
pub mod llm;

pub use analysis::{
    AnalysisError, AnalysisGateway, AnalysisOutcome, AnalysisReport, CompletedAnalysis,
};
pub use llm::{LlmBackend, LlmError};
