//! Error types for the deposit-insurance assistant

use thiserror::Error;

/// Result type alias for assistant operations
pub type Result<T> = std::result::Result<T, AssistantError>;

#[derive(Error, Debug)]
pub enum AssistantError {

    // =============================
    // Core Pipeline Errors
    // =============================

    /// Calculator found no monetary amounts in a limit_calc question.
    /// Surfaced to the pipeline so it can ask for clarification.
    #[error("Parse failure: {0}")]
    ParseFailure(String),

    /// LLM collaborator rejected the request or errored. Triggers the rules
    /// fallback, after a single attempt against the fallback model.
    #[error("LLM unavailable: {0}")]
    LlmUnavailable(String),

    /// LLM transport timeout. Goes straight to the rules fallback; the
    /// fallback model is never tried so total latency stays bounded by one
    /// timeout.
    #[error("LLM timeout: {0}")]
    LlmTimeout(String),

    /// LLM returned an intent outside the fixed catalog.
    #[error("Out-of-catalog intent from LLM: {0}")]
    OutOfCatalog(String),

    /// Knowledge base failed to load or a policy key did not resolve.
    /// Only produced at startup.
    #[error("Knowledge base error: {0}")]
    KnowledgeBase(String),

    #[error("Configuration error: {0}")]
    Config(String),

    // =============================
    // External Library Conversions
    // =============================

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("HTTP client error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}
