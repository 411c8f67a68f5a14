use thiserror::Error;

use crate::documents::PatchError;
use crate::llm_client::LlmError;

/// Application-level error type.
/// `main` turns it into a process exit code via [`AppError::exit_code`].
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// One or more template documents could not be updated.
    #[error("Template update failed: {0}")]
    Mutation(String),

    #[error("PDF compilation failed")]
    Compile,

    #[error("Template pattern error: {0}")]
    Pattern(#[from] PatchError),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// 2 for problems the user fixes in config or environment, 1 for run failures.
    pub fn exit_code(&self) -> u8 {
        match self {
            AppError::Configuration(_) | AppError::Authentication(_) | AppError::Pattern(_) => 2,
            _ => 1,
        }
    }
}
