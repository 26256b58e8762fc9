use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl AppError {
    /// Log the error and hand it back, for use at the edge of a call chain.
    pub fn logged(self) -> Self {
        tracing::error!("{}", self);
        self
    }

    pub fn is_input_error(&self) -> bool {
        matches!(self, AppError::Validation(_) | AppError::Serialization(_))
    }
}
