use thiserror::Error;
use tracing::{error, warn};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl StoreError {
    pub fn log(&self, ctx: &str) {
        let message = self.to_string();
        match self {
            StoreError::Database(err) => {
                error!(error = %message, context = %ctx, db_error = %err, "Database error");
            }
            StoreError::Conflict(msg) => {
                warn!(message = %msg, context = %ctx, "Conflict");
            }
            StoreError::NotFound(msg) => {
                warn!(message = %msg, context = %ctx, "Not found");
            }
            StoreError::Serialization(err) => {
                error!(error = %message, context = %ctx, serde_error = %err, "Serialization error");
            }
            StoreError::Internal(msg) => {
                error!(message = %msg, context = %ctx, "Internal error");
            }
        }
    }
}

impl From<std::io::Error> for StoreError {
    fn from(error: std::io::Error) -> Self {
        StoreError::Internal(format!("I/O error: {}", error))
    }
}
