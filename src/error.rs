// Query error taxonomy. Validation errors are raised before any SQL is issued.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("unknown sensor '{name}'; valid sensors: {}", .valid.join(", "))]
    UnknownSensor { name: String, valid: Vec<String> },

    #[error("unknown range '{key}'; valid ranges: {}", .valid.join(", "))]
    UnknownRange { key: String, valid: Vec<String> },

    #[error("data source error: {0}")]
    DataSource(#[from] sqlx::Error),
}

impl QueryError {
    /// True for caller-correctable input errors (400-class).
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            QueryError::UnknownSensor { .. } | QueryError::UnknownRange { .. }
        )
    }
}
