use serde::Serialize;
use tracing::error;

use crate::domain::entities::form::{MissingFormColumns, SubmissionError};
use crate::domain::entities::kanban::MissingTaskColumns;
use crate::usecase::ports::row_store::StoreError;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ActionError {
    /// Input rejected before touching the store.
    #[error("{0}")]
    Invalid(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    MissingColumn(String),
    #[error(transparent)]
    Submission(#[from] SubmissionError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ActionError {
    pub fn invalid(message: impl Into<String>) -> Self {
        ActionError::Invalid(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ActionError::NotFound(message.into())
    }

    pub fn missing_column(message: impl Into<String>) -> Self {
        ActionError::MissingColumn(message.into())
    }
}

impl From<MissingTaskColumns> for ActionError {
    fn from(err: MissingTaskColumns) -> Self {
        ActionError::MissingColumn(err.to_string())
    }
}

impl From<MissingFormColumns> for ActionError {
    fn from(err: MissingFormColumns) -> Self {
        ActionError::MissingColumn(err.to_string())
    }
}

pub type ActionResult<T> = Result<T, ActionError>;

/// What a caller gets back from any action: `{ "success": false, "error": ... }`
/// on failure, `{ "success": true, "data": ... }` otherwise.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl ActionOutcome {
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(message.into()),
            data: None,
        }
    }

    pub fn with_data<T: Serialize>(data: &T) -> Self {
        match serde_json::to_value(data) {
            Ok(serde_json::Value::Null) => Self {
                success: true,
                error: None,
                data: None,
            },
            Ok(value) => Self {
                success: true,
                error: None,
                data: Some(value),
            },
            Err(err) => Self::failure(format!("failed to encode result: {err}")),
        }
    }

    /// Logs failures under the action name and flattens the result.
    pub fn from_result<T: Serialize>(action: &str, result: ActionResult<T>) -> Self {
        match result {
            Ok(data) => Self::with_data(&data),
            Err(err) => {
                error!(action, error = %err, "action failed");
                Self::failure(err.to_string())
            }
        }
    }
}
