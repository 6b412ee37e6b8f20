use dairyops_storage::StoreError;
use thiserror::Error;

/// Failures shown as a single banner. None of them block a retry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeneralError {
    #[error("authentication required: {0}")]
    Unauthenticated(String),

    #[error("not permitted: {0}")]
    Forbidden(String),

    /// The target of an update or delete no longer exists.
    #[error("{kind} record {id} no longer exists")]
    NotFound { kind: String, id: String },

    #[error("network error: {0}")]
    Network(String),

    #[error("unexpected store error: {0}")]
    Unexpected(String),
}

impl From<StoreError> for GeneralError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Unauthenticated(msg) => GeneralError::Unauthenticated(msg),
            StoreError::Forbidden(msg) => GeneralError::Forbidden(msg),
            StoreError::NotFound { kind, id } => GeneralError::NotFound { kind, id },
            StoreError::Network(msg) => GeneralError::Network(msg),
            // Field errors only make sense next to a form.
            StoreError::Rejected(errors) => GeneralError::Unexpected(errors.to_string()),
            StoreError::Unexpected { status, message } => {
                GeneralError::Unexpected(format!("status {}: {}", status, message))
            }
        }
    }
}
