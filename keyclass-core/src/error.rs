use thiserror::Error;

/// Errors surfaced by the classification service and its collaborators.
///
/// The tokenizer and classifier never produce these; they are total over
/// their inputs. Everything here originates in storage, dictionary loading,
/// text extraction or input validation.
#[derive(Debug, Error)]
pub enum KeyclassError {
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid dictionary: {0}")]
    InvalidDictionary(String),

    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("text extraction failed: {0}")]
    ExtractionError(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("sqlite error: {0}")]
    Database(#[from] rusqlite::Error),
}

impl KeyclassError {
    pub fn not_found(kind: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    /// True for failures caused by the caller's input rather than the system.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::NotFound { .. }
                | Self::InvalidInput(_)
                | Self::InvalidDictionary(_)
                | Self::UnsupportedFormat(_)
                | Self::ExtractionError(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, KeyclassError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_message_names_kind_and_id() {
        let err = KeyclassError::not_found("document", "abc");
        assert_eq!(err.to_string(), "document not found: abc");
        assert!(err.is_client_error());
    }

    #[test]
    fn io_errors_are_not_client_errors() {
        let err: KeyclassError =
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied").into();
        assert!(!err.is_client_error());
    }
}
