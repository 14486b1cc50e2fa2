//! Error types for the `domain` layer.
use std::error::Error as StdError;
use std::fmt;

/// Top-level domain error type.
/// Errors in the Domain layer are modeled as a tree structure with
/// `domain::error::Error` as the root type holding a tree of `error_kind`
/// enums. The `source` field holds the original error that caused the domain
/// error. `web` uses the `error_kind`s to pick HTTP status codes without
/// depending on the crates that produced the underlying errors.
///
/// Per-subscription push failures are not errors at this level: the fan-out
/// records them as `DeliveryOutcome` values so one endpoint never aborts
/// the others.
#[derive(Debug)]
pub struct Error {
    pub source: Option<Box<dyn StdError + Send + Sync>>,
    pub error_kind: DomainErrorKind,
}

/// Enum representing the major categories of errors that can occur in the `domain` layer.
#[derive(Debug, PartialEq)]
pub enum DomainErrorKind {
    Internal(InternalErrorKind),
    External(ExternalErrorKind),
}

/// Enum representing the various kinds of internal errors that can occur in the `domain` layer.
#[derive(Debug, PartialEq)]
pub enum InternalErrorKind {
    /// Missing or invalid configuration (e.g. a zero alert threshold).
    Config,
    /// Caller supplied a value the domain refuses (e.g. a blank nickname).
    Invalid(String),
    Other(String),
}

/// Enum representing the various kinds of external errors that can occur in the `domain` layer.
#[derive(Debug, PartialEq)]
pub enum ExternalErrorKind {
    Network,
    Other(String),
}

impl Error {
    pub fn config(message: impl Into<String>) -> Self {
        let message: String = message.into();
        Error {
            source: Some(message.into()),
            error_kind: DomainErrorKind::Internal(InternalErrorKind::Config),
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Error {
            source: None,
            error_kind: DomainErrorKind::Internal(InternalErrorKind::Invalid(message.into())),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Domain Error: {self:?}")
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn StdError + 'static))
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        // Errors that result from issues building the reqwest::Client instance. This
        // type of error will occur prior to any network calls being made.
        if err.is_builder() {
            Error {
                source: Some(Box::new(err)),
                error_kind: DomainErrorKind::Internal(InternalErrorKind::Other(
                    "Failed to build reqwest client".to_string(),
                )),
            }
        // Errors that result from issues with the network call itself.
        } else {
            Error {
                source: Some(Box::new(err)),
                error_kind: DomainErrorKind::External(ExternalErrorKind::Network),
            }
        }
    }
}

impl From<web_push::WebPushError> for Error {
    fn from(err: web_push::WebPushError) -> Self {
        Error {
            source: Some(Box::new(err)),
            error_kind: DomainErrorKind::Internal(InternalErrorKind::Other(
                "Failed to build web push message".to_string(),
            )),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error {
            source: Some(Box::new(err)),
            error_kind: DomainErrorKind::Internal(InternalErrorKind::Other(
                "File system error".to_string(),
            )),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error {
            source: Some(Box::new(err)),
            error_kind: DomainErrorKind::Internal(InternalErrorKind::Other(
                "JSON encoding related error".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_keeps_its_message_as_source() {
        let err = Error::config("alert threshold must be at least 1");
        assert_eq!(
            err.error_kind,
            DomainErrorKind::Internal(InternalErrorKind::Config)
        );
        assert_eq!(
            StdError::source(&err).map(|s| s.to_string()),
            Some("alert threshold must be at least 1".to_string())
        );
    }

    #[test]
    fn io_errors_map_to_internal_other() {
        let err: Error = std::io::Error::new(std::io::ErrorKind::Other, "disk").into();
        assert!(matches!(
            err.error_kind,
            DomainErrorKind::Internal(InternalErrorKind::Other(_))
        ));
    }
}
