//! Error types for rubrica

use thiserror::Error;

/// Result type alias using our custom Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Infrastructure errors: configuration, files and spreadsheets.
///
/// Grading problems are not reported through this type; see [`GradingError`].
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Spreadsheet error: {0}")]
    Spreadsheet(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Everything that can go wrong between sending a prompt and holding a
/// decoded reply.
///
/// The evaluator turns these into an [`EvaluationFailure`](crate::EvaluationFailure)
/// value; they never escape to callers as errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GradingError {
    /// Connection refused, timeout or non-2xx status.
    #[error("Connection error: {0}")]
    Connection(String),

    /// The response envelope lacked `choices[0].message.content`.
    #[error("Unexpected response shape: {0}")]
    UnexpectedResponseShape(String),

    /// No `{ ... }` pair in the model reply.
    #[error("No JSON object found in the model reply")]
    NoJsonFound { raw_reply: String },

    /// The brace-delimited slice did not decode.
    #[error("Malformed JSON in the model reply: {detail}")]
    MalformedJson {
        raw_reply: String,
        slice: String,
        detail: String,
    },
}

impl GradingError {
    /// The raw reply the failure was produced from, if the model answered at all
    pub fn raw_reply(&self) -> Option<&str> {
        match self {
            GradingError::NoJsonFound { raw_reply }
            | GradingError::MalformedJson { raw_reply, .. } => Some(raw_reply),
            GradingError::Connection(_) | GradingError::UnexpectedResponseShape(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_converts() {
        fn open() -> Result<String> {
            Ok(std::fs::read_to_string("/nonexistent/rubrica/texto.txt")?)
        }

        let err = open().unwrap_err();
        assert!(matches!(err, Error::Io(_)));
        assert!(err.to_string().starts_with("IO error: "));
    }

    #[test]
    fn test_raw_reply_only_when_the_model_answered() {
        let refused = GradingError::Connection("refused".to_string());
        let prose = GradingError::NoJsonFound {
            raw_reply: "sin datos".to_string(),
        };
        assert_eq!(refused.raw_reply(), None);
        assert_eq!(prose.raw_reply(), Some("sin datos"));
    }
}
