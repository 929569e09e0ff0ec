//! Error types for the math engine

use thiserror::Error;

/// Errors that can occur in math layout and export operations
#[derive(Error, Debug)]
pub enum MathedError {
    /// A construct cannot be exported to the requested format.
    /// The export driver is expected to catch this and fall back
    /// (e.g. to an image or raw LaTeX), not abort the document.
    #[error("cannot export {construct} to {format}")]
    Export {
        construct: &'static str,
        format: &'static str,
    },

    /// Formatting failure from the underlying sink
    #[error("write error: {0}")]
    Fmt(#[from] std::fmt::Error),

    /// A dispatch argument could not be parsed
    #[error("invalid command argument: {0}")]
    InvalidArgument(String),
}

/// Result type for math operations
pub type MathedResult<T> = Result<T, MathedError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_error_display() {
        let err = MathedError::Export {
            construct: "sideset",
            format: "mathml",
        };
        assert_eq!(err.to_string(), "cannot export sideset to mathml");
    }

    #[test]
    fn test_invalid_argument_display() {
        let err = MathedError::InvalidArgument("bogus-feature".to_string());
        assert!(err.to_string().contains("bogus-feature"));
    }
}
