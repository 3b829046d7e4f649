//! Error types for KISS2 flow-table parsing and validation

use std::fmt;
use std::io;
use std::sync::Arc;

/// Errors related to KISS2 format parsing and validation
///
/// These errors occur when reading or parsing KISS2 files with invalid
/// content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KissError {
    /// Invalid value in .i directive
    InvalidInputDirective {
        /// The invalid value string
        value: Arc<str>,
    },
    /// Invalid value in .o directive
    InvalidOutputDirective {
        /// The invalid value string
        value: Arc<str>,
    },
    /// A row doesn't have the four fields input/current/next/output
    MalformedRow {
        /// One-based line number of the row
        line: usize,
        /// The row text
        content: Arc<str>,
    },
    /// Invalid character in the input portion of a row
    InvalidInputCharacter {
        /// One-based line number of the row
        line: usize,
        /// The invalid character
        character: char,
        /// Position in the input string
        position: usize,
    },
    /// Invalid character in the output portion of a row
    InvalidOutputCharacter {
        /// One-based line number of the row
        line: usize,
        /// The invalid character
        character: char,
        /// Position in the output string
        position: usize,
    },
    /// A row's cube widths don't match the declared dimensions
    RowDimensionMismatch {
        /// One-based line number of the row
        line: usize,
        /// Expected number of inputs
        expected_inputs: usize,
        /// Actual number of inputs in the row
        actual_inputs: usize,
        /// Expected number of outputs
        expected_outputs: usize,
        /// Actual number of outputs in the row
        actual_outputs: usize,
    },
    /// The .r directive names a state that no row declares
    UnknownResetState {
        /// The undeclared state name
        name: Arc<str>,
    },
    /// File has no dimension information (no .i/.o and no rows to infer from)
    MissingDimensions,
}

impl fmt::Display for KissError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KissError::InvalidInputDirective { value } => {
                write!(f, "Invalid .i directive value: '{}'", value)
            }
            KissError::InvalidOutputDirective { value } => {
                write!(f, "Invalid .o directive value: '{}'", value)
            }
            KissError::MalformedRow { line, content } => write!(
                f,
                "Line {}: expected 'input current-state next-state output', got '{}'",
                line, content
            ),
            KissError::InvalidInputCharacter {
                line,
                character,
                position,
            } => write!(
                f,
                "Line {}: invalid input character '{}' at position {}",
                line, character, position
            ),
            KissError::InvalidOutputCharacter {
                line,
                character,
                position,
            } => write!(
                f,
                "Line {}: invalid output character '{}' at position {}",
                line, character, position
            ),
            KissError::RowDimensionMismatch {
                line,
                expected_inputs,
                actual_inputs,
                expected_outputs,
                actual_outputs,
            } => write!(
                f,
                "Line {}: row dimensions (inputs: {}, outputs: {}) don't match declared \
                 dimensions (inputs: {}, outputs: {})",
                line, actual_inputs, actual_outputs, expected_inputs, expected_outputs
            ),
            KissError::UnknownResetState { name } => {
                write!(f, "Reset state '{}' is not declared by any row", name)
            }
            KissError::MissingDimensions => {
                write!(f, "KISS file has no dimension information")
            }
        }
    }
}

impl std::error::Error for KissError {}

impl From<KissError> for io::Error {
    fn from(err: KissError) -> Self {
        io::Error::new(io::ErrorKind::InvalidData, err)
    }
}

/// Errors that can occur when reading KISS2 format data
///
/// This error type is returned by the `from_kiss_*` methods.
#[derive(Debug)]
pub enum KissReadError {
    /// KISS format error
    Kiss(KissError),
    /// IO error during reading
    Io(io::Error),
}

impl fmt::Display for KissReadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KissReadError::Kiss(e) => write!(f, "KISS format error: {}", e),
            KissReadError::Io(e) => write!(f, "IO error: {}", e),
        }
    }
}

impl std::error::Error for KissReadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            KissReadError::Kiss(e) => Some(e),
            KissReadError::Io(e) => Some(e),
        }
    }
}

impl From<KissError> for KissReadError {
    fn from(err: KissError) -> Self {
        KissReadError::Kiss(err)
    }
}

impl From<io::Error> for KissReadError {
    fn from(err: io::Error) -> Self {
        KissReadError::Io(err)
    }
}

impl From<KissReadError> for io::Error {
    fn from(err: KissReadError) -> Self {
        match err {
            KissReadError::Io(e) => e,
            KissReadError::Kiss(e) => io::Error::new(io::ErrorKind::InvalidData, e),
        }
    }
}

/// Errors that can occur when writing KISS2 format data
///
/// This error type is returned by the `to_kiss_*` methods.
#[derive(Debug)]
pub enum KissWriteError {
    /// IO error during writing
    Io(io::Error),
}

impl fmt::Display for KissWriteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KissWriteError::Io(e) => write!(f, "IO error: {}", e),
        }
    }
}

impl std::error::Error for KissWriteError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            KissWriteError::Io(e) => Some(e),
        }
    }
}

impl From<io::Error> for KissWriteError {
    fn from(err: io::Error) -> Self {
        KissWriteError::Io(err)
    }
}

impl From<KissWriteError> for io::Error {
    fn from(err: KissWriteError) -> Self {
        match err {
            KissWriteError::Io(e) => e,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_row_display() {
        let err = KissError::MalformedRow {
            line: 7,
            content: Arc::from("01 s0"),
        };
        let msg = err.to_string();
        assert!(msg.contains("Line 7"));
        assert!(msg.contains("'01 s0'"));
    }

    #[test]
    fn test_row_dimension_mismatch_display() {
        let err = KissError::RowDimensionMismatch {
            line: 3,
            expected_inputs: 2,
            actual_inputs: 3,
            expected_outputs: 1,
            actual_outputs: 1,
        };
        let msg = err.to_string();
        assert!(msg.contains("Line 3"));
        assert!(msg.contains("inputs: 3"));
        assert!(msg.contains("inputs: 2"));
    }

    #[test]
    fn test_unknown_reset_state_display() {
        let err = KissError::UnknownResetState {
            name: Arc::from("s9"),
        };
        assert!(err.to_string().contains("'s9'"));
    }

    #[test]
    fn test_read_error_from_kiss_error() {
        let err: KissReadError = KissError::MissingDimensions.into();
        assert!(matches!(err, KissReadError::Kiss(_)));
    }

    #[test]
    fn test_read_error_to_io_error_preserves_io_error() {
        let original = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let read_err = KissReadError::Io(original);
        let io_err: io::Error = read_err.into();
        assert_eq!(io_err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn test_kiss_error_to_io_error() {
        let io_err: io::Error = KissError::MissingDimensions.into();
        assert_eq!(io_err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn test_write_error_to_io_error() {
        let original = io::Error::new(io::ErrorKind::PermissionDenied, "permission denied");
        let write_err = KissWriteError::Io(original);
        let io_err: io::Error = write_err.into();
        assert_eq!(io_err.kind(), io::ErrorKind::PermissionDenied);
    }
}
