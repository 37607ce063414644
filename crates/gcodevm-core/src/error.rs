//! Error handling for GCodeVM
//!
//! Two families of errors exist, and they travel differently:
//! - Configuration errors are structural and fail fast at construction or reset.
//! - Interpretation errors come from malformed program input. The interpreter
//!   logs them and keeps going, so they never abort an evaluation.
//!
//! All error types use `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Configuration error type
///
/// Raised while validating a VM configuration or initial-state override.
/// These indicate programmer error rather than bad G-code.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// No axes configured
    #[error("At least one axis label is required")]
    NoAxes,

    /// The same axis label appears twice
    #[error("Duplicate axis label '{label}'")]
    DuplicateAxis {
        /// The repeated label.
        label: char,
    },

    /// Axis label collides with a word letter the interpreter reserves
    #[error("Axis label '{label}' collides with a reserved G-code word letter")]
    ReservedAxisLabel {
        /// The offending label.
        label: char,
    },

    /// Axis label is not an ASCII letter
    #[error("Axis label '{label}' is not an ASCII letter")]
    InvalidAxisLabel {
        /// The offending label.
        label: char,
    },

    /// Per-axis array has the wrong length
    #[error("'{field}' has {actual} entries but {expected} axes are configured")]
    AxisCountMismatch {
        /// Name of the configuration field.
        field: String,
        /// Number of configured axes.
        expected: usize,
        /// Number of entries supplied.
        actual: usize,
    },

    /// A value is outside its valid range
    #[error("Value out of range for '{field}': {reason}")]
    ValueOutOfRange {
        /// Name of the configuration field.
        field: String,
        /// Why the value was rejected.
        reason: String,
    },

    /// Coordinate system index outside G54..G59
    #[error("Coordinate system index {index} out of range (0-5)")]
    CoordSysOutOfRange {
        /// The rejected index.
        index: usize,
    },

    /// The configuration file could not be read or written
    #[error("Config file error: {0}")]
    File(String),

    /// The configuration file format is not supported
    #[error("Unsupported config format: {0}")]
    UnsupportedFormat(String),
}

/// Interpretation error type
///
/// Represents problems in the G-code input itself. The interpreter logs these
/// and degrades gracefully instead of returning them.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InterpretError {
    /// Motion code the VM does not simulate
    #[error("Unsupported motion code {code} at line {line}: {source_line}")]
    UnsupportedMotion {
        /// Line counter value.
        line: u64,
        /// The motion code, e.g. "G38.2".
        code: String,
        /// The source text.
        source_line: String,
    },

    /// Reference to an axis letter that is not configured
    #[error("Unknown axis '{axis}' at line {line}")]
    UnknownAxis {
        /// Line counter value.
        line: u64,
        /// The axis letter that was looked up.
        axis: char,
    },

    /// Arc radius cannot span the chord between start and end
    #[error("Arc radius {radius} too small for chord {chord} at line {line}")]
    ArcRadiusTooSmall {
        /// Line counter value.
        line: u64,
        /// The programmed radius.
        radius: f64,
        /// Distance between start and end in the arc plane.
        chord: f64,
    },

    /// Word value that does not make sense for its command
    #[error("Invalid parameter '{param}' at line {line}: {reason}")]
    InvalidParameter {
        /// Line counter value.
        line: u64,
        /// The parameter letter or code.
        param: String,
        /// Why the value was rejected.
        reason: String,
    },
}

/// Main error type for GCodeVM
///
/// A unified error type used by file-level APIs.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Interpretation error
    #[error(transparent)]
    Interpret(#[from] InterpretError),

    /// Standard I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an error from a string message
    pub fn other(msg: impl Into<String>) -> Self {
        Error::Other(msg.into())
    }

    /// Check if this is a configuration error
    pub fn is_config_error(&self) -> bool {
        matches!(self, Error::Config(_))
    }

    /// Check if this is an interpretation error
    pub fn is_interpret_error(&self) -> bool {
        matches!(self, Error::Interpret(_))
    }
}

/// Result type using Error
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::AxisCountMismatch {
            field: "max_feed".to_string(),
            expected: 3,
            actual: 2,
        };
        assert_eq!(
            err.to_string(),
            "'max_feed' has 2 entries but 3 axes are configured"
        );

        let err = ConfigError::ReservedAxisLabel { label: 'f' };
        assert_eq!(
            err.to_string(),
            "Axis label 'f' collides with a reserved G-code word letter"
        );
    }

    #[test]
    fn test_interpret_error_display() {
        let err = InterpretError::UnsupportedMotion {
            line: 12,
            code: "G38.2".to_string(),
            source_line: "G38.2 Z-10 F50".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Unsupported motion code G38.2 at line 12: G38.2 Z-10 F50"
        );
    }

    #[test]
    fn test_error_conversion() {
        let err: Error = ConfigError::NoAxes.into();
        assert!(err.is_config_error());
        assert!(!err.is_interpret_error());

        let err: Error = InterpretError::UnknownAxis { line: 1, axis: 'q' }.into();
        assert!(err.is_interpret_error());

        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }
}
