//! Error types for busnotify-config operations.
//!
//! Protocol-level anomalies (malformed lines, unknown keys, a batch that
//! never completes) are deliberately absent here: the line protocol absorbs
//! them. What remains are transport failures, form validation failures and
//! CLI-level errors.

use thiserror::Error;

/// Result type alias for configurator operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type.
#[derive(Error, Debug)]
pub enum Error {
    /// Serial link or other byte-stream failures.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Form values rejected before any command was sent.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// CLI command errors.
    #[error("command error: {0}")]
    Command(#[from] CommandError),

    /// File I/O errors (profiles, captures).
    #[error("I/O error: {0}")]
    Io(#[from] IoError),

    /// Configuration errors.
    #[error("configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },
}

/// Transport-level failures. None of these are retried.
#[derive(Error, Debug)]
pub enum TransportError {
    /// The port could not be opened.
    #[error("failed to open {port}: {reason}")]
    OpenFailed {
        /// Port name.
        port: String,
        /// Reason for failure.
        reason: String,
    },

    /// Reading from the device failed.
    #[error("read failed: {0}")]
    ReadFailed(String),

    /// Writing to the device failed.
    #[error("write failed: {0}")]
    WriteFailed(String),

    /// An operation needed an active session but none was open.
    #[error("not connected")]
    NotConnected,

    /// A connect request arrived while a session was already active.
    #[error("already connected")]
    AlreadyConnected,

    /// Enumerating serial ports failed.
    #[error("port enumeration failed: {0}")]
    Enumeration(String),
}

/// Form validation failures raised before anything is written.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required field is empty.
    #[error("required field is empty: {field}")]
    MissingField {
        /// Form field name.
        field: String,
    },

    /// A time field is not a valid `HH:MM` value.
    #[error("invalid time for {field}: {value:?} (expected HH:MM)")]
    InvalidTime {
        /// Form field name.
        field: String,
        /// Offending value.
        value: String,
    },

    /// Lead time is not a non-negative whole number of minutes.
    #[error("invalid lead time: {value:?} (expected whole minutes)")]
    InvalidLeadTime {
        /// Offending value.
        value: String,
    },

    /// Commands cannot be built before the firmware variant is known.
    #[error("firmware variant unknown: read the device preferences first or choose a variant")]
    UnknownVariant,

    /// A value would break newline framing.
    #[error("value for {field} contains a line break")]
    LineBreak {
        /// Form field name.
        field: String,
    },
}

/// CLI command-specific errors.
#[derive(Error, Debug)]
pub enum CommandError {
    /// Invalid argument provided.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Missing required argument.
    #[error("missing required argument: {0}")]
    MissingArgument(String),

    /// Command execution failed.
    #[error("command execution failed: {0}")]
    ExecutionFailed(String),
}

/// File I/O errors.
#[derive(Error, Debug)]
pub enum IoError {
    /// File not found.
    #[error("file not found: {path}")]
    FileNotFound {
        /// Path to the file that was not found.
        path: String,
    },

    /// Failed to read file.
    #[error("failed to read file: {path}: {reason}")]
    ReadFailed {
        /// Path to the file.
        path: String,
        /// Reason for failure.
        reason: String,
    },

    /// Failed to write file.
    #[error("failed to write file: {path}: {reason}")]
    WriteFailed {
        /// Path to the file.
        path: String,
        /// Reason for failure.
        reason: String,
    },

    /// Profile contents could not be (de)serialized.
    #[error("invalid profile: {0}")]
    Profile(String),

    /// Generic I/O error wrapper.
    #[error("I/O error: {0}")]
    Generic(String),
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Io(IoError::Generic(err.to_string()))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Io(IoError::Profile(err.to_string()))
    }
}

impl From<serialport::Error> for TransportError {
    fn from(err: serialport::Error) -> Self {
        Self::Enumeration(err.description)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::Config {
            message: "bad baud".to_string(),
        };
        assert_eq!(err.to_string(), "configuration error: bad baud");
    }

    #[test]
    fn test_transport_error_display() {
        let err = TransportError::OpenFailed {
            port: "/dev/ttyUSB0".to_string(),
            reason: "permission denied".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "failed to open /dev/ttyUSB0: permission denied"
        );
        assert_eq!(TransportError::NotConnected.to_string(), "not connected");
    }

    #[test]
    fn test_validation_error_display() {
        let err = ValidationError::MissingField {
            field: "busStop".to_string(),
        };
        assert_eq!(err.to_string(), "required field is empty: busStop");

        let err = ValidationError::InvalidTime {
            field: "startTime".to_string(),
            value: "25:00".to_string(),
        };
        assert!(err.to_string().contains("\"25:00\""));
        assert!(err.to_string().contains("HH:MM"));
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(IoError::Generic(_))));
    }

    #[test]
    fn test_error_from_serde_json() {
        let json_err = serde_json::from_str::<i32>("nope").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Io(IoError::Profile(_))));
    }

    #[test]
    fn test_error_from_validation() {
        let err: Error = ValidationError::LineBreak {
            field: "wifiSSID".to_string(),
        }
        .into();
        assert!(matches!(err, Error::Validation(_)));
        assert!(err.to_string().starts_with("validation error:"));
    }

    #[test]
    fn test_error_from_serialport() {
        let sp_err = serialport::Error::new(serialport::ErrorKind::NoDevice, "no device");
        let err: TransportError = sp_err.into();
        assert!(err.to_string().contains("no device"));
    }
}
