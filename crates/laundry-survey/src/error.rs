//! Error types for laundry-survey.
//!
//! Errors fall into three groups that the user sees differently: field
//! validation errors are printed one per field, geolocation problems are
//! warnings, and every remote or storage failure collapses into one generic
//! message while the detail goes to the log.

use std::path::PathBuf;
use thiserror::Error;

use crate::form::ValidationErrors;

/// Message shown to the user for any failed remote operation.
pub const GENERIC_FAILURE_MESSAGE: &str = "Something went wrong. Please try again.";

/// The main error type for laundry-survey operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Form Errors ===
    /// One or more form fields failed validation.
    #[error("validation failed: {0}")]
    Validation(ValidationErrors),

    /// The device position could not be determined.
    #[error("geolocation unavailable: {message}")]
    Geolocation {
        /// Why the position is unavailable.
        message: String,
    },

    /// The photo upload failed; no entry was written.
    #[error("failed to upload photo to {path}: {source}")]
    Upload {
        /// Object path the upload targeted.
        path: String,
        /// The underlying gateway error.
        #[source]
        source: Box<Error>,
    },

    // === Gateway Errors ===
    /// The hosted backend answered with a non-success status.
    #[error("{operation} failed with status {status}: {message}")]
    Remote {
        /// Which gateway operation failed.
        operation: &'static str,
        /// HTTP status code.
        status: u16,
        /// Response body, verbatim.
        message: String,
    },

    /// The HTTP request could not be completed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// An in-process gateway was told to fail.
    #[error("{operation} failed: {message}")]
    Injected {
        /// Which gateway operation failed.
        operation: &'static str,
        /// Configured failure message.
        message: String,
    },

    // === Local Store Errors ===
    /// Failed to open or create the local database.
    #[error("failed to open database at {path}: {source}")]
    DatabaseOpen {
        /// Path to the database file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: rusqlite::Error,
    },

    /// A local database query failed.
    #[error("database query failed: {0}")]
    DatabaseQuery(#[from] rusqlite::Error),

    /// Failed to bring the local schema up to date.
    #[error("database migration failed: {message}")]
    DatabaseMigration {
        /// Description of what went wrong.
        message: String,
    },

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === Dashboard / Export Errors ===
    /// A grid query named an unknown column or was otherwise malformed.
    #[error("invalid grid query: {message}")]
    InvalidQuery {
        /// Description of the problem.
        message: String,
    },

    /// The workbook could not be built.
    #[error("failed to build workbook: {0}")]
    Workbook(#[from] rust_xlsxwriter::XlsxError),

    // === I/O Errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to read an input file.
    #[error("failed to read {path}: {source}")]
    FileRead {
        /// Path that couldn't be read.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Serialization Errors ===
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// An internal error occurred (bug).
    #[error("internal error: {0}")]
    Internal(String),
}

/// A specialized Result type for laundry-survey operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl From<ValidationErrors> for Error {
    fn from(errors: ValidationErrors) -> Self {
        Self::Validation(errors)
    }
}

impl Error {
    /// Create a new internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Create a geolocation error.
    #[must_use]
    pub fn geolocation(message: impl Into<String>) -> Self {
        Self::Geolocation {
            message: message.into(),
        }
    }

    /// Wrap a gateway error as a failed photo upload.
    #[must_use]
    pub fn upload(path: impl Into<String>, source: Error) -> Self {
        Self::Upload {
            path: path.into(),
            source: Box::new(source),
        }
    }

    /// Create an invalid grid query error.
    #[must_use]
    pub fn invalid_query(message: impl Into<String>) -> Self {
        Self::InvalidQuery {
            message: message.into(),
        }
    }

    /// Check if this error is a form validation failure.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Check if this error came from a remote or storage round trip.
    #[must_use]
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            Self::Upload { .. }
                | Self::Remote { .. }
                | Self::Http(_)
                | Self::Injected { .. }
                | Self::DatabaseOpen { .. }
                | Self::DatabaseQuery(_)
        )
    }

    /// The message to show the user.
    ///
    /// Validation and geolocation errors are specific; everything else is
    /// reported with [`GENERIC_FAILURE_MESSAGE`].
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(errors) => errors.to_string(),
            Self::Geolocation { message } => message.clone(),
            Self::InvalidQuery { .. } | Self::ConfigValidation { .. } | Self::ConfigLoad(_) => {
                self.to_string()
            }
            _ => GENERIC_FAILURE_MESSAGE.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::FieldError;

    #[test]
    fn test_remote_error_display() {
        let err = Error::Remote {
            operation: "insert",
            status: 409,
            message: "duplicate key".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "insert failed with status 409: duplicate key"
        );
    }

    #[test]
    fn test_upload_error_keeps_source() {
        let err = Error::upload(
            "establishments/1.jpg",
            Error::Injected {
                operation: "upload",
                message: "bucket full".to_string(),
            },
        );
        let msg = err.to_string();
        assert!(msg.contains("establishments/1.jpg"));
        assert!(msg.contains("bucket full"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_is_validation() {
        let errors = ValidationErrors::from(vec![FieldError::new(
            "establishment_name",
            "This field is required",
        )]);
        assert!(Error::from(errors).is_validation());
        assert!(!Error::internal("x").is_validation());
    }

    #[test]
    fn test_is_remote() {
        assert!(Error::Remote {
            operation: "select",
            status: 500,
            message: String::new(),
        }
        .is_remote());
        assert!(Error::upload("p", Error::internal("x")).is_remote());
        assert!(!Error::geolocation("denied").is_remote());
    }

    #[test]
    fn test_user_message_is_generic_for_remote_errors() {
        let err = Error::Remote {
            operation: "insert",
            status: 500,
            message: "stack trace here".to_string(),
        };
        assert_eq!(err.user_message(), GENERIC_FAILURE_MESSAGE);
    }

    #[test]
    fn test_user_message_lists_fields_for_validation() {
        let errors = ValidationErrors::from(vec![FieldError::new(
            "lead_detail",
            "Please enter lead details",
        )]);
        let msg = Error::from(errors).user_message();
        assert!(msg.contains("lead_detail"));
        assert!(msg.contains("Please enter lead details"));
    }

    #[test]
    fn test_user_message_for_geolocation() {
        let err = Error::geolocation("User denied Geolocation");
        assert_eq!(err.user_message(), "User denied Geolocation");
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_from_rusqlite_error() {
        let result = rusqlite::Connection::open_with_flags(
            "/nonexistent/path/db.sqlite",
            rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY,
        );
        if let Err(sqlite_err) = result {
            let err: Error = sqlite_err.into();
            assert!(matches!(err, Error::DatabaseQuery(_)));
            assert!(err.is_remote());
        }
    }

    #[test]
    fn test_from_json_error() {
        let json_result: std::result::Result<i32, serde_json::Error> =
            serde_json::from_str("not valid json");
        if let Err(json_err) = json_result {
            let err: Error = json_err.into();
            assert!(matches!(err, Error::Json(_)));
        }
    }

    #[test]
    fn test_config_validation_error_display() {
        let err = Error::ConfigValidation {
            message: "page_size must be greater than 0".to_string(),
        };
        assert!(err.to_string().contains("page_size"));
        assert!(err.user_message().contains("page_size"));
    }

    #[test]
    fn test_file_read_error_display() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err = Error::FileRead {
            path: PathBuf::from("/tmp/photo.jpg"),
            source: io_err,
        };
        assert!(err.to_string().contains("/tmp/photo.jpg"));
    }
}
