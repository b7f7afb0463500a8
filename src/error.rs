use thiserror::Error;

/// Errors raised by the dashboard pipeline.
///
/// Every variant is recoverable: the shell prints it and keeps the session
/// alive.
#[derive(Debug, Error)]
pub enum DashError {
    /// The place name could not be resolved to coordinates
    #[error("Location not found: {0}")]
    NotFound(String),

    /// Transport failure, non-success status, or a response body of the wrong shape
    #[error("{service} request failed: {message}")]
    Upstream {
        service: &'static str,
        message: String,
    },

    /// A metric label or code that is not in the catalog
    #[error("Unknown metric: {0}")]
    UnknownMetric(String),

    /// A date that does not parse or lies outside the accepted window
    #[error("Invalid date: {0}")]
    InvalidDate(String),

    /// Writing or reading an export file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed export contents
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl DashError {
    pub fn upstream(service: &'static str, message: impl Into<String>) -> Self {
        Self::Upstream {
            service,
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, DashError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_message_names_service() {
        let err = DashError::upstream("NASA POWER", "status 503");
        assert_eq!(err.to_string(), "NASA POWER request failed: status 503");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: DashError = io_err.into();
        assert!(matches!(err, DashError::Io(_)));
    }
}
