//! Error types shared by the callsim crates.

use thiserror::Error;

/// Errors raised while reading a parameter record.
///
/// Out-of-range values are never errors; they are clamped by
/// [`crate::EffectParameters::resolve`]. Only input that cannot be read as a
/// parameter record at all ends up here.
#[derive(Debug, Error)]
pub enum ParamsError {
    /// The JSON text could not be parsed into a parameter record.
    #[error("invalid parameter JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The parameter file could not be read.
    #[error("failed to read parameter file '{path}': {source}")]
    Read {
        /// Path that was being read.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

impl BackendError for ParamsError {
    fn code(&self) -> &'static str {
        match self {
            ParamsError::Json(_) => "PARAMS_001",
            ParamsError::Read { .. } => "PARAMS_002",
        }
    }

    fn category(&self) -> &'static str {
        "params"
    }
}

/// Common trait for backend errors.
///
/// Gives every error type in the workspace a stable code and a category so
/// front-ends can report failures uniformly.
///
/// # Example
///
/// ```ignore
/// use callsim_spec::BackendError;
///
/// fn report<E: BackendError>(err: E) {
///     eprintln!("[{}] {}", err.code(), err.message());
/// }
/// ```
pub trait BackendError: std::error::Error {
    /// Stable error code such as "AUDIO_001".
    fn code(&self) -> &'static str;

    /// Human-readable message, the `Display` text by default.
    fn message(&self) -> String {
        self.to_string()
    }

    /// Error category such as "audio" or "params".
    fn category(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_error_code() {
        let err: ParamsError = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        assert_eq!(err.code(), "PARAMS_001");
        assert_eq!(err.category(), "params");
        assert!(err.message().contains("invalid parameter JSON"));
    }
}
