//! Error types for the audio backend.
//!
//! Only failures on the primary voice input and on writing the output are
//! errors. Missing or unreadable auxiliary media (impulse responses, beds,
//! event clips) degrade to a no-op inside the stage that needed them.

use callsim_spec::BackendError;
use thiserror::Error;

/// Result type for audio operations.
pub type AudioResult<T> = Result<T, AudioError>;

/// Errors that can abort a render.
#[derive(Debug, Error)]
pub enum AudioError {
    /// The voice input is shorter than the minimum render length.
    #[error("input too short: {seconds:.3} s (minimum {minimum:.3} s)")]
    InputTooShort {
        /// Decoded duration in seconds.
        seconds: f64,
        /// Minimum accepted duration in seconds.
        minimum: f64,
    },

    /// The voice input is longer than the maximum render length.
    #[error("input too long: {seconds:.1} s (maximum {maximum:.1} s)")]
    InputTooLong {
        /// Decoded duration in seconds.
        seconds: f64,
        /// Maximum accepted duration in seconds.
        maximum: f64,
    },

    /// The voice input could not be decoded by any available decoder.
    #[error("could not decode '{path}': {message}")]
    Undecodable {
        /// Path of the input.
        path: String,
        /// Reason reported by the last decoder tried.
        message: String,
    },

    /// Invalid sample rate.
    #[error("invalid sample rate: {rate}")]
    InvalidSampleRate {
        /// The invalid sample rate.
        rate: u32,
    },

    /// Sample-rate conversion failed.
    #[error("resampling failed: {message}")]
    Resample {
        /// Error message.
        message: String,
    },

    /// Reading or writing a WAV file failed.
    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl AudioError {
    /// Creates an undecodable-input error.
    pub fn undecodable(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Undecodable {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a resampling error.
    pub fn resample(message: impl Into<String>) -> Self {
        Self::Resample {
            message: message.into(),
        }
    }

    /// Returns `true` for errors caused by the voice input itself.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            AudioError::InputTooShort { .. }
                | AudioError::InputTooLong { .. }
                | AudioError::Undecodable { .. }
                | AudioError::InvalidSampleRate { .. }
        )
    }
}

impl BackendError for AudioError {
    fn code(&self) -> &'static str {
        match self {
            AudioError::InputTooShort { .. } => "AUDIO_001",
            AudioError::InputTooLong { .. } => "AUDIO_002",
            AudioError::Undecodable { .. } => "AUDIO_003",
            AudioError::InvalidSampleRate { .. } => "AUDIO_004",
            AudioError::Resample { .. } => "AUDIO_005",
            AudioError::Wav(_) => "AUDIO_006",
            AudioError::Io(_) => "AUDIO_007",
        }
    }

    fn category(&self) -> &'static str {
        "audio"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_undecodable_helper() {
        let err = AudioError::undecodable("voice.xyz", "no supported audio tracks");
        assert!(err.to_string().contains("voice.xyz"));
        assert!(err.to_string().contains("no supported audio tracks"));
        assert!(err.is_input_error());
        assert_eq!(err.code(), "AUDIO_003");
    }

    #[test]
    fn test_length_errors_are_input_errors() {
        let short = AudioError::InputTooShort {
            seconds: 0.01,
            minimum: 0.05,
        };
        assert!(short.is_input_error());
        assert!(short.to_string().contains("0.010"));

        let io = AudioError::Io(std::io::Error::new(std::io::ErrorKind::Other, "disk"));
        assert!(!io.is_input_error());
        assert_eq!(io.category(), "audio");
    }
}
