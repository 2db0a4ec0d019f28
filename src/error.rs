//! Error handling for the multiband compressor
//!
//! Errors only surface at configuration and I/O boundaries. The DSP
//! components never fail once a network has been configured.

use thiserror::Error;

/// Result type alias for multiband operations
pub type Result<T> = std::result::Result<T, MultibandError>;

/// Main error type for multiband operations
#[derive(Error, Debug)]
pub enum MultibandError {
    // Configuration Errors
    #[error("Invalid band count: {band_count} (expected 1 to {max})")]
    InvalidBandCount { band_count: usize, max: usize },

    #[error("Invalid sample rate: {sample_rate} Hz")]
    InvalidSampleRate { sample_rate: f64 },

    #[error("Invalid block size: {block_size}")]
    InvalidBlockSize { block_size: usize },

    #[error("Invalid topology: {reason}")]
    InvalidTopology { reason: String },

    // Processing Errors
    #[error("Block of {frames} frames exceeds configured block size {block_size}")]
    BlockTooLarge { frames: usize, block_size: usize },

    #[error("Buffer mismatch: {reason}")]
    BufferMismatch { reason: String },

    // Parameter Errors
    #[error("Unknown parameter: {id}")]
    UnknownParameter { id: String },

    #[error("Invalid parameter value for {param}: {value}")]
    InvalidParameterValue { param: String, value: String },

    #[error("Preset has {preset_bands} bands but network has {network_bands}")]
    PresetMismatch {
        preset_bands: usize,
        network_bands: usize,
    },

    // File Errors
    #[error("Invalid audio file: {reason}")]
    InvalidAudio {
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Unsupported audio format: {format}")]
    UnsupportedFormat { format: String },

    // I/O Errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization Errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl MultibandError {
    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            MultibandError::InvalidBandCount { .. } => "INVALID_BAND_COUNT",
            MultibandError::InvalidSampleRate { .. } => "INVALID_SAMPLE_RATE",
            MultibandError::InvalidBlockSize { .. } => "INVALID_BLOCK_SIZE",
            MultibandError::InvalidTopology { .. } => "INVALID_TOPOLOGY",
            MultibandError::BlockTooLarge { .. } => "BLOCK_TOO_LARGE",
            MultibandError::BufferMismatch { .. } => "BUFFER_MISMATCH",
            MultibandError::UnknownParameter { .. } => "UNKNOWN_PARAMETER",
            MultibandError::InvalidParameterValue { .. } => "INVALID_PARAMETER_VALUE",
            MultibandError::PresetMismatch { .. } => "PRESET_MISMATCH",
            MultibandError::InvalidAudio { .. } => "INVALID_AUDIO",
            MultibandError::UnsupportedFormat { .. } => "UNSUPPORTED_FORMAT",
            MultibandError::Io(_) => "IO_ERROR",
            MultibandError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    /// Check if this error is recoverable without rebuilding the network
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            MultibandError::BlockTooLarge { .. }
                | MultibandError::BufferMismatch { .. }
                | MultibandError::UnknownParameter { .. }
                | MultibandError::InvalidParameterValue { .. }
                | MultibandError::PresetMismatch { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = MultibandError::InvalidBandCount {
            band_count: 0,
            max: 16,
        };
        assert_eq!(err.error_code(), "INVALID_BAND_COUNT");
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_block_too_large_is_recoverable() {
        let err = MultibandError::BlockTooLarge {
            frames: 1024,
            block_size: 512,
        };
        assert!(err.is_recoverable());
        assert!(err.to_string().contains("1024"));
    }
}
