//! Audio file I/O
//!
//! WAV import and export through `hound`. Files keep their native sample
//! rate: the network is configured for whatever rate the file carries.

use std::path::Path;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};

use crate::engine::buffer::{AudioBuffer, ChannelLayout};
use crate::error::{MultibandError, Result};

/// Export format configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportFormat {
    /// Bit depth: 16, 24, or 32 (float)
    pub bit_depth: u16,
}

impl Default for ExportFormat {
    fn default() -> Self {
        ExportFormat { bit_depth: 24 }
    }
}

impl ExportFormat {
    /// Bit depths `export_audio` can write
    pub const SUPPORTED_BIT_DEPTHS: [u16; 3] = [16, 24, 32];

    /// Create a new export format with the given bit depth
    pub fn new(bit_depth: u16) -> Self {
        ExportFormat { bit_depth }
    }

    /// Check the bit depth is one of [`Self::SUPPORTED_BIT_DEPTHS`]
    pub fn validate(&self) -> Result<()> {
        if Self::SUPPORTED_BIT_DEPTHS.contains(&self.bit_depth) {
            Ok(())
        } else {
            Err(unsupported_depth(self.bit_depth))
        }
    }
}

fn unsupported_depth(bit_depth: u16) -> MultibandError {
    MultibandError::UnsupportedFormat {
        format: format!("{}-bit audio (only 16, 24, 32 supported)", bit_depth),
    }
}

/// Import a WAV file as 32-bit float
///
/// # Errors
/// * `Io` - If the file does not exist or cannot be opened
/// * `InvalidAudio` - If the file is not a valid WAV file or holds no frames
/// * `UnsupportedFormat` - If the file has more than 2 channels
pub fn import_audio(path: &Path) -> Result<AudioBuffer> {
    if !path.exists() {
        return Err(MultibandError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("file not found: {}", path.display()),
        )));
    }

    let reader = WavReader::open(path).map_err(|e| MultibandError::InvalidAudio {
        reason: format!("Failed to open WAV file: {}", e),
        source: Some(Box::new(e)),
    })?;

    let spec = reader.spec();
    let channels = spec.channels as usize;
    if channels == 0 || channels > 2 {
        return Err(MultibandError::UnsupportedFormat {
            format: format!("{}-channel audio (only mono/stereo supported)", channels),
        });
    }

    let samples = read_samples_as_f32(reader, spec.bits_per_sample, spec.sample_format)?;
    if samples.is_empty() {
        return Err(MultibandError::InvalidAudio {
            reason: "file contains no samples".to_string(),
            source: None,
        });
    }

    let layout = ChannelLayout::from_count(channels).unwrap_or_default();
    AudioBuffer::from_interleaved(&samples, layout, spec.sample_rate)
}

/// Export an AudioBuffer to a WAV file at the buffer's sample rate
///
/// An unsupported bit depth is rejected before the file is created.
pub fn export_audio(buffer: &AudioBuffer, path: &Path, format: ExportFormat) -> Result<()> {
    format.validate()?;

    let spec = WavSpec {
        channels: buffer.channels() as u16,
        sample_rate: buffer.sample_rate,
        bits_per_sample: format.bit_depth,
        sample_format: if format.bit_depth == 32 {
            SampleFormat::Float
        } else {
            SampleFormat::Int
        },
    };

    let interleaved = buffer.to_interleaved();
    let mut writer = WavWriter::create(path, spec).map_err(hound_to_io)?;

    match format.bit_depth {
        16 => {
            for sample in interleaved {
                let scaled = (sample * 32767.0).clamp(-32768.0, 32767.0) as i16;
                writer.write_sample(scaled).map_err(hound_to_io)?;
            }
        }
        24 => {
            for sample in interleaved {
                // 24-bit stored as i32 in hound
                let scaled = (sample * 8388607.0).clamp(-8388608.0, 8388607.0) as i32;
                writer.write_sample(scaled).map_err(hound_to_io)?;
            }
        }
        32 => {
            for sample in interleaved {
                writer.write_sample(sample).map_err(hound_to_io)?;
            }
        }
        other => return Err(unsupported_depth(other)),
    }

    writer.finalize().map_err(hound_to_io)?;
    Ok(())
}

/// Duplicate a mono buffer into both channels of a stereo buffer
///
/// Stereo input is returned unchanged.
pub fn to_stereo(buffer: AudioBuffer) -> AudioBuffer {
    if buffer.channels() != 1 {
        return buffer;
    }
    let mono = buffer.samples[0].clone();
    AudioBuffer {
        samples: vec![mono.clone(), mono],
        sample_rate: buffer.sample_rate,
    }
}

/// Average a stereo buffer down to one channel
pub fn to_mono(buffer: &AudioBuffer) -> AudioBuffer {
    let channels = buffer.channels().max(1) as f32;
    let mixed = (0..buffer.len())
        .map(|i| buffer.samples.iter().map(|ch| ch[i]).sum::<f32>() / channels)
        .collect();
    AudioBuffer {
        samples: vec![mixed],
        sample_rate: buffer.sample_rate,
    }
}

/// Generate a mono sine test tone
pub fn generate_test_tone(frequency: f32, duration_secs: f32, sample_rate: u32) -> AudioBuffer {
    generate_stereo_test_tone(frequency, frequency, duration_secs, sample_rate)
        .samples
        .into_iter()
        .next()
        .map(|samples| AudioBuffer {
            samples: vec![samples],
            sample_rate,
        })
        .unwrap_or_default()
}

/// Generate a stereo sine test tone with different frequencies per channel
pub fn generate_stereo_test_tone(
    freq_left: f32,
    freq_right: f32,
    duration_secs: f32,
    sample_rate: u32,
) -> AudioBuffer {
    let num_samples = (duration_secs * sample_rate as f32) as usize;
    let mut buffer = AudioBuffer::new(num_samples, ChannelLayout::Stereo);
    buffer.sample_rate = sample_rate;

    for (channel, freq) in [freq_left, freq_right].into_iter().enumerate() {
        let angular_freq = 2.0 * std::f64::consts::PI * freq as f64 / sample_rate as f64;
        for (i, sample) in buffer.samples[channel].iter_mut().enumerate() {
            *sample = (angular_freq * i as f64).sin() as f32;
        }
    }

    buffer
}

// ============================================================================
// Internal helper functions
// ============================================================================

fn hound_to_io(e: hound::Error) -> MultibandError {
    match e {
        hound::Error::IoError(io) => MultibandError::Io(io),
        other => MultibandError::Io(std::io::Error::new(
            std::io::ErrorKind::Other,
            other.to_string(),
        )),
    }
}

/// Read samples from WAV reader and convert to f32
fn read_samples_as_f32<R: std::io::Read>(
    mut reader: WavReader<R>,
    bits_per_sample: u16,
    sample_format: SampleFormat,
) -> Result<Vec<f32>> {
    let invalid = |bits: u16| {
        move |e: hound::Error| MultibandError::InvalidAudio {
            reason: format!("Failed to read {}-bit samples: {}", bits, e),
            source: Some(Box::new(e)),
        }
    };

    match (sample_format, bits_per_sample) {
        (SampleFormat::Float, _) => reader
            .samples::<f32>()
            .collect::<std::result::Result<Vec<f32>, _>>()
            .map_err(invalid(bits_per_sample)),
        (SampleFormat::Int, 8) => reader
            .samples::<i8>()
            .map(|s| s.map(|v| v as f32 / 128.0))
            .collect::<std::result::Result<Vec<f32>, _>>()
            .map_err(invalid(8)),
        (SampleFormat::Int, 16) => reader
            .samples::<i16>()
            .map(|s| s.map(|v| v as f32 / 32768.0))
            .collect::<std::result::Result<Vec<f32>, _>>()
            .map_err(invalid(16)),
        (SampleFormat::Int, 24) => reader
            .samples::<i32>()
            .map(|s| s.map(|v| v as f32 / 8388608.0))
            .collect::<std::result::Result<Vec<f32>, _>>()
            .map_err(invalid(24)),
        (SampleFormat::Int, 32) => reader
            .samples::<i32>()
            .map(|s| s.map(|v| v as f32 / 2147483648.0))
            .collect::<std::result::Result<Vec<f32>, _>>()
            .map_err(invalid(32)),
        (SampleFormat::Int, bits) => Err(MultibandError::UnsupportedFormat {
            format: format!("{}-bit integer audio", bits),
        }),
    }
}
