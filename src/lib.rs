//! Multiband - Dynamic-Range Compressor Core
//!
//! Splits a stereo signal into `N` frequency bands, compresses each band
//! independently, and sums the results back to stereo.
//!
//! # Architecture
//!
//! - `dsp`: the two processing stages, [`dsp::CrossoverFilter`] (24 dB/oct
//!   low/high split) and [`dsp::BandCompressor`] (soft-knee compressor for
//!   one frequency band), plus the biquad and envelope pieces they are built from.
//! - `network`: the cascade topology as data and the [`BandSplitNetwork`]
//!   that executes it with pre-allocated buffers.
//! - `params`: lock-free shared parameters a control thread may write while
//!   audio is running.
//! - `preset`: JSON snapshots of every parameter.
//! - `engine`: audio buffers and WAV I/O used by the CLI and tests.
//!
//! ```no_run
//! use multiband::{AudioBuffer, BandSplitNetwork, ChannelLayout, NetworkConfig};
//!
//! let mut network = BandSplitNetwork::configure(NetworkConfig::new(48000.0, 512, 3))?;
//! network.set_parameter("band_1_ratio", 4.0)?;
//!
//! let input = AudioBuffer::new(512, ChannelLayout::Stereo);
//! let mut output = AudioBuffer::new(512, ChannelLayout::Stereo);
//! network.process(&input, &mut output)?;
//! # Ok::<(), multiband::MultibandError>(())
//! ```

pub mod cli;
pub mod dsp;
pub mod engine;
pub mod error;
pub mod network;
pub mod params;
pub mod preset;

pub use engine::{AudioBuffer, ChannelLayout};
pub use error::{MultibandError, Result};
pub use network::{BandSplitNetwork, NetworkConfig, Topology};
pub use params::{CompressorParam, ParamId, Parameter};
pub use preset::{BandSettings, Preset};
