//! DSP Components
//!
//! The processing stages of a band-split network. Leaf pieces (level
//! detection, gain curve, smoothing, biquad sections) compose into the two
//! stages the network wires together: [`BandCompressor`] and
//! [`CrossoverFilter`]. Both implement [`Processor`].

mod biquad;
mod compressor;
mod crossover;
mod envelope;
mod gain_curve;
mod processor;
mod smoother;

pub use biquad::{
    BiquadCoeffs, BiquadState, FilterType, StereoBiquad, BUTTERWORTH_Q, NYQUIST_SAFETY,
};
pub use compressor::{BandCompressor, CompressorParams};
pub use crossover::{CrossoverFilter, HIGH_OUTPUT_OFFSET};
pub use envelope::EnvelopeDetector;
pub use gain_curve::GainCurve;
pub use processor::Processor;
pub use smoother::{time_constant_coeff, GainSmoother};
