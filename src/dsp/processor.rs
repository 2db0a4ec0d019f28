//! Processor trait definition
//!
//! Base trait for the processing stages that make up a band-split network.

use std::sync::Arc;

use crate::engine::AudioBuffer;
use crate::params::Parameter;

/// A block-based processing stage
///
/// Stages process buffers in place, never allocate inside `process`, and
/// keep their history until `reset` is called.
pub trait Processor: Send {
    /// Prepare the stage for processing
    ///
    /// Called when sample rate or block size changes. Must not clear
    /// filter or envelope history.
    fn prepare(&mut self, sample_rate: f64, max_block_size: usize);

    /// Process one block in place
    fn process(&mut self, sample_rate: f64, buffer: &mut AudioBuffer);

    /// Clear internal history (filter delay lines, envelope state)
    fn reset(&mut self);

    /// Human-readable name
    fn name(&self) -> &'static str;

    /// Parameters owned by this stage, in host order
    fn parameters(&self) -> Vec<Arc<Parameter>>;
}
