//! Band-split network
//!
//! Owns `N` compressors, `N - 1` crossovers and the pre-allocated buffers
//! between them, and executes the [`Topology`] once per block. All
//! allocation happens in [`BandSplitNetwork::configure`] and
//! [`BandSplitNetwork::reconfigure`]; [`BandSplitNetwork::process`] only
//! copies, filters and sums within existing capacity.

mod topology;

pub use topology::{Connection, Stage, Topology, MAX_BANDS, STEREO};

use std::sync::Arc;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::dsp::{BandCompressor, CrossoverFilter, Processor};
use crate::engine::{AudioBuffer, ChannelLayout};
use crate::error::{MultibandError, Result};
use crate::params::{default_cutoffs, ParamId, Parameter};

/// Configuration accepted before processing begins
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Sample rate in Hz
    pub sample_rate: f64,
    /// Largest block `process` will be called with
    pub block_size: usize,
    /// Number of frequency bands (crossovers = bands - 1)
    pub band_count: usize,
}

impl NetworkConfig {
    pub fn new(sample_rate: f64, block_size: usize, band_count: usize) -> Self {
        Self {
            sample_rate,
            block_size,
            band_count,
        }
    }

    pub fn validate(&self) -> Result<()> {
        validate_rate_and_block(self.sample_rate, self.block_size)?;
        if self.band_count == 0 || self.band_count > MAX_BANDS {
            return Err(MultibandError::InvalidBandCount {
                band_count: self.band_count,
                max: MAX_BANDS,
            });
        }
        Ok(())
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self::new(48000.0, 512, 3)
    }
}

fn validate_rate_and_block(sample_rate: f64, block_size: usize) -> Result<()> {
    if !sample_rate.is_finite() || sample_rate <= 0.0 {
        return Err(MultibandError::InvalidSampleRate { sample_rate });
    }
    if block_size == 0 {
        return Err(MultibandError::InvalidBlockSize { block_size });
    }
    Ok(())
}

/// Multiband compressor: crossover cascade, per-band compressors, summing
pub struct BandSplitNetwork {
    config: NetworkConfig,
    topology: Topology,
    crossovers: Vec<CrossoverFilter>,
    compressors: Vec<BandCompressor>,
    /// Per crossover: input in channels 0-1, `[low_L, low_R, high_L, high_R]` after processing
    crossover_buffers: Vec<AudioBuffer>,
    /// Per band: compressor input, then output
    band_buffers: Vec<AudioBuffer>,
    /// Copy of the block for `process_in_place`
    scratch: AudioBuffer,
}

impl BandSplitNetwork {
    /// Build a network for `config` with default parameter values
    ///
    /// Crossover cutoffs default to log-spaced frequencies between 40 Hz
    /// and 20 kHz.
    pub fn configure(config: NetworkConfig) -> Result<Self> {
        config.validate()?;
        let topology = Topology::cascade(config.band_count)?;

        let crossovers: Vec<CrossoverFilter> = default_cutoffs(config.band_count)
            .into_iter()
            .enumerate()
            .map(|(i, cutoff)| CrossoverFilter::new(i, cutoff))
            .collect();
        let compressors: Vec<BandCompressor> =
            (0..config.band_count).map(BandCompressor::new).collect();

        let crossover_buffers = (0..topology.crossover_count())
            .map(|_| AudioBuffer::with_capacity(ChannelLayout::SplitStereo, config.block_size))
            .collect();
        let band_buffers = (0..config.band_count)
            .map(|_| AudioBuffer::with_capacity(ChannelLayout::Stereo, config.block_size))
            .collect();

        let mut network = Self {
            config,
            topology,
            crossovers,
            compressors,
            crossover_buffers,
            band_buffers,
            scratch: AudioBuffer::with_capacity(ChannelLayout::Stereo, config.block_size),
        };
        network.prepare_stages();

        info!(
            "Configured {}-band network at {} Hz, block size {}",
            config.band_count, config.sample_rate, config.block_size
        );
        debug!("Topology:\n{}", network.topology);
        Ok(network)
    }

    /// Change sample rate and/or block size between blocks
    ///
    /// Filter delay lines and compressor envelopes are preserved;
    /// coefficients are recomputed for the new rate.
    pub fn reconfigure(&mut self, sample_rate: f64, block_size: usize) -> Result<()> {
        validate_rate_and_block(sample_rate, block_size)?;
        self.config.sample_rate = sample_rate;
        self.config.block_size = block_size;

        for buffer in self
            .crossover_buffers
            .iter_mut()
            .chain(self.band_buffers.iter_mut())
            .chain(std::iter::once(&mut self.scratch))
        {
            buffer.reserve(block_size);
        }
        self.prepare_stages();

        info!("Reconfigured network: {} Hz, block size {}", sample_rate, block_size);
        Ok(())
    }

    /// Clear every delay line and envelope; parameter values are untouched
    pub fn reset(&mut self) {
        for xover in &mut self.crossovers {
            xover.reset();
        }
        for comp in &mut self.compressors {
            comp.reset();
        }
        debug!("Network state reset");
    }

    fn prepare_stages(&mut self) {
        let (sample_rate, block_size) = (self.config.sample_rate, self.config.block_size);
        for xover in &mut self.crossovers {
            xover.prepare(sample_rate, block_size);
        }
        for comp in &mut self.compressors {
            comp.prepare(sample_rate, block_size);
        }
        for buffer in self
            .crossover_buffers
            .iter_mut()
            .chain(self.band_buffers.iter_mut())
        {
            buffer.sample_rate = sample_rate.round() as u32;
        }
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    pub fn config(&self) -> &NetworkConfig {
        &self.config
    }

    pub fn sample_rate(&self) -> f64 {
        self.config.sample_rate
    }

    pub fn block_size(&self) -> usize {
        self.config.block_size
    }

    pub fn band_count(&self) -> usize {
        self.config.band_count
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    /// Compressor of band `band` (0 = lowest frequencies)
    pub fn compressor(&self, band: usize) -> Option<&BandCompressor> {
        self.compressors.get(band)
    }

    /// Crossover `index` (0 = lowest cutoff)
    pub fn crossover(&self, index: usize) -> Option<&CrossoverFilter> {
        self.crossovers.get(index)
    }

    pub fn compressors(&self) -> &[BandCompressor] {
        &self.compressors
    }

    pub fn crossovers(&self) -> &[CrossoverFilter] {
        &self.crossovers
    }

    /// Output of band `band` from the most recent block
    pub fn band_output(&self, band: usize) -> Option<&AudioBuffer> {
        self.band_buffers.get(band)
    }

    /// Shared parameter by typed identity
    pub fn parameter(&self, id: &ParamId) -> Option<&Arc<Parameter>> {
        match *id {
            ParamId::Band { band, kind } => self.compressors.get(band).map(|c| c.params().get(kind)),
            ParamId::Cutoff { crossover } => self.crossovers.get(crossover).map(|x| x.cutoff()),
        }
    }

    /// Shared parameter by string identifier (`band_2_ratio`, `cutoff_1`)
    pub fn parameter_by_id(&self, id: &str) -> Result<&Arc<Parameter>> {
        let parsed: ParamId = id.parse()?;
        self.parameter(&parsed)
            .ok_or_else(|| MultibandError::UnknownParameter { id: id.to_string() })
    }

    /// Set a parameter by string identifier; the value is clamped to range
    pub fn set_parameter(&self, id: &str, value: f32) -> Result<()> {
        if !value.is_finite() {
            return Err(MultibandError::InvalidParameterValue {
                param: id.to_string(),
                value: value.to_string(),
            });
        }
        self.parameter_by_id(id)?.set(value);
        Ok(())
    }

    /// All parameters: compressors band by band, then crossover cutoffs
    pub fn parameters(&self) -> impl Iterator<Item = &Arc<Parameter>> + '_ {
        self.compressors
            .iter()
            .flat_map(|c| c.params().iter())
            .chain(self.crossovers.iter().map(|x| x.cutoff()))
    }

    // ------------------------------------------------------------------------
    // Processing
    // ------------------------------------------------------------------------

    /// Process one stereo block from `input` into `output`
    ///
    /// Both buffers must be stereo with equal length no larger than the
    /// configured block size.
    pub fn process(&mut self, input: &AudioBuffer, output: &mut AudioBuffer) -> Result<()> {
        self.check_block(input)?;
        if output.channels() != STEREO || output.len() != input.len() {
            return Err(MultibandError::BufferMismatch {
                reason: format!(
                    "output has {} channel(s) x {} frames, expected {} x {}",
                    output.channels(),
                    output.len(),
                    STEREO,
                    input.len()
                ),
            });
        }
        self.run(Some(input), output);
        Ok(())
    }

    /// Process one stereo block in place
    pub fn process_in_place(&mut self, buffer: &mut AudioBuffer) -> Result<()> {
        self.check_block(buffer)?;
        self.scratch.set_len(buffer.len());
        for ch in 0..STEREO {
            self.scratch.copy_channel_from(ch, buffer.channel(ch));
        }
        self.run(None, buffer);
        Ok(())
    }

    fn check_block(&self, input: &AudioBuffer) -> Result<()> {
        if input.channels() != STEREO {
            return Err(MultibandError::BufferMismatch {
                reason: format!("expected {} channels, got {}", STEREO, input.channels()),
            });
        }
        if input.len() > self.config.block_size {
            return Err(MultibandError::BlockTooLarge {
                frames: input.len(),
                block_size: self.config.block_size,
            });
        }
        Ok(())
    }

    /// Execute the topology for one validated block; `None` reads from scratch
    fn run(&mut self, input: Option<&AudioBuffer>, output: &mut AudioBuffer) {
        let Self {
            config,
            topology,
            crossovers,
            compressors,
            crossover_buffers,
            band_buffers,
            scratch,
        } = self;
        let input: &AudioBuffer = match input {
            Some(buffer) => buffer,
            None => scratch,
        };
        let sample_rate = config.sample_rate;
        let frames = input.len();

        for &stage in topology.execution_order() {
            match stage {
                Stage::Input => {}
                Stage::Crossover(i) => {
                    crossover_buffers[i].set_len(frames);
                    for conn in topology.inputs_to(stage) {
                        route(conn, input, crossover_buffers, band_buffers);
                    }
                    crossovers[i].process(sample_rate, &mut crossover_buffers[i]);
                }
                Stage::Compressor(i) => {
                    band_buffers[i].set_len(frames);
                    for conn in topology.inputs_to(stage) {
                        route(conn, input, crossover_buffers, band_buffers);
                    }
                    compressors[i].process(sample_rate, &mut band_buffers[i]);
                }
                Stage::Output => {
                    output.clear();
                    for conn in topology.inputs_to(stage) {
                        let source = source_channel(conn, input, crossover_buffers, band_buffers);
                        output.add_channel_from(conn.dest_port, source);
                    }
                }
            }
        }
    }
}

/// Output channel addressed by a connection's source side
fn source_channel<'a>(
    conn: &Connection,
    input: &'a AudioBuffer,
    crossover_buffers: &'a [AudioBuffer],
    band_buffers: &'a [AudioBuffer],
) -> &'a [f32] {
    match conn.source {
        Stage::Input => input.channel(conn.source_port),
        Stage::Crossover(i) => crossover_buffers[i].channel(conn.source_port),
        Stage::Compressor(i) => band_buffers[i].channel(conn.source_port),
        Stage::Output => &[],
    }
}

/// Copy one connection's source channel into its destination stage buffer
fn route(
    conn: &Connection,
    input: &AudioBuffer,
    crossover_buffers: &mut [AudioBuffer],
    band_buffers: &mut [AudioBuffer],
) {
    match (conn.source, conn.dest) {
        // Crossover to crossover: both live in the same Vec
        (Stage::Crossover(src), Stage::Crossover(dst)) => {
            let (source, dest) = pair_mut(crossover_buffers, src, dst);
            dest.copy_channel_from(conn.dest_port, source.channel(conn.source_port));
        }
        (Stage::Compressor(src), Stage::Compressor(dst)) => {
            let (source, dest) = pair_mut(band_buffers, src, dst);
            dest.copy_channel_from(conn.dest_port, source.channel(conn.source_port));
        }
        (_, Stage::Crossover(dst)) => {
            let source = source_channel(conn, input, &[], band_buffers);
            crossover_buffers[dst].copy_channel_from(conn.dest_port, source);
        }
        (_, Stage::Compressor(dst)) => {
            let source = source_channel(conn, input, crossover_buffers, &[]);
            band_buffers[dst].copy_channel_from(conn.dest_port, source);
        }
        (_, Stage::Input) | (_, Stage::Output) => {}
    }
}

/// Borrow `source` immutably and `dest` mutably from the same slice
fn pair_mut(buffers: &mut [AudioBuffer], source: usize, dest: usize) -> (&AudioBuffer, &mut AudioBuffer) {
    debug_assert_ne!(source, dest, "a stage cannot feed itself");
    if source < dest {
        let (head, tail) = buffers.split_at_mut(dest);
        (&head[source], &mut tail[0])
    } else {
        let (head, tail) = buffers.split_at_mut(source);
        (&tail[0], &mut head[dest])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::CompressorParam;
    use approx::assert_abs_diff_eq;

    fn stereo_block(frames: usize, value: f32) -> AudioBuffer {
        let mut buffer = AudioBuffer::new(frames, ChannelLayout::Stereo);
        for ch in &mut buffer.samples {
            ch.fill(value);
        }
        buffer
    }

    #[test]
    fn test_configure_rejects_bad_config() {
        let err = BandSplitNetwork::configure(NetworkConfig::new(48000.0, 512, 0)).err();
        assert_eq!(err.map(|e| e.error_code()), Some("INVALID_BAND_COUNT"));
        assert!(BandSplitNetwork::configure(NetworkConfig::new(0.0, 512, 2)).is_err());
        assert!(BandSplitNetwork::configure(NetworkConfig::new(f64::NAN, 512, 2)).is_err());
        assert!(BandSplitNetwork::configure(NetworkConfig::new(48000.0, 0, 2)).is_err());
    }

    #[test]
    fn test_stage_counts() {
        let net = BandSplitNetwork::configure(NetworkConfig::new(48000.0, 256, 5)).unwrap();
        assert_eq!(net.compressors().len(), 5);
        assert_eq!(net.crossovers().len(), 4);
        assert_eq!(net.parameters().count(), 5 * 6 + 4);
        assert!(net.compressor(5).is_none());
        assert!(net.crossover(4).is_none());
    }

    #[test]
    fn test_default_cutoffs_ascending() {
        let net = BandSplitNetwork::configure(NetworkConfig::new(48000.0, 256, 4)).unwrap();
        let cutoffs: Vec<f32> = net.crossovers().iter().map(|x| x.cutoff().get()).collect();
        assert!(cutoffs.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_parameter_lookup() {
        let net = BandSplitNetwork::configure(NetworkConfig::new(48000.0, 256, 3)).unwrap();
        net.set_parameter("band_2_ratio", 8.0).unwrap();
        assert_eq!(net.compressor(1).unwrap().params().ratio.get(), 8.0);
        assert_eq!(
            net.parameter(&ParamId::band(1, CompressorParam::Ratio))
                .unwrap()
                .get(),
            8.0
        );

        net.set_parameter("cutoff_2", 50000.0).unwrap();
        assert_eq!(net.crossover(1).unwrap().cutoff().get(), 20000.0);

        assert!(net.set_parameter("band_4_ratio", 2.0).is_err());
        assert!(net.set_parameter("cutoff_3", 100.0).is_err());
        assert!(net.set_parameter("band_1_ratio", f32::INFINITY).is_err());
    }

    #[test]
    fn test_block_validation() {
        let mut net = BandSplitNetwork::configure(NetworkConfig::new(48000.0, 128, 2)).unwrap();
        let input = stereo_block(256, 0.1);
        let mut output = stereo_block(256, 0.0);
        assert!(matches!(
            net.process(&input, &mut output),
            Err(MultibandError::BlockTooLarge { frames: 256, block_size: 128 })
        ));

        let mono = AudioBuffer::new(64, ChannelLayout::Mono);
        let mut out = stereo_block(64, 0.0);
        assert!(net.process(&mono, &mut out).is_err());

        let input = stereo_block(64, 0.1);
        let mut short = stereo_block(32, 0.0);
        assert!(net.process(&input, &mut short).is_err());
    }

    #[test]
    fn test_variable_block_lengths() {
        let mut net = BandSplitNetwork::configure(NetworkConfig::new(48000.0, 256, 3)).unwrap();
        for frames in [256, 17, 1, 0, 200] {
            let input = stereo_block(frames, 0.25);
            let mut output = stereo_block(frames, 0.0);
            net.process(&input, &mut output).unwrap();
            assert_eq!(output.len(), frames);
            assert!(output.is_finite());
        }
    }

    #[test]
    fn test_process_does_not_reallocate() {
        let mut net = BandSplitNetwork::configure(NetworkConfig::new(48000.0, 256, 3)).unwrap();
        let input = stereo_block(256, 0.5);
        let mut output = stereo_block(256, 0.0);
        net.process(&input, &mut output).unwrap();
        let ptrs: Vec<*const f32> = net.band_buffers.iter().map(|b| b.channel(0).as_ptr()).collect();
        for frames in [100, 256, 3] {
            let input = stereo_block(frames, 0.5);
            let mut output = stereo_block(frames, 0.0);
            net.process(&input, &mut output).unwrap();
        }
        let after: Vec<*const f32> = net.band_buffers.iter().map(|b| b.channel(0).as_ptr()).collect();
        assert_eq!(ptrs, after);
    }

    #[test]
    fn test_in_place_matches_out_of_place() {
        let cfg = NetworkConfig::new(48000.0, 512, 3);
        let mut a = BandSplitNetwork::configure(cfg).unwrap();
        let mut b = BandSplitNetwork::configure(cfg).unwrap();

        let mut input = AudioBuffer::new(512, ChannelLayout::Stereo);
        for (i, s) in input.channel_mut(0).iter_mut().enumerate() {
            *s = ((i as f32) * 0.05).sin() * 0.8;
        }
        let mut output = stereo_block(512, 0.0);
        a.process(&input, &mut output).unwrap();

        let mut in_place = input.clone();
        b.process_in_place(&mut in_place).unwrap();
        for ch in 0..2 {
            for (x, y) in output.channel(ch).iter().zip(in_place.channel(ch)) {
                assert_abs_diff_eq!(*x, *y, epsilon = 1e-7);
            }
        }
    }

    #[test]
    fn test_output_is_sum_of_bands() {
        let mut net = BandSplitNetwork::configure(NetworkConfig::new(48000.0, 512, 4)).unwrap();
        let mut input = AudioBuffer::new(512, ChannelLayout::Stereo);
        for ch in 0..2 {
            for (i, s) in input.channel_mut(ch).iter_mut().enumerate() {
                *s = ((i as f32) * 0.3).sin() * 0.7;
            }
        }
        let mut output = stereo_block(512, 0.0);
        net.process(&input, &mut output).unwrap();

        for ch in 0..2 {
            for n in 0..512 {
                let sum: f32 = (0..4).map(|b| net.band_output(b).unwrap().channel(ch)[n]).sum();
                assert_abs_diff_eq!(output.channel(ch)[n], sum, epsilon = 1e-6);
            }
        }
    }

    #[test]
    fn test_reconfigure_preserves_state() {
        let mut net = BandSplitNetwork::configure(NetworkConfig::new(44100.0, 128, 2)).unwrap();
        net.compressor(0).unwrap().params().threshold_db.set(-30.0);
        let input = stereo_block(128, 0.9);
        let mut output = stereo_block(128, 0.0);
        net.process(&input, &mut output).unwrap();
        let gr = net.compressor(0).unwrap().gain_reduction_db();
        assert!(gr < 0.0);

        net.reconfigure(96000.0, 1024).unwrap();
        assert_eq!(net.compressor(0).unwrap().gain_reduction_db(), gr);
        assert!(!net.crossover(0).unwrap().is_cleared());
        assert_eq!(net.block_size(), 1024);

        let input = stereo_block(1024, 0.9);
        let mut output = stereo_block(1024, 0.0);
        net.process(&input, &mut output).unwrap();
        assert!(net.reconfigure(-1.0, 1024).is_err());
    }

    #[test]
    fn test_reset_clears_history_only() {
        let mut net = BandSplitNetwork::configure(NetworkConfig::new(48000.0, 256, 3)).unwrap();
        net.set_parameter("band_1_threshold", -40.0).unwrap();
        let input = stereo_block(256, 0.8);
        let mut output = stereo_block(256, 0.0);
        net.process(&input, &mut output).unwrap();
        assert!(net.compressor(0).unwrap().gain_reduction_db() < 0.0);

        net.reset();
        assert!(net.compressors().iter().all(|c| c.gain_reduction_db() == 0.0));
        assert!(net.crossovers().iter().all(|x| x.is_cleared()));
        assert_eq!(net.parameter_by_id("band_1_threshold").unwrap().get(), -40.0);
    }
}
