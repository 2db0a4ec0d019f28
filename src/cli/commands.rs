//! CLI Command Implementations
//!
//! Implements the actual logic for each CLI command.

use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use log::{debug, info};

use crate::engine::{
    export_audio, import_audio, linear_to_db, to_mono, to_stereo, AudioBuffer, ChannelLayout,
    ExportFormat,
};
use crate::network::{BandSplitNetwork, NetworkConfig, Topology};
use crate::preset::Preset;

/// Parse a `--set` argument of the form `id=value`
pub fn parse_assignment(arg: &str) -> Result<(String, f32)> {
    let (id, value) = arg
        .split_once('=')
        .ok_or_else(|| anyhow!("expected ID=VALUE, got '{}'", arg))?;
    let value: f32 = value
        .trim()
        .parse()
        .with_context(|| format!("invalid value in '{}'", arg))?;
    Ok((id.trim().to_string(), value))
}

/// Options for [`process_file`]
#[derive(Debug, Clone)]
pub struct ProcessOptions<'a> {
    pub bands: usize,
    pub block_size: usize,
    pub preset: Option<&'a Path>,
    pub overrides: &'a [String],
    pub bit_depth: u16,
}

/// Run a WAV file through a freshly configured network, block by block.
pub fn process_file(input: &Path, output: &Path, options: &ProcessOptions<'_>) -> Result<()> {
    info!("Processing {} -> {}", input.display(), output.display());

    let source = import_audio(input)
        .with_context(|| format!("failed to read {}", input.display()))?;
    let was_mono = source.channels() == 1;
    let source = to_stereo(source);
    let sample_rate = source.sample_rate;

    let config = NetworkConfig::new(sample_rate as f64, options.block_size, options.bands);
    let mut network = BandSplitNetwork::configure(config).context("invalid network configuration")?;

    if let Some(preset_path) = options.preset {
        let preset = Preset::load(preset_path)
            .with_context(|| format!("failed to load preset {}", preset_path.display()))?;
        preset.apply(&network)?;
    }
    for arg in options.overrides {
        let (id, value) = parse_assignment(arg)?;
        network
            .set_parameter(&id, value)
            .with_context(|| format!("cannot set '{}'", id))?;
        debug!("{} = {}", id, network.parameter_by_id(&id)?.get());
    }

    let total = source.len();
    let mut rendered = AudioBuffer::new(total, ChannelLayout::Stereo);
    rendered.sample_rate = sample_rate;
    let mut block_in = AudioBuffer::with_capacity(ChannelLayout::Stereo, options.block_size);
    let mut block_out = AudioBuffer::with_capacity(ChannelLayout::Stereo, options.block_size);

    let mut start = 0;
    while start < total {
        let end = (start + options.block_size).min(total);
        block_in.set_len(end - start);
        block_out.set_len(end - start);
        for ch in 0..2 {
            block_in.copy_channel_from(ch, &source.channel(ch)[start..end]);
        }
        network.process(&block_in, &mut block_out)?;
        for ch in 0..2 {
            rendered.channel_mut(ch)[start..end].copy_from_slice(block_out.channel(ch));
        }
        start = end;
    }

    let rendered = if was_mono { to_mono(&rendered) } else { rendered };
    if !rendered.is_finite() {
        bail!("processing produced non-finite samples");
    }
    let (peak_in, peak_out) = (source.peak(), rendered.peak());

    export_audio(&rendered, output, ExportFormat::new(options.bit_depth))
        .with_context(|| format!("failed to write {}", output.display()))?;

    let gr: Vec<String> = network
        .compressors()
        .iter()
        .map(|c| format!("{:.1}", c.gain_reduction_db()))
        .collect();
    println!(
        "Processed {} frames at {} Hz through {} band(s)",
        total,
        sample_rate,
        network.band_count()
    );
    println!(
        "Peak: {:.1} dBFS in, {:.1} dBFS out",
        linear_to_db(peak_in),
        linear_to_db(peak_out)
    );
    println!("Final gain per band (dB): [{}]", gr.join(", "));
    println!("Written: {}", output.display());

    Ok(())
}

/// List every parameter of an N-band network.
pub fn list_params(bands: usize) -> Result<()> {
    let network = BandSplitNetwork::configure(NetworkConfig {
        band_count: bands,
        ..NetworkConfig::default()
    })?;

    println!(
        "{:<22} {:<26} {:>9} {:>9} {:>9}  Unit",
        "ID", "Name", "Min", "Max", "Default"
    );
    println!("{:-<84}", "");
    for param in network.parameters() {
        let range = param.range();
        println!(
            "{:<22} {:<26} {:>9.1} {:>9.1} {:>9.1}  {}",
            param.id().to_string(),
            param.name(),
            range.min,
            range.max,
            range.default,
            param.id().unit()
        );
    }
    Ok(())
}

/// Write (or print) the default preset for an N-band network.
pub fn write_default_preset(bands: usize, output: Option<&Path>) -> Result<()> {
    let preset = Preset::default_for(bands)?;
    match output {
        Some(path) => {
            preset
                .save(path)
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("Preset written: {}", path.display());
        }
        None => println!("{}", serde_json::to_string_pretty(&preset)?),
    }
    Ok(())
}

/// Print the connection graph of an N-band network.
pub fn show_topology(bands: usize) -> Result<()> {
    let topology = Topology::cascade(bands)?;
    print!("{}", topology);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::generate_test_tone;
    use tempfile::TempDir;

    #[test]
    fn test_parse_assignment() {
        let (id, value) = parse_assignment("band_2_ratio=4.5").unwrap();
        assert_eq!(id, "band_2_ratio");
        assert_eq!(value, 4.5);
        assert!(parse_assignment("band_2_ratio").is_err());
        assert!(parse_assignment("band_2_ratio=loud").is_err());
    }

    #[test]
    fn test_process_mono_file() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("in.wav");
        let output = dir.path().join("out.wav");
        let tone = generate_test_tone(220.0, 0.25, 44100);
        export_audio(&tone, &input, ExportFormat::new(32)).unwrap();

        let overrides = vec!["band_1_threshold=-30".to_string()];
        let options = ProcessOptions {
            bands: 2,
            block_size: 300,
            preset: None,
            overrides: &overrides,
            bit_depth: 16,
        };
        process_file(&input, &output, &options).unwrap();

        let result = import_audio(&output).unwrap();
        assert_eq!(result.channels(), 1);
        assert_eq!(result.len(), tone.len());
        assert_eq!(result.sample_rate, 44100);
    }

    #[test]
    fn test_process_rejects_unknown_override() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("in.wav");
        export_audio(&generate_test_tone(440.0, 0.05, 48000), &input, ExportFormat::default())
            .unwrap();

        let overrides = vec!["band_9_ratio=2".to_string()];
        let options = ProcessOptions {
            bands: 3,
            block_size: 256,
            preset: None,
            overrides: &overrides,
            bit_depth: 24,
        };
        assert!(process_file(&input, &dir.path().join("out.wav"), &options).is_err());
    }

    #[test]
    fn test_write_default_preset() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("p.json");
        write_default_preset(4, Some(&path)).unwrap();
        assert_eq!(Preset::load(&path).unwrap().band_count, 4);
        assert!(write_default_preset(0, None).is_err());
    }
}
