//! Presets
//!
//! A preset is a JSON snapshot of every parameter of a network. Values are
//! written back through the shared parameters, so anything out of range in
//! a hand-edited file is clamped rather than rejected.

use std::fs;
use std::path::Path;

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::error::{MultibandError, Result};
use crate::network::{BandSplitNetwork, MAX_BANDS};
use crate::params::{default_cutoffs, CompressorParam};

/// Compressor settings of one band
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BandSettings {
    pub attack_ms: f32,
    pub release_ms: f32,
    pub makeup_db: f32,
    pub knee_db: f32,
    pub threshold_db: f32,
    pub ratio: f32,
}

impl BandSettings {
    pub fn get(&self, kind: CompressorParam) -> f32 {
        match kind {
            CompressorParam::Attack => self.attack_ms,
            CompressorParam::Release => self.release_ms,
            CompressorParam::Makeup => self.makeup_db,
            CompressorParam::Knee => self.knee_db,
            CompressorParam::Threshold => self.threshold_db,
            CompressorParam::Ratio => self.ratio,
        }
    }

    fn set(&mut self, kind: CompressorParam, value: f32) {
        let slot = match kind {
            CompressorParam::Attack => &mut self.attack_ms,
            CompressorParam::Release => &mut self.release_ms,
            CompressorParam::Makeup => &mut self.makeup_db,
            CompressorParam::Knee => &mut self.knee_db,
            CompressorParam::Threshold => &mut self.threshold_db,
            CompressorParam::Ratio => &mut self.ratio,
        };
        *slot = value;
    }
}

impl Default for BandSettings {
    fn default() -> Self {
        let mut settings = Self {
            attack_ms: 0.0,
            release_ms: 0.0,
            makeup_db: 0.0,
            knee_db: 0.0,
            threshold_db: 0.0,
            ratio: 0.0,
        };
        for kind in CompressorParam::ALL {
            settings.set(kind, kind.range().default);
        }
        settings
    }
}

/// Full parameter snapshot of a network
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preset {
    pub band_count: usize,
    pub bands: Vec<BandSettings>,
    pub crossovers_hz: Vec<f32>,
}

impl Preset {
    /// Default settings for a `band_count`-band network
    pub fn default_for(band_count: usize) -> Result<Self> {
        if band_count == 0 || band_count > MAX_BANDS {
            return Err(MultibandError::InvalidBandCount {
                band_count,
                max: MAX_BANDS,
            });
        }
        Ok(Self {
            band_count,
            bands: vec![BandSettings::default(); band_count],
            crossovers_hz: default_cutoffs(band_count),
        })
    }

    /// Snapshot the current parameter values of `network`
    pub fn capture(network: &BandSplitNetwork) -> Self {
        let bands = network
            .compressors()
            .iter()
            .map(|comp| {
                let mut settings = BandSettings::default();
                for kind in CompressorParam::ALL {
                    settings.set(kind, comp.params().get(kind).get());
                }
                settings
            })
            .collect();
        let crossovers_hz = network
            .crossovers()
            .iter()
            .map(|x| x.cutoff().get())
            .collect();

        Self {
            band_count: network.band_count(),
            bands,
            crossovers_hz,
        }
    }

    /// Write every value into `network`'s parameters
    pub fn apply(&self, network: &BandSplitNetwork) -> Result<()> {
        self.check_shape()?;
        if self.band_count != network.band_count() {
            return Err(MultibandError::PresetMismatch {
                preset_bands: self.band_count,
                network_bands: network.band_count(),
            });
        }

        for (comp, settings) in network.compressors().iter().zip(&self.bands) {
            for kind in CompressorParam::ALL {
                let param = comp.params().get(kind);
                let value = settings.get(kind);
                if !param.range().contains(value) {
                    warn!("{} = {} out of range, clamping", param.id(), value);
                }
                param.set(value);
            }
        }
        for (xover, &cutoff) in network.crossovers().iter().zip(&self.crossovers_hz) {
            if !xover.cutoff().range().contains(cutoff) {
                warn!("{} = {} out of range, clamping", xover.cutoff().id(), cutoff);
            }
            xover.cutoff().set(cutoff);
        }
        Ok(())
    }

    /// Read a preset from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let preset: Preset = serde_json::from_str(&content)?;
        preset.check_shape()?;
        info!(
            "Loaded {}-band preset from {}",
            preset.band_count,
            path.display()
        );
        Ok(preset)
    }

    /// Write the preset as pretty-printed JSON
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        info!("Saved {}-band preset to {}", self.band_count, path.display());
        Ok(())
    }

    /// `bands` and `crossovers_hz` must agree with `band_count`
    fn check_shape(&self) -> Result<()> {
        if self.band_count == 0 || self.band_count > MAX_BANDS {
            return Err(MultibandError::InvalidBandCount {
                band_count: self.band_count,
                max: MAX_BANDS,
            });
        }
        if self.bands.len() != self.band_count {
            return Err(MultibandError::PresetMismatch {
                preset_bands: self.bands.len(),
                network_bands: self.band_count,
            });
        }
        if self.crossovers_hz.len() != self.band_count - 1 {
            return Err(MultibandError::PresetMismatch {
                preset_bands: self.crossovers_hz.len() + 1,
                network_bands: self.band_count,
            });
        }
        Ok(())
    }
}
