//! Band-split topology
//!
//! The shape of a network is an explicit list of per-channel connections
//! plus an execution order. For `N` bands the cascade is:
//!
//! ```text
//! Input ── X0 ─┬─ low ─────────────────────────────► C0 ─┐
//!              └─ high ── X1 ─┬─ low ──────────────► C1 ─┤
//!                             └─ high ── ... X(N-2) ─┬─ low ─► C(N-2) ─┤
//!                                                    └─ high ► C(N-1) ─┴─► Output (sum)
//! ```
//!
//! With one band there are no crossovers and the input feeds C0 directly.

use std::fmt;

use crate::error::{MultibandError, Result};

/// Largest supported band count
pub const MAX_BANDS: usize = 16;

/// Channels carried between stages
pub const STEREO: usize = 2;

/// A node in the processing graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Input,
    Crossover(usize),
    Compressor(usize),
    Output,
}

impl Stage {
    /// Number of output ports the stage exposes
    pub fn output_ports(&self) -> usize {
        match self {
            Stage::Input | Stage::Compressor(_) => STEREO,
            Stage::Crossover(_) => 2 * STEREO,
            Stage::Output => 0,
        }
    }

    /// Number of input ports the stage accepts
    pub fn input_ports(&self) -> usize {
        match self {
            Stage::Input => 0,
            Stage::Crossover(_) | Stage::Compressor(_) | Stage::Output => STEREO,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Input => write!(f, "input"),
            Stage::Crossover(i) => write!(f, "crossover[{}]", i),
            Stage::Compressor(i) => write!(f, "compressor[{}]", i),
            Stage::Output => write!(f, "output"),
        }
    }
}

/// One channel routed from a stage output port to a stage input port
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Connection {
    pub source: Stage,
    pub source_port: usize,
    pub dest: Stage,
    pub dest_port: usize,
}

impl Connection {
    pub fn new(source: Stage, source_port: usize, dest: Stage, dest_port: usize) -> Self {
        Self {
            source,
            source_port,
            dest,
            dest_port,
        }
    }
}

impl fmt::Display for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{} -> {}:{}",
            self.source, self.source_port, self.dest, self.dest_port
        )
    }
}

/// Immutable connection graph for a fixed band count
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topology {
    band_count: usize,
    connections: Vec<Connection>,
    order: Vec<Stage>,
}

impl Topology {
    /// Build the binary cascade for `band_count` bands
    pub fn cascade(band_count: usize) -> Result<Self> {
        if band_count == 0 || band_count > MAX_BANDS {
            return Err(MultibandError::InvalidBandCount {
                band_count,
                max: MAX_BANDS,
            });
        }

        let crossover_count = band_count - 1;
        let mut connections = Vec::with_capacity(STEREO * (2 * band_count + crossover_count));
        let mut order = Vec::with_capacity(2 * band_count + 1);
        order.push(Stage::Input);

        if crossover_count == 0 {
            for ch in 0..STEREO {
                connections.push(Connection::new(Stage::Input, ch, Stage::Compressor(0), ch));
            }
            order.push(Stage::Compressor(0));
        } else {
            for ch in 0..STEREO {
                connections.push(Connection::new(Stage::Input, ch, Stage::Crossover(0), ch));
            }
            for i in 0..crossover_count {
                let high_dest = if i + 1 < crossover_count {
                    Stage::Crossover(i + 1)
                } else {
                    Stage::Compressor(i + 1)
                };
                for ch in 0..STEREO {
                    connections.push(Connection::new(
                        Stage::Crossover(i),
                        ch,
                        Stage::Compressor(i),
                        ch,
                    ));
                    connections.push(Connection::new(
                        Stage::Crossover(i),
                        ch + STEREO,
                        high_dest,
                        ch,
                    ));
                }
                // A band's compressor runs as soon as its sub-band exists
                order.push(Stage::Crossover(i));
                order.push(Stage::Compressor(i));
            }
            order.push(Stage::Compressor(crossover_count));
        }

        for band in 0..band_count {
            for ch in 0..STEREO {
                connections.push(Connection::new(
                    Stage::Compressor(band),
                    ch,
                    Stage::Output,
                    ch,
                ));
            }
        }
        order.push(Stage::Output);

        let topology = Self {
            band_count,
            connections,
            order,
        };
        topology.validate()?;
        Ok(topology)
    }

    pub fn band_count(&self) -> usize {
        self.band_count
    }

    pub fn crossover_count(&self) -> usize {
        self.band_count - 1
    }

    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    /// Stages in dependency order, `Input` first and `Output` last
    pub fn execution_order(&self) -> &[Stage] {
        &self.order
    }

    /// Connections feeding `stage`
    pub fn inputs_to(&self, stage: Stage) -> impl Iterator<Item = &Connection> + '_ {
        self.connections.iter().filter(move |c| c.dest == stage)
    }

    /// Connections leaving `stage`
    pub fn outputs_of(&self, stage: Stage) -> impl Iterator<Item = &Connection> + '_ {
        self.connections.iter().filter(move |c| c.source == stage)
    }

    /// Check ports, stage indices, and that every source runs before its destination
    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: String| Err(MultibandError::InvalidTopology { reason });

        let position = |stage: Stage| self.order.iter().position(|s| *s == stage);
        let in_range = |stage: Stage| match stage {
            Stage::Crossover(i) => i < self.crossover_count(),
            Stage::Compressor(i) => i < self.band_count,
            Stage::Input | Stage::Output => true,
        };

        for stage in &self.order {
            if !in_range(*stage) {
                return invalid(format!("{} does not exist for {} bands", stage, self.band_count));
            }
        }

        for conn in &self.connections {
            if conn.source_port >= conn.source.output_ports() {
                return invalid(format!("{}: source port out of range", conn));
            }
            if conn.dest_port >= conn.dest.input_ports() {
                return invalid(format!("{}: destination port out of range", conn));
            }
            match (position(conn.source), position(conn.dest)) {
                (Some(src), Some(dst)) if src < dst => {}
                (Some(_), Some(_)) => {
                    return invalid(format!("{}: destination runs before source", conn));
                }
                _ => return invalid(format!("{}: stage missing from execution order", conn)),
            }
        }

        // Every processing stage needs each input port fed exactly once
        for stage in &self.order {
            if matches!(stage, Stage::Crossover(_) | Stage::Compressor(_)) {
                for port in 0..stage.input_ports() {
                    let feeds = self
                        .inputs_to(*stage)
                        .filter(|c| c.dest_port == port)
                        .count();
                    if feeds != 1 {
                        return invalid(format!("{} port {} has {} inputs", stage, port, feeds));
                    }
                }
            }
        }

        Ok(())
    }
}

impl fmt::Display for Topology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} band(s), {} crossover(s)", self.band_count, self.crossover_count())?;
        let order: Vec<String> = self.order.iter().map(|s| s.to_string()).collect();
        writeln!(f, "order: {}", order.join(" -> "))?;
        for conn in &self.connections {
            writeln!(f, "  {}", conn)?;
        }
        Ok(())
    }
}
