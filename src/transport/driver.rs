//! Parallel transport driver.
//!
//! Packets are embarrassingly parallel: the driver partitions them into
//! chunks, runs each chunk's event loops on the rayon pool with private
//! estimator and counter buffers, and merges the buffers in chunk order.
//! Each packet draws from its own generator stream derived from the run
//! seed and the packet index, so the emergent spectrum is identical for
//! any worker count, and estimator totals are identical whenever the
//! chunk boundaries coincide.

use rayon::prelude::*;
use tracing::info;

use crate::error::{KernelResult, SnapshotError};
use crate::model::ModelSnapshot;
use crate::packet::{Packet, PacketOutcome, PacketPopulation};
use crate::stochastic::RandomGenerator;

use super::estimators::Estimators;
use super::{propagate_packet, TransportStats};

/// Tunables for one transport run
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Base seed; packet i draws from stream `seed + i`
    pub seed: u64,
    /// Packets per worker task
    pub chunk_size: usize,
    /// Fail the run on numeric anomalies instead of clamping
    pub strict: bool,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            seed: 12345,
            chunk_size: 64,
            strict: false,
        }
    }
}

/// Everything a transport run produces
#[derive(Debug, Clone)]
pub struct TransportResult {
    /// Emergent frequencies (Hz); negative marks a reabsorbed packet
    pub output_nu: Vec<f64>,
    /// Emergent energies (erg), same sign convention
    pub output_energy: Vec<f64>,
    /// Per-shell mean-intensity estimator J
    pub j: Vec<f64>,
    /// Per-shell frequency-weighted estimator ν̄
    pub nubar: Vec<f64>,
    /// Event counters summed over all workers
    pub stats: TransportStats,
}

impl TransportResult {
    /// Fraction of packets that escaped
    pub fn escaped_fraction(&self) -> f64 {
        let total = self.stats.escaped + self.stats.reabsorbed;
        if total == 0 {
            return 0.0;
        }
        self.stats.escaped as f64 / total as f64
    }

    /// Total energy leaving the outer boundary (erg)
    pub fn emergent_energy(&self) -> f64 {
        self.output_energy.iter().filter(|&&e| e > 0.0).sum()
    }
}

struct ChunkOutput {
    outcomes: Vec<PacketOutcome>,
    estimators: Estimators,
    stats: TransportStats,
}

/// Transport a packet population through a snapshot
///
/// Validates the snapshot, runs every packet to escape or reabsorption,
/// and reduces the worker-local buffers. The outcome of packet i lands at
/// index i of the output arrays regardless of scheduling.
pub fn run_transport(
    model: &ModelSnapshot,
    packets: &PacketPopulation,
    config: &TransportConfig,
) -> KernelResult<TransportResult> {
    model.validate()?;
    if !packets.consistent() {
        return Err(SnapshotError::LengthMismatch("packet arrays").into());
    }

    let n_packets = packets.len();
    let chunk_size = config.chunk_size.max(1);
    let indices: Vec<usize> = (0..n_packets).collect();

    let chunks: Vec<KernelResult<ChunkOutput>> = indices
        .par_chunks(chunk_size)
        .map(|ids| {
            let mut estimators = Estimators::new(model.n_shells());
            let mut stats = TransportStats::default();
            let mut outcomes = Vec::with_capacity(ids.len());
            for &i in ids {
                let mut rng = RandomGenerator::for_stream(config.seed, i as u64);
                let mut packet = Packet::launch(
                    packets.nu[i],
                    packets.mu[i],
                    packets.energy[i],
                    model,
                    &mut rng,
                );
                let outcome = propagate_packet(
                    &mut packet,
                    model,
                    &mut rng,
                    &mut estimators,
                    &mut stats,
                    config.strict,
                    i,
                )?;
                outcomes.push(outcome);
            }
            Ok(ChunkOutput {
                outcomes,
                estimators,
                stats,
            })
        })
        .collect();

    let mut output_nu = Vec::with_capacity(n_packets);
    let mut output_energy = Vec::with_capacity(n_packets);
    let mut estimators = Estimators::new(model.n_shells());
    let mut stats = TransportStats::default();

    for chunk in chunks {
        let chunk = chunk?;
        for outcome in &chunk.outcomes {
            let sign = if outcome.reabsorbed { -1.0 } else { 1.0 };
            output_nu.push(sign * outcome.nu);
            output_energy.push(sign * outcome.energy);
        }
        estimators.merge(&chunk.estimators);
        stats.merge(&chunk.stats);
    }

    info!(
        packets = n_packets,
        escaped = stats.escaped,
        reabsorbed = stats.reabsorbed,
        line_scatters = stats.line_scatters,
        electron_scatters = stats.electron_scatters,
        "transport run complete"
    );

    Ok(TransportResult {
        output_nu,
        output_energy,
        j: estimators.j,
        nubar: estimators.nubar,
        stats,
    })
}
