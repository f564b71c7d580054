//! # Macro Atom Module
//!
//! Table-driven sampling of line fluorescence.
//!
//! ## Theory
//!
//! A line absorption activates an upper atomic level. The macro atom
//! (Lucy 2002, 2003) then performs a random walk over internal levels
//! until a transition of emission type is drawn; the packet re-emerges in
//! the line attached to that transition:
//!
//! ```text
//! absorb line ℓ → level m → [internal up / internal down]* → emit line ℓ'
//! ```
//!
//! The walk is a flat probability network: for each level m the slots
//! `block_refs[m]..block_refs[m+1]` of the per-shell transition arrays
//! hold its outgoing probabilities, which sum to one per shell. No level
//! graph is materialized; the tables are the whole atom.
//!
//! ## References
//!
//! - Lucy, L. B. (2002): "Monte Carlo transition probabilities"
//! - Lucy, L. B. (2003): "Monte Carlo transition probabilities. II."
//!
//! ## Author
//! Francisco Molina-Burgos, Avermex Research Division

use crate::stochastic::RandomGenerator;

/// Transition slot type: emission terminates the walk
pub const TRANSITION_EMISSION: i32 = -1;

/// Transition slot type: internal transition to a lower level
pub const TRANSITION_INTERNAL_DOWN: i32 = 0;

/// Transition slot type: internal transition to a higher level
pub const TRANSITION_INTERNAL_UP: i32 = 1;

/// Flat transition tables for the macro-atom probability network
///
/// Probabilities are row-major by shell: slot t of shell s lives at
/// `s * n_transitions + t`.
#[derive(Debug, Clone, Default)]
pub struct MacroAtomData {
    /// Upper level activated when each line is absorbed
    pub line2macro_upper: Vec<usize>,
    /// Block start offset per level; last entry is the transition count
    pub block_refs: Vec<usize>,
    /// Per-shell, per-slot transition probabilities
    pub transition_probabilities: Vec<f64>,
    /// Slot type: emission (−1), internal down (0), internal up (>0)
    pub transition_type: Vec<i32>,
    /// Destination level for internal slots
    pub transition_destination_level: Vec<usize>,
    /// Emitted line index for emission slots
    pub transition_line_id: Vec<usize>,
}

impl MacroAtomData {
    /// Tables for pure resonance scattering: the walk is never entered
    pub fn empty() -> Self {
        Self {
            block_refs: vec![0],
            ..Self::default()
        }
    }

    /// Number of macro levels
    pub fn n_levels(&self) -> usize {
        self.block_refs.len().saturating_sub(1)
    }

    /// Number of transition slots
    pub fn n_transitions(&self) -> usize {
        self.transition_type.len()
    }

    /// Probability of slot t in shell s
    #[inline]
    pub fn probability(&self, shell: usize, slot: usize) -> f64 {
        self.transition_probabilities[shell * self.n_transitions() + slot]
    }
}

/// Sample the macro-atom walk until emission
///
/// Returns the index of the emitted line. Termination of the inner scan
/// relies on each block summing to one per shell (validated before
/// transport); termination of the walk relies on every internal chain
/// reaching an emission slot, which holds for any physical level network.
pub fn sample_emission(
    data: &MacroAtomData,
    shell: usize,
    upper_level: usize,
    rng: &mut RandomGenerator,
) -> usize {
    let mut level = upper_level;
    loop {
        let start = data.block_refs[level];
        let end = data.block_refs[level + 1];

        let zrand = rng.uniform();
        let mut cumulative = 0.0;
        let mut slot = start;
        loop {
            cumulative += data.probability(shell, slot);
            if cumulative > zrand || slot + 1 >= end {
                break;
            }
            slot += 1;
        }

        if data.transition_type[slot] == TRANSITION_EMISSION {
            return data.transition_line_id[slot];
        }
        level = data.transition_destination_level[slot];
    }
}
