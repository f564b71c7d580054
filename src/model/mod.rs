//! # Model Module
//!
//! The immutable plasma/atomic snapshot consumed by the transport kernel.
//!
//! ## Layout
//!
//! The snapshot is a flat structure-of-arrays: shell boundaries, per-shell
//! electron densities, the rest-frame line frequency table, the Sobolev
//! optical-depth matrix (row-major by shell) and the macro-atom transition
//! tables. Nothing in here mutates during a run; the same snapshot is
//! shared read-only by every worker.
//!
//! An outer driver (plasma solver, atomic data ingestion) produces one
//! snapshot per iteration; this module only checks its contracts and
//! serves indexed access.
//!
//! ## Author
//! Francisco Molina-Burgos, Avermex Research Division

use crate::constants::INVERSE_C_LIGHT;
use crate::error::SnapshotError;
use crate::macroatom::{MacroAtomData, TRANSITION_EMISSION};

/// How an absorbed line re-emits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineInteractionMode {
    /// Resonance scattering: re-emit in the absorbing line
    #[default]
    Scatter,
    /// Downbranch: single macro-atom jump, always an emission
    Downbranch,
    /// Full macro-atom walk with internal transitions
    MacroAtom,
}

impl LineInteractionMode {
    /// Decode the integer id used by external drivers (0, 1, 2)
    pub fn from_id(id: i64) -> Option<Self> {
        match id {
            0 => Some(Self::Scatter),
            1 => Some(Self::Downbranch),
            2 => Some(Self::MacroAtom),
            _ => None,
        }
    }

    /// The kernel only distinguishes resonance scattering from the two
    /// table-driven modes
    #[inline]
    pub fn uses_macro_atom(self) -> bool {
        !matches!(self, Self::Scatter)
    }
}

/// Immutable input snapshot for one transport iteration
#[derive(Debug, Clone)]
pub struct ModelSnapshot {
    /// Shell inner boundary radii (cm), strictly increasing
    pub r_inner: Vec<f64>,
    /// Shell outer boundary radii (cm); `r_outer[i] == r_inner[i+1]`
    pub r_outer: Vec<f64>,
    /// Inner boundary velocities (cm/s), diagnostics only
    pub v_inner: Vec<f64>,
    /// Electron number density per shell (cm⁻³), strictly positive
    pub electron_density: Vec<f64>,
    /// Elementwise reciprocal of the electron density
    pub inverse_electron_density: Vec<f64>,
    /// Rest-frame line frequencies (Hz), strictly decreasing
    pub line_list_nu: Vec<f64>,
    /// Sobolev optical depths, row-major `[shell][line]`
    pub tau_sobolev: Vec<f64>,
    /// Emission selector for line interactions
    pub line_interaction: LineInteractionMode,
    /// Macro-atom transition tables (empty in Scatter mode)
    pub macro_atom: MacroAtomData,
    /// Time since explosion (s)
    pub time_explosion: f64,
    /// Precomputed 1 / time_explosion (s⁻¹)
    pub inverse_time_explosion: f64,
    /// Precomputed 1 / (c · time_explosion) (cm⁻¹)
    pub inverse_ct: f64,
}

impl ModelSnapshot {
    /// Assemble a snapshot, precomputing the derived reciprocals
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        r_inner: Vec<f64>,
        r_outer: Vec<f64>,
        v_inner: Vec<f64>,
        electron_density: Vec<f64>,
        line_list_nu: Vec<f64>,
        tau_sobolev: Vec<f64>,
        line_interaction: LineInteractionMode,
        macro_atom: MacroAtomData,
        time_explosion: f64,
    ) -> Self {
        let inverse_electron_density = electron_density.iter().map(|&n| 1.0 / n).collect();
        Self {
            r_inner,
            r_outer,
            v_inner,
            electron_density,
            inverse_electron_density,
            line_list_nu,
            tau_sobolev,
            line_interaction,
            macro_atom,
            time_explosion,
            inverse_time_explosion: 1.0 / time_explosion,
            inverse_ct: INVERSE_C_LIGHT / time_explosion,
        }
    }

    /// Uniform homologous snapshot: shells on an even velocity grid with
    /// constant electron density and one Sobolev depth for every line in
    /// every shell. The workhorse model for tests, benches and the demo.
    #[allow(clippy::too_many_arguments)]
    pub fn homologous(
        n_shells: usize,
        v_inner_edge: f64,
        v_outer_edge: f64,
        time_explosion: f64,
        electron_density: f64,
        line_list_nu: Vec<f64>,
        tau_line: f64,
        line_interaction: LineInteractionMode,
        macro_atom: MacroAtomData,
    ) -> Self {
        let dv = (v_outer_edge - v_inner_edge) / n_shells as f64;
        let v_inner: Vec<f64> = (0..n_shells)
            .map(|i| v_inner_edge + dv * i as f64)
            .collect();
        let r_inner: Vec<f64> = v_inner.iter().map(|v| v * time_explosion).collect();
        let r_outer: Vec<f64> = (1..=n_shells)
            .map(|i| (v_inner_edge + dv * i as f64) * time_explosion)
            .collect();
        let n_lines = line_list_nu.len();

        Self::new(
            r_inner,
            r_outer,
            v_inner,
            vec![electron_density; n_shells],
            line_list_nu,
            vec![tau_line; n_shells * n_lines],
            line_interaction,
            macro_atom,
            time_explosion,
        )
    }

    /// Number of shells
    #[inline]
    pub fn n_shells(&self) -> usize {
        self.r_inner.len()
    }

    /// Number of lines
    #[inline]
    pub fn n_lines(&self) -> usize {
        self.line_list_nu.len()
    }

    /// Sobolev optical depth of a line in a shell
    #[inline]
    pub fn tau_sobolev_at(&self, shell: usize, line: usize) -> f64 {
        self.tau_sobolev[shell * self.n_lines() + line]
    }

    /// Lab-to-comoving Doppler factor at (r, μ), to O(v/c)
    #[inline]
    pub fn doppler_factor(&self, r: f64, mu: f64) -> f64 {
        1.0 - mu * r * self.inverse_ct
    }

    /// Check every snapshot contract before transport begins
    ///
    /// Non-recoverable: a failed check means the producing driver is
    /// broken, not the kernel.
    pub fn validate(&self) -> Result<(), SnapshotError> {
        let n_shells = self.n_shells();
        let n_lines = self.n_lines();

        if !(self.time_explosion > 0.0) {
            return Err(SnapshotError::NonPositiveTimeExplosion(self.time_explosion));
        }
        if n_shells == 0 {
            return Err(SnapshotError::LengthMismatch("no shells"));
        }
        if self.r_outer.len() != n_shells {
            return Err(SnapshotError::LengthMismatch("r_outer"));
        }
        if self.v_inner.len() != n_shells {
            return Err(SnapshotError::LengthMismatch("v_inner"));
        }
        if self.electron_density.len() != n_shells {
            return Err(SnapshotError::LengthMismatch("electron_density"));
        }
        if self.inverse_electron_density.len() != n_shells {
            return Err(SnapshotError::LengthMismatch("inverse_electron_density"));
        }
        if self.tau_sobolev.len() != n_shells * n_lines {
            return Err(SnapshotError::LengthMismatch("tau_sobolev"));
        }

        for i in 0..n_shells {
            if !(self.r_inner[i] < self.r_outer[i]) {
                return Err(SnapshotError::NonMonotonicShells(i));
            }
            if i + 1 < n_shells {
                let gap = (self.r_outer[i] - self.r_inner[i + 1]).abs();
                if gap > 1e-12 * self.r_outer[i] {
                    return Err(SnapshotError::DisjointShells(i, i + 1));
                }
            }
            let n_e = self.electron_density[i];
            if !(n_e > 0.0) {
                return Err(SnapshotError::NonPositiveDensity { shell: i, value: n_e });
            }
            if (n_e * self.inverse_electron_density[i] - 1.0).abs() > 1e-12 {
                return Err(SnapshotError::StaleInverseDensity(i));
            }
        }

        for i in 1..n_lines {
            if !(self.line_list_nu[i - 1] > self.line_list_nu[i]) {
                return Err(SnapshotError::NonMonotonicLineList(i));
            }
        }

        for shell in 0..n_shells {
            for line in 0..n_lines {
                if self.tau_sobolev_at(shell, line) < 0.0 {
                    return Err(SnapshotError::NegativeTauSobolev { shell, line });
                }
            }
        }

        if self.line_interaction.uses_macro_atom() {
            self.validate_macro_atom(n_shells, n_lines)?;
        }
        Ok(())
    }

    fn validate_macro_atom(&self, n_shells: usize, n_lines: usize) -> Result<(), SnapshotError> {
        let ma = &self.macro_atom;
        let n_levels = ma.n_levels();
        let n_transitions = ma.n_transitions();

        if ma.line2macro_upper.len() != n_lines {
            return Err(SnapshotError::LengthMismatch("line2macro_upper"));
        }
        if ma.line2macro_upper.iter().any(|&m| m >= n_levels) {
            return Err(SnapshotError::LengthMismatch("line2macro_upper level id"));
        }
        if ma.block_refs.last().copied() != Some(n_transitions) {
            return Err(SnapshotError::LengthMismatch("block_refs terminator"));
        }
        if ma.transition_probabilities.len() != n_shells * n_transitions {
            return Err(SnapshotError::LengthMismatch("transition_probabilities"));
        }
        if ma.transition_destination_level.len() != n_transitions
            || ma.transition_line_id.len() != n_transitions
        {
            return Err(SnapshotError::LengthMismatch("transition tables"));
        }

        for level in 0..n_levels {
            let (start, end) = (ma.block_refs[level], ma.block_refs[level + 1]);
            if start > end {
                return Err(SnapshotError::BadMacroBlockRefs(level));
            }
            for shell in 0..n_shells {
                let sum: f64 = (start..end).map(|t| ma.probability(shell, t)).sum();
                if (sum - 1.0).abs() > 1e-8 {
                    return Err(SnapshotError::UnnormalizedMacroBlock { level, shell, sum });
                }
            }
        }

        for t in 0..n_transitions {
            if ma.transition_type[t] == TRANSITION_EMISSION {
                if ma.transition_line_id[t] >= n_lines {
                    return Err(SnapshotError::LengthMismatch("transition_line_id"));
                }
            } else if ma.transition_destination_level[t] >= n_levels {
                return Err(SnapshotError::LengthMismatch("transition_destination_level"));
            }
        }
        Ok(())
    }

    /// Shell inner-boundary velocity implied by homology, v = r / t (cm/s)
    pub fn homology_velocity(&self, r: f64) -> f64 {
        r * self.inverse_time_explosion
    }

    /// Maximum v/c across the ejecta, a quick sanity diagnostic
    pub fn max_beta(&self) -> f64 {
        self.r_outer
            .last()
            .map(|&r| r * self.inverse_ct)
            .unwrap_or(0.0)
    }
}
