//! # Packet Module
//!
//! Energy packet state and packet populations.
//!
//! A packet is an indivisible quantum of radiative energy with a lab-frame
//! frequency, direction cosine, energy, radius and shell id. Packets are
//! transient: one lives on a worker's stack for the duration of its event
//! loop and leaves behind only its outcome and estimator contributions.

use crate::lines::search_redward;
use crate::model::ModelSnapshot;
use crate::stochastic::RandomGenerator;

/// Which boundary the packet crossed most recently, if any
///
/// A packet that just crossed a shell boundary outward cannot re-cross it
/// inward without an intervening scatter; the flag suppresses the inner
/// intersection test until the next interaction resets it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BoundaryCrossing {
    Inward,
    #[default]
    None,
    Outward,
}

/// Mutable per-packet transport state
#[derive(Debug, Clone)]
pub struct Packet {
    /// Lab-frame frequency (Hz)
    pub nu: f64,
    /// Direction cosine μ ∈ [−1, 1]
    pub mu: f64,
    /// Lab-frame energy (erg)
    pub energy: f64,
    /// Radius (cm)
    pub r: f64,
    /// Current shell id
    pub shell: usize,
    /// Cursor: next unchecked line in the frequency table
    pub next_line: usize,
    /// Cursor has run off the red end of the table
    pub last_line: bool,
    /// The next line is coincident with the one just processed
    pub close_line: bool,
    /// Boundary-recrossing suppression flag
    pub crossed_boundary: BoundaryCrossing,
    /// Remaining optical-depth budget until the next interaction
    pub tau_event: f64,
}

impl Packet {
    /// Initialize a packet at the inner boundary of the innermost shell
    ///
    /// Draws the first optical-depth budget and positions the line cursor
    /// from the launch comoving frequency. Outward-pointing packets start
    /// with the inner boundary suppressed, as if they had just crossed it.
    pub fn launch(
        nu: f64,
        mu: f64,
        energy: f64,
        model: &ModelSnapshot,
        rng: &mut RandomGenerator,
    ) -> Self {
        let r = model.r_inner[0];
        let tau_event = rng.exponential_tau();
        let comoving_nu = nu * model.doppler_factor(r, mu);
        let next_line = search_redward(&model.line_list_nu, comoving_nu);

        Self {
            nu,
            mu,
            energy,
            r,
            shell: 0,
            next_line,
            last_line: next_line >= model.n_lines(),
            close_line: false,
            crossed_boundary: if mu >= 0.0 {
                BoundaryCrossing::Outward
            } else {
                BoundaryCrossing::None
            },
            tau_event,
        }
    }
}

/// Terminal state of one packet
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PacketOutcome {
    /// Lab-frame frequency at exit (Hz)
    pub nu: f64,
    /// Lab-frame energy at exit (erg)
    pub energy: f64,
    /// True when the packet re-entered the core, false when it escaped
    pub reabsorbed: bool,
}

/// The N input packets sampled by an external source
#[derive(Debug, Clone)]
pub struct PacketPopulation {
    /// Lab-frame frequencies (Hz)
    pub nu: Vec<f64>,
    /// Direction cosines at launch
    pub mu: Vec<f64>,
    /// Packet energies (erg)
    pub energy: Vec<f64>,
}

impl PacketPopulation {
    /// Wrap externally sampled arrays
    pub fn from_arrays(nu: Vec<f64>, mu: Vec<f64>, energy: Vec<f64>) -> Self {
        Self { nu, mu, energy }
    }

    /// Sample a photospheric population: frequencies uniform in a window,
    /// outward direction cosines μ = √U, equal energy per packet
    pub fn photospheric(
        n_packets: usize,
        nu_min: f64,
        nu_max: f64,
        total_energy: f64,
        seed: u64,
    ) -> Self {
        let mut rng = RandomGenerator::new(seed);
        let packet_energy = total_energy / n_packets as f64;

        let mut nu = Vec::with_capacity(n_packets);
        let mut mu = Vec::with_capacity(n_packets);
        let mut energy = Vec::with_capacity(n_packets);
        for _ in 0..n_packets {
            nu.push(rng.uniform_range(nu_min, nu_max));
            mu.push(rng.uniform().sqrt());
            energy.push(packet_energy);
        }
        Self { nu, mu, energy }
    }

    /// Number of packets
    pub fn len(&self) -> usize {
        self.nu.len()
    }

    /// True when the population holds no packets
    pub fn is_empty(&self) -> bool {
        self.nu.is_empty()
    }

    /// Check the three arrays agree in length
    pub fn consistent(&self) -> bool {
        self.mu.len() == self.nu.len() && self.energy.len() == self.nu.len()
    }

    /// Total energy carried by the population (erg)
    pub fn total_energy(&self) -> f64 {
        self.energy.iter().sum()
    }
}
