//! # Stochastic Module
//!
//! Pseudo-random sampling for Monte Carlo packet transport.
//!
//! ## Philosophy
//!
//! Every packet owns an independent generator state derived from the run
//! seed and the packet index. There is no process-wide mutable generator:
//! the per-packet stream makes the event sequence of any packet
//! reproducible in isolation, and the emergent spectrum independent of
//! how packets are partitioned across workers.
//!
//! ## Distributions
//!
//! - uniform U ~ [0, 1) for event selection and transition sampling
//! - exponential τ = −ln(U) for optical-depth budgets
//! - isotropic direction cosine μ = 2U − 1 for re-emission
//!
//! ## Author
//! Francisco Molina-Burgos, Avermex Research Division

/// Pseudo-random number generator (xoshiro256**)
///
/// Fast, high-quality PRNG suitable for Monte Carlo simulations.
/// Period: 2^256 - 1
#[derive(Clone)]
pub struct RandomGenerator {
    state: [u64; 4],
}

impl RandomGenerator {
    /// Create new RNG with seed
    pub fn new(seed: u64) -> Self {
        // Initialize state using SplitMix64
        let mut s = seed;
        let mut state = [0u64; 4];
        for slot in &mut state {
            s = s.wrapping_add(0x9e3779b97f4a7c15);
            let mut z = s;
            z = (z ^ (z >> 30)).wrapping_mul(0xbf58476d1ce4e5b9);
            z = (z ^ (z >> 27)).wrapping_mul(0x94d049bb133111eb);
            *slot = z ^ (z >> 31);
        }
        Self { state }
    }

    /// Create the generator for one packet of a run
    ///
    /// Adjacent stream ids give decorrelated states because the seed is
    /// diffused through SplitMix64 before use.
    pub fn for_stream(seed: u64, stream: u64) -> Self {
        Self::new(seed.wrapping_add(stream))
    }

    /// Generate next u64
    #[inline]
    fn next_u64(&mut self) -> u64 {
        let result = self.state[1].wrapping_mul(5).rotate_left(7).wrapping_mul(9);
        let t = self.state[1] << 17;

        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);

        result
    }

    /// Generate uniform [0, 1)
    #[inline]
    pub fn uniform(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }

    /// Generate uniform in range [a, b)
    pub fn uniform_range(&mut self, a: f64, b: f64) -> f64 {
        a + (b - a) * self.uniform()
    }

    /// Draw an optical-depth budget τ = −ln(U)
    #[inline]
    pub fn exponential_tau(&mut self) -> f64 {
        -self.uniform().max(1e-300).ln()
    }

    /// Draw an isotropic direction cosine μ ∈ [−1, 1)
    #[inline]
    pub fn isotropic_mu(&mut self) -> f64 {
        2.0 * self.uniform() - 1.0
    }
}

impl Default for RandomGenerator {
    fn default() -> Self {
        Self::new(42) // Reproducible default
    }
}
