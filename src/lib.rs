//! # NOVAMC-RS
//!
//! Monte Carlo Radiative Transfer for Supernova Ejecta
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                           NOVAMC-RS                                 │
//! │        Packet Transport Kernel for Homologous Ejecta                │
//! ├─────────────────────────────────────────────────────────────────────┤
//! │  MODEL:      immutable plasma/atomic snapshot (flat arrays)         │
//! │  GEOMETRY:   shell boundary intersections in 1D spherical symmetry  │
//! │  LINES:      Sobolev resonance sweep over the frequency table       │
//! │  MACROATOM:  table-driven fluorescence selector                     │
//! │  TRANSPORT:  four-way event loop + rayon packet driver              │
//! │  ESTIMATORS: per-shell J and ν̄ radiation-field moments             │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The kernel consumes a read-only [`model::ModelSnapshot`] plus a
//! [`packet::PacketPopulation`] and returns the emergent packets and the
//! per-shell estimators an outer driver uses to update the plasma state
//! between iterations. Atomic data ingestion, plasma solvers and spectrum
//! binning live outside this crate.
//!
//! ## Author
//! Francisco Molina-Burgos, Avermex Research Division
//!
//! ## Date
//! January 2026

pub mod constants;
pub mod error;
pub mod geometry;
pub mod lines;
pub mod macroatom;
pub mod model;
pub mod packet;
pub mod stochastic;
pub mod transport;

// Re-exports
pub use constants::*;
pub use error::{KernelResult, SnapshotError, TransportError};
pub use macroatom::MacroAtomData;
pub use model::{LineInteractionMode, ModelSnapshot};
pub use packet::{Packet, PacketOutcome, PacketPopulation};
pub use stochastic::RandomGenerator;
pub use transport::driver::{run_transport, TransportConfig, TransportResult};
pub use transport::TransportStats;

/// NOVAMC version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Information about the kernel
pub fn info() -> String {
    format!(
        "NOVAMC-RS v{}\n\
         Monte Carlo Radiative Transfer for Supernova Ejecta\n\
         Sobolev line transport in homologously expanding shells\n\
         Author: Francisco Molina-Burgos, Avermex Research Division",
        VERSION
    )
}
