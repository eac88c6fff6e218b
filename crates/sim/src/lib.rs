//! # Simulation Crate
//!
//! The `sim` crate provides the core logic for the heritage forward-time
//! population genetics simulation. It includes modules for the genome data
//! model (mutations, linkage blocks, chromosomes, individuals), the
//! evolutionary operators (mutation, crossover, reproduction, selection,
//! population growth), the population/tribe orchestration, allele analysis,
//! and output recording.

pub mod analysis;
pub mod base;
pub mod errors;
pub mod evolution;
pub mod genome;
pub mod prelude;
pub mod simulation;
pub mod storage;

pub use base::{IdAllocator, SimRng};
pub use simulation::{Configuration, Simulation};
