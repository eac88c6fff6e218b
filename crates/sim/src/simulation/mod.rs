//! Simulation orchestration: configuration, populations, and the
//! generation-loop engine.

pub mod engine;
pub mod parameters;
pub mod population;

pub use engine::Simulation;
pub use parameters::{Configuration, Models};
pub use population::{Population, PopulationPart};
