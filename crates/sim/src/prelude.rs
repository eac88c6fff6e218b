//! Convenient re-exports of the most commonly used types.

pub use crate::base::{IdAllocator, IdSource, RngFactory, SimRng};
pub use crate::errors::{ConfigError, SimulationError};
pub use crate::evolution::{
    Bottlenecks, CrossoverModel, FitnessModel, MutationModel, NumMutationsModel, NumOffspringModel,
    PopGrowthModel, SelectionScheme,
};
pub use crate::genome::{AlleleCount, Chromosome, Individual, LinkageBlock, Mutation, MutationKind};
pub use crate::simulation::{Configuration, Models, Population, Simulation};
pub use crate::storage::Recorder;
