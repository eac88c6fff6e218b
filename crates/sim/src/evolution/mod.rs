//! Evolutionary operators: the fitness-effect distribution, crossover
//! during meiosis, reproduction strategies, selection noise, and population
//! growth.

pub mod growth;
pub mod mutation;
pub mod recombination;
pub mod reproduction;
pub mod selection;

pub use growth::{Bottleneck, Bottlenecks, PopGrowthModel};
pub use mutation::MutationModel;
pub use recombination::CrossoverModel;
pub use reproduction::{FitnessModel, NumMutationsModel, NumOffspringModel};
pub use selection::SelectionScheme;
