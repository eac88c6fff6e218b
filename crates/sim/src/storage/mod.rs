//! Output recording: per-tribe history/fitness tables and the
//! per-generation JSON documents.

pub mod recorder;
pub mod types;

pub use recorder::Recorder;
pub use types::{AlleleBins, FitnessDistribution, NormalizedAlleleBins};
