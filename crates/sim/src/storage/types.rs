//! Serde document types for the per-generation JSON outputs.

use serde::{Deserialize, Serialize};

/// Absolute allele-frequency histogram for one generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlleleBins {
    pub generation: u32,
    /// 1-indexed bin labels.
    pub bins: Vec<u32>,
    pub deleterious: Vec<u32>,
    pub neutral: Vec<u32>,
    pub favorable: Vec<u32>,
    #[serde(rename = "delInitialAlleles")]
    pub del_initial_alleles: Vec<u32>,
    #[serde(rename = "favInitialAlleles")]
    pub fav_initial_alleles: Vec<u32>,
}

/// Normalized allele-frequency histogram over the minor-allele half of the
/// bins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizedAlleleBins {
    pub generation: u32,
    pub bins: Vec<u32>,
    pub deleterious: Vec<f64>,
    pub neutral: Vec<f64>,
    pub favorable: Vec<f64>,
    #[serde(rename = "delInitialAlleles")]
    pub del_initial_alleles: Vec<f64>,
    #[serde(rename = "favInitialAlleles")]
    pub fav_initial_alleles: Vec<f64>,
}

/// Distribution of accumulated mutation fitness effects, one document each
/// for deleterious and favorable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitnessDistribution {
    pub generation: u32,
    #[serde(rename = "binmidpointfitness")]
    pub bin_midpoint_fitness: Vec<f64>,
    pub recessive: Vec<f64>,
    pub dominant: Vec<f64>,
}
