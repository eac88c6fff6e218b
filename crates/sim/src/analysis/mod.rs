//! Allele analysis: frequency binning and fitness-distribution binning of
//! the population allele counts.

pub mod alleles;
pub mod distribution;

pub use alleles::{bin_allele_frequencies, normalize_bins, BUCKET_COUNT};
pub use distribution::fitness_distributions;
