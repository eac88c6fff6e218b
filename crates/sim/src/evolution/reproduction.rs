//! Reproduction strategies: how many offspring a mating pair produces, how
//! many new mutations each offspring receives, and how an individual's
//! mutations combine into a single fitness score.

use crate::base::{poisson, prob_round, SimRng};
use crate::genome::individual::Individual;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Algorithms for the random number of offspring of a mating pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumOffspringModel {
    /// Even distribution between 1 and 2 * (2 * num_offspring) - 1.
    Uniform,
    /// Probabilistic rounding of 2 * num_offspring, so the average is exact.
    SemiFixed,
    /// Offspring count proportional to fitness (reserved).
    FitnessProportional,
}

impl NumOffspringModel {
    /// Draw the offspring count for one mating pair. `num_offspring` is the
    /// per-individual average, so the pair's mean is twice that.
    pub fn offspring_count(&self, num_offspring: f64, rng: &mut SimRng) -> u32 {
        let pair_mean = 2.0 * num_offspring;
        match self {
            Self::Uniform => {
                // A buffer of 1 at each end keeps the draw in
                // 1..=2*pair_mean-1 with mean pair_mean.
                let max_range = 2.0 * pair_mean - 2.0;
                let draw = rng.random::<f64>() * max_range;
                prob_round(rng, draw + 1.0) as u32
            }
            Self::SemiFixed => prob_round(rng, pair_mean) as u32,
            // Rejected during configuration validation.
            Self::FitnessProportional => unreachable!("fitness-dependent fertility is not implemented"),
        }
    }
}

/// Algorithms for the number of new mutations given to one offspring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumMutationsModel {
    /// Probabilistic rounding of the mutation rate.
    SemiFixed,
    /// Poisson draw with the mutation rate as its mean.
    Poisson,
}

impl NumMutationsModel {
    /// Draw the number of new mutations for one offspring.
    pub fn mutation_count(&self, mutn_rate: f64, rng: &mut SimRng) -> u32 {
        match self {
            Self::SemiFixed => prob_round(rng, mutn_rate) as u32,
            Self::Poisson => poisson(rng, mutn_rate) as u32,
        }
    }
}

/// Algorithms for aggregating an individual's mutation fitness effects into
/// its genomic fitness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FitnessModel {
    /// fitness = 1 + sum of all linkage-block fitness sums. Deleterious
    /// contributions are already negative; a total of zero or below means
    /// the individual is dead.
    Additive,
    /// Combined additive/multiplicative weighting (reserved).
    Multiplicative,
}

impl FitnessModel {
    /// Score an individual's genome.
    pub fn individual_fitness(&self, ind: &Individual) -> f64 {
        match self {
            Self::Additive => {
                let mut fitness = 1.0;
                for chr in ind.paternal().iter().chain(ind.maternal().iter()) {
                    fitness += chr.sum_fitness();
                }
                fitness
            }
            // Rejected during configuration validation.
            Self::Multiplicative => unreachable!("multiplicative weighting is not implemented"),
        }
    }
}
