//! Selection-noise strategies.
//!
//! Each strategy sets every individual's PhenoFitness from its GenoFitness
//! plus environmental noise, modulating how strictly truncation selection
//! tracks the genome. Dead individuals always get PhenoFitness 0 so they
//! sort to the bottom.

use crate::base::SimRng;
use crate::errors::SimulationError;
use crate::genome::individual::Individual;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Guards divisions by a uniform draw that could be exactly zero.
const TINY: f64 = 1.0e-15;

/// The selection scheme applied before truncation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionScheme {
    /// Only environmental noise; the least fit are eliminated outright.
    /// The most efficient model, and unrealistic unless the noise is high.
    FullTruncation,
    /// Divide the noisy fitness by a uniform random number before ranking,
    /// so survival probability relates to fitness without any guarantee.
    UnrestrictedProbability,
    /// Strict proportionality probability selection (SPPS): normalize the
    /// noisy fitness by the population maximum, divide by a uniform draw,
    /// and kill every individual whose ratio falls below one.
    StrictProportionalityProbability,
    /// Intermediate between full truncation and unrestricted probability,
    /// controlled by the partial truncation parameter.
    PartialTruncation,
}

impl SelectionScheme {
    /// Set PhenoFitness on every individual.
    ///
    /// `env_noise` is the environmental-noise magnitude computed from the
    /// pre-selection fitness variance, heritability, and the non-scaling
    /// noise. `partial_truncation_value` is only read by the partial
    /// truncation scheme.
    pub fn apply(
        &self,
        indivs: &mut [Individual],
        env_noise: f64,
        partial_truncation_value: f64,
        rng: &mut SimRng,
    ) -> Result<(), SimulationError> {
        match self {
            Self::FullTruncation => {
                for ind in indivs.iter_mut() {
                    if ind.is_dead() {
                        ind.set_pheno_fitness(0.0);
                    } else {
                        ind.set_pheno_fitness(ind.geno_fitness() + rng.random::<f64>() * env_noise);
                    }
                }
                Ok(())
            }
            Self::UnrestrictedProbability => {
                for ind in indivs.iter_mut() {
                    if ind.is_dead() {
                        ind.set_pheno_fitness(0.0);
                    } else {
                        let noisy = ind.geno_fitness() + rng.random::<f64>() * env_noise;
                        ind.set_pheno_fitness(noisy / (rng.random::<f64>() + TINY));
                    }
                }
                Ok(())
            }
            Self::StrictProportionalityProbability => {
                // First pass: apply environmental noise and find the max.
                let mut max_fitness = 0.0f64;
                for ind in indivs.iter_mut() {
                    if ind.is_dead() {
                        ind.set_pheno_fitness(0.0);
                    } else {
                        ind.set_pheno_fitness(ind.geno_fitness() + rng.random::<f64>() * env_noise);
                    }
                    max_fitness = max_fitness.max(ind.pheno_fitness());
                }
                if max_fitness <= 0.0 {
                    return Err(SimulationError::DeadPopulation {
                        max_fitness,
                    });
                }

                // Second pass: scale so the max is one, divide by a uniform
                // draw, and mark everyone below the ratio of one dead. The
                // fitness spread is usually small, so most ratios exceed one
                // and few individuals die here.
                for ind in indivs.iter_mut() {
                    let scaled =
                        ind.pheno_fitness() / max_fitness / (rng.random::<f64>() + TINY);
                    ind.set_pheno_fitness(scaled);
                    if scaled < 1.0 {
                        ind.mark_dead();
                    }
                }
                Ok(())
            }
            Self::PartialTruncation => {
                let theta = partial_truncation_value;
                for ind in indivs.iter_mut() {
                    if ind.is_dead() {
                        ind.set_pheno_fitness(0.0);
                    } else {
                        let noisy = ind.geno_fitness() + rng.random::<f64>() * env_noise;
                        ind.set_pheno_fitness(noisy / (theta + (1.0 - theta) * rng.random::<f64>()));
                    }
                }
                Ok(())
            }
        }
    }
}
