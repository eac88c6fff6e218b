//! The mutation value factory: classification and fitness-effect sampling.
//!
//! Fitness-effect magnitudes follow the Weibull-style distribution
//! `magnitude = scale * exp(-alpha * u^gamma)` for a uniform `u`, which
//! concentrates most mutations at very small effects with a thin tail of
//! high-impact ones.

use crate::base::{IdSource, SimRng};
use crate::genome::mutation::{Mutation, MutationKind};
use crate::simulation::parameters::MutationConfig;
use rand::Rng;

/// Resolved mutation-effect model, computed once from the configuration and
/// shared read-only by all mating workers.
#[derive(Debug, Clone)]
pub struct MutationModel {
    frac_fav_mutn: f64,
    fraction_neutral: f64,
    fraction_recessive: f64,
    tracking_threshold: f64,
    track_neutrals: bool,
    max_fav_fitness_gain: f64,
    alpha_del: f64,
    gamma_del: f64,
    alpha_fav: f64,
    gamma_fav: f64,
    del_scale: f64,
}

impl MutationModel {
    /// Build the model from configuration, deriving any distribution
    /// parameter left at zero from the genome size.
    pub fn from_config(cfg: &MutationConfig) -> Self {
        Self {
            frac_fav_mutn: cfg.frac_fav_mutn,
            fraction_neutral: cfg.fraction_neutral,
            fraction_recessive: cfg.fraction_recessive,
            tracking_threshold: cfg.tracking_threshold,
            track_neutrals: cfg.track_neutrals,
            max_fav_fitness_gain: cfg.max_fav_fitness_gain,
            alpha_del: cfg.effective_alpha_del(),
            gamma_del: cfg.effective_gamma_del(),
            alpha_fav: cfg.effective_alpha_fav(),
            gamma_fav: cfg.effective_gamma_fav(),
            del_scale: cfg.del_scale,
        }
    }

    /// Classify a new mutation as deleterious, favorable, or neutral.
    ///
    /// One uniform draw: the neutral fraction comes off the top, and the
    /// favorable fraction applies to the non-neutral remainder.
    pub fn classify(&self, rng: &mut SimRng) -> MutationKind {
        let draw = rng.random::<f64>();
        if draw < self.fraction_neutral {
            MutationKind::Neutral
        } else if draw < self.fraction_neutral + (1.0 - self.fraction_neutral) * self.frac_fav_mutn
        {
            MutationKind::Favorable
        } else {
            MutationKind::Deleterious
        }
    }

    /// Sample a deleterious fitness effect (negative).
    pub fn deleterious_effect(&self, rng: &mut SimRng) -> f32 {
        let u = rng.random::<f64>();
        let magnitude = self.del_scale * (-self.alpha_del * u.powf(self.gamma_del)).exp();
        -magnitude as f32
    }

    /// Sample a favorable fitness effect (positive, capped by the maximum
    /// favorable fitness gain).
    pub fn favorable_effect(&self, rng: &mut SimRng) -> f32 {
        let u = rng.random::<f64>();
        let magnitude =
            self.max_fav_fitness_gain * (-self.alpha_fav * u.powf(self.gamma_fav)).exp();
        magnitude.min(self.max_fav_fitness_gain) as f32
    }

    /// Bernoulli dominance draw.
    pub fn draw_dominance(&self, rng: &mut SimRng) -> bool {
        rng.random::<f64>() >= self.fraction_recessive
    }

    /// Whether a mutation of this effect keeps its identity on the mutation
    /// chain. A threshold of zero disables filtering.
    #[inline]
    pub fn is_tracked(&self, effect: f32) -> bool {
        self.tracking_threshold == 0.0 || (effect.abs() as f64) > self.tracking_threshold
    }

    /// Whether neutral mutations retain identity.
    #[inline]
    pub fn track_neutrals(&self) -> bool {
        self.track_neutrals
    }

    /// Create one initial contrasting allele pair.
    ///
    /// The pair's magnitude comes from the (bounded) favorable-effect
    /// distribution; each half carries half the effect so that two copies of
    /// an allele sum to the full allele fitness (co-dominance).
    pub fn initial_allele_pair(&self, ids: &mut IdSource, rng: &mut SimRng) -> (Mutation, Mutation) {
        let half_effect = self.favorable_effect(rng) * 0.5;
        let fav = Mutation::new(
            ids.next_id(),
            half_effect,
            MutationKind::FavorableInitial,
            true,
        );
        let del = Mutation::new(
            ids.next_id(),
            -half_effect,
            MutationKind::DeleteriousInitial,
            true,
        );
        (fav, del)
    }
}
