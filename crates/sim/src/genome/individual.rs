//! Diploid individuals: two parallel chromosome sets, mating, and
//! per-individual statistics.

use crate::base::{IdSource, SimRng};
use crate::genome::chromosome::Chromosome;
use crate::genome::mutation::{AlleleCount, Mutation};
use crate::simulation::parameters::Models;
use rand::Rng;

/// One organism in the population.
///
/// Carries one chromosome array inherited from its father and one from its
/// mother, the fitness scores, and cached mutation totals.
#[derive(Debug, Clone)]
pub struct Individual {
    paternal: Vec<Chromosome>,
    maternal: Vec<Chromosome>,
    /// Fitness due to genomic mutations. Starts at 1.0.
    geno_fitness: f64,
    /// GenoFitness plus environmental and selection noise, set during
    /// selection.
    pheno_fitness: f64,
    /// Set when selection (or a lethal genome) has marked this individual
    /// for elimination.
    dead: bool,
    num_mutations: u32,
}

impl Individual {
    /// Create a genesis individual: empty linkage blocks, fitness 1.0.
    pub fn genesis(models: &Models) -> Self {
        let chromosomes = models.haploid_chromosome_number as usize;
        let lbs = models.lbs_per_chromosome as usize;
        Self {
            paternal: (0..chromosomes).map(|_| Chromosome::new(lbs)).collect(),
            maternal: (0..chromosomes).map(|_| Chromosome::new(lbs)).collect(),
            geno_fitness: 1.0,
            pheno_fitness: 0.0,
            dead: false,
            num_mutations: 0,
        }
    }

    /// Fitness from genome-resident mutations only.
    #[inline]
    pub fn geno_fitness(&self) -> f64 {
        self.geno_fitness
    }

    /// Fitness used for truncation ranking, set during selection.
    #[inline]
    pub fn pheno_fitness(&self) -> f64 {
        self.pheno_fitness
    }

    #[inline]
    pub fn set_pheno_fitness(&mut self, fitness: f64) {
        self.pheno_fitness = fitness;
    }

    /// Whether selection has identified this individual for elimination.
    #[inline]
    pub fn is_dead(&self) -> bool {
        self.dead
    }

    #[inline]
    pub fn mark_dead(&mut self) {
        self.dead = true;
    }

    /// Total mutations and initial alleles, tracked or not.
    #[inline]
    pub fn num_mutations(&self) -> u32 {
        self.num_mutations
    }

    /// Chromosomes inherited from the father.
    pub fn paternal(&self) -> &[Chromosome] {
        &self.paternal
    }

    /// Chromosomes inherited from the mother.
    pub fn maternal(&self) -> &[Chromosome] {
        &self.maternal
    }

    /// Mate this individual (the dad) with `other` (the mom), producing the
    /// pair's offspring.
    ///
    /// All children are constructed by meiosis first and only then given
    /// their new mutations. The ordering matters: until the pair's mating is
    /// complete, inherited blocks are shared between sibling children, and
    /// mutating a shared block would contaminate siblings.
    pub fn mate(
        &self,
        other: &Individual,
        models: &Models,
        ids: &mut IdSource,
        rng: &mut SimRng,
    ) -> Vec<Individual> {
        let num_offspring = models
            .num_offspring_model
            .offspring_count(models.num_offspring, rng);
        let mut offspring = Vec::with_capacity(num_offspring as usize);
        for _ in 0..num_offspring {
            offspring.push(self.one_offspring(other, models, rng));
        }
        for child in &mut offspring {
            child.add_mutations(models, ids, rng);
        }
        offspring
    }

    /// Construct one offspring by meiosis on every chromosome pair.
    fn one_offspring(&self, other: &Individual, models: &Models, rng: &mut SimRng) -> Individual {
        let chromosomes = self.paternal.len();
        let mut paternal = Vec::with_capacity(chromosomes);
        let mut maternal = Vec::with_capacity(chromosomes);
        let mut num_mutations = 0u32;
        for c in 0..chromosomes {
            // Dad's two homologs form the child's paternal chromosome, and
            // likewise for mom.
            let gamete = models.crossover.meiosis(
                &self.paternal[c],
                &self.maternal[c],
                models.mean_num_crossovers,
                rng,
            );
            num_mutations += gamete.num_mutations();
            paternal.push(gamete);

            let gamete = models.crossover.meiosis(
                &other.paternal[c],
                &other.maternal[c],
                models.mean_num_crossovers,
                rng,
            );
            num_mutations += gamete.num_mutations();
            maternal.push(gamete);
        }
        Individual {
            paternal,
            maternal,
            geno_fitness: 0.0,
            pheno_fitness: 0.0,
            dead: false,
            num_mutations,
        }
    }

    /// Apply this generation's new mutations, then score the genome.
    ///
    /// Each mutation lands on a random linkage block across the whole
    /// individual, on the paternal or maternal copy with equal probability.
    fn add_mutations(&mut self, models: &Models, ids: &mut IdSource, rng: &mut SimRng) {
        let num_mutations = models.num_mutations_model.mutation_count(models.mutn_rate, rng);
        for _ in 0..num_mutations {
            let lb = rng.random_range(0..models.num_linkage_subunits);
            let chr = (lb / models.lbs_per_chromosome) as usize;
            let lb_in_chr = (lb % models.lbs_per_chromosome) as usize;
            let side = if rng.random_range(0..2) == 0 {
                &mut self.paternal
            } else {
                &mut self.maternal
            };
            side[chr].append_mutation(lb_in_chr, &models.mutation, ids, rng);
            self.num_mutations += 1;
        }

        self.geno_fitness = models.fitness_model.individual_fitness(self);
        if self.geno_fitness <= 0.0 {
            self.dead = true;
        }
    }

    /// Plant one initial contrasting allele pair at a specific position:
    /// favorable on the paternal copy, deleterious on the maternal.
    pub fn add_initial_allele_pair(
        &mut self,
        chr_index: usize,
        lb_index: usize,
        fav: Mutation,
        del: Mutation,
    ) {
        self.paternal[chr_index].plant_initial_allele(lb_index, fav);
        self.maternal[chr_index].plant_initial_allele(lb_index, del);
        self.num_mutations += 2;
    }

    /// Spread `num_pairs` unique contrasting allele pairs across this
    /// individual's linkage blocks as evenly as possible.
    ///
    /// Every block position gets `num_pairs / total` pairs; the remaining
    /// `num_pairs % total` are assigned by running-ratio throttling so they
    /// end up spread across the genome instead of bunched at the front.
    /// Returns (blocks that received alleles, blocks processed).
    pub fn add_initial_contrasting_alleles(
        &mut self,
        num_pairs: u32,
        models: &Models,
        ids: &mut IdSource,
        rng: &mut SimRng,
    ) -> (u32, u32) {
        let total_lbs = models.num_linkage_subunits;
        let per_lb = num_pairs / total_lbs;
        let remainder = num_pairs % total_lbs;
        let target_ratio = remainder as f64 / total_lbs as f64;

        let mut remainder_assigned = 0u32;
        let mut lbs_with_alleles = 0u32;
        for lb in 0..total_lbs {
            let mut pairs_here = per_lb;
            let ratio_so_far = if lb == 0 {
                0.0
            } else {
                remainder_assigned as f64 / lb as f64
            };
            if remainder_assigned < remainder && ratio_so_far <= target_ratio {
                pairs_here += 1;
                remainder_assigned += 1;
            }

            if pairs_here == 0 {
                continue;
            }
            lbs_with_alleles += 1;
            let chr = (lb / models.lbs_per_chromosome) as usize;
            let lb_in_chr = (lb % models.lbs_per_chromosome) as usize;
            for _ in 0..pairs_here {
                let (fav, del) = models.mutation.initial_allele_pair(ids, rng);
                self.add_initial_allele_pair(chr, lb_in_chr, fav, del);
            }
        }
        (lbs_with_alleles, total_lbs)
    }

    /// Number of deleterious, neutral, favorable mutations and the mean
    /// fitness effect of the deleterious and favorable classes.
    pub fn mutation_stats(&self) -> (u32, u32, u32, f64, f64) {
        let mut deleterious = 0u32;
        let mut neutral = 0u32;
        let mut favorable = 0u32;
        let mut av_del = 0.0;
        let mut av_fav = 0.0;
        for chr in self.paternal.iter().chain(self.maternal.iter()) {
            let (d, n, f, ad, af) = chr.mutation_stats();
            deleterious += d;
            neutral += n;
            favorable += f;
            av_del += d as f64 * ad;
            av_fav += f as f64 * af;
        }
        if deleterious > 0 {
            av_del /= deleterious as f64;
        }
        if favorable > 0 {
            av_fav /= favorable as f64;
        }
        (deleterious, neutral, favorable, av_del, av_fav)
    }

    /// Initial-allele counts and mean fitness effects.
    pub fn initial_allele_stats(&self) -> (u32, u32, f64, f64) {
        let mut deleterious = 0u32;
        let mut favorable = 0u32;
        let mut av_del = 0.0;
        let mut av_fav = 0.0;
        for chr in self.paternal.iter().chain(self.maternal.iter()) {
            let (d, f, ad, af) = chr.initial_allele_stats();
            deleterious += d;
            favorable += f;
            av_del += d as f64 * ad;
            av_fav += f as f64 * af;
        }
        if deleterious > 0 {
            av_del /= deleterious as f64;
        }
        if favorable > 0 {
            av_fav /= favorable as f64;
        }
        (deleterious, favorable, av_del, av_fav)
    }

    /// Count this individual's alleles into the population totals.
    ///
    /// The alleles are gathered into a per-individual map first so the same
    /// id on both homologs contributes a single occurrence.
    pub fn count_alleles(&self, totals: &mut AlleleCount) {
        let mut own = AlleleCount::new();
        for chr in self.paternal.iter().chain(self.maternal.iter()) {
            chr.count_alleles(&mut own);
        }
        totals.absorb(&own);
    }

    /// Re-score GenoFitness from the current genome.
    pub(crate) fn recompute_fitness(&mut self, models: &Models) {
        self.geno_fitness = models.fitness_model.individual_fitness(self);
        if self.geno_fitness <= 0.0 {
            self.dead = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::{IdAllocator, IdSource};
    use crate::simulation::parameters::{Configuration, Models};
    use rand::SeedableRng;
    use std::sync::Arc;

    fn test_models(mutate: impl FnOnce(&mut Configuration)) -> Models {
        let mut cfg = Configuration::default();
        cfg.execution.pop_size = 4;
        cfg.genome.num_linkage_subunits = 12;
        cfg.genome.haploid_chromosome_number = 4;
        cfg.mutation.mutn_rate = 5.0;
        cfg.mutation.frac_fav_mutn = 0.0;
        cfg.mutation.fraction_neutral = 0.0;
        mutate(&mut cfg);
        Models::resolve(&cfg).unwrap()
    }

    fn test_ids() -> IdSource {
        IdSource::new(Arc::new(IdAllocator::new()), 4096)
    }

    #[test]
    fn test_genesis_individual() {
        let models = test_models(|_| {});
        let ind = Individual::genesis(&models);
        assert_eq!(ind.paternal().len(), 4);
        assert_eq!(ind.maternal().len(), 4);
        assert_eq!(ind.geno_fitness(), 1.0);
        assert_eq!(ind.num_mutations(), 0);
        assert!(!ind.is_dead());
    }

    #[test]
    fn test_mate_produces_offspring_with_mutations() {
        let models = test_models(|_| {});
        let mut ids = test_ids();
        let mut rng = SimRng::seed_from_u64(42);
        let dad = Individual::genesis(&models);
        let mom = Individual::genesis(&models);

        let offspring = dad.mate(&mom, &models, &mut ids, &mut rng);
        assert!(!offspring.is_empty());
        for child in &offspring {
            assert_eq!(child.paternal().len(), 4);
            assert_eq!(child.maternal().len(), 4);
            // Deleterious-only mutations drag fitness below 1.
            if child.num_mutations() > 0 {
                assert!(child.geno_fitness() < 1.0);
            }
            // The individual total matches its chromosomes.
            let chr_total: u32 = child
                .paternal()
                .iter()
                .chain(child.maternal().iter())
                .map(Chromosome::num_mutations)
                .sum();
            assert_eq!(chr_total, child.num_mutations());
        }
    }

    #[test]
    fn test_mate_zero_mutation_rate_keeps_fitness_one() {
        let models = test_models(|cfg| cfg.mutation.mutn_rate = 0.0);
        let mut ids = test_ids();
        let mut rng = SimRng::seed_from_u64(42);
        let dad = Individual::genesis(&models);
        let mom = Individual::genesis(&models);

        for child in dad.mate(&mom, &models, &mut ids, &mut rng) {
            assert_eq!(child.geno_fitness(), 1.0);
            assert_eq!(child.num_mutations(), 0);
        }
    }

    #[test]
    fn test_initial_contrasting_alleles_spread_evenly() {
        let models = test_models(|_| {});
        let mut ids = test_ids();
        let mut rng = SimRng::seed_from_u64(8);
        let mut ind = Individual::genesis(&models);

        // 4 pairs over 12 LBs: 4 blocks get one pair each, spread across the
        // genome by the running ratio.
        let (with_alleles, processed) = ind.add_initial_contrasting_alleles(4, &models, &mut ids, &mut rng);
        assert_eq!(processed, 12);
        assert_eq!(with_alleles, 4);
        assert_eq!(ind.num_mutations(), 8);

        let (del, fav, av_del, av_fav) = ind.initial_allele_stats();
        assert_eq!((del, fav), (4, 4));
        assert!(av_fav > 0.0);
        assert!(av_del < 0.0);

        // Each paternal chromosome got at least one favorable half: 4 pairs
        // over 4 chromosomes with even spreading is one per chromosome.
        for chr in ind.paternal() {
            assert_eq!(chr.num_mutations(), 1);
        }

        // Contrasting halves cancel, so fitness is untouched.
        ind.recompute_fitness(&models);
        assert!((ind.geno_fitness() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_initial_alleles_more_pairs_than_blocks() {
        let models = test_models(|_| {});
        let mut ids = test_ids();
        let mut rng = SimRng::seed_from_u64(8);
        let mut ind = Individual::genesis(&models);

        // 30 pairs over 12 LBs: every block gets 2, six blocks get a third.
        let (with_alleles, processed) = ind.add_initial_contrasting_alleles(30, &models, &mut ids, &mut rng);
        assert_eq!(processed, 12);
        assert_eq!(with_alleles, 12);
        let (del, fav, _, _) = ind.initial_allele_stats();
        assert_eq!((del, fav), (30, 30));
    }

    #[test]
    fn test_count_alleles_dedups_within_individual() {
        let models = test_models(|_| {});
        let mut ids = test_ids();
        let mut rng = SimRng::seed_from_u64(3);
        let mut ind = Individual::genesis(&models);
        ind.add_initial_contrasting_alleles(2, &models, &mut ids, &mut rng);

        let mut totals = AlleleCount::new();
        ind.count_alleles(&mut totals);
        assert_eq!(totals.fav_initial.len(), 2);
        assert_eq!(totals.del_initial.len(), 2);
        for allele in totals.fav_initial.values() {
            assert_eq!(allele.count, 1);
        }
    }

    #[test]
    fn test_mutation_stats_match_chain() {
        let models = test_models(|_| {});
        let mut ids = test_ids();
        let mut rng = SimRng::seed_from_u64(21);
        let dad = Individual::genesis(&models);
        let mom = Individual::genesis(&models);
        let offspring = dad.mate(&mom, &models, &mut ids, &mut rng);
        let child = &offspring[0];

        let (del, neut, fav, _, _) = child.mutation_stats();
        assert_eq!(del + neut + fav, child.num_mutations());

        // Tracking threshold is 0, so every mutation kept its identity.
        let mut count = AlleleCount::new();
        child.count_alleles(&mut count);
        assert_eq!(count.total_unique() as u32, child.num_mutations());
    }
}
