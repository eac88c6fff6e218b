//! Population management: parallel mating, selection, growth, and
//! per-generation statistics.

use crate::base::{shuffled_indices, IdAllocator, IdSource, RngFactory, SimRng};
use crate::errors::{ConfigError, SimulationError};
use crate::evolution::growth::Bottlenecks;
use crate::evolution::growth::PopGrowthModel;
use crate::genome::individual::Individual;
use crate::genome::mutation::AlleleCount;
use crate::simulation::parameters::{
    parse_allele_frequencies, AlleleConfig, Configuration, InitialAlleleFitnessModel, Models,
};
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use std::sync::Arc;

/// A worker-owned slice of the next generation.
///
/// During mating each part is populated by exactly one worker from a
/// disjoint segment of the shuffled parent permutation; afterwards the
/// children are moved out into the population's own vector.
#[derive(Debug, Default)]
pub struct PopulationPart {
    indivs: Vec<Individual>,
}

impl PopulationPart {
    fn new() -> Self {
        Self::default()
    }

    /// Number of children currently in this part.
    pub fn len(&self) -> usize {
        self.indivs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indivs.is_empty()
    }

    /// Mate consecutive pairs of the given parent indices, writing all
    /// offspring into this part. An unpaired trailing parent sits out.
    fn mate(
        &mut self,
        parents: &[Individual],
        parent_indices: &[usize],
        models: &Models,
        ids: &mut IdSource,
        rng: &mut SimRng,
    ) {
        let expected =
            (parent_indices.len() as f64 * models.num_offspring).ceil() as usize;
        self.indivs.reserve(expected);
        for pair in parent_indices.chunks_exact(2) {
            let dad = &parents[pair[0]];
            let mom = &parents[pair[1]];
            self.indivs.extend(dad.mate(mom, models, ids, rng));
        }
    }
}

/// Summary statistics kept per generation. Most are cached lazily with the
/// convention that a zero means "not computed yet".
#[derive(Debug, Clone, Default)]
struct GenStats {
    actual_avg_offspring: f64,
    pre_sel_geno_fitness_mean: f64,
    pre_sel_geno_fitness_variance: f64,
    pre_sel_geno_fitness_stdev: f64,
    environ_noise: f64,

    stats_pop_size: u32,
    mean_fitness: f64,
    min_fitness: f64,
    max_fitness: f64,
    total_num_mutations: u64,
    mean_num_mutations: f64,

    mean_num_deleterious: f64,
    mean_num_neutral: f64,
    mean_num_favorable: f64,

    mean_num_del_allele: f64,
    mean_num_fav_allele: f64,
}

/// Cached population fitness aggregates.
#[derive(Debug, Clone, Copy, Default)]
pub struct FitnessStats {
    pub pop_size: u32,
    pub mean_fitness: f64,
    pub min_fitness: f64,
    pub max_fitness: f64,
    pub total_mutations: u64,
    pub mean_mutations: f64,
}

/// One tribe's population for one generation.
pub struct Population {
    tribe_num: u32,
    parts: Vec<PopulationPart>,
    /// The live individuals, in part order then part-local insertion order.
    /// Selection sorts and truncates this vector.
    indivs: Vec<Individual>,
    /// Target size after selection.
    target_size: u32,
    /// Set when the tribe went extinct or hit its population cap; all
    /// subsequent operations short-circuit.
    done: bool,
    /// Multi-bottleneck schedule state, passed down the generations.
    bottlenecks: Option<Bottlenecks>,
    /// Average surviving offspring per individual, derived from the
    /// reproductive rate and random-death fraction.
    num_offspring: f64,
    stats: GenStats,
}

/// Even segment size for partitioning the parent permutation, minimum 2.
fn round_to_even(x: f64) -> usize {
    ((x / 2.0).round() as usize) * 2
}

impl Population {
    /// Create the genesis population: `pop_size` mutation-free individuals.
    pub fn genesis(tribe_num: u32, cfg: &Configuration, models: &Models) -> Result<Self, ConfigError> {
        let bottlenecks = if models.growth_model == PopGrowthModel::MultiBottleneck {
            Some(Bottlenecks::parse(&cfg.growth.multiple_bottlenecks)?)
        } else {
            None
        };
        let indivs = (0..cfg.execution.pop_size)
            .map(|_| Individual::genesis(models))
            .collect();
        Ok(Self {
            tribe_num,
            parts: Vec::new(),
            indivs,
            target_size: cfg.execution.pop_size,
            done: false,
            bottlenecks,
            num_offspring: cfg.reproduction.num_offspring(),
            stats: GenStats::default(),
        })
    }

    /// Create the (empty) population for the next generation, applying the
    /// growth model to fix its target size. The bottleneck schedule state
    /// moves from the previous generation.
    pub fn next_generation(
        prev: &mut Population,
        gen_num: u32,
        cfg: &Configuration,
        models: &Models,
    ) -> Result<Self, SimulationError> {
        let target_size = models.growth_model.next_target_size(
            &cfg.growth,
            prev.target_size,
            prev.bottlenecks.as_mut(),
            gen_num,
        )?;
        Ok(Self {
            tribe_num: prev.tribe_num,
            parts: (0..cfg.execution.parts_per_pop)
                .map(|_| PopulationPart::new())
                .collect(),
            indivs: Vec::new(),
            target_size,
            done: false,
            bottlenecks: prev.bottlenecks.take(),
            num_offspring: prev.num_offspring,
            stats: GenStats::default(),
        })
    }

    /// Tribe number this population belongs to.
    pub fn tribe_num(&self) -> u32 {
        self.tribe_num
    }

    /// Current number of live individuals.
    pub fn current_size(&self) -> u32 {
        self.indivs.len() as u32
    }

    /// Target size after selection.
    pub fn target_size(&self) -> u32 {
        self.target_size
    }

    /// Whether this tribe has finished (extinct or at its cap).
    pub fn is_done(&self) -> bool {
        self.done
    }

    pub fn set_done(&mut self) {
        self.done = true;
    }

    /// The live individuals.
    pub fn individuals(&self) -> &[Individual] {
        &self.indivs
    }

    /// Average offspring actually produced per parent in the last mating.
    pub fn actual_avg_offspring(&self) -> f64 {
        self.stats.actual_avg_offspring
    }

    /// Environmental noise used by the last selection pass.
    pub fn environ_noise(&self) -> f64 {
        self.stats.environ_noise
    }

    /// Mean, variance, and standard deviation of GenoFitness right after
    /// mating, before any selection.
    pub fn pre_select_fitness_stats(&self) -> (f64, f64, f64) {
        (
            self.stats.pre_sel_geno_fitness_mean,
            self.stats.pre_sel_geno_fitness_variance,
            self.stats.pre_sel_geno_fitness_stdev,
        )
    }

    /// Plant initial contrasting alleles per the configured model.
    pub fn generate_initial_alleles(
        &mut self,
        cfg: &Configuration,
        models: &Models,
        ids: &Arc<IdAllocator>,
        rng: &mut SimRng,
    ) -> Result<(), ConfigError> {
        let alleles = &cfg.alleles;
        if alleles.num_contrasting_alleles == 0 {
            return Ok(());
        }
        match alleles.initial_allele_fitness_model {
            InitialAlleleFitnessModel::AllUnique => {
                self.generate_all_unique_alleles(alleles, models, ids, rng)
            }
            InitialAlleleFitnessModel::VariableFreq => {
                self.generate_variable_freq_alleles(alleles, models, ids, rng)
            }
        }
    }

    /// Give unique allele pairs to individuals, keeping the running
    /// recipient ratio at the configured population fraction.
    fn generate_all_unique_alleles(
        &mut self,
        alleles: &AlleleConfig,
        models: &Models,
        ids: &Arc<IdAllocator>,
        rng: &mut SimRng,
    ) -> Result<(), ConfigError> {
        if alleles.initial_alleles_pop_frac <= 0.0 {
            return Ok(());
        }
        let per_indiv = alleles.num_contrasting_alleles as u64 * 2;
        let mut id_source = IdSource::new(
            ids.clone(),
            per_indiv * self.indivs.len() as u64 + 64,
        );
        let mut num_with_alleles = 0u32;
        for i in 0..self.indivs.len() {
            let ratio_so_far = if i == 0 {
                0.0
            } else {
                num_with_alleles as f64 / i as f64
            };
            if ratio_so_far <= alleles.initial_alleles_pop_frac {
                self.indivs[i].add_initial_contrasting_alleles(
                    alleles.num_contrasting_alleles,
                    models,
                    &mut id_source,
                    rng,
                );
                num_with_alleles += 1;
            }
        }
        Ok(())
    }

    /// Create shared allele pairs and plant each in enough individuals to
    /// hit its configured chromosome-set frequency.
    fn generate_variable_freq_alleles(
        &mut self,
        alleles: &AlleleConfig,
        models: &Models,
        ids: &Arc<IdAllocator>,
        rng: &mut SimRng,
    ) -> Result<(), ConfigError> {
        let freq_list = parse_allele_frequencies(&alleles.initial_alleles_frequencies)?;
        let pop_size = self.indivs.len();
        let mut id_source = IdSource::new(
            ids.clone(),
            alleles.num_contrasting_alleles as u64 * 2 + 64,
        );

        for frac_freq in freq_list {
            let num_alleles = (alleles.num_contrasting_alleles as f64
                * frac_freq.allele_fraction)
                .round() as usize;
            // The frequency is a fraction of chromosome sets (twice the
            // population), and each shared allele lands on one linkage
            // block per chosen individual.
            let num_indivs =
                ((pop_size as f64 * frac_freq.frequency * 2.0).round() as usize).min(pop_size);
            let all_indivs = num_indivs == pop_size;

            for _ in 0..num_alleles {
                let (fav, del) = models.mutation.initial_allele_pair(&mut id_source, rng);
                let lb = rng.random_range(0..models.num_linkage_subunits);
                let chr_index = (lb / models.lbs_per_chromosome) as usize;
                let lb_index = (lb % models.lbs_per_chromosome) as usize;

                // Shuffle so repeated alleles don't pile onto the same
                // individuals.
                let chosen: Vec<usize> = if all_indivs {
                    (0..num_indivs).collect()
                } else {
                    shuffled_indices(rng, pop_size)
                        .into_iter()
                        .take(num_indivs)
                        .collect()
                };
                for i in chosen {
                    self.indivs[i].add_initial_allele_pair(chr_index, lb_index, fav, del);
                }
            }
        }
        Ok(())
    }

    /// Mate the previous generation's individuals into this population.
    ///
    /// The parent permutation is shuffled, split into even-sized contiguous
    /// segments, and each segment is mated concurrently into its own part.
    /// The first part reuses the caller's generator, so a single-part run
    /// has the exact random sequence of a serial one.
    pub fn mate(
        &mut self,
        prev: &Population,
        models: &Models,
        ids: &Arc<IdAllocator>,
        rng_factory: &RngFactory,
        rng: &mut SimRng,
    ) {
        struct MateTask {
            begin: usize,
            end: usize,
            rng: SimRng,
            ids: IdSource,
        }

        let parent_indices = shuffled_indices(rng, prev.current_size() as usize);
        let mut tasks: Vec<MateTask> = Vec::with_capacity(self.parts.len());
        if !parent_indices.is_empty() {
            let highest = parent_indices.len() - 1;
            let mut segment_size =
                round_to_even(parent_indices.len() as f64 / self.parts.len() as f64);
            if segment_size == 0 {
                segment_size = 2;
            }
            let mut segment_start = 0usize;
            for i in 0..self.parts.len() {
                if segment_start > highest {
                    break;
                }
                let end = if i < self.parts.len() - 1 {
                    (segment_start + segment_size - 1).min(highest)
                } else {
                    // The last segment absorbs the remainder.
                    highest
                };
                let task_rng = if i == 0 {
                    std::mem::replace(rng, SimRng::seed_from_u64(0))
                } else {
                    rng_factory.make_rng()
                };
                // Reserve ids with 1.5x headroom; small reservations are
                // doubled because Poisson variance bites harder there.
                let mut num_ids = ((end - segment_start + 1) as f64
                    * self.num_offspring
                    * models.mutn_rate
                    * 1.5)
                    .ceil() as u64;
                if num_ids <= 100 {
                    num_ids *= 2;
                }
                tasks.push(MateTask {
                    begin: segment_start,
                    end,
                    rng: task_rng,
                    ids: IdSource::new(ids.clone(), num_ids),
                });
                segment_start = end + 1;
            }
        }

        let parents = prev.individuals();
        let indices = &parent_indices;
        self.parts
            .par_iter_mut()
            .zip(tasks.par_iter_mut())
            .for_each(|(part, task)| {
                part.mate(
                    parents,
                    &indices[task.begin..=task.end],
                    models,
                    &mut task.ids,
                    &mut task.rng,
                );
            });

        // Hand the main generator back to the caller, advanced by part 0's
        // mating draws.
        if let Some(first) = tasks.first_mut() {
            std::mem::swap(rng, &mut first.rng);
        }

        // Move the children out of the parts, emptying each slot so every
        // individual has a single owner from here on.
        let total: usize = self.parts.iter().map(PopulationPart::len).sum();
        self.indivs.reserve(total);
        for part in &mut self.parts {
            self.indivs.append(&mut part.indivs);
        }

        self.stats.actual_avg_offspring = if prev.current_size() > 0 {
            self.current_size() as f64 / prev.current_size() as f64
        } else {
            0.0
        };

        let (mean, variance, stdev) = self.compute_pre_select_fitness_stats();
        self.stats.pre_sel_geno_fitness_mean = mean;
        self.stats.pre_sel_geno_fitness_variance = variance;
        self.stats.pre_sel_geno_fitness_stdev = stdev;
    }

    fn compute_pre_select_fitness_stats(&self) -> (f64, f64, f64) {
        let size = self.current_size() as f64;
        if size == 0.0 {
            return (0.0, 0.0, 0.0);
        }
        let mean = self
            .indivs
            .iter()
            .map(Individual::geno_fitness)
            .sum::<f64>()
            / size;
        let variance = self
            .indivs
            .iter()
            .map(|ind| (ind.geno_fitness() - mean).powi(2))
            .sum::<f64>()
            / size;
        (mean, variance, variance.sqrt())
    }

    /// Remove the least fit individuals to bring the population down to its
    /// target size.
    pub fn select(
        &mut self,
        cfg: &Configuration,
        models: &Models,
        rng: &mut SimRng,
    ) -> Result<(), SimulationError> {
        if self.done {
            return Ok(());
        }

        let herit = cfg.selection.heritability;
        let env_noise = (self.stats.pre_sel_geno_fitness_variance * (1.0 - herit) / herit
            + cfg.selection.non_scaling_noise.powi(2))
        .sqrt();
        self.stats.environ_noise = env_noise;
        models.selection_scheme.apply(
            &mut self.indivs,
            env_noise,
            models.partial_truncation_value,
            rng,
        )?;

        // Ascending by PhenoFitness; the dead (pheno 0, or SPPS ratio < 1)
        // settle into a prefix.
        self.indivs
            .sort_by(|a, b| a.pheno_fitness().total_cmp(&b.pheno_fitness()));

        let num_already_dead = self.num_dead_prefix();
        let current_size = self.current_size();
        if current_size > self.target_size {
            let num_eliminate = (current_size - self.target_size) as usize;
            if num_already_dead < num_eliminate {
                for ind in self.indivs.iter_mut().take(num_eliminate) {
                    ind.mark_dead();
                }
            }
        }
        // Under SPPS this can exceed the size overflow; that is allowed.
        let num_dead = self.num_dead_prefix();
        self.indivs.drain(..num_dead);
        Ok(())
    }

    /// Length of the dead prefix. Assumes the individuals are sorted by
    /// PhenoFitness ascending.
    fn num_dead_prefix(&self) -> usize {
        self.indivs
            .iter()
            .position(|ind| !ind.is_dead())
            .unwrap_or(self.indivs.len())
    }

    /// Whether this tribe has reached a terminal condition: its population
    /// cap (exponential growth only), extinction, or the mean-fitness
    /// floor.
    pub fn check_done(&mut self, cfg: &Configuration, models: &Models) -> bool {
        let pop_max_set =
            models.growth_model == PopGrowthModel::Exponential && cfg.growth.max_pop_size > 0;
        if pop_max_set && self.current_size() >= cfg.growth.max_pop_size {
            return true;
        }
        if self.current_size() < 2 {
            // Not enough individuals left to mate.
            return true;
        }
        if self.fitness_stats().mean_fitness < cfg.growth.extinction_threshold {
            return true;
        }
        false
    }

    /// Mean/min/max fitness plus mutation totals, cached after the first
    /// call per generation.
    pub fn fitness_stats(&mut self) -> FitnessStats {
        if self.stats.mean_fitness > 0.0 {
            return self.cached_fitness_stats();
        }
        let pop_size = self.current_size();
        if pop_size == 0 {
            return FitnessStats::default();
        }
        let mut mean = 0.0;
        let mut min = 99.0f64;
        let mut max = -99.0f64;
        let mut total_mutations = 0u64;
        for ind in &self.indivs {
            let fitness = ind.geno_fitness();
            mean += fitness;
            min = min.min(fitness);
            max = max.max(fitness);
            total_mutations += ind.num_mutations() as u64;
        }
        mean /= pop_size as f64;
        self.stats.stats_pop_size = pop_size;
        self.stats.mean_fitness = mean;
        self.stats.min_fitness = min;
        self.stats.max_fitness = max;
        self.stats.total_num_mutations = total_mutations;
        self.stats.mean_num_mutations = total_mutations as f64 / pop_size as f64;
        self.cached_fitness_stats()
    }

    /// The last computed fitness stats, without touching the individuals.
    /// Still valid after the final allele count has consumed them.
    pub fn cached_fitness_stats(&self) -> FitnessStats {
        FitnessStats {
            pop_size: self.stats.stats_pop_size,
            mean_fitness: self.stats.mean_fitness,
            min_fitness: self.stats.min_fitness,
            max_fitness: self.stats.max_fitness,
            total_mutations: self.stats.total_num_mutations,
            mean_mutations: self.stats.mean_num_mutations,
        }
    }

    /// Mean deleterious, neutral, and favorable mutation counts per
    /// individual, cached after the first call per generation.
    pub fn mutation_stats(&mut self) -> (f64, f64, f64) {
        if self.stats.mean_num_deleterious > 0.0 {
            return (
                self.stats.mean_num_deleterious,
                self.stats.mean_num_neutral,
                self.stats.mean_num_favorable,
            );
        }
        let pop_size = self.current_size() as f64;
        if pop_size == 0.0 {
            return (0.0, 0.0, 0.0);
        }
        let mut deleterious = 0u64;
        let mut neutral = 0u64;
        let mut favorable = 0u64;
        for ind in &self.indivs {
            let (d, n, f, _, _) = ind.mutation_stats();
            deleterious += d as u64;
            neutral += n as u64;
            favorable += f as u64;
        }
        self.stats.mean_num_deleterious = deleterious as f64 / pop_size;
        self.stats.mean_num_neutral = neutral as f64 / pop_size;
        self.stats.mean_num_favorable = favorable as f64 / pop_size;
        (
            self.stats.mean_num_deleterious,
            self.stats.mean_num_neutral,
            self.stats.mean_num_favorable,
        )
    }

    /// Mean deleterious and favorable initial-allele counts per individual.
    /// These never change after generation 0, so the cache is permanent.
    pub fn initial_allele_stats(&mut self) -> (f64, f64) {
        if self.stats.mean_num_del_allele > 0.0 {
            return (
                self.stats.mean_num_del_allele,
                self.stats.mean_num_fav_allele,
            );
        }
        let pop_size = self.current_size() as f64;
        if pop_size == 0.0 {
            return (0.0, 0.0);
        }
        let mut deleterious = 0u64;
        let mut favorable = 0u64;
        for ind in &self.indivs {
            let (d, f, _, _) = ind.initial_allele_stats();
            deleterious += d as u64;
            favorable += f as u64;
        }
        self.stats.mean_num_del_allele = deleterious as f64 / pop_size;
        self.stats.mean_num_fav_allele = favorable as f64 / pop_size;
        (
            self.stats.mean_num_del_allele,
            self.stats.mean_num_fav_allele,
        )
    }

    /// Count every tracked allele across the population.
    ///
    /// On the last generation the individuals are consumed as they are
    /// counted, so their genomes become reclaimable immediately instead of
    /// at the end of the pass; the configured interval controls how often
    /// the emptied spine is shrunk.
    pub fn count_alleles(&mut self, last_gen: bool, cfg: &AlleleConfig) -> AlleleCount {
        let mut totals = AlleleCount::new();
        if last_gen {
            let interval = release_interval(cfg.allele_count_gc_interval, self.current_size());
            let mut counted = 0u32;
            while let Some(ind) = self.indivs.pop() {
                ind.count_alleles(&mut totals);
                counted += 1;
                if interval > 0 && counted % interval == 0 {
                    self.indivs.shrink_to_fit();
                }
            }
        } else {
            for ind in &self.indivs {
                ind.count_alleles(&mut totals);
            }
        }
        totals
    }
}

/// Interval (in individuals) for releasing memory during the final allele
/// count. Values below 100 are a percentage of the population, clamped to
/// [100, 500].
fn release_interval(gc_interval: u32, pop_size: u32) -> u32 {
    if gc_interval == 0 {
        return 0;
    }
    if gc_interval < 100 {
        (pop_size * gc_interval / 100).clamp(100, 500)
    } else {
        gc_interval
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::main_rng;
    use crate::evolution::selection::SelectionScheme;

    fn setup(mutate: impl FnOnce(&mut Configuration)) -> (Configuration, Models) {
        let mut cfg = Configuration::default();
        cfg.execution.pop_size = 20;
        cfg.execution.seed = Some(42);
        cfg.genome.num_linkage_subunits = 12;
        cfg.genome.haploid_chromosome_number = 4;
        cfg.mutation.mutn_rate = 2.0;
        cfg.mutation.frac_fav_mutn = 0.0;
        cfg.mutation.fraction_neutral = 0.0;
        mutate(&mut cfg);
        cfg.validate().unwrap();
        let models = Models::resolve(&cfg).unwrap();
        (cfg, models)
    }

    fn mated_next_gen(
        cfg: &Configuration,
        models: &Models,
        prev: &mut Population,
        rng: &mut SimRng,
    ) -> Population {
        let ids = Arc::new(IdAllocator::new());
        let factory = RngFactory::new(42);
        let mut next = Population::next_generation(prev, 1, cfg, models).unwrap();
        next.mate(prev, models, &ids, &factory, rng);
        next
    }

    #[test]
    fn test_genesis_population() {
        let (cfg, models) = setup(|_| {});
        let pop = Population::genesis(1, &cfg, &models).unwrap();
        assert_eq!(pop.current_size(), 20);
        assert_eq!(pop.target_size(), 20);
        assert!(!pop.is_done());
    }

    #[test]
    fn test_mate_produces_next_generation() {
        let (cfg, models) = setup(|_| {});
        let mut prev = Population::genesis(1, &cfg, &models).unwrap();
        let mut rng = main_rng(cfg.execution.seed);
        let next = mated_next_gen(&cfg, &models, &mut prev, &mut rng);

        // Default reproduction doubles the population before selection.
        assert!(next.current_size() > 20);
        assert!((next.actual_avg_offspring() - 2.0).abs() < 0.75);

        // Pre-selection stats match a direct recomputation.
        let (mean, _, _) = next.pre_select_fitness_stats();
        let direct: f64 = next
            .individuals()
            .iter()
            .map(Individual::geno_fitness)
            .sum::<f64>()
            / next.current_size() as f64;
        assert!((mean - direct).abs() < 1e-12);
    }

    #[test]
    fn test_mate_consumes_each_parent_once() {
        // With uniform pairing over a shuffled permutation, every parent is
        // used exactly once as dad or mom, so all pairs are disjoint. The
        // offspring of N parents with pair-mean 4 lands near 2N.
        let (cfg, models) = setup(|c| c.execution.pop_size = 100);
        let mut prev = Population::genesis(1, &cfg, &models).unwrap();
        let mut rng = main_rng(cfg.execution.seed);
        let next = mated_next_gen(&cfg, &models, &mut prev, &mut rng);
        let ratio = next.current_size() as f64 / 100.0;
        assert!((1.5..=2.5).contains(&ratio), "ratio {ratio}");
    }

    #[test]
    fn test_select_trims_to_target() {
        let (cfg, models) = setup(|_| {});
        let mut prev = Population::genesis(1, &cfg, &models).unwrap();
        let mut rng = main_rng(cfg.execution.seed);
        let mut next = mated_next_gen(&cfg, &models, &mut prev, &mut rng);

        next.select(&cfg, &models, &mut rng).unwrap();
        assert_eq!(next.current_size(), next.target_size());
    }

    #[test]
    fn test_select_spps_can_kill_more_than_overflow() {
        let (cfg, models) = setup(|c| {
            c.selection.selection_scheme = SelectionScheme::StrictProportionalityProbability;
            c.execution.pop_size = 100;
        });
        let mut prev = Population::genesis(1, &cfg, &models).unwrap();
        let mut rng = main_rng(cfg.execution.seed);
        let mut next = mated_next_gen(&cfg, &models, &mut prev, &mut rng);

        next.select(&cfg, &models, &mut rng).unwrap();
        // The post-selection count never exceeds the target.
        assert!(next.current_size() <= next.target_size());
    }

    #[test]
    fn test_selection_sorts_dead_first(){
        let (cfg, models) = setup(|_| {});
        let mut prev = Population::genesis(1, &cfg, &models).unwrap();
        let mut rng = main_rng(cfg.execution.seed);
        let mut next = mated_next_gen(&cfg, &models, &mut prev, &mut rng);
        next.indivs[5].mark_dead();
        next.indivs[11].mark_dead();

        next.select(&cfg, &models, &mut rng).unwrap();
        // No dead individual survives selection.
        assert!(next.individuals().iter().all(|ind| !ind.is_dead()));
    }

    #[test]
    fn test_fitness_stats_cached() {
        let (cfg, models) = setup(|_| {});
        let mut pop = Population::genesis(1, &cfg, &models).unwrap();
        let first = pop.fitness_stats();
        assert_eq!(first.mean_fitness, 1.0);
        assert_eq!(first.total_mutations, 0);
        let second = pop.fitness_stats();
        assert_eq!(first.mean_fitness, second.mean_fitness);
    }

    #[test]
    fn test_generate_all_unique_initial_alleles_full_fraction() {
        let (cfg, models) = setup(|c| {
            c.execution.pop_size = 8;
            c.alleles.num_contrasting_alleles = 4;
            c.alleles.initial_alleles_pop_frac = 1.0;
        });
        let mut pop = Population::genesis(1, &cfg, &models).unwrap();
        let ids = Arc::new(IdAllocator::new());
        let mut rng = main_rng(cfg.execution.seed);
        pop.generate_initial_alleles(&cfg, &models, &ids, &mut rng)
            .unwrap();

        // Every individual got all its pairs.
        for ind in pop.individuals() {
            let (del, fav, _, _) = ind.initial_allele_stats();
            assert_eq!((del, fav), (4, 4));
        }
        let (mean_del, mean_fav) = pop.initial_allele_stats();
        assert_eq!(mean_del, 4.0);
        assert_eq!(mean_fav, 4.0);
    }

    #[test]
    fn test_generate_all_unique_initial_alleles_half_fraction() {
        let (cfg, models) = setup(|c| {
            c.execution.pop_size = 40;
            c.alleles.num_contrasting_alleles = 2;
            c.alleles.initial_alleles_pop_frac = 0.5;
        });
        let mut pop = Population::genesis(1, &cfg, &models).unwrap();
        let ids = Arc::new(IdAllocator::new());
        let mut rng = main_rng(cfg.execution.seed);
        pop.generate_initial_alleles(&cfg, &models, &ids, &mut rng)
            .unwrap();

        let recipients = pop
            .individuals()
            .iter()
            .filter(|ind| ind.num_mutations() > 0)
            .count();
        // Ratio throttling keeps recipients near half the population.
        assert!((19..=21).contains(&recipients), "recipients {recipients}");
    }

    #[test]
    fn test_generate_variable_freq_alleles_shared_ids() {
        let (cfg, models) = setup(|c| {
            c.execution.pop_size = 20;
            c.alleles.num_contrasting_alleles = 2;
            c.alleles.initial_allele_fitness_model = InitialAlleleFitnessModel::VariableFreq;
            c.alleles.initial_alleles_frequencies = "1.0:0.25".into();
        });
        let mut pop = Population::genesis(1, &cfg, &models).unwrap();
        let ids = Arc::new(IdAllocator::new());
        let mut rng = main_rng(cfg.execution.seed);
        pop.generate_initial_alleles(&cfg, &models, &ids, &mut rng)
            .unwrap();

        // 2 shared alleles, each planted in round(20 * 0.25 * 2) = 10
        // individuals.
        let counts = pop.count_alleles(false, &cfg.alleles);
        assert_eq!(counts.fav_initial.len(), 2);
        assert_eq!(counts.del_initial.len(), 2);
        for allele in counts.fav_initial.values() {
            assert_eq!(allele.count, 10);
        }
    }

    #[test]
    fn test_count_alleles_last_gen_consumes_population() {
        let (cfg, models) = setup(|c| {
            c.alleles.num_contrasting_alleles = 1;
        });
        let mut pop = Population::genesis(1, &cfg, &models).unwrap();
        let ids = Arc::new(IdAllocator::new());
        let mut rng = main_rng(cfg.execution.seed);
        pop.generate_initial_alleles(&cfg, &models, &ids, &mut rng)
            .unwrap();

        let counts = pop.count_alleles(true, &cfg.alleles);
        assert_eq!(pop.current_size(), 0);
        assert_eq!(counts.fav_initial.len(), 20);
    }

    #[test]
    fn test_check_done_extinct() {
        let (cfg, models) = setup(|_| {});
        let mut pop = Population::genesis(1, &cfg, &models).unwrap();
        pop.indivs.truncate(1);
        assert!(pop.check_done(&cfg, &models));
    }

    #[test]
    fn test_release_interval_percentage() {
        // 10% of 4000 individuals = 400, within the clamp.
        assert_eq!(release_interval(10, 4000), 400);
        // Clamped below and above.
        assert_eq!(release_interval(1, 1000), 100);
        assert_eq!(release_interval(50, 10_000), 500);
        // At or above 100 it is a plain interval.
        assert_eq!(release_interval(250, 10), 250);
        assert_eq!(release_interval(0, 10), 0);
    }

    #[test]
    fn test_round_to_even() {
        assert_eq!(round_to_even(10.0), 10);
        assert_eq!(round_to_even(5.0), 6);
        assert_eq!(round_to_even(4.9), 4);
        assert_eq!(round_to_even(1.0), 2);
        assert_eq!(round_to_even(0.4), 0);
    }
}
