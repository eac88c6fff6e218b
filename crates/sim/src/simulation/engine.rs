//! The simulation engine: builds the genesis tribes and drives the
//! per-generation loop of mate, select, report, and allele counting.

use crate::analysis::{bin_allele_frequencies, fitness_distributions, normalize_bins};
use crate::base::{IdAllocator, RngFactory, SimRng};
use crate::errors::SimulationError;
use crate::simulation::parameters::{Configuration, Models};
use crate::simulation::population::Population;
use crate::storage::Recorder;
use rand::{Rng, SeedableRng};
use std::sync::Arc;

/// Main simulation engine.
///
/// Owns the tribes, the main RNG, the worker-RNG factory, the global
/// mutation-id allocator, and the output recorder. The generation loop is
/// strictly sequential; parallelism lives inside each tribe's mate step.
pub struct Simulation {
    cfg: Configuration,
    models: Models,
    tribes: Vec<Population>,
    generation: u32,
    rng: SimRng,
    rng_factory: RngFactory,
    ids: Arc<IdAllocator>,
    recorder: Option<Recorder>,
}

impl Simulation {
    /// Validate the configuration, build the genesis tribes (with initial
    /// contrasting alleles, if configured), open the output files, and
    /// record generation 0.
    pub fn new(cfg: Configuration) -> Result<Self, SimulationError> {
        cfg.validate()?;
        let models = Models::resolve(&cfg)?;

        let base_seed = match cfg.execution.seed {
            Some(seed) => seed,
            None => rand::rng().random(),
        };
        let mut rng = SimRng::seed_from_u64(base_seed);
        let rng_factory = RngFactory::new(base_seed);
        let ids = Arc::new(IdAllocator::new());

        let mut tribes = Vec::with_capacity(cfg.execution.num_tribes as usize);
        for tribe_num in 1..=cfg.execution.num_tribes {
            let mut tribe = Population::genesis(tribe_num, &cfg, &models)?;
            tribe.generate_initial_alleles(&cfg, &models, &ids, &mut rng)?;
            tribes.push(tribe);
        }

        let recorder = Recorder::create(&cfg)?;
        let mut sim = Self {
            cfg,
            models,
            tribes,
            generation: 0,
            rng,
            rng_factory,
            ids,
            recorder,
        };

        // The founding generation gets its own rows (and allele plots when
        // a plot interval is set) so output series start at their origin.
        let last_gen = sim.cfg.execution.num_generations == 0;
        for t in 0..sim.tribes.len() {
            sim.report_tribe(t, 0, last_gen)?;
        }
        if let Some(recorder) = &mut sim.recorder {
            recorder.flush()?;
        }
        Ok(sim)
    }

    /// The resolved configuration.
    pub fn configuration(&self) -> &Configuration {
        &self.cfg
    }

    /// The current generation number (0 = genesis).
    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// All tribes.
    pub fn tribes(&self) -> &[Population] {
        &self.tribes
    }

    /// One tribe's current population.
    pub fn tribe(&self, index: usize) -> &Population {
        &self.tribes[index]
    }

    /// Whether the run is over: all generations simulated or every tribe
    /// done.
    pub fn is_finished(&self) -> bool {
        self.generation >= self.cfg.execution.num_generations
            || self.tribes.iter().all(Population::is_done)
    }

    /// Advance every live tribe by one generation.
    pub fn step(&mut self) -> Result<(), SimulationError> {
        self.generation += 1;
        let gen = self.generation;
        let last_gen = gen >= self.cfg.execution.num_generations;

        for t in 0..self.tribes.len() {
            if self.tribes[t].is_done() {
                continue;
            }

            let mut next =
                Population::next_generation(&mut self.tribes[t], gen, &self.cfg, &self.models)?;
            next.mate(
                &self.tribes[t],
                &self.models,
                &self.ids,
                &self.rng_factory,
                &mut self.rng,
            );
            next.select(&self.cfg, &self.models, &mut self.rng)?;
            self.tribes[t] = next;

            self.report_tribe(t, gen, last_gen)?;

            if self.tribes[t].check_done(&self.cfg, &self.models) {
                self.tribes[t].set_done();
            }
        }

        if let Some(recorder) = &mut self.recorder {
            recorder.flush()?;
        }
        Ok(())
    }

    /// Run until every generation is simulated or every tribe is done.
    pub fn run(&mut self) -> Result<(), SimulationError> {
        while !self.is_finished() {
            self.step()?;
        }
        Ok(())
    }

    /// Write one tribe's table rows and, on plot generations, its allele
    /// documents.
    fn report_tribe(&mut self, t: usize, gen: u32, last_gen: bool) -> Result<(), SimulationError> {
        let tribe_num = self.tribes[t].tribe_num();
        // Always compute (and thereby cache) the aggregates, so summaries
        // remain available after the final allele count consumes the
        // individuals.
        let stats = self.tribes[t].fitness_stats();
        if let Some(recorder) = &mut self.recorder {
            let (deleterious, neutral, favorable) = self.tribes[t].mutation_stats();
            recorder.record_history(tribe_num, gen, deleterious, neutral, favorable)?;
            recorder.record_fitness(
                tribe_num,
                gen,
                self.tribes[t].actual_avg_offspring(),
                stats,
                self.tribes[t].environ_noise(),
            )?;
        }

        self.count_and_record_alleles(t, gen, last_gen)
    }

    /// Count and bin alleles when this is a plot generation and any allele
    /// output is enabled. On the last generation the tribe's individuals
    /// are consumed by the count to cap peak memory.
    fn count_and_record_alleles(
        &mut self,
        t: usize,
        gen: u32,
        last_gen: bool,
    ) -> Result<(), SimulationError> {
        let Some(recorder) = &mut self.recorder else {
            return Ok(());
        };
        if !recorder.any_allele_output() {
            return Ok(());
        }
        let plot_gens = self.cfg.alleles.plot_allele_gens;
        if !(last_gen || (plot_gens > 0 && gen % plot_gens == 0)) {
            return Ok(());
        }
        let pop_size = self.tribes[t].current_size();
        if pop_size == 0 {
            return Ok(());
        }
        let tribe_num = self.tribes[t].tribe_num();
        let counts = self.tribes[t].count_alleles(last_gen, &self.cfg.alleles);

        if recorder.allele_bins_enabled() || recorder.normalized_allele_bins_enabled() {
            let bins = bin_allele_frequencies(&counts, pop_size, &self.cfg.alleles, gen);
            if recorder.allele_bins_enabled() {
                recorder.record_allele_bins(tribe_num, &bins)?;
            }
            if recorder.normalized_allele_bins_enabled() {
                let normalized = normalize_bins(&bins, self.cfg.alleles.omit_first_allele_bin);
                recorder.record_normalized_allele_bins(tribe_num, &normalized)?;
            }
        }

        if recorder.fitness_distributions_enabled() {
            let (deleterious, favorable) =
                fitness_distributions(&counts, pop_size, gen, &self.cfg.mutation);
            recorder.record_fitness_distributions(tribe_num, &deleterious, &favorable)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> Configuration {
        let mut cfg = Configuration::default();
        cfg.execution.pop_size = 10;
        cfg.execution.num_generations = 3;
        cfg.execution.seed = Some(42);
        cfg.genome.num_linkage_subunits = 12;
        cfg.genome.haploid_chromosome_number = 4;
        cfg.mutation.mutn_rate = 1.0;
        cfg
    }

    #[test]
    fn test_new_builds_genesis_tribes() {
        let sim = Simulation::new(small_config()).unwrap();
        assert_eq!(sim.generation(), 0);
        assert_eq!(sim.tribes().len(), 1);
        assert_eq!(sim.tribe(0).current_size(), 10);
        assert!(!sim.is_finished());
    }

    #[test]
    fn test_step_advances_generation() {
        let mut sim = Simulation::new(small_config()).unwrap();
        sim.step().unwrap();
        assert_eq!(sim.generation(), 1);
        assert_eq!(sim.tribe(0).current_size(), 10);
    }

    #[test]
    fn test_run_completes_all_generations() {
        let mut sim = Simulation::new(small_config()).unwrap();
        sim.run().unwrap();
        assert_eq!(sim.generation(), 3);
        assert!(sim.is_finished());
    }

    #[test]
    fn test_invalid_configuration_rejected() {
        let mut cfg = small_config();
        cfg.genome.num_linkage_subunits = 13;
        assert!(Simulation::new(cfg).is_err());
    }

    #[test]
    fn test_multiple_tribes_run_independently() {
        let mut cfg = small_config();
        cfg.execution.num_tribes = 2;
        let mut sim = Simulation::new(cfg).unwrap();
        sim.run().unwrap();
        assert_eq!(sim.tribes().len(), 2);
        for tribe in sim.tribes() {
            assert_eq!(tribe.current_size(), 10);
        }
    }

    #[test]
    fn test_done_tribe_short_circuits() {
        let mut sim = Simulation::new(small_config()).unwrap();
        sim.tribes[0].set_done();
        sim.step().unwrap();
        // A done tribe is left untouched.
        assert_eq!(sim.tribe(0).current_size(), 10);
        assert!(sim.is_finished());
    }
}
