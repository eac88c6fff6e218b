//! File recorder for per-generation outputs.
//!
//! Each tribe gets two line-oriented tables (mutation history and fitness)
//! plus up to four directories of per-generation JSON documents: absolute
//! allele bins, normalized allele bins, and the deleterious/favorable
//! fitness distributions. With a single tribe everything lives directly in
//! the output directory; with several, each tribe gets its own
//! subdirectory.

use crate::errors::SimulationError;
use crate::simulation::parameters::Configuration;
use crate::simulation::population::FitnessStats;
use crate::storage::types::{AlleleBins, FitnessDistribution, NormalizedAlleleBins};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::PathBuf;

const HISTORY_FILENAME: &str = "history.tsv";
const FITNESS_FILENAME: &str = "fitness.tsv";
const ALLELE_BINS_DIR: &str = "allele-bins";
const NORMALIZED_ALLELE_BINS_DIR: &str = "normalized-allele-bins";
const DISTRIBUTION_DEL_DIR: &str = "distribution-del";
const DISTRIBUTION_FAV_DIR: &str = "distribution-fav";

struct TribeFiles {
    dir: PathBuf,
    history: BufWriter<File>,
    fitness: BufWriter<File>,
}

/// Writes the engine's per-generation tables and documents.
pub struct Recorder {
    tribes: Vec<TribeFiles>,
    allele_bins: bool,
    normalized_allele_bins: bool,
    fitness_distributions: bool,
}

impl Recorder {
    /// Create the output tree and the per-tribe table files with their
    /// headers. Returns `None` when no output directory is configured.
    pub fn create(cfg: &Configuration) -> Result<Option<Self>, SimulationError> {
        let Some(base_dir) = &cfg.output.directory else {
            return Ok(None);
        };
        let multi_tribe = cfg.execution.num_tribes > 1;
        let mut tribes = Vec::with_capacity(cfg.execution.num_tribes as usize);
        for tribe_num in 1..=cfg.execution.num_tribes {
            let dir = if multi_tribe {
                base_dir.join(format!("tribe-{tribe_num}"))
            } else {
                base_dir.clone()
            };
            fs::create_dir_all(&dir)?;
            if cfg.output.allele_bins {
                fs::create_dir_all(dir.join(ALLELE_BINS_DIR))?;
            }
            if cfg.output.normalized_allele_bins {
                fs::create_dir_all(dir.join(NORMALIZED_ALLELE_BINS_DIR))?;
            }
            if cfg.output.fitness_distributions {
                fs::create_dir_all(dir.join(DISTRIBUTION_DEL_DIR))?;
                fs::create_dir_all(dir.join(DISTRIBUTION_FAV_DIR))?;
            }

            let mut history = BufWriter::new(File::create(dir.join(HISTORY_FILENAME))?);
            writeln!(history, "# Generation  Avg-deleterious  Avg-neutral  Avg-favorable")?;
            let mut fitness = BufWriter::new(File::create(dir.join(FITNESS_FILENAME))?);
            writeln!(
                fitness,
                "# Generation  Pop-size  Avg Offspring  Avg-fitness  Min-fitness  Max-fitness  Total Mutns  Mean Mutns  Noise"
            )?;
            tribes.push(TribeFiles {
                dir,
                history,
                fitness,
            });
        }
        Ok(Some(Self {
            tribes,
            allele_bins: cfg.output.allele_bins,
            normalized_allele_bins: cfg.output.normalized_allele_bins,
            fitness_distributions: cfg.output.fitness_distributions,
        }))
    }

    /// Whether the absolute allele-bin directory is enabled.
    pub fn allele_bins_enabled(&self) -> bool {
        self.allele_bins
    }

    /// Whether the normalized allele-bin directory is enabled.
    pub fn normalized_allele_bins_enabled(&self) -> bool {
        self.normalized_allele_bins
    }

    /// Whether the fitness-distribution directories are enabled.
    pub fn fitness_distributions_enabled(&self) -> bool {
        self.fitness_distributions
    }

    /// Whether any allele document directory is enabled.
    pub fn any_allele_output(&self) -> bool {
        self.allele_bins || self.normalized_allele_bins || self.fitness_distributions
    }

    fn tribe(&mut self, tribe_num: u32) -> &mut TribeFiles {
        &mut self.tribes[tribe_num as usize - 1]
    }

    /// Append one row to a tribe's mutation-history table.
    pub fn record_history(
        &mut self,
        tribe_num: u32,
        generation: u32,
        mean_deleterious: f64,
        mean_neutral: f64,
        mean_favorable: f64,
    ) -> Result<(), SimulationError> {
        let history = &mut self.tribe(tribe_num).history;
        writeln!(
            history,
            "{generation}  {mean_deleterious}  {mean_neutral}  {mean_favorable}"
        )?;
        Ok(())
    }

    /// Append one row to a tribe's fitness table.
    pub fn record_fitness(
        &mut self,
        tribe_num: u32,
        generation: u32,
        avg_offspring: f64,
        stats: FitnessStats,
        noise: f64,
    ) -> Result<(), SimulationError> {
        let fitness = &mut self.tribe(tribe_num).fitness;
        writeln!(
            fitness,
            "{generation}  {pop_size}  {avg_offspring}  {mean}  {min}  {max}  {total}  {mean_mutns}  {noise}",
            pop_size = stats.pop_size,
            mean = stats.mean_fitness,
            min = stats.min_fitness,
            max = stats.max_fitness,
            total = stats.total_mutations,
            mean_mutns = stats.mean_mutations,
        )?;
        Ok(())
    }

    fn write_doc<T: serde::Serialize>(
        &mut self,
        tribe_num: u32,
        subdir: &str,
        generation: u32,
        doc: &T,
    ) -> Result<(), SimulationError> {
        let path = self
            .tribe(tribe_num)
            .dir
            .join(subdir)
            .join(format!("{generation:08}.json"));
        fs::write(path, serde_json::to_vec(doc)?)?;
        Ok(())
    }

    /// Write one generation's absolute allele-bin document.
    pub fn record_allele_bins(
        &mut self,
        tribe_num: u32,
        doc: &AlleleBins,
    ) -> Result<(), SimulationError> {
        self.write_doc(tribe_num, ALLELE_BINS_DIR, doc.generation, doc)
    }

    /// Write one generation's normalized allele-bin document.
    pub fn record_normalized_allele_bins(
        &mut self,
        tribe_num: u32,
        doc: &NormalizedAlleleBins,
    ) -> Result<(), SimulationError> {
        self.write_doc(tribe_num, NORMALIZED_ALLELE_BINS_DIR, doc.generation, doc)
    }

    /// Write one generation's deleterious and favorable distribution
    /// documents.
    pub fn record_fitness_distributions(
        &mut self,
        tribe_num: u32,
        deleterious: &FitnessDistribution,
        favorable: &FitnessDistribution,
    ) -> Result<(), SimulationError> {
        self.write_doc(
            tribe_num,
            DISTRIBUTION_DEL_DIR,
            deleterious.generation,
            deleterious,
        )?;
        self.write_doc(tribe_num, DISTRIBUTION_FAV_DIR, favorable.generation, favorable)
    }

    /// Flush the table files so partial runs leave readable output.
    pub fn flush(&mut self) -> Result<(), SimulationError> {
        for tribe in &mut self.tribes {
            tribe.history.flush()?;
            tribe.fitness.flush()?;
        }
        Ok(())
    }
}
