//! Simulation parameters and configuration.
//!
//! The configuration is a tree of per-concern structs, each with defaults
//! for every field so a partial JSON file works. `Configuration::validate`
//! applies the startup error taxonomy: range checks, divisibility,
//! structured-string parses, and the not-implemented feature gates.

use crate::errors::{ConfigError, SimulationError};
use crate::evolution::growth::{Bottlenecks, PopGrowthModel};
use crate::evolution::mutation::MutationModel;
use crate::evolution::recombination::CrossoverModel;
use crate::evolution::reproduction::{FitnessModel, NumMutationsModel, NumOffspringModel};
use crate::evolution::selection::SelectionScheme;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Recombination forms recognized by the configuration. Only full sexual
/// reproduction is implemented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecombinationForm {
    FullSexual,
    Clonal,
    Suppressed,
}

/// How initial contrasting alleles are distributed over the population.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InitialAlleleFitnessModel {
    /// Every chosen individual gets its own unique allele pairs.
    AllUnique,
    /// Shared allele pairs planted at configured population frequencies.
    VariableFreq,
}

/// Run-level settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionConfig {
    /// Initial number of diploid individuals per tribe.
    pub pop_size: u32,
    /// Number of generations to simulate.
    pub num_generations: u32,
    /// Number of independent tribes.
    pub num_tribes: u32,
    /// Worker-owned population parts mated concurrently. With 1 part the
    /// run is bit-reproducible for a fixed seed.
    pub parts_per_pop: usize,
    /// RNG seed; omitted means seeded from OS entropy.
    pub seed: Option<u64>,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            pop_size: 1000,
            num_generations: 200,
            num_tribes: 1,
            parts_per_pop: 1,
            seed: None,
        }
    }
}

/// Genome structure settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenomeConfig {
    /// Total linkage blocks per haploid set. Must divide evenly by the
    /// chromosome number.
    pub num_linkage_subunits: u32,
    /// Chromosomes per haploid set.
    pub haploid_chromosome_number: u32,
    /// Mean crossovers per chromosome pair during meiosis (partial model).
    pub mean_num_crossovers: u32,
    /// Crossover strategy used to build gametes.
    pub crossover_model: CrossoverModel,
    /// Reproduction form; only full sexual is accepted.
    pub recombination_model: RecombinationForm,
}

impl Default for GenomeConfig {
    fn default() -> Self {
        Self {
            num_linkage_subunits: 989,
            haploid_chromosome_number: 23,
            mean_num_crossovers: 2,
            crossover_model: CrossoverModel::Partial,
            recombination_model: RecombinationForm::FullSexual,
        }
    }
}

impl GenomeConfig {
    /// Linkage blocks per chromosome.
    pub fn lbs_per_chromosome(&self) -> u32 {
        self.num_linkage_subunits / self.haploid_chromosome_number
    }
}

/// Mutation-process settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MutationConfig {
    /// Mean new mutations per offspring per generation.
    pub mutn_rate: f64,
    /// Fraction of non-neutral mutations that are favorable.
    pub frac_fav_mutn: f64,
    /// Fraction of all mutations that are neutral.
    pub fraction_neutral: f64,
    /// Fraction of mutations that are recessive.
    pub fraction_recessive: f64,
    /// Minimum absolute fitness effect for a mutation to keep its identity
    /// on the mutation chain; 0 disables filtering.
    pub tracking_threshold: f64,
    /// Whether neutral mutations retain identity.
    pub track_neutrals: bool,
    /// Functional genome size; sets the deleterious distribution shape.
    pub genome_size: f64,
    /// Cap on a single favorable mutation's fitness gain.
    pub max_fav_fitness_gain: f64,
    /// Weibull alpha for deleterious effects; 0 derives ln(genome_size).
    pub alpha_del: f64,
    /// Weibull gamma for deleterious effects; 0 derives the standard
    /// high-impact solution.
    pub gamma_del: f64,
    /// Weibull alpha for favorable effects; 0 derives
    /// ln(genome_size * max_fav_fitness_gain).
    pub alpha_fav: f64,
    /// Weibull gamma for favorable effects; 0 derives the standard value.
    pub gamma_fav: f64,
    /// Scale factor on deleterious magnitudes.
    pub del_scale: f64,
    /// How the per-offspring mutation count is drawn.
    pub num_mutations_model: NumMutationsModel,
}

impl Default for MutationConfig {
    fn default() -> Self {
        Self {
            mutn_rate: 10.0,
            frac_fav_mutn: 0.01,
            fraction_neutral: 0.0,
            fraction_recessive: 0.5,
            tracking_threshold: 0.0,
            track_neutrals: false,
            genome_size: 3.0e9,
            max_fav_fitness_gain: 0.01,
            alpha_del: 0.0,
            gamma_del: 0.0,
            alpha_fav: 0.0,
            gamma_fav: 0.0,
            del_scale: 1.0,
            num_mutations_model: NumMutationsModel::Poisson,
        }
    }
}

/// Fraction of mutations above the high-impact threshold, used to derive
/// the default Weibull gamma.
const HIGH_IMPACT_FRACTION: f64 = 0.001;
/// The effect magnitude that counts as high impact.
const HIGH_IMPACT_THRESHOLD: f64 = 0.1;

impl MutationConfig {
    pub fn effective_alpha_del(&self) -> f64 {
        if self.alpha_del != 0.0 {
            self.alpha_del
        } else {
            self.genome_size.ln()
        }
    }

    pub fn effective_gamma_del(&self) -> f64 {
        if self.gamma_del != 0.0 {
            self.gamma_del
        } else {
            // Solve magnitude(HIGH_IMPACT_FRACTION) == HIGH_IMPACT_THRESHOLD
            // for gamma, so that fraction of mutations clears the threshold.
            (-HIGH_IMPACT_THRESHOLD.ln() / self.effective_alpha_del()).ln()
                / HIGH_IMPACT_FRACTION.ln()
        }
    }

    pub fn effective_alpha_fav(&self) -> f64 {
        if self.alpha_fav != 0.0 {
            self.alpha_fav
        } else if self.max_fav_fitness_gain > 0.0 {
            (self.genome_size * self.max_fav_fitness_gain).ln()
        } else {
            self.effective_alpha_del()
        }
    }

    pub fn effective_gamma_fav(&self) -> f64 {
        if self.gamma_fav != 0.0 {
            self.gamma_fav
        } else {
            (-HIGH_IMPACT_THRESHOLD.ln() / self.effective_alpha_fav()).ln()
                / HIGH_IMPACT_FRACTION.ln()
        }
    }
}

/// Reproduction settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReproductionConfig {
    /// Offspring per individual before random death.
    pub reproductive_rate: f64,
    /// Fraction of offspring lost to fitness-independent death.
    pub fraction_random_death: f64,
    /// How the per-pair offspring count is drawn.
    pub num_offspring_model: NumOffspringModel,
    /// How mutation effects combine into genomic fitness.
    pub fitness_model: FitnessModel,
}

impl Default for ReproductionConfig {
    fn default() -> Self {
        Self {
            reproductive_rate: 2.0,
            fraction_random_death: 0.0,
            num_offspring_model: NumOffspringModel::SemiFixed,
            fitness_model: FitnessModel::Additive,
        }
    }
}

impl ReproductionConfig {
    /// Average surviving offspring per individual.
    pub fn num_offspring(&self) -> f64 {
        self.reproductive_rate * (1.0 - self.fraction_random_death)
    }
}

/// Selection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    /// Selection-noise strategy.
    pub selection_scheme: SelectionScheme,
    /// Fraction of fitness variance that is heritable.
    pub heritability: f64,
    /// Noise term independent of the fitness variance.
    pub non_scaling_noise: f64,
    /// Theta for the partial truncation scheme.
    pub partial_truncation_value: f64,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            selection_scheme: SelectionScheme::FullTruncation,
            heritability: 0.2,
            non_scaling_noise: 0.05,
            partial_truncation_value: 0.5,
        }
    }
}

/// Population growth settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GrowthConfig {
    pub pop_growth_model: PopGrowthModel,
    /// Growth rate (exponential, capacity, and pre-bottleneck founders).
    pub pop_growth_rate: f64,
    /// Post-bottleneck growth rate for the founders model.
    pub pop_growth_rate2: f64,
    /// Cap for the exponential model; reaching it finishes the tribe.
    /// 0 means no cap.
    pub max_pop_size: u32,
    /// Carrying capacity for the capacity and founders models.
    pub carrying_capacity: u32,
    /// First bottleneck generation for the founders model; 0 disables.
    pub bottleneck_generation: u32,
    pub num_bottleneck_generations: u32,
    pub bottleneck_pop_size: u32,
    /// Comma-separated growth-rate:max-pop:start:size:gens tuples for the
    /// multi-bottleneck model.
    pub multiple_bottlenecks: String,
    /// Mean-fitness floor below which a tribe stops.
    pub extinction_threshold: f64,
}

impl Default for GrowthConfig {
    fn default() -> Self {
        Self {
            pop_growth_model: PopGrowthModel::None,
            pop_growth_rate: 1.0,
            pop_growth_rate2: 1.0,
            max_pop_size: 0,
            carrying_capacity: 10_000,
            bottleneck_generation: 0,
            num_bottleneck_generations: 0,
            bottleneck_pop_size: 0,
            multiple_bottlenecks: String::new(),
            extinction_threshold: 0.0,
        }
    }
}

/// Initial-allele and allele-plot settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AlleleConfig {
    /// Contrasting allele pairs given to each chosen individual.
    pub num_contrasting_alleles: u32,
    /// Fraction of the population receiving initial alleles (all-unique
    /// model).
    pub initial_alleles_pop_frac: f64,
    /// "allele-fraction:frequency, ..." pairs for the variable-frequency
    /// model.
    pub initial_alleles_frequencies: String,
    pub initial_allele_fitness_model: InitialAlleleFitnessModel,
    /// Write allele plots every this many generations; 0 means only the
    /// last generation.
    pub plot_allele_gens: u32,
    /// Drop the rare-allele bin from the plots.
    pub omit_first_allele_bin: bool,
    /// Count each occurrence of an allele (pool = 2N) instead of each
    /// carrier (pool = N).
    pub count_duplicate_alleles: bool,
    /// Progress-report interval while counting alleles; values below 100
    /// are a percentage of the population, clamped to [100, 500].
    pub allele_count_gc_interval: u32,
}

impl Default for AlleleConfig {
    fn default() -> Self {
        Self {
            num_contrasting_alleles: 0,
            initial_alleles_pop_frac: 1.0,
            initial_alleles_frequencies: String::new(),
            initial_allele_fitness_model: InitialAlleleFitnessModel::AllUnique,
            plot_allele_gens: 0,
            omit_first_allele_bin: false,
            count_duplicate_alleles: true,
            allele_count_gc_interval: 100,
        }
    }
}

/// Output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory for all output files; omitted disables file output.
    pub directory: Option<PathBuf>,
    /// Write the absolute allele-bin documents.
    pub allele_bins: bool,
    /// Write the normalized allele-bin documents.
    pub normalized_allele_bins: bool,
    /// Write the deleterious/favorable fitness-distribution documents.
    pub fitness_distributions: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: None,
            allele_bins: true,
            normalized_allele_bins: true,
            fitness_distributions: true,
        }
    }
}

impl OutputConfig {
    /// Whether any allele-plot directory is enabled.
    pub fn any_allele_output(&self) -> bool {
        self.directory.is_some()
            && (self.allele_bins || self.normalized_allele_bins || self.fitness_distributions)
    }
}

/// One allele-fraction:frequency pair of the variable-frequency model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlleleFrequency {
    pub allele_fraction: f64,
    pub frequency: f64,
}

/// Parse the "alfrac1:freq1, alfrac2:freq2, ..." syntax. Allele fractions
/// must be in (0, 1] and sum to 1; frequencies must be in (0, 0.5].
pub fn parse_allele_frequencies(text: &str) -> Result<Vec<AlleleFrequency>, ConfigError> {
    let usage = "initial_alleles_frequencies must be like: alfrac1:freq1, alfrac2:freq2, ...";
    if text.trim().is_empty() {
        return Err(ConfigError::Parse(usage.to_string()));
    }
    let mut list = Vec::new();
    let mut fraction_total = 0.0;
    for pair in text.split(',') {
        let parts: Vec<&str> = pair.split(':').collect();
        if parts.len() != 2 {
            return Err(ConfigError::Parse(usage.to_string()));
        }
        let allele_fraction: f64 = parts[0]
            .trim()
            .parse()
            .map_err(|e| ConfigError::Parse(format!("{usage} ({e})")))?;
        if allele_fraction <= 0.0 || allele_fraction > 1.0 {
            return Err(ConfigError::Parse(format!(
                "allele fractions must be > 0.0 and <= 1.0, not {allele_fraction}"
            )));
        }
        let frequency: f64 = parts[1]
            .trim()
            .parse()
            .map_err(|e| ConfigError::Parse(format!("{usage} ({e})")))?;
        if frequency <= 0.0 || frequency > 0.5 {
            return Err(ConfigError::Parse(format!(
                "frequencies must be > 0.0 and <= 0.5, not {frequency}"
            )));
        }
        list.push(AlleleFrequency {
            allele_fraction,
            frequency,
        });
        fraction_total += allele_fraction;
    }
    if (fraction_total - 1.0).abs() > 1.0e-9 {
        return Err(ConfigError::Parse(format!(
            "the allele fractions in initial_alleles_frequencies must add up to 1.0, not {fraction_total}"
        )));
    }
    Ok(list)
}

/// The complete simulation configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Configuration {
    pub execution: ExecutionConfig,
    pub genome: GenomeConfig,
    pub mutation: MutationConfig,
    pub reproduction: ReproductionConfig,
    pub selection: SelectionConfig,
    pub growth: GrowthConfig,
    pub alleles: AlleleConfig,
    pub output: OutputConfig,
}

impl Configuration {
    /// Load a configuration from a JSON file. Missing fields take their
    /// defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, SimulationError> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Serialize with stable formatting, for `init`-style config scaffolds.
    pub fn to_json_pretty(&self) -> Result<String, SimulationError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Apply the full startup error taxonomy.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let exec = &self.execution;
        if exec.pop_size < 2 {
            return Err(ConfigError::InvalidParameter(format!(
                "pop_size must be at least 2, not {}",
                exec.pop_size
            )));
        }
        if exec.num_tribes == 0 {
            return Err(ConfigError::InvalidParameter(
                "num_tribes must be at least 1".into(),
            ));
        }
        if exec.parts_per_pop == 0 {
            return Err(ConfigError::InvalidParameter(
                "parts_per_pop must be at least 1".into(),
            ));
        }

        let genome = &self.genome;
        if genome.num_linkage_subunits == 0 || genome.haploid_chromosome_number == 0 {
            return Err(ConfigError::InvalidParameter(
                "num_linkage_subunits and haploid_chromosome_number must be positive".into(),
            ));
        }
        if genome.num_linkage_subunits % genome.haploid_chromosome_number != 0 {
            return Err(ConfigError::IndivisibleLinkage {
                subunits: genome.num_linkage_subunits,
                chromosomes: genome.haploid_chromosome_number,
            });
        }
        if genome.recombination_model != RecombinationForm::FullSexual {
            return Err(ConfigError::NotImplemented(
                "recombination models other than full_sexual",
            ));
        }

        let mutation = &self.mutation;
        for (name, value) in [
            ("frac_fav_mutn", mutation.frac_fav_mutn),
            ("fraction_neutral", mutation.fraction_neutral),
            ("fraction_recessive", mutation.fraction_recessive),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::InvalidParameter(format!(
                    "{name} must be between 0.0 and 1.0, not {value}"
                )));
            }
        }
        if mutation.mutn_rate < 0.0 {
            return Err(ConfigError::InvalidParameter(format!(
                "mutn_rate must be >= 0.0, not {}",
                mutation.mutn_rate
            )));
        }
        if mutation.tracking_threshold < 0.0 {
            return Err(ConfigError::InvalidParameter(format!(
                "tracking_threshold must be >= 0.0, not {}",
                mutation.tracking_threshold
            )));
        }
        if mutation.genome_size <= 1.0 {
            return Err(ConfigError::InvalidParameter(format!(
                "genome_size must be > 1.0, not {}",
                mutation.genome_size
            )));
        }
        if !(0.0..=1.0).contains(&mutation.max_fav_fitness_gain) {
            return Err(ConfigError::InvalidParameter(format!(
                "max_fav_fitness_gain must be between 0.0 and 1.0, not {}",
                mutation.max_fav_fitness_gain
            )));
        }

        let repro = &self.reproduction;
        if repro.reproductive_rate <= 0.0 {
            return Err(ConfigError::InvalidParameter(format!(
                "reproductive_rate must be > 0.0, not {}",
                repro.reproductive_rate
            )));
        }
        if !(0.0..1.0).contains(&repro.fraction_random_death) {
            return Err(ConfigError::InvalidParameter(format!(
                "fraction_random_death must be in [0.0, 1.0), not {}",
                repro.fraction_random_death
            )));
        }
        if repro.num_offspring_model == NumOffspringModel::FitnessProportional {
            return Err(ConfigError::NotImplemented("fitness-dependent fertility"));
        }
        if repro.fitness_model == FitnessModel::Multiplicative {
            return Err(ConfigError::NotImplemented("multiplicative weighting"));
        }

        let selection = &self.selection;
        if selection.heritability <= 0.0 || selection.heritability > 1.0 {
            return Err(ConfigError::InvalidParameter(format!(
                "heritability must be in (0.0, 1.0], not {}",
                selection.heritability
            )));
        }
        if selection.non_scaling_noise < 0.0 {
            return Err(ConfigError::InvalidParameter(format!(
                "non_scaling_noise must be >= 0.0, not {}",
                selection.non_scaling_noise
            )));
        }
        if !(0.0..=1.0).contains(&selection.partial_truncation_value) {
            return Err(ConfigError::InvalidParameter(format!(
                "partial_truncation_value must be between 0.0 and 1.0, not {}",
                selection.partial_truncation_value
            )));
        }

        let growth = &self.growth;
        match growth.pop_growth_model {
            PopGrowthModel::None => {}
            PopGrowthModel::Exponential | PopGrowthModel::Founders => {
                if growth.pop_growth_rate <= 0.0 {
                    return Err(ConfigError::InvalidParameter(format!(
                        "pop_growth_rate must be > 0.0, not {}",
                        growth.pop_growth_rate
                    )));
                }
            }
            PopGrowthModel::Capacity => {
                if growth.pop_growth_rate <= 0.0 || growth.carrying_capacity == 0 {
                    return Err(ConfigError::InvalidParameter(
                        "capacity growth requires pop_growth_rate > 0.0 and carrying_capacity > 0"
                            .into(),
                    ));
                }
            }
            PopGrowthModel::MultiBottleneck => {
                Bottlenecks::parse(&growth.multiple_bottlenecks)?;
            }
        }

        let alleles = &self.alleles;
        if alleles.num_contrasting_alleles > 0 {
            if alleles.initial_alleles_pop_frac <= 0.0 || alleles.initial_alleles_pop_frac > 1.0 {
                return Err(ConfigError::InvalidParameter(format!(
                    "initial_alleles_pop_frac must be in (0.0, 1.0], not {}",
                    alleles.initial_alleles_pop_frac
                )));
            }
            if alleles.initial_allele_fitness_model == InitialAlleleFitnessModel::VariableFreq {
                parse_allele_frequencies(&alleles.initial_alleles_frequencies)?;
            }
        }

        Ok(())
    }
}

/// The strategy set and hot-loop scalars resolved once from the
/// configuration. Mating workers share this read-only.
#[derive(Debug, Clone)]
pub struct Models {
    pub crossover: CrossoverModel,
    pub num_offspring_model: NumOffspringModel,
    pub num_mutations_model: NumMutationsModel,
    pub fitness_model: FitnessModel,
    pub selection_scheme: SelectionScheme,
    pub growth_model: PopGrowthModel,
    pub mutation: MutationModel,

    pub mean_num_crossovers: u32,
    pub num_linkage_subunits: u32,
    pub lbs_per_chromosome: u32,
    pub haploid_chromosome_number: u32,
    pub mutn_rate: f64,
    pub num_offspring: f64,
    pub partial_truncation_value: f64,
}

impl Models {
    /// Resolve every strategy from the configuration. Reserved feature
    /// paths are rejected here so the hot loops never see them.
    pub fn resolve(cfg: &Configuration) -> Result<Self, ConfigError> {
        if cfg.genome.recombination_model != RecombinationForm::FullSexual {
            return Err(ConfigError::NotImplemented(
                "recombination models other than full_sexual",
            ));
        }
        if cfg.reproduction.num_offspring_model == NumOffspringModel::FitnessProportional {
            return Err(ConfigError::NotImplemented("fitness-dependent fertility"));
        }
        if cfg.reproduction.fitness_model == FitnessModel::Multiplicative {
            return Err(ConfigError::NotImplemented("multiplicative weighting"));
        }
        Ok(Self {
            crossover: cfg.genome.crossover_model,
            num_offspring_model: cfg.reproduction.num_offspring_model,
            num_mutations_model: cfg.mutation.num_mutations_model,
            fitness_model: cfg.reproduction.fitness_model,
            selection_scheme: cfg.selection.selection_scheme,
            growth_model: cfg.growth.pop_growth_model,
            mutation: MutationModel::from_config(&cfg.mutation),
            mean_num_crossovers: cfg.genome.mean_num_crossovers,
            num_linkage_subunits: cfg.genome.num_linkage_subunits,
            lbs_per_chromosome: cfg.genome.lbs_per_chromosome(),
            haploid_chromosome_number: cfg.genome.haploid_chromosome_number,
            mutn_rate: cfg.mutation.mutn_rate,
            num_offspring: cfg.reproduction.num_offspring(),
            partial_truncation_value: cfg.selection.partial_truncation_value,
        })
    }
}
