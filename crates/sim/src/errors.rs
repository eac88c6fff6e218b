use std::error;
use std::fmt;

/// Errors detected while validating or parsing the configuration.
///
/// All of these are fatal at startup: the simulation never begins with an
/// invalid configuration.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// An option has a value outside its legal range.
    InvalidParameter(String),
    /// Total linkage subunits must divide evenly among the chromosomes.
    IndivisibleLinkage { subunits: u32, chromosomes: u32 },
    /// A recognized option selects a feature path that is not implemented.
    NotImplemented(&'static str),
    /// A structured option string (bottleneck tuples, allele frequencies)
    /// could not be parsed.
    Parse(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidParameter(msg) => write!(f, "Invalid parameter: {msg}"),
            Self::IndivisibleLinkage {
                subunits,
                chromosomes,
            } => write!(
                f,
                "num_linkage_subunits ({subunits}) must be an exact multiple of haploid_chromosome_number ({chromosomes})"
            ),
            Self::NotImplemented(what) => write!(f, "Not implemented: {what}"),
            Self::Parse(msg) => write!(f, "Parse error: {msg}"),
        }
    }
}

impl error::Error for ConfigError {}

/// Errors that can abort a running simulation.
#[derive(Debug)]
pub enum SimulationError {
    /// Configuration was invalid (the startup taxonomy).
    Config(ConfigError),
    /// Under strict-proportionality selection the maximum augmented fitness
    /// was not positive, so the whole population is dead.
    DeadPopulation { max_fitness: f64 },
    /// A multi-bottleneck schedule whose ranges are not strictly increasing
    /// was detected while advancing generations.
    BottleneckOrder { generation: u32 },
    /// Writing an output file failed.
    Io(std::io::Error),
    /// Serializing an output document failed.
    Json(serde_json::Error),
}

impl fmt::Display for SimulationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "{e}"),
            Self::DeadPopulation { max_fitness } => write!(
                f,
                "Max individual fitness is <= 0 ({max_fitness}), so the whole population is dead"
            ),
            Self::BottleneckOrder { generation } => write!(
                f,
                "Bottleneck error at generation {generation}: the current bottleneck range does not follow the previous range"
            ),
            Self::Io(e) => write!(f, "Output error: {e}"),
            Self::Json(e) => write!(f, "Serialization error: {e}"),
        }
    }
}

impl error::Error for SimulationError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Self::Config(e) => Some(e),
            Self::Io(e) => Some(e),
            Self::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigError> for SimulationError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<std::io::Error> for SimulationError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<serde_json::Error> for SimulationError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let e = ConfigError::IndivisibleLinkage {
            subunits: 10,
            chromosomes: 4,
        };
        let msg = e.to_string();
        assert!(msg.contains("10"));
        assert!(msg.contains("4"));
    }

    #[test]
    fn test_simulation_error_from_config() {
        let e: SimulationError = ConfigError::NotImplemented("clonal recombination").into();
        assert!(e.to_string().contains("clonal recombination"));
    }

    #[test]
    fn test_dead_population_display() {
        let e = SimulationError::DeadPopulation { max_fitness: 0.0 };
        assert!(e.to_string().contains("dead"));
    }
}
