use anyhow::{Context, Result};
use heritage_sim::simulation::Configuration;
use std::path::Path;

use crate::printing::print_parameters;

/// Load and validate a configuration file, printing its effective
/// parameters on success.
pub fn validate_config(config: &Path) -> Result<()> {
    let cfg = Configuration::from_json_file(config)
        .with_context(|| format!("Failed to load {}", config.display()))?;
    cfg.validate()
        .with_context(|| format!("{} is not a valid configuration", config.display()))?;

    println!("Configuration is valid");
    print_parameters(&cfg);
    Ok(())
}
