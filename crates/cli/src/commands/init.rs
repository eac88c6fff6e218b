use anyhow::{bail, Context, Result};
use heritage_sim::simulation::Configuration;
use std::path::Path;

/// Write a configuration file filled with the default parameters.
pub fn create_config(output: &Path, force: bool) -> Result<()> {
    if output.exists() && !force {
        bail!(
            "{} already exists (use --force to overwrite)",
            output.display()
        );
    }

    let cfg = Configuration::default();
    let text = cfg
        .to_json_pretty()
        .context("Failed to serialize the default configuration")?;
    std::fs::write(output, text)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    println!("Configuration written to {}", output.display());
    println!("Edit it and start a run with: heritage run --config {}", output.display());
    Ok(())
}
