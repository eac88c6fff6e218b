use anyhow::{Context, Result};
use heritage_sim::simulation::{Configuration, Simulation};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};

use crate::printing::print_parameters;

/// Load the configuration, apply command-line overrides, and run the
/// simulation to completion.
pub fn run_simulation(
    config: Option<&Path>,
    seed_override: Option<u64>,
    generations_override: Option<u32>,
    output_override: Option<PathBuf>,
    show_progress: bool,
) -> Result<()> {
    println!("Heritage - Running Simulation");
    println!("=============================\n");

    let mut cfg = match config {
        Some(path) => Configuration::from_json_file(path)
            .with_context(|| format!("Failed to load {}", path.display()))?,
        None => Configuration::default(),
    };
    if let Some(seed) = seed_override {
        cfg.execution.seed = Some(seed);
    }
    if let Some(generations) = generations_override {
        cfg.execution.num_generations = generations;
    }
    if let Some(output) = output_override {
        cfg.output.directory = Some(output);
    }

    print_parameters(&cfg);

    let total_generations = cfg.execution.num_generations;
    let mut sim = Simulation::new(cfg).context("Failed to start the simulation")?;

    let pb = if show_progress {
        let pb = ProgressBar::new(total_generations as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template(
                    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {per_sec}",
                )
                .unwrap()
                .progress_chars("#>-"),
        );
        Some(pb)
    } else {
        None
    };

    while !sim.is_finished() {
        let generation = sim.generation() + 1;
        sim.step()
            .with_context(|| format!("Generation {generation}"))?;
        if let Some(pb) = &pb {
            pb.inc(1);
        }
    }
    if let Some(pb) = pb {
        pb.finish_with_message("Done");
    }

    println!("\nRun Summary");
    println!("  Generations simulated: {}", sim.generation());
    for tribe in sim.tribes() {
        let stats = tribe.cached_fitness_stats();
        let status = if tribe.is_done() { " (stopped)" } else { "" };
        println!(
            "  Tribe {}: pop size {}, mean fitness {:.6}, total mutations {}{}",
            tribe.tribe_num(),
            stats.pop_size,
            stats.mean_fitness,
            stats.total_mutations,
            status
        );
    }
    if let Some(dir) = &sim.configuration().output.directory {
        println!("  Output written to {}", dir.display());
    }
    println!("\nSimulation complete!");
    Ok(())
}
