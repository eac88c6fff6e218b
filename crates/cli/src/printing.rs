use heritage_sim::simulation::Configuration;

/// Print the effective run parameters.
pub fn print_parameters(cfg: &Configuration) {
    println!("Simulation Configuration");
    println!("  - Population Size: {}", cfg.execution.pop_size);
    println!("  - Generations: {}", cfg.execution.num_generations);
    println!("  - Tribes: {}", cfg.execution.num_tribes);
    println!("  - Population Parts: {}", cfg.execution.parts_per_pop);
    match cfg.execution.seed {
        Some(seed) => println!("  - Random Seed: {seed}"),
        None => println!("  - Random Seed: from OS entropy"),
    }

    println!("\nGenome Structure");
    println!(
        "  - Linkage Subunits: {} over {} chromosomes ({} per chromosome)",
        cfg.genome.num_linkage_subunits,
        cfg.genome.haploid_chromosome_number,
        cfg.genome.lbs_per_chromosome()
    );
    println!("  - Crossover Model: {:?}", cfg.genome.crossover_model);
    println!("  - Mean Crossovers: {}", cfg.genome.mean_num_crossovers);

    println!("\nMutation Parameters");
    println!("  - Mutation Rate: {}", cfg.mutation.mutn_rate);
    println!("  - Favorable Fraction: {}", cfg.mutation.frac_fav_mutn);
    println!("  - Neutral Fraction: {}", cfg.mutation.fraction_neutral);
    println!("  - Recessive Fraction: {}", cfg.mutation.fraction_recessive);
    println!("  - Tracking Threshold: {}", cfg.mutation.tracking_threshold);

    println!("\nSelection");
    println!("  - Scheme: {:?}", cfg.selection.selection_scheme);
    println!("  - Heritability: {}", cfg.selection.heritability);
    println!("  - Non-scaling Noise: {}", cfg.selection.non_scaling_noise);

    println!("\nPopulation Growth");
    println!("  - Model: {:?}", cfg.growth.pop_growth_model);
    if cfg.alleles.num_contrasting_alleles > 0 {
        println!("\nInitial Alleles");
        println!(
            "  - Contrasting Pairs: {} ({:?})",
            cfg.alleles.num_contrasting_alleles, cfg.alleles.initial_allele_fitness_model
        );
    }
    match &cfg.output.directory {
        Some(dir) => println!("\nOutput Directory: {}", dir.display()),
        None => println!("\nOutput Directory: none (no files will be written)"),
    }
    println!();
}
