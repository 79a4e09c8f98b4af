//! Compare IonTracks simulations with experimental recombination data.
//!
//! Usage:
//!   run_comparison <config.json>
//!   run_comparison --create-template=<path>
//!
//! The first form loads the configuration, runs the requested comparison
//! phases against the built-in analytic reference model, and writes the
//! output tables. The second form writes a template configuration with
//! documented defaults and touches no dataset.
//!
//! Exits non-zero on configuration-load failure, data-validation failure,
//! or an unrecovered fatal run error. Phases that completed before a later
//! phase's fatal error are still saved.

use iontracks_validation::comparison::ComparisonRunner;
use iontracks_validation::config::{self, ComparisonConfig};
use iontracks_validation::error::ValidationError;
use iontracks_validation::simulation::AnalyticReference;
use std::path::Path;
use std::process;

fn print_usage() {
    eprintln!("Usage: run_comparison <config.json>");
    eprintln!("       run_comparison --create-template=<path>");
    eprintln!();
    eprintln!("Compare IonTracks simulations with experimental data.");
}

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();

    if let Some(path) = args
        .iter()
        .find_map(|a| a.strip_prefix("--create-template="))
    {
        match config::save_config_template(Path::new(path)) {
            Ok(()) => println!("✓ Created template configuration at: {path}"),
            Err(e) => {
                eprintln!("{e}");
                process::exit(1);
            }
        }
        return;
    }

    let Some(config_path) = args.iter().find(|a| !a.starts_with("--")) else {
        print_usage();
        eprintln!("\nError: Configuration file is required (or use --create-template)");
        process::exit(1);
    };

    let config = match config::load_config(Path::new(config_path)) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{e}");
            process::exit(1);
        }
    };

    println!("{}", "=".repeat(70));
    println!("IONTRACKS EXPERIMENTAL DATA COMPARISON");
    println!("{}", "=".repeat(70));
    println!(
        "Experimental data: {}",
        config.experimental_data_path.display()
    );
    println!("Output directory: {}", config.output_dir.display());
    println!("Backend: {}", config.simulation.backend);
    println!("Voltage: {} V", config.simulation.voltage_v);
    println!("Electrode gap: {} cm", config.simulation.electrode_gap_cm);
    println!("Particle: {}", config.simulation.particle);

    if let Err(e) = run(config) {
        eprintln!("\nError during comparison: {e}");
        process::exit(1);
    }

    println!("\n{}", "=".repeat(70));
    println!("COMPARISON COMPLETED SUCCESSFULLY");
    println!("{}", "=".repeat(70));
}

fn run(config: ComparisonConfig) -> Result<(), ValidationError> {
    let mut runner = ComparisonRunner::from_config(config, AnalyticReference)?;
    let outcome = runner.run_all();
    // Completed phases are persisted even when a later phase failed.
    runner.save_results()?;
    outcome
}
