//! Fleet Dispatch - Command Line Interface
//!
//! Generate routing instances, optimize them with the genetic algorithm,
//! and inspect the results.

use clap::{Parser, Subcommand};
use fleet_dispatch::ga::{GaConfig, GeneticAlgorithm};
use fleet_dispatch::instance::Instance;
use fleet_dispatch::telemetry::{GenerationEvent, GenerationObserver};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "fleet-dispatch")]
#[command(version = "1.0")]
#[command(about = "Genetic-algorithm optimizer for multi-vehicle delivery routing")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a random instance and write it as JSON
    Generate {
        /// Number of delivery stops
        #[arg(short = 'n', long, default_value = "50")]
        stops: usize,

        /// Number of vehicles
        #[arg(short = 'k', long, default_value = "3")]
        vehicles: usize,

        /// Random seed
        #[arg(short, long, default_value = "42")]
        seed: u64,

        /// Instance name
        #[arg(long, default_value = "random")]
        name: String,

        /// Output JSON file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Optimize routes for an instance
    Solve {
        /// Path to the instance JSON file
        #[arg(short, long)]
        instance: PathBuf,

        /// Population size
        #[arg(short, long, default_value = "200")]
        population_size: usize,

        /// Maximum number of generations
        #[arg(short = 'g', long, default_value = "200")]
        max_generations: usize,

        /// Crossover probability
        #[arg(long, default_value = "0.7")]
        crossover_prob: f64,

        /// Mutation probability
        #[arg(long, default_value = "0.2")]
        mutation_prob: f64,

        /// Stagnant generations before early stop
        #[arg(long, default_value = "20")]
        stagnation_limit: usize,

        /// Random seed
        #[arg(short, long, default_value = "42")]
        seed: u64,

        /// Write the best solution as JSON
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Write the per-generation trace as CSV
        #[arg(long)]
        trace: Option<PathBuf>,

        /// Print the full route breakdown
        #[arg(short, long)]
        verbose: bool,
    },

    /// Print statistics about an instance
    Analyze {
        /// Path to the instance JSON file
        #[arg(short, long)]
        instance: PathBuf,
    },
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Generate {
            stops,
            vehicles,
            seed,
            name,
            output,
        } => generate_instance(stops, vehicles, seed, &name, &output),

        Commands::Solve {
            instance,
            population_size,
            max_generations,
            crossover_prob,
            mutation_prob,
            stagnation_limit,
            seed,
            output,
            trace,
            verbose,
        } => {
            let config = GaConfig {
                population_size,
                max_generations,
                crossover_prob,
                mutation_prob,
                stagnation_limit,
                seed,
            };
            solve_instance(&instance, config, output, trace, verbose);
        }

        Commands::Analyze { instance } => analyze_instance(&instance),
    }
}

fn load_instance(path: &PathBuf) -> Instance {
    match Instance::from_file(path) {
        Ok(instance) => instance,
        Err(e) => {
            eprintln!("Error loading instance: {}", e);
            std::process::exit(1);
        }
    }
}

fn generate_instance(stops: usize, vehicles: usize, seed: u64, name: &str, output: &PathBuf) {
    let instance = match Instance::generate_random(name, stops, vehicles, seed) {
        Ok(instance) => instance,
        Err(e) => {
            eprintln!("Error generating instance: {}", e);
            std::process::exit(1);
        }
    };

    let json = serde_json::to_string_pretty(&instance).expect("instance serializes");
    if let Err(e) = std::fs::write(output, json) {
        eprintln!("Error writing instance: {}", e);
        std::process::exit(1);
    }
    println!(
        "Generated '{}' with {} stops and {} vehicles -> {:?}",
        name, stops, vehicles, output
    );
}

/// Drives a progress bar from the per-generation events.
struct ProgressObserver {
    bar: ProgressBar,
}

impl GenerationObserver for ProgressObserver {
    fn on_generation(&mut self, event: &GenerationEvent<'_>) {
        self.bar.set_position(event.generation as u64);
        self.bar.set_message(format!(
            "best {:.2}",
            event.best_fitness.total_distance
        ));
    }
}

fn solve_instance(
    path: &PathBuf,
    config: GaConfig,
    output: Option<PathBuf>,
    trace: Option<PathBuf>,
    verbose: bool,
) {
    let instance = load_instance(path);
    println!(
        "Solving '{}' ({} stops, {} vehicles)...",
        instance.name,
        instance.num_stops(),
        instance.vehicle_count
    );

    let max_generations = config.max_generations;
    let mut ga = match GeneticAlgorithm::new(instance, config) {
        Ok(ga) => ga,
        Err(e) => {
            eprintln!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    let bar = ProgressBar::new(max_generations as u64);
    bar.set_style(
        ProgressStyle::with_template("{bar:40} {pos}/{len} {msg}").expect("static template"),
    );
    ga.add_observer(Box::new(ProgressObserver { bar: bar.clone() }));

    let result = ga.run();
    bar.finish_and_clear();

    println!("\n========== Results ==========");
    println!("Termination: {:?}", result.termination);
    println!("Generations: {}", result.generations);
    println!("Total distance: {:.2}", result.best.total_distance);
    println!("Route balance (std dev): {:.2}", result.best.imbalance);
    println!(
        "Vehicle distances: {:?}",
        result
            .best
            .route_distances
            .iter()
            .map(|d| format!("{:.2}", d))
            .collect::<Vec<_>>()
    );
    println!("Time: {:.4}s", result.best.computation_time);

    if verbose {
        println!();
        print!("{}", result.best);
    }

    if let Some(out_path) = output {
        let json = serde_json::to_string_pretty(&result.best).expect("solution serializes");
        if let Err(e) = std::fs::write(&out_path, json) {
            eprintln!("Error writing solution: {}", e);
            std::process::exit(1);
        }
        println!("\nSolution saved to {:?}", out_path);
    }

    if let Some(trace_path) = trace {
        if let Err(e) = export_trace(&result.trace, &trace_path) {
            eprintln!("Error writing trace: {}", e);
            std::process::exit(1);
        }
        println!("Trace saved to {:?}", trace_path);
    }
}

fn export_trace(
    trace: &[fleet_dispatch::telemetry::TracePoint],
    path: &PathBuf,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut writer = csv::Writer::from_path(path)?;
    for point in trace {
        writer.serialize(point)?;
    }
    writer.flush()?;
    Ok(())
}

fn analyze_instance(path: &PathBuf) {
    let instance = load_instance(path);
    println!("========== Instance Analysis ==========\n");
    println!("{}", instance.statistics());
}
