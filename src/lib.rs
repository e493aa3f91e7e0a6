//! Fleet Dispatch
//!
//! A genetic-algorithm optimizer for assigning and sequencing delivery stops
//! across a fleet of vehicles departing from a shared depot. Candidate
//! solutions are permutations of stop indices, scored on two objectives:
//! total travel distance and workload balance across vehicles.
//!
//! # Features
//!
//! - Permutation encoding with a modulo-K route partition (every decode is
//!   a valid assignment, no repair step needed)
//! - Two-objective fitness with a lexicographic comparison contract
//! - Tournament selection, segment crossover, shuffle mutation, elitism
//! - Adaptive stagnation-based termination with a hard generation budget
//! - Seeded, fully reproducible runs; parallel fitness evaluation
//! - Per-generation trace and observer hook for live displays
//!
//! # Example
//!
//! ```
//! use fleet_dispatch::ga::{GaConfig, GeneticAlgorithm};
//! use fleet_dispatch::instance::Instance;
//!
//! let instance = Instance::generate_random("demo", 20, 3, 7).unwrap();
//! let config = GaConfig {
//!     population_size: 50,
//!     max_generations: 50,
//!     seed: 7,
//!     ..Default::default()
//! };
//!
//! let mut ga = GeneticAlgorithm::new(instance, config).unwrap();
//! let result = ga.run();
//!
//! println!("best distance: {:.2}", result.best.total_distance);
//! ```

pub mod error;
pub mod ga;
pub mod instance;
pub mod solution;
pub mod telemetry;

pub use error::ConfigError;
pub use ga::{GaConfig, GeneticAlgorithm};
pub use instance::{Instance, Point};
pub use solution::{Fitness, Individual, Solution};
pub use telemetry::{GenerationObserver, RunResult, Termination, TracePoint};
