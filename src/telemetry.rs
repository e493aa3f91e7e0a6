//! Per-run telemetry: the generation trace, the observer hook, and the
//! final run result.
//!
//! The optimizer emits one event per completed generation. Observers are
//! passive: they receive a read-only snapshot and cannot feed anything back
//! into the search, so a slow or misbehaving observer can delay a run but
//! never corrupt it.

use crate::solution::{Fitness, Individual, Solution};
use serde::{Deserialize, Serialize};

/// One record per completed generation. Appended once, never rewritten.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TracePoint {
    /// 1-based index of the completed generation
    pub generation: usize,
    /// Total distance of the best-ever individual after this generation
    pub best_distance: f64,
    /// Mean total distance across the generation's population
    pub avg_distance: f64,
}

/// Snapshot handed to observers once per completed generation.
#[derive(Debug, Clone)]
pub struct GenerationEvent<'a> {
    pub generation: usize,
    /// Best-ever individual after this generation
    pub best: &'a Individual,
    pub best_fitness: Fitness,
    pub avg_distance: f64,
}

/// Receives one event per completed generation.
///
/// Zero, one, or many observers may be registered; the optimizer makes no
/// assumption about what they do with the event.
pub trait GenerationObserver {
    fn on_generation(&mut self, event: &GenerationEvent<'_>);
}

/// Why the generation loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Termination {
    /// Best total distance stagnated for the configured number of generations
    Converged,
    /// The hard generation budget ran out first
    GenerationLimit,
    /// The caller requested an early stop between generations
    Cancelled,
}

/// Final outcome of a run: the elitist best, the full generation trace, and
/// how the loop ended. Returned for every started run, cancelled ones
/// included.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResult {
    pub best: Solution,
    pub trace: Vec<TracePoint>,
    pub termination: Termination,
    /// Number of generations actually executed (equals `trace.len()`)
    pub generations: usize,
}
