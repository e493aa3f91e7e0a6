//! Candidate solutions: permutation encoding, route decoding, and the
//! two-objective fitness used to rank them.
//!
//! An individual is a permutation of stop indices describing the full
//! visiting order. Vehicle `i` serves the stops at permutation positions
//! `j ≡ i (mod K)`, so any permutation decodes to a complete partition of
//! the stops across the fleet.

use crate::instance::Instance;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

/// Two-objective score, both components lower-is-better.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Fitness {
    /// Summed Euclidean length of all vehicle routes
    pub total_distance: f64,
    /// Population standard deviation of the per-route lengths
    pub imbalance: f64,
}

impl Fitness {
    /// Total-order sort key: total distance first, imbalance second.
    pub fn key(&self) -> (OrderedFloat<f64>, OrderedFloat<f64>) {
        (
            OrderedFloat(self.total_distance),
            OrderedFloat(self.imbalance),
        )
    }

    /// Lexicographic comparison. Strictly lower total distance wins
    /// regardless of imbalance; ties on distance go to lower imbalance.
    /// This is the single "better" rule used by selection, elitism, and
    /// the stagnation check.
    pub fn better_than(&self, other: &Fitness) -> bool {
        self.key() < other.key()
    }
}

/// Split a visiting order into per-vehicle stop sequences (interior stops
/// only; every route is implicitly depot-bracketed). Deterministic, O(N).
/// Vehicles beyond the permutation length get empty routes.
pub fn decode(order: &[usize], vehicle_count: usize) -> Vec<Vec<usize>> {
    let mut routes = vec![Vec::new(); vehicle_count];
    for (j, &stop) in order.iter().enumerate() {
        routes[j % vehicle_count].push(stop);
    }
    routes
}

/// Score a visiting order: decode, measure each route, sum the lengths and
/// take the population standard deviation (divide by K) of the K lengths.
/// Idle vehicles contribute zero-length routes that still count toward the
/// imbalance, so hiding a vehicle is never free.
pub fn evaluate(order: &[usize], instance: &Instance) -> Fitness {
    let routes = decode(order, instance.vehicle_count);
    let lengths: Vec<f64> = routes.iter().map(|r| instance.route_length(r)).collect();
    let total_distance = lengths.iter().sum();

    Fitness {
        total_distance,
        imbalance: population_std_dev(&lengths),
    }
}

fn population_std_dev(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    variance.sqrt()
}

/// True when `genes` contains each of `0..n` exactly once.
pub fn is_permutation(genes: &[usize], n: usize) -> bool {
    if genes.len() != n {
        return false;
    }
    let mut seen = vec![false; n];
    for &g in genes {
        if g >= n || seen[g] {
            return false;
        }
        seen[g] = true;
    }
    true
}

/// Individual in the genetic algorithm population
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Individual {
    /// The visiting order as a permutation of stop indices
    pub genes: Vec<usize>,
    /// Score of this visiting order
    pub fitness: Fitness,
}

impl Individual {
    /// Build an individual, scoring it immediately. Fitness is never patched
    /// in place; any change to the genes goes through a fresh `new`.
    pub fn new(genes: Vec<usize>, instance: &Instance) -> Self {
        let fitness = evaluate(&genes, instance);
        Individual { genes, fitness }
    }
}

/// Final output of a run: the best visiting order found, its per-vehicle
/// routes, and the route-distance breakdown.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Solution {
    /// Best visiting order found (permutation of stop indices)
    pub visiting_order: Vec<usize>,
    /// Interior stop indices per vehicle, decoded from the visiting order
    pub routes: Vec<Vec<usize>>,
    /// Depot-to-depot length of each vehicle's route
    pub route_distances: Vec<f64>,
    /// Sum of route distances
    pub total_distance: f64,
    /// Population standard deviation of the route distances
    pub imbalance: f64,
    /// Number of generations executed
    pub generations: usize,
    /// Computation time in seconds
    pub computation_time: f64,
}

impl Solution {
    pub fn from_individual(
        individual: &Individual,
        instance: &Instance,
        generations: usize,
        computation_time: f64,
    ) -> Self {
        let routes = decode(&individual.genes, instance.vehicle_count);
        let route_distances: Vec<f64> = routes.iter().map(|r| instance.route_length(r)).collect();

        Solution {
            visiting_order: individual.genes.clone(),
            routes,
            route_distances,
            total_distance: individual.fitness.total_distance,
            imbalance: individual.fitness.imbalance,
            generations,
            computation_time,
        }
    }
}

impl std::fmt::Display for Solution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Solution")?;
        writeln!(f, "  Total distance: {:.2}", self.total_distance)?;
        writeln!(f, "  Imbalance (std dev): {:.2}", self.imbalance)?;
        writeln!(f, "  Generations: {}", self.generations)?;
        writeln!(f, "  Time: {:.4}s", self.computation_time)?;
        for (i, (route, dist)) in self.routes.iter().zip(&self.route_distances).enumerate() {
            writeln!(f, "  Vehicle {}: {:?} ({:.2})", i + 1, route, dist)?;
        }
        Ok(())
    }
}
