//! Problem instances for the multi-vehicle dispatch optimizer.
//!
//! An instance is immutable once constructed: a depot, an ordered list of
//! delivery stops, and the number of vehicles available. Instances can be
//! loaded from JSON files or generated randomly (seeded) for experiments.

use crate::error::ConfigError;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// A location in the plane. Value type with no identity beyond its coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Point { x, y }
    }

    /// Euclidean distance to another point.
    #[inline]
    pub fn distance_to(&self, other: &Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// A routing problem: one depot, N delivery stops, K vehicles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Instance {
    /// Name of the instance
    pub name: String,
    /// Shared departure and return point for every vehicle
    pub depot: Point,
    /// Ordered list of stop coordinates; stop indices refer into this list
    pub stops: Vec<Point>,
    /// Number of vehicles the stops are partitioned across
    pub vehicle_count: usize,
}

impl Instance {
    /// Build an instance, rejecting degenerate inputs up front.
    ///
    /// More vehicles than stops is allowed; the surplus vehicles end up with
    /// empty depot-only routes.
    pub fn new(
        name: impl Into<String>,
        depot: Point,
        stops: Vec<Point>,
        vehicle_count: usize,
    ) -> Result<Self, ConfigError> {
        if stops.is_empty() {
            return Err(ConfigError::NoStops);
        }
        if vehicle_count == 0 {
            return Err(ConfigError::NoVehicles);
        }
        Ok(Instance {
            name: name.into(),
            depot,
            stops,
            vehicle_count,
        })
    }

    /// Load an instance from a JSON file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let file = File::open(&path).map_err(|e| format!("Cannot open file: {}", e))?;
        let reader = BufReader::new(file);
        let instance: Instance =
            serde_json::from_reader(reader).map_err(|e| format!("Invalid instance JSON: {}", e))?;
        // A handcrafted file can carry degenerate values, so re-validate.
        Instance::new(
            instance.name,
            instance.depot,
            instance.stops,
            instance.vehicle_count,
        )
        .map_err(|e| e.to_string())
    }

    /// Generate a random instance: integer stop coordinates uniform in
    /// [0, 100] with the depot at (50, 50). Deterministic via seed.
    pub fn generate_random(
        name: impl Into<String>,
        num_stops: usize,
        vehicle_count: usize,
        seed: u64,
    ) -> Result<Self, ConfigError> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let stops = (0..num_stops)
            .map(|_| {
                let x = rng.gen_range(0..=100) as f64;
                let y = rng.gen_range(0..=100) as f64;
                Point::new(x, y)
            })
            .collect();
        Instance::new(name, Point::new(50.0, 50.0), stops, vehicle_count)
    }

    /// Get the number of stops
    pub fn num_stops(&self) -> usize {
        self.stops.len()
    }

    /// Length of one vehicle's route given its interior stop indices:
    /// depot to first stop, consecutive hops, last stop back to depot.
    /// An empty route stays at the depot and has length zero.
    pub fn route_length(&self, route: &[usize]) -> f64 {
        let first = match route.first() {
            Some(&stop) => stop,
            None => return 0.0,
        };

        let mut length = self.depot.distance_to(&self.stops[first]);
        for pair in route.windows(2) {
            length += self.stops[pair[0]].distance_to(&self.stops[pair[1]]);
        }
        let last = route[route.len() - 1];
        length + self.stops[last].distance_to(&self.depot)
    }

    /// Get statistics about the instance
    pub fn statistics(&self) -> InstanceStatistics {
        let n = self.stops.len();

        let mut pairwise: Vec<f64> = Vec::new();
        for i in 0..n {
            for j in i + 1..n {
                pairwise.push(self.stops[i].distance_to(&self.stops[j]));
            }
        }
        let avg_stop_distance = if pairwise.is_empty() {
            0.0
        } else {
            pairwise.iter().sum::<f64>() / pairwise.len() as f64
        };
        let max_stop_distance = pairwise.iter().cloned().fold(0.0, f64::max);

        let avg_depot_distance = self
            .stops
            .iter()
            .map(|s| self.depot.distance_to(s))
            .sum::<f64>()
            / n as f64;

        InstanceStatistics {
            name: self.name.clone(),
            num_stops: n,
            vehicle_count: self.vehicle_count,
            avg_stop_distance,
            max_stop_distance,
            avg_depot_distance,
        }
    }
}

/// Statistics about an instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstanceStatistics {
    pub name: String,
    pub num_stops: usize,
    pub vehicle_count: usize,
    pub avg_stop_distance: f64,
    pub max_stop_distance: f64,
    pub avg_depot_distance: f64,
}

impl std::fmt::Display for InstanceStatistics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Instance: {}", self.name)?;
        writeln!(f, "  Stops: {}", self.num_stops)?;
        writeln!(f, "  Vehicles: {}", self.vehicle_count)?;
        writeln!(f, "  Avg stop-to-stop distance: {:.2}", self.avg_stop_distance)?;
        writeln!(f, "  Max stop-to-stop distance: {:.2}", self.max_stop_distance)?;
        writeln!(f, "  Avg depot distance: {:.2}", self.avg_depot_distance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_calculation() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(3.0, 4.0);
        assert!((a.distance_to(&b) - 5.0).abs() < 1e-10);
        assert!((b.distance_to(&a) - 5.0).abs() < 1e-10);
    }

    #[test]
    fn test_rejects_degenerate_inputs() {
        let err = Instance::new("empty", Point::new(0.0, 0.0), vec![], 2);
        assert_eq!(err.unwrap_err(), ConfigError::NoStops);

        let err = Instance::new("no-fleet", Point::new(0.0, 0.0), vec![Point::new(1.0, 1.0)], 0);
        assert_eq!(err.unwrap_err(), ConfigError::NoVehicles);
    }

    #[test]
    fn test_generation_is_seeded() {
        let a = Instance::generate_random("a", 30, 3, 7).unwrap();
        let b = Instance::generate_random("b", 30, 3, 7).unwrap();
        assert_eq!(a.stops, b.stops);

        let c = Instance::generate_random("c", 30, 3, 8).unwrap();
        assert_ne!(a.stops, c.stops);

        assert_eq!(a.depot, Point::new(50.0, 50.0));
        for stop in &a.stops {
            assert!((0.0..=100.0).contains(&stop.x));
            assert!((0.0..=100.0).contains(&stop.y));
            assert_eq!(stop.x, stop.x.trunc());
            assert_eq!(stop.y, stop.y.trunc());
        }
    }

    #[test]
    fn test_route_length() {
        let instance = Instance::new(
            "test",
            Point::new(0.0, 0.0),
            vec![Point::new(3.0, 4.0), Point::new(3.0, 0.0)],
            1,
        )
        .unwrap();

        assert_eq!(instance.route_length(&[]), 0.0);
        // depot -> (3,4) -> depot
        assert!((instance.route_length(&[0]) - 10.0).abs() < 1e-10);
        // depot -> (3,4) -> (3,0) -> depot
        assert!((instance.route_length(&[0, 1]) - 12.0).abs() < 1e-10);
    }

    #[test]
    fn test_statistics() {
        let instance = Instance::new(
            "stats",
            Point::new(0.0, 0.0),
            vec![Point::new(3.0, 4.0), Point::new(0.0, 5.0)],
            2,
        )
        .unwrap();
        let stats = instance.statistics();
        assert_eq!(stats.num_stops, 2);
        assert_eq!(stats.vehicle_count, 2);
        assert!((stats.avg_depot_distance - 5.0).abs() < 1e-10);
        assert!((stats.max_stop_distance - stats.avg_stop_distance).abs() < 1e-10);
    }
}
