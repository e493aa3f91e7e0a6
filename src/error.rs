//! Configuration errors raised before a run starts.

use std::fmt;

/// Invalid instance or run parameters.
///
/// Every variant is detected during construction, before any generation
/// executes. A run that starts always finishes and returns a result.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// The instance has no stops to visit.
    NoStops,
    /// The instance has no vehicles to assign stops to.
    NoVehicles,
    /// Fewer than two individuals leaves nothing to select between.
    PopulationTooSmall(usize),
    /// A run needs at least one generation.
    NoGenerations,
    /// A probability parameter fell outside [0, 1].
    ProbabilityOutOfRange { name: &'static str, value: f64 },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::NoStops => write!(f, "instance has no stops"),
            ConfigError::NoVehicles => write!(f, "instance has no vehicles"),
            ConfigError::PopulationTooSmall(n) => {
                write!(f, "population size must be at least 2, got {}", n)
            }
            ConfigError::NoGenerations => write!(f, "max generations must be at least 1"),
            ConfigError::ProbabilityOutOfRange { name, value } => {
                write!(f, "{} must be in [0, 1], got {}", name, value)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        assert_eq!(ConfigError::NoStops.to_string(), "instance has no stops");
        assert_eq!(
            ConfigError::PopulationTooSmall(1).to_string(),
            "population size must be at least 2, got 1"
        );
        let err = ConfigError::ProbabilityOutOfRange {
            name: "crossover probability",
            value: 1.5,
        };
        assert_eq!(err.to_string(), "crossover probability must be in [0, 1], got 1.5");
    }
}
