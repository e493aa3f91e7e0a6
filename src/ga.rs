//! Genetic search engine: configuration, operators, and the generation loop.
//!
//! The search is elitist and two-objective: individuals are ranked by the
//! lexicographic `(total_distance, imbalance)` rule, the single best-ever
//! individual is never lost, and the loop stops on a hard generation budget
//! or once the best total distance stagnates. Identical seed and
//! configuration reproduce the exact same populations, trace, and result.

use crate::error::ConfigError;
use crate::instance::Instance;
use crate::solution::{Individual, Solution};
use crate::telemetry::{GenerationEvent, GenerationObserver, RunResult, Termination, TracePoint};
use log::{debug, info};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Individuals sampled per tournament.
const TOURNAMENT_SIZE: usize = 3;
/// Per-position swap probability inside shuffle mutation.
const GENE_SWAP_PROB: f64 = 0.05;
/// Relative improvement below this counts as a stagnant generation.
const STAGNATION_THRESHOLD: f64 = 0.001;

/// Genetic Algorithm configuration. Validated before any generation runs.
#[derive(Debug, Clone)]
pub struct GaConfig {
    /// Population size (at least 2)
    pub population_size: usize,
    /// Hard upper bound on generations
    pub max_generations: usize,
    /// Probability of crossing a selected parent pair
    pub crossover_prob: f64,
    /// Probability of mutating an offspring at all
    pub mutation_prob: f64,
    /// Consecutive stagnant generations before the run converges
    pub stagnation_limit: usize,
    /// Random seed; identical seed and config reproduce a run exactly
    pub seed: u64,
}

impl Default for GaConfig {
    fn default() -> Self {
        GaConfig {
            population_size: 200,
            max_generations: 200,
            crossover_prob: 0.7,
            mutation_prob: 0.2,
            stagnation_limit: 20,
            seed: 42,
        }
    }
}

impl GaConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.population_size < 2 {
            return Err(ConfigError::PopulationTooSmall(self.population_size));
        }
        if self.max_generations == 0 {
            return Err(ConfigError::NoGenerations);
        }
        if !(0.0..=1.0).contains(&self.crossover_prob) {
            return Err(ConfigError::ProbabilityOutOfRange {
                name: "crossover probability",
                value: self.crossover_prob,
            });
        }
        if !(0.0..=1.0).contains(&self.mutation_prob) {
            return Err(ConfigError::ProbabilityOutOfRange {
                name: "mutation probability",
                value: self.mutation_prob,
            });
        }
        Ok(())
    }
}

/// Genetic Algorithm implementation
pub struct GeneticAlgorithm {
    config: GaConfig,
    instance: Instance,
    population: Vec<Individual>,
    best: Option<Individual>,
    rng: ChaCha8Rng,
    generation: usize,
    stagnation: usize,
    previous_best: Option<f64>,
    trace: Vec<TracePoint>,
    observers: Vec<Box<dyn GenerationObserver>>,
    cancel: Arc<AtomicBool>,
}

impl GeneticAlgorithm {
    /// Build a runner, failing fast on an invalid instance or configuration.
    pub fn new(instance: Instance, config: GaConfig) -> Result<Self, ConfigError> {
        if instance.stops.is_empty() {
            return Err(ConfigError::NoStops);
        }
        if instance.vehicle_count == 0 {
            return Err(ConfigError::NoVehicles);
        }
        config.validate()?;

        let rng = ChaCha8Rng::seed_from_u64(config.seed);

        Ok(GeneticAlgorithm {
            config,
            instance,
            population: Vec::new(),
            best: None,
            rng,
            generation: 0,
            stagnation: 0,
            previous_best: None,
            trace: Vec::new(),
            observers: Vec::new(),
            cancel: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Register an observer; it receives one event per completed generation.
    pub fn add_observer(&mut self, observer: Box<dyn GenerationObserver>) {
        self.observers.push(observer);
    }

    /// Handle for requesting an early stop. Checked at the top of each
    /// generation; a cancelled run still returns the best found so far.
    pub fn cancel_token(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    /// Get current generation
    pub fn current_generation(&self) -> usize {
        self.generation
    }

    /// Best-ever individual, if the population has been initialized.
    pub fn best_individual(&self) -> Option<&Individual> {
        self.best.as_ref()
    }

    /// Build and score a uniformly random starting population.
    fn initialize_population(&mut self) {
        let n = self.instance.num_stops();

        let mut pool = Vec::with_capacity(self.config.population_size);
        for _ in 0..self.config.population_size {
            let mut genes: Vec<usize> = (0..n).collect();
            genes.shuffle(&mut self.rng);
            pool.push(genes);
        }

        self.population = Self::evaluate_all(pool, &self.instance);
        self.generation = 0;
        self.stagnation = 0;
        self.previous_best = None;
        self.trace.clear();
        self.best = self
            .population
            .iter()
            .min_by_key(|ind| ind.fitness.key())
            .cloned();
    }

    /// Score a pool of visiting orders. Evaluation is pure per individual,
    /// so the parallel map is fanned out across workers; input order is
    /// preserved and no RNG is touched, keeping runs deterministic.
    fn evaluate_all(pool: Vec<Vec<usize>>, instance: &Instance) -> Vec<Individual> {
        pool.into_par_iter()
            .map(|genes| Individual::new(genes, instance))
            .collect()
    }

    /// Tournament selection: best of three drawn with replacement.
    fn tournament_select(&mut self) -> Vec<usize> {
        let mut best_idx = self.rng.gen_range(0..self.population.len());

        for _ in 1..TOURNAMENT_SIZE {
            let idx = self.rng.gen_range(0..self.population.len());
            if self.population[idx]
                .fitness
                .better_than(&self.population[best_idx].fitness)
            {
                best_idx = idx;
            }
        }

        self.population[best_idx].genes.clone()
    }

    /// Segment crossover: the child keeps `a`'s slice between two random cut
    /// points in place, and the remaining positions are filled with the
    /// missing values in `b`'s visiting order. Always yields a permutation.
    fn crossover(&mut self, a: &[usize], b: &[usize]) -> Vec<usize> {
        let n = a.len();
        if n < 2 {
            return a.to_vec();
        }

        let cut1 = self.rng.gen_range(0..n);
        let cut2 = self.rng.gen_range(0..n);
        let (start, end) = if cut1 <= cut2 { (cut1, cut2) } else { (cut2, cut1) };

        let mut child = vec![usize::MAX; n];
        child[start..=end].copy_from_slice(&a[start..=end]);

        let mut placed = vec![false; n];
        for &v in &a[start..=end] {
            placed[v] = true;
        }

        let mut fill = b.iter().copied().filter(|&v| !placed[v]);
        for slot in child.iter_mut() {
            if *slot == usize::MAX {
                if let Some(v) = fill.next() {
                    *slot = v;
                }
            }
        }

        child
    }

    /// Shuffle mutation: each position independently swaps with a partner
    /// drawn from the other n-1 positions. Swaps preserve the permutation.
    fn mutate(&mut self, genes: &mut [usize]) {
        let n = genes.len();
        if n < 2 {
            return;
        }

        for i in 0..n {
            if self.rng.gen::<f64>() < GENE_SWAP_PROB {
                let mut j = self.rng.gen_range(0..n - 1);
                if j >= i {
                    j += 1;
                }
                genes.swap(i, j);
            }
        }
    }

    /// One generation: select, cross, mutate, evaluate, replace, record.
    fn evolve(&mut self) {
        // parent pool, one tournament per population slot
        let mut offspring: Vec<Vec<usize>> = (0..self.config.population_size)
            .map(|_| self.tournament_select())
            .collect();

        // crossover on consecutive pairs; an odd trailing parent passes
        // through untouched
        for i in (1..offspring.len()).step_by(2) {
            if self.rng.gen::<f64>() < self.config.crossover_prob {
                let a = std::mem::take(&mut offspring[i - 1]);
                let b = std::mem::take(&mut offspring[i]);
                offspring[i - 1] = self.crossover(&a, &b);
                offspring[i] = self.crossover(&b, &a);
            }
        }

        for genes in offspring.iter_mut() {
            if self.rng.gen::<f64>() < self.config.mutation_prob {
                self.mutate(genes);
            }
        }

        let mut next = Self::evaluate_all(offspring, &self.instance);

        // elitism: replay the best-ever individual if variation lost it
        if let Some(best) = &self.best {
            if next.iter().all(|ind| best.fitness.better_than(&ind.fitness)) {
                if let Some(worst) = next
                    .iter()
                    .enumerate()
                    .max_by_key(|(_, ind)| ind.fitness.key())
                    .map(|(i, _)| i)
                {
                    next[worst] = best.clone();
                }
            }
        }

        // update the elitist record on strict improvement only
        if let Some(gen_best) = next.iter().min_by_key(|ind| ind.fitness.key()) {
            let improved = match &self.best {
                Some(best) => gen_best.fitness.better_than(&best.fitness),
                None => true,
            };
            if improved {
                self.best = Some(gen_best.clone());
            }
        }

        let cur_best = self
            .best
            .as_ref()
            .map(|b| b.fitness.total_distance)
            .unwrap_or(f64::INFINITY);

        // stagnation watches the scalar total distance only; the first
        // evolved generation has no predecessor to compare against
        if let Some(prev) = self.previous_best {
            let improvement = if prev == 0.0 {
                // already at zero: nothing left to improve
                0.0
            } else {
                (prev - cur_best).abs() / prev
            };
            if improvement < STAGNATION_THRESHOLD {
                self.stagnation += 1;
            } else {
                self.stagnation = 0;
            }
        }
        self.previous_best = Some(cur_best);

        let avg_distance = next
            .iter()
            .map(|ind| ind.fitness.total_distance)
            .sum::<f64>()
            / next.len() as f64;

        self.population = next;
        self.generation += 1;
        self.trace.push(TracePoint {
            generation: self.generation,
            best_distance: cur_best,
            avg_distance,
        });

        debug!(
            "gen {}: best {:.3}, avg {:.3}, stagnation {}",
            self.generation, cur_best, avg_distance, self.stagnation
        );

        if let Some(best) = &self.best {
            let event = GenerationEvent {
                generation: self.generation,
                best,
                best_fitness: best.fitness,
                avg_distance,
            };
            for observer in self.observers.iter_mut() {
                observer.on_generation(&event);
            }
        }
    }

    /// Run the genetic algorithm
    pub fn run(&mut self) -> RunResult {
        let start = Instant::now();

        info!(
            "starting run on '{}': {} stops, {} vehicles, population {}, up to {} generations",
            self.instance.name,
            self.instance.num_stops(),
            self.instance.vehicle_count,
            self.config.population_size,
            self.config.max_generations
        );

        self.initialize_population();

        let termination = loop {
            if self.cancel.load(Ordering::Relaxed) {
                break Termination::Cancelled;
            }
            if self.generation >= self.config.max_generations {
                break Termination::GenerationLimit;
            }
            if self.stagnation >= self.config.stagnation_limit {
                break Termination::Converged;
            }
            self.evolve();
        };

        let best = self.best.as_ref().expect("population is initialized");
        let solution = Solution::from_individual(
            best,
            &self.instance,
            self.generation,
            start.elapsed().as_secs_f64(),
        );

        info!(
            "run finished after {} generations ({:?}): best distance {:.3}, imbalance {:.3}",
            self.generation, termination, solution.total_distance, solution.imbalance
        );

        RunResult {
            best: solution,
            trace: self.trace.clone(),
            termination,
            generations: self.generation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::Point;
    use crate::solution::is_permutation;
    use std::sync::Mutex;

    fn test_instance(num_stops: usize, vehicles: usize, seed: u64) -> Instance {
        Instance::generate_random("test", num_stops, vehicles, seed).unwrap()
    }

    fn small_config() -> GaConfig {
        GaConfig {
            population_size: 30,
            max_generations: 60,
            seed: 7,
            ..Default::default()
        }
    }

    #[test]
    fn test_config_validation() {
        let instance = test_instance(5, 2, 1);

        let bad_pop = GaConfig {
            population_size: 1,
            ..Default::default()
        };
        assert_eq!(
            GeneticAlgorithm::new(instance.clone(), bad_pop).err(),
            Some(ConfigError::PopulationTooSmall(1))
        );

        let bad_gens = GaConfig {
            max_generations: 0,
            ..Default::default()
        };
        assert_eq!(
            GeneticAlgorithm::new(instance.clone(), bad_gens).err(),
            Some(ConfigError::NoGenerations)
        );

        let bad_cx = GaConfig {
            crossover_prob: 1.5,
            ..Default::default()
        };
        assert!(matches!(
            GeneticAlgorithm::new(instance.clone(), bad_cx),
            Err(ConfigError::ProbabilityOutOfRange { name: "crossover probability", .. })
        ));

        let bad_mut = GaConfig {
            mutation_prob: -0.1,
            ..Default::default()
        };
        assert!(matches!(
            GeneticAlgorithm::new(instance, bad_mut),
            Err(ConfigError::ProbabilityOutOfRange { name: "mutation probability", .. })
        ));
    }

    #[test]
    fn test_crossover_preserves_permutation() {
        let instance = test_instance(12, 3, 1);
        let mut ga = GeneticAlgorithm::new(instance, small_config()).unwrap();

        let a: Vec<usize> = (0..12).collect();
        let b: Vec<usize> = (0..12).rev().collect();
        for _ in 0..100 {
            let child = ga.crossover(&a, &b);
            assert!(is_permutation(&child, 12));
        }
    }

    #[test]
    fn test_mutation_preserves_permutation() {
        let instance = test_instance(12, 3, 1);
        let mut ga = GeneticAlgorithm::new(instance, small_config()).unwrap();

        let mut genes: Vec<usize> = (0..12).collect();
        for _ in 0..100 {
            ga.mutate(&mut genes);
            assert!(is_permutation(&genes, 12));
        }
    }

    #[test]
    fn test_initial_population_is_valid() {
        let instance = test_instance(15, 4, 3);
        let mut ga = GeneticAlgorithm::new(instance, small_config()).unwrap();
        ga.initialize_population();

        assert_eq!(ga.population.len(), 30);
        for ind in &ga.population {
            assert!(is_permutation(&ind.genes, 15));
        }
        assert!(ga.best.is_some());
    }

    #[test]
    fn test_determinism_under_fixed_seed() {
        let instance = test_instance(20, 3, 11);

        let mut first = GeneticAlgorithm::new(instance.clone(), small_config()).unwrap();
        let mut second = GeneticAlgorithm::new(instance, small_config()).unwrap();

        let a = first.run();
        let b = second.run();

        assert_eq!(a.best.visiting_order, b.best.visiting_order);
        assert_eq!(a.trace, b.trace);
        assert_eq!(a.termination, b.termination);
        assert_eq!(a.generations, b.generations);
    }

    #[test]
    fn test_monotonic_elitism_and_termination() {
        let instance = test_instance(25, 3, 5);
        let config = small_config();
        let max_generations = config.max_generations;
        let mut ga = GeneticAlgorithm::new(instance, config).unwrap();

        let result = ga.run();

        assert!(result.generations <= max_generations);
        assert_eq!(result.trace.len(), result.generations);
        for pair in result.trace.windows(2) {
            assert!(pair[1].best_distance <= pair[0].best_distance);
        }
        assert_eq!(ga.population.len(), 30);
        assert!(is_permutation(&result.best.visiting_order, 25));
    }

    #[test]
    fn test_best_beats_initial_generation() {
        // N=5 scenario: the returned best must not be worse than anything in
        // generation zero, and the trace covers every executed generation.
        let stops = vec![
            Point::new(30.0, 40.0),
            Point::new(60.0, 65.0),
            Point::new(45.0, 25.0),
            Point::new(70.0, 40.0),
            Point::new(40.0, 60.0),
        ];
        let instance = Instance::new("five-stops", Point::new(50.0, 50.0), stops, 2).unwrap();
        let config = GaConfig {
            population_size: 50,
            max_generations: 200,
            crossover_prob: 0.7,
            mutation_prob: 0.2,
            seed: 42,
            ..Default::default()
        };

        // Same seed, so this runner's generation zero matches the real run's.
        let mut probe = GeneticAlgorithm::new(instance.clone(), config.clone()).unwrap();
        probe.initialize_population();
        let initial_best = probe
            .population
            .iter()
            .map(|ind| ind.fitness.total_distance)
            .fold(f64::INFINITY, f64::min);

        let mut ga = GeneticAlgorithm::new(instance, config).unwrap();
        let result = ga.run();

        assert!(result.best.total_distance.is_finite());
        assert!(result.best.total_distance <= initial_best);
        assert_eq!(result.trace.len(), result.generations);
    }

    #[test]
    fn test_degenerate_instance_converges_promptly() {
        // Single stop on top of the depot: distance is zero from generation
        // zero, and stagnation must fire without dividing by zero.
        let instance = Instance::new(
            "degenerate",
            Point::new(50.0, 50.0),
            vec![Point::new(50.0, 50.0)],
            1,
        )
        .unwrap();
        let config = GaConfig {
            population_size: 10,
            max_generations: 500,
            ..Default::default()
        };
        let stagnation_limit = config.stagnation_limit;

        let mut ga = GeneticAlgorithm::new(instance, config).unwrap();
        let result = ga.run();

        assert_eq!(result.termination, Termination::Converged);
        // The first evolved generation has no predecessor, then every
        // generation counts as stagnant.
        assert_eq!(result.generations, stagnation_limit + 1);
        assert_eq!(result.best.total_distance, 0.0);
        assert_eq!(result.best.imbalance, 0.0);
    }

    #[test]
    fn test_cancellation_returns_partial_result() {
        let instance = test_instance(20, 3, 9);
        let mut ga = GeneticAlgorithm::new(instance, small_config()).unwrap();

        ga.cancel_token().store(true, Ordering::Relaxed);
        let result = ga.run();

        assert_eq!(result.termination, Termination::Cancelled);
        assert_eq!(result.generations, 0);
        assert!(result.trace.is_empty());
        // The initialized population still yields a best individual.
        assert!(is_permutation(&result.best.visiting_order, 20));
    }

    struct RecordingObserver {
        seen: Arc<Mutex<Vec<(usize, f64)>>>,
    }

    impl GenerationObserver for RecordingObserver {
        fn on_generation(&mut self, event: &GenerationEvent<'_>) {
            self.seen
                .lock()
                .unwrap()
                .push((event.generation, event.best_fitness.total_distance));
        }
    }

    #[test]
    fn test_observer_sees_every_generation() {
        let instance = test_instance(15, 2, 4);
        let mut ga = GeneticAlgorithm::new(instance, small_config()).unwrap();

        let seen = Arc::new(Mutex::new(Vec::new()));
        ga.add_observer(Box::new(RecordingObserver { seen: seen.clone() }));

        let result = ga.run();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), result.generations);
        for (i, (generation, best)) in seen.iter().enumerate() {
            assert_eq!(*generation, i + 1);
            assert_eq!(*best, result.trace[i].best_distance);
        }
    }
}
