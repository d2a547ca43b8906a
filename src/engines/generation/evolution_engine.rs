use crate::config::{ConfigSection, EvolutionConfig};
use crate::data::TagUniverse;
use crate::engines::evaluation::FitnessEvaluator;
use crate::engines::generation::{
    candidate::Candidate,
    elites::EliteSet,
    population::PopulationEvolver,
    progress::LogProgressCallback,
    random::RandomStream,
};
use crate::error::{GenticError, Result};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Summary of one completed generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRecord {
    pub generation: u64,
    /// Mean fitness of the valid candidates, or the sentinel when none were valid.
    pub average_fitness: f64,
    /// Elite fitnesses, best first.
    pub best_fitness: Vec<f64>,
    pub elapsed: Duration,
    pub elites: Vec<Candidate>,
    pub population: Vec<Candidate>,
    pub valid_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopReason {
    MaxGenerations,
    Converged,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunHistory {
    records: Vec<GenerationRecord>,
    stop_reason: StopReason,
}

impl RunHistory {
    pub fn records(&self) -> &[GenerationRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<GenerationRecord> {
        self.records
    }

    pub fn stop_reason(&self) -> StopReason {
        self.stop_reason
    }

    pub fn last(&self) -> Option<&GenerationRecord> {
        self.records.last()
    }

    /// Best candidate seen during the run.
    pub fn best(&self) -> Option<&Candidate> {
        self.last().and_then(|record| record.elites.first())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Cooperative stop signal, checked between generations.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

pub trait ProgressCallback {
    fn on_generation_start(&mut self, generation: u64);
    fn on_generation_complete(&mut self, record: &GenerationRecord);
    fn on_run_complete(&mut self, _generations: usize, _reason: StopReason) {}
}

pub struct EvolutionEngine<E: FitnessEvaluator> {
    config: EvolutionConfig,
    universe: TagUniverse,
    evaluator: E,
    pool: rayon::ThreadPool,
    master: RandomStream,
    cancellation: Option<CancellationToken>,
}

impl<E: FitnessEvaluator> EvolutionEngine<E> {
    /// Validates `config` and builds the worker pool. Fails fast on bad config.
    pub fn new(config: EvolutionConfig, universe: TagUniverse, evaluator: E) -> Result<Self> {
        config.validate()?;

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.parallelism)
            .thread_name(|i| format!("gentic-worker-{}", i))
            .build()?;

        let master = match config.seed {
            Some(seed) => RandomStream::from_seed(seed),
            None => RandomStream::from_entropy(),
        };

        debug!(
            "Engine ready: population={}, tournament={}, workers={}, seed={}",
            config.population_size,
            config.tournament_size,
            config.parallelism,
            master.seed()
        );

        Ok(Self {
            config,
            universe,
            evaluator,
            pool,
            master,
            cancellation: None,
        })
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    pub fn config(&self) -> &EvolutionConfig {
        &self.config
    }

    pub fn universe(&self) -> &TagUniverse {
        &self.universe
    }

    /// Seed of the master stream; rerunning with it reproduces the run.
    pub fn seed(&self) -> u64 {
        self.master.seed()
    }

    /// Run the evolution process, reporting progress to the log.
    pub fn run(&self, market: &E::Market) -> Result<RunHistory> {
        self.run_with_progress(market, LogProgressCallback)
    }

    pub fn run_with_progress<C: ProgressCallback>(
        &self,
        market: &E::Market,
        mut callback: C,
    ) -> Result<RunHistory> {
        let config = &self.config;
        let evolver = PopulationEvolver::new(config, &self.universe, &self.evaluator, &self.pool);
        let default_value = config.default_value();

        let mut records: Vec<GenerationRecord> = Vec::new();
        let mut elites = EliteSet::new(config.tournament_size, config.greater_is_better);
        let mut parent_pool: Vec<Candidate> = Vec::new();
        let mut previous_mean: Option<f64> = None;
        let mut stalled = 0usize;
        let mut stop_reason = StopReason::MaxGenerations;

        for generation in 0..config.max_generations as u64 {
            if self.is_cancelled() {
                info!("Cancellation requested before generation {}", generation);
                stop_reason = StopReason::Cancelled;
                break;
            }

            callback.on_generation_start(generation);
            let started = Instant::now();

            let seeds = self.slot_seeds(generation);
            let parents = if generation == 0 {
                None
            } else {
                Some(parent_pool.as_slice())
            };
            let population = evolver.evolve_generation(parents, market, &seeds, generation);

            let valid: Vec<Candidate> = population
                .iter()
                .filter(|c| c.is_valid())
                .cloned()
                .collect();
            let valid_count = valid.len();

            let average_fitness = if valid.is_empty() {
                if generation == 0 {
                    warn!("Generation 0 produced no valid candidates, nothing to evolve from");
                    return Err(GenticError::EmptyPopulation { generation });
                }
                warn!(
                    "Generation {} produced no valid candidates, keeping previous elites and parents",
                    generation
                );
                default_value
            } else {
                let total: f64 = valid.iter().filter_map(Candidate::fitness).sum();
                elites.merge(&valid);
                parent_pool = valid;
                total / valid_count as f64
            };

            for elite in elites.get_all() {
                debug!(
                    "  elite {} fitness={:?} via {} ({:?}) created {}",
                    elite.identity(),
                    elite.fitness(),
                    elite.lineage().method(),
                    elite.lineage(),
                    elite.created_at().to_rfc3339()
                );
            }

            let record = GenerationRecord {
                generation,
                average_fitness,
                best_fitness: elites.fitnesses(),
                elapsed: started.elapsed(),
                elites: elites.get_all().to_vec(),
                population,
                valid_count,
            };
            callback.on_generation_complete(&record);
            records.push(record);

            let current_mean = elites.mean_fitness();
            if let (Some(previous), Some(current)) = (previous_mean, current_mean) {
                let delta = current - previous;
                if delta.abs() < config.convergence_threshold {
                    stalled += 1;
                    debug!(
                        "Elite mean moved by {:.6}, stalled for {} generation(s)",
                        delta, stalled
                    );
                    if stalled > config.convergence_patience {
                        info!("Converged at generation {}", generation);
                        stop_reason = StopReason::Converged;
                        break;
                    }
                } else {
                    stalled = 0;
                }
            }
            previous_mean = current_mean;
        }

        callback.on_run_complete(records.len(), stop_reason);
        Ok(RunHistory {
            records,
            stop_reason,
        })
    }

    /// One seed per population slot, derived from `(master seed, generation, slot)`.
    fn slot_seeds(&self, generation: u64) -> Vec<u64> {
        let generation_stream = self.master.derive(generation);
        (0..self.config.population_size as u64)
            .map(|slot| generation_stream.derive(slot).seed())
            .collect()
    }

    fn is_cancelled(&self) -> bool {
        self.cancellation
            .as_ref()
            .map(CancellationToken::is_cancelled)
            .unwrap_or(false)
    }
}
