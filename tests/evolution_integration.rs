use gentic::config::EvolutionConfig;
use gentic::engines::generation::{
    CancellationToken, ChannelProgressCallback, EvolutionEngine, GenerationRecord, LineageInfo,
    ProgressCallback, ProgressMessage, RunHistory, StopReason,
};
use gentic::{EvaluationResult, FitnessEvaluator, GenticError, Tag, TagUniverse};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::channel;

/// Toy market: a score per tag name; fitness is the sum over the candidate.
struct ScoreTable {
    scores: HashMap<String, f64>,
}

/// Sums per-tag scores; candidates holding a poisoned tag fail.
struct TableEvaluator {
    poisoned: Option<&'static str>,
}

impl FitnessEvaluator for TableEvaluator {
    type Market = ScoreTable;

    fn evaluate(
        &self,
        tags: &[Tag],
        market: &ScoreTable,
        default_value: f64,
    ) -> anyhow::Result<EvaluationResult> {
        if let Some(poison) = self.poisoned {
            if tags.iter().any(|t| t.name == poison) {
                return Ok(EvaluationResult::failed(default_value));
            }
        }
        let mut total = 0.0;
        for tag in tags {
            match market.scores.get(&tag.name) {
                Some(score) => total += score,
                None => anyhow::bail!("no score for {}", tag.name),
            }
        }
        Ok(EvaluationResult::ok(total))
    }
}

struct Constant;

impl FitnessEvaluator for Constant {
    type Market = ();

    fn evaluate(&self, _: &[Tag], _: &(), _: f64) -> anyhow::Result<EvaluationResult> {
        Ok(EvaluationResult::ok(1.0))
    }
}

struct AlwaysFails;

impl FitnessEvaluator for AlwaysFails {
    type Market = ();

    fn evaluate(&self, _: &[Tag], _: &(), default_value: f64) -> anyhow::Result<EvaluationResult> {
        Ok(EvaluationResult::failed(default_value))
    }
}

/// Scores by tag count for the first `ok_calls` evaluations, then fails every candidate.
struct FailAfter {
    ok_calls: usize,
    calls: AtomicUsize,
}

impl FitnessEvaluator for FailAfter {
    type Market = ();

    fn evaluate(
        &self,
        tags: &[Tag],
        _: &(),
        default_value: f64,
    ) -> anyhow::Result<EvaluationResult> {
        if self.calls.fetch_add(1, Ordering::SeqCst) < self.ok_calls {
            Ok(EvaluationResult::ok(tags.len() as f64))
        } else {
            Ok(EvaluationResult::failed(default_value))
        }
    }
}

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn universe() -> TagUniverse {
    TagUniverse::new(
        ["Banks", "Energy", "Media", "Retail", "Utilities", "Autos", "Chemicals"],
        ["CSI300", "CSI500", "CSI1000", "SSE50"],
    )
    .unwrap()
}

fn market() -> ScoreTable {
    let scores = [
        ("Banks", 0.8),
        ("Energy", -0.4),
        ("Media", 0.3),
        ("Retail", -0.1),
        ("Utilities", 0.5),
        ("Autos", -0.7),
        ("Chemicals", 0.2),
        ("CSI300", 0.6),
        ("CSI500", -0.2),
        ("CSI1000", 0.1),
        ("SSE50", -0.5),
    ];
    ScoreTable {
        scores: scores.iter().map(|(n, s)| (n.to_string(), *s)).collect(),
    }
}

fn test_config() -> EvolutionConfig {
    EvolutionConfig {
        population_size: 24,
        tournament_size: 4,
        max_generations: 6,
        init_depth: (1, 3),
        convergence_threshold: 0.0,
        parallelism: 2,
        seed: Some(7),
        ..EvolutionConfig::default()
    }
}

fn table_engine(config: EvolutionConfig) -> EvolutionEngine<TableEvaluator> {
    EvolutionEngine::new(config, universe(), TableEvaluator { poisoned: None }).unwrap()
}

type Fingerprint = Vec<(u64, Vec<(String, Option<f64>, bool, LineageInfo)>, Vec<f64>)>;

/// Everything in the history except wall-clock fields.
fn fingerprint(history: &RunHistory) -> Fingerprint {
    history
        .records()
        .iter()
        .map(|record| {
            let population = record
                .population
                .iter()
                .map(|c| {
                    (
                        c.identity().to_string(),
                        c.fitness(),
                        c.is_valid(),
                        c.lineage().clone(),
                    )
                })
                .collect();
            (record.generation, population, record.best_fitness.clone())
        })
        .collect()
}

#[test]
fn test_same_seed_same_history_for_any_worker_count() {
    init_logging();
    let market = market();

    let run = |parallelism: usize| {
        let config = EvolutionConfig {
            parallelism,
            ..test_config()
        };
        let engine = table_engine(config);
        engine.run(&market).unwrap()
    };

    let sequential = run(1);
    let parallel = run(4);
    assert_eq!(sequential.len(), 6);
    assert_eq!(fingerprint(&sequential), fingerprint(&parallel));
    assert_eq!(fingerprint(&sequential), fingerprint(&run(1)));
}

#[test]
fn test_different_seeds_diverge() {
    let market = market();
    let run = |seed: u64| {
        let config = EvolutionConfig {
            seed: Some(seed),
            ..test_config()
        };
        let engine = table_engine(config);
        fingerprint(&engine.run(&market).unwrap())
    };
    assert_ne!(run(1), run(2));
}

#[test]
fn test_constant_fitness_converges_after_patience() {
    init_logging();
    let config = EvolutionConfig {
        max_generations: 50,
        convergence_threshold: 1e-4,
        convergence_patience: 3,
        ..test_config()
    };
    let engine = EvolutionEngine::new(config, universe(), Constant).unwrap();
    let history = engine.run(&()).unwrap();

    // generation 0, then four zero-delta comparisons
    assert_eq!(history.len(), 5);
    assert_eq!(history.stop_reason(), StopReason::Converged);
}

#[test]
fn test_all_invalid_generation_zero_is_fatal() {
    let config = EvolutionConfig {
        population_size: 1,
        tournament_size: 1,
        ..test_config()
    };
    let engine = EvolutionEngine::new(config, universe(), AlwaysFails).unwrap();
    match engine.run(&()) {
        Err(GenticError::EmptyPopulation { generation }) => assert_eq!(generation, 0),
        other => panic!("expected EmptyPopulation, got {:?}", other.map(|h| h.len())),
    }
}

#[test]
fn test_empty_later_generations_keep_previous_elites() {
    init_logging();
    let config = EvolutionConfig {
        population_size: 8,
        tournament_size: 3,
        max_generations: 4,
        ..test_config()
    };
    let evaluator = FailAfter {
        ok_calls: 8,
        calls: AtomicUsize::new(0),
    };
    let engine = EvolutionEngine::new(config, universe(), evaluator).unwrap();
    let history = engine.run(&()).unwrap();

    assert_eq!(history.len(), 4);
    assert_eq!(history.stop_reason(), StopReason::MaxGenerations);

    let records = history.records();
    let first = &records[0];
    assert_eq!(first.valid_count, 8);
    assert_eq!(first.best_fitness.len(), 3);

    let default_value = engine.config().default_value();
    for record in &records[1..] {
        assert_eq!(record.population.len(), 8);
        assert_eq!(record.valid_count, 0);
        assert_eq!(record.average_fitness, default_value);
        assert_eq!(record.best_fitness, first.best_fitness);
        let ids: Vec<&str> = record.elites.iter().map(|e| e.identity()).collect();
        let first_ids: Vec<&str> = first.elites.iter().map(|e| e.identity()).collect();
        assert_eq!(ids, first_ids);
        // the generation-0 pool still feeds breeding
        for candidate in &record.population {
            assert!(candidate.lineage().parent_idx().unwrap() < 8);
        }
    }
}

#[test]
fn test_invalid_candidates_are_not_parents_or_elites() {
    init_logging();
    let market = market();
    let engine = EvolutionEngine::new(
        test_config(),
        universe(),
        TableEvaluator {
            poisoned: Some("Media"),
        },
    )
    .unwrap();
    let history = engine.run(&market).unwrap();

    let default_value = engine.config().default_value();
    let records = history.records();
    for record in records {
        for candidate in &record.population {
            let poisoned = candidate.tags().iter().any(|t| t.name == "Media");
            assert_eq!(candidate.is_valid(), !poisoned);
            if poisoned {
                assert_eq!(candidate.fitness(), Some(default_value));
            }
        }
        assert!(record.elites.iter().all(|e| e.is_valid()));
        assert_eq!(
            record.valid_count,
            record.population.iter().filter(|c| c.is_valid()).count()
        );
    }

    // lineage indices point into the previous generation's valid pool
    for pair in records.windows(2) {
        let (previous, current) = (&pair[0], &pair[1]);
        let pool: Vec<_> = previous.population.iter().filter(|c| c.is_valid()).collect();
        if pool.is_empty() {
            continue;
        }
        for candidate in &current.population {
            let parent_idx = candidate.lineage().parent_idx().unwrap();
            assert!(parent_idx < pool.len());
            if let LineageInfo::Crossover { donor_idx, .. } = candidate.lineage() {
                assert!(*donor_idx < pool.len());
            }
        }
    }
}

#[test]
fn test_elites_sorted_by_direction() {
    let market = market();
    for greater_is_better in [true, false] {
        let config = EvolutionConfig {
            greater_is_better,
            ..test_config()
        };
        let engine = table_engine(config);
        let history = engine.run(&market).unwrap();

        for record in history.records() {
            assert!(record.best_fitness.len() <= 4);
            for pair in record.best_fitness.windows(2) {
                if greater_is_better {
                    assert!(pair[0] >= pair[1]);
                } else {
                    assert!(pair[0] <= pair[1]);
                }
            }
        }

        // elites are carried over, so the recorded best never gets worse
        let bests: Vec<f64> = history
            .records()
            .iter()
            .filter_map(|r| r.best_fitness.first().copied())
            .collect();
        for pair in bests.windows(2) {
            if greater_is_better {
                assert!(pair[1] >= pair[0]);
            } else {
                assert!(pair[1] <= pair[0]);
            }
        }
    }
}

#[test]
fn test_every_candidate_has_unique_names() {
    let market = market();
    let config = EvolutionConfig {
        p_crossover: 0.3,
        p_subtree_mutation: 0.2,
        p_hoist_mutation: 0.2,
        p_point_mutation: 0.2,
        p_point_replace: 0.5,
        ..test_config()
    };
    let engine = table_engine(config);
    let history = engine.run(&market).unwrap();

    for record in history.records() {
        for candidate in &record.population {
            let mut names: Vec<&str> = candidate.tags().iter().map(|t| t.name.as_str()).collect();
            let before = names.len();
            names.sort_unstable();
            names.dedup();
            assert_eq!(names.len(), before);
            assert!(!candidate.is_empty());
        }
    }
}

#[test]
fn test_progress_messages_follow_generations() {
    let (tx, rx) = channel();
    let engine = table_engine(test_config());
    let history = engine
        .run_with_progress(&market(), ChannelProgressCallback::new(tx))
        .unwrap();

    let messages: Vec<ProgressMessage> = rx.try_iter().collect();
    let starts = messages
        .iter()
        .filter(|m| matches!(m, ProgressMessage::GenerationStart(_)))
        .count();
    assert_eq!(starts, history.len());
    assert_eq!(
        messages.last(),
        Some(&ProgressMessage::Finished {
            generations: history.len(),
            reason: StopReason::MaxGenerations,
        })
    );
}

/// Cancels the run once a given generation has completed.
struct CancelAfter {
    token: CancellationToken,
    generation: u64,
}

impl ProgressCallback for CancelAfter {
    fn on_generation_start(&mut self, _generation: u64) {}

    fn on_generation_complete(&mut self, record: &GenerationRecord) {
        if record.generation == self.generation {
            self.token.cancel();
        }
    }
}

#[test]
fn test_cancellation_keeps_completed_generations() {
    let token = CancellationToken::new();
    let engine = table_engine(test_config()).with_cancellation(token.clone());

    let history = engine
        .run_with_progress(
            &market(),
            CancelAfter {
                token,
                generation: 1,
            },
        )
        .unwrap();

    assert_eq!(history.len(), 2);
    assert_eq!(history.stop_reason(), StopReason::Cancelled);
}

#[test]
fn test_history_serializes_to_json() {
    let engine = table_engine(test_config());
    let history = engine.run(&market()).unwrap();
    let json = history.to_json().unwrap();

    let restored: RunHistory = serde_json::from_str(&json).unwrap();
    assert_eq!(restored.len(), history.len());
    assert_eq!(restored.stop_reason(), history.stop_reason());
    for (a, b) in restored.records().iter().zip(history.records()) {
        let ids = |r: &GenerationRecord| -> Vec<String> {
            r.population.iter().map(|c| c.identity().to_string()).collect()
        };
        assert_eq!(ids(a), ids(b));
        assert_eq!(a.valid_count, b.valid_count);
    }
    assert_eq!(
        restored.best().map(|c| c.identity()),
        history.best().map(|c| c.identity())
    );
}
