use super::evolution_engine::{GenerationRecord, ProgressCallback, StopReason};
use log::info;

/// Reports progress through the `log` facade.
pub struct LogProgressCallback;

impl ProgressCallback for LogProgressCallback {
    fn on_generation_start(&mut self, generation: u64) {
        info!("Generation {} starting...", generation);
    }

    fn on_generation_complete(&mut self, record: &GenerationRecord) {
        info!(
            "Generation {} complete in {:.2?}. Valid: {}/{}, average fitness: {:.4}, best fitness: {}",
            record.generation,
            record.elapsed,
            record.valid_count,
            record.population.len(),
            record.average_fitness,
            record
                .best_fitness
                .first()
                .map(|f| format!("{:.4}", f))
                .unwrap_or_else(|| "n/a".to_string())
        );
    }

    fn on_run_complete(&mut self, generations: usize, reason: StopReason) {
        info!("Evolution stopped after {} generations ({:?})", generations, reason);
    }
}

// For handing progress to another thread
pub struct ChannelProgressCallback {
    sender: std::sync::mpsc::Sender<ProgressMessage>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProgressMessage {
    GenerationStart(u64),
    GenerationComplete {
        generation: u64,
        best_fitness: Option<f64>,
        elite_count: usize,
        valid_count: usize,
    },
    Finished {
        generations: usize,
        reason: StopReason,
    },
}

impl ChannelProgressCallback {
    pub fn new(sender: std::sync::mpsc::Sender<ProgressMessage>) -> Self {
        Self { sender }
    }
}

impl ProgressCallback for ChannelProgressCallback {
    fn on_generation_start(&mut self, generation: u64) {
        let _ = self.sender.send(ProgressMessage::GenerationStart(generation));
    }

    fn on_generation_complete(&mut self, record: &GenerationRecord) {
        let _ = self.sender.send(ProgressMessage::GenerationComplete {
            generation: record.generation,
            best_fitness: record.best_fitness.first().copied(),
            elite_count: record.elites.len(),
            valid_count: record.valid_count,
        });
    }

    fn on_run_complete(&mut self, generations: usize, reason: StopReason) {
        let _ = self.sender.send(ProgressMessage::Finished { generations, reason });
    }
}
