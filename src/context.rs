//! Explicit instrumentation context for fault construction and assembly.
use log::debug;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::time::{Duration, Instant};

/// Accumulated timing of a named stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageSummary {
    pub name: String,
    pub count: usize,
    pub total: Duration,
}

/// Collects per-stage timings.
///
/// A context is passed by reference to the topology builder and the fault integrators. Stages
/// are scoped: [`Context::stage`] returns a guard that records the elapsed time when dropped.
#[derive(Debug, Default)]
pub struct Context {
    stages: Mutex<BTreeMap<String, (usize, Duration)>>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use = "the stage ends when the guard is dropped"]
    pub fn stage(&self, name: &str) -> StageGuard<'_> {
        StageGuard {
            context: self,
            name: name.to_string(),
            start: Instant::now(),
        }
    }

    /// Returns the accumulated stage timings, ordered by stage name.
    pub fn stage_summary(&self) -> Vec<StageSummary> {
        self.stages
            .lock()
            .iter()
            .map(|(name, (count, total))| StageSummary {
                name: name.clone(),
                count: *count,
                total: *total,
            })
            .collect()
    }

    fn record(&self, name: &str, elapsed: Duration) {
        let mut stages = self.stages.lock();
        let entry = stages
            .entry(name.to_string())
            .or_insert((0, Duration::ZERO));
        entry.0 += 1;
        entry.1 += elapsed;
    }
}

/// Guard for an active stage of a [`Context`].
#[derive(Debug)]
pub struct StageGuard<'a> {
    context: &'a Context,
    name: String,
    start: Instant,
}

impl<'a> StageGuard<'a> {
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl<'a> Drop for StageGuard<'a> {
    fn drop(&mut self) {
        let elapsed = self.start.elapsed();
        debug!("Stage '{}' finished in {:.3?}", self.name, elapsed);
        self.context.record(&self.name, elapsed);
    }
}
