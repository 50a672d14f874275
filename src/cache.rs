use tokio::sync::{Mutex, RwLock};

use crate::error::Result;
use crate::pipeline::{Pipeline, PipelineResult};

struct Slot {
    result: Option<PipelineResult>,
    generation: u64,
}

/// Single-slot store for the latest successful pipeline result.
///
/// Refresh policy: at most one pipeline execution is in flight at a time. A
/// caller that arrives while a refresh is running blocks until it finishes and
/// then returns that run's result instead of billing a second execution. A
/// failed run leaves the previously stored result untouched; stale-but-valid
/// data is preferred over no data.
pub struct ReportCache {
    slot: RwLock<Slot>,
    running: Mutex<()>,
}

impl Default for ReportCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportCache {
    pub fn new() -> Self {
        Self {
            slot: RwLock::new(Slot {
                result: None,
                generation: 0,
            }),
            running: Mutex::new(()),
        }
    }

    /// The last successful result, if any run has completed yet.
    pub async fn read(&self) -> Option<PipelineResult> {
        self.slot.read().await.result.clone()
    }

    /// Run the pipeline under the exclusive execution lock and store the
    /// result. The lock guard is released on every exit path, including a
    /// failed run.
    pub async fn refresh(&self, pipeline: &Pipeline) -> Result<PipelineResult> {
        let seen = self.slot.read().await.generation;
        let _running = self.running.lock().await;

        // Another caller finished a refresh while we waited for the lock;
        // its result is fresh enough for us.
        {
            let slot = self.slot.read().await;
            if slot.generation != seen {
                if let Some(result) = slot.result.clone() {
                    tracing::debug!("refresh coalesced with a just-finished run");
                    return Ok(result);
                }
            }
        }

        let result = pipeline.run().await?;

        let mut slot = self.slot.write().await;
        slot.result = Some(result.clone());
        slot.generation += 1;
        Ok(result)
    }
}
