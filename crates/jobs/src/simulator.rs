//! Fallback simulator: local, delayed completion when the broker is down.
//!
//! A single scheduler thread owns the pending set. Completions run after a
//! bounded delay and write straight to the job store, so the submit → poll →
//! `Completed` contract holds with no broker and no worker. Shutdown abandons
//! whatever is still pending, deterministically.

use std::sync::{Arc, Mutex, mpsc};
use std::thread;
use std::time::{Duration, Instant};

use serde_json::Value as JsonValue;
use tracing::{debug, error, info};

use vitalscan_core::{JobId, JobKind};

use crate::analyzer::analyze;
use crate::record::JobRecord;
use crate::store::JobStore;

/// Simulator configuration.
#[derive(Debug, Clone)]
pub struct SimulatorConfig {
    /// Delay between scheduling and synthetic completion.
    pub delay: Duration,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            delay: Duration::from_secs(2),
        }
    }
}

struct Pending {
    job_id: JobId,
    kind: JobKind,
    payload: JsonValue,
    due: Instant,
}

enum SimulatorMsg {
    Schedule(Pending),
    Shutdown,
}

/// Handle to the scheduler thread.
pub struct FallbackSimulator {
    tx: mpsc::Sender<SimulatorMsg>,
    delay: Duration,
    join: Mutex<Option<thread::JoinHandle<()>>>,
}

impl FallbackSimulator {
    /// Spawn the scheduler thread writing completions into `store`.
    pub fn spawn(store: Arc<dyn JobStore>, config: SimulatorConfig) -> Self {
        let (tx, rx) = mpsc::channel::<SimulatorMsg>();
        let delay = config.delay;

        let join = thread::Builder::new()
            .name("fallback-simulator".to_string())
            .spawn(move || simulator_loop(rx, store))
            .expect("failed to spawn fallback simulator thread");

        Self {
            tx,
            delay,
            join: Mutex::new(Some(join)),
        }
    }

    /// Schedule a delayed synthetic completion for `job_id`.
    ///
    /// Returns immediately; the completion runs on the scheduler thread after
    /// the configured delay.
    pub fn schedule(&self, job_id: JobId, kind: JobKind, payload: JsonValue) {
        debug!(%job_id, kind = %kind, delay_ms = self.delay.as_millis() as u64, "scheduling simulated completion");
        let _ = self.tx.send(SimulatorMsg::Schedule(Pending {
            job_id,
            kind,
            payload,
            due: Instant::now() + self.delay,
        }));
    }

    /// Stop the scheduler, abandoning pending simulations.
    pub fn shutdown(&self) {
        let _ = self.tx.send(SimulatorMsg::Shutdown);
        if let Some(join) = self.join.lock().unwrap().take() {
            let _ = join.join();
        }
    }
}

fn simulator_loop(rx: mpsc::Receiver<SimulatorMsg>, store: Arc<dyn JobStore>) {
    info!("fallback simulator started");
    let mut pending: Vec<Pending> = Vec::new();

    loop {
        let now = Instant::now();

        let mut i = 0;
        while i < pending.len() {
            if pending[i].due <= now {
                let job = pending.swap_remove(i);
                complete(&store, job);
            } else {
                i += 1;
            }
        }

        // Sleep until the earliest due time, capped so shutdown stays prompt.
        let wait = pending
            .iter()
            .map(|p| p.due.saturating_duration_since(now))
            .min()
            .unwrap_or(Duration::from_millis(250))
            .min(Duration::from_millis(250));

        match rx.recv_timeout(wait) {
            Ok(SimulatorMsg::Schedule(job)) => pending.push(job),
            Ok(SimulatorMsg::Shutdown) => break,
            Err(mpsc::RecvTimeoutError::Timeout) => continue,
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        }
    }

    info!(abandoned = pending.len(), "fallback simulator stopped");
}

fn complete(store: &Arc<dyn JobStore>, job: Pending) {
    let result = analyze(&job.kind, &job.payload);
    let record = JobRecord::completed(job.job_id, job.kind, result, true);

    match store.put(&record) {
        Ok(()) => info!(job_id = %record.job_id, "simulated completion persisted"),
        // Never propagate: losing a simulated result only means the caller
        // keeps seeing Processing.
        Err(e) => error!(job_id = %record.job_id, "failed to persist simulated completion: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryJobStore;
    use serde_json::json;
    use vitalscan_core::JobStatus;

    fn wait_for_record(
        store: &Arc<dyn JobStore>,
        job_id: JobId,
        budget: Duration,
    ) -> Option<JobRecord> {
        let deadline = Instant::now() + budget;
        while Instant::now() < deadline {
            if let Ok(Some(rec)) = store.get(job_id) {
                return Some(rec);
            }
            thread::sleep(Duration::from_millis(10));
        }
        None
    }

    #[test]
    fn completes_after_configured_delay() {
        let store: Arc<dyn JobStore> = Arc::new(InMemoryJobStore::new());
        let sim = FallbackSimulator::spawn(
            store.clone(),
            SimulatorConfig {
                delay: Duration::from_millis(50),
            },
        );

        let job_id = JobId::new();
        sim.schedule(job_id, JobKind::SignalAnalysis, json!({"samplingRate": 500}));

        let rec = wait_for_record(&store, job_id, Duration::from_secs(2)).expect("job completed");
        assert_eq!(rec.status, JobStatus::Completed);
        assert!(rec.simulated);
        assert!(rec.result.unwrap().get("heartRateBpm").is_some());

        sim.shutdown();
    }

    #[test]
    fn schedule_returns_immediately() {
        let store: Arc<dyn JobStore> = Arc::new(InMemoryJobStore::new());
        let sim = FallbackSimulator::spawn(
            store,
            SimulatorConfig {
                delay: Duration::from_secs(5),
            },
        );

        let started = Instant::now();
        sim.schedule(JobId::new(), JobKind::SignalAnalysis, JsonValue::Null);
        assert!(started.elapsed() < Duration::from_millis(100));

        sim.shutdown();
    }

    #[test]
    fn shutdown_abandons_pending_simulations() {
        let store: Arc<dyn JobStore> = Arc::new(InMemoryJobStore::new());
        let sim = FallbackSimulator::spawn(
            store.clone(),
            SimulatorConfig {
                delay: Duration::from_millis(200),
            },
        );

        let job_id = JobId::new();
        sim.schedule(job_id, JobKind::SignalAnalysis, JsonValue::Null);
        sim.shutdown();

        thread::sleep(Duration::from_millis(400));
        assert!(store.get(job_id).unwrap().is_none());
    }
}
