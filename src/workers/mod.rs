pub mod event_log;
pub mod log_flush;
pub mod shift_tick;

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_cron_scheduler::{Job, JobScheduler};

use crate::config::WorkerConfig;
use crate::constants::SHIFT_TICK_INTERVAL_SECS;
use crate::state::SessionHandle;
use crate::store::Store;

/// Timeout for individual worker invocations.
const WORKER_TIMEOUT: Duration = Duration::from_secs(30);

/// Drain period before scheduler shutdown to let in-flight tasks complete.
#[cfg(test)]
const DRAIN_TIMEOUT: Duration = Duration::from_millis(10);
#[cfg(not(test))]
const DRAIN_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkerName {
    ShiftTick,
    LogFlush,
}

impl WorkerName {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ShiftTick => "shift_tick",
            Self::LogFlush => "log_flush",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Schedule {
    Cron(String),
    /// 固定周期，不受 cron 秒级对齐影响
    Every(Duration),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobSpec {
    pub name: WorkerName,
    pub schedule: Schedule,
    pub enabled: bool,
}

/// 停机顺序：先停调度器并等它退出，再停事件写入任务。
/// 调度器排空期间产生的事件（例如换班到期）因此仍会落盘。
pub struct ShutdownSequence {
    workers_tx: broadcast::Sender<()>,
    writer_tx: broadcast::Sender<()>,
}

impl ShutdownSequence {
    pub fn new() -> Self {
        let (workers_tx, _) = broadcast::channel(8);
        let (writer_tx, _) = broadcast::channel(8);
        Self {
            workers_tx,
            writer_tx,
        }
    }

    pub fn workers(&self) -> broadcast::Receiver<()> {
        self.workers_tx.subscribe()
    }

    pub fn writer(&self) -> broadcast::Receiver<()> {
        self.writer_tx.subscribe()
    }

    pub async fn run(self, worker_handle: JoinHandle<()>, writer_handle: JoinHandle<()>) {
        let _ = self.workers_tx.send(());
        if let Err(e) = worker_handle.await {
            tracing::error!(error = %e, "Worker task panicked");
        }

        let _ = self.writer_tx.send(());
        if let Err(e) = writer_handle.await {
            tracing::error!(error = %e, "Event log writer panicked");
        }
    }
}

impl Default for ShutdownSequence {
    fn default() -> Self {
        Self::new()
    }
}

pub struct WorkerManager {
    session: SessionHandle,
    store: Arc<Store>,
    shutdown_rx: broadcast::Receiver<()>,
    config: WorkerConfig,
}

impl WorkerManager {
    pub fn new(
        session: SessionHandle,
        store: Arc<Store>,
        shutdown_rx: broadcast::Receiver<()>,
        config: &WorkerConfig,
    ) -> Self {
        Self {
            session,
            store,
            shutdown_rx,
            config: config.clone(),
        }
    }

    /// Single source of truth for all planned jobs and their schedules.
    pub fn planned_jobs(&self) -> Vec<JobSpec> {
        vec![
            // 换班倒计时由墙钟驱动，与帧无关，始终启用
            JobSpec {
                name: WorkerName::ShiftTick,
                schedule: Schedule::Every(Duration::from_secs(SHIFT_TICK_INTERVAL_SECS)),
                enabled: true,
            },
            JobSpec {
                name: WorkerName::LogFlush,
                schedule: Schedule::Cron(self.config.log_flush_cron.clone()),
                enabled: self.config.enable_log_flush,
            },
        ]
    }

    /// Start the worker scheduler and block until the shutdown signal arrives.
    pub async fn start(mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let mut scheduler = JobScheduler::new().await?;

        self.register_jobs(&scheduler).await;

        scheduler.start().await?;

        tracing::info!("Worker manager started");
        let _ = self.shutdown_rx.recv().await;

        tracing::info!(
            drain_ms = DRAIN_TIMEOUT.as_millis() as u64,
            "Worker manager shutting down"
        );
        tokio::time::sleep(DRAIN_TIMEOUT).await;
        let _ = scheduler.shutdown().await;
        Ok(())
    }

    async fn register_jobs(&self, scheduler: &JobScheduler) {
        for spec in self.planned_jobs() {
            if !spec.enabled {
                tracing::info!(name = spec.name.as_str(), "Skipping disabled worker");
                continue;
            }

            let name_str = spec.name.as_str();
            match spec.name {
                WorkerName::ShiftTick => {
                    let session = self.session.clone();
                    add_job(scheduler, &spec.schedule, name_str, move || {
                        let session = session.clone();
                        async move {
                            shift_tick::run(&session).await;
                        }
                    })
                    .await;
                }
                WorkerName::LogFlush => {
                    let store = self.store.clone();
                    add_job(scheduler, &spec.schedule, name_str, move || {
                        let store = store.clone();
                        async move {
                            log_flush::run(&store).await;
                        }
                    })
                    .await;
                }
            }
            tracing::info!(name = name_str, schedule = ?spec.schedule, "Registered worker");
        }
    }
}

type JobFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

/// Add a job to the scheduler with an overlap guard and timeout wrapper.
async fn add_job<Fut, F>(scheduler: &JobScheduler, schedule: &Schedule, name: &'static str, mut run: F)
where
    F: FnMut() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let running = Arc::new(AtomicBool::new(false));

    let job = match schedule {
        Schedule::Cron(cron) => Job::new_async(cron.as_str(), move |_uuid, _lock| {
            guarded(&running, name, &mut run)
        }),
        Schedule::Every(period) => Job::new_repeated_async(*period, move |_uuid, _lock| {
            guarded(&running, name, &mut run)
        }),
    };

    match job {
        Ok(job) => {
            if let Err(err) = scheduler.add(job).await {
                tracing::error!(error = %err, ?schedule, worker = name, "Failed to add worker job");
            }
        }
        Err(err) => {
            tracing::error!(error = %err, ?schedule, worker = name, "Failed to create worker job")
        }
    }
}

fn guarded<Fut, F>(running: &Arc<AtomicBool>, name: &'static str, run: &mut F) -> JobFuture
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ()> + Send + 'static,
{
    if running
        .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
        .is_err()
    {
        tracing::warn!(
            worker = name,
            "Skipping worker invocation: previous run still in progress"
        );
        return Box::pin(async {});
    }

    let guard = running.clone();
    let fut = run();
    Box::pin(async move {
        if tokio::time::timeout(WORKER_TIMEOUT, fut).await.is_err() {
            tracing::error!(
                worker = name,
                timeout_secs = WORKER_TIMEOUT.as_secs(),
                "Worker timed out"
            );
        }
        guard.store(false, Ordering::SeqCst);
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tokio::sync::broadcast;

    use super::*;
    use crate::engine::config::EngineConfig;
    use crate::engine::events::NullSink;
    use crate::engine::session::AttentionEngine;
    use crate::feedback::RecordingFeedback;

    fn fixture(name: &str, config: &WorkerConfig) -> (WorkerManager, broadcast::Sender<()>, tempfile::TempDir) {
        let tmp = tempfile::tempdir().expect("tempdir");
        let store = Arc::new(Store::open(tmp.path().join(name).to_str().unwrap()).unwrap());
        let engine = AttentionEngine::new(EngineConfig::default(), Arc::new(NullSink));
        let session = SessionHandle::new(engine, Arc::new(RecordingFeedback::new()));
        let (tx, _) = broadcast::channel(2);
        let manager = WorkerManager::new(session, store, tx.subscribe(), config);
        (manager, tx, tmp)
    }

    fn worker_config(enable_log_flush: bool) -> WorkerConfig {
        WorkerConfig {
            enable_log_flush,
            log_flush_cron: "*/30 * * * * *".to_string(),
        }
    }

    #[tokio::test]
    async fn shift_tick_is_always_planned() {
        let (manager, _tx, _tmp) = fixture("worker_test.sled", &worker_config(false));
        let jobs = manager.planned_jobs();

        let tick = jobs
            .iter()
            .find(|j| j.name == WorkerName::ShiftTick)
            .expect("shift tick job");
        assert!(tick.enabled);
        assert_eq!(tick.schedule, Schedule::Every(Duration::from_secs(1)));

        let flush = jobs
            .iter()
            .find(|j| j.name == WorkerName::LogFlush)
            .expect("log flush job");
        assert!(!flush.enabled);
    }

    #[tokio::test]
    async fn log_flush_uses_configured_cron() {
        let (manager, _tx, _tmp) = fixture("worker_test_2.sled", &worker_config(true));
        let flush = manager
            .planned_jobs()
            .into_iter()
            .find(|j| j.name == WorkerName::LogFlush)
            .expect("log flush job");
        assert!(flush.enabled);
        assert_eq!(flush.schedule, Schedule::Cron("*/30 * * * * *".to_string()));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn shutdown_stops_manager() {
        let (manager, tx, _tmp) = fixture("worker_test_3.sled", &worker_config(true));
        let task = tokio::spawn(manager.start());
        tx.send(()).expect("shutdown receiver alive");

        let result = tokio::time::timeout(Duration::from_secs(10), task)
            .await
            .expect("manager stops in time")
            .expect("manager task joins");
        assert!(result.is_ok());
    }

    #[test]
    fn all_worker_names_have_str() {
        for name in [WorkerName::ShiftTick, WorkerName::LogFlush] {
            assert!(!name.as_str().is_empty(), "{:?} has empty str", name);
        }
    }
}
