//! Bounded pool of background workers.
//!
//! Jobs are queued in a bounded channel and picked up by a fixed number of tokio tasks, each job
//! then runs on the blocking thread pool with a timeout.  Submission never waits: when the queue
//! is full the job is dropped and counted.
//!
//! A job that times out is counted and no longer waited for, but blocking code can not be
//! cancelled: its worker holds its slot until the handler returns, so there are never more than
//! `workers` handlers running, and `shutdown()` only returns once the last one is over.
//!

use std::fmt::{Debug, Display, Formatter};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize};
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{debug, error, trace, warn};

use crate::PoolError;

/// Default number of workers
const DEF_WORKERS: usize = 2;
/// Default queue length
const DEF_QUEUE: usize = 64;
/// Default per-job timeout
const DEF_TIMEOUT: Duration = Duration::from_secs(10);

type Work = Box<dyn FnOnce() -> eyre::Result<()> + Send + 'static>;

/// A named unit of background work.
///
pub struct Job {
    name: String,
    work: Work,
}

impl Job {
    pub fn new<F>(name: &str, work: F) -> Self
    where
        F: FnOnce() -> eyre::Result<()> + Send + 'static,
    {
        Job {
            name: name.to_owned(),
            work: Box::new(work),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Debug for Job {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Job").field("name", &self.name).finish()
    }
}

/// Pool sizing, the `pool` block of the engine configuration.
///
/// ```hcl
/// pool {
///   workers = 2
///   queue   = 64
///   timeout = "10s"
/// }
/// ```
///
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct PoolConfig {
    /// Number of concurrent jobs
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// Jobs waiting for a worker before we start dropping
    #[serde(default = "default_queue")]
    pub queue: usize,
    /// Per-job timeout, e.g. `"500ms"` or `"10s"`
    #[serde(default = "default_timeout", deserialize_with = "from_humantime")]
    pub timeout: Duration,
}

fn default_workers() -> usize {
    DEF_WORKERS
}

fn default_queue() -> usize {
    DEF_QUEUE
}

fn default_timeout() -> Duration {
    DEF_TIMEOUT
}

fn from_humantime<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    humantime::parse_duration(&s).map_err(serde::de::Error::custom)
}

impl Default for PoolConfig {
    fn default() -> Self {
        PoolConfig {
            workers: DEF_WORKERS,
            queue: DEF_QUEUE,
            timeout: DEF_TIMEOUT,
        }
    }
}

/// Running counters.
///
#[derive(Debug, Default)]
struct Counters {
    done: AtomicUsize,
    failed: AtomicUsize,
    timeouts: AtomicUsize,
    dropped: AtomicUsize,
}

/// Snapshot of the pool counters.
///
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct PoolStats {
    pub done: usize,
    pub failed: usize,
    pub timeouts: usize,
    pub dropped: usize,
}

impl Display for PoolStats {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "done={} failed={} timeouts={} dropped={}",
            self.done, self.failed, self.timeouts, self.dropped
        )
    }
}

/// The pool itself.
///
#[derive(Debug)]
pub struct WorkerPool {
    /// `None` once shut down
    tx: Mutex<Option<mpsc::Sender<Job>>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    counters: Arc<Counters>,
    timeout: Duration,
}

impl WorkerPool {
    /// Start the workers, must be called from within a tokio runtime.
    ///
    #[tracing::instrument]
    pub fn new(cfg: &PoolConfig) -> Result<Self, PoolError> {
        let rt = tokio::runtime::Handle::try_current().map_err(|_| PoolError::NoRuntime)?;

        let (tx, rx) = mpsc::channel::<Job>(cfg.queue.max(1));
        let rx = Arc::new(tokio::sync::Mutex::new(rx));
        let counters = Arc::new(Counters::default());

        let workers = (0..cfg.workers.max(1))
            .map(|id| {
                let rx = Arc::clone(&rx);
                let counters = Arc::clone(&counters);
                rt.spawn(worker(id, rx, counters, cfg.timeout))
            })
            .collect::<Vec<_>>();
        debug!("{} workers started", workers.len());

        Ok(WorkerPool {
            tx: Mutex::new(Some(tx)),
            workers: Mutex::new(workers),
            counters,
            timeout: cfg.timeout,
        })
    }

    /// Queue a job without waiting.
    ///
    pub fn submit(&self, job: Job) -> Result<(), PoolError> {
        let tx = self.tx.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(tx) = tx.as_ref() else {
            return Err(PoolError::Closed);
        };

        match tx.try_send(job) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(job)) => {
                self.counters.dropped.fetch_add(1, Ordering::Relaxed);
                Err(PoolError::Saturated(job.name))
            }
            Err(TrySendError::Closed(_)) => Err(PoolError::Closed),
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn stats(&self) -> PoolStats {
        PoolStats {
            done: self.counters.done.load(Ordering::Relaxed),
            failed: self.counters.failed.load(Ordering::Relaxed),
            timeouts: self.counters.timeouts.load(Ordering::Relaxed),
            dropped: self.counters.dropped.load(Ordering::Relaxed),
        }
    }

    /// Close the queue and wait for the workers to finish what was already queued, timed out
    /// jobs included.
    ///
    #[tracing::instrument(skip(self))]
    pub async fn shutdown(&self) -> PoolStats {
        drop(self.tx.lock().unwrap_or_else(PoisonError::into_inner).take());

        let workers: Vec<_> = self
            .workers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain(..)
            .collect();
        for w in workers {
            if let Err(e) = w.await {
                error!("worker died: {e}");
            }
        }
        let stats = self.stats();
        debug!("pool stopped: {stats}");
        stats
    }
}

async fn worker(
    id: usize,
    rx: Arc<tokio::sync::Mutex<mpsc::Receiver<Job>>>,
    counters: Arc<Counters>,
    timeout: Duration,
) {
    trace!("worker {id} up");

    // One permit, held by the running handler until it returns.
    //
    let slot = Arc::new(Semaphore::new(1));
    loop {
        let Ok(permit) = Arc::clone(&slot).acquire_owned().await else {
            break;
        };

        // Only hold the receiver while waiting, not while running the job.
        //
        let job = rx.lock().await.recv().await;
        let Some(job) = job else {
            break;
        };

        let Job { name, work } = job;
        trace!("worker {id} running {name}");
        let task = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            work()
        });
        match tokio::time::timeout(timeout, task).await {
            Ok(Ok(Ok(()))) => {
                counters.done.fetch_add(1, Ordering::Relaxed);
            }
            Ok(Ok(Err(e))) => {
                warn!("job {name} failed: {e}");
                counters.failed.fetch_add(1, Ordering::Relaxed);
            }
            Ok(Err(e)) => {
                error!("job {name} panicked: {e}");
                counters.failed.fetch_add(1, Ordering::Relaxed);
            }
            Err(_) => {
                warn!("job {name} timed out after {timeout:?}, worker {id} waits for it");
                counters.timeouts.fetch_add(1, Ordering::Relaxed);
            }
        }
    }
    trace!("worker {id} done");
}
