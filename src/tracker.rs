//! Job status polling.
//!
//! [`JobStatusTracker::track`] is a lazy stream of status changes for one job: `pending`
//! first, then one backend query per interval until the job reaches a terminal state or a
//! poll fails. Either way the stream ends and that job is never queried again.
//! [`JobStatusTracker::watch`] runs the same stream on its own task.

use std::sync::Arc;
use std::time::Duration;

use async_stream::stream;
use chrono::{DateTime, Utc};
use futures_core::stream::Stream;
use futures_util::StreamExt;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use webprint_shared::{BackendError, JobId, JobStatus, PrintBackend, PrintJob};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TrackError {
    #[error("Job {0} is no longer known to the print backend")]
    NotFound(JobId),
    #[error("Status poll for job {job_id} failed: {source}")]
    Poll {
        job_id: JobId,
        #[source]
        source: BackendError,
    },
}

impl TrackError {
    fn from_backend(job_id: JobId, e: BackendError) -> Self {
        match e {
            BackendError::NotFound(_) => TrackError::NotFound(job_id),
            source => TrackError::Poll { job_id, source },
        }
    }
}

/// One observed status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobUpdate {
    pub job_id: JobId,
    pub status: JobStatus,
    pub observed_at: DateTime<Utc>,
}

impl JobUpdate {
    fn now(job_id: JobId, status: JobStatus) -> Self {
        Self {
            job_id,
            status,
            observed_at: Utc::now(),
        }
    }
}

#[derive(Clone)]
pub struct JobStatusTracker {
    backend: Arc<dyn PrintBackend>,
    interval: Duration,
}

impl JobStatusTracker {
    pub fn new(backend: Arc<dyn PrintBackend>, interval: Duration) -> Self {
        Self { backend, interval }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Status changes for `job_id`, starting with `pending`. Unchanged polls are not
    /// repeated. The first backend error is yielded once and ends the stream.
    pub fn track(&self, job_id: JobId) -> impl Stream<Item = Result<JobUpdate, TrackError>> + Send + 'static {
        let backend = self.backend.clone();
        let period = self.interval;
        stream! {
            let mut last = JobStatus::pending();
            yield Ok(JobUpdate::now(job_id, last.clone()));

            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                match backend.get_job_status(job_id).await {
                    Ok(raw) => {
                        let status = JobStatus::from(raw);
                        let terminal = status.is_terminal();
                        if status != last {
                            tracing::debug!(%job_id, state = %status.state, reason = %status.reason, "Job status changed");
                            last = status.clone();
                            yield Ok(JobUpdate::now(job_id, status));
                        }
                        if terminal {
                            tracing::info!(%job_id, state = %last.state, "Job reached terminal state, polling stopped");
                            break;
                        }
                    }
                    Err(e) => {
                        tracing::warn!(%job_id, "Job status poll failed, polling stopped: {}", e);
                        yield Err(TrackError::from_backend(job_id, e));
                        break;
                    }
                }
            }
        }
    }

    /// Polls `job_id` on a dedicated task. Dropping the handle stops the task.
    pub fn watch(&self, job_id: JobId) -> TrackerHandle {
        let (tx, rx) = mpsc::channel(16);
        let updates = self.track(job_id);
        let task = tokio::spawn(async move {
            futures_util::pin_mut!(updates);
            while let Some(update) = updates.next().await {
                if tx.send(update).await.is_err() {
                    tracing::debug!(%job_id, "Tracker consumer detached");
                    break;
                }
            }
        });
        TrackerHandle {
            job_id,
            updates: rx,
            task,
        }
    }
}

/// A running tracker. The poll task is aborted when this is dropped.
#[derive(Debug)]
pub struct TrackerHandle {
    job_id: JobId,
    updates: mpsc::Receiver<Result<JobUpdate, TrackError>>,
    task: JoinHandle<()>,
}

impl TrackerHandle {
    pub fn job_id(&self) -> JobId {
        self.job_id
    }

    /// Next update, or `None` once tracking has ended.
    pub async fn next(&mut self) -> Option<Result<JobUpdate, TrackError>> {
        self.updates.recv().await
    }

    /// Like [`next`](Self::next), also recording a new status on `job`.
    pub async fn next_into(&mut self, job: &mut PrintJob) -> Option<Result<JobUpdate, TrackError>> {
        let update = self.next().await;
        if let Some(Ok(update)) = &update {
            if job.id() == update.job_id {
                job.observe(update.status.clone());
            } else {
                tracing::warn!(job_id = %job.id(), tracked = %update.job_id, "Update for a different job ignored");
            }
        }
        update
    }

    /// Waits for the last status of the job.
    pub async fn finish(mut self) -> Result<JobStatus, TrackError> {
        let mut last = JobStatus::pending();
        while let Some(update) = self.next().await {
            last = update?.status;
        }
        Ok(last)
    }
}

impl Drop for TrackerHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}
