// src/workflow/poller.rs
//! Background status polling for one job at a time.

use crate::error::{ClientError, ClientResult};
use crate::models::chat::StatusResponse;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Anything that can report a job's processing status.
#[async_trait]
pub trait StatusSource: Send + Sync {
    async fn fetch_status(&self, job_id: &str) -> ClientResult<StatusResponse>;
}

#[derive(Debug)]
pub enum PollEvent {
    Status { job_id: String, status: StatusResponse },
    /// Fetching failed; the poll loop has stopped
    Failed { job_id: String, error: ClientError },
}

impl PollEvent {
    pub fn job_id(&self) -> &str {
        match self {
            PollEvent::Status { job_id, .. } | PollEvent::Failed { job_id, .. } => job_id,
        }
    }

    /// Whether this is the last event the poller will send.
    pub fn is_final(&self) -> bool {
        match self {
            PollEvent::Status { status, .. } => status.status.is_terminal(),
            PollEvent::Failed { .. } => true,
        }
    }
}

pub struct Poller;

impl Poller {
    /// Start polling `job_id` immediately and then every `interval` until a
    /// terminal status, a fetch error or cancellation. The next wait only
    /// starts once the previous fetch has resolved.
    pub fn spawn(source: Arc<dyn StatusSource>, job_id: impl Into<String>, interval: Duration) -> PollHandle {
        let job_id = job_id.into();
        let cancel = CancellationToken::new();
        let polls = Arc::new(AtomicUsize::new(0));
        let (tx, rx) = mpsc::unbounded_channel();

        let task = tokio::spawn(poll_loop(
            source,
            job_id.clone(),
            interval,
            cancel.clone(),
            polls.clone(),
            tx,
        ));

        tracing::debug!(job_id = %job_id, interval_ms = interval.as_millis() as u64, "🔄 Status polling started");

        PollHandle {
            job_id,
            cancel,
            polls,
            events: rx,
            task,
        }
    }
}

async fn poll_loop(
    source: Arc<dyn StatusSource>,
    job_id: String,
    interval: Duration,
    cancel: CancellationToken,
    polls: Arc<AtomicUsize>,
    tx: mpsc::UnboundedSender<PollEvent>,
) {
    loop {
        let result = tokio::select! {
            _ = cancel.cancelled() => break,
            result = source.fetch_status(&job_id) => result,
        };
        let attempt = polls.fetch_add(1, Ordering::SeqCst) + 1;

        match result {
            Ok(status) => {
                let terminal = status.status.is_terminal();
                tracing::debug!(
                    job_id = %job_id,
                    attempt,
                    status = status.status.as_str(),
                    "Polled job status"
                );
                let event = PollEvent::Status {
                    job_id: job_id.clone(),
                    status,
                };
                if tx.send(event).is_err() || terminal {
                    break;
                }
            }
            Err(error) => {
                tracing::warn!(job_id = %job_id, attempt, "Status poll failed: {}", error);
                let _ = tx.send(PollEvent::Failed {
                    job_id: job_id.clone(),
                    error,
                });
                break;
            }
        }

        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(interval) => {}
        }
    }
    tracing::debug!(job_id = %job_id, "Status polling stopped");
}

/// Owner of a running poll loop. Dropping it cancels the loop.
pub struct PollHandle {
    job_id: String,
    cancel: CancellationToken,
    polls: Arc<AtomicUsize>,
    events: mpsc::UnboundedReceiver<PollEvent>,
    task: JoinHandle<()>,
}

impl PollHandle {
    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    /// Number of status fetches that have completed.
    pub fn poll_count(&self) -> usize {
        self.polls.load(Ordering::SeqCst)
    }

    /// Next event, or `None` once the loop has stopped and everything it
    /// sent has been received.
    pub async fn next_event(&mut self) -> Option<PollEvent> {
        self.events.recv().await
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::chat::RemoteStatus;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    struct Scripted {
        statuses: Mutex<VecDeque<RemoteStatus>>,
    }

    impl Scripted {
        fn new(statuses: &[RemoteStatus]) -> Arc<Self> {
            Arc::new(Self {
                statuses: Mutex::new(statuses.iter().copied().collect()),
            })
        }
    }

    #[async_trait]
    impl StatusSource for Scripted {
        async fn fetch_status(&self, job_id: &str) -> ClientResult<StatusResponse> {
            let next = self.statuses.lock().unwrap().pop_front();
            match next {
                Some(status) => Ok(StatusResponse {
                    file_id: job_id.to_string(),
                    status,
                    progress: None,
                    message: None,
                    response: None,
                    error: None,
                }),
                None => Err(ClientError::Http {
                    status: 500,
                    message: "script exhausted".into(),
                }),
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn stops_at_first_terminal_status() {
        let source = Scripted::new(&[
            RemoteStatus::Pending,
            RemoteStatus::Processing,
            RemoteStatus::Active,
            RemoteStatus::Processing,
        ]);
        let mut handle = Poller::spawn(source, "job-1", Duration::from_millis(2000));

        let mut seen = Vec::new();
        while let Some(event) = handle.next_event().await {
            assert_eq!(event.job_id(), "job-1");
            if let PollEvent::Status { status, .. } = event {
                seen.push(status.status);
            }
        }

        assert_eq!(
            seen,
            vec![RemoteStatus::Pending, RemoteStatus::Processing, RemoteStatus::Active]
        );
        assert_eq!(handle.poll_count(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn fetch_error_ends_polling() {
        let source = Scripted::new(&[RemoteStatus::Pending]);
        let mut handle = Poller::spawn(source, "job-1", Duration::from_millis(10));

        assert!(matches!(handle.next_event().await, Some(PollEvent::Status { .. })));
        let failed = handle.next_event().await.unwrap();
        assert!(failed.is_final());
        assert!(matches!(failed, PollEvent::Failed { .. }));
        assert!(handle.next_event().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_stops_the_loop() {
        let source = Scripted::new(&[RemoteStatus::Pending; 50]);
        let mut handle = Poller::spawn(source, "job-1", Duration::from_secs(60));

        assert!(handle.next_event().await.is_some());
        handle.cancel();
        assert!(handle.next_event().await.is_none());
        assert_eq!(handle.poll_count(), 1);
    }
}
