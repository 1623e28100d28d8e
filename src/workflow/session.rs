// src/workflow/session.rs
//! Drives one analysis from submission through follow-up chat.

use super::poller::{PollEvent, PollHandle, Poller, StatusSource};
use super::state::{
    transition, ActiveJob, InvalidTransition, ProcessingJob, WorkflowEvent, WorkflowState, DEFAULT_FAILURE_MESSAGE,
};
use crate::error::{ClientError, ClientResult};
use crate::input::validation::Submission;
use crate::models::chat::{ChatResponse, RemoteStatus, StatusResponse};
use crate::models::job::{ContentKind, Message, Sender};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

pub const CHAT_ERROR_REPLY: &str =
    "Sorry, I encountered an error while processing your request. Please try again.";

/// The backend operations a session needs on top of status polling.
#[async_trait]
pub trait AnalysisBackend: StatusSource {
    async fn submit(&self, submission: &Submission) -> ClientResult<ChatResponse>;
    async fn follow_up(&self, job_id: &str, message: &str) -> ClientResult<ChatResponse>;
    async fn conversation(&self, job_id: &str) -> ClientResult<Vec<Message>>;
}

/// Everything needed to reopen a past job straight into chat.
#[derive(Debug, Clone, PartialEq)]
pub struct ResumePayload {
    pub content_type: ContentKind,
    pub source_url: Option<String>,
    pub conversation_id: String,
    pub original_message: Option<String>,
}

struct Exchange {
    job_id: Option<String>,
    messages: Vec<Message>,
    reply: Option<String>,
}

pub struct AnalysisSession<B: AnalysisBackend + 'static> {
    backend: Arc<B>,
    poll_interval: Duration,
    state: WorkflowState,
    updates: watch::Sender<WorkflowState>,
    poll: Option<PollHandle>,
}

impl<B: AnalysisBackend + 'static> AnalysisSession<B> {
    pub fn new(backend: Arc<B>, poll_interval: Duration) -> Self {
        let (updates, _) = watch::channel(WorkflowState::Idle);
        Self {
            backend,
            poll_interval,
            state: WorkflowState::Idle,
            updates,
            poll: None,
        }
    }

    pub fn state(&self) -> &WorkflowState {
        &self.state
    }

    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }

    /// Receive every state the session moves through.
    pub fn subscribe(&self) -> watch::Receiver<WorkflowState> {
        self.updates.subscribe()
    }

    pub fn is_polling(&self) -> bool {
        self.poll.is_some()
    }

    pub async fn submit(&mut self, submission: Submission) -> ClientResult<()> {
        let kind = submission.kind();
        self.apply(WorkflowEvent::Submit { kind })?;
        tracing::info!(kind = %kind, "📤 Submitting analysis request");

        let submitted_at = Utc::now();
        let response = match self.backend.submit(&submission).await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(kind = %kind, "Submission failed: {}", e);
                self.apply(WorkflowEvent::SubmitFailed)?;
                return Err(e);
            }
        };

        let message = submission.message();
        let source_url = submission.source_url().map(str::to_string);

        match response.job_id() {
            Some(job_id) => {
                let job_id = job_id.to_string();
                tracing::info!(job_id = %job_id, "📋 Job accepted, waiting for processing");
                self.apply(WorkflowEvent::Accepted(ProcessingJob {
                    job_id: job_id.clone(),
                    kind,
                    source_url,
                    original_message: Some(message),
                    last_status: None,
                    progress: None,
                }))?;
                self.start_polling(&job_id);
            }
            None => {
                let mut active = ActiveJob::new(None, kind)
                    .with_source_url(source_url)
                    .with_original_message(Some(message.clone()));
                active.transcript.push_local_at(Sender::User, &message, submitted_at);
                active.transcript.seed_initial(&response.response);
                self.apply(WorkflowEvent::Answered(active))?;
            }
        }
        Ok(())
    }

    /// Poll the job until the backend reports ACTIVE or ERROR.
    ///
    /// A job that fails on the backend is not an `Err`: it lands in
    /// `WorkflowState::Error`. `Err` means polling itself broke.
    pub async fn await_completion(&mut self) -> ClientResult<()> {
        let job = match &self.state {
            WorkflowState::Processing(job) => job.clone(),
            other => {
                return Err(InvalidTransition::NotAllowed {
                    state: other.name(),
                    event: "await_completion",
                }
                .into())
            }
        };

        if self.poll.as_ref().map(|h| h.job_id() != job.job_id).unwrap_or(true) {
            self.start_polling(&job.job_id);
        }

        match self.poll_until_terminal(&job.job_id, true).await {
            Ok(status) if status.status == RemoteStatus::Active => {
                let mut active = ActiveJob::new(Some(job.job_id.clone()), job.kind)
                    .with_source_url(job.source_url.clone())
                    .with_original_message(job.original_message.clone());
                if let Some(response) = status.response.as_deref().filter(|r| !r.trim().is_empty()) {
                    active.transcript.seed_initial(response);
                }
                match self.backend.conversation(&job.job_id).await {
                    Ok(messages) => {
                        active.transcript.merge_server(&messages);
                    }
                    Err(e) => tracing::warn!(job_id = %job.job_id, "Could not load conversation: {}", e),
                }
                self.apply(WorkflowEvent::Completed(active))?;
                tracing::info!(job_id = %job.job_id, "✅ Analysis complete");
                Ok(())
            }
            Ok(status) => {
                let message = status.failure_message().map(str::to_string);
                tracing::error!(
                    job_id = %job.job_id,
                    "❌ Processing failed: {}",
                    message.as_deref().unwrap_or(DEFAULT_FAILURE_MESSAGE)
                );
                self.apply(WorkflowEvent::Failed { message })?;
                Ok(())
            }
            Err(e) => {
                self.apply(WorkflowEvent::Failed {
                    message: Some(e.to_string()),
                })?;
                Err(e)
            }
        }
    }

    /// Send a follow-up. Blank text is ignored. The user's message shows up
    /// right away; on failure an apology is appended and chat stays usable.
    pub async fn send_message(&mut self, text: &str) -> ClientResult<()> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(());
        }

        self.apply(WorkflowEvent::SendMessage)?;
        let (job_id, ai_before) = {
            let job = self.active_mut()?;
            job.transcript.push_local(Sender::User, text);
            (job.job_id.clone(), job.transcript.ai_count())
        };
        self.publish();

        let result = self.exchange(job_id, text).await;

        let job = self.active_mut()?;
        match &result {
            Ok(exchange) => {
                if job.job_id.is_none() {
                    job.job_id = exchange.job_id.clone();
                }
                job.transcript.merge_server(&exchange.messages);
                if job.transcript.ai_count() == ai_before {
                    match &exchange.reply {
                        Some(reply) => {
                            job.transcript.push_local(Sender::Ai, reply);
                        }
                        None => tracing::warn!("Backend finished without a reply"),
                    }
                }
            }
            Err(e) => {
                tracing::error!("Follow-up failed: {}", e);
                job.transcript.push_notice(CHAT_ERROR_REPLY);
            }
        }

        self.apply(WorkflowEvent::ReplyFinished)?;
        result.map(|_| ())
    }

    /// Reopen an existing job directly in chat, skipping submission and processing.
    pub async fn resume(&mut self, payload: ResumePayload) -> ClientResult<()> {
        self.stop_polling();
        tracing::info!(job_id = %payload.conversation_id, "📂 Resuming conversation");

        let mut active = ActiveJob::new(Some(payload.conversation_id.clone()), payload.content_type)
            .with_source_url(payload.source_url)
            .with_original_message(payload.original_message);

        let loaded = self.backend.conversation(&payload.conversation_id).await;
        let result = match loaded {
            Ok(messages) => {
                active.transcript.merge_server(&messages);
                Ok(())
            }
            Err(e) => {
                tracing::warn!(job_id = %payload.conversation_id, "Could not load conversation: {}", e);
                Err(e)
            }
        };

        self.apply(WorkflowEvent::Resumed(active))?;
        result
    }

    pub fn reset(&mut self) {
        self.stop_polling();
        if let Err(e) = self.apply(WorkflowEvent::Reset) {
            tracing::warn!("Reset rejected: {}", e);
        }
    }

    async fn exchange(&mut self, job_id: Option<String>, text: &str) -> ClientResult<Exchange> {
        let target = match job_id {
            Some(job_id) => {
                let response = self.backend.follow_up(&job_id, text).await?;
                response.job_id().map(str::to_string).unwrap_or(job_id)
            }
            None => {
                // Nothing to continue yet: the text starts a new job
                let submission = Submission::Text {
                    content: text.to_string(),
                };
                let response = self.backend.submit(&submission).await?;
                match response.job_id() {
                    Some(job_id) => job_id.to_string(),
                    None => {
                        return Ok(Exchange {
                            job_id: None,
                            messages: Vec::new(),
                            reply: Some(response.response),
                        })
                    }
                }
            }
        };

        self.start_polling(&target);
        let status = self.poll_until_terminal(&target, false).await?;
        if status.status == RemoteStatus::Error {
            let message = status.failure_message().unwrap_or(DEFAULT_FAILURE_MESSAGE);
            return Err(ClientError::JobFailed(message.to_string()));
        }

        let messages = match self.backend.conversation(&target).await {
            Ok(messages) => messages,
            Err(e) => {
                tracing::warn!(job_id = %target, "Could not refresh conversation: {}", e);
                Vec::new()
            }
        };

        Ok(Exchange {
            job_id: Some(target),
            messages,
            reply: status.response.filter(|r| !r.trim().is_empty()),
        })
    }

    async fn poll_until_terminal(&mut self, job_id: &str, observe: bool) -> ClientResult<StatusResponse> {
        loop {
            let event = match self.poll.as_mut() {
                Some(handle) => handle.next_event().await,
                None => None,
            };
            let Some(event) = event else {
                self.poll = None;
                return Err(ClientError::PollingStopped);
            };

            if event.job_id() != job_id {
                tracing::debug!(expected = %job_id, got = %event.job_id(), "Ignoring stale poll event");
                continue;
            }

            match event {
                PollEvent::Status { status, .. } if status.status.is_terminal() => {
                    self.poll = None;
                    return Ok(status);
                }
                PollEvent::Status { job_id, status } => {
                    if observe {
                        self.apply(WorkflowEvent::StatusObserved {
                            job_id,
                            status: status.status,
                            progress: status.progress,
                        })?;
                    }
                }
                PollEvent::Failed { error, .. } => {
                    self.poll = None;
                    return Err(error);
                }
            }
        }
    }

    fn start_polling(&mut self, job_id: &str) {
        let source: Arc<dyn StatusSource> = self.backend.clone();
        // Replacing the handle cancels whatever was polling before
        self.poll = Some(Poller::spawn(source, job_id, self.poll_interval));
    }

    fn stop_polling(&mut self) {
        if let Some(handle) = self.poll.take() {
            tracing::debug!(job_id = %handle.job_id(), "Cancelling status polling");
            handle.cancel();
        }
    }

    fn active_mut(&mut self) -> ClientResult<&mut ActiveJob> {
        let state = self.state.name();
        self.state.active_job_mut().ok_or_else(|| {
            ClientError::InvalidState(InvalidTransition::NotAllowed {
                state,
                event: "chat",
            })
        })
    }

    fn apply(&mut self, event: WorkflowEvent) -> ClientResult<()> {
        let event_name = event.name();
        let from = self.state.name();
        let next = transition(self.state.clone(), event)?;
        tracing::debug!(from, to = next.name(), event = event_name, "Workflow transition");
        self.state = next;
        self.publish();
        Ok(())
    }

    fn publish(&self) {
        self.updates.send_replace(self.state.clone());
    }
}
