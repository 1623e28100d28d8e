// WorkflowState - the submit -> process -> chat lifecycle as one tagged union
use super::transcript::Transcript;
use crate::input::validation::{embed_url, extract_video_id};
use crate::models::chat::RemoteStatus;
use crate::models::job::ContentKind;
use thiserror::Error;

pub const DEFAULT_FAILURE_MESSAGE: &str = "Processing failed";

/// A job whose results are on screen and which accepts follow-up messages.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveJob {
    /// Backend job to continue; `None` when the answer came back immediately
    pub job_id: Option<String>,
    pub kind: ContentKind,

    /// YouTube link the job was created from
    pub source_url: Option<String>,

    /// Message that started the job
    pub original_message: Option<String>,

    pub transcript: Transcript,
}

impl ActiveJob {
    pub fn new(job_id: Option<String>, kind: ContentKind) -> Self {
        Self {
            job_id,
            kind,
            source_url: None,
            original_message: None,
            transcript: Transcript::new(),
        }
    }

    pub fn with_source_url(mut self, source_url: Option<String>) -> Self {
        self.source_url = source_url;
        self
    }

    pub fn with_original_message(mut self, message: Option<String>) -> Self {
        self.original_message = message;
        self
    }

    /// Embeddable player URL for YouTube jobs.
    pub fn embed_url(&self) -> Option<String> {
        match self.kind {
            ContentKind::Youtube => self
                .source_url
                .as_deref()
                .and_then(extract_video_id)
                .map(|id| embed_url(&id)),
            _ => None,
        }
    }
}

/// Job accepted by the backend and still being worked on.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessingJob {
    pub job_id: String,
    pub kind: ContentKind,
    pub source_url: Option<String>,
    pub original_message: Option<String>,

    /// Most recent non-terminal status seen while polling
    pub last_status: Option<RemoteStatus>,
    pub progress: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum WorkflowState {
    Idle,
    Submitting { kind: ContentKind },
    Processing(ProcessingJob),
    Active(ActiveJob),
    /// Waiting on a reply to a follow-up; input is disabled
    Chatting(ActiveJob),
    Error { job_id: Option<String>, message: String },
}

impl Default for WorkflowState {
    fn default() -> Self {
        WorkflowState::Idle
    }
}

impl WorkflowState {
    pub fn name(&self) -> &'static str {
        match self {
            WorkflowState::Idle => "idle",
            WorkflowState::Submitting { .. } => "submitting",
            WorkflowState::Processing(_) => "processing",
            WorkflowState::Active(_) => "active",
            WorkflowState::Chatting(_) => "chatting",
            WorkflowState::Error { .. } => "error",
        }
    }

    /// Job id the state is tied to, if any.
    pub fn job_id(&self) -> Option<&str> {
        match self {
            WorkflowState::Processing(job) => Some(&job.job_id),
            WorkflowState::Active(job) | WorkflowState::Chatting(job) => job.job_id.as_deref(),
            WorkflowState::Error { job_id, .. } => job_id.as_deref(),
            WorkflowState::Idle | WorkflowState::Submitting { .. } => None,
        }
    }

    pub fn active_job(&self) -> Option<&ActiveJob> {
        match self {
            WorkflowState::Active(job) | WorkflowState::Chatting(job) => Some(job),
            _ => None,
        }
    }

    pub fn active_job_mut(&mut self) -> Option<&mut ActiveJob> {
        match self {
            WorkflowState::Active(job) | WorkflowState::Chatting(job) => Some(job),
            _ => None,
        }
    }

    pub fn transcript(&self) -> Option<&Transcript> {
        self.active_job().map(|job| &job.transcript)
    }

    pub fn is_busy(&self) -> bool {
        matches!(
            self,
            WorkflowState::Submitting { .. } | WorkflowState::Processing(_) | WorkflowState::Chatting(_)
        )
    }

    pub fn accepts_input(&self) -> bool {
        matches!(self, WorkflowState::Active(_))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum WorkflowEvent {
    Submit { kind: ContentKind },
    /// The creation request failed before a job existed
    SubmitFailed,
    /// Backend accepted the submission and returned a job to poll
    Accepted(ProcessingJob),
    /// Backend answered the submission immediately
    Answered(ActiveJob),
    StatusObserved {
        job_id: String,
        status: RemoteStatus,
        progress: Option<f64>,
    },
    Completed(ActiveJob),
    Failed { message: Option<String> },
    Resumed(ActiveJob),
    SendMessage,
    ReplyFinished,
    Reset,
}

impl WorkflowEvent {
    pub fn name(&self) -> &'static str {
        match self {
            WorkflowEvent::Submit { .. } => "submit",
            WorkflowEvent::SubmitFailed => "submit_failed",
            WorkflowEvent::Accepted(_) => "accepted",
            WorkflowEvent::Answered(_) => "answered",
            WorkflowEvent::StatusObserved { .. } => "status_observed",
            WorkflowEvent::Completed(_) => "completed",
            WorkflowEvent::Failed { .. } => "failed",
            WorkflowEvent::Resumed(_) => "resumed",
            WorkflowEvent::SendMessage => "send_message",
            WorkflowEvent::ReplyFinished => "reply_finished",
            WorkflowEvent::Reset => "reset",
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvalidTransition {
    #[error("cannot handle '{event}' while {state}")]
    NotAllowed {
        state: &'static str,
        event: &'static str,
    },
    #[error("status for job {got} ignored while processing job {expected}")]
    StaleJob { expected: String, got: String },
}

/// Apply `event` to `state`. Events that make no sense in the current state
/// are rejected rather than coerced.
pub fn transition(state: WorkflowState, event: WorkflowEvent) -> Result<WorkflowState, InvalidTransition> {
    use WorkflowEvent as E;
    use WorkflowState as S;

    match (state, event) {
        (_, E::Reset) => Ok(S::Idle),

        (S::Idle, E::Submit { kind }) => Ok(S::Submitting { kind }),
        (S::Submitting { .. }, E::SubmitFailed) => Ok(S::Idle),
        (S::Submitting { .. }, E::Accepted(job)) => Ok(S::Processing(job)),
        (S::Submitting { .. }, E::Answered(job)) => Ok(S::Active(job)),

        (S::Processing(mut job), E::StatusObserved { job_id, status, progress }) => {
            if job.job_id != job_id {
                return Err(InvalidTransition::StaleJob {
                    expected: job.job_id,
                    got: job_id,
                });
            }
            job.last_status = Some(status);
            if progress.is_some() {
                job.progress = progress;
            }
            Ok(S::Processing(job))
        }
        (S::Processing(_), E::Completed(job)) => Ok(S::Active(job)),
        (S::Processing(job), E::Failed { message }) => Ok(S::Error {
            job_id: Some(job.job_id),
            message: failure_text(message),
        }),

        (S::Idle | S::Active(_) | S::Error { .. }, E::Resumed(job)) => Ok(S::Active(job)),

        (S::Active(job), E::SendMessage) => Ok(S::Chatting(job)),
        (S::Chatting(job), E::ReplyFinished) => Ok(S::Active(job)),

        (state, event) => Err(InvalidTransition::NotAllowed {
            state: state.name(),
            event: event.name(),
        }),
    }
}

fn failure_text(message: Option<String>) -> String {
    message
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_FAILURE_MESSAGE.to_string())
}
