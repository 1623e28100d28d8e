// Workflow module - submission, processing and follow-up chat for one job
pub mod poller;
pub mod session;
pub mod state;
pub mod transcript;

pub use poller::{PollEvent, PollHandle, Poller, StatusSource};
pub use session::{AnalysisBackend, AnalysisSession, ResumePayload, CHAT_ERROR_REPLY};
pub use state::{transition, ActiveJob, InvalidTransition, ProcessingJob, WorkflowEvent, WorkflowState};
pub use transcript::{ChatEntry, Transcript};
