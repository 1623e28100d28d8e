// lib.rs - client library for the Scene Speak video analysis backend
pub mod auth;
pub mod cli;
pub mod config;
pub mod error;
pub mod history;
pub mod input;
pub mod models;
pub mod services;
pub mod workflow;

// Re-export commonly used types for convenience
pub use auth::{AuthContext, AuthState, FileTokenStore, MemoryTokenStore, SharedTokenStore, TokenStore};
pub use config::Config;
pub use error::{ClientError, ClientResult, ValidationError};
pub use history::HistoryBrowser;
pub use input::{Submission, UploadSelection};
pub use services::{ApiService, AuthService, UnifiedApiService};
pub use workflow::{AnalysisSession, WorkflowState};
