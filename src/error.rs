// src/error.rs
use crate::workflow::state::InvalidTransition;
use thiserror::Error;

/// Client-side shape checks that block a request before it reaches the network.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please select a valid video file ({0} is not a video)")]
    NotAVideo(String),
    #[error("Please enter a valid YouTube URL.")]
    InvalidYoutubeUrl,
    #[error("Please upload a video file, enter a YouTube URL or type a message.")]
    EmptyInput,
    #[error("Passwords do not match")]
    PasswordMismatch,
    #[error("{field} must be between 1 and {max} characters")]
    InvalidName { field: &'static str, max: usize },
    #[error("Password must be at least {min} characters")]
    WeakPassword { min: usize },
    #[error("Please enter a valid email address")]
    InvalidEmail,
}

#[derive(Error, Debug)]
pub enum ClientError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("{message}")]
    Http { status: u16, message: String },
    #[error("Not authorized: {0}")]
    Unauthorized(String),
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("Invalid token: {0}")]
    Token(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("You need to sign in first")]
    NotAuthenticated,
    #[error("Google sign-in is disabled (GOOGLE_CLIENT_ID is not set)")]
    GoogleSignInDisabled,
    #[error(transparent)]
    InvalidState(#[from] InvalidTransition),
    #[error("{0}")]
    JobFailed(String),
    #[error("Status polling stopped before the job finished")]
    PollingStopped,
}

impl ClientError {
    /// True for responses that mean the stored session is no longer accepted.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ClientError::Unauthorized(_))
    }
}

pub type ClientResult<T> = Result<T, ClientError>;
