// src/models/chat.rs
use serde::{Deserialize, Serialize};

/// Reply to `POST /api/chat` and `POST /api/chat/{job_id}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ChatResponse {
    pub response: String,
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub video_url: Option<String>,
    #[serde(default)]
    pub file_id: Option<String>,
    #[serde(default)]
    pub conversation_id: Option<String>,
}

impl ChatResponse {
    /// The id to poll: the conversation if the backend created a job, else the file.
    pub fn job_id(&self) -> Option<&str> {
        self.conversation_id
            .as_deref()
            .or(self.file_id.as_deref())
            .filter(|id| !id.is_empty())
    }
}

/// Status strings reported by `/api/status/{id}` and the legacy `/status/{id}`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum RemoteStatus {
    Uploading,
    Pending,
    Processing,
    Active,
    Error,
    #[serde(other)]
    Unknown,
}

impl RemoteStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RemoteStatus::Active | RemoteStatus::Error)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RemoteStatus::Uploading => "UPLOADING",
            RemoteStatus::Pending => "PENDING",
            RemoteStatus::Processing => "PROCESSING",
            RemoteStatus::Active => "ACTIVE",
            RemoteStatus::Error => "ERROR",
            RemoteStatus::Unknown => "UNKNOWN",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StatusResponse {
    pub file_id: String,
    pub status: RemoteStatus,
    #[serde(default)]
    pub progress: Option<f64>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub response: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl StatusResponse {
    /// Server-supplied failure text, verbatim when present.
    pub fn failure_message(&self) -> Option<&str> {
        let non_blank = |m: &&str| !m.trim().is_empty();
        self.message
            .as_deref()
            .filter(non_blank)
            .or_else(|| self.error.as_deref().filter(non_blank))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UploadResponse {
    pub file_id: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateRequest {
    pub file_id: String,
    pub prompt: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GenerateResponse {
    pub response: String,
    #[serde(default)]
    pub timestamp: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YoutubeAnalyzeRequest {
    pub youtube_url: String,
    pub prompt: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct YoutubeAnalyzeResponse {
    pub response: String,
}
