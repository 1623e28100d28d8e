// src/services/unified_api.rs
use super::http::{encode_path_id, file_part, parse_json, HttpCore};
use crate::auth::token_store::SharedTokenStore;
use crate::error::ClientResult;
use crate::input::validation::Submission;
use crate::models::chat::{ChatResponse, StatusResponse};
use crate::models::job::{Job, Message};
use crate::workflow::poller::StatusSource;
use crate::workflow::session::AnalysisBackend;
use async_trait::async_trait;
use reqwest::multipart::Form;

/// Client for the `/api/*` chat endpoints: one submission creates a job,
/// follow-ups continue it.
#[derive(Clone)]
pub struct UnifiedApiService {
    http: HttpCore,
}

impl UnifiedApiService {
    pub fn new(base_url: &str, tokens: SharedTokenStore) -> Self {
        Self {
            http: HttpCore::new(base_url, tokens),
        }
    }

    /// `POST /api/chat` with multipart `message` and, for video submissions, `file`.
    pub async fn start_chat(&self, submission: &Submission) -> ClientResult<ChatResponse> {
        let mut form = Form::new().text("message", submission.message());
        if let Submission::Video { file, mime, .. } = submission {
            form = form.part("file", file_part(file, mime).await?);
        }

        tracing::info!(kind = %submission.kind(), "POST /api/chat");
        let response = self.http.post("/api/chat").multipart(form).send().await?;
        parse_json(response, "Chat").await
    }

    pub async fn continue_chat(&self, job_id: &str, message: &str) -> ClientResult<ChatResponse> {
        let form = Form::new().text("message", message.to_string());
        let path = format!("/api/chat/{}", encode_path_id(job_id));

        tracing::info!(job_id = %job_id, "💬 Sending follow-up");
        let response = self.http.post(&path).multipart(form).send().await?;
        parse_json(response, "Chat").await
    }

    pub async fn status(&self, file_id: &str) -> ClientResult<StatusResponse> {
        let path = format!("/api/status/{}", encode_path_id(file_id));
        let response = self.http.get(&path).send().await?;
        parse_json(response, "Status check").await
    }

    pub async fn history(&self) -> ClientResult<Vec<Job>> {
        let response = self.http.get("/api/history").send().await?;
        let jobs: Vec<Job> = parse_json(response, "History").await?;
        tracing::debug!(count = jobs.len(), "Fetched job history");
        Ok(jobs)
    }

    pub async fn chat_history(&self, job_id: &str) -> ClientResult<Vec<Message>> {
        let path = format!("/api/history/{}", encode_path_id(job_id));
        let response = self.http.get(&path).send().await?;
        parse_json(response, "Chat history").await
    }
}

#[async_trait]
impl StatusSource for UnifiedApiService {
    async fn fetch_status(&self, job_id: &str) -> ClientResult<StatusResponse> {
        self.status(job_id).await
    }
}

#[async_trait]
impl AnalysisBackend for UnifiedApiService {
    async fn submit(&self, submission: &Submission) -> ClientResult<ChatResponse> {
        self.start_chat(submission).await
    }

    async fn follow_up(&self, job_id: &str, message: &str) -> ClientResult<ChatResponse> {
        self.continue_chat(job_id, message).await
    }

    async fn conversation(&self, job_id: &str) -> ClientResult<Vec<Message>> {
        self.chat_history(job_id).await
    }
}
