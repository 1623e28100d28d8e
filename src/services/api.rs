// src/services/api.rs
//! Legacy single-shot endpoints: upload a file, poll it, ask one question.

use super::http::{encode_path_id, file_part, parse_json, HttpCore};
use crate::auth::token_store::SharedTokenStore;
use crate::error::{ClientResult, ValidationError};
use crate::input::validation::{is_video_mime, sniff_video_mime};
use crate::models::chat::{
    GenerateRequest, GenerateResponse, StatusResponse, UploadResponse, YoutubeAnalyzeRequest,
    YoutubeAnalyzeResponse,
};
use crate::workflow::poller::StatusSource;
use async_trait::async_trait;
use reqwest::multipart::Form;
use std::path::Path;

#[derive(Clone)]
pub struct ApiService {
    http: HttpCore,
}

impl ApiService {
    pub fn new(base_url: &str, tokens: SharedTokenStore) -> Self {
        Self {
            http: HttpCore::new(base_url, tokens),
        }
    }

    /// Upload a video as multipart field `file`. Non-video files are rejected
    /// before anything is sent.
    pub async fn upload_video(&self, path: &Path) -> ClientResult<UploadResponse> {
        let mime = sniff_video_mime(path)?;
        if !is_video_mime(&mime) {
            tracing::warn!(file = %path.display(), mime = %mime, "Refusing to upload a non-video file");
            return Err(ValidationError::NotAVideo(mime).into());
        }
        tracing::info!(file = %path.display(), mime = %mime, "📤 Uploading video");

        let form = Form::new().part("file", file_part(path, &mime).await?);
        let response = self.http.post("/upload").multipart(form).send().await?;
        let uploaded: UploadResponse = parse_json(response, "Upload").await?;

        tracing::info!(file_id = %uploaded.file_id, "✅ Upload accepted");
        Ok(uploaded)
    }

    pub async fn status(&self, file_id: &str) -> ClientResult<StatusResponse> {
        let path = format!("/status/{}", encode_path_id(file_id));
        let response = self.http.get(&path).send().await?;
        parse_json(response, "Status check").await
    }

    pub async fn generate_response(&self, request: &GenerateRequest) -> ClientResult<GenerateResponse> {
        tracing::debug!(file_id = %request.file_id, "POST /generate");
        let response = self.http.post("/generate").json(request).send().await?;
        parse_json(response, "Generate").await
    }

    pub async fn analyze_youtube(&self, youtube_url: &str, prompt: &str) -> ClientResult<YoutubeAnalyzeResponse> {
        tracing::info!(url = %youtube_url, "🎬 Analyzing YouTube video");
        let body = YoutubeAnalyzeRequest {
            youtube_url: youtube_url.to_string(),
            prompt: prompt.to_string(),
        };
        let response = self.http.post("/youtube/analyze").json(&body).send().await?;
        parse_json(response, "YouTube analysis").await
    }
}

#[async_trait]
impl StatusSource for ApiService {
    async fn fetch_status(&self, job_id: &str) -> ClientResult<StatusResponse> {
        self.status(job_id).await
    }
}
