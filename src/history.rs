// src/history.rs
use crate::auth::context::{AuthApi, AuthContext};
use crate::error::{ClientError, ClientResult};
use crate::models::job::{Job, Sender};
use crate::services::unified_api::UnifiedApiService;
use crate::workflow::session::ResumePayload;

/// The signed-in user's past jobs, and the way back into any of them.
#[derive(Clone)]
pub struct HistoryBrowser {
    api: UnifiedApiService,
}

impl HistoryBrowser {
    pub fn new(api: UnifiedApiService) -> Self {
        Self { api }
    }

    /// Newest first. Signed-out callers get `NotAuthenticated` and no request is made.
    pub async fn list<A: AuthApi>(&self, auth: &AuthContext<A>) -> ClientResult<Vec<Job>> {
        if !auth.is_authenticated() {
            tracing::debug!("History requested while signed out");
            return Err(ClientError::NotAuthenticated);
        }
        let mut jobs = self.api.history().await?;
        sort_newest_first(&mut jobs);
        Ok(jobs)
    }

    /// Jobs whose title contains `query`, ignoring case, newest first.
    pub async fn search<A: AuthApi>(&self, auth: &AuthContext<A>, query: &str) -> ClientResult<Vec<Job>> {
        let jobs = self.list(auth).await?;
        Ok(filter_by_title(jobs, query))
    }

    /// Look a single job up by id in the user's history.
    pub async fn find<A: AuthApi>(&self, auth: &AuthContext<A>, job_id: &str) -> ClientResult<Job> {
        self.list(auth)
            .await?
            .into_iter()
            .find(|job| job.id == job_id)
            .ok_or_else(|| ClientError::Http {
                status: 404,
                message: format!("Job {} not found", job_id),
            })
    }

    pub fn resume_payload(job: &Job) -> ResumePayload {
        ResumePayload {
            content_type: job.job_type.as_content_type(),
            source_url: job.source_url.clone(),
            conversation_id: job.id.clone(),
            original_message: Some(job.prompt.clone()),
        }
    }
}

pub fn filter_by_title(jobs: Vec<Job>, query: &str) -> Vec<Job> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return jobs;
    }
    jobs.into_iter()
        .filter(|job| job.title.to_lowercase().contains(&needle))
        .collect()
}

pub fn sort_newest_first(jobs: &mut [Job]) {
    jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}

/// AI answers recorded for a job, when the listing includes its messages.
pub fn insight_count(job: &Job) -> usize {
    job.messages
        .as_ref()
        .map(|messages| messages.iter().filter(|m| m.sender == Sender::Ai).count())
        .unwrap_or(0)
}
