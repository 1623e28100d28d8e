// src/cli/render.rs
//! Plain-text rendering of workflow state for the terminal.

use crate::history::insight_count;
use crate::models::job::{Job, Sender};
use crate::workflow::state::{ProcessingJob, WorkflowState};
use crate::workflow::transcript::{ChatEntry, Transcript};
use chrono::{DateTime, Local, Utc};

pub const TYPING_INDICATOR: &str = "AI is analyzing...";
const BAR_WIDTH: usize = 30;

/// Local wall-clock time, hours and minutes.
pub fn format_time(timestamp: DateTime<Utc>) -> String {
    timestamp.with_timezone(&Local).format("%H:%M").to_string()
}

pub fn format_date(timestamp: DateTime<Utc>) -> String {
    timestamp.with_timezone(&Local).format("%Y-%m-%d").to_string()
}

pub fn sender_label(sender: Sender) -> &'static str {
    match sender {
        Sender::User => "You",
        Sender::Ai => "AI",
    }
}

pub fn render_entry(entry: &ChatEntry) -> String {
    format!(
        "[{}] {}: {}",
        format_time(entry.timestamp),
        sender_label(entry.sender),
        entry.content
    )
}

pub fn render_transcript(transcript: &Transcript) -> String {
    transcript
        .entries()
        .iter()
        .map(render_entry)
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn progress_bar(percent: f64) -> String {
    let percent = percent.clamp(0.0, 100.0);
    let filled = ((percent / 100.0) * BAR_WIDTH as f64).round() as usize;
    format!(
        "[{}{}] {:>3}%",
        "#".repeat(filled),
        "-".repeat(BAR_WIDTH - filled),
        percent.round() as u8
    )
}

pub fn processing_line(job: &ProcessingJob) -> String {
    let status = job.last_status.map(|s| s.as_str()).unwrap_or("UPLOADING");
    match job.progress {
        Some(progress) => format!("Status: {} {}", status, progress_bar(progress)),
        None => format!("Status: {}", status),
    }
}

/// One line summary of a state change, `None` for states the caller renders itself.
pub fn describe_state(state: &WorkflowState) -> Option<String> {
    match state {
        WorkflowState::Idle => None,
        WorkflowState::Submitting { kind } => Some(format!("Submitting {}...", kind)),
        WorkflowState::Processing(job) => Some(processing_line(job)),
        WorkflowState::Chatting(_) => Some(TYPING_INDICATOR.to_string()),
        WorkflowState::Active(_) => None,
        WorkflowState::Error { message, .. } => Some(format!("Processing Failed: {}", message)),
    }
}

pub fn job_row(job: &Job) -> String {
    let mut row = format!(
        "{}  {}  {:<10}  {:<7}  {}",
        job.id,
        format_date(job.created_at),
        format!("{:?}", job.status).to_uppercase(),
        job.job_type.as_content_type().to_string(),
        job.title
    );
    let insights = insight_count(job);
    if insights > 0 {
        row.push_str(&format!("  ({} insights)", insights));
    }
    row
}

pub fn render_jobs(jobs: &[Job]) -> String {
    if jobs.is_empty() {
        return "No videos found. Upload your first video to get started.".to_string();
    }
    jobs.iter().map(job_row).collect::<Vec<_>>().join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::chat::RemoteStatus;
    use crate::models::job::{ContentKind, JobStatus, JobType};

    #[test]
    fn progress_bar_is_clamped() {
        assert_eq!(progress_bar(0.0), format!("[{}]   0%", "-".repeat(30)));
        assert_eq!(progress_bar(100.0), format!("[{}] 100%", "#".repeat(30)));
        assert_eq!(progress_bar(250.0), progress_bar(100.0));
        assert!(progress_bar(50.0).starts_with(&format!("[{}-", "#".repeat(15))));
    }

    #[test]
    fn processing_defaults_to_uploading() {
        let mut job = ProcessingJob {
            job_id: "j".into(),
            kind: ContentKind::Video,
            source_url: None,
            original_message: None,
            last_status: None,
            progress: None,
        };
        assert_eq!(processing_line(&job), "Status: UPLOADING");

        job.last_status = Some(RemoteStatus::Processing);
        job.progress = Some(30.0);
        assert!(processing_line(&job).starts_with("Status: PROCESSING ["));
    }

    #[test]
    fn error_state_shows_message() {
        let state = WorkflowState::Error {
            job_id: None,
            message: "Video too long".into(),
        };
        assert_eq!(describe_state(&state).as_deref(), Some("Processing Failed: Video too long"));
    }

    #[test]
    fn job_rows_show_status_and_title() {
        let job = Job {
            id: "job-1".into(),
            user_id: 1,
            title: "clip.mov".into(),
            prompt: "Describe".into(),
            status: JobStatus::Processing,
            job_type: JobType::Video,
            current_agent: None,
            gemini_file_id: None,
            source_url: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            messages: None,
        };
        let row = job_row(&job);
        assert!(row.starts_with("job-1"));
        assert!(row.contains("PROCESSING"));
        assert!(row.contains("video"));
        assert!(row.ends_with("clip.mov"));
    }
}
