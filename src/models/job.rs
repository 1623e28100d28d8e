// src/models/job.rs
//! Backend-owned records mirrored by the client. Jobs and messages are only
//! ever read here; the server creates and mutates them.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum JobStatus {
    Pending,
    Processing,
    Active,
    Error,
}

impl JobStatus {
    /// ACTIVE and ERROR end polling; nothing after them is observed.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Active | JobStatus::Error)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum JobType {
    Video,
    Youtube,
    Text,
}

impl JobType {
    pub fn as_content_type(&self) -> ContentKind {
        match self {
            JobType::Video => ContentKind::Video,
            JobType::Youtube => ContentKind::Youtube,
            JobType::Text => ContentKind::Text,
        }
    }
}

/// The discriminant of what the user handed over: a file, a link or plain text.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Video,
    Youtube,
    Text,
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ContentKind::Video => "video",
            ContentKind::Youtube => "youtube",
            ContentKind::Text => "text",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Sender {
    #[serde(rename = "USER", alias = "user")]
    User,
    #[serde(rename = "AI", alias = "ai")]
    Ai,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(deserialize_with = "string_or_number")]
    pub job_id: String,
    pub sender: Sender,
    pub content: String,
    #[serde(deserialize_with = "utc_timestamp")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Job {
    pub id: String,
    pub user_id: i64,
    pub title: String,
    pub prompt: String,
    pub status: JobStatus,
    pub job_type: JobType,
    #[serde(default)]
    pub current_agent: Option<String>,
    #[serde(default)]
    pub gemini_file_id: Option<String>,
    #[serde(default)]
    pub source_url: Option<String>,
    #[serde(deserialize_with = "utc_timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(deserialize_with = "utc_timestamp")]
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub messages: Option<Vec<Message>>,
}

// The backend has emitted message ids both as integers and as UUID strings.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Int(i64),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(s) => s,
        Raw::Int(n) => n.to_string(),
    })
}

// Timestamps are stored as naive UTC server-side and arrive without an offset.
fn utc_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    if let Ok(parsed) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(serde::de::Error::custom)
}
