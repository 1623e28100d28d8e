#![allow(dead_code)]

use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use scene_speak::models::auth::Claims;
use serde_json::{json, Value};
use wiremock::MockServer;

/// A token the backend could have issued, expiring `valid_for` from now
/// (negative for already expired).
pub fn token_for(email: &str, valid_for: Duration) -> String {
    let claims = Claims {
        sub: email.to_string(),
        exp: (Utc::now() + valid_for).timestamp(),
    };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(b"backend-secret")).unwrap()
}

pub fn status_body(file_id: &str, status: &str) -> Value {
    json!({ "file_id": file_id, "status": status })
}

pub fn message_body(id: i64, job_id: &str, sender: &str, content: &str, created_at: &str) -> Value {
    json!({
        "id": id,
        "job_id": job_id,
        "sender": sender,
        "content": content,
        "created_at": created_at,
    })
}

pub fn job_body(id: &str, title: &str, job_type: &str, created_at: &str) -> Value {
    json!({
        "id": id,
        "user_id": 1,
        "title": title,
        "prompt": "What happens in this video?",
        "status": "ACTIVE",
        "job_type": job_type,
        "source_url": null,
        "created_at": created_at,
        "updated_at": created_at,
    })
}

/// Requests the server saw for `path`.
pub async fn hits(server: &MockServer, path: &str) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|request| request.url.path() == path)
        .count()
}
