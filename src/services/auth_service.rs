// src/services/auth_service.rs
use super::http::{parse_json, HttpCore};
use crate::auth::context::AuthApi;
use crate::auth::token_store::SharedTokenStore;
use crate::error::ClientResult;
use crate::models::auth::{GoogleLoginRequest, Token, User, UserCreate, UserLogin};
use async_trait::async_trait;

/// Client for `/auth/*`. Stateless apart from the shared token store it
/// reads when building requests; persisting new tokens is `AuthContext`'s job.
#[derive(Clone)]
pub struct AuthService {
    http: HttpCore,
}

impl AuthService {
    pub fn new(base_url: &str, tokens: SharedTokenStore) -> Self {
        Self {
            http: HttpCore::new(base_url, tokens),
        }
    }
}

#[async_trait]
impl AuthApi for AuthService {
    async fn register_user(&self, user: &UserCreate) -> ClientResult<User> {
        tracing::debug!(email = %user.email, "POST /auth/register");
        let response = self.http.post("/auth/register").json(user).send().await?;
        parse_json(response, "Registration").await
    }

    async fn login_user(&self, credentials: &UserLogin) -> ClientResult<Token> {
        tracing::debug!(email = %credentials.email, "POST /auth/login");
        // OAuth2 password form: the email travels as `username`
        let form = [
            ("username", credentials.email.as_str()),
            ("password", credentials.password.as_str()),
        ];
        let response = self.http.post("/auth/login").form(&form).send().await?;
        parse_json(response, "Login").await
    }

    async fn google_login(&self, id_token: &str) -> ClientResult<Token> {
        tracing::debug!("POST /auth/google-login");
        let body = GoogleLoginRequest {
            id_token_str: id_token.to_string(),
        };
        let response = self.http.post("/auth/google-login").json(&body).send().await?;
        parse_json(response, "Google login").await
    }
}
