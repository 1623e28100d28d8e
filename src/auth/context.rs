// src/auth/context.rs
//! Process-wide authentication state, built once at startup and passed to
//! whatever needs to know who is signed in.

use super::jwt::decode_unverified;
use super::token_store::SharedTokenStore;
use crate::error::{ClientError, ClientResult};
use crate::input::validation::validate_signup;
use crate::models::auth::{SignupForm, Token, User, UserCreate, UserLogin};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Remote authentication operations. `AuthService` talks HTTP; tests plug in fakes.
#[async_trait]
pub trait AuthApi: Send + Sync {
    async fn register_user(&self, user: &UserCreate) -> ClientResult<User>;
    async fn login_user(&self, credentials: &UserLogin) -> ClientResult<Token>;
    async fn google_login(&self, id_token: &str) -> ClientResult<Token>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub email: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AuthState {
    /// Stored token not inspected yet
    Loading,
    Authenticated(Session),
    Anonymous,
}

pub struct AuthContext<A: AuthApi> {
    api: A,
    store: SharedTokenStore,
    state: AuthState,
    google_enabled: bool,
}

impl<A: AuthApi> AuthContext<A> {
    pub fn new(api: A, store: SharedTokenStore) -> Self {
        Self {
            api,
            store,
            state: AuthState::Loading,
            google_enabled: true,
        }
    }

    pub fn with_google_sign_in(mut self, enabled: bool) -> Self {
        self.google_enabled = enabled;
        self
    }

    pub fn state(&self) -> &AuthState {
        &self.state
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.state, AuthState::Loading)
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self.state, AuthState::Authenticated(_))
    }

    pub fn session(&self) -> Option<&Session> {
        match &self.state {
            AuthState::Authenticated(session) => Some(session),
            _ => None,
        }
    }

    pub fn user_email(&self) -> Option<&str> {
        self.session().map(|s| s.email.as_str())
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// Resolve `Loading` from whatever token is persisted.
    pub fn initialize(&mut self) -> &AuthState {
        self.initialize_at(Utc::now())
    }

    /// Same as `initialize`, evaluating expiry against `now`.
    pub fn initialize_at(&mut self, now: DateTime<Utc>) -> &AuthState {
        let token = match self.store.load() {
            Ok(token) => token,
            Err(e) => {
                tracing::warn!("Failed to read stored access token: {}", e);
                None
            }
        };

        self.state = match token {
            None => AuthState::Anonymous,
            Some(token) => match session_from_token(&token) {
                Ok(session) if session.expires_at > now => {
                    tracing::info!(email = %session.email, "🔐 Restored session from stored token");
                    AuthState::Authenticated(session)
                }
                Ok(session) => {
                    tracing::info!(email = %session.email, "Stored token expired, signing out");
                    self.discard_token();
                    AuthState::Anonymous
                }
                Err(e) => {
                    tracing::warn!("Error decoding stored token: {}", e);
                    self.discard_token();
                    AuthState::Anonymous
                }
            },
        };
        &self.state
    }

    pub async fn login(&mut self, credentials: &UserLogin) -> ClientResult<Session> {
        let token = self.api.login_user(credentials).await?;
        self.adopt_token(&token)
    }

    pub async fn google_login(&mut self, id_token: &str) -> ClientResult<Session> {
        if !self.google_enabled {
            return Err(ClientError::GoogleSignInDisabled);
        }
        let token = self.api.google_login(id_token).await?;
        self.adopt_token(&token)
    }

    /// Create an account. Does not sign in; the caller logs in separately.
    pub async fn register(&self, user: &UserCreate) -> ClientResult<User> {
        let created = self.api.register_user(user).await?;
        tracing::info!(email = %created.email, "👤 Registered new account");
        Ok(created)
    }

    /// Validate a typed signup form, then register it. Invalid forms never reach the network.
    pub async fn register_form(&self, form: SignupForm) -> ClientResult<User> {
        validate_signup(&form)?;
        self.register(&form.into_user_create()).await
    }

    pub fn logout(&mut self) -> ClientResult<()> {
        let cleared = self.store.clear();
        self.state = AuthState::Anonymous;
        tracing::info!("👋 Signed out");
        cleared
    }

    /// A protected call came back 401: the stored session is stale.
    pub fn handle_unauthorized(&mut self) {
        if self.is_authenticated() {
            tracing::warn!("Backend rejected the stored token, clearing session");
        }
        self.discard_token();
        self.state = AuthState::Anonymous;
    }

    fn adopt_token(&mut self, token: &Token) -> ClientResult<Session> {
        let session = match session_from_token(&token.access_token) {
            Ok(session) => session,
            Err(e) => {
                tracing::error!("Backend issued a token that cannot be decoded: {}", e);
                return Err(e);
            }
        };
        self.store.save(&token.access_token)?;
        tracing::info!(email = %session.email, "🔐 Signed in");
        self.state = AuthState::Authenticated(session.clone());
        Ok(session)
    }

    fn discard_token(&self) {
        if let Err(e) = self.store.clear() {
            tracing::warn!("Failed to clear stored access token: {}", e);
        }
    }
}

fn session_from_token(token: &str) -> ClientResult<Session> {
    let claims = decode_unverified(token)?;
    let expires_at = claims
        .expires_at()
        .ok_or_else(|| ClientError::Token(format!("exp {} is out of range", claims.exp)))?;
    Ok(Session {
        email: claims.sub,
        expires_at,
    })
}
