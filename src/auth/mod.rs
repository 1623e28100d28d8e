// src/auth/mod.rs
pub mod context;
pub mod jwt;
pub mod token_store;

pub use context::{AuthApi, AuthContext, AuthState, Session};
pub use token_store::{FileTokenStore, MemoryTokenStore, SharedTokenStore, TokenStore};
