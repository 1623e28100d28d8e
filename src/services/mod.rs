// src/services/mod.rs
pub mod api;
pub mod auth_service;
pub mod http;
pub mod unified_api;

pub use api::ApiService;
pub use auth_service::AuthService;
pub use unified_api::UnifiedApiService;
