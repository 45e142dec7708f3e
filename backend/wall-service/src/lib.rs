// Wall Service Library

pub mod config;
pub mod domain;
pub mod error;
pub mod handlers;
pub mod jobs;
pub mod middleware;
pub mod policy;
pub mod security;
pub mod services;
pub mod store;

pub use error::{AppError, Result};

// Re-export commonly used types
pub use domain::{Comment, CommentView, Post, PostView, User, UserSummary};

use std::sync::Arc;

use crate::security::TokenService;
use crate::services::{AccountLifecycle, AuthService, InteractionEngine};
use crate::store::FeedStore;

/// Shared handler state. Cheap to clone, everything inside is behind an Arc.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn FeedStore>,
    pub tokens: Arc<TokenService>,
    pub auth: AuthService,
    pub engine: InteractionEngine,
    pub accounts: AccountLifecycle,
}

impl AppState {
    pub fn new(store: Arc<dyn FeedStore>, tokens: Arc<TokenService>) -> Self {
        Self {
            auth: AuthService::new(store.clone(), tokens.clone()),
            engine: InteractionEngine::new(store.clone()),
            accounts: AccountLifecycle::new(store.clone()),
            store,
            tokens,
        }
    }
}
