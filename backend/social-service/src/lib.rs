/// Social Service Library
///
/// Users, posts, comments, likes and follows over a JSON REST API with JWT
/// authentication.
///
/// # Modules
///
/// - `handlers`: HTTP request handlers and route table
/// - `domain`: entities and read projections
/// - `services`: toggle engine, aggregation, accounts, content writes
/// - `repository`: store traits with PostgreSQL and in-memory implementations
/// - `middleware`: identity extraction and the per-operation access gate
/// - `error`: Error types and handling
/// - `config`: Configuration management
/// - `metrics`: Prometheus collectors and `/metrics`
pub mod config;
pub mod domain;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod repository;
pub mod services;

pub use config::Config;
pub use error::{AppError, Result};

use repository::Store;
use services::{AccountService, Aggregator, ContentService, ToggleEngine};

/// Shared request state, cloned into every worker
#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    pub accounts: AccountService,
    pub content: ContentService,
    pub toggles: ToggleEngine,
    pub views: Aggregator,
}

impl AppState {
    pub fn new(store: Store) -> Self {
        Self {
            accounts: AccountService::new(&store),
            content: ContentService::new(&store),
            toggles: ToggleEngine::new(&store),
            views: Aggregator::new(&store),
            store,
        }
    }
}
