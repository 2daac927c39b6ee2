pub mod appresult;
pub mod chat;
pub mod config;
pub mod res;

use std::sync::Arc;

use axum::{extract::FromRef, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub use appresult::{AppError, AppResult};
use chat::ChatHub;
use config::Config;

#[derive(Clone, FromRef)]
pub struct AppState {
    pub hub: ChatHub,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(config: Config) -> AppState {
        AppState {
            hub: ChatHub::new(),
            config: Arc::new(config),
        }
    }
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(res::router())
        .merge(chat::router())
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
