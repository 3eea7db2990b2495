use std::sync::Arc;

use shared::MarketStore;

/// Shared by every handler through `axum::extract::State`.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn MarketStore>,
}

impl AppState {
    pub fn new(store: Arc<dyn MarketStore>) -> Self {
        Self { store }
    }
}
