use std::sync::Arc;

use crate::auth::RequestValidator;
use crate::config::Config;
use crate::llm_client::TextGenerator;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Streaming model backend. Default: `VertexClient`; tests inject a fake.
    pub generator: Arc<dyn TextGenerator>,
    /// Access gate checked before any generation.
    pub validator: Arc<dyn RequestValidator>,
}
