use std::sync::Arc;

use crate::config::Config;
use crate::render::CardRenderer;
use crate::tagline::service::{TaglineGenerator, TaglineService};
use crate::wizard::session::SessionStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// In-process generator backing `POST /api/generate-tagline`.
    pub generator: Arc<TaglineGenerator>,
    /// What the wizard calls when leaving the gradient step. The local
    /// generator by default, or `HttpTaglineClient` when a service URL is set.
    pub tagline_service: Arc<dyn TaglineService>,
    pub sessions: Arc<SessionStore>,
    pub renderer: CardRenderer,
}

#[cfg(test)]
impl AppState {
    pub fn for_tests(config: Config, rng: rand::rngs::StdRng) -> Self {
        let generator = Arc::new(TaglineGenerator::with_rng(rng));
        let renderer = CardRenderer::new(config.export_scale).unwrap_or_default();
        let sessions = Arc::new(SessionStore::new(config.session_idle_ttl()));
        AppState {
            config,
            tagline_service: generator.clone(),
            generator,
            sessions,
            renderer,
        }
    }
}
