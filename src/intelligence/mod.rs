// Intelligence module - completion transport, prompts and one-shot assistant tasks

pub mod assistant;
pub mod http_provider;
pub mod noop_provider;
pub mod prompts;
pub mod provider;

pub use assistant::{sanitize_name, Assistant};
pub use http_provider::HttpCompletionProvider;
pub use noop_provider::NoOpProvider;
pub use provider::{ChatMessage, CompletionProvider, ImageUrl, Role};

use std::sync::Arc;

use crate::settings::ApiSettings;

/// Create a CompletionProvider with graceful fallback to NoOpProvider
///
/// An empty API key or a client build failure yields NoOpProvider, so every
/// completion call reports a configuration error instead of the app failing
/// to start.
pub fn create_provider(api: &ApiSettings) -> Arc<dyn CompletionProvider> {
    if api.api_key.trim().is_empty() {
        tracing::warn!("Completion: No API key configured, using NoOpProvider");
        return Arc::new(NoOpProvider::new("no API key configured".to_string()));
    }

    match HttpCompletionProvider::new(api) {
        Ok(provider) => {
            tracing::info!("Completion: Provider initialized successfully");
            Arc::new(provider)
        }
        Err(e) => {
            tracing::error!("Completion: Failed to initialize provider: {}", e);
            Arc::new(NoOpProvider::new(e.to_string()))
        }
    }
}
