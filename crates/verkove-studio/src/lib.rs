pub mod chat;
pub mod engine;
pub mod export;
pub mod fallback;
pub mod image_ref;
pub mod iteration;
pub mod mock;
mod parse;
mod prompt;
pub mod provider;

pub use chat::{ChatContext, ChatEngine, ChatRequest};
pub use engine::GeminiProvider;
pub use export::{DownloadLinks, ExportResult, ManufacturingExport};
pub use iteration::{GenerateRequest, GenerationOutcome, GenerationSource, IterationEngine};
pub use provider::{ImageInput, ProviderClient, ProviderError, ProviderReply, RetryPolicy};

use thiserror::Error;
use verkove_core::StoreError;

#[derive(Debug, Error)]
pub enum StudioError {
    #[error("{0}")]
    InvalidInput(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl StudioError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StudioError::Store(e) if e.is_not_found())
    }
}

/// Build the configured provider, or `None` when no credential is set. A
/// missing provider is not an error: the engines fall back instead.
pub fn build_provider(
    settings: &verkove_core::AiSettings,
) -> Option<std::sync::Arc<dyn ProviderClient>> {
    if !verkove_core::ai_configured(settings) {
        tracing::warn!(
            provider = %settings.provider,
            "AI provider not configured; using preview fallback"
        );
        return None;
    }
    tracing::info!(
        provider = %settings.provider,
        model = %settings.model,
        image_model = %settings.image_model,
        "AI provider configured"
    );
    let provider = GeminiProvider::new(settings.clone());
    let policy = RetryPolicy::from_settings(settings);
    Some(std::sync::Arc::new(provider::Retrying::new(provider, policy)))
}
