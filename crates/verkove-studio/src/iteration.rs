//! Design iteration engine: one prompt in, one `DesignIteration` out.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use verkove_core::{BaseDesign, DesignIteration, EntityStore, ImageStore};

use crate::fallback;
use crate::image_ref::ImageResolver;
use crate::prompt;
use crate::provider::{ProviderClient, ProviderReply};
use crate::StudioError;

pub const SUCCESS_MESSAGE: &str = "Design generated successfully";
pub const PREVIEW_MESSAGE: &str = "Preview design generated (AI generation unavailable)";

/// Body of a generation request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub base_design_id: Option<u64>,
    #[serde(default)]
    pub previous_image: Option<String>,
    #[serde(default)]
    pub project_id: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationSource {
    Provider,
    Fallback,
}

impl GenerationSource {
    pub fn message(self) -> &'static str {
        match self {
            GenerationSource::Provider => SUCCESS_MESSAGE,
            GenerationSource::Fallback => PREVIEW_MESSAGE,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GenerationOutcome {
    pub iteration: DesignIteration,
    pub source: GenerationSource,
}

impl GenerationOutcome {
    pub fn message(&self) -> &'static str {
        self.source.message()
    }
}

pub struct IterationEngine {
    store: Arc<EntityStore>,
    images: Arc<ImageStore>,
    resolver: ImageResolver,
    provider: Option<Arc<dyn ProviderClient>>,
}

impl IterationEngine {
    pub fn new(
        store: Arc<EntityStore>,
        images: Arc<ImageStore>,
        provider: Option<Arc<dyn ProviderClient>>,
        fetch_timeout: Duration,
    ) -> Self {
        let resolver = ImageResolver::new(images.clone(), fetch_timeout);
        Self {
            store,
            images,
            resolver,
            provider,
        }
    }

    /// Generate an iteration without touching any project.
    ///
    /// Only an empty prompt is an error. Every provider problem ends in a
    /// preview iteration built from the fallback catalog.
    pub async fn generate(
        &self,
        prompt: &str,
        base_design_id: Option<u64>,
        previous_image: Option<&str>,
    ) -> Result<GenerationOutcome, StudioError> {
        if prompt.trim().is_empty() {
            return Err(StudioError::InvalidInput("Prompt is required".to_string()));
        }

        let base = base_design_id.and_then(|id| {
            let found = self.store.base_design(id);
            if found.is_none() {
                debug!(base_design_id = id, "base design not found; using generic context");
            }
            found
        });

        let Some(provider) = &self.provider else {
            info!("no AI provider configured; returning preview design");
            return Ok(self.preview(prompt, None));
        };

        let reply = self
            .ask_provider(provider.as_ref(), prompt, base.as_ref(), previous_image)
            .await;

        let Some(reply) = reply else {
            return Ok(self.preview(prompt, None));
        };

        let ProviderReply { text, image } = reply;
        let Some(image) = image else {
            warn!("provider reply carried no image; returning preview design");
            return Ok(self.preview(prompt, text));
        };

        let size = image.bytes.len();
        match self.images.save_async("design", image.bytes, &image.mime).await {
            Ok(image_url) => {
                info!(image_url = %image_url, bytes = size, "design image stored");
                let ai_response = text.unwrap_or_else(|| {
                    format!("Here is your updated design for \"{}\".", prompt.trim())
                });
                Ok(GenerationOutcome {
                    iteration: self.iteration(prompt, image_url, ai_response),
                    source: GenerationSource::Provider,
                })
            }
            Err(e) => {
                warn!(error = %e, "could not store generated image; returning preview design");
                Ok(self.preview(prompt, text))
            }
        }
    }

    /// Generate, then record the iteration on `request.project_id` when it
    /// resolves. An unknown project only skips the recording.
    pub async fn submit(&self, request: GenerateRequest) -> Result<GenerationOutcome, StudioError> {
        let prompt = request.prompt.unwrap_or_default();

        let project_base = request
            .project_id
            .and_then(|id| self.store.project(id))
            .and_then(|p| p.base_design_id);
        let base_design_id = request.base_design_id.or(project_base);

        let outcome = self
            .generate(&prompt, base_design_id, request.previous_image.as_deref())
            .await?;

        if let Some(project_id) = request.project_id {
            match self.store.append_iteration(project_id, outcome.iteration.clone()) {
                Ok(project) => debug!(
                    project_id,
                    iterations = project.design_iterations.len(),
                    "iteration recorded"
                ),
                Err(e) if e.is_not_found() => {
                    warn!(project_id, "project not found; iteration not recorded")
                }
                Err(e) => return Err(e.into()),
            }
        }

        Ok(outcome)
    }

    async fn ask_provider(
        &self,
        provider: &dyn ProviderClient,
        prompt: &str,
        base: Option<&BaseDesign>,
        previous_image: Option<&str>,
    ) -> Option<ProviderReply> {
        let reference = match previous_image.filter(|r| !r.trim().is_empty()) {
            Some(r) => self.resolver.resolve(r).await,
            None => None,
        };
        let directive = prompt::generation_directive(prompt, base, reference.is_some());

        match provider.generate_image(&directive, reference.as_ref()).await {
            Ok(reply) => Some(reply),
            Err(e) => {
                warn!(error = %e, "image generation failed; returning preview design");
                None
            }
        }
    }

    fn preview(&self, prompt: &str, provider_text: Option<String>) -> GenerationOutcome {
        let image_url = fallback::fallback_image(prompt);
        let ai_response = provider_text.unwrap_or_else(|| fallback::preview_response(prompt));
        GenerationOutcome {
            iteration: self.iteration(prompt, image_url, ai_response),
            source: GenerationSource::Fallback,
        }
    }

    fn iteration(&self, prompt: &str, image_url: String, ai_response: String) -> DesignIteration {
        DesignIteration {
            id: self.store.next_record_id(),
            image_url,
            prompt: prompt.to_string(),
            timestamp: Utc::now(),
            ai_response,
        }
    }
}
