//! Chat context engine: the design consultant conversation.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use verkove_core::{ChatMessage, CurrentDesignData, DesignProject, EntityStore, ImageStore};

use crate::fallback::CHAT_APOLOGY;
use crate::image_ref::ImageResolver;
use crate::prompt;
use crate::provider::{ProviderClient, ProviderError};
use crate::StudioError;

/// Words that route a message to the image-capable path.
pub const GENERATION_TRIGGERS: [&str; 5] = ["generate", "create", "make", "show me", "design"];

/// What the client knows about its workspace. Unknown fields are rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ChatContext {
    #[serde(default)]
    pub base_design: Option<u64>,
    #[serde(default)]
    pub current_design: Option<CurrentDesignData>,
    #[serde(default)]
    pub selected_sub_designs: Vec<u64>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl ChatContext {
    fn from_project(project: &DesignProject) -> Self {
        Self {
            base_design: project.base_design_id,
            current_design: project.current_design_data.clone(),
            selected_sub_designs: project.selected_sub_designs.iter().copied().collect(),
            notes: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub project_id: Option<u64>,
    #[serde(default)]
    pub context: Option<ChatContext>,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// Case-insensitive substring match against [`GENERATION_TRIGGERS`].
pub fn wants_image(message: &str) -> bool {
    let lower = message.to_lowercase();
    GENERATION_TRIGGERS.iter().any(|t| lower.contains(t))
}

pub struct ChatEngine {
    store: Arc<EntityStore>,
    images: Arc<ImageStore>,
    resolver: ImageResolver,
    provider: Option<Arc<dyn ProviderClient>>,
}

impl ChatEngine {
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

    /// Answer one client message and return the assistant turn.
    ///
    /// When `project_id` resolves, the user turn and the assistant turn are
    /// appended to the project's history in that order.
    pub async fn converse(&self, request: ChatRequest) -> Result<ChatMessage, StudioError> {
        let message = match request.message {
            Some(m) if !m.trim().is_empty() => m,
            _ => return Err(StudioError::InvalidInput("Message is required".to_string())),
        };

        let project = request.project_id.and_then(|id| {
            let found = self.store.project(id);
            if found.is_none() {
                warn!(project_id = id, "project not found; answering without history");
            }
            found
        });

        let user_turn = ChatMessage {
            id: self.store.next_record_id(),
            content: message.clone(),
            is_user: true,
            timestamp: Utc::now(),
            image_url: request.image_url.clone(),
        };

        let context = request
            .context
            .or_else(|| project.as_ref().map(ChatContext::from_project));
        let context_text = context.as_ref().map(|ctx| self.describe(ctx));
        let history = project
            .as_ref()
            .map(|p| p.chat_history.as_slice())
            .unwrap_or_default();
        let directive = prompt::chat_directive(&message, context_text.as_deref(), history);

        let (content, image_url) = self
            .answer(&message, &directive, request.image_url.as_deref())
            .await;

        let assistant_turn = ChatMessage {
            id: self.store.next_record_id(),
            content,
            is_user: false,
            timestamp: Utc::now(),
            image_url,
        };

        if let Some(project) = project {
            match self
                .store
                .append_chat_turns(project.id, user_turn, assistant_turn.clone())
            {
                Ok(updated) => debug!(
                    project_id = updated.id,
                    turns = updated.chat_history.len(),
                    "chat turns recorded"
                ),
                Err(e) if e.is_not_found() => {
                    warn!(project_id = project.id, "project vanished; chat turns not recorded")
                }
                Err(e) => return Err(e.into()),
            }
        }

        Ok(assistant_turn)
    }

    fn describe(&self, ctx: &ChatContext) -> String {
        let base = ctx.base_design.and_then(|id| self.store.base_design(id));
        let enhancements: Vec<_> = ctx
            .selected_sub_designs
            .iter()
            .filter_map(|id| self.store.sub_design(*id))
            .collect();
        prompt::serialize_context(ctx, base.as_ref(), &enhancements)
    }

    /// Returns the assistant content and any generated image reference.
    async fn answer(
        &self,
        message: &str,
        directive: &str,
        reference: Option<&str>,
    ) -> (String, Option<String>) {
        let Some(provider) = &self.provider else {
            info!("no AI provider configured; sending chat fallback");
            return (CHAT_APOLOGY.to_string(), None);
        };

        if !wants_image(message) {
            return self.complete(provider.as_ref(), directive).await;
        }

        let reference = match reference.filter(|r| !r.trim().is_empty()) {
            Some(r) => self.resolver.resolve(r).await,
            None => None,
        };

        let reply = match provider.generate_image(directive, reference.as_ref()).await {
            Ok(reply) if reply.text.is_some() || reply.image.is_some() => reply,
            Ok(_) => {
                debug!("empty image reply; answering as text");
                return self.complete(provider.as_ref(), directive).await;
            }
            Err(ProviderError::Unsupported(what)) => {
                debug!(unsupported = what, "provider cannot generate images; answering as text");
                return self.complete(provider.as_ref(), directive).await;
            }
            Err(e) => {
                warn!(error = %e, "chat image generation failed; sending fallback");
                return (CHAT_APOLOGY.to_string(), None);
            }
        };

        let stored = match reply.image {
            Some(image) => match self.images.save_async("chat", image.bytes, &image.mime).await {
                Ok(url) => {
                    info!(image_url = %url, "chat image stored");
                    Some(url)
                }
                Err(e) => {
                    warn!(error = %e, "could not store chat image");
                    None
                }
            },
            None => None,
        };

        match (reply.text, stored) {
            (Some(text), Some(url)) => (format!("{text}\n\n[Generated image: {url}]"), Some(url)),
            (None, Some(url)) => (
                format!("Here is a design based on your request.\n\n[Generated image: {url}]"),
                Some(url),
            ),
            (Some(text), None) => (text, None),
            (None, None) => (CHAT_APOLOGY.to_string(), None),
        }
    }

    async fn complete(
        &self,
        provider: &dyn ProviderClient,
        directive: &str,
    ) -> (String, Option<String>) {
        match provider.complete(directive).await {
            Ok(text) => (text, None),
            Err(e) => {
                warn!(error = %e, "chat completion failed; sending fallback");
                (CHAT_APOLOGY.to_string(), None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockProvider;
    use crate::provider::{ImageInput, ProviderReply};
    use verkove_core::NewProject;

    struct Fixture {
        _dir: tempfile::TempDir,
        store: Arc<EntityStore>,
        images: Arc<ImageStore>,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = tempfile::tempdir().unwrap();
            let images = Arc::new(ImageStore::new(dir.path()));
            Self {
                _dir: dir,
                store: Arc::new(EntityStore::seeded()),
                images,
            }
        }

        fn engine(&self, provider: Option<MockProvider>) -> ChatEngine {
            ChatEngine::new(
                self.store.clone(),
                self.images.clone(),
                provider.map(|p| Arc::new(p) as Arc<dyn ProviderClient>),
                Duration::from_secs(1),
            )
        }

        fn project(&self) -> DesignProject {
            self.store.create_project(NewProject {
                name: "Engagement".to_string(),
                base_design_id: Some(1),
                ..NewProject::default()
            })
        }
    }

    fn ask(message: &str, project_id: Option<u64>) -> ChatRequest {
        ChatRequest {
            message: Some(message.to_string()),
            project_id,
            ..ChatRequest::default()
        }
    }

    #[test]
    fn trigger_words_match_case_insensitively() {
        assert!(wants_image("Please GENERATE a bracelet"));
        assert!(wants_image("Show me something vintage"));
        assert!(wants_image("redesign the clasp"));
        assert!(!wants_image("What metal suits sensitive skin?"));
    }

    #[test]
    fn context_rejects_unknown_fields() {
        let ok: ChatContext =
            serde_json::from_str(r#"{"baseDesign":1,"currentDesign":null}"#).unwrap();
        assert_eq!(ok.base_design, Some(1));
        assert!(serde_json::from_str::<ChatContext>(r#"{"mood":"happy"}"#).is_err());
    }

    #[tokio::test]
    async fn missing_message_is_rejected_without_provider_call() {
        let fx = Fixture::new();
        let mock = MockProvider::new();
        let engine = fx.engine(Some(mock.clone()));
        let err = engine.converse(ChatRequest::default()).await.unwrap_err();
        assert!(matches!(err, StudioError::InvalidInput(_)));
        let err = engine.converse(ask("  ", None)).await.unwrap_err();
        assert!(matches!(err, StudioError::InvalidInput(_)));
        assert_eq!(mock.complete_calls() + mock.image_calls(), 0);
    }

    #[tokio::test]
    async fn text_questions_use_completion_and_record_two_turns() {
        let fx = Fixture::new();
        let project = fx.project();
        let mock = MockProvider::new();
        mock.push_completion(Ok("Platinum is hypoallergenic.".to_string()));
        let engine = fx.engine(Some(mock.clone()));

        let reply = engine
            .converse(ask("Which metal is best for sensitive skin?", Some(project.id)))
            .await
            .unwrap();
        assert!(!reply.is_user);
        assert_eq!(reply.content, "Platinum is hypoallergenic.");
        assert_eq!(mock.complete_calls(), 1);
        assert_eq!(mock.image_calls(), 0);

        let directive = mock.last_directive().unwrap();
        assert!(directive.contains("expert jewelry design consultant"));
        assert!(directive.contains("Classic Solitaire"));

        let history = fx.store.project(project.id).unwrap().chat_history;
        assert_eq!(history.len(), 2);
        assert!(history[0].is_user);
        assert_eq!(history[0].content, "Which metal is best for sensitive skin?");
        assert_eq!(history[1], reply);
    }

    #[tokio::test]
    async fn history_is_kept_as_prefix_and_fed_back() {
        let fx = Fixture::new();
        let project = fx.project();
        let mock = MockProvider::new();
        mock.push_completion(Ok("first answer".to_string()));
        mock.push_completion(Ok("second answer".to_string()));
        let engine = fx.engine(Some(mock.clone()));

        engine.converse(ask("first question", Some(project.id))).await.unwrap();
        engine.converse(ask("second question", Some(project.id))).await.unwrap();

        let history = fx.store.project(project.id).unwrap().chat_history;
        let contents: Vec<_> = history.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(
            contents,
            ["first question", "first answer", "second question", "second answer"]
        );
        assert!(mock.last_directive().unwrap().contains("Consultant: first answer"));
    }

    #[tokio::test]
    async fn trigger_words_use_image_path_and_reference_the_image() {
        let fx = Fixture::new();
        let project = fx.project();
        let upload = fx.images.save("upload", b"sketch", "image/png").unwrap();
        let mock = MockProvider::new();
        mock.push_image(Ok(ProviderReply {
            text: Some("Here's a vintage take.".to_string()),
            image: Some(ImageInput {
                mime: "image/png".to_string(),
                bytes: b"vintage".to_vec(),
            }),
        }));
        let engine = fx.engine(Some(mock.clone()));

        let reply = engine
            .converse(ChatRequest {
                image_url: Some(upload.clone()),
                ..ask("Show me a vintage version", Some(project.id))
            })
            .await
            .unwrap();

        let generated = reply.image_url.clone().unwrap();
        assert!(generated.starts_with("/uploads/chat-"));
        assert!(reply.content.starts_with("Here's a vintage take."));
        assert!(reply.content.contains(&format!("[Generated image: {generated}]")));
        assert_eq!(fx.images.read_reference(&generated).unwrap(), b"vintage");
        assert_eq!(mock.last_image().unwrap().bytes, b"sketch");

        let history = fx.store.project(project.id).unwrap().chat_history;
        assert_eq!(history[0].image_url.as_deref(), Some(upload.as_str()));
    }

    #[tokio::test]
    async fn provider_absence_or_failure_gives_apology() {
        let fx = Fixture::new();
        let project = fx.project();

        let engine = fx.engine(None);
        let reply = engine.converse(ask("hello", Some(project.id))).await.unwrap();
        assert_eq!(reply.content, CHAT_APOLOGY);

        let mock = MockProvider::new();
        mock.push_image(Err(ProviderError::Http {
            status: 500,
            body: "boom".to_string(),
        }));
        let engine = fx.engine(Some(mock));
        let reply = engine.converse(ask("make it gold", Some(project.id))).await.unwrap();
        assert_eq!(reply.content, CHAT_APOLOGY);

        assert_eq!(fx.store.project(project.id).unwrap().chat_history.len(), 4);
    }

    #[tokio::test]
    async fn unknown_project_appends_nothing() {
        let fx = Fixture::new();
        let project = fx.project();
        let mock = MockProvider::new();
        mock.push_completion(Ok("Sure.".to_string()));
        let engine = fx.engine(Some(mock));

        let reply = engine
            .converse(ask("any tips?", Some(project.id + 100)))
            .await
            .unwrap();
        assert_eq!(reply.content, "Sure.");
        let untouched = fx.store.project(project.id).unwrap();
        assert!(untouched.chat_history.is_empty());
        assert_eq!(untouched.updated_at, project.updated_at);
    }

    #[tokio::test]
    async fn text_only_providers_still_answer_design_requests() {
        let fx = Fixture::new();
        let project = fx.project();
        let mock = MockProvider::new();
        mock.push_image(Err(ProviderError::Unsupported("image generation")));
        mock.push_completion(Ok("Platinum suits this design well.".to_string()));
        let engine = fx.engine(Some(mock.clone()));

        let reply = engine
            .converse(ask("Is platinum a good metal for this design?", Some(project.id)))
            .await
            .unwrap();
        assert_eq!(reply.content, "Platinum suits this design well.");
        assert!(reply.image_url.is_none());
        assert_eq!(mock.image_calls(), 1);
        assert_eq!(mock.complete_calls(), 1);
        assert!(mock.last_directive().unwrap().contains("Is platinum a good metal"));
    }

    #[tokio::test]
    async fn empty_image_reply_falls_back_to_text() {
        let fx = Fixture::new();
        let mock = MockProvider::new();
        mock.push_image(Ok(ProviderReply::default()));
        mock.push_completion(Ok("Try a knife-edge band.".to_string()));
        let engine = fx.engine(Some(mock.clone()));

        let reply = engine.converse(ask("make it slimmer", None)).await.unwrap();
        assert_eq!(reply.content, "Try a knife-edge band.");
        assert_eq!(mock.complete_calls(), 1);
    }

    #[tokio::test]
    async fn explicit_context_overrides_project_context() {
        let fx = Fixture::new();
        let project = fx.project();
        let mock = MockProvider::new();
        mock.push_completion(Ok("ok".to_string()));
        let engine = fx.engine(Some(mock.clone()));

        engine
            .converse(ChatRequest {
                context: Some(ChatContext {
                    base_design: Some(2),
                    selected_sub_designs: vec![2],
                    notes: Some("for my sister".to_string()),
                    ..ChatContext::default()
                }),
                ..ask("thoughts?", Some(project.id))
            })
            .await
            .unwrap();

        let directive = mock.last_directive().unwrap();
        assert!(directive.contains("Pearl Elegance"));
        assert!(directive.contains("selected enhancements: Engraving"));
        assert!(directive.contains("notes: for my sister"));
    }
}
