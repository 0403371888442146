//! Scripted provider for tests.
//!
//! `MockProvider` lets tests:
//! - queue the results `generate_image()` and `complete()` return
//! - count calls to each method
//! - inspect the last directive and image the engines sent
//!
//! When a queue is empty the call fails with `ProviderError::Unavailable`.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;

use crate::provider::{ImageInput, ProviderClient, ProviderError, ProviderReply};

#[derive(Default)]
struct Script {
    images: VecDeque<Result<ProviderReply, ProviderError>>,
    completions: VecDeque<Result<String, ProviderError>>,
    last_directive: Option<String>,
    last_image: Option<ImageInput>,
}

#[derive(Clone, Default)]
pub struct MockProvider {
    script: Arc<Mutex<Script>>,
    image_calls: Arc<AtomicUsize>,
    complete_calls: Arc<AtomicUsize>,
    delay: Option<Duration>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleep this long inside every call, to exercise timeouts and overlap.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    fn script(&self) -> std::sync::MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn push_image(&self, result: Result<ProviderReply, ProviderError>) {
        self.script().images.push_back(result);
    }

    pub fn push_completion(&self, result: Result<String, ProviderError>) {
        self.script().completions.push_back(result);
    }

    pub fn image_calls(&self) -> usize {
        self.image_calls.load(Ordering::SeqCst)
    }

    pub fn complete_calls(&self) -> usize {
        self.complete_calls.load(Ordering::SeqCst)
    }

    pub fn last_directive(&self) -> Option<String> {
        self.script().last_directive.clone()
    }

    pub fn last_image(&self) -> Option<ImageInput> {
        self.script().last_image.clone()
    }
}

#[async_trait]
impl ProviderClient for MockProvider {
    async fn generate_image(
        &self,
        directive: &str,
        image: Option<&ImageInput>,
    ) -> Result<ProviderReply, ProviderError> {
        self.image_calls.fetch_add(1, Ordering::SeqCst);
        let next = {
            let mut script = self.script();
            script.last_directive = Some(directive.to_string());
            script.last_image = image.cloned();
            script.images.pop_front()
        };
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        next.unwrap_or(Err(ProviderError::Unavailable))
    }

    async fn complete(&self, directive: &str) -> Result<String, ProviderError> {
        self.complete_calls.fetch_add(1, Ordering::SeqCst);
        let next = {
            let mut script = self.script();
            script.last_directive = Some(directive.to_string());
            script.completions.pop_front()
        };
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        next.unwrap_or(Err(ProviderError::Unavailable))
    }
}
