//! The narrow seam between the studio engines and an external AI provider.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tracing::warn;
use verkove_core::AiSettings;

/// An image handed to or returned by the provider.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageInput {
    pub mime: String,
    pub bytes: Vec<u8>,
}

/// What an image-capable call returns. Either part may be missing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProviderReply {
    pub text: Option<String>,
    pub image: Option<ImageInput>,
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ProviderError {
    #[error("provider not configured")]
    Unavailable,

    #[error("provider timed out after {0:?}")]
    Timeout(Duration),

    #[error("provider returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("provider transport: {0}")]
    Transport(String),

    #[error("malformed provider response: {0}")]
    Malformed(String),

    #[error("{0} is not supported by this provider")]
    Unsupported(&'static str),

    #[error("provider backend: {0}")]
    Backend(String),
}

impl ProviderError {
    /// Errors worth another attempt: timeouts, connection trouble, throttling
    /// and server-side failures.
    pub fn is_transient(&self) -> bool {
        match self {
            ProviderError::Timeout(_) | ProviderError::Transport(_) => true,
            ProviderError::Http { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

#[async_trait]
pub trait ProviderClient: Send + Sync {
    /// Image-capable generation. With `image` set this is an "edit this image"
    /// request.
    async fn generate_image(
        &self,
        directive: &str,
        image: Option<&ImageInput>,
    ) -> Result<ProviderReply, ProviderError>;

    /// Text-only completion.
    async fn complete(&self, directive: &str) -> Result<String, ProviderError>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 1,
            base_backoff: Duration::from_millis(250),
        }
    }
}

impl RetryPolicy {
    pub fn from_settings(settings: &AiSettings) -> Self {
        Self {
            max_attempts: settings.max_attempts.max(1),
            base_backoff: Duration::from_millis(settings.retry_backoff_ms),
        }
    }

    fn backoff(&self, attempt: u32) -> Duration {
        self.base_backoff
            .saturating_mul(1_u32 << attempt.saturating_sub(1).min(8))
    }

    pub async fn run<T, F, Fut>(&self, operation: &str, mut call: F) -> Result<T, ProviderError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ProviderError>>,
    {
        let mut attempt = 1;
        loop {
            match call().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() && attempt < self.max_attempts => {
                    let delay = self.backoff(attempt);
                    warn!(operation, attempt, error = %e, ?delay, "transient provider error; retrying");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Wraps a provider with bounded retry on transient errors.
pub struct Retrying<P> {
    inner: P,
    policy: RetryPolicy,
}

impl<P> Retrying<P> {
    pub fn new(inner: P, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

#[async_trait]
impl<P: ProviderClient> ProviderClient for Retrying<P> {
    async fn generate_image(
        &self,
        directive: &str,
        image: Option<&ImageInput>,
    ) -> Result<ProviderReply, ProviderError> {
        self.policy
            .run("generate_image", || self.inner.generate_image(directive, image))
            .await
    }

    async fn complete(&self, directive: &str) -> Result<String, ProviderError> {
        self.policy
            .run("complete", || self.inner.complete(directive))
            .await
    }
}
