//! The completion-service seam and its OpenRouter implementation.
//!
//! The turn loop only needs "messages in, text out" plus a way to tell a
//! context-window overflow apart from every other failure.
//! [`CompletionService`] captures exactly that, so tests can script the
//! service and callers can plug in any provider.

use super::classify::{classify_error, is_transient_error};
use crate::error::CompletionError;
use crate::{ChatRequest, Message, OpenRouterClient};
use std::future::Future;
use std::pin::Pin;
use tracing::warn;

/// Boxed future returned by [`CompletionService::complete`].
pub type CompletionFuture<'a> =
    Pin<Box<dyn Future<Output = Result<String, CompletionError>> + Send + 'a>>;

/// One completion call.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<Message>,
    /// Generation stops at the first of these; the stop text is not returned.
    pub stop: Vec<String>,
    pub temperature: f32,
    /// `0` leaves the limit to the service.
    pub max_tokens: u32,
}

/// A language-model completion backend.
///
/// Implementations return the generated text, or
/// [`CompletionError::ContextWindowExceeded`] when the prompt is too large
/// for the model. Uses a boxed future so the trait stays dyn-compatible.
pub trait CompletionService: Send + Sync {
    fn complete<'a>(&'a self, request: &'a CompletionRequest) -> CompletionFuture<'a>;
}

impl From<&CompletionRequest> for ChatRequest {
    fn from(request: &CompletionRequest) -> Self {
        ChatRequest {
            model: request.model.clone(),
            messages: request.messages.clone(),
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            stop: (!request.stop.is_empty()).then(|| request.stop.clone()),
        }
    }
}

impl CompletionService for OpenRouterClient {
    fn complete<'a>(&'a self, request: &'a CompletionRequest) -> CompletionFuture<'a> {
        Box::pin(async move {
            let body = ChatRequest::from(request);
            self.chat(&body).await.map_err(|e| {
                if is_transient_error(&e) {
                    warn!("Transient completion failure (not retried): {e}");
                }
                classify_error(e)
            })
        })
    }
}
