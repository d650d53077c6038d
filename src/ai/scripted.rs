//! Canned-reply provider.

use std::collections::VecDeque;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::{AIError, CompletionProvider};

/// Replays queued replies in order and records every prompt it receives.
///
/// Once the queue is empty every call fails with [`AIError::NoResponse`].
#[derive(Debug, Default)]
pub struct ScriptedProvider {
    replies: Mutex<VecDeque<Result<String, String>>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedProvider {
    /// Create a provider with no replies queued.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful reply.
    pub fn reply(self, text: impl Into<String>) -> Self {
        self.replies.lock().push_back(Ok(text.into()));
        self
    }

    /// Queue a failed call.
    pub fn fail(self, message: impl Into<String>) -> Self {
        self.replies.lock().push_back(Err(message.into()));
        self
    }

    /// Prompts received so far.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }
}

#[async_trait]
impl CompletionProvider for ScriptedProvider {
    async fn complete(&self, prompt: &str) -> Result<String, AIError> {
        self.prompts.lock().push(prompt.to_string());
        match self.replies.lock().pop_front() {
            Some(Ok(text)) => Ok(text),
            Some(Err(message)) => Err(AIError::ApiError(message)),
            None => Err(AIError::NoResponse),
        }
    }

    fn name(&self) -> &str {
        "scripted"
    }
}
