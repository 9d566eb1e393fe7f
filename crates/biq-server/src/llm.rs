//! Reasoning service client
//!
//! The pipeline only ever needs one operation from the language model: a
//! blocking, unary completion with a temperature and an output-size bound.
//! [`Reasoner`] captures that contract; [`OpenAiReasoner`] implements it on
//! top of the OpenAI chat API with an explicit call timeout.

use async_openai::{
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestMessage, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use biq_core::{truncate_diag, DIAG_LIMIT};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReasonError {
    #[error("reasoning service error: {0}")]
    Service(String),

    #[error("reasoning service returned no content")]
    EmptyReply,

    #[error("reasoning call timed out after {0:?}")]
    Timeout(Duration),
}

/// Unary completion against an opaque reasoning service.
#[async_trait]
pub trait Reasoner: Send + Sync {
    async fn complete(
        &self,
        prompt: &str,
        temperature: f32,
        max_tokens: u32,
    ) -> Result<String, ReasonError>;
}

/// OpenAI-backed reasoner with a per-call timeout. Timeout expiry is a
/// service failure like any other; callers never retry here.
pub struct OpenAiReasoner {
    client: Client<OpenAIConfig>,
    model: String,
    timeout: Duration,
}

impl OpenAiReasoner {
    pub fn new(client: Client<OpenAIConfig>, model: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client,
            model: model.into(),
            timeout,
        }
    }
}

#[async_trait]
impl Reasoner for OpenAiReasoner {
    async fn complete(
        &self,
        prompt: &str,
        temperature: f32,
        max_tokens: u32,
    ) -> Result<String, ReasonError> {
        let message = ChatCompletionRequestUserMessageArgs::default()
            .content(prompt)
            .build()
            .map_err(|e| ReasonError::Service(e.to_string()))?;

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(vec![ChatCompletionRequestMessage::User(message)])
            .temperature(temperature)
            .max_tokens(max_tokens)
            .build()
            .map_err(|e| ReasonError::Service(e.to_string()))?;

        let response = tokio::time::timeout(self.timeout, self.client.chat().create(request))
            .await
            .map_err(|_| ReasonError::Timeout(self.timeout))?
            .map_err(|e| ReasonError::Service(truncate_diag(&e.to_string(), DIAG_LIMIT)))?;

        response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .filter(|content| !content.trim().is_empty())
            .ok_or(ReasonError::EmptyReply)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Scripted reasoner for tests: pops one reply per call and counts
    /// invocations.
    pub struct MockReasoner {
        replies: Mutex<Vec<Result<String, ReasonError>>>,
        pub calls: AtomicUsize,
    }

    impl MockReasoner {
        pub fn with_replies(replies: Vec<Result<String, ReasonError>>) -> Self {
            Self {
                replies: Mutex::new(replies),
                calls: AtomicUsize::new(0),
            }
        }

        pub fn replying(reply: &str) -> Self {
            Self::with_replies(vec![Ok(reply.to_string())])
        }

        pub fn failing() -> Self {
            Self::with_replies(vec![Err(ReasonError::Service("boom".into()))])
        }

        pub fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Reasoner for MockReasoner {
        async fn complete(
            &self,
            _prompt: &str,
            _temperature: f32,
            _max_tokens: u32,
        ) -> Result<String, ReasonError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut replies = self.replies.lock().unwrap();
            if replies.is_empty() {
                return Err(ReasonError::Service("mock exhausted".into()));
            }
            replies.remove(0)
        }
    }
}
