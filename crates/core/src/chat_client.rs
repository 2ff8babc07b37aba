use std::pin::Pin;
use std::sync::Arc;

use barista_model::{ModelMessage, ModelProvider, ModelRequest};
use tracing::Instrument;

use crate::answer::{AnswerStream, ChatError};
use crate::transcript::{Role, Turn};

type SendPromptResult = Result<AnswerStream, ChatError>;
type BoxedSendPromptFuture =
    Pin<Box<dyn Future<Output = SendPromptResult> + Send>>;
type HandlerFn =
    Arc<dyn Fn(ModelRequest) -> BoxedSendPromptFuture + Send + Sync>;

/// The seam between the transcript holder and whatever delivers
/// answers: a model provider wrapped in a [`ChatClient`], or an HTTP
/// client talking to a remote proxy.
pub trait ChatTransport: Send + Sync {
    /// Sends a prompt with the prior turns, returning the answer stream.
    fn send_prompt(
        &self,
        prompt: &str,
        history: &[Turn],
    ) -> impl Future<Output = Result<AnswerStream, ChatError>> + Send;
}

/// Builds the ordered message list for a prompt: the optional persona
/// instruction first, then the prior turns in their observed order,
/// and the new prompt last as a user turn.
pub fn build_request(
    persona: Option<&str>,
    history: &[Turn],
    prompt: &str,
) -> ModelRequest {
    let mut messages = Vec::with_capacity(history.len() + 2);
    if let Some(persona) = persona {
        messages.push(ModelMessage::System(persona.to_owned()));
    }
    for turn in history {
        messages.push(match turn.role {
            Role::User => ModelMessage::User(turn.content.clone()),
            Role::Model => ModelMessage::Model(turn.content.clone()),
        });
    }
    messages.push(ModelMessage::User(prompt.to_owned()));
    ModelRequest { messages }
}

/// A wrapper around a model provider that assembles the ordered message
/// list for each prompt and provides a type-erased interface for the
/// other modules.
///
/// The client keeps no state across calls; each call performs exactly
/// one outbound streaming request.
#[derive(Clone)]
pub struct ChatClient {
    handler_fn: HandlerFn,
    persona: Option<Arc<str>>,
}

impl ChatClient {
    /// Creates a new `ChatClient` for the given provider.
    pub fn new<P: ModelProvider + 'static>(provider: P) -> Self {
        // We have to erase the type `P`, since `ChatClient` doesn't have a
        // generic parameter and we don't want it either.
        let handler_fn: HandlerFn = Arc::new(move |req| {
            let fut = provider.send_request(&req);
            Box::pin(
                async move {
                    trace!("got a request: {req:?}");
                    match fut.await {
                        Ok(resp) => Ok(AnswerStream::from_response(resp)),
                        Err(err) => {
                            error!("got an error: {err:?}");
                            Err(ChatError::from_provider(err))
                        }
                    }
                }
                .instrument(trace_span!("chat client req")),
            )
        });
        Self {
            handler_fn,
            persona: None,
        }
    }

    /// Sets the fixed persona instruction submitted ahead of every
    /// conversation.
    #[inline]
    pub fn with_persona<S: Into<Arc<str>>>(mut self, persona: S) -> Self {
        self.persona = Some(persona.into());
        self
    }

    /// Sends a prompt with the prior turns and returns the answer
    /// stream.
    pub async fn send(
        &self,
        prompt: &str,
        history: &[Turn],
    ) -> Result<AnswerStream, ChatError> {
        let req = build_request(self.persona.as_deref(), history, prompt);
        (self.handler_fn)(req).await
    }
}

impl ChatTransport for ChatClient {
    #[inline]
    fn send_prompt(
        &self,
        prompt: &str,
        history: &[Turn],
    ) -> impl Future<Output = Result<AnswerStream, ChatError>> + Send {
        self.send(prompt, history)
    }
}

#[cfg(test)]
mod tests {
    use barista_model::ErrorKind;
    use barista_test_model::{PresetResponse, TestModelProvider};
    use futures_util::StreamExt;

    use super::*;

    async fn collect(mut answer: AnswerStream) -> String {
        let mut text = String::new();
        while let Some(fragment) = answer.next().await {
            text.push_str(&fragment.unwrap());
        }
        text
    }

    #[tokio::test]
    async fn test_send() {
        let mut provider = TestModelProvider::default();
        provider.add_reply_step(PresetResponse::with_text("How are you?"));
        let client = ChatClient::new(provider.clone())
            .with_persona("You are a coffee chat partner.");

        let answer = client.send("Hi", &[]).await.unwrap();
        assert_eq!(collect(answer).await, "How are you?");

        let captured = provider.captured_requests();
        assert_eq!(captured.len(), 1);
        assert_eq!(
            captured[0].messages,
            vec![
                ModelMessage::System(
                    "You are a coffee chat partner.".to_owned()
                ),
                ModelMessage::User("Hi".to_owned()),
            ]
        );
    }

    #[tokio::test]
    async fn test_history_ordering() {
        let mut provider = TestModelProvider::default();
        provider.add_reply_step(PresetResponse::with_text("first"));
        provider.add_reply_step(PresetResponse::with_text("second"));
        let client = ChatClient::new(provider.clone());

        let history = [Turn::user("Hi"), Turn::model("Hello!")];
        let answer = client
            .send("Tell me about yourself", &history)
            .await
            .unwrap();
        collect(answer).await;

        // The provider receives N + 1 ordered messages, roles preserved,
        // the new prompt last.
        let captured = provider.captured_requests();
        assert_eq!(
            captured[0].messages,
            vec![
                ModelMessage::User("Hi".to_owned()),
                ModelMessage::Model("Hello!".to_owned()),
                ModelMessage::User("Tell me about yourself".to_owned()),
            ]
        );
    }

    #[tokio::test]
    async fn test_request_error() {
        let provider = TestModelProvider::default();
        let client = ChatClient::new(provider);
        let err = client.send("Hi", &[]).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RateLimitExceeded);
    }

    #[tokio::test]
    async fn test_mid_stream_error() {
        let mut provider = TestModelProvider::default();
        provider.add_reply_step(PresetResponse::with_events([
            barista_test_model::PresetEvent::MessageDelta(
                "partial ".to_owned(),
            ),
            barista_test_model::PresetEvent::Fail(
                "connection reset".to_owned(),
            ),
        ]));
        let client = ChatClient::new(provider);

        let mut answer = client.send("Hi", &[]).await.unwrap();
        assert_eq!(answer.next().await.unwrap().unwrap(), "partial ");
        let err = answer.next().await.unwrap().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Other);
        assert!(answer.next().await.is_none());
    }
}
