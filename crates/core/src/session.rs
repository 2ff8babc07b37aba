use futures_util::StreamExt;

use crate::answer::ChatError;
use crate::chat_client::ChatTransport;
use crate::transcript::Transcript;

/// The greeting shown before the first exchange and after a reset.
pub const DEFAULT_GREETING: &str = "Hello! I'm your AI coffee companion. \
     Type a message below to start our conversation.";

/// A chat session, like a window that displays the partner's current
/// answer and has an input box.
///
/// The session owns the transcript of the current conversation and a
/// display buffer holding the answer being streamed. An exchange is
/// committed to the transcript only once its stream completes cleanly;
/// a mid-stream error keeps whatever text was already displayed but
/// commits nothing.
pub struct Session<T: ChatTransport> {
    transport: T,
    transcript: Transcript,
    display: String,
}

impl<T: ChatTransport> Session<T> {
    /// Creates a session over the given transport.
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            transcript: Transcript::default(),
            display: DEFAULT_GREETING.to_owned(),
        }
    }

    /// Returns the transcript committed so far.
    #[inline]
    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Returns the text currently shown in the answer area.
    #[inline]
    pub fn display(&self) -> &str {
        &self.display
    }

    /// Sends a message and streams the answer back.
    ///
    /// The display buffer is cleared up front and grows fragment by
    /// fragment; `on_fragment` observes each fragment as it arrives,
    /// for live-typing style output. Once the stream completes, exactly
    /// two turns are committed to the transcript: the message and the
    /// concatenated answer. A blank message is a no-op.
    pub async fn send(
        &mut self,
        message: &str,
        mut on_fragment: impl FnMut(&str),
    ) -> Result<&str, ChatError> {
        let prompt = message.trim();
        if prompt.is_empty() {
            return Ok(&self.display);
        }

        self.display.clear();
        let mut answer = self
            .transport
            .send_prompt(prompt, self.transcript.turns())
            .await?;
        while let Some(fragment) = answer.next().await {
            let fragment = fragment?;
            self.display.push_str(&fragment);
            on_fragment(&fragment);
        }

        self.transcript.commit_exchange(prompt, &self.display);
        Ok(&self.display)
    }

    /// Starts a new conversation: clears the transcript and restores
    /// the greeting. The proxy is not contacted.
    pub fn reset(&mut self) {
        self.transcript.clear();
        self.display.clear();
        self.display.push_str(DEFAULT_GREETING);
    }
}

#[cfg(test)]
mod tests {
    use barista_test_model::{
        PresetEvent, PresetResponse, TestModelProvider,
    };

    use super::*;
    use crate::chat_client::ChatClient;
    use crate::transcript::Turn;

    fn session_with(
        provider: TestModelProvider,
    ) -> Session<ChatClient> {
        Session::new(ChatClient::new(provider))
    }

    #[tokio::test]
    async fn test_commit_on_completion() {
        let mut provider = TestModelProvider::default();
        provider.add_reply_step(PresetResponse::with_text("Hello! Sit down."));
        let mut session = session_with(provider);
        assert_eq!(session.display(), DEFAULT_GREETING);

        let mut seen = String::new();
        let answer = session
            .send("Hi", |fragment| seen.push_str(fragment))
            .await
            .unwrap();
        assert_eq!(answer, "Hello! Sit down.");
        assert_eq!(seen, "Hello! Sit down.");

        // Exactly one user turn and one model turn, in that order.
        assert_eq!(
            session.transcript().turns(),
            &[Turn::user("Hi"), Turn::model("Hello! Sit down.")]
        );
    }

    #[tokio::test]
    async fn test_history_grows_by_two() {
        let mut provider = TestModelProvider::default();
        provider.add_reply_step(PresetResponse::with_text("first answer"));
        provider.add_reply_step(PresetResponse::with_text("second answer"));
        let mut session = session_with(provider.clone());

        session.send("one", |_| {}).await.unwrap();
        assert_eq!(session.transcript().len(), 2);
        session.send("two", |_| {}).await.unwrap();
        assert_eq!(session.transcript().len(), 4);

        // The second request carried the first exchange as history.
        let captured = provider.captured_requests();
        assert_eq!(captured[1].messages.len(), 4);
    }

    #[tokio::test]
    async fn test_blank_message_is_noop() {
        let provider = TestModelProvider::default();
        let mut session = session_with(provider.clone());

        let answer = session.send("   ", |_| {}).await.unwrap();
        assert_eq!(answer, DEFAULT_GREETING);
        assert!(session.transcript().is_empty());
        assert!(provider.captured_requests().is_empty());
    }

    #[tokio::test]
    async fn test_mid_stream_error_commits_nothing() {
        let mut provider = TestModelProvider::default();
        provider.add_reply_step(PresetResponse::with_events([
            PresetEvent::MessageDelta("partial ".to_owned()),
            PresetEvent::Fail("connection reset".to_owned()),
        ]));
        let mut session = session_with(provider);

        session.send("Hi", |_| {}).await.unwrap_err();
        assert!(session.transcript().is_empty());
        // The display keeps what was already shown.
        assert_eq!(session.display(), "partial ");
    }

    #[tokio::test]
    async fn test_reset() {
        let mut provider = TestModelProvider::default();
        provider.add_reply_step(PresetResponse::with_text("Hello!"));
        let mut session = session_with(provider);

        session.send("Hi", |_| {}).await.unwrap();
        assert!(!session.transcript().is_empty());

        session.reset();
        assert!(session.transcript().is_empty());
        assert_eq!(session.display(), DEFAULT_GREETING);
    }
}
