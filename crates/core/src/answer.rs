use std::error::Error as StdError;
use std::fmt::{self, Display};
use std::pin::Pin;
use std::task::{Context, Poll, ready};

use barista_model::{
    ErrorKind, ModelProviderError, ModelResponse, ModelResponseEvent,
};
use futures_util::Stream;
use pin_project_lite::pin_project;

/// Error produced while obtaining or streaming an answer.
#[derive(Debug)]
pub struct ChatError {
    message: String,
    kind: ErrorKind,
}

impl ChatError {
    /// Creates a new error from a message and a kind.
    pub fn new(message: impl Into<String>, kind: ErrorKind) -> Self {
        Self {
            message: message.into(),
            kind,
        }
    }

    /// Returns the kind of this error.
    #[inline]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub(crate) fn from_provider<E: ModelProviderError>(err: E) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

impl Display for ChatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl StdError for ChatError {}

type BoxedFragmentStream =
    Pin<Box<dyn Stream<Item = Result<String, ChatError>> + Send>>;

/// A lazy, finite, non-restartable sequence of answer text fragments.
///
/// Concatenating the fragments in order reconstructs the full answer;
/// there is no other framing. The sequence terminates with a close (end
/// of stream) or an error item, and yields nothing after either.
pub struct AnswerStream {
    inner: BoxedFragmentStream,
}

impl AnswerStream {
    /// Wraps an existing fragment stream.
    #[inline]
    pub fn new(
        stream: impl Stream<Item = Result<String, ChatError>> + Send + 'static,
    ) -> Self {
        Self {
            inner: Box::pin(stream),
        }
    }

    /// Adapts a provider response into an answer stream.
    ///
    /// Message deltas pass through as fragments; the completion event is
    /// internal to the provider protocol and is not surfaced.
    pub fn from_response<R: ModelResponse>(resp: R) -> Self {
        Self::new(EventStream { resp, done: false })
    }
}

impl Stream for AnswerStream {
    type Item = Result<String, ChatError>;

    #[inline]
    fn poll_next(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }
}

impl fmt::Debug for AnswerStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnswerStream").finish_non_exhaustive()
    }
}

pin_project! {
    struct EventStream<R> {
        #[pin]
        resp: R,
        done: bool,
    }
}

impl<R: ModelResponse> Stream for EventStream<R> {
    type Item = Result<String, ChatError>;

    fn poll_next(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Self::Item>> {
        let mut this = self.project();
        if *this.done {
            return Poll::Ready(None);
        }
        loop {
            match ready!(this.resp.as_mut().poll_next_event(cx)) {
                Ok(Some(ModelResponseEvent::MessageDelta(delta))) => {
                    return Poll::Ready(Some(Ok(delta)));
                }
                Ok(Some(ModelResponseEvent::Completed(_))) => continue,
                Ok(None) => {
                    *this.done = true;
                    return Poll::Ready(None);
                }
                Err(err) => {
                    *this.done = true;
                    return Poll::Ready(Some(Err(ChatError::from_provider(
                        err,
                    ))));
                }
            }
        }
    }
}
