//! A local fake model for testing purpose.

mod preset;

use std::error::Error as StdError;
use std::fmt::{self, Debug, Display, Formatter};
use std::future::ready;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll, ready};
use std::time::Duration;

use barista_model::{
    ErrorKind, ModelFinishReason, ModelMessage, ModelProvider,
    ModelProviderError, ModelRequest, ModelResponse, ModelResponseEvent,
};
use tokio::time::{Sleep, sleep};

pub use preset::*;

#[derive(Debug)]
pub struct Error {
    message: String,
    kind: ErrorKind,
}

impl Error {
    fn new(message: impl Into<String>, kind: ErrorKind) -> Self {
        Self {
            message: message.into(),
            kind,
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl StdError for Error {}

impl ModelProviderError for Error {
    #[inline]
    fn kind(&self) -> ErrorKind {
        self.kind
    }
}

#[derive(Debug)]
pub struct TestModelResponse {
    provider: TestModelProvider,
    request: ModelRequest,
    event_idx: usize,
    sleep: Option<Pin<Box<Sleep>>>,
}

impl ModelResponse for TestModelResponse {
    type Error = crate::Error;

    fn poll_next_event(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Result<Option<ModelResponseEvent>, Self::Error>> {
        // SAFETY: This type does not require to be pinned.
        let this = unsafe { self.get_unchecked_mut() };

        // The reply existence has been validated in `send_request`.
        let reply_idx = user_turns(&this.request) - 1;
        let preset_events = &this.provider.reply_script[reply_idx].events;

        if let Some(sleep) = &mut this.sleep {
            let sleep = sleep.as_mut();
            ready!(sleep.poll(cx));
            this.sleep = None;

            if this.event_idx < preset_events.len() {
                let event = match &preset_events[this.event_idx] {
                    PresetEvent::MessageDelta(msg) => {
                        ModelResponseEvent::MessageDelta(msg.clone())
                    }
                    PresetEvent::Fail(msg) => {
                        return Poll::Ready(Err(Error::new(
                            msg.clone(),
                            ErrorKind::Other,
                        )));
                    }
                };
                this.event_idx += 1;
                return Poll::Ready(Ok(Some(event)));
            } else if this.event_idx == preset_events.len() {
                this.event_idx += 1;
                return Poll::Ready(Ok(Some(ModelResponseEvent::Completed(
                    ModelFinishReason::Stop,
                ))));
            } else {
                // In case this method is called after completion.
                return Poll::Ready(Ok(None));
            }
        }
        this.sleep = Some(Box::pin(sleep(
            this.provider.delay.unwrap_or(Duration::from_millis(1)),
        )));
        Pin::new(this).poll_next_event(cx)
    }
}

/// A local fake model for testing purpose.
///
/// Before sending requests, you need to setup the reply script, which is
/// how the model should respond to each user turn. The reply is selected
/// by the number of user messages in the request, so a leading system
/// message does not shift the script. If there are no enough replies in
/// the script, an error will be returned.
///
/// Every request the provider receives is captured and can be inspected
/// later with [`TestModelProvider::captured_requests`].
///
/// # Note
///
/// This type is not optimized for production use, there are heavy memory
/// copies involved. You should only use it for testing.
#[derive(Clone, Default, Debug)]
pub struct TestModelProvider {
    reply_script: Vec<PresetResponse>,
    delay: Option<Duration>,
    captured: Arc<Mutex<Vec<ModelRequest>>>,
    attempts: Arc<Mutex<Vec<u64>>>,
}

impl TestModelProvider {
    #[inline]
    pub fn add_reply_step(&mut self, preset: PresetResponse) {
        self.reply_script.push(preset);
    }

    #[inline]
    pub fn set_delay(&mut self, duration: Duration) {
        self.delay = Some(duration);
    }

    /// Returns every request this provider has received so far, in
    /// arrival order.
    pub fn captured_requests(&self) -> Vec<ModelRequest> {
        self.captured.lock().unwrap().clone()
    }
}

impl ModelProvider for TestModelProvider {
    type Error = crate::Error;
    type Response = TestModelResponse;

    fn send_request(
        &self,
        req: &ModelRequest,
    ) -> impl Future<Output = Result<Self::Response, Self::Error>> + Send + 'static
    {
        self.captured.lock().unwrap().push(req.clone());

        let result = 'blk: {
            let turns = user_turns(req);
            if turns == 0 {
                break 'blk Err(Error::new(
                    "no user message in the request",
                    ErrorKind::Other,
                ));
            }
            let reply_idx = turns - 1;
            let Some(preset) = self.reply_script.get(reply_idx) else {
                break 'blk Err(Error::new(
                    "no enough replies",
                    ErrorKind::RateLimitExceeded,
                ));
            };

            if let Some(failures) = preset.failures {
                let mut attempts = self.attempts.lock().unwrap();
                if attempts.len() <= reply_idx {
                    attempts.resize(reply_idx + 1, 0);
                }
                attempts[reply_idx] += 1;
                if failures == 0 || attempts[reply_idx] <= failures {
                    break 'blk Err(Error::new(
                        "preset failure",
                        ErrorKind::Other,
                    ));
                }
            }

            Ok(TestModelResponse {
                provider: self.clone(),
                request: req.clone(),
                event_idx: 0,
                sleep: None,
            })
        };
        ready(result)
    }
}

fn user_turns(req: &ModelRequest) -> usize {
    req.messages
        .iter()
        .filter(|msg| matches!(msg, ModelMessage::User(_)))
        .count()
}
