//! An HTTP transport for talking to a remote proxy.

use barista_core::transcript::Turn;
use barista_core::{AnswerStream, ChatError, ChatTransport};
use barista_model::ErrorKind;
use futures_util::stream;
use reqwest::{Client, StatusCode};

use crate::server::{ChatRequest, ErrorBody};

/// A [`ChatTransport`] that sends prompts to a remote proxy endpoint
/// and streams the plain-text answer back.
pub struct ProxyChat {
    client: Client,
    base_url: String,
}

impl ProxyChat {
    /// Creates a transport for the proxy at `base_url`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
        }
    }
}

impl ChatTransport for ProxyChat {
    fn send_prompt(
        &self,
        prompt: &str,
        history: &[Turn],
    ) -> impl Future<Output = Result<AnswerStream, ChatError>> + Send {
        let req = ChatRequest {
            prompt: prompt.to_owned(),
            history: history.to_vec(),
        };
        let resp_fut = self
            .client
            .post(format!(
                "{}/api/chat",
                self.base_url.trim_end_matches('/')
            ))
            .json(&req)
            .send();

        async move {
            let resp = resp_fut.await.map_err(|err| {
                ChatError::new(format!("{err}"), ErrorKind::Other)
            })?;

            let status = resp.status();
            if !status.is_success() {
                let kind = if status == StatusCode::TOO_MANY_REQUESTS {
                    ErrorKind::RateLimitExceeded
                } else {
                    ErrorKind::Other
                };
                let message = resp
                    .json::<ErrorBody>()
                    .await
                    .map(|body| body.error)
                    .unwrap_or_else(|_| {
                        format!("the proxy returned {status}")
                    });
                return Err(ChatError::new(message, kind));
            }

            // Network chunks may split multi-byte characters, decode
            // incrementally.
            let fragments = stream::unfold(
                (resp, Utf8Decoder::default(), false),
                |(mut resp, mut decoder, done)| async move {
                    if done {
                        return None;
                    }
                    loop {
                        match resp.chunk().await {
                            Ok(Some(bytes)) => {
                                match decoder.push(&bytes) {
                                    Ok(Some(fragment)) => {
                                        return Some((
                                            Ok(fragment),
                                            (resp, decoder, false),
                                        ));
                                    }
                                    Ok(None) => continue,
                                    Err(err) => {
                                        return Some((
                                            Err(err),
                                            (resp, decoder, true),
                                        ));
                                    }
                                }
                            }
                            Ok(None) => {
                                if decoder.has_partial() {
                                    return Some((
                                        Err(ChatError::new(
                                            "truncated utf-8 in the \
                                             answer stream",
                                            ErrorKind::Other,
                                        )),
                                        (resp, decoder, true),
                                    ));
                                }
                                return None;
                            }
                            Err(err) => {
                                return Some((
                                    Err(ChatError::new(
                                        format!("{err}"),
                                        ErrorKind::Other,
                                    )),
                                    (resp, decoder, true),
                                ));
                            }
                        }
                    }
                },
            );
            Ok(AnswerStream::new(fragments))
        }
    }
}

/// An incremental UTF-8 decoder that buffers a trailing incomplete
/// sequence until its continuation bytes arrive.
#[derive(Default)]
struct Utf8Decoder {
    partial: Vec<u8>,
}

impl Utf8Decoder {
    fn push(&mut self, bytes: &[u8]) -> Result<Option<String>, ChatError> {
        self.partial.extend_from_slice(bytes);
        let valid = match str::from_utf8(&self.partial) {
            Ok(_) => self.partial.len(),
            Err(err) if err.error_len().is_none() => err.valid_up_to(),
            Err(_) => {
                return Err(ChatError::new(
                    "invalid utf-8 in the answer stream",
                    ErrorKind::Other,
                ));
            }
        };
        if valid == 0 {
            return Ok(None);
        }
        // The prefix has been validated, the conversion is lossless.
        let fragment =
            String::from_utf8_lossy(&self.partial[..valid]).into_owned();
        self.partial.drain(..valid);
        Ok(Some(fragment))
    }

    #[inline]
    fn has_partial(&self) -> bool {
        !self.partial.is_empty()
    }
}
