//! Core logic of the chat service: ordered request assembly, the
//! streaming answer abstraction, and the client-side transcript holder.

#![deny(missing_docs)]

#[macro_use]
extern crate tracing;

mod answer;
mod chat_client;
mod session;
pub mod transcript;

pub use answer::{AnswerStream, ChatError};
pub use chat_client::{ChatClient, ChatTransport, build_request};
pub use session::{DEFAULT_GREETING, Session};
