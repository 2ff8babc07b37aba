//! A virtual coffee-chat partner service.
//!
//! The crate wires a Gemini-backed chat client into a small streaming
//! HTTP proxy, and ships a terminal client for practicing coffee chats
//! against it.

#![deny(missing_docs)]

#[macro_use]
extern crate tracing;

pub mod client;
pub mod server;

/// Re-exports of [`barista_core`] crate.
pub mod core {
    pub use barista_core::*;
}
