//! An abstraction layer for generative-language providers.
//!
//! This crate establishes a unified protocol for the chat service to
//! talk to a model provider: submit an ordered list of messages, and
//! receive an asynchronous, pull-based sequence of text chunks. The
//! service can swap providers without touching the core codebase.
//!
//! Types in this crate don't define any behavior, instead they are the
//! constraints that the implementors should adhere to.

#![deny(missing_docs)]

mod error;
mod provider;
mod request;
mod response;

pub use error::*;
pub use provider::*;
pub use request::*;
pub use response::*;
