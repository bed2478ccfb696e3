//! Data service client library for orderchat.
//!
//! Provides the [`ChatBackend`] seam the chat panel talks to, plus two
//! implementations:
//! - [`RestBackend`]: the hosted service (PostgREST rows, realtime
//!   websocket change feed, serverless functions, auth).
//! - [`MemoryBackend`]: an in-process service used by tests and demo mode.

pub mod backend;
pub mod config;
pub mod error;
pub mod memory;
pub mod realtime;
pub mod rest;
pub mod subscription;

pub use backend::ChatBackend;
pub use config::ServiceConfig;
pub use error::ClientError;
pub use memory::{tagging_translator, CallCounts, MemoryBackend, Translator};
pub use rest::RestBackend;
pub use subscription::{Subscription, SubscriptionSink};
