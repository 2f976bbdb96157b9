//! Log retrieval and tailing.
//!
//! Two transports exist for one log key: a one-shot batch blob of historical
//! content and a live server-sent event feed. [`client::LogClient`] speaks
//! both; [`recon`] merges them into a single view that prefers the stream
//! and falls back to the blob once the stream ends.

pub mod client;
pub mod error;
pub mod key;
pub mod line;
pub mod recon;
pub mod source;

pub use client::{LogClient, LogServiceConfig};
pub use error::{StreamError, TransportError};
pub use key::LogKey;
pub use line::LogLine;
pub use recon::{NO_LOGS_SENTINEL, reconcile};
pub use source::LogSource;
