//! REST client for the pipeline service.
//!
//! The [`client::ApiContext`] owns the HTTP client and the account scope and
//! is built once at startup; [`pipelines::PipelineClient`] layers the
//! pipeline endpoints on top of it.

pub mod client;
pub mod error;
pub mod models;
pub mod pipelines;

pub use client::{ApiContext, ApiScope};
pub use error::ApiError;
pub use pipelines::PipelineClient;
