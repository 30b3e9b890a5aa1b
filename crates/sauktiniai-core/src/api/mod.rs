//! Upstream API module.
//!
//! This module provides the `UpstreamClient` for requesting item windows
//! from the conscript list service, and the `WindowSource` seam the
//! region fetcher is written against.

pub mod client;
pub mod error;
pub mod source;

pub use client::UpstreamClient;
pub use error::ApiError;
pub use source::WindowSource;
