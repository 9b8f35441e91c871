// src/services/mod.rs

//! Service layer for the archiver.
//!
//! This module contains the networking stack:
//! - Circuit breaker state machine (`CircuitBreaker`)
//! - Retriable HTTP client (`RequestClient`)
//! - Cached request facade (`CachedClient`)
//! - Named API operations (`Api`)
//! - AI solution generation port (`SolutionGenerator`)
//! - External media downloader port (`MediaDownloader`)

pub mod ai;
pub mod api;
pub mod breaker;
pub mod cached;
pub mod http;
pub mod media;

pub use ai::{SolutionGenerator, SolutionPrompt};
pub use api::Api;
pub use breaker::CircuitBreaker;
pub use cached::{CachedClient, cache_key};
pub use http::{Payload, RequestClient, RetryPolicy, Selector, Token};
pub use media::{MediaDownloader, YtDlpDownloader};
