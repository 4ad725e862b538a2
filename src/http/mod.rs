//! HTTP transport module
//!
//! Provides the HTTP client every fetcher calls through.
//!
//! # Features
//!
//! - **Bearer Auth**: Token attached to every request, refreshed once on 401
//! - **Automatic Retries**: 429/5xx, timeouts and connect errors with backoff
//! - **Rate Limiting**: Optional token bucket rate limiter using governor
//! - **Lenient Reads**: Non-200 answers and empty bodies come back as `None`

mod client;
mod rate_limit;

pub use client::{HttpClient, HttpClientConfig, HttpClientConfigBuilder};
pub use rate_limit::{RateLimiter, RateLimiterConfig};
