// src/pipeline/mod.rs

pub mod fetcher;
pub mod normalizer;
pub mod rate_limiter;
pub mod readers;
pub mod writers;

pub use fetcher::{RecordFetcher, TmdbFetcher};
pub use normalizer::normalize;
pub use rate_limiter::RateLimiter;
