//! Remote AI providers (city architect, news ticker) with local fallback

pub mod architect;
pub mod breaker;
pub mod client;
pub mod news;

pub use architect::AiProvider;
pub use breaker::{CircuitBreaker, FailureClass};
pub use client::LlmClient;
pub use news::{NewsFlash, FALLBACK_TICKERS};
