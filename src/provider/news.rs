//! Breaking-news ticker: short narrative lines reacting to the chaos score
//!
//! Shares the architect's client and circuit breaker. Failures here are
//! even less interesting than layout failures: the caller always gets a
//! message, worst case one of the canned fallback lines.

use crate::core::config::config;
use crate::core::error::{ChaosError, Result};
use crate::provider::architect::{classify_failure, extract_json, AiProvider};
use crate::provider::client::LlmClient;
use rand::Rng;
use serde::Deserialize;
use std::time::Duration;

/// System prompt for the news commentator persona
const COMMENTATOR_SYSTEM_PROMPT: &str = "\
You are live-anchoring breaking news about a monster attacking a city. Given \
the current chaos score, produce ONE short ticker line - a panicked reporter \
or the smug architect mocking the monster. At most 20 words. Respond with a \
single JSON object: {\"message\": string}.";

/// Hard cap on ticker length; anything longer is cut, not rejected
const NEWS_MAX_LEN: usize = 120;

/// Canned ticker lines used whenever the remote is unavailable
pub const FALLBACK_TICKERS: [&str; 8] = [
    "The monster is rampaging downtown!",
    "Buildings are collapsing everywhere!",
    "Citizens flee in panic!",
    "Where is the army?!",
    "Damage estimates pass one billion!",
    "Do not panic! Remain calm!",
    "This is the final warning!",
    "A.I. defense grid has failed!",
];

/// One ticker line for the news crawl
#[derive(Debug, Clone, PartialEq)]
pub struct NewsFlash {
    pub message: String,
}

#[derive(Debug, Deserialize)]
struct RawNewsResponse {
    message: String,
}

impl AiProvider {
    /// Fetch a ticker line for the current chaos score. Infallible: any
    /// failure resolves to a canned line chosen with the caller's RNG.
    pub async fn fetch_news(&self, chaos_score: u64, rng: &mut impl Rng) -> NewsFlash {
        let Some(client) = self.available_client() else {
            return fallback_news(rng);
        };

        match self.fetch_news_remote(client, chaos_score).await {
            Ok(flash) => flash,
            Err(err) => {
                let class = classify_failure(&err);
                self.breaker().record_failure(class);
                tracing::warn!(chaos_score, %err, ?class, "news fetch failed; using canned ticker");
                fallback_news(rng)
            }
        }
    }

    async fn fetch_news_remote(&self, client: &LlmClient, chaos_score: u64) -> Result<NewsFlash> {
        self.breaker().note_attempt();
        let timeout_secs = config().provider_timeout_secs;
        let user_prompt = format!(
            "Current chaos score: {}. The city is crumbling!",
            chaos_score
        );

        let response = tokio::time::timeout(
            Duration::from_secs(timeout_secs),
            client.complete(COMMENTATOR_SYSTEM_PROMPT, &user_prompt),
        )
        .await
        .map_err(|_| ChaosError::ProviderTimeout(timeout_secs))??;

        let raw: RawNewsResponse = serde_json::from_str(extract_json(&response)?)?;
        let mut message = raw.message;
        if message.trim().is_empty() {
            return Err(ChaosError::Provider("empty news message".into()));
        }
        if message.len() > NEWS_MAX_LEN {
            let mut cut = NEWS_MAX_LEN;
            while !message.is_char_boundary(cut) {
                cut -= 1;
            }
            message.truncate(cut);
        }
        Ok(NewsFlash { message })
    }
}

fn fallback_news(rng: &mut impl Rng) -> NewsFlash {
    let line = FALLBACK_TICKERS[rng.gen_range(0..FALLBACK_TICKERS.len())];
    NewsFlash {
        message: line.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[tokio::test]
    async fn test_offline_provider_serves_canned_lines() {
        let provider = AiProvider::offline();
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let flash = provider.fetch_news(1234, &mut rng).await;
        assert!(FALLBACK_TICKERS.contains(&flash.message.as_str()));
    }

    #[test]
    fn test_fallback_covers_whole_set() {
        // Any RNG draw maps onto a real canned line.
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        for _ in 0..64 {
            let flash = fallback_news(&mut rng);
            assert!(FALLBACK_TICKERS.contains(&flash.message.as_str()));
        }
    }
}
