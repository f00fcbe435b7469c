//! Integration tests for the AI provider boundary
//!
//! The provider must be infallible from the caller's side: every failure
//! class resolves to a locally generated layout, and quota/timeout class
//! failures silence the remote for the rest of the session.

use chaos_city::provider::{AiProvider, LlmClient, FALLBACK_TICKERS};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

#[tokio::test]
async fn test_offline_provider_generates_locally() {
    let provider = AiProvider::offline();
    let mut rng = ChaCha8Rng::seed_from_u64(1);

    let layout = provider.fetch_city(2, &mut rng).await;
    assert!(!layout.blocks.is_empty());
    assert!(layout.name.contains("(Sector 2)"));
    assert_eq!(provider.breaker().network_attempts(), 0);
}

#[tokio::test]
async fn test_open_breaker_skips_network_for_ten_calls() {
    // Client configured, but the breaker has already been tripped (as a
    // timeout would): all traffic must stay local.
    let client = LlmClient::new(
        "test-key".into(),
        "http://127.0.0.1:9/v1/chat".into(),
        "test-model".into(),
    );
    let provider = AiProvider::new(Some(client));
    provider.breaker().trip();

    let mut rng = ChaCha8Rng::seed_from_u64(2);
    for level in 1..=10 {
        let layout = provider.fetch_city(level, &mut rng).await;
        assert!(!layout.blocks.is_empty());
        assert!(
            layout.name.contains(&format!("(Sector {})", level)),
            "expected local fallback, got {}",
            layout.name
        );
    }
    assert_eq!(
        provider.breaker().network_attempts(),
        0,
        "open breaker must not attempt network access"
    );

    // The companion news provider shares the breaker.
    let flash = provider.fetch_news(5000, &mut rng).await;
    assert!(FALLBACK_TICKERS.contains(&flash.message.as_str()));
    assert_eq!(provider.breaker().network_attempts(), 0);
}

#[tokio::test]
async fn test_connection_failure_falls_back_without_tripping() {
    // Nothing listens on port 9; the connection error is transient, so the
    // breaker stays closed and a later call may try the network again.
    let client = LlmClient::new(
        "test-key".into(),
        "http://127.0.0.1:9/v1/chat".into(),
        "test-model".into(),
    );
    let provider = AiProvider::new(Some(client));
    let mut rng = ChaCha8Rng::seed_from_u64(3);

    let layout = provider.fetch_city(1, &mut rng).await;
    assert!(!layout.blocks.is_empty());
    assert!(layout.name.contains("(Sector 1)"));
    assert!(!provider.breaker().is_open());
    assert_eq!(provider.breaker().network_attempts(), 1);

    let _ = provider.fetch_city(2, &mut rng).await;
    assert_eq!(provider.breaker().network_attempts(), 2);
}

#[tokio::test]
async fn test_timeout_trips_breaker_then_all_calls_resolve_locally() {
    // A server that accepts connections and never responds: the 5-second
    // timeout race must fire, fall back locally, and open the breaker.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut held = Vec::new();
        loop {
            if let Ok((stream, _)) = listener.accept().await {
                held.push(stream);
            }
        }
    });

    let client = LlmClient::new(
        "test-key".into(),
        format!("http://{}/v1/chat", addr),
        "test-model".into(),
    );
    let provider = AiProvider::new(Some(client));
    let mut rng = ChaCha8Rng::seed_from_u64(4);

    let layout = provider.fetch_city(1, &mut rng).await;
    assert!(!layout.blocks.is_empty(), "timeout must still yield a city");
    assert!(provider.breaker().is_open(), "timeout must trip the breaker");
    assert_eq!(provider.breaker().network_attempts(), 1);

    // Ten subsequent calls resolve locally without touching the network.
    for level in 2..=11 {
        let layout = provider.fetch_city(level, &mut rng).await;
        assert!(!layout.blocks.is_empty());
    }
    assert_eq!(provider.breaker().network_attempts(), 1);
}
