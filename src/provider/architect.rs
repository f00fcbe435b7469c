//! AI architect: remote city layouts behind a hard local fallback
//!
//! The provider races every remote call against a hard timeout, validates
//! the response against the block catalog, and on ANY failure silently
//! returns a locally generated layout for the same level. Callers never
//! observe a provider failure. Quota and timeout failures additionally trip
//! the session circuit breaker so a known-bad remote cannot keep degrading
//! level starts.

use crate::core::config::config;
use crate::core::error::{ChaosError, Result};
use crate::core::types::{BlockType, CityLayout};
use crate::layout::generator::{generate, CityBuilder};
use crate::provider::breaker::{CircuitBreaker, FailureClass};
use crate::provider::client::LlmClient;
use rand::Rng;
use serde::Deserialize;
use std::time::Duration;

/// System prompt for the city architect persona
const ARCHITECT_SYSTEM_PROMPT: &str = "\
You are an arrogant AI architect who designs 'absolutely quake-proof' cities \
and taunts the monster trying to flatten them. Respond with a single JSON \
object: {\"name\": string, \"architectNote\": string, \"blocks\": \
[{\"x\": int, \"y\": int, \"z\": int, \"type\": string}]}. Coordinates must \
stay within x: -8..8, z: -8..8, y: 0.5..15. Block types: CONCRETE (gray, \
structural), GLASS (blue, fragile), EXPLOSIVE (red, volatile), GOLD (the \
vault). Hide explosives at structural weak points and bury the gold deep.";

/// Architect note used when the remote response omits one
const DEFAULT_ARCHITECT_NOTE: &str = "Structural integrity: 100%.";

/// Remote response schema. Any deviation (missing name, empty or missing
/// block list, unknown type string) is a validation failure.
#[derive(Debug, Deserialize)]
struct RawCityResponse {
    name: String,
    #[serde(rename = "architectNote")]
    architect_note: Option<String>,
    #[serde(default)]
    blocks: Vec<RawBlock>,
}

#[derive(Debug, Deserialize)]
struct RawBlock {
    x: i64,
    y: i64,
    z: i64,
    #[serde(rename = "type")]
    block_type: String,
}

/// Layout (and news) source with remote AI and deterministic local
/// fallback. One instance per process; it owns the session circuit
/// breaker.
pub struct AiProvider {
    client: Option<LlmClient>,
    breaker: CircuitBreaker,
}

impl AiProvider {
    pub fn new(client: Option<LlmClient>) -> Self {
        Self {
            client,
            breaker: CircuitBreaker::new(),
        }
    }

    /// Build from environment; without LLM_API_KEY the provider runs in
    /// pure local-fallback mode.
    pub fn from_env() -> Self {
        let client = LlmClient::from_env().ok();
        if client.is_none() {
            tracing::warn!("LLM_API_KEY not set - running with local city generation only");
        }
        Self::new(client)
    }

    /// Provider that never touches the network
    pub fn offline() -> Self {
        Self::new(None)
    }

    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    pub(crate) fn available_client(&self) -> Option<&LlmClient> {
        if self.breaker.is_open() {
            return None;
        }
        self.client.as_ref()
    }

    /// Fetch a city layout for the level. Infallible: every remote failure
    /// resolves to the local generator's output for the same level.
    pub async fn fetch_city(&self, level: u32, rng: &mut impl Rng) -> CityLayout {
        let Some(client) = self.available_client() else {
            return generate(level, rng);
        };

        match self.fetch_city_remote(client, level).await {
            Ok(layout) => {
                tracing::info!(level, city = %layout.name, blocks = layout.block_count(), "AI city received");
                layout
            }
            Err(err) => {
                let class = classify_failure(&err);
                self.breaker.record_failure(class);
                tracing::warn!(level, %err, ?class, "AI city generation failed; using local generator");
                generate(level, rng)
            }
        }
    }

    async fn fetch_city_remote(&self, client: &LlmClient, level: u32) -> Result<CityLayout> {
        self.breaker.note_attempt();
        let timeout_secs = config().provider_timeout_secs;
        let user_prompt = format!(
            "Generate the city layout for level {}. Design a complex of roughly \
             100-200 blocks. Towers, bridges, strange structures welcome.",
            level
        );

        let response = tokio::time::timeout(
            Duration::from_secs(timeout_secs),
            client.complete(ARCHITECT_SYSTEM_PROMPT, &user_prompt),
        )
        .await
        .map_err(|_| ChaosError::ProviderTimeout(timeout_secs))??;

        parse_city_response(&response, level)
    }
}

/// Decide whether a failure condemns the remote for the whole session.
pub fn classify_failure(err: &ChaosError) -> FailureClass {
    match err {
        ChaosError::ProviderTimeout(_) => FailureClass::SessionFatal,
        ChaosError::Provider(msg) => {
            let msg = msg.to_lowercase();
            if msg.contains("429") || msg.contains("quota") || msg.contains("rate limit") {
                FailureClass::SessionFatal
            } else {
                FailureClass::Transient
            }
        }
        _ => FailureClass::Transient,
    }
}

/// Extract the JSON object from a model response that may wrap it in prose
/// or markdown fences.
pub(crate) fn extract_json(response: &str) -> Result<&str> {
    let start = response
        .find('{')
        .ok_or_else(|| ChaosError::Provider("no JSON object in response".into()))?;
    let end = response
        .rfind('}')
        .ok_or_else(|| ChaosError::Provider("unterminated JSON object in response".into()))?;
    if end < start {
        return Err(ChaosError::Provider("malformed JSON object in response".into()));
    }
    Ok(&response[start..=end])
}

/// Validate a remote response and assemble the layout. Blocks flow through
/// the same builder as procedural generation, so id assignment, position
/// dedupe, and bounds clamping are identical for both sources.
fn parse_city_response(response: &str, level: u32) -> Result<CityLayout> {
    let json = extract_json(response)?;
    let raw: RawCityResponse = serde_json::from_str(json)?;

    if raw.blocks.is_empty() {
        return Err(ChaosError::InvalidLayout("empty block list".into()));
    }

    let mut city = CityBuilder::new();
    for raw_block in &raw.blocks {
        let block_type: BlockType = raw_block.block_type.parse()?;
        city.place(
            raw_block.x as f64,
            raw_block.y as f64,
            raw_block.z as f64,
            block_type,
        );
    }

    let name = if raw.name.trim().is_empty() {
        format!("City Sector {}", level)
    } else {
        raw.name
    };
    let note = raw
        .architect_note
        .unwrap_or_else(|| DEFAULT_ARCHITECT_NOTE.to_string());

    Ok(city.finish(name, note))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_response() {
        let response = r#"{
            "name": "Neon Bastion",
            "architectNote": "Try me, lizard.",
            "blocks": [
                {"x": 0, "y": 1, "z": 0, "type": "CONCRETE"},
                {"x": 1, "y": 1, "z": 0, "type": "GOLD"}
            ]
        }"#;
        let layout = parse_city_response(response, 3).unwrap();
        assert_eq!(layout.name, "Neon Bastion");
        assert_eq!(layout.block_count(), 2);
        assert_eq!(layout.blocks[1].block_type, BlockType::Gold);
    }

    #[test]
    fn test_parse_strips_markdown_fences() {
        let response = "Here is your doomed city:\n```json\n{\"name\": \"Walled\", \"blocks\": [{\"x\": 0, \"y\": 1, \"z\": 0, \"type\": \"GLASS\"}]}\n```";
        let layout = parse_city_response(response, 1).unwrap();
        assert_eq!(layout.name, "Walled");
        assert_eq!(layout.block_count(), 1);
    }

    #[test]
    fn test_unknown_block_type_is_validation_failure() {
        let response = r#"{"name": "Bad", "blocks": [{"x": 0, "y": 1, "z": 0, "type": "ADAMANTIUM"}]}"#;
        let err = parse_city_response(response, 1).unwrap_err();
        assert!(matches!(err, ChaosError::UnknownBlockType(_)));
    }

    #[test]
    fn test_empty_block_list_rejected() {
        let response = r#"{"name": "Hollow", "blocks": []}"#;
        let err = parse_city_response(response, 1).unwrap_err();
        assert!(matches!(err, ChaosError::InvalidLayout(_)));
    }

    #[test]
    fn test_missing_name_rejected() {
        let response = r#"{"blocks": [{"x": 0, "y": 1, "z": 0, "type": "GLASS"}]}"#;
        assert!(parse_city_response(response, 1).is_err());
    }

    #[test]
    fn test_missing_note_gets_default() {
        let response = r#"{"name": "Stoic", "blocks": [{"x": 0, "y": 1, "z": 0, "type": "GLASS"}]}"#;
        let layout = parse_city_response(response, 1).unwrap();
        assert_eq!(layout.architect_note, DEFAULT_ARCHITECT_NOTE);
    }

    #[test]
    fn test_duplicate_remote_positions_deduped() {
        let response = r#"{"name": "Echo", "blocks": [
            {"x": 2, "y": 1, "z": 2, "type": "CONCRETE"},
            {"x": 2, "y": 1, "z": 2, "type": "CONCRETE"}
        ]}"#;
        let layout = parse_city_response(response, 1).unwrap();
        assert_eq!(layout.block_count(), 1);
    }

    #[test]
    fn test_classify_timeout_is_session_fatal() {
        assert_eq!(
            classify_failure(&ChaosError::ProviderTimeout(5)),
            FailureClass::SessionFatal
        );
    }

    #[test]
    fn test_classify_quota_is_session_fatal() {
        for msg in ["API error 429: slow down", "Exceeded quota", "rate limit hit"] {
            assert_eq!(
                classify_failure(&ChaosError::Provider(msg.into())),
                FailureClass::SessionFatal,
                "{} should be session fatal",
                msg
            );
        }
    }

    #[test]
    fn test_classify_other_errors_transient() {
        assert_eq!(
            classify_failure(&ChaosError::Provider("connection reset".into())),
            FailureClass::Transient
        );
        assert_eq!(
            classify_failure(&ChaosError::InvalidLayout("empty block list".into())),
            FailureClass::Transient
        );
    }

    #[test]
    fn test_extract_json_rejects_proseless_garbage() {
        assert!(extract_json("no json here").is_err());
    }
}
