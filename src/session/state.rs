//! Game session state snapshot

use serde::{Deserialize, Serialize};

/// Lifecycle status of the current level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GameStatus {
    /// Waiting for a level to load
    Idle,
    /// Level active, events scored
    Playing,
    /// Target reached; tableau frozen for the clear screen
    LevelCleared,
}

/// Snapshot of the session's mutable state
///
/// A single instance is owned by the session state machine and mutated only
/// through its transition functions. `chaos_score` is monotonically
/// non-decreasing within a level and resets to 0 at level start.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    pub chaos_score: u64,
    /// Progress toward the level target, 0..=100
    pub chaos_level: f64,
    pub level: u32,
    pub is_level_active: bool,
    pub game_status: GameStatus,
}

impl GameState {
    pub fn initial() -> Self {
        Self {
            chaos_score: 0,
            chaos_level: 0.0,
            level: 1,
            is_level_active: false,
            game_status: GameStatus::Idle,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state() {
        let state = GameState::initial();
        assert_eq!(state.level, 1);
        assert_eq!(state.chaos_score, 0);
        assert_eq!(state.game_status, GameStatus::Idle);
        assert!(!state.is_level_active);
    }

    #[test]
    fn test_status_serializes_screaming_snake() {
        let json = serde_json::to_value(GameStatus::LevelCleared).unwrap();
        assert_eq!(json, "LEVEL_CLEARED");
    }
}
