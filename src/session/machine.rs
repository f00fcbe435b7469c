//! Session state machine
//!
//! IDLE -> PLAYING -> LEVEL_CLEARED -> (next level) -> PLAYING -> ...
//! with no terminal state; levels increase indefinitely.
//!
//! All state changes go through explicit transition functions invoked by
//! the driving loop. Level loads are asynchronous from the machine's point
//! of view: `begin_level` hands out a request carrying a generation token,
//! and `install_layout` rejects any token that is no longer current, so a
//! stale fetch can never populate a newer level's world.

use crate::core::config::config;
use crate::core::types::CityLayout;
use crate::session::state::{GameState, GameStatus};

/// Opaque token tying a layout fetch to the level start that requested it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelToken(u64);

/// A layout request the caller must fulfil (AI provider or generator)
#[derive(Debug, Clone, Copy)]
pub struct LevelRequest {
    pub level: u32,
    pub token: LevelToken,
}

/// Events emitted by session transitions, for UI/audio collaborators
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// Score advanced but the level target is not yet reached
    Progress { chaos_score: u64, chaos_level: f64 },
    /// Target reached: the one-shot win transition. Fires exactly once per
    /// level.
    LevelCleared { level: u32, chaos_score: u64 },
}

/// Owns the game state and the active layout; the single writer for both.
pub struct Session {
    state: GameState,
    layout: Option<CityLayout>,
    /// Bumped on every level start; stale fetches carry an older value
    generation: u64,
}

impl Session {
    pub fn new() -> Self {
        Self {
            state: GameState::initial(),
            layout: None,
            generation: 0,
        }
    }

    /// Session starting at a given level (replay/debugging convenience)
    pub fn starting_at(level: u32) -> Self {
        let mut session = Self::new();
        session.state.level = level.max(1);
        session
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn layout(&self) -> Option<&CityLayout> {
        self.layout.as_ref()
    }

    /// Score required to clear the current level
    pub fn target_score(&self) -> u64 {
        self.state.level as u64 * config().level_target_base
    }

    /// Start loading the current level. The session goes idle until the
    /// returned request is fulfilled via [`Session::install_layout`].
    pub fn begin_level(&mut self) -> LevelRequest {
        self.generation += 1;
        self.state.game_status = GameStatus::Idle;
        self.state.is_level_active = false;
        tracing::info!(level = self.state.level, "level load requested");
        LevelRequest {
            level: self.state.level,
            token: LevelToken(self.generation),
        }
    }

    /// Install a fetched layout. Returns false (and changes nothing) if the
    /// token is stale, i.e. a newer `begin_level` superseded this request.
    pub fn install_layout(&mut self, token: LevelToken, layout: CityLayout) -> bool {
        if token.0 != self.generation {
            tracing::debug!(
                level = self.state.level,
                city = %layout.name,
                "stale layout discarded"
            );
            return false;
        }

        tracing::info!(
            level = self.state.level,
            city = %layout.name,
            blocks = layout.block_count(),
            "level started"
        );
        self.layout = Some(layout);
        self.state.chaos_score = 0;
        self.state.chaos_level = 0.0;
        self.state.is_level_active = true;
        self.state.game_status = GameStatus::Playing;
        true
    }

    /// Apply a score delta. Ignored unless the session is PLAYING, so score
    /// can never change retroactively after a clear.
    pub fn on_score_event(&mut self, delta: u64) -> Option<SessionEvent> {
        if self.state.game_status != GameStatus::Playing {
            return None;
        }

        let new_score = self.state.chaos_score + delta;
        let target = self.target_score();
        self.state.chaos_score = new_score;

        if new_score >= target {
            self.state.chaos_level = 100.0;
            self.state.game_status = GameStatus::LevelCleared;
            // Simulation pauses here: the tableau freezes for the clear
            // screen and ticks stop burning CPU.
            self.state.is_level_active = false;
            tracing::info!(
                level = self.state.level,
                chaos_score = new_score,
                "level cleared"
            );
            Some(SessionEvent::LevelCleared {
                level: self.state.level,
                chaos_score: new_score,
            })
        } else {
            self.state.chaos_level = (100.0 * new_score as f64 / target as f64).min(100.0);
            Some(SessionEvent::Progress {
                chaos_score: new_score,
                chaos_level: self.state.chaos_level,
            })
        }
    }

    /// Move to the next level and immediately request its layout. The level
    /// change and the load are one causally-linked transition; any fetch
    /// still in flight for the previous level is invalidated by the new
    /// token.
    pub fn advance_level(&mut self) -> LevelRequest {
        self.state.level += 1;
        self.begin_level()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
