//! Game session layer: state machine, score routing, presentation cues

pub mod bridge;
pub mod machine;
pub mod state;

pub use bridge::{route_events, swing_cue, Cue};
pub use machine::{LevelRequest, LevelToken, Session, SessionEvent};
pub use state::{GameState, GameStatus};
