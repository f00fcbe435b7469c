//! Score/event bridge
//!
//! Translates physics events into score deltas applied to the session and
//! presentation cues for audio/visual collaborators. The bridge is the only
//! path from simulation output to score mutation, so the session's
//! monotonicity rules hold for every event source.

use crate::physics::events::PhysicsEvent;
use crate::session::machine::{Session, SessionEvent};

/// Presentation cues for rendering/audio collaborators. The core emits
/// these; playing sounds or flashing screens is someone else's job.
#[derive(Debug, Clone, PartialEq)]
pub enum Cue {
    /// Impactor press: the swing wind-up
    Swing,
    /// A block was struck; intensity in [0, 1] scales volume
    Smash { intensity: f64 },
    /// An explosive block detonated
    Explosion,
    /// Level target reached; fires exactly once per level
    Win,
}

/// Route one tick's physics events through the session.
///
/// Fall values are applied in event order, so score accumulation follows
/// body-iteration order within the tick. Returns the cues the tick
/// produced.
pub fn route_events(session: &mut Session, events: &[PhysicsEvent]) -> Vec<Cue> {
    let mut cues = Vec::new();
    for event in events {
        match event {
            PhysicsEvent::Impact { intensity, .. } => {
                cues.push(Cue::Smash {
                    intensity: *intensity,
                });
            }
            PhysicsEvent::Detonated { .. } => {
                cues.push(Cue::Explosion);
            }
            PhysicsEvent::BlockFell { value, .. } => {
                if let Some(SessionEvent::LevelCleared { .. }) = session.on_score_event(*value) {
                    cues.push(Cue::Win);
                }
            }
        }
    }
    cues
}

/// Cue for the input-press signal that drops the impactor.
pub fn swing_cue() -> Cue {
    Cue::Swing
}
