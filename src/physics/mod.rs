//! Rigid-body simulation layer

pub mod events;
pub mod world;

pub use events::PhysicsEvent;
pub use world::PhysicsWorld;
