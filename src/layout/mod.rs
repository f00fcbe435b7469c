//! Procedural city layout synthesis

pub mod generator;

pub use generator::{generate, CityBuilder, MIN_BLOCK_HEIGHT, PLAYFIELD_BOUND};
