pub mod config;
pub mod error;
pub mod types;

pub use config::{config, ChaosConfig};
pub use error::{ChaosError, Result};
pub use types::{Block, BlockId, BlockType, CityLayout, Tick, Vec3};
