//! Core type definitions used throughout the codebase

use crate::core::error::{ChaosError, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Unique identifier for city blocks, sequential within a layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlockId(pub u32);

/// Simulation tick counter
pub type Tick = u64;

/// 3D position in world space
///
/// Serialized as a plain `[x, y, z]` array so layout snapshots match the
/// wire schema consumed by rendering collaborators.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 3]", into = "[f64; 3]")]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

impl From<[f64; 3]> for Vec3 {
    fn from([x, y, z]: [f64; 3]) -> Self {
        Self { x, y, z }
    }
}

impl From<Vec3> for [f64; 3] {
    fn from(v: Vec3) -> Self {
        [v.x, v.y, v.z]
    }
}

/// Material category of a city block
///
/// Every block type maps to a fixed catalog entry (color, mass, base score,
/// restitution). Construction from an unrecognized type name is a hard
/// validation error, never a silent default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BlockType {
    /// Structural core material
    Concrete,
    /// Fragile perimeter/decorative material
    Glass,
    /// Detonates under strong impact
    Explosive,
    /// Highest-value vault/apex material
    Gold,
}

impl BlockType {
    /// All catalog entries, in display order
    pub const ALL: [BlockType; 4] = [
        BlockType::Concrete,
        BlockType::Glass,
        BlockType::Explosive,
        BlockType::Gold,
    ];

    /// Display color (hex) for rendering collaborators
    pub fn color(&self) -> &'static str {
        match self {
            BlockType::Concrete => "#888888",
            BlockType::Glass => "#88ccff",
            BlockType::Explosive => "#ff3300",
            BlockType::Gold => "#ffd700",
        }
    }

    /// Rigid-body mass
    pub fn mass(&self) -> f64 {
        match self {
            BlockType::Concrete => 10.0,
            BlockType::Glass => 2.0,
            BlockType::Explosive => 5.0,
            BlockType::Gold => 20.0,
        }
    }

    /// Points awarded for displacing this block (fall value is 2x this)
    pub fn base_score(&self) -> u64 {
        match self {
            BlockType::Concrete => 10,
            BlockType::Glass => 5,
            BlockType::Explosive => 50,
            BlockType::Gold => 100,
        }
    }

    /// Collider restitution. Explosive blocks bounce hard to simulate
    /// blast propulsion.
    pub fn restitution(&self) -> f64 {
        match self {
            BlockType::Explosive => 1.1,
            _ => 0.1,
        }
    }

    /// Catalog key as it appears on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockType::Concrete => "CONCRETE",
            BlockType::Glass => "GLASS",
            BlockType::Explosive => "EXPLOSIVE",
            BlockType::Gold => "GOLD",
        }
    }
}

impl FromStr for BlockType {
    type Err = ChaosError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "CONCRETE" => Ok(BlockType::Concrete),
            "GLASS" => Ok(BlockType::Glass),
            "EXPLOSIVE" => Ok(BlockType::Explosive),
            "GOLD" => Ok(BlockType::Gold),
            other => Err(ChaosError::UnknownBlockType(other.to_string())),
        }
    }
}

/// A single placed city block
///
/// Immutable once placed into a layout. Color and mass are derived from the
/// type catalog at construction so downstream consumers never re-derive them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Block {
    pub id: BlockId,
    pub position: Vec3,
    #[serde(rename = "type")]
    pub block_type: BlockType,
    pub color: String,
    pub mass: f64,
}

impl Block {
    pub fn new(id: BlockId, position: Vec3, block_type: BlockType) -> Self {
        Self {
            id,
            position,
            block_type,
            color: block_type.color().to_string(),
            mass: block_type.mass(),
        }
    }
}

/// A generated or AI-provided city: the full set of placed blocks for one
/// level, plus flavor text from its "architect"
///
/// Immutable; discarded wholesale when the next level starts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CityLayout {
    pub name: String,
    pub architect_note: String,
    pub blocks: Vec<Block>,
}

impl CityLayout {
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Total fall value of the layout (2x base score per block), an upper
    /// bound on what full destruction can earn
    pub fn max_fall_score(&self) -> u64 {
        self.blocks
            .iter()
            .map(|b| 2 * b.block_type.base_score())
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_values() {
        assert_eq!(BlockType::Concrete.mass(), 10.0);
        assert_eq!(BlockType::Concrete.base_score(), 10);
        assert_eq!(BlockType::Glass.mass(), 2.0);
        assert_eq!(BlockType::Glass.base_score(), 5);
        assert_eq!(BlockType::Explosive.mass(), 5.0);
        assert_eq!(BlockType::Explosive.base_score(), 50);
        assert_eq!(BlockType::Gold.mass(), 20.0);
        assert_eq!(BlockType::Gold.base_score(), 100);
    }

    #[test]
    fn test_block_type_parse_roundtrip() {
        for bt in BlockType::ALL {
            assert_eq!(BlockType::from_str(bt.as_str()).unwrap(), bt);
        }
    }

    #[test]
    fn test_unknown_block_type_is_error() {
        let err = BlockType::from_str("PLUTONIUM").unwrap_err();
        assert!(matches!(err, ChaosError::UnknownBlockType(_)));
    }

    #[test]
    fn test_block_derives_catalog_fields() {
        let block = Block::new(BlockId(0), Vec3::new(1.0, 0.5, -2.0), BlockType::Gold);
        assert_eq!(block.color, "#ffd700");
        assert_eq!(block.mass, 20.0);
    }

    #[test]
    fn test_position_serializes_as_array() {
        let block = Block::new(BlockId(3), Vec3::new(1.0, 2.0, 3.0), BlockType::Glass);
        let json = serde_json::to_value(&block).unwrap();
        assert_eq!(json["position"], serde_json::json!([1.0, 2.0, 3.0]));
        assert_eq!(json["type"], "GLASS");
    }

    #[test]
    fn test_layout_serializes_camel_case() {
        let layout = CityLayout {
            name: "Test Sector".into(),
            architect_note: "note".into(),
            blocks: vec![],
        };
        let json = serde_json::to_value(&layout).unwrap();
        assert!(json.get("architectNote").is_some());
    }

    #[test]
    fn test_max_fall_score() {
        let layout = CityLayout {
            name: "n".into(),
            architect_note: "a".into(),
            blocks: vec![
                Block::new(BlockId(0), Vec3::default(), BlockType::Concrete),
                Block::new(BlockId(1), Vec3::default(), BlockType::Gold),
            ],
        };
        // 2*10 + 2*100
        assert_eq!(layout.max_fall_score(), 220);
    }
}
