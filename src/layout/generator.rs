//! Deterministic procedural city generation
//!
//! `generate` is the universal layout source: it always terminates, always
//! produces a non-empty city, and never fails. The AI architect provider
//! falls back to it on every failure path, so the whole game can run with
//! nothing but this module.
//!
//! Seven architectural patterns rotate with the level number. Each pattern
//! is a fixed placement rule parameterized by level (height/size/density),
//! assigning block types by structural role: concrete cores, glass
//! perimeters, sparse explosive upgrades, gold at apexes and vaults.

use crate::core::types::{Block, BlockId, BlockType, CityLayout, Vec3};
use ahash::AHashSet;
use rand::Rng;
use std::f64::consts::PI;

/// Blocks are clamped into x,z within +/- this bound so every layout fits
/// the playable floor footprint.
pub const PLAYFIELD_BOUND: f64 = 9.0;

/// Minimum block center height; blocks sit on a 1-unit lattice starting
/// half a unit above the floor surface.
pub const MIN_BLOCK_HEIGHT: f64 = 0.5;

/// Architect note attached to locally generated layouts
pub const OFFLINE_ARCHITECT_NOTE: &str = "Local defense grid online. Architect uplink offline.";

const PATTERN_NAMES: [&str; 7] = [
    "The Great Wall",
    "Twin Towers",
    "Mega Pyramid",
    "Neo Castle",
    "DNA Helix",
    "Suspension Bridge",
    "Metropolis Grid",
];

/// Accumulates blocks for a layout: assigns sequential ids, skips exact
/// duplicate positions, and clamps every placement into the playfield.
///
/// Both the procedural patterns and validated AI layouts are funneled
/// through this builder so id assignment and position rules are identical
/// for either source.
pub struct CityBuilder {
    blocks: Vec<Block>,
    occupied: AHashSet<(i64, i64, i64)>,
    next_id: u32,
}

impl CityBuilder {
    pub fn new() -> Self {
        Self {
            blocks: Vec::new(),
            occupied: AHashSet::new(),
            next_id: 0,
        }
    }

    /// Place a block, clamping the position into bounds. Emissions that
    /// land on an already-occupied position are skipped.
    pub fn place(&mut self, x: f64, y: f64, z: f64, block_type: BlockType) {
        let x = x.clamp(-PLAYFIELD_BOUND, PLAYFIELD_BOUND);
        let z = z.clamp(-PLAYFIELD_BOUND, PLAYFIELD_BOUND);
        let y = y.max(MIN_BLOCK_HEIGHT);

        if !self.occupied.insert(quantize(x, y, z)) {
            return;
        }

        let id = BlockId(self.next_id);
        self.next_id += 1;
        self.blocks.push(Block::new(id, Vec3::new(x, y, z), block_type));
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn finish(self, name: String, architect_note: String) -> CityLayout {
        CityLayout {
            name,
            architect_note,
            blocks: self.blocks,
        }
    }
}

impl Default for CityBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Quantized position key for exact-duplicate detection. Pattern geometry
/// uses half-unit offsets, so millimeter resolution is far finer than any
/// legitimate spacing.
fn quantize(x: f64, y: f64, z: f64) -> (i64, i64, i64) {
    (
        (x * 1000.0).round() as i64,
        (y * 1000.0).round() as i64,
        (z * 1000.0).round() as i64,
    )
}

/// Generate the city layout for a level.
///
/// Pattern selection is `(level - 1) % 7`; the level also scales pattern
/// dimensions (clamped, never rejected). The RNG drives sparse type
/// upgrades and density variation only, so any seed yields a structurally
/// valid city.
pub fn generate(level: u32, rng: &mut impl Rng) -> CityLayout {
    let level = level.max(1);
    let pattern = ((level - 1) % 7) as usize;
    let mut city = CityBuilder::new();

    match pattern {
        0 => great_wall(level, &mut city, rng),
        1 => twin_towers(level, &mut city),
        2 => mega_pyramid(level, &mut city, rng),
        3 => neo_castle(level, &mut city),
        4 => dna_helix(level, &mut city),
        5 => suspension_bridge(level, &mut city, rng),
        _ => metropolis_grid(level, &mut city, rng),
    }

    // Generator contract: never empty.
    if city.is_empty() {
        city.place(0.0, MIN_BLOCK_HEIGHT, 0.0, BlockType::Concrete);
    }

    tracing::debug!(
        level,
        pattern = PATTERN_NAMES[pattern],
        blocks = city.len(),
        "generated procedural city"
    );

    city.finish(
        format!("{} (Sector {})", PATTERN_NAMES[pattern], level),
        OFFLINE_ARCHITECT_NOTE.to_string(),
    )
}

/// A long fortification spanning the playfield, one block deep with a
/// scattered glass backline. Explosives seed every third story.
fn great_wall(level: u32, city: &mut CityBuilder, rng: &mut impl Rng) {
    let stories = (6 + level as i64).min(24);
    for y in 0..stories {
        let fy = MIN_BLOCK_HEIGHT + y as f64;
        let mut x = -8.0;
        while x <= 8.0 {
            let block_type = if y % 3 == 0 && rng.gen_bool(0.3) {
                BlockType::Explosive
            } else {
                BlockType::Concrete
            };
            city.place(x, fy, 0.0, block_type);
            if rng.gen_bool(0.4) {
                city.place(x, fy, 1.0, BlockType::Glass);
            }
            x += 1.5;
        }
    }
}

/// Two 3x3 glass towers with gold crowns and an explosive core column
/// every fourth story.
fn twin_towers(level: u32, city: &mut CityBuilder) {
    let height = (12 + level as i64).min(32);
    for &center_x in &[-3.0, 3.0] {
        for y in 0..height {
            let fy = MIN_BLOCK_HEIGHT + y as f64;
            for x in -1..=1_i64 {
                for z in -1..=1_i64 {
                    let mut block_type = BlockType::Glass;
                    if x == 0 && z == 0 && y % 4 == 0 {
                        block_type = BlockType::Explosive;
                    }
                    if y == height - 1 {
                        block_type = BlockType::Gold;
                    }
                    city.place(center_x + x as f64, fy, z as f64, block_type);
                }
            }
        }
    }
}

/// A stepped pyramid with a mostly hollow interior (about 20% fill), glass
/// faces, a concrete frame, and a gold cap layer.
fn mega_pyramid(level: u32, city: &mut CityBuilder, rng: &mut impl Rng) {
    let size = (8 + level as i64 / 2).min(16);
    for y in 0..size {
        let range = size as f64 / 2.0 - y as f64 / 2.0;
        if range < 0.0 {
            break;
        }
        let fy = MIN_BLOCK_HEIGHT + y as f64;
        let mut x = -range;
        while x <= range {
            let mut z = -range;
            while z <= range {
                let interior = x.abs() < range - 1.0 && z.abs() < range - 1.0 && y < size - 2;
                if interior && !rng.gen_bool(0.2) {
                    z += 1.0;
                    continue;
                }
                let block_type = if y == size - 1 {
                    BlockType::Gold
                } else if x.abs() >= range - 0.5 || z.abs() >= range - 0.5 {
                    BlockType::Glass
                } else {
                    BlockType::Concrete
                };
                city.place(x, fy, z, block_type);
                z += 1.0;
            }
            x += 1.0;
        }
    }
}

/// Four 2x2 corner keeps with gold vaults, joined by low curtain walls
/// whose footing course is explosive.
fn neo_castle(level: u32, city: &mut CityBuilder) {
    let keep_height = (8 + level as i64 / 4).min(14);
    for &(cx, cz) in &[(-5.0, -5.0), (5.0, -5.0), (-5.0, 5.0), (5.0, 5.0)] {
        for y in 0..keep_height {
            let fy = MIN_BLOCK_HEIGHT + y as f64;
            city.place(cx, fy, cz, BlockType::Concrete);
            city.place(cx + 1.0, fy, cz, BlockType::Concrete);
            city.place(cx, fy, cz + 1.0, BlockType::Concrete);
            city.place(cx + 1.0, fy, cz + 1.0, BlockType::Concrete);
        }
        city.place(
            cx + 0.5,
            MIN_BLOCK_HEIGHT + keep_height as f64,
            cz + 0.5,
            BlockType::Gold,
        );
    }

    for x in -4..=5_i64 {
        let fx = x as f64;
        for &wall_z in &[-5.0, 5.0] {
            city.place(fx, 0.5, wall_z, BlockType::Explosive);
            city.place(fx, 1.5, wall_z, BlockType::Concrete);
            city.place(fx, 2.5, wall_z, BlockType::Glass);
        }
    }
}

/// A double helix: a glass strand and a gold strand winding around the
/// center, joined by explosive rungs every other story.
fn dna_helix(level: u32, city: &mut CityBuilder) {
    let height = (20 + level as i64).min(40);
    let radius = 4.0;
    for y in 0..height {
        let fy = MIN_BLOCK_HEIGHT + y as f64;
        let angle_a = y as f64 * 0.5;
        let angle_b = angle_a + PI;
        city.place(angle_a.cos() * radius, fy, angle_a.sin() * radius, BlockType::Glass);
        city.place(angle_b.cos() * radius, fy, angle_b.sin() * radius, BlockType::Gold);
        if y % 2 == 0 {
            let mx = (angle_a.cos() + angle_b.cos()) * radius / 2.0;
            let mz = (angle_a.sin() + angle_b.sin()) * radius / 2.0;
            city.place(mx, fy, mz, BlockType::Explosive);
        }
    }
}

/// An elevated deck between two pylons capped with gold. Odd deck segments
/// occasionally carry explosive charges.
fn suspension_bridge(level: u32, city: &mut CityBuilder, rng: &mut impl Rng) {
    let pylon_height = (10 + level as i64 / 3).min(16);

    for x in -8..=8_i64 {
        let fx = x as f64;
        let block_type = if x % 2 != 0 && rng.gen_bool(0.25) {
            BlockType::Explosive
        } else {
            BlockType::Concrete
        };
        city.place(fx, 4.5, 0.0, block_type);
        if x % 2 == 0 {
            city.place(fx, 4.5, 1.0, BlockType::Glass);
            city.place(fx, 4.5, -1.0, BlockType::Glass);
        }
    }

    for &px in &[-5.0, 5.0] {
        for y in 0..pylon_height {
            let fy = MIN_BLOCK_HEIGHT + y as f64;
            city.place(px, fy, 0.0, BlockType::Concrete);
            city.place(px, fy, 1.0, BlockType::Concrete);
            city.place(px, fy, -1.0, BlockType::Concrete);
        }
        city.place(px, MIN_BLOCK_HEIGHT + pylon_height as f64, 0.0, BlockType::Gold);
    }
}

/// A street grid of towers with randomized heights: concrete cores below,
/// glass above, gold caps on about half the towers.
fn metropolis_grid(level: u32, city: &mut CityBuilder, rng: &mut impl Rng) {
    let height_spread = (5 + level as i64).min(20) as u64;
    let mut x = -6_i64;
    while x <= 6 {
        let mut z = -6_i64;
        while z <= 6 {
            let fx = x as f64;
            let fz = z as f64;
            let height = 5 + rng.gen_range(0..height_spread) as i64;
            for y in 0..height {
                let core = (y as f64) < height as f64 / 2.0;
                city.place(
                    fx,
                    MIN_BLOCK_HEIGHT + y as f64,
                    fz,
                    if core { BlockType::Concrete } else { BlockType::Glass },
                );
            }
            if rng.gen_bool(0.5) {
                city.place(fx, MIN_BLOCK_HEIGHT + height as f64, fz, BlockType::Gold);
            }
            z += 3;
        }
        x += 3;
    }
}
