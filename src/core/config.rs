//! Game tuning configuration with documented constants
//!
//! All magic numbers are collected here with explanations of their purpose
//! and how they interact with each other.

/// Configuration for the game core
///
/// These values have been tuned to produce a satisfying smash-the-city
/// feel. Changing them will affect pacing and scoring balance.
#[derive(Debug, Clone)]
pub struct ChaosConfig {
    // === SCORING ===
    /// Base score required to clear level 1; the target for level L is
    /// `L * level_target_base`.
    pub level_target_base: u64,

    /// Multiplier applied to a block's base score when it falls off the
    /// map, rewarding full destruction over mere displacement.
    pub fall_score_multiplier: u64,

    // === WORLD GEOMETRY ===
    /// Side length of the square playable floor (world units)
    pub map_size: f64,

    /// Vertical thickness of the floor slab
    ///
    /// A thick box rather than a thin plane, so fast blocks cannot tunnel
    /// through between solver steps.
    pub floor_thickness: f64,

    /// Half-extent of a city block collider
    ///
    /// Slightly under 0.5 (blocks sit on a 1-unit lattice) so adjacent
    /// blocks never start the level interpenetrating.
    pub block_half_extent: f64,

    // === PHYSICS MATERIAL ===
    /// Downward gravity. Stronger than Earth's for a weightier arcade feel.
    pub gravity_y: f64,

    /// Friction for city blocks; high enough that stacks are stable until
    /// struck.
    pub block_friction: f64,

    /// Floor friction. Very high so toppled blocks come to rest instead of
    /// sliding off the map on their own.
    pub floor_friction: f64,

    /// Floor restitution (low bounce)
    pub floor_restitution: f64,

    // === IMPACTOR ===
    /// Impactor hover height while idle. High enough that moving the
    /// pointer across the city cannot clip towers.
    pub impactor_idle_height: f64,

    /// Impactor height while smashing (driven down into the city)
    pub impactor_smash_height: f64,

    /// Impactor collider radius while idle
    pub impactor_idle_radius: f64,

    /// Impactor collider radius while smashing (bigger contact patch)
    pub impactor_smash_radius: f64,

    /// Impactor restitution; above 1.0 so struck blocks are launched
    pub impactor_restitution: f64,

    /// Impactor friction
    pub impactor_friction: f64,

    // === EVENT THRESHOLDS ===
    /// Height below which a block counts as fallen off the map
    ///
    /// Generously below the floor so bounces and momentary dips can never
    /// produce false fall events.
    pub fall_threshold_y: f64,

    /// Minimum collision force magnitude that emits an impact event
    pub impact_force_threshold: f64,

    /// Force magnitude treated as a full-intensity impact; event intensity
    /// is `min(1, force / impact_force_full)`.
    pub impact_force_full: f64,

    /// Force magnitude above which an explosive block detonates
    ///
    /// Must be well above `impact_force_threshold` so casual contact only
    /// rattles explosives instead of setting them off.
    pub explosion_force_threshold: f64,

    /// Upward impulse applied to a detonating explosive block
    pub explosion_impulse_y: f64,

    // === PROVIDER ===
    /// Hard timeout for AI layout/news requests, in seconds
    ///
    /// A slow remote must never stall level start longer than this; the
    /// local generator takes over at the deadline.
    pub provider_timeout_secs: u64,
}

impl Default for ChaosConfig {
    fn default() -> Self {
        Self {
            // Scoring
            level_target_base: 2000,
            fall_score_multiplier: 2,

            // World geometry
            map_size: 40.0,
            floor_thickness: 4.0,
            block_half_extent: 0.49,

            // Material
            gravity_y: -20.0,
            block_friction: 0.8,
            floor_friction: 2.0,
            floor_restitution: 0.1,

            // Impactor
            impactor_idle_height: 12.0,
            impactor_smash_height: 0.5,
            impactor_idle_radius: 0.8,
            impactor_smash_radius: 1.5,
            impactor_restitution: 1.2,
            impactor_friction: 0.5,

            // Event thresholds
            fall_threshold_y: -20.0,
            impact_force_threshold: 2.0,
            impact_force_full: 50.0,
            explosion_force_threshold: 40.0,
            explosion_impulse_y: 10.0,

            // Provider
            provider_timeout_secs: 5,
        }
    }
}

impl ChaosConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<(), String> {
        if self.explosion_force_threshold <= self.impact_force_threshold {
            return Err(format!(
                "explosion_force_threshold ({}) must be > impact_force_threshold ({})",
                self.explosion_force_threshold, self.impact_force_threshold
            ));
        }

        if self.impactor_smash_height >= self.impactor_idle_height {
            return Err(format!(
                "impactor_smash_height ({}) must be < impactor_idle_height ({})",
                self.impactor_smash_height, self.impactor_idle_height
            ));
        }

        // The fall threshold must sit below the floor surface, or resting
        // blocks would report as fallen.
        if self.fall_threshold_y >= 0.0 {
            return Err(format!(
                "fall_threshold_y ({}) must be below the floor",
                self.fall_threshold_y
            ));
        }

        if self.level_target_base == 0 {
            return Err("level_target_base must be positive".into());
        }

        if self.provider_timeout_secs == 0 {
            return Err("provider_timeout_secs must be positive".into());
        }

        Ok(())
    }
}

// === GLOBAL CONFIG ACCESS ===

use std::sync::OnceLock;

static CONFIG: OnceLock<ChaosConfig> = OnceLock::new();

/// Get the global game config (initializes with defaults if not set)
pub fn config() -> &'static ChaosConfig {
    CONFIG.get_or_init(ChaosConfig::default)
}

/// Set the global game config (can only be called once)
///
/// Returns Err if config was already set.
pub fn set_config(config: ChaosConfig) -> Result<(), ChaosConfig> {
    CONFIG.set(config)
}
