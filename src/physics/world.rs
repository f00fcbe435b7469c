//! rapier3d rigid-body world for the destruction arena
//!
//! The [`PhysicsWorld`] owns exactly three categories of body: one static
//! floor, one kinematic player impactor, and one dynamic body per city
//! block. Each step:
//!
//! 1. The impactor is driven toward its target pose (pointer position,
//!    idle or smashing height).
//! 2. rapier steps the simulation.
//! 3. Contact-force events become impact/detonation events, and a fall
//!    scan marks blocks that dropped below the playfield.
//!
//! The world is rebuilt wholesale at every level start: `populate` discards
//! every body and the collider index, then respawns the scene from the new
//! layout. No body handle ever leaves this module; consumers see only
//! [`PhysicsEvent`] values and read-only queries.

use crate::core::config::config;
use crate::core::types::{Block, BlockId, BlockType, CityLayout, Tick, Vec3};
use crate::physics::events::PhysicsEvent;
use ahash::{AHashMap, AHashSet};
use rapier3d::prelude::*;
use std::collections::BTreeMap;

/// One city block's presence in the simulation
struct BlockSlot {
    id: BlockId,
    block_type: BlockType,
    body: RigidBodyHandle,
    /// Set exactly once, when the block first drops below the fall
    /// threshold. Fallen blocks never report again, even if they oscillate
    /// across the threshold afterwards.
    has_fallen: bool,
}

/// Manages rapier3d simulation state for one level's tableau.
pub struct PhysicsWorld {
    pipeline: PhysicsPipeline,
    gravity: Vector<Real>,
    integration_params: IntegrationParameters,
    island_manager: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,

    floor: RigidBodyHandle,
    impactor: RigidBodyHandle,
    impactor_collider: ColliderHandle,
    /// Target (x, z) for the impactor, mapped from pointer input
    impactor_target: (f64, f64),
    smashing: bool,

    /// Block arena in layout order; fall scan iterates this order
    blocks: Vec<BlockSlot>,
    /// Maps rapier collider handles back to block slots for event lookup
    collider_to_slot: AHashMap<ColliderHandle, usize>,

    tick: Tick,
}

impl PhysicsWorld {
    /// Create a world containing only the floor and the idle impactor.
    pub fn new() -> Self {
        let cfg = config();
        let mut world = Self {
            pipeline: PhysicsPipeline::new(),
            gravity: vector![0.0, cfg.gravity_y as Real, 0.0],
            integration_params: IntegrationParameters::default(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            floor: RigidBodyHandle::invalid(),
            impactor: RigidBodyHandle::invalid(),
            impactor_collider: ColliderHandle::invalid(),
            impactor_target: (0.0, 0.0),
            smashing: false,
            blocks: Vec::new(),
            collider_to_slot: AHashMap::new(),
            tick: 0,
        };
        world.spawn_scene();
        world
    }

    /// Rebuild the world from scratch for a new level: every old body is
    /// destroyed, then floor, impactor, and one dynamic body per layout
    /// block are spawned fresh.
    pub fn populate(&mut self, layout: &CityLayout) {
        self.bodies = RigidBodySet::new();
        self.colliders = ColliderSet::new();
        self.impulse_joints = ImpulseJointSet::new();
        self.multibody_joints = MultibodyJointSet::new();
        self.island_manager = IslandManager::new();
        self.broad_phase = DefaultBroadPhase::new();
        self.narrow_phase = NarrowPhase::new();
        self.ccd_solver = CCDSolver::new();
        self.blocks.clear();
        self.collider_to_slot.clear();
        self.smashing = false;
        self.impactor_target = (0.0, 0.0);
        self.tick = 0;

        self.spawn_scene();
        for block in &layout.blocks {
            self.spawn_block(block);
        }

        tracing::debug!(blocks = self.blocks.len(), "physics world repopulated");
    }

    fn spawn_scene(&mut self) {
        let cfg = config();

        // Floor: a thick static slab rather than a thin plane, so fast
        // blocks cannot tunnel through between solver steps.
        let half = (cfg.map_size / 2.0) as Real;
        let half_thickness = (cfg.floor_thickness / 2.0) as Real;
        let floor_body = RigidBodyBuilder::fixed()
            .translation(vector![0.0, -half_thickness, 0.0])
            .build();
        self.floor = self.bodies.insert(floor_body);
        let floor_collider = ColliderBuilder::cuboid(half, half_thickness, half)
            .friction(cfg.floor_friction as Real)
            .restitution(cfg.floor_restitution as Real)
            .contact_force_event_threshold(cfg.impact_force_threshold as Real)
            .build();
        self.colliders
            .insert_with_parent(floor_collider, self.floor, &mut self.bodies);

        // Impactor: kinematic, position-driven from pointer input.
        let impactor_body = RigidBodyBuilder::kinematic_position_based()
            .translation(vector![0.0, cfg.impactor_idle_height as Real, 0.0])
            .build();
        self.impactor = self.bodies.insert(impactor_body);
        let impactor_collider = ColliderBuilder::ball(cfg.impactor_idle_radius as Real)
            .friction(cfg.impactor_friction as Real)
            .restitution(cfg.impactor_restitution as Real)
            .contact_force_event_threshold(cfg.impact_force_threshold as Real)
            .build();
        self.impactor_collider =
            self.colliders
                .insert_with_parent(impactor_collider, self.impactor, &mut self.bodies);
    }

    fn spawn_block(&mut self, block: &Block) {
        let cfg = config();
        let p = block.position;
        let body = RigidBodyBuilder::dynamic()
            .translation(vector![p.x as Real, p.y as Real, p.z as Real])
            .build();
        let handle = self.bodies.insert(body);

        let he = cfg.block_half_extent as Real;
        let collider = ColliderBuilder::cuboid(he, he, he)
            .mass(block.mass as Real)
            .friction(cfg.block_friction as Real)
            .restitution(block.block_type.restitution() as Real)
            .active_events(ActiveEvents::COLLISION_EVENTS | ActiveEvents::CONTACT_FORCE_EVENTS)
            .contact_force_event_threshold(cfg.impact_force_threshold as Real)
            .build();
        let collider_handle =
            self.colliders
                .insert_with_parent(collider, handle, &mut self.bodies);

        self.collider_to_slot
            .insert(collider_handle, self.blocks.len());
        self.blocks.push(BlockSlot {
            id: block.id,
            block_type: block.block_type,
            body: handle,
            has_fallen: false,
        });
    }

    /// Set the impactor's horizontal target from pointer input. Applied at
    /// the next step.
    pub fn set_impactor_target(&mut self, x: f64, z: f64) {
        self.impactor_target = (x, z);
    }

    /// Toggle the smashing state (press/release). Smashing drives the
    /// impactor down into the city and widens its contact patch.
    pub fn set_smashing(&mut self, smashing: bool) {
        if self.smashing == smashing {
            return;
        }
        self.smashing = smashing;
        let cfg = config();
        let radius = if smashing {
            cfg.impactor_smash_radius
        } else {
            cfg.impactor_idle_radius
        };
        if let Some(collider) = self.colliders.get_mut(self.impactor_collider) {
            collider.set_shape(SharedShape::ball(radius as Real));
        }
    }

    pub fn is_smashing(&self) -> bool {
        self.smashing
    }

    fn drive_impactor(&mut self) {
        let cfg = config();
        let (x, z) = self.impactor_target;
        let y = if self.smashing {
            cfg.impactor_smash_height
        } else {
            cfg.impactor_idle_height
        };
        if let Some(body) = self.bodies.get_mut(self.impactor) {
            body.set_next_kinematic_translation(vector![x as Real, y as Real, z as Real]);
        }
    }

    /// Advance the simulation by `dt` seconds and collect the step's
    /// events.
    ///
    /// Contact events are aggregated to the peak force per block this tick
    /// and emitted in block-slot order; the fall scan then runs in layout
    /// order. Within one tick this gives a deterministic event sequence.
    pub fn step(&mut self, dt: f64) -> Vec<PhysicsEvent> {
        let cfg = config();
        self.drive_impactor();
        self.integration_params.dt = dt as Real;

        let (collision_send, collision_recv) =
            rapier3d::crossbeam::channel::unbounded::<CollisionEvent>();
        let (force_send, force_recv) =
            rapier3d::crossbeam::channel::unbounded::<ContactForceEvent>();
        let event_handler = ChannelEventCollector::new(collision_send, force_send);

        self.pipeline.step(
            &self.gravity,
            &self.integration_params,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            None,
            &(),
            &event_handler,
        );
        self.tick += 1;

        let mut events = Vec::new();

        // Contacts that began this step. Force events are gated on these:
        // rapier reports contact forces every step a contact persists, and
        // a resting block presses on the floor with far more than the
        // impact threshold, so ungated events would re-fire (and re-detonate
        // explosives) forever.
        let mut started: AHashSet<((u32, u32), (u32, u32))> = AHashSet::new();
        while let Ok(event) = collision_recv.try_recv() {
            if let CollisionEvent::Started(h1, h2, _) = event {
                started.insert(pair_key(h1, h2));
            }
        }

        // Peak contact force per block this tick. BTreeMap keys give
        // slot-ordered, deduplicated iteration regardless of rapier's
        // channel delivery order.
        let mut peak_force: BTreeMap<usize, f64> = BTreeMap::new();
        while let Ok(contact) = force_recv.try_recv() {
            if !started.contains(&pair_key(contact.collider1, contact.collider2)) {
                continue;
            }
            let force = contact.total_force_magnitude as f64;
            for handle in [contact.collider1, contact.collider2] {
                if let Some(&slot) = self.collider_to_slot.get(&handle) {
                    let entry = peak_force.entry(slot).or_insert(0.0);
                    if force > *entry {
                        *entry = force;
                    }
                }
            }
        }

        for (slot, force) in peak_force {
            let block = &self.blocks[slot];
            if force > cfg.impact_force_threshold {
                events.push(PhysicsEvent::Impact {
                    id: block.id,
                    intensity: (force / cfg.impact_force_full).min(1.0),
                });
            }
            if block.block_type == BlockType::Explosive && force > cfg.explosion_force_threshold {
                if let Some(body) = self.bodies.get_mut(block.body) {
                    body.apply_impulse(vector![0.0, cfg.explosion_impulse_y as Real, 0.0], true);
                }
                events.push(PhysicsEvent::Detonated { id: block.id });
            }
        }

        // Fall scan, in layout order. The threshold sits generously below
        // the floor so bounces can never produce false positives.
        for slot in &mut self.blocks {
            if slot.has_fallen {
                continue;
            }
            let Some(body) = self.bodies.get(slot.body) else {
                continue;
            };
            if (body.translation().y as f64) < cfg.fall_threshold_y {
                slot.has_fallen = true;
                events.push(PhysicsEvent::BlockFell {
                    id: slot.id,
                    block_type: slot.block_type,
                    value: cfg.fall_score_multiplier * slot.block_type.base_score(),
                });
            }
        }

        events
    }

    pub fn current_tick(&self) -> Tick {
        self.tick
    }

    /// Number of city blocks in the current tableau
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Number of blocks that have fallen off the map this level
    pub fn fallen_count(&self) -> usize {
        self.blocks.iter().filter(|b| b.has_fallen).count()
    }

    /// Total bodies including floor and impactor
    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    /// Current position of a block's body, if it exists
    pub fn block_position(&self, id: BlockId) -> Option<Vec3> {
        let slot = self.blocks.iter().find(|b| b.id == id)?;
        let body = self.bodies.get(slot.body)?;
        let t = body.translation();
        Some(Vec3::new(t.x as f64, t.y as f64, t.z as f64))
    }
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Order-independent key for a collider pair
fn pair_key(a: ColliderHandle, b: ColliderHandle) -> ((u32, u32), (u32, u32)) {
    let a = a.into_raw_parts();
    let b = b.into_raw_parts();
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}
