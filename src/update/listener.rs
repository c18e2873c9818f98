//! World event hooks that feed the update queue.

use crate::core::{IVec3, Vec3};
use crate::update::coalescer::RegionCoalescer;

/// Opaque block state identifier supplied by the world
pub type BlockStateId = u32;

/// Opaque entity identifier supplied by the world
pub type EntityId = u64;

/// Notifications a world simulation emits while it mutates.
///
/// Only block and range changes affect rendering here; every other hook has a
/// no-op default so listeners implement just what they react to.
pub trait WorldEventListener {
    /// A block changed state.
    fn on_block_changed(&mut self, pos: IVec3, old_state: BlockStateId, new_state: BlockStateId, flags: u32);

    /// A block range needs re-meshing. Corners may be given in any order.
    fn mark_range_for_render_update(&mut self, x1: i32, y1: i32, z1: i32, x2: i32, y2: i32, z2: i32);

    fn on_light_set(&mut self, _pos: IVec3) {}

    fn on_block_break_progress(&mut self, _breaker_id: EntityId, _pos: IVec3, _progress: i32) {}

    fn play_sound_near(
        &mut self,
        _except: Option<EntityId>,
        _sound: &str,
        _category: &str,
        _pos: Vec3,
        _volume: f32,
        _pitch: f32,
    ) {
    }

    fn play_record(&mut self, _sound: Option<&str>, _pos: IVec3) {}

    fn spawn_particle(
        &mut self,
        _particle_id: u32,
        _ignore_range: bool,
        _pos: Vec3,
        _speed: Vec3,
        _params: &[i32],
    ) {
    }

    fn on_entity_added(&mut self, _entity: EntityId) {}

    fn on_entity_removed(&mut self, _entity: EntityId) {}

    fn broadcast_sound(&mut self, _sound_id: i32, _pos: IVec3, _data: i32) {}

    fn play_event(&mut self, _player: Option<EntityId>, _event_type: i32, _pos: IVec3, _data: i32) {}
}

/// Forwards render-affecting world events to a [`RegionCoalescer`].
#[derive(Debug, Clone)]
pub struct ChunkUpdateListener {
    coalescer: RegionCoalescer,
}

impl ChunkUpdateListener {
    pub fn new(coalescer: RegionCoalescer) -> Self {
        Self { coalescer }
    }

    pub fn coalescer(&self) -> &RegionCoalescer {
        &self.coalescer
    }
}

impl WorldEventListener for ChunkUpdateListener {
    fn on_block_changed(&mut self, pos: IVec3, _old_state: BlockStateId, _new_state: BlockStateId, _flags: u32) {
        self.coalescer.notify_point(pos.x, pos.y, pos.z);
    }

    fn mark_range_for_render_update(&mut self, x1: i32, y1: i32, z1: i32, x2: i32, y2: i32, z2: i32) {
        self.coalescer.notify_range(x1, y1, z1, x2, y2, z2);
    }

    fn on_block_break_progress(&mut self, breaker_id: EntityId, pos: IVec3, progress: i32) {
        log::debug!("Block break progress at {} by {}: {}", pos, breaker_id, progress);
    }
}
