//! Normalizes raw block updates into chunk-column regions.

use std::sync::Arc;

use crate::core::IVec3;
use crate::math::Region;
use crate::update::config::UpdateConfig;
use crate::update::scheduler::{Admission, UpdateScheduler};

/// Turns point and box notifications into chunk-aligned regions and hands them
/// to a shared [`UpdateScheduler`].
///
/// A box is keyed on its min corner only: a box straddling several columns
/// collapses to the column holding that corner. Callers that need every
/// touched column queued must report each column separately.
#[derive(Debug, Clone)]
pub struct RegionCoalescer {
    scheduler: Arc<UpdateScheduler>,
    config: UpdateConfig,
}

impl RegionCoalescer {
    /// Create a coalescer feeding `scheduler`, using the scheduler's configuration.
    pub fn new(scheduler: Arc<UpdateScheduler>) -> Self {
        let config = scheduler.config().clone();
        Self { scheduler, config }
    }

    pub fn scheduler(&self) -> &Arc<UpdateScheduler> {
        &self.scheduler
    }

    /// A single block changed: queue its surroundings.
    pub fn notify_point(&self, x: i32, y: i32, z: i32) -> Admission {
        self.notify_region(self.point_region(x, y, z))
    }

    /// The box a single changed block expands to (safety margin on every side)
    pub fn point_region(&self, x: i32, y: i32, z: i32) -> Region {
        Region::from_point(IVec3::new(x, y, z)).inflated(self.config.safety_margin)
    }

    /// A block range changed. Corners may be given in any order.
    pub fn notify_range(&self, x1: i32, y1: i32, z1: i32, x2: i32, y2: i32, z2: i32) -> Admission {
        self.notify_region(Region::from_corners(IVec3::new(x1, y1, z1), IVec3::new(x2, y2, z2)))
    }

    /// Align an already-built region and submit it.
    pub fn notify_region(&self, raw: Region) -> Admission {
        self.submit(raw).0
    }

    /// Align and submit, also returning the queue length right after admission.
    pub fn submit(&self, raw: Region) -> (Admission, usize) {
        let aligned = self.align(&raw);
        log::debug!("Marking {} for render update as {}", raw, aligned);
        self.scheduler.admit_counted(aligned)
    }

    /// Snap a region to the chunk column containing its min corner.
    ///
    /// Uses floor division so columns west/south of the origin start at
    /// -16, -32, ... rather than collapsing toward zero.
    pub fn align(&self, raw: &Region) -> Region {
        align_to_column(raw, &self.config)
    }
}

/// Chunk column containing the region's min corner, spanning the full column height.
///
/// Expects a validated config; a non-positive chunk size is treated as 1.
/// Columns at either end of the `i32` block range are clipped to it when the
/// chunk size does not divide 2^31.
pub fn align_to_column(raw: &Region, config: &UpdateConfig) -> Region {
    let size = config.chunk_size.max(1);
    let normalized = Region::from_corners(raw.min, raw.max);
    let min_x = snap_down(normalized.min.x, size);
    let min_z = snap_down(normalized.min.z, size);

    Region::new(
        IVec3::new(min_x, config.column_min_y, min_z),
        IVec3::new(
            min_x.saturating_add(size - 1),
            config.column_max_y,
            min_z.saturating_add(size - 1),
        ),
    )
}

/// Largest multiple of `size` not above `v`, clamped to `i32::MIN`
fn snap_down(v: i32, size: i32) -> i32 {
    let size = i64::from(size);
    (i64::from(v).div_euclid(size) * size).max(i64::from(i32::MIN)) as i32
}
