//! Integer axis-aligned block region

use std::fmt;

use crate::core::types::{DVec3, IVec3};

/// Horizontal identity of a chunk column: the aligned `(min.x, min.z)` corner
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ColumnKey {
    pub x: i32,
    pub z: i32,
}

impl ColumnKey {
    pub fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }
}

/// Axis-aligned box of block coordinates, both corners inclusive
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Region {
    pub min: IVec3,
    pub max: IVec3,
}

impl Region {
    /// Create region from min and max corners (no normalization)
    pub fn new(min: IVec3, max: IVec3) -> Self {
        Self { min, max }
    }

    /// Create region from two opposite corners given in any order
    pub fn from_corners(a: IVec3, b: IVec3) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Single-block region
    pub fn from_point(p: IVec3) -> Self {
        Self { min: p, max: p }
    }

    /// Grow by `margin` blocks on every side, clamped to the `i32` block range
    pub fn inflated(&self, margin: i32) -> Region {
        Region {
            min: self.min.saturating_sub(IVec3::splat(margin)),
            max: self.max.saturating_add(IVec3::splat(margin)),
        }
    }

    /// Number of blocks along each axis (saturates for boxes wider than `i32::MAX`)
    pub fn extent(&self) -> IVec3 {
        self.max.saturating_sub(self.min).saturating_add(IVec3::ONE)
    }

    /// Check if block position is inside region
    pub fn contains_point(&self, p: IVec3) -> bool {
        p.x >= self.min.x && p.x <= self.max.x &&
        p.y >= self.min.y && p.y <= self.max.y &&
        p.z >= self.min.z && p.z <= self.max.z
    }

    /// Check if the horizontal footprint covers `(x, z)`, ignoring height
    pub fn footprint_contains(&self, x: i32, z: i32) -> bool {
        x >= self.min.x && x <= self.max.x && z >= self.min.z && z <= self.max.z
    }

    /// Check if two regions share at least one block
    pub fn intersects(&self, other: &Region) -> bool {
        self.min.x <= other.max.x && self.max.x >= other.min.x &&
        self.min.y <= other.max.y && self.max.y >= other.min.y &&
        self.min.z <= other.max.z && self.max.z >= other.min.z
    }

    /// Column identity of this region's horizontal min corner
    pub fn column_key(&self) -> ColumnKey {
        ColumnKey::new(self.min.x, self.min.z)
    }

    /// Reference point used for distance ordering: min corner plus `offset` on each axis
    pub fn anchor(&self, offset: i32) -> DVec3 {
        self.min.as_dvec3() + DVec3::splat(offset as f64)
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Region{{min=({}, {}, {}), max=({}, {}, {})}}",
            self.min.x, self.min.y, self.min.z, self.max.x, self.max.y, self.max.z
        )
    }
}
