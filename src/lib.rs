//! Remesh - chunk render update coalescing and scheduling
//!
//! Block edits are snapped to chunk columns by [`update::RegionCoalescer`] and
//! released nearest-first by [`update::UpdateScheduler`].

pub mod core;
pub mod math;
pub mod update;
pub mod debug;
