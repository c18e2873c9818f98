//! Render update coalescing and scheduling
//!
//! World edits arrive as single blocks or small boxes. The coalescer snaps
//! each one to the chunk column it belongs to, and the scheduler hands those
//! columns to the mesher nearest-first.

pub mod config;
pub mod policy;
pub mod scheduler;
pub mod coalescer;
pub mod listener;

pub use config::{AdmissionPolicyKind, UpdateConfig};
pub use policy::{AdmissionDecision, AdmissionPolicy, AlwaysAdmit, DedupeByColumn, PendingColumns};
pub use scheduler::{Admission, SchedulerStats, UpdateScheduler};
pub use coalescer::{RegionCoalescer, align_to_column};
pub use listener::{BlockStateId, ChunkUpdateListener, EntityId, WorldEventListener};
