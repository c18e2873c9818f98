//! Debug protocol - JSON command/response definitions

use serde::{Deserialize, Serialize};

/// Commands sent from a debug client to the debug server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "cmd", content = "params")]
pub enum DebugCommand {
    /// Counters and current queue depth
    GetQueueStats,
    /// Look at the next region without removing it
    PeekRegion,
    /// Remove up to `max` regions in priority order
    DrainRegions { max: usize },
    /// Report a single changed block
    NotifyPoint { x: i32, y: i32, z: i32 },
    /// Report a changed block range (corners in any order)
    NotifyRange { min: [i32; 3], max: [i32; 3] },
    /// Move the observer used for prioritization
    SetObserver { x: f32, y: f32, z: f32 },
    /// Get the active update configuration
    GetConfig,
    /// Ping (health check)
    Ping,
}

/// Responses from debug server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status")]
pub enum DebugResponse {
    #[serde(rename = "ok")]
    Ok { data: ResponseData },
    #[serde(rename = "error")]
    Error { message: String },
}

/// Response data variants
///
/// Untagged: a payload decodes as the first variant whose fields it carries, so
/// `Region` (whose only field may be absent) must stay last.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResponseData {
    None,
    Pong { message: String },
    QueueStats {
        pending: usize,
        admitted: u64,
        merged: u64,
        evicted: u64,
        popped: u64,
        observer: [f32; 3],
    },
    Regions { regions: Vec<RegionInfo> },
    Admission { outcome: String, pending: usize },
    Config {
        chunk_size: i32,
        column_min_y: i32,
        column_max_y: i32,
        safety_margin: i32,
        admission: String,
        max_pending: Option<usize>,
    },
    Region { region: Option<RegionInfo> },
}

/// Wire form of a queued region
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionInfo {
    pub min: [i32; 3],
    pub max: [i32; 3],
}

impl DebugResponse {
    pub fn ok(data: ResponseData) -> Self {
        Self::Ok { data }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self::Error {
            message: msg.into(),
        }
    }

    pub fn pong() -> Self {
        Self::ok(ResponseData::Pong {
            message: "pong".into(),
        })
    }

    pub fn none() -> Self {
        Self::ok(ResponseData::None)
    }

    /// True if this is an `ok` response
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok { .. })
    }
}
