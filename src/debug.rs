//! Debug server handler over the shared update queue.

use std::sync::Arc;

use remesh_debug::{DebugCommand, DebugHandler, DebugResponse, RegionInfo, ResponseData};

use crate::core::{IVec3, Vec3};
use crate::math::Region;
use crate::update::{Admission, RegionCoalescer, UpdateScheduler};

/// Answers debug commands by driving a coalescer and its scheduler.
pub struct QueueDebugHandler {
    coalescer: RegionCoalescer,
}

impl QueueDebugHandler {
    pub fn new(coalescer: RegionCoalescer) -> Self {
        Self { coalescer }
    }

    fn scheduler(&self) -> &Arc<UpdateScheduler> {
        self.coalescer.scheduler()
    }

    /// Submit under one scheduler lock so `pending` is the length this admission left behind.
    fn submit(&self, raw: Region) -> DebugResponse {
        let (admission, pending) = self.coalescer.submit(raw);
        let outcome = match admission {
            Admission::Queued => "queued".to_string(),
            Admission::Merged => "merged".to_string(),
            Admission::Evicted(region) => format!("evicted {}", region),
        };
        DebugResponse::ok(ResponseData::Admission { outcome, pending })
    }
}

fn region_info(region: Region) -> RegionInfo {
    RegionInfo {
        min: region.min.to_array(),
        max: region.max.to_array(),
    }
}

impl DebugHandler for QueueDebugHandler {
    fn handle_command(&mut self, cmd: DebugCommand) -> DebugResponse {
        match cmd {
            DebugCommand::Ping => DebugResponse::pong(),

            DebugCommand::GetQueueStats => {
                let stats = self.scheduler().stats();
                DebugResponse::ok(ResponseData::QueueStats {
                    pending: stats.pending,
                    admitted: stats.admitted,
                    merged: stats.merged,
                    evicted: stats.evicted,
                    popped: stats.popped,
                    observer: self.scheduler().observer().to_array(),
                })
            }

            DebugCommand::PeekRegion => DebugResponse::ok(ResponseData::Region {
                region: self.scheduler().peek().ok().map(region_info),
            }),

            DebugCommand::DrainRegions { max } => DebugResponse::ok(ResponseData::Regions {
                regions: self.scheduler().drain(max).into_iter().map(region_info).collect(),
            }),

            DebugCommand::NotifyPoint { x, y, z } => {
                let raw = self.coalescer.point_region(x, y, z);
                self.submit(raw)
            }

            DebugCommand::NotifyRange { min, max } => {
                self.submit(Region::from_corners(IVec3::from_array(min), IVec3::from_array(max)))
            }

            DebugCommand::SetObserver { x, y, z } => {
                self.scheduler().set_observer(Vec3::new(x, y, z));
                DebugResponse::none()
            }

            DebugCommand::GetConfig => {
                let config = self.scheduler().config();
                DebugResponse::ok(ResponseData::Config {
                    chunk_size: config.chunk_size,
                    column_min_y: config.column_min_y,
                    column_max_y: config.column_max_y,
                    safety_margin: config.safety_margin,
                    admission: config.admission.name().to_string(),
                    max_pending: config.max_pending,
                })
            }
        }
    }
}
