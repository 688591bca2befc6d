use crate::detection::domain::detection::Detection;
use crate::shared::constants::{ENTITY_ALERT_SECS, QUEUE_ALERT_THRESHOLD};
use crate::zones::domain::zone::{is_queue_zone, is_service_zone};

use super::occupancy_stats::{EntityState, EntityStatus, OccupancyStats};
use super::wait_estimator::WaitEstimator;

/// Result of aggregating one frame's detections.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FrameOccupancy {
    pub stats: OccupancyStats,
    pub entities: Vec<EntityStatus>,
    /// Detections per zone name, in first-seen order.
    pub zone_counts: Vec<(String, u32)>,
}

/// Turns zone-assigned detections into counters and per-entity statuses.
pub struct OccupancyAggregator {
    estimator: Box<dyn WaitEstimator>,
}

impl OccupancyAggregator {
    pub fn new(estimator: Box<dyn WaitEstimator>) -> Self {
        Self { estimator }
    }

    pub fn aggregate(&mut self, detections: &[Detection]) -> FrameOccupancy {
        let zone_counts = count_by_zone(detections);

        let in_queue: u32 = zone_counts
            .iter()
            .filter(|(name, _)| is_queue_zone(name))
            .map(|(_, n)| n)
            .sum();
        let at_cashdesk: u32 = zone_counts
            .iter()
            .filter(|(name, _)| is_service_zone(name))
            .map(|(_, n)| n)
            .sum();
        let wait = self.estimator.queue_wait(in_queue);

        let entities = detections
            .iter()
            .enumerate()
            .map(|(i, det)| {
                let id = i + 1;
                let wait_time = self.estimator.entity_wait(id, det);
                let status = if wait_time > ENTITY_ALERT_SECS {
                    EntityState::Alert
                } else if is_queue_zone(&det.zone) {
                    EntityState::Waiting
                } else {
                    EntityState::Serving
                };
                EntityStatus {
                    id,
                    zone: det.zone.clone(),
                    wait_time,
                    status,
                    has_alert: status == EntityState::Alert,
                }
            })
            .collect();

        FrameOccupancy {
            stats: OccupancyStats {
                total_people: detections.len(),
                in_queue,
                at_cashdesk,
                completed: 0,
                avg_wait_time: wait.avg,
                max_wait_time: wait.max,
                alerts: u32::from(in_queue > QUEUE_ALERT_THRESHOLD),
            },
            entities,
            zone_counts,
        }
    }
}

fn count_by_zone(detections: &[Detection]) -> Vec<(String, u32)> {
    let mut counts: Vec<(String, u32)> = Vec::new();
    for det in detections {
        match counts.iter_mut().find(|(name, _)| *name == det.zone) {
            Some((_, n)) => *n += 1,
            None => counts.push((det.zone.clone(), 1)),
        }
    }
    counts
}
