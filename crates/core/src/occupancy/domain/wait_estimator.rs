use crate::detection::domain::detection::Detection;

/// Aggregate wait figures for the queue zones of one frame.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct QueueWait {
    pub avg: f64,
    pub max: f64,
}

/// Domain interface for wait-time estimation.
///
/// Detections carry no identity, so implementations without tracking can only
/// produce placeholder figures.
pub trait WaitEstimator: Send {
    /// Wait in seconds for the detection at 1-based `position` in the frame.
    fn entity_wait(&mut self, position: usize, detection: &Detection) -> f64;

    /// Average and maximum wait given the number of people in queue zones.
    fn queue_wait(&self, in_queue: u32) -> QueueWait;
}
