/// One row of a recorded occupancy time series.
#[derive(Clone, Debug, PartialEq)]
pub struct OccupancySample {
    pub frame_index: u64,
    pub time_sec: f64,
    /// People per tracked queue, in column order.
    pub counts: Vec<u32>,
    pub worker_count: Option<u32>,
}

impl OccupancySample {
    pub fn new(frame_index: u64, time_sec: f64, counts: Vec<u32>) -> Self {
        Self {
            frame_index,
            time_sec,
            counts,
            worker_count: None,
        }
    }

    pub fn with_workers(mut self, workers: u32) -> Self {
        self.worker_count = Some(workers);
        self
    }
}

/// Samples plus the names of their queue columns.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct OccupancySeries {
    pub labels: Vec<String>,
    pub samples: Vec<OccupancySample>,
}
