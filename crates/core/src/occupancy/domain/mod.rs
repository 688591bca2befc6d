pub mod occupancy_aggregator;
pub mod occupancy_stats;
pub mod wait_estimator;
