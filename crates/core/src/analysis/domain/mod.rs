pub mod occupancy_sample;
pub mod throughput_estimator;
