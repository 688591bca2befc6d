pub mod analysis;
pub mod capture;
pub mod detection;
pub mod occupancy;
pub mod pipeline;
pub mod rendering;
pub mod shared;
pub mod transport;
pub mod zones;
