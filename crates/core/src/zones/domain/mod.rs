pub mod zone;
pub mod zone_classifier;
pub mod zone_store;
