pub mod json_zone_store;
