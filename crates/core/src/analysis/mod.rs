pub mod analysis_error;
pub mod domain;
pub mod infrastructure;
