pub mod constants;
pub mod frame;
pub mod geometry;
pub mod sync;
