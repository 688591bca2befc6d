pub mod capture_device;
pub mod scoped_capture;
