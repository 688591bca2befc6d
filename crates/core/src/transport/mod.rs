pub mod control_command;
pub mod infrastructure;
pub mod transport_bridge;
