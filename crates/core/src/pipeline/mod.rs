pub mod event_publisher;
pub mod infrastructure;
pub mod pipeline_event;
pub mod pipeline_logger;
pub mod pipeline_state;
pub mod streaming_pipeline;
