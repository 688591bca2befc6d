pub mod channel_event_publisher;
