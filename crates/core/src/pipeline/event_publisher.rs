use super::pipeline_event::PipelineEvent;

/// Outbound port for pipeline events.
///
/// Publishing is fire-and-forget: implementations must not block the caller
/// and never report delivery failures back to it.
pub trait EventPublisher: Send + Sync {
    fn publish(&self, event: PipelineEvent);
}

/// Discards every event.
pub struct NullEventPublisher;

impl EventPublisher for NullEventPublisher {
    fn publish(&self, _event: PipelineEvent) {}
}
