use std::sync::Arc;

use crate::pipeline::event_publisher::EventPublisher;
use crate::pipeline::pipeline_event::PipelineEvent;
use crate::pipeline::streaming_pipeline::StreamingPipeline;

use super::control_command::ControlCommand;

/// Routes control commands to the pipeline and answers request-style
/// commands with events.
///
/// Lifecycle events (started, stopped, updates, start rejections) are
/// published by the pipeline itself; the bridge publishes replies to
/// `capture_frame`, `save_zones` and `get_zones`, plus errors for messages it
/// cannot parse.
pub struct TransportBridge {
    pipeline: Arc<StreamingPipeline>,
    publisher: Arc<dyn EventPublisher>,
}

impl TransportBridge {
    pub fn new(pipeline: Arc<StreamingPipeline>, publisher: Arc<dyn EventPublisher>) -> Self {
        Self {
            pipeline,
            publisher,
        }
    }

    /// Greets a newly attached client.
    pub fn connect(&self) {
        self.publisher.publish(PipelineEvent::ConnectionResponse {
            status: "connected".to_string(),
        });
    }

    /// Parses and dispatches one raw message.
    pub fn handle_message(&self, text: &str) {
        match ControlCommand::parse(text) {
            Ok(command) => self.handle(command),
            Err(e) => {
                log::warn!("Ignoring message: {e}");
                self.publisher.publish(PipelineEvent::error(e.to_string()));
            }
        }
    }

    pub fn handle(&self, command: ControlCommand) {
        log::debug!("Command: {}", command.name());
        match command {
            ControlCommand::StartCamera => {
                // Rejections are already published by the pipeline.
                let _ = self.pipeline.start();
            }
            ControlCommand::StopCamera => self.pipeline.stop(),
            ControlCommand::CaptureFrame => match self.pipeline.capture_single_frame() {
                Ok(frame) => self.publisher.publish(PipelineEvent::FrameCaptured { frame }),
                Err(e) => self.fail("Frame capture", e),
            },
            ControlCommand::SaveZones(config) => match self.pipeline.save_zones(&config) {
                Ok(()) => self.publisher.publish(PipelineEvent::ZonesSaved {
                    status: "success".to_string(),
                    message: format!("Saved {} zones", config.zones.len()),
                }),
                Err(e) => self.fail("Saving zones", e),
            },
            ControlCommand::GetZones => match self.pipeline.zones() {
                Ok(config) => self.publisher.publish(PipelineEvent::ZonesConfig(config)),
                Err(e) => self.fail("Loading zones", e),
            },
        }
    }

    fn fail(&self, what: &str, err: impl std::fmt::Display) {
        log::error!("{what} failed: {err}");
        self.publisher.publish(PipelineEvent::error(err.to_string()));
    }
}
