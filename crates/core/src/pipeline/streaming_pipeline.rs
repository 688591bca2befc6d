use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::capture::domain::capture_device::{CaptureSettings, CaptureSource};
use crate::capture::domain::scoped_capture::ScopedCapture;
use crate::detection::domain::detection::Detection;
use crate::detection::domain::object_detector::{DetectionRequest, DetectorProvider, ObjectDetector};
use crate::occupancy::domain::occupancy_aggregator::OccupancyAggregator;
use crate::occupancy::domain::wait_estimator::WaitEstimator;
use crate::occupancy::infrastructure::placeholder_estimator::PlaceholderEstimator;
use crate::rendering::domain::frame_renderer::{FrameAnnotator, FrameEncoder};
use crate::shared::constants::{FRAME_INTERVAL, LOOP_DELAY_MS};
use crate::shared::frame::Frame;
use crate::shared::sync::lock;
use crate::zones::domain::zone::{Zone, ZoneConfig};
use crate::zones::domain::zone_classifier::ZoneClassifier;
use crate::zones::domain::zone_store::ZoneStore;

use super::event_publisher::EventPublisher;
use super::pipeline_event::{FrameSnapshot, PipelineEvent};
use super::pipeline_logger::{NullPipelineLogger, PipelineLogger, PipelineLoggerFactory};
use super::pipeline_state::{PipelineError, PipelineState};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Creates the wait estimator for each run.
pub type WaitEstimatorFactory = Box<dyn Fn() -> Box<dyn WaitEstimator> + Send + Sync>;

/// Tunables for the monitoring loop.
#[derive(Clone, Debug, PartialEq)]
pub struct PipelineConfig {
    pub request: DetectionRequest,
    pub capture: CaptureSettings,
    /// Only every `frame_interval`-th frame read is processed.
    pub frame_interval: u64,
    /// Pause after each processed frame.
    pub loop_delay: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            request: DetectionRequest::default(),
            capture: CaptureSettings::default(),
            frame_interval: FRAME_INTERVAL,
            loop_delay: Duration::from_millis(LOOP_DELAY_MS),
        }
    }
}

/// The collaborators a pipeline drives.
pub struct PipelineComponents {
    pub detectors: Box<dyn DetectorProvider>,
    pub capture: Box<dyn CaptureSource>,
    pub zones: Box<dyn ZoneStore>,
    pub encoder: Box<dyn FrameEncoder>,
    pub publisher: Arc<dyn EventPublisher>,
    pub annotator: Option<Box<dyn FrameAnnotator>>,
    pub estimator: WaitEstimatorFactory,
    pub logger: PipelineLoggerFactory,
}

impl PipelineComponents {
    /// Components with placeholder wait estimates, no overlay and silent
    /// run logging.
    pub fn new(
        detectors: Box<dyn DetectorProvider>,
        capture: Box<dyn CaptureSource>,
        zones: Box<dyn ZoneStore>,
        encoder: Box<dyn FrameEncoder>,
        publisher: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            detectors,
            capture,
            zones,
            encoder,
            publisher,
            annotator: None,
            estimator: Box::new(|| Box::new(PlaceholderEstimator::new())),
            logger: Box::new(|| Box::new(NullPipelineLogger)),
        }
    }

    pub fn with_annotator(mut self, annotator: Box<dyn FrameAnnotator>) -> Self {
        self.annotator = Some(annotator);
        self
    }

    pub fn with_estimator(mut self, estimator: WaitEstimatorFactory) -> Self {
        self.estimator = estimator;
        self
    }

    pub fn with_logger(mut self, logger: PipelineLoggerFactory) -> Self {
        self.logger = logger;
        self
    }
}

struct ActiveRun {
    id: u64,
    cancelled: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

struct Lifecycle {
    state: PipelineState,
    run: Option<ActiveRun>,
    next_run_id: u64,
}

struct Shared {
    components: PipelineComponents,
    config: PipelineConfig,
    lifecycle: Mutex<Lifecycle>,
}

/// How a run's worker ended.
enum RunEnd {
    /// Cancelled by `stop`, which reports the stop itself.
    Cancelled,
    StartupFailed(PipelineError),
    Failed(PipelineError),
}

/// Capture → detect → classify → aggregate → publish, on a worker thread.
///
/// `start` and `stop` are the only lifecycle mutators; both, along with
/// single-frame capture, are serialized through one mutex so two capture
/// devices are never open at once.
pub struct StreamingPipeline {
    shared: Arc<Shared>,
}

impl StreamingPipeline {
    pub fn new(components: PipelineComponents, config: PipelineConfig) -> Self {
        Self {
            shared: Arc::new(Shared {
                components,
                config,
                lifecycle: Mutex::new(Lifecycle {
                    state: PipelineState::Idle,
                    run: None,
                    next_run_id: 0,
                }),
            }),
        }
    }

    pub fn state(&self) -> PipelineState {
        lock(&self.shared.lifecycle).state
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.shared.config
    }

    /// Begins a monitoring run in the background.
    ///
    /// Rejected unless idle; the rejection is also published as an error
    /// event. Startup itself (model, zones, camera) happens on the worker and
    /// reports its failures as events.
    pub fn start(&self) -> Result<(), PipelineError> {
        let shared = &self.shared;
        let mut lifecycle = lock(&shared.lifecycle);
        if !lifecycle.state.is_idle() {
            let err = PipelineError::AlreadyRunning(lifecycle.state);
            log::warn!("Start rejected: {err}");
            shared.publish(PipelineEvent::error(err.to_string()));
            return Err(err);
        }

        lifecycle.next_run_id += 1;
        let id = lifecycle.next_run_id;
        let cancelled = Arc::new(AtomicBool::new(false));
        let worker_shared = Arc::clone(shared);
        let worker_cancelled = Arc::clone(&cancelled);
        let handle = thread::Builder::new()
            .name(format!("queue-monitor-run-{id}"))
            .spawn(move || worker_shared.run(id, &worker_cancelled))
            .map_err(|e| {
                let err = PipelineError::Spawn(e);
                shared.publish(PipelineEvent::error(err.to_string()));
                err
            })?;

        lifecycle.state = PipelineState::Loading;
        lifecycle.run = Some(ActiveRun {
            id,
            cancelled,
            handle: Some(handle),
        });
        log::info!("Monitoring run {id} starting");
        Ok(())
    }

    /// Stops the active run and waits for its worker to release the camera.
    ///
    /// Idempotent: with nothing running it only re-publishes `camera_stopped`.
    pub fn stop(&self) {
        let shared = &self.shared;
        let run = {
            let mut lifecycle = lock(&shared.lifecycle);
            let run = lifecycle.run.take();
            if run.is_some() {
                lifecycle.state = PipelineState::Stopping;
            }
            run
        };

        let Some(mut run) = run else {
            log::debug!("Stop requested while idle");
            shared.publish(PipelineEvent::CameraStopped);
            return;
        };

        log::info!("Stopping monitoring run {}", run.id);
        run.cancelled.store(true, Ordering::Relaxed);
        if let Some(handle) = run.handle.take() {
            if handle.thread().id() == thread::current().id() {
                log::debug!("Stop called from the worker itself; not joining");
            } else if handle.join().is_err() {
                log::error!("Monitoring worker {} panicked", run.id);
            }
        }

        let mut lifecycle = lock(&shared.lifecycle);
        lifecycle.state = PipelineState::Idle;
        shared.publish(PipelineEvent::CameraStopped);
        log::info!("Monitoring stopped");
    }

    /// Grabs one frame for zone drawing and returns it encoded.
    ///
    /// Rejected while a run owns the camera.
    pub fn capture_single_frame(&self) -> Result<String, PipelineError> {
        let shared = &self.shared;
        let lifecycle = lock(&shared.lifecycle);
        if !lifecycle.state.is_idle() {
            return Err(PipelineError::CaptureBusy(lifecycle.state));
        }

        let mut capture =
            ScopedCapture::open(shared.components.capture.as_ref(), &shared.config.capture)
                .map_err(|e| PipelineError::CaptureUnavailable(e.to_string()))?;
        let frame = capture.read();
        capture.release();
        drop(lifecycle);

        let frame = frame.map_err(|e| PipelineError::FrameRead(e.to_string()))?;
        let encoded = shared
            .components
            .encoder
            .encode(&frame)
            .map_err(|e| PipelineError::Encode(e.to_string()))?;
        log::info!("Captured {}x{} frame for zone setup", frame.width(), frame.height());
        Ok(encoded)
    }

    /// Validates and persists a zone document. Takes effect on the next start.
    pub fn save_zones(&self, config: &ZoneConfig) -> Result<(), PipelineError> {
        self.shared.components.zones.save(config)?;
        Ok(())
    }

    /// The persisted zone document, empty when none has been saved.
    pub fn zones(&self) -> Result<ZoneConfig, PipelineError> {
        Ok(self.shared.components.zones.load()?.unwrap_or_default())
    }
}

impl Drop for StreamingPipeline {
    fn drop(&mut self) {
        if lock(&self.shared.lifecycle).run.is_some() {
            self.stop();
        }
    }
}

impl Shared {
    fn publish(&self, event: PipelineEvent) {
        self.components.publisher.publish(event);
    }

    /// Moves the run to `state` if it is still the registered run.
    fn advance(&self, run_id: u64, state: PipelineState) -> bool {
        let mut lifecycle = lock(&self.lifecycle);
        if !is_current(&lifecycle, run_id) {
            return false;
        }
        lifecycle.state = state;
        log::debug!("Run {run_id}: {state}");
        if state == PipelineState::Running {
            self.publish(PipelineEvent::CameraStarted);
        }
        true
    }

    fn run(&self, run_id: u64, cancelled: &AtomicBool) {
        let mut logger = (self.components.logger)();
        let end = self.monitor(run_id, cancelled, logger.as_mut());
        logger.summary();
        self.finish(run_id, end);
    }

    fn monitor(&self, run_id: u64, cancelled: &AtomicBool, logger: &mut dyn PipelineLogger) -> RunEnd {
        let mut detector = match self.components.detectors.acquire() {
            Ok(d) => d,
            Err(e) => return RunEnd::StartupFailed(PipelineError::DetectorUnavailable(e.to_string())),
        };
        if cancelled.load(Ordering::Relaxed) || !self.advance(run_id, PipelineState::ZonesLoading) {
            return RunEnd::Cancelled;
        }

        let zones = match self.components.zones.load() {
            Ok(Some(config)) if !config.zones.is_empty() => config.zones,
            Ok(_) => {
                log::warn!("No zones configured; every detection will be Unknown");
                Vec::new()
            }
            Err(e) => return RunEnd::StartupFailed(PipelineError::ZonesUnavailable(e)),
        };
        logger.info(&format!("Loaded {} zones", zones.len()));
        if cancelled.load(Ordering::Relaxed) || !self.advance(run_id, PipelineState::CameraStarting) {
            return RunEnd::Cancelled;
        }

        let mut capture = match ScopedCapture::open(self.components.capture.as_ref(), &self.config.capture) {
            Ok(c) => c,
            Err(e) => return RunEnd::StartupFailed(PipelineError::CaptureUnavailable(e.to_string())),
        };
        if cancelled.load(Ordering::Relaxed) || !self.advance(run_id, PipelineState::Running) {
            capture.release();
            return RunEnd::Cancelled;
        }

        let result = self.stream(cancelled, &mut capture, detector.as_mut(), zones, logger);
        capture.release();
        match result {
            Ok(()) => RunEnd::Cancelled,
            Err(e) => RunEnd::Failed(e),
        }
    }

    fn stream(
        &self,
        cancelled: &AtomicBool,
        capture: &mut ScopedCapture,
        detector: &mut dyn ObjectDetector,
        zones: Vec<Zone>,
        logger: &mut dyn PipelineLogger,
    ) -> Result<(), PipelineError> {
        let classifier = ZoneClassifier::new(zones);
        let mut aggregator = OccupancyAggregator::new((self.components.estimator)());
        let interval = self.config.frame_interval.max(1);
        let mut captured: u64 = 0;
        let mut processed: u64 = 0;

        while !cancelled.load(Ordering::Relaxed) {
            let t = Instant::now();
            let frame = capture
                .read()
                .map_err(|e| PipelineError::FrameRead(e.to_string()))?;
            logger.timing("read", elapsed_ms(t));
            captured += 1;

            if captured % interval != 0 {
                logger.progress(captured, processed);
                continue;
            }

            let snapshot = self.process(&frame, captured, detector, &classifier, &mut aggregator, logger)?;
            self.publish(PipelineEvent::QueueUpdate(snapshot));
            processed += 1;
            logger.progress(captured, processed);

            thread::sleep(self.config.loop_delay);
        }
        Ok(())
    }

    fn process(
        &self,
        frame: &Frame,
        frame_index: u64,
        detector: &mut dyn ObjectDetector,
        classifier: &ZoneClassifier,
        aggregator: &mut OccupancyAggregator,
        logger: &mut dyn PipelineLogger,
    ) -> Result<FrameSnapshot, PipelineError> {
        let t = Instant::now();
        let objects = detector
            .detect(frame, &self.config.request)
            .map_err(|e| PipelineError::Processing(e.to_string()))?;
        logger.timing("detect", elapsed_ms(t));

        let detections: Vec<Detection> = objects
            .into_iter()
            .map(|object| {
                let zone = classifier.classify(object.bbox.center()).to_string();
                Detection::new(object, zone)
            })
            .collect();
        let occupancy = aggregator.aggregate(&detections);
        logger.metric("people", occupancy.stats.total_people as f64);
        logger.metric("in_queue", occupancy.stats.in_queue as f64);
        log::trace!("Frame {frame_index} zone counts: {:?}", occupancy.zone_counts);

        let t = Instant::now();
        let encoded = match &self.components.annotator {
            Some(annotator) => {
                let mut annotated = frame.clone();
                annotator
                    .annotate(&mut annotated, classifier.zones(), &detections)
                    .map_err(|e| PipelineError::Processing(e.to_string()))?;
                self.components.encoder.encode(&annotated)
            }
            None => self.components.encoder.encode(frame),
        }
        .map_err(|e| PipelineError::Encode(e.to_string()))?;
        logger.timing("encode", elapsed_ms(t));

        Ok(FrameSnapshot {
            frame_index,
            timestamp: chrono::Local::now().format(TIMESTAMP_FORMAT).to_string(),
            stats: occupancy.stats,
            entities: occupancy.entities,
            video_frame: Some(encoded),
        })
    }

    fn finish(&self, run_id: u64, end: RunEnd) {
        let mut lifecycle = lock(&self.lifecycle);
        let current = is_current(&lifecycle, run_id);
        match end {
            RunEnd::Cancelled => {}
            RunEnd::StartupFailed(err) => {
                log::error!("Monitoring run {run_id} failed to start: {err}");
                self.publish(PipelineEvent::error(err.to_string()));
                if current {
                    lifecycle.run = None;
                    lifecycle.state = PipelineState::Idle;
                }
            }
            RunEnd::Failed(err) => {
                log::error!("Monitoring run {run_id} stopped: {err}");
                self.publish(PipelineEvent::error(err.to_string()));
                if current {
                    lifecycle.run = None;
                    lifecycle.state = PipelineState::Idle;
                    self.publish(PipelineEvent::CameraStopped);
                }
            }
        }
    }
}

fn is_current(lifecycle: &Lifecycle, run_id: u64) -> bool {
    lifecycle.run.as_ref().is_some_and(|run| run.id == run_id)
}

fn elapsed_ms(since: Instant) -> f64 {
    since.elapsed().as_secs_f64() * 1000.0
}
