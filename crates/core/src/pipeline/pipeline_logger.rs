use std::collections::HashMap;
use std::time::Instant;

/// Cross-cutting logger for one monitoring run.
///
/// Keeps the loop free of output concerns; each run gets a fresh logger so the
/// summary covers exactly that run.
pub trait PipelineLogger: Send {
    /// Report loop progress: frames read from the device and frames processed.
    fn progress(&mut self, captured: u64, processed: u64);

    /// Record how long a named stage took for one frame.
    fn timing(&mut self, stage: &str, duration_ms: f64);

    /// Record a point-in-time metric (e.g. people in frame).
    fn metric(&mut self, name: &str, value: f64);

    /// Log a human-readable status message.
    fn info(&mut self, message: &str);

    /// Emit an end-of-run summary. Default: no-op.
    fn summary(&self) {}
}

/// Creates a logger at the start of every run.
pub type PipelineLoggerFactory = Box<dyn Fn() -> Box<dyn PipelineLogger> + Send + Sync>;

/// Silent logger that discards all events.
pub struct NullPipelineLogger;

impl PipelineLogger for NullPipelineLogger {
    fn progress(&mut self, _captured: u64, _processed: u64) {}
    fn timing(&mut self, _stage: &str, _duration_ms: f64) {}
    fn metric(&mut self, _name: &str, _value: f64) {}
    fn info(&mut self, _message: &str) {}
}

/// Logger backed by the `log` facade: per-stage timings, metrics, and a
/// summary when the run ends.
///
/// Progress lines are throttled to every `throttle_frames` processed frames.
pub struct LogPipelineLogger {
    throttle_frames: u64,
    timings: HashMap<String, Vec<f64>>,
    metrics: HashMap<String, Vec<f64>>,
    start_time: Instant,
    captured: u64,
    processed: u64,
    messages: Vec<String>,
}

impl LogPipelineLogger {
    pub fn new(throttle_frames: u64) -> Self {
        Self {
            throttle_frames: throttle_frames.max(1),
            timings: HashMap::new(),
            metrics: HashMap::new(),
            start_time: Instant::now(),
            captured: 0,
            processed: 0,
            messages: Vec::new(),
        }
    }

    /// Returns the formatted summary string, or `None` if no data recorded.
    pub fn summary_string(&self) -> Option<String> {
        if self.timings.is_empty() && self.metrics.is_empty() {
            return None;
        }

        let elapsed_ms = self.start_time.elapsed().as_secs_f64() * 1000.0;
        let mut lines = vec![format!(
            "Run summary ({} frames read, {} processed, {:.1}s):",
            self.captured,
            self.processed,
            elapsed_ms / 1000.0
        )];

        let mut stages: Vec<_> = self.timings.keys().collect();
        stages.sort();
        for stage in stages {
            let durations = &self.timings[stage];
            let total_ms: f64 = durations.iter().sum();
            let avg_ms = mean(durations);
            lines.push(format!(
                "  {stage:10}: avg {avg_ms:6.1}ms  max {:6.1}ms  total {total_ms:7.0}ms",
                durations.iter().copied().fold(0.0, f64::max)
            ));
        }

        let mut metric_names: Vec<_> = self.metrics.keys().collect();
        metric_names.sort();
        for name in metric_names {
            lines.push(format!("  {name}: avg {:.1}", mean(&self.metrics[name])));
        }

        if self.processed > 0 && elapsed_ms > 0.0 {
            let rate = self.processed as f64 / (elapsed_ms / 1000.0);
            lines.push(format!("  Update rate: {rate:.1}/s"));
        }

        Some(lines.join("\n"))
    }

    pub fn timings_for(&self, stage: &str) -> Option<&[f64]> {
        self.timings.get(stage).map(|v| v.as_slice())
    }

    pub fn metrics_for(&self, name: &str) -> Option<&[f64]> {
        self.metrics.get(name).map(|v| v.as_slice())
    }
}

impl Default for LogPipelineLogger {
    fn default() -> Self {
        Self::new(150)
    }
}

impl PipelineLogger for LogPipelineLogger {
    fn progress(&mut self, captured: u64, processed: u64) {
        self.captured = captured;
        let advanced = processed > self.processed;
        self.processed = processed;
        if advanced && processed % self.throttle_frames == 0 {
            log::info!("Monitoring: {captured} frames read, {processed} processed");
        }
    }

    fn timing(&mut self, stage: &str, duration_ms: f64) {
        self.timings
            .entry(stage.to_string())
            .or_default()
            .push(duration_ms);
    }

    fn metric(&mut self, name: &str, value: f64) {
        self.metrics
            .entry(name.to_string())
            .or_default()
            .push(value);
    }

    fn info(&mut self, message: &str) {
        self.messages.push(message.to_string());
        log::info!("{message}");
    }

    fn summary(&self) {
        if let Some(text) = self.summary_string() {
            log::info!("\n\n{text}");
        }
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}
