mod settings;

use std::io::{self, BufRead};
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use std::thread;

use clap::{Args, Parser, Subcommand};

use queue_monitor_core::analysis::domain::throughput_estimator::analyze_series;
use queue_monitor_core::analysis::infrastructure::csv_sample_reader::read_series;
use queue_monitor_core::capture::infrastructure::ffmpeg_capture::FfmpegCaptureSource;
use queue_monitor_core::detection::infrastructure::onnx_yolo_detector::OnnxDetectorProvider;
use queue_monitor_core::pipeline::event_publisher::EventPublisher;
use queue_monitor_core::pipeline::infrastructure::channel_event_publisher::{
    ChannelEventPublisher, DEFAULT_CHANNEL_CAPACITY,
};
use queue_monitor_core::pipeline::pipeline_logger::LogPipelineLogger;
use queue_monitor_core::pipeline::streaming_pipeline::{PipelineComponents, StreamingPipeline};
use queue_monitor_core::rendering::infrastructure::jpeg_base64_encoder::JpegBase64Encoder;
use queue_monitor_core::rendering::infrastructure::overlay_annotator::OverlayAnnotator;
use queue_monitor_core::transport::control_command::ControlCommand;
use queue_monitor_core::transport::infrastructure::json_lines_writer::write_json_lines;
use queue_monitor_core::transport::transport_bridge::TransportBridge;
use queue_monitor_core::zones::infrastructure::json_zone_store::JsonZoneStore;

use settings::Settings;

/// Retail queue monitoring from a camera feed.
#[derive(Parser)]
#[command(name = "queue-monitor", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the live monitor: control commands on stdin, events on stdout (JSON lines).
    Monitor(MonitorArgs),
    /// Estimate per-queue throughput and wait time from an occupancy CSV.
    Analyze {
        /// CSV with columns frame, time_sec, queue columns and optional worker_count.
        input: PathBuf,

        /// Print the report as JSON.
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args)]
struct MonitorArgs {
    /// Settings file (defaults to the platform config directory).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Capture device or stream URL.
    #[arg(long)]
    source: Option<String>,

    /// ffmpeg input format for the source (e.g. v4l2, avfoundation, dshow).
    #[arg(long)]
    input_format: Option<String>,

    /// Zone configuration file.
    #[arg(long)]
    zones: Option<PathBuf>,

    /// Path to the YOLO ONNX model.
    #[arg(long)]
    model: Option<PathBuf>,

    /// Person detection confidence threshold (0.0-1.0).
    #[arg(long)]
    confidence: Option<f64>,

    /// Process every Nth captured frame.
    #[arg(long)]
    frame_interval: Option<u64>,

    /// TrueType font used to label zones and detections in the overlay.
    #[arg(long)]
    label_font: Option<PathBuf>,

    /// Stream raw frames without zone and detection overlay.
    #[arg(long)]
    no_annotate: bool,

    /// Start the camera without waiting for a start_camera command.
    #[arg(long)]
    autostart: bool,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    match Cli::parse().command {
        Command::Monitor(args) => run_monitor(args),
        Command::Analyze { input, json } => run_analyze(&input, json),
    }
}

fn load_settings(args: &MonitorArgs) -> Result<Settings, Box<dyn std::error::Error>> {
    let mut settings = Settings::load(args.config.as_deref())?;
    if let Some(source) = &args.source {
        settings.source = source.clone();
    }
    if let Some(format) = &args.input_format {
        settings.input_format = Some(format.clone());
    }
    if let Some(zones) = &args.zones {
        settings.zones_path = zones.clone();
    }
    if let Some(model) = &args.model {
        settings.model_path = Some(model.clone());
    }
    if let Some(confidence) = args.confidence {
        settings.confidence = confidence;
    }
    if let Some(interval) = args.frame_interval {
        settings.frame_interval = interval;
    }
    if let Some(font) = &args.label_font {
        settings.label_font = Some(font.clone());
    }
    if args.no_annotate {
        settings.annotate = false;
    }
    settings.validate()?;
    Ok(settings)
}

fn build_pipeline(
    settings: &Settings,
    publisher: Arc<dyn EventPublisher>,
) -> Result<StreamingPipeline, Box<dyn std::error::Error>> {
    let detectors = OnnxDetectorProvider::new(settings.model_path.clone(), settings.model_url.clone());
    let mut capture = FfmpegCaptureSource::new(settings.source.clone());
    if let Some(format) = &settings.input_format {
        capture = capture.with_input_format(format.clone());
    }

    let mut components = PipelineComponents::new(
        Box::new(detectors),
        Box::new(capture),
        Box::new(JsonZoneStore::new(settings.zones_path.clone())),
        Box::new(JpegBase64Encoder::new(settings.jpeg_quality)),
        publisher,
    )
    .with_logger(Box::new(|| Box::new(LogPipelineLogger::default())));
    if settings.annotate {
        let mut annotator = OverlayAnnotator::new();
        if let Some(path) = &settings.label_font {
            annotator = annotator.with_font(OverlayAnnotator::load_font(path)?);
        }
        components = components.with_annotator(Box::new(annotator));
    }

    Ok(StreamingPipeline::new(components, settings.pipeline_config()))
}

fn run_monitor(args: MonitorArgs) -> Result<(), Box<dyn std::error::Error>> {
    let settings = load_settings(&args)?;
    log::info!(
        "Monitoring {} with zones from {}",
        settings.source,
        settings.zones_path.display()
    );

    let (publisher, events) = ChannelEventPublisher::new(DEFAULT_CHANNEL_CAPACITY);
    let publisher: Arc<dyn EventPublisher> = Arc::new(publisher);
    let writer = thread::Builder::new()
        .name("event-writer".into())
        .spawn(move || write_json_lines(events, io::stdout().lock()))?;

    let pipeline = Arc::new(build_pipeline(&settings, publisher.clone())?);
    let bridge = TransportBridge::new(pipeline.clone(), publisher);
    bridge.connect();
    if args.autostart {
        bridge.handle(ControlCommand::StartCamera);
    }

    for line in io::stdin().lock().lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        bridge.handle_message(line);
    }

    log::info!("Input closed, shutting down");
    if !pipeline.state().is_idle() {
        pipeline.stop();
    }
    // The writer exits once every publisher handle is gone.
    drop(bridge);
    drop(pipeline);

    match writer.join() {
        Ok(Ok(written)) => log::debug!("Wrote {written} events"),
        Ok(Err(e)) if e.kind() == io::ErrorKind::BrokenPipe => log::debug!("Event consumer went away"),
        Ok(Err(e)) => return Err(e.into()),
        Err(_) => return Err("event writer thread panicked".into()),
    }
    Ok(())
}

fn run_analyze(input: &Path, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let series = read_series(input)?;
    let report = analyze_series(&series)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Analyzed: {}", input.display());
        print!("{report}");
    }
    Ok(())
}
