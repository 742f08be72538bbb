mod settings;

use std::path::PathBuf;
use std::process;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;

use doorwatch_core::detection::domain::detection_params::BoxSize;
use doorwatch_core::detection::infrastructure::cascade_bank::load_cascade_bank;
use doorwatch_core::detection::infrastructure::cascade_resolver::CascadeResolver;
use doorwatch_core::overlay::domain::frame_renderer::{FrameRenderer, NullFrameRenderer};
use doorwatch_core::overlay::infrastructure::snapshot_renderer::SnapshotRenderer;
use doorwatch_core::pipeline::frame_pipeline::FramePipeline;
use doorwatch_core::pipeline::pipeline_logger::StdoutPipelineLogger;
use doorwatch_core::pipeline::watch_use_case::WatchUseCase;
use doorwatch_core::presence::domain::presence_tracker::PresenceTracker;
use doorwatch_core::presence::infrastructure::file_event_sink::{FileEventSink, LogFormat};
use doorwatch_core::shared::clock::{Clock, ManualClock, MonotonicClock};
use doorwatch_core::video::infrastructure::ffmpeg_frame_source::{FfmpegFrameSource, FrameInput};

use settings::WatchSettings;

/// Watches a doorway camera and logs when faces leave and come back.
#[derive(Parser)]
#[command(name = "doorwatch")]
struct Cli {
    /// Capture device (`/dev/video0` or `0`) or a recorded video file.
    #[arg(default_value = "0")]
    input: String,

    /// Directory holding the Haar cascade XML files.
    #[arg(long)]
    cascade_dir: Option<PathBuf>,

    /// Event log file.
    #[arg(long)]
    log: Option<PathBuf>,

    /// Event log format: text or jsonl.
    #[arg(long)]
    log_format: Option<LogFormat>,

    /// Seconds without a face before an absence is logged.
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Face search: pyramid scale step.
    #[arg(long)]
    face_scale: Option<f64>,

    /// Face search: neighbors needed to keep a hit.
    #[arg(long)]
    face_neighbors: Option<u32>,

    /// Face search: minimum box size as WxH.
    #[arg(long, value_parser = parse_box_size)]
    face_min_size: Option<BoxSize>,

    /// Eye search: pyramid scale step.
    #[arg(long)]
    eye_scale: Option<f64>,

    /// Eye search: neighbors needed to keep a hit.
    #[arg(long)]
    eye_neighbors: Option<u32>,

    /// Eye search: minimum box size as WxH.
    #[arg(long, value_parser = parse_box_size)]
    eye_min_size: Option<BoxSize>,

    /// Eye search: maximum box size as WxH.
    #[arg(long, value_parser = parse_box_size)]
    eye_max_size: Option<BoxSize>,

    /// Stop after this many processed frames.
    #[arg(long)]
    max_frames: Option<usize>,

    /// Write the annotated view to this image file.
    #[arg(long)]
    snapshot: Option<PathBuf>,

    /// Refresh the snapshot every N frames.
    #[arg(long)]
    snapshot_every: Option<usize>,

    /// Settings file (defaults to the user config directory).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write the effective settings back to the settings file.
    #[arg(long)]
    save_settings: bool,

    /// Never download missing cascade files.
    #[arg(long)]
    offline: bool,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let settings_path = cli.config.clone().or_else(WatchSettings::config_path);
    let mut settings = settings_path
        .as_deref()
        .map(WatchSettings::load_from)
        .unwrap_or_default();
    apply_overrides(&mut settings, &cli);
    if cli.save_settings {
        let path = settings_path.ok_or("No config directory available")?;
        settings.save_to(&path)?;
        log::info!("Settings saved to {}", path.display());
    }

    let timeout = Duration::from_secs(settings.timeout_secs);
    let tracker = PresenceTracker::new(timeout)?;

    let mut resolver = CascadeResolver::with_default_cache(settings.cascade_dir.clone())?;
    if settings.offline {
        resolver = resolver.offline();
    }
    let detectors = load_cascade_bank(&resolver)?;

    let input = FrameInput::parse(&cli.input);
    let replay_clock = (!input.is_live()).then(ManualClock::new);
    let clock: Box<dyn Clock> = match &replay_clock {
        Some(clock) => Box::new(clock.clone()),
        None => Box::new(MonotonicClock::new()),
    };

    let sink = FileEventSink::new(&settings.log_path, settings.log_format, timeout);
    log::info!("Logging presence events to {}", sink.path().display());

    let pipeline = FramePipeline::new(
        detectors,
        settings.faces.clone(),
        settings.eyes.clone(),
        tracker,
        Box::new(sink),
        clock,
        Box::new(StdoutPipelineLogger::default()),
    )?;

    let renderer: Box<dyn FrameRenderer> = match &settings.snapshot {
        Some(path) => Box::new(SnapshotRenderer::new(path, settings.snapshot_every)),
        None => Box::new(NullFrameRenderer),
    };

    let cancelled = Arc::new(AtomicBool::new(false));
    let flag = cancelled.clone();
    ctrlc::set_handler(move || flag.store(true, Ordering::Relaxed))?;

    let mut watch = WatchUseCase::new(
        Box::new(FfmpegFrameSource::new(input)),
        pipeline,
        renderer,
        cli.max_frames,
        Some(cancelled),
    );
    if let Some(clock) = replay_clock {
        watch = watch.with_replay_clock(clock);
    }

    let summary = watch.execute()?;
    log::info!(
        "{} frames watched, {} skipped, {} presence event(s)",
        summary.frames_processed,
        summary.frames_skipped,
        summary.events.len()
    );
    if summary.sink_failures > 0 {
        log::warn!("{} event(s) could not be written", summary.sink_failures);
    }
    Ok(())
}

fn apply_overrides(settings: &mut WatchSettings, cli: &Cli) {
    if let Some(dir) = &cli.cascade_dir {
        settings.cascade_dir = Some(dir.clone());
    }
    if let Some(log) = &cli.log {
        settings.log_path = log.clone();
    }
    if let Some(format) = cli.log_format {
        settings.log_format = format;
    }
    if let Some(secs) = cli.timeout_secs {
        settings.timeout_secs = secs;
    }
    if let Some(scale) = cli.face_scale {
        settings.faces.scale_factor = scale;
    }
    if let Some(n) = cli.face_neighbors {
        settings.faces.min_neighbors = n;
    }
    if let Some(size) = cli.face_min_size {
        settings.faces.min_size = size;
    }
    if let Some(scale) = cli.eye_scale {
        settings.eyes.scale_factor = scale;
    }
    if let Some(n) = cli.eye_neighbors {
        settings.eyes.min_neighbors = n;
    }
    if let Some(size) = cli.eye_min_size {
        settings.eyes.min_size = size;
    }
    if let Some(size) = cli.eye_max_size {
        settings.eyes.max_size = Some(size);
    }
    if let Some(path) = &cli.snapshot {
        settings.snapshot = Some(path.clone());
    }
    if let Some(every) = cli.snapshot_every {
        settings.snapshot_every = every;
    }
    settings.offline |= cli.offline;
}

fn parse_box_size(s: &str) -> Result<BoxSize, String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WxH, got '{s}'"))?;
    let width = w.trim().parse().map_err(|_| format!("bad width in '{s}'"))?;
    let height = h.trim().parse().map_err(|_| format!("bad height in '{s}'"))?;
    Ok(BoxSize::new(width, height))
}
