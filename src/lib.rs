//! Wildguard - camera-driven animal detection with species-tuned deterrents.
//!
//! A live session draws frames from a camera, classifies them with an ONNX
//! image model and, for confident detections, plays a tone at the middle of
//! the detected species' hearing range.

#![warn(missing_docs)]

pub mod camera;
pub mod cli;
pub mod config;
pub mod constants;
pub mod detection;
pub mod error;
pub mod inference;
pub mod output;
pub mod pipeline;
pub mod session;
pub mod signal;

use camera::{FrameSource, SnapshotCamera};
use clap::Parser;
use cli::console::{self, ConsoleInput};
use cli::validators::ToneTarget;
use cli::{CameraArgs, Cli, Command, ExportArgs, GlobalArgs, IdentifyArgs, ToneArgs};
use config::{
    CameraConfig, Config, LogConfig, config_file_path, load_default_config, save_default_config,
    validate_config,
};
use constants::signal::HZ_PER_KHZ;
use detection::{Detection, DetectionSink, SessionLog, SortOrder, Species};
use inference::{ModelHandle, OnnxGateway};
use pipeline::{collect_input_files, export_detections, identify_files, output_dir_for};
use session::{SessionController, SessionEvent, SessionHandle, SessionOptions};
use signal::{SignalDispatcher, Tone, build_sink, write_wav_file};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub use error::{Error, Result};

/// Console lines buffered between the stdin reader and the session.
const CONSOLE_BUFFER: usize = 16;

/// Main entry point for wildguard CLI.
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    init_logging(cli.global.verbose, cli.global.quiet);

    // Load configuration, then let flags override it
    let mut config = load_default_config()?;
    apply_global_overrides(&mut config, &cli.global);
    validate_config(&config)?;

    let Some(command) = cli.command else {
        cli::help::print_smart_help(&config);
        return Ok(());
    };

    handle_command(command, config, cli.global.quiet)
}

fn init_logging(verbose: u8, quiet: bool) {
    use tracing_subscriber::{EnvFilter, fmt};

    // ORT logging is suppressed unless asked for with -vv.
    let filter_str = if quiet {
        "warn,ort=off".to_string()
    } else {
        match verbose {
            0 => "info,ort=off".to_string(),
            1 => "debug,ort=warn".to_string(),
            2 => "trace,ort=info".to_string(),
            _ => "trace".to_string(),
        }
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&filter_str));

    fmt().with_env_filter(filter).init();
}

fn apply_global_overrides(config: &mut Config, global: &GlobalArgs) {
    if let Some(path) = &global.model_path {
        config.model.path = Some(path.clone());
    }
    if let Some(path) = &global.labels_path {
        config.model.labels = Some(path.clone());
    }
    if let Some(sink) = global.sink {
        config.signal.sink = sink;
    }
    if let Some(dir) = &global.wav_dir {
        config.signal.wav_dir = Some(dir.clone());
    }
}

fn handle_command(command: Command, config: Config, quiet: bool) -> Result<()> {
    match command {
        Command::Camera(args) => run_camera(args, config),
        Command::Identify(args) => run_identify(&args, &config, quiet),
        Command::Devices { cameras } => list_devices(cameras, &config),
        Command::Species => {
            print_species_table();
            Ok(())
        }
        Command::Tone(args) => play_tone(&args, &config),
        Command::Config { action } => handle_config_command(action),
    }
}

fn build_runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Runtime::new().map_err(|e| Error::Internal {
        message: format!("Failed to create async runtime: {e}"),
    })
}

/// Run a live session until the user quits or presses Ctrl+C.
fn run_camera(args: CameraArgs, mut config: Config) -> Result<()> {
    if !args.cameras.is_empty() {
        config.cameras = args.cameras;
    }
    if let Some(mode) = args.mode {
        config.session.mode = mode;
    }
    if let Some(interval_ms) = args.interval_ms {
        config.session.frame_interval_ms = interval_ms;
    }
    if let Some(dir) = args.snapshot_dir {
        config.session.snapshot_dir = Some(dir);
    }
    validate_config(&config)?;

    let gateway = OnnxGateway::from_config(&config.model)?;
    let sink = build_sink(&config.signal)?;
    let dispatcher = SignalDispatcher::from_config(sink, &config.signal);

    let runtime = build_runtime()?;
    let detections = runtime.block_on(camera_session(&config, gateway, dispatcher));
    // A model load abandoned on Ctrl+C may still occupy a blocking thread.
    runtime.shutdown_background();

    export_log(&detections, &args.export, &config.log)
}

async fn camera_session(
    config: &Config,
    gateway: OnnxGateway,
    dispatcher: SignalDispatcher,
) -> Vec<Detection> {
    let mode = config.session.mode;
    let source: Arc<dyn FrameSource> = Arc::new(SnapshotCamera::new(config.cameras.clone()));
    let model = Arc::new(ModelHandle::new(Arc::new(gateway)));
    let log = Arc::new(SessionLog::new());
    let options = SessionOptions {
        mode,
        snapshot_dir: config.session.snapshot_dir.clone(),
    };

    let sink: Arc<dyn DetectionSink> = Arc::clone(&log) as Arc<dyn DetectionSink>;
    let (controller, events) = SessionController::new(source, model, dispatcher, sink, options);

    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    if let Err(e) = ctrlc::set_handler(move || interrupt.cancel()) {
        warn!("Failed to install Ctrl+C handler: {e}");
    }

    info!("Starting {mode} session (h for commands, q to quit)");

    let (handle, commands) = SessionHandle::channel();
    let printer = tokio::spawn(print_events(events));
    let console = tokio::spawn(run_console(
        handle.clone(),
        spawn_stdin_reader(),
        Arc::clone(&log),
        mode,
        cancel.clone(),
    ));

    let frame_interval = Duration::from_millis(config.session.frame_interval_ms);
    let mut controller =
        session::driver::run(controller, commands, cancel.clone(), frame_interval).await;

    cancel.cancel();
    drop(handle);
    if let Err(e) = console.await {
        debug!("Console task ended abnormally: {e}");
    }

    controller.flush_signals().await;
    drop(controller);
    if let Err(e) = printer.await {
        debug!("Event printer ended abnormally: {e}");
    }

    info!("Session ended with {} detection(s)", log.len());
    log.sorted(SortOrder::Ascending)
}

/// Read stdin lines on a dedicated thread.
///
/// The thread stays parked in `read_line` after the session ends; it never
/// holds up process exit.
fn spawn_stdin_reader() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel(CONSOLE_BUFFER);
    std::thread::spawn(move || {
        for line in std::io::stdin().lines() {
            let Ok(line) = line else { break };
            if tx.blocking_send(line).is_err() {
                break;
            }
        }
    });
    rx
}

#[allow(clippy::print_stdout)]
async fn run_console(
    handle: SessionHandle,
    mut lines: mpsc::Receiver<String>,
    log: Arc<SessionLog>,
    mode: config::CaptureMode,
    cancel: CancellationToken,
) {
    let mut order = SortOrder::default();

    loop {
        let line = tokio::select! {
            _ = cancel.cancelled() => break,
            line = lines.recv() => line,
        };
        let Some(line) = line else {
            debug!("Console input closed; Ctrl+C ends the session");
            break;
        };

        match console::parse_input(&line) {
            ConsoleInput::Session(command) => {
                if handle.send(command).await.is_err() {
                    break;
                }
            }
            ConsoleInput::ShowLog => println!("{}", console::format_log(&log.sorted(order), order)),
            ConsoleInput::ToggleSort => {
                order = order.toggled();
                println!("{}", console::format_log(&log.sorted(order), order));
            }
            ConsoleInput::ClearLog => {
                log.clear();
                println!("Session log cleared");
            }
            ConsoleInput::Help => println!("{}", console::help_text(mode)),
            ConsoleInput::Empty => {}
            ConsoleInput::Unknown(word) => println!("Unknown command '{word}' (h for help)"),
        }
    }
}

#[allow(clippy::print_stdout)]
async fn print_events(mut events: mpsc::UnboundedReceiver<SessionEvent>) {
    while let Some(event) = events.recv().await {
        if let Some(line) = console::describe_event(&event) {
            println!("{line}");
        }
    }
}

/// Identify animals in still images.
#[allow(clippy::print_stdout)]
fn run_identify(args: &IdentifyArgs, config: &Config, quiet: bool) -> Result<()> {
    let files = collect_input_files(&args.inputs)?;
    info!("Found {} image file(s) to identify", files.len());

    let gateway = OnnxGateway::from_config(&config.model)?;
    let sink = build_sink(&config.signal)?;
    let dispatcher = SignalDispatcher::from_config(sink, &config.signal);
    let model = ModelHandle::new(Arc::new(gateway));
    let log = SessionLog::new();

    let runtime = build_runtime()?;
    let summary =
        runtime.block_on(identify_files(&files, &model, &dispatcher, &log, !quiet))?;

    for outcome in &summary.outcomes {
        println!("{outcome}");
    }
    info!(
        "Complete: {} image(s), {} detection(s), {} error(s)",
        summary.outcomes.len(),
        summary.detections(),
        summary.failed
    );
    if summary.failed > 0 {
        warn!("{} image(s) could not be identified", summary.failed);
    }

    export_log(&log.sorted(SortOrder::Ascending), &args.export, &config.log)
}

#[allow(clippy::print_stdout)]
fn export_log(detections: &[Detection], export: &ExportArgs, log: &LogConfig) -> Result<()> {
    let formats = export.format.clone().unwrap_or_else(|| log.formats.clone());
    let output_dir = output_dir_for(export.output_dir.as_deref().or(log.output_dir.as_deref()));
    let csv_bom = log.csv_bom && !export.no_csv_bom;

    for path in export_detections(detections, &output_dir, &formats, csv_bom)? {
        println!("Wrote {}", path.display());
    }
    Ok(())
}

#[allow(clippy::print_stdout)]
fn list_devices(cameras: Vec<CameraConfig>, config: &Config) -> Result<()> {
    let cameras = if cameras.is_empty() {
        config.cameras.clone()
    } else {
        cameras
    };
    let configured = cameras.len();
    let devices = SnapshotCamera::new(cameras).enumerate()?;

    if devices.is_empty() {
        println!("No cameras available ({configured} configured).");
        return Ok(());
    }

    println!("Available cameras:");
    for (index, device) in devices.iter().enumerate() {
        println!("  {}. {}", index + 1, device.label);
    }
    Ok(())
}

#[allow(clippy::print_stdout)]
fn print_species_table() {
    println!("{:<10} {:<14} Signal", "Animal", "Audio range");
    for species in Species::ALL {
        let range = species.audio_range();
        println!(
            "{:<10} {:<14} {} kHz",
            species.name(),
            range.to_string(),
            range.midpoint_khz()
        );
    }
}

/// Emit a single tone at the midpoint of the target range.
#[allow(clippy::print_stdout)]
fn play_tone(args: &ToneArgs, config: &Config) -> Result<()> {
    let signal = &config.signal;
    let midpoint_khz = args.target.range().midpoint_khz();
    let duration = Duration::from_millis(args.duration_ms.unwrap_or(signal.duration_ms));
    let tone = Tone::new(
        midpoint_khz * HZ_PER_KHZ,
        duration,
        Duration::from_millis(signal.fade_in_ms),
        args.gain.unwrap_or(signal.gain),
    );

    let target = match args.target {
        ToneTarget::Species(species) => species.to_string(),
        ToneTarget::Range(range) => range.to_string(),
    };

    if let Some(path) = &args.output {
        let samples = tone.render(signal.sample_rate)?;
        write_wav_file(path, &samples, signal.sample_rate)?;
        println!(
            "Wrote {midpoint_khz} kHz tone for {target} to {}",
            path.display()
        );
        return Ok(());
    }

    println!(
        "Emitting {midpoint_khz} kHz tone for {target} ({:.1}s)",
        duration.as_secs_f32()
    );
    build_sink(signal)?.emit(&tone)
}

#[allow(clippy::print_stdout)]
fn handle_config_command(action: cli::ConfigAction) -> Result<()> {
    use cli::ConfigAction;

    match action {
        ConfigAction::Init => {
            let path = config_file_path()?;
            if path.exists() {
                println!("Configuration file already exists: {}", path.display());
            } else {
                let config = Config::default();
                let saved_path = save_default_config(&config)?;
                println!("Created configuration file: {}", saved_path.display());
                println!("\nNext steps:");
                println!("  set [model] path and labels, then add a [[cameras]] entry");
            }
            Ok(())
        }
        ConfigAction::Show => {
            let config = load_default_config()?;
            println!("{config:#?}");
            Ok(())
        }
        ConfigAction::Path => {
            let path = config_file_path()?;
            println!("{}", path.display());
            Ok(())
        }
    }
}
