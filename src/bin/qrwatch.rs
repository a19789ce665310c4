//! qrwatch: poll a webcam and keep the visible QR code in a text file

use std::process::ExitCode;

use qr_watch::camera::open_source;
use qr_watch::cli::{CliArgs, USAGE};
use qr_watch::config::{self, Config};
use qr_watch::display::open_preview;
use qr_watch::telemetry::init_logging;
use qr_watch::{Debouncer, FileSink, QrDecoder, Scanner, Sentinel, ShutdownFlag};
use tracing::{error, info, warn};

const WINDOW_TITLE: &str = "qrwatch";

fn main() -> ExitCode {
    let args = CliArgs::from_env();
    if args.help {
        println!("{USAGE}");
        return ExitCode::SUCCESS;
    }

    let resolved = config::resolve(args.config.as_deref());
    let mut config = resolved.config;
    args.apply(&mut config);

    if let Err(err) = init_logging(&config.log_level) {
        eprintln!("logging unavailable: {err}");
    }
    for warning in &resolved.warnings {
        warn!("{warning}");
    }
    match &resolved.file {
        Some(path) => info!(path = %path.display(), "configuration loaded"),
        None => info!("no configuration file, using defaults"),
    }

    run(&config)
}

fn run(config: &Config) -> ExitCode {
    info!(version = env!("CARGO_PKG_VERSION"), "qrwatch starting");

    let shutdown = ShutdownFlag::new();
    if let Err(err) = shutdown.install() {
        warn!(error = %err, "signal handlers not installed; Ctrl+C will not stop cleanly");
    }

    let source = match open_source(&config.source, &config.camera) {
        Ok(source) => source,
        Err(err) => {
            error!(error = %err, "cannot initialize frame source");
            return ExitCode::FAILURE;
        }
    };

    let sink = FileSink::with_retry(&config.output.file_path, config.retry_policy());
    info!(path = %sink.path().display(), "codes will be written here");

    let mut scanner = Scanner::new(
        source,
        QrDecoder::new(),
        sink,
        Debouncer::new(config.scan.max_retry),
    )
    .with_interval(config.interval())
    .with_shutdown(shutdown)
    .with_sentinel(Sentinel::new(&config.sentinel_path));

    if config.display {
        match open_preview(WINDOW_TITLE) {
            Ok(preview) => scanner = scanner.with_preview(preview),
            Err(err) => warn!(error = %err, "running headless"),
        }
    }

    let reason = scanner.run();
    let stats = scanner.stats();
    drop(scanner);

    if reason.is_fatal() {
        error!(%reason, "scanner stopped");
    }
    info!(
        frames = stats.frames,
        commits = stats.commits,
        persist_failures = stats.persist_failures,
        "exit"
    );
    ExitCode::SUCCESS
}
