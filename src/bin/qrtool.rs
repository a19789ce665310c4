use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use qr_watch::camera::{FrameError, open_source};
use qr_watch::config::{self, Config, SourceKind};
use qr_watch::debounce::DEFAULT_MAX_RETRY;
use qr_watch::persist::CodeSink;
use qr_watch::telemetry::init_logging;
use qr_watch::tools::{replay_dir, scan_image};
use qr_watch::{DecodeResult, FileSink, QrDecoder, Update};
use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Parser)]
#[command(name = "qrtool", version, about = "qrwatch diagnostic tools")]
struct Cli {
    /// JSON configuration file (defaults to the standard locations)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Decode a single image and print every symbol
    Decode {
        #[arg(long)]
        image: PathBuf,
    },
    /// Replay a directory of frames through the debouncer
    Replay {
        #[arg(long)]
        dir: PathBuf,
        /// Commit threshold
        #[arg(long, default_value_t = DEFAULT_MAX_RETRY)]
        delay: u32,
        /// Also write every commit to this file
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Print the effective configuration
    Config,
    /// Open the configured frame source and grab one frame
    Probe {
        /// Override the source kind (camera, mock, stills)
        #[arg(long)]
        source: Option<SourceKind>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let resolved = config::resolve(cli.config.as_deref());
    init_logging(&resolved.config.log_level).ok();
    for warning in &resolved.warnings {
        tracing::warn!("{warning}");
    }

    match cli.command {
        Command::Decode { image } => decode_cmd(&image),
        Command::Replay { dir, delay, output } => replay_cmd(&dir, delay, output.as_deref()),
        Command::Config => config_cmd(&resolved.config),
        Command::Probe { source } => probe_cmd(resolved.config, source),
    }
}

fn decode_cmd(image: &Path) -> Result<()> {
    let mut decoder = QrDecoder::new();
    let started = Instant::now();
    let scan = scan_image(image, &mut decoder)
        .with_context(|| format!("failed to scan {}", image.display()))?;
    let elapsed = started.elapsed();

    println!("Image: {} ({}x{})", image.display(), scan.width, scan.height);
    println!(
        "Grayscale range: {}-{}, average: {}",
        scan.stats.min, scan.stats.max, scan.stats.avg
    );
    match &scan.result {
        DecodeResult::NoSymbol => println!("No symbols found"),
        DecodeResult::Error(detail) => bail!("decoder failed: {detail}"),
        DecodeResult::Symbols(symbols) => {
            println!("Found {} symbol(s)", symbols.len());
            for (i, symbol) in symbols.iter().enumerate() {
                let corners: Vec<String> =
                    symbol.meta.corners.iter().map(|p| p.to_string()).collect();
                println!(
                    "  Symbol {}: version={} ecc={} mask={} corners=[{}] content={}",
                    i,
                    symbol.meta.version,
                    symbol.meta.ecc_level,
                    symbol.meta.mask,
                    corners.join(", "),
                    symbol.text()
                );
            }
        }
    }
    println!("Decode time: {:.2} ms", elapsed.as_secs_f64() * 1000.0);
    Ok(())
}

fn replay_cmd(dir: &Path, delay: u32, output: Option<&Path>) -> Result<()> {
    let mut sink = output.map(FileSink::new);
    let mut write_error = None;

    let events = replay_dir(dir, delay, |event| {
        println!(
            "frame {:>4} {}: {}",
            event.frame,
            event.path.display(),
            describe(&event.update)
        );
        if let Some(sink) = sink.as_mut() {
            if let Err(err) = sink.persist(event.update.payload()) {
                write_error.get_or_insert(err);
            }
        }
    })
    .with_context(|| format!("failed to replay {}", dir.display()))?;

    println!("{} commit(s)", events.len());
    if let Some(err) = write_error {
        return Err(err).context("writing replay output");
    }
    Ok(())
}

fn describe(update: &Update) -> String {
    let text = |bytes: &[u8]| String::from_utf8_lossy(bytes).into_owned();
    match update {
        Update::Appeared(code) => format!("appeared {:?}", text(code)),
        Update::Replaced { previous, current } => {
            format!("replaced {:?} -> {:?}", text(previous), text(current))
        }
        Update::Cleared { previous } => format!("cleared {:?}", text(previous)),
    }
}

fn config_cmd(config: &Config) -> Result<()> {
    let json = serde_json::to_string_pretty(config).context("serializing configuration")?;
    println!("{json}");
    Ok(())
}

fn probe_cmd(mut config: Config, source: Option<SourceKind>) -> Result<()> {
    if let Some(kind) = source {
        config.source.kind = kind;
    }
    if config.source.kind == SourceKind::Mock && config.source.mock_frames.is_none() {
        config.source.mock_frames = Some(1);
    }

    let mut frames = open_source(&config.source, &config.camera)
        .context("cannot initialize frame source")?;
    println!("Source: {}", frames.describe());

    let started = Instant::now();
    match frames.next_frame() {
        Ok(frame) => {
            println!(
                "Frame: {}x{} in {:.2} ms",
                frame.width(),
                frame.height(),
                started.elapsed().as_secs_f64() * 1000.0
            );
            Ok(())
        }
        Err(FrameError::EndOfStream) => bail!("source produced no frame"),
        Err(err) => Err(err).context("frame acquisition failed"),
    }
}
