//! Scanner configuration
//!
//! Values are resolved in layers: built-in defaults, then a JSON config
//! file, then `QRWATCH_*` environment variables, then command-line flags.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::debounce::DEFAULT_MAX_RETRY;
use crate::persist::{DEFAULT_WRITE_ATTEMPTS, RetryPolicy};

/// File name searched for in the standard locations
pub const CONFIG_FILE_NAME: &str = "qrwatch.json";
/// Prefix of every environment override
pub const ENV_PREFIX: &str = "QRWATCH_";

/// Configuration loading failures
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file does not exist
    #[error("config file not found: {0}")]
    NotFound(PathBuf),
    /// The file exists but could not be read
    #[error("reading config file {path}: {source}")]
    Read {
        /// File path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },
    /// The file is not valid configuration JSON
    #[error("parsing config file {path}: {source}")]
    Parse {
        /// File path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: serde_json::Error,
    },
}

/// Camera capture settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Video device index
    pub device_id: u32,
    /// Requested frame width
    pub width: u32,
    /// Requested frame height
    pub height: u32,
    /// Requested frame rate (0 leaves the driver default)
    pub fps: u32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            device_id: 0,
            width: 640,
            height: 480,
            fps: 30,
        }
    }
}

/// Poll loop and debounce settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Delay before each iteration, in milliseconds
    pub interval_ms: u64,
    /// Disagreeing frames tolerated before a change is committed
    pub max_retry: u32,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            interval_ms: 100,
            max_retry: DEFAULT_MAX_RETRY,
        }
    }
}

/// Output file settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// File receiving the active code
    pub file_path: PathBuf,
    /// Write attempts before giving up
    pub write_attempts: u32,
    /// Pause between write attempts, in milliseconds
    pub write_retry_delay_ms: u64,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            file_path: PathBuf::from("code.txt"),
            write_attempts: DEFAULT_WRITE_ATTEMPTS,
            write_retry_delay_ms: 10,
        }
    }
}

/// Which frame source to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Physical webcam
    #[default]
    Camera,
    /// Synthetic frames
    Mock,
    /// Image files from a directory
    Stills,
}

impl std::str::FromStr for SourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "camera" => Ok(SourceKind::Camera),
            "mock" => Ok(SourceKind::Mock),
            "stills" => Ok(SourceKind::Stills),
            other => Err(format!("unknown source kind: {other}")),
        }
    }
}

/// Frame source settings
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Source kind
    pub kind: SourceKind,
    /// Directory replayed by the stills source
    pub stills_dir: Option<PathBuf>,
    /// Restart the stills sequence instead of ending the stream
    pub loop_stills: bool,
    /// Frames produced by the mock source before it ends (unbounded if unset)
    pub mock_frames: Option<u64>,
}

/// Complete scanner configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Camera capture
    pub camera: CameraConfig,
    /// Poll loop and debounce
    pub scan: ScanConfig,
    /// Output file
    pub output: OutputConfig,
    /// Frame source selection
    pub source: SourceConfig,
    /// File whose appearance stops the scanner
    pub sentinel_path: PathBuf,
    /// Show a preview window
    pub display: bool,
    /// Default log filter when `QRWATCH_LOG` is unset
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            camera: CameraConfig::default(),
            scan: ScanConfig::default(),
            output: OutputConfig::default(),
            source: SourceConfig::default(),
            sentinel_path: default_sentinel_path(),
            display: false,
            log_level: "info".to_string(),
        }
    }
}

/// Well-known absolute path of the stop marker
pub fn default_sentinel_path() -> PathBuf {
    if cfg!(windows) {
        PathBuf::from(r"C:\qrwatch\quit")
    } else {
        PathBuf::from("/tmp/qrwatch.quit")
    }
}

impl Config {
    /// Load a JSON config file; missing fields keep their defaults
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        let data = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&data).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Parse configuration JSON
    pub fn from_json(data: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(data)
    }

    /// Apply `QRWATCH_*` variables from the process environment
    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    /// Apply environment overrides using `lookup` to read variables.
    ///
    /// Values that do not parse are ignored.
    pub fn apply_env_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |name: &str| {
            lookup(&format!("{ENV_PREFIX}{name}"))
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let parse_u32 = |name: &str| get(name).and_then(|v| v.parse::<u32>().ok());
        let parse_u64 = |name: &str| get(name).and_then(|v| v.parse::<u64>().ok());

        if let Some(v) = parse_u32("CAMERA_DEVICE_ID") {
            self.camera.device_id = v;
        }
        if let Some(v) = parse_u32("CAMERA_WIDTH") {
            self.camera.width = v;
        }
        if let Some(v) = parse_u32("CAMERA_HEIGHT") {
            self.camera.height = v;
        }
        if let Some(v) = parse_u32("CAMERA_FPS") {
            self.camera.fps = v;
        }
        if let Some(v) = parse_u64("SCAN_INTERVAL_MS") {
            self.scan.interval_ms = v;
        }
        if let Some(v) = parse_u32("SCAN_MAX_RETRY") {
            self.scan.max_retry = v;
        }
        if let Some(v) = get("OUTPUT_FILE_PATH") {
            self.output.file_path = PathBuf::from(v);
        }
        if let Some(v) = get("SENTINEL_PATH") {
            self.sentinel_path = PathBuf::from(v);
        }
        if get("TEST_MODE").is_some_and(|v| v.eq_ignore_ascii_case("true") || v == "1") {
            self.source.kind = SourceKind::Mock;
        }
    }

    /// Delay before each loop iteration
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.scan.interval_ms)
    }

    /// Retry policy for the output file
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.output.write_attempts,
            Duration::from_millis(self.output.write_retry_delay_ms),
        )
    }
}

/// Standard places a config file is looked for, in priority order
pub fn config_search_paths() -> Vec<PathBuf> {
    let mut paths = vec![
        PathBuf::from(CONFIG_FILE_NAME),
        Path::new("config").join(CONFIG_FILE_NAME),
    ];
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join("qrwatch").join(CONFIG_FILE_NAME));
    }
    if let Some(exe_dir) = std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(Path::to_path_buf))
    {
        paths.push(exe_dir.join(CONFIG_FILE_NAME));
        paths.push(exe_dir.join("config").join(CONFIG_FILE_NAME));
    }
    paths
}

/// First existing config file in the standard locations
pub fn find_config_file() -> Option<PathBuf> {
    config_search_paths().into_iter().find(|p| p.is_file())
}

/// Result of layered configuration loading
#[derive(Debug, Clone)]
pub struct Resolved {
    /// Effective configuration
    pub config: Config,
    /// File the configuration was read from, if any
    pub file: Option<PathBuf>,
    /// Problems met along the way; reported once logging is up
    pub warnings: Vec<String>,
}

/// Load defaults, then `explicit` (or the first file found), then the
/// environment. Loading problems fall back to defaults with a warning.
pub fn resolve(explicit: Option<&Path>) -> Resolved {
    let mut warnings = Vec::new();
    let candidate = match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => find_config_file(),
    };

    let (mut config, file) = match candidate {
        Some(path) => match Config::load(&path) {
            Ok(config) => (config, Some(path)),
            Err(err) => {
                warnings.push(format!("{err}; using default configuration"));
                (Config::default(), None)
            }
        },
        None => (Config::default(), None),
    };

    config.apply_env();
    Resolved {
        config,
        file,
        warnings,
    }
}
