//! Command-line flags of the `qrwatch` binary
//!
//! Flags use a single dash (`-delay 8`); a double dash is accepted too.
//! Parsing never fails: unknown arguments are skipped, a flag without a value
//! is ignored, and numbers are read leniently (leading digits, else zero).

use std::path::PathBuf;

use crate::config::{Config, SourceKind};

/// Usage text printed for `-help`
pub const USAGE: &str = "\
usage: qrwatch [flags]

  -delay <n>        frames a changed code must persist before it is committed (default 8)
  -interval <ms>    delay between polls in milliseconds (default 100)
  -config <path>    JSON configuration file
  -device <n>       camera device index
  -output <path>    file receiving the active code (default code.txt)
  -sentinel <path>  stop when this file appears (it is deleted)
  -source <kind>    camera, mock or stills
  -stills <dir>     directory replayed by the stills source
  -display          show a preview window; any key stops the scanner
  -help             print this text";

const VALUE_FLAGS: &[&str] = &[
    "delay", "interval", "config", "device", "output", "sentinel", "source", "stills",
];

/// Flags given on the command line; `None` leaves the configured value
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliArgs {
    /// `-delay`: commit threshold
    pub delay: Option<u32>,
    /// `-interval`: poll delay in milliseconds
    pub interval: Option<u64>,
    /// `-config`: configuration file
    pub config: Option<PathBuf>,
    /// `-device`: camera index
    pub device: Option<u32>,
    /// `-output`: output file
    pub output: Option<PathBuf>,
    /// `-sentinel`: stop marker path
    pub sentinel: Option<PathBuf>,
    /// `-source`: frame source kind
    pub source: Option<SourceKind>,
    /// `-stills`: stills directory
    pub stills: Option<PathBuf>,
    /// `-display`: preview window
    pub display: bool,
    /// `-help`
    pub help: bool,
}

/// Read a leading integer the way C `atoi` does; no digits gives 0
pub fn atoi(s: &str) -> i64 {
    let s = s.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let mut value: i64 = 0;
    for b in digits.bytes().take_while(u8::is_ascii_digit) {
        value = value.saturating_mul(10).saturating_add((b - b'0') as i64);
    }
    if negative { -value } else { value }
}

fn flag_name(arg: &str) -> Option<&str> {
    let name = arg.strip_prefix("--").or_else(|| arg.strip_prefix('-'))?;
    if name.is_empty() { None } else { Some(name) }
}

fn is_known_flag(arg: &str) -> bool {
    flag_name(arg).is_some_and(|name| {
        VALUE_FLAGS.contains(&name) || matches!(name, "display" | "help" | "h")
    })
}

impl CliArgs {
    /// Parse the process arguments (the program name is skipped)
    pub fn from_env() -> Self {
        Self::parse(std::env::args().skip(1))
    }

    /// Parse arguments, program name excluded
    pub fn parse<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let args: Vec<String> = args.into_iter().map(|s| s.as_ref().to_string()).collect();
        let mut parsed = CliArgs::default();
        let mut i = 0;

        while i < args.len() {
            let Some(name) = flag_name(&args[i]) else {
                i += 1;
                continue;
            };

            match name {
                "display" => parsed.display = true,
                "help" | "h" => parsed.help = true,
                _ if VALUE_FLAGS.contains(&name) => {
                    if let Some(value) = args.get(i + 1).filter(|v| !is_known_flag(v)) {
                        parsed.set(name, value);
                        i += 1;
                    }
                }
                _ => {}
            }
            i += 1;
        }
        parsed
    }

    fn set(&mut self, name: &str, value: &str) {
        match name {
            "delay" => {
                if let Ok(v) = u32::try_from(atoi(value)) {
                    self.delay = Some(v);
                }
            }
            "interval" => {
                if let Ok(v) = u64::try_from(atoi(value)) {
                    self.interval = Some(v);
                }
            }
            "device" => {
                if let Ok(v) = u32::try_from(atoi(value)) {
                    self.device = Some(v);
                }
            }
            "config" => self.config = Some(PathBuf::from(value)),
            "output" => self.output = Some(PathBuf::from(value)),
            "sentinel" => self.sentinel = Some(PathBuf::from(value)),
            "stills" => self.stills = Some(PathBuf::from(value)),
            "source" => {
                if let Ok(kind) = value.parse() {
                    self.source = Some(kind);
                }
            }
            _ => {}
        }
    }

    /// Overlay the given flags onto `config`
    pub fn apply(&self, config: &mut Config) {
        if let Some(v) = self.delay {
            config.scan.max_retry = v;
        }
        if let Some(v) = self.interval {
            config.scan.interval_ms = v;
        }
        if let Some(v) = self.device {
            config.camera.device_id = v;
        }
        if let Some(v) = &self.output {
            config.output.file_path = v.clone();
        }
        if let Some(v) = &self.sentinel {
            config.sentinel_path = v.clone();
        }
        if let Some(v) = &self.stills {
            config.source.stills_dir = Some(v.clone());
            if self.source.is_none() {
                config.source.kind = SourceKind::Stills;
            }
        }
        if let Some(v) = self.source {
            config.source.kind = v;
        }
        if self.display {
            config.display = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delay_and_interval() {
        let args = CliArgs::parse(["-delay", "3", "-interval", "250"]);
        assert_eq!(args.delay, Some(3));
        assert_eq!(args.interval, Some(250));
    }

    #[test]
    fn test_double_dash_accepted() {
        let args = CliArgs::parse(["--delay", "4"]);
        assert_eq!(args.delay, Some(4));
    }

    #[test]
    fn test_unknown_flags_ignored() {
        let args = CliArgs::parse(["-verbose", "stray", "-delay", "2", "--whatever"]);
        assert_eq!(args.delay, Some(2));
        assert_eq!(args.interval, None);
    }

    #[test]
    fn test_missing_value_ignored() {
        let args = CliArgs::parse(["-interval", "50", "-delay"]);
        assert_eq!(args.interval, Some(50));
        assert_eq!(args.delay, None);
    }

    #[test]
    fn test_flag_is_not_taken_as_value() {
        let args = CliArgs::parse(["-delay", "-interval", "70"]);
        assert_eq!(args.delay, None);
        assert_eq!(args.interval, Some(70));
    }

    #[test]
    fn test_lenient_numbers() {
        assert_eq!(atoi("12abc"), 12);
        assert_eq!(atoi("  7"), 7);
        assert_eq!(atoi("-3"), -3);
        assert_eq!(atoi("abc"), 0);

        let args = CliArgs::parse(["-delay", "abc", "-interval", "-5"]);
        assert_eq!(args.delay, Some(0));
        assert_eq!(args.interval, None);
    }

    #[test]
    fn test_later_occurrence_wins() {
        let args = CliArgs::parse(["-delay", "1", "-delay", "9"]);
        assert_eq!(args.delay, Some(9));
    }

    #[test]
    fn test_apply_overrides_config() {
        let args = CliArgs::parse([
            "-delay", "2", "-interval", "30", "-output", "out.txt", "-stills", "frames", "-display",
        ]);
        let mut config = Config::default();
        args.apply(&mut config);

        assert_eq!(config.scan.max_retry, 2);
        assert_eq!(config.scan.interval_ms, 30);
        assert_eq!(config.output.file_path, PathBuf::from("out.txt"));
        assert_eq!(config.source.kind, SourceKind::Stills);
        assert_eq!(config.source.stills_dir, Some(PathBuf::from("frames")));
        assert!(config.display);
    }

    #[test]
    fn test_source_flag_wins_over_stills_default() {
        let args = CliArgs::parse(["-stills", "frames", "-source", "mock"]);
        let mut config = Config::default();
        args.apply(&mut config);
        assert_eq!(config.source.kind, SourceKind::Mock);
    }
}
