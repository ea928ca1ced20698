use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};

/// Typeface read by the native build when `--font` is not given.
pub const DEFAULT_FONT_PATH: &str = "assets/helvetiker_regular.typeface.json";
/// Typeface fetched by the browser build.
pub const FONT_URL: &str = "https://threejs.org/examples/fonts/helvetiker_regular.typeface.json";
pub const DEFAULT_FONT_TIMEOUT: Duration = Duration::from_secs(30);
/// Canvas the browser build draws into when present.
pub const CANVAS_ID: &str = "glowcube-canvas";
pub const WINDOW_TITLE: &str = "glowcube";
/// Logical size of the native window.
pub const WINDOW_SIZE: (u32, u32) = (1280, 720);

const USAGE: &str =
    "Usage: glowcube [--font <path>] [--font-timeout <seconds>] [--summary-only] [--keys <sequence>]";

#[derive(Debug, Clone, PartialEq)]
pub struct CliOptions {
    pub font_path: PathBuf,
    /// `None` waits for the font indefinitely.
    pub font_timeout: Option<Duration>,
    pub summary_only: bool,
    /// Key presses replayed by the headless run, one per character.
    pub keys: String,
}

impl Default for CliOptions {
    fn default() -> Self {
        Self {
            font_path: PathBuf::from(DEFAULT_FONT_PATH),
            font_timeout: Some(DEFAULT_FONT_TIMEOUT),
            summary_only: false,
            keys: String::new(),
        }
    }
}

impl CliOptions {
    pub fn parse() -> Result<Self> {
        Self::parse_from(std::env::args().skip(1))
    }

    /// Parses arguments, program name excluded.
    pub fn parse_from<I>(args: I) -> Result<Self>
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let mut options = Self::default();
        let mut args = args.into_iter().map(Into::into);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--font" => options.font_path = PathBuf::from(value_for(&mut args, &arg)?),
                "--font-timeout" => {
                    let value = value_for(&mut args, &arg)?;
                    options.font_timeout = parse_timeout(&value)?;
                }
                "--summary-only" => options.summary_only = true,
                "--keys" => options.keys = value_for(&mut args, &arg)?,
                "-h" | "--help" => return Err(anyhow!(USAGE)),
                other => return Err(anyhow!("Unknown argument: {other}. {USAGE}")),
            }
        }
        Ok(options)
    }
}

fn value_for(args: &mut impl Iterator<Item = String>, flag: &str) -> Result<String> {
    args.next()
        .ok_or_else(|| anyhow!("{flag} expects a value. {USAGE}"))
}

fn parse_timeout(value: &str) -> Result<Option<Duration>> {
    let seconds: f64 = value
        .parse()
        .with_context(|| format!("invalid --font-timeout value {value:?}"))?;
    if !seconds.is_finite() || seconds < 0.0 {
        return Err(anyhow!("--font-timeout must be a non-negative number of seconds"));
    }
    if seconds == 0.0 {
        return Ok(None);
    }
    Duration::try_from_secs_f64(seconds)
        .map(Some)
        .map_err(|err| anyhow!("--font-timeout out of range: {err}. {USAGE}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_without_arguments() {
        let options = CliOptions::parse_from(Vec::<String>::new()).unwrap();
        assert_eq!(options, CliOptions::default());
        assert_eq!(options.font_timeout, Some(Duration::from_secs(30)));
        assert_eq!(options.font_path, PathBuf::from(DEFAULT_FONT_PATH));
    }

    #[test]
    fn parses_every_flag() {
        let options = CliOptions::parse_from([
            "--font",
            "fonts/mono.json",
            "--font-timeout",
            "2.5",
            "--summary-only",
            "--keys",
            "wwa",
        ])
        .unwrap();
        assert_eq!(options.font_path, PathBuf::from("fonts/mono.json"));
        assert_eq!(options.font_timeout, Some(Duration::from_millis(2500)));
        assert!(options.summary_only);
        assert_eq!(options.keys, "wwa");
    }

    #[test]
    fn zero_timeout_disables_it() {
        let options = CliOptions::parse_from(["--font-timeout", "0"]).unwrap();
        assert_eq!(options.font_timeout, None);
    }

    #[test]
    fn rejects_bad_input() {
        assert!(CliOptions::parse_from(["--frobnicate"]).is_err());
        assert!(CliOptions::parse_from(["--font"]).is_err());
        assert!(CliOptions::parse_from(["--font-timeout", "soon"]).is_err());
        assert!(CliOptions::parse_from(["--font-timeout", "-1"]).is_err());
        assert!(CliOptions::parse_from(["--font-timeout", "1e300"]).is_err());
    }
}
