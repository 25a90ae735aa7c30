//! Persistent CLI settings (RON).

use anyhow::{Context, Result};
use hdredit_render::RendererConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Settings read from `settings.ron`. Every field is optional in the file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Render lane tunables.
    pub renderer: RendererConfig,
    /// Output type used by `export` when `--type` is not given.
    pub default_type: String,
    /// Log file used when `--log-file` is not given.
    pub log_file: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            renderer: RendererConfig::default(),
            default_type: "heic".into(),
            log_file: None,
        }
    }
}

/// Platform settings location.
pub fn settings_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("hdredit").join("settings.ron"))
}

/// Loads settings.
///
/// An explicit `--config` file must exist and parse. The platform file is
/// optional; if it is unreadable the defaults are used and a note is
/// returned for the caller to log once logging is up.
pub fn load(explicit: Option<&Path>) -> Result<(Settings, Option<String>)> {
    if let Some(path) = explicit {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings: {}", path.display()))?;
        let settings = parse(&text).with_context(|| format!("Invalid settings: {}", path.display()))?;
        return Ok((settings, None));
    }

    let Some(path) = settings_path() else {
        return Ok((Settings::default(), None));
    };
    let Ok(text) = std::fs::read_to_string(&path) else {
        return Ok((Settings::default(), None));
    };
    match parse(&text) {
        Ok(settings) => Ok((settings, None)),
        Err(e) => Ok((
            Settings::default(),
            Some(format!("ignoring {}: {e}", path.display())),
        )),
    }
}

fn parse(text: &str) -> Result<Settings> {
    Ok(ron::from_str(text)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn partial_file() {
        let s = parse("(renderer: (min_interval_ms: 10), default_type: \"png\")").unwrap();
        assert_eq!(s.renderer.min_interval(), Duration::from_millis(10));
        assert_eq!(s.renderer.render_deadline(), Duration::from_secs(30));
        assert_eq!(s.default_type, "png");
        assert_eq!(s.log_file, None);
    }

    #[test]
    fn explicit_file_must_parse() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.ron");
        std::fs::write(&path, "(default_type: ").unwrap();
        assert!(load(Some(&path)).is_err());

        std::fs::write(&path, "()").unwrap();
        let (s, note) = load(Some(&path)).unwrap();
        assert_eq!(s, Settings::default());
        assert!(note.is_none());
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        assert!(load(Some(Path::new("/nonexistent/hdredit.ron"))).is_err());
    }
}
