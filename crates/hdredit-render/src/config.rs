//! Renderer configuration.

use crate::buffer::DEFAULT_MAX_PIXELS;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Tunables for a [`Renderer`](crate::Renderer).
///
/// Missing fields take their defaults when deserialized, so a partial
/// settings file is valid:
///
/// ```rust
/// use hdredit_render::RendererConfig;
/// use std::time::Duration;
///
/// let cfg = RendererConfig::default().with_min_interval(Duration::from_millis(40));
/// assert_eq!(cfg.min_interval(), Duration::from_millis(40));
/// assert_eq!(cfg.render_deadline(), Duration::from_secs(30));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    /// Minimum spacing between preview dispatches, in milliseconds.
    pub min_interval_ms: u64,
    /// How long an export waits for the render lane, in milliseconds.
    pub render_deadline_ms: u64,
    /// Largest preview buffer, in pixels.
    pub max_buffer_pixels: usize,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            min_interval_ms: 25,
            render_deadline_ms: 30_000,
            max_buffer_pixels: DEFAULT_MAX_PIXELS,
        }
    }
}

impl RendererConfig {
    /// Minimum spacing between preview dispatches.
    pub fn min_interval(&self) -> Duration {
        Duration::from_millis(self.min_interval_ms)
    }

    /// Export wait deadline.
    pub fn render_deadline(&self) -> Duration {
        Duration::from_millis(self.render_deadline_ms)
    }

    /// Sets the dispatch spacing.
    pub fn with_min_interval(mut self, interval: Duration) -> Self {
        self.min_interval_ms = interval.as_millis() as u64;
        self
    }

    /// Sets the export deadline.
    pub fn with_render_deadline(mut self, deadline: Duration) -> Self {
        self.render_deadline_ms = deadline.as_millis() as u64;
        self
    }

    /// Sets the preview buffer limit.
    pub fn with_max_buffer_pixels(mut self, pixels: usize) -> Self {
        self.max_buffer_pixels = pixels;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_ron_uses_defaults() {
        let cfg: RendererConfig = ron::from_str("(min_interval_ms: 50)").unwrap();
        assert_eq!(cfg.min_interval(), Duration::from_millis(50));
        assert_eq!(cfg.render_deadline_ms, 30_000);
        assert_eq!(cfg.max_buffer_pixels, DEFAULT_MAX_PIXELS);
    }

    #[test]
    fn ron_round_trip() {
        let cfg = RendererConfig::default().with_max_buffer_pixels(1 << 20);
        let text = ron::to_string(&cfg).unwrap();
        assert_eq!(ron::from_str::<RendererConfig>(&text).unwrap(), cfg);
    }
}
