use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Bounds for the on-screen point budget adjustments.
pub const MAX_POINTS_CEILING: usize = 100_000_000;
pub const MAX_POINTS_FLOOR: usize = 10;

/// Point budget for plot views.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    /// Points shown for the full series before zoom scaling.
    pub max_display_points: usize,
    pub max_points_on_screen: usize,
    pub min_points_on_screen: usize,
    /// Rebuilds triggered closer together than this are coalesced.
    pub debounce_ms: u64,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            max_display_points: 2000,
            // 1500 stays responsive with several hundred thousand samples.
            max_points_on_screen: 1500,
            min_points_on_screen: 100,
            debounce_ms: 150,
        }
    }
}

impl ViewConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn increase_max_points(&mut self, step: usize) {
        self.max_points_on_screen = self
            .max_points_on_screen
            .saturating_add(step)
            .min(MAX_POINTS_CEILING);
    }

    pub fn decrease_max_points(&mut self, step: usize) {
        self.max_points_on_screen = self
            .max_points_on_screen
            .saturating_sub(step)
            .max(MAX_POINTS_FLOOR);
    }

    pub fn increase_min_points(&mut self, step: usize) {
        self.min_points_on_screen = self
            .min_points_on_screen
            .saturating_add(step)
            .min(self.max_points_on_screen);
    }

    pub fn decrease_min_points(&mut self, step: usize) {
        self.min_points_on_screen = self.min_points_on_screen.saturating_sub(step).max(1);
    }
}

/// How many rows the head/tail trim previews show.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrimConfig {
    pub top_context: usize,
    pub bottom_context: usize,
}

impl Default for TrimConfig {
    fn default() -> Self {
        Self {
            top_context: 20,
            bottom_context: 20,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Appended to the file stem of selection exports.
    pub selection_suffix: String,
    /// Used when the sanitized file name comes out empty.
    pub fallback_name: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            selection_suffix: "_selection".to_string(),
            fallback_name: "arquivo.txt".to_string(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub view: ViewConfig,
    pub trim: TrimConfig,
    pub export: ExportConfig,
}

impl AppConfig {
    /// Read a JSON config; missing keys keep their defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn partial_json_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "view": {{ "max_points_on_screen": 800 }} }}"#).unwrap();
        let cfg = AppConfig::load(file.path()).unwrap();
        assert_eq!(cfg.view.max_points_on_screen, 800);
        assert_eq!(cfg.view.min_points_on_screen, 100);
        assert_eq!(cfg.trim, TrimConfig::default());
        assert_eq!(cfg.export.selection_suffix, "_selection");
    }

    #[test]
    fn malformed_json_is_reported() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        assert!(matches!(AppConfig::load(file.path()), Err(ConfigError::Json { .. })));
    }

    #[test]
    fn point_budget_adjustments_respect_bounds() {
        let mut view = ViewConfig::default();
        view.decrease_max_points(5000);
        assert_eq!(view.max_points_on_screen, MAX_POINTS_FLOOR);
        view.increase_min_points(1000);
        assert_eq!(view.min_points_on_screen, MAX_POINTS_FLOOR);
        view.decrease_min_points(1000);
        assert_eq!(view.min_points_on_screen, 1);
        view.increase_max_points(usize::MAX);
        assert_eq!(view.max_points_on_screen, MAX_POINTS_CEILING);
    }
}
