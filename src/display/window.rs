use serde::Serialize;

use crate::config::ViewConfig;
use crate::display::downsample::downsample_indexed;
use crate::edit::EditableSeries;
use crate::types::Channel;

/// Visible x span in sample-index units, as reported by the plot axis.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewWindow {
    pub min_x: f64,
    pub max_x: f64,
}

/// Display points for one window of a series, x in working-index space.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct SeriesView {
    pub start: usize,
    pub end: usize,
    /// Point budget that was handed to the downsampler.
    pub budget: usize,
    pub z: Vec<(f64, f64)>,
    pub x: Vec<(f64, f64)>,
    pub y: Vec<(f64, f64)>,
}

impl SeriesView {
    pub fn channel(&self, channel: Channel) -> &[(f64, f64)] {
        match channel {
            Channel::Z => &self.z,
            Channel::X => &self.x,
            Channel::Y => &self.y,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.z.is_empty()
    }
}

impl ViewWindow {
    pub fn new(min_x: f64, max_x: f64) -> Self {
        Self { min_x, max_x }
    }

    /// Window covering every working sample.
    pub fn full(series: &EditableSeries) -> Self {
        Self::new(0.0, series.len().saturating_sub(1) as f64)
    }

    /// Inclusive index bounds of this window on a series of `total` samples.
    pub fn clamp(&self, total: usize) -> Option<(usize, usize)> {
        if total == 0 || self.min_x.is_nan() || self.max_x.is_nan() {
            return None;
        }
        let last = total - 1;
        let start = (self.min_x.floor().max(0.0) as usize).min(last);
        let end = (self.max_x.ceil().max(0.0) as usize).min(last).max(start);
        Some((start, end))
    }

    /// Zoom-scaled point budget: the closer the zoom, the more points, kept
    /// inside the configured bounds and never more than the window holds.
    pub fn point_budget(&self, total: usize, window_len: usize, config: &ViewConfig) -> usize {
        let full_range = total.saturating_sub(1).max(1) as f64;
        let visible = (self.max_x - self.min_x).max(1.0);
        let zoom = full_range / visible;
        let raw = ((config.max_display_points as f64 * zoom) as usize).max(1);
        let upper = config.max_points_on_screen.max(1);
        let lower = config.min_points_on_screen.min(upper);
        raw.clamp(lower, upper).min(window_len)
    }

    /// Downsample every channel over this window. `None` for an empty series.
    pub fn rebuild(&self, series: &EditableSeries, config: &ViewConfig) -> Option<SeriesView> {
        let total = series.len();
        let (start, end) = self.clamp(total)?;
        let window_len = end - start + 1;
        let budget = self.point_budget(total, window_len, config);
        let shifted = |channel: Channel| -> Vec<(f64, f64)> {
            downsample_indexed(&series.channel(channel)[start..=end], budget)
                .into_iter()
                .map(|(x, v)| (x + start as f64, v))
                .collect()
        };
        let view = SeriesView {
            start,
            end,
            budget,
            z: shifted(Channel::Z),
            x: shifted(Channel::X),
            y: shifted(Channel::Y),
        };
        log::debug!(
            "view [{start}, {end}] rebuilt with budget {budget}: {} points per channel",
            view.z.len()
        );
        Some(view)
    }
}
