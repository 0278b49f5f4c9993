//! Bounded-size display data for plotting a series.
pub mod downsample;
pub mod plot;
pub mod window;

pub use downsample::{downsample, downsample_indexed, envelope_indices};
pub use plot::{render_view_png, PlotStyle};
pub use window::{SeriesView, ViewWindow};
