//! Non-destructive cutting of an imported series.
pub mod range_map;
pub mod series;
pub mod trim;

pub use range_map::{apply, plan, EditPolicy, Selection};
pub use series::{EditableSeries, IndexRange};
pub use trim::{apply_trim, TrimMarks, TrimPreview};
