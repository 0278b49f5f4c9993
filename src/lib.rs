//! Import, trim and preview of triaxial accelerometer logs.
pub mod config;
pub mod display;
pub mod edit;
pub mod engine;
pub mod error;
pub mod export;
pub mod ingest;
pub mod session;
pub mod types;

pub use config::AppConfig;
pub use edit::{EditPolicy, EditableSeries, IndexRange, Selection};
pub use error::{ExportError, ImportError, PlotError, Rejection};
pub use ingest::{import, import_text, parse_header, SensorHeader, TimestampedSample};
pub use session::Session;
