//! Turning raw device logs into typed headers and timestamped samples.
pub mod date_format;
pub mod header;
pub mod pipeline;
pub mod record;
pub mod source;
pub mod timestamp;

pub use date_format::{format_timestamp, parse_generic, DateFormat, FALLBACK_OUTPUT_FORMAT};
pub use header::{is_data_header_line, parse_header, scan_header, SensorHeader, DATA_HEADER_TOKEN};
pub use pipeline::{
    import, import_text, split_lines, ImportPipeline, ImportProgress, ImportReport, ImportedFile,
    ImportedSeries,
};
pub use record::{decode_record, decode_records, DecodeStats, FieldUnparsable, RawSample};
pub use source::{FileSource, LogSource, ManualSource, RawLog};
pub use timestamp::{reconstruct, Reconstruction, TimestampedSample};
