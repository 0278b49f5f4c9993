use chrono::{Duration, NaiveDateTime};

use crate::ingest::date_format::{format_timestamp, DateFormat};
use crate::ingest::header::SensorHeader;
use crate::ingest::record::{RawSample, FIELD_DELIMITER};

/// A sample placed on the wall clock.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TimestampedSample {
    pub timestamp: NaiveDateTime,
    pub z: f64,
    pub x: f64,
    pub y: f64,
}

impl TimestampedSample {
    /// Render as an export row: `timestamp;z;x;y`.
    pub fn to_line(&self, format: Option<&DateFormat>) -> String {
        data_line(&format_timestamp(&self.timestamp, format), self.z, self.x, self.y)
    }
}

pub(crate) fn data_line(first: &str, z: f64, x: f64, y: f64) -> String {
    let d = FIELD_DELIMITER;
    format!("{first}{d}{z}{d}{x}{d}{y}")
}

/// Result of timestamp reconstruction.
#[derive(Clone, Debug, PartialEq)]
pub enum Reconstruction {
    Timestamped(Vec<TimestampedSample>),
    /// Header had no start date or no positive rate; rows pass through with
    /// their raw index as the first column.
    Untimed(Vec<RawSample>),
}

impl Reconstruction {
    pub fn len(&self) -> usize {
        match self {
            Reconstruction::Timestamped(v) => v.len(),
            Reconstruction::Untimed(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn lines(&self, format: Option<&DateFormat>) -> Vec<String> {
        match self {
            Reconstruction::Timestamped(v) => v.iter().map(|s| s.to_line(format)).collect(),
            Reconstruction::Untimed(v) => v
                .iter()
                .map(|s| data_line(&s.index.to_string(), s.z, s.x, s.y))
                .collect(),
        }
    }

    pub fn into_timestamped(self) -> Option<Vec<TimestampedSample>> {
        match self {
            Reconstruction::Timestamped(v) => Some(v),
            Reconstruction::Untimed(_) => None,
        }
    }
}

/// Offset of sample `index` from the start of the recording.
pub fn sample_offset(index: i32, sampling_rate: i32) -> Duration {
    let interval = 1.0 / sampling_rate as f64;
    Duration::nanoseconds((index as f64 * interval * 1e9).round() as i64)
}

/// Attach `date + index / rate` to every raw sample. Gaps or disorder in the
/// index column carry straight into the timestamps.
pub fn reconstruct(header: &SensorHeader, samples: Vec<RawSample>) -> Reconstruction {
    let start = match header.date {
        Some(date) if header.sampling_rate > 0 => date,
        _ => return Reconstruction::Untimed(samples),
    };
    let rate = header.sampling_rate;
    let stamped = samples
        .into_iter()
        .filter_map(|s| {
            let ts = start.checked_add_signed(sample_offset(s.index, rate));
            if ts.is_none() {
                log::warn!("sample index {} falls outside the representable time range", s.index);
            }
            ts.map(|timestamp| TimestampedSample {
                timestamp,
                z: s.z,
                x: s.x,
                y: s.y,
            })
        })
        .collect();
    Reconstruction::Timestamped(stamped)
}
