use thiserror::Error;

use crate::types::Channel;

pub const FIELD_DELIMITER: char = ';';

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RawSample {
    /// Sample index from the first column, or the row ordinal when that
    /// column is not an integer.
    pub index: i32,
    pub z: f64,
    pub x: f64,
    pub y: f64,
}

/// A channel column that stayed non-numeric after decimal-comma rewriting.
#[derive(Clone, Debug, Error, PartialEq)]
#[error("row {ordinal}: {channel} value {raw:?} is not a number")]
pub struct FieldUnparsable {
    pub ordinal: usize,
    pub channel: Channel,
    pub raw: String,
}

/// Decode one data row. `None` means the row is skipped silently (fewer than
/// four fields); `Some(Err(_))` means the row is dropped as a whole.
pub fn decode_record(line: &str, ordinal: usize) -> Option<Result<RawSample, FieldUnparsable>> {
    let parts: Vec<&str> = line.split(FIELD_DELIMITER).collect();
    if parts.len() < 4 {
        return None;
    }
    let index = parts[0]
        .trim()
        .parse::<i32>()
        .unwrap_or(ordinal as i32);
    Some(decode_channels(&parts[1..4], ordinal).map(|[z, x, y]| RawSample { index, z, x, y }))
}

fn decode_channels(fields: &[&str], ordinal: usize) -> Result<[f64; 3], FieldUnparsable> {
    let mut values = [0.0; 3];
    for ((slot, raw), channel) in values.iter_mut().zip(fields).zip(Channel::ALL) {
        *slot = parse_decimal(raw).ok_or_else(|| FieldUnparsable {
            ordinal,
            channel,
            raw: raw.trim().to_string(),
        })?;
    }
    Ok(values)
}

/// Parse a locale-tolerant decimal (`0,25` or `0.25`).
pub fn parse_decimal(raw: &str) -> Option<f64> {
    normalize_decimal(raw).parse().ok()
}

pub fn normalize_decimal(raw: &str) -> String {
    raw.trim().replace(',', ".")
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DecodeStats {
    pub rows: usize,
    pub skipped: usize,
    pub dropped: usize,
}

/// Decode every non-empty row of a data block. Rows with an unparsable
/// channel are dropped and counted, never partially kept.
pub fn decode_records<'a, I>(lines: I) -> (Vec<RawSample>, DecodeStats)
where
    I: IntoIterator<Item = &'a str>,
{
    let mut stats = DecodeStats::default();
    let mut samples = Vec::new();
    let rows = lines.into_iter().filter(|l| !l.is_empty());
    for (ordinal, line) in rows.enumerate() {
        stats.rows += 1;
        match decode_record(line, ordinal) {
            None => stats.skipped += 1,
            Some(Ok(sample)) => samples.push(sample),
            Some(Err(err)) => {
                log::debug!("dropping sample: {err}");
                stats.dropped += 1;
            }
        }
    }
    (samples, stats)
}
