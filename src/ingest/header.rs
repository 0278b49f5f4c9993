use chrono::NaiveDateTime;
use serde::Serialize;

use crate::error::{HeaderField, Rejection};
use crate::ingest::date_format::{self, DateFormat};

/// Column-title token that separates the header block from the data rows.
pub const DATA_HEADER_TOKEN: &str = "TimeStamp";

/// Typed view of the free-text metadata block at the top of a device log.
#[derive(Clone, Debug, Serialize)]
pub struct SensorHeader {
    pub device_name: String,
    pub range_min: f64,
    pub range_max: f64,
    pub mac_id: String,
    pub network_id: String,
    pub pan_id: String,
    pub measure_mode: String,
    pub streaming_options: String,
    pub unit: String,
    pub date_format: Option<DateFormat>,
    /// Start of the recording; `None` when absent or unparsable.
    pub date: Option<NaiveDateTime>,
    /// Samples per second.
    pub sampling_rate: i32,
    pub sensor_ids: Vec<i32>,
    pub sensor_labels: Vec<String>,
}

impl Default for SensorHeader {
    fn default() -> Self {
        Self {
            device_name: String::new(),
            range_min: f64::NAN,
            range_max: f64::NAN,
            mac_id: String::new(),
            network_id: String::new(),
            pan_id: String::new(),
            measure_mode: String::new(),
            streaming_options: String::new(),
            unit: String::new(),
            date_format: None,
            date: None,
            sampling_rate: 0,
            sensor_ids: Vec::new(),
            sensor_labels: Vec::new(),
        }
    }
}

impl SensorHeader {
    pub fn is_valid(&self) -> bool {
        self.missing_fields().is_empty()
    }

    /// Invariant violations, in a stable order.
    pub fn missing_fields(&self) -> Vec<HeaderField> {
        let mut missing = Vec::new();
        if self.device_name.trim().is_empty() {
            missing.push(HeaderField::DeviceName);
        }
        if self.date.is_none() {
            missing.push(HeaderField::Date);
        }
        if self.sampling_rate <= 0 {
            missing.push(HeaderField::SamplingRate);
        }
        missing
    }

    pub fn has_range(&self) -> bool {
        !self.range_min.is_nan() && !self.range_max.is_nan()
    }
}

/// Whether `line` is the column-title line that opens the data block.
pub fn is_data_header_line(line: &str) -> bool {
    let trimmed = line.trim_start();
    trimmed
        .get(..DATA_HEADER_TOKEN.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(DATA_HEADER_TOKEN))
}

/// Parse header lines and enforce the validity invariant.
pub fn parse_header<I, S>(lines: I) -> Result<SensorHeader, Rejection>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let header = scan_header(lines);
    let missing = header.missing_fields();
    if missing.is_empty() {
        Ok(header)
    } else {
        Err(Rejection::HeaderInvalid { missing })
    }
}

/// Collect every recognised key without validating the result.
pub fn scan_header<I, S>(lines: I) -> SensorHeader
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut hdr = SensorHeader::default();
    for raw in lines {
        let line = raw.as_ref().trim();
        if line.is_empty() || is_separator(line) || is_data_header_line(line) {
            continue;
        }
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let key = key.trim();
        if key.is_empty() {
            continue;
        }
        apply_entry(&mut hdr, &key.to_ascii_lowercase(), value.trim());
    }
    hdr
}

fn is_separator(line: &str) -> bool {
    line.chars().all(|c| c == '-' || c == ' ' || c == '\t')
}

fn apply_entry(hdr: &mut SensorHeader, key: &str, value: &str) {
    match key {
        "device" | "beandevice" => hdr.device_name = value.to_string(),
        k if k.contains("range") => apply_range(hdr, value),
        "mac id" | "macid" => hdr.mac_id = value.to_string(),
        "network id" | "networkid" => hdr.network_id = value.to_string(),
        "pan id" | "panid" => hdr.pan_id = value.to_string(),
        k if k.contains("measure mode") => hdr.measure_mode = value.to_string(),
        k if k.contains("streaming options") => hdr.streaming_options = value.to_string(),
        k if k.contains("unit") => hdr.unit = value.to_string(),
        "date_format" => hdr.date_format = Some(DateFormat::new(value)),
        "date" => {
            hdr.date = hdr
                .date_format
                .as_ref()
                .and_then(|f| f.parse(value))
                .or_else(|| date_format::parse_generic(value));
        }
        "sampling rate" => hdr.sampling_rate = value.parse().unwrap_or(0),
        "sensor ids" | "sensor id" => {
            hdr.sensor_ids = split_list(value).filter_map(|t| t.parse().ok()).collect();
        }
        "sensor labels" | "sensorlabel" => {
            hdr.sensor_labels = split_list(value).map(str::to_string).collect();
        }
        _ => {}
    }
}

fn apply_range(hdr: &mut SensorHeader, value: &str) {
    let tokens = numeric_tokens(value);
    match tokens.as_slice() {
        [] => {}
        [single] => {
            hdr.range_min = -single.abs();
            hdr.range_max = single.abs();
        }
        [min, max, ..] => {
            hdr.range_min = *min;
            hdr.range_max = *max;
        }
    }
}

fn split_list(value: &str) -> impl Iterator<Item = &str> {
    value
        .split(['|', ',', ';'])
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Signed numeric tokens in free text (`"-2g / +2g"`, `"±1,5 g"`); a comma
/// or dot between digits is a decimal separator.
fn numeric_tokens(text: &str) -> Vec<f64> {
    let bytes = text.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        let mut j = i;
        if matches!(bytes[j], b'-' | b'+') {
            j += 1;
        }
        let int_start = j;
        while j < bytes.len() && bytes[j].is_ascii_digit() {
            j += 1;
        }
        let has_int = j > int_start;
        let mut has_frac = false;
        if j + 1 < bytes.len() && matches!(bytes[j], b',' | b'.') && bytes[j + 1].is_ascii_digit() {
            j += 1;
            while j < bytes.len() && bytes[j].is_ascii_digit() {
                j += 1;
            }
            has_frac = true;
        }
        if !has_int && !has_frac {
            i += 1;
            continue;
        }
        if let Ok(v) = text[i..j].replace(',', ".").parse::<f64>() {
            tokens.push(v);
        }
        i = j;
    }
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    const SAMPLE: &[&str] = &[
        "----------------------------------------",
        "BeanDevice : AX 3D Xtrem",
        "Mac Id : 00158D00000E0A52",
        "Network Id: 3",
        "Pan Id: 0x1234",
        "Measure mode : Streaming",
        "Streaming Options : continuous",
        "Range : +/-2g",
        "Unit : g",
        "DATE_FORMAT: yyyy-MM-dd HH:mm:ss",
        "Date: 2024-01-01 00:00:00",
        "Sampling rate : 100",
        "Sensor Ids : 1|2|3",
        "Sensor Labels : Z, X, Y",
        "Firmware : 4.2",
        "",
        "TimeStamp;Ch_Z;Ch_X;Ch_Y",
    ];

    #[test]
    fn parses_full_header() {
        let hdr = parse_header(SAMPLE).unwrap();
        assert_eq!(hdr.device_name, "AX 3D Xtrem");
        assert_eq!(hdr.mac_id, "00158D00000E0A52");
        assert_eq!(hdr.network_id, "3");
        assert_eq!(hdr.pan_id, "0x1234");
        assert_eq!(hdr.measure_mode, "Streaming");
        assert_eq!(hdr.streaming_options, "continuous");
        assert_eq!(hdr.unit, "g");
        assert_eq!(hdr.range_min, -2.0);
        assert_eq!(hdr.range_max, 2.0);
        assert_eq!(hdr.sampling_rate, 100);
        assert_eq!(hdr.sensor_ids, vec![1, 2, 3]);
        assert_eq!(hdr.sensor_labels, vec!["Z", "X", "Y"]);
        let expected = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
        assert_eq!(hdr.date, Some(expected));
        assert_eq!(hdr.date_format.as_ref().map(|f| f.as_str()), Some("yyyy-MM-dd HH:mm:ss"));
    }

    #[test]
    fn two_range_tokens_with_decimal_commas() {
        let hdr = scan_header(["Measurement Range: -1,5 / 2,5"]);
        assert_eq!(hdr.range_min, -1.5);
        assert_eq!(hdr.range_max, 2.5);
    }

    #[test]
    fn range_without_numbers_stays_nan() {
        let hdr = scan_header(["Range: auto"]);
        assert!(hdr.range_min.is_nan());
        assert!(!hdr.has_range());
    }

    #[test]
    fn date_uses_declared_format_then_falls_back() {
        let hdr = scan_header(["DATE_FORMAT: dd/MM/yyyy HH:mm:ss", "Date: 02/03/2024 08:00:00"]);
        let expected = NaiveDate::from_ymd_opt(2024, 3, 2).unwrap().and_hms_opt(8, 0, 0).unwrap();
        assert_eq!(hdr.date, Some(expected));

        let hdr = scan_header(["DATE_FORMAT: dd/MM/yyyy", "Date: 2024-03-02 08:00:00"]);
        assert_eq!(hdr.date, Some(expected));

        let hdr = scan_header(["Date: someday"]);
        assert_eq!(hdr.date, None);
    }

    #[test]
    fn unparsable_sampling_rate_defaults_to_zero() {
        let hdr = scan_header(["Sampling rate: fast"]);
        assert_eq!(hdr.sampling_rate, 0);
    }

    #[test]
    fn rejects_header_missing_required_fields() {
        let err = parse_header(["Device: AX 3D", "Sampling rate: 0"]).unwrap_err();
        assert_eq!(
            err,
            Rejection::HeaderInvalid {
                missing: vec![HeaderField::Date, HeaderField::SamplingRate]
            }
        );
    }

    #[test]
    fn detects_data_header_case_insensitively() {
        assert!(is_data_header_line("  timestamp;z;x;y"));
        assert!(is_data_header_line("TIMESTAMP"));
        assert!(!is_data_header_line("Time;z"));
        assert!(!is_data_header_line(""));
    }

    #[test]
    fn unknown_keys_and_colonless_lines_are_ignored() {
        let hdr = scan_header(["Firmware: 1.0", "just some text", ": orphan value"]);
        assert!(hdr.device_name.is_empty());
        assert!(!hdr.is_valid());
    }
}
