use chrono::{Local, NaiveDateTime};
use serde::Serialize;

use crate::config::TrimConfig;
use crate::edit::{EditableSeries, TrimMarks};
use crate::error::{ImportError, Rejection};
use crate::ingest::header::{is_data_header_line, parse_header, SensorHeader};
use crate::ingest::record::decode_records;
use crate::ingest::source::{LogSource, RawLog};
use crate::ingest::timestamp::reconstruct;
use crate::types::SensorType;

pub const HEADER_LINE_SEPARATOR: &str = "\r\n";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub data_lines: usize,
    // fewer than four fields
    pub skipped: usize,
    // a channel that is not a number
    pub dropped: usize,
    pub kept: usize,
}

#[derive(Clone, Debug)]
pub struct ImportedSeries {
    pub header: SensorHeader,
    /// Header lines including the column-title line, re-joined.
    pub header_text: String,
    pub sensor_type: SensorType,
    pub series: EditableSeries,
    pub report: ImportReport,
}

/// Split on `\r\n`, `\r` or `\n`. No trailing empty line is produced.
pub fn split_lines(text: &str) -> Vec<&str> {
    let bytes = text.as_bytes();
    let mut lines = Vec::new();
    let mut start = 0;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\n' => {
                lines.push(&text[start..i]);
                start = i + 1;
            }
            b'\r' => {
                lines.push(&text[start..i]);
                if bytes.get(i + 1) == Some(&b'\n') {
                    i += 1;
                }
                start = i + 1;
            }
            _ => {}
        }
        i += 1;
    }
    if start < text.len() {
        lines.push(&text[start..]);
    }
    lines
}

/// Parse the full text of one device log.
pub fn import_text(text: &str) -> Result<ImportedSeries, Rejection> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let lines = split_lines(text);
    let split = lines
        .iter()
        .position(|l| is_data_header_line(l))
        .ok_or(Rejection::FormatRejected)?;
    let header = parse_header(&lines[..split])?;
    let header_text = lines[..=split].join(HEADER_LINE_SEPARATOR);

    let (raw, stats) = decode_records(lines[split + 1..].iter().copied());
    let samples = reconstruct(&header, raw)
        .into_timestamped()
        .ok_or_else(|| Rejection::HeaderInvalid {
            missing: header.missing_fields(),
        })?;
    let report = ImportReport {
        data_lines: stats.rows,
        skipped: stats.skipped,
        dropped: stats.dropped,
        kept: samples.len(),
    };
    Ok(ImportedSeries {
        sensor_type: SensorType::from_device_name(&header.device_name),
        header,
        header_text,
        series: EditableSeries::new(samples),
        report,
    })
}

pub fn import(text: &str) -> Result<EditableSeries, Rejection> {
    import_text(text).map(|imported| imported.series)
}

#[derive(Clone, Debug)]
pub struct ImportedFile {
    pub name: String,
    pub path: std::path::PathBuf,
    pub size_bytes: u64,
    pub imported_at: NaiveDateTime,
    pub header_text: String,
    pub header: SensorHeader,
    pub sensor_type: SensorType,
    pub series: EditableSeries,
    pub report: ImportReport,
    pub marks: TrimMarks,
}

impl ImportedFile {
    pub fn from_raw(raw: RawLog, trim: &TrimConfig) -> Result<Self, ImportError> {
        if raw.text.is_empty() {
            return Err(ImportError::Empty { path: raw.path });
        }
        let imported = import_text(&raw.text).map_err(|source| ImportError::Rejected {
            name: raw.name.clone(),
            source,
        })?;
        let marks = TrimMarks::for_series(&imported.series, trim);
        Ok(Self {
            name: raw.name,
            path: raw.path,
            size_bytes: raw.size_bytes,
            imported_at: Local::now().naive_local(),
            header_text: imported.header_text,
            header: imported.header,
            sensor_type: imported.sensor_type,
            series: imported.series,
            report: imported.report,
            marks,
        })
    }

    pub fn lines(&self) -> Vec<String> {
        self.series.lines(self.header.date_format.as_ref())
    }

    pub fn reset_marks(&mut self) {
        self.marks.top_cut_line = 0;
        self.marks.bottom_cut_line = self.series.no_tail_cut_position();
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct ImportProgress {
    pub current: usize,
    pub total: usize,
}

/// Pulls logs from a source one at a time and parses each independently.
pub struct ImportPipeline<S: LogSource> {
    source: S,
    trim: TrimConfig,
    total: usize,
    done: usize,
}

impl<S: LogSource> ImportPipeline<S> {
    pub fn new(source: S, trim: TrimConfig) -> Self {
        Self {
            total: source.remaining(),
            source,
            trim,
            done: 0,
        }
    }

    pub fn progress(&self) -> ImportProgress {
        ImportProgress {
            current: self.done,
            total: self.total,
        }
    }

    /// Import the next log. `None` once the source is drained.
    pub fn pump_once(&mut self) -> Option<Result<ImportedFile, ImportError>> {
        let raw = self.source.next_log()?;
        self.done += 1;
        let result = raw.and_then(|raw| ImportedFile::from_raw(raw, &self.trim));
        match &result {
            Ok(file) => log::info!(
                "imported {} ({} samples, {} dropped, {} skipped)",
                file.name,
                file.report.kept,
                file.report.dropped,
                file.report.skipped
            ),
            Err(err) => log::warn!("{err}"),
        }
        Some(result)
    }

    /// Import everything, calling `on_progress` before each file. One
    /// failing file never stops the rest.
    pub fn run(
        mut self,
        mut on_progress: impl FnMut(ImportProgress),
    ) -> Vec<Result<ImportedFile, ImportError>> {
        let mut results = Vec::with_capacity(self.total);
        while self.done < self.total {
            on_progress(ImportProgress {
                current: self.done + 1,
                total: self.total,
            });
            match self.pump_once() {
                Some(result) => results.push(result),
                None => break,
            }
        }
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::source::ManualSource;

    const VALID: &str = "\u{feff}BeanDevice: AX 3D\r\n\
        DATE_FORMAT: yyyy-MM-dd HH:mm:ss.fff\r\n\
        Date: 2024-01-01 00:00:00.000\r\n\
        Sampling rate: 100\r\n\
        TimeStamp;Z;X;Y\r\n\
        0;0,1;0,2;0,3\r\n\
        1;0.4;0.5\r\n\
        2;0.7;oops;0.9\r\n\
        3;1.0;1.1;1.2\r\n";

    #[test]
    fn splits_every_line_ending_style() {
        assert_eq!(split_lines("a\r\nb\rc\nd"), vec!["a", "b", "c", "d"]);
        assert_eq!(split_lines("a\n\nb\n"), vec!["a", "", "b"]);
        assert!(split_lines("").is_empty());
    }

    #[test]
    fn imports_and_counts_rows() {
        let imported = import_text(VALID).unwrap();
        assert_eq!(imported.sensor_type, SensorType::Ax3d);
        assert_eq!(
            imported.report,
            ImportReport { data_lines: 4, skipped: 1, dropped: 1, kept: 2 }
        );
        assert_eq!(imported.series.z(), &[0.1, 1.0]);
        assert!(imported.header_text.starts_with("BeanDevice: AX 3D\r\n"));
        assert!(imported.header_text.ends_with("Sampling rate: 100\r\nTimeStamp;Z;X;Y"));
        let lines = imported.series.lines(imported.header.date_format.as_ref());
        assert_eq!(lines[1], "2024-01-01 00:00:00.030;1;1.1;1.2");
    }

    #[test]
    fn rejects_unknown_format_and_bad_header() {
        assert_eq!(import("a;b;c;d\n1;2;3;4").unwrap_err(), Rejection::FormatRejected);
        assert!(matches!(
            import("Device: X\nTimeStamp;Z;X;Y\n0;1;2;3").unwrap_err(),
            Rejection::HeaderInvalid { .. }
        ));
    }

    #[test]
    fn batch_continues_past_rejected_files() {
        let source = ManualSource::new(vec![
            RawLog::from_text("bad.txt", "no data here"),
            RawLog::from_text("empty.txt", ""),
            RawLog::from_text("good.txt", VALID),
        ]);
        let mut seen = Vec::new();
        let results = ImportPipeline::new(source, TrimConfig::default()).run(|p| seen.push(p));
        assert_eq!(seen.len(), 3);
        assert_eq!(seen[0], ImportProgress { current: 1, total: 3 });
        assert_eq!(seen[2], ImportProgress { current: 3, total: 3 });
        assert_eq!(
            results[0].as_ref().unwrap_err().rejection(),
            Some(&Rejection::FormatRejected)
        );
        assert!(matches!(results[1], Err(ImportError::Empty { .. })));
        let good = results[2].as_ref().unwrap();
        assert_eq!(good.name, "good.txt");
        assert_eq!(good.marks.bottom_cut_line, 3);
        assert_eq!(good.marks.top_context, 20);
    }
}
