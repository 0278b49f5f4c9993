use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::config::ExportConfig;
use crate::error::ExportError;
use crate::ingest::pipeline::HEADER_LINE_SEPARATOR;
use crate::ingest::{split_lines, ImportedFile};

/// Characters refused in file names on at least one supported platform.
const INVALID_FILE_NAME_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Replace characters that cannot appear in a file name with `_`.
pub fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_control() || INVALID_FILE_NAME_CHARS.contains(&c) {
                '_'
            } else {
                c
            }
        })
        .collect()
}

/// Output name for a full export.
pub fn export_file_name(name: &str, config: &ExportConfig) -> String {
    let clean = sanitize_file_name(name);
    if clean.trim().is_empty() {
        config.fallback_name.clone()
    } else {
        clean
    }
}

/// Output name for a selection export: `<stem><suffix><ext>`, `.txt` when
/// the source has no extension.
pub fn selection_file_name(name: &str, config: &ExportConfig) -> String {
    let clean = sanitize_file_name(name);
    let fallback = Path::new(&config.fallback_name);
    let source = if clean.is_empty() { fallback } else { Path::new(&clean) };
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = source
        .extension()
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_else(|| "txt".to_string());
    format!("{stem}{}.{ext}", config.selection_suffix)
}

/// Clamp and order an inclusive selection against `len` rows.
pub fn clamp_selection(start: isize, end: isize, len: usize) -> Option<(usize, usize)> {
    if len == 0 {
        return None;
    }
    let last = (len - 1) as isize;
    let s = start.clamp(0, last) as usize;
    let e = end.clamp(0, last) as usize;
    Some(if e < s { (e, s) } else { (s, e) })
}

fn write_rows<W: Write>(out: &mut W, header_text: &str, rows: &[String]) -> std::io::Result<()> {
    for line in split_lines(header_text) {
        out.write_all(line.as_bytes())?;
        out.write_all(HEADER_LINE_SEPARATOR.as_bytes())?;
    }
    for row in rows {
        out.write_all(row.as_bytes())?;
        out.write_all(HEADER_LINE_SEPARATOR.as_bytes())?;
    }
    Ok(())
}

fn render(header_text: &str, rows: &[String]) -> String {
    let mut out = Vec::new();
    // Writing into a Vec cannot fail.
    let _ = write_rows(&mut out, header_text, rows);
    String::from_utf8_lossy(&out).into_owned()
}

fn selected_rows(file: &ImportedFile, start: isize, end: isize) -> Vec<String> {
    let rows = file.lines();
    match clamp_selection(start, end, rows.len()) {
        Some((s, e)) => rows[s..=e].to_vec(),
        None => Vec::new(),
    }
}

/// Header followed by every working row.
pub fn render_export(file: &ImportedFile) -> String {
    render(&file.header_text, &file.lines())
}

/// Header followed by the working rows `start..=end`.
pub fn render_selection(file: &ImportedFile, start: isize, end: isize) -> String {
    render(&file.header_text, &selected_rows(file, start, end))
}

fn write_file(path: &Path, header_text: &str, rows: &[String]) -> Result<(), ExportError> {
    let io_err = |source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    };
    let mut writer = BufWriter::new(File::create(path).map_err(io_err)?);
    write_rows(&mut writer, header_text, rows).map_err(io_err)?;
    writer.flush().map_err(io_err)
}

/// Write the cut-down file into `dir` under its own (sanitized) name.
pub fn export_series(file: &ImportedFile, dir: &Path, config: &ExportConfig) -> Result<PathBuf, ExportError> {
    let path = dir.join(export_file_name(&file.name, config));
    let rows = file.lines();
    write_file(&path, &file.header_text, &rows)?;
    log::info!("exported {} rows to {}", rows.len(), path.display());
    Ok(path)
}

/// Write only the working rows `start..=end` into `dir`.
pub fn export_selection(
    file: &ImportedFile,
    start: isize,
    end: isize,
    dir: &Path,
    config: &ExportConfig,
) -> Result<PathBuf, ExportError> {
    let path = dir.join(selection_file_name(&file.name, config));
    let rows = selected_rows(file, start, end);
    write_file(&path, &file.header_text, &rows)?;
    log::info!("exported selection of {} rows to {}", rows.len(), path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TrimConfig;
    use crate::ingest::RawLog;

    const LOG: &str = "Device: AX 3D\n\
        Date: 2024-01-01 00:00:00\n\
        DATE_FORMAT: HH:mm:ss.fff\n\
        Sampling rate: 10\n\
        TimeStamp;Z;X;Y\n\
        0;1;2;3\n\
        1;4;5;6\n\
        2;7;8;9\n";

    fn file(name: &str) -> ImportedFile {
        ImportedFile::from_raw(RawLog::from_text(name, LOG), &TrimConfig::default()).unwrap()
    }

    #[test]
    fn names_are_sanitized() {
        let cfg = ExportConfig::default();
        assert_eq!(sanitize_file_name("a:b/c?.txt"), "a_b_c_.txt");
        assert_eq!(export_file_name("", &cfg), "arquivo.txt");
        assert_eq!(selection_file_name("run 1.csv", &cfg), "run 1_selection.csv");
        assert_eq!(selection_file_name("run", &cfg), "run_selection.txt");
        assert_eq!(selection_file_name("", &cfg), "arquivo_selection.txt");
    }

    #[test]
    fn full_export_reflects_cuts() {
        let mut f = file("log.txt");
        f.series.cut_range(1, 1);
        let text = render_export(&f);
        let lines: Vec<&str> = text.split("\r\n").collect();
        assert_eq!(lines[0], "Device: AX 3D");
        assert_eq!(lines[4], "TimeStamp;Z;X;Y");
        assert_eq!(lines[5], "00:00:00.000;1;2;3");
        assert_eq!(lines[6], "00:00:00.200;7;8;9");
        assert_eq!(lines.len(), 8);
    }

    #[test]
    fn selection_is_clamped_and_swapped() {
        let f = file("log.txt");
        let text = render_selection(&f, 9, 1);
        assert!(text.ends_with("TimeStamp;Z;X;Y\r\n00:00:00.100;4;5;6\r\n00:00:00.200;7;8;9\r\n"));
        assert_eq!(clamp_selection(-3, -1, 5), Some((0, 0)));
        assert_eq!(clamp_selection(0, 3, 0), None);
    }

    #[test]
    fn writes_files_into_directory() {
        let dir = tempfile::tempdir().unwrap();
        let f = file("a|b.txt");
        let cfg = ExportConfig::default();
        let full = export_series(&f, dir.path(), &cfg).unwrap();
        assert_eq!(full.file_name().unwrap(), "a_b.txt");
        assert_eq!(std::fs::read_to_string(&full).unwrap(), render_export(&f));

        let sel = export_selection(&f, 0, 0, dir.path(), &cfg).unwrap();
        assert_eq!(sel.file_name().unwrap(), "a_b_selection.txt");
        assert!(std::fs::read_to_string(&sel).unwrap().ends_with("00:00:00.000;1;2;3\r\n"));
    }

    #[test]
    fn missing_directory_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let gone = dir.path().join("nope");
        let err = export_series(&file("x.txt"), &gone, &ExportConfig::default()).unwrap_err();
        assert!(err.to_string().contains("x.txt"));
        // writing is the only way an export can fail
        let ExportError::Io { path, .. } = err;
        assert_eq!(path, gone.join("x.txt"));
    }
}
