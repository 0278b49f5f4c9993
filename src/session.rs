use std::path::{Path, PathBuf};

use crate::config::TrimConfig;
use crate::edit::{self, apply_trim, EditPolicy, IndexRange, Selection};
use crate::error::ImportError;
use crate::ingest::{FileSource, ImportPipeline, ImportProgress, ImportedFile};

/// The files currently open, in import order, plus the one being edited.
#[derive(Debug, Default)]
pub struct Session {
    files: Vec<ImportedFile>,
    selected: Option<usize>,
    trim: TrimConfig,
}

fn same_path(a: &Path, b: &Path) -> bool {
    a.to_string_lossy().to_lowercase() == b.to_string_lossy().to_lowercase()
}

impl Session {
    pub fn new(trim: TrimConfig) -> Self {
        Self {
            files: Vec::new(),
            selected: None,
            trim,
        }
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn files(&self) -> &[ImportedFile] {
        &self.files
    }

    pub fn iter(&self) -> impl Iterator<Item = &ImportedFile> {
        self.files.iter()
    }

    pub fn get(&self, index: usize) -> Option<&ImportedFile> {
        self.files.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut ImportedFile> {
        self.files.get_mut(index)
    }

    pub fn contains_path(&self, path: &Path) -> bool {
        self.files.iter().any(|f| same_path(&f.path, path))
    }

    /// Add a file unless one with the same path (ignoring case) is open.
    /// The first file added becomes the selection. Returns its position.
    pub fn add(&mut self, file: ImportedFile) -> Option<usize> {
        if self.contains_path(&file.path) {
            log::debug!("{} already open, skipped", file.path.display());
            return None;
        }
        self.files.push(file);
        let index = self.files.len() - 1;
        if self.selected.is_none() {
            self.selected = Some(index);
        }
        Some(index)
    }

    pub fn add_all(
        &mut self,
        results: impl IntoIterator<Item = Result<ImportedFile, ImportError>>,
    ) -> (Vec<usize>, Vec<ImportError>) {
        let mut added = Vec::new();
        let mut failed = Vec::new();
        for result in results {
            match result {
                Ok(file) => added.extend(self.add(file)),
                Err(err) => failed.push(err),
            }
        }
        (added, failed)
    }

    pub fn import_paths(
        &mut self,
        paths: impl IntoIterator<Item = PathBuf>,
        on_progress: impl FnMut(ImportProgress),
    ) -> (Vec<usize>, Vec<ImportError>) {
        let fresh: Vec<PathBuf> = paths.into_iter().filter(|p| !self.contains_path(p)).collect();
        let results = ImportPipeline::new(FileSource::new(fresh), self.trim).run(on_progress);
        self.add_all(results)
    }

    /// Close a file. The selection follows the file it pointed at, or moves
    /// to the nearest remaining one.
    pub fn remove(&mut self, index: usize) -> Option<ImportedFile> {
        if index >= self.files.len() {
            return None;
        }
        let removed = self.files.remove(index);
        self.selected = match self.selected {
            _ if self.files.is_empty() => None,
            Some(s) if s > index => Some(s - 1),
            Some(s) if s == index => Some(index.min(self.files.len() - 1)),
            other => other,
        };
        log::info!("closed {}", removed.name);
        Some(removed)
    }

    pub fn select(&mut self, index: usize) -> bool {
        if index < self.files.len() {
            self.selected = Some(index);
            true
        } else {
            false
        }
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.selected
    }

    pub fn selected(&self) -> Option<&ImportedFile> {
        self.selected.and_then(|i| self.files.get(i))
    }

    pub fn selected_mut(&mut self) -> Option<&mut ImportedFile> {
        self.selected.and_then(|i| self.files.get_mut(i))
    }

    /// Apply a selection to the selected file. Its trim marks restart for
    /// the new length.
    pub fn edit_selected(&mut self, selection: &Selection, policy: EditPolicy) -> Vec<IndexRange> {
        let Some(file) = self.selected_mut() else {
            return Vec::new();
        };
        let removed = edit::apply(selection, policy, &mut file.series);
        file.reset_marks();
        removed
    }

    pub fn edit_all(&mut self, selection: &Selection, policy: EditPolicy) -> Vec<Vec<IndexRange>> {
        self.files
            .iter_mut()
            .map(|file| {
                let removed = edit::apply(selection, policy, &mut file.series);
                file.reset_marks();
                removed
            })
            .collect()
    }

    pub fn reset_selected(&mut self) -> bool {
        let Some(file) = self.selected_mut() else {
            return false;
        };
        file.series.reset_cuts();
        file.reset_marks();
        true
    }

    pub fn trim_selected(&mut self) -> Vec<IndexRange> {
        match self.selected_mut() {
            Some(file) => apply_trim(&mut file.series, &mut file.marks),
            None => Vec::new(),
        }
    }

    pub fn trim_all(&mut self) -> Vec<Vec<IndexRange>> {
        self.files
            .iter_mut()
            .map(|file| apply_trim(&mut file.series, &mut file.marks))
            .collect()
    }

    // tail marks keep the same trailing row count on every file
    pub fn apply_to_all(&mut self) -> usize {
        let Some(sel) = self.selected else {
            return 0;
        };
        if self.files.len() <= 1 {
            return 0;
        }
        let source = &self.files[sel];
        let marks = source.marks;
        let own_total = source.series.len();
        let mut updated = 0;
        for (i, file) in self.files.iter_mut().enumerate() {
            if i == sel {
                continue;
            }
            file.marks = marks.propagate(own_total, file.series.len());
            updated += 1;
        }
        log::debug!("trim marks copied from file {sel} to {updated} files");
        updated
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::RawLog;

    fn log_with(n: usize) -> String {
        let mut text = String::from("Device: AX 3D\nDate: 2024-01-01 00:00:00\nSampling rate: 100\nTimeStamp;Z;X;Y\n");
        for i in 0..n {
            text.push_str(&format!("{i};{i};0;0\n"));
        }
        text
    }

    fn file(path: &str, n: usize) -> ImportedFile {
        ImportedFile::from_raw(RawLog::from_text(path, log_with(n)), &TrimConfig::default()).unwrap()
    }

    #[test]
    fn duplicate_paths_are_ignored_case_insensitively() {
        let mut s = Session::default();
        assert_eq!(s.add(file("Run.txt", 3)), Some(0));
        assert_eq!(s.add(file("run.TXT", 3)), None);
        assert_eq!(s.len(), 1);
        assert_eq!(s.selected_index(), Some(0));
    }

    #[test]
    fn removing_keeps_a_valid_selection() {
        let mut s = Session::default();
        for name in ["a", "b", "c"] {
            s.add(file(name, 2));
        }
        s.select(2);
        s.remove(0);
        assert_eq!(s.selected().map(|f| f.name.as_str()), Some("c"));
        s.remove(1);
        assert_eq!(s.selected().map(|f| f.name.as_str()), Some("b"));
        s.remove(0);
        assert!(s.selected().is_none());
        assert!(s.remove(0).is_none());
    }

    #[test]
    fn marks_propagate_by_trailing_count() {
        let mut s = Session::default();
        s.add(file("a", 100));
        s.add(file("b", 40));
        {
            let a = s.selected_mut().unwrap();
            a.marks.top_cut_line = 5;
            a.marks.set_bottom_offset(10, 100);
        }
        assert_eq!(s.apply_to_all(), 1);
        let b = s.get(1).unwrap();
        assert_eq!(b.marks.top_cut_line, 5);
        assert_eq!(b.marks.bottom_cut_line, 31);

        let removed = s.trim_all();
        assert_eq!(s.get(0).unwrap().series.len(), 85);
        assert_eq!(s.get(1).unwrap().series.len(), 25);
        assert_eq!(removed[1], vec![IndexRange::new(30, 39), IndexRange::new(0, 4)]);
    }

    #[test]
    fn edits_resolve_against_each_file_length() {
        let mut s = Session::default();
        s.add(file("a", 10));
        s.add(file("b", 4));
        let removed = s.edit_all(&Selection::Index { min: 2.0, max: 6.0 }, EditPolicy::Keep);
        assert_eq!(removed[0], vec![IndexRange::new(7, 9), IndexRange::new(0, 1)]);
        assert_eq!(removed[1], vec![IndexRange::new(0, 1)]);
        assert_eq!(s.get(0).unwrap().series.z(), &[2.0, 3.0, 4.0, 5.0, 6.0]);
        assert_eq!(s.get(1).unwrap().series.z(), &[2.0, 3.0]);
        assert_eq!(s.get(1).unwrap().marks.bottom_cut_line, 3);
        assert!(s.reset_selected());
        assert_eq!(s.selected().unwrap().series.len(), 10);
    }

    #[test]
    fn import_reports_failures_without_stopping() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.txt");
        std::fs::write(&good, log_with(5)).unwrap();
        let bad = dir.path().join("bad.txt");
        std::fs::write(&bad, "nothing useful").unwrap();
        let mut s = Session::default();
        let mut progress = Vec::new();
        let (added, failed) = s.import_paths(vec![bad, good.clone(), good], |p| progress.push(p.current));
        assert_eq!(added, vec![0]);
        assert_eq!(failed.len(), 1);
        assert_eq!(progress, vec![1, 2, 3]);
        assert_eq!(s.len(), 1);
    }
}
