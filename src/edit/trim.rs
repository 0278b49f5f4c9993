use serde::Serialize;

use crate::config::TrimConfig;
use crate::edit::series::{EditableSeries, IndexRange};

/// Head/tail trim marks for one file, as 1-based line numbers of the
/// working rows. Lines `1..=top_cut_line` and `bottom_cut_line..=len` are
/// the ones that go.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct TrimMarks {
    pub top_cut_line: usize,
    pub bottom_cut_line: usize,
    pub top_context: usize,
    pub bottom_context: usize,
}

impl TrimMarks {
    pub fn for_series(series: &EditableSeries, config: &TrimConfig) -> Self {
        Self {
            top_cut_line: 0,
            bottom_cut_line: series.no_tail_cut_position(),
            top_context: config.top_context,
            bottom_context: config.bottom_context,
        }
    }

    pub fn tail_count(&self, total: usize) -> usize {
        (total + 1).saturating_sub(self.bottom_cut_line)
    }

    /// Mark the last `offset` lines for removal.
    pub fn set_bottom_offset(&mut self, offset: usize, total: usize) {
        self.bottom_cut_line = (total + 1).saturating_sub(offset).max(1);
    }

    pub fn top_window_reaches_start(&self) -> bool {
        self.top_context >= self.top_cut_line
    }

    pub fn bottom_window_reaches_end(&self, total: usize) -> bool {
        self.bottom_context >= total.saturating_sub(self.bottom_cut_line)
    }

    /// Copy these marks onto a file with `total` rows: the head mark is
    /// taken as is, the tail mark keeps the same number of trailing rows.
    pub fn propagate(&self, own_total: usize, total: usize) -> TrimMarks {
        let tail = self.tail_count(own_total);
        TrimMarks {
            top_cut_line: self.top_cut_line,
            bottom_cut_line: (total + 1).saturating_sub(tail).max(1),
            ..*self
        }
    }

    pub fn top_context_block<'a, S>(&self, lines: &'a [S]) -> &'a [S] {
        top_context_block(lines, self.top_cut_line, self.top_context)
    }

    pub fn top_keep_window<'a, S>(&self, lines: &'a [S]) -> &'a [S] {
        top_keep_window(lines, self.top_cut_line, self.top_context)
    }

    pub fn bottom_context_block<'a, S>(&self, lines: &'a [S]) -> &'a [S] {
        bottom_context_block(lines, self.bottom_cut_line, self.bottom_context)
    }

    pub fn bottom_keep_window<'a, S>(&self, lines: &'a [S]) -> &'a [S] {
        bottom_keep_window(lines, self.bottom_cut_line, self.bottom_context)
    }

    /// Lines on both sides of each cut line, for showing what a trim would do.
    pub fn preview(&self, lines: &[String]) -> TrimPreview {
        TrimPreview {
            top_removed: self.top_context_block(lines).to_vec(),
            top_kept: self.top_keep_window(lines).to_vec(),
            bottom_kept: self.bottom_keep_window(lines).to_vec(),
            bottom_removed: self.bottom_context_block(lines).to_vec(),
            top_reaches_start: self.top_window_reaches_start(),
            bottom_reaches_end: self.bottom_window_reaches_end(lines.len()),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct TrimPreview {
    pub top_removed: Vec<String>,
    pub top_kept: Vec<String>,
    pub bottom_kept: Vec<String>,
    pub bottom_removed: Vec<String>,
    // false means lines are hidden between the file edge and the shown block
    pub top_reaches_start: bool,
    pub bottom_reaches_end: bool,
}

/// Apply the marks to `series`, tail first, and reset them to "nothing cut".
pub fn apply_trim(series: &mut EditableSeries, marks: &mut TrimMarks) -> Vec<IndexRange> {
    let mut removed = Vec::with_capacity(2);
    let len = series.len();
    if marks.bottom_cut_line >= 1 && marks.bottom_cut_line <= len {
        let start = (marks.bottom_cut_line - 1) as isize;
        removed.extend(series.cut_range(start, len as isize - 1));
    }
    if marks.top_cut_line > 0 {
        removed.extend(series.cut_range(0, marks.top_cut_line as isize - 1));
    }
    marks.top_cut_line = 0;
    marks.bottom_cut_line = series.no_tail_cut_position();
    removed
}

/// Slice `[start_line, end_line]` (1-based, inclusive) clamped to `lines`.
fn clamp_lines<S>(lines: &[S], start_line: isize, end_line: isize) -> &[S] {
    let total = lines.len() as isize;
    let start = start_line.max(1);
    let end = end_line.max(start).min(total);
    if total == 0 || end < start {
        return &[];
    }
    &lines[(start - 1) as usize..end as usize]
}

// removed side of the head cut
pub fn top_context_block<S>(lines: &[S], cut_line: usize, context: usize) -> &[S] {
    if lines.is_empty() || cut_line == 0 {
        return &[];
    }
    let end = cut_line as isize;
    clamp_lines(lines, end - context as isize + 1, end)
}

pub fn top_keep_window<S>(lines: &[S], cut_line: usize, context: usize) -> &[S] {
    if lines.is_empty() || cut_line >= lines.len() {
        return &[];
    }
    let start = cut_line as isize + 1;
    clamp_lines(lines, start, start + context as isize - 1)
}

// removed side of the tail cut
pub fn bottom_context_block<S>(lines: &[S], cut_line: usize, context: usize) -> &[S] {
    if lines.is_empty() || cut_line > lines.len() {
        return &[];
    }
    let start = cut_line.max(1) as isize;
    clamp_lines(lines, start, start + context as isize - 1)
}

pub fn bottom_keep_window<S>(lines: &[S], cut_line: usize, context: usize) -> &[S] {
    if lines.is_empty() || cut_line <= 1 {
        return &[];
    }
    let end = cut_line as isize - 1;
    clamp_lines(lines, end - context as isize + 1, end)
}
