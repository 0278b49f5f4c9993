use chrono::NaiveDateTime;
use serde::Serialize;

use crate::ingest::{DateFormat, TimestampedSample};
use crate::types::Channel;

/// Inclusive index pair. `IndexRange::EMPTY` (`0, -1`) marks "no match" and
/// must be checked before the pair is used as a cut.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct IndexRange {
    pub start: isize,
    pub end: isize,
}

impl IndexRange {
    pub const EMPTY: IndexRange = IndexRange { start: 0, end: -1 };

    pub fn new(start: usize, end: usize) -> Self {
        Self {
            start: start as isize,
            end: end as isize,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.end < self.start
    }

    pub fn len(&self) -> usize {
        if self.is_empty() {
            0
        } else {
            (self.end - self.start + 1) as usize
        }
    }

    pub fn as_tuple(&self) -> (isize, isize) {
        (self.start, self.end)
    }
}

/// Working copy of one imported file: the untouched samples, the current
/// cut-down sequence and the per-channel arrays derived from it.
#[derive(Clone, Debug)]
pub struct EditableSeries {
    original: Vec<TimestampedSample>,
    working: Vec<TimestampedSample>,
    /// Position in `original` of every working sample; strictly increasing.
    origin: Vec<usize>,
    removed: Vec<IndexRange>,
    z: Vec<f64>,
    x: Vec<f64>,
    y: Vec<f64>,
    timestamps: Vec<NaiveDateTime>,
    no_tail_cut: usize,
}

impl EditableSeries {
    pub fn new(samples: Vec<TimestampedSample>) -> Self {
        let mut series = Self {
            working: samples.clone(),
            origin: (0..samples.len()).collect(),
            original: samples,
            removed: Vec::new(),
            z: Vec::new(),
            x: Vec::new(),
            y: Vec::new(),
            timestamps: Vec::new(),
            no_tail_cut: 0,
        };
        series.rebuild();
        series
    }

    pub fn len(&self) -> usize {
        self.working.len()
    }

    pub fn is_empty(&self) -> bool {
        self.working.is_empty()
    }

    pub fn original(&self) -> &[TimestampedSample] {
        &self.original
    }

    pub fn working(&self) -> &[TimestampedSample] {
        &self.working
    }

    pub fn z(&self) -> &[f64] {
        &self.z
    }

    pub fn x(&self) -> &[f64] {
        &self.x
    }

    pub fn y(&self) -> &[f64] {
        &self.y
    }

    pub fn channel(&self, channel: Channel) -> &[f64] {
        match channel {
            Channel::Z => &self.z,
            Channel::X => &self.x,
            Channel::Y => &self.y,
        }
    }

    pub fn timestamps(&self) -> &[NaiveDateTime] {
        &self.timestamps
    }

    /// Cuts in the order they were applied, each in the working-index space
    /// of the moment it was applied.
    pub fn removed_ranges(&self) -> &[IndexRange] {
        &self.removed
    }

    /// Everything removed so far, as merged ranges of original positions.
    pub fn removed_original_ranges(&self) -> Vec<IndexRange> {
        let mut out = Vec::new();
        let mut expected = 0usize;
        for &o in &self.origin {
            if o > expected {
                out.push(IndexRange::new(expected, o - 1));
            }
            expected = o + 1;
        }
        if expected < self.original.len() {
            out.push(IndexRange::new(expected, self.original.len() - 1));
        }
        out
    }

    pub fn original_index(&self, index: usize) -> Option<usize> {
        self.origin.get(index).copied()
    }

    // len + 1: nothing cut at the tail
    pub fn no_tail_cut_position(&self) -> usize {
        self.no_tail_cut
    }

    /// Remove the inclusive range `[start, end]` of the working sequence.
    /// Bounds are clamped; returns the range actually removed.
    pub fn cut_range(&mut self, start: isize, end: isize) -> Option<IndexRange> {
        let len = self.working.len() as isize;
        if end < start || end < 0 || start >= len {
            return None;
        }
        let s = start.max(0) as usize;
        let e = end.min(len - 1) as usize;
        self.working.drain(s..=e);
        self.origin.drain(s..=e);
        let range = IndexRange::new(s, e);
        self.removed.push(range);
        self.rebuild();
        log::debug!("cut [{s}, {e}], {} samples remain", self.working.len());
        Some(range)
    }

    pub fn reset_cuts(&mut self) {
        self.working = self.original.clone();
        self.origin = (0..self.original.len()).collect();
        self.removed.clear();
        self.rebuild();
        log::debug!("cuts reset, {} samples", self.working.len());
    }

    /// Inclusive index pair covering the timestamps within `[start, end]`.
    /// Returns `IndexRange::EMPTY` when nothing matches.
    pub fn index_range_for_timestamps(&self, start: NaiveDateTime, end: NaiveDateTime) -> IndexRange {
        let mut first = None;
        let mut last = None;
        for (i, ts) in self.timestamps.iter().enumerate() {
            if *ts > end {
                break;
            }
            if first.is_none() && *ts >= start {
                first = Some(i);
            }
            if first.is_some() {
                last = Some(i);
            }
        }
        match (first, last) {
            (Some(s), Some(e)) if e >= s => IndexRange::new(s, e),
            _ => IndexRange::EMPTY,
        }
    }

    /// Seconds since the first imported sample, one per working sample.
    pub fn time_axis(&self) -> Vec<f64> {
        let Some(origin) = self.original.first().map(|s| s.timestamp) else {
            return Vec::new();
        };
        self.timestamps
            .iter()
            .map(|ts| {
                let delta = *ts - origin;
                delta.num_microseconds().map_or(delta.num_milliseconds() as f64 / 1e3, |us| us as f64 / 1e6)
            })
            .collect()
    }

    pub fn lines(&self, format: Option<&DateFormat>) -> Vec<String> {
        self.working.iter().map(|s| s.to_line(format)).collect()
    }

    fn rebuild(&mut self) {
        let n = self.working.len();
        self.z.clear();
        self.x.clear();
        self.y.clear();
        self.timestamps.clear();
        self.z.reserve(n);
        self.x.reserve(n);
        self.y.reserve(n);
        self.timestamps.reserve(n);
        for s in &self.working {
            self.z.push(s.z);
            self.x.push(s.x);
            self.y.push(s.y);
            self.timestamps.push(s.timestamp);
        }
        self.no_tail_cut = n + 1;
    }
}
