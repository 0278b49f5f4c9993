use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Serialize, Serializer};

/// Output layout used when the header carries no `DATE_FORMAT`.
pub const FALLBACK_OUTPUT_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f";

/// Layouts tried, in order, when no explicit format is known or it fails.
const GENERIC_DATETIME_LAYOUTS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S%.f",
    "%Y/%m/%d %H:%M",
    "%d/%m/%Y %H:%M:%S%.f",
    "%d/%m/%Y %H:%M",
    "%d-%m-%Y %H:%M:%S%.f",
    "%d.%m.%Y %H:%M:%S%.f",
];

const GENERIC_DATE_LAYOUTS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y", "%d-%m-%Y", "%d.%m.%Y"];

/// A device date pattern (`yyyy-MM-dd HH:mm:ss.fff` style) translated to
/// chrono items.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DateFormat {
    source: String,
    segments: Vec<Segment>,
    parse: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Segment {
    Pattern(String),
    // `f` runs keep exactly `digits`; `F` runs also drop trailing zeros.
    Fraction { digits: usize, trim: bool },
}

impl DateFormat {
    pub fn new(pattern: &str) -> Self {
        let (segments, parse) = translate(pattern);
        Self {
            source: pattern.to_string(),
            segments,
            parse,
        }
    }

    /// The pattern exactly as it appeared in the header.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// chrono pattern used for parsing; fractions accept any digit count.
    pub fn chrono_pattern(&self) -> &str {
        &self.parse
    }

    /// Strict parse with this pattern. Date-only patterns yield midnight,
    /// time-only patterns land on 1970-01-01.
    pub fn parse(&self, value: &str) -> Option<NaiveDateTime> {
        let value = value.trim();
        NaiveDateTime::parse_from_str(value, &self.parse)
            .ok()
            .or_else(|| {
                NaiveDate::parse_from_str(value, &self.parse)
                    .ok()
                    .and_then(|d| d.and_hms_opt(0, 0, 0))
            })
            .or_else(|| {
                NaiveTime::parse_from_str(value, &self.parse)
                    .ok()
                    .map(|t| NaiveDate::default().and_time(t))
            })
    }

    pub fn format(&self, ts: &NaiveDateTime) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Pattern(p) => out.push_str(&format_with(ts, p)),
                Segment::Fraction { digits, trim } => {
                    push_fraction(&mut out, ts.nanosecond(), *digits, *trim)
                }
            }
        }
        out
    }
}

impl Serialize for DateFormat {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.source)
    }
}

/// Best-effort parse used when no format is known yet or the declared one
/// does not match the value.
pub fn parse_generic(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_local());
    }
    for layout in GENERIC_DATETIME_LAYOUTS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, layout) {
            return Some(dt);
        }
    }
    GENERIC_DATE_LAYOUTS
        .iter()
        .find_map(|layout| NaiveDate::parse_from_str(value, layout).ok())
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Format `ts` with the header pattern, or the ISO fallback.
pub fn format_timestamp(ts: &NaiveDateTime, format: Option<&DateFormat>) -> String {
    match format {
        Some(f) => f.format(ts),
        None => format_with(ts, FALLBACK_OUTPUT_FORMAT),
    }
}

fn format_with(ts: &NaiveDateTime, pattern: &str) -> String {
    // A malformed pattern would make `Display` fail mid-write; fall back instead.
    let items: Vec<Item<'_>> = StrftimeItems::new(pattern).collect();
    if items.iter().any(|i| matches!(i, Item::Error)) {
        return format_with(ts, FALLBACK_OUTPUT_FORMAT);
    }
    ts.format_with_items(items.into_iter()).to_string()
}

fn push_fraction(out: &mut String, nanos: u32, digits: usize, trim: bool) {
    let mut text = format!("{:09}", nanos % 1_000_000_000);
    text.truncate(digits.min(9));
    while text.len() < digits {
        text.push('0');
    }
    if trim {
        let kept = text.trim_end_matches('0').len();
        text.truncate(kept);
        // an all-zero `F` run takes its leading dot with it
        if text.is_empty() && out.ends_with('.') {
            out.pop();
        }
    }
    out.push_str(&text);
}

#[derive(Default)]
struct Translation {
    segments: Vec<Segment>,
    chunk: String,
    parse: String,
}

impl Translation {
    fn specifier(&mut self, spec: &str) {
        self.chunk.push_str(spec);
        self.parse.push_str(spec);
    }

    fn literal(&mut self, c: char) {
        push_literal(&mut self.chunk, c);
        push_literal(&mut self.parse, c);
    }

    fn fraction(&mut self, digits: usize, trim: bool) {
        if !self.chunk.is_empty() {
            self.segments.push(Segment::Pattern(std::mem::take(&mut self.chunk)));
        }
        self.segments.push(Segment::Fraction { digits, trim });
        // `%.f` reads an optional dot and any number of digits
        if self.parse.ends_with('.') {
            self.parse.pop();
            self.parse.push_str("%.f");
        } else {
            self.parse.push_str(match digits {
                0..=3 => "%3f",
                4..=6 => "%6f",
                _ => "%9f",
            });
        }
    }

    fn finish(mut self) -> (Vec<Segment>, String) {
        if !self.chunk.is_empty() {
            self.segments.push(Segment::Pattern(self.chunk));
        }
        (self.segments, self.parse)
    }
}

/// Translate a device date pattern into format segments and a chrono parse
/// pattern.
fn translate(pattern: &str) -> (Vec<Segment>, String) {
    let chars: Vec<char> = pattern.chars().collect();
    let mut out = Translation::default();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        let run = chars[i..].iter().take_while(|&&x| x == c).count();
        match c {
            'y' => out.specifier(if run <= 2 { "%y" } else { "%Y" }),
            'M' => out.specifier(match run {
                1 => "%-m",
                2 => "%m",
                3 => "%b",
                _ => "%B",
            }),
            'd' => out.specifier(match run {
                1 => "%-d",
                2 => "%d",
                3 => "%a",
                _ => "%A",
            }),
            'H' => out.specifier(if run == 1 { "%-H" } else { "%H" }),
            'h' => out.specifier(if run == 1 { "%-I" } else { "%I" }),
            'm' => out.specifier(if run == 1 { "%-M" } else { "%M" }),
            's' => out.specifier(if run == 1 { "%-S" } else { "%S" }),
            'f' | 'F' => out.fraction(run, c == 'F'),
            't' => out.specifier("%p"),
            '\'' | '"' => {
                let quote = c;
                let mut j = i + 1;
                while j < chars.len() && chars[j] != quote {
                    out.literal(chars[j]);
                    j += 1;
                }
                i = j + 1;
                continue;
            }
            '\\' => {
                if let Some(&next) = chars.get(i + 1) {
                    out.literal(next);
                }
                i += 2;
                continue;
            }
            _ => {
                for _ in 0..run {
                    out.literal(c);
                }
            }
        }
        i += run;
    }
    out.finish()
}

fn push_literal(out: &mut String, c: char) {
    if c == '%' {
        out.push_str("%%");
    } else {
        out.push(c);
    }
}
