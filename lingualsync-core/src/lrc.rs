use serde::Serialize;
use std::collections::HashSet;

/// A single timed line of lyrics, optionally carrying a translation.
///
/// Lines stored in the lyrics cache never carry a translation; per-request
/// copies get one attached through [`LyricLine::with_translation`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LyricLine {
    time_ms: u64,
    original: String,
    translated: Option<String>,
}

impl LyricLine {
    /// Create an untranslated line. Returns `None` if the text is blank.
    #[must_use]
    pub fn new(time_ms: u64, original: impl Into<String>) -> Option<Self> {
        let original = original.into();
        if original.trim().is_empty() {
            return None;
        }
        Some(Self {
            time_ms,
            original,
            translated: None,
        })
    }

    /// Copy of this line with the given translation attached
    #[must_use]
    pub fn with_translation(&self, translated: Option<String>) -> Self {
        Self {
            time_ms: self.time_ms,
            original: self.original.clone(),
            translated,
        }
    }

    #[must_use]
    pub const fn time_ms(&self) -> u64 {
        self.time_ms
    }

    #[must_use]
    pub fn original(&self) -> &str {
        &self.original
    }

    #[must_use]
    pub fn translated(&self) -> Option<&str> {
        self.translated.as_deref()
    }
}

/// A timestamp tag found inside a physical line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Timestamp {
    time_ms: u64,
    /// Byte offset just past the closing `]`
    end: usize,
}

/// Parse LRC text into lines sorted by time, with exact duplicates removed.
///
/// Lines break on `\n`, `\r\n` or a lone `\r`. Blank lines, ID tags like
/// `[ar:Artist]` and lines with no lyric text after their timestamps are
/// skipped. A line tagged with several timestamps yields one entry per
/// timestamp. Input with nothing usable yields an empty list.
#[must_use]
pub fn parse(input: &str) -> Vec<LyricLine> {
    let mut lines = Vec::new();

    for line in input.split(['\n', '\r']) {
        let line = line.trim();
        if line.is_empty() || is_metadata_line(line) {
            continue;
        }

        let timestamps = find_timestamps(line);

        // Untimed text
        let Some(last) = timestamps.last() else {
            continue;
        };
        let text = line[last.end..].trim();
        if text.is_empty() {
            continue;
        }

        for timestamp in &timestamps {
            if let Some(parsed) = LyricLine::new(timestamp.time_ms, text) {
                lines.push(parsed);
            }
        }
    }

    // Stable sort keeps encounter order among equal times
    lines.sort_by_key(LyricLine::time_ms);

    let mut seen = HashSet::new();
    lines.retain(|line| seen.insert((line.time_ms, line.original.clone())));

    lines
}

/// Returns true if the line is an ID tag rather than a timed lyric
#[must_use]
pub fn is_metadata_line(line: &str) -> bool {
    let line = line.trim();
    line.starts_with('[') && line.contains(':') && find_timestamps(line).is_empty()
}

/// Find every `[mm:ss]` / `[mm:ss.f]` / `[mm:ss.ff]` / `[mm:ss.fff]` tag in a line
fn find_timestamps(line: &str) -> Vec<Timestamp> {
    let bytes = line.as_bytes();
    let mut found = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'[' {
            if let Some(timestamp) = parse_timestamp_at(bytes, i) {
                i = timestamp.end;
                found.push(timestamp);
                continue;
            }
        }
        i += 1;
    }

    found
}

/// Try to read a timestamp tag whose `[` is at `start`
fn parse_timestamp_at(bytes: &[u8], start: usize) -> Option<Timestamp> {
    let mut pos = start + 1;

    let (minutes, minute_digits) = read_digits(bytes, pos, 2);
    if minute_digits == 0 {
        return None;
    }
    pos += minute_digits;

    if bytes.get(pos) != Some(&b':') {
        return None;
    }
    pos += 1;

    let (seconds, second_digits) = read_digits(bytes, pos, 2);
    if second_digits != 2 {
        return None;
    }
    pos += 2;

    let mut fraction_ms = 0;
    if bytes.get(pos) == Some(&b'.') {
        let (fraction, fraction_digits) = read_digits(bytes, pos + 1, 3);
        fraction_ms = match fraction_digits {
            1 => fraction * 100,
            2 => fraction * 10,
            3 => fraction,
            _ => return None,
        };
        pos += 1 + fraction_digits;
    }

    if bytes.get(pos) != Some(&b']') {
        return None;
    }

    Some(Timestamp {
        time_ms: (minutes * 60 + seconds) * 1000 + fraction_ms,
        end: pos + 1,
    })
}

/// Read up to `max` ASCII digits at `start`, returning the value and digit count
fn read_digits(bytes: &[u8], start: usize, max: usize) -> (u64, usize) {
    let mut value = 0;
    let mut count = 0;

    while count < max {
        match bytes.get(start + count) {
            Some(b) if b.is_ascii_digit() => {
                value = value * 10 + u64::from(b - b'0');
                count += 1;
            }
            _ => break,
        }
    }

    (value, count)
}
