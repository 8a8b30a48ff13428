//! Partial tab-separated field extraction.
//!
//! Summary statistics rows can be wide, but each pass over them only needs a
//! handful of columns. [`ColumnScanner`] walks a line once, captures the
//! requested columns as borrowed slices and stops as soon as the right-most
//! requested column has been seen. The slices borrow from the line and are
//! only valid for as long as the line buffer is; copy anything that has to
//! outlive it.

use memchr::memchr_iter;

#[derive(Debug, Clone)]
pub struct ColumnScanner {
    // (column, slot) pairs sorted by column.
    targets: Vec<(usize, usize)>,
    n_slots: usize,
    required: usize,
}

impl ColumnScanner {
    /// `columns[slot]` is the zero-based column captured into `out[slot]` by [`scan`](Self::scan).
    pub fn new(columns: &[usize]) -> Self {
        let mut targets: Vec<(usize, usize)> = columns
            .iter()
            .enumerate()
            .map(|(slot, &column)| (column, slot))
            .collect();
        targets.sort_unstable();
        let required = columns.iter().max().map_or(0, |max| max + 1);
        Self {
            targets,
            n_slots: columns.len(),
            required,
        }
    }

    pub fn n_slots(&self) -> usize {
        self.n_slots
    }

    /// Captures the requested columns of `line` into `out`.
    ///
    /// Returns the number of columns observed, which is capped at one past
    /// the right-most requested column because scanning stops there. A
    /// smaller return value means the line is too short and the slots past
    /// the end were left untouched.
    pub fn scan<'a>(&self, line: &'a str, out: &mut [&'a str]) -> usize {
        debug_assert!(out.len() >= self.n_slots);
        if self.required == 0 {
            return 0;
        }

        let bytes = line.as_bytes();
        let mut pending = self.targets.iter().peekable();
        let mut tabs = memchr_iter(b'\t', bytes);
        let mut start = 0;
        let mut column = 0;
        loop {
            let (end, is_last) = match tabs.next() {
                Some(tab) => (tab, false),
                None => (bytes.len(), true),
            };
            while let Some(&&(target, slot)) = pending.peek() {
                if target != column {
                    break;
                }
                out[slot] = &line[start..end];
                pending.next();
            }
            column += 1;
            if column == self.required || is_last {
                return column;
            }
            start = end + 1;
        }
    }

    /// [`scan`](Self::scan), reporting only whether every slot was filled.
    pub fn scan_complete<'a>(&self, line: &'a str, out: &mut [&'a str]) -> bool {
        self.scan(line, out) >= self.required
    }
}

#[inline]
fn trim_field(token: &str) -> &str {
    token.trim_matches(|c| c == ' ' || c == '\t' || c == '\r')
}

/// Parses a signed 64-bit integer. The whole trimmed token must be consumed
/// and the value must fit.
pub fn parse_int_strict(token: &str) -> Option<i64> {
    trim_field(token).parse::<i64>().ok()
}

/// Parses a finite `f64`. Partial parses (`"1abc"`), empty tokens and NaN
/// are rejected, as are values out of the normal range: overflow to
/// infinity, underflow to zero from a non-zero mantissa, and subnormals.
pub fn parse_float_strict(token: &str) -> Option<f64> {
    let token = trim_field(token);
    let value = token.parse::<f64>().ok().filter(|value| value.is_finite())?;
    if value == 0.0 {
        let mantissa = token.split(|c: char| c == 'e' || c == 'E').next().unwrap_or_default();
        if mantissa.bytes().any(|b| matches!(b, b'1'..=b'9')) {
            return None;
        }
    } else if value.abs() < f64::MIN_POSITIVE {
        return None;
    }
    Some(value)
}
