use crate::{
    core::{
        field::{ColumnMap, Field},
        scanner::{parse_float_strict, ColumnScanner},
    },
    utils::util::format_number_with_commas,
};
use rayon::prelude::*;

/// Row admissibility screen over the optional numeric columns.
///
/// Every numeric column present in the header must hold a finite number.
/// On top of that the p-value must lie in `[0, 1]` and the frequency in
/// `[maf, 1 - maf]`. Rows too short to contain every screened column fail.
#[derive(Debug, Clone)]
pub struct QcFilter {
    scanner: ColumnScanner,
    fields: Vec<Field>,
    maf: f64,
}

#[derive(Debug, Clone)]
pub struct QcOutcome {
    pub keep: Vec<bool>,
    pub n_failed: usize,
}

impl QcOutcome {
    /// Drops `rows` whatever the screen decided. `n_failed` keeps counting
    /// screen failures only, so excluded rows are taken out of it.
    pub fn exclude(&mut self, rows: impl IntoIterator<Item = usize>) {
        for index in rows {
            if !self.keep[index] {
                self.n_failed -= 1;
            }
            self.keep[index] = false;
        }
    }
}

impl QcFilter {
    pub fn new(columns: &ColumnMap, maf: f64) -> Self {
        let (fields, indices): (Vec<Field>, Vec<usize>) = Field::NUMERIC
            .iter()
            .filter_map(|&field| columns.get(field).map(|column| (field, column)))
            .unzip();
        Self {
            scanner: ColumnScanner::new(&indices),
            fields,
            maf,
        }
    }

    /// True when no numeric column is configured; every row then passes.
    pub fn is_noop(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn passes(&self, line: &str) -> bool {
        if self.is_noop() {
            return true;
        }
        let mut tokens = [""; Field::NUMERIC.len()];
        if !self.scanner.scan_complete(line, &mut tokens) {
            return false;
        }
        self.fields
            .iter()
            .zip(tokens.iter())
            .all(|(&field, token)| match parse_float_strict(token) {
                Some(value) => self.in_range(field, value),
                None => false,
            })
    }

    fn in_range(&self, field: Field, value: f64) -> bool {
        match field {
            Field::PValue => (0.0..=1.0).contains(&value),
            Field::Freq => value >= self.maf && value <= 1.0 - self.maf,
            _ => true,
        }
    }

    /// Screens every row; rows are independent so this runs on the current rayon pool.
    pub fn run(&self, lines: &[String]) -> QcOutcome {
        if self.is_noop() {
            log::info!("Basic QC skipped: no numeric columns configured");
            return QcOutcome {
                keep: vec![true; lines.len()],
                n_failed: 0,
            };
        }

        let keep: Vec<bool> = lines.par_iter().map(|line| self.passes(line)).collect();
        let n_failed = keep.iter().filter(|&&kept| !kept).count();
        log::info!(
            "Basic QC done: {} passed, {} removed",
            format_number_with_commas(lines.len() - n_failed),
            format_number_with_commas(n_failed)
        );
        QcOutcome { keep, n_failed }
    }
}
