use crate::{
    core::scanner::{parse_float_strict, ColumnScanner},
    utils::util::format_number_with_commas,
};
use std::collections::{hash_map::Entry, HashMap};

/// Keeps one row per assigned identifier among the rows still kept.
///
/// With a p-value column the row with the smallest p-value survives, the
/// earliest row winning ties. Without one the first occurrence survives.
/// Rows without an identifier are never touched. Returns the number of
/// rows removed.
pub fn remove_duplicates(
    lines: &[String],
    ids: &[Option<String>],
    keep: &mut [bool],
    pval_column: Option<usize>,
) -> usize {
    debug_assert_eq!(lines.len(), ids.len());
    debug_assert_eq!(lines.len(), keep.len());

    let scanner = pval_column.map(|column| ColumnScanner::new(&[column]));
    let pvalue = |index: usize| -> f64 {
        let Some(scanner) = &scanner else {
            return f64::INFINITY;
        };
        let mut field = [""];
        if !scanner.scan_complete(&lines[index], &mut field) {
            return f64::INFINITY;
        }
        parse_float_strict(field[0]).unwrap_or(f64::INFINITY)
    };

    // identifier -> (row, p-value) of the current best row
    let mut best: HashMap<&str, (usize, f64)> = HashMap::new();
    let mut n_removed = 0;
    for (index, id) in ids.iter().enumerate() {
        let Some(id) = id.as_deref() else {
            continue;
        };
        if !keep[index] {
            continue;
        }
        let p = pvalue(index);
        match best.entry(id) {
            Entry::Vacant(entry) => {
                entry.insert((index, p));
            }
            Entry::Occupied(mut entry) => {
                let (best_index, best_p) = *entry.get();
                if p < best_p {
                    keep[best_index] = false;
                    entry.insert((index, p));
                } else {
                    keep[index] = false;
                }
                n_removed += 1;
            }
        }
    }

    if n_removed > 0 {
        log::info!(
            "Removed {} rows with a duplicated identifier",
            format_number_with_commas(n_removed)
        );
    } else {
        log::debug!("No duplicated identifiers found");
    }
    n_removed
}
