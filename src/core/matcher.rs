//! Single-pass merge-join of an in-memory summary table against a reference stream.
//!
//! Input rows are reduced to [`InputRecord`]s and sorted by `(chromosome,
//! position)`. The reference is then read exactly once, strictly forward,
//! while a cursor walks the sorted records. Only the current reference line
//! is held in memory, so the reference may be arbitrarily large.
//!
//! The reference must be sorted by the same `(chromosome code, position)`
//! key. This is not verified: an out-of-order reference can only cause
//! missed matches, never spurious ones.

use crate::{
    constants::REFERENCE_PROGRESS_INTERVAL,
    core::{
        allele::AlleleKey,
        chromosome::canonical_chromosome,
        field::{ColumnMap, Field},
        scanner::{parse_int_strict, ColumnScanner},
    },
    io::readers::LineSource,
    utils::util::{format_number_with_commas, Result},
};
use rayon::prelude::*;

pub type Locus = (u8, i64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputRecord {
    /// Row ordinal in the input table.
    pub index: usize,
    pub chr: u8,
    pub pos: i64,
    pub allele: AlleleKey,
}

impl InputRecord {
    #[inline]
    pub fn locus(&self) -> Locus {
        (self.chr, self.pos)
    }
}

/// Parsed reference line. `id` borrows the line buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReferenceRecord<'a> {
    pub chr: u8,
    pub pos: i64,
    pub allele: AlleleKey,
    pub id: &'a str,
}

/// Zero-based columns of the locus and allele fields in a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocusColumns {
    pub chr: usize,
    pub pos: usize,
    pub a1: usize,
    pub a2: usize,
}

impl LocusColumns {
    pub fn from_column_map(columns: &ColumnMap) -> Result<Self> {
        let get = |field: Field| {
            columns
                .get(field)
                .ok_or_else(|| crate::rsidx_error!("The {field} column is required for matching"))
        };
        Ok(Self {
            chr: get(Field::Chromosome)?,
            pos: get(Field::Position)?,
            a1: get(Field::Allele1)?,
            a2: get(Field::Allele2)?,
        })
    }
}

/// Column layout of the reference database.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReferenceLayout {
    pub locus: LocusColumns,
    pub id: usize,
}

impl ReferenceLayout {
    /// PLINK `.bim`: chromosome, identifier, genetic distance, position, allele 1, allele 2.
    pub const BIM: ReferenceLayout = ReferenceLayout {
        locus: LocusColumns {
            chr: 0,
            pos: 3,
            a1: 4,
            a2: 5,
        },
        id: 1,
    };
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatchStats {
    pub reference_lines: u64,
    pub invalid_reference_lines: u64,
    pub matched_rows: usize,
    /// The reference still had lines when every input record was passed.
    pub stopped_early: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchOutcome {
    /// Per input row: the matched reference identifier, `None` when unmatched.
    pub ids: Vec<Option<String>>,
    pub stats: MatchStats,
}

fn parse_input_record(index: usize, line: &str, scanner: &ColumnScanner) -> Option<InputRecord> {
    let mut fields = [""; 4];
    if !scanner.scan_complete(line, &mut fields) {
        return None;
    }
    let chr = canonical_chromosome(fields[0])?;
    let pos = parse_int_strict(fields[1])?;
    let allele = AlleleKey::new(fields[2].trim(), fields[3].trim());
    allele.is_matchable().then_some(InputRecord {
        index,
        chr,
        pos,
        allele,
    })
}

/// Canonicalizes every row in parallel and returns the matchable rows
/// stably sorted by locus. Rows that fail to parse are left out.
pub fn build_input_records(lines: &[String], columns: &LocusColumns) -> Vec<InputRecord> {
    let scanner = ColumnScanner::new(&[columns.chr, columns.pos, columns.a1, columns.a2]);
    let slots: Vec<Option<InputRecord>> = lines
        .par_iter()
        .enumerate()
        .map(|(index, line)| parse_input_record(index, line, &scanner))
        .collect();

    let mut records: Vec<InputRecord> = slots.into_iter().flatten().collect();
    records.par_sort_by_key(InputRecord::locus);

    let dropped = lines.len() - records.len();
    if dropped > 0 {
        log::info!(
            "{} rows have an invalid chromosome, position or allele pair and will not be matched",
            format_number_with_commas(dropped)
        );
    }
    log::debug!(
        "Built {} sortable input records",
        format_number_with_commas(records.len())
    );
    records
}

/// Lazily parses a reference line: the locus first, the rest only on demand.
struct ReferenceParser {
    locus: ColumnScanner,
    detail: ColumnScanner,
}

impl ReferenceParser {
    fn new(layout: &ReferenceLayout) -> Self {
        Self {
            locus: ColumnScanner::new(&[layout.locus.chr, layout.locus.pos]),
            detail: ColumnScanner::new(&[layout.locus.a1, layout.locus.a2, layout.id]),
        }
    }

    fn locus(&self, line: &str) -> Option<Locus> {
        let mut fields = [""; 2];
        if !self.locus.scan_complete(line, &mut fields) {
            return None;
        }
        Some((
            canonical_chromosome(fields[0])?,
            parse_int_strict(fields[1])?,
        ))
    }

    fn record<'a>(&self, line: &'a str, (chr, pos): Locus) -> Option<ReferenceRecord<'a>> {
        let mut fields = [""; 3];
        if !self.detail.scan_complete(line, &mut fields) {
            return None;
        }
        let id = fields[2].trim();
        if id.is_empty() {
            return None;
        }
        Some(ReferenceRecord {
            chr,
            pos,
            allele: AlleleKey::new(fields[0].trim(), fields[1].trim()),
            id,
        })
    }
}

/// Streams `reference` once against `records` (sorted by locus).
///
/// A row is matched when it passed QC and its allele key equals that of a
/// reference line at the same locus. When several reference lines match
/// the same row, the last one wins.
pub fn merge_join(
    records: &[InputRecord],
    qc_keep: &[bool],
    n_rows: usize,
    layout: &ReferenceLayout,
    reference: &mut dyn LineSource,
) -> Result<MatchOutcome> {
    debug_assert!(records.windows(2).all(|w| w[0].locus() <= w[1].locus()));
    let parser = ReferenceParser::new(layout);
    let mut ids: Vec<Option<String>> = vec![None; n_rows];
    let mut stats = MatchStats::default();
    let mut cursor = 0;

    if records.is_empty() {
        log::warn!("No input rows can be matched; skipping the reference scan");
        return Ok(MatchOutcome { ids, stats });
    }

    while let Some(bytes) = reference.next_line()? {
        stats.reference_lines += 1;
        if stats.reference_lines % REFERENCE_PROGRESS_INTERVAL == 0 {
            log::debug!(
                "Reference: scanned {} lines, cursor at {}/{}",
                format_number_with_commas(stats.reference_lines),
                format_number_with_commas(cursor),
                format_number_with_commas(records.len())
            );
        }

        let Ok(line) = std::str::from_utf8(bytes) else {
            log::trace!("Reference line {} is not valid UTF-8", stats.reference_lines);
            stats.invalid_reference_lines += 1;
            continue;
        };
        let Some(locus) = parser.locus(line) else {
            stats.invalid_reference_lines += 1;
            continue;
        };

        while cursor < records.len() && records[cursor].locus() < locus {
            cursor += 1;
        }
        if cursor == records.len() {
            stats.stopped_early = true;
            break;
        }
        if records[cursor].locus() != locus {
            continue;
        }

        let Some(reference_record) = parser.record(line, locus) else {
            stats.invalid_reference_lines += 1;
            continue;
        };
        if !reference_record.allele.is_matchable() {
            continue;
        }

        for record in records[cursor..]
            .iter()
            .take_while(|record| record.locus() == locus)
        {
            if qc_keep[record.index] && record.allele.matches(&reference_record.allele) {
                if let Some(previous) = &ids[record.index] {
                    log::trace!(
                        "Row {}: identifier {} replaced by {}",
                        record.index,
                        previous,
                        reference_record.id
                    );
                }
                ids[record.index] = Some(reference_record.id.to_owned());
            }
        }
    }

    stats.matched_rows = ids.iter().filter(|id| id.is_some()).count();
    log::info!(
        "Reference scan done: {} lines scanned{}, {} invalid, {} rows matched",
        format_number_with_commas(stats.reference_lines),
        if stats.stopped_early {
            " (stopped after last input locus)"
        } else {
            ""
        },
        format_number_with_commas(stats.invalid_reference_lines),
        format_number_with_commas(stats.matched_rows)
    );
    Ok(MatchOutcome { ids, stats })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::readers::BufLineSource;
    use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

    // CHR POS A1 A2
    const INPUT_COLUMNS: LocusColumns = LocusColumns {
        chr: 0,
        pos: 1,
        a1: 2,
        a2: 3,
    };

    // CHR POS REF ALT ID
    const REFERENCE: ReferenceLayout = ReferenceLayout {
        locus: LocusColumns {
            chr: 0,
            pos: 1,
            a1: 2,
            a2: 3,
        },
        id: 4,
    };

    fn lines(rows: &[&str]) -> Vec<String> {
        rows.iter().map(|row| row.to_string()).collect()
    }

    fn run(input: &[&str], reference: &[&str]) -> MatchOutcome {
        let input = lines(input);
        let records = build_input_records(&input, &INPUT_COLUMNS);
        let qc_keep = vec![true; input.len()];
        let text = reference.join("\n");
        let mut source = BufLineSource::new(text.as_bytes());
        merge_join(&records, &qc_keep, input.len(), &REFERENCE, &mut source).unwrap()
    }

    #[test]
    fn build_input_records_sorts_by_locus_and_drops_invalid_rows() {
        let input = lines(&[
            "2\t50\tA\tG",
            "1\t300\tC\tT",
            "chrX\t10\tA\tC",
            "chr1\t100\tA\tG",
            "chrUn\t5\tA\tG",
            "1\tabc\tA\tG",
            "1\t200\tA\tN",
            "1\t100\tAT\tA",
            "1\t100",
        ]);
        let records = build_input_records(&input, &INPUT_COLUMNS);
        let order: Vec<usize> = records.iter().map(|record| record.index).collect();
        // Stable: rows 3 and 7 share chr1:100 and keep their input order.
        assert_eq!(order, vec![3, 7, 1, 0, 2]);
        assert_eq!(records[4].chr, 23);
    }

    #[test]
    fn reverse_complement_pair_matches() {
        let outcome = run(&["1\t12345\tA\tG"], &["1\t12345\tT\tC\trs999"]);
        assert_eq!(outcome.ids, vec![Some("rs999".to_string())]);
        assert_eq!(outcome.stats.matched_rows, 1);
    }

    #[test]
    fn missing_reference_locus_leaves_row_unmatched() {
        let outcome = run(
            &["1\t12345\tA\tG"],
            &["1\t12344\tA\tG\trs1", "1\t12346\tA\tG\trs2"],
        );
        assert_eq!(outcome.ids, vec![None]);
        assert_eq!(outcome.stats.matched_rows, 0);
    }

    #[test]
    fn allele_mismatch_at_same_locus_is_not_matched() {
        let outcome = run(&["1\t100\tA\tG"], &["1\t100\tA\tC\trs1"]);
        assert_eq!(outcome.ids, vec![None]);
    }

    #[test]
    fn multi_allelic_site_matches_each_row_to_its_own_allele() {
        let outcome = run(
            &["1\t100\tA\tC", "1\t100\tA\tG", "1\t100\tA\tT"],
            &["1\t100\tA\tG\trsAG", "1\t100\tA\tC\trsAC"],
        );
        assert_eq!(
            outcome.ids,
            vec![Some("rsAC".to_string()), Some("rsAG".to_string()), None]
        );
    }

    #[test]
    fn last_matching_reference_line_wins() {
        let outcome = run(
            &["1\t100\tA\tG"],
            &["1\t100\tA\tG\trsFirst", "1\t100\tG\tA\trsSecond"],
        );
        assert_eq!(outcome.ids, vec![Some("rsSecond".to_string())]);
    }

    #[test]
    fn reference_in_header_style_chromosome_names_matches() {
        let outcome = run(
            &["1\t100\tA\tG", "23\t5\tC\tT", "MT\t7\tA\tC"],
            &[
                "chr1\t100\tA\tG\trs1",
                "NC_000023.11\t5\tG\tA\trsX",
                "chrM\t7\tT\tG\trsMT",
            ],
        );
        assert_eq!(
            outcome.ids,
            vec![
                Some("rs1".to_string()),
                Some("rsX".to_string()),
                Some("rsMT".to_string())
            ]
        );
    }

    #[test]
    fn qc_failed_rows_are_never_matched() {
        let input = lines(&["1\t100\tA\tG", "1\t200\tA\tG"]);
        let records = build_input_records(&input, &INPUT_COLUMNS);
        let qc_keep = vec![false, true];
        let mut source =
            BufLineSource::new("1\t100\tA\tG\trs1\n1\t200\tA\tG\trs2\n".as_bytes());
        let outcome = merge_join(&records, &qc_keep, 2, &REFERENCE, &mut source).unwrap();
        assert_eq!(outcome.ids, vec![None, Some("rs2".to_string())]);
    }

    #[test]
    fn invalid_reference_lines_are_skipped() {
        let outcome = run(
            &["1\t100\tA\tG", "1\t200\tC\tT"],
            &[
                "chrUn\t100\tA\tG\trsBad",
                "1\tNA\tA\tG\trsBad",
                "1\t100\tA\tG",
                "1\t100\tA\tG\t",
                "1\t200\tC\tT\trs200",
            ],
        );
        assert_eq!(outcome.ids, vec![None, Some("rs200".to_string())]);
        assert_eq!(outcome.stats.invalid_reference_lines, 4);
    }

    #[test]
    fn undecodable_reference_lines_are_skipped() {
        let input = lines(&["1\t100\tA\tG", "1\t200\tC\tT"]);
        let records = build_input_records(&input, &INPUT_COLUMNS);
        let qc_keep = vec![true; input.len()];
        let text: &[u8] = b"1\t100\tA\tG\trs\xff1\n1\t150\tA\tG\trs150\tcaf\xe9\n1\t200\tC\tT\trs200\n";
        let mut source = BufLineSource::new(text);
        let outcome =
            merge_join(&records, &qc_keep, input.len(), &REFERENCE, &mut source).unwrap();
        assert_eq!(outcome.ids, vec![None, Some("rs200".to_string())]);
        assert_eq!(outcome.stats.reference_lines, 3);
        assert_eq!(outcome.stats.invalid_reference_lines, 2);
    }

    #[test]
    fn indel_and_other_alleles() {
        let outcome = run(
            &["1\t100\tAT\tA", "1\t200\t-\tA", "1\t300\tAT\tA"],
            &[
                "1\t100\tA\tAT\trsIns",
                "1\t200\t-\tA\trsOther",
                "1\t300\tTA\tT\trsFlip",
            ],
        );
        assert_eq!(outcome.ids, vec![Some("rsIns".to_string()), None, None]);
    }

    #[test]
    fn merge_stops_once_input_is_exhausted() {
        let outcome = run(
            &["1\t100\tA\tG"],
            &["1\t100\tA\tG\trs1", "2\t1\tA\tG\trs2", "3\t1\tA\tG\trs3"],
        );
        assert_eq!(outcome.ids, vec![Some("rs1".to_string())]);
        assert!(outcome.stats.stopped_early);
        assert_eq!(outcome.stats.reference_lines, 2);
    }

    #[test]
    fn empty_input_skips_reference_scan() {
        let outcome = run(&[], &["1\t100\tA\tG\trs1"]);
        assert!(outcome.ids.is_empty());
        assert_eq!(outcome.stats.reference_lines, 0);
    }

    fn synthetic_tables(rng: &mut StdRng) -> (Vec<String>, Vec<String>) {
        use rand::Rng;
        let bases = ["A", "C", "G", "T"];
        let mut reference = Vec::new();
        let mut input = Vec::new();
        for chr in 1..=3u8 {
            for pos in (1..=200i64).step_by(3) {
                let a1 = bases[rng.random_range(0..4)];
                let a2 = bases[rng.random_range(0..4)];
                reference.push(format!("{chr}\t{pos}\t{a1}\t{a2}\trs{chr}_{pos}"));
                if rng.random_bool(0.5) {
                    input.push(format!("{chr}\t{pos}\t{a2}\t{a1}"));
                }
                if rng.random_bool(0.3) {
                    let b1 = bases[rng.random_range(0..4)];
                    let b2 = bases[rng.random_range(0..4)];
                    input.push(format!("{chr}\t{}\t{b1}\t{b2}", pos + rng.random_range(0..2)));
                }
            }
        }
        input.shuffle(rng);
        (input, reference)
    }

    fn brute_force(input: &[String], reference: &[String]) -> Vec<bool> {
        let input_records = build_input_records(input, &INPUT_COLUMNS);
        let parser = ReferenceParser::new(&REFERENCE);
        let reference_records: Vec<ReferenceRecord> = reference
            .iter()
            .filter_map(|line| parser.record(line, parser.locus(line)?))
            .collect();
        let mut matched = vec![false; input.len()];
        for record in &input_records {
            matched[record.index] = reference_records.iter().any(|reference_record| {
                (reference_record.chr, reference_record.pos) == record.locus()
                    && record.allele.matches(&reference_record.allele)
            });
        }
        matched
    }

    fn join(input: &[String], reference: &[String]) -> Vec<Option<String>> {
        let records = build_input_records(input, &INPUT_COLUMNS);
        let qc_keep = vec![true; input.len()];
        let text = reference.join("\n");
        let mut source = BufLineSource::new(text.as_bytes());
        merge_join(&records, &qc_keep, input.len(), &REFERENCE, &mut source)
            .unwrap()
            .ids
    }

    #[test]
    fn merge_join_agrees_with_brute_force_on_sorted_reference() {
        let mut rng = StdRng::seed_from_u64(7);
        let (input, reference) = synthetic_tables(&mut rng);
        let ids = join(&input, &reference);
        let matched: Vec<bool> = ids.iter().map(Option::is_some).collect();
        assert_eq!(matched, brute_force(&input, &reference));
        assert!(matched.iter().any(|&m| m));
    }

    #[test]
    fn shuffled_reference_only_loses_matches() {
        let mut rng = StdRng::seed_from_u64(11);
        let (input, reference) = synthetic_tables(&mut rng);
        let sorted_ids = join(&input, &reference);

        for _ in 0..5 {
            let mut shuffled = reference.clone();
            shuffled.shuffle(&mut rng);
            let shuffled_ids = join(&input, &shuffled);
            for (sorted, shuffled) in sorted_ids.iter().zip(&shuffled_ids) {
                if let Some(id) = shuffled {
                    assert_eq!(sorted.as_ref(), Some(id));
                }
            }
        }
    }
}
