use crate::{
    cli::ConvertArgs,
    commands::build_thread_pool,
    core::{
        dedup::remove_duplicates,
        field::Field,
        qc::QcFilter,
        scanner::ColumnScanner,
    },
    io::{router::RowRenderer, table::SummaryTable, writers::TextWriter},
    utils::util::{format_number_with_commas, Result},
};
use memchr::memchr_iter;
use rayon::prelude::*;
use std::path::Path;

const REQUIRED_FIELDS: [Field; 3] = [Field::Identifier, Field::Allele1, Field::Allele2];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConvertSummary {
    pub rows: usize,
    pub qc_failed: usize,
    pub malformed: usize,
    pub duplicates_removed: usize,
    pub written: usize,
}

pub fn convert(args: ConvertArgs) -> Result<()> {
    let summary = run_convert(&args)?;
    log::info!(
        "Summary: {} rows loaded, {} failed QC, {} malformed, {} duplicates removed, {} written",
        format_number_with_commas(summary.rows),
        format_number_with_commas(summary.qc_failed),
        format_number_with_commas(summary.malformed),
        format_number_with_commas(summary.duplicates_removed),
        format_number_with_commas(summary.written)
    );
    Ok(())
}

/// The row's own identifier, `None` when the row does not have exactly as
/// many columns as the header or its identifier is empty.
fn own_identifier(line: &str, n_columns: usize, scanner: &ColumnScanner) -> Option<String> {
    if memchr_iter(b'\t', line.as_bytes()).count() + 1 != n_columns {
        return None;
    }
    let mut field = [""];
    if !scanner.scan_complete(line, &mut field) || field[0].is_empty() {
        return None;
    }
    Some(field[0].to_string())
}

pub(crate) fn run_convert(args: &ConvertArgs) -> Result<ConvertSummary> {
    let common = &args.common;
    let names = args.columns.names();

    let table = SummaryTable::load(&common.gwas_summary)?;
    let columns = table.resolve_columns(&names, &REQUIRED_FIELDS)?;
    let id_column = columns.get(Field::Identifier);
    let renderer = RowRenderer::new(common.format, &columns, id_column)?;
    let id_scanner = ColumnScanner::new(&[id_column.unwrap_or_default()]);

    let pool = build_thread_pool(common.num_threads, "convert")?;
    let (mut qc, ids) = pool.install(|| {
        let qc = QcFilter::new(&columns, common.maf).run(&table.lines);
        let ids: Vec<Option<String>> = table
            .lines
            .par_iter()
            .map(|line| own_identifier(line, table.header.len(), &id_scanner))
            .collect();
        (qc, ids)
    });
    qc.exclude(table.undecodable_rows());
    let malformed = ids.iter().filter(|id| id.is_none()).count();
    if malformed > 0 {
        log::warn!(
            "Skipping {} rows with a wrong column count or an empty {} column",
            format_number_with_commas(malformed),
            names.name(Field::Identifier)
        );
    }

    let mut keep = qc.keep;
    let duplicates_removed = if common.remove_dup_snp {
        remove_duplicates(&table.lines, &ids, &mut keep, columns.get(Field::PValue))
    } else {
        0
    };

    let written = write_rows(
        Path::new(&common.out),
        &renderer.header(&table.header, names.name(Field::Identifier)),
        &table.lines,
        &ids,
        &keep,
        &renderer,
    )?;

    Ok(ConvertSummary {
        rows: table.lines.len(),
        qc_failed: qc.n_failed,
        malformed,
        duplicates_removed,
        written,
    })
}

fn write_rows(
    path: &Path,
    header: &str,
    lines: &[String],
    ids: &[Option<String>],
    keep: &[bool],
    renderer: &RowRenderer,
) -> Result<usize> {
    let mut writer = TextWriter::create(path)?;
    writer.write_line(header)?;
    let mut written = 0;
    for ((line, id), &kept) in lines.iter().zip(ids).zip(keep) {
        let Some(id) = id.as_deref().filter(|_| kept) else {
            continue;
        };
        if let Some(row) = renderer.render(line, id) {
            writer.write_line(&row)?;
            written += 1;
        }
    }
    writer.finish()?;
    log::info!(
        "Wrote {} rows to {}",
        format_number_with_commas(written),
        path.display()
    );
    Ok(written)
}
