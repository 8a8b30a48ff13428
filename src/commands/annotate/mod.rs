use crate::{
    cli::AnnotateArgs,
    commands::build_thread_pool,
    core::{
        dedup::remove_duplicates,
        field::Field,
        matcher::{build_input_records, merge_join, LocusColumns},
        qc::QcFilter,
    },
    io::{
        reference::ReferenceStream,
        router::{route_rows, RowRenderer},
        table::SummaryTable,
        writers::OutputPaths,
    },
    utils::util::{format_number_with_commas, Result},
};


const REQUIRED_FIELDS: [Field; 4] = [
    Field::Chromosome,
    Field::Position,
    Field::Allele1,
    Field::Allele2,
];

/// Row counts of one annotate run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnnotateSummary {
    pub rows: usize,
    pub undecodable: usize,
    pub qc_failed: usize,
    pub unmatchable: usize,
    pub matched: usize,
    pub duplicates_removed: usize,
    pub written_matched: usize,
    pub written_unmatched: usize,
}

pub fn annotate(args: AnnotateArgs) -> Result<()> {
    let summary = run_annotate(&args)?;
    log::info!(
        "Summary: {} rows loaded, {} not valid UTF-8, {} failed QC, {} unmatchable, {} matched, {} duplicates removed",
        format_number_with_commas(summary.rows),
        format_number_with_commas(summary.undecodable),
        format_number_with_commas(summary.qc_failed),
        format_number_with_commas(summary.unmatchable),
        format_number_with_commas(summary.matched),
        format_number_with_commas(summary.duplicates_removed)
    );
    Ok(())
}

pub(crate) fn run_annotate(args: &AnnotateArgs) -> Result<AnnotateSummary> {
    let common = &args.common;
    let names = args.columns.names();

    let table = SummaryTable::load(&common.gwas_summary)?;
    let columns = table.resolve_columns(&names, &REQUIRED_FIELDS)?;
    let locus_columns = LocusColumns::from_column_map(&columns)?;
    let renderer = RowRenderer::new(common.format, &columns, columns.get(Field::Identifier))?;
    let paths = OutputPaths::from_output(&common.out);

    let mut reference = ReferenceStream::open(
        &args.reference.dbsnp,
        &args.reference.names(),
        common.num_threads > 1,
    )?;
    log::info!("Matching against {}", reference.path.display());

    let pool = build_thread_pool(common.num_threads, "annotate")?;
    let (mut qc, records) = pool.install(|| {
        let qc = QcFilter::new(&columns, common.maf).run(&table.lines);
        let records = build_input_records(&table.lines, &locus_columns);
        (qc, records)
    });
    qc.exclude(table.undecodable_rows());

    let layout = reference.layout;
    let outcome = merge_join(
        &records,
        &qc.keep,
        table.lines.len(),
        &layout,
        reference.source(),
    )?;
    // Releases the prefetch thread when the merge stopped early.
    drop(reference);

    let mut keep = qc.keep;
    let duplicates_removed = if common.remove_dup_snp {
        remove_duplicates(
            &table.lines,
            &outcome.ids,
            &mut keep,
            columns.get(Field::PValue),
        )
    } else {
        0
    };

    let route = route_rows(
        &table.lines,
        &table.undecodable,
        &outcome.ids,
        &keep,
        &renderer,
        &renderer.header(&table.header, names.name(Field::Identifier)),
        &table.header_line(),
        &paths,
    )?;

    Ok(AnnotateSummary {
        rows: table.lines.len(),
        undecodable: table.undecodable.len(),
        qc_failed: qc.n_failed,
        unmatchable: table.lines.len() - table.undecodable.len() - records.len(),
        matched: outcome.stats.matched_rows,
        duplicates_removed,
        written_matched: route.matched,
        written_unmatched: route.unmatched,
    })
}
