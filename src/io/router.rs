use crate::{
    core::field::ColumnMap,
    io::{
        format::{LineFormatter, OutputFormat},
        writers::{OutputPaths, TextWriter},
    },
    utils::util::{format_number_with_commas, Result},
};

/// How a kept row is written to the matched sink.
#[derive(Debug, Clone)]
pub enum RowRenderer {
    /// Input columns as they are, with the identifier written into
    /// `id_column` or appended when the input has no such column.
    Passthrough { id_column: Option<usize> },
    Formatted(LineFormatter),
}

impl RowRenderer {
    pub fn new(format: OutputFormat, columns: &ColumnMap, id_column: Option<usize>) -> Result<Self> {
        match format.spec() {
            None => Ok(Self::Passthrough { id_column }),
            Some(spec) => Ok(Self::Formatted(LineFormatter::new(spec, columns)?)),
        }
    }

    pub fn header(&self, input_header: &[String], id_name: &str) -> String {
        match self {
            Self::Passthrough { id_column } => {
                let mut header = input_header.to_vec();
                match id_column {
                    Some(column) if *column < header.len() => header[*column] = id_name.to_string(),
                    _ => header.push(id_name.to_string()),
                }
                header.join("\t")
            }
            Self::Formatted(formatter) => formatter.spec().header(),
        }
    }

    /// `None` when the line lacks a column the layout needs.
    pub fn render(&self, line: &str, id: &str) -> Option<String> {
        match self {
            Self::Passthrough { id_column } => Some(replace_or_append(line, *id_column, id)),
            Self::Formatted(formatter) => formatter.render(line, id),
        }
    }
}

fn replace_or_append(line: &str, column: Option<usize>, value: &str) -> String {
    if let Some(column) = column {
        let mut fields: Vec<&str> = line.split('\t').collect();
        if column < fields.len() {
            fields[column] = value;
            return fields.join("\t");
        }
    }
    let mut out = String::with_capacity(line.len() + value.len() + 1);
    out.push_str(line);
    out.push('\t');
    out.push_str(value);
    out
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RouteSummary {
    pub matched: usize,
    pub unmatched: usize,
}

/// Writes every row, in input order, to the matched sink when it is kept
/// and has an identifier, and verbatim to the unmatched sink otherwise.
/// Both sinks start with a header line.
///
/// `raw_rows` holds the original bytes of rows that are not valid UTF-8,
/// sorted by row index. Those rows are written from there instead of from
/// `lines`.
#[allow(clippy::too_many_arguments)]
pub fn route_rows(
    lines: &[String],
    raw_rows: &[(usize, Vec<u8>)],
    ids: &[Option<String>],
    keep: &[bool],
    renderer: &RowRenderer,
    matched_header: &str,
    unmatched_header: &str,
    paths: &OutputPaths,
) -> Result<RouteSummary> {
    let mut matched_writer = TextWriter::create(&paths.matched)?;
    let mut unmatched_writer = TextWriter::create(&paths.unmatched)?;
    matched_writer.write_line(matched_header)?;
    unmatched_writer.write_line(unmatched_header)?;

    let mut summary = RouteSummary::default();
    let mut raw_rows = raw_rows.iter().peekable();
    for (index, line) in lines.iter().enumerate() {
        let raw = raw_rows.next_if(|(raw_index, _)| *raw_index == index);
        let rendered = match (&ids[index], keep[index]) {
            (Some(id), true) => renderer.render(line, id),
            _ => None,
        };
        match rendered {
            Some(row) => {
                matched_writer.write_line(&row)?;
                summary.matched += 1;
            }
            None => {
                match raw {
                    Some((_, bytes)) => unmatched_writer.write_raw_line(bytes)?,
                    None => unmatched_writer.write_line(line)?,
                }
                summary.unmatched += 1;
            }
        }
    }

    matched_writer.finish()?;
    unmatched_writer.finish()?;
    log::info!(
        "Wrote {} matched rows to {}",
        format_number_with_commas(summary.matched),
        paths.matched.display()
    );
    log::info!(
        "Wrote {} unmatched rows to {}",
        format_number_with_commas(summary.unmatched),
        paths.unmatched.display()
    );
    Ok(summary)
}
