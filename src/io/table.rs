use crate::{
    core::field::{ColumnMap, Field},
    error::RsidxError,
    io::readers::{open_text_reader, BufLineSource, LineSource},
    utils::util::{format_number_with_commas, Result},
};
use std::path::{Path, PathBuf};

/// Header names for each [`Field`] of the input table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnNames {
    names: [String; Field::COUNT],
}

impl ColumnNames {
    pub fn new(names: [String; Field::COUNT]) -> Self {
        Self { names }
    }

    pub fn name(&self, field: Field) -> &str {
        &self.names[field.index()]
    }
}

/// A summary statistics table held fully in memory: the split header plus
/// every non-empty data line, in file order, with line endings removed.
///
/// A data line that is not valid UTF-8 keeps its slot in `lines` as an empty
/// string, and its original bytes are kept in `undecodable` (sorted by row
/// index) so it can be written back verbatim.
#[derive(Debug, Clone)]
pub struct SummaryTable {
    pub path: PathBuf,
    pub header: Vec<String>,
    pub lines: Vec<String>,
    pub undecodable: Vec<(usize, Vec<u8>)>,
}

impl SummaryTable {
    pub fn load(path: &Path) -> Result<Self> {
        let mut source = BufLineSource::new(open_text_reader(path)?);
        let header = match source.next_line()? {
            Some(line) => split_header(&String::from_utf8_lossy(line)),
            None => {
                return Err(RsidxError::EmptyInput {
                    path: path.to_path_buf(),
                })
            }
        };

        let mut lines = Vec::new();
        let mut undecodable = Vec::new();
        while let Some(line) = source.next_line()? {
            match std::str::from_utf8(line) {
                Ok(text) => lines.push(text.to_owned()),
                Err(_) => {
                    undecodable.push((lines.len(), line.to_vec()));
                    lines.push(String::new());
                }
            }
        }
        log::info!(
            "Loaded {} data lines from {}",
            format_number_with_commas(lines.len()),
            path.display()
        );
        if !undecodable.is_empty() {
            log::warn!(
                "{} data lines in {} are not valid UTF-8 and will be left unmatched",
                format_number_with_commas(undecodable.len()),
                path.display()
            );
        }

        Ok(Self {
            path: path.to_path_buf(),
            header,
            lines,
            undecodable,
        })
    }

    pub fn undecodable_rows(&self) -> impl Iterator<Item = usize> + '_ {
        self.undecodable.iter().map(|(index, _)| *index)
    }

    pub fn header_line(&self) -> String {
        self.header.join("\t")
    }

    pub fn find_column(&self, name: &str) -> Option<usize> {
        find_column(&self.header, name)
    }

    /// Maps every field whose name appears in the header. Fields listed in
    /// `required` must be present.
    pub fn resolve_columns(&self, names: &ColumnNames, required: &[Field]) -> Result<ColumnMap> {
        let mut columns = ColumnMap::new();
        for field in Field::ALL {
            let name = names.name(field);
            let column = self.find_column(name);
            match column {
                Some(index) => log::debug!("Column '{}' ({}) at index {}", name, field, index),
                None if required.contains(&field) => {
                    return Err(RsidxError::MissingColumn {
                        column: name.to_string(),
                        path: self.path.clone(),
                    })
                }
                None => log::debug!("Optional column '{}' ({}) not present", name, field),
            }
            columns.set(field, column);
        }
        Ok(columns)
    }
}

pub fn split_header(line: &str) -> Vec<String> {
    line.split('\t').map(str::to_string).collect()
}

pub fn find_column(header: &[String], name: &str) -> Option<usize> {
    header.iter().position(|column| column == name)
}
