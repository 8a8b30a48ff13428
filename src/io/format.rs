//! Fixed downstream column layouts.
//!
//! Every named layout is plain data: an ordered list of output column
//! headers, each bound to the [`Field`] it is rendered from. The `gwas`
//! layout has no fixed columns; it keeps the input columns as they are.

use crate::{
    core::{
        field::{ColumnMap, Field},
        scanner::ColumnScanner,
    },
    error::RsidxError,
    utils::util::Result,
};
use clap::ValueEnum;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Input columns plus the identifier column
    Gwas,
    /// GCTA-COJO: SNP A1 A2 freq b se p N
    Cojo,
    /// Popcorn: SNP A1 A2 freq beta SE N
    Popcorn,
    /// MR-MEGA: SNP A1 A2 FREQ BETA SE P N
    Mrmega,
}

impl OutputFormat {
    pub fn name(self) -> &'static str {
        match self {
            OutputFormat::Gwas => "gwas",
            OutputFormat::Cojo => "cojo",
            OutputFormat::Popcorn => "popcorn",
            OutputFormat::Mrmega => "mrmega",
        }
    }

    /// The fixed layout, `None` for the passthrough `gwas` format.
    pub fn spec(self) -> Option<&'static FormatSpec> {
        match self {
            OutputFormat::Gwas => None,
            OutputFormat::Cojo => Some(&COJO),
            OutputFormat::Popcorn => Some(&POPCORN),
            OutputFormat::Mrmega => Some(&MRMEGA),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct FormatSpec {
    pub name: &'static str,
    pub columns: &'static [(&'static str, Field)],
}

static COJO: FormatSpec = FormatSpec {
    name: "cojo",
    columns: &[
        ("SNP", Field::Identifier),
        ("A1", Field::Allele1),
        ("A2", Field::Allele2),
        ("freq", Field::Freq),
        ("b", Field::Beta),
        ("se", Field::Se),
        ("p", Field::PValue),
        ("N", Field::SampleSize),
    ],
};

static POPCORN: FormatSpec = FormatSpec {
    name: "popcorn",
    columns: &[
        ("SNP", Field::Identifier),
        ("A1", Field::Allele1),
        ("A2", Field::Allele2),
        ("freq", Field::Freq),
        ("beta", Field::Beta),
        ("SE", Field::Se),
        ("N", Field::SampleSize),
    ],
};

static MRMEGA: FormatSpec = FormatSpec {
    name: "mrmega",
    columns: &[
        ("SNP", Field::Identifier),
        ("A1", Field::Allele1),
        ("A2", Field::Allele2),
        ("FREQ", Field::Freq),
        ("BETA", Field::Beta),
        ("SE", Field::Se),
        ("P", Field::PValue),
        ("N", Field::SampleSize),
    ],
};

impl FormatSpec {
    pub fn header(&self) -> String {
        self.columns
            .iter()
            .map(|(name, _)| *name)
            .collect::<Vec<_>>()
            .join("\t")
    }

    pub fn fields(&self) -> impl Iterator<Item = Field> + '_ {
        self.columns.iter().map(|&(_, field)| field)
    }
}

/// Renders input lines into a [`FormatSpec`] layout.
///
/// The identifier is supplied by the caller; every other field is read from
/// its input column.
#[derive(Debug, Clone)]
pub struct LineFormatter {
    spec: &'static FormatSpec,
    scanner: ColumnScanner,
    // Per output column: scanner slot, or None for the identifier.
    slots: Vec<Option<usize>>,
}

impl LineFormatter {
    /// Fails with [`RsidxError::MissingFormatField`] when a rendered field has
    /// no input column.
    pub fn new(spec: &'static FormatSpec, columns: &ColumnMap) -> Result<Self> {
        let mut source_columns = Vec::new();
        let mut slots = Vec::with_capacity(spec.columns.len());
        for field in spec.fields() {
            if field == Field::Identifier {
                slots.push(None);
                continue;
            }
            let column = columns
                .get(field)
                .ok_or(RsidxError::MissingFormatField {
                    format: spec.name,
                    field: field.label(),
                })?;
            slots.push(Some(source_columns.len()));
            source_columns.push(column);
        }
        Ok(Self {
            spec,
            scanner: ColumnScanner::new(&source_columns),
            slots,
        })
    }

    pub fn spec(&self) -> &'static FormatSpec {
        self.spec
    }

    /// `None` when the line is too short to hold every rendered column.
    pub fn render(&self, line: &str, id: &str) -> Option<String> {
        let mut values = vec![""; self.scanner.n_slots()];
        if !self.scanner.scan_complete(line, &mut values) {
            return None;
        }
        let rendered: Vec<&str> = self
            .slots
            .iter()
            .map(|slot| match slot {
                Some(slot) => values[*slot],
                None => id,
            })
            .collect();
        Some(rendered.join("\t"))
    }
}
