use crate::{
    constants::{REFERENCE_BATCH_LINES, REFERENCE_PREFETCH_DEPTH},
    core::matcher::{LocusColumns, ReferenceLayout},
    error::RsidxError,
    io::{
        readers::{open_text_reader, BufLineSource, LineSource, PrefetchLineSource},
        table::{find_column, split_header},
    },
    utils::util::Result,
};
use std::path::{Path, PathBuf};

/// Header names of the reference columns, used unless the reference is a `.bim` file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceColumnNames {
    pub chr: String,
    pub pos: String,
    pub a1: String,
    pub a2: String,
    pub id: String,
}

pub fn is_bim(path: &Path) -> bool {
    let path_str = path.to_string_lossy().to_lowercase();
    path_str.ends_with(".bim") || path_str.ends_with(".bim.gz")
}

/// An opened reference database positioned at its first data line.
pub struct ReferenceStream {
    pub path: PathBuf,
    pub layout: ReferenceLayout,
    source: Box<dyn LineSource + Send>,
}

impl ReferenceStream {
    /// Opens `path`, resolving the column layout from the header or from the
    /// fixed `.bim` layout. With `prefetch` the file is read and decompressed
    /// on a background thread.
    pub fn open(path: &Path, names: &ReferenceColumnNames, prefetch: bool) -> Result<Self> {
        let mut source = BufLineSource::new(open_text_reader(path)?);

        let layout = if is_bim(path) {
            log::debug!("Reference {} uses the fixed .bim layout", path.display());
            ReferenceLayout::BIM
        } else {
            let header = match source.next_line()? {
                Some(line) => split_header(&String::from_utf8_lossy(line)),
                None => {
                    return Err(RsidxError::EmptyInput {
                        path: path.to_path_buf(),
                    })
                }
            };
            resolve_layout(&header, names, path)?
        };
        log::debug!("Reference layout: {:?}", layout);

        let source: Box<dyn LineSource + Send> = if prefetch {
            Box::new(PrefetchLineSource::spawn(
                source,
                REFERENCE_BATCH_LINES,
                REFERENCE_PREFETCH_DEPTH,
            )?)
        } else {
            Box::new(source)
        };

        Ok(Self {
            path: path.to_path_buf(),
            layout,
            source,
        })
    }

    pub fn source(&mut self) -> &mut dyn LineSource {
        self.source.as_mut()
    }
}

fn resolve_layout(
    header: &[String],
    names: &ReferenceColumnNames,
    path: &Path,
) -> Result<ReferenceLayout> {
    let column = |name: &str| {
        find_column(header, name).ok_or_else(|| RsidxError::MissingColumn {
            column: name.to_string(),
            path: path.to_path_buf(),
        })
    };
    Ok(ReferenceLayout {
        locus: LocusColumns {
            chr: column(&names.chr)?,
            pos: column(&names.pos)?,
            a1: column(&names.a1)?,
            a2: column(&names.a2)?,
        },
        id: column(&names.id)?,
    })
}
