use crate::{
    constants::{GZIP_SUFFIX, UNMATCHED_SUFFIX},
    utils::util::Result,
};
use flate2::{write::GzEncoder, Compression};
use std::{
    fs::File,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputCompression {
    Plain,
    Gzip,
}

impl OutputCompression {
    pub fn from_path(path: &Path) -> Self {
        if path.to_string_lossy().to_lowercase().ends_with(GZIP_SUFFIX) {
            Self::Gzip
        } else {
            Self::Plain
        }
    }
}

/// Line-oriented writer, gzip-compressed when the path ends in `.gz`.
///
/// [`finish`](Self::finish) must be called to flush buffers and write the
/// gzip trailer.
pub enum TextWriter {
    Plain(BufWriter<File>),
    Gzip(GzEncoder<BufWriter<File>>),
}

impl TextWriter {
    pub fn create(path: &Path) -> Result<Self> {
        let file = File::create(path).map_err(|error| {
            crate::rsidx_error!("Failed to create output file {}: {error}", path.display())
        })?;
        let inner = BufWriter::new(file);
        let writer = match OutputCompression::from_path(path) {
            OutputCompression::Plain => Self::Plain(inner),
            OutputCompression::Gzip => Self::Gzip(GzEncoder::new(inner, Compression::default())),
        };
        log::debug!("Writer: opened {}", path.display());
        Ok(writer)
    }

    pub fn write_line(&mut self, line: &str) -> Result<()> {
        self.write_raw_line(line.as_bytes())
    }

    /// Writes `line` as it is, for rows that are not valid UTF-8.
    pub fn write_raw_line(&mut self, line: &[u8]) -> Result<()> {
        let out: &mut dyn Write = match self {
            Self::Plain(writer) => writer,
            Self::Gzip(writer) => writer,
        };
        out.write_all(line)?;
        out.write_all(b"\n")?;
        Ok(())
    }

    pub fn finish(self) -> Result<()> {
        match self {
            Self::Plain(mut writer) => writer.flush()?,
            Self::Gzip(encoder) => encoder.finish()?.flush()?,
        }
        Ok(())
    }
}

/// Destination of the matched and unmatched sinks.
///
/// `out.txt` pairs with `out.txt.unmatch`; `out.txt.gz` pairs with
/// `out.txt.unmatch.gz`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    pub matched: PathBuf,
    pub unmatched: PathBuf,
}

impl OutputPaths {
    pub fn from_output(output: &str) -> Self {
        let unmatched = match output.strip_suffix(GZIP_SUFFIX) {
            Some(base) if !base.is_empty() => format!("{base}{UNMATCHED_SUFFIX}{GZIP_SUFFIX}"),
            _ => format!("{output}{UNMATCHED_SUFFIX}"),
        };
        Self {
            matched: PathBuf::from(output),
            unmatched: PathBuf::from(unmatched),
        }
    }
}
