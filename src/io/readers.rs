use crate::{
    constants::GZIP_SUFFIX,
    error::RsidxError,
    utils::util::{trim_line_ending, Result},
};
use crossbeam_channel::{bounded, Receiver};
use flate2::read::MultiGzDecoder;
use std::{
    fs::File,
    io::{BufRead, BufReader, Read as ioRead},
    path::Path,
    thread::{self, JoinHandle},
};

pub type TextReader = BufReader<Box<dyn ioRead + Send>>;

pub fn is_gzipped(path: &Path) -> bool {
    let path_str = path.to_string_lossy().to_lowercase();
    path_str.ends_with(GZIP_SUFFIX)
}

/// Opens a text file, transparently decompressing it when the name ends in `.gz`.
pub fn open_text_reader(path: &Path) -> Result<TextReader> {
    let file = File::open(path)
        .map_err(|error| crate::rsidx_error!("Failed to open file {}: {error}", path.display()))?;
    if is_gzipped(path) {
        let gz_decoder = MultiGzDecoder::new(file);
        if gz_decoder.header().is_some() {
            Ok(BufReader::new(Box::new(gz_decoder)))
        } else {
            Err(RsidxError::InvalidGzipHeader {
                path: path.to_path_buf(),
            })
        }
    } else {
        Ok(BufReader::new(Box::new(file)))
    }
}

/// A forward-only stream of non-empty lines.
///
/// Lines are raw bytes: decoding is left to the consumer, so a line that is
/// not valid UTF-8 can be skipped on its own instead of ending the stream.
/// The returned slice borrows the source's internal buffer and is
/// invalidated by the next call.
pub trait LineSource {
    fn next_line(&mut self) -> Result<Option<&[u8]>>;
}

/// Line source over any [`BufRead`], reusing one buffer for every line.
/// Line endings (`\n`, `\r\n`) are removed and empty lines skipped.
pub struct BufLineSource<R> {
    reader: R,
    buffer: Vec<u8>,
}

impl<R: BufRead> BufLineSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buffer: Vec::new(),
        }
    }
}

impl<R: BufRead> LineSource for BufLineSource<R> {
    fn next_line(&mut self) -> Result<Option<&[u8]>> {
        loop {
            self.buffer.clear();
            if self.reader.read_until(b'\n', &mut self.buffer)? == 0 {
                return Ok(None);
            }
            trim_line_ending(&mut self.buffer);
            if !self.buffer.is_empty() {
                return Ok(Some(self.buffer.as_slice()));
            }
        }
    }
}

type Batch = Result<Vec<Vec<u8>>>;

/// Reads a [`LineSource`] on a background thread and hands lines over in
/// fixed-size batches through a bounded channel, so at most
/// `batch_lines * (depth + 2)` lines are buffered at any time.
///
/// Dropping the source early disconnects the channel, which stops the
/// reader thread at its next send.
pub struct PrefetchLineSource {
    receiver: Option<Receiver<Batch>>,
    batch: Vec<Vec<u8>>,
    cursor: usize,
    handle: Option<JoinHandle<()>>,
}

impl PrefetchLineSource {
    pub fn spawn<S>(mut source: S, batch_lines: usize, depth: usize) -> Result<Self>
    where
        S: LineSource + Send + 'static,
    {
        let batch_lines = batch_lines.max(1);
        let (sender, receiver) = bounded::<Batch>(depth.max(1));
        let handle = thread::Builder::new()
            .name("rsidx-prefetch".to_string())
            .spawn(move || {
                log::debug!("Prefetch: reader thread started");
                loop {
                    let mut batch = Vec::with_capacity(batch_lines);
                    while batch.len() < batch_lines {
                        match source.next_line() {
                            Ok(Some(line)) => batch.push(line.to_owned()),
                            Ok(None) => break,
                            Err(error) => {
                                let _ = sender.send(Err(error));
                                return;
                            }
                        }
                    }
                    let exhausted = batch.len() < batch_lines;
                    if !batch.is_empty() && sender.send(Ok(batch)).is_err() {
                        log::debug!("Prefetch: consumer closed the stream early");
                        return;
                    }
                    if exhausted {
                        log::debug!("Prefetch: reached end of input");
                        return;
                    }
                }
            })
            .map_err(|error| crate::rsidx_error!("Failed to spawn prefetch thread: {error}"))?;

        Ok(Self {
            receiver: Some(receiver),
            batch: Vec::new(),
            cursor: 0,
            handle: Some(handle),
        })
    }
}

impl LineSource for PrefetchLineSource {
    fn next_line(&mut self) -> Result<Option<&[u8]>> {
        loop {
            if self.cursor < self.batch.len() {
                let index = self.cursor;
                self.cursor += 1;
                return Ok(Some(self.batch[index].as_slice()));
            }
            let Some(receiver) = self.receiver.as_ref() else {
                return Ok(None);
            };
            match receiver.recv() {
                Ok(Ok(batch)) => {
                    self.batch = batch;
                    self.cursor = 0;
                }
                Ok(Err(error)) => return Err(error),
                Err(_) => {
                    self.receiver = None;
                    return Ok(None);
                }
            }
        }
    }
}

impl Drop for PrefetchLineSource {
    fn drop(&mut self) {
        // Disconnect first so a reader blocked on a full channel can exit.
        self.receiver.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::error!("Prefetch reader thread panicked");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::{write::GzEncoder, Compression};
    use std::io::Write;
    use tempfile::tempdir;

    fn collect_lines(source: &mut dyn LineSource) -> Vec<String> {
        let mut lines = Vec::new();
        while let Some(line) = source.next_line().expect("line should be readable") {
            lines.push(String::from_utf8_lossy(line).into_owned());
        }
        lines
    }

    #[test]
    fn buf_line_source_strips_line_endings_and_skips_empty_lines() {
        let mut source = BufLineSource::new("a\tb\r\n\nc\td\n\r\ne\tf".as_bytes());
        assert_eq!(collect_lines(&mut source), vec!["a\tb", "c\td", "e\tf"]);
    }

    #[test]
    fn buf_line_source_passes_undecodable_bytes_through() {
        let mut source = BufLineSource::new(&b"rs1\tcaf\xe9\nrs2\tok\n"[..]);
        assert_eq!(source.next_line().unwrap(), Some(&b"rs1\tcaf\xe9"[..]));
        assert_eq!(source.next_line().unwrap(), Some(&b"rs2\tok"[..]));
        assert_eq!(source.next_line().unwrap(), None);
    }

    #[test]
    fn is_gzipped_only_accepts_gz_suffix() {
        assert!(is_gzipped(Path::new("a/table.txt.gz")));
        assert!(is_gzipped(Path::new("TABLE.TXT.GZ")));
        assert!(!is_gzipped(Path::new("table.txt.gzip")));
        assert!(!is_gzipped(Path::new("table.txt")));
    }

    #[test]
    fn open_text_reader_reads_plain_and_gzip_files() {
        let temp_dir = tempdir().expect("temp dir should be created");

        let plain_path = temp_dir.path().join("table.txt");
        std::fs::write(&plain_path, "CHR\tPOS\n1\t100\n").unwrap();

        let gz_path = temp_dir.path().join("table.txt.gz");
        let mut encoder = GzEncoder::new(File::create(&gz_path).unwrap(), Compression::default());
        encoder.write_all(b"CHR\tPOS\n1\t100\n").unwrap();
        encoder.finish().unwrap();

        for path in [plain_path, gz_path] {
            let mut source = BufLineSource::new(open_text_reader(&path).unwrap());
            assert_eq!(collect_lines(&mut source), vec!["CHR\tPOS", "1\t100"]);
        }
    }

    #[test]
    fn open_text_reader_rejects_non_gzip_content_with_gz_name() {
        let temp_dir = tempdir().expect("temp dir should be created");
        let path = temp_dir.path().join("fake.txt.gz");
        std::fs::write(&path, "not gzip at all").unwrap();
        assert!(matches!(
            open_text_reader(&path),
            Err(RsidxError::InvalidGzipHeader { .. })
        ));
    }

    #[test]
    fn open_text_reader_reports_missing_files() {
        let temp_dir = tempdir().expect("temp dir should be created");
        assert!(open_text_reader(&temp_dir.path().join("missing.txt")).is_err());
    }

    #[test]
    fn prefetch_line_source_yields_lines_in_order_across_batches() {
        let text: String = (0..25).map(|i| format!("line{i}\n")).collect();
        let inner = BufLineSource::new(std::io::Cursor::new(text.into_bytes()));
        let mut source = PrefetchLineSource::spawn(inner, 4, 2).unwrap();
        let lines = collect_lines(&mut source);
        let expected: Vec<String> = (0..25).map(|i| format!("line{i}")).collect();
        assert_eq!(lines, expected);
        assert!(source.next_line().unwrap().is_none());
    }

    #[test]
    fn prefetch_line_source_can_be_dropped_before_exhaustion() {
        let text: String = (0..10_000).map(|i| format!("line{i}\n")).collect();
        let inner = BufLineSource::new(std::io::Cursor::new(text.into_bytes()));
        let mut source = PrefetchLineSource::spawn(inner, 8, 1).unwrap();
        assert_eq!(source.next_line().unwrap(), Some(&b"line0"[..]));
        drop(source);
    }
}
