use std::io::Read;
use std::path::{Path, PathBuf};

use log::debug;
use seq_io::fastq::Error as FastqError;
use seq_io::fastq::Reader as FastqReader;
use seq_io::fastq::Record as FastqRecord;
use seq_io::fastq::RefRecord;

use super::open_fastq;
use crate::runtime::Error;

///////////////////////////////
/// One 4-line FASTQ record, kept as the raw text lines (without the line
/// terminator) so it can be written back out unchanged
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FastqBlock {
    pub lines: [String; 4],
}

impl FastqBlock {
    pub fn id(&self) -> &str {
        &self.lines[0]
    }

    pub fn seq(&self) -> &str {
        &self.lines[1]
    }

    pub fn into_lines(self) -> [String; 4] {
        self.lines
    }

    fn from_record(record: &RefRecord, path: &Path) -> Result<FastqBlock, Error> {
        let mut raw = Vec::new();
        record
            .write_unchanged(&mut raw)
            .map_err(|e| Error::io(path, e))?;
        let raw_text = String::from_utf8_lossy(&raw);
        let text = raw_text.strip_suffix('\n').unwrap_or(raw_text.as_ref());

        let mut lines: Vec<String> = text
            .split('\n')
            .map(|l| l.trim_end_matches('\r').to_string())
            .collect();
        // last record of a file without final newline and with empty quality
        if lines.len() == 3 && record.qual().is_empty() {
            lines.push(String::new());
        }

        let lines: [String; 4] = lines.try_into().map_err(|l: Vec<String>| {
            Error::parse_error(
                format!("fastq record in {}", path.display()),
                Some(format!("expected 4 lines, found {}", l.len())),
            )
        })?;
        Ok(FastqBlock { lines })
    }
}

impl std::fmt::Display for FastqBlock {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "({}, {})", self.lines[0], self.lines[1])
    }
}

///////////////////////////////
/// Reads two FASTQ streams in lock-step. A truncated record in either stream
/// is the normal end of input, not an error
pub struct PairedFastqReader<R1: Read, R2: Read> {
    r1: FastqReader<R1>,
    r2: FastqReader<R2>,
    path_r1: PathBuf,
    path_r2: PathBuf,
    n_pairs: u64,
}

impl PairedFastqReader<Box<dyn Read>, Box<dyn Read>> {
    pub fn from_paths<P: AsRef<Path>>(path_r1: P, path_r2: P) -> Result<Self, Error> {
        Ok(PairedFastqReader {
            r1: open_fastq(&path_r1)?,
            r2: open_fastq(&path_r2)?,
            path_r1: path_r1.as_ref().to_path_buf(),
            path_r2: path_r2.as_ref().to_path_buf(),
            n_pairs: 0,
        })
    }
}

impl<R1: Read, R2: Read> PairedFastqReader<R1, R2> {
    pub fn new(r1: R1, r2: R2) -> Self {
        PairedFastqReader {
            r1: FastqReader::new(r1),
            r2: FastqReader::new(r2),
            path_r1: PathBuf::from("<r1>"),
            path_r2: PathBuf::from("<r2>"),
            n_pairs: 0,
        }
    }

    /// Number of complete pairs returned so far
    pub fn pairs_read(&self) -> u64 {
        self.n_pairs
    }

    pub fn next_pair(&mut self) -> Result<Option<(FastqBlock, FastqBlock)>, Error> {
        let n_pairs = self.n_pairs;
        let Some(b1) = next_block(&mut self.r1, &self.path_r1, n_pairs)? else {
            return Ok(None);
        };
        let Some(b2) = next_block(&mut self.r2, &self.path_r2, n_pairs)? else {
            return Ok(None);
        };
        self.n_pairs += 1;
        Ok(Some((b1, b2)))
    }
}

impl<R1: Read, R2: Read> Iterator for PairedFastqReader<R1, R2> {
    type Item = Result<(FastqBlock, FastqBlock), Error>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_pair().transpose()
    }
}

fn next_block<R: Read>(
    reader: &mut FastqReader<R>,
    path: &Path,
    n_pairs: u64,
) -> Result<Option<FastqBlock>, Error> {
    match reader.next() {
        None => {
            debug!("{} exhausted after {} pairs", path.display(), n_pairs);
            Ok(None)
        }
        Some(Err(FastqError::UnexpectedEnd { .. })) => {
            debug!(
                "{} ends in a truncated record after {} pairs",
                path.display(),
                n_pairs
            );
            Ok(None)
        }
        Some(Err(FastqError::Io(e))) => Err(Error::io(path, e)),
        Some(Err(e)) => Err(Error::parse_error(
            format!("fastq record {} in {}", n_pairs + 1, path.display()),
            Some(e.to_string()),
        )),
        Some(Ok(record)) => FastqBlock::from_record(&record, path).map(Some),
    }
}
