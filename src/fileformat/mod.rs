pub mod paired_fastq;

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use log::{debug, warn};
use seq_io::fastq::Reader as FastqReader;

use crate::runtime::Error;

pub use paired_fastq::{FastqBlock, PairedFastqReader};

const FASTQ_SUFFIXES: [&str; 8] = [
    ".fq", ".fastq", ".fq.gz", ".fastq.gz", ".fq.bz2", ".fastq.bz2", ".fq.zst", ".fastq.zst",
];

// niffler sniffs this many bytes of magic before picking a decoder
const COMPRESSION_MAGIC_LEN: u64 = 5;

///////////////////////////////
/// Open a file, transparently decompressing it if needed
pub fn open_decompressed<P: AsRef<Path>>(path: P) -> Result<Box<dyn Read>, Error> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::file_not_found(path)
        } else {
            Error::io(path, e)
        }
    })?;

    // Too short to carry any magic, so it can only be plain text
    let len = file.metadata().map_err(|e| Error::io(path, e))?.len();
    if len < COMPRESSION_MAGIC_LEN {
        debug!("File {} has only {} bytes, reading as plain text", path.display(), len);
        return Ok(Box::new(file));
    }

    let (reader, compression) = niffler::get_reader(Box::new(file))
        .map_err(|e| Error::file_not_valid(path, Some(e.to_string())))?;

    debug!(
        "Opened file {} with compression {:?}",
        path.display(),
        compression
    );
    Ok(reader)
}

///////////////////////////////
/// Open a text file line by line, decompressing as needed
pub fn open_text_reader<P: AsRef<Path>>(path: P) -> Result<Box<dyn BufRead>, Error> {
    Ok(Box::new(BufReader::new(open_decompressed(path)?)))
}

///////////////////////////////
/// Open a FASTQ file, decompressing as needed
pub fn open_fastq<P: AsRef<Path>>(path: P) -> Result<FastqReader<Box<dyn Read>>, Error> {
    Ok(FastqReader::new(open_decompressed(path)?))
}

///////////////////////////////
/// Check that the specified file looks like a FASTQ file and can be opened
pub fn verify_input_fq_file<P: AsRef<Path>>(path_in: P) -> Result<(), Error> {
    let path_in = path_in.as_ref();
    let file = File::open(path_in).map_err(|_| Error::file_not_found(path_in))?;
    let len = file.metadata().map_err(|e| Error::io(path_in, e))?.len();
    if len == 0 {
        warn!("Input file {} is empty", path_in.display());
    }

    let filename = path_in
        .file_name()
        .map(|f| f.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    if FASTQ_SUFFIXES.iter().any(|s| filename.ends_with(s)) {
        Ok(())
    } else {
        Err(Error::file_not_valid(
            path_in,
            Some("input file must be a fastq file"),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};

    #[test]
    fn test_verify_input_fq_file() {
        let dir = tempfile::tempdir().unwrap();

        let good = dir.path().join("lane1_R1.fastq.gz");
        File::create(&good).unwrap();
        assert!(verify_input_fq_file(&good).is_ok());

        let bad = dir.path().join("lane1_R1.bam");
        File::create(&bad).unwrap();
        assert!(matches!(
            verify_input_fq_file(&bad),
            Err(Error::FileNotValid { .. })
        ));

        assert!(matches!(
            verify_input_fq_file(dir.path().join("missing.fq")),
            Err(Error::FileNotFound { .. })
        ));
    }

    #[test]
    fn test_open_gzip_transparently() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reads.fq.gz");
        let mut enc = flate2::write::GzEncoder::new(
            File::create(&path).unwrap(),
            flate2::Compression::default(),
        );
        enc.write_all(b"@a\nACGT\n+\nIIII\n").unwrap();
        enc.finish().unwrap();

        let mut text = String::new();
        open_text_reader(&path)
            .unwrap()
            .read_to_string(&mut text)
            .unwrap();
        assert_eq!(text, "@a\nACGT\n+\nIIII\n");
    }

    #[test]
    fn test_open_file_shorter_than_magic() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stub.fq");
        std::fs::write(&path, "@a\n").unwrap();

        let mut text = String::new();
        open_text_reader(&path)
            .unwrap()
            .read_to_string(&mut text)
            .unwrap();
        assert_eq!(text, "@a\n");

        let empty = dir.path().join("empty.fq");
        File::create(&empty).unwrap();
        assert!(open_fastq(&empty).unwrap().next().is_none());
    }
}
