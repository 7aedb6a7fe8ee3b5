//! Building a barcode index from a plain text barcode list.

use std::io::BufRead;
use std::path::Path;

use log::{debug, info};
use regex::Regex;

use crate::bktree::{BkTree, Hamming};
use crate::fileformat::open_text_reader;
use crate::runtime::Error;

/// Capture group used for oligo sheets that prefix each barcode with a
/// six-base random stretch
pub const DEFAULT_BARCODE_PATTERN: &str = r"NNNNNN(\w{6})";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DictionaryFormat {
    /// One barcode per line
    Simple,
    /// Barcode is the first capture group of a regex matched against each line
    Pattern,
}

impl std::str::FromStr for DictionaryFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "simple" => Ok(DictionaryFormat::Simple),
            "pattern" | "complex" => Ok(DictionaryFormat::Pattern),
            _ => Err(format!("Invalid dictionary format: {}", s)),
        }
    }
}

///////////////////////////////
/// Pulls barcodes out of text lines according to the dictionary format
pub struct BarcodeExtractor {
    pattern: Option<Regex>,
}

impl BarcodeExtractor {
    pub fn simple() -> BarcodeExtractor {
        BarcodeExtractor { pattern: None }
    }

    pub fn with_pattern(pattern: &str) -> Result<BarcodeExtractor, Error> {
        let re = Regex::new(pattern)
            .map_err(|e| Error::parse_error(format!("barcode pattern {:?}", pattern), Some(e.to_string())))?;
        if re.captures_len() < 2 {
            return Err(Error::config(format!(
                "barcode pattern {:?} has no capture group",
                pattern
            )));
        }
        Ok(BarcodeExtractor { pattern: Some(re) })
    }

    pub fn new(format: DictionaryFormat, pattern: &str) -> Result<BarcodeExtractor, Error> {
        match format {
            DictionaryFormat::Simple => Ok(BarcodeExtractor::simple()),
            DictionaryFormat::Pattern => BarcodeExtractor::with_pattern(pattern),
        }
    }

    /// None for lines that carry no barcode
    pub fn extract<'a>(&self, line: &'a str) -> Option<&'a str> {
        match &self.pattern {
            None => {
                let trimmed = line.trim();
                (!trimmed.is_empty()).then_some(trimmed)
            }
            Some(re) => re
                .captures(line)
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str()),
        }
    }
}

///////////////////////////////
/// Insert every barcode found in the reader into a new tree
pub fn read_dictionary<R: BufRead>(
    reader: R,
    extractor: &BarcodeExtractor,
) -> Result<BkTree<String, Hamming>, Error> {
    let mut tree = BkTree::new(Hamming);
    let mut skipped = 0usize;
    for line in reader.lines() {
        let line = line.map_err(|e| Error::parse_error("dictionary line", Some(e.to_string())))?;
        match extractor.extract(&line) {
            Some(barcode) => {
                tree.insert(barcode.to_string())?;
            }
            None => skipped += 1,
        }
    }
    if skipped > 0 {
        debug!("Skipped {} dictionary lines without a barcode", skipped);
    }
    Ok(tree)
}

pub fn load_dictionary<P: AsRef<Path>>(
    path: P,
    extractor: &BarcodeExtractor,
) -> Result<BkTree<String, Hamming>, Error> {
    let path = path.as_ref();
    let tree = read_dictionary(open_text_reader(path)?, extractor)?;
    info!("Loaded {} entries from {}", tree.len(), path.display());
    Ok(tree)
}
