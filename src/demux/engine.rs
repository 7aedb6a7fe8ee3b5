use std::io::Read;

use log::{debug, info};

use super::summary::RunSummary;
use super::writer::BatchWriter;
use crate::bktree::{BkTree, Hamming, Metric};
use crate::fileformat::{FastqBlock, PairedFastqReader};
use crate::runtime::Error;

pub const AMBIGUOUS_LABEL: &str = "ambiguous";
pub const NO_MATCH_LABEL: &str = "no_match";
pub const UMI_SEPARATOR: char = ':';

const PROGRESS_EVERY: u64 = 1_000_000;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Label {
    Matched(String),
    Ambiguous,
    NoMatch,
}

impl Label {
    pub fn as_str(&self) -> &str {
        match self {
            Label::Matched(bc) => bc,
            Label::Ambiguous => AMBIGUOUS_LABEL,
            Label::NoMatch => NO_MATCH_LABEL,
        }
    }
}

impl std::fmt::Display for Label {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

///////////////////////////////
/// Outcome for one observed barcode. `distance` is the smallest distance
/// among the hits, or None when nothing was within the cutoff
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub label: Label,
    pub distance: Option<usize>,
}

///////////////////////////////
/// Where a read pair without any hit is counted in the distance histogram
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NoMatchBin {
    /// Counted at the cutoff value itself
    #[default]
    Cutoff,
    /// Not counted
    Skip,
}

impl std::str::FromStr for NoMatchBin {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cutoff" => Ok(NoMatchBin::Cutoff),
            "skip" | "none" => Ok(NoMatchBin::Skip),
            _ => Err(format!("Invalid no-match histogram bin: {}", s)),
        }
    }
}

///////////////////////////////
/// Fixed `[start, start + len)` byte window of a read sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub start: usize,
    pub len: usize,
}

impl Window {
    pub fn new(start: usize, len: usize) -> Window {
        Window { start, len }
    }

    /// None if the window reaches past `usize::MAX`
    pub fn checked_end(&self) -> Option<usize> {
        self.start.checked_add(self.len)
    }

    pub fn end(&self) -> usize {
        self.start.saturating_add(self.len)
    }

    pub fn extract<'a>(&self, seq: &'a str) -> Option<&'a str> {
        seq.get(self.start..self.checked_end()?)
    }
}

#[derive(Debug, Clone)]
pub struct DemuxParams {
    pub barcode: Window,
    /// None disables UMI extraction
    pub umi: Option<Window>,
    pub cutoff: usize,
    pub no_match_bin: NoMatchBin,
}

pub struct DemuxEngine {
    tree: BkTree<String, Hamming>,
    params: DemuxParams,
}

impl DemuxEngine {
    ///////////////////////////////
    /// Fails if the dictionary barcodes cannot be compared with the
    /// configured barcode window
    pub fn new(tree: BkTree<String, Hamming>, params: DemuxParams) -> Result<DemuxEngine, Error> {
        if params.barcode.len == 0 {
            return Err(Error::config("barcode length must be greater than zero"));
        }
        for (name, window) in [("barcode", Some(params.barcode)), ("UMI", params.umi)] {
            if let Some(window) = window {
                if window.checked_end().is_none() {
                    return Err(Error::config(format!(
                        "{} window start {} plus size {} overflows",
                        name, window.start, window.len
                    )));
                }
            }
        }
        if let Some(root) = tree.root() {
            let dict_len = root.value().len();
            if dict_len != params.barcode.len {
                return Err(Error::config(format!(
                    "dictionary barcodes are {} bases long but the barcode window is {} bases",
                    dict_len, params.barcode.len
                )));
            }
        }
        Ok(DemuxEngine { tree, params })
    }

    pub fn params(&self) -> &DemuxParams {
        &self.params
    }

    pub fn tree(&self) -> &BkTree<String, Hamming> {
        &self.tree
    }

    ///////////////////////////////
    /// Resolve an observed barcode against the dictionary. A unique closest
    /// hit is a match; a tie at the closest distance is ambiguous
    pub fn classify(&self, barcode: &str) -> Result<Classification, Error> {
        let target = barcode.to_string();
        let hits = self.tree.find(&target, self.params.cutoff)?;

        let mut best: Option<(usize, &String)> = None;
        let mut n_best = 0;
        for hit in hits {
            let dist = self.tree.metric().distance(hit, &target)?;
            match best {
                Some((best_dist, _)) if dist > best_dist => {}
                Some((best_dist, _)) if dist == best_dist => n_best += 1,
                _ => {
                    best = Some((dist, hit));
                    n_best = 1;
                }
            }
        }

        let classification = match best {
            None => Classification {
                label: Label::NoMatch,
                distance: None,
            },
            Some((dist, hit)) if n_best == 1 => Classification {
                label: Label::Matched(hit.clone()),
                distance: Some(dist),
            },
            Some((dist, _)) => Classification {
                label: Label::Ambiguous,
                distance: Some(dist),
            },
        };
        Ok(classification)
    }

    /// Histogram bin for a classification, following the no-match policy
    pub fn histogram_bin(&self, classification: &Classification) -> Option<usize> {
        match (classification.distance, self.params.no_match_bin) {
            (Some(d), _) => Some(d),
            (None, NoMatchBin::Cutoff) => Some(self.params.cutoff),
            (None, NoMatchBin::Skip) => None,
        }
    }

    fn extract<'a>(&self, window: &Window, seq: &'a str, record: u64) -> Result<&'a str, Error> {
        window.extract(seq).ok_or_else(|| Error::ReadTooShort {
            record,
            len: seq.len(),
            needed: window.end(),
        })
    }

    ///////////////////////////////
    /// Classify one read pair and queue it under its label
    pub fn process_pair(
        &self,
        record: u64,
        mate1: FastqBlock,
        mate2: FastqBlock,
        writer: &mut BatchWriter,
        summary: &mut RunSummary,
    ) -> Result<(), Error> {
        let barcode = self.extract(&self.params.barcode, mate1.seq(), record)?;
        let umi = match &self.params.umi {
            Some(window) => Some(self.extract(window, mate1.seq(), record)?.to_string()),
            None => None,
        };

        let classification = self.classify(barcode)?;

        let mut lines1 = mate1.into_lines();
        if let Some(umi) = umi {
            lines1[0].push(UMI_SEPARATOR);
            lines1[0].push_str(&umi);
        }

        writer.push(classification.label.as_str(), lines1, mate2.into_lines())?;

        if let Some(bin) = self.histogram_bin(&classification) {
            summary.bin_distance(bin);
        }
        summary.record(&classification);
        Ok(())
    }

    ///////////////////////////////
    /// Drive the whole input through the engine. Output still buffered at
    /// the end is left in the writer for the caller to finish
    pub fn run<R1: Read, R2: Read>(
        &self,
        reader: &mut PairedFastqReader<R1, R2>,
        writer: &mut BatchWriter,
    ) -> Result<RunSummary, Error> {
        let mut summary = RunSummary::new(self.params.cutoff);
        info!(
            "Demultiplexing against {} barcodes with up to {} mismatches",
            self.tree.len(),
            self.params.cutoff
        );

        let mut record: u64 = 0;
        while let Some((mate1, mate2)) = reader.next_pair()? {
            self.process_pair(record, mate1, mate2, writer, &mut summary)?;
            record += 1;
            if record % PROGRESS_EVERY == 0 {
                info!(
                    "#read pairs processed: {} ({} flushes so far)",
                    record,
                    writer.flushes()
                );
            }
        }

        debug!(
            "Input exhausted after {} read pairs, {} bytes still buffered",
            record,
            writer.buffered_bytes()
        );
        Ok(summary)
    }
}
