//! Barcode demultiplexing of paired reads.
//!
//! The engine classifies each read pair against a barcode index, the writer
//! routes it to per-label output files under a memory budget, and the
//! summary collects the counters reported at the end of a run.

pub mod engine;
pub mod summary;
pub mod writer;

pub use engine::{
    Classification, DemuxEngine, DemuxParams, Label, NoMatchBin, Window, AMBIGUOUS_LABEL,
    NO_MATCH_LABEL, UMI_SEPARATOR,
};
pub use summary::{MismatchCounts, RunSummary, FREQUENCY_LOG_FILENAME, HISTOGRAM_FILENAME};
pub use writer::{BatchWriter, WriterStats, MB_SIZE};
