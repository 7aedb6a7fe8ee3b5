use std::fs;

use anyhow::{Context, Result};
use log::info;

use super::params::{Runtime, IO};
use crate::bktree::{load_tree, Hamming};
use crate::demux::{BatchWriter, DemuxEngine, DemuxParams, RunSummary, WriterStats};
use crate::fileformat::PairedFastqReader;

///////////////////////////////
/// Split a pair of FASTQ files by barcode. The index is checked against the
/// barcode window before the output directory is touched
pub fn demultiplex(params_io: &IO, params_runtime: &Runtime) -> Result<(RunSummary, WriterStats)> {
    let tree = load_tree(&params_io.path_dict, Hamming).with_context(|| {
        format!(
            "Failed to load barcode index {}",
            params_io.path_dict.display()
        )
    })?;
    info!("Loaded index with {} barcodes", tree.len());

    let engine = DemuxEngine::new(
        tree,
        DemuxParams {
            barcode: params_runtime.barcode,
            umi: params_runtime.umi,
            cutoff: params_runtime.cutoff,
            no_match_bin: params_runtime.no_match_bin,
        },
    )?;

    fs::create_dir_all(&params_io.path_out).with_context(|| {
        format!(
            "Failed to create output directory {}",
            params_io.path_out.display()
        )
    })?;

    let mut reader = PairedFastqReader::from_paths(&params_io.path_r1, &params_io.path_r2)?;
    let mut writer = BatchWriter::new(
        &params_io.path_out,
        &params_io.extension,
        params_runtime.budget_bytes,
    );

    let summary = engine.run(&mut reader, &mut writer)?;
    let stats = writer.finish()?;
    info!(
        "Wrote {} labels in {} flushes",
        stats.labels, stats.flushes
    );

    summary.log_histogram();
    summary.write_reports(&params_io.path_out)?;
    info!(
        "Processed {} read pairs: {} matched, {} ambiguous, {} without match",
        summary.total_reads(),
        summary.matched,
        summary.ambiguous,
        summary.no_match
    );
    Ok((summary, stats))
}
