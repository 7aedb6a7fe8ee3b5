//! Per-label output buffering with a memory budget.
//!
//! Keeping one open file pair per barcode does not scale to large
//! dictionaries, so reads are queued in memory per label and the whole set
//! of queues is written out sequentially whenever the buffered size exceeds
//! the budget. The first flush of a label creates/truncates its files, every
//! later flush appends, so the final files are the in-order concatenation of
//! everything routed to the label.

use std::collections::{BTreeMap, HashSet};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use log::{debug, trace};

use crate::runtime::Error;

pub const MB_SIZE: u64 = 1024 * 1024;

#[derive(Debug)]
struct LabelQueue {
    mate1: Vec<String>,
    mate2: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriterStats {
    pub flushes: u64,
    pub labels: usize,
}

pub struct BatchWriter {
    dir_out: PathBuf,
    extension: String,
    budget: u64,
    buffered: u64,
    queues: BTreeMap<String, LabelQueue>,
    flushed_labels: HashSet<String>,
    flushes: u64,
}

impl BatchWriter {
    pub fn new<P: AsRef<Path>>(dir_out: P, extension: &str, budget: u64) -> BatchWriter {
        BatchWriter {
            dir_out: dir_out.as_ref().to_path_buf(),
            extension: extension.to_string(),
            budget,
            buffered: 0,
            queues: BTreeMap::new(),
            flushed_labels: HashSet::new(),
            flushes: 0,
        }
    }

    /// Bytes currently held in the queues, newlines included
    pub fn buffered_bytes(&self) -> u64 {
        self.buffered
    }

    pub fn flushes(&self) -> u64 {
        self.flushes
    }

    pub fn output_paths(&self, label: &str) -> (PathBuf, PathBuf) {
        (
            self.dir_out.join(format!("{}_1.{}", label, self.extension)),
            self.dir_out.join(format!("{}_2.{}", label, self.extension)),
        )
    }

    ///////////////////////////////
    /// Queue one read pair under a label. Returns true if this push pushed the
    /// buffer over budget and triggered a flush
    pub fn push(
        &mut self,
        label: &str,
        mate1: [String; 4],
        mate2: [String; 4],
    ) -> Result<bool, Error> {
        let cost: u64 = mate1
            .iter()
            .chain(mate2.iter())
            .map(|l| l.len() as u64 + 1)
            .sum();
        self.buffered += cost;

        if let Some(queue) = self.queues.get_mut(label) {
            queue.mate1.extend(mate1);
            queue.mate2.extend(mate2);
        } else {
            self.queues.insert(
                label.to_string(),
                LabelQueue {
                    mate1: mate1.into(),
                    mate2: mate2.into(),
                },
            );
        }

        if self.buffered > self.budget {
            debug!(
                "Buffered {} bytes over budget of {}, flushing {} labels",
                self.buffered,
                self.budget,
                self.queues.len()
            );
            self.flush()?;
            return Ok(true);
        }
        Ok(false)
    }

    ///////////////////////////////
    /// Write every queue to its file pair and clear the buffers
    pub fn flush(&mut self) -> Result<(), Error> {
        if self.queues.is_empty() {
            return Ok(());
        }

        let queues = std::mem::take(&mut self.queues);
        for (label, queue) in queues {
            let append = self.flushed_labels.contains(&label);
            let (path_r1, path_r2) = self.output_paths(&label);
            trace!(
                "Writing {} lines for {} (append: {})",
                queue.mate1.len(),
                label,
                append
            );

            write_lines(&path_r1, &queue.mate1, append)?;
            write_lines(&path_r2, &queue.mate2, append)?;

            if !append {
                self.flushed_labels.insert(label);
            }
        }

        self.buffered = 0;
        self.flushes += 1;
        Ok(())
    }

    /// Final flush; consumes the writer
    pub fn finish(mut self) -> Result<WriterStats, Error> {
        self.flush()?;
        Ok(WriterStats {
            flushes: self.flushes,
            labels: self.flushed_labels.len(),
        })
    }
}

fn write_lines(path: &Path, lines: &[String], append: bool) -> Result<(), Error> {
    let file = open_output(path, append).map_err(|e| Error::io(path, e))?;
    let mut writer = BufWriter::new(file);
    for line in lines {
        writer
            .write_all(line.as_bytes())
            .and_then(|_| writer.write_all(b"\n"))
            .map_err(|e| Error::io(path, e))?;
    }
    // BufWriter drops write errors silently, so flush explicitly
    writer.flush().map_err(|e| Error::io(path, e))?;
    Ok(())
}

fn open_output(path: &Path, append: bool) -> std::io::Result<File> {
    if append {
        OpenOptions::new().create(true).append(true).open(path)
    } else {
        File::create(path)
    }
}
