use std::path::PathBuf;

use crate::demux::{NoMatchBin, Window};

///////////////////////////////
/// Resolved file locations for one demultiplexing run
#[derive(Debug, Clone)]
pub struct IO {
    pub path_r1: PathBuf,
    pub path_r2: PathBuf,
    pub path_dict: PathBuf,
    pub path_out: PathBuf,
    pub extension: String,
}

#[derive(Debug, Clone)]
pub struct Runtime {
    pub barcode: Window,
    pub umi: Option<Window>,
    pub cutoff: usize,
    pub budget_bytes: u64,
    pub no_match_bin: NoMatchBin,
}
