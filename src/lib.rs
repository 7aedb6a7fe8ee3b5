pub mod bktree;
pub mod command;
pub mod demux;
pub mod dictionary;
pub mod fileformat;
pub mod runtime;
pub mod utils;

pub use bktree::{BkTree, Hamming, Metric};
pub use runtime::{Error, Result};
