use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use log::info;

use crate::bktree::save_tree;
use crate::dictionary::{load_dictionary, BarcodeExtractor, DictionaryFormat, DEFAULT_BARCODE_PATTERN};
use crate::utils::expand_and_resolve_path;

pub const DEFAULT_DICTIONARY_FORMAT: &str = "simple";

/// Commandline option: Build a barcode index from a text file of barcodes
#[derive(Args)]
pub struct BuildDictCMD {
    // Barcode list, one entry per line
    #[arg(short = 'i', long = "infile", value_parser)]
    pub path_in: PathBuf,

    // Index file to write
    #[arg(short = 'o', long = "outfile", value_parser)]
    pub path_out: PathBuf,

    // simple: whole line is the barcode; pattern: first capture group of --pattern
    #[arg(short = 't', long = "type", default_value = DEFAULT_DICTIONARY_FORMAT)]
    pub format: DictionaryFormat,

    #[arg(long = "pattern", default_value = DEFAULT_BARCODE_PATTERN)]
    pub pattern: String,
}

impl BuildDictCMD {
    /// Run the commandline option
    pub fn try_execute(&mut self) -> Result<()> {
        let path_in = expand_and_resolve_path(&self.path_in)?;
        let path_out = expand_and_resolve_path(&self.path_out)?;

        info!("Dictionary format is set to: {:?}", self.format);
        if self.format == DictionaryFormat::Pattern {
            info!("Barcode pattern: {}", self.pattern);
        }

        let extractor = BarcodeExtractor::new(self.format, &self.pattern)?;
        let tree = load_dictionary(&path_in, &extractor)
            .with_context(|| format!("Failed to read barcodes from {}", path_in.display()))?;

        save_tree(&tree, &path_out)?;
        info!("Saved index with {} entries to {}", tree.len(), path_out.display());
        Ok(())
    }
}
