use clap::Subcommand;

// Module declarations (alphabetical)
pub mod build_dict;
pub mod demux;
pub mod search;

pub use build_dict::BuildDictCMD;
pub use demux::DemuxCMD;
pub use search::SearchCMD;

///////////////////////////////
/// Possible subcommands to parse
#[derive(Subcommand)]
pub enum Commands {
    /// Build a barcode index from a list of barcodes
    BuildDict(BuildDictCMD),
    /// Look up one barcode in an index
    Search(SearchCMD),
    /// Split paired FASTQ files by barcode
    Demux(DemuxCMD),
}

impl Commands {
    pub fn try_execute(&mut self) -> anyhow::Result<()> {
        match self {
            Commands::BuildDict(cmd) => cmd.try_execute(),
            Commands::Search(cmd) => cmd.try_execute(),
            Commands::Demux(cmd) => cmd.try_execute(),
        }
    }
}
