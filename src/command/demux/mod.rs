mod command;
mod constants;
mod core;

pub use command::{DemuxCMD, LibraryType};
pub use self::core::{demultiplex, params};
