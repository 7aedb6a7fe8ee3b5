pub const DEMUX_DEFAULT_LIBRARY_TYPE: &str = "customized";
pub const DEMUX_DEFAULT_MAX_MISMATCH: &str = "1";
pub const DEMUX_DEFAULT_ALLOWED_MB: &str = "2048";
pub const DEMUX_DEFAULT_EXTENSION: &str = "fastq";
pub const DEMUX_DEFAULT_NO_MATCH_BIN: &str = "cutoff";
