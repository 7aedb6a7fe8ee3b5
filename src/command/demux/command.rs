use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use log::info;

use super::constants::{
    DEMUX_DEFAULT_ALLOWED_MB, DEMUX_DEFAULT_EXTENSION, DEMUX_DEFAULT_LIBRARY_TYPE,
    DEMUX_DEFAULT_MAX_MISMATCH, DEMUX_DEFAULT_NO_MATCH_BIN,
};
use super::core::demultiplex;
use super::core::params::{Runtime, IO};
use crate::demux::{NoMatchBin, Window, MB_SIZE};
use crate::fileformat::verify_input_fq_file;
use crate::runtime::Error;
use crate::utils::expand_and_resolve_path;

///////////////////////////////
/// Read layout of a supported library preparation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LibraryType {
    AllSeq,
    RnaTagSeq,
    Customized,
}

impl std::str::FromStr for LibraryType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "allseq" => Ok(LibraryType::AllSeq),
            "rnatagseq" | "rnatag-seq" => Ok(LibraryType::RnaTagSeq),
            "customized" | "custom" => Ok(LibraryType::Customized),
            _ => Err(format!("Invalid library type: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ReadLayout {
    bc_start: usize,
    bc_size: usize,
    umi_start: usize,
    umi_size: usize,
}

impl LibraryType {
    fn preset(&self) -> ReadLayout {
        match self {
            LibraryType::AllSeq => ReadLayout {
                bc_start: 6,
                bc_size: 6,
                umi_start: 0,
                umi_size: 6,
            },
            LibraryType::RnaTagSeq => ReadLayout {
                bc_start: 0,
                bc_size: 8,
                umi_start: 0,
                umi_size: 0,
            },
            LibraryType::Customized => ReadLayout {
                bc_start: 6,
                bc_size: 6,
                umi_start: 0,
                umi_size: 0,
            },
        }
    }
}

/// Commandline option: Split paired FASTQ files by barcode
#[derive(Args)]
pub struct DemuxCMD {
    // FASTQ for r1; barcode and UMI are taken from this mate
    #[arg(long = "r1", alias = "file1", value_parser)]
    pub path_r1: PathBuf,

    // FASTQ for r2
    #[arg(long = "r2", alias = "file2", value_parser)]
    pub path_r2: PathBuf,

    // Barcode index made by build-dict
    #[arg(short = 'd', long = "dict", value_parser)]
    pub path_dict: PathBuf,

    // Output directory, created if missing
    #[arg(short = 'o', long = "outdir", value_parser)]
    pub path_out: PathBuf,

    // Library preset: allseq, rnatagseq or customized
    #[arg(short = 't', long = "type", default_value = DEMUX_DEFAULT_LIBRARY_TYPE)]
    pub library_type: LibraryType,

    // Optional: override the preset barcode/UMI positions
    #[arg(long = "bc-start", value_parser = clap::value_parser!(usize))]
    pub bc_start: Option<usize>,
    #[arg(long = "bc-size", value_parser = clap::value_parser!(usize))]
    pub bc_size: Option<usize>,
    #[arg(long = "umi-start", value_parser = clap::value_parser!(usize))]
    pub umi_start: Option<usize>,
    #[arg(long = "umi-size", value_parser = clap::value_parser!(usize))]
    pub umi_size: Option<usize>,

    // Maximum allowed mismatches to a dictionary barcode
    #[arg(short = 'm', long = "mismatch", value_parser = clap::value_parser!(usize), default_value = DEMUX_DEFAULT_MAX_MISMATCH)]
    pub max_mismatch: usize,

    // Memory to spend on buffered output before flushing, in MB
    #[arg(long = "allowed-mb", value_parser = clap::value_parser!(u64), default_value = DEMUX_DEFAULT_ALLOWED_MB)]
    pub allowed_mb: u64,

    #[arg(long = "ext", default_value = DEMUX_DEFAULT_EXTENSION)]
    pub extension: String,

    // Histogram bin for reads without any barcode in range: cutoff or skip
    #[arg(long = "no-match-bin", default_value = DEMUX_DEFAULT_NO_MATCH_BIN)]
    pub no_match_bin: NoMatchBin,
}

impl DemuxCMD {
    /// Run the commandline option
    pub fn try_execute(&mut self) -> Result<()> {
        let (params_io, params_runtime) = self.resolve()?;

        info!("Library type is set to: {:?}", self.library_type);
        info!(
            "Barcode window: start {}, size {}",
            params_runtime.barcode.start, params_runtime.barcode.len
        );
        match &params_runtime.umi {
            Some(umi) => info!("UMI window: start {}, size {}", umi.start, umi.len),
            None => info!("UMI extraction is disabled"),
        }
        info!("Max mismatch is set to {}", params_runtime.cutoff);
        info!("Output buffer budget: {} MB", self.allowed_mb);
        info!(
            "Reading {} and {}, writing to {}",
            params_io.path_r1.display(),
            params_io.path_r2.display(),
            params_io.path_out.display()
        );

        demultiplex(&params_io, &params_runtime)?;

        info!("Demultiplexing has finished successfully");
        Ok(())
    }

    fn layout(&self) -> ReadLayout {
        let preset = self.library_type.preset();
        ReadLayout {
            bc_start: self.bc_start.unwrap_or(preset.bc_start),
            bc_size: self.bc_size.unwrap_or(preset.bc_size),
            umi_start: self.umi_start.unwrap_or(preset.umi_start),
            umi_size: self.umi_size.unwrap_or(preset.umi_size),
        }
    }

    ///////////////////////////////
    /// Validate the options into run parameters. Nothing is written here
    fn resolve(&self) -> Result<(IO, Runtime)> {
        let layout = self.layout();
        if layout.bc_size == 0 {
            return Err(Error::config("barcode size must be greater than zero").into());
        }
        if layout.bc_start.checked_add(layout.bc_size).is_none() {
            return Err(Error::config(format!(
                "barcode start {} plus size {} is out of range",
                layout.bc_start, layout.bc_size
            ))
            .into());
        }
        if layout.umi_size > 0 && layout.umi_start.checked_add(layout.umi_size).is_none() {
            return Err(Error::config(format!(
                "UMI start {} plus size {} is out of range",
                layout.umi_start, layout.umi_size
            ))
            .into());
        }
        if self.allowed_mb == 0 {
            return Err(Error::config("allowed-mb must be greater than zero").into());
        }

        let extension = self.extension.trim_start_matches('.');
        if extension.is_empty() {
            return Err(Error::config("output extension must not be empty").into());
        }

        let path_r1 = expand_and_resolve_path(&self.path_r1)?;
        let path_r2 = expand_and_resolve_path(&self.path_r2)?;
        verify_input_fq_file(&path_r1)?;
        verify_input_fq_file(&path_r2)?;

        let params_io = IO {
            path_r1,
            path_r2,
            path_dict: expand_and_resolve_path(&self.path_dict)?,
            path_out: expand_and_resolve_path(&self.path_out)?,
            extension: extension.to_string(),
        };

        let umi = (layout.umi_size > 0).then(|| Window::new(layout.umi_start, layout.umi_size));
        let params_runtime = Runtime {
            barcode: Window::new(layout.bc_start, layout.bc_size),
            umi,
            cutoff: self.max_mismatch,
            budget_bytes: self.allowed_mb.saturating_mul(MB_SIZE),
            no_match_bin: self.no_match_bin,
        };
        Ok((params_io, params_runtime))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::fs::File;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        cmd: DemuxCMD,
    }

    fn parse(extra: &[&str]) -> DemuxCMD {
        let mut args = vec![
            "bcsplit", "--r1", "a_1.fq", "--r2", "a_2.fq", "-d", "dict.idx", "-o", "out",
        ];
        args.extend_from_slice(extra);
        TestCli::try_parse_from(args).unwrap().cmd
    }

    #[test]
    fn test_defaults() {
        let cmd = parse(&[]);
        assert_eq!(cmd.library_type, LibraryType::Customized);
        assert_eq!(cmd.max_mismatch, 1);
        assert_eq!(cmd.allowed_mb, 2048);
        assert_eq!(cmd.extension, "fastq");
        assert_eq!(cmd.no_match_bin, NoMatchBin::Cutoff);
        assert_eq!(
            cmd.layout(),
            ReadLayout {
                bc_start: 6,
                bc_size: 6,
                umi_start: 0,
                umi_size: 0
            }
        );
    }

    #[test]
    fn test_presets_and_overrides() {
        assert_eq!(
            parse(&["-t", "allseq"]).layout(),
            ReadLayout {
                bc_start: 6,
                bc_size: 6,
                umi_start: 0,
                umi_size: 6
            }
        );
        assert_eq!(parse(&["--type", "RNAtag-seq"]).layout().bc_size, 8);

        let layout = parse(&["-t", "rnatagseq", "--bc-start", "2", "--umi-size", "4"]).layout();
        assert_eq!(
            layout,
            ReadLayout {
                bc_start: 2,
                bc_size: 8,
                umi_start: 0,
                umi_size: 4
            }
        );

        assert!(TestCli::try_parse_from([
            "bcsplit", "--r1", "a", "--r2", "b", "-d", "d", "-o", "o", "-t", "dropseq"
        ])
        .is_err());
    }

    #[test]
    fn test_invalid_config_is_rejected_early() {
        let err = parse(&["--bc-size", "0"]).resolve().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<Error>(),
            Some(Error::Config { .. })
        ));

        let max = usize::MAX.to_string();
        for extra in [
            ["--bc-start", max.as_str()],
            ["--umi-start", max.as_str()],
        ] {
            let mut args = vec!["--umi-size", "4"];
            args.extend_from_slice(&extra);
            let err = parse(&args).resolve().unwrap_err();
            assert!(matches!(
                err.downcast_ref::<Error>(),
                Some(Error::Config { .. })
            ));
        }

        let err = parse(&["--allowed-mb", "0"]).resolve().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<Error>(),
            Some(Error::Config { .. })
        ));
    }

    #[test]
    fn test_resolve() {
        let dir = tempfile::tempdir().unwrap();
        let r1 = dir.path().join("a_1.fq");
        let r2 = dir.path().join("a_2.fq");
        File::create(&r1).unwrap();
        File::create(&r2).unwrap();

        let cmd = TestCli::try_parse_from([
            "bcsplit",
            "--r1",
            r1.to_str().unwrap(),
            "--r2",
            r2.to_str().unwrap(),
            "-d",
            "dict.idx",
            "-o",
            dir.path().join("out").to_str().unwrap(),
            "-t",
            "allseq",
            "--allowed-mb",
            "3",
            "--ext",
            ".fq",
        ])
        .unwrap()
        .cmd;

        let (io, runtime) = cmd.resolve().unwrap();
        assert_eq!(io.extension, "fq");
        assert!(io.path_dict.is_absolute());
        assert_eq!(runtime.barcode, Window::new(6, 6));
        assert_eq!(runtime.umi, Some(Window::new(0, 6)));
        assert_eq!(runtime.budget_bytes, 3 * MB_SIZE);
        // nothing is created before the run starts
        assert!(!dir.path().join("out").exists());
    }

    #[test]
    fn test_non_fastq_input_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let r1 = dir.path().join("a_1.bam");
        File::create(&r1).unwrap();
        let cmd = TestCli::try_parse_from([
            "bcsplit",
            "--r1",
            r1.to_str().unwrap(),
            "--r2",
            r1.to_str().unwrap(),
            "-d",
            "dict.idx",
            "-o",
            "out",
        ])
        .unwrap()
        .cmd;
        let err = cmd.resolve().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<Error>(),
            Some(Error::FileNotValid { .. })
        ));
    }
}
