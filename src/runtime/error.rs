use thiserror::Error;

use crate::bktree::MetricError;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid configuration: {}", msg)]
    Config { msg: String },

    #[error(transparent)]
    Metric(#[from] MetricError),

    #[error("File at {:?} not found.", path)]
    FileNotFound { path: std::path::PathBuf },

    #[error("File at {:?} is invalid{}.", path, Error::format_msg_as_detail(msg))]
    FileNotValid {
        path: std::path::PathBuf,
        msg: Option<String>,
    },

    #[error("I/O error on {:?}: {}", path, source)]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Index file at {:?} cannot be read{}", path, Error::format_msg_as_detail(msg))]
    IndexFormat {
        path: std::path::PathBuf,
        msg: Option<String>,
    },

    #[error(
        "Read {} is {} bases long, too short for the window ending at position {}",
        record,
        len,
        needed
    )]
    ReadTooShort {
        record: u64,
        len: usize,
        needed: usize,
    },

    #[error("Failed parsing {}{}", context, Error::format_msg_as_detail(msg))]
    ParseError {
        context: String,
        msg: Option<String>,
    },
}

impl Error {
    #[cold]
    pub fn config<M: Into<String>>(msg: M) -> Self {
        Error::Config { msg: msg.into() }
    }

    #[cold]
    pub fn file_not_found<P: AsRef<std::path::Path>>(path: P) -> Self {
        Error::FileNotFound {
            path: path.as_ref().to_path_buf(),
        }
    }

    #[cold]
    pub fn file_not_valid<P: AsRef<std::path::Path>, M: Into<String>>(
        path: P,
        msg: Option<M>,
    ) -> Self {
        Error::FileNotValid {
            path: path.as_ref().to_path_buf(),
            msg: msg.map(|m| m.into()),
        }
    }

    #[cold]
    pub fn io<P: AsRef<std::path::Path>>(path: P, source: std::io::Error) -> Self {
        Error::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    #[cold]
    pub fn index_format<P: AsRef<std::path::Path>, M: Into<String>>(
        path: P,
        msg: Option<M>,
    ) -> Self {
        Error::IndexFormat {
            path: path.as_ref().to_path_buf(),
            msg: msg.map(|m| m.into()),
        }
    }

    #[cold]
    pub fn parse_error<C: Into<String>, M: Into<String>>(context: C, msg: Option<M>) -> Self {
        Error::ParseError {
            context: context.into(),
            msg: msg.map(|m| m.into()),
        }
    }

    pub fn format_msg_as_detail(msg: &Option<String>) -> String {
        match msg {
            Some(m) => format!(" ({})", m),
            None => String::new(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_carry_detail() {
        let e = Error::file_not_valid("dict.bk", Some("bad magic"));
        assert_eq!(e.to_string(), "File at \"dict.bk\" is invalid (bad magic).");

        let e = Error::file_not_valid::<_, String>("dict.bk", None);
        assert_eq!(e.to_string(), "File at \"dict.bk\" is invalid.");
    }

    #[test]
    fn test_metric_error_is_transparent() {
        let e: Error = MetricError::EmptyOperand { side: "target" }.into();
        assert_eq!(e.to_string(), "Length of target is zero.");
    }
}
