use super::Format;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O operation failed: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    #[error("Failed to parse {format} data: {details} (at line ~{line})")]
    Parse {
        format: Format,
        line: usize,
        details: String,
    },

    #[error("Unknown file format: '{0}'")]
    UnknownFormat(String),

    #[error("The '{0}' format is not supported for reading molecules")]
    UnsupportedReadFormat(Format),

    #[error("The '{0}' format is not supported for writing molecules")]
    UnsupportedWriteFormat(Format),
}

impl Error {
    pub fn parse(format: Format, line: usize, details: impl Into<String>) -> Self {
        Self::Parse {
            format,
            line,
            details: details.into(),
        }
    }
}
