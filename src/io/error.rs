use super::Format;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O operation failed: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    #[error("failed to parse YAML input: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("failed to parse {format} data: {details} (at line ~{line})")]
    Parse {
        format: Format,
        line: usize,
        details: String,
    },

    #[error("invalid input document: {0}")]
    InvalidDocument(String),

    #[error("failed to convert data model: {0}")]
    Conversion(String),
}

impl From<super::util::RunLengthError> for Error {
    fn from(e: super::util::RunLengthError) -> Self {
        Error::Conversion(e.to_string())
    }
}

impl Error {
    pub fn parse(format: Format, line: usize, details: impl Into<String>) -> Self {
        Self::Parse {
            format,
            line,
            details: details.into(),
        }
    }

    pub fn invalid(details: impl Into<String>) -> Self {
        Self::InvalidDocument(details.into())
    }
}
