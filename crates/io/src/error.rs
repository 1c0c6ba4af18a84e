use std::fmt;
use std::path::Path;

#[derive(Debug)]
pub enum IoError {
    /// File could not be opened or read.
    Read { path: String, message: String },
    /// File was read but its content is not a usable table.
    Parse { path: String, message: String },
    /// Output file or directory could not be written.
    Write { path: String, message: String },
    /// Extension not recognized as a tabular format.
    UnsupportedFormat(String),
}

impl IoError {
    pub(crate) fn read(path: &Path, message: impl fmt::Display) -> Self {
        Self::Read { path: path.display().to_string(), message: message.to_string() }
    }

    pub(crate) fn parse(path: &Path, message: impl fmt::Display) -> Self {
        Self::Parse { path: path.display().to_string(), message: message.to_string() }
    }

    pub(crate) fn write(path: &Path, message: impl fmt::Display) -> Self {
        Self::Write { path: path.display().to_string(), message: message.to_string() }
    }
}

impl fmt::Display for IoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read { path, message } => write!(f, "cannot read {path}: {message}"),
            Self::Parse { path, message } => write!(f, "cannot parse {path}: {message}"),
            Self::Write { path, message } => write!(f, "cannot write {path}: {message}"),
            Self::UnsupportedFormat(ext) => write!(f, "unsupported input format '{ext}'"),
        }
    }
}

impl std::error::Error for IoError {}
