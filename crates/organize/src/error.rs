use std::fmt;

use sortkeep_io::ArchiveError;

#[derive(Debug)]
pub enum OrganizeError {
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error (duplicate dataset, empty key, bad prefix, etc.).
    ConfigValidation(String),
    /// Config file could not be read.
    ConfigRead { path: String, message: String },
    /// Archive persistence failed. Never swallowed.
    Archive(ArchiveError),
}

impl fmt::Display for OrganizeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
            Self::ConfigRead { path, message } => {
                write!(f, "cannot read config {path}: {message}")
            }
            Self::Archive(e) => write!(f, "archive write failed: {e}"),
        }
    }
}

impl std::error::Error for OrganizeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Archive(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ArchiveError> for OrganizeError {
    fn from(e: ArchiveError) -> Self {
        Self::Archive(e)
    }
}
