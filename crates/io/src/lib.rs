// File I/O: delimited record import and append-only archive files

pub mod archive;
pub mod delimited;

pub use archive::{ArchiveError, ArchiveFile, ArchiveStore};
pub use delimited::{parse, parse_with_delimiter, read, ParseError, Record, RecordSet};
