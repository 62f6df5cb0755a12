//! `sortkeep-organize`: duplicate detection, archival planning and
//! workspace structure recommendations for flat record sets.
//!
//! Receives parsed record sets, returns reports. Never modifies a source file;
//! the only write is a new archive file in live mode.

pub mod analysis;
pub mod archive;
pub mod config;
pub mod dedup;
pub mod engine;
pub mod error;
pub mod model;
pub mod structure;
pub mod validate;

pub use archive::{plan, plan_all, ArchiveEntry, ArchiveMode, ArchiveResult, ArchiveRun};
pub use config::OrganizerConfig;
pub use dedup::{detect, DuplicateGroup, Partition};
pub use engine::{load_datasets, run, RunOptions};
pub use error::OrganizeError;
pub use model::{LoadedDataset, ReorganizationReport};
pub use structure::map_structure;
pub use validate::{validate, ValidationReport};
