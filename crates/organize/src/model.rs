use std::collections::BTreeMap;

use serde::Serialize;
use sortkeep_io::{ParseError, Record, RecordSet};

use crate::analysis::{Recommendation, WorkspaceAnalysis};
use crate::archive::{ArchiveMode, ArchiveRun};
use crate::config::{StyleGuidelines, TagGroup};
use crate::structure::{HubSpokeStructure, ParaStructure};
use crate::validate::ValidationReport;

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// One configured dataset after an attempt to read it.
#[derive(Debug)]
pub struct LoadedDataset {
    pub id: String,
    pub records: Result<RecordSet, ParseError>,
}

impl LoadedDataset {
    pub fn ok(id: impl Into<String>, records: RecordSet) -> Self {
        Self {
            id: id.into(),
            records: Ok(records),
        }
    }

    /// Parsed rows, or nothing when the source failed to load.
    pub fn rows(&self) -> &[Record] {
        match &self.records {
            Ok(set) => &set.rows,
            Err(_) => &[],
        }
    }

    pub fn error(&self) -> Option<&ParseError> {
        self.records.as_ref().err()
    }
}

/// Look up a loaded dataset by id.
pub fn find<'a>(loaded: &'a [LoadedDataset], id: &str) -> Option<&'a LoadedDataset> {
    loaded.iter().find(|d| d.id == id)
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct DatasetValidation {
    pub dataset: String,
    pub report: ValidationReport,
}

#[derive(Debug, Clone, Serialize)]
pub struct DatasetTags {
    pub dataset: String,
    pub suggested_tags: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TaggingRecommendations {
    pub tag_system: Vec<TagGroup>,
    pub dataset_tags: Vec<DatasetTags>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoadFailure {
    pub dataset: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportSummary {
    pub total_datasets: usize,
    pub total_records: usize,
    pub duplicates_found: usize,
    pub hubs: usize,
    pub para_categories: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReorganizationReport {
    pub title: String,
    pub generated_at: String,
    pub engine_version: String,
    pub mode: ArchiveMode,
    pub summary: ReportSummary,
    pub analysis: WorkspaceAnalysis,
    pub validation: Vec<DatasetValidation>,
    pub para_structure: ParaStructure,
    pub hub_spoke_structure: HubSpokeStructure,
    pub tagging_recommendations: TaggingRecommendations,
    pub style_guidelines: StyleGuidelines,
    pub archive_results: ArchiveRun,
    pub load_errors: Vec<LoadFailure>,
    pub recommendations: Vec<Recommendation>,
    pub next_steps: Vec<String>,
}
