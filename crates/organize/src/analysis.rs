use std::fmt;

use serde::Serialize;

use crate::config::OrganizerConfig;
use crate::dedup::{detect, DuplicateGroup};
use crate::model::{find, LoadedDataset};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    High,
    Medium,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::High => write!(f, "high"),
            Self::Medium => write!(f, "medium"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationKind {
    Deduplication,
    Structure,
    Tagging,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Recommendation {
    #[serde(rename = "type")]
    pub kind: RecommendationKind,
    pub priority: Priority,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DatasetAnalysis {
    pub dataset: String,
    pub total_records: usize,
    pub unique_records: usize,
    pub duplicate_count: usize,
    pub duplicates: Vec<DuplicateGroup>,
    pub key_fields: Vec<String>,
    pub hub: String,
    /// Display name of the category, or its key when undefined.
    pub para_category: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct WorkspaceAnalysis {
    pub datasets: Vec<DatasetAnalysis>,
    pub total_records: usize,
    pub total_duplicates: usize,
    pub recommendations: Vec<Recommendation>,
}

/// Duplicate analysis for every configured dataset. Unloaded datasets count as empty.
pub fn analyze(config: &OrganizerConfig, loaded: &[LoadedDataset]) -> WorkspaceAnalysis {
    let mut datasets = Vec::with_capacity(config.datasets.len());
    let mut total_records = 0;
    let mut total_duplicates = 0;

    for ds in &config.datasets {
        let rows = find(loaded, &ds.id).map(LoadedDataset::rows).unwrap_or(&[]);
        let partition = detect(rows, &ds.key_fields);

        let para_category = config
            .categories
            .iter()
            .find(|c| c.key == ds.category)
            .map(|c| c.name.clone())
            .unwrap_or_else(|| ds.category.to_string());

        total_records += rows.len();
        total_duplicates += partition.duplicates.len();
        log::info!(
            "{}: {} records, {} unique, {} duplicates",
            ds.id,
            rows.len(),
            partition.unique.len(),
            partition.duplicates.len()
        );

        datasets.push(DatasetAnalysis {
            dataset: ds.id.clone(),
            total_records: rows.len(),
            unique_records: partition.unique.len(),
            duplicate_count: partition.duplicates.len(),
            duplicates: partition.duplicates,
            key_fields: ds.key_fields.clone(),
            hub: ds.hub.clone(),
            para_category,
        });
    }

    WorkspaceAnalysis {
        datasets,
        total_records,
        total_duplicates,
        recommendations: recommendations(total_duplicates),
    }
}

pub fn recommendations(total_duplicates: usize) -> Vec<Recommendation> {
    let mut out = Vec::new();
    if total_duplicates > 0 {
        out.push(Recommendation {
            kind: RecommendationKind::Deduplication,
            priority: Priority::High,
            message: format!(
                "Found {total_duplicates} duplicate entries that should be archived"
            ),
        });
    }
    out.push(Recommendation {
        kind: RecommendationKind::Structure,
        priority: Priority::Medium,
        message: "Organize databases according to Hub & Spoke model".into(),
    });
    out.push(Recommendation {
        kind: RecommendationKind::Tagging,
        priority: Priority::Medium,
        message: "Apply consistent tagging system across all databases".into(),
    });
    out
}
