use chrono::{DateTime, Utc};
use sortkeep_io::ParseError;

use crate::analysis::analyze;
use crate::archive::{format_timestamp, plan_all, ArchiveMode};
use crate::config::OrganizerConfig;
use crate::error::OrganizeError;
use crate::model::{
    find, DatasetTags, DatasetValidation, LoadFailure, LoadedDataset, ReorganizationReport,
    ReportSummary, TaggingRecommendations,
};
use crate::structure::map_structure;
use crate::validate::{validate, ValidationReport};

pub const REPORT_TITLE: &str = "Workspace Reorganization Report";

#[derive(Debug, Clone, Copy)]
pub struct RunOptions {
    pub mode: ArchiveMode,
    pub timestamp: DateTime<Utc>,
}

impl RunOptions {
    pub fn now(mode: ArchiveMode) -> Self {
        Self {
            mode,
            timestamp: Utc::now(),
        }
    }
}

/// Read every configured dataset. Failures stay attached to their dataset.
pub fn load_datasets(config: &OrganizerConfig) -> Vec<LoadedDataset> {
    config
        .datasets
        .iter()
        .map(|ds| {
            let path = config.dataset_path(ds);
            let records = sortkeep_io::read(&path);
            match &records {
                Ok(set) => {
                    log::info!("{}: loaded {} records from {}", ds.id, set.len(), path.display());
                    if set.overflow_rows > 0 {
                        log::warn!(
                            "{}: {} row(s) had more values than header columns",
                            ds.id,
                            set.overflow_rows
                        );
                    }
                }
                Err(e) => log::warn!("{}: skipped ({e})", ds.id),
            }
            LoadedDataset {
                id: ds.id.clone(),
                records,
            }
        })
        .collect()
}

/// Validate every configured dataset against its schema.
pub fn validate_all(config: &OrganizerConfig, loaded: &[LoadedDataset]) -> Vec<DatasetValidation> {
    let schemas = config.schema_table();
    config
        .datasets
        .iter()
        .map(|ds| {
            let report = match find(loaded, &ds.id).map(|d| &d.records) {
                Some(Ok(set)) => validate(&ds.id, set, &schemas),
                Some(Err(e @ ParseError::Empty)) => ValidationReport::malformed(e.to_string()),
                Some(Err(e)) => ValidationReport::unreadable(e.to_string()),
                None => ValidationReport::unreadable(format!("dataset '{}' was not loaded", ds.id)),
            };
            DatasetValidation {
                dataset: ds.id.clone(),
                report,
            }
        })
        .collect()
}

pub fn tagging_recommendations(config: &OrganizerConfig) -> TaggingRecommendations {
    TaggingRecommendations {
        tag_system: config.tag_groups.clone(),
        dataset_tags: config
            .datasets
            .iter()
            .filter(|ds| !ds.tags.is_empty())
            .map(|ds| DatasetTags {
                dataset: ds.id.clone(),
                suggested_tags: ds.tags.clone(),
            })
            .collect(),
    }
}

fn next_steps() -> Vec<String> {
    [
        "Review the duplicate entries identified in each database",
        "Apply PARA naming convention to databases",
        "Set up Hub & Spoke relations",
        "Implement suggested tagging system",
        "Apply style guidelines for consistency",
        "Run the reorganization in live mode when ready",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// Build the full reorganization report. In live mode duplicates are archived.
///
/// Dataset load and validation failures are reported, never raised; only an
/// archive write failure aborts the run.
pub fn run(
    config: &OrganizerConfig,
    loaded: &[LoadedDataset],
    options: RunOptions,
) -> Result<ReorganizationReport, OrganizeError> {
    log::debug!("running '{}' in {} mode", config.name, options.mode);

    let analysis = analyze(config, loaded);
    let validation = validate_all(config, loaded);
    let structure = map_structure(&config.datasets, &config.categories, &config.hubs);
    let store = config.archive_store();
    let archive_results = plan_all(config, loaded, options.mode, options.timestamp, &store)?;

    let load_errors = loaded
        .iter()
        .filter_map(|d| {
            d.error().map(|e| LoadFailure {
                dataset: d.id.clone(),
                message: e.to_string(),
            })
        })
        .collect();

    Ok(ReorganizationReport {
        title: REPORT_TITLE.to_string(),
        generated_at: format_timestamp(options.timestamp),
        engine_version: env!("CARGO_PKG_VERSION").to_string(),
        mode: options.mode,
        summary: ReportSummary {
            total_datasets: config.datasets.len(),
            total_records: analysis.total_records,
            duplicates_found: analysis.total_duplicates,
            hubs: config.hubs.len(),
            para_categories: config.categories.len(),
        },
        recommendations: analysis.recommendations.clone(),
        analysis,
        validation,
        para_structure: structure.para,
        hub_spoke_structure: structure.hub_spoke,
        tagging_recommendations: tagging_recommendations(config),
        style_guidelines: config.style.clone(),
        archive_results,
        load_errors,
        next_steps: next_steps(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate::ValidationError;

    #[test]
    fn missing_files_are_dataset_scoped() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = OrganizerConfig::embedded().unwrap();
        config.data_dir = dir.path().to_path_buf();
        std::fs::write(
            dir.path().join("notion_Participants.csv"),
            "Customer ID,Name,Contact\nC1,Ann,555\nC1,ann,556\n",
        )
        .unwrap();

        let loaded = load_datasets(&config);
        assert_eq!(loaded.len(), 5);
        assert!(loaded[0].error().is_some());
        assert!(loaded[1].error().is_none());

        let report = run(&config, &loaded, RunOptions::now(ArchiveMode::DryRun)).unwrap();
        assert_eq!(report.load_errors.len(), 4);
        assert_eq!(report.summary.total_records, 2);
        assert_eq!(report.summary.duplicates_found, 1);
        assert_eq!(report.archive_results.processed.len(), 1);
        assert!(!report.validation[0].report.is_valid);
        assert!(report.validation[1].report.is_valid);
        assert!(!dir.path().join("archives").exists());
    }

    #[test]
    fn headerless_file_is_malformed_input() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = OrganizerConfig::embedded().unwrap();
        config.data_dir = dir.path().to_path_buf();
        std::fs::write(dir.path().join("notion_Participants.csv"), "\n\n").unwrap();

        let loaded = load_datasets(&config);
        let validation = validate_all(&config, &loaded);
        let participants = &validation[1].report;
        assert_eq!(validation[1].dataset, "participants");
        assert!(!participants.is_valid);
        assert!(matches!(
            participants.errors[0],
            ValidationError::MalformedInput { .. }
        ));
        assert_eq!(
            participants.errors[0].to_string(),
            "Invalid record set: no header line found"
        );
        // A missing file is still a source error.
        assert!(matches!(validation[0].report.errors[0], ValidationError::Source { .. }));
    }

    #[test]
    fn tagging_covers_datasets_with_tags() {
        let config = OrganizerConfig::embedded().unwrap();
        let tags = tagging_recommendations(&config);
        assert_eq!(tags.tag_system.len(), 4);
        assert_eq!(tags.dataset_tags.len(), 5);
        assert!(tags.dataset_tags[0].suggested_tags.contains_key("country"));
    }
}
