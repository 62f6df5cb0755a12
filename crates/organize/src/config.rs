use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::OrganizeError;

/// Built-in configuration: the five lottery-operations datasets.
pub const DEFAULT_CONFIG_TOML: &str = include_str!("../defaults/organizer.toml");

pub const CONFIG_FILE_NAME: &str = "organizer.toml";

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OrganizerConfig {
    pub name: String,
    /// Directory holding the dataset files.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    #[serde(default)]
    pub archive: ArchiveSettings,
    pub datasets: Vec<DatasetConfig>,
    #[serde(default)]
    pub categories: Vec<CategoryDef>,
    #[serde(default)]
    pub hubs: Vec<HubDef>,
    /// Standard tag system applied across every dataset.
    #[serde(default)]
    pub tag_groups: Vec<TagGroup>,
    #[serde(default)]
    pub style: StyleGuidelines,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("notion_files")
}

// ---------------------------------------------------------------------------
// Archive
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ArchiveSettings {
    /// Relative paths resolve against `data_dir`.
    #[serde(default = "default_archive_dir")]
    pub dir: PathBuf,
    #[serde(default = "default_archive_prefix")]
    pub prefix: String,
}

impl Default for ArchiveSettings {
    fn default() -> Self {
        Self {
            dir: default_archive_dir(),
            prefix: default_archive_prefix(),
        }
    }
}

fn default_archive_dir() -> PathBuf {
    PathBuf::from("archives")
}

fn default_archive_prefix() -> String {
    sortkeep_io::archive::DEFAULT_PREFIX.to_string()
}

// ---------------------------------------------------------------------------
// Datasets
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatasetConfig {
    pub id: String,
    /// File name, relative to `data_dir`.
    pub file: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Composite key used for duplicate detection.
    pub key_fields: Vec<String>,
    pub hub: String,
    pub category: Category,
    #[serde(default)]
    pub schema: Schema,
    /// Suggested tags for this dataset, by tag type.
    #[serde(default)]
    pub tags: BTreeMap<String, Vec<String>>,
}

/// Field-level expectations for one dataset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Schema {
    #[serde(default)]
    pub required: Vec<String>,
    #[serde(default)]
    pub numbers: Vec<String>,
    #[serde(default)]
    pub dates: Vec<String>,
}

/// Schemas keyed by dataset id.
pub type SchemaTable = BTreeMap<String, Schema>;

// ---------------------------------------------------------------------------
// Categories + hubs
// ---------------------------------------------------------------------------

/// Lifecycle category (PARA).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Projects,
    Areas,
    Resources,
    Archives,
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Projects => write!(f, "projects"),
            Self::Areas => write!(f, "areas"),
            Self::Resources => write!(f, "resources"),
            Self::Archives => write!(f, "archives"),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CategoryDef {
    pub key: Category,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub prefix: String,
    #[serde(default)]
    pub statuses: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HubDef {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub spokes: Vec<String>,
}

// ---------------------------------------------------------------------------
// Tags + style
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TagGroup {
    pub name: String,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct StyleGuidelines {
    #[serde(default)]
    pub naming: BTreeMap<String, NamingConvention>,
    #[serde(default)]
    pub icons: BTreeMap<String, BTreeMap<String, String>>,
    #[serde(default)]
    pub colors: BTreeMap<String, BTreeMap<String, String>>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NamingConvention {
    pub pattern: String,
    #[serde(default)]
    pub examples: Vec<String>,
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl OrganizerConfig {
    pub fn from_toml(input: &str) -> Result<Self, OrganizeError> {
        let config: OrganizerConfig =
            toml::from_str(input).map_err(|e| OrganizeError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// The built-in configuration. Paths stay relative to the working directory.
    pub fn embedded() -> Result<Self, OrganizeError> {
        Self::from_toml(DEFAULT_CONFIG_TOML)
    }

    /// Load a config file; relative `data_dir` resolves against the file's directory.
    pub fn load(path: &Path) -> Result<Self, OrganizeError> {
        let input = std::fs::read_to_string(path).map_err(|e| OrganizeError::ConfigRead {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        let mut config = Self::from_toml(&input)?;
        if let Some(base) = path.parent() {
            if config.data_dir.is_relative() {
                config.data_dir = base.join(&config.data_dir);
            }
        }
        log::debug!("loaded config '{}' from {}", config.name, path.display());
        Ok(config)
    }

    /// Per-user config location, if a config directory is known.
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("sortkeep").join(CONFIG_FILE_NAME))
    }

    pub fn to_toml(&self) -> Result<String, OrganizeError> {
        toml::to_string_pretty(self).map_err(|e| OrganizeError::ConfigParse(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), OrganizeError> {
        if self.datasets.is_empty() {
            return Err(OrganizeError::ConfigValidation(
                "at least one dataset is required".into(),
            ));
        }

        let mut seen = HashSet::new();
        for ds in &self.datasets {
            if ds.id.is_empty() || ds.id.contains(['/', '\\']) {
                return Err(OrganizeError::ConfigValidation(format!(
                    "invalid dataset id '{}'",
                    ds.id
                )));
            }
            if !seen.insert(ds.id.as_str()) {
                return Err(OrganizeError::ConfigValidation(format!(
                    "duplicate dataset id '{}'",
                    ds.id
                )));
            }
            if ds.key_fields.is_empty() {
                return Err(OrganizeError::ConfigValidation(format!(
                    "dataset '{}': key_fields must not be empty",
                    ds.id
                )));
            }
        }

        let prefix = &self.archive.prefix;
        if prefix.is_empty() || prefix.contains(['/', '\\']) {
            return Err(OrganizeError::ConfigValidation(format!(
                "archive prefix '{prefix}' must be non-empty and contain no path separator"
            )));
        }

        let mut keys = HashSet::new();
        for cat in &self.categories {
            if !keys.insert(cat.key) {
                return Err(OrganizeError::ConfigValidation(format!(
                    "category '{}' defined twice",
                    cat.key
                )));
            }
        }

        let mut hubs = HashSet::new();
        for hub in &self.hubs {
            if !hubs.insert(hub.name.as_str()) {
                return Err(OrganizeError::ConfigValidation(format!(
                    "hub '{}' defined twice",
                    hub.name
                )));
            }
        }

        Ok(())
    }

    pub fn dataset(&self, id: &str) -> Option<&DatasetConfig> {
        self.datasets.iter().find(|d| d.id == id)
    }

    pub fn schema_table(&self) -> SchemaTable {
        self.datasets
            .iter()
            .map(|d| (d.id.clone(), d.schema.clone()))
            .collect()
    }

    pub fn dataset_path(&self, dataset: &DatasetConfig) -> PathBuf {
        self.data_dir.join(&dataset.file)
    }

    pub fn archive_dir(&self) -> PathBuf {
        if self.archive.dir.is_absolute() {
            self.archive.dir.clone()
        } else {
            self.data_dir.join(&self.archive.dir)
        }
    }

    pub fn archive_store(&self) -> sortkeep_io::ArchiveStore {
        sortkeep_io::ArchiveStore::new(self.archive_dir(), self.archive.prefix.clone())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
name = "Minimal"
data_dir = "data"

[[datasets]]
id = "draws"
file = "draws.csv"
key_fields = ["Game", "CloseTime"]
hub = "Operations Hub"
category = "areas"

[datasets.schema]
required = ["Game"]
dates = ["CloseTime"]
"#;

    #[test]
    fn parse_minimal() {
        let config = OrganizerConfig::from_toml(MINIMAL).unwrap();
        assert_eq!(config.name, "Minimal");
        assert_eq!(config.datasets.len(), 1);
        assert_eq!(config.archive.prefix, "ARCHIVED_");
        assert_eq!(config.archive_dir(), PathBuf::from("data/archives"));
        assert_eq!(config.datasets[0].category, Category::Areas);
        assert_eq!(config.datasets[0].schema.dates, vec!["CloseTime"]);
        assert!(config.categories.is_empty());
    }

    #[test]
    fn embedded_defaults_are_valid() {
        let config = OrganizerConfig::embedded().unwrap();
        let ids: Vec<&str> = config.datasets.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, ["draws", "participants", "payoutRules", "entries", "payments"]);
        assert_eq!(config.categories.len(), 4);
        assert_eq!(config.hubs.len(), 3);
        assert_eq!(config.tag_groups.len(), 4);
        assert_eq!(
            config.dataset("draws").unwrap().key_fields,
            vec!["Game", "CloseTime"]
        );
        assert_eq!(config.schema_table().len(), 5);
    }

    #[test]
    fn reject_unknown_category() {
        let input = MINIMAL.replace("\"areas\"", "\"area\"");
        let err = OrganizerConfig::from_toml(&input);
        assert!(matches!(err, Err(OrganizeError::ConfigParse(_))));
    }

    #[test]
    fn reject_empty_key_fields() {
        let input = MINIMAL.replace(r#"["Game", "CloseTime"]"#, "[]");
        let err = OrganizerConfig::from_toml(&input).unwrap_err();
        assert!(err.to_string().contains("key_fields"));
    }

    #[test]
    fn reject_duplicate_dataset() {
        let input = format!(
            r#"{MINIMAL}
[[datasets]]
id = "draws"
file = "again.csv"
key_fields = ["Game"]
hub = "Operations Hub"
category = "areas"
"#
        );
        let err = OrganizerConfig::from_toml(&input).unwrap_err();
        assert!(err.to_string().contains("duplicate dataset id 'draws'"));
    }

    #[test]
    fn reject_prefix_with_separator() {
        let input = MINIMAL.replace(
            "data_dir = \"data\"",
            "data_dir = \"data\"\n\n[archive]\nprefix = \"../x\"\n",
        );
        let err = OrganizerConfig::from_toml(&input).unwrap_err();
        assert!(err.to_string().contains("archive prefix"));
    }

    #[test]
    fn reject_empty_datasets() {
        let err = OrganizerConfig::from_toml("name = \"x\"\ndatasets = []\n").unwrap_err();
        assert!(err.to_string().contains("at least one dataset"));
    }

    #[test]
    fn load_resolves_data_dir_against_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, MINIMAL).unwrap();

        let config = OrganizerConfig::load(&path).unwrap();
        assert_eq!(config.data_dir, dir.path().join("data"));
        assert_eq!(
            config.dataset_path(&config.datasets[0]),
            dir.path().join("data").join("draws.csv")
        );
    }

    #[test]
    fn toml_round_trip_of_embedded() {
        let config = OrganizerConfig::embedded().unwrap();
        let text = config.to_toml().unwrap();
        let back = OrganizerConfig::from_toml(&text).unwrap();
        assert_eq!(back.datasets.len(), config.datasets.len());
        assert_eq!(back.schema_table(), config.schema_table());
    }
}
