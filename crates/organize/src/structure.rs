//! Category (PARA) and hub/spoke recommendations.
//!
//! Pure over configuration: nothing here looks at row data. A dataset whose
//! category or hub has no definition is left out of that grouping.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::config::{Category, CategoryDef, DatasetConfig, HubDef};

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SuggestedDataset {
    pub name: String,
    pub suggested_name: String,
    pub hub: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryGroup {
    pub key: Category,
    pub name: String,
    pub description: String,
    pub prefix: String,
    pub statuses: Vec<String>,
    pub datasets: Vec<SuggestedDataset>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParaStructure {
    pub categories: Vec<CategoryGroup>,
    /// Dataset id → category, for datasets with a defined category.
    pub mapping: BTreeMap<String, Category>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HubGroup {
    pub name: String,
    pub description: String,
    pub spokes: Vec<String>,
    pub connected_datasets: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    Primary,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HubRelation {
    pub hub: String,
    pub spoke: String,
    #[serde(rename = "type")]
    pub kind: RelationKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HubSpokeStructure {
    pub hubs: Vec<HubGroup>,
    pub relations: Vec<HubRelation>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StructureRecommendation {
    pub para: ParaStructure,
    pub hub_spoke: HubSpokeStructure,
}

// ---------------------------------------------------------------------------
// Mapping
// ---------------------------------------------------------------------------

pub fn map_structure(
    datasets: &[DatasetConfig],
    categories: &[CategoryDef],
    hubs: &[HubDef],
) -> StructureRecommendation {
    StructureRecommendation {
        para: para_structure(datasets, categories),
        hub_spoke: hub_spoke_structure(datasets, hubs),
    }
}

pub fn para_structure(datasets: &[DatasetConfig], categories: &[CategoryDef]) -> ParaStructure {
    let mut groups: Vec<CategoryGroup> = categories
        .iter()
        .map(|c| CategoryGroup {
            key: c.key,
            name: c.name.clone(),
            description: c.description.clone(),
            prefix: c.prefix.clone(),
            statuses: c.statuses.clone(),
            datasets: Vec::new(),
        })
        .collect();
    let mut mapping = BTreeMap::new();

    for ds in datasets {
        let Some(group) = groups.iter_mut().find(|g| g.key == ds.category) else {
            log::debug!("{}: category '{}' not defined, omitted", ds.id, ds.category);
            continue;
        };
        group.datasets.push(SuggestedDataset {
            name: ds.id.clone(),
            suggested_name: suggested_name(&group.prefix, &ds.id),
            hub: ds.hub.clone(),
        });
        mapping.insert(ds.id.clone(), ds.category);
    }

    ParaStructure {
        categories: groups,
        mapping,
    }
}

pub fn hub_spoke_structure(datasets: &[DatasetConfig], hubs: &[HubDef]) -> HubSpokeStructure {
    let mut relations = Vec::new();
    let groups = hubs
        .iter()
        .map(|hub| {
            let connected: Vec<String> = datasets
                .iter()
                .filter(|ds| ds.hub == hub.name)
                .map(|ds| ds.id.clone())
                .collect();
            relations.extend(connected.iter().map(|spoke| HubRelation {
                hub: hub.name.clone(),
                spoke: spoke.clone(),
                kind: RelationKind::Primary,
            }));
            HubGroup {
                name: hub.name.clone(),
                description: hub.description.clone(),
                spokes: hub.spokes.clone(),
                connected_datasets: connected,
            }
        })
        .collect();

    HubSpokeStructure {
        hubs: groups,
        relations,
    }
}

/// Category prefix + dataset id with its first letter upper-cased.
pub fn suggested_name(prefix: &str, dataset: &str) -> String {
    let mut chars = dataset.chars();
    match chars.next() {
        Some(first) => format!("{prefix}{}{}", first.to_uppercase(), chars.as_str()),
        None => prefix.to_string(),
    }
}
