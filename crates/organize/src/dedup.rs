use std::collections::HashMap;

use serde::Serialize;
use sortkeep_io::Record;

/// Joins normalized key values. Not expected to occur in business data.
pub const KEY_SEPARATOR: &str = "|";

/// A later row whose composite key matches an earlier one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateGroup {
    pub key: String,
    pub original: Record,
    pub duplicate: Record,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Partition {
    pub unique: Vec<Record>,
    pub duplicates: Vec<DuplicateGroup>,
}

/// Normalized composite key, or `None` when every key field is blank.
pub fn composite_key(record: &Record, key_fields: &[String]) -> Option<String> {
    let parts: Vec<String> = key_fields
        .iter()
        .map(|f| record.value(f).trim().to_lowercase())
        .collect();
    if parts.iter().all(|p| p.is_empty()) {
        return None;
    }
    Some(parts.join(KEY_SEPARATOR))
}

/// Split rows into first occurrences and duplicates, in input order.
///
/// The first row seen for a key is canonical; each later row with that key
/// yields one group against it. Rows with an all-blank key are always unique.
pub fn detect(rows: &[Record], key_fields: &[String]) -> Partition {
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut out = Partition::default();

    for row in rows {
        let Some(key) = composite_key(row, key_fields) else {
            out.unique.push(row.clone());
            continue;
        };

        match seen.get(&key) {
            Some(&idx) => out.duplicates.push(DuplicateGroup {
                key,
                original: out.unique[idx].clone(),
                duplicate: row.clone(),
            }),
            None => {
                seen.insert(key, out.unique.len());
                out.unique.push(row.clone());
            }
        }
    }

    out
}
