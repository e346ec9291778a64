use crate::catalog::{Catalog, IndicatorRecord};
use crate::natural::{compare_ids, compare_names, compare_opt_ids};
use std::collections::HashSet;

/// A search result chosen by the user, handed to the cascade on its next resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogPick {
    pub class_id: String,
    pub group_id: Option<String>,
    pub variable_id: String,
}

impl From<&IndicatorRecord> for CatalogPick {
    fn from(record: &IndicatorRecord) -> Self {
        Self {
            class_id: record.class_id().to_string(),
            group_id: record.group_id(),
            variable_id: record.variavel.clone(),
        }
    }
}

/// Case-insensitive substring search over id, title and variable name.
///
/// An empty (or blank) query matches nothing.
pub fn search<'a>(catalog: &'a Catalog, query: &str) -> Vec<&'a IndicatorRecord> {
    let query = query.trim();
    if query.is_empty() {
        return Vec::new();
    }
    let query_lower = query.to_lowercase();

    let mut seen = HashSet::new();
    let mut hits: Vec<&IndicatorRecord> = catalog
        .records()
        .into_iter()
        .filter(|r| record_matches(r, &query_lower))
        .filter(|r| seen.insert(r.variavel.clone()))
        .collect();

    hits.sort_by(|a, b| {
        compare_ids(a.class_id(), b.class_id())
            .then_with(|| compare_opt_ids(a.group_id().as_deref(), b.group_id().as_deref()))
            .then_with(|| compare_names(&a.variavel, &b.variavel))
    });
    hits
}

/// `search` restricted to records whose class is `min_class` or higher, i.e. hits the cascade
/// can actually select.
pub fn search_from_class<'a>(
    catalog: &'a Catalog,
    query: &str,
    min_class: u32,
) -> Vec<&'a IndicatorRecord> {
    search(catalog, query)
        .into_iter()
        .filter(|r| r.class_id().parse::<u32>().is_ok_and(|n| n >= min_class))
        .collect()
}

fn record_matches(record: &IndicatorRecord, query_lower: &str) -> bool {
    record.id.as_str().to_lowercase().contains(query_lower)
        || record.titulo.to_lowercase().contains(query_lower)
        || record.variavel.to_lowercase().contains(query_lower)
}
