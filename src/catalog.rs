use crate::id::{DottedId, Level, LevelHint};
use crate::natural::{compare_ids, compare_names, sort_ids};
use serde::Deserialize;
use std::{
    cmp::Ordering,
    collections::{BTreeSet, HashMap, HashSet},
    sync::Arc,
};
use tracing::{debug, info, warn};

/// One row of the indicator metadata table, as supplied by the metadata loader.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct MetadataRow {
    pub id: String,
    #[serde(default)]
    pub variavel: Option<String>,
    #[serde(default)]
    pub titulo: Option<String>,
    #[serde(default, rename = "Grupo")]
    pub grupo: Option<String>,
    #[serde(default, rename = "Elemento")]
    pub elemento: Option<String>,
}

impl MetadataRow {
    pub fn new(id: &str, variavel: Option<&str>, titulo: &str) -> Self {
        Self {
            id: id.to_string(),
            variavel: variavel.map(str::to_string),
            titulo: Some(titulo.to_string()),
            grupo: None,
            elemento: None,
        }
    }

    pub fn hint(&self) -> LevelHint {
        let present = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.trim().is_empty());
        LevelHint {
            group: present(&self.grupo),
            element: present(&self.elemento),
        }
    }

    fn variable_name(&self) -> Option<&str> {
        self.variavel
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    fn title(&self) -> String {
        self.titulo.as_deref().unwrap_or_default().trim().to_string()
    }
}

/// A selectable indicator: a variable-level metadata row backed by a panel column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndicatorRecord {
    pub id: DottedId,
    pub variavel: String,
    pub titulo: String,
}

impl IndicatorRecord {
    pub fn class_id(&self) -> &str {
        self.id.class_id()
    }

    pub fn group_id(&self) -> Option<String> {
        self.id.group_id()
    }

    pub fn level(&self) -> Level {
        Level::Variable
    }

    /// `"{id} - {variavel} - {titulo}"`, the dropdown/search display form.
    pub fn display(&self) -> String {
        if self.titulo.is_empty() {
            format!("{} - {}", self.id, self.variavel)
        } else {
            format!("{} - {} - {}", self.id, self.variavel, self.titulo)
        }
    }
}

/// A class or group heading from the metadata; it carries no panel column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub id: DottedId,
    pub level: Level,
    pub titulo: String,
}

/// Counters for rows that did not make it into the catalog.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildReport {
    pub rows: usize,
    pub invalid_ids: usize,
    pub missing_in_panel: usize,
    pub ambiguous_levels: usize,
    pub duplicate_variables: usize,
    pub duplicate_headers: usize,
}

/// Indicator catalog restricted to variables present in the panel.
///
/// All indexes are derived once in [`Catalog::build`]; query results are sorted on read.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    records: Vec<IndicatorRecord>,
    headers: HashMap<String, Header>,
    classes: BTreeSet<String>,
    groups_by_class: HashMap<String, BTreeSet<String>>,
    by_class: HashMap<String, Vec<usize>>,
    by_group: HashMap<String, Vec<usize>>,
    by_variable: HashMap<String, usize>,
    report: BuildReport,
}

impl Catalog {
    pub fn build<S: AsRef<str>>(rows: &[MetadataRow], panel_columns: &[S]) -> Self {
        let columns: HashSet<&str> = panel_columns.iter().map(|c| c.as_ref()).collect();
        let mut report = BuildReport {
            rows: rows.len(),
            ..Default::default()
        };
        let mut headers: HashMap<String, Header> = HashMap::new();
        let mut chosen: HashMap<String, IndicatorRecord> = HashMap::new();

        for row in rows {
            let id = match DottedId::parse(&row.id) {
                Ok(id) => id,
                Err(e) => {
                    debug!("dropping metadata row: {e}");
                    report.invalid_ids += 1;
                    continue;
                }
            };

            let hint = row.hint();
            if hint.is_ambiguous() && id.segments().len() == 3 {
                warn!("id {id} is flagged as both group and element; treating it as a group");
                report.ambiguous_levels += 1;
            }

            match id.level(hint) {
                Level::Class | Level::Group => {
                    let header = Header {
                        level: id.level(hint),
                        titulo: row.title(),
                        id,
                    };
                    match headers.get(header.id.as_str()) {
                        Some(existing) => {
                            report.duplicate_headers += 1;
                            if header_precedence(&header, existing) == Ordering::Less {
                                headers.insert(header.id.as_str().to_string(), header);
                            }
                        }
                        None => {
                            headers.insert(header.id.as_str().to_string(), header);
                        }
                    }
                }
                Level::Variable => {
                    let Some(name) = row.variable_name() else {
                        report.missing_in_panel += 1;
                        continue;
                    };
                    if !columns.contains(name) {
                        debug!("variable {name} ({id}) is not a panel column");
                        report.missing_in_panel += 1;
                        continue;
                    }
                    let record = IndicatorRecord {
                        id,
                        variavel: name.to_string(),
                        titulo: row.title(),
                    };
                    match chosen.get(name) {
                        Some(existing) => {
                            report.duplicate_variables += 1;
                            if record_precedence(&record, existing) == Ordering::Less {
                                chosen.insert(name.to_string(), record);
                            }
                        }
                        None => {
                            chosen.insert(name.to_string(), record);
                        }
                    }
                }
            }
        }

        let mut catalog = Self {
            headers,
            report,
            ..Default::default()
        };
        for header in catalog.headers.values() {
            catalog.classes.insert(header.id.class_id().to_string());
            if let Some(group) = header.id.group_id() {
                catalog
                    .groups_by_class
                    .entry(header.id.class_id().to_string())
                    .or_default()
                    .insert(group);
            }
        }
        for record in chosen.into_values() {
            let idx = catalog.records.len();
            let class = record.class_id().to_string();
            catalog.classes.insert(class.clone());
            catalog.by_class.entry(class.clone()).or_default().push(idx);
            if let Some(group) = record.group_id() {
                catalog
                    .groups_by_class
                    .entry(class)
                    .or_default()
                    .insert(group.clone());
                catalog.by_group.entry(group).or_default().push(idx);
            }
            catalog.by_variable.insert(record.variavel.clone(), idx);
            catalog.records.push(record);
        }

        info!(
            "catalog built: {} variables, {} headers, {} rows dropped",
            catalog.records.len(),
            catalog.headers.len(),
            catalog.report.invalid_ids + catalog.report.missing_in_panel
        );
        catalog
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn report(&self) -> BuildReport {
        self.report
    }

    /// Every variable record, in catalog order.
    pub fn records(&self) -> Vec<&IndicatorRecord> {
        let mut out: Vec<&IndicatorRecord> = self.records.iter().collect();
        out.sort_by(|a, b| record_precedence(a, b));
        out
    }

    /// Class ids whose numeric value is at least `min_class`.
    pub fn classes_at_or_above(&self, min_class: u32) -> Vec<String> {
        let mut out: Vec<String> = self
            .classes
            .iter()
            .filter(|c| c.parse::<u32>().is_ok_and(|n| n >= min_class))
            .cloned()
            .collect();
        sort_ids(&mut out);
        out
    }

    pub fn groups_of_class(&self, class_id: &str) -> Vec<String> {
        let mut out: Vec<String> = self
            .groups_by_class
            .get(class_id)
            .map(|g| g.iter().cloned().collect())
            .unwrap_or_default();
        sort_ids(&mut out);
        out
    }

    pub fn variables_of_group(&self, group_id: &str) -> Vec<&IndicatorRecord> {
        self.collect_sorted(self.by_group.get(group_id))
    }

    pub fn variables_of_class(&self, class_id: &str) -> Vec<&IndicatorRecord> {
        self.collect_sorted(self.by_class.get(class_id))
    }

    pub fn lookup_by_variable(&self, name: &str) -> Option<&IndicatorRecord> {
        self.by_variable.get(name).map(|&idx| &self.records[idx])
    }

    pub fn contains_variable(&self, name: &str) -> bool {
        self.by_variable.contains_key(name)
    }

    /// Metadata title of a variable, falling back to the variable name itself.
    pub fn title_for_variable(&self, name: &str) -> String {
        self.lookup_by_variable(name)
            .map(|r| r.titulo.clone())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| name.to_string())
    }

    pub fn header(&self, id: &str) -> Option<&Header> {
        self.headers.get(id)
    }

    fn collect_sorted(&self, indices: Option<&Vec<usize>>) -> Vec<&IndicatorRecord> {
        let mut out: Vec<&IndicatorRecord> = indices
            .map(|v| v.iter().map(|&i| &self.records[i]).collect())
            .unwrap_or_default();
        out.sort_by(|a, b| record_precedence(a, b));
        out
    }
}

/// Non-empty titles first, then the lowest title.
fn header_precedence(a: &Header, b: &Header) -> Ordering {
    a.titulo
        .is_empty()
        .cmp(&b.titulo.is_empty())
        .then_with(|| a.titulo.cmp(&b.titulo))
}

fn record_precedence(a: &IndicatorRecord, b: &IndicatorRecord) -> Ordering {
    compare_ids(a.id.as_str(), b.id.as_str())
        .then_with(|| compare_names(&a.variavel, &b.variavel))
        .then_with(|| a.titulo.cmp(&b.titulo))
}

/// Content fingerprint of a (metadata, panel columns) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
    /// Independent of row and column order, like the catalog itself.
    pub fn of<S: AsRef<str>>(rows: &[MetadataRow], panel_columns: &[S]) -> Self {
        let mut encoded_rows: Vec<Vec<u8>> = rows.iter().map(encode_row).collect();
        encoded_rows.sort();
        let mut columns: Vec<&str> = panel_columns.iter().map(|c| c.as_ref()).collect();
        columns.sort_unstable();
        columns.dedup();

        let mut hasher = blake3::Hasher::new();
        hasher.update(&(encoded_rows.len() as u64).to_le_bytes());
        for row in &encoded_rows {
            hasher.update(row);
        }
        hasher.update(&(columns.len() as u64).to_le_bytes());
        for column in columns {
            put_str(&mut hasher, column);
        }
        Self(*hasher.finalize().as_bytes())
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn short_hex(&self) -> String {
        self.0[..4].iter().map(|b| format!("{b:02x}")).collect()
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for b in &self.0 {
            write!(f, "{b:02x}")?;
        }
        Ok(())
    }
}

fn put_str(hasher: &mut blake3::Hasher, s: &str) {
    hasher.update(&(s.len() as u64).to_le_bytes());
    hasher.update(s.as_bytes());
}

fn encode_row(row: &MetadataRow) -> Vec<u8> {
    let mut out = Vec::new();
    let mut put = |field: Option<&str>| match field {
        None => out.push(0),
        Some(s) => {
            out.push(1);
            out.extend_from_slice(&(s.len() as u64).to_le_bytes());
            out.extend_from_slice(s.as_bytes());
        }
    };
    put(Some(row.id.as_str()));
    put(row.variavel.as_deref());
    put(row.titulo.as_deref());
    put(row.grupo.as_deref());
    put(row.elemento.as_deref());
    out
}

/// Content-addressed store of built catalogs.
///
/// Entries are immutable once inserted; sessions hold `Arc` clones and never lock.
#[derive(Debug, Default)]
pub struct CatalogCache {
    entries: HashMap<Fingerprint, Arc<Catalog>>,
}

impl CatalogCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_build<S: AsRef<str>>(
        &mut self,
        rows: &[MetadataRow],
        panel_columns: &[S],
    ) -> (Fingerprint, Arc<Catalog>) {
        let fingerprint = Fingerprint::of(rows, panel_columns);
        if let Some(hit) = self.entries.get(&fingerprint) {
            debug!("catalog cache hit {}", fingerprint.short_hex());
            return (fingerprint, Arc::clone(hit));
        }
        let catalog = Arc::new(Catalog::build(rows, panel_columns));
        self.entries.insert(fingerprint, Arc::clone(&catalog));
        (fingerprint, catalog)
    }

    /// Like `get_or_build`, but retires `previous` when the inputs now fingerprint differently.
    pub fn replace<S: AsRef<str>>(
        &mut self,
        previous: Option<&Fingerprint>,
        rows: &[MetadataRow],
        panel_columns: &[S],
    ) -> (Fingerprint, Arc<Catalog>) {
        let (fingerprint, catalog) = self.get_or_build(rows, panel_columns);
        if let Some(old) = previous.filter(|old| **old != fingerprint) {
            debug!("retiring catalog {}", old.short_hex());
            self.invalidate(old);
        }
        (fingerprint, catalog)
    }

    pub fn get(&self, fingerprint: &Fingerprint) -> Option<Arc<Catalog>> {
        self.entries.get(fingerprint).cloned()
    }

    pub fn invalidate(&mut self, fingerprint: &Fingerprint) -> bool {
        self.entries.remove(fingerprint).is_some()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::{Catalog, CatalogCache, Fingerprint, MetadataRow};
    use crate::id::Level;
    use std::sync::Arc;

    fn rows() -> Vec<MetadataRow> {
        vec![
            MetadataRow::new("2", None, "V-Dem Democracy Indices"),
            MetadataRow::new("2.1", None, "High-Level"),
            MetadataRow::new("2.1.1", Some("v2x_libdem"), "Liberal Democracy Index"),
            MetadataRow::new("2.1.2", Some("v2x_polyarchy"), "Electoral Democracy Index"),
            MetadataRow::new("2.2.10", Some("v2x_partip"), "Participatory Component"),
            MetadataRow::new("2.2.9", Some("v2x_egal"), "Egalitarian Component"),
            MetadataRow::new("3.1.1", Some("v2el_absent"), "Not in panel"),
            MetadataRow::new("x.1", Some("v2x_libdem"), "Broken id"),
        ]
    }

    fn columns() -> Vec<&'static str> {
        vec![
            "country_name",
            "year",
            "v2x_libdem",
            "v2x_polyarchy",
            "v2x_partip",
            "v2x_egal",
        ]
    }

    #[test]
    fn build_keeps_only_panel_variables() {
        let catalog = Catalog::build(&rows(), &columns());
        assert_eq!(catalog.len(), 4);
        assert!(catalog.lookup_by_variable("v2el_absent").is_none());
        for record in catalog.records() {
            assert!(columns().contains(&record.variavel.as_str()));
            assert_eq!(record.level(), Level::Variable);
        }

        let report = catalog.report();
        assert_eq!(report.rows, 8);
        assert_eq!(report.invalid_ids, 1);
        assert_eq!(report.missing_in_panel, 1);
    }

    #[test]
    fn queries_are_sorted_naturally() {
        let catalog = Catalog::build(&rows(), &columns());
        assert_eq!(catalog.classes_at_or_above(2), vec!["2".to_string()]);
        assert!(catalog.classes_at_or_above(3).is_empty());
        assert_eq!(
            catalog.groups_of_class("2"),
            vec!["2.1".to_string(), "2.2".to_string()]
        );

        let names: Vec<_> = catalog
            .variables_of_group("2.2")
            .into_iter()
            .map(|r| r.variavel.as_str())
            .collect();
        assert_eq!(names, vec!["v2x_egal", "v2x_partip"]);
        assert_eq!(catalog.variables_of_class("2").len(), 4);
    }

    #[test]
    fn missing_keys_yield_empty_results() {
        let catalog = Catalog::build(&rows(), &columns());
        assert!(catalog.groups_of_class("99").is_empty());
        assert!(catalog.variables_of_group("99.1").is_empty());
        assert!(catalog.variables_of_class("99").is_empty());
        assert_eq!(catalog.title_for_variable("gdp"), "gdp");
        assert_eq!(
            catalog.title_for_variable("v2x_libdem"),
            "Liberal Democracy Index"
        );
    }

    #[test]
    fn build_is_independent_of_row_order() {
        let mut reversed = rows();
        reversed.reverse();
        let a = Catalog::build(&rows(), &columns());
        let b = Catalog::build(&reversed, &columns());
        assert_eq!(a.records(), b.records());
        assert_eq!(a.groups_of_class("2"), b.groups_of_class("2"));
        assert_eq!(
            Fingerprint::of(&rows(), &columns()),
            Fingerprint::of(&reversed, &columns())
        );
    }

    #[test]
    fn duplicate_headers_resolve_the_same_in_any_order() {
        let rows = vec![
            MetadataRow::new("3", None, "Second"),
            MetadataRow::new("3", None, ""),
            MetadataRow::new("3", None, "First"),
            MetadataRow::new("3.1", None, "Parties"),
        ];
        let mut reversed = rows.clone();
        reversed.reverse();
        let a = Catalog::build(&rows, &["v2x_libdem"]);
        let b = Catalog::build(&reversed, &["v2x_libdem"]);

        assert_eq!(a.header("3").map(|h| h.titulo.as_str()), Some("First"));
        assert_eq!(a.header("3"), b.header("3"));
        assert_eq!(a.report().duplicate_headers, 2);

        let mut cache = CatalogCache::new();
        let (fa, _) = cache.get_or_build(&rows, &["v2x_libdem"]);
        let (fb, cached) = cache.get_or_build(&reversed, &["v2x_libdem"]);
        assert_eq!(fa, fb);
        assert_eq!(cached.header("3"), b.header("3"));
    }

    #[test]
    fn duplicate_variables_keep_lowest_id() {
        let rows = vec![
            MetadataRow::new("5.3.1", Some("v2x_libdem"), "Later"),
            MetadataRow::new("2.1.1", Some("v2x_libdem"), "Earlier"),
        ];
        let catalog = Catalog::build(&rows, &["v2x_libdem"]);
        let record = catalog.lookup_by_variable("v2x_libdem").unwrap();
        assert_eq!(record.id.as_str(), "2.1.1");
        assert_eq!(catalog.report().duplicate_variables, 1);
    }

    #[test]
    fn group_flagged_rows_become_headers() {
        let mut sub = MetadataRow::new("3.1.2", None, "Subgroup");
        sub.grupo = Some("x".to_string());
        let rows = vec![sub, MetadataRow::new("3.1.2.1", Some("v2elmulpar"), "Multiparty")];
        let catalog = Catalog::build(&rows, &["v2elmulpar"]);
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.header("3.1.2").map(|h| h.level), Some(Level::Group));
        assert_eq!(catalog.groups_of_class("3"), vec!["3.1".to_string()]);
        assert_eq!(catalog.variables_of_group("3.1").len(), 1);
    }

    #[test]
    fn cache_reuses_catalog_for_same_content() {
        let mut cache = CatalogCache::new();
        let (fp1, a) = cache.get_or_build(&rows(), &columns());
        let (fp2, b) = cache.get_or_build(&rows(), &columns());
        assert_eq!(fp1, fp2);
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(cache.len(), 1);

        assert!(cache.invalidate(&fp1));
        assert!(cache.get(&fp1).is_none());
        let (_, c) = cache.get_or_build(&rows(), &columns());
        assert!(!Arc::ptr_eq(&a, &c));
    }

    #[test]
    fn replace_retires_the_previous_catalog() {
        let mut cache = CatalogCache::new();
        let (first, a) = cache.replace(None, &rows(), &columns());

        let (same, b) = cache.replace(Some(&first), &rows(), &columns());
        assert_eq!(same, first);
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(cache.len(), 1);

        let (second, _) = cache.replace(Some(&first), &rows()[..3], &columns());
        assert_ne!(second, first);
        assert_eq!(cache.len(), 1);
        assert!(cache.get(&first).is_none());
        assert!(cache.get(&second).is_some());
    }
}
