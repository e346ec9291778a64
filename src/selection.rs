use crate::catalog::{Catalog, IndicatorRecord};
use crate::search::CatalogPick;
use tracing::{debug, warn};

/// Per-session selection, owned by the session and mutated only through interaction handlers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionState {
    pub class_id: Option<String>,
    pub group_id: Option<String>,
    pub variable_id: Option<String>,
    pub main_country: String,
    /// Always contains `main_country`; natural order.
    pub country_set: Vec<String>,
    pub region_tags: Vec<String>,
    pub year_range: (i32, i32),
    /// One-shot transfer of a search result into the cascade.
    pub pending_pick: Option<CatalogPick>,
}

/// Option lists produced by the last resolution, for the dropdowns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CascadeOptions {
    pub classes: Vec<String>,
    pub groups: Vec<String>,
    /// `(variavel, display)` pairs.
    pub variables: Vec<(String, String)>,
}

impl CascadeOptions {
    pub fn is_empty_selection(&self) -> bool {
        self.variables.is_empty()
    }
}

/// Resolves `(class, group, variable)` against a catalog so that every held id is a valid option.
#[derive(Debug, Clone, Copy)]
pub struct CascadeSelector<'a> {
    catalog: &'a Catalog,
    min_class: u32,
}

impl<'a> CascadeSelector<'a> {
    pub fn new(catalog: &'a Catalog, min_class: u32) -> Self {
        Self { catalog, min_class }
    }

    /// One full resolution pass.
    ///
    /// A pending search pick overrides all three levels at once and is consumed; otherwise each
    /// level keeps its previous value when still offered and falls back to the first option.
    /// A pick from a class below `min_class` is dropped and leaves the selection untouched.
    pub fn resolve(&self, state: &mut SelectionState) -> CascadeOptions {
        let classes = self.catalog.classes_at_or_above(self.min_class);

        if let Some(pick) = state.pending_pick.take() {
            if classes.contains(&pick.class_id) {
                debug!(
                    "applying search pick {} ({}/{:?})",
                    pick.variable_id, pick.class_id, pick.group_id
                );
                state.class_id = Some(pick.class_id);
                state.group_id = pick.group_id;
                state.variable_id = Some(pick.variable_id);
            } else {
                warn!(
                    "ignoring search pick {}: class {} is below {}",
                    pick.variable_id, pick.class_id, self.min_class
                );
            }
        }

        state.class_id = keep_or_first(state.class_id.take(), &classes);

        let groups = match state.class_id.as_deref() {
            Some(class_id) => self.catalog.groups_of_class(class_id),
            None => Vec::new(),
        };
        state.group_id = keep_or_first(state.group_id.take(), &groups);

        let records = self.variable_options(state.class_id.as_deref(), state.group_id.as_deref());
        let names: Vec<String> = records.iter().map(|r| r.variavel.clone()).collect();
        state.variable_id = keep_or_first(state.variable_id.take(), &names);

        debug!(
            "resolved class={:?} group={:?} variable={:?}",
            state.class_id, state.group_id, state.variable_id
        );

        CascadeOptions {
            classes,
            groups,
            variables: records
                .into_iter()
                .map(|r| (r.variavel.clone(), r.display()))
                .collect(),
        }
    }

    /// Variables offered under a group, or under the class when it has no groups.
    pub fn variable_options(
        &self,
        class_id: Option<&str>,
        group_id: Option<&str>,
    ) -> Vec<&'a IndicatorRecord> {
        match (class_id, group_id) {
            (_, Some(group)) => self.catalog.variables_of_group(group),
            (Some(class), None) => self.catalog.variables_of_class(class),
            (None, None) => Vec::new(),
        }
    }
}

fn keep_or_first(previous: Option<String>, options: &[String]) -> Option<String> {
    match previous {
        Some(p) if options.contains(&p) => Some(p),
        _ => options.first().cloned(),
    }
}
