//! One interactive exploration session.
//!
//! `Session` owns the `SelectionState` and is the only thing that mutates it. Every interaction
//! handler changes one input and then runs a single resolution pass, so the cascade and the
//! country set are consistent again before control returns to the caller.

use crate::catalog::{Catalog, IndicatorRecord};
use crate::config::{CatalogLabels, ExplorerConfig};
use crate::natural::{compare_names, sort_names};
use crate::palette::{self, Hsl};
use crate::panel::{Aggregation, Panel, SeriesPoint};
use crate::region::RegionComposer;
use crate::search::{self, CatalogPick};
use crate::selection::{CascadeOptions, CascadeSelector, SelectionState};
use std::sync::Arc;
use tracing::{debug, info};

/// What a chart or map needs to draw the current selection.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderRequest {
    pub variable_id: String,
    pub title: String,
    /// Legend order: main country first.
    pub countries: Vec<String>,
    pub year_range: (i32, i32),
    pub colors: Vec<(String, Hsl)>,
    pub numeric: bool,
}

impl RenderRequest {
    /// Non-numeric variables and empty windows render as "nothing to show", not as errors.
    pub fn is_renderable(&self) -> bool {
        self.numeric && !self.countries.is_empty() && self.year_range.0 <= self.year_range.1
    }

    pub fn color_of(&self, country: &str) -> Option<Hsl> {
        self.colors
            .iter()
            .find(|(c, _)| c == country)
            .map(|(_, hsl)| *hsl)
    }
}

#[derive(Debug, Clone)]
pub struct Session {
    catalog: Arc<Catalog>,
    panel: Arc<Panel>,
    composer: RegionComposer,
    labels: CatalogLabels,
    seed: u64,
    min_class: u32,
    countries: Vec<String>,
    year_bounds: (i32, i32),
    state: SelectionState,
    options: CascadeOptions,
}

impl Session {
    /// Fresh session: default country, full year window, preferred variable picked if present.
    pub fn start(catalog: Arc<Catalog>, panel: Arc<Panel>, config: &ExplorerConfig) -> Self {
        let countries = panel.available_countries();
        let year_bounds = panel.year_bounds().unwrap_or_default();

        let main_country = if countries.contains(&config.default_country) || countries.is_empty()
        {
            config.default_country.clone()
        } else {
            countries[0].clone()
        };

        let pending_pick = panel
            .default_variable(
                &config.preferred_variables,
                &config.excluded_suffixes,
                |name| catalog.contains_variable(name),
            )
            .and_then(|name| catalog.lookup_by_variable(&name))
            .map(CatalogPick::from);

        let composer = config.region_composer();
        let state = SelectionState {
            country_set: composer.compose::<&str>(&main_country, &[], &countries),
            main_country,
            year_range: year_bounds,
            pending_pick,
            ..Default::default()
        };

        let mut session = Self {
            catalog,
            panel,
            composer,
            labels: config.labels(),
            seed: config.seed,
            min_class: config.min_class,
            countries,
            year_bounds,
            state,
            options: CascadeOptions::default(),
        };
        session.resolve();
        info!(
            "session started: {} countries, years {:?}, variable {:?}",
            session.countries.len(),
            session.year_bounds,
            session.state.variable_id
        );
        session
    }

    fn resolve(&mut self) {
        self.options = CascadeSelector::new(&self.catalog, self.min_class).resolve(&mut self.state);
    }

    fn recompose(&mut self) {
        self.state.country_set = self.composer.compose(
            &self.state.main_country,
            &self.state.region_tags,
            &self.countries,
        );
        debug!(
            "country set for {} + {:?}: {} countries",
            self.state.main_country,
            self.state.region_tags,
            self.state.country_set.len()
        );
    }

    pub fn state(&self) -> &SelectionState {
        &self.state
    }

    pub fn options(&self) -> &CascadeOptions {
        &self.options
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    pub fn panel(&self) -> &Arc<Panel> {
        &self.panel
    }

    pub fn available_countries(&self) -> &[String] {
        &self.countries
    }

    pub fn year_bounds(&self) -> (i32, i32) {
        self.year_bounds
    }

    pub fn region_tags(&self) -> Vec<&str> {
        self.composer.regions().tags().collect()
    }

    /// `(class_id, display)` pairs for the class dropdown.
    pub fn class_choices(&self) -> Vec<(String, String)> {
        self.options
            .classes
            .iter()
            .map(|id| (id.clone(), self.labels.class_display(&self.catalog, id)))
            .collect()
    }

    pub fn group_choices(&self) -> Vec<(String, String)> {
        self.options
            .groups
            .iter()
            .map(|id| (id.clone(), self.labels.group_display(&self.catalog, id)))
            .collect()
    }

    pub fn pick_class(&mut self, class_id: &str) {
        self.state.class_id = Some(class_id.to_string());
        self.resolve();
    }

    pub fn pick_group(&mut self, group_id: &str) {
        self.state.group_id = Some(group_id.to_string());
        self.resolve();
    }

    pub fn pick_variable(&mut self, variable_id: &str) {
        self.state.variable_id = Some(variable_id.to_string());
        self.resolve();
    }

    /// Only hits the cascade can select are returned.
    pub fn search(&self, query: &str) -> Vec<&IndicatorRecord> {
        search::search_from_class(&self.catalog, query, self.min_class)
    }

    /// Move a search result into the cascade. Applied on this resolution pass only.
    pub fn pick_search_result(&mut self, pick: CatalogPick) {
        self.state.pending_pick = Some(pick);
        self.resolve();
    }

    /// Swaps the main country inside the current set, keeping manual edits.
    ///
    /// The old main country stays only when one of the selected regions contributes it.
    pub fn set_main_country(&mut self, country: &str) {
        if self.state.main_country == country {
            return;
        }
        let old = std::mem::replace(&mut self.state.main_country, country.to_string());
        let from_regions = self
            .composer
            .compose(country, &self.state.region_tags, &self.countries)
            .contains(&old);
        let set = &mut self.state.country_set;
        if !from_regions {
            set.retain(|c| *c != old);
        }
        if !set.iter().any(|c| c == country) {
            set.push(country.to_string());
        }
        sort_names(set);
        debug!(
            "main country {old} -> {country}: {} countries",
            self.state.country_set.len()
        );
    }

    /// Replacing the tags discards manual country edits.
    pub fn set_region_tags(&mut self, tags: Vec<String>) {
        self.state.region_tags = tags;
        self.recompose();
    }

    /// Returns `false` when the country is unknown or already in the set.
    pub fn add_country(&mut self, country: &str) -> bool {
        if !self.countries.iter().any(|c| c == country)
            || self.state.country_set.iter().any(|c| c == country)
        {
            return false;
        }
        self.state.country_set.push(country.to_string());
        sort_names(&mut self.state.country_set);
        true
    }

    /// The main country cannot be removed.
    pub fn remove_country(&mut self, country: &str) -> bool {
        if country == self.state.main_country {
            return false;
        }
        let before = self.state.country_set.len();
        self.state.country_set.retain(|c| c != country);
        self.state.country_set.len() != before
    }

    /// Clamped to the panel's years; reversed bounds are swapped.
    pub fn set_year_range(&mut self, (a, b): (i32, i32)) {
        let (lo, hi) = self.year_bounds;
        let (a, b) = (a.clamp(lo, hi), b.clamp(lo, hi));
        self.state.year_range = (a.min(b), a.max(b));
    }

    /// Main country first, then the rest of the set in natural order.
    pub fn legend(&self) -> Vec<String> {
        let main = &self.state.main_country;
        let mut rest: Vec<String> = self
            .state
            .country_set
            .iter()
            .filter(|c| *c != main)
            .cloned()
            .collect();
        rest.sort_by(|a, b| compare_names(a, b));
        let mut out = Vec::with_capacity(rest.len() + 1);
        out.push(main.clone());
        out.extend(rest);
        out
    }

    pub fn render_request(&self) -> Option<RenderRequest> {
        let variable_id = self.state.variable_id.clone()?;
        let countries = self.legend();
        let colors = countries
            .iter()
            .cloned()
            .zip(palette::assign(countries.len(), self.seed))
            .collect();
        Some(RenderRequest {
            title: self.catalog.title_for_variable(&variable_id),
            numeric: self.panel.is_numeric(&variable_id),
            variable_id,
            countries,
            year_range: self.state.year_range,
            colors,
        })
    }

    pub fn series(&self) -> Vec<SeriesPoint> {
        match self.render_request() {
            Some(req) if req.is_renderable() => {
                self.panel
                    .series(&req.variable_id, &req.countries, req.year_range)
            }
            _ => Vec::new(),
        }
    }

    /// Per-country summary over the year window, for the country set or for every country.
    pub fn aggregate(&self, how: Aggregation, all_countries: bool) -> Vec<(String, f64)> {
        let Some(req) = self.render_request().filter(RenderRequest::is_renderable) else {
            return Vec::new();
        };
        let countries = (!all_countries).then_some(req.countries.as_slice());
        self.panel
            .aggregate(&req.variable_id, countries, req.year_range, how)
    }
}

#[cfg(test)]
mod tests {
    use super::Session;
    use crate::catalog::{Catalog, MetadataRow};
    use crate::config::ExplorerConfig;
    use crate::panel::tests::{row, sample};
    use crate::panel::{Aggregation, Panel};
    use crate::region::RegionMap;
    use crate::search::CatalogPick;
    use crate::value::CellValue;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    fn config() -> ExplorerConfig {
        ExplorerConfig {
            regions: RegionMap::from_iter([(
                "América do Sul".to_string(),
                vec![
                    "Argentina".to_string(),
                    "Brazil".to_string(),
                    "Chile".to_string(),
                    "Peru".to_string(),
                ],
            )]),
            ..Default::default()
        }
    }

    fn session() -> Session {
        let panel = sample();
        let rows = vec![
            MetadataRow::new("2", None, "Indices"),
            MetadataRow::new("2.1", None, "High-Level"),
            MetadataRow::new("2.1.1", Some("v2x_libdem"), "Liberal Democracy Index"),
            MetadataRow::new("5", None, "Other"),
            MetadataRow::new("5.1", None, "Text"),
            MetadataRow::new("5.1.1", Some("regime"), "Regime label"),
        ];
        let catalog = Catalog::build(&rows, &panel.column_names());
        Session::start(Arc::new(catalog), Arc::new(panel), &config())
    }

    #[test]
    fn start_applies_defaults() {
        let s = session();
        assert_eq!(s.state().main_country, "Brazil");
        assert_eq!(s.state().country_set, vec!["Brazil"]);
        assert_eq!(s.state().year_range, (2000, 2002));
        assert_eq!(s.state().class_id.as_deref(), Some("2"));
        assert_eq!(s.state().group_id.as_deref(), Some("2.1"));
        assert_eq!(s.state().variable_id.as_deref(), Some("v2x_libdem"));
        assert_eq!(s.state().pending_pick, None);
        assert_eq!(
            s.class_choices()[0],
            ("2".to_string(), "2 - Índices de Democracia do V-Dem".to_string())
        );
    }

    #[test]
    fn missing_default_country_falls_back_to_first_known() {
        let panel = Panel::from_rows(vec![row("Chile", 1990, &[("x", CellValue::Number(1.0))])]);
        let catalog = Catalog::build(&[], &panel.column_names());
        let s = Session::start(Arc::new(catalog), Arc::new(panel), &config());
        assert_eq!(s.state().main_country, "Chile");
        assert_eq!(s.state().variable_id, None);
        assert_eq!(s.render_request(), None);
    }

    #[test]
    fn regions_and_manual_edits() {
        let mut s = session();
        s.set_region_tags(vec!["América do Sul".to_string()]);
        assert_eq!(s.state().country_set, vec!["Argentina", "Brazil", "Chile"]);

        assert!(s.remove_country("Chile"));
        assert!(!s.remove_country("Brazil"));
        assert!(!s.add_country("Atlantis"));
        assert_eq!(s.state().country_set, vec!["Argentina", "Brazil"]);

        // Re-selecting the same main country keeps the manual edit.
        s.set_main_country("Brazil");
        assert_eq!(s.state().country_set, vec!["Argentina", "Brazil"]);

        s.set_region_tags(vec!["None".to_string(), "América do Sul".to_string()]);
        assert_eq!(s.state().country_set, vec!["Brazil"]);
        assert!(s.add_country("Chile"));
        assert!(!s.add_country("Chile"));
    }

    #[test]
    fn main_country_change_keeps_manual_edits() {
        let mut s = session();
        assert!(s.add_country("Chile"));
        assert_eq!(s.state().country_set, vec!["Brazil", "Chile"]);

        s.set_main_country("Argentina");
        assert_eq!(s.state().country_set, vec!["Argentina", "Chile"]);

        // A main country brought in by a selected region stays when it is replaced.
        s.set_region_tags(vec!["América do Sul".to_string()]);
        assert!(s.remove_country("Chile"));
        s.set_main_country("Brazil");
        assert_eq!(s.state().country_set, vec!["Argentina", "Brazil"]);
    }

    #[test]
    fn search_only_offers_selectable_classes() {
        let panel = sample();
        let rows = vec![
            MetadataRow::new("1", None, "Identifiers"),
            MetadataRow::new("1.1", None, "Country"),
            MetadataRow::new("1.1.1", Some("v2x_libdem_sd"), "Libdem SD"),
            MetadataRow::new("2", None, "Indices"),
            MetadataRow::new("2.1", None, "High-Level"),
            MetadataRow::new("2.1.1", Some("v2x_libdem"), "Liberal Democracy Index"),
        ];
        let catalog = Catalog::build(&rows, &panel.column_names());
        let mut s = Session::start(Arc::new(catalog), Arc::new(panel), &config());

        let hits: Vec<_> = s.search("libdem").iter().map(|r| r.variavel.clone()).collect();
        assert_eq!(hits, vec!["v2x_libdem"]);

        s.pick_search_result(CatalogPick {
            class_id: "1".to_string(),
            group_id: Some("1.1".to_string()),
            variable_id: "v2x_libdem_sd".to_string(),
        });
        assert_eq!(s.state().class_id.as_deref(), Some("2"));
        assert_eq!(s.state().variable_id.as_deref(), Some("v2x_libdem"));
        assert_eq!(s.state().pending_pick, None);
    }

    #[test]
    fn legend_puts_main_country_first() {
        let mut s = session();
        s.set_main_country("Chile");
        s.set_region_tags(vec!["América do Sul".to_string()]);
        let req = s.render_request().unwrap();
        assert_eq!(req.countries, vec!["Chile", "Argentina", "Brazil"]);
        assert_eq!(req.colors.len(), 3);
        assert_eq!(req.color_of("Chile"), Some(crate::palette::base_palette()[0]));
        assert_eq!(req.title, "Liberal Democracy Index");
        assert!(req.is_renderable());
    }

    #[test]
    fn year_range_is_clamped_and_ordered() {
        let mut s = session();
        s.set_year_range((2010, 1990));
        assert_eq!(s.state().year_range, (2000, 2002));
        s.set_year_range((2002, 2001));
        assert_eq!(s.state().year_range, (2001, 2002));
    }

    #[test]
    fn search_pick_moves_the_cascade() {
        let mut s = session();
        let hit = CatalogPick::from(s.search("regime")[0]);
        s.pick_search_result(hit);
        assert_eq!(s.state().class_id.as_deref(), Some("5"));
        assert_eq!(s.state().variable_id.as_deref(), Some("regime"));

        // Text columns resolve but do not render.
        let req = s.render_request().unwrap();
        assert!(!req.numeric);
        assert!(!req.is_renderable());
        assert!(s.series().is_empty());
        assert!(s.aggregate(Aggregation::Mean, true).is_empty());

        s.pick_class("2");
        assert_eq!(s.state().variable_id.as_deref(), Some("v2x_libdem"));
    }

    #[test]
    fn series_and_aggregates_follow_the_selection() {
        let mut s = session();
        s.set_region_tags(vec!["América do Sul".to_string()]);
        s.set_year_range((2001, 2002));
        let years: Vec<_> = s.series().iter().map(|p| (p.year, p.country.clone())).collect();
        assert_eq!(
            years,
            vec![
                (2001, "Argentina".to_string()),
                (2001, "Brazil".to_string()),
                (2002, "Brazil".to_string()),
            ]
        );
        let last = s.aggregate(Aggregation::LastYear, false);
        assert_eq!(last, vec![("Brazil".to_string(), 0.8)]);
        assert_eq!(s.aggregate(Aggregation::Mean, true).len(), 2);
    }
}
