use crate::natural::sort_names;
use crate::statics;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};

/// `region tag -> countries`. The `"None"` tag maps to nothing and means "main country only".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegionMap(IndexMap<String, Vec<String>>);

impl RegionMap {
    pub fn new(entries: IndexMap<String, Vec<String>>) -> Self {
        let mut map = Self(entries);
        map.0
            .entry(statics::REGION_NONE.to_string())
            .or_default();
        map
    }

    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn members(&self, tag: &str) -> &[String] {
        self.0.get(tag).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn into_inner(self) -> IndexMap<String, Vec<String>> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, Vec<String>)> for RegionMap {
    fn from_iter<I: IntoIterator<Item = (String, Vec<String>)>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Builds the working country set from a main country and region tags.
#[derive(Debug, Clone, Default)]
pub struct RegionComposer {
    regions: RegionMap,
}

impl RegionComposer {
    pub fn new(regions: RegionMap) -> Self {
        Self { regions }
    }

    pub fn regions(&self) -> &RegionMap {
        &self.regions
    }

    /// Main country plus every known member of the selected regions, in natural order.
    ///
    /// No tags, or `"None"` among the tags, yields just the main country. The main country is
    /// always part of the result, even when it is not in `known_countries`.
    pub fn compose<S: AsRef<str>>(
        &self,
        main_country: &str,
        region_tags: &[S],
        known_countries: &[String],
    ) -> Vec<String> {
        let wants_none = region_tags
            .iter()
            .any(|t| t.as_ref() == statics::REGION_NONE);
        if region_tags.is_empty() || wants_none {
            return vec![main_country.to_string()];
        }

        let known: HashSet<&str> = known_countries.iter().map(String::as_str).collect();
        let mut out: BTreeSet<String> = BTreeSet::new();
        out.insert(main_country.to_string());
        for tag in region_tags {
            for country in self.regions.members(tag.as_ref()) {
                if known.contains(country.as_str()) {
                    out.insert(country.clone());
                }
            }
        }

        let mut out: Vec<String> = out.into_iter().collect();
        sort_names(&mut out);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::{RegionComposer, RegionMap};
    use crate::statics;
    use pretty_assertions::assert_eq;

    fn composer() -> RegionComposer {
        RegionComposer::new(RegionMap::from_iter([
            (
                "América do Sul".to_string(),
                vec![
                    "Argentina".to_string(),
                    "Brazil".to_string(),
                    "Chile".to_string(),
                    "Guyana".to_string(),
                ],
            ),
            (
                "África".to_string(),
                vec!["Angola".to_string(), "Kenya".to_string()],
            ),
        ]))
    }

    fn known() -> Vec<String> {
        ["Angola", "Argentina", "Brazil", "Chile", "Kenya", "Norway"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    #[test]
    fn none_sentinel_is_always_present() {
        let composer = composer();
        assert!(composer.regions().tags().any(|t| t == statics::REGION_NONE));
        assert!(composer.regions().members(statics::REGION_NONE).is_empty());
    }

    #[test]
    fn region_members_are_intersected_with_known_countries() {
        let composer = composer();
        let out = composer.compose("Brazil", &["América do Sul"], &known());
        assert_eq!(out, vec!["Argentina", "Brazil", "Chile"]);
    }

    #[test]
    fn multiple_regions_union() {
        let composer = composer();
        let out = composer.compose("Norway", &["América do Sul", "África"], &known());
        assert_eq!(
            out,
            vec!["Angola", "Argentina", "Brazil", "Chile", "Kenya", "Norway"]
        );
    }

    #[test]
    fn none_or_empty_keeps_only_main_country() {
        let composer = composer();
        assert_eq!(
            composer.compose("Brazil", &["None", "África"], &known()),
            vec!["Brazil"]
        );
        let no_tags: [&str; 0] = [];
        assert_eq!(composer.compose("Brazil", &no_tags, &known()), vec!["Brazil"]);
    }

    #[test]
    fn compose_is_idempotent() {
        let composer = composer();
        let a = composer.compose("Brazil", &["América do Sul", "Unknown"], &known());
        let b = composer.compose("Brazil", &["América do Sul", "Unknown"], &known());
        assert_eq!(a, b);
    }
}
