use crate::natural::{compare_names, sort_names};
use crate::statics;
use crate::value::CellValue;
use indexmap::IndexMap;
use std::collections::{BTreeMap, HashSet};

/// One country-year observation as handed over by the panel loader.
#[derive(Debug, Clone, PartialEq)]
pub struct PanelRow {
    pub country: String,
    pub year: i32,
    pub values: IndexMap<String, CellValue>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SeriesPoint {
    pub year: i32,
    pub country: String,
    pub value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Aggregation {
    #[default]
    Mean,
    Median,
    LastYear,
}

impl Aggregation {
    pub const ALL: [Aggregation; 3] = [
        Aggregation::Mean,
        Aggregation::Median,
        Aggregation::LastYear,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Aggregation::Mean => statics::EN_AGG_MEAN,
            Aggregation::Median => statics::EN_AGG_MEDIAN,
            Aggregation::LastYear => statics::EN_AGG_LAST_YEAR,
        }
    }
}

/// Country-year table stored column-wise.
#[derive(Debug, Clone, Default)]
pub struct Panel {
    countries: Vec<String>,
    years: Vec<i32>,
    columns: IndexMap<String, Vec<CellValue>>,
    numeric: HashSet<String>,
}

impl Panel {
    pub fn from_rows(rows: Vec<PanelRow>) -> Self {
        let mut names: IndexMap<String, ()> = IndexMap::new();
        for row in &rows {
            for key in row.values.keys() {
                if key != statics::COL_COUNTRY && key != statics::COL_YEAR {
                    names.entry(key.clone()).or_default();
                }
            }
        }

        let mut panel = Self {
            countries: Vec::with_capacity(rows.len()),
            years: Vec::with_capacity(rows.len()),
            columns: names
                .into_keys()
                .map(|k| (k, Vec::with_capacity(rows.len())))
                .collect(),
            numeric: HashSet::new(),
        };

        for mut row in rows {
            panel.countries.push(row.country);
            panel.years.push(row.year);
            for (name, cells) in panel.columns.iter_mut() {
                cells.push(row.values.swap_remove(name).unwrap_or(CellValue::Null));
            }
        }

        panel.numeric = panel
            .columns
            .iter()
            .filter(|(_, cells)| cells.iter().all(|c| !matches!(c, CellValue::Text(_))))
            .map(|(name, _)| name.clone())
            .collect();
        panel
    }

    pub fn row_count(&self) -> usize {
        self.years.len()
    }

    pub fn is_empty(&self) -> bool {
        self.years.is_empty()
    }

    /// Every column name, including the country and year key columns.
    pub fn column_names(&self) -> Vec<String> {
        let mut out = vec![
            statics::COL_COUNTRY.to_string(),
            statics::COL_YEAR.to_string(),
        ];
        out.extend(self.columns.keys().cloned());
        out
    }

    pub fn has_column(&self, name: &str) -> bool {
        name == statics::COL_COUNTRY || name == statics::COL_YEAR || self.columns.contains_key(name)
    }

    pub fn is_numeric(&self, name: &str) -> bool {
        name == statics::COL_YEAR || self.numeric.contains(name)
    }

    /// Numeric indicator columns, skipping `year` and auxiliary statistic columns.
    pub fn numeric_candidates<S: AsRef<str>>(&self, excluded_suffixes: &[S]) -> Vec<String> {
        let mut out: Vec<String> = self
            .columns
            .keys()
            .filter(|name| self.numeric.contains(*name))
            .filter(|name| !excluded_suffixes.iter().any(|s| name.ends_with(s.as_ref())))
            .cloned()
            .collect();
        sort_names(&mut out);
        out
    }

    /// First preferred variable that is a numeric column, else the first numeric candidate in
    /// column order. Only names passing `accept` are considered.
    pub fn default_variable<S: AsRef<str>, T: AsRef<str>>(
        &self,
        preferred: &[S],
        excluded_suffixes: &[T],
        accept: impl Fn(&str) -> bool,
    ) -> Option<String> {
        let is_aux = |name: &str| excluded_suffixes.iter().any(|s| name.ends_with(s.as_ref()));
        preferred
            .iter()
            .map(|p| p.as_ref())
            .find(|p| self.numeric.contains(*p) && accept(*p))
            .or_else(|| {
                self.columns
                    .keys()
                    .map(String::as_str)
                    .filter(|name| self.numeric.contains(*name))
                    .find(|name| !is_aux(*name) && accept(*name))
            })
            .map(str::to_string)
    }

    pub fn available_countries(&self) -> Vec<String> {
        let mut out: Vec<String> = self
            .countries
            .iter()
            .filter(|c| !c.trim().is_empty())
            .cloned()
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        sort_names(&mut out);
        out
    }

    pub fn year_bounds(&self) -> Option<(i32, i32)> {
        let min = self.years.iter().min()?;
        let max = self.years.iter().max()?;
        Some((*min, *max))
    }

    /// Non-null numeric observations of `variable`, sorted by year then country.
    pub fn series(
        &self,
        variable: &str,
        countries: &[String],
        (min_year, max_year): (i32, i32),
    ) -> Vec<SeriesPoint> {
        let Some(cells) = self.columns.get(variable) else {
            return Vec::new();
        };
        let wanted: HashSet<&str> = countries.iter().map(String::as_str).collect();

        let mut out: Vec<SeriesPoint> = (0..self.row_count())
            .filter(|&i| (min_year..=max_year).contains(&self.years[i]))
            .filter(|&i| wanted.contains(self.countries[i].as_str()))
            .filter_map(|i| {
                cells[i].as_f64().map(|value| SeriesPoint {
                    year: self.years[i],
                    country: self.countries[i].clone(),
                    value,
                })
            })
            .collect();
        out.sort_by(|a, b| {
            a.year
                .cmp(&b.year)
                .then_with(|| compare_names(&a.country, &b.country))
        });
        out
    }

    /// One value per country over the year window; `countries = None` means every country.
    pub fn aggregate(
        &self,
        variable: &str,
        countries: Option<&[String]>,
        year_range: (i32, i32),
        how: Aggregation,
    ) -> Vec<(String, f64)> {
        let countries = match countries {
            Some(c) => c.to_vec(),
            None => self.available_countries(),
        };
        let mut by_country: BTreeMap<String, Vec<(i32, f64)>> = BTreeMap::new();
        for point in self.series(variable, &countries, year_range) {
            by_country
                .entry(point.country)
                .or_default()
                .push((point.year, point.value));
        }

        let mut out: Vec<(String, f64)> = by_country
            .into_iter()
            .filter_map(|(country, points)| {
                let value = match how {
                    Aggregation::Mean => {
                        points.iter().map(|(_, v)| v).sum::<f64>() / points.len() as f64
                    }
                    Aggregation::Median => median(points.iter().map(|(_, v)| *v).collect())?,
                    Aggregation::LastYear => points
                        .iter()
                        .find(|(y, _)| *y == year_range.1)
                        .map(|(_, v)| *v)?,
                };
                Some((country, value))
            })
            .collect();
        out.sort_by(|a, b| compare_names(&a.0, &b.0));
        out
    }
}

fn median(mut values: Vec<f64>) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(f64::total_cmp);
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        Some((values[mid - 1] + values[mid]) / 2.0)
    } else {
        Some(values[mid])
    }
}
