// Central place for UI strings and other non-localized constants.
// Keep these out of gui.rs to reduce duplication and make tweaks safer.

// External links
pub const VDEM_URL: &str = "https://www.v-dem.net/data/the-v-dem-dataset/";

// English UI strings (EN_ prefix to make future localization easier)
pub const EN_APP_TITLE: &str = "DEMEX: Democracy Panel Explorer";

pub const EN_BTN_OPEN_PANEL: &str = "Open Panel...";
pub const EN_BTN_OPEN_METADATA: &str = "Open Metadata...";
pub const EN_BTN_RELOAD: &str = "Reload";
pub const EN_BTN_ABOUT: &str = "About";
pub const EN_BTN_TOGGLE_THEME: &str = "Theme";
pub const EN_BTN_CLEAR: &str = "Clear";
pub const EN_BTN_USE: &str = "Use";
pub const EN_BTN_ADD: &str = "Add";
pub const EN_BTN_REMOVE: &str = "x";

pub const EN_WINDOW_ABOUT: &str = "About";

pub const EN_ABOUT_HEADING: &str = "DEMEX: Democracy Panel Explorer";
pub const EN_ABOUT_VERSION: &str = "Version:";
pub const EN_ABOUT_DATA: &str = "Country-year indicators from the V-Dem dataset.";
pub const EN_ABOUT_LOGGING: &str = "Set RUST_LOG (e.g. demex=debug) for verbose logs.";
pub const EN_PROJECT_DATA: &str = "V-Dem Dataset";

pub const EN_HOME_HEADING: &str = "DEMEX: Democracy Panel Explorer";
pub const EN_HOME_INSTRUCTIONS: &str =
    "Open a V-Dem panel (.csv/.csv.gz) and an indicator metadata file (.csv/.json5) to begin.";
pub const EN_HOME_PANEL: &str = "Panel:";
pub const EN_HOME_METADATA: &str = "Metadata:";

pub const EN_HEADING_SELECTION: &str = "Selection";
pub const EN_HEADING_COUNTRIES: &str = "Countries";
pub const EN_HEADING_SERIES: &str = "Time series";
pub const EN_HEADING_AGGREGATE: &str = "Country summary";

pub const EN_LABEL_MAIN_COUNTRY: &str = "Main country";
pub const EN_LABEL_REGIONS: &str = "Regions";
pub const EN_LABEL_YEARS: &str = "Years";
pub const EN_LABEL_CLASS: &str = "Class";
pub const EN_LABEL_GROUP: &str = "Group";
pub const EN_LABEL_VARIABLE: &str = "Variable";
pub const EN_LABEL_SEARCH: &str = "Search:";
pub const EN_LABEL_AGGREGATION: &str = "Aggregation:";
pub const EN_LABEL_ADD_COUNTRY: &str = "Add country:";
pub const EN_CHECKBOX_ALL_COUNTRIES: &str = "All countries";

pub const EN_HINT_SEARCH: &str = "name, title or id";
pub const EN_SEARCH_NO_MATCHES: &str = "No matches.";
pub const EN_EMPTY_SELECTION: &str = "No variables available for this selection.";
pub const EN_NOT_NUMERIC: &str = "The selected variable is not numeric; nothing to plot.";
pub const EN_NO_OBSERVATIONS: &str = "No observations in the selected window.";

pub const EN_COL_YEAR: &str = "Year";
pub const EN_COL_COUNTRY: &str = "Country";
pub const EN_COL_VALUE: &str = "Value";

pub const EN_AGG_MEAN: &str = "Mean";
pub const EN_AGG_MEDIAN: &str = "Median";
pub const EN_AGG_LAST_YEAR: &str = "Last year";

pub const EN_UNKNOWN_CLASS: &str = "Unknown class";
pub const EN_UNNAMED_GROUP: &str = "Unnamed group";
pub const EN_NO_GROUP: &str = "(no groups)";
pub const EN_NO_VARIABLE: &str = "(none)";

pub const EN_LITERAL_MISSING: &str = "<missing>";
pub const EN_PLACEHOLDER_NOT_LOADED: &str = "<not loaded>";

// Panel key columns.
pub const COL_COUNTRY: &str = "country_name";
pub const COL_YEAR: &str = "year";

// Region tag meaning "main country only".
pub const REGION_NONE: &str = "None";

// Cell spellings read as missing (compared case-insensitively).
pub const NA_MARKERS: &[&str] = &["NA", "N/A", "NaN", "null", "None"];

pub const DEFAULT_COUNTRY: &str = "Brazil";

// Uncertainty/ordinal companions of indicator columns; never offered as variables.
pub const AUX_COLUMN_SUFFIXES: &[&str] =
    &["_sd", "_osp", "_codelow", "_codehigh", "_ord", "_mean", "_nr"];

pub const PREFERRED_VARIABLES: &[&str] =
    &["v2x_libdem", "v2x_polyarchy", "e_v2x_polyarchy", "v2x_liberal"];
