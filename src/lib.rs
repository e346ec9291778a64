//! Core library for the Democracy Panel Explorer (DEMEX).
//! Builds a Class > Group > Variable catalog from indicator metadata, keeps a cascading selection
//! consistent against it, and composes country sets and colours for the panel views.

pub mod catalog;
pub mod config;
mod gui;
pub mod id;
pub mod load;
pub mod natural;
pub mod palette;
pub mod panel;
pub mod region;
pub mod search;
pub mod selection;
pub mod session;
pub mod statics;
pub mod value;

pub use catalog::{BuildReport, Catalog, CatalogCache, Fingerprint, IndicatorRecord, MetadataRow};
pub use config::{CatalogLabels, ConfigError, ExplorerConfig};
pub use gui::run_gui;
pub use id::{DottedId, IdError, Level, LevelHint};
pub use load::{LoadError, LoadedMetadata, LoadedPanel, SourceFormat};
pub use panel::{Aggregation, Panel, PanelRow, SeriesPoint};
pub use region::{RegionComposer, RegionMap};
pub use search::CatalogPick;
pub use selection::{CascadeOptions, CascadeSelector, SelectionState};
pub use session::{RenderRequest, Session};
pub use value::CellValue;
