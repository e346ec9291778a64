use crate::catalog::{CatalogCache, Fingerprint, MetadataRow};
use crate::config::ExplorerConfig;
use crate::load;
use crate::palette::Hsl;
use crate::panel::{Aggregation, Panel};
use crate::search::CatalogPick;
use crate::session::{RenderRequest, Session};
use crate::statics;
use crate::value::format_number;
use eframe::egui;
use egui_extras::{Column, TableBuilder};
use std::{
    collections::{BTreeMap, HashMap},
    path::PathBuf,
    sync::Arc,
};
use tracing::warn;

pub fn run_gui(config: ExplorerConfig) -> eframe::Result {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([1400.0, 900.0]),
        ..Default::default()
    };
    let title = format!("{} {}", statics::EN_APP_TITLE, env!("CARGO_PKG_VERSION"));
    eframe::run_native(
        &title,
        options,
        Box::new(move |_cc| {
            let mut app = DemexApp {
                config,
                theme_dark: true,
                ..Default::default()
            };
            app.load_configured_sources();
            Ok(Box::new(app))
        }),
    )
}

/// Window state. Everything about the selection itself lives in `Session`.
#[derive(Default)]
struct DemexApp {
    config: ExplorerConfig,
    cache: CatalogCache,

    panel: Option<Arc<Panel>>,
    panel_path: Option<PathBuf>,
    skipped_rows: usize,
    metadata: Option<Vec<MetadataRow>>,
    metadata_path: Option<PathBuf>,
    fingerprint: Option<Fingerprint>,
    session: Option<Session>,

    dialog_dir: Option<PathBuf>,
    search_query: String,
    country_to_add: String,
    aggregation: Aggregation,
    aggregate_all: bool,

    status: String,
    last_error: Option<String>,
    about_open: bool,
    theme_dark: bool,
}

impl DemexApp {
    fn load_configured_sources(&mut self) {
        match load::load_panel_first(&self.config.panel_sources) {
            Ok(loaded) => self.set_panel(loaded),
            Err(e) => self.status = e.to_string(),
        }
        match load::load_metadata_first(&self.config.metadata_sources) {
            Ok(loaded) => self.set_metadata(loaded),
            Err(e) => self.status = e.to_string(),
        }
        self.rebuild_session();
    }

    fn set_panel(&mut self, loaded: load::LoadedPanel) {
        self.dialog_dir = loaded.path.parent().map(PathBuf::from);
        self.status = format!("Loaded {}", loaded.path.display());
        self.skipped_rows = loaded.skipped_rows;
        self.panel_path = Some(loaded.path);
        self.panel = Some(Arc::new(loaded.panel));
    }

    fn set_metadata(&mut self, loaded: load::LoadedMetadata) {
        self.dialog_dir = loaded.path.parent().map(PathBuf::from);
        self.status = format!("Loaded {}", loaded.path.display());
        self.metadata_path = Some(loaded.path);
        self.metadata = Some(loaded.rows);
    }

    /// Start a fresh session once both inputs are present.
    /// Unchanged inputs reuse the cached catalog; a changed one replaces it.
    fn rebuild_session(&mut self) {
        let (Some(panel), Some(rows)) = (self.panel.as_ref(), self.metadata.as_ref()) else {
            self.session = None;
            return;
        };
        let columns = panel.column_names();
        let (fingerprint, catalog) = self.cache.replace(self.fingerprint.as_ref(), rows, &columns);
        let report = catalog.report();
        if report.invalid_ids > 0 || report.ambiguous_levels > 0 {
            warn!(
                "catalog {}: {} invalid ids, {} ambiguous level flags",
                fingerprint.short_hex(),
                report.invalid_ids,
                report.ambiguous_levels
            );
        }
        self.status = format!(
            "Catalog {} indicators ({})",
            catalog.len(),
            fingerprint.short_hex()
        );
        self.fingerprint = Some(fingerprint);
        self.session = Some(Session::start(catalog, Arc::clone(panel), &self.config));
        self.search_query.clear();
        self.country_to_add.clear();
    }

    fn file_dialog(&self, filter_name: &str, extensions: &[&str]) -> rfd::FileDialog {
        let mut dlg = rfd::FileDialog::new().add_filter(filter_name, extensions);
        if let Some(dir) = self.dialog_dir.clone() {
            dlg = dlg.set_directory(dir);
        }
        dlg
    }

    fn open_panel(&mut self) {
        let Some(path) = self
            .file_dialog("V-Dem Panel", &["csv", "gz", "json", "json5"])
            .pick_file()
        else {
            return;
        };
        match load::load_panel(&path) {
            Ok(loaded) => {
                self.set_panel(loaded);
                self.last_error = None;
                self.rebuild_session();
            }
            Err(e) => {
                self.last_error = Some(format!("Failed to load: {e:#}"));
            }
        }
    }

    fn open_metadata(&mut self) {
        let Some(path) = self
            .file_dialog("Indicator Metadata", &["csv", "gz", "json", "json5"])
            .pick_file()
        else {
            return;
        };
        match load::load_metadata(&path) {
            Ok(loaded) => {
                self.set_metadata(loaded);
                self.last_error = None;
                self.rebuild_session();
            }
            Err(e) => {
                self.last_error = Some(format!("Failed to load: {e:#}"));
            }
        }
    }

    /// Re-read both files from disk, dropping the cached catalog for the old contents.
    fn reload(&mut self) {
        if let Some(fingerprint) = self.fingerprint.take() {
            self.cache.invalidate(&fingerprint);
        }
        let mut errors = Vec::new();
        if let Some(path) = self.panel_path.clone() {
            match load::load_panel(&path) {
                Ok(loaded) => self.set_panel(loaded),
                Err(e) => errors.push(format!("{e:#}")),
            }
        }
        if let Some(path) = self.metadata_path.clone() {
            match load::load_metadata(&path) {
                Ok(loaded) => self.set_metadata(loaded),
                Err(e) => errors.push(format!("{e:#}")),
            }
        }
        self.last_error = (!errors.is_empty())
            .then(|| format!("Failed to reload: {}", errors.join("; ")));
        self.rebuild_session();
    }

    fn render_filters(&mut self, ui: &mut egui::Ui, session: &mut Session) {
        let mut main = session.state().main_country.clone();
        ui.label(statics::EN_LABEL_MAIN_COUNTRY);
        egui::ComboBox::from_id_salt("main_country_combo")
            .width(ui.available_width())
            .selected_text(main.as_str())
            .show_ui(ui, |ui| {
                for country in session.available_countries() {
                    ui.selectable_value(&mut main, country.clone(), country.as_str());
                }
            });
        if main != session.state().main_country {
            session.set_main_country(&main);
        }

        ui.add_space(4.0);
        ui.label(statics::EN_LABEL_REGIONS);
        let mut tags = session.state().region_tags.clone();
        let mut tags_changed = false;
        egui::CollapsingHeader::new(format!("{} selected", tags.len()))
            .id_salt("regions_header")
            .show(ui, |ui| {
                for tag in session.region_tags() {
                    let mut on = tags.iter().any(|t| t == tag);
                    if ui.checkbox(&mut on, tag).changed() {
                        if on {
                            tags.push(tag.to_string());
                        } else {
                            tags.retain(|t| t != tag);
                        }
                        tags_changed = true;
                    }
                }
            });
        if tags_changed {
            session.set_region_tags(tags);
        }

        ui.add_space(4.0);
        let (lo, hi) = session.year_bounds();
        let (mut from, mut to) = session.state().year_range;
        ui.horizontal(|ui| {
            ui.label(statics::EN_LABEL_YEARS);
            ui.add(egui::DragValue::new(&mut from).range(lo..=hi));
            ui.label("-");
            ui.add(egui::DragValue::new(&mut to).range(lo..=hi));
        });
        if (from, to) != session.state().year_range {
            session.set_year_range((from, to));
        }
    }

    fn render_cascade(&mut self, ui: &mut egui::Ui, session: &mut Session) {
        let classes = session.class_choices();
        let current = session.state().class_id.clone();
        if let Some(id) = choice_combo(
            ui,
            "class_combo",
            statics::EN_LABEL_CLASS,
            &classes,
            current.as_deref(),
            statics::EN_NO_VARIABLE,
        ) {
            session.pick_class(&id);
        }

        let groups = session.group_choices();
        let current = session.state().group_id.clone();
        if let Some(id) = choice_combo(
            ui,
            "group_combo",
            statics::EN_LABEL_GROUP,
            &groups,
            current.as_deref(),
            statics::EN_NO_GROUP,
        ) {
            session.pick_group(&id);
        }

        let variables = session.options().variables.clone();
        let current = session.state().variable_id.clone();
        if let Some(name) = choice_combo(
            ui,
            "variable_combo",
            statics::EN_LABEL_VARIABLE,
            &variables,
            current.as_deref(),
            statics::EN_NO_VARIABLE,
        ) {
            session.pick_variable(&name);
        }
    }

    fn render_search(&mut self, ui: &mut egui::Ui, session: &mut Session) {
        ui.horizontal(|ui| {
            ui.label(statics::EN_LABEL_SEARCH);
            ui.add(
                egui::TextEdit::singleline(&mut self.search_query)
                    .hint_text(statics::EN_HINT_SEARCH)
                    .desired_width(f32::INFINITY),
            );
        });
        if self.search_query.trim().is_empty() {
            return;
        }

        let hits: Vec<(CatalogPick, String)> = session
            .search(&self.search_query)
            .into_iter()
            .map(|r| (CatalogPick::from(r), r.display()))
            .collect();
        if hits.is_empty() {
            ui.label(statics::EN_SEARCH_NO_MATCHES);
            return;
        }

        let mut picked = None;
        ui.push_id("search_scroll", |ui| {
            egui::ScrollArea::vertical().max_height(260.0).show(ui, |ui| {
                for (pick, display) in &hits {
                    ui.horizontal(|ui| {
                        if ui.small_button(statics::EN_BTN_USE).clicked() {
                            picked = Some(pick.clone());
                        }
                        ui.label(display);
                    });
                }
            });
        });
        if let Some(pick) = picked {
            self.status = format!("Selected {}", pick.variable_id);
            session.pick_search_result(pick);
        }
    }

    fn render_country_set(
        &mut self,
        ui: &mut egui::Ui,
        session: &mut Session,
        req: &RenderRequest,
    ) {
        ui.heading(statics::EN_HEADING_COUNTRIES);
        let mut remove = None;
        ui.horizontal_wrapped(|ui| {
            for (country, hsl) in &req.colors {
                let (swatch, _) =
                    ui.allocate_exact_size(egui::vec2(12.0, 12.0), egui::Sense::hover());
                ui.painter()
                    .rect_filled(swatch, egui::CornerRadius::same(2), color32(*hsl));
                ui.label(country);
                if country != &session.state().main_country
                    && ui.small_button(statics::EN_BTN_REMOVE).clicked()
                {
                    remove = Some(country.clone());
                }
                ui.add_space(8.0);
            }
        });
        if let Some(country) = remove {
            session.remove_country(&country);
        }

        ui.horizontal(|ui| {
            ui.label(statics::EN_LABEL_ADD_COUNTRY);
            egui::ComboBox::from_id_salt("add_country_combo")
                .selected_text(self.country_to_add.as_str())
                .show_ui(ui, |ui| {
                    for country in session.available_countries() {
                        if !session.state().country_set.contains(country) {
                            ui.selectable_value(
                                &mut self.country_to_add,
                                country.clone(),
                                country.as_str(),
                            );
                        }
                    }
                });
            let can_add = !self.country_to_add.is_empty();
            if ui
                .add_enabled(can_add, egui::Button::new(statics::EN_BTN_ADD))
                .clicked()
                && session.add_country(&self.country_to_add)
            {
                self.country_to_add.clear();
            }
        });
    }

    fn render_series_table(&self, ui: &mut egui::Ui, session: &Session, req: &RenderRequest) {
        ui.heading(statics::EN_HEADING_SERIES);
        let mut by_year: BTreeMap<i32, HashMap<String, f64>> = BTreeMap::new();
        for point in session.series() {
            by_year
                .entry(point.year)
                .or_default()
                .insert(point.country, point.value);
        }
        if by_year.is_empty() {
            ui.label(statics::EN_NO_OBSERVATIONS);
            return;
        }

        let row_h = ui.text_style_height(&egui::TextStyle::Body) + 6.0;
        ui.push_id("series_table", |ui| {
            egui::ScrollArea::horizontal().show(ui, |ui| {
                TableBuilder::new(ui)
                    .striped(true)
                    .cell_layout(egui::Layout::left_to_right(egui::Align::Center))
                    .column(Column::initial(60.0).resizable(false))
                    .columns(Column::initial(110.0).resizable(true), req.countries.len())
                    .header(row_h, |#[allow(unused_mut)] mut header| {
                        header.col(|ui| {
                            ui.strong(statics::EN_COL_YEAR);
                        });
                        for (country, hsl) in &req.colors {
                            header.col(|ui| {
                                ui.label(
                                    egui::RichText::new(country).strong().color(color32(*hsl)),
                                );
                            });
                        }
                    })
                    .body(|#[allow(unused_mut)] mut body| {
                        for (year, values) in &by_year {
                            body.row(row_h, |#[allow(unused_mut)] mut row| {
                                row.col(|ui| {
                                    ui.label(year.to_string());
                                });
                                for country in &req.countries {
                                    row.col(|ui| {
                                        let text = values
                                            .get(country)
                                            .map(|v| format_number(*v))
                                            .unwrap_or_default();
                                        ui.label(text);
                                    });
                                }
                            });
                        }
                    });
            });
        });
    }

    fn render_aggregate_table(&mut self, ui: &mut egui::Ui, session: &Session) {
        ui.heading(statics::EN_HEADING_AGGREGATE);
        ui.horizontal(|ui| {
            ui.label(statics::EN_LABEL_AGGREGATION);
            for how in Aggregation::ALL {
                ui.selectable_value(&mut self.aggregation, how, how.label());
            }
            ui.separator();
            ui.checkbox(&mut self.aggregate_all, statics::EN_CHECKBOX_ALL_COUNTRIES);
        });

        let values = session.aggregate(self.aggregation, self.aggregate_all);
        if values.is_empty() {
            ui.label(statics::EN_NO_OBSERVATIONS);
            return;
        }

        let row_h = ui.text_style_height(&egui::TextStyle::Body) + 6.0;
        ui.push_id("aggregate_table", |ui| {
            TableBuilder::new(ui)
                .striped(true)
                .cell_layout(egui::Layout::left_to_right(egui::Align::Center))
                .column(Column::initial(220.0).resizable(true))
                .column(Column::remainder())
                .header(row_h, |#[allow(unused_mut)] mut header| {
                    header.col(|ui| {
                        ui.strong(statics::EN_COL_COUNTRY);
                    });
                    header.col(|ui| {
                        ui.strong(statics::EN_COL_VALUE);
                    });
                })
                .body(|body| {
                    body.rows(row_h, values.len(), |mut row| {
                        let (country, value) = &values[row.index()];
                        row.col(|ui| {
                            ui.label(country);
                        });
                        row.col(|ui| {
                            ui.label(format_number(*value));
                        });
                    });
                });
        });
    }
}

/// Dropdown over `(id, display)` pairs. Returns the id when the user picks a different entry.
fn choice_combo(
    ui: &mut egui::Ui,
    id_salt: &str,
    label: &str,
    choices: &[(String, String)],
    current: Option<&str>,
    empty_text: &str,
) -> Option<String> {
    let selected_text = current
        .and_then(|c| choices.iter().find(|(id, _)| id == c))
        .map(|(_, display)| display.as_str())
        .unwrap_or(empty_text);

    let mut picked = None;
    ui.label(label);
    egui::ComboBox::from_id_salt(id_salt)
        .width(ui.available_width())
        .selected_text(selected_text)
        .show_ui(ui, |ui| {
            for (id, display) in choices {
                let selected = current == Some(id.as_str());
                if ui.selectable_label(selected, display.as_str()).clicked() && !selected {
                    picked = Some(id.clone());
                }
            }
        });
    picked
}

fn color32(hsl: Hsl) -> egui::Color32 {
    let [r, g, b] = hsl.to_rgb();
    egui::Color32::from_rgb(r, g, b)
}

impl eframe::App for DemexApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            egui::MenuBar::new().ui(ui, |ui| {
                if ui.button(statics::EN_BTN_OPEN_PANEL).clicked() {
                    self.open_panel();
                }
                if ui.button(statics::EN_BTN_OPEN_METADATA).clicked() {
                    self.open_metadata();
                }
                let can_reload = self.panel_path.is_some() || self.metadata_path.is_some();
                if ui
                    .add_enabled(can_reload, egui::Button::new(statics::EN_BTN_RELOAD))
                    .clicked()
                {
                    self.reload();
                }

                if ui.button(statics::EN_BTN_ABOUT).clicked() {
                    self.about_open = true;
                }

                if ui.button(statics::EN_BTN_TOGGLE_THEME).clicked() {
                    self.theme_dark = !self.theme_dark;
                    if self.theme_dark {
                        ctx.set_visuals(egui::Visuals::dark());
                    } else {
                        ctx.set_visuals(egui::Visuals::light());
                    }
                }

                if !self.status.is_empty() {
                    ui.separator();
                    ui.label(&self.status);
                }
            });
        });

        if self.about_open {
            let mut open = self.about_open;
            egui::Window::new(statics::EN_WINDOW_ABOUT)
                .collapsible(false)
                .open(&mut open)
                .show(ctx, |ui| {
                    ui.heading(statics::EN_ABOUT_HEADING);
                    ui.label(format!(
                        "{} {}",
                        statics::EN_ABOUT_VERSION,
                        env!("CARGO_PKG_VERSION")
                    ));
                    ui.separator();
                    ui.label(statics::EN_ABOUT_DATA);
                    ui.label(statics::EN_ABOUT_LOGGING);
                    ui.separator();
                    ui.hyperlink_to(statics::EN_PROJECT_DATA, statics::VDEM_URL);
                });
            self.about_open = open;
        }

        if let Some(err) = self.last_error.clone() {
            egui::TopBottomPanel::top("error_bar").show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.colored_label(egui::Color32::RED, err);
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.small_button(statics::EN_BTN_CLEAR).clicked() {
                            self.last_error = None;
                        }
                    });
                });
            });
        }

        let Some(mut session) = self.session.take() else {
            let describe = |p: &Option<PathBuf>| {
                p.as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| statics::EN_PLACEHOLDER_NOT_LOADED.to_string())
            };
            egui::CentralPanel::default().show(ctx, |ui| {
                ui.heading(statics::EN_HOME_HEADING);
                ui.label(statics::EN_HOME_INSTRUCTIONS);
                ui.separator();
                ui.label(format!("{} {}", statics::EN_HOME_PANEL, describe(&self.panel_path)));
                ui.label(format!(
                    "{} {}",
                    statics::EN_HOME_METADATA,
                    describe(&self.metadata_path)
                ));
            });
            return;
        };

        // Shown before the side panel so it spans the full window width.
        egui::TopBottomPanel::bottom("bottom_status").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if let Some(path) = &self.panel_path {
                    ui.label(path.display().to_string());
                    ui.separator();
                }
                ui.label(format!("rows: {}", session.panel().row_count()));
                if self.skipped_rows > 0 {
                    ui.separator();
                    ui.colored_label(
                        egui::Color32::YELLOW,
                        format!("skipped rows: {}", self.skipped_rows),
                    );
                }
                ui.separator();
                ui.label(format!("countries: {}", session.available_countries().len()));
                ui.separator();
                let report = session.catalog().report();
                ui.label(format!(
                    "indicators: {} (not in panel: {}, invalid ids: {})",
                    session.catalog().len(),
                    report.missing_in_panel,
                    report.invalid_ids
                ));
                if let Some(fingerprint) = &self.fingerprint {
                    ui.separator();
                    ui.label(format!("catalog: {}", fingerprint.short_hex()));
                }
            });
        });

        egui::SidePanel::left("selection_panel")
            .resizable(true)
            .default_width(360.0)
            .show(ctx, |ui| {
                ui.heading(statics::EN_HEADING_SELECTION);
                ui.separator();
                ui.push_id("selection_scroll", |ui| {
                    egui::ScrollArea::vertical()
                        .auto_shrink([false, false])
                        .show(ui, |ui| {
                            self.render_filters(ui, &mut session);
                            ui.separator();
                            self.render_cascade(ui, &mut session);
                            ui.separator();
                            self.render_search(ui, &mut session);
                        });
                });
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            if session.options().is_empty_selection() {
                ui.label(statics::EN_EMPTY_SELECTION);
                return;
            }
            let Some(req) = session.render_request() else {
                ui.label(statics::EN_EMPTY_SELECTION);
                return;
            };

            ui.horizontal(|ui| {
                ui.heading(&req.title);
                ui.separator();
                ui.label(&req.variable_id);
                ui.separator();
                ui.label(format!("{} - {}", req.year_range.0, req.year_range.1));
            });
            ui.separator();

            self.render_country_set(ui, &mut session, &req);
            ui.separator();

            if !req.numeric {
                ui.colored_label(egui::Color32::YELLOW, statics::EN_NOT_NUMERIC);
                return;
            }
            // The country set may have changed above.
            let Some(req) = session.render_request() else {
                return;
            };

            let total_h = ui.available_height();
            egui::Resize::default()
                .id_salt("series_resize")
                .default_height((total_h * 0.6).max(200.0))
                .min_height(120.0)
                .resizable(true)
                .show(ui, |ui| {
                    self.render_series_table(ui, &session, &req);
                });
            ui.separator();
            self.render_aggregate_table(ui, &session);
        });

        self.session = Some(session);
    }
}
