//! UI rendering methods for the svviz viewer.

use crate::constants::{KEY_ZOOM_STEP, SIDEBAR_WIDTH};
use crate::export::{ExportFormat, export_panes};
use crate::{LoadStatus, SvvizViewApp, colors};
use eframe::egui;
use egui_extras::{Column, TableBuilder};
use svviz_view::{Category, TOTAL_ROW};

impl SvvizViewApp {
    /// Handles keyboard shortcuts for zoom, reset and the counts table.
    pub fn handle_keyboard_input(&mut self, ctx: &egui::Context) {
        if ctx.wants_keyboard_input() {
            return;
        }

        let (zoom_in, zoom_out, reset, toggle_counts) = ctx.input(|i| {
            (
                i.key_pressed(egui::Key::Plus) || i.key_pressed(egui::Key::Equals),
                i.key_pressed(egui::Key::Minus),
                i.key_pressed(egui::Key::Num0),
                i.key_pressed(egui::Key::C),
            )
        });

        if toggle_counts {
            self.state.show_counts = !self.state.show_counts;
        }

        let Some(view) = self.selected_view_mut() else {
            return;
        };
        if reset {
            view.reset_view();
        }
        if let Some(panel) = view.panel_mut() {
            if zoom_in {
                panel.zoom_by(KEY_ZOOM_STEP);
            }
            if zoom_out {
                panel.zoom_by(1.0 / KEY_ZOOM_STEP);
            }
        }
    }

    /// Renders the bottom status bar with the backend state and controls hint.
    pub fn show_status_bar(&self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label("Drag: Pan | Wheel: Scroll | Alt+Wheel: Zoom | Alt+Click track: Jump | 0: Fit | C: Counts");

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    match &self.status {
                        LoadStatus::Waiting { attempts, state } => {
                            let state = state.as_deref().unwrap_or("waiting");
                            ui.label(format!("{} ({state}, {attempts} polls)", self.config.server));
                            ui.spinner();
                        }
                        LoadStatus::Loaded => {
                            ui.label(format!("Connected to {}", self.config.server));
                        }
                        LoadStatus::Snapshot(path) => {
                            ui.label(format!("Snapshot {}", path.display()));
                        }
                        LoadStatus::Offline(reason) => {
                            ui.colored_label(ui.visuals().error_fg_color, reason);
                        }
                    }
                });
            });
        });
    }

    /// Renders the left sidebar panel.
    pub fn show_sidebar(&mut self, ctx: &egui::Context) {
        egui::SidePanel::left("sidebar")
            .exact_width(SIDEBAR_WIDTH)
            .resizable(false)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    self.show_sidebar_content(ui);
                });
            });
    }

    /// Renders the sidebar content: categories, counts, read detail and export.
    fn show_sidebar_content(&mut self, ui: &mut egui::Ui) {
        ui.add_space(4.0);

        ui.strong("Reads");
        ui.separator();

        for category in self.config.categories.clone() {
            let panes = self.views.get(&category).map(|view| view.panes().len());
            ui.horizontal(|ui| {
                let (rect, _) = ui.allocate_exact_size(egui::vec2(12.0, 12.0), egui::Sense::hover());
                ui.painter().rect_filled(rect, 2.0, category_color(category));

                let text = match panes {
                    Some(count) => format!("{} ({count})", category.label()),
                    None => category.label().to_string(),
                };
                if ui
                    .selectable_label(self.state.selected == category, text)
                    .clicked()
                {
                    self.state.selected = category;
                }
            });
        }

        ui.add_space(12.0);
        self.show_counts_section(ui);

        ui.add_space(12.0);
        ui.strong("Read detail");
        ui.separator();
        match &self.detail {
            Some(detail) => {
                ui.label(egui::RichText::new(&detail.read_id).small().weak());
                ui.label(egui::RichText::new(&detail.text).monospace());
            }
            None => {
                ui.label(egui::RichText::new("Hover a read to see its alignment").weak());
            }
        }

        ui.add_space(12.0);
        self.show_export_section(ui);
    }

    fn show_counts_section(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.strong("Allele counts");
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                ui.checkbox(&mut self.state.show_counts, "");
            });
        });
        ui.separator();

        if !self.state.show_counts {
            return;
        }
        if self.counts.is_empty() {
            ui.label(egui::RichText::new("No counts yet").weak());
            return;
        }

        // Samples in order, with the total row last.
        let rows: Vec<_> = self
            .counts
            .iter()
            .filter(|(sample, _)| sample.as_str() != TOTAL_ROW)
            .chain(self.counts.get_key_value(TOTAL_ROW))
            .collect();

        TableBuilder::new(ui)
            .id_salt("allele_counts")
            .striped(true)
            .column(Column::remainder().at_least(60.0).clip(true))
            .columns(Column::auto().at_least(28.0), Category::ALL.len())
            .header(18.0, |mut header| {
                header.col(|ui| {
                    ui.strong("Sample");
                });
                for category in Category::ALL {
                    header.col(|ui| {
                        ui.colored_label(category_color(category), category.as_str());
                    });
                }
            })
            .body(|mut body| {
                for (sample, counts) in rows {
                    body.row(18.0, |mut row| {
                        row.col(|ui| {
                            if sample == TOTAL_ROW {
                                ui.strong(sample);
                            } else {
                                ui.label(sample);
                            }
                        });
                        for category in Category::ALL {
                            row.col(|ui| {
                                ui.label(counts.get(category).to_string());
                            });
                        }
                    });
                }
            });
    }

    fn show_export_section(&mut self, ui: &mut egui::Ui) {
        ui.strong("Export");
        ui.separator();

        let has_panes = self
            .views
            .get(&self.state.selected)
            .is_some_and(|view| !view.is_empty());

        ui.horizontal(|ui| {
            if ui
                .add_enabled(has_panes, egui::Button::new("SVG"))
                .on_hover_text("Write the selected category's panes as SVG")
                .clicked()
            {
                self.export_selected(ExportFormat::Svg);
            }
            if ui
                .add_enabled(has_panes, egui::Button::new("PNG"))
                .on_hover_text("Write the selected category's panes as PNG")
                .clicked()
            {
                self.export_selected(ExportFormat::Png);
            }

            let pdf = ui
                .add_enabled(self.pdf_export, egui::Button::new("PDF"))
                .on_hover_text("Open the backend's export page")
                .on_disabled_hover_text("The backend has no PDF export");
            if pdf.clicked() {
                if let Err(err) = open::that(&self.config.server) {
                    log::warn!("Failed to open {}: {err}", self.config.server);
                    self.error_toast(format!("Failed to open {}: {err}", self.config.server));
                }
            }
        });

        ui.label(
            egui::RichText::new(self.config.export_dir().display().to_string())
                .small()
                .weak(),
        );
    }

    fn export_selected(&mut self, format: ExportFormat) {
        let category = self.state.selected;
        let Some(view) = self.views.get(&category) else {
            return;
        };

        let dir = self.config.export_dir();
        match export_panes(&dir, category, view.panes(), format) {
            Ok(paths) => {
                self.info_toast(format!("Exported {} files to {}", paths.len(), dir.display()));
            }
            Err(err) => {
                log::warn!("Export failed: {err}");
                self.error_toast(format!("Export failed: {err}"));
            }
        }
    }

    /// Renders the central panel containing the panes of the selected category.
    pub fn show_central_panel(&mut self, ctx: &egui::Context) {
        let settings = self.config.viewport;
        let category = self.state.selected;

        let hovered = egui::CentralPanel::default()
            .show(ctx, |ui| {
                ui.heading(category.label());
                ui.separator();

                let Some(view) = self.views.get_mut(&category) else {
                    ui.centered_and_justified(|ui| {
                        if matches!(self.status, LoadStatus::Waiting { .. }) {
                            ui.spinner();
                        } else {
                            ui.label("No reads loaded for this category.");
                        }
                    });
                    return None;
                };

                if view.is_empty() {
                    ui.centered_and_justified(|ui| {
                        ui.label("No reads in this category.");
                    });
                    return None;
                }

                view.show(ui, egui::Id::new(("viewport", category)), settings)
            })
            .inner;

        self.hover_read(hovered);
    }
}

fn category_color(category: Category) -> egui::Color32 {
    match category {
        Category::Alt => colors::ALT_ALLELE,
        Category::Ref => colors::REF_ALLELE,
        Category::Amb => colors::AMB_ALLELE,
    }
}
