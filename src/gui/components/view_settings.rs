use eframe::egui;

use crate::constants::view::*;
use crate::geometry::optimal_spacing;
use crate::gui::constants::*;
use crate::render::font_discovery;
use crate::types::ViewSettings;

/// State for the view settings panel
pub struct ViewSettingsState {
    available_fonts: Vec<String>,
    font_load_error: Option<String>,
    selected_font: String,
}

impl ViewSettingsState {
    pub fn new(current_font: Option<&str>) -> Self {
        // Font list is read once at startup
        let (available_fonts, font_load_error) = match font_discovery::list_fonts() {
            Ok(fonts) => (fonts, None),
            Err(e) => {
                tracing::warn!(error = ?e, "Failed to load font list from fontconfig");
                (Vec::new(), Some(e.to_string()))
            }
        };

        Self {
            available_fonts,
            font_load_error,
            selected_font: current_font.unwrap_or_default().to_string(),
        }
    }
}

#[derive(Debug, Default)]
pub struct ViewSettingsChange {
    /// Settings were edited and need to be persisted
    pub settings: bool,
    /// User picked a different font
    pub font: Option<String>,
}

pub fn ui(ui: &mut egui::Ui, settings: &mut ViewSettings, state: &mut ViewSettingsState) -> ViewSettingsChange {
    let mut change = ViewSettingsChange::default();

    ui.group(|ui| {
        ui.label(egui::RichText::new("View Settings").strong());
        ui.add_space(ITEM_SPACING);

        let sliders = [
            ui.add(egui::Slider::new(&mut settings.card_size, MIN_CARD_SIZE..=MAX_CARD_SIZE).text("Card size")),
            ui.add(egui::Slider::new(&mut settings.circle_radius, MIN_CIRCLE_RADIUS..=MAX_CIRCLE_RADIUS).text("Circle radius")),
            ui.add(egui::Slider::new(&mut settings.circle_spacing, MIN_CIRCLE_SPACING..=MAX_CIRCLE_SPACING).text("Circle spacing")),
            ui.add(egui::Slider::new(&mut settings.circle_opacity, 0..=MAX_CIRCLE_OPACITY).text("Circle opacity").suffix("%")),
            ui.add(egui::Slider::new(&mut settings.grid_size, MIN_GRID_SIZE..=MAX_GRID_SIZE).text("Grid size")),
        ];
        change.settings |= sliders.iter().any(|r| r.changed());
        if ui
            .small_button("Fit spacing to radius")
            .on_hover_text("Place each circle center on the other two circles' overlap")
            .clicked()
        {
            settings.circle_spacing = optimal_spacing(settings.circle_radius);
            change.settings = true;
        }

        ui.add_space(ITEM_SPACING);
        ui.horizontal(|ui| {
            change.settings |= ui.checkbox(&mut settings.show_circles, "Circles").changed();
            change.settings |= ui.checkbox(&mut settings.show_grid, "Grid").changed();
        });
        ui.horizontal(|ui| {
            change.settings |= ui.checkbox(&mut settings.show_guides, "Guides").changed();
            change.settings |= ui.checkbox(&mut settings.snap_to_grid, "Snap to grid").changed();
        });

        ui.add_space(ITEM_SPACING);
        ui.horizontal(|ui| {
            ui.label("Font:");
            let shown = if state.selected_font.is_empty() {
                "System default"
            } else {
                state.selected_font.as_str()
            };
            egui::ComboBox::from_id_salt("card_font")
                .selected_text(shown)
                .width(180.0)
                .show_ui(ui, |ui| {
                    for font in &state.available_fonts {
                        if ui.selectable_label(state.selected_font == *font, font).clicked()
                            && state.selected_font != *font
                        {
                            state.selected_font = font.clone();
                            change.font = Some(font.clone());
                        }
                    }
                });
        });
        if let Some(error) = &state.font_load_error {
            ui.colored_label(STATUS_ERROR, format!("Font list unavailable: {error}"));
        }
    });

    if change.settings {
        settings.validate_and_clamp();
    }
    change
}
