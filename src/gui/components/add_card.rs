use eframe::egui;

use crate::gui::constants::*;
use crate::store::NewCard;
use crate::types::{Category, Point, Template};

/// Add-card form state; survives between frames
pub struct AddCardState {
    company: String,
    category: Category,
    template: Template,
    logo_url: String,
    is_portfolio: bool,
}

impl AddCardState {
    pub fn new() -> Self {
        Self {
            company: String::new(),
            category: Category::default(),
            template: Template::default(),
            logo_url: String::new(),
            is_portfolio: false,
        }
    }

    /// Clear the per-card fields, keeping category and template for the next card
    pub fn reset(&mut self) {
        self.company.clear();
        self.logo_url.clear();
        self.is_portfolio = false;
    }

    fn to_new_card(&self) -> NewCard {
        let logo_url = Some(self.logo_url.trim().to_string()).filter(|url| !url.is_empty());
        NewCard::new(self.company.clone())
            .category(self.category)
            .template(self.template)
            .portfolio(self.is_portfolio)
            .logo_url(logo_url)
    }
}

impl Default for AddCardState {
    fn default() -> Self {
        Self::new()
    }
}

/// Returns the card to create when the user submits
/// `placement` is the clicked canvas point and the circles it falls in
pub fn ui(ui: &mut egui::Ui, state: &mut AddCardState, placement: Option<(Point, &str)>) -> Option<NewCard> {
    let mut submit = false;

    ui.group(|ui| {
        ui.label(egui::RichText::new("Add Card").strong());
        ui.add_space(ITEM_SPACING);

        ui.horizontal(|ui| {
            ui.label("Company:");
            let response = ui.text_edit_singleline(&mut state.company);
            if response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                submit = true;
            }
        });

        ui.horizontal(|ui| {
            ui.label("Category:");
            egui::ComboBox::from_id_salt("add_card_category")
                .selected_text(state.category.label())
                .show_ui(ui, |ui| {
                    for category in Category::ALL {
                        ui.selectable_value(&mut state.category, category, category.label());
                    }
                });
        });

        ui.horizontal(|ui| {
            ui.label("Template:");
            egui::ComboBox::from_id_salt("add_card_template")
                .selected_text(state.template.label())
                .show_ui(ui, |ui| {
                    for template in Template::ALL {
                        ui.selectable_value(&mut state.template, template, template.label());
                    }
                });
        });

        ui.horizontal(|ui| {
            ui.label("Logo URL:");
            ui.add(egui::TextEdit::singleline(&mut state.logo_url).hint_text("optional"));
        });

        ui.checkbox(&mut state.is_portfolio, "Portfolio company");

        ui.add_space(ITEM_SPACING);
        match placement {
            Some((p, region)) => ui.label(format!("Position: ({:.0}, {:.0}) in {region}", p.x, p.y)),
            None => ui.colored_label(STATUS_INFO, "Click the canvas to choose a position"),
        };

        if ui.button("\u{2795} Add Card").clicked() {
            submit = true;
        }
    });

    submit.then(|| state.to_new_card())
}
