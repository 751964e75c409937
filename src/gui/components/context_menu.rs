use eframe::egui;

use crate::store::Card;
use crate::types::{CardId, Category, Template};

/// Open context menu for one card
#[derive(Debug, Clone, Copy)]
pub struct ContextMenuState {
    pub card: CardId,
    pub at: egui::Pos2,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ContextAction {
    BringToFront,
    SendToBack,
    Duplicate,
    TogglePortfolio,
    SetTemplate(Template),
    SetCategory(Category),
    Delete,
}

pub struct ContextMenuResult {
    pub action: Option<ContextAction>,
    /// Menu should stay open for the next frame
    pub keep_open: bool,
}

pub fn show(ctx: &egui::Context, state: &ContextMenuState, card: &Card) -> ContextMenuResult {
    let mut action = None;

    let area = egui::Area::new(egui::Id::new("card_context_menu"))
        .fixed_pos(state.at)
        .order(egui::Order::Foreground)
        .show(ctx, |ui| {
            egui::Frame::popup(ui.style()).show(ui, |ui| {
                ui.set_min_width(160.0);
                ui.label(egui::RichText::new(&card.company).strong());
                ui.separator();

                if ui.button("Bring to front").clicked() {
                    action = Some(ContextAction::BringToFront);
                }
                if ui.button("Send to back").clicked() {
                    action = Some(ContextAction::SendToBack);
                }
                if ui.button("Duplicate").clicked() {
                    action = Some(ContextAction::Duplicate);
                }
                let portfolio = if card.is_portfolio { "Unmark portfolio" } else { "Mark portfolio" };
                if ui.button(portfolio).clicked() {
                    action = Some(ContextAction::TogglePortfolio);
                }

                ui.menu_button("Template", |ui| {
                    for template in Template::ALL {
                        if ui.radio(card.template == template, template.label()).clicked() {
                            action = Some(ContextAction::SetTemplate(template));
                        }
                    }
                });
                ui.menu_button("Category", |ui| {
                    for category in Category::ALL {
                        if ui.radio(card.category == category, category.label()).clicked() {
                            action = Some(ContextAction::SetCategory(category));
                        }
                    }
                });

                ui.separator();
                if ui.button("\u{1F5D1} Delete").clicked() {
                    action = Some(ContextAction::Delete);
                }
            });
        });

    // Any click outside the menu dismisses it
    let clicked_elsewhere = ctx.input(|i| i.pointer.any_pressed())
        && !ctx.is_pointer_over_area()
        && !area.response.hovered();
    let escape = ctx.input(|i| i.key_pressed(egui::Key::Escape));

    ContextMenuResult {
        action,
        keep_open: action.is_none() && !clicked_elsewhere && !escape,
    }
}
