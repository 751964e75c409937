use eframe::egui;

use crate::gui::constants::*;
use crate::store::{Card, CardStore};
use crate::types::{CardId, Category};
use crate::workspace::Workspace;

#[derive(Default)]
pub struct CardListState {
    query: String,
    /// `None` lists every category
    category: Option<Category>,
}

/// Cards matching the category filter and the search text, in paint order
fn visible_cards<'a>(store: &'a CardStore, state: &CardListState) -> Vec<&'a Card> {
    match state.category {
        Some(category) => {
            let query = state.query.to_lowercase();
            store
                .by_category(category)
                .into_iter()
                .filter(|card| card.matches(&query))
                .collect()
        }
        None => store.search(&state.query),
    }
}

pub enum CardListAction {
    Select(CardId),
    Delete(CardId),
}

/// Searchable card list with the store statistics on top
pub fn ui(ui: &mut egui::Ui, workspace: &Workspace, state: &mut CardListState) -> Option<CardListAction> {
    let mut action = None;

    ui.group(|ui| {
        ui.label(egui::RichText::new("Cards").strong());
        ui.add_space(ITEM_SPACING);

        let stats = workspace.store.statistics();
        ui.label(format!(
            "{} total \u{00B7} {} portfolio \u{00B7} {} with logos",
            stats.total, stats.portfolio, stats.with_logos
        ));
        if !stats.by_category.is_empty() {
            let breakdown: Vec<String> = stats
                .by_category
                .iter()
                .map(|(category, count)| format!("{category}: {count}"))
                .collect();
            ui.small(breakdown.join(", "));
        }

        ui.add_space(ITEM_SPACING);
        ui.add(egui::TextEdit::singleline(&mut state.query).hint_text("Search company or category"));
        egui::ComboBox::from_id_salt("card_list_category")
            .selected_text(state.category.map_or("All categories", Category::label))
            .show_ui(ui, |ui| {
                ui.selectable_value(&mut state.category, None, "All categories");
                for category in Category::ALL {
                    ui.selectable_value(&mut state.category, Some(category), category.label());
                }
            });

        egui::ScrollArea::vertical()
            .max_height(CARD_LIST_HEIGHT)
            .auto_shrink([false, true])
            .show(ui, |ui| {
                for card in visible_cards(&workspace.store, state) {
                    ui.horizontal(|ui| {
                        ui.colored_label(card.category.color().to_egui(), "\u{25CF}");
                        let selected = workspace.is_selected(card.id);
                        if ui.selectable_label(selected, &card.company).clicked() {
                            action = Some(CardListAction::Select(card.id));
                        }
                        if card.is_portfolio {
                            ui.small("portfolio");
                        }
                        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                            if ui.small_button("\u{1F5D1}").on_hover_text("Delete").clicked() {
                                action = Some(CardListAction::Delete(card.id));
                            }
                        });
                    });
                }
            });
    });

    action
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::NewCard;

    fn names(cards: Vec<&Card>) -> Vec<&str> {
        cards.into_iter().map(|card| card.company.as_str()).collect()
    }

    #[test]
    fn test_category_filter_combines_with_search() {
        let mut store = CardStore::new();
        store.create(NewCard::new("Gusto").category(Category::Finance));
        store.create(NewCard::new("Guild Education").category(Category::Education));
        store.create(NewCard::new("Ramp").category(Category::Finance));

        let mut state = CardListState::default();
        assert_eq!(visible_cards(&store, &state).len(), 3);

        state.category = Some(Category::Finance);
        assert_eq!(names(visible_cards(&store, &state)), vec!["Gusto", "Ramp"]);

        state.query = "GU".into();
        assert_eq!(names(visible_cards(&store, &state)), vec!["Gusto"]);

        state.category = None;
        assert_eq!(names(visible_cards(&store, &state)), vec!["Gusto", "Guild Education"]);
    }
}
