//! Reusable GUI panels for the editor window

pub mod add_card;
pub mod card_list;
pub mod context_menu;
pub mod view_settings;
