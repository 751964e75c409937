//! Editor window implemented with egui/eframe
//!
//! The canvas is painted by the software painter into an RGBA buffer and
//! uploaded as a texture; egui only draws the side panels and the status line.
//! All workspace mutation happens here, inside `update`.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::mpsc::Receiver;
use std::sync::LazyLock;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Result};
use eframe::{egui, CreationContext, NativeOptions};
use tracing::{debug, error, info, warn};

use crate::config::AppConfig;
use crate::error::EditorError;
use crate::geometry::{classify, compute_layout};
use crate::interaction::{Controller, ControllerEvent, CursorHint, KeyCommand};
use crate::logos::{self, LogoLoader};
use crate::persistence::LocalStore;
use crate::remote::RemoteMirror;
use crate::render::{export_png, LogoCache, Painter, Scene, Surface, TextRenderer};
use crate::store::{CardPatch, NamePolicy, NewCard};
use crate::types::{CardId, Point};
use crate::workspace::{Alignment, Axis, Workspace};

use super::components::add_card::{self, AddCardState};
use super::components::card_list::{self, CardListAction, CardListState};
use super::components::context_menu::{self, ContextAction, ContextMenuState};
use super::components::view_settings::{self, ViewSettingsState};
use super::constants::*;

/// Everything the composition root builds before the window opens
pub struct Services {
    pub config: AppConfig,
    pub config_path: PathBuf,
    pub local: LocalStore,
    pub workspace: Workspace,
    pub text: Option<TextRenderer>,
    pub logos: Option<LogoLoader>,
    pub mirror: Option<RemoteMirror>,
}

struct StatusMessage {
    text: String,
    color: egui::Color32,
    shown_at: Instant,
}

struct CanvasTexture {
    handle: egui::TextureHandle,
    size: [usize; 2],
}

struct EditorApp {
    config: AppConfig,
    config_path: PathBuf,
    local: LocalStore,
    workspace: Workspace,
    text: Option<TextRenderer>,
    logos: Option<LogoLoader>,
    mirror: Option<RemoteMirror>,

    controller: Controller,
    events: Receiver<ControllerEvent>,
    canvas: Option<CanvasTexture>,
    /// Logical canvas size from the last frame
    canvas_size: egui::Vec2,
    dirty: bool,
    placement: Option<Point>,
    requested_logos: HashSet<CardId>,

    add_card: AddCardState,
    view_settings: ViewSettingsState,
    card_list: CardListState,
    context_menu: Option<ContextMenuState>,
    confirm_clear: bool,
    status: Option<StatusMessage>,
}

impl EditorApp {
    fn new(_cc: &CreationContext<'_>, services: Services) -> Self {
        info!(cards = services.workspace.store.len(), "Initializing editor window");

        let mut controller = Controller::new();
        let events = controller.subscribe();
        let view_settings = ViewSettingsState::new(services.config.font_name.as_deref());

        let mut app = Self {
            config: services.config,
            config_path: services.config_path,
            local: services.local,
            workspace: services.workspace,
            text: services.text,
            logos: services.logos,
            mirror: services.mirror,
            controller,
            events,
            canvas: None,
            canvas_size: egui::Vec2::ZERO,
            dirty: true,
            placement: None,
            requested_logos: HashSet::new(),
            add_card: AddCardState::new(),
            view_settings,
            card_list: CardListState::default(),
            context_menu: None,
            confirm_clear: false,
            status: None,
        };

        if let Some(mirror) = &app.mirror {
            mirror.fetch_once();
        }
        app.request_logos();
        app
    }

    fn logo_cache(&self) -> &LogoCache {
        match &self.logos {
            Some(loader) => loader.cache(),
            None => &EMPTY_LOGOS,
        }
    }

    fn set_status(&mut self, text: impl Into<String>, color: egui::Color32) {
        self.status = Some(StatusMessage {
            text: text.into(),
            color,
            shown_at: Instant::now(),
        });
    }

    /// Local save plus a debounced remote push
    fn persist(&mut self) {
        if let Err(e) = self.local.save(&self.workspace) {
            self.set_status(format!("Save failed: {e}"), STATUS_ERROR);
        }
        if let Some(mirror) = &mut self.mirror {
            mirror.push(&self.workspace);
        }
    }

    fn cards_changed(&mut self) {
        debug_assert!(self.workspace.selection_is_consistent());
        self.dirty = true;
        self.persist();
        self.request_logos();
        if let Some(menu) = &self.context_menu
            && !self.workspace.store.contains(menu.card)
        {
            self.context_menu = None;
        }
    }

    fn request_logos(&mut self) {
        let Some(loader) = &mut self.logos else {
            return;
        };
        for card in self.workspace.store.cards() {
            if !card.logo_loaded && self.requested_logos.insert(card.id) {
                loader.request(card.id, &card.company, card.logo_url.as_deref());
            }
        }
    }

    fn poll_logos(&mut self) {
        let Some(loader) = &mut self.logos else {
            return;
        };
        let outcomes = loader.poll();
        if outcomes.is_empty() {
            return;
        }
        let applied = logos::apply_outcomes(&mut self.workspace.store, outcomes);
        self.dirty |= applied.repaint;
        // Re-resolving urls a remote document already carried must not echo it back
        if applied.persist {
            self.persist();
        }
    }

    fn poll_remote(&mut self) {
        let dragging = self.controller.is_dragging();
        let Some(document) = self.mirror.as_mut().and_then(|m| m.poll_update(dragging)) else {
            return;
        };
        info!(cards = document.cards.len(), "Applying remote document");
        document.apply_to(&mut self.workspace);
        // Imported cards come back without logos
        self.requested_logos.clear();
        if let Err(e) = self.local.save(&self.workspace) {
            warn!(error = ?e, "Failed to save remote document locally");
        }
        self.dirty = true;
        self.request_logos();
        if let Some(menu) = &self.context_menu
            && !self.workspace.store.contains(menu.card)
        {
            self.context_menu = None;
        }
        self.set_status("Loaded remote changes", STATUS_INFO);
    }

    fn drain_events(&mut self) {
        while let Ok(event) = self.events.try_recv() {
            match event {
                ControllerEvent::CanvasClicked { position } => {
                    self.placement = Some(position);
                    self.context_menu = None;
                }
                ControllerEvent::ContextMenuRequested { card, screen } => {
                    self.context_menu = Some(ContextMenuState {
                        card,
                        at: egui::pos2(screen.x, screen.y),
                    });
                }
                ControllerEvent::HoverChanged { card, .. } => {
                    debug!(card = ?card, "Hover changed");
                    self.dirty = true;
                }
                ControllerEvent::RepaintRequested => self.dirty = true,
                ControllerEvent::DragFinished { moved } => {
                    if moved {
                        self.persist();
                    }
                }
                ControllerEvent::CardsChanged => self.cards_changed(),
            }
        }
    }

    fn handle_canvas_input(&mut self, ctx: &egui::Context, rect: egui::Rect, response: &egui::Response) {
        let to_canvas = |pos: egui::Pos2| Point::new(pos.x - rect.min.x, pos.y - rect.min.y);
        let (pressed, released, pointer, modifiers) = ctx.input(|i| {
            (
                i.pointer.primary_pressed(),
                i.pointer.primary_released(),
                i.pointer.interact_pos(),
                i.modifiers,
            )
        });

        if self.controller.is_dragging() {
            if let Some(pos) = pointer {
                self.controller.pointer_move(&mut self.workspace, to_canvas(pos));
            }
            if released {
                self.controller.pointer_up();
            }
        } else if response.hovered() {
            if let Some(pos) = response.hover_pos() {
                let point = to_canvas(pos);
                self.controller.pointer_move(&mut self.workspace, point);
                if pressed {
                    let additive = modifiers.shift || modifiers.command;
                    self.controller.pointer_down(&mut self.workspace, point, additive);
                }
            }
        } else if self.controller.hovered().is_some() {
            self.controller.pointer_left();
        }

        if response.secondary_clicked()
            && let Some(pos) = response.interact_pointer_pos()
        {
            let screen = Point::new(pos.x, pos.y);
            self.controller.secondary_click(&self.workspace, to_canvas(pos), screen);
        }

        if response.hovered() || self.controller.is_dragging() {
            match self.controller.cursor() {
                CursorHint::Grab => ctx.set_cursor_icon(egui::CursorIcon::Grab),
                CursorHint::Grabbing => ctx.set_cursor_icon(egui::CursorIcon::Grabbing),
                CursorHint::Default => {}
            }
        }
    }

    /// Tooltip for the hovered card; hidden while dragging
    fn hover_tooltip(&self) -> Option<String> {
        if self.controller.is_dragging() {
            return None;
        }
        let id = self.controller.hovered()?;
        self.workspace.store.get(id).map(|card| card.tooltip())
    }

    fn handle_keys(&mut self, ctx: &egui::Context) {
        // Text fields own the keyboard while focused
        if ctx.memory(|m| m.focused().is_some()) {
            return;
        }
        let command = ctx.input(|i| {
            if i.key_pressed(egui::Key::Delete) || i.key_pressed(egui::Key::Backspace) {
                Some(KeyCommand::DeleteSelected)
            } else if i.modifiers.command && i.key_pressed(egui::Key::A) {
                Some(KeyCommand::SelectAll)
            } else if i.modifiers.command && i.key_pressed(egui::Key::D) {
                Some(KeyCommand::DuplicateSelected)
            } else if i.key_pressed(egui::Key::Escape) && self.context_menu.is_none() {
                Some(KeyCommand::ClearSelection)
            } else {
                None
            }
        });
        if let Some(command) = command {
            debug!(command = ?command, "Keyboard command");
            self.controller.key(&mut self.workspace, command);
        }
    }

    fn paint_canvas(&mut self, ctx: &egui::Context, ui: &egui::Ui, rect: egui::Rect) {
        let scale = ctx.pixels_per_point();
        let size = [
            (rect.width() * scale).round().max(1.0) as usize,
            (rect.height() * scale).round().max(1.0) as usize,
        ];
        let resized = self.canvas.as_ref().is_none_or(|canvas| canvas.size != size);

        if self.dirty || resized {
            let mut surface = match Surface::new(size[0] as u32, size[1] as u32, scale) {
                Ok(surface) => surface,
                Err(e) => {
                    error!(error = ?e, width = size[0], height = size[1], "Failed to allocate canvas");
                    return;
                }
            };
            let scene = Scene {
                workspace: &self.workspace,
                hovered: self.controller.hovered(),
                logos: self.logo_cache(),
                circle_labels: &self.config.circle_labels,
            };
            Painter::new(self.text.as_ref()).paint(&mut surface, &scene);

            let image = egui::ColorImage::from_rgba_premultiplied(size, surface.pixels());
            match &mut self.canvas {
                Some(canvas) => {
                    canvas.handle.set(image, egui::TextureOptions::LINEAR);
                    canvas.size = size;
                }
                None => {
                    let handle = ctx.load_texture("canvas", image, egui::TextureOptions::LINEAR);
                    self.canvas = Some(CanvasTexture { handle, size });
                }
            }
            self.dirty = false;
        }

        if let Some(canvas) = &self.canvas {
            let uv = egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0));
            ui.painter().image(canvas.handle.id(), rect, uv, egui::Color32::WHITE);
        }
    }

    fn apply_context_action(&mut self, card: CardId, action: ContextAction) {
        let changed = match action {
            ContextAction::BringToFront => self.workspace.store.bring_to_front(card),
            ContextAction::SendToBack => self.workspace.store.send_to_back(card),
            ContextAction::Duplicate => self.workspace.duplicate_card(card, NamePolicy::Suffix).is_some(),
            ContextAction::TogglePortfolio => {
                let is_portfolio = self.workspace.store.get(card).is_some_and(|c| !c.is_portfolio);
                let patch = CardPatch {
                    is_portfolio: Some(is_portfolio),
                    ..CardPatch::default()
                };
                self.workspace.store.update(card, patch).is_some()
            }
            ContextAction::SetTemplate(template) => {
                let patch = CardPatch {
                    template: Some(template),
                    ..CardPatch::default()
                };
                self.workspace.store.update(card, patch).is_some()
            }
            ContextAction::SetCategory(category) => {
                let patch = CardPatch {
                    category: Some(category),
                    ..CardPatch::default()
                };
                self.workspace.store.update(card, patch).is_some()
            }
            ContextAction::Delete => self.workspace.delete_card(card),
        };
        if changed {
            self.cards_changed();
        }
    }

    fn submit_card(&mut self, fields: NewCard) {
        match self.workspace.add_card(fields, self.placement) {
            Ok(id) => {
                let company = self.workspace.store.get(id).map(|c| c.company.clone()).unwrap_or_default();
                info!(card = id, company = %company, "Added card");
                self.add_card.reset();
                self.placement = None;
                self.cards_changed();
                self.set_status(format!("Added {company}"), STATUS_OK);
            }
            Err(e) => self.set_status(e.to_string(), STATUS_ERROR),
        }
    }

    /// Chosen placement and the circles it falls in, named with the configured labels
    fn placement_summary(&self) -> Option<(Point, String)> {
        let point = self.placement?;
        let settings = &self.workspace.settings;
        let layout = compute_layout(
            self.canvas_size.x,
            self.canvas_size.y,
            settings.circle_radius,
            settings.circle_spacing,
        );
        let region = classify(point, &layout).describe(&self.config.circle_labels);
        Some((point, region))
    }

    fn populate(&mut self) {
        let settings = &self.workspace.settings;
        let layout = compute_layout(
            self.canvas_size.x,
            self.canvas_size.y,
            settings.circle_radius,
            settings.circle_spacing,
        );
        let added = self.workspace.populate(&layout);
        self.cards_changed();
        self.set_status(format!("Added {added} companies"), STATUS_OK);
    }

    fn export(&mut self) {
        let scene = Scene {
            workspace: &self.workspace,
            hovered: None,
            logos: self.logo_cache(),
            circle_labels: &self.config.circle_labels,
        };
        let painter = Painter::new(self.text.as_ref());
        let target = self.config.export_dir();
        match export_png(&painter, &scene, self.canvas_size.x, self.canvas_size.y, &target) {
            Ok(path) => self.set_status(format!("Exported {}", path.display()), STATUS_OK),
            Err(e) => {
                error!(error = ?e, "Export failed");
                self.set_status(format!("Export failed: {e}"), STATUS_ERROR);
            }
        }
    }

    fn change_font(&mut self, font: String) {
        match TextRenderer::from_font_name(&font) {
            Ok(renderer) => {
                info!(font = %font, "Switched card font");
                self.text = Some(renderer);
                self.dirty = true;
                if let Err(e) = AppConfig::save_font_name(&self.config_path, Some(&font)) {
                    error!(error = ?e, "Failed to save font choice");
                }
                self.config.font_name = Some(font);
            }
            Err(e) => {
                warn!(font = %font, error = ?e, "Font could not be loaded");
                self.set_status(format!("Font unavailable: {font}"), STATUS_ERROR);
            }
        }
    }

    fn report_arrange(&mut self, result: Result<(), EditorError>) {
        match result {
            Ok(()) => self.cards_changed(),
            Err(e) => self.set_status(e.to_string(), STATUS_ERROR),
        }
    }

    fn toolbar(&mut self, ui: &mut egui::Ui) {
        ui.group(|ui| {
            ui.label(egui::RichText::new("Canvas").strong());
            ui.add_space(ITEM_SPACING);

            ui.horizontal_wrapped(|ui| {
                if ui.button("Populate").clicked() {
                    self.populate();
                }
                if ui.button("\u{1F4F7} Export PNG").clicked() {
                    self.export();
                }
                if ui.button("Select all").clicked() {
                    self.workspace.select_all();
                    self.dirty = true;
                }
            });

            ui.horizontal(|ui| {
                ui.label("Align:");
                let center_x = self.canvas_size.x / 2.0;
                for (label, alignment) in [("Left", Alignment::Left), ("Center", Alignment::Center), ("Right", Alignment::Right)] {
                    if ui.small_button(label).clicked() {
                        let result = self.workspace.align_selected(alignment, center_x);
                        self.report_arrange(result);
                    }
                }
            });
            ui.horizontal(|ui| {
                ui.label("Distribute:");
                for (label, axis) in [("Horizontal", Axis::Horizontal), ("Vertical", Axis::Vertical)] {
                    if ui.small_button(label).clicked() {
                        let result = self.workspace.distribute_selected(axis);
                        self.report_arrange(result);
                    }
                }
            });

            ui.add_space(ITEM_SPACING);
            if self.confirm_clear {
                ui.horizontal(|ui| {
                    ui.colored_label(STATUS_ERROR, "Remove every card?");
                    if ui.button("Yes").clicked() {
                        self.workspace.clear_all();
                        self.confirm_clear = false;
                        self.cards_changed();
                        self.set_status("Canvas cleared", STATUS_INFO);
                    }
                    if ui.button("No").clicked() {
                        self.confirm_clear = false;
                    }
                });
            } else if ui.button("\u{1F5D1} Clear all").clicked() {
                self.confirm_clear = true;
            }
        });
    }

    fn status_line(&mut self, ui: &mut egui::Ui) {
        if self
            .status
            .as_ref()
            .is_some_and(|s| s.shown_at.elapsed() > Duration::from_millis(STATUS_TTL_MS))
        {
            self.status = None;
        }

        ui.horizontal(|ui| {
            if let Some(status) = &self.status {
                ui.colored_label(status.color, &status.text);
            }
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                let remote = if self.mirror.is_some() { "remote: on" } else { "remote: off" };
                ui.label(format!(
                    "{} cards \u{00B7} {} selected \u{00B7} {remote}",
                    self.workspace.store.len(),
                    self.workspace.selection().len()
                ));
            });
        });
    }
}

static EMPTY_LOGOS: LazyLock<LogoCache> = LazyLock::new(LogoCache::new);

impl eframe::App for EditorApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_logos();
        self.poll_remote();

        egui::TopBottomPanel::bottom("status").show(ctx, |ui| self.status_line(ui));

        egui::SidePanel::left("controls")
            .resizable(false)
            .exact_width(SIDE_PANEL_WIDTH)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    ui.heading("Card Canvas");
                    ui.add_space(SECTION_SPACING);

                    let placement = self.placement_summary();
                    let placement = placement.as_ref().map(|(point, region)| (*point, region.as_str()));
                    if let Some(fields) = add_card::ui(ui, &mut self.add_card, placement) {
                        self.submit_card(fields);
                    }
                    ui.add_space(SECTION_SPACING);

                    self.toolbar(ui);
                    ui.add_space(SECTION_SPACING);

                    let change = view_settings::ui(ui, &mut self.workspace.settings, &mut self.view_settings);
                    if change.settings {
                        self.dirty = true;
                        self.persist();
                    }
                    if let Some(font) = change.font {
                        self.change_font(font);
                    }
                    ui.add_space(SECTION_SPACING);

                    match card_list::ui(ui, &self.workspace, &mut self.card_list) {
                        Some(CardListAction::Select(id)) => {
                            self.workspace.select_only(id);
                            self.dirty = true;
                        }
                        Some(CardListAction::Delete(id)) => {
                            if self.workspace.delete_card(id) {
                                self.cards_changed();
                            }
                        }
                        None => {}
                    }
                });
            });

        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| {
                let (rect, response) = ui.allocate_exact_size(ui.available_size(), egui::Sense::click_and_drag());
                self.canvas_size = rect.size();
                self.handle_canvas_input(ctx, rect, &response);
                self.handle_keys(ctx);
                self.drain_events();
                self.paint_canvas(ctx, ui, rect);
                if let Some(tooltip) = self.hover_tooltip() {
                    response.on_hover_text_at_pointer(tooltip);
                }
            });

        if let Some(menu) = self.context_menu {
            match self.workspace.store.get(menu.card).cloned() {
                Some(card) => {
                    let result = context_menu::show(ctx, &menu, &card);
                    if !result.keep_open {
                        self.context_menu = None;
                    }
                    if let Some(action) = result.action {
                        self.apply_context_action(menu.card, action);
                    }
                }
                None => self.context_menu = None,
            }
        }

        let waiting = self.logos.as_ref().is_some_and(LogoLoader::has_pending);
        if waiting || self.mirror.is_some() || self.status.is_some() {
            ctx.request_repaint_after(Duration::from_millis(BACKGROUND_POLL_MS));
        }
        if self.dirty {
            ctx.request_repaint();
        }
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        if let Err(e) = self.local.save(&self.workspace) {
            error!(error = ?e, "Failed to save canvas during shutdown");
        }
        if let Some(mirror) = &mut self.mirror {
            mirror.shutdown();
        }
        info!("Editor exiting");
    }
}

pub fn run_gui(services: Services) -> Result<()> {
    let options = NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([services.config.window_width as f32, services.config.window_height as f32])
            .with_min_inner_size([WINDOW_MIN_WIDTH, WINDOW_MIN_HEIGHT])
            .with_title("Card Canvas"),
        ..Default::default()
    };

    eframe::run_native(
        "Card Canvas",
        options,
        Box::new(|cc| Ok(Box::new(EditorApp::new(cc, services)))),
    )
    .map_err(|err| anyhow!("Failed to launch editor window: {err}"))
}
