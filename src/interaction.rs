//! Pointer and keyboard interaction on the canvas
//!
//! The controller owns only the drag/hover state. Card data lives in the
//! `Workspace` passed into every call, and everything the shell needs to react
//! to (repaint, persist, open a menu) is broadcast as a `ControllerEvent`.

use std::sync::mpsc::{self, Receiver, Sender};

use tracing::debug;

use crate::geometry::{snap_point, CardBounds};
use crate::store::NamePolicy;
use crate::types::{CardId, Point};
use crate::workspace::Workspace;

/// Pointer shape the shell should show
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorHint {
    Default,
    Grab,
    Grabbing,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ControllerEvent {
    /// Empty canvas clicked; the add-card form uses this as its placement
    CanvasClicked { position: Point },
    ContextMenuRequested { card: CardId, screen: Point },
    HoverChanged { card: Option<CardId>, cursor: CursorHint },
    RepaintRequested,
    /// Drag ended; `moved` is false for a click without motion
    DragFinished { moved: bool },
    /// A keyboard command changed the store
    CardsChanged,
}

/// Keyboard commands the canvas understands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCommand {
    DeleteSelected,
    SelectAll,
    DuplicateSelected,
    ClearSelection,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum DragState {
    Idle,
    Dragging {
        primary: CardId,
        /// Pointer minus the primary card's center at drag start
        offset: Point,
        moved: bool,
    },
}

pub struct Controller {
    state: DragState,
    hovered: Option<CardId>,
    subscribers: Vec<Sender<ControllerEvent>>,
}

impl Default for Controller {
    fn default() -> Self {
        Self::new()
    }
}

impl Controller {
    pub fn new() -> Self {
        Self {
            state: DragState::Idle,
            hovered: None,
            subscribers: Vec::new(),
        }
    }

    /// Register a listener; it receives every event emitted from now on
    pub fn subscribe(&mut self) -> Receiver<ControllerEvent> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.push(tx);
        rx
    }

    fn emit(&mut self, event: ControllerEvent) {
        // Dropped receivers are pruned on the next send
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging { .. })
    }

    pub fn hovered(&self) -> Option<CardId> {
        self.hovered
    }

    pub fn cursor(&self) -> CursorHint {
        match (self.state, self.hovered) {
            (DragState::Dragging { .. }, _) => CursorHint::Grabbing,
            (DragState::Idle, Some(_)) => CursorHint::Grab,
            (DragState::Idle, None) => CursorHint::Default,
        }
    }

    /// Topmost card whose bounding square contains `point`
    pub fn hit_test(workspace: &Workspace, point: Point) -> Option<CardId> {
        let size = workspace.settings.card_size;
        workspace
            .store
            .cards()
            .iter()
            .rev()
            .find(|card| CardBounds::around(card.x, card.y, size).contains(point))
            .map(|card| card.id)
    }

    pub fn pointer_down(&mut self, workspace: &mut Workspace, position: Point, additive: bool) {
        if self.is_dragging() {
            return;
        }

        let Some(id) = Self::hit_test(workspace, position) else {
            if !additive {
                workspace.clear_selection();
            }
            self.emit(ControllerEvent::CanvasClicked { position });
            self.emit(ControllerEvent::RepaintRequested);
            return;
        };

        if additive {
            if !workspace.toggle_selected(id) {
                // Toggled off: nothing to drag
                self.emit(ControllerEvent::RepaintRequested);
                return;
            }
        } else if !workspace.is_selected(id) {
            workspace.select_only(id);
        }

        let Some(center) = workspace.store.get(id).map(|card| card.position()) else {
            return;
        };
        self.state = DragState::Dragging {
            primary: id,
            offset: Point::new(position.x - center.x, position.y - center.y),
            moved: false,
        };
        debug!(card = id, selected = workspace.selection().len(), "Drag started");
        self.emit(ControllerEvent::RepaintRequested);
    }

    pub fn pointer_move(&mut self, workspace: &mut Workspace, position: Point) {
        match self.state {
            DragState::Dragging { primary, offset, moved } => {
                let Some(current) = workspace.store.get(primary).map(|card| card.position()) else {
                    // Dragged card vanished (deleted or replaced by a remote update)
                    self.state = DragState::Idle;
                    self.emit(ControllerEvent::DragFinished { moved });
                    return;
                };

                let dx = position.x - offset.x - current.x;
                let dy = position.y - offset.y - current.y;
                if dx == 0.0 && dy == 0.0 {
                    return;
                }

                let mut ids = workspace.selection().ids().to_vec();
                if !ids.contains(&primary) {
                    ids.push(primary);
                }
                let grid = workspace.settings.snap_to_grid.then_some(workspace.settings.grid_size);
                for id in ids {
                    let Some(card) = workspace.store.get(id) else {
                        continue;
                    };
                    let target = Point::new(card.x + dx, card.y + dy);
                    let target = grid.map_or(target, |grid| snap_point(target, grid));
                    workspace.store.move_to(id, target.x, target.y);
                }

                self.state = DragState::Dragging { primary, offset, moved: true };
                self.emit(ControllerEvent::RepaintRequested);
            }
            DragState::Idle => {
                let hit = Self::hit_test(workspace, position);
                if hit != self.hovered {
                    self.hovered = hit;
                    let cursor = self.cursor();
                    self.emit(ControllerEvent::HoverChanged { card: hit, cursor });
                    self.emit(ControllerEvent::RepaintRequested);
                }
            }
        }
    }

    pub fn pointer_up(&mut self) {
        if let DragState::Dragging { primary, moved, .. } = self.state {
            self.state = DragState::Idle;
            debug!(card = primary, moved = moved, "Drag finished");
            self.emit(ControllerEvent::DragFinished { moved });
            self.emit(ControllerEvent::RepaintRequested);
        }
    }

    /// Pointer left the canvas: end any drag and clear hover
    pub fn pointer_left(&mut self) {
        self.pointer_up();
        if self.hovered.take().is_some() {
            self.emit(ControllerEvent::HoverChanged {
                card: None,
                cursor: CursorHint::Default,
            });
            self.emit(ControllerEvent::RepaintRequested);
        }
    }

    /// Right click; returns the card under the pointer, if any
    pub fn secondary_click(&mut self, workspace: &Workspace, position: Point, screen: Point) -> Option<CardId> {
        let card = Self::hit_test(workspace, position)?;
        self.emit(ControllerEvent::ContextMenuRequested { card, screen });
        Some(card)
    }

    /// Apply a keyboard command; returns true when the store changed
    pub fn key(&mut self, workspace: &mut Workspace, command: KeyCommand) -> bool {
        if self.is_dragging() {
            return false;
        }
        let changed = match command {
            KeyCommand::DeleteSelected => workspace.delete_selected() > 0,
            KeyCommand::DuplicateSelected => {
                let copies = workspace.duplicate_selected(NamePolicy::Suffix);
                debug!(count = copies.len(), "Duplicated selection");
                !copies.is_empty()
            }
            KeyCommand::SelectAll => {
                workspace.select_all();
                false
            }
            KeyCommand::ClearSelection => {
                workspace.clear_selection();
                false
            }
        };

        if self.hovered.is_some_and(|id| !workspace.store.contains(id)) {
            self.hovered = None;
        }
        if changed {
            self.emit(ControllerEvent::CardsChanged);
        }
        self.emit(ControllerEvent::RepaintRequested);
        changed
    }
}
