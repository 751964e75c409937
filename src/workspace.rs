//! Card store, selection and view settings kept consistent together
//!
//! Every mutation that can remove cards prunes the selection in the same call,
//! so `selection ⊆ cards` holds whenever control returns to the caller.

use tracing::info;

use crate::error::EditorError;
use crate::geometry::VennLayout;
use crate::store::{CardStore, NamePolicy, NewCard, Snapshot};
use crate::types::{CardId, Point, ViewSettings};

/// Ordered set of selected card ids
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    ids: Vec<CardId>,
}

impl Selection {
    pub fn ids(&self) -> &[CardId] {
        &self.ids
    }

    pub fn contains(&self, id: CardId) -> bool {
        self.ids.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    fn replace(&mut self, id: CardId) {
        self.ids.clear();
        self.ids.push(id);
    }

    fn insert(&mut self, id: CardId) {
        if !self.contains(id) {
            self.ids.push(id);
        }
    }

    fn remove(&mut self, id: CardId) -> bool {
        let before = self.ids.len();
        self.ids.retain(|selected| *selected != id);
        self.ids.len() != before
    }

    fn clear(&mut self) {
        self.ids.clear();
    }
}

/// Horizontal alignment target for the selected cards
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alignment {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Horizontal,
    Vertical,
}

#[derive(Debug, Clone, Default)]
pub struct Workspace {
    pub store: CardStore,
    selection: Selection,
    pub settings: ViewSettings,
}

impl Workspace {
    pub fn new(store: CardStore, settings: ViewSettings) -> Self {
        Self {
            store,
            selection: Selection::default(),
            settings,
        }
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn is_selected(&self, id: CardId) -> bool {
        self.selection.contains(id)
    }

    /// Replace the selection with a single card; unknown ids clear it
    pub fn select_only(&mut self, id: CardId) {
        if self.store.contains(id) {
            self.selection.replace(id);
        } else {
            self.selection.clear();
        }
    }

    /// Flip membership of `id`; returns whether it is selected afterwards
    pub fn toggle_selected(&mut self, id: CardId) -> bool {
        if self.selection.remove(id) {
            return false;
        }
        if self.store.contains(id) {
            self.selection.insert(id);
            return true;
        }
        false
    }

    pub fn select_all(&mut self) {
        self.selection.ids = self.store.cards().iter().map(|card| card.id).collect();
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    fn prune_selection(&mut self) {
        let store = &self.store;
        self.selection.ids.retain(|id| store.contains(*id));
    }

    /// Validate form input and place a new card, selecting it
    pub fn add_card(&mut self, fields: NewCard, position: Option<Point>) -> Result<CardId, EditorError> {
        let company = fields.company.trim().to_string();
        if company.is_empty() {
            return Err(EditorError::EmptyCompanyName);
        }
        let position = position.filter(|p| p.is_finite()).ok_or(EditorError::NoPosition)?;

        let id = self
            .store
            .create(NewCard { company, ..fields }.at(position.x, position.y))
            .id;
        self.selection.replace(id);
        Ok(id)
    }

    pub fn delete_card(&mut self, id: CardId) -> bool {
        let removed = self.store.delete(id);
        if removed {
            self.selection.remove(id);
        }
        removed
    }

    /// Delete every selected card; returns how many were removed
    pub fn delete_selected(&mut self) -> usize {
        let ids = std::mem::take(&mut self.selection.ids);
        let removed = ids.into_iter().filter(|id| self.store.delete(*id)).count();
        if removed > 0 {
            info!(count = removed, "Deleted selected cards");
        }
        removed
    }

    /// Duplicate the selection; the copies become the new selection
    pub fn duplicate_selected(&mut self, policy: NamePolicy) -> Vec<CardId> {
        let originals = self.selection.ids.clone();
        let copies: Vec<CardId> = originals
            .into_iter()
            .filter_map(|id| self.store.duplicate(id, policy).map(|card| card.id))
            .collect();
        if !copies.is_empty() {
            self.selection.ids = copies.clone();
        }
        copies
    }

    pub fn duplicate_card(&mut self, id: CardId, policy: NamePolicy) -> Option<CardId> {
        let copy = self.store.duplicate(id, policy)?.id;
        self.selection.replace(copy);
        Some(copy)
    }

    pub fn clear_all(&mut self) {
        self.store.clear();
        self.selection.clear();
    }

    pub fn populate(&mut self, layout: &VennLayout) -> usize {
        self.selection.clear();
        self.store.populate(layout)
    }

    pub fn import_snapshot(&mut self, snapshot: Snapshot) {
        self.store.import_snapshot(snapshot);
        self.prune_selection();
    }

    /// Line up the selected cards horizontally; needs at least two
    pub fn align_selected(&mut self, alignment: Alignment, canvas_center_x: f32) -> Result<(), EditorError> {
        if self.selection.len() < 2 {
            return Err(EditorError::NotEnoughSelected { needed: 2 });
        }
        let xs: Vec<f32> = self.selected_positions().iter().map(|(_, p)| p.x).collect();
        let target = match alignment {
            Alignment::Left => xs.iter().copied().fold(f32::INFINITY, f32::min),
            Alignment::Right => xs.iter().copied().fold(f32::NEG_INFINITY, f32::max),
            Alignment::Center => canvas_center_x,
        };
        for id in self.selection.ids.clone() {
            let y = self.store.get(id).map_or(0.0, |card| card.y);
            self.store.move_to(id, target, y);
        }
        Ok(())
    }

    /// Space the selected cards evenly between the outermost two; needs at least three
    pub fn distribute_selected(&mut self, axis: Axis) -> Result<(), EditorError> {
        if self.selection.len() < 3 {
            return Err(EditorError::NotEnoughSelected { needed: 3 });
        }
        let key = |p: &Point| match axis {
            Axis::Horizontal => p.x,
            Axis::Vertical => p.y,
        };
        let mut positions = self.selected_positions();
        positions.sort_by(|a, b| key(&a.1).total_cmp(&key(&b.1)));

        let first = key(&positions[0].1);
        let last = key(&positions[positions.len() - 1].1);
        let step = (last - first) / (positions.len() - 1) as f32;

        for (index, (id, position)) in positions.into_iter().enumerate() {
            let value = first + step * index as f32;
            match axis {
                Axis::Horizontal => self.store.move_to(id, value, position.y),
                Axis::Vertical => self.store.move_to(id, position.x, value),
            };
        }
        Ok(())
    }

    fn selected_positions(&self) -> Vec<(CardId, Point)> {
        self.selection
            .ids
            .iter()
            .filter_map(|id| self.store.get(*id).map(|card| (*id, card.position())))
            .collect()
    }

    /// `selection ⊆ cards`
    pub fn selection_is_consistent(&self) -> bool {
        self.selection.ids.iter().all(|id| self.store.contains(*id))
    }
}
