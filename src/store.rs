//! In-memory card store
//!
//! Ordered list of cards (later entries are drawn on top) with store-assigned ids.
//! Lookups by an unknown id never fail loudly: they return `None`/`false` and the
//! caller decides what to tell the user.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::{debug, info, warn};

use crate::constants::card::{COPY_SUFFIX, DUPLICATE_OFFSET, FIRST_ID, MAX_ID};
use crate::constants::layout::{POPULATE_PER_CIRCLE, POPULATE_RING_FACTOR};
use crate::geometry::VennLayout;
use crate::seed;
use crate::types::{CardId, Category, Point, Template};

/// A positioned tile representing one company
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub id: CardId,
    pub company: String,
    #[serde(default)]
    pub category: Category,
    /// Canvas-space center
    #[serde(default)]
    pub x: f32,
    #[serde(default)]
    pub y: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
    /// Transient: logos are always refetched, never serialized as pixels
    #[serde(default)]
    pub logo_loaded: bool,
    #[serde(default)]
    pub is_portfolio: bool,
    #[serde(default)]
    pub template: Template,
    #[serde(with = "time::serde::rfc3339", default = "OffsetDateTime::now_utc", alias = "created")]
    pub created_at: OffsetDateTime,
}

impl Card {
    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Hover text: company followed by its category key
    pub fn tooltip(&self) -> String {
        format!("{} ({})", self.company, self.category.as_str())
    }

    /// Case-insensitive match on company name or category; `query` is already lowercase
    pub fn matches(&self, query: &str) -> bool {
        self.company.to_lowercase().contains(query) || self.category.as_str().contains(query)
    }
}

/// Fields accepted by `CardStore::create`
#[derive(Debug, Clone, Default)]
pub struct NewCard {
    pub company: String,
    pub category: Option<Category>,
    pub x: Option<f32>,
    pub y: Option<f32>,
    pub logo_url: Option<String>,
    pub is_portfolio: bool,
    pub template: Option<Template>,
}

impl NewCard {
    pub fn new(company: impl Into<String>) -> Self {
        Self {
            company: company.into(),
            ..Self::default()
        }
    }

    pub fn category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    pub fn at(mut self, x: f32, y: f32) -> Self {
        self.x = Some(x);
        self.y = Some(y);
        self
    }

    pub fn portfolio(mut self, is_portfolio: bool) -> Self {
        self.is_portfolio = is_portfolio;
        self
    }

    pub fn template(mut self, template: Template) -> Self {
        self.template = Some(template);
        self
    }

    pub fn logo_url(mut self, url: Option<String>) -> Self {
        self.logo_url = url;
        self
    }
}

/// Partial update; `None` leaves the field untouched
#[derive(Debug, Clone, Default)]
pub struct CardPatch {
    pub company: Option<String>,
    pub category: Option<Category>,
    pub x: Option<f32>,
    pub y: Option<f32>,
    /// `Some(None)` clears the logo url
    pub logo_url: Option<Option<String>>,
    pub is_portfolio: Option<bool>,
    pub template: Option<Template>,
}

/// How a duplicate is named
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamePolicy {
    Keep,
    Suffix,
}

/// Full store contents for export/import
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    #[serde(default)]
    pub cards: Vec<Card>,
    #[serde(default, alias = "cardIdCounter")]
    pub id_counter: CardId,
    #[serde(with = "time::serde::rfc3339", default = "OffsetDateTime::now_utc")]
    pub timestamp: OffsetDateTime,
}

/// Aggregate counts over the store
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Statistics {
    pub total: usize,
    pub by_category: BTreeMap<&'static str, usize>,
    pub portfolio: usize,
    pub with_logos: usize,
}

#[derive(Debug, Clone)]
pub struct CardStore {
    cards: Vec<Card>,
    next_id: CardId,
}

impl Default for CardStore {
    fn default() -> Self {
        Self {
            cards: Vec::new(),
            next_id: FIRST_ID,
        }
    }
}

/// Replace a non-finite coordinate with `fallback`
fn finite_or(value: f32, fallback: f32) -> f32 {
    if value.is_finite() { value } else { fallback }
}

impl CardStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Id the next created card will receive
    pub fn next_id(&self) -> CardId {
        self.next_id
    }

    pub fn get(&self, id: CardId) -> Option<&Card> {
        self.cards.iter().find(|card| card.id == id)
    }

    pub fn contains(&self, id: CardId) -> bool {
        self.get(id).is_some()
    }

    fn index_of(&self, id: CardId) -> Option<usize> {
        self.cards.iter().position(|card| card.id == id)
    }

    fn take_id(&mut self) -> CardId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Append a card; non-finite coordinates fall back to the origin
    pub fn create(&mut self, fields: NewCard) -> &Card {
        let id = self.take_id();
        let x = fields.x.map_or(0.0, |x| finite_or(x, 0.0));
        let y = fields.y.map_or(0.0, |y| finite_or(y, 0.0));
        let card = Card {
            id,
            company: fields.company,
            category: fields.category.unwrap_or_default(),
            x,
            y,
            logo_url: fields.logo_url.filter(|url| !url.trim().is_empty()),
            logo_loaded: false,
            is_portfolio: fields.is_portfolio,
            template: fields.template.unwrap_or_default(),
            created_at: OffsetDateTime::now_utc(),
        };
        debug!(id = id, company = %card.company, x = x, y = y, "Created card");
        self.cards.push(card);
        &self.cards[self.cards.len() - 1]
    }

    /// Apply a partial update; a non-finite coordinate in the patch is ignored
    pub fn update(&mut self, id: CardId, patch: CardPatch) -> Option<&Card> {
        let index = self.index_of(id)?;
        let card = &mut self.cards[index];

        if let Some(company) = patch.company {
            card.company = company;
        }
        if let Some(category) = patch.category {
            card.category = category;
        }
        if let Some(x) = patch.x {
            if !x.is_finite() {
                warn!(id = id, x = x, "Ignoring non-finite x in card update");
            }
            card.x = finite_or(x, card.x);
        }
        if let Some(y) = patch.y {
            if !y.is_finite() {
                warn!(id = id, y = y, "Ignoring non-finite y in card update");
            }
            card.y = finite_or(y, card.y);
        }
        if let Some(logo_url) = patch.logo_url {
            card.logo_url = logo_url;
            card.logo_loaded = false;
        }
        if let Some(is_portfolio) = patch.is_portfolio {
            card.is_portfolio = is_portfolio;
        }
        if let Some(template) = patch.template {
            card.template = template;
        }
        Some(&self.cards[index])
    }

    /// Move a card's center; non-finite coordinates keep the previous value
    pub fn move_to(&mut self, id: CardId, x: f32, y: f32) -> bool {
        let Some(index) = self.index_of(id) else {
            return false;
        };
        let card = &mut self.cards[index];
        card.x = finite_or(x, card.x);
        card.y = finite_or(y, card.y);
        true
    }

    pub fn delete(&mut self, id: CardId) -> bool {
        match self.index_of(id) {
            Some(index) => {
                let card = self.cards.remove(index);
                debug!(id = id, company = %card.company, "Deleted card");
                true
            }
            None => false,
        }
    }

    /// Copy a card with a fresh id, offset by `DUPLICATE_OFFSET`
    pub fn duplicate(&mut self, id: CardId, policy: NamePolicy) -> Option<&Card> {
        let original = self.get(id)?.clone();
        let new_id = self.take_id();
        let company = match policy {
            NamePolicy::Keep => original.company,
            NamePolicy::Suffix => format!("{}{}", original.company, COPY_SUFFIX),
        };
        self.cards.push(Card {
            id: new_id,
            company,
            x: original.x + DUPLICATE_OFFSET.0,
            y: original.y + DUPLICATE_OFFSET.1,
            created_at: OffsetDateTime::now_utc(),
            ..original
        });
        debug!(original = id, id = new_id, "Duplicated card");
        self.cards.last()
    }

    /// Remove every card and restart ids
    pub fn clear(&mut self) {
        info!(count = self.cards.len(), "Clearing all cards");
        self.cards.clear();
        self.next_id = FIRST_ID;
    }

    /// Move a card to the end of the list so it paints last
    pub fn bring_to_front(&mut self, id: CardId) -> bool {
        let Some(index) = self.index_of(id) else {
            return false;
        };
        let card = self.cards.remove(index);
        self.cards.push(card);
        true
    }

    /// Move a card to the start of the list so it paints first
    pub fn send_to_back(&mut self, id: CardId) -> bool {
        let Some(index) = self.index_of(id) else {
            return false;
        };
        let card = self.cards.remove(index);
        self.cards.insert(0, card);
        true
    }

    /// Record a successful logo fetch. `None` when the card was deleted in the
    /// meantime, otherwise whether the stored url changed.
    pub fn mark_logo_loaded(&mut self, id: CardId, url: &str) -> Option<bool> {
        let Some(index) = self.index_of(id) else {
            debug!(id = id, "Logo arrived for missing card, ignoring");
            return None;
        };
        let card = &mut self.cards[index];
        card.logo_loaded = true;
        if card.logo_url.as_deref() == Some(url) {
            return Some(false);
        }
        card.logo_url = Some(url.to_string());
        Some(true)
    }

    pub fn export_snapshot(&self) -> Snapshot {
        Snapshot {
            cards: self.cards.clone(),
            id_counter: self.next_id,
            timestamp: OffsetDateTime::now_utc(),
        }
    }

    /// Replace the store contents; logo state always restarts as not loaded
    ///
    /// The first card carrying an id keeps it. Later duplicates, and ids outside
    /// `FIRST_ID..=MAX_ID`, are given fresh ids after the highest kept one.
    pub fn import_snapshot(&mut self, snapshot: Snapshot) {
        let mut cards = snapshot.cards;
        let mut seen = HashSet::with_capacity(cards.len());
        let mut kept = vec![false; cards.len()];
        for (index, card) in cards.iter_mut().enumerate() {
            card.logo_loaded = false;
            card.x = finite_or(card.x, 0.0);
            card.y = finite_or(card.y, 0.0);
            kept[index] = (FIRST_ID..=MAX_ID).contains(&card.id) && seen.insert(card.id);
        }

        let counter = if snapshot.id_counter <= MAX_ID {
            snapshot.id_counter
        } else {
            warn!(counter = snapshot.id_counter, "Ignoring out-of-range id counter");
            FIRST_ID
        };
        let max_kept = seen.iter().copied().max().unwrap_or(0);
        self.next_id = counter.max(max_kept.saturating_add(1)).max(FIRST_ID);

        for (card, kept) in cards.iter_mut().zip(kept) {
            if !kept {
                let id = self.take_id();
                warn!(old = card.id, new = id, company = %card.company, "Renumbered imported card");
                card.id = id;
            }
        }
        info!(count = cards.len(), next_id = self.next_id, "Imported snapshot");
        self.cards = cards;
    }

    /// Case-insensitive match on company name or category
    pub fn search(&self, query: &str) -> Vec<&Card> {
        let query = query.to_lowercase();
        self.cards.iter().filter(|card| card.matches(&query)).collect()
    }

    pub fn by_category(&self, category: Category) -> Vec<&Card> {
        self.cards.iter().filter(|card| card.category == category).collect()
    }

    pub fn statistics(&self) -> Statistics {
        let mut stats = Statistics {
            total: self.cards.len(),
            ..Statistics::default()
        };
        for card in &self.cards {
            *stats.by_category.entry(card.category.as_str()).or_default() += 1;
            if card.is_portfolio {
                stats.portfolio += 1;
            }
            if card.logo_loaded {
                stats.with_logos += 1;
            }
        }
        stats
    }

    /// Clear the store and lay out the built-in company set around the circles
    /// Returns the number of cards added
    pub fn populate(&mut self, layout: &VennLayout) -> usize {
        self.clear();

        for group in seed::CIRCLE_GROUPS {
            let count = group.companies.len().min(POPULATE_PER_CIRCLE);
            for (index, company) in group.companies.iter().take(count).enumerate() {
                let position = layout.ring_point(group.circle, index, count, POPULATE_RING_FACTOR);
                self.create(
                    NewCard::new(*company)
                        .category(group.category)
                        .at(position.x, position.y)
                        .portfolio(seed::is_portfolio_slot(index)),
                );
            }
        }
        self.add_intersection_companies(layout);

        info!(count = self.cards.len(), "Populated canvas");
        self.cards.len()
    }

    /// Companies spanning two circles, placed in the overlap lenses
    pub fn add_intersection_companies(&mut self, layout: &VennLayout) -> usize {
        let mut added = 0;
        for entry in seed::INTERSECTIONS {
            let position = seed::intersection_position(layout, entry.placement);
            self.create(
                NewCard::new(entry.company)
                    .category(entry.category)
                    .template(entry.template)
                    .at(position.x, position.y)
                    .portfolio(true),
            );
            added += 1;
        }
        added
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{classify, compute_layout, CircleId};

    fn store_with(names: &[&str]) -> CardStore {
        let mut store = CardStore::new();
        for (i, name) in names.iter().enumerate() {
            store.create(NewCard::new(*name).at(i as f32 * 100.0, 50.0));
        }
        store
    }

    #[test]
    fn test_ids_unique_and_increasing() {
        let mut store = CardStore::new();
        let mut last = 0;
        for i in 0..20 {
            let id = store.create(NewCard::new(format!("Company {i}"))).id;
            assert!(id > last);
            last = id;
        }
        // Deleting does not cause reuse
        assert!(store.delete(5));
        let id = store.create(NewCard::new("After delete")).id;
        assert!(id > last);
    }

    #[test]
    fn test_create_defaults() {
        let mut store = CardStore::new();
        let card = store.create(NewCard::new("Acme Corp"));
        assert_eq!(card.id, FIRST_ID);
        assert_eq!(card.category, Category::Technology);
        assert_eq!(card.template, Template::Executive);
        assert_eq!(card.position(), Point::new(0.0, 0.0));
        assert!(!card.logo_loaded);
        assert!(card.logo_url.is_none());
    }

    #[test]
    fn test_create_rejects_non_finite_position() {
        let mut store = CardStore::new();
        let card = store.create(NewCard::new("NaN Inc").at(f32::NAN, f32::INFINITY));
        assert_eq!(card.position(), Point::new(0.0, 0.0));
    }

    #[test]
    fn test_update_fields_and_ignore_non_finite() {
        let mut store = store_with(&["Acme"]);
        let patch = CardPatch {
            company: Some("Acme Corp".into()),
            category: Some(Category::Finance),
            x: Some(f32::NAN),
            y: Some(75.0),
            ..CardPatch::default()
        };
        let card = store.update(1, patch).unwrap();
        assert_eq!(card.company, "Acme Corp");
        assert_eq!(card.category, Category::Finance);
        assert_eq!(card.x, 0.0);
        assert_eq!(card.y, 75.0);
    }

    #[test]
    fn test_unknown_id_sentinels() {
        let mut store = store_with(&["A", "B"]);
        assert!(store.update(9999, CardPatch::default()).is_none());
        assert!(!store.delete(9999));
        assert!(store.duplicate(9999, NamePolicy::Keep).is_none());
        assert!(!store.move_to(9999, 1.0, 1.0));
        assert!(!store.bring_to_front(9999));
        assert_eq!(store.mark_logo_loaded(9999, "https://example.com/logo.png"), None);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_duplicate_offsets_and_keeps_identity_fields() {
        let mut store = CardStore::new();
        let original = store
            .create(NewCard::new("Acme Corp").category(Category::Retail).at(100.0, 100.0))
            .clone();
        let copy = store.duplicate(original.id, NamePolicy::Keep).unwrap().clone();
        assert_ne!(copy.id, original.id);
        assert_eq!(copy.company, original.company);
        assert_eq!(copy.category, original.category);
        assert_eq!(copy.x, original.x + DUPLICATE_OFFSET.0);
        assert_eq!(copy.y, original.y + DUPLICATE_OFFSET.1);

        let suffixed = store.duplicate(original.id, NamePolicy::Suffix).unwrap();
        assert_eq!(suffixed.company, "Acme Corp Copy");
    }

    #[test]
    fn test_clear_resets_counter() {
        let mut store = store_with(&["A", "B", "C"]);
        store.clear();
        assert!(store.is_empty());
        assert_eq!(store.create(NewCard::new("D")).id, FIRST_ID);
    }

    #[test]
    fn test_z_order() {
        let mut store = store_with(&["A", "B", "C"]);
        assert!(store.bring_to_front(1));
        let order: Vec<_> = store.cards().iter().map(|c| c.id).collect();
        assert_eq!(order, vec![2, 3, 1]);
        assert!(store.send_to_back(3));
        let order: Vec<_> = store.cards().iter().map(|c| c.id).collect();
        assert_eq!(order, vec![3, 2, 1]);
    }

    #[test]
    fn test_snapshot_round_trip_resets_logo_state() {
        let mut store = store_with(&["Acme Corp", "Globex"]);
        store.mark_logo_loaded(1, "https://logo.clearbit.com/acmecorp.com");
        store.delete(2);
        let snapshot = store.export_snapshot();
        let json = serde_json::to_string(&snapshot).unwrap();

        let mut restored = CardStore::new();
        restored.import_snapshot(serde_json::from_str(&json).unwrap());

        assert_eq!(restored.len(), store.len());
        for (a, b) in restored.cards().iter().zip(store.cards()) {
            assert_eq!(a.id, b.id);
            assert_eq!(a.company, b.company);
            assert_eq!(a.position(), b.position());
            assert_eq!(a.logo_url, b.logo_url);
            assert!(!a.logo_loaded);
        }
        // Counter survives so ids are not reused
        assert_eq!(restored.next_id(), store.next_id());
    }

    #[test]
    fn test_import_repairs_stale_counter() {
        let mut store = store_with(&["A", "B", "C"]);
        let mut snapshot = store.export_snapshot();
        snapshot.id_counter = 1;
        store.import_snapshot(snapshot);
        assert_eq!(store.next_id(), 4);
    }

    #[test]
    fn test_mark_logo_loaded_reports_url_change() {
        let mut store = store_with(&["Acme Corp"]);
        let url = "https://logo.clearbit.com/acmecorp.com";
        assert_eq!(store.mark_logo_loaded(1, url), Some(true));
        assert_eq!(store.mark_logo_loaded(1, url), Some(false));
        assert_eq!(store.get(1).unwrap().logo_url.as_deref(), Some(url));

        store.import_snapshot(store.export_snapshot());
        assert_eq!(store.mark_logo_loaded(1, url), Some(false));
        assert!(store.get(1).unwrap().logo_loaded);
    }

    #[test]
    fn test_import_renumbers_ids_at_the_top_of_the_range() {
        let mut store = CardStore::new();
        let card = store.create(NewCard::new("Huge")).clone();
        store.import_snapshot(Snapshot {
            cards: vec![Card { id: u64::MAX, ..card.clone() }, Card { id: 0, ..card }],
            id_counter: u64::MAX,
            timestamp: OffsetDateTime::now_utc(),
        });

        let ids: Vec<_> = store.cards().iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(store.create(NewCard::new("After")).id, 3);
    }

    #[test]
    fn test_import_renumbers_duplicate_ids() {
        let json = r#"{"cards":[{"id":3,"company":"A"},{"id":3,"company":"B"}],"idCounter":2}"#;
        let mut store = CardStore::new();
        store.import_snapshot(serde_json::from_str(json).unwrap());

        assert_eq!(store.get(3).unwrap().company, "A");
        assert_eq!(store.get(4).unwrap().company, "B");
        assert_eq!(store.create(NewCard::new("C")).id, 5);
        assert!(store.delete(4));
        assert_eq!(store.get(3).unwrap().company, "A");
    }

    #[test]
    fn test_legacy_card_fields() {
        let json = r#"{"cards":[{"id":7,"company":"Old","x":1,"y":2,"created":"2024-01-02T03:04:05Z","logoLoaded":true,"extra":42}],"cardIdCounter":8}"#;
        let snapshot: Snapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snapshot.id_counter, 8);
        assert_eq!(snapshot.cards[0].created_at.year(), 2024);
        let mut store = CardStore::new();
        store.import_snapshot(snapshot);
        assert!(!store.get(7).unwrap().logo_loaded);
    }

    #[test]
    fn test_search_and_statistics() {
        let mut store = CardStore::new();
        store.create(NewCard::new("Gusto").category(Category::Finance).portfolio(true));
        store.create(NewCard::new("BambooHR"));
        store.create(NewCard::new("Ramp").category(Category::Finance));

        assert_eq!(store.search("gus").len(), 1);
        assert_eq!(store.search("FINANCE").len(), 2);
        assert_eq!(store.by_category(Category::Technology).len(), 1);

        let stats = store.statistics();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.by_category.get("finance"), Some(&2));
        assert_eq!(stats.portfolio, 1);
        assert_eq!(stats.with_logos, 0);
    }

    #[test]
    fn test_tooltip_names_company_and_category() {
        let mut store = CardStore::new();
        let card = store.create(NewCard::new("Gusto").category(Category::Finance));
        assert_eq!(card.tooltip(), "Gusto (finance)");
    }

    #[test]
    fn test_populate_places_cards_in_their_circles() {
        let layout = compute_layout(1600.0, 1000.0, 180.0, 310.0);
        let mut store = store_with(&["Leftover"]);
        let added = store.populate(&layout);

        assert_eq!(added, store.len());
        assert_eq!(added, 3 * POPULATE_PER_CIRCLE + seed::INTERSECTIONS.len());
        assert!(store.search("Leftover").is_empty());

        let first = &store.cards()[0];
        assert!(classify(first.position(), &layout).contains(CircleId::Top));
    }
}
