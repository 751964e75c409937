//! Built-in company data used by populate and first-run seeding

use crate::constants::layout::SEED_VIEWPORT;
use crate::geometry::{compute_layout, CircleId, VennLayout};
use crate::store::CardStore;
use crate::types::{Category, Point, Template, ViewSettings};

pub struct CircleGroup {
    pub circle: CircleId,
    pub category: Category,
    pub companies: &'static [&'static str],
}

pub const CIRCLE_GROUPS: &[CircleGroup] = &[
    CircleGroup {
        circle: CircleId::Top,
        category: Category::Technology,
        companies: &[
            "BambooHR", "Workday", "ADP", "Namely", "Rippling",
            "Lattice", "Culture Amp", "BreatheHR", "Personio", "HiBob",
        ],
    },
    CircleGroup {
        circle: CircleId::Left,
        category: Category::Finance,
        companies: &[
            "Gusto", "Justworks", "Paychex", "TriNet", "Paylocity",
            "UKG", "Remote", "Deel", "Sage", "Zenefits",
        ],
    },
    CircleGroup {
        circle: CircleId::Right,
        category: Category::Finance,
        companies: &[
            "Expensify", "Ramp", "Brex", "Pleo", "Spendesk",
            "Divvy", "Concur", "Coupa", "Airbase", "Mesh",
        ],
    },
];

/// Where an intersection company sits
#[derive(Debug, Clone, Copy)]
pub enum Placement {
    /// Midpoint between two circle centers
    Lens(CircleId, CircleId),
    /// Just below a circle's center
    BelowCenter(CircleId),
}

pub struct Intersection {
    pub company: &'static str,
    pub category: Category,
    pub template: Template,
    pub placement: Placement,
}

pub const INTERSECTIONS: &[Intersection] = &[
    Intersection {
        company: "Rippling",
        category: Category::Technology,
        template: Template::Modern,
        placement: Placement::Lens(CircleId::Top, CircleId::Left),
    },
    Intersection {
        company: "Workday",
        category: Category::Technology,
        template: Template::Corporate,
        placement: Placement::Lens(CircleId::Top, CircleId::Right),
    },
    Intersection {
        company: "BambooHR",
        category: Category::Technology,
        template: Template::Classic,
        placement: Placement::Lens(CircleId::Left, CircleId::Right),
    },
    Intersection {
        company: "Justworks",
        category: Category::Finance,
        template: Template::Neon,
        placement: Placement::BelowCenter(CircleId::Top),
    },
];

const BELOW_CENTER_OFFSET: f32 = 20.0;

pub fn intersection_position(layout: &VennLayout, placement: Placement) -> Point {
    match placement {
        Placement::Lens(a, b) => layout.midpoint(a, b),
        Placement::BelowCenter(id) => {
            let center = layout.center(id);
            Point::new(center.x, center.y + BELOW_CENTER_OFFSET)
        }
    }
}

/// Every third company around a circle is flagged as a portfolio company
pub fn is_portfolio_slot(index: usize) -> bool {
    index % 3 == 2
}

/// Small starting board used when nothing was persisted yet
pub fn seed_store(settings: &ViewSettings) -> CardStore {
    let (width, height) = SEED_VIEWPORT;
    let layout = compute_layout(width, height, settings.circle_radius, settings.circle_spacing);
    let mut store = CardStore::new();
    store.add_intersection_companies(&layout);
    store
}
