//! Venn layout math, circle classification, card bounds and grid snapping

use std::f32::consts::PI;

use crate::constants::layout::{MARGIN, MAX_RADIUS, MIN_RADIUS};
use crate::types::Point;

/// One of the three category circles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CircleId {
    Top,
    Left,
    Right,
}

impl CircleId {
    pub const ALL: [CircleId; 3] = [CircleId::Top, CircleId::Left, CircleId::Right];

    /// Position in `ALL` (Top, Left, Right)
    pub fn index(self) -> usize {
        match self {
            CircleId::Top => 0,
            CircleId::Left => 1,
            CircleId::Right => 2,
        }
    }

    fn bit(self) -> u8 {
        1 << self.index()
    }
}

/// Subset of the three circles a point falls into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CircleSet(u8);

impl CircleSet {
    pub fn insert(&mut self, id: CircleId) {
        self.0 |= id.bit();
    }

    pub fn contains(self, id: CircleId) -> bool {
        self.0 & id.bit() != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn iter(self) -> impl Iterator<Item = CircleId> {
        CircleId::ALL.into_iter().filter(move |id| self.contains(*id))
    }
}

impl CircleSet {
    /// Member circles named by `labels` (indexed like `CircleId::ALL`), joined with ∩
    pub fn describe<S: AsRef<str>>(self, labels: &[S; 3]) -> String {
        if self.is_empty() {
            return "no circle".to_string();
        }
        self.iter()
            .map(|id| labels[id.index()].as_ref())
            .collect::<Vec<_>>()
            .join(" \u{2229} ")
    }
}

/// Three circles of a shared radius whose centers form an equilateral triangle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VennLayout {
    pub radius: f32,
    /// Distance between any two centers
    pub spacing: f32,
    /// Centers indexed Top, Left, Right
    pub centers: [Point; 3],
}

impl VennLayout {
    pub fn center(&self, id: CircleId) -> Point {
        self.centers[id.index()]
    }

    /// Midpoint between two circle centers (the lens of their overlap)
    pub fn midpoint(&self, a: CircleId, b: CircleId) -> Point {
        let (pa, pb) = (self.center(a), self.center(b));
        Point::new((pa.x + pb.x) / 2.0, (pa.y + pb.y) / 2.0)
    }

    /// Point `index` of `count` evenly spaced on a ring around circle `id`
    pub fn ring_point(&self, id: CircleId, index: usize, count: usize, ring_factor: f32) -> Point {
        let center = self.center(id);
        let angle = index as f32 / count.max(1) as f32 * 2.0 * PI;
        let distance = self.radius * ring_factor;
        Point::new(center.x + angle.cos() * distance, center.y + angle.sin() * distance)
    }

    /// Axis-aligned bounds of the union of the three circles: (min_x, min_y, max_x, max_y)
    #[cfg(test)]
    pub fn bounds(&self) -> (f32, f32, f32, f32) {
        self.centers.iter().fold(
            (f32::INFINITY, f32::INFINITY, f32::NEG_INFINITY, f32::NEG_INFINITY),
            |(x0, y0, x1, y1), c| {
                (
                    x0.min(c.x - self.radius),
                    y0.min(c.y - self.radius),
                    x1.max(c.x + self.radius),
                    y1.max(c.y + self.radius),
                )
            },
        )
    }
}

/// Height of the equilateral triangle with side `spacing`
fn triangle_height(spacing: f32) -> f32 {
    spacing * 3f32.sqrt() / 2.0
}

/// Spacing that places each center on the other two circles' intersection lens
pub fn optimal_spacing(radius: f32) -> f32 {
    (radius * 3f32.sqrt()).round()
}

/// Compute the three circle centers and radius for a viewport
///
/// The requested radius and spacing are scaled down together until the whole
/// figure fits inside the viewport minus `MARGIN` on every side, then the radius
/// is clamped to `MIN_RADIUS..=MAX_RADIUS`. On viewports too small for the
/// minimum radius the fit wins.
pub fn compute_layout(width: f32, height: f32, radius: f32, spacing: f32) -> VennLayout {
    let center = Point::new(width / 2.0, height / 2.0);
    let avail_w = width - 2.0 * MARGIN;
    let avail_h = height - 2.0 * MARGIN;

    let degenerate = !(avail_w > 0.0 && avail_h > 0.0 && radius.is_finite() && spacing.is_finite())
        || radius <= 0.0
        || spacing < 0.0;
    if degenerate {
        return VennLayout { radius: 0.0, spacing: 0.0, centers: [center; 3] };
    }

    let need_w = spacing + 2.0 * radius;
    let need_h = triangle_height(spacing) + 2.0 * radius;
    let scale = 1f32.min(avail_w / need_w).min(avail_h / need_h);

    let spacing = spacing * scale;
    let tri_h = triangle_height(spacing);
    let fit_limit = ((avail_w - spacing) / 2.0).min((avail_h - tri_h) / 2.0).max(0.0);
    let radius = (radius * scale).clamp(MIN_RADIUS, MAX_RADIUS).min(fit_limit);

    // Centroid sits h/6 below the bounding-box center, which is kept at the viewport center
    let cx = center.x;
    let cy = center.y + tri_h / 6.0;

    VennLayout {
        radius,
        spacing,
        centers: [
            Point::new(cx, cy - tri_h * 2.0 / 3.0),
            Point::new(cx - spacing / 2.0, cy + tri_h / 3.0),
            Point::new(cx + spacing / 2.0, cy + tri_h / 3.0),
        ],
    }
}

/// Circles whose center lies within `radius` of `point` (boundary counts as inside)
pub fn classify(point: Point, layout: &VennLayout) -> CircleSet {
    let mut set = CircleSet::default();
    for id in CircleId::ALL {
        if point.distance(layout.center(id)) <= layout.radius {
            set.insert(id);
        }
    }
    set
}

/// Axis-aligned bounding square of a card
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CardBounds {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl CardBounds {
    /// Square of side `size` centered on (`cx`, `cy`)
    pub fn around(cx: f32, cy: f32, size: f32) -> Self {
        Self {
            x: cx - size / 2.0,
            y: cy - size / 2.0,
            width: size,
            height: size,
        }
    }

    pub fn left(&self) -> f32 {
        self.x
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn top(&self) -> f32 {
        self.y
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Inclusive on every edge
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.left() && point.x <= self.right() && point.y >= self.top() && point.y <= self.bottom()
    }

    /// Grow on every side by `amount`
    pub fn inflate(&self, amount: f32) -> Self {
        Self {
            x: self.x - amount,
            y: self.y - amount,
            width: self.width + 2.0 * amount,
            height: self.height + 2.0 * amount,
        }
    }
}

/// Round `value` to the nearest multiple of `grid`, ties to the even multiple
/// Returns `value` unchanged when `grid` is not a positive finite number
pub fn snap_to_grid(value: f32, grid: f32) -> f32 {
    if !(grid > 0.0 && grid.is_finite()) {
        return value;
    }
    (value / grid).round_ties_even() * grid
}

pub fn snap_point(point: Point, grid: f32) -> Point {
    Point::new(snap_to_grid(point.x, grid), snap_to_grid(point.y, grid))
}
