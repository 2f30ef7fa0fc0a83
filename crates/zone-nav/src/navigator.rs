use serde::{Deserialize, Serialize};

use crate::{Vec2, ZoneId};

/// Result of a path query.
///
/// An empty path means no route exists; callers handle that as a normal outcome.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NavPath {
    pub points: Vec<Vec2>,
    /// Zones visited, start first.
    pub zones: Vec<ZoneId>,
    /// Sum of the `dist_to` costs along `zones`.
    pub cost: f32,
}

impl NavPath {
    pub fn new(points: Vec<Vec2>) -> Self {
        Self {
            points,
            zones: Vec::new(),
            cost: 0.0,
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn clear(&mut self) {
        self.points.clear();
        self.zones.clear();
        self.cost = 0.0;
    }

    /// Length of the polyline through `points`.
    pub fn length(&self) -> f32 {
        self.points.windows(2).map(|w| w[0].distance(w[1])).sum()
    }
}

/// Position-based navigation queries, as consumed by bot decision logic.
pub trait Navigator {
    fn find_path(&self, start: Vec2, goal: Vec2) -> Option<NavPath>;

    /// Project a point onto the nearest navigable surface.
    ///
    /// Backends that don't support projection may return `None`.
    fn nearest_point(&self, _point: Vec2) -> Option<Vec2> {
        None
    }
}
