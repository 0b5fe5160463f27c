//! # Trigger Visual
//!
//! An analog trigger slides its image down by `value * depth` pixels.
//!
//! Triggers sit behind the pad body, so their draw ends by stamping the skin
//! foreground back over their travel envelope. That stamp can cover parts of
//! nearby controls, which is why every trigger keeps a neighbor set: the
//! controls whose domain rectangles overlap its own. The pad composite
//! force-redraws those neighbors each time the trigger draws.

use super::control::ControlId;
use super::geometry::Rect;

/// Travel value, depth and overlap neighbors of a trigger.
#[derive(Debug, Clone, PartialEq)]
pub struct TriggerVisual {
    depth: i32,
    value: f32,
    neighbors: Vec<ControlId>,
}

impl TriggerVisual {
    #[must_use]
    pub fn new(depth: i32) -> Self {
        Self {
            depth,
            value: 0.0,
            neighbors: Vec::new(),
        }
    }

    #[must_use]
    pub fn depth(&self) -> i32 {
        self.depth
    }

    #[must_use]
    pub fn value(&self) -> f32 {
        self.value
    }

    /// Stores `value` clamped to [0, 1]. Returns whether it changed.
    pub fn push(&mut self, value: f32) -> bool {
        let value = value.clamp(0.0, 1.0);
        if self.value == value {
            return false;
        }
        self.value = value;
        true
    }

    /// Vertical pixel offset from the rest position.
    #[must_use]
    pub fn offset(&self) -> i32 {
        (self.value * self.depth as f32) as i32
    }

    /// Controls to force-redraw after this trigger draws.
    #[must_use]
    pub fn neighbors(&self) -> &[ControlId] {
        &self.neighbors
    }

    /// Recomputes the neighbor set.
    ///
    /// `domains` lists every control on the pad with its domain rectangle;
    /// `this` is the trigger's own id, which is never its own neighbor.
    pub fn update_neighbors<I>(&mut self, this: ControlId, own_domain: Rect, domains: I)
    where
        I: IntoIterator<Item = (ControlId, Rect)>,
    {
        self.neighbors = domains
            .into_iter()
            .filter(|&(id, domain)| id != this && own_domain.intersects(&domain))
            .map(|(id, _)| id)
            .collect();
    }
}
