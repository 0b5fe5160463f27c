//! Comparable snapshot of every value pushed so far.

use std::collections::BTreeMap;

/// Last pushed value per target label.
///
/// Two states are equal when both maps hold the same values, which is how
/// the frame loop detects a frame in which nothing changed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputState {
    /// Buttons and hat directions.
    pub buttons: BTreeMap<String, f32>,
    /// Axis-driven targets.
    pub axes: BTreeMap<String, f32>,
}

impl InputState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a button or hat push, clamped to [0, 1].
    pub fn record_button(&mut self, label: &str, value: f32) {
        record(&mut self.buttons, label, value);
    }

    /// Records an axis push, clamped to [0, 1].
    pub fn record_axis(&mut self, label: &str, value: f32) {
        record(&mut self.axes, label, value);
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buttons.is_empty() && self.axes.is_empty()
    }
}

fn record(map: &mut BTreeMap<String, f32>, label: &str, value: f32) {
    map.insert(label.to_string(), value.clamp(0.0, 1.0));
}
