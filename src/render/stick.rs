//! # Stick Visual
//!
//! Combines four one-sided direction values into a single displacement that
//! never leaves a circle of `radius` pixels around the rest position.
//!
//! Each direction is an independent push target in [0, 1], which lets one
//! physical axis drive two directions (see the axis divisors in
//! [`crate::input::mapping`]) and lets digital inputs such as a d-pad drive a
//! stick as well.
//!
//! ```
//! use padview::render::stick::{Direction, StickVisual};
//!
//! let mut stick = StickVisual::new(40);
//! stick.push(Direction::Right, 1.0);
//! stick.push(Direction::Up, 1.0);
//!
//! // Diagonal is rescaled to the unit circle
//! let (dx, dy) = stick.offset();
//! assert_eq!((dx, dy), (28, -28));
//! ```

use std::fmt;

use serde::Deserialize;

/// A push target on a stick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
    /// Stick press, handled like a button on the stick's own visual.
    Click,
}

impl Direction {
    /// The four displacement directions.
    pub const AXES: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    /// Parses the lowercase name used in mappings and state labels.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "up" => Some(Direction::Up),
            "down" => Some(Direction::Down),
            "left" => Some(Direction::Left),
            "right" => Some(Direction::Right),
            "click" => Some(Direction::Click),
            _ => None,
        }
    }

    fn slot(self) -> Option<usize> {
        match self {
            Direction::Up => Some(0),
            Direction::Down => Some(1),
            Direction::Left => Some(2),
            Direction::Right => Some(3),
            Direction::Click => None,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Direction::Up => "up",
            Direction::Down => "down",
            Direction::Left => "left",
            Direction::Right => "right",
            Direction::Click => "click",
        };
        f.write_str(name)
    }
}

/// Direction values and travel radius of an analog stick.
#[derive(Debug, Clone, PartialEq)]
pub struct StickVisual {
    radius: i32,
    /// up, down, left, right
    values: [f32; 4],
}

impl StickVisual {
    #[must_use]
    pub fn new(radius: i32) -> Self {
        Self {
            radius,
            values: [0.0; 4],
        }
    }

    #[must_use]
    pub fn radius(&self) -> i32 {
        self.radius
    }

    /// Current value of one direction. `Click` always reads 0.
    #[must_use]
    pub fn value(&self, direction: Direction) -> f32 {
        direction.slot().map_or(0.0, |slot| self.values[slot])
    }

    /// Stores `value` clamped to [0, 1].
    ///
    /// Returns whether the stored value changed. `Click` is not a
    /// displacement direction and is ignored here.
    pub fn push(&mut self, direction: Direction, value: f32) -> bool {
        let Some(slot) = direction.slot() else {
            return false;
        };
        let value = value.clamp(0.0, 1.0);
        if self.values[slot] == value {
            return false;
        }
        self.values[slot] = value;
        true
    }

    /// Zeroes all four directions. Returns whether anything changed.
    pub fn reset(&mut self) -> bool {
        Direction::AXES
            .iter()
            .fold(false, |changed, &direction| self.push(direction, 0.0) | changed)
    }

    /// Unit-clamped displacement vector `(right - left, down - up)`.
    #[must_use]
    pub fn displacement(&self) -> (f32, f32) {
        let x = self.value(Direction::Right) - self.value(Direction::Left);
        let y = self.value(Direction::Down) - self.value(Direction::Up);
        let dist = (x * x + y * y).sqrt();
        if dist > 1.0 {
            (x / dist, y / dist)
        } else {
            (x, y)
        }
    }

    /// Pixel offset from the rest position, truncated toward zero.
    #[must_use]
    pub fn offset(&self) -> (i32, i32) {
        let (x, y) = self.displacement();
        let radius = self.radius as f32;
        ((x * radius) as i32, (y * radius) as i32)
    }
}
