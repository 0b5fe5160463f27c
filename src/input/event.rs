//! Device-independent raw input events.
//!
//! Indices are positions in the device's own button/axis/hat lists, which is
//! what the per-device mapping tables are keyed by.

/// One input change reported by a gamepad.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RawEvent {
    /// Button transition.
    Button { button: u32, pressed: bool },
    /// Continuous axis position, normalized to [-1, 1].
    Axis { axis: u32, value: f32 },
    /// D-pad style hat, each component in {-1, 0, 1}; `y = 1` is up.
    Hat { hat: u32, x: i32, y: i32 },
}
