//! # Input Dispatcher
//!
//! Applies raw device events to the pad.
//!
//! A [`Dispatcher`] is built once per session from a device's
//! [`DeviceMapping`]: every target named in the table is looked up on the
//! [`PadComposite`] up front, so dispatching an event is a table lookup plus a
//! push. Event indices missing from the table are ignored.
//!
//! ## Value normalization
//!
//! | Event | Pushed value |
//! |-------|--------------|
//! | Button down / up | 1 / 0 |
//! | Axis | [`axis_value`] per divisor entry |
//! | Hat | up ← y, down ← −y, left ← −x, right ← x |
//!
//! Negative hat values are left for the target to clamp.

use std::collections::HashMap;

use tracing::trace;

use super::event::RawEvent;
use super::mapping::{DeviceMapping, HatMapping, TargetSpec};
use super::state::InputState;
use crate::error::{PadError, Result};
use crate::render::pad::{PadComposite, Target};

/// Scales a raw axis value by a mapping divisor.
///
/// A divisor of ±2 first shifts the raw value by the divisor's sign, which
/// maps one half of a bidirectional axis onto [0, 1]. The result is divided
/// by the divisor and negative results become 0.
///
/// # Examples
///
/// ```
/// use padview::input::dispatcher::axis_value;
///
/// // Full left on a centered axis, read by the "left" half
/// assert_eq!(axis_value(-1.0, -2), 1.0);
/// // The "right" half sees nothing
/// assert_eq!(axis_value(-1.0, 2), 0.0);
/// // Trigger axis used as-is
/// assert_eq!(axis_value(0.25, 1), 0.25);
/// ```
#[must_use]
pub fn axis_value(raw: f32, divisor: i32) -> f32 {
    let mut value = raw;
    if divisor.abs() == 2 {
        value += divisor.signum() as f32;
    }
    value /= divisor as f32;
    value.max(0.0)
}

/// A resolved target and its snapshot label.
#[derive(Debug, Clone, PartialEq)]
struct Binding {
    target: Target,
    label: String,
}

#[derive(Debug, Clone, PartialEq)]
struct AxisBinding {
    divisor: i32,
    binding: Binding,
}

#[derive(Debug, Clone, Default, PartialEq)]
struct HatBindings {
    up: Option<Binding>,
    down: Option<Binding>,
    left: Option<Binding>,
    right: Option<Binding>,
}

/// Routes raw events of one device to the pad.
#[derive(Debug, Clone, Default)]
pub struct Dispatcher {
    buttons: HashMap<u32, Binding>,
    axes: HashMap<u32, Vec<AxisBinding>>,
    hats: HashMap<u32, HatBindings>,
}

impl Dispatcher {
    /// Resolves every entry of `mapping` against `pad`.
    ///
    /// # Errors
    ///
    /// Returns [`PadError::Config`] if an entry names a control the pad does
    /// not have, or uses an axis divisor of 0.
    pub fn new(mapping: &DeviceMapping, pad: &PadComposite) -> Result<Self> {
        let mut dispatcher = Self::default();

        for (&button, spec) in &mapping.button {
            dispatcher.buttons.insert(button, bind(spec, pad)?);
        }

        for (&axis, entries) in &mapping.axis {
            let mut bindings = Vec::with_capacity(entries.len());
            for (&divisor, spec) in entries {
                if divisor == 0 {
                    return Err(PadError::Config(format!(
                        "axis {axis} uses divisor 0 for '{}'",
                        spec.label()
                    )));
                }
                bindings.push(AxisBinding {
                    divisor,
                    binding: bind(spec, pad)?,
                });
            }
            dispatcher.axes.insert(axis, bindings);
        }

        for (&hat, directions) in &mapping.hat {
            dispatcher.hats.insert(hat, bind_hat(directions, pad)?);
        }

        Ok(dispatcher)
    }

    /// Applies one event to the pad and records the pushed values.
    pub fn dispatch(&self, event: &RawEvent, pad: &mut PadComposite, state: &mut InputState) {
        match *event {
            RawEvent::Button { button, pressed } => {
                let Some(binding) = self.buttons.get(&button) else {
                    return;
                };
                let value = if pressed { 1.0 } else { 0.0 };
                state.record_button(&binding.label, value);
                pad.push(binding.target, value);
            }
            RawEvent::Axis { axis, value: raw } => {
                let Some(bindings) = self.axes.get(&axis) else {
                    return;
                };
                for entry in bindings {
                    let value = axis_value(raw, entry.divisor);
                    state.record_axis(&entry.binding.label, value);
                    pad.push(entry.binding.target, value);
                }
            }
            RawEvent::Hat { hat, x, y } => {
                let Some(bindings) = self.hats.get(&hat) else {
                    return;
                };
                let pushes = [
                    (&bindings.up, y),
                    (&bindings.down, -y),
                    (&bindings.left, -x),
                    (&bindings.right, x),
                ];
                for (binding, value) in pushes {
                    if let Some(binding) = binding {
                        let value = value as f32;
                        state.record_button(&binding.label, value);
                        pad.push(binding.target, value);
                    }
                }
            }
        }
        trace!(?event, "dispatched");
    }
}

fn bind(spec: &TargetSpec, pad: &PadComposite) -> Result<Binding> {
    let target = match spec {
        TargetSpec::Button { name } => pad.button(name).map(Target::Button),
        TargetSpec::Trigger { name } => pad.trigger(name).map(Target::Trigger),
        TargetSpec::Stick { name, direction } => {
            pad.stick(name).map(|id| Target::Stick(id, *direction))
        }
    };
    let target = target.ok_or_else(|| {
        PadError::Config(format!("mapping names unknown control '{}'", spec.label()))
    })?;
    Ok(Binding {
        target,
        label: spec.label(),
    })
}

fn bind_hat(directions: &HatMapping, pad: &PadComposite) -> Result<HatBindings> {
    let bind_opt = |spec: &Option<TargetSpec>| spec.as_ref().map(|s| bind(s, pad)).transpose();
    Ok(HatBindings {
        up: bind_opt(&directions.up)?,
        down: bind_opt(&directions.down)?,
        left: bind_opt(&directions.left)?,
        right: bind_opt(&directions.right)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::mapping::MappingTable;
    use crate::render::control::ControlKind;
    use crate::render::stick::Direction;
    use crate::render::surface::{FrameBuffer, Image};
    use crate::skin::Skin;
    use image::{Rgba, RgbaImage};
    use std::sync::Arc;

    const SKIN: &str = r#"
        background = "bg"
        size = [120, 60]

        [[buttons]]
        name = "a"
        position = [100, 30]
        size = [10, 10]

        [[buttons]]
        name = "up"
        position = [80, 10]
        size = [10, 10]

        [[buttons]]
        name = "down"
        position = [80, 50]
        size = [10, 10]

        [[sticks]]
        name = "left"
        position = [30, 30]
        size = [10, 10]
        radius = 10

        [[triggers]]
        name = "l"
        position = [30, 5]
        size = [20, 6]
        depth = 4
    "#;

    const TABLE: &str = r#"{
        "Pad": {
            "button": { "0": { "type": "button", "name": "a" } },
            "axis": {
                "0": {
                    "-2": { "type": "stick", "name": "left", "direction": "left" },
                    "2": { "type": "stick", "name": "left", "direction": "right" }
                },
                "5": { "1": { "type": "trigger", "name": "l" } }
            },
            "hat": {
                "0": {
                    "up": { "type": "button", "name": "up" },
                    "down": { "type": "button", "name": "down" },
                    "right": { "type": "stick", "name": "left", "direction": "right" }
                }
            }
        }
    }"#;

    fn loader(name: &str) -> Result<Image> {
        let size = if name == "bg" { (120, 60) } else { (10, 10) };
        Ok(Arc::new(RgbaImage::from_pixel(size.0, size.1, Rgba([9, 9, 9, 255]))))
    }

    fn setup() -> (Dispatcher, PadComposite) {
        let skin = Skin::from_toml(SKIN).unwrap();
        let mut fb = FrameBuffer::new(120, 60);
        let pad = PadComposite::construct_with(&skin, &mut fb, loader).unwrap();
        let table = MappingTable::from_json(TABLE).unwrap();
        let dispatcher = Dispatcher::new(table.device("Pad", "test").unwrap(), &pad).unwrap();
        (dispatcher, pad)
    }

    fn stick_value(pad: &PadComposite, direction: Direction) -> f32 {
        match pad.control(pad.stick("left").unwrap()).kind() {
            ControlKind::Stick(stick) => stick.value(direction),
            _ => unreachable!(),
        }
    }

    fn trigger_value(pad: &PadComposite) -> f32 {
        match pad.control(pad.trigger("l").unwrap()).kind() {
            ControlKind::Trigger(trigger) => trigger.value(),
            _ => unreachable!(),
        }
    }

    // ==================== axis_value Tests ====================

    #[test]
    fn test_axis_value_negative_half() {
        let value = axis_value(-0.9, -2);
        assert!((value - 0.95).abs() < 1e-6);
    }

    #[test]
    fn test_axis_value_positive_half() {
        assert!((axis_value(0.5, 2) - 0.75).abs() < 1e-6);
        assert_eq!(axis_value(-1.0, 2), 0.0);
    }

    #[test]
    fn test_axis_value_unit_divisors() {
        assert_eq!(axis_value(0.4, 1), 0.4);
        assert_eq!(axis_value(-0.4, -1), 0.4);
        assert_eq!(axis_value(0.4, -1), 0.0);
    }

    #[test]
    fn test_axis_value_other_divisors_literal() {
        // No shift outside |divisor| == 2
        assert!((axis_value(0.9, 3) - 0.3).abs() < 1e-6);
        assert_eq!(axis_value(0.9, -4), 0.0);
    }

    // ==================== Construction Tests ====================

    #[test]
    fn test_unknown_control_rejected() {
        let skin = Skin::from_toml(SKIN).unwrap();
        let mut fb = FrameBuffer::new(120, 60);
        let pad = PadComposite::construct_with(&skin, &mut fb, loader).unwrap();
        let table = MappingTable::from_json(
            r#"{ "Pad": { "button": { "3": { "type": "trigger", "name": "a" } } } }"#,
        )
        .unwrap();

        let result = Dispatcher::new(table.device("Pad", "test").unwrap(), &pad);
        assert!(matches!(result, Err(PadError::Config(_))));
    }

    #[test]
    fn test_zero_divisor_rejected() {
        let skin = Skin::from_toml(SKIN).unwrap();
        let mut fb = FrameBuffer::new(120, 60);
        let pad = PadComposite::construct_with(&skin, &mut fb, loader).unwrap();
        let table = MappingTable::from_json(
            r#"{ "Pad": { "axis": { "1": { "0": { "type": "trigger", "name": "l" } } } } }"#,
        )
        .unwrap();

        assert!(Dispatcher::new(table.device("Pad", "test").unwrap(), &pad).is_err());
    }

    // ==================== Dispatch Tests ====================

    #[test]
    fn test_button_down_up() {
        let (dispatcher, mut pad) = setup();
        let mut state = InputState::new();
        let a = pad.button("a").unwrap();

        dispatcher.dispatch(&RawEvent::Button { button: 0, pressed: true }, &mut pad, &mut state);
        assert!(pad.control(a).visual().is_pressed());
        assert_eq!(state.buttons["a"], 1.0);

        dispatcher.dispatch(&RawEvent::Button { button: 0, pressed: false }, &mut pad, &mut state);
        assert!(!pad.control(a).visual().is_pressed());
        assert_eq!(state.buttons["a"], 0.0);
    }

    #[test]
    fn test_unmapped_indices_ignored() {
        let (dispatcher, mut pad) = setup();
        let mut state = InputState::new();

        dispatcher.dispatch(&RawEvent::Button { button: 7, pressed: true }, &mut pad, &mut state);
        dispatcher.dispatch(&RawEvent::Axis { axis: 3, value: 1.0 }, &mut pad, &mut state);
        dispatcher.dispatch(&RawEvent::Hat { hat: 1, x: 1, y: 1 }, &mut pad, &mut state);

        assert!(state.is_empty());
    }

    #[test]
    fn test_axis_fans_out_to_both_halves() {
        let (dispatcher, mut pad) = setup();
        let mut state = InputState::new();

        dispatcher.dispatch(&RawEvent::Axis { axis: 0, value: -0.9 }, &mut pad, &mut state);

        assert!((stick_value(&pad, Direction::Left) - 0.95).abs() < 1e-6);
        assert_eq!(stick_value(&pad, Direction::Right), 0.0);
        assert!((state.axes["left.left"] - 0.95).abs() < 1e-6);
        assert_eq!(state.axes["left.right"], 0.0);
    }

    #[test]
    fn test_trigger_axis() {
        let (dispatcher, mut pad) = setup();
        let mut state = InputState::new();

        dispatcher.dispatch(&RawEvent::Axis { axis: 5, value: 0.6 }, &mut pad, &mut state);
        assert!((trigger_value(&pad) - 0.6).abs() < 1e-6);

        dispatcher.dispatch(&RawEvent::Axis { axis: 5, value: -0.6 }, &mut pad, &mut state);
        assert_eq!(trigger_value(&pad), 0.0);
    }

    #[test]
    fn test_hat_directions() {
        let (dispatcher, mut pad) = setup();
        let mut state = InputState::new();
        let up = pad.button("up").unwrap();
        let down = pad.button("down").unwrap();

        dispatcher.dispatch(&RawEvent::Hat { hat: 0, x: 1, y: 1 }, &mut pad, &mut state);
        assert!(pad.control(up).visual().is_pressed());
        assert!(!pad.control(down).visual().is_pressed());
        assert_eq!(stick_value(&pad, Direction::Right), 1.0);
        assert_eq!(state.buttons["up"], 1.0);
        assert_eq!(state.buttons["down"], 0.0);

        dispatcher.dispatch(&RawEvent::Hat { hat: 0, x: 0, y: -1 }, &mut pad, &mut state);
        assert!(!pad.control(up).visual().is_pressed());
        assert!(pad.control(down).visual().is_pressed());
        assert_eq!(stick_value(&pad, Direction::Right), 0.0);
        // Only the three mapped directions are recorded; left is unmapped
        let keys: Vec<&str> = state.buttons.keys().map(String::as_str).collect();
        assert_eq!(keys, ["down", "left.right", "up"]);
        assert!(state.axes.is_empty());
    }
}
