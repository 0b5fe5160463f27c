//! # Gamepad Device Module
//!
//! Finds a gamepad through the Linux evdev interface and turns its events
//! into [`RawEvent`]s.
//!
//! ## Device Selection
//!
//! Gamepads are the `/dev/input/event*` devices reporting an `ABS_X` axis and
//! either `BTN_SOUTH` (gamepad) or `BTN_TRIGGER` (joystick). They are
//! numbered in path order, and the CLI device index picks one of them.
//!
//! ## Index Layout
//!
//! Mapping tables refer to controls by index rather than by evdev code:
//!
//! - Buttons: supported key codes from `0x100` upward, in ascending order
//! - Axes: supported absolute axes except the hat axes, in ascending order
//! - Hats: each `ABS_HATnX`/`ABS_HATnY` pair present, in ascending order
//!
//! Axis values are rescaled from the axis' reported range to [-1, 1]. Hat Y
//! is inverted so that pushing up reads as `y = 1`.

use std::path::Path;

use evdev::{AbsoluteAxisType, Device, InputEvent, InputEventKind, Key};
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::event::RawEvent;
use crate::error::{PadError, Result};

/// Lowest key code treated as a gamepad button (`BTN_MISC`).
const FIRST_BUTTON_CODE: u16 = 0x100;

/// `ABS_HAT0X`
const FIRST_HAT_CODE: u16 = 0x10;

/// `ABS_HAT3Y`
const LAST_HAT_CODE: u16 = 0x17;

fn is_hat_code(code: u16) -> bool {
    (FIRST_HAT_CODE..=LAST_HAT_CODE).contains(&code)
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct AxisRange {
    code: u16,
    min: i32,
    max: i32,
}

impl AxisRange {
    fn normalize(&self, value: i32) -> f32 {
        if self.max <= self.min {
            return 0.0;
        }
        let span = (self.max - self.min) as f32;
        (2.0 * (value - self.min) as f32 / span - 1.0).clamp(-1.0, 1.0)
    }
}

/// Index layout of one device plus the last seen hat positions.
#[derive(Debug, Clone, Default)]
pub struct DeviceLayout {
    buttons: Vec<u16>,
    axes: Vec<AxisRange>,
    /// Hat numbers (0..=3) present on the device.
    hats: Vec<u16>,
    hat_values: Vec<(i32, i32)>,
}

impl DeviceLayout {
    /// Builds a layout from the supported key codes and the supported
    /// absolute axes with their `(code, minimum, maximum)`.
    pub fn new<K, A>(keys: K, axes: A) -> Self
    where
        K: IntoIterator<Item = u16>,
        A: IntoIterator<Item = (u16, i32, i32)>,
    {
        let mut buttons: Vec<u16> = keys
            .into_iter()
            .filter(|&code| code >= FIRST_BUTTON_CODE)
            .collect();
        buttons.sort_unstable();
        buttons.dedup();

        let mut ranges = Vec::new();
        let mut hats = Vec::new();
        for (code, min, max) in axes {
            if is_hat_code(code) {
                hats.push((code - FIRST_HAT_CODE) / 2);
            } else {
                ranges.push(AxisRange { code, min, max });
            }
        }
        ranges.sort_unstable_by_key(|axis| axis.code);
        ranges.dedup_by_key(|axis| axis.code);
        hats.sort_unstable();
        hats.dedup();

        let hat_values = vec![(0, 0); hats.len()];
        Self {
            buttons,
            axes: ranges,
            hats,
            hat_values,
        }
    }

    /// Reads the layout of an opened evdev device.
    ///
    /// # Errors
    ///
    /// Returns error if the axis ranges cannot be queried.
    pub fn from_device(device: &Device) -> Result<Self> {
        let keys: Vec<u16> = device
            .supported_keys()
            .map(|keys| keys.iter().map(|key| key.code()).collect())
            .unwrap_or_default();

        let axes: Vec<(u16, i32, i32)> = match device.supported_absolute_axes() {
            Some(supported) => {
                let state = device.get_abs_state().map_err(|e| {
                    PadError::Controller(format!("Failed to read axis ranges: {}", e))
                })?;
                supported
                    .iter()
                    .map(|axis| {
                        let info = state[axis.0 as usize];
                        (axis.0, info.minimum, info.maximum)
                    })
                    .collect()
            }
            None => Vec::new(),
        };

        Ok(Self::new(keys, axes))
    }

    #[must_use]
    pub fn button_count(&self) -> usize {
        self.buttons.len()
    }

    #[must_use]
    pub fn axis_count(&self) -> usize {
        self.axes.len()
    }

    #[must_use]
    pub fn hat_count(&self) -> usize {
        self.hats.len()
    }

    /// Translates one evdev event.
    ///
    /// Returns `None` for sync events, key auto-repeat, and codes outside
    /// the layout.
    pub fn translate(&mut self, event: &InputEvent) -> Option<RawEvent> {
        match event.kind() {
            InputEventKind::Key(key) => {
                let index = self.buttons.iter().position(|&code| code == key.code())?;
                let pressed = match event.value() {
                    0 => false,
                    1 => true,
                    _ => return None,
                };
                Some(RawEvent::Button {
                    button: index as u32,
                    pressed,
                })
            }
            InputEventKind::AbsAxis(axis) if is_hat_code(axis.0) => {
                let offset = axis.0 - FIRST_HAT_CODE;
                let index = self.hats.iter().position(|&hat| hat == offset / 2)?;
                let (x, y) = &mut self.hat_values[index];
                if offset % 2 == 0 {
                    *x = event.value().signum();
                } else {
                    *y = -event.value().signum();
                }
                Some(RawEvent::Hat {
                    hat: index as u32,
                    x: *x,
                    y: *y,
                })
            }
            InputEventKind::AbsAxis(axis) => {
                let index = self.axes.iter().position(|range| range.code == axis.0)?;
                Some(RawEvent::Axis {
                    axis: index as u32,
                    value: self.axes[index].normalize(event.value()),
                })
            }
            _ => None,
        }
    }
}

/// An opened gamepad.
pub struct Gamepad {
    device: Device,
    device_path: String,
    name: String,
    layout: DeviceLayout,
}

impl std::fmt::Debug for Gamepad {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gamepad")
            .field("device_path", &self.device_path)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl Gamepad {
    /// Opens the `index`-th gamepad found under `/dev/input`.
    ///
    /// # Errors
    ///
    /// - `ControllerNotFound`: fewer than `index + 1` gamepads are present
    /// - `Controller`: `/dev/input` is missing or unreadable
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use padview::input::device::Gamepad;
    ///
    /// let pad = Gamepad::open(0)?;
    /// println!("{} at {}", pad.name(), pad.device_path());
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn open(index: usize) -> Result<Self> {
        let input_dir = Path::new("/dev/input");

        if !input_dir.exists() {
            return Err(PadError::Controller(
                "/dev/input directory not found".to_string(),
            ));
        }

        let mut entries: Vec<_> = std::fs::read_dir(input_dir)
            .map_err(|e| PadError::Controller(format!("Failed to read /dev/input: {}", e)))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| PadError::Controller(format!("Failed to read directory entry: {}", e)))?;

        // Sort entries so device indices are stable between runs
        entries.sort_by_key(|entry| entry.path());

        let mut found = 0;
        for entry in entries {
            let path = entry.path();

            let is_event_node = path
                .file_name()
                .is_some_and(|name| name.to_string_lossy().starts_with("event"));
            if !is_event_node {
                continue;
            }

            let device = match Device::open(&path) {
                Ok(device) => device,
                Err(e) => {
                    debug!("Could not open {}: {}", path.display(), e);
                    continue;
                }
            };

            if !Self::is_gamepad(&device) {
                continue;
            }

            if found < index {
                found += 1;
                continue;
            }

            let device_path = path.to_string_lossy().to_string();
            let name = device.name().unwrap_or("Unknown Gamepad").to_string();
            let layout = DeviceLayout::from_device(&device)?;
            info!(
                "Found gamepad '{}' at {} ({} buttons, {} axes, {} hats)",
                name,
                device_path,
                layout.button_count(),
                layout.axis_count(),
                layout.hat_count()
            );
            return Ok(Self {
                device,
                device_path,
                name,
                layout,
            });
        }

        Err(PadError::ControllerNotFound(index))
    }

    fn is_gamepad(device: &Device) -> bool {
        let has_stick = device
            .supported_absolute_axes()
            .is_some_and(|axes| axes.contains(AbsoluteAxisType::ABS_X));
        let has_buttons = device.supported_keys().is_some_and(|keys| {
            keys.contains(Key::BTN_SOUTH) || keys.contains(Key::BTN_TRIGGER)
        });
        has_stick && has_buttons
    }

    /// Device name as reported by the kernel; mapping tables are keyed by it.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn device_path(&self) -> &str {
        &self.device_path
    }

    /// Starts a task that forwards translated events into `events`.
    ///
    /// The task ends when the device read fails (e.g. unplugged) or the
    /// receiver is dropped. Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns `Controller` error if the device cannot be switched to async
    /// reading.
    pub fn spawn_reader(self, events: UnboundedSender<RawEvent>) -> Result<JoinHandle<()>> {
        let Gamepad {
            device,
            device_path,
            mut layout,
            ..
        } = self;

        let mut stream = device
            .into_event_stream()
            .map_err(|e| PadError::Controller(format!("Failed to stream {}: {}", device_path, e)))?;

        Ok(tokio::spawn(async move {
            loop {
                match stream.next_event().await {
                    Ok(event) => {
                        let Some(raw) = layout.translate(&event) else {
                            continue;
                        };
                        if events.send(raw).is_err() {
                            debug!("Event receiver dropped, stopping reader");
                            break;
                        }
                    }
                    Err(e) => {
                        warn!("Gamepad read failed on {}: {}", device_path, e);
                        break;
                    }
                }
            }
            info!("Gamepad reader for {} stopped", device_path);
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use evdev::EventType;

    const ABS_X: u16 = 0x00;
    const ABS_Y: u16 = 0x01;
    const ABS_RZ: u16 = 0x05;
    const ABS_HAT0X: u16 = 0x10;
    const ABS_HAT0Y: u16 = 0x11;

    /// Helper to create a key event for testing.
    fn key_event(key: Key, value: i32) -> InputEvent {
        InputEvent::new(EventType::KEY, key.code(), value)
    }

    /// Helper to create an axis event for testing.
    fn abs_event(code: u16, value: i32) -> InputEvent {
        InputEvent::new(EventType::ABSOLUTE, code, value)
    }

    fn layout() -> DeviceLayout {
        DeviceLayout::new(
            [
                Key::BTN_EAST.code(),
                Key::KEY_A.code(),
                Key::BTN_SOUTH.code(),
                Key::BTN_START.code(),
            ],
            [
                (ABS_RZ, 0, 255),
                (ABS_HAT0Y, -1, 1),
                (ABS_X, -32768, 32767),
                (ABS_HAT0X, -1, 1),
                (ABS_Y, 0, 0),
            ],
        )
    }

    // ==================== Layout Tests ====================

    #[test]
    fn test_layout_counts() {
        let layout = layout();
        // KEY_A is below the button range
        assert_eq!(layout.button_count(), 3);
        assert_eq!(layout.axis_count(), 3);
        assert_eq!(layout.hat_count(), 1);
    }

    #[test]
    fn test_buttons_indexed_by_code_order() {
        let mut layout = layout();
        // BTN_SOUTH (0x130) < BTN_EAST (0x131) < BTN_START (0x13b)
        assert_eq!(
            layout.translate(&key_event(Key::BTN_SOUTH, 1)),
            Some(RawEvent::Button { button: 0, pressed: true })
        );
        assert_eq!(
            layout.translate(&key_event(Key::BTN_EAST, 0)),
            Some(RawEvent::Button { button: 1, pressed: false })
        );
        assert_eq!(
            layout.translate(&key_event(Key::BTN_START, 1)),
            Some(RawEvent::Button { button: 2, pressed: true })
        );
    }

    #[test]
    fn test_key_repeat_and_unknown_keys_ignored() {
        let mut layout = layout();
        assert_eq!(layout.translate(&key_event(Key::BTN_SOUTH, 2)), None);
        assert_eq!(layout.translate(&key_event(Key::KEY_A, 1)), None);
        assert_eq!(layout.translate(&key_event(Key::BTN_WEST, 1)), None);
    }

    #[test]
    fn test_axis_normalization() {
        let mut layout = layout();
        assert_eq!(
            layout.translate(&abs_event(ABS_X, -32768)),
            Some(RawEvent::Axis { axis: 0, value: -1.0 })
        );
        assert_eq!(
            layout.translate(&abs_event(ABS_RZ, 255)),
            Some(RawEvent::Axis { axis: 2, value: 1.0 })
        );

        let Some(RawEvent::Axis { axis, value }) = layout.translate(&abs_event(ABS_RZ, 0)) else {
            panic!("expected axis event");
        };
        assert_eq!(axis, 2);
        assert_eq!(value, -1.0);
    }

    #[test]
    fn test_degenerate_axis_range_reads_zero() {
        let mut layout = layout();
        assert_eq!(
            layout.translate(&abs_event(ABS_Y, 5)),
            Some(RawEvent::Axis { axis: 1, value: 0.0 })
        );
    }

    #[test]
    fn test_hat_combines_components() {
        let mut layout = layout();
        assert_eq!(
            layout.translate(&abs_event(ABS_HAT0X, 1)),
            Some(RawEvent::Hat { hat: 0, x: 1, y: 0 })
        );
        // evdev -1 is up, reported as +1
        assert_eq!(
            layout.translate(&abs_event(ABS_HAT0Y, -1)),
            Some(RawEvent::Hat { hat: 0, x: 1, y: 1 })
        );
        assert_eq!(
            layout.translate(&abs_event(ABS_HAT0X, 0)),
            Some(RawEvent::Hat { hat: 0, x: 0, y: 1 })
        );
    }

    #[test]
    fn test_missing_hat_ignored() {
        let mut layout = layout();
        // ABS_HAT1X is not part of the layout
        assert_eq!(layout.translate(&abs_event(0x12, 1)), None);
    }

    #[test]
    fn test_sync_events_ignored() {
        let mut layout = layout();
        let sync = InputEvent::new(EventType::SYNCHRONIZATION, 0, 0);
        assert_eq!(layout.translate(&sync), None);
    }

    // Integration test - only runs with real hardware
    #[test]
    #[ignore]
    fn test_open_with_real_hardware() {
        let gamepad = Gamepad::open(0).expect("No gamepad connected");
        assert!(gamepad.device_path().starts_with("/dev/input/event"));
        assert!(!gamepad.name().is_empty());
    }
}
