//! # Mapping Table
//!
//! Per-device tables that say which pad control each button, axis and hat
//! of a physical device drives. One table file lives next to each skin,
//! keyed by the device name the kernel reports:
//!
//! ```json
//! {
//!   "Microsoft X-Box 360 pad": {
//!     "button": { "0": { "type": "button", "name": "a" } },
//!     "axis": {
//!       "0": {
//!         "-2": { "type": "stick", "name": "left", "direction": "left" },
//!         "2": { "type": "stick", "name": "left", "direction": "right" }
//!       },
//!       "2": { "1": { "type": "trigger", "name": "l" } }
//!     },
//!     "hat": {
//!       "0": { "up": { "type": "button", "name": "dpad-up" } }
//!     }
//!   }
//! }
//! ```
//!
//! Axis entries are keyed by a divisor; see
//! [`axis_value`](super::dispatcher::axis_value) for how the raw value is
//! scaled by it.

use std::collections::{BTreeMap, HashMap};
use std::fs;

use serde::Deserialize;

use crate::error::{PadError, Result};
use crate::render::stick::Direction;
use crate::skin::Skin;

/// Mapping table file name inside a skin directory.
pub const MAPPINGS_FILE: &str = "mappings.json";

/// A named control on the pad, as written in a mapping table.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TargetSpec {
    Button { name: String },
    Trigger { name: String },
    Stick { name: String, direction: Direction },
}

impl TargetSpec {
    /// Key used for this target in input state snapshots.
    #[must_use]
    pub fn label(&self) -> String {
        match self {
            TargetSpec::Button { name } | TargetSpec::Trigger { name } => name.clone(),
            TargetSpec::Stick { name, direction } => format!("{name}.{direction}"),
        }
    }
}

/// Targets for the four directions of one hat.
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
pub struct HatMapping {
    pub up: Option<TargetSpec>,
    pub down: Option<TargetSpec>,
    pub left: Option<TargetSpec>,
    pub right: Option<TargetSpec>,
}

/// Mapping for one device model.
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
pub struct DeviceMapping {
    #[serde(default)]
    pub button: BTreeMap<u32, TargetSpec>,

    /// Axis index → divisor → target.
    #[serde(default)]
    pub axis: BTreeMap<u32, BTreeMap<i32, TargetSpec>>,

    #[serde(default)]
    pub hat: BTreeMap<u32, HatMapping>,
}

/// All device mappings of one skin.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(transparent)]
pub struct MappingTable {
    devices: HashMap<String, DeviceMapping>,
}

impl MappingTable {
    /// Loads `mappings.json` from the skin directory.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or is not a valid table.
    pub fn load(skin: &Skin) -> Result<Self> {
        let path = skin.path.join(MAPPINGS_FILE);
        let contents = fs::read_to_string(&path).map_err(|e| {
            PadError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json(&contents)
    }

    pub fn from_json(contents: &str) -> Result<Self> {
        Ok(serde_json::from_str(contents)?)
    }

    /// Mapping for the device called `device`.
    ///
    /// # Errors
    ///
    /// Returns [`PadError::UnmappedDevice`] when the table has no entry for
    /// this device; the message tells the user to map it for `skin`.
    pub fn device(&self, device: &str, skin: &str) -> Result<&DeviceMapping> {
        self.devices
            .get(device)
            .ok_or_else(|| PadError::UnmappedDevice {
                device: device.to_string(),
                skin: skin.to_string(),
            })
    }

    /// Names of every mapped device.
    pub fn device_names(&self) -> impl Iterator<Item = &str> {
        self.devices.keys().map(String::as_str)
    }
}
