//! # Skin Module
//!
//! Loads a skin: a directory holding a `skin.toml` layout descriptor, one PNG
//! per control and the backdrop image.
//!
//! ## Layout
//!
//! ```text
//! skins/
//! └── gamecube/
//!     ├── skin.toml        # layout descriptor
//!     ├── mappings.json    # per-device input mappings
//!     ├── background.png
//!     ├── a.png            # pushed image of button "a"
//!     ├── stick.png        # image of stick "stick"
//!     ├── stick-click.png  # only when the stick is clickable
//!     └── l.png            # trigger "l"
//! ```
//!
//! ## Descriptor
//!
//! ```toml
//! background = "background"
//! background_color = [0, 0, 0]
//! anti_aliasing = true
//! size = [640, 400]
//!
//! [[buttons]]
//! name = "a"
//! position = [480, 200]
//! size = [48, 48]
//!
//! [[sticks]]
//! name = "stick"
//! position = [160, 200]
//! size = [64, 64]
//! radius = 24
//! clickable = false
//!
//! [[triggers]]
//! name = "l"
//! position = [120, 40]
//! size = [90, 40]
//! depth = 16
//! ```
//!
//! Positions are the centers of the controls. Declaration order is kept and
//! drives the draw order within each kind.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;
use tracing::debug;

use crate::error::{PadError, Result};
use crate::render::geometry::Point;
use crate::render::surface::Image;

/// Descriptor file name inside a skin directory.
pub const SKIN_FILE: &str = "skin.toml";

/// Suffix appended to a stick's name for its click image.
pub const CLICK_SUFFIX: &str = "-click";

/// Button layout entry.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ButtonConfig {
    pub name: String,
    pub position: Point,
    pub size: [i32; 2],
}

/// Analog stick layout entry.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct StickConfig {
    pub name: String,
    pub position: Point,
    pub size: [i32; 2],
    pub radius: i32,
    #[serde(default)]
    pub clickable: bool,
}

/// Analog trigger layout entry.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct TriggerConfig {
    pub name: String,
    pub position: Point,
    pub size: [i32; 2],
    pub depth: i32,
}

/// A loaded skin descriptor.
#[derive(Debug, Deserialize, Clone)]
pub struct Skin {
    /// Skin name (directory name).
    #[serde(skip)]
    pub name: String,

    /// Skin directory.
    #[serde(skip)]
    pub path: PathBuf,

    /// Backdrop image name, without extension.
    pub background: String,

    #[serde(default = "default_background_color")]
    pub background_color: [u8; 3],

    #[serde(default = "default_anti_aliasing")]
    pub anti_aliasing: bool,

    /// Display size in pixels.
    pub size: [u32; 2],

    #[serde(default)]
    pub buttons: Vec<ButtonConfig>,

    #[serde(default)]
    pub sticks: Vec<StickConfig>,

    #[serde(default)]
    pub triggers: Vec<TriggerConfig>,
}

fn default_background_color() -> [u8; 3] { [0, 0, 0] }
fn default_anti_aliasing() -> bool { true }

impl Skin {
    /// Loads `<skins_dir>/<name>/skin.toml`.
    ///
    /// # Errors
    ///
    /// Returns error if the descriptor cannot be read, parsed or fails
    /// validation.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use padview::skin::Skin;
    ///
    /// let skin = Skin::load("skins", "gamecube")?;
    /// println!("{} buttons", skin.buttons.len());
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(skins_dir: P, name: &str) -> Result<Self> {
        let path = skins_dir.as_ref().join(name);
        let contents = fs::read_to_string(path.join(SKIN_FILE)).map_err(|e| {
            PadError::Config(format!(
                "cannot read skin '{}' from {}: {}",
                name,
                path.display(),
                e
            ))
        })?;
        let mut skin = Self::from_toml(&contents)?;
        skin.name = name.to_string();
        skin.path = path;
        debug!(
            skin = %skin.name,
            buttons = skin.buttons.len(),
            sticks = skin.sticks.len(),
            triggers = skin.triggers.len(),
            "loaded skin descriptor"
        );
        Ok(skin)
    }

    /// Parses and validates a descriptor without touching the filesystem.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let skin: Skin = toml::from_str(contents)?;
        skin.validate()?;
        Ok(skin)
    }

    /// Path of the PNG image called `name`.
    #[must_use]
    pub fn image_path(&self, name: &str) -> PathBuf {
        self.path.join(format!("{name}.png"))
    }

    /// Loads and decodes the PNG image called `name`.
    ///
    /// # Errors
    ///
    /// Returns [`PadError::Image`] if the file is missing or not decodable.
    pub fn load_image(&self, name: &str) -> Result<Image> {
        let path = self.image_path(name);
        let image = image::open(&path).map_err(|source| PadError::Image {
            path: path.clone(),
            source,
        })?;
        debug!("loaded image {}", path.display());
        Ok(Arc::new(image.to_rgba8()))
    }

    fn validate(&self) -> Result<()> {
        if self.background.is_empty() {
            return Err(PadError::Config("background image name cannot be empty".to_string()));
        }

        if self.size[0] == 0 || self.size[1] == 0 {
            return Err(PadError::Config("skin size must be non-zero".to_string()));
        }

        let sizes = self
            .buttons
            .iter()
            .map(|b| (&b.name, b.size))
            .chain(self.sticks.iter().map(|s| (&s.name, s.size)))
            .chain(self.triggers.iter().map(|t| (&t.name, t.size)));
        for (name, [w, h]) in sizes {
            if w < 0 || h < 0 {
                return Err(PadError::Config(format!("control '{name}' has a negative size")));
            }
        }

        for stick in &self.sticks {
            if stick.radius < 0 {
                return Err(PadError::Config(format!(
                    "stick '{}' radius must not be negative",
                    stick.name
                )));
            }
        }

        for trigger in &self.triggers {
            if trigger.depth < 0 {
                return Err(PadError::Config(format!(
                    "trigger '{}' depth must not be negative",
                    trigger.name
                )));
            }
        }

        check_unique("button", self.buttons.iter().map(|b| b.name.as_str()))?;
        check_unique("stick", self.sticks.iter().map(|s| s.name.as_str()))?;
        check_unique("trigger", self.triggers.iter().map(|t| t.name.as_str()))?;

        Ok(())
    }
}

fn check_unique<'a>(kind: &str, names: impl Iterator<Item = &'a str>) -> Result<()> {
    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(name) {
            return Err(PadError::Config(format!("duplicate {kind} name '{name}'")));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const DESCRIPTOR: &str = r#"
        background = "background"
        background_color = [10, 20, 30]
        anti_aliasing = false
        size = [200, 100]

        [[buttons]]
        name = "b"
        position = [150, 50]
        size = [20, 20]

        [[buttons]]
        name = "a"
        position = [170, 50]
        size = [20, 20]

        [[sticks]]
        name = "main"
        position = [50, 50]
        size = [30, 30]
        radius = 10

        [[triggers]]
        name = "l"
        position = [40, 10]
        size = [40, 10]
        depth = 6
    "#;

    #[test]
    fn test_parse_descriptor() {
        let skin = Skin::from_toml(DESCRIPTOR).unwrap();
        assert_eq!(skin.background_color, [10, 20, 30]);
        assert!(!skin.anti_aliasing);
        assert_eq!(skin.size, [200, 100]);
        assert_eq!(skin.sticks[0].radius, 10);
        assert!(!skin.sticks[0].clickable);
        assert_eq!(skin.triggers[0].position, Point::new(40, 10));
    }

    #[test]
    fn test_declaration_order_is_kept() {
        let skin = Skin::from_toml(DESCRIPTOR).unwrap();
        let names: Vec<_> = skin.buttons.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, ["b", "a"]);
    }

    #[test]
    fn test_defaults() {
        let skin = Skin::from_toml("background = \"bg\"\nsize = [10, 10]\n").unwrap();
        assert_eq!(skin.background_color, [0, 0, 0]);
        assert!(skin.anti_aliasing);
        assert!(skin.buttons.is_empty());
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let contents = r#"
            background = "bg"
            size = [10, 10]
            [[buttons]]
            name = "a"
            position = [1, 1]
            size = [1, 1]
            [[buttons]]
            name = "a"
            position = [2, 2]
            size = [1, 1]
        "#;
        assert!(Skin::from_toml(contents).is_err());
    }

    #[test]
    fn test_same_name_in_different_kinds_allowed() {
        let contents = r#"
            background = "bg"
            size = [10, 10]
            [[buttons]]
            name = "l"
            position = [1, 1]
            size = [1, 1]
            [[triggers]]
            name = "l"
            position = [2, 2]
            size = [1, 1]
            depth = 2
        "#;
        assert!(Skin::from_toml(contents).is_ok());
    }

    #[test]
    fn test_zero_size_rejected() {
        assert!(Skin::from_toml("background = \"bg\"\nsize = [0, 10]\n").is_err());
    }

    #[test]
    fn test_negative_depth_rejected() {
        let contents = r#"
            background = "bg"
            size = [10, 10]
            [[triggers]]
            name = "r"
            position = [2, 2]
            size = [1, 1]
            depth = -2
        "#;
        assert!(Skin::from_toml(contents).is_err());
    }

    #[test]
    fn test_load_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        let skin_dir = dir.path().join("pad");
        fs::create_dir(&skin_dir).unwrap();
        let mut file = fs::File::create(skin_dir.join(SKIN_FILE)).unwrap();
        file.write_all(DESCRIPTOR.as_bytes()).unwrap();

        let skin = Skin::load(dir.path(), "pad").unwrap();
        assert_eq!(skin.name, "pad");
        assert_eq!(skin.image_path("a"), skin_dir.join("a.png"));
    }

    #[test]
    fn test_load_missing_skin() {
        let dir = tempfile::tempdir().unwrap();
        let result = Skin::load(dir.path(), "nope");
        assert!(matches!(result, Err(PadError::Config(_))));
    }

    #[test]
    fn test_load_image_roundtrip_and_missing() {
        let dir = tempfile::tempdir().unwrap();
        let mut skin = Skin::from_toml("background = \"bg\"\nsize = [4, 4]\n").unwrap();
        skin.path = dir.path().to_path_buf();

        let image = image::RgbaImage::from_pixel(3, 2, image::Rgba([1, 2, 3, 255]));
        image.save(skin.image_path("bg")).unwrap();

        let loaded = skin.load_image("bg").unwrap();
        assert_eq!(loaded.dimensions(), (3, 2));
        assert!(matches!(skin.load_image("missing"), Err(PadError::Image { .. })));
    }
}
