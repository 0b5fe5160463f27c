//! # Control Visuals
//!
//! One renderable widget per physical control on the pad.
//!
//! Every control shares the same core, [`ControlVisual`], which owns the
//! images, the screen geometry and the dirty flag. What differs between a
//! button, a stick and a trigger is kept in [`ControlKind`]: sticks carry
//! their four direction values, triggers their travel value and the set of
//! neighbors they overlap.
//!
//! ## Dirty tracking
//!
//! A push only marks the control dirty when it changes what would be drawn.
//! A draw without `force` on a clean control does nothing, so the per-frame
//! draw pass can safely visit every control.
//!
//! ## Draw order inside one control
//!
//! 1. Background snapshot over the domain rectangle (restores the backdrop
//!    the control may have moved away from)
//! 2. Active image at the current position, clipped to the configured size
//! 3. Foreground snapshot over the domain rectangle (parts of the pad body
//!    that sit in front of a trigger)

use image::RgbaImage;
use tracing::trace;

use super::geometry::{Point, Rect};
use super::stick::{Direction, StickVisual};
use super::surface::{crop, Image, Surface};
use super::trigger::TriggerVisual;
use crate::error::{PadError, Result};

/// Push values above this threshold select the pushed image.
pub const PRESS_THRESHOLD: f32 = 0.5;

/// Index of a control inside its [`PadComposite`](super::pad::PadComposite).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ControlId(pub usize);

/// Images for the two states of a control.
///
/// At least one must be present. A missing image is cut out of the skin
/// background under the control's rest rectangle.
#[derive(Debug, Clone, Default)]
pub struct ControlImages {
    pub pushed: Option<Image>,
    pub released: Option<Image>,
}

/// Construction parameters that differ between control kinds.
#[derive(Debug, Clone, Copy, Default)]
pub struct VisualOptions {
    /// Extra pixels on every side of the rest rectangle the control may
    /// cover while moving.
    pub margin: i32,
    /// Size the rest rectangle from the active image instead of the
    /// configured size.
    pub auto_rect: bool,
    /// Snapshot the surface under the domain rectangle.
    pub copy_background: bool,
    /// Snapshot the skin background under the domain rectangle and stamp it
    /// over the control after every draw.
    pub copy_foreground: bool,
}

/// Shared state of every control: geometry, images and the dirty flag.
#[derive(Debug, Clone)]
pub struct ControlVisual {
    name: String,
    /// Source clip applied to the active image.
    area: Rect,
    rest: Rect,
    position: Point,
    domain: Rect,
    pushed: Image,
    released: Image,
    pressed: bool,
    background: Option<RgbaImage>,
    foreground: Option<RgbaImage>,
    dirty: bool,
}

impl ControlVisual {
    /// Builds a control centered on `center`.
    ///
    /// # Arguments
    ///
    /// * `surface` - Display surface; used for bounds and background snapshots
    /// * `skin_background` - Skin backdrop image, source of fallback images and
    ///   foreground snapshots
    /// * `size` - Configured `[width, height]`
    ///
    /// # Errors
    ///
    /// Returns [`PadError::MissingImage`] when `images` holds neither a pushed
    /// nor a released image.
    pub fn new(
        name: impl Into<String>,
        surface: &dyn Surface,
        skin_background: Option<&RgbaImage>,
        center: Point,
        size: [i32; 2],
        images: ControlImages,
        options: VisualOptions,
    ) -> Result<Self> {
        let name = name.into();
        let active = images
            .released
            .clone()
            .or_else(|| images.pushed.clone())
            .ok_or_else(|| PadError::MissingImage(name.clone()))?;

        let [width, height] = size;
        let rest = if options.auto_rect {
            Rect::centered_at(center, active.width() as i32, active.height() as i32)
        } else {
            Rect::centered_at(center, width, height)
        };
        let domain = rest
            .inflate(options.margin * 2, options.margin * 2)
            .clip(&surface.bounds());

        let mut background = None;
        let mut foreground = None;
        let (pushed, released) = match skin_background {
            Some(skin) => {
                if options.copy_foreground {
                    foreground = Some(crop(skin, domain));
                }
                if options.copy_background {
                    background = Some(surface.snapshot(domain));
                }
                let cut = || Image::new(crop(skin, rest));
                (
                    images.pushed.unwrap_or_else(cut),
                    images.released.unwrap_or_else(cut),
                )
            }
            None => (
                images.pushed.unwrap_or_else(|| active.clone()),
                images.released.unwrap_or(active),
            ),
        };

        Ok(Self {
            name,
            area: Rect::from_size(width, height),
            rest,
            position: rest.top_left(),
            domain,
            pushed,
            released,
            pressed: false,
            background,
            foreground,
            dirty: true,
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Bounding rectangle at rest.
    #[must_use]
    pub fn rest(&self) -> Rect {
        self.rest
    }

    /// Largest area the control can ever cover, clipped to the display.
    #[must_use]
    pub fn domain(&self) -> Rect {
        self.domain
    }

    /// Current top-left draw point.
    #[must_use]
    pub fn position(&self) -> Point {
        self.position
    }

    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    #[must_use]
    pub fn is_pressed(&self) -> bool {
        self.pressed
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn set_position(&mut self, position: Point) {
        self.position = position;
    }

    /// Selects the pushed image for values above 0.5, the released image
    /// otherwise. Re-selecting the active image leaves the control clean.
    ///
    /// Returns whether the active image changed.
    pub fn push(&mut self, value: f32) -> bool {
        let pressed = value > PRESS_THRESHOLD;
        if pressed == self.pressed {
            return false;
        }
        self.pressed = pressed;
        self.dirty = true;
        true
    }

    /// Draws at the current position when dirty or forced.
    ///
    /// Returns whether anything was blitted.
    pub fn draw(&mut self, surface: &mut dyn Surface, force: bool) -> bool {
        if !(self.dirty || force) {
            return false;
        }

        if let Some(background) = &self.background {
            surface.blit(background, self.domain.top_left(), None);
        }
        let image = if self.pressed {
            &self.pushed
        } else {
            &self.released
        };
        surface.blit(image, self.position, Some(self.area));
        if let Some(foreground) = &self.foreground {
            surface.blit(foreground, self.domain.top_left(), None);
        }

        trace!(control = %self.name, x = self.position.x, y = self.position.y, "drew control");
        self.dirty = false;
        true
    }
}

/// Kind-specific state of a control.
#[derive(Debug, Clone)]
pub enum ControlKind {
    Button,
    Stick(StickVisual),
    Trigger(TriggerVisual),
}

/// A control on the pad: the shared visual core plus its kind.
#[derive(Debug, Clone)]
pub struct Control {
    visual: ControlVisual,
    kind: ControlKind,
}

impl Control {
    #[must_use]
    pub fn new(visual: ControlVisual, kind: ControlKind) -> Self {
        Self { visual, kind }
    }

    #[must_use]
    pub fn visual(&self) -> &ControlVisual {
        &self.visual
    }

    #[must_use]
    pub fn kind(&self) -> &ControlKind {
        &self.kind
    }

    pub(crate) fn kind_mut(&mut self) -> &mut ControlKind {
        &mut self.kind
    }

    #[must_use]
    pub fn name(&self) -> &str {
        self.visual.name()
    }

    /// Button press or stick click.
    pub fn push(&mut self, value: f32) -> bool {
        match &mut self.kind {
            ControlKind::Trigger(trigger) => {
                let changed = trigger.push(value);
                if changed {
                    self.visual.mark_dirty();
                }
                changed
            }
            ControlKind::Button | ControlKind::Stick(_) => self.visual.push(value),
        }
    }

    /// Pushes one direction of a stick. Non-stick controls ignore it.
    pub fn push_direction(&mut self, direction: Direction, value: f32) -> bool {
        if direction == Direction::Click {
            return self.visual.push(value);
        }
        let ControlKind::Stick(stick) = &mut self.kind else {
            return false;
        };
        let changed = stick.push(direction, value);
        if changed {
            self.visual.mark_dirty();
        }
        changed
    }

    /// Returns the control to its rest value.
    ///
    /// Buttons and stick clicks are released, stick directions and trigger
    /// travel go to zero.
    pub fn reset(&mut self) {
        let changed = match &mut self.kind {
            ControlKind::Button => self.visual.push(0.0),
            ControlKind::Stick(stick) => {
                let moved = stick.reset();
                let released = self.visual.push(0.0);
                moved || released
            }
            ControlKind::Trigger(trigger) => trigger.push(0.0),
        };
        if changed {
            self.visual.mark_dirty();
        }
    }

    /// Recomputes the draw position from the kind's value and draws when
    /// dirty or forced.
    ///
    /// Neighbor cascades for triggers are driven by the pad composite.
    pub fn draw(&mut self, surface: &mut dyn Surface, force: bool) -> bool {
        if !(self.visual.is_dirty() || force) {
            return false;
        }

        let rest = self.visual.rest().top_left();
        let position = match &self.kind {
            ControlKind::Button => self.visual.position(),
            ControlKind::Stick(stick) => {
                let (dx, dy) = stick.offset();
                rest.offset(dx, dy)
            }
            ControlKind::Trigger(trigger) => rest.offset(0, trigger.offset()),
        };
        self.visual.set_position(position);
        self.visual.draw(surface, true)
    }
}
