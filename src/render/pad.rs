//! # Pad Composite
//!
//! Owns every control of one skin and runs the per-frame draw pass.
//!
//! ## Build phases
//!
//! 1. Fill the surface with the skin's background color and stamp the
//!    backdrop image once.
//! 2. Build buttons, sticks and triggers in declaration order. Each control
//!    snapshots the pixels it needs for restoration while the surface still
//!    shows the bare backdrop.
//! 3. Compute every trigger's neighbor set. This needs the domain rectangles
//!    of all controls, so it only runs once everything exists.
//!
//! ## Draw order
//!
//! Buttons, then sticks, then triggers. A trigger that draws stamps the pad
//! body back over its envelope and then force-redraws its neighbors, so the
//! neighbors must already be up to date when triggers run. Neighbors that are
//! triggers pass the redraw on to their own neighbors; every control is
//! redrawn at most once per cascade, which keeps mutually overlapping
//! triggers from redrawing each other forever.

use std::collections::{HashMap, HashSet, VecDeque};

use image::Rgba;
use tracing::{debug, info};

use super::control::{Control, ControlId, ControlImages, ControlKind, ControlVisual, VisualOptions};
use super::geometry::{Point, Rect};
use super::stick::{Direction, StickVisual};
use super::surface::{Image, Surface};
use super::trigger::TriggerVisual;
use crate::error::Result;
use crate::skin::{Skin, CLICK_SUFFIX};

/// A resolved push destination on the pad.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Target {
    Button(ControlId),
    Trigger(ControlId),
    Stick(ControlId, Direction),
}

/// Controls of one kind, by name and in declaration order.
#[derive(Debug, Default, Clone)]
struct ControlGroup {
    order: Vec<ControlId>,
    names: HashMap<String, ControlId>,
}

impl ControlGroup {
    fn insert(&mut self, name: &str, id: ControlId) {
        self.order.push(id);
        self.names.insert(name.to_string(), id);
    }

    fn get(&self, name: &str) -> Option<ControlId> {
        self.names.get(name).copied()
    }
}

/// All control visuals of a skin.
#[derive(Debug, Default, Clone)]
pub struct PadComposite {
    controls: Vec<Control>,
    buttons: ControlGroup,
    sticks: ControlGroup,
    triggers: ControlGroup,
}

impl PadComposite {
    /// Builds the pad for `skin`, loading images from the skin directory.
    ///
    /// # Errors
    ///
    /// Returns error if any image is missing or cannot be decoded.
    pub fn construct(skin: &Skin, surface: &mut dyn Surface) -> Result<Self> {
        Self::construct_with(skin, surface, |name| skin.load_image(name))
    }

    /// Builds the pad for `skin` using `load` to fetch images by name.
    ///
    /// # Errors
    ///
    /// Propagates any error returned by `load`, and fails when a control ends
    /// up without an image.
    pub fn construct_with<F>(skin: &Skin, surface: &mut dyn Surface, mut load: F) -> Result<Self>
    where
        F: FnMut(&str) -> Result<Image>,
    {
        let [r, g, b] = skin.background_color;
        surface.fill(Rgba([r, g, b, 255]));
        let backdrop = load(&skin.background)?;
        surface.blit(&backdrop, Point::new(0, 0), None);

        let mut pad = Self::default();

        for config in &skin.buttons {
            let visual = ControlVisual::new(
                &config.name,
                &*surface,
                Some(&*backdrop),
                config.position,
                config.size,
                ControlImages {
                    pushed: Some(load(&config.name)?),
                    released: None,
                },
                VisualOptions {
                    auto_rect: true,
                    ..Default::default()
                },
            )?;
            let id = pad.add(Control::new(visual, ControlKind::Button));
            pad.buttons.insert(&config.name, id);
        }

        for config in &skin.sticks {
            let stick = load(&config.name)?;
            let click = if config.clickable {
                load(&format!("{}{}", config.name, CLICK_SUFFIX))?
            } else {
                stick.clone()
            };
            let visual = ControlVisual::new(
                &config.name,
                &*surface,
                Some(&*backdrop),
                config.position,
                config.size,
                ControlImages {
                    pushed: Some(click),
                    released: Some(stick),
                },
                VisualOptions {
                    margin: config.radius,
                    auto_rect: true,
                    copy_background: true,
                    ..Default::default()
                },
            )?;
            let id = pad.add(Control::new(
                visual,
                ControlKind::Stick(StickVisual::new(config.radius)),
            ));
            pad.sticks.insert(&config.name, id);
        }

        for config in &skin.triggers {
            let trigger = load(&config.name)?;
            let visual = ControlVisual::new(
                &config.name,
                &*surface,
                Some(&*backdrop),
                config.position,
                config.size,
                ControlImages {
                    pushed: Some(trigger.clone()),
                    released: Some(trigger),
                },
                VisualOptions {
                    margin: config.depth,
                    auto_rect: false,
                    copy_background: true,
                    copy_foreground: true,
                },
            )?;
            let id = pad.add(Control::new(
                visual,
                ControlKind::Trigger(TriggerVisual::new(config.depth)),
            ));
            pad.triggers.insert(&config.name, id);
        }

        pad.finalize_overlaps();

        info!(
            skin = %skin.name,
            buttons = pad.buttons.order.len(),
            sticks = pad.sticks.order.len(),
            triggers = pad.triggers.order.len(),
            "pad constructed"
        );
        Ok(pad)
    }

    fn add(&mut self, control: Control) -> ControlId {
        let id = ControlId(self.controls.len());
        self.controls.push(control);
        id
    }

    /// Recomputes every trigger's neighbor set from the current domains.
    fn finalize_overlaps(&mut self) {
        let domains: Vec<(ControlId, Rect)> = self
            .controls
            .iter()
            .enumerate()
            .map(|(index, control)| (ControlId(index), control.visual().domain()))
            .collect();

        for &id in &self.triggers.order {
            let own = domains[id.0].1;
            let control = &mut self.controls[id.0];
            let name = control.name().to_string();
            if let ControlKind::Trigger(trigger) = control.kind_mut() {
                trigger.update_neighbors(id, own, domains.iter().copied());
                debug!(trigger = %name, neighbors = trigger.neighbors().len(), "computed overlaps");
            }
        }
    }

    #[must_use]
    pub fn control(&self, id: ControlId) -> &Control {
        &self.controls[id.0]
    }

    #[must_use]
    pub fn controls(&self) -> &[Control] {
        &self.controls
    }

    #[must_use]
    pub fn button(&self, name: &str) -> Option<ControlId> {
        self.buttons.get(name)
    }

    #[must_use]
    pub fn stick(&self, name: &str) -> Option<ControlId> {
        self.sticks.get(name)
    }

    #[must_use]
    pub fn trigger(&self, name: &str) -> Option<ControlId> {
        self.triggers.get(name)
    }

    /// Finds the target behind an input state label.
    ///
    /// `name.direction` selects a stick direction. Any other label is a
    /// button name first and a trigger name second.
    #[must_use]
    pub fn resolve_label(&self, label: &str) -> Option<Target> {
        if let Some((name, direction)) = label.rsplit_once('.') {
            let stick = self.stick(name).zip(Direction::from_name(direction));
            if let Some((id, direction)) = stick {
                return Some(Target::Stick(id, direction));
            }
        }
        self.button(label)
            .map(Target::Button)
            .or_else(|| self.trigger(label).map(Target::Trigger))
    }

    /// Delivers a push. Returns whether the target became dirty.
    pub fn push(&mut self, target: Target, value: f32) -> bool {
        match target {
            Target::Button(id) | Target::Trigger(id) => self.controls[id.0].push(value),
            Target::Stick(id, direction) => self.controls[id.0].push_direction(direction, value),
        }
    }

    /// Returns every control to rest.
    pub fn reset(&mut self) {
        for control in &mut self.controls {
            control.reset();
        }
    }

    /// Draws every dirty control, then cascades trigger overlaps.
    ///
    /// Returns the number of control draws that blitted, forced neighbor
    /// redraws included.
    pub fn draw_frame(&mut self, surface: &mut dyn Surface) -> usize {
        let mut drawn = 0;

        for id in self.buttons.order.iter().chain(&self.sticks.order) {
            if self.controls[id.0].draw(surface, false) {
                drawn += 1;
            }
        }

        for index in 0..self.triggers.order.len() {
            let id = self.triggers.order[index];
            if self.controls[id.0].draw(surface, false) {
                drawn += 1 + self.cascade(id, surface);
            }
        }

        drawn
    }

    /// Force-redraws everything reachable through trigger overlaps from
    /// `origin`, each control at most once.
    fn cascade(&mut self, origin: ControlId, surface: &mut dyn Surface) -> usize {
        let mut visited = HashSet::from([origin]);
        let mut pending: VecDeque<ControlId> = self.neighbors(origin).into();
        let mut drawn = 0;

        while let Some(id) = pending.pop_front() {
            if !visited.insert(id) {
                continue;
            }
            self.controls[id.0].draw(surface, true);
            drawn += 1;
            pending.extend(
                self.neighbors(id)
                    .into_iter()
                    .filter(|next| !visited.contains(next)),
            );
        }

        drawn
    }

    fn neighbors(&self, id: ControlId) -> Vec<ControlId> {
        match self.controls[id.0].kind() {
            ControlKind::Trigger(trigger) => trigger.neighbors().to_vec(),
            _ => Vec::new(),
        }
    }
}
