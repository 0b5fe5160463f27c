//! # Session
//!
//! The per-frame loop body: apply pending input, redraw what changed, and
//! report the damaged region. The session owns all widget state; nothing
//! else mutates the pad.

use tracing::{debug, info};

use crate::error::Result;
use crate::history::{HistoryPublisher, HistoryTracker};
use crate::input::dispatcher::Dispatcher;
use crate::input::mapping::DeviceMapping;
use crate::input::{InputState, RawEvent};
use crate::render::surface::Image;
use crate::render::{FrameBuffer, PadComposite, Rect};
use crate::skin::Skin;

/// One visualized device on one skin.
#[derive(Debug)]
pub struct Session {
    pad: PadComposite,
    frame: FrameBuffer,
    dispatcher: Dispatcher,
    state: InputState,
    tracker: HistoryTracker,
    history: Option<HistoryPublisher>,
    frames: u64,
}

impl Session {
    /// Builds the pad for `skin` with images from the skin directory and
    /// resolves `mapping` against it.
    ///
    /// # Errors
    ///
    /// Returns error if an image cannot be loaded or the mapping names a
    /// control the skin lacks.
    pub fn new(
        skin: &Skin,
        mapping: &DeviceMapping,
        history: Option<HistoryPublisher>,
    ) -> Result<Self> {
        Self::with_loader(skin, mapping, history, |name| skin.load_image(name))
    }

    /// Like [`Session::new`] with a custom image source.
    ///
    /// # Errors
    ///
    /// Same as [`Session::new`].
    pub fn with_loader<F>(
        skin: &Skin,
        mapping: &DeviceMapping,
        history: Option<HistoryPublisher>,
        load: F,
    ) -> Result<Self>
    where
        F: FnMut(&str) -> Result<Image>,
    {
        let [width, height] = skin.size;
        let mut frame = FrameBuffer::new(width, height);
        let pad = PadComposite::construct_with(skin, &mut frame, load)?;
        let dispatcher = Dispatcher::new(mapping, &pad)?;

        info!(
            "Skin '{}' ready: {}x{}, {} controls",
            skin.name,
            width,
            height,
            pad.controls().len()
        );

        Ok(Self {
            pad,
            frame,
            dispatcher,
            state: InputState::new(),
            tracker: HistoryTracker::new(),
            history,
            frames: 0,
        })
    }

    /// Applies one raw event without drawing.
    pub fn apply(&mut self, event: &RawEvent) {
        self.dispatcher
            .dispatch(event, &mut self.pad, &mut self.state);
    }

    /// Runs one frame: applies `events`, draws dirty controls, publishes
    /// history, and returns the region that changed since the last frame.
    pub fn step<I>(&mut self, events: I) -> Option<Rect>
    where
        I: IntoIterator<Item = RawEvent>,
    {
        for event in events {
            self.apply(&event);
        }

        let drawn = self.pad.draw_frame(&mut self.frame);
        if drawn > 0 {
            debug!("Frame {}: redrew {} controls", self.frames, drawn);
        }

        if let Some(history) = self.history.as_mut() {
            history.publish(self.tracker.observe(&self.state));
        }

        self.frames += 1;
        self.frame.flip()
    }

    /// Returns every control to rest and clears the recorded state.
    pub fn reset(&mut self) {
        self.pad.reset();
        self.state = InputState::new();
    }

    #[must_use]
    pub fn frame(&self) -> &FrameBuffer {
        &self.frame
    }

    #[must_use]
    pub fn pad(&self) -> &PadComposite {
        &self.pad
    }

    #[must_use]
    pub fn state(&self) -> &InputState {
        &self.state
    }

    /// Number of frames stepped so far.
    #[must_use]
    pub fn frames(&self) -> u64 {
        self.frames
    }
}
