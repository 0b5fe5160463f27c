//! Visual input history.
//!
//! A column of pad pictures, newest on top. Every distinct state scrolls the
//! column down by one pad height and repaints the top row with the controls
//! that changed. While the state holds, the strip only tracks how many
//! frames it has been held; the viewer paints that count over the top row.

use image::Rgba;
use tracing::{debug, trace};

use super::HistoryRecord;
use crate::error::{PadError, Result};
use crate::input::InputState;
use crate::render::surface::Image;
use crate::render::{FrameBuffer, PadComposite, Rect};
use crate::skin::Skin;

/// Largest number of pad rows a strip may hold.
pub const MAX_ROWS: u32 = 32;

/// Scrolling picture of recent input states.
#[derive(Debug)]
pub struct HistoryStrip {
    pad: PadComposite,
    canvas: FrameBuffer,
    row_height: u32,
    background: Rgba<u8>,
    entries: u64,
    elapsed_frames: u64,
}

impl HistoryStrip {
    /// Builds a strip of `rows` pads for `skin`, loading images from the
    /// skin directory.
    ///
    /// # Errors
    ///
    /// Returns error if `rows` is out of range or an image cannot be loaded.
    pub fn new(skin: &Skin, rows: u32) -> Result<Self> {
        Self::with_loader(skin, rows, |name| skin.load_image(name))
    }

    /// Like [`HistoryStrip::new`] with a custom image source.
    ///
    /// # Errors
    ///
    /// Same as [`HistoryStrip::new`].
    pub fn with_loader<F>(skin: &Skin, rows: u32, load: F) -> Result<Self>
    where
        F: FnMut(&str) -> Result<Image>,
    {
        if rows == 0 || rows > MAX_ROWS {
            return Err(PadError::Config(format!(
                "history rows must be between 1 and {MAX_ROWS}"
            )));
        }

        let [width, height] = skin.size;
        let mut canvas = FrameBuffer::new(width, height * rows);
        // The pad lives in the top row; everything below is scrolled history
        let pad = PadComposite::construct_with(skin, &mut canvas, load)?;
        let [r, g, b] = skin.background_color;

        debug!(rows, "History strip ready");
        Ok(Self {
            pad,
            canvas,
            row_height: height,
            background: Rgba([r, g, b, 255]),
            entries: 0,
            elapsed_frames: 0,
        })
    }

    /// Applies one record from the history channel.
    pub fn record(&mut self, record: HistoryRecord) {
        match record {
            HistoryRecord::Changed(state) => self.push_state(&state),
            HistoryRecord::Unchanged { elapsed_frames } => {
                self.elapsed_frames = elapsed_frames;
            }
        }
    }

    fn push_state(&mut self, state: &InputState) {
        if self.entries > 0 {
            self.canvas.scroll(self.row_height);
        }

        for (label, &value) in state.buttons.iter().chain(&state.axes) {
            match self.pad.resolve_label(label) {
                Some(target) => {
                    self.pad.push(target, value);
                }
                None => trace!(%label, "no control for history label"),
            }
        }

        let drawn = self.pad.draw_frame(&mut self.canvas);
        trace!(entry = self.entries, drawn, "history row drawn");
        self.entries += 1;
        self.elapsed_frames = 0;
    }

    #[must_use]
    pub fn canvas(&self) -> &FrameBuffer {
        &self.canvas
    }

    /// Returns the canvas region changed since the previous flip.
    pub fn flip(&mut self) -> Option<Rect> {
        self.canvas.flip()
    }

    /// Frames the newest state has been held for.
    #[must_use]
    pub fn elapsed_frames(&self) -> u64 {
        self.elapsed_frames
    }

    /// Distinct states recorded so far.
    #[must_use]
    pub fn entries(&self) -> u64 {
        self.entries
    }

    /// Height of one pad row in pixels.
    #[must_use]
    pub fn row_height(&self) -> u32 {
        self.row_height
    }

    /// Skin background color, used behind the held-frame counter.
    #[must_use]
    pub fn background(&self) -> Rgba<u8> {
        self.background
    }
}
