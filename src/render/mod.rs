//! # Render Module
//!
//! Draws a pad skin and redraws only the controls whose value changed.
//!
//! - [`geometry`]: integer points and rectangles
//! - [`surface`]: the [`Surface`](surface::Surface) trait and the RGBA frame buffer
//! - [`control`]: the shared control visual and the button/stick/trigger kinds
//! - [`stick`]: four-direction displacement plus click
//! - [`trigger`]: depth offset and overlap bookkeeping
//! - [`pad`]: the composite owning every control of a skin

pub mod control;
pub mod geometry;
pub mod pad;
pub mod stick;
pub mod surface;
pub mod trigger;

pub use geometry::{Point, Rect};
pub use pad::PadComposite;
pub use surface::{FrameBuffer, Surface};
