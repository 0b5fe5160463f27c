//! # Input Module
//!
//! Everything between the physical gamepad and the pad composite.
//!
//! ## Pipeline
//!
//! ```text
//! evdev event → device::DeviceLayout → RawEvent → dispatcher::Dispatcher → PadComposite
//!                                                              ↓
//!                                                         InputState
//! ```
//!
//! - [`device`]: opens the gamepad and translates evdev events
//! - [`mapping`]: per-device mapping tables loaded from the skin directory
//! - [`dispatcher`]: applies raw events to pad controls
//! - [`state`]: snapshot of pushed values for change detection

pub mod device;
pub mod dispatcher;
pub mod event;
pub mod mapping;
pub mod state;

pub use event::RawEvent;
pub use state::InputState;
