//! # padview
//!
//! Live gamepad input visualizer.
//!
//! A skin describes a controller picture and where its buttons, analog
//! sticks and analog triggers sit. Input from a Linux gamepad is mapped onto
//! those controls, and only the controls whose value changed are redrawn
//! each frame.
//!
//! - [`skin`]: skin descriptor loading
//! - [`render`]: frame buffer, control visuals and the pad composite
//! - [`input`]: evdev device, mapping tables and event dispatch
//! - [`session`]: the per-frame loop body
//! - [`viewer`]: the native window
//! - [`history`]: change tracking and the scrolling history strip

pub mod config;
pub mod error;
pub mod history;
pub mod input;
pub mod render;
pub mod session;
pub mod skin;
pub mod viewer;
