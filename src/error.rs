//! # Error Types
//!
//! Custom error types for padview using `thiserror`.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for padview
#[derive(Debug, Error)]
pub enum PadError {
    /// Invalid configuration values or mapping targets
    #[error("Configuration error: {0}")]
    Config(String),

    /// TOML parsing errors (application config, skin descriptor)
    #[error("Configuration error: {0}")]
    Toml(#[from] toml::de::Error),

    /// JSON parsing errors (mapping table)
    #[error("Mapping table error: {0}")]
    Json(#[from] serde_json::Error),

    /// A skin image could not be decoded
    #[error("Failed to load image {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// A control was configured without any image
    #[error("Control '{0}' has neither a pushed nor a released image")]
    MissingImage(String),

    /// The connected device has no entry in the skin's mapping table
    #[error("Please run the mapper on {device} with {skin} skin.")]
    UnmappedDevice { device: String, skin: String },

    /// No gamepad found at the requested index
    #[error("No gamepad found at index {0}")]
    ControllerNotFound(usize),

    /// Gamepad I/O errors after detection
    #[error("Controller error: {0}")]
    Controller(String),

    /// The display window could not be created or failed while running
    #[error("Display error: {0}")]
    Display(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for padview
pub type Result<T> = std::result::Result<T, PadError>;
