//! Error types for the cartoon-bg-removal crate.

use std::path::PathBuf;

/// Errors that can occur while removing a background.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The input does not refer to an image (e.g. a directory, or an empty in-memory image).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The input bytes are not a decodable raster image.
    #[error("failed to decode image: {0}")]
    Decode(#[source] image::ImageError),

    /// Re-encoding the processed image as PNG failed.
    #[error("failed to encode PNG: {0}")]
    Encode(#[source] image::ImageError),

    /// Writing the output file (or creating its parent directory) failed.
    #[error("failed to write {}: {source}", path.display())]
    Write {
        /// Path that could not be written.
        path: PathBuf,
        /// Underlying filesystem error.
        #[source]
        source: std::io::Error,
    },

    /// A configuration value could not be parsed.
    #[error("invalid configuration value for {name}: {value:?}")]
    InvalidConfig {
        /// Name of the setting.
        name: &'static str,
        /// The rejected raw value.
        value: String,
    },

    /// An I/O error occurred while reading an input file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A specialized `Result` type for this crate.
pub type Result<T> = std::result::Result<T, Error>;
