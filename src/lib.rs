//! Make the near-white background of a generated cartoon portrait transparent.
//!
//! Each pixel whose red, green and blue channels all lie strictly above
//! `255 - tolerance` is classified as background. The resulting mask is
//! optionally smoothed by a morphological opening, then written into the alpha
//! channel as a hard binary cut.
//!
//! # Quick Start
//!
//! ```no_run
//! use cartoon_bg_removal::{BackgroundRemover, RemovalConfig};
//!
//! let remover = BackgroundRemover::new(RemovalConfig::default());
//! let cartoon = std::fs::read("cartoon.jpg").unwrap();
//! let png = remover.process_cartoon(&cartoon).unwrap();
//! std::fs::write("cartoon.png", png).unwrap();
//! ```
//!
//! # Fallback
//!
//! In a pipeline, background removal should never be fatal:
//!
//! ```no_run
//! use cartoon_bg_removal::BackgroundRemover;
//!
//! let remover = BackgroundRemover::default();
//! let cartoon = std::fs::read("cartoon.jpg").unwrap();
//! let out = remover.process_cartoon_or_original(&cartoon);
//! println!("transparent: {}", out.transparent);
//! ```

#![deny(missing_docs)]

pub mod config;
pub mod error;
pub mod mask;
mod remover;

pub use config::{RemovalConfig, Settings};
pub use error::{Error, Result};
pub use mask::Mask;
pub use remover::{
    default_output_path, encode_png, ensure_png_extension, is_supported_image, BackgroundRemover,
    CartoonOutput, ImageInput, ProcessResult, TRANSPARENT_CONTENT_TYPE, TRANSPARENT_EXTENSION,
};
