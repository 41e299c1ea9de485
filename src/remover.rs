//! Background removal: decode, classify, smooth, mask, encode.

use std::collections::HashMap;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{DynamicImage, ExtendedColorType, ImageEncoder, ImageReader, RgbaImage};
use tracing::{debug, warn};

use crate::config::RemovalConfig;
use crate::error::{Error, Result};
use crate::mask::Mask;

/// Extension written by [`BackgroundRemover::save_transparent`].
pub const TRANSPARENT_EXTENSION: &str = "png";

/// Content type of the bytes returned by [`BackgroundRemover::process_cartoon`].
pub const TRANSPARENT_CONTENT_TYPE: &str = "image/png";

/// An image to remove the background from.
#[derive(Debug, Clone, Copy)]
pub enum ImageInput<'a> {
    /// Encoded image bytes (PNG, JPEG, ...).
    Bytes(&'a [u8]),
    /// Path to an encoded image file.
    Path(&'a Path),
    /// An already decoded image. It is copied, never modified.
    Image(&'a DynamicImage),
}

impl<'a> From<&'a [u8]> for ImageInput<'a> {
    fn from(bytes: &'a [u8]) -> Self {
        Self::Bytes(bytes)
    }
}

impl<'a> From<&'a Vec<u8>> for ImageInput<'a> {
    fn from(bytes: &'a Vec<u8>) -> Self {
        Self::Bytes(bytes)
    }
}

impl<'a> From<&'a Path> for ImageInput<'a> {
    fn from(path: &'a Path) -> Self {
        Self::Path(path)
    }
}

impl<'a> From<&'a PathBuf> for ImageInput<'a> {
    fn from(path: &'a PathBuf) -> Self {
        Self::Path(path)
    }
}

impl<'a> From<&'a DynamicImage> for ImageInput<'a> {
    fn from(image: &'a DynamicImage) -> Self {
        Self::Image(image)
    }
}

impl ImageInput<'_> {
    /// Decode into an RGBA buffer. Inputs without alpha become fully opaque.
    fn decode(self) -> Result<RgbaImage> {
        match self {
            ImageInput::Bytes(bytes) => image::load_from_memory(bytes)
                .map(|img| img.to_rgba8())
                .map_err(Error::Decode),
            ImageInput::Path(path) => {
                if path.is_dir() {
                    return Err(Error::InvalidInput(format!(
                        "{} is a directory, not an image file",
                        path.display()
                    )));
                }
                ImageReader::open(path)?
                    .with_guessed_format()?
                    .decode()
                    .map(|img| img.to_rgba8())
                    .map_err(Error::Decode)
            }
            ImageInput::Image(img) => {
                if img.width() == 0 || img.height() == 0 {
                    return Err(Error::InvalidInput(format!(
                        "in-memory image has no pixels ({}x{})",
                        img.width(),
                        img.height()
                    )));
                }
                Ok(img.to_rgba8())
            }
        }
    }
}

/// Output of [`BackgroundRemover::process_cartoon_or_original`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartoonOutput {
    /// Transparent PNG bytes, or the untouched input on failure.
    pub bytes: Vec<u8>,
    /// Whether `bytes` holds the transparent rendition.
    pub transparent: bool,
}

/// Result of processing a single image file.
#[derive(Debug)]
pub struct ProcessResult {
    /// Path of the input file.
    pub path: PathBuf,
    /// Path actually written, if any.
    pub output: Option<PathBuf>,
    /// Whether processing succeeded.
    pub success: bool,
    /// Number of pixels made transparent.
    pub pixels_removed: usize,
    /// Total number of pixels in the image.
    pub total_pixels: usize,
    /// Human-readable status message.
    pub message: String,
}

impl ProcessResult {
    /// Share of pixels made transparent, in percent.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn percent_removed(&self) -> f64 {
        if self.total_pixels == 0 {
            0.0
        } else {
            self.pixels_removed as f64 / self.total_pixels as f64 * 100.0
        }
    }
}

/// Removes near-white backgrounds from cartoon renders.
///
/// Holds only an immutable [`RemovalConfig`], so one instance can be shared
/// freely across threads.
#[derive(Debug, Clone, Copy, Default)]
pub struct BackgroundRemover {
    config: RemovalConfig,
}

impl BackgroundRemover {
    /// Create a remover with the given classifier parameters.
    #[must_use]
    pub fn new(config: RemovalConfig) -> Self {
        Self { config }
    }

    /// The configuration this remover was built with.
    #[must_use]
    pub fn config(&self) -> RemovalConfig {
        self.config
    }

    /// Compute the background mask of an RGBA image, smoothed if configured.
    #[must_use]
    pub fn background_mask(&self, image: &RgbaImage) -> Mask {
        let raw = Mask::from_white_threshold(image, self.config.white_threshold());
        if self.config.edge_smoothing {
            raw.opened()
        } else {
            raw
        }
    }

    /// Decode `input` and make its near-white background transparent.
    ///
    /// Background pixels get alpha 0; every other pixel keeps its RGBA values.
    /// The output has the same dimensions as the decoded input.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidInput`] if the input does not denote an image.
    /// - [`Error::Decode`] if the bytes cannot be decoded.
    /// - [`Error::Io`] if an input file cannot be read.
    pub fn remove_background<'a>(&self, input: impl Into<ImageInput<'a>>) -> Result<RgbaImage> {
        self.remove_with_count(input.into()).map(|(img, _)| img)
    }

    fn remove_with_count(&self, input: ImageInput<'_>) -> Result<(RgbaImage, usize)> {
        let mut image = input.decode()?;
        debug!(
            width = image.width(),
            height = image.height(),
            tolerance = self.config.tolerance,
            edge_smoothing = self.config.edge_smoothing,
            "removing background"
        );

        let mask = self.background_mask(&image);
        mask.apply_to(&mut image);

        let removed = mask.count();
        #[allow(clippy::cast_precision_loss)]
        let percent = if mask.is_empty() {
            0.0
        } else {
            removed as f64 / mask.len() as f64 * 100.0
        };
        debug!(removed, percent, "background pixels removed");

        Ok((image, removed))
    }

    /// Remove the background from encoded image bytes and return PNG bytes.
    ///
    /// # Errors
    ///
    /// Propagates [`Error::Decode`] from decoding and returns [`Error::Encode`]
    /// if PNG encoding fails.
    pub fn process_cartoon(&self, image_bytes: &[u8]) -> Result<Vec<u8>> {
        let image = self.remove_background(image_bytes)?;
        encode_png(&image)
    }

    /// Like [`process_cartoon`](Self::process_cartoon), but falls back to the
    /// untouched input bytes on any failure.
    ///
    /// Background removal is an enhancement: a failure is logged, never surfaced.
    #[must_use]
    pub fn process_cartoon_or_original(&self, image_bytes: &[u8]) -> CartoonOutput {
        match self.process_cartoon(image_bytes) {
            Ok(bytes) => CartoonOutput {
                bytes,
                transparent: true,
            },
            Err(e) => {
                warn!(error = %e, "background removal failed, keeping opaque cartoon");
                CartoonOutput {
                    bytes: image_bytes.to_vec(),
                    transparent: false,
                }
            }
        }
    }

    /// Remove the background and save the result as PNG.
    ///
    /// The extension of `output_path` is replaced by `.png` if it is anything
    /// else, and missing parent directories are created. Returns the path
    /// actually written.
    ///
    /// # Errors
    ///
    /// Errors of [`remove_background`](Self::remove_background), plus
    /// [`Error::Encode`] and [`Error::Write`].
    pub fn save_transparent<'a>(
        &self,
        input: impl Into<ImageInput<'a>>,
        output_path: &Path,
    ) -> Result<PathBuf> {
        let image = self.remove_background(input)?;
        let path = ensure_png_extension(output_path);
        write_png(&image, &path)?;
        debug!(path = %path.display(), "saved transparent image");
        Ok(path)
    }

    /// Process a single image file: load, remove background, save.
    ///
    /// Never fails; the outcome is reported in the returned [`ProcessResult`].
    #[must_use]
    pub fn process_file(&self, input: &Path, output: &Path) -> ProcessResult {
        let mut result = ProcessResult {
            path: input.to_path_buf(),
            output: None,
            success: false,
            pixels_removed: 0,
            total_pixels: 0,
            message: String::new(),
        };

        let (image, removed) = match self.remove_with_count(ImageInput::Path(input)) {
            Ok(r) => r,
            Err(e) => {
                result.message = format!("Failed to load: {e}");
                return result;
            }
        };
        result.pixels_removed = removed;
        result.total_pixels = image.width() as usize * image.height() as usize;

        let path = ensure_png_extension(output);
        match write_png(&image, &path) {
            Ok(()) => {
                result.success = true;
                result.message = format!("Background removed ({:.1}%)", result.percent_removed());
                result.output = Some(path);
            }
            Err(e) => {
                result.message = format!("Failed to save: {e}");
            }
        }

        result
    }

    /// Process all supported images in a directory.
    ///
    /// Outputs are written to `output_dir` as `{stem}.png`. Inputs sharing a stem
    /// (e.g. `a.png` and `a.jpg`) would write the same file: the first in sorted
    /// order is processed, the others are reported as failed and left untouched.
    /// Uses parallel iteration when the `cli` feature is enabled (via rayon).
    #[must_use]
    pub fn process_directory(&self, input_dir: &Path, output_dir: &Path) -> Vec<ProcessResult> {
        let mut entries: Vec<PathBuf> = match std::fs::read_dir(input_dir) {
            Ok(rd) => rd
                .filter_map(std::result::Result::ok)
                .filter(|e| e.file_type().map(|ft| ft.is_file()).unwrap_or(false))
                .map(|e| e.path())
                .filter(|p| is_supported_image(p))
                .collect(),
            Err(e) => {
                return vec![ProcessResult {
                    path: input_dir.to_path_buf(),
                    output: None,
                    success: false,
                    pixels_removed: 0,
                    total_pixels: 0,
                    message: format!("Failed to read directory: {e}"),
                }];
            }
        };
        entries.sort();

        let mut claimed: HashMap<PathBuf, &Path> = HashMap::new();
        let jobs: Vec<(&Path, PathBuf, Option<&Path>)> = entries
            .iter()
            .map(|input| {
                let stem = input.file_stem().unwrap_or_default().to_string_lossy();
                let output = output_dir.join(format!("{stem}.{TRANSPARENT_EXTENSION}"));
                let owner = *claimed.entry(output.clone()).or_insert(input.as_path());
                let conflict = (owner != input.as_path()).then_some(owner);
                (input.as_path(), output, conflict)
            })
            .collect();

        let run = |(input, output, conflict): &(&Path, PathBuf, Option<&Path>)| match conflict {
            None => self.process_file(input, output),
            Some(owner) => ProcessResult {
                path: input.to_path_buf(),
                output: None,
                success: false,
                pixels_removed: 0,
                total_pixels: 0,
                message: format!(
                    "Output {} is already produced from {}",
                    output.display(),
                    owner.display()
                ),
            },
        };

        #[cfg(feature = "cli")]
        {
            use rayon::prelude::*;
            jobs.par_iter().map(run).collect()
        }

        #[cfg(not(feature = "cli"))]
        {
            jobs.iter().map(run).collect()
        }
    }
}

/// Encode an RGBA image as PNG, losslessly and with alpha.
///
/// # Errors
///
/// Returns [`Error::Encode`] if encoding fails.
pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>> {
    let mut buf = Cursor::new(Vec::new());
    let encoder = PngEncoder::new_with_quality(&mut buf, CompressionType::Best, FilterType::Adaptive);
    encoder
        .write_image(
            image.as_raw(),
            image.width(),
            image.height(),
            ExtendedColorType::Rgba8,
        )
        .map_err(Error::Encode)?;
    Ok(buf.into_inner())
}

/// Encode `image` as PNG and write it to `path`, creating parent directories.
fn write_png(image: &RgbaImage, path: &Path) -> Result<()> {
    let bytes = encode_png(image)?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent).map_err(|source| Error::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }
    }

    std::fs::write(path, bytes).map_err(|source| Error::Write {
        path: path.to_path_buf(),
        source,
    })
}

/// Force a `.png` extension (case-insensitive check).
///
/// Example: `"out/cartoon.jpg"` becomes `"out/cartoon.png"`, `"out/cartoon.PNG"` is kept.
#[must_use]
pub fn ensure_png_extension(path: &Path) -> PathBuf {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case(TRANSPARENT_EXTENSION) => path.to_path_buf(),
        _ => path.with_extension(TRANSPARENT_EXTENSION),
    }
}

/// Check if a file has a supported image extension.
#[must_use]
pub fn is_supported_image(path: &Path) -> bool {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => matches!(
            ext.to_lowercase().as_str(),
            "jpg" | "jpeg" | "png" | "webp" | "bmp"
        ),
        None => false,
    }
}

/// Generate a default output path from an input path.
///
/// Example: `"photo.jpg"` becomes `"photo_transparent.png"`.
#[must_use]
pub fn default_output_path(input: &Path) -> PathBuf {
    let stem = input.file_stem().unwrap_or_default().to_string_lossy();
    let parent = input.parent().unwrap_or(Path::new("."));
    parent.join(format!("{stem}_transparent.{TRANSPARENT_EXTENSION}"))
}
