//! Binary background mask and its morphological refinement.
//!
//! A [`Mask`] marks pixels classified as near-white background. Smoothing is a
//! morphological opening (one erosion, then one dilation) with a 4-connected
//! cross structuring element:
//!
//! ```text
//!  . x .
//!  x x x
//!  . x .
//! ```
//!
//! Neighbors outside the image count as foreground for both passes, so erosion
//! strips the outermost ring of a region that touches the image border.

use image::RgbaImage;

/// Offsets of the 4-connected neighborhood, as `(dx, dy)`.
const NEIGHBORS: [(i64, i64); 4] = [(0, -1), (-1, 0), (1, 0), (0, 1)];

/// A 2D boolean mask, `true` meaning background (to become transparent).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mask {
    width: u32,
    height: u32,
    data: Vec<bool>,
}

impl Mask {
    /// Create an all-foreground mask.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![false; width as usize * height as usize],
        }
    }

    /// Classify every pixel of `image`: background iff red, green and blue are all
    /// strictly greater than `threshold`.
    #[must_use]
    pub fn from_white_threshold(image: &RgbaImage, threshold: u8) -> Self {
        let data = image
            .pixels()
            .map(|px| px[0] > threshold && px[1] > threshold && px[2] > threshold)
            .collect();
        Self {
            width: image.width(),
            height: image.height(),
            data,
        }
    }

    /// Mask width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Mask height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    /// Whether the pixel at `(x, y)` is background.
    ///
    /// # Panics
    ///
    /// Panics if `(x, y)` is out of bounds.
    #[must_use]
    pub fn get(&self, x: u32, y: u32) -> bool {
        assert!(x < self.width && y < self.height, "mask index out of bounds");
        self.data[self.index(x, y)]
    }

    /// Mark or unmark the pixel at `(x, y)`.
    ///
    /// # Panics
    ///
    /// Panics if `(x, y)` is out of bounds.
    pub fn set(&mut self, x: u32, y: u32, value: bool) {
        assert!(x < self.width && y < self.height, "mask index out of bounds");
        let idx = self.index(x, y);
        self.data[idx] = value;
    }

    /// Number of background pixels.
    #[must_use]
    pub fn count(&self) -> usize {
        self.data.iter().filter(|&&m| m).count()
    }

    /// Total number of pixels covered by the mask.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the mask covers no pixels at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Neighbor value; `false` if the neighbor falls off the image.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn neighbor(&self, x: u32, y: u32, dx: i64, dy: i64) -> bool {
        let nx = i64::from(x) + dx;
        let ny = i64::from(y) + dy;
        if nx < 0 || ny < 0 || nx >= i64::from(self.width) || ny >= i64::from(self.height) {
            return false;
        }
        self.data[self.index(nx as u32, ny as u32)]
    }

    /// One iteration of binary erosion.
    ///
    /// A background pixel survives only if all four neighbors are background.
    /// Pixels on the image border never survive.
    #[must_use]
    pub fn eroded(&self) -> Self {
        let mut out = Self::new(self.width, self.height);
        for y in 0..self.height {
            for x in 0..self.width {
                let idx = self.index(x, y);
                out.data[idx] = self.data[idx]
                    && NEIGHBORS
                        .iter()
                        .all(|&(dx, dy)| self.neighbor(x, y, dx, dy));
            }
        }
        out
    }

    /// One iteration of binary dilation.
    ///
    /// A pixel becomes background if it or any of its four neighbors is background.
    #[must_use]
    pub fn dilated(&self) -> Self {
        let mut out = Self::new(self.width, self.height);
        for y in 0..self.height {
            for x in 0..self.width {
                let idx = self.index(x, y);
                out.data[idx] = self.data[idx]
                    || NEIGHBORS
                        .iter()
                        .any(|&(dx, dy)| self.neighbor(x, y, dx, dy));
            }
        }
        out
    }

    /// Erosion followed by dilation: strips one-pixel-wide noise and ragged edges.
    #[must_use]
    pub fn opened(&self) -> Self {
        self.eroded().dilated()
    }

    /// Set alpha to 0 for every background pixel. Other pixels are left untouched.
    ///
    /// # Panics
    ///
    /// Panics if the image dimensions differ from the mask's.
    pub fn apply_to(&self, image: &mut RgbaImage) {
        assert_eq!(
            (image.width(), image.height()),
            (self.width, self.height),
            "mask and image dimensions must match"
        );
        for (px, &masked) in image.pixels_mut().zip(&self.data) {
            if masked {
                px[3] = 0;
            }
        }
    }
}
