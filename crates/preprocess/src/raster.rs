use crate::errors::{PreprocessError, Result};

/// Bytes per raster sample (RGBA).
pub const RASTER_CHANNELS: usize = 4;

/// Snapshot of a drawing surface: `width * height` RGBA samples, row-major.
///
/// Construction validates the dimensions against the buffer, so every
/// `Raster` in circulation is at least 1x1 and fully populated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Raster {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Raster {
    /// Wrap an RGBA buffer captured from a drawing surface.
    pub fn from_rgba(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self> {
        let expected = expected_len(width, height)?;
        if pixels.len() != expected {
            return Err(PreprocessError::InvalidRaster(format!(
                "Buffer size mismatch: expected {} bytes for {}x{} RGBA, got {}",
                expected,
                width,
                height,
                pixels.len()
            )));
        }

        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// A raster where every sample has the same color.
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Result<Self> {
        let len = expected_len(width, height)?;
        let pixels = rgba.iter().copied().cycle().take(len).collect();
        Self::from_rgba(width, height, pixels)
    }

    /// Paint an axis-aligned rectangle, clipped to the raster bounds.
    pub fn with_rect(mut self, x: u32, y: u32, width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let x_end = x.saturating_add(width).min(self.width);
        let y_end = y.saturating_add(height).min(self.height);
        for row in y.min(y_end)..y_end {
            for col in x.min(x_end)..x_end {
                let idx = self.index(col, row);
                self.pixels[idx..idx + RASTER_CHANNELS].copy_from_slice(&rgba);
            }
        }
        self
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.pixels
    }

    /// RGBA sample at `(x, y)`, or `None` outside the raster.
    pub fn get(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = self.index(x, y);
        let px = &self.pixels[idx..idx + RASTER_CHANNELS];
        Some([px[0], px[1], px[2], px[3]])
    }

    /// Iterate over samples as `(x, y, rgb)`, with alpha composited over `background`.
    pub fn samples(&self, background: [u8; 3]) -> impl Iterator<Item = (u32, u32, [u8; 3])> + '_ {
        let width = self.width;
        self.pixels
            .chunks_exact(RASTER_CHANNELS)
            .enumerate()
            .map(move |(i, px)| {
                let x = (i % width as usize) as u32;
                let y = (i / width as usize) as u32;
                (x, y, composite([px[0], px[1], px[2], px[3]], background))
            })
    }

    /// RGB value at `(x, y)` with alpha composited over `background`.
    pub(crate) fn rgb_over(&self, x: u32, y: u32, background: [u8; 3]) -> [u8; 3] {
        match self.get(x, y) {
            Some(px) => composite(px, background),
            None => background,
        }
    }

    fn index(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * RASTER_CHANNELS
    }
}

fn expected_len(width: u32, height: u32) -> Result<usize> {
    if width == 0 || height == 0 {
        return Err(PreprocessError::InvalidRaster(format!(
            "Degenerate dimensions {}x{}",
            width, height
        )));
    }
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|n| n.checked_mul(RASTER_CHANNELS))
        .ok_or_else(|| {
            PreprocessError::InvalidRaster(format!("Dimensions {}x{} overflow", width, height))
        })
}

fn composite(px: [u8; 4], background: [u8; 3]) -> [u8; 3] {
    let alpha = px[3] as u32;
    if alpha == 255 {
        return [px[0], px[1], px[2]];
    }
    let blend = |fg: u8, bg: u8| -> u8 {
        ((fg as u32 * alpha + bg as u32 * (255 - alpha) + 127) / 255) as u8
    };
    [
        blend(px[0], background[0]),
        blend(px[1], background[1]),
        blend(px[2], background[2]),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_degenerate_dimensions() {
        let result = Raster::from_rgba(0, 10, Vec::new());
        assert!(
            matches!(result, Err(PreprocessError::InvalidRaster(_))),
            "Zero width should be an invalid raster"
        );

        let result = Raster::filled(10, 0, [255, 255, 255, 255]);
        assert!(matches!(result, Err(PreprocessError::InvalidRaster(_))));
    }

    #[test]
    fn test_buffer_size_mismatch_detection() {
        let result = Raster::from_rgba(10, 10, vec![0u8; 300]);
        let err = result.unwrap_err();
        assert!(
            err.to_string().contains("mismatch"),
            "Error should mention mismatch (got {})",
            err
        );
    }

    #[test]
    fn test_with_rect_clips_to_bounds() {
        let raster = Raster::filled(4, 4, [255, 255, 255, 255])
            .unwrap()
            .with_rect(2, 2, 10, 10, [0, 0, 0, 255]);

        assert_eq!(raster.get(1, 1), Some([255, 255, 255, 255]));
        assert_eq!(raster.get(2, 2), Some([0, 0, 0, 255]));
        assert_eq!(raster.get(3, 3), Some([0, 0, 0, 255]));
        assert_eq!(raster.get(4, 4), None, "Out of bounds should be None");
    }

    #[test]
    fn test_transparent_samples_take_background() {
        let raster = Raster::filled(2, 1, [0, 0, 0, 0]).unwrap();
        let samples: Vec<_> = raster.samples([255, 255, 255]).collect();

        assert_eq!(samples, vec![(0, 0, [255, 255, 255]), (1, 0, [255, 255, 255])]);
        assert_eq!(raster.rgb_over(5, 5, [7, 8, 9]), [7, 8, 9]);
    }

    #[test]
    fn test_half_alpha_blends_toward_background() {
        let raster = Raster::filled(1, 1, [0, 0, 0, 128]).unwrap();
        let [r, g, b] = raster.rgb_over(0, 0, [255, 255, 255]);
        assert_eq!((r, g, b), (127, 127, 127));
    }
}
