use crate::errors::{PreprocessError, Result};
use crate::raster::Raster;
use common::span_debug;

/// Which side of the threshold counts as ink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InkPolarity {
    /// Dark strokes on a light background: red channel below the threshold
    DarkOnLight,
    /// Light strokes on a dark background: R + G + B above the threshold
    LightOnDark,
}

impl InkPolarity {
    /// Color of an empty canvas under this convention.
    pub fn background(&self) -> [u8; 3] {
        match self {
            InkPolarity::DarkOnLight => [255, 255, 255],
            InkPolarity::LightOnDark => [0, 0, 0],
        }
    }
}

/// Threshold and polarity used to classify a sample as ink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InkRule {
    pub threshold: u16,
    pub polarity: InkPolarity,
}

impl InkRule {
    pub fn dark_on_light(threshold: u16) -> Self {
        Self {
            threshold,
            polarity: InkPolarity::DarkOnLight,
        }
    }

    pub fn light_on_dark(threshold: u16) -> Self {
        Self {
            threshold,
            polarity: InkPolarity::LightOnDark,
        }
    }

    pub fn is_ink(&self, rgb: [u8; 3]) -> bool {
        match self.polarity {
            InkPolarity::DarkOnLight => (rgb[0] as u16) < self.threshold,
            InkPolarity::LightOnDark => {
                rgb[0] as u16 + rgb[1] as u16 + rgb[2] as u16 > self.threshold
            }
        }
    }
}

/// Inclusive pixel bounds of the ink on a raster.
///
/// Always satisfies `min_x <= max_x` and `min_y <= max_y`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
    min_x: u32,
    min_y: u32,
    max_x: u32,
    max_y: u32,
}

impl BoundingBox {
    pub fn new(min_x: u32, min_y: u32, max_x: u32, max_y: u32) -> Result<Self> {
        if min_x > max_x || min_y > max_y {
            return Err(PreprocessError::InvalidBoundingBox(format!(
                "Inverted bounds ({}, {})..=({}, {})",
                min_x, min_y, max_x, max_y
            )));
        }
        Ok(Self {
            min_x,
            min_y,
            max_x,
            max_y,
        })
    }

    /// The raster's own extent.
    pub fn full(raster: &Raster) -> Self {
        Self {
            min_x: 0,
            min_y: 0,
            max_x: raster.width() - 1,
            max_y: raster.height() - 1,
        }
    }

    pub fn min_x(&self) -> u32 {
        self.min_x
    }

    pub fn min_y(&self) -> u32 {
        self.min_y
    }

    pub fn max_x(&self) -> u32 {
        self.max_x
    }

    pub fn max_y(&self) -> u32 {
        self.max_y
    }

    pub fn width(&self) -> u32 {
        (self.max_x - self.min_x).saturating_add(1)
    }

    pub fn height(&self) -> u32 {
        (self.max_y - self.min_y).saturating_add(1)
    }

    /// Geometric center in continuous pixel coordinates.
    pub fn center(&self) -> (f32, f32) {
        (
            self.min_x as f32 + self.width() as f32 / 2.0,
            self.min_y as f32 + self.height() as f32 / 2.0,
        )
    }

    pub fn contains(&self, x: u32, y: u32) -> bool {
        (self.min_x..=self.max_x).contains(&x) && (self.min_y..=self.max_y).contains(&y)
    }
}

/// Finds the tight box around all ink samples with one exact scan.
#[derive(Debug, Clone, Copy)]
pub struct BoundingBoxExtractor {
    rule: InkRule,
}

impl BoundingBoxExtractor {
    pub fn new(rule: InkRule) -> Self {
        Self { rule }
    }

    pub fn rule(&self) -> InkRule {
        self.rule
    }

    /// Returns `None` when the raster holds no ink at all.
    pub fn extract(&self, raster: &Raster) -> Option<BoundingBox> {
        let _s = span_debug!("extract_bounding_box");

        let background = self.rule.polarity.background();
        let mut bounds: Option<BoundingBox> = None;

        for (x, y, rgb) in raster.samples(background) {
            if !self.rule.is_ink(rgb) {
                continue;
            }
            bounds = Some(match bounds {
                None => BoundingBox {
                    min_x: x,
                    min_y: y,
                    max_x: x,
                    max_y: y,
                },
                Some(b) => BoundingBox {
                    min_x: b.min_x.min(x),
                    min_y: b.min_y.min(y),
                    max_x: b.max_x.max(x),
                    max_y: b.max_y.max(y),
                },
            });
        }

        match &bounds {
            Some(b) => tracing::trace!(
                min_x = b.min_x,
                min_y = b.min_y,
                max_x = b.max_x,
                max_y = b.max_y,
                "Ink bounds found"
            ),
            None => tracing::trace!(
                width = raster.width(),
                height = raster.height(),
                "No ink on raster"
            ),
        }

        bounds
    }
}
