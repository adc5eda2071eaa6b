use crate::errors::{PreprocessError, Result};
use crate::layout::LayoutSpec;
use common::span;

/// How raw 0-255 samples become model input values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NormalizationMode {
    /// `v = luma / 255`, optionally flipped to `1 - v`, then `v > cutoff` gives 1.0 else 0.0
    Binarize { cutoff: f32, invert: bool },
    /// `(raw / 255 - mean) / std`
    Standardize { mean: f32, std: f32 },
}

impl NormalizationMode {
    pub fn binarize(cutoff: f32, invert: bool) -> Self {
        NormalizationMode::Binarize { cutoff, invert }
    }

    pub fn standardize(mean: f32, std: f32) -> Self {
        NormalizationMode::Standardize { mean, std }
    }

    pub fn validate(&self) -> Result<()> {
        match *self {
            NormalizationMode::Binarize { cutoff, .. } if !cutoff.is_finite() => Err(
                PreprocessError::InvalidConfig(format!("Binarize cutoff must be finite (got {})", cutoff)),
            ),
            NormalizationMode::Standardize { mean, std }
                if !mean.is_finite() || !std.is_finite() || std <= 0.0 =>
            {
                Err(PreprocessError::InvalidConfig(format!(
                    "Standardize needs a finite mean and a positive std (got mean={} std={})",
                    mean, std
                )))
            }
            _ => Ok(()),
        }
    }

    /// Map one raw sample in `[0, 255]`.
    pub fn apply(&self, raw: f32) -> f32 {
        match *self {
            NormalizationMode::Binarize { cutoff, invert } => {
                let v = raw / 255.0;
                let v = if invert { 1.0 - v } else { v };
                if v > cutoff { 1.0 } else { 0.0 }
            }
            NormalizationMode::Standardize { mean, std } => (raw / 255.0 - mean) / std,
        }
    }

    /// Whether each RGB channel is normalized on its own instead of via luma.
    ///
    /// Only standardization into a 3-channel input keeps color; binarization
    /// always works on gray.
    pub fn keeps_color(&self, channels: usize) -> bool {
        matches!(self, NormalizationMode::Standardize { .. }) && channels == 3
    }
}

/// Perceptual gray value `0.299 R + 0.587 G + 0.114 B`.
///
/// Accumulated in integers so that pure white maps to exactly 255.0.
pub fn luma(rgb: [u8; 3]) -> f32 {
    let weighted = 299 * rgb[0] as u32 + 587 * rgb[1] as u32 + 114 * rgb[2] as u32;
    weighted as f32 / 1000.0
}

/// Normalize an `H * W` RGB buffer and lay the values out per `layout`.
///
/// Gray values are replicated across every output channel.
pub fn normalize_into_layout(
    rgb: &[u8],
    layout: &LayoutSpec,
    mode: &NormalizationMode,
) -> Result<Vec<f32>> {
    let _s = span!("normalize");

    let expected = layout.spatial() * 3;
    if rgb.len() != expected {
        return Err(PreprocessError::InvalidRaster(format!(
            "Buffer size mismatch: expected {} RGB bytes for {}x{}, got {}",
            expected,
            layout.width,
            layout.height,
            rgb.len()
        )));
    }

    let channels = layout.channels;
    let keeps_color = mode.keeps_color(channels);
    let mut output = vec![0.0f32; layout.len()];

    for (i, px) in rgb.chunks_exact(3).enumerate() {
        if keeps_color {
            for (c, &raw) in px.iter().enumerate() {
                output[layout.offset(c, i)] = mode.apply(raw as f32);
            }
        } else {
            let value = mode.apply(luma([px[0], px[1], px[2]]));
            for c in 0..channels {
                output[layout.offset(c, i)] = value;
            }
        }
    }

    Ok(output)
}
