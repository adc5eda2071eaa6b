use crate::bbox::{InkPolarity, InkRule};
use crate::errors::{PreprocessError, Result};
use crate::layout::LayoutSpec;
use crate::normalize::NormalizationMode;

pub const DEFAULT_INPUT_SIZE: (u32, u32) = (28, 28);
pub const DEFAULT_MARGIN: f32 = 1.2;
/// Largest accepted padding factor around the ink.
pub const MAX_MARGIN: f32 = 4.0;

/// Red channel below this counts as ink on the white drawing canvas.
pub const CANVAS_INK_THRESHOLD: u16 = 250;
pub const CANVAS_BINARIZE_CUTOFF: f32 = 0.0;

pub const MNIST_MEAN: f32 = 0.1307;
pub const MNIST_STD: f32 = 0.3081;
pub const MNIST_DIGIT_SIZE: u32 = 20;
/// R + G + B above this counts as ink on a black background.
pub const MNIST_INK_THRESHOLD: u16 = 48;

/// How the ink region lands in the output grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Centering {
    /// Resample the region straight to `H x W`.
    Direct,
    /// Resample to `digit_size` square, then paste it into the middle of a
    /// background-filled `H x W` canvas.
    TwoStage { digit_size: u32 },
}

/// Preprocessing settings for one trained model. Built once, then read-only.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PipelineConfig {
    pub ink: InkRule,
    pub margin: f32,
    pub centering: Centering,
    pub layout: LayoutSpec,
    pub normalization: NormalizationMode,
}

impl PipelineConfig {
    /// Dark strokes on a white canvas, hard-binarized so ink is 1.0.
    pub fn freehand_canvas(layout: LayoutSpec) -> Self {
        Self {
            ink: InkRule::dark_on_light(CANVAS_INK_THRESHOLD),
            margin: DEFAULT_MARGIN,
            centering: Centering::Direct,
            layout,
            normalization: NormalizationMode::binarize(CANVAS_BINARIZE_CUTOFF, true),
        }
    }

    /// Light strokes on black, fitted to 20x20 and standardized like MNIST.
    pub fn mnist(layout: LayoutSpec) -> Self {
        Self {
            ink: InkRule::light_on_dark(MNIST_INK_THRESHOLD),
            margin: DEFAULT_MARGIN,
            centering: Centering::TwoStage {
                digit_size: MNIST_DIGIT_SIZE,
            },
            layout,
            normalization: NormalizationMode::standardize(MNIST_MEAN, MNIST_STD),
        }
    }

    /// Look up a preset by name (`canvas` or `mnist`).
    pub fn preset(name: &str, layout: LayoutSpec) -> Result<Self> {
        match name.trim().to_lowercase().as_str() {
            "canvas" | "freehand" => Ok(Self::freehand_canvas(layout)),
            "mnist" => Ok(Self::mnist(layout)),
            other => Err(PreprocessError::InvalidConfig(format!(
                "{} is not a known preset. Use either `canvas` or `mnist`.",
                other
            ))),
        }
    }

    /// Background color implied by the ink polarity.
    pub fn background(&self) -> [u8; 3] {
        self.ink.polarity.background()
    }

    pub fn validate(&self) -> Result<()> {
        if !self.margin.is_finite() || self.margin <= 1.0 || self.margin > MAX_MARGIN {
            return Err(PreprocessError::InvalidConfig(format!(
                "Margin must be a factor in (1.0, {}] (got {})",
                MAX_MARGIN, self.margin
            )));
        }

        let max_threshold = match self.ink.polarity {
            InkPolarity::DarkOnLight => 256,
            InkPolarity::LightOnDark => 765,
        };
        if self.ink.threshold > max_threshold {
            return Err(PreprocessError::InvalidConfig(format!(
                "Ink threshold {} is out of range for {:?} (max {})",
                self.ink.threshold, self.ink.polarity, max_threshold
            )));
        }

        if let Centering::TwoStage { digit_size: 0 } = self.centering {
            return Err(PreprocessError::InvalidConfig(
                "Two-stage digit size must be at least 1".to_string(),
            ));
        }

        self.normalization.validate()
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::freehand_canvas(LayoutSpec::default())
    }
}
