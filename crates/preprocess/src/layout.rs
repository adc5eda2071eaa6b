use crate::config::DEFAULT_INPUT_SIZE;
use crate::errors::{PreprocessError, Result};
use ndarray::{ArrayD, IxDyn};
use std::fmt;

/// Memory ordering of the channel axis relative to the spatial axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelOrder {
    /// `[1, C, H, W]`
    ChannelsFirst,
    /// `[1, H, W, C]`
    ChannelsLast,
}

impl ChannelOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChannelOrder::ChannelsFirst => "NCHW",
            ChannelOrder::ChannelsLast => "NHWC",
        }
    }

    pub fn parse(value: &str) -> Result<Self> {
        match value.trim().to_uppercase().as_str() {
            "NCHW" | "CHW" => Ok(ChannelOrder::ChannelsFirst),
            "NHWC" | "HWC" => Ok(ChannelOrder::ChannelsLast),
            other => Err(PreprocessError::InvalidLayout(format!(
                "{} is not a supported channel order. Use either `NCHW` or `NHWC`.",
                other
            ))),
        }
    }
}

impl fmt::Display for ChannelOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Input geometry the model expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutSpec {
    pub channels: usize,
    pub height: u32,
    pub width: u32,
    pub order: ChannelOrder,
}

impl LayoutSpec {
    pub fn new(channels: usize, height: u32, width: u32, order: ChannelOrder) -> Result<Self> {
        if channels == 0 || height == 0 || width == 0 {
            return Err(PreprocessError::InvalidLayout(format!(
                "Every dimension must be at least 1 (got C={} H={} W={})",
                channels, height, width
            )));
        }
        Ok(Self {
            channels,
            height,
            width,
            order,
        })
    }

    pub fn nchw(channels: usize, height: u32, width: u32) -> Result<Self> {
        Self::new(channels, height, width, ChannelOrder::ChannelsFirst)
    }

    pub fn nhwc(height: u32, width: u32, channels: usize) -> Result<Self> {
        Self::new(channels, height, width, ChannelOrder::ChannelsLast)
    }

    /// Derive the layout from a model's reported input dimensions.
    ///
    /// Symbolic or non-positive dimensions count as 1. A 4-D input whose
    /// second axis is at most 4 is read as `NCHW`, anything else as `NHWC`.
    /// Inputs that are not 4-D fall back to the default 1x28x28 `NCHW`.
    pub fn from_input_dims(dims: &[i64]) -> Result<Self> {
        let dims: Vec<u32> = dims
            .iter()
            .map(|&d| if d > 0 { d.min(u32::MAX as i64) as u32 } else { 1 })
            .collect();

        let layout = match dims.as_slice() {
            [_, c, h, w] if *c <= 4 => Self::nchw(*c as usize, *h, *w)?,
            [_, h, w, c] => Self::nhwc(*h, *w, *c as usize)?,
            _ => Self::default(),
        };

        tracing::debug!(
            ?dims,
            order = %layout.order,
            channels = layout.channels,
            height = layout.height,
            width = layout.width,
            "Resolved input layout"
        );

        Ok(layout)
    }

    /// Number of scalars in one image.
    pub fn len(&self) -> usize {
        self.channels * self.spatial()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of spatial positions (`H * W`).
    pub fn spatial(&self) -> usize {
        self.height as usize * self.width as usize
    }

    pub fn shape(&self) -> [usize; 4] {
        let (c, h, w) = (self.channels, self.height as usize, self.width as usize);
        match self.order {
            ChannelOrder::ChannelsFirst => [1, c, h, w],
            ChannelOrder::ChannelsLast => [1, h, w, c],
        }
    }

    /// Flat offset of `channel` at spatial position `index` (`y * W + x`).
    pub fn offset(&self, channel: usize, index: usize) -> usize {
        match self.order {
            ChannelOrder::ChannelsFirst => channel * self.spatial() + index,
            ChannelOrder::ChannelsLast => index * self.channels + channel,
        }
    }
}

impl Default for LayoutSpec {
    fn default() -> Self {
        Self {
            channels: 1,
            height: DEFAULT_INPUT_SIZE.1,
            width: DEFAULT_INPUT_SIZE.0,
            order: ChannelOrder::ChannelsFirst,
        }
    }
}

/// Model input for a single image: a contiguous float32 buffer plus its shape.
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor {
    data: ArrayD<f32>,
    layout: LayoutSpec,
}

impl Tensor {
    pub(crate) fn from_vec(layout: LayoutSpec, values: Vec<f32>) -> Result<Self> {
        let data = ArrayD::from_shape_vec(IxDyn(&layout.shape()), values)?;
        Ok(Self { data, layout })
    }

    pub fn layout(&self) -> &LayoutSpec {
        &self.layout
    }

    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }

    /// Shape descriptor in the signed form inference engines take.
    pub fn dims(&self) -> [i64; 4] {
        self.layout.shape().map(|d| d as i64)
    }

    /// Flat buffer in memory order.
    pub fn as_slice(&self) -> &[f32] {
        // built from a Vec in standard order, so this is always contiguous
        self.data.as_slice().unwrap_or_default()
    }

    pub fn array(&self) -> &ArrayD<f32> {
        &self.data
    }

    pub fn into_array(self) -> ArrayD<f32> {
        self.data
    }

    /// Value at `(channel, y, x)` regardless of channel order.
    pub fn at(&self, channel: usize, y: usize, x: usize) -> f32 {
        match self.layout.order {
            ChannelOrder::ChannelsFirst => self.data[IxDyn(&[0, channel, y, x])],
            ChannelOrder::ChannelsLast => self.data[IxDyn(&[0, y, x, channel])],
        }
    }

    /// ASCII rendering of the first channel, darkest to brightest value.
    pub fn preview(&self) -> String {
        const RAMP: &[u8] = b" .:-=+*#%@";

        let (h, w) = (self.layout.height as usize, self.layout.width as usize);
        let (min, max) = (0..h * w)
            .map(|i| self.at(0, i / w, i % w))
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), v| {
                (lo.min(v), hi.max(v))
            });
        let range = max - min;

        let mut out = String::with_capacity(h * (w + 1));
        for y in 0..h {
            for x in 0..w {
                let level = if range > 0.0 {
                    ((self.at(0, y, x) - min) / range * (RAMP.len() - 1) as f32).round() as usize
                } else {
                    0
                };
                out.push(RAMP[level.min(RAMP.len() - 1)] as char);
            }
            out.push('\n');
        }
        out
    }
}
