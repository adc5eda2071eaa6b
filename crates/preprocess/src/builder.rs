use crate::bbox::BoundingBox;
use crate::config::{Centering, PipelineConfig};
use crate::errors::Result;
use crate::layout::{LayoutSpec, Tensor};
use crate::normalize::{NormalizationMode, normalize_into_layout};
use crate::raster::Raster;
use crate::region::Region;
use common::span;
use fast_image_resize::{
    FilterType, PixelType, ResizeAlg, ResizeOptions, Resizer,
    images::{Image, ImageRef},
};

/// Turns a raster and its ink box into the model's input tensor.
///
/// Holds only configuration; every call allocates its own buffers.
#[derive(Debug, Clone, Copy)]
pub struct TensorBuilder {
    layout: LayoutSpec,
    normalization: NormalizationMode,
    centering: Centering,
    margin: f32,
    background: [u8; 3],
}

impl TensorBuilder {
    /// Fails with `InvalidConfig` when `config` does not validate.
    pub fn new(config: &PipelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            layout: config.layout,
            normalization: config.normalization,
            centering: config.centering,
            margin: config.margin,
            background: config.background(),
        })
    }

    pub fn layout(&self) -> &LayoutSpec {
        &self.layout
    }

    /// Resolve the region, resample it to the target grid, then normalize.
    ///
    /// `None` for `bbox` means no ink was found and the whole raster is used.
    pub fn build(&self, raster: &Raster, bbox: Option<&BoundingBox>) -> Result<Tensor> {
        let _s = span!("build_tensor");

        let region = Region::resolve(bbox, raster, self.margin);
        let source = region.extract_rgb(raster, self.background);

        let grid = self.resample(&source, region.width, region.height)?;
        let values = normalize_into_layout(&grid, &self.layout, &self.normalization)?;

        let tensor = Tensor::from_vec(self.layout, values)?;
        tracing::trace!(shape = ?tensor.shape(), "Built input tensor");
        Ok(tensor)
    }

    /// Packed RGB at exactly `H x W`.
    fn resample(&self, source: &[u8], width: u32, height: u32) -> Result<Vec<u8>> {
        let _s = span!("resample");
        let (target_w, target_h) = (self.layout.width, self.layout.height);

        match self.centering {
            Centering::Direct => resize(source, width, height, target_w, target_h),
            Centering::TwoStage { digit_size } => {
                let digit_w = digit_size.min(target_w).max(1);
                let digit_h = digit_size.min(target_h).max(1);
                let digit = resize(source, width, height, digit_w, digit_h)?;
                Ok(self.paste_centered(&digit, digit_w, digit_h))
            }
        }
    }

    /// Center a small RGB image on a background-filled target canvas.
    fn paste_centered(&self, digit: &[u8], width: u32, height: u32) -> Vec<u8> {
        let (target_w, target_h) = (self.layout.width, self.layout.height);
        let mut canvas: Vec<u8> = self
            .background
            .iter()
            .copied()
            .cycle()
            .take(self.layout.spatial() * 3)
            .collect();

        let offset_x = (target_w - width) / 2;
        let offset_y = (target_h - height) / 2;
        let stride = target_w * 3;
        let row_len = (width * 3) as usize;

        for y in 0..height {
            let src_row = (y * width * 3) as usize;
            let dst_row = ((y + offset_y) * stride + offset_x * 3) as usize;

            canvas[dst_row..dst_row + row_len].copy_from_slice(&digit[src_row..src_row + row_len]);
        }

        canvas
    }
}

fn resize(
    pixels: &[u8],
    width: u32,
    height: u32,
    dst_width: u32,
    dst_height: u32,
) -> Result<Vec<u8>> {
    let src = ImageRef::new(width, height, pixels, PixelType::U8x3)?;
    let mut dst = Image::new(dst_width, dst_height, PixelType::U8x3);

    Resizer::new().resize(
        &src,
        &mut dst,
        &ResizeOptions::new().resize_alg(ResizeAlg::Convolution(FilterType::Bilinear)),
    )?;

    Ok(dst.buffer().to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    const WHITE: [u8; 4] = [255, 255, 255, 255];
    const BLACK: [u8; 4] = [0, 0, 0, 255];

    #[test]
    fn test_rejects_unvalidated_config() {
        for margin in [1e5, f32::INFINITY, 0.5] {
            let config = PipelineConfig {
                margin,
                ..PipelineConfig::default()
            };
            assert!(
                matches!(
                    TensorBuilder::new(&config),
                    Err(crate::errors::PreprocessError::InvalidConfig(_))
                ),
                "Margin {} should not build",
                margin
            );
        }
    }

    #[test]
    fn test_output_shape_matches_layout() {
        let raster = Raster::filled(64, 48, WHITE).unwrap();
        for layout in [
            LayoutSpec::nchw(1, 28, 28).unwrap(),
            LayoutSpec::nchw(3, 32, 24).unwrap(),
            LayoutSpec::nhwc(20, 20, 3).unwrap(),
        ] {
            let builder = TensorBuilder::new(&PipelineConfig::freehand_canvas(layout)).unwrap();
            let tensor = builder.build(&raster, None).unwrap();

            assert_eq!(tensor.shape(), &layout.shape());
            assert_eq!(tensor.as_slice().len(), layout.len());
        }
    }

    #[test]
    fn test_blank_canvas_binarizes_to_zero() {
        let raster = Raster::filled(40, 40, WHITE).unwrap();
        let builder = TensorBuilder::new(&PipelineConfig::default()).unwrap();

        let tensor = builder.build(&raster, None).unwrap();
        assert!(
            tensor.as_slice().iter().all(|&v| v == 0.0),
            "White canvas should carry no ink"
        );
    }

    #[test]
    fn test_full_ink_square_fills_center() {
        // Ink covering the whole raster: the margin pads background on every side
        let raster = Raster::filled(50, 50, BLACK).unwrap();
        let builder = TensorBuilder::new(&PipelineConfig::default()).unwrap();
        let bbox = BoundingBox::full(&raster);

        let tensor = builder.build(&raster, Some(&bbox)).unwrap();
        assert_eq!(tensor.at(0, 14, 14), 1.0, "Center should be ink");
        assert_eq!(tensor.at(0, 0, 0), 0.0, "Corner should be padding");
    }

    #[test]
    fn test_two_stage_leaves_border_background() {
        let raster = Raster::filled(40, 40, BLACK)
            .unwrap()
            .with_rect(10, 10, 20, 20, WHITE);
        let config = PipelineConfig::mnist(LayoutSpec::default());
        let builder = TensorBuilder::new(&config).unwrap();
        let bbox = BoundingBox::new(10, 10, 29, 29).unwrap();

        let tensor = builder.build(&raster, Some(&bbox)).unwrap();
        let background = config.normalization.apply(0.0);

        // 20x20 digit pasted at offset 4 inside 28x28
        for i in 0..28 {
            for edge in [0, 1, 2, 3, 24, 25, 26, 27] {
                assert_eq!(tensor.at(0, edge, i), background);
                assert_eq!(tensor.at(0, i, edge), background);
            }
        }
        assert!(tensor.at(0, 14, 14) > 2.0, "Center should be bright ink");
    }

    #[test]
    fn test_two_stage_digit_clamped_to_small_targets() {
        let raster = Raster::filled(16, 16, BLACK).unwrap();
        let layout = LayoutSpec::nchw(1, 8, 12).unwrap();
        let builder = TensorBuilder::new(&PipelineConfig::mnist(layout)).unwrap();

        let tensor = builder.build(&raster, None).unwrap();
        assert_eq!(tensor.shape(), &[1, 1, 8, 12]);
    }
}
