use crate::bbox::BoundingBoxExtractor;
use crate::builder::TensorBuilder;
use crate::config::PipelineConfig;
use crate::errors::Result;
use crate::layout::Tensor;
use crate::raster::Raster;
use common::span;

/// Raster in, model tensor out.
///
/// Stateless apart from its configuration, so one instance can be shared
/// across threads; each call works on its own raster snapshot.
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: PipelineConfig,
    extractor: BoundingBoxExtractor,
    builder: TensorBuilder,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Result<Self> {
        Ok(Self {
            config,
            extractor: BoundingBoxExtractor::new(config.ink),
            builder: TensorBuilder::new(&config)?,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn run(&self, raster: &Raster) -> Result<Tensor> {
        let _s = span!("preprocess_raster");

        tracing::trace!(
            width = raster.width(),
            height = raster.height(),
            "Preprocessing raster dimensions"
        );

        let bbox = self.extractor.extract(raster);
        if bbox.is_none() {
            tracing::debug!("No ink detected, using the full raster");
        }

        self.builder.build(raster, bbox.as_ref())
    }

    /// Same as [`Pipeline::run`] for a raw RGBA capture buffer.
    pub fn run_rgba(&self, pixels: &[u8], width: u32, height: u32) -> Result<Tensor> {
        let raster = Raster::from_rgba(width, height, pixels.to_vec())?;
        self.run(&raster)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::PreprocessError;
    use crate::layout::LayoutSpec;

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = PipelineConfig {
            margin: 0.5,
            ..PipelineConfig::default()
        };
        assert!(matches!(
            Pipeline::new(config),
            Err(PreprocessError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_run_rgba_rejects_short_buffer() {
        let pipeline = Pipeline::new(PipelineConfig::default()).unwrap();
        let result = pipeline.run_rgba(&[255u8; 10], 2, 2);
        assert!(matches!(result, Err(PreprocessError::InvalidRaster(_))));
    }

    #[test]
    fn test_run_rgba_rejects_zero_size() {
        let pipeline = Pipeline::new(PipelineConfig::default()).unwrap();
        let result = pipeline.run_rgba(&[], 0, 0);
        assert!(matches!(result, Err(PreprocessError::InvalidRaster(_))));
    }

    #[test]
    fn test_pipeline_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Pipeline>();
    }

    #[test]
    fn test_run_on_ink_produces_layout_shape() {
        let layout = LayoutSpec::nhwc(28, 28, 3).unwrap();
        let pipeline = Pipeline::new(PipelineConfig::freehand_canvas(layout)).unwrap();
        let raster = Raster::filled(64, 64, [255, 255, 255, 255])
            .unwrap()
            .with_rect(20, 10, 8, 40, [0, 0, 0, 255]);

        let tensor = pipeline.run(&raster).unwrap();
        assert_eq!(tensor.shape(), &[1, 28, 28, 3]);
        assert!(tensor.as_slice().iter().any(|&v| v == 1.0));
    }
}
