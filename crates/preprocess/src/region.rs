use crate::bbox::BoundingBox;
use crate::config::MAX_MARGIN;
use crate::raster::Raster;
use common::span_debug;

/// Source window to resample, in raster coordinates.
///
/// The window may extend past the raster edges; samples out there read as
/// the background color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub x: i64,
    pub y: i64,
    pub width: u32,
    pub height: u32,
}

impl Region {
    pub fn full(raster: &Raster) -> Self {
        Self {
            x: 0,
            y: 0,
            width: raster.width(),
            height: raster.height(),
        }
    }

    /// Square window of side `max(w, h) * margin` centered on the ink, or the
    /// whole raster when there is no ink.
    ///
    /// The side never exceeds `MAX_MARGIN` times the raster's longer edge.
    pub fn resolve(bbox: Option<&BoundingBox>, raster: &Raster, margin: f32) -> Self {
        let _s = span_debug!("resolve_region");

        let Some(bbox) = bbox else {
            return Self::full(raster);
        };

        let (cx, cy) = bbox.center();
        let max_side = bbox.width().max(bbox.height());
        let limit = (raster.width().max(raster.height()) as f64 * MAX_MARGIN as f64)
            .min(u32::MAX as f64) as u32;
        let side = ((max_side as f32 * margin).round() as u32)
            .max(max_side)
            .min(limit)
            .max(1);
        let half = side as f32 / 2.0;

        let region = Self {
            x: (cx - half).round() as i64,
            y: (cy - half).round() as i64,
            width: side,
            height: side,
        };

        tracing::trace!(
            x = region.x,
            y = region.y,
            side,
            "Resolved square region around ink"
        );

        region
    }

    /// Copy the window out as packed RGB, filling uncovered samples with `background`.
    pub fn extract_rgb(&self, raster: &Raster, background: [u8; 3]) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.width as usize * self.height as usize * 3);

        for row in 0..self.height as i64 {
            let sy = self.y + row;
            for col in 0..self.width as i64 {
                let sx = self.x + col;
                let rgb = if sx < 0 || sy < 0 || sx > u32::MAX as i64 || sy > u32::MAX as i64 {
                    background
                } else {
                    raster.rgb_over(sx as u32, sy as u32, background)
                };
                out.extend_from_slice(&rgb);
            }
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WHITE: [u8; 4] = [255, 255, 255, 255];
    const BLACK: [u8; 4] = [0, 0, 0, 255];

    #[test]
    fn test_no_ink_uses_full_raster() {
        let raster = Raster::filled(30, 20, WHITE).unwrap();
        assert_eq!(
            Region::resolve(None, &raster, 1.2),
            Region {
                x: 0,
                y: 0,
                width: 30,
                height: 20
            }
        );
    }

    #[test]
    fn test_square_region_with_margin() {
        let raster = Raster::filled(320, 320, WHITE).unwrap();
        let bbox = BoundingBox::new(140, 150, 179, 169).unwrap();

        let region = Region::resolve(Some(&bbox), &raster, 1.2);
        assert_eq!(region.width, 48, "Side is the longer edge times the margin");
        assert_eq!(region.height, 48);
        assert_eq!((region.x, region.y), (136, 136));
    }

    #[test]
    fn test_single_pixel_ink_never_collapses() {
        let raster = Raster::filled(10, 10, WHITE).unwrap();
        let bbox = BoundingBox::new(0, 0, 0, 0).unwrap();

        let region = Region::resolve(Some(&bbox), &raster, 1.2);
        assert!(region.width >= 1 && region.height >= 1);
    }

    #[test]
    fn test_side_is_capped_by_raster_size() {
        let raster = Raster::filled(320, 320, WHITE).unwrap();
        let bbox = BoundingBox::new(140, 140, 179, 179).unwrap();

        for margin in [1e5, f32::INFINITY] {
            let region = Region::resolve(Some(&bbox), &raster, margin);
            assert_eq!(region.width, 1280, "Side should stop at 4x the raster");
            assert_eq!(region.height, 1280);
        }
    }

    #[test]
    fn test_box_far_outside_raster_stays_bounded() {
        let raster = Raster::filled(10, 10, WHITE).unwrap();
        let bbox = BoundingBox::new(0, 0, u32::MAX, u32::MAX).unwrap();

        let region = Region::resolve(Some(&bbox), &raster, 1.2);
        assert_eq!((region.width, region.height), (40, 40));
    }

    #[test]
    fn test_extract_pads_outside_with_background() {
        let raster = Raster::filled(2, 2, BLACK).unwrap();
        let region = Region {
            x: -1,
            y: 0,
            width: 2,
            height: 1,
        };

        let rgb = region.extract_rgb(&raster, [255, 255, 255]);
        assert_eq!(rgb, vec![255, 255, 255, 0, 0, 0]);
    }
}
