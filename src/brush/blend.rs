//! Blend engine - applies one brush stamp to the pixel buffer
//!
//! Each tool is a `BlendStrategy`. The stamp loop walks the tip's bounding
//! square (clipped to the buffer) and hands every covered texel to the
//! strategy with `coverage = tip_alpha * opacity`.

use super::{BrushConfig, BrushTip, BrushTool};
use crate::input::CanvasPoint;
use crate::surface::{DirtyRect, PixelBuffer};
use image::{Rgba, RgbaImage};

/// Per-texel compositing rule for a brush tool
pub trait BlendStrategy {
    /// Composite one buffer texel at `(x, y)`. `coverage` is in (0, 1].
    fn blend(&self, dst: &mut Rgba<u8>, x: u32, y: u32, coverage: f32);
}

/// Multiplies destination alpha by `1 - coverage`; colour is left alone
#[derive(Debug, Clone, Copy, Default)]
pub struct EraseBlend;

impl BlendStrategy for EraseBlend {
    #[inline]
    fn blend(&self, dst: &mut Rgba<u8>, _x: u32, _y: u32, coverage: f32) {
        let alpha = dst.0[3] as f32 * (1.0 - coverage);
        dst.0[3] = quantize_toward(dst.0[3], alpha);
    }
}

/// Source-over of the original image, stencilled by the tip
#[derive(Debug, Clone, Copy)]
pub struct RestoreBlend<'a> {
    source: &'a RgbaImage,
}

impl<'a> RestoreBlend<'a> {
    pub fn new(source: &'a RgbaImage) -> Self {
        Self { source }
    }
}

impl BlendStrategy for RestoreBlend<'_> {
    #[inline]
    fn blend(&self, dst: &mut Rgba<u8>, x: u32, y: u32, coverage: f32) {
        // Texels outside the original have nothing to restore
        let Some(src) = self.source.get_pixel_checked(x, y) else {
            return;
        };

        let src_a = src.0[3] as f32 / 255.0 * coverage;
        if src_a <= 0.0 {
            return;
        }
        let dst_a = dst.0[3] as f32 / 255.0;
        let out_a = src_a + dst_a * (1.0 - src_a);

        for c in 0..3 {
            let s = src.0[c] as f32;
            let d = dst.0[c] as f32;
            let out = (s * src_a + d * dst_a * (1.0 - src_a)) / out_a;
            dst.0[c] = quantize_toward(dst.0[c], out);
        }
        dst.0[3] = quantize_toward(dst.0[3], out_a * 255.0);
    }
}

/// Round `exact` to a channel value, moving at least one step off `current`
/// whenever `exact` has moved. Plain rounding would let repeated low-coverage
/// stamps stall short of their target.
#[inline]
fn quantize_toward(current: u8, exact: f32) -> u8 {
    const EPSILON: f32 = 1e-3;
    let rounded = exact.round().clamp(0.0, 255.0) as u8;
    if rounded != current {
        rounded
    } else if exact > current as f32 + EPSILON {
        current.saturating_add(1)
    } else if exact < current as f32 - EPSILON {
        current.saturating_sub(1)
    } else {
        current
    }
}

/// Apply one stamp centred at `center` using the tool selected in `config`.
///
/// Restore without an original image is a no-op. Returns the clipped
/// footprint that was visited, or `None` when nothing could be touched.
pub fn stamp(
    buffer: &mut PixelBuffer,
    tip: &BrushTip,
    center: CanvasPoint,
    config: &BrushConfig,
    original: Option<&RgbaImage>,
) -> Option<DirtyRect> {
    let opacity = config.opacity_factor();
    match config.tool {
        BrushTool::Erase => stamp_with(buffer, tip, center, opacity, &EraseBlend),
        BrushTool::Restore => {
            let source = original?;
            stamp_with(buffer, tip, center, opacity, &RestoreBlend::new(source))
        }
    }
}

/// Stamp loop shared by every strategy
pub(crate) fn stamp_with<B: BlendStrategy + ?Sized>(
    buffer: &mut PixelBuffer,
    tip: &BrushTip,
    center: CanvasPoint,
    opacity: f32,
    strategy: &B,
) -> Option<DirtyRect> {
    if !center.x.is_finite() || !center.y.is_finite() {
        return None;
    }

    let size = tip.size() as i64;
    // Tip top-left snaps to the nearest whole pixel
    let left = (center.x - tip.radius()).round() as i64;
    let top = (center.y - tip.radius()).round() as i64;

    let x0 = left.max(0);
    let y0 = top.max(0);
    let x1 = left.saturating_add(size).min(buffer.width() as i64);
    let y1 = top.saturating_add(size).min(buffer.height() as i64);

    if x0 >= x1 || y0 >= y1 {
        return None;
    }

    let image = buffer.image_mut();
    for y in y0..y1 {
        let tip_y = (y - top) as u32;
        for x in x0..x1 {
            let tip_alpha = tip.alpha((x - left) as u32, tip_y);
            if tip_alpha == 0 {
                continue;
            }
            let coverage = tip_alpha as f32 / 255.0 * opacity;
            let (bx, by) = (x as u32, y as u32);
            strategy.blend(image.get_pixel_mut(bx, by), bx, by, coverage);
        }
    }

    Some(DirtyRect::new(
        x0 as u32,
        y0 as u32,
        (x1 - x0) as u32,
        (y1 - y0) as u32,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opaque_buffer(width: u32, height: u32) -> PixelBuffer {
        PixelBuffer::new(RgbaImage::from_pixel(width, height, Rgba([40, 80, 120, 255])))
    }

    fn erase_config(size: u32, opacity: u32) -> BrushConfig {
        BrushConfig {
            size,
            hardness: 100,
            opacity,
            tool: BrushTool::Erase,
        }
    }

    #[test]
    fn test_hard_erase_punches_hole() {
        let mut buffer = opaque_buffer(100, 100);
        let config = erase_config(20, 100);
        let tip = BrushTip::generate(config.size, config.hardness);

        let dirty = stamp(&mut buffer, &tip, CanvasPoint::new(50.0, 50.0), &config, None);

        assert_eq!(dirty, Some(DirtyRect::new(40, 40, 20, 20)));
        assert_eq!(buffer.pixel(50, 50).0[3], 0);
        // Colour channels survive the erase
        assert_eq!(buffer.pixel(50, 50).0[..3], [40, 80, 120]);
        // Outside the 20 px disc
        assert_eq!(buffer.pixel(50, 80).0[3], 255);
        assert_eq!(buffer.pixel(40, 40).0[3], 255);
    }

    #[test]
    fn test_partial_opacity_scales_erase() {
        let mut buffer = opaque_buffer(40, 40);
        let config = erase_config(10, 50);
        let tip = BrushTip::generate(config.size, config.hardness);

        stamp(&mut buffer, &tip, CanvasPoint::new(20.0, 20.0), &config, None);
        let once = buffer.pixel(20, 20).0[3];
        assert!((127..=128).contains(&once), "alpha {}", once);

        stamp(&mut buffer, &tip, CanvasPoint::new(20.0, 20.0), &config, None);
        let twice = buffer.pixel(20, 20).0[3];
        assert!(twice < once);
    }

    #[test]
    fn test_repeated_erase_reaches_transparency() {
        let mut buffer = opaque_buffer(20, 20);
        let config = erase_config(10, 100);
        let tip = BrushTip::generate(config.size, config.hardness);

        for _ in 0..3 {
            stamp(&mut buffer, &tip, CanvasPoint::new(10.0, 10.0), &config, None);
            assert_eq!(buffer.pixel(10, 10).0[3], 0);
        }
    }

    #[test]
    fn test_low_opacity_erase_converges_to_transparent() {
        for opacity in [10, 1] {
            let mut buffer = opaque_buffer(20, 20);
            let config = erase_config(10, opacity);
            let tip = BrushTip::generate(config.size, config.hardness);

            for _ in 0..500 {
                stamp(&mut buffer, &tip, CanvasPoint::new(10.0, 10.0), &config, None);
            }
            assert_eq!(buffer.pixel(10, 10).0[3], 0, "opacity {}", opacity);
        }
    }

    #[test]
    fn test_low_opacity_restore_converges_to_original() {
        let original = RgbaImage::from_pixel(20, 20, Rgba([250, 240, 230, 255]));
        for opacity in [10, 1] {
            let mut buffer = PixelBuffer::new(RgbaImage::from_fn(20, 20, |x, _| {
                // Left half erased, right half opaque black
                if x < 10 {
                    Rgba([250, 240, 230, 0])
                } else {
                    Rgba([0, 0, 0, 255])
                }
            }));
            let config = BrushConfig {
                tool: BrushTool::Restore,
                ..erase_config(20, opacity)
            };
            let tip = BrushTip::generate(config.size, config.hardness);

            for _ in 0..500 {
                stamp(
                    &mut buffer,
                    &tip,
                    CanvasPoint::new(10.0, 10.0),
                    &config,
                    Some(&original),
                );
            }
            assert_eq!(buffer.pixel(8, 10), original.get_pixel(8, 10), "opacity {}", opacity);
            assert_eq!(buffer.pixel(12, 10), original.get_pixel(12, 10), "opacity {}", opacity);
        }
    }

    #[test]
    fn test_quantize_toward_always_moves() {
        assert_eq!(quantize_toward(5, 4.5), 4);
        assert_eq!(quantize_toward(50, 49.5), 49);
        assert_eq!(quantize_toward(206, 206.49), 207);
        assert_eq!(quantize_toward(255, 127.5), 128);
        assert_eq!(quantize_toward(100, 100.0), 100);
        assert_eq!(quantize_toward(0, 0.0), 0);
        assert_eq!(quantize_toward(255, 255.0), 255);
    }

    #[test]
    fn test_non_finite_or_huge_center_is_noop() {
        let mut buffer = opaque_buffer(30, 30);
        let before = buffer.clone();
        let config = erase_config(10, 100);
        let tip = BrushTip::generate(config.size, config.hardness);

        for center in [
            CanvasPoint::new(f32::NAN, 10.0),
            CanvasPoint::new(10.0, f32::INFINITY),
            CanvasPoint::new(f32::NEG_INFINITY, 10.0),
            CanvasPoint::new(1e30, 1e30),
            CanvasPoint::new(-1e30, 10.0),
        ] {
            assert!(stamp(&mut buffer, &tip, center, &config, None).is_none());
        }
        assert_eq!(buffer, before);
    }

    #[test]
    fn test_stamp_clips_at_edges() {
        let mut buffer = opaque_buffer(30, 30);
        let config = erase_config(20, 100);
        let tip = BrushTip::generate(config.size, config.hardness);

        let dirty = stamp(&mut buffer, &tip, CanvasPoint::new(0.0, 0.0), &config, None);
        assert_eq!(dirty, Some(DirtyRect::new(0, 0, 10, 10)));
        assert_eq!(buffer.pixel(0, 0).0[3], 0);
        // Nothing wrapped to the far side
        assert_eq!(buffer.pixel(29, 29).0[3], 255);
        assert_eq!(buffer.pixel(29, 0).0[3], 255);
    }

    #[test]
    fn test_stamp_fully_outside_is_noop() {
        let mut buffer = opaque_buffer(30, 30);
        let before = buffer.clone();
        let config = erase_config(10, 100);
        let tip = BrushTip::generate(config.size, config.hardness);

        assert!(stamp(&mut buffer, &tip, CanvasPoint::new(-50.0, 10.0), &config, None).is_none());
        assert!(stamp(&mut buffer, &tip, CanvasPoint::new(10.0, 500.0), &config, None).is_none());
        assert_eq!(buffer, before);
    }

    #[test]
    fn test_restore_without_original_is_noop() {
        let mut buffer = opaque_buffer(30, 30);
        let before = buffer.clone();
        let config = BrushConfig {
            tool: BrushTool::Restore,
            ..erase_config(10, 100)
        };
        let tip = BrushTip::generate(config.size, config.hardness);

        assert!(stamp(&mut buffer, &tip, CanvasPoint::new(15.0, 15.0), &config, None).is_none());
        assert_eq!(buffer, before);
    }

    #[test]
    fn test_restore_copies_original_through_stencil() {
        let original = RgbaImage::from_pixel(30, 30, Rgba([200, 10, 10, 255]));
        let mut buffer = PixelBuffer::new(RgbaImage::new(30, 30));
        let config = BrushConfig {
            tool: BrushTool::Restore,
            ..erase_config(10, 100)
        };
        let tip = BrushTip::generate(config.size, config.hardness);

        stamp(
            &mut buffer,
            &tip,
            CanvasPoint::new(15.0, 15.0),
            &config,
            Some(&original),
        );

        assert_eq!(*buffer.pixel(15, 15), Rgba([200, 10, 10, 255]));
        // Outside the stencil stays transparent
        assert_eq!(buffer.pixel(2, 2).0[3], 0);
    }

    #[test]
    fn test_restore_blends_over_existing_pixels() {
        let original = RgbaImage::from_pixel(10, 10, Rgba([255, 255, 255, 255]));
        let mut dst = Rgba([0, 0, 0, 255]);
        RestoreBlend::new(&original).blend(&mut dst, 1, 1, 0.5);
        assert_eq!(dst.0[3], 255);
        assert!((127..=128).contains(&dst.0[0]), "got {:?}", dst);
    }

    #[test]
    fn test_restore_outside_original_bounds_is_skipped() {
        let original = RgbaImage::from_pixel(5, 5, Rgba([255, 0, 0, 255]));
        let mut dst = Rgba([1, 2, 3, 4]);
        RestoreBlend::new(&original).blend(&mut dst, 8, 8, 1.0);
        assert_eq!(dst, Rgba([1, 2, 3, 4]));
    }

    #[test]
    fn test_erase_then_restore_round_trip() {
        let photo = RgbaImage::from_fn(60, 60, |x, y| Rgba([x as u8 * 3, y as u8 * 4, 90, 255]));
        let mut buffer = PixelBuffer::new(photo.clone());
        let tip = BrushTip::generate(16, 100);
        let center = CanvasPoint::new(30.0, 30.0);

        let erase = erase_config(16, 100);
        stamp(&mut buffer, &tip, center, &erase, Some(&photo));
        assert_eq!(buffer.pixel(30, 30).0[3], 0);

        let restore = BrushConfig {
            tool: BrushTool::Restore,
            ..erase
        };
        stamp(&mut buffer, &tip, center, &restore, Some(&photo));
        assert_eq!(buffer.image(), &photo);
    }
}
