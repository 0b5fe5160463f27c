//! # Display Surface
//!
//! The drawing target that control visuals blit into.
//!
//! Widgets only ever talk to the [`Surface`] trait, which keeps the renderer
//! independent of the window toolkit and lets tests count blits with a mock.
//! [`FrameBuffer`] is the in-memory implementation used by the viewer: an RGBA
//! pixel buffer with source-over alpha blending and damage tracking, so only
//! the changed region has to be uploaded to the window each frame.

use std::sync::Arc;

use image::{imageops, Rgba, RgbaImage};

use super::geometry::{Point, Rect};

/// Shared, immutable skin image.
pub type Image = Arc<RgbaImage>;

/// Drawing operations required by the renderer.
#[cfg_attr(test, mockall::automock)]
pub trait Surface {
    /// Full drawable area, anchored at the origin.
    fn bounds(&self) -> Rect;

    /// Overwrites every pixel with `color`.
    fn fill(&mut self, color: Rgba<u8>);

    /// Alpha-blends `image` onto the surface with its top-left at `dest`.
    ///
    /// `area` selects a sub-rectangle of the source image; `None` blits the
    /// whole image. Pixels falling outside the surface are discarded.
    fn blit(&mut self, image: &RgbaImage, dest: Point, area: Option<Rect>);

    /// Copies the pixels currently under `rect` (clipped to the surface).
    fn snapshot(&self, rect: Rect) -> RgbaImage;
}

/// Bounding rectangle of an image, anchored at the origin.
#[must_use]
pub fn image_rect(image: &RgbaImage) -> Rect {
    Rect::from_size(image.width() as i32, image.height() as i32)
}

/// Copies the part of `image` under `rect`, clipped to the image bounds.
#[must_use]
pub fn crop(image: &RgbaImage, rect: Rect) -> RgbaImage {
    let rect = rect.clip(&image_rect(image));
    if rect.is_empty() {
        return RgbaImage::new(0, 0);
    }
    imageops::crop_imm(image, rect.x as u32, rect.y as u32, rect.w as u32, rect.h as u32)
        .to_image()
}

/// In-memory RGBA render target.
///
/// # Examples
///
/// ```
/// use image::{Rgba, RgbaImage};
/// use padview::render::geometry::{Point, Rect};
/// use padview::render::surface::{FrameBuffer, Surface};
///
/// let mut fb = FrameBuffer::new(64, 32);
/// fb.fill(Rgba([0, 0, 0, 255]));
/// fb.flip();
///
/// let dot = RgbaImage::from_pixel(2, 2, Rgba([255, 0, 0, 255]));
/// fb.blit(&dot, Point::new(10, 10), None);
/// assert_eq!(fb.flip(), Some(Rect::new(10, 10, 2, 2)));
/// assert_eq!(fb.flip(), None);
/// ```
#[derive(Debug, Clone)]
pub struct FrameBuffer {
    pixels: RgbaImage,
    damage: Option<Rect>,
    blits: u64,
}

impl FrameBuffer {
    /// Creates a fully transparent frame buffer.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            pixels: RgbaImage::new(width, height),
            damage: None,
            blits: 0,
        }
    }

    #[must_use]
    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    /// Number of blits that touched at least one pixel since creation.
    #[must_use]
    pub fn blit_count(&self) -> u64 {
        self.blits
    }

    /// Returns the region modified since the previous flip and clears it.
    pub fn flip(&mut self) -> Option<Rect> {
        self.damage.take()
    }

    /// Moves the content down by `dy` rows.
    ///
    /// Rows uncovered at the top keep their previous pixels. The whole
    /// buffer counts as damaged afterwards.
    pub fn scroll(&mut self, dy: u32) {
        let (width, height) = self.pixels.dimensions();
        if dy == 0 || dy >= height {
            return;
        }

        let moved = imageops::crop_imm(&self.pixels, 0, 0, width, height - dy).to_image();
        imageops::replace(&mut self.pixels, &moved, 0, i64::from(dy));
        self.mark_damaged(self.bounds());
    }

    fn mark_damaged(&mut self, rect: Rect) {
        self.damage = Some(match self.damage {
            Some(damage) => damage.union(&rect),
            None => rect,
        });
    }
}

impl Surface for FrameBuffer {
    fn bounds(&self) -> Rect {
        image_rect(&self.pixels)
    }

    fn fill(&mut self, color: Rgba<u8>) {
        for pixel in self.pixels.pixels_mut() {
            *pixel = color;
        }
        self.mark_damaged(self.bounds());
    }

    fn blit(&mut self, image: &RgbaImage, dest: Point, area: Option<Rect>) {
        let source = image_rect(image);
        let area = area.map_or(source, |area| area.clip(&source));
        if area.is_empty() {
            return;
        }

        let target = Rect::new(dest.x, dest.y, area.w, area.h).clip(&self.bounds());
        if target.is_empty() {
            return;
        }

        let part = imageops::crop_imm(
            image,
            area.x as u32,
            area.y as u32,
            area.w as u32,
            area.h as u32,
        );
        imageops::overlay(&mut self.pixels, &*part, dest.x.into(), dest.y.into());

        self.blits += 1;
        self.mark_damaged(target);
    }

    fn snapshot(&self, rect: Rect) -> RgbaImage {
        crop(&self.pixels, rect)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
    const BLUE: Rgba<u8> = Rgba([0, 0, 255, 255]);

    #[test]
    fn test_blit_opaque_source_replaces() {
        let mut fb = FrameBuffer::new(4, 4);
        fb.fill(BLUE);
        fb.blit(&RgbaImage::from_pixel(2, 2, RED), Point::new(1, 1), None);
        assert_eq!(*fb.pixels().get_pixel(1, 1), RED);
        assert_eq!(*fb.pixels().get_pixel(0, 0), BLUE);
    }

    #[test]
    fn test_blit_transparent_source_keeps_destination() {
        let mut fb = FrameBuffer::new(4, 4);
        fb.fill(BLUE);
        fb.blit(&RgbaImage::from_pixel(2, 2, Rgba([255, 0, 0, 0])), Point::new(0, 0), None);
        assert_eq!(*fb.pixels().get_pixel(1, 1), BLUE);
    }

    #[test]
    fn test_blit_half_alpha_over_opaque() {
        let mut fb = FrameBuffer::new(4, 4);
        fb.fill(BLUE);
        fb.blit(&RgbaImage::from_pixel(1, 1, Rgba([255, 0, 0, 128])), Point::new(2, 2), None);

        let out = *fb.pixels().get_pixel(2, 2);
        assert_eq!(out[3], 255);
        assert!((i32::from(out[0]) - 128).abs() <= 1);
        assert!((i32::from(out[2]) - 127).abs() <= 1);
    }

    #[test]
    fn test_fill_marks_everything_damaged() {
        let mut fb = FrameBuffer::new(8, 4);
        fb.fill(RED);
        assert_eq!(fb.flip(), Some(Rect::new(0, 0, 8, 4)));
        assert_eq!(*fb.pixels().get_pixel(7, 3), RED);
    }

    #[test]
    fn test_blit_with_area_copies_sub_rectangle() {
        let mut fb = FrameBuffer::new(10, 10);
        let mut image = RgbaImage::from_pixel(4, 4, BLUE);
        image.put_pixel(1, 1, RED);

        fb.blit(&image, Point::new(5, 5), Some(Rect::new(1, 1, 2, 2)));

        assert_eq!(*fb.pixels().get_pixel(5, 5), RED);
        assert_eq!(*fb.pixels().get_pixel(6, 6), BLUE);
        assert_eq!(*fb.pixels().get_pixel(7, 7), Rgba([0, 0, 0, 0]));
        assert_eq!(fb.flip(), Some(Rect::new(5, 5, 2, 2)));
    }

    #[test]
    fn test_blit_clips_at_edges() {
        let mut fb = FrameBuffer::new(10, 10);
        let image = RgbaImage::from_pixel(4, 4, RED);

        fb.blit(&image, Point::new(-2, 8), None);

        assert_eq!(*fb.pixels().get_pixel(0, 8), RED);
        assert_eq!(*fb.pixels().get_pixel(1, 9), RED);
        assert_eq!(*fb.pixels().get_pixel(2, 9), Rgba([0, 0, 0, 0]));
        assert_eq!(fb.flip(), Some(Rect::new(0, 8, 2, 2)));
    }

    #[test]
    fn test_blit_fully_outside_is_not_counted() {
        let mut fb = FrameBuffer::new(10, 10);
        let image = RgbaImage::from_pixel(4, 4, RED);

        fb.blit(&image, Point::new(20, 20), None);

        assert_eq!(fb.blit_count(), 0);
        assert_eq!(fb.flip(), None);
    }

    #[test]
    fn test_damage_accumulates_until_flip() {
        let mut fb = FrameBuffer::new(20, 20);
        let image = RgbaImage::from_pixel(2, 2, RED);

        fb.blit(&image, Point::new(0, 0), None);
        fb.blit(&image, Point::new(10, 4), None);

        assert_eq!(fb.flip(), Some(Rect::new(0, 0, 12, 6)));
        assert_eq!(fb.blit_count(), 2);
    }

    #[test]
    fn test_snapshot_is_clipped() {
        let mut fb = FrameBuffer::new(6, 6);
        fb.fill(BLUE);
        let copy = fb.snapshot(Rect::new(4, 4, 5, 5));
        assert_eq!(copy.dimensions(), (2, 2));
    }

    #[test]
    fn test_crop_outside_is_empty() {
        let image = RgbaImage::from_pixel(4, 4, RED);
        let copy = crop(&image, Rect::new(10, 10, 2, 2));
        assert_eq!(copy.dimensions(), (0, 0));
    }

    // ==================== Scroll Tests ====================

    #[test]
    fn test_scroll_moves_rows_down() {
        let mut fb = FrameBuffer::new(4, 6);
        fb.fill(BLUE);
        fb.blit(&RgbaImage::from_pixel(4, 2, RED), Point::new(0, 0), None);
        fb.flip();

        fb.scroll(2);
        // Top rows keep their pixels, the red band now also sits below them
        assert_eq!(*fb.pixels().get_pixel(0, 0), RED);
        assert_eq!(*fb.pixels().get_pixel(3, 3), RED);
        assert_eq!(*fb.pixels().get_pixel(0, 4), BLUE);
        assert_eq!(fb.flip(), Some(Rect::new(0, 0, 4, 6)));
    }

    #[test]
    fn test_scroll_drops_bottom_rows() {
        let mut fb = FrameBuffer::new(2, 4);
        fb.fill(BLUE);
        fb.blit(&RgbaImage::from_pixel(2, 1, RED), Point::new(0, 3), None);

        fb.scroll(1);
        assert_eq!(*fb.pixels().get_pixel(0, 3), BLUE);
    }

    #[test]
    fn test_scroll_past_height_is_noop() {
        let mut fb = FrameBuffer::new(2, 2);
        fb.fill(RED);
        fb.flip();
        fb.scroll(2);
        fb.scroll(0);
        assert_eq!(fb.flip(), None);
    }
}
