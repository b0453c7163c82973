//! Rasterized region masks.
//!
//! A [`RegionMask`] stores one bit per pixel of its circle's bounding box,
//! clipped to the frame. Pixels outside that box can never be inside the
//! disk, so the clipped box is all the mask needs to cover.

use fip_rig_model::geometry::{Circle, PixelRect};

/// Binary mask of the frame pixels inside one circle.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionMask {
    circle: Circle,
    /// Bounding box clipped to the frame; may be empty.
    rect: PixelRect,
    /// Row-major bits covering `rect`.
    bits: Vec<bool>,
    active: usize,
}

impl RegionMask {
    /// Rasterize `circle` against a `width` x `height` frame.
    ///
    /// A pixel is inside when its integer coordinate lies within the disk.
    /// Anything past the frame edge is dropped.
    pub fn rasterize(circle: &Circle, width: usize, height: usize) -> Self {
        let rect = circle.bounding_box().clip_to(width, height);
        let mut bits = Vec::with_capacity(rect.area() as usize);
        for y in rect.y..rect.y + rect.height as i64 {
            for x in rect.x..rect.x + rect.width as i64 {
                bits.push(circle.contains(x, y));
            }
        }
        let active = bits.iter().filter(|b| **b).count();
        Self {
            circle: *circle,
            rect,
            bits,
            active,
        }
    }

    pub fn circle(&self) -> &Circle {
        &self.circle
    }

    /// Clipped bounding box the mask covers.
    pub fn bounding_box(&self) -> PixelRect {
        self.rect
    }

    /// Number of frame pixels inside the region.
    pub fn pixel_count(&self) -> usize {
        self.active
    }

    /// True when no frame pixel falls inside the region.
    pub fn is_empty(&self) -> bool {
        self.active == 0
    }

    /// Whether frame pixel `(x, y)` is inside the region.
    pub fn contains(&self, x: usize, y: usize) -> bool {
        let (x, y) = (x as i64, y as i64);
        if x < self.rect.x
            || y < self.rect.y
            || x >= self.rect.x + self.rect.width as i64
            || y >= self.rect.y + self.rect.height as i64
        {
            return false;
        }
        let local = (y - self.rect.y) as usize * self.rect.width as usize + (x - self.rect.x) as usize;
        self.bits[local]
    }

    /// Frame coordinates of every pixel inside the region, row by row.
    pub fn pixels(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        let width = self.rect.width as usize;
        let (x0, y0) = (self.rect.x as usize, self.rect.y as usize);
        self.bits
            .iter()
            .enumerate()
            .filter(|(_, inside)| **inside)
            .map(move |(i, _)| (x0 + i % width, y0 + i / width))
    }
}

/// Masks for an ordered region list on frames of one size.
///
/// Identity is the value snapshot `(width, height, circles)`: a new list
/// with equal circles matches, an edited list does not.
#[derive(Debug, Clone)]
pub struct MaskSet {
    width: usize,
    height: usize,
    circles: Vec<Circle>,
    masks: Vec<RegionMask>,
    /// Full-frame union of all masks, row-major.
    union: Vec<bool>,
}

impl MaskSet {
    pub fn build(circles: &[Circle], width: usize, height: usize) -> Self {
        let masks: Vec<RegionMask> = circles
            .iter()
            .map(|circle| RegionMask::rasterize(circle, width, height))
            .collect();

        let mut union = vec![false; width * height];
        for mask in &masks {
            for (x, y) in mask.pixels() {
                union[y * width + x] = true;
            }
        }

        Self {
            width,
            height,
            circles: circles.to_vec(),
            masks,
            union,
        }
    }

    /// Whether this set was built for exactly these circles and frame size.
    pub fn matches(&self, circles: &[Circle], width: usize, height: usize) -> bool {
        self.width == width && self.height == height && self.circles == circles
    }

    pub fn masks(&self) -> &[RegionMask] {
        &self.masks
    }

    pub fn union(&self) -> &[bool] {
        &self.union
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }
}
