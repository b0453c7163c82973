//! Geometry primitives for regions of interest.

use serde::{Deserialize, Serialize};

use fip_common::{FipError, FipResult};

/// Number of outline vertices used when a circle is drawn as a polygon.
pub const DEFAULT_POLYGON_SEGMENTS: usize = 30;

/// A 2D point in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point2f {
    pub x: f64,
    pub y: f64,
}

impl Point2f {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// An integer pixel coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub x: i64,
    pub y: i64,
}

/// A circular region of interest.
///
/// Equality is structural: two circles with the same center and radius are
/// the same region regardless of where they were allocated.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Circle {
    /// Center of the circle (px).
    #[serde(default)]
    pub center: Point2f,
    /// Radius of the circle (px).
    #[serde(default = "default_radius")]
    pub radius: f64,
}

fn default_radius() -> f64 {
    50.0
}

impl Default for Circle {
    fn default() -> Self {
        Self {
            center: Point2f::default(),
            radius: default_radius(),
        }
    }
}

impl Circle {
    pub fn new(x: f64, y: f64, radius: f64) -> Self {
        Self {
            center: Point2f::new(x, y),
            radius,
        }
    }

    /// Reject circles with non-finite components or a negative radius.
    pub fn validate(&self) -> FipResult<()> {
        if !self.center.x.is_finite() || !self.center.y.is_finite() {
            return Err(FipError::invalid_configuration(format!(
                "circle center ({}, {}) is not finite",
                self.center.x, self.center.y
            )));
        }
        if !self.radius.is_finite() || self.radius < 0.0 {
            return Err(FipError::invalid_configuration(format!(
                "circle radius {} must be finite and non-negative",
                self.radius
            )));
        }
        Ok(())
    }

    /// Whether the integer pixel `(px, py)` lies inside the disk.
    pub fn contains(&self, px: i64, py: i64) -> bool {
        let dx = px as f64 - self.center.x;
        let dy = py as f64 - self.center.y;
        dx * dx + dy * dy <= self.radius * self.radius
    }

    /// Axis-aligned pixel box enclosing the disk. May extend past any frame.
    ///
    /// Edges past the `i64` range saturate, so a huge radius yields a box
    /// that still covers every frame.
    pub fn bounding_box(&self) -> PixelRect {
        let left = (self.center.x - self.radius).floor() as i64;
        let top = (self.center.y - self.radius).floor() as i64;
        let right = (self.center.x + self.radius).ceil() as i64;
        let bottom = (self.center.y + self.radius).ceil() as i64;
        PixelRect {
            x: left,
            y: top,
            width: span(left, right),
            height: span(top, bottom),
        }
    }

    /// Outline approximated by `segments` vertices, truncated to pixels.
    pub fn as_polygon(&self, segments: usize) -> Vec<Point> {
        (0..segments)
            .map(|i| {
                let angle = 2.0 * std::f64::consts::PI * i as f64 / segments as f64;
                Point {
                    x: (self.center.x + self.radius * angle.cos()) as i64,
                    y: (self.center.y + self.radius * angle.sin()) as i64,
                }
            })
            .collect()
    }
}

/// Inclusive pixel count from `start` to `end`, saturating at `u64::MAX`.
fn span(start: i64, end: i64) -> u64 {
    (end as i128 - start as i128 + 1).clamp(0, u64::MAX as i128) as u64
}

/// A rectangle of pixels. `x`/`y` may be negative before clipping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PixelRect {
    pub x: i64,
    pub y: i64,
    pub width: u64,
    pub height: u64,
}

impl PixelRect {
    pub fn new(x: i64, y: i64, width: u64, height: u64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Intersect with a `width` x `height` raster anchored at the origin.
    /// Returns an empty rectangle when there is no overlap.
    pub fn clip_to(&self, width: usize, height: usize) -> PixelRect {
        // i128 holds any i64 origin plus any u64 extent.
        let (width, height) = (width as i128, height as i128);
        let left = (self.x as i128).clamp(0, width);
        let top = (self.y as i128).clamp(0, height);
        let right = (self.x as i128 + self.width as i128).min(width);
        let bottom = (self.y as i128 + self.height as i128).min(height);
        if right <= left || bottom <= top {
            return PixelRect::new(left as i64, top as i64, 0, 0);
        }
        PixelRect::new(
            left as i64,
            top as i64,
            (right - left) as u64,
            (bottom - top) as u64,
        )
    }

    pub fn area(&self) -> u64 {
        self.width.saturating_mul(self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_circle_equality_is_structural() {
        let a = Circle::new(50.0, 50.0, 10.0);
        let b = Circle::new(50.0, 50.0, 10.0);
        assert_eq!(a, b);
        assert_ne!(a, Circle::new(50.0, 50.0, 11.0));
    }

    #[test]
    fn test_validate_rejects_malformed() {
        assert!(Circle::new(0.0, 0.0, 0.0).validate().is_ok());
        assert!(Circle::new(0.0, 0.0, -1.0)
            .validate()
            .unwrap_err()
            .is_configuration());
        assert!(Circle::new(f64::NAN, 0.0, 1.0).validate().is_err());
        assert!(Circle::new(0.0, 0.0, f64::INFINITY).validate().is_err());
    }

    #[test]
    fn test_bounding_box_encloses_disk() {
        let circle = Circle::new(10.0, 20.0, 5.0);
        let rect = circle.bounding_box();
        assert_eq!(rect, PixelRect::new(5, 15, 11, 11));

        let fractional = Circle::new(10.5, 10.5, 2.2).bounding_box();
        assert_eq!(fractional.x, 8);
        assert_eq!(fractional.y, 8);
        assert_eq!(fractional.width, 6);
    }

    #[test]
    fn test_contains_edges() {
        let circle = Circle::new(5.0, 5.0, 2.0);
        assert!(circle.contains(5, 5));
        assert!(circle.contains(7, 5));
        assert!(!circle.contains(7, 7));
        assert!(Circle::new(3.0, 3.0, 0.0).contains(3, 3));
    }

    #[test]
    fn test_clip_to_frame() {
        let rect = PixelRect::new(-5, -5, 10, 10);
        assert_eq!(rect.clip_to(100, 100), PixelRect::new(0, 0, 5, 5));

        let outside = PixelRect::new(150, 150, 10, 10);
        assert!(outside.clip_to(100, 100).is_empty());

        let inside = PixelRect::new(10, 10, 5, 5);
        assert_eq!(inside.clip_to(100, 100), inside);
    }

    #[test]
    fn test_huge_radius_saturates_instead_of_overflowing() {
        let circle = Circle::new(5.0, 5.0, 1e19);
        assert!(circle.validate().is_ok());
        let rect = circle.bounding_box();
        assert_eq!(rect.x, i64::MIN);
        assert_eq!(rect.width, u64::MAX);
        assert_eq!(rect.area(), u64::MAX);
        assert_eq!(rect.clip_to(10, 10), PixelRect::new(0, 0, 10, 10));

        let far = PixelRect::new(i64::MAX - 1, 0, u64::MAX, 4);
        assert!(far.clip_to(10, 10).is_empty());
    }

    #[test]
    fn test_polygon_vertex_count_and_first_vertex() {
        let circle = Circle::new(100.0, 100.0, 20.0);
        let polygon = circle.as_polygon(DEFAULT_POLYGON_SEGMENTS);
        assert_eq!(polygon.len(), 30);
        assert_eq!(polygon[0], Point { x: 120, y: 100 });
    }

    #[test]
    fn test_circle_deserialize_defaults() {
        let circle: Circle = serde_json::from_str("{}").unwrap();
        assert_eq!(circle, Circle::new(0.0, 0.0, 50.0));
    }
}
