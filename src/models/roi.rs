use serde::{Deserialize, Serialize};

use crate::models::point::Point;

/// Axis-aligned capture rectangle in logical screen pixels
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ScreenRegion {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl ScreenRegion {
    /// Create a new region from its top-left corner and size
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Create a region of `width` x `height` centered on `center`.
    /// Odd sizes put the extra pixel on the right/bottom side.
    pub fn from_center(center: Point, width: u32, height: u32) -> Self {
        Self {
            x: center.x - (width / 2) as i32,
            y: center.y - (height / 2) as i32,
            width,
            height,
        }
    }

    /// Validate region dimensions
    pub fn is_valid(&self) -> bool {
        self.width > 0 && self.height > 0
    }

    /// Get the end coordinates (exclusive)
    pub fn x2(&self) -> i32 {
        self.x + self.width as i32
    }

    pub fn y2(&self) -> i32 {
        self.y + self.height as i32
    }

    pub fn center(&self) -> Point {
        Point::new(
            self.x + (self.width / 2) as i32,
            self.y + (self.height / 2) as i32,
        )
    }

    /// Check if region contains a point
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x && point.x < self.x2() && point.y >= self.y && point.y < self.y2()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_creation() {
        let region = ScreenRegion::new(100, 100, 200, 80);
        assert_eq!(region.x, 100);
        assert_eq!(region.y, 100);
        assert_eq!(region.width, 200);
        assert_eq!(region.height, 80);
    }

    #[test]
    fn test_region_from_center() {
        let region = ScreenRegion::from_center(Point::new(500, 300), 200, 80);
        assert_eq!(region, ScreenRegion::new(400, 260, 200, 80));
        assert_eq!(region.x2(), 600);
        assert_eq!(region.y2(), 340);
        assert_eq!(region.center(), Point::new(500, 300));
    }

    #[test]
    fn test_region_from_center_odd_size() {
        let region = ScreenRegion::from_center(Point::new(10, 10), 5, 3);
        assert_eq!(region.x, 8);
        assert_eq!(region.y, 9);
        assert_eq!(region.x2(), 13);
        assert_eq!(region.y2(), 12);
    }

    #[test]
    fn test_region_near_origin_goes_negative() {
        let region = ScreenRegion::from_center(Point::new(20, 10), 200, 80);
        assert_eq!(region.x, -80);
        assert_eq!(region.y, -30);
    }

    #[test]
    fn test_region_validation() {
        assert!(ScreenRegion::new(0, 0, 100, 100).is_valid());
        assert!(!ScreenRegion::new(0, 0, 0, 100).is_valid());
        assert!(!ScreenRegion::new(0, 0, 100, 0).is_valid());
    }

    #[test]
    fn test_region_contains_point() {
        let region = ScreenRegion::new(100, 100, 200, 200);

        assert!(region.contains(Point::new(150, 150)));
        assert!(region.contains(Point::new(100, 100))); // Top-left corner

        assert!(!region.contains(Point::new(50, 150)));
        assert!(!region.contains(Point::new(300, 150))); // Right edge (exclusive)
        assert!(!region.contains(Point::new(150, 300))); // Bottom edge (exclusive)
    }

    #[test]
    fn test_region_serialization() {
        let region = ScreenRegion::new(100, 200, 300, 400);
        let json = serde_json::to_string(&region).unwrap();
        let deserialized: ScreenRegion = serde_json::from_str(&json).unwrap();
        assert_eq!(region, deserialized);
    }
}
