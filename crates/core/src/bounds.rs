//! Axis-aligned bounding boxes

use glam::{Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Axis-aligned box, serialized as `{ "min": [x, y, z], "max": [x, y, z] }`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Minimum corner
    pub min: Vec3,
    /// Maximum corner
    pub max: Vec3,
}

impl BoundingBox {
    /// Box spanning two corners (order-independent)
    pub fn new(a: Vec3, b: Vec3) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Smallest box containing all points, `None` for an empty iterator
    pub fn from_points<I: IntoIterator<Item = Vec3>>(points: I) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        Some(iter.fold(Self { min: first, max: first }, |b, p| b.expanded_by(p)))
    }

    /// Box grown to contain `point`
    pub fn expanded_by(self, point: Vec3) -> Self {
        Self {
            min: self.min.min(point),
            max: self.max.max(point),
        }
    }

    /// Union of two boxes
    pub fn union(self, other: BoundingBox) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Center point
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Extent along each axis
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// The 8 corners
    pub fn corners(&self) -> [Vec3; 8] {
        let (a, b) = (self.min, self.max);
        [
            Vec3::new(a.x, a.y, a.z),
            Vec3::new(b.x, a.y, a.z),
            Vec3::new(a.x, b.y, a.z),
            Vec3::new(b.x, b.y, a.z),
            Vec3::new(a.x, a.y, b.z),
            Vec3::new(b.x, a.y, b.z),
            Vec3::new(a.x, b.y, b.z),
            Vec3::new(b.x, b.y, b.z),
        ]
    }

    /// Axis-aligned box around this box transformed by `matrix`
    pub fn transformed(&self, matrix: &Mat4) -> Self {
        let corners = self.corners().map(|c| matrix.transform_point3(c));
        // 8 corners, never empty
        Self::from_points(corners).unwrap_or(*self)
    }

    /// Axis-aligned box around this box rotated about the origin
    pub fn rotated(&self, rotation: Quat) -> Self {
        self.transformed(&Mat4::from_quat(rotation))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_points() {
        let b = BoundingBox::from_points([
            Vec3::new(1.0, -2.0, 0.5),
            Vec3::new(-1.0, 3.0, 0.0),
        ])
        .unwrap();
        assert_eq!(b.min, Vec3::new(-1.0, -2.0, 0.0));
        assert_eq!(b.max, Vec3::new(1.0, 3.0, 0.5));
        assert!(BoundingBox::from_points(Vec::<Vec3>::new()).is_none());
    }

    #[test]
    fn test_rotated_quarter_turn() {
        let b = BoundingBox::new(Vec3::new(0.0, 0.0, 0.0), Vec3::new(2.0, 1.0, 1.0));
        let r = b.rotated(Quat::from_rotation_z(std::f32::consts::FRAC_PI_2));
        assert!((r.min - Vec3::new(-1.0, 0.0, 0.0)).length() < 1e-5);
        assert!((r.max - Vec3::new(0.0, 2.0, 1.0)).length() < 1e-5);
    }

    #[test]
    fn test_serde_shape() {
        let b = BoundingBox::new(Vec3::ZERO, Vec3::ONE);
        let json = serde_json::to_value(b).unwrap();
        assert_eq!(json["min"], serde_json::json!([0.0, 0.0, 0.0]));
        assert_eq!(json["max"], serde_json::json!([1.0, 1.0, 1.0]));
    }
}
