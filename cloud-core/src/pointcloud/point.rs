use serde::{Deserialize, Serialize};

/// 16-bit-per-channel color as stored in LAS point records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u16,
    pub g: u16,
    pub b: u16,
}

impl Color {
    pub fn to_rgb8(&self) -> [u8; 3] {
        [
            (self.r as f64 / 65535.0 * 255.0) as u8,
            (self.g as f64 / 65535.0 * 255.0) as u8,
            (self.b as f64 / 65535.0 * 255.0) as u8,
        ]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PointAttributes {
    pub intensity: u16,
    pub return_number: u8,
    pub number_of_returns: u8,
    pub scan_direction: bool,
    pub edge_of_flight_line: bool,
    pub classification: u8,
    pub synthetic: bool,
    pub key_point: bool,
    pub withheld: bool,
    pub overlap: bool,
    pub scanner_channel: u8,
    pub scan_angle: f32,
    pub user_data: u8,
    pub point_source_id: u16,
    pub gps_time: Option<f64>,
    pub nir: Option<u16>,
}

// Coordinates are real-world values; the quantized integer form only exists
// on the wire, where x = (raw * scale) + offset per axis.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub color: Option<Color>,
    pub attributes: PointAttributes,
}

impl Point {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Point {
            x,
            y,
            z,
            color: None,
            attributes: PointAttributes::default(),
        }
    }
}

/// Axis-aligned extent of a set of points, in real-world coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BoundingVolume {
    pub min: [f64; 3],
    pub max: [f64; 3],
}

impl BoundingVolume {
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Point>) -> Self {
        let mut bounds = BoundingVolume {
            min: [f64::MAX, f64::MAX, f64::MAX],
            max: [f64::MIN, f64::MIN, f64::MIN],
        };
        let mut any = false;
        for point in points {
            bounds.extend(point.x, point.y, point.z);
            any = true;
        }
        if !any {
            return BoundingVolume::default();
        }
        bounds
    }

    pub fn extend(&mut self, x: f64, y: f64, z: f64) {
        self.max[0] = self.max[0].max(x);
        self.max[1] = self.max[1].max(y);
        self.max[2] = self.max[2].max(z);
        self.min[0] = self.min[0].min(x);
        self.min[1] = self.min[1].min(y);
        self.min[2] = self.min[2].min(z);
    }

    pub fn range(&self, axis: usize) -> f64 {
        self.max[axis] - self.min[axis]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PointCloud {
    pub points: Vec<Point>,
    pub bounds: BoundingVolume,
}

impl PointCloud {
    pub fn new(points: Vec<Point>) -> Self {
        let bounds = BoundingVolume::from_points(&points);
        PointCloud { points, bounds }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_cover_all_points() {
        let cloud = PointCloud::new(vec![
            Point::new(1.0, -2.0, 3.0),
            Point::new(-4.0, 5.0, 0.5),
            Point::new(2.5, 0.0, -1.0),
        ]);
        assert_eq!(cloud.bounds.min, [-4.0, -2.0, -1.0]);
        assert_eq!(cloud.bounds.max, [2.5, 5.0, 3.0]);
    }

    #[test]
    fn empty_cloud_has_zeroed_bounds() {
        let cloud = PointCloud::new(vec![]);
        assert_eq!(cloud.bounds, BoundingVolume::default());
    }
}
