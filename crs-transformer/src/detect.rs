use cloud_core::pointcloud::point::BoundingVolume;

/// Heuristic for whether a cloud's bounds look geographic: every X value
/// fits the longitude range and every Y value fits the latitude range.
/// Projected coordinates (meters) blow past these almost immediately.
pub fn is_geographic(bounds: &BoundingVolume) -> bool {
    let lng_ok = |v: f64| (-180.0..=180.0).contains(&v);
    let lat_ok = |v: f64| (-90.0..=90.0).contains(&v);
    lng_ok(bounds.min[0]) && lng_ok(bounds.max[0]) && lat_ok(bounds.min[1]) && lat_ok(bounds.max[1])
}

#[cfg(test)]
mod tests {
    use super::*;
    use cloud_core::pointcloud::point::{Point, PointCloud};

    fn bounds_of(points: Vec<Point>) -> BoundingVolume {
        PointCloud::new(points).bounds
    }

    #[test]
    fn degree_ranges_look_geographic() {
        let bounds = bounds_of(vec![
            Point::new(14.9, 48.1, 200.0),
            Point::new(15.1, 48.3, 230.0),
        ]);
        assert!(is_geographic(&bounds));
    }

    #[test]
    fn metric_ranges_look_projected() {
        let bounds = bounds_of(vec![
            Point::new(412_000.0, 6_543_000.0, 87.0),
            Point::new(412_500.0, 6_543_400.0, 95.0),
        ]);
        assert!(!is_geographic(&bounds));
    }

    #[test]
    fn mixed_ranges_look_projected() {
        // a latitude outside +/-90 disqualifies even if X fits longitudes
        let bounds = bounds_of(vec![
            Point::new(120.0, 250.0, 0.0),
            Point::new(150.0, 400.0, 0.0),
        ]);
        assert!(!is_geographic(&bounds));
    }
}
