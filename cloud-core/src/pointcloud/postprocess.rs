use std::collections::HashMap;

use crate::pointcloud::point::Point;

/// Result of collapsing near-coincident points.
#[derive(Debug, Clone)]
pub struct DedupResult {
    pub points: Vec<Point>,
    pub original_count: usize,
    pub unique_count: usize,
}

/// Collapses points whose planar (X, Y) distance is strictly less than
/// `xy_tolerance` into the first-seen representative. Two points exactly
/// `xy_tolerance` apart are both kept. A tolerance of zero or less disables
/// deduplication.
pub fn deduplicate(points: &[Point], xy_tolerance: f64) -> DedupResult {
    if xy_tolerance <= 0.0 {
        return DedupResult {
            points: points.to_vec(),
            original_count: points.len(),
            unique_count: points.len(),
        };
    }

    let mut cells: HashMap<(i64, i64), Vec<usize>> = HashMap::new();
    let mut kept: Vec<Point> = Vec::new();

    for point in points {
        let cx = (point.x / xy_tolerance).floor() as i64;
        let cy = (point.y / xy_tolerance).floor() as i64;

        let mut duplicate = false;
        'search: for nx in (cx - 1)..=(cx + 1) {
            for ny in (cy - 1)..=(cy + 1) {
                let Some(indices) = cells.get(&(nx, ny)) else {
                    continue;
                };
                for &i in indices {
                    let dx = point.x - kept[i].x;
                    let dy = point.y - kept[i].y;
                    if (dx * dx + dy * dy).sqrt() < xy_tolerance {
                        duplicate = true;
                        break 'search;
                    }
                }
            }
        }

        if !duplicate {
            cells.entry((cx, cy)).or_default().push(kept.len());
            kept.push(point.clone());
        }
    }

    DedupResult {
        original_count: points.len(),
        unique_count: kept.len(),
        points: kept,
    }
}

/// Thins a cloud to at most `max_points` by keeping a uniformly-strided
/// subset: `step = ceil(len / max_points)`, indices 0, step, 2*step, ...
/// Deterministic, so repeated calls with the same cap are idempotent.
pub fn decimate(points: &[Point], max_points: usize) -> Vec<Point> {
    if max_points == 0 || points.len() <= max_points {
        return points.to_vec();
    }
    let step = (points.len() + max_points - 1) / max_points;
    points.iter().step_by(step).cloned().collect()
}

/// Buckets points by classification code for downstream styling.
pub fn group_by_classification(points: &[Point]) -> HashMap<u8, Vec<Point>> {
    let mut groups: HashMap<u8, Vec<Point>> = HashMap::new();
    for point in points {
        groups
            .entry(point.attributes.classification)
            .or_default()
            .push(point.clone());
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(n: usize) -> Vec<Point> {
        (0..n).map(|i| Point::new(i as f64 * 10.0, 0.0, 0.0)).collect()
    }

    #[test]
    fn points_exactly_tolerance_apart_are_kept() {
        let points = vec![Point::new(0.0, 0.0, 0.0), Point::new(0.5, 0.0, 0.0)];
        let result = deduplicate(&points, 0.5);
        assert_eq!(result.unique_count, 2);
        assert_eq!(result.original_count, 2);
    }

    #[test]
    fn points_inside_tolerance_are_merged() {
        let points = vec![Point::new(0.0, 0.0, 0.0), Point::new(0.5 - 1e-9, 0.0, 5.0)];
        let result = deduplicate(&points, 0.5);
        assert_eq!(result.unique_count, 1);
        // first-seen representative wins
        assert_eq!(result.points[0].z, 0.0);
    }

    #[test]
    fn dedup_across_cell_boundaries() {
        let points = vec![Point::new(0.99, 0.99, 0.0), Point::new(1.01, 1.01, 0.0)];
        let result = deduplicate(&points, 1.0);
        assert_eq!(result.unique_count, 1);
    }

    #[test]
    fn dedup_is_idempotent() {
        let points = vec![
            Point::new(0.0, 0.0, 0.0),
            Point::new(0.1, 0.0, 0.0),
            Point::new(3.0, 3.0, 0.0),
            Point::new(3.05, 3.0, 0.0),
        ];
        let once = deduplicate(&points, 0.2);
        let twice = deduplicate(&once.points, 0.2);
        assert_eq!(once.points, twice.points);
        assert_eq!(twice.unique_count, twice.original_count);
    }

    #[test]
    fn zero_tolerance_disables_dedup() {
        let points = vec![Point::new(0.0, 0.0, 0.0), Point::new(0.0, 0.0, 0.0)];
        let result = deduplicate(&points, 0.0);
        assert_eq!(result.unique_count, 2);
    }

    #[test]
    fn decimate_is_identity_under_cap() {
        let points = grid(5);
        assert_eq!(decimate(&points, 10), points);
        assert_eq!(decimate(&points, 5), points);
    }

    #[test]
    fn decimate_takes_strided_subset() {
        let points = grid(10);
        let thinned = decimate(&points, 3);
        // step = ceil(10 / 3) = 4 -> indices 0, 4, 8
        assert_eq!(thinned.len(), 3);
        assert_eq!(thinned[0], points[0]);
        assert_eq!(thinned[1], points[4]);
        assert_eq!(thinned[2], points[8]);
    }

    #[test]
    fn decimate_is_idempotent() {
        let points = grid(1000);
        let once = decimate(&points, 37);
        let twice = decimate(&once, 37);
        assert_eq!(once, twice);
    }

    #[test]
    fn grouping_buckets_by_classification() {
        let mut a = Point::new(0.0, 0.0, 0.0);
        a.attributes.classification = 2;
        let mut b = Point::new(1.0, 0.0, 0.0);
        b.attributes.classification = 5;
        let mut c = Point::new(2.0, 0.0, 0.0);
        c.attributes.classification = 2;

        let groups = group_by_classification(&[a, b, c]);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[&2].len(), 2);
        assert_eq!(groups[&5].len(), 1);
    }
}
