//! Delaunay triangulation with edge-length and minimum-angle quality culls.

use rayon::prelude::*;
use serde::Serialize;

use cloud_core::pointcloud::point::{BoundingVolume, Point};

use crate::error::SurfaceError;

/// Quality thresholds for the cull pass. A threshold of exactly 0 disables
/// that rule entirely. The 2D/3D flags pick whether edge lengths (and the
/// angles derived from them) use planar or full distances; each flag is
/// evaluated once per call, not per edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceParams {
    pub max_edge_length: f64,
    pub min_angle: f64,
    pub consider_3d_length: bool,
    pub consider_3d_angle: bool,
}

impl Default for SurfaceParams {
    fn default() -> Self {
        SurfaceParams {
            max_edge_length: 0.0,
            min_angle: 0.0,
            consider_3d_length: false,
            consider_3d_angle: false,
        }
    }
}

/// A kept triangle. Vertices are held by value so the surface is
/// self-contained.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Triangle {
    pub vertices: [Point; 3],
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct SurfaceStats {
    pub point_count: usize,
    pub triangle_count: usize,
    pub culled_by_edge: usize,
    pub culled_by_angle: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct TriangulatedSurface {
    pub points: Vec<Point>,
    pub triangles: Vec<Triangle>,
    pub bounds: BoundingVolume,
    pub stats: SurfaceStats,
}

#[derive(Clone, Copy, PartialEq)]
enum Verdict {
    Keep,
    CullEdge,
    CullAngle,
}

fn edge_lengths(points: &[Point], tri: &[usize; 3], use_3d: bool) -> [f64; 3] {
    let mut lengths = [0.0; 3];
    for i in 0..3 {
        let a = &points[tri[i]];
        let b = &points[tri[(i + 1) % 3]];
        let dx = a.x - b.x;
        let dy = a.y - b.y;
        let planar = dx * dx + dy * dy;
        lengths[i] = if use_3d {
            let dz = a.z - b.z;
            (planar + dz * dz).sqrt()
        } else {
            planar.sqrt()
        };
    }
    lengths
}

/// Smallest internal angle in degrees, via the law of cosines. A degenerate
/// (zero-length-edge) triangle reports 0.
fn smallest_angle_deg(lengths: &[f64; 3]) -> f64 {
    if lengths.iter().any(|&l| l <= 0.0) {
        return 0.0;
    }
    let mut smallest = f64::MAX;
    for i in 0..3 {
        let opposite = lengths[i];
        let b = lengths[(i + 1) % 3];
        let c = lengths[(i + 2) % 3];
        let cos = ((b * b + c * c - opposite * opposite) / (2.0 * b * c)).clamp(-1.0, 1.0);
        smallest = smallest.min(cos.acos().to_degrees());
    }
    smallest
}

fn judge(points: &[Point], tri: &[usize; 3], params: &SurfaceParams) -> Verdict {
    if params.max_edge_length > 0.0 {
        let lengths = edge_lengths(points, tri, params.consider_3d_length);
        if lengths.iter().any(|&l| l > params.max_edge_length) {
            return Verdict::CullEdge;
        }
    }
    if params.min_angle > 0.0 {
        let lengths = edge_lengths(points, tri, params.consider_3d_angle);
        if smallest_angle_deg(&lengths) < params.min_angle {
            return Verdict::CullAngle;
        }
    }
    Verdict::Keep
}

/// Triangulates the X/Y plane of `points` (Z is carried, not used for the
/// topology) and culls triangles violating the configured quality rules.
/// The mesh bounds are recomputed from the vertex set handed in, which is
/// expected to be the post-processed cloud.
pub fn build_surface(
    points: &[Point],
    params: &SurfaceParams,
) -> Result<TriangulatedSurface, SurfaceError> {
    if points.len() < 3 {
        return Err(SurfaceError::InsufficientData(points.len()));
    }

    let coords: Vec<delaunator::Point> = points
        .iter()
        .map(|p| delaunator::Point { x: p.x, y: p.y })
        .collect();
    let triangulation = delaunator::triangulate(&coords);
    let candidates: Vec<[usize; 3]> = triangulation
        .triangles
        .chunks(3)
        .map(|c| [c[0], c[1], c[2]])
        .collect();

    // every triangle's verdict is independent; order is preserved
    let verdicts: Vec<Verdict> = candidates
        .par_iter()
        .map(|tri| judge(points, tri, params))
        .collect();

    let mut triangles = Vec::new();
    let mut culled_by_edge = 0;
    let mut culled_by_angle = 0;
    for (tri, verdict) in candidates.iter().zip(&verdicts) {
        match verdict {
            Verdict::Keep => triangles.push(Triangle {
                vertices: [
                    points[tri[0]].clone(),
                    points[tri[1]].clone(),
                    points[tri[2]].clone(),
                ],
            }),
            Verdict::CullEdge => culled_by_edge += 1,
            Verdict::CullAngle => culled_by_angle += 1,
        }
    }

    let stats = SurfaceStats {
        point_count: points.len(),
        triangle_count: triangles.len(),
        culled_by_edge,
        culled_by_angle,
    };

    Ok(TriangulatedSurface {
        points: points.to_vec(),
        triangles,
        bounds: BoundingVolume::from_points(points),
        stats,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 5x5 regular grid, spacing 1.0, flat Z = 0.
    fn grid_5x5() -> Vec<Point> {
        let mut points = Vec::new();
        for y in 0..5 {
            for x in 0..5 {
                points.push(Point::new(x as f64, y as f64, 0.0));
            }
        }
        points
    }

    /// A square with one interior point: the only possible triangulation is
    /// the 4 triangles fanning out of the center.
    fn square_with_center(center_z: f64) -> Vec<Point> {
        vec![
            Point::new(0.0, 0.0, 0.0),
            Point::new(4.0, 0.0, 0.0),
            Point::new(4.0, 4.0, 0.0),
            Point::new(0.0, 4.0, 0.0),
            Point::new(2.0, 2.0, center_z),
        ]
    }

    #[test]
    fn flat_grid_triangulates_fully() {
        let surface = build_surface(&grid_5x5(), &SurfaceParams::default()).unwrap();
        // 2n - 2 - h triangles for any triangulation: 50 - 2 - 16
        assert_eq!(surface.triangles.len(), 32);
        assert_eq!(surface.stats.triangle_count, 32);
        assert_eq!(surface.stats.culled_by_edge, 0);
        assert_eq!(surface.stats.culled_by_angle, 0);
        assert_eq!(surface.bounds.min, [0.0, 0.0, 0.0]);
        assert_eq!(surface.bounds.max, [4.0, 4.0, 0.0]);
    }

    #[test]
    fn triangles_hold_vertices_by_value() {
        let points = grid_5x5();
        let surface = build_surface(&points, &SurfaceParams::default()).unwrap();
        for triangle in &surface.triangles {
            for vertex in &triangle.vertices {
                assert!(surface.points.contains(vertex));
            }
        }
    }

    #[test]
    fn raised_center_is_culled_by_3d_edge_length() {
        let points = square_with_center(8.0);
        let params = SurfaceParams {
            max_edge_length: 5.0,
            consider_3d_length: true,
            ..SurfaceParams::default()
        };
        let surface = build_surface(&points, &params).unwrap();
        // all 4 triangles touch the center; each center edge is
        // sqrt(8 + 64) ~ 8.49 in 3D
        assert_eq!(surface.stats.culled_by_edge, 4);
        assert_eq!(surface.triangles.len(), 0);
    }

    #[test]
    fn planar_lengths_ignore_the_raised_center() {
        let points = square_with_center(8.0);
        let params = SurfaceParams {
            max_edge_length: 5.0,
            consider_3d_length: false,
            ..SurfaceParams::default()
        };
        let surface = build_surface(&points, &params).unwrap();
        // in 2D the longest edge is a 4.0 side
        assert_eq!(surface.stats.culled_by_edge, 0);
        assert_eq!(surface.triangles.len(), 4);
    }

    #[test]
    fn zero_threshold_disables_the_edge_cull() {
        let points = square_with_center(8.0);
        let disabled = SurfaceParams {
            max_edge_length: 0.0,
            consider_3d_length: true,
            ..SurfaceParams::default()
        };
        let huge = SurfaceParams {
            max_edge_length: 1e12,
            consider_3d_length: true,
            ..SurfaceParams::default()
        };
        let a = build_surface(&points, &disabled).unwrap();
        let b = build_surface(&points, &huge).unwrap();
        assert_eq!(a.triangles, b.triangles);
        assert_eq!(a.stats.culled_by_edge, 0);
    }

    #[test]
    fn slivers_are_culled_by_minimum_angle() {
        let sliver = vec![
            Point::new(0.0, 0.0, 0.0),
            Point::new(10.0, 0.0, 0.0),
            Point::new(5.0, 0.1, 0.0),
        ];
        let params = SurfaceParams {
            min_angle: 5.0,
            ..SurfaceParams::default()
        };
        let surface = build_surface(&sliver, &params).unwrap();
        assert_eq!(surface.stats.culled_by_angle, 1);
        assert!(surface.triangles.is_empty());

        let relaxed = build_surface(&sliver, &SurfaceParams::default()).unwrap();
        assert_eq!(relaxed.triangles.len(), 1);
        assert_eq!(relaxed.stats.culled_by_angle, 0);

        // zero (or anything non-positive) disables the rule, it is not a 0° limit
        let negative = SurfaceParams {
            min_angle: -1.0,
            ..SurfaceParams::default()
        };
        let disabled = build_surface(&sliver, &negative).unwrap();
        assert_eq!(disabled.triangles, relaxed.triangles);
    }

    #[test]
    fn edge_cull_is_counted_before_the_angle_cull() {
        // fails both rules; only the edge counter may move
        let sliver = vec![
            Point::new(0.0, 0.0, 0.0),
            Point::new(10.0, 0.0, 0.0),
            Point::new(5.0, 0.1, 0.0),
        ];
        let params = SurfaceParams {
            max_edge_length: 5.0,
            min_angle: 5.0,
            ..SurfaceParams::default()
        };
        let surface = build_surface(&sliver, &params).unwrap();
        assert_eq!(surface.stats.culled_by_edge, 1);
        assert_eq!(surface.stats.culled_by_angle, 0);
    }

    #[test]
    fn mesh_bounds_come_from_the_vertex_set() {
        let points = square_with_center(8.0);
        let surface = build_surface(&points, &SurfaceParams::default()).unwrap();
        assert_eq!(surface.bounds.min, [0.0, 0.0, 0.0]);
        assert_eq!(surface.bounds.max, [4.0, 4.0, 8.0]);
    }

    #[test]
    fn under_three_points_is_a_hard_error() {
        let two = vec![Point::new(0.0, 0.0, 0.0), Point::new(1.0, 0.0, 0.0)];
        assert!(matches!(
            build_surface(&two, &SurfaceParams::default()),
            Err(SurfaceError::InsufficientData(2))
        ));
    }
}
