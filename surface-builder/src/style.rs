//! Elevation-based fallback coloring for clouds without RGB.

use cloud_core::pointcloud::point::{Color, Point};

/// Five-stop spectrum from low to high elevation.
const RAMP: [[u16; 3]; 5] = [
    [0, 0, 65535],     // blue
    [0, 65535, 65535], // cyan
    [0, 65535, 0],     // green
    [65535, 65535, 0], // yellow
    [65535, 0, 0],     // red
];

fn lerp(a: u16, b: u16, t: f64) -> u16 {
    (a as f64 + (b as f64 - a as f64) * t).round() as u16
}

/// Maps an elevation to the ramp, normalized against the cloud's Z range.
/// A flat cloud maps everything to the midpoint color.
pub fn elevation_color(z: f64, min_z: f64, max_z: f64) -> Color {
    let t = if max_z > min_z {
        ((z - min_z) / (max_z - min_z)).clamp(0.0, 1.0)
    } else {
        0.5
    };

    let scaled = t * (RAMP.len() - 1) as f64;
    let segment = (scaled.floor() as usize).min(RAMP.len() - 2);
    let frac = scaled - segment as f64;

    let low = RAMP[segment];
    let high = RAMP[segment + 1];
    Color {
        r: lerp(low[0], high[0], frac),
        g: lerp(low[1], high[1], frac),
        b: lerp(low[2], high[2], frac),
    }
}

/// Returns a copy of the cloud where every colorless point is colorized by
/// normalized elevation. Points that already carry RGB keep it.
pub fn apply_elevation_colors(points: &[Point], min_z: f64, max_z: f64) -> Vec<Point> {
    points
        .iter()
        .map(|point| {
            let mut out = point.clone();
            if out.color.is_none() {
                out.color = Some(elevation_color(point.z, min_z, max_z));
            }
            out
        })
        .collect()
}
