//! Scale/offset derivation for coordinate quantization.

use cloud_core::pointcloud::point::BoundingVolume;

/// Quantization parameters for one axis: `real = raw * scale + offset`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleOffset {
    pub scale: f64,
    pub offset: f64,
}

const SCALE_FLOOR_EXP: i32 = -7;
const SCALE_START_EXP: i32 = -3;
const MAX_QUANTIZED_RANGE: f64 = 2_000_000_000.0;
const MIN_QUANTIZED_RANGE: f64 = 1000.0;

/// Derives per-axis quantization from a bounding box. The offset is the
/// axis midpoint, which centers the quantized values on zero and leaves the
/// full signed 32-bit span available in both directions. The scale starts
/// at 1 mm and widens by decades while the quantized range would overflow
/// a 32-bit integer, then narrows by decades while the range is under 1000
/// steps, stopping at the 1e-7 floor. The scale exponent is tracked as an
/// integer so the floor is exact and results are reproducible.
pub fn compute(bounds: &BoundingVolume) -> [ScaleOffset; 3] {
    [
        compute_axis(bounds.min[0], bounds.max[0]),
        compute_axis(bounds.min[1], bounds.max[1]),
        compute_axis(bounds.min[2], bounds.max[2]),
    ]
}

pub fn compute_axis(min: f64, max: f64) -> ScaleOffset {
    let offset = (min + max) / 2.0;
    let range = (max - min).abs();

    let mut exp = SCALE_START_EXP;
    while range / 10f64.powi(exp) > MAX_QUANTIZED_RANGE {
        exp += 1;
    }
    while range / 10f64.powi(exp) < MIN_QUANTIZED_RANGE && exp > SCALE_FLOOR_EXP {
        exp -= 1;
    }

    ScaleOffset {
        scale: 10f64.powi(exp),
        offset,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_is_the_midpoint() {
        let so = compute_axis(100.0, 300.0);
        assert_eq!(so.offset, 200.0);
    }

    #[test]
    fn metric_survey_extent_keeps_millimeter_scale() {
        // 2 km of range quantizes to 2e6 steps at 1 mm
        let so = compute_axis(0.0, 2000.0);
        assert_eq!(so.scale, 10f64.powi(-3));
    }

    #[test]
    fn huge_extent_widens_the_scale() {
        let so = compute_axis(0.0, 20_000_000.0);
        assert_eq!(so.scale, 10f64.powi(-2));
        let range = 20_000_000.0;
        assert!(range / so.scale <= 2_000_000_000.0);
        assert!(range / so.scale >= 1000.0);
    }

    #[test]
    fn tiny_extent_narrows_until_the_floor() {
        let so = compute_axis(0.0, 1e-6);
        assert_eq!(so.scale, 10f64.powi(-7));
    }

    #[test]
    fn flat_axis_bottoms_out_at_the_floor() {
        let so = compute_axis(5.0, 5.0);
        assert_eq!(so.scale, 10f64.powi(-7));
        assert_eq!(so.offset, 5.0);
    }

    #[test]
    fn same_bounds_always_yield_same_result() {
        let a = compute_axis(-123.456, 987.654);
        for _ in 0..100 {
            assert_eq!(compute_axis(-123.456, 987.654), a);
        }
    }

    #[test]
    fn resulting_range_is_within_the_contract() {
        for range in [0.5, 12.0, 5_000.0, 1e7, 3e9, 7e11] {
            let so = compute_axis(0.0, range);
            let steps = range / so.scale;
            let at_floor = so.scale == 10f64.powi(SCALE_FLOOR_EXP);
            assert!(
                (MIN_QUANTIZED_RANGE..=MAX_QUANTIZED_RANGE).contains(&steps) || at_floor,
                "range {} scale {} steps {}",
                range,
                so.scale,
                steps
            );
        }
    }
}
