use itertools::{Itertools, MinMaxResult};

/// (min, max) of the values, (0.0, 0.0) when there are none.
pub fn min_max<I: IntoIterator<Item = f32>>(values: I) -> (f32, f32) {
    match values.into_iter().minmax_by(|a, b| a.total_cmp(b)) {
        MinMaxResult::NoElements => (0.0, 0.0),
        MinMaxResult::OneElement(v) => (v, v),
        MinMaxResult::MinMax(lo, hi) => (lo, hi),
    }
}

pub fn mean<I: IntoIterator<Item = f32>>(values: I) -> f32 {
    let (sum, count) = values
        .into_iter()
        .fold((0.0f64, 0usize), |(s, n), v| (s + v as f64, n + 1));
    if count == 0 {
        0.0
    } else {
        (sum / count as f64) as f32
    }
}

pub const fn cross(v0: &(f32, f32), v1: &(f32, f32)) -> f32 {
    v0.0 * v1.1 - v0.1 * v1.0
}

pub const fn dot(v0: &(f32, f32), v1: &(f32, f32)) -> f32 {
    v0.0 * v1.0 + v0.1 * v1.1
}

/// Unsigned shoelace area of a closed polygon.
pub fn shoelace_area(points: &[(f32, f32)]) -> f32 {
    if points.len() < 3 {
        return 0.0;
    }
    let twice = points
        .iter()
        .circular_tuple_windows()
        .map(|(a, b): (&(f32, f32), &(f32, f32))| cross(a, b))
        .sum::<f32>();
    twice.abs() / 2.0
}

/// Unit normal of the segment a -> b scaled by `len`, None for a zero-length segment.
pub fn scaled_normal(a: &(f32, f32), b: &(f32, f32), len: f32) -> Option<(f32, f32)> {
    let d = (b.0 - a.0, b.1 - a.1);
    let norm = dot(&d, &d).sqrt();
    if norm <= f32::EPSILON {
        None
    } else {
        Some((-d.1 / norm * len, d.0 / norm * len))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_min_max() {
        assert_eq!(min_max([3.0, -1.0, 7.5, 2.0]), (-1.0, 7.5));
        assert_eq!(min_max([4.0]), (4.0, 4.0));
        assert_eq!(min_max(Vec::<f32>::new()), (0.0, 0.0));
    }

    #[test]
    fn test_mean() {
        assert!((mean([1.0, 2.0, 6.0]) - 3.0).abs() < 1e-6);
        assert_eq!(mean(Vec::<f32>::new()), 0.0);
    }

    #[test]
    fn test_cross() {
        let v0 = (1.0, 0.0);
        let v1 = (0.0, 1.0);
        assert!((cross(&v0, &v1) - 1.0).abs() < 1e-6);
        assert!((cross(&v1, &v0) - -1.0).abs() < 1e-6);
    }

    #[test]
    fn test_shoelace_area() {
        let square = [(0.0, 0.0), (4.0, 0.0), (4.0, 4.0), (0.0, 4.0)];
        assert!((shoelace_area(&square) - 16.0).abs() < 1e-6);
        let triangle = [(0.0, 0.0), (4.0, 0.0), (0.0, 3.0)];
        assert!((shoelace_area(&triangle) - 6.0).abs() < 1e-6);
        assert_eq!(shoelace_area(&square[..2]), 0.0);
    }

    #[test]
    fn test_scaled_normal() {
        let n = scaled_normal(&(0.0, 0.0), &(10.0, 0.0), 2.0).unwrap();
        assert!((n.0 - 0.0).abs() < 1e-6);
        assert!((n.1 - 2.0).abs() < 1e-6);
        assert!(scaled_normal(&(1.0, 1.0), &(1.0, 1.0), 2.0).is_none());
    }
}
