//! # Material Property Evaluation
//!
//! Temperature-dependent wheel modulus, the Hertz equivalent modulus of the
//! pair, and allowable stress from an S-N curve.
//!
//! All lookups are piecewise-linear with the end values held flat outside
//! the tabulated range. Curves are sorted here before use, so cards do not
//! have to be stored in order.

use tracing::{debug, warn};

use super::{CurvePoint, WheelMaterial};
use crate::units::{Gigapascals, Megapascals};

/// Piecewise-linear interpolation over `(x, y)` points sorted by x.
///
/// Outside the range the boundary y is returned. Repeated x values are
/// allowed; the segment to the right of the last repeat is used. Returns
/// `None` for an empty curve and NaN for a NaN `x`.
pub fn interp(x: f64, points: &[(f64, f64)]) -> Option<f64> {
    let (first, last) = (points.first()?, points.last()?);
    if x.is_nan() {
        return Some(f64::NAN);
    }
    if x <= first.0 {
        return Some(first.1);
    }
    if x >= last.0 {
        return Some(last.1);
    }

    // points[j].0 <= x < points[j + 1].0
    let j = points.partition_point(|p| p.0 <= x) - 1;
    let (x0, y0) = points[j];
    let (x1, y1) = points[j + 1];
    let slope = (y1 - y0) / (x1 - x0);
    Some(slope * (x - x0) + y0)
}

/// Copy of `curve` as tuples sorted ascending by key.
fn sorted_by_key(curve: &[CurvePoint]) -> Vec<(f64, f64)> {
    let mut points: Vec<(f64, f64)> = curve.iter().map(|p| (p[0], p[1])).collect();
    if !points.windows(2).all(|w| w[0].0 <= w[1].0) {
        debug!(points = points.len(), "curve not stored in ascending order, sorting");
        points.sort_by(|a, b| a.0.total_cmp(&b.0));
    }
    points
}

/// Wheel elastic modulus at a temperature.
///
/// Interpolates `elastic_T.points_C_GPa`; with no points the card's flat
/// `elastic.E_GPa` is used (2.0 GPa when that is absent too).
pub fn interpolate_modulus(wheel: &WheelMaterial, temp_c: f64) -> Gigapascals {
    let points = sorted_by_key(&wheel.elastic_t.points);
    match interp(temp_c, &points) {
        Some(e) => Gigapascals(e),
        None => wheel.flat_e(),
    }
}

/// Hertz reduced modulus of two bodies in contact.
///
/// ```text
/// E' = 2 / [ (1 − ν1²)/E1 + (1 − ν2²)/E2 ]
/// ```
pub fn equivalent_modulus(e1: Gigapascals, nu1: f64, e2: Gigapascals, nu2: f64) -> Gigapascals {
    Gigapascals(2.0 / ((1.0 - nu1 * nu1) / e1.0 + (1.0 - nu2 * nu2) / e2.0))
}

/// Allowable stress at `n_cycles` from `[N, MPa]` points.
///
/// Interpolation is linear in log10(N) against stress. Points with N ≤ 0
/// have no logarithm and are ignored. `None` when no usable point remains.
pub fn interpolate_allowable(curve: &[CurvePoint], n_cycles: f64) -> Option<Megapascals> {
    if curve.is_empty() {
        return None;
    }

    let usable: Vec<CurvePoint> = curve.iter().copied().filter(|p| p[0] > 0.0).collect();
    if usable.len() < curve.len() {
        warn!(
            dropped = curve.len() - usable.len(),
            "S-N points with non-positive N ignored"
        );
    }

    let log_points: Vec<(f64, f64)> = sorted_by_key(&usable)
        .into_iter()
        .map(|(n, s)| (n.log10(), s))
        .collect();
    interp(n_cycles.log10(), &log_points).map(Megapascals)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wheel_with_points(points: Vec<CurvePoint>) -> WheelMaterial {
        let mut wheel = WheelMaterial::default();
        wheel.elastic_t.points = points;
        wheel
    }

    #[test]
    fn test_interp_inside_and_clamped() {
        let pts = [(0.0, 10.0), (10.0, 20.0), (20.0, 0.0)];
        assert_eq!(interp(5.0, &pts), Some(15.0));
        assert_eq!(interp(15.0, &pts), Some(10.0));
        assert_eq!(interp(-3.0, &pts), Some(10.0));
        assert_eq!(interp(99.0, &pts), Some(0.0));
        assert_eq!(interp(10.0, &pts), Some(20.0));
        assert_eq!(interp(1.0, &[]), None);
    }

    #[test]
    fn test_interp_single_point() {
        assert_eq!(interp(-1.0, &[(2.0, 7.0)]), Some(7.0));
        assert_eq!(interp(5.0, &[(2.0, 7.0)]), Some(7.0));
    }

    #[test]
    fn test_interp_repeated_x() {
        let pts = [(0.0, 0.0), (1.0, 5.0), (1.0, 8.0), (2.0, 10.0)];
        let y = interp(1.5, &pts).unwrap();
        assert!((y - 9.0).abs() < 1e-12);
    }

    #[test]
    fn test_modulus_interpolation() {
        let wheel = wheel_with_points(vec![[23.0, 3.0], [80.0, 1.8], [120.0, 1.2]]);
        assert!((interpolate_modulus(&wheel, 80.0).0 - 1.8).abs() < 1e-12);
        assert!((interpolate_modulus(&wheel, 100.0).0 - 1.5).abs() < 1e-12);
        // clamped outside the range
        assert_eq!(interpolate_modulus(&wheel, -40.0).0, 3.0);
        assert_eq!(interpolate_modulus(&wheel, 200.0).0, 1.2);
    }

    #[test]
    fn test_modulus_sorts_unsorted_points() {
        let sorted = wheel_with_points(vec![[23.0, 3.0], [80.0, 1.8], [120.0, 1.2]]);
        let shuffled = wheel_with_points(vec![[120.0, 1.2], [23.0, 3.0], [80.0, 1.8]]);
        for t in [0.0, 50.0, 95.0, 130.0] {
            assert_eq!(interpolate_modulus(&sorted, t), interpolate_modulus(&shuffled, t));
        }
    }

    #[test]
    fn test_modulus_flat_fallback() {
        let wheel = WheelMaterial::default();
        assert_eq!(interpolate_modulus(&wheel, 80.0).0, 2.0);

        let mut wheel = WheelMaterial::default();
        wheel.elastic = Some(crate::materials::ElasticConstants {
            e_gpa: Some(2.8),
            nu: None,
        });
        assert_eq!(interpolate_modulus(&wheel, 80.0).0, 2.8);
    }

    #[test]
    fn test_equivalent_modulus() {
        // Equal bodies: E' = E / (1 - nu²)
        let e = equivalent_modulus(Gigapascals(200.0), 0.3, Gigapascals(200.0), 0.3);
        assert!((e.0 - 200.0 / 0.91).abs() < 1e-9);

        // Steel on polymer is dominated by the polymer
        let e = equivalent_modulus(Gigapascals(210.0), 0.3, Gigapascals(1.8), 0.4);
        assert!(e.0 > 3.4 && e.0 < 4.3);
    }

    #[test]
    fn test_allowable_log_interpolation() {
        let curve = vec![[1e6, 60.0], [1e8, 40.0]];
        // log10(1e7) is halfway
        let s = interpolate_allowable(&curve, 1e7).unwrap();
        assert!((s.0 - 50.0).abs() < 1e-9);
        // clamped
        assert_eq!(interpolate_allowable(&curve, 10.0).unwrap().0, 60.0);
        assert_eq!(interpolate_allowable(&curve, 1e12).unwrap().0, 40.0);
    }

    #[test]
    fn test_allowable_unsorted_and_empty() {
        let curve = vec![[1e8, 40.0], [1e6, 60.0]];
        let s = interpolate_allowable(&curve, 1e7).unwrap();
        assert!((s.0 - 50.0).abs() < 1e-9);
        assert_eq!(interpolate_allowable(&[], 1e7), None);
        assert_eq!(interpolate_allowable(&[[0.0, 10.0]], 1e7), None);
    }
}
