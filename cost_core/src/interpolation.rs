//! # Curve Interpolator
//!
//! Construction costs are only known at the thermal performance levels the
//! library actually contains. A [`CostCurve`] holds those `(x, cost)` samples
//! and answers for any x by piecewise-linear interpolation, or by linear
//! extrapolation from the end segment when x lies within a tolerance band
//! beyond the sampled range.
//!
//! The band is a percentage of the range ends: with 30 % and samples from
//! `x = 1` to `x = 2`, answers exist for `0.7 <= x <= 2.6`. Both bounds are
//! inclusive.
//!
//! ```rust
//! use cost_core::interpolation::{CostCurve, CurveLookup};
//!
//! let curve = CostCurve::new([(2.0, 200.0), (1.0, 100.0)]);
//! assert_eq!(curve.interpolate(1.5, 30.0), Some(150.0));
//! assert_eq!(curve.interpolate(3.0, 30.0), None);
//! assert!(matches!(curve.lookup(2.2, 30.0), CurveLookup::Extrapolated { .. }));
//! ```

use serde::{Deserialize, Serialize};

/// Outcome of a curve lookup
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CurveLookup {
    /// Inside the sampled range, or a single-sample curve
    Interpolated { cost: f64 },
    /// Inside the tolerance band beyond the sampled range
    Extrapolated { cost: f64, range: (f64, f64) },
    /// Beyond the tolerance band
    OutOfRange { range: (f64, f64) },
    /// No samples
    Empty,
}

impl CurveLookup {
    /// The resolved cost, `None` when the lookup failed
    pub fn cost(&self) -> Option<f64> {
        match self {
            CurveLookup::Interpolated { cost } | CurveLookup::Extrapolated { cost, .. } => {
                Some(*cost)
            }
            CurveLookup::OutOfRange { .. } | CurveLookup::Empty => None,
        }
    }
}

/// Sorted, deduplicated `(x, cost)` samples
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CostCurve {
    points: Vec<(f64, f64)>,
}

impl CostCurve {
    /// Build a curve, dropping non-finite samples and exact duplicates and
    /// sorting ascending by x (then by cost).
    pub fn new(points: impl IntoIterator<Item = (f64, f64)>) -> Self {
        let mut points: Vec<(f64, f64)> = points
            .into_iter()
            .filter(|(x, c)| x.is_finite() && c.is_finite())
            .collect();
        points.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.total_cmp(&b.1)));
        points.dedup();
        CostCurve { points }
    }

    pub fn points(&self) -> &[(f64, f64)] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Sampled `(min_x, max_x)`
    pub fn range(&self) -> Option<(f64, f64)> {
        Some((self.points.first()?.0, self.points.last()?.0))
    }

    /// Cost at `x`, `None` when empty or beyond the band
    pub fn interpolate(&self, x: f64, extrapolation_pct: f64) -> Option<f64> {
        self.lookup(x, extrapolation_pct).cost()
    }

    /// Cost at `x`, classified by how it was obtained
    pub fn lookup(&self, x: f64, extrapolation_pct: f64) -> CurveLookup {
        let pts = &self.points;
        let (first, last) = match (pts.first(), pts.last()) {
            (Some(first), Some(last)) => (*first, *last),
            _ => return CurveLookup::Empty,
        };
        if pts.len() == 1 {
            return CurveLookup::Interpolated { cost: first.1 };
        }

        let range = (first.0, last.0);
        if !x.is_finite() {
            return CurveLookup::OutOfRange { range };
        }
        let band = extrapolation_pct / 100.0;
        if x < first.0 * (1.0 - band) || x > last.0 * (1.0 + band) {
            return CurveLookup::OutOfRange { range };
        }

        if x < first.0 {
            return CurveLookup::Extrapolated {
                cost: line(first, pts[1], x),
                range,
            };
        }
        if x > last.0 {
            return CurveLookup::Extrapolated {
                cost: line(last, pts[pts.len() - 2], x),
                range,
            };
        }

        match pts.windows(2).find(|w| w[0].0 <= x && x <= w[1].0) {
            Some(w) => CurveLookup::Interpolated {
                cost: line(w[0], w[1], x),
            },
            None => CurveLookup::OutOfRange { range },
        }
    }
}

/// Linear through `near` and `far` evaluated at `x`; a vertical segment
/// answers with `near`'s cost.
fn line(near: (f64, f64), far: (f64, f64), x: f64) -> f64 {
    let (x0, y0) = near;
    let (x1, y1) = far;
    if x1 == x0 {
        return y0;
    }
    y0 + (y1 - y0) * (x - x0) / (x1 - x0)
}

/// Free-function form over raw samples
pub fn interpolate(points: &[(f64, f64)], x: f64, extrapolation_pct: f64) -> Option<f64> {
    CostCurve::new(points.iter().copied()).interpolate(x, extrapolation_pct)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_point() -> CostCurve {
        CostCurve::new([(1.0, 100.0), (2.0, 200.0)])
    }

    #[test]
    fn test_strictly_between_is_linear() {
        let curve = CostCurve::new([(1.0, 10.0), (3.0, 50.0), (5.0, 60.0)]);
        assert_eq!(curve.interpolate(2.0, 30.0), Some(30.0));
        assert_eq!(curve.interpolate(4.0, 30.0), Some(55.0));
        assert_eq!(two_point().interpolate(1.5, 30.0), Some(150.0));
    }

    #[test]
    fn test_sample_points_return_their_cost() {
        let curve = CostCurve::new([(1.0, 10.0), (3.0, 50.0), (5.0, 60.0)]);
        assert_eq!(curve.interpolate(3.0, 30.0), Some(50.0));
        assert_eq!(curve.interpolate(5.0, 30.0), Some(60.0));
    }

    #[test]
    fn test_single_point_ignores_x() {
        let curve = CostCurve::new([(2.0, 42.0)]);
        assert_eq!(curve.interpolate(-100.0, 30.0), Some(42.0));
        assert_eq!(curve.interpolate(1e9, 0.0), Some(42.0));
    }

    #[test]
    fn test_empty_curve() {
        assert_eq!(CostCurve::default().lookup(1.0, 30.0), CurveLookup::Empty);
        assert_eq!(interpolate(&[], 1.0, 30.0), None);
    }

    #[test]
    fn test_upper_band_is_inclusive() {
        let curve = two_point();
        let edge = 2.0 * (1.0 + 0.3);
        let cost = curve.interpolate(edge, 30.0).unwrap();
        assert!((cost - 260.0).abs() < 1e-9);
        assert_eq!(curve.interpolate(edge * (1.0 + 1e-9), 30.0), None);
    }

    #[test]
    fn test_non_finite_x_is_out_of_range() {
        let curve = two_point();
        assert_eq!(
            curve.lookup(f64::NAN, 30.0),
            CurveLookup::OutOfRange { range: (1.0, 2.0) }
        );
        assert_eq!(curve.interpolate(f64::NAN, 30.0), None);
        assert_eq!(curve.interpolate(f64::INFINITY, 30.0), None);
        assert_eq!(curve.interpolate(f64::NEG_INFINITY, 1000.0), None);
    }

    #[test]
    fn test_lower_band() {
        let curve = two_point();
        assert_eq!(curve.interpolate(0.75, 30.0), Some(75.0));
        assert_eq!(curve.interpolate(0.6, 30.0), None);
        // a wider band reaches further down the same line
        assert_eq!(curve.interpolate(0.5, 50.0), Some(50.0));
        assert_eq!(curve.interpolate(0.5, 30.0), None);
    }

    #[test]
    fn test_extrapolation_uses_end_segment() {
        let curve = CostCurve::new([(1.0, 10.0), (2.0, 20.0), (4.0, 60.0)]);
        // last segment slope is 20 per unit
        assert_eq!(curve.interpolate(5.0, 30.0), Some(80.0));
        match curve.lookup(5.0, 30.0) {
            CurveLookup::Extrapolated { range, .. } => assert_eq!(range, (1.0, 4.0)),
            other => panic!("expected extrapolation, got {other:?}"),
        }
    }

    #[test]
    fn test_duplicates_and_order_normalized() {
        let curve = CostCurve::new([(2.0, 200.0), (1.0, 100.0), (2.0, 200.0), (f64::NAN, 1.0)]);
        assert_eq!(curve.points(), &[(1.0, 100.0), (2.0, 200.0)]);
        assert_eq!(curve.range(), Some((1.0, 2.0)));
    }

    #[test]
    fn test_vertical_segment() {
        let curve = CostCurve::new([(1.0, 100.0), (2.0, 150.0), (2.0, 250.0)]);
        // interior hit on the repeated x resolves to the first bracketing segment
        assert_eq!(curve.interpolate(2.0, 30.0), Some(150.0));
        // beyond the end, the vertical end segment answers with the nearest sample
        assert_eq!(curve.interpolate(2.2, 30.0), Some(250.0));
    }

    #[test]
    fn test_out_of_range_carries_range() {
        assert_eq!(
            two_point().lookup(10.0, 30.0),
            CurveLookup::OutOfRange { range: (1.0, 2.0) }
        );
    }
}
