//! Definite integration over irregularly weighted height samples.
//!
//! Every rule works on a sample source `a` (see [`Samples`]) and a weight
//! sequence `dh` (the layer thickness), both addressed by the same 0-based
//! height index. The integration span `[lower, upper]` is inclusive.
//!
//! The rules carry discretization constraints that are *not* checked here:
//! Simpson needs an even number of intervals and Boole a multiple of four.
//! When those don't hold the formulas still produce a number, it just isn't
//! the integral. Use [`Method::check_intervals`] where that matters.

use std::fmt;
use std::ops::{Add, Div, Mul};

use log::warn;
use ndarray::{Array2, ArrayView3, Axis};
use serde::{Deserialize, Serialize};

use crate::error::RtmError;

/// A value produced by integrating: a scalar or a whole batch of them.
pub trait Sample:
    Clone + Add<Output = Self> + Mul<f64, Output = Self> + Div<f64, Output = Self>
{
    /// A value of the same shape with every element zero.
    fn zeros_like(&self) -> Self;
}

impl Sample for f64 {
    fn zeros_like(&self) -> Self {
        0.
    }
}

impl Sample for Array2<f64> {
    fn zeros_like(&self) -> Self {
        Array2::zeros(self.raw_dim())
    }
}

/// Something that can be addressed by height index.
///
/// There is one implementation per supported shape, so the shape is picked
/// by the type at the call site:
///
/// - [`Broadcast`]: a single value, the index is ignored
/// - `[V]`: a 1-D sequence indexed directly
/// - [`ArrayView3`]: a batched tensor indexed along its last axis
///
/// # Panics
///
/// Addressing outside of the sequence panics.
pub trait Samples {
    /// Value at a single height.
    type Value: Sample;

    /// The sample at height `index`.
    fn at(&self, index: usize) -> Self::Value;
}

/// A scalar that stands in for every height.
#[derive(Debug, Clone, Copy)]
pub struct Broadcast<V>(pub V);

impl<V: Sample> Samples for Broadcast<V> {
    type Value = V;

    fn at(&self, _index: usize) -> V {
        self.0.clone()
    }
}

impl<V: Sample> Samples for [V] {
    type Value = V;

    fn at(&self, index: usize) -> V {
        self[index].clone()
    }
}

impl Samples for ArrayView3<'_, f64> {
    type Value = Array2<f64>;

    fn at(&self, index: usize) -> Array2<f64> {
        self.index_axis(Axis(2), index).to_owned()
    }
}

/// Samples that were stacked starting from height `offset` rather than 0.
struct Shifted<'a, V> {
    offset: usize,
    values: &'a [V],
}

impl<V: Sample> Samples for Shifted<'_, V> {
    type Value = V;

    fn at(&self, index: usize) -> V {
        self.values[index - self.offset].clone()
    }
}

/// Quadrature rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Method {
    /// Trapezoidal rule, exact for polynomials up to degree 1
    Trapezoidal,
    /// Simpson's rule, exact up to degree 3; needs an even interval count
    Simpson,
    /// Boole's rule, exact up to degree 5; needs a multiple of 4 intervals
    #[default]
    Boole,
}

impl Method {
    /// Every rule, in the order they are usually presented.
    pub const ALL: [Method; 3] = [Method::Trapezoidal, Method::Simpson, Method::Boole];

    /// Look up a rule by name.
    ///
    /// Names that aren't recognized fall back to [`Method::Boole`], which is
    /// how existing configurations have always behaved.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "trapezoidal" | "trapz" | "trapezoid" => Method::Trapezoidal,
            "simpson" => Method::Simpson,
            "boole" => Method::Boole,
            other => {
                warn!("unknown integration method {other:?}, using Boole's rule");
                Method::Boole
            }
        }
    }

    /// Canonical name of the rule.
    pub fn name(self) -> &'static str {
        match self {
            Method::Trapezoidal => "trapezoidal",
            Method::Simpson => "simpson",
            Method::Boole => "boole",
        }
    }

    /// Check that the rule is valid over `intervals` height intervals.
    pub fn check_intervals(self, intervals: usize) -> Result<(), RtmError> {
        let ok = match self {
            Method::Trapezoidal => true,
            Method::Simpson => intervals % 2 == 0,
            Method::Boole => intervals % 4 == 0,
        };
        if ok {
            Ok(())
        } else {
            Err(RtmError::IncompatibleSampleCount {
                method: self,
                intervals,
            })
        }
    }

    /// Integrate the samples `a` weighted by `dh` over `[lower, upper]`.
    ///
    /// # Panics
    ///
    /// If `upper` is past the end of `a` or `dh`.
    pub fn integrate<S>(self, a: &S, lower: usize, upper: usize, dh: &[f64]) -> S::Value
    where
        S: Samples + ?Sized,
    {
        match self {
            Method::Trapezoidal => trapezoidal(a, lower, upper, dh),
            Method::Simpson => simpson(a, lower, upper, dh),
            Method::Boole => boole(a, lower, upper, dh),
        }
    }

    /// Integrate a function of the height index over `[lower, upper]`.
    ///
    /// The function is evaluated once at every index in the span, and the
    /// stacked values are then integrated as samples. When `f` returns a
    /// batch, the height index ends up as the trailing axis.
    pub fn integrate_callable<V, F>(self, f: F, lower: usize, upper: usize, dh: &[f64]) -> V
    where
        V: Sample,
        F: FnMut(usize) -> V,
    {
        let values: Vec<V> = (lower..=upper).map(f).collect();
        let shifted = Shifted {
            offset: lower,
            values: &values,
        };
        self.integrate(&shifted, lower, upper, dh)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<String> for Method {
    fn from(name: String) -> Self {
        Method::from_name(&name)
    }
}

impl From<Method> for String {
    fn from(method: Method) -> Self {
        method.name().to_string()
    }
}

/// `a[i] * dh[i]` at one height.
fn weighted<S: Samples + ?Sized>(a: &S, dh: &[f64], index: usize) -> S::Value {
    a.at(index) * dh[index]
}

/// Weighted sum over the heights `start, start + step, ...` strictly below
/// `stop`. An empty stride sums to zero.
fn strided_sum<S: Samples + ?Sized>(
    a: &S,
    dh: &[f64],
    start: usize,
    stop: usize,
    step: usize,
    zero: S::Value,
) -> S::Value {
    (start..stop)
        .step_by(step)
        .fold(zero, |acc, i| acc + weighted(a, dh, i))
}

fn trapezoidal<S: Samples + ?Sized>(a: &S, lower: usize, upper: usize, dh: &[f64]) -> S::Value {
    let edges = weighted(a, dh, lower) + weighted(a, dh, upper);
    let inner = strided_sum(a, dh, lower + 1, upper, 1, edges.zeros_like());
    inner + edges / 2.
}

fn simpson<S: Samples + ?Sized>(a: &S, lower: usize, upper: usize, dh: &[f64]) -> S::Value {
    let edges = weighted(a, dh, lower) + weighted(a, dh, upper);
    let zero = edges.zeros_like();
    let odd = strided_sum(a, dh, lower + 1, upper, 2, zero.clone());
    let even = strided_sum(a, dh, lower + 2, upper, 2, zero);
    (edges + odd * 4. + even * 2.) / 3.
}

fn boole<S: Samples + ?Sized>(a: &S, lower: usize, upper: usize, dh: &[f64]) -> S::Value {
    let edges = weighted(a, dh, lower) + weighted(a, dh, upper);
    let zero = edges.zeros_like();
    let odd = strided_sum(a, dh, lower + 1, upper, 2, zero.clone());
    let middle = strided_sum(a, dh, lower + 2, upper, 4, zero.clone());
    let quarter = strided_sum(a, dh, lower + 4, upper, 4, zero);
    (edges * 14. + odd * 64. + middle * 24. + quarter * 28.) / 45.
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use ndarray::Array3;

    use super::*;

    /// Evaluate a polynomial with coefficients in ascending order.
    fn poly(coef: &[f64], x: f64) -> f64 {
        coef.iter().rev().fold(0., |acc, c| acc * x + c)
    }

    /// Exact integral of the polynomial over `[0, x]`.
    fn poly_integral(coef: &[f64], x: f64) -> f64 {
        coef.iter()
            .enumerate()
            .map(|(n, c)| c * x.powi(n as i32 + 1) / (n as f64 + 1.))
            .sum()
    }

    fn check_exact(method: Method, coef: &[f64], intervals: usize) {
        let h = 0.25;
        let a: Vec<f64> = (0..=intervals).map(|i| poly(coef, i as f64 * h)).collect();
        let dh = vec![h; a.len()];
        let result = method.integrate(a.as_slice(), 0, intervals, &dh);
        assert_abs_diff_eq!(
            result,
            poly_integral(coef, intervals as f64 * h),
            epsilon = 1e-10
        );
    }

    #[test]
    fn trapezoidal_exact_for_lines() {
        check_exact(Method::Trapezoidal, &[1.5, -2.], 7);
        check_exact(Method::Trapezoidal, &[3.], 1);
    }

    #[test]
    fn simpson_exact_for_cubics() {
        check_exact(Method::Simpson, &[1., 2., -3., 0.5], 8);
        check_exact(Method::Simpson, &[0., 0., 0., 1.], 2);
    }

    #[test]
    fn boole_exact_for_quintics() {
        check_exact(Method::Boole, &[1., -1., 2., 0.5, -0.25, 0.125], 8);
        check_exact(Method::Boole, &[0., 0., 0., 0., 0., 1.], 4);
    }

    #[test]
    fn three_sample_profile() {
        let g = [0.1, 0.2, 0.1];
        let dh = [1., 1., 1.];

        // 0.2 + (0.1 + 0.1) / 2
        assert_abs_diff_eq!(
            Method::Trapezoidal.integrate(&g[..], 0, 2, &dh),
            0.3,
            epsilon = 1e-15
        );
        // (0.1 + 0.1 + 4 * 0.2) / 3
        assert_abs_diff_eq!(
            Method::Simpson.integrate(&g[..], 0, 2, &dh),
            1. / 3.,
            epsilon = 1e-15
        );
        // (14 * 0.2 + 64 * 0.2) / 45, there is no room for the stride-4 terms
        assert_abs_diff_eq!(
            Method::Boole.integrate(&g[..], 0, 2, &dh),
            15.6 / 45.,
            epsilon = 1e-15
        );
    }

    #[test]
    fn subrange_uses_absolute_indices() {
        let a = [100., 1., 2., 3., 100.];
        let dh = [1., 1., 2., 1., 1.];
        // 2 * 2 + (1 + 3) / 2
        assert_abs_diff_eq!(
            Method::Trapezoidal.integrate(&a[..], 1, 3, &dh),
            6.,
            epsilon = 1e-15
        );
    }

    #[test]
    fn single_point_span() {
        let a = [2.];
        let dh = [0.5];
        assert_abs_diff_eq!(Method::Trapezoidal.integrate(&a[..], 0, 0, &dh), 1.);
        assert_abs_diff_eq!(Method::Simpson.integrate(&a[..], 0, 0, &dh), 2. / 3.);
        assert_abs_diff_eq!(Method::Boole.integrate(&a[..], 0, 0, &dh), 28. / 45.);
    }

    #[test]
    fn broadcast_ignores_index() {
        let dh = [1., 2., 3., 4., 5.];
        let result = Method::Trapezoidal.integrate(&Broadcast(2.), 0, 4, &dh);
        // 2 * (2 + 3 + 4) + 2 * (1 + 5) / 2
        assert_abs_diff_eq!(result, 24., epsilon = 1e-12);
    }

    #[test]
    fn callable_matches_samples() {
        let a: Vec<f64> = (0..9).map(|i| (i as f64 * 0.3).sin()).collect();
        let dh: Vec<f64> = (0..9).map(|i| 0.1 + 0.01 * i as f64).collect();
        for method in Method::ALL {
            let direct = method.integrate(a.as_slice(), 0, 8, &dh);
            let lazy = method.integrate_callable(|i| a[i], 0, 8, &dh);
            assert_eq!(direct, lazy);

            let direct = method.integrate(a.as_slice(), 2, 6, &dh);
            let lazy = method.integrate_callable(|i| a[i], 2, 6, &dh);
            assert_eq!(direct, lazy);
        }
    }

    #[test]
    fn batched_tensor_matches_scalar() {
        let heights = 5;
        let tensor = Array3::from_shape_fn((2, 3, heights), |(i, j, k)| {
            (i + 1) as f64 * 0.5 + j as f64 - 0.1 * k as f64
        });
        let dh = [1., 0.5, 0.5, 1., 2.];

        for method in Method::ALL {
            let batched = method.integrate(&tensor.view(), 0, heights - 1, &dh);
            assert_eq!(batched.dim(), (2, 3));
            for i in 0..2 {
                for j in 0..3 {
                    let column: Vec<f64> = (0..heights).map(|k| tensor[[i, j, k]]).collect();
                    let scalar = method.integrate(column.as_slice(), 0, heights - 1, &dh);
                    assert_abs_diff_eq!(batched[[i, j]], scalar, epsilon = 1e-12);
                }
            }

            // Stacking a batch per height puts the height on the trailing axis
            let lazy = method.integrate_callable(
                |k| tensor.index_axis(Axis(2), k).to_owned(),
                0,
                heights - 1,
                &dh,
            );
            assert_eq!(lazy, batched);
        }
    }

    #[test]
    #[should_panic]
    fn out_of_range_panics() {
        let a = [1., 2.];
        let dh = [1., 1.];
        Method::Trapezoidal.integrate(&a[..], 0, 2, &dh);
    }

    #[test]
    fn method_names() {
        assert_eq!(Method::from_name("Trapezoidal"), Method::Trapezoidal);
        assert_eq!(Method::from_name("simpson"), Method::Simpson);
        assert_eq!(Method::from_name(" boole "), Method::Boole);
        assert_eq!(Method::from_name("gauss-legendre"), Method::Boole);
        for method in Method::ALL {
            assert_eq!(Method::from_name(method.name()), method);
        }
    }

    #[test]
    fn interval_constraints() {
        assert!(Method::Trapezoidal.check_intervals(3).is_ok());
        assert!(Method::Simpson.check_intervals(4).is_ok());
        assert!(Method::Simpson.check_intervals(0).is_ok());
        assert!(matches!(
            Method::Simpson.check_intervals(3),
            Err(RtmError::IncompatibleSampleCount { intervals: 3, .. })
        ));
        assert!(Method::Boole.check_intervals(8).is_ok());
        assert!(Method::Boole.check_intervals(6).is_err());
    }
}
