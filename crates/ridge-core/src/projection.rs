//! Box clipping and projection onto a hyperplane intersected with a box.
//!
//! The projector solves
//!
//! ```text
//! minimize   (ρ/2) Σ (x_i - a_i)²
//! subject to Σ c_i x_i = b,   l_i <= x_i <= u_i
//! ```
//!
//! With a scalar multiplier λ on the equality, each coordinate has the closed
//! form `x_i(λ) = clip(a_i - λ c_i / ρ, l_i, u_i)`, and `g(λ) = Σ c_i x_i(λ)` is
//! continuous, piecewise linear and non-increasing. Its kinks sit where some
//! `x_i(λ)` reaches a bound, so the root of `g(λ) = b` can be located exactly by
//! a search over those breakpoints followed by linear interpolation.
//!
//! The same search also solves `g(λ) - κλ = b` for `κ > 0`, which is the
//! stationarity equation of a squared hinge in the multiplier variable.

use tracing::{debug, trace};

use crate::error::{ensure_finite, ensure_len, ensure_ordered, Error, Result};

/// Relative tolerance for feasibility and residual checks.
///
/// Scaled by `1 + |b| + Σ |c_i| max(|l_i|, |u_i|)`.
pub const RELATIVE_TOLERANCE: f64 = 1e-9;

/// Clip `value` into `[lower, upper]`.
#[inline]
pub fn clip(value: f64, lower: f64, upper: f64) -> f64 {
    if value < lower {
        lower
    } else if value > upper {
        upper
    } else {
        value
    }
}

/// How the multiplier of the equality constraint is searched for.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "method", rename_all = "snake_case"))]
pub enum ProjectionMethod {
    /// Sort the breakpoints and interpolate on the segment holding the root.
    /// Always terminates after O(n log n) work.
    #[default]
    Breakpoint,
    /// Bisect over the breakpoint bracket. Falls back to [`Breakpoint`]
    /// when the residual is still above `tolerance` after `max_iterations`.
    ///
    /// [`Breakpoint`]: ProjectionMethod::Breakpoint
    Bisection { max_iterations: usize, tolerance: f64 },
}

/// Projects target points onto `{x : c·x = b} ∩ box`.
///
/// Borrowed view over a term's immutable structure; building one is free.
#[derive(Debug, Clone, Copy)]
pub struct HyperplaneProjector<'a> {
    coefficients: &'a [f64],
    lower_bounds: &'a [f64],
    upper_bounds: &'a [f64],
    constant: f64,
    step_size: f64,
    method: ProjectionMethod,
}

impl<'a> HyperplaneProjector<'a> {
    /// Create a projector, validating lengths, bounds and step size.
    pub fn new(
        coefficients: &'a [f64],
        lower_bounds: &'a [f64],
        upper_bounds: &'a [f64],
        constant: f64,
        step_size: f64,
    ) -> Result<Self> {
        let n = coefficients.len();
        ensure_len("lower_bounds", n, lower_bounds.len())?;
        ensure_len("upper_bounds", n, upper_bounds.len())?;
        ensure_finite("coefficients", coefficients)?;
        ensure_finite("lower_bounds", lower_bounds)?;
        ensure_finite("upper_bounds", upper_bounds)?;
        ensure_finite("constant", &[constant])?;
        ensure_ordered(lower_bounds, upper_bounds)?;
        if !(step_size.is_finite() && step_size > 0.0) {
            return Err(Error::InvalidStepSize(step_size));
        }

        Ok(Self::new_unchecked(
            coefficients,
            lower_bounds,
            upper_bounds,
            constant,
            step_size,
        ))
    }

    /// Create a projector from inputs already validated by the caller.
    pub(crate) fn new_unchecked(
        coefficients: &'a [f64],
        lower_bounds: &'a [f64],
        upper_bounds: &'a [f64],
        constant: f64,
        step_size: f64,
    ) -> Self {
        Self {
            coefficients,
            lower_bounds,
            upper_bounds,
            constant,
            step_size,
            method: ProjectionMethod::Breakpoint,
        }
    }

    /// Select the multiplier search strategy.
    pub fn with_method(mut self, method: ProjectionMethod) -> Self {
        self.method = method;
        self
    }

    /// Number of coordinates.
    pub fn arity(&self) -> usize {
        self.coefficients.len()
    }

    /// Minimizer of `(ρ/2)‖x - a‖²` on the hyperplane inside the box.
    pub fn project(&self, targets: &[f64]) -> Result<Vec<f64>> {
        self.solve(targets, 0.0)
    }

    /// Solve `Σ c_i x_i(λ) - κλ = b` and return `x(λ*)`.
    ///
    /// `kappa = 0` is the plain projection. For `kappa > 0` a root always
    /// exists, so [`Error::Infeasible`] is only possible with `kappa = 0`.
    /// A negative or non-finite `kappa` is rejected with [`Error::InvalidSlope`].
    pub fn solve(&self, targets: &[f64], kappa: f64) -> Result<Vec<f64>> {
        ensure_len("targets", self.arity(), targets.len())?;
        ensure_finite("targets", targets)?;
        if !(kappa.is_finite() && kappa >= 0.0) {
            return Err(Error::InvalidSlope(kappa));
        }

        let lambda = match self.method {
            ProjectionMethod::Breakpoint => self.exact_multiplier(targets, kappa)?,
            ProjectionMethod::Bisection {
                max_iterations,
                tolerance,
            } => match self.bisect_multiplier(targets, kappa, max_iterations, tolerance) {
                Some(lambda) => lambda,
                None => {
                    debug!(
                        arity = self.arity(),
                        max_iterations, "bisection did not converge, using breakpoint search"
                    );
                    self.exact_multiplier(targets, kappa)?
                }
            },
        };

        let point: Vec<f64> = (0..self.arity())
            .map(|i| self.coordinate_at(targets, i, lambda))
            .collect();

        let residual = (self.dot(&point) - kappa * lambda - self.constant).abs();
        let tolerance = RELATIVE_TOLERANCE * self.scale();
        if !(residual <= tolerance) {
            return Err(Error::NotConverged {
                residual,
                tolerance,
            });
        }

        Ok(point)
    }

    /// `x_i(λ)`.
    #[inline]
    fn coordinate_at(&self, targets: &[f64], i: usize, lambda: f64) -> f64 {
        let c = self.coefficients[i];
        if c == 0.0 {
            return clip(targets[i], self.lower_bounds[i], self.upper_bounds[i]);
        }
        clip(
            targets[i] - lambda * c / self.step_size,
            self.lower_bounds[i],
            self.upper_bounds[i],
        )
    }

    /// `F(λ) = Σ c_i x_i(λ) - κλ`, non-increasing in λ.
    fn value_at(&self, targets: &[f64], lambda: f64, kappa: f64) -> f64 {
        let total: f64 = (0..self.arity())
            .filter(|&i| self.coefficients[i] != 0.0)
            .map(|i| self.coefficients[i] * self.coordinate_at(targets, i, lambda))
            .sum();
        total - kappa * lambda
    }

    fn dot(&self, point: &[f64]) -> f64 {
        self.coefficients.iter().zip(point).map(|(c, x)| c * x).sum()
    }

    fn scale(&self) -> f64 {
        let spread: f64 = self
            .coefficients
            .iter()
            .zip(self.lower_bounds.iter().zip(self.upper_bounds))
            .map(|(c, (lo, hi))| c.abs() * lo.abs().max(hi.abs()))
            .sum();
        1.0 + self.constant.abs() + spread
    }

    /// Sorted, de-duplicated multipliers at which a coordinate meets a bound.
    fn breakpoints(&self, targets: &[f64]) -> Vec<f64> {
        let mut points = Vec::with_capacity(2 * self.arity());
        for (i, &c) in self.coefficients.iter().enumerate() {
            if c == 0.0 {
                continue;
            }
            points.push(self.step_size * (targets[i] - self.lower_bounds[i]) / c);
            points.push(self.step_size * (targets[i] - self.upper_bounds[i]) / c);
        }
        points.retain(|p| p.is_finite());
        points.sort_by(f64::total_cmp);
        points.dedup();
        points
    }

    /// Exact root of `F(λ) = b` over the piecewise-linear segments.
    fn exact_multiplier(&self, targets: &[f64], kappa: f64) -> Result<f64> {
        let target = self.constant;
        let points = self.breakpoints(targets);
        let tolerance = RELATIVE_TOLERANCE * self.scale();

        // Outside the breakpoints every active coordinate sits on a bound, so
        // F has slope -κ there.
        let (Some(&first), Some(&last)) = (points.first(), points.last()) else {
            // No coordinate moves with λ: Σ c_i x_i is identically zero.
            if kappa > 0.0 {
                return Ok(-target / kappa);
            }
            if target.abs() <= tolerance {
                return Ok(0.0);
            }
            return Err(self.infeasible(0.0, 0.0));
        };

        let f_first = self.value_at(targets, first, kappa);
        let f_last = self.value_at(targets, last, kappa);

        if target > f_first {
            if kappa > 0.0 {
                return Ok(first - (target - f_first) / kappa);
            }
            if target - f_first <= tolerance {
                return Ok(first);
            }
            return Err(self.infeasible(f_last, f_first));
        }
        if target < f_last {
            if kappa > 0.0 {
                return Ok(last + (f_last - target) / kappa);
            }
            if f_last - target <= tolerance {
                return Ok(last);
            }
            return Err(self.infeasible(f_last, f_first));
        }

        // Invariant: F(points[lo]) >= target >= F(points[hi]).
        let (mut lo, mut hi) = (0, points.len() - 1);
        let (mut f_lo, mut f_hi) = (f_first, f_last);
        while hi - lo > 1 {
            let mid = lo + (hi - lo) / 2;
            let f_mid = self.value_at(targets, points[mid], kappa);
            if f_mid >= target {
                lo = mid;
                f_lo = f_mid;
            } else {
                hi = mid;
                f_hi = f_mid;
            }
        }

        // Flat segment: every λ on it yields the same point.
        if f_lo - f_hi <= 0.0 {
            return Ok(points[lo]);
        }
        let t = (f_lo - target) / (f_lo - f_hi);
        Ok(points[lo] + t * (points[hi] - points[lo]))
    }

    /// Bisection inside the breakpoint bracket. `None` when the bracket does
    /// not contain the root or the residual never drops below `tolerance`.
    fn bisect_multiplier(
        &self,
        targets: &[f64],
        kappa: f64,
        max_iterations: usize,
        tolerance: f64,
    ) -> Option<f64> {
        let target = self.constant;
        let points = self.breakpoints(targets);
        let (mut lo, mut hi) = (*points.first()?, *points.last()?);

        let f_lo = self.value_at(targets, lo, kappa);
        let f_hi = self.value_at(targets, hi, kappa);
        if target > f_lo || target < f_hi {
            return None;
        }

        for iteration in 0..max_iterations {
            let mid = 0.5 * (lo + hi);
            let f_mid = self.value_at(targets, mid, kappa);
            if (f_mid - target).abs() <= tolerance {
                trace!(iteration, lambda = mid, "bisection converged");
                return Some(mid);
            }
            if f_mid > target {
                lo = mid;
            } else {
                hi = mid;
            }
        }
        None
    }

    fn infeasible(&self, reachable_min: f64, reachable_max: f64) -> Error {
        debug!(
            constant = self.constant,
            reachable_min, reachable_max, "hyperplane does not meet the box"
        );
        Error::Infeasible {
            constant: self.constant,
            reachable_min,
            reachable_max,
        }
    }
}
