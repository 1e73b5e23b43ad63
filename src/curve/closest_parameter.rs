use argmin::core::{ArgminFloat, Executor, State};
use nalgebra::allocator::Allocator;
use nalgebra::{DefaultAllocator, DimName, DimNameDiff, DimNameSub, OPoint, U1};

use crate::closest_parameter::{ClosestParameterNewton, CurveClosestParameterProblem};
use crate::error::{CurveError, Result};
use crate::misc::{segment_closest_point, FloatingPoint};

use super::NurbsCurve;

const NEWTON_ITERATIONS: u64 = 16;

impl<T: FloatingPoint, D: DimName> NurbsCurve<T, D>
where
    D: DimNameSub<U1>,
    DefaultAllocator: Allocator<D>,
    DefaultAllocator: Allocator<DimNameDiff<D, U1>>,
{
    /// Find the closest point on the curve to a given point
    pub fn find_closest_point(
        &self,
        point: &OPoint<T, DimNameDiff<D, U1>>,
    ) -> Result<OPoint<T, DimNameDiff<D, U1>>>
    where
        T: ArgminFloat,
    {
        self.find_closest_parameter(point)
            .map(|u| self.point_at_clamped(u))
    }

    /// Find the closest parameter on the curve to a given point
    /// A polyline sampling picks the starting guess, then Newton's method refines it
    /// inside the domain. Closed curves wrap around instead of stopping at the ends.
    /// # Example
    /// ```
    /// use spline_kernel::prelude::*;
    /// use nalgebra::Point2;
    /// use approx::assert_relative_eq;
    /// let w = std::f64::consts::FRAC_1_SQRT_2;
    /// let quarter = NurbsCurve2D::try_rational(
    ///     3,
    ///     vec![0., 0., 0., 1., 1., 1.],
    ///     &[Point2::new(1., 0.), Point2::new(1., 1.), Point2::new(0., 1.)],
    ///     &[1., w, 1.],
    /// ).unwrap();
    /// let u = quarter.find_closest_parameter(&Point2::new(2., 2.)).unwrap();
    /// assert_relative_eq!(u, 0.5, epsilon = 1e-8);
    /// ```
    pub fn find_closest_parameter(&self, point: &OPoint<T, DimNameDiff<D, U1>>) -> Result<T>
    where
        T: ArgminFloat,
    {
        let (u, closed) = self.closest_parameter_seed(point)?;

        let solver = ClosestParameterNewton::new(self.knots_domain(), closed);
        let res = Executor::new(CurveClosestParameterProblem::new(point, self), solver)
            .configure(|state| state.param(u).max_iters(NEWTON_ITERATIONS))
            .run()
            .map_err(|e| CurveError::solver_failure(e.to_string()))?;

        log::trace!(
            "closest parameter search stopped after {} iterations: {:?}",
            res.state().get_iter(),
            res.state().get_termination_status()
        );

        res.state()
            .get_best_param()
            .copied()
            .ok_or_else(|| CurveError::solver_failure("no parameter found"))
    }

    /// Starting guess from the closest sampled segment, and whether the curve is closed
    fn closest_parameter_seed(&self, point: &OPoint<T, DimNameDiff<D, U1>>) -> Result<(T, bool)> {
        if point.coords.iter().any(|c| !c.is_finite()) {
            return Err(CurveError::invalid_argument(
                "the query point must have finite coordinates",
            ));
        }

        let (min_u, max_u) = self.knots_domain();
        let samples = (self.control_point_count() * self.degree()).max(2);
        let pts = self.sample_regular_range_with_parameter(min_u, max_u, samples);

        let mut best: Option<(T, T)> = None;
        for w in pts.windows(2) {
            let (u0, p0) = &w[0];
            let (u1, p1) = &w[1];
            let (proj_u, proj_pt) = segment_closest_point(point, p0, p1, *u0, *u1);
            let d = (point - proj_pt).norm();
            if best.is_none_or(|(min, _)| d < min) {
                best = Some((d, proj_u));
            }
        }
        let u = best.map_or(min_u, |(_, u)| u);

        let closed = match (pts.first(), pts.last()) {
            (Some((_, head)), Some((_, tail))) => (head - tail).norm() < T::default_epsilon(),
            _ => false,
        };

        Ok((u, closed))
    }
}
