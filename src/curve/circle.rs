use nalgebra::allocator::Allocator;
use nalgebra::{
    convert, DefaultAllocator, DimName, DimNameDiff, DimNameSub, OPoint, OVector, Point3,
    UnitQuaternion, Vector3, U1,
};

use crate::error::{CurveError, Result};
use crate::misc::FloatingPoint;

use super::{NurbsCurve, NurbsCurve3D};

impl<T: FloatingPoint, D: DimName> NurbsCurve<T, D>
where
    D: DimNameSub<U1>,
    DefaultAllocator: Allocator<D>,
    DefaultAllocator: Allocator<DimNameDiff<D, U1>>,
{
    /// Create a full circle as a rational quadratic curve with nine control points
    /// The axes are normalized and expected to be perpendicular; the domain is `[0, 1]`.
    /// # Example
    /// ```
    /// use spline_kernel::prelude::*;
    /// use nalgebra::{Point2, Vector2};
    /// use approx::assert_relative_eq;
    /// let circle = NurbsCurve2D::try_circle(
    ///     &Point2::origin(),
    ///     &Vector2::x(),
    ///     &Vector2::y(),
    ///     1.
    /// ).unwrap();
    /// assert_eq!(circle.control_point_count(), 9);
    /// assert_relative_eq!(circle.point_at(0.25).unwrap(), Point2::new(0., 1.), epsilon = 1e-12);
    /// ```
    pub fn try_circle(
        center: &OPoint<T, DimNameDiff<D, U1>>,
        x_axis: &OVector<T, DimNameDiff<D, U1>>,
        y_axis: &OVector<T, DimNameDiff<D, U1>>,
        radius: T,
    ) -> Result<Self> {
        Self::try_arc(center, x_axis, y_axis, radius, T::zero(), T::two_pi())
    }

    /// Create a circular arc from `start_angle` to `end_angle` (radians, measured from `x_axis`)
    /// The arc is split into at most four pieces of a quarter turn or less,
    /// and sweeps beyond a full turn are cut to one.
    pub fn try_arc(
        center: &OPoint<T, DimNameDiff<D, U1>>,
        x_axis: &OVector<T, DimNameDiff<D, U1>>,
        y_axis: &OVector<T, DimNameDiff<D, U1>>,
        radius: T,
        start_angle: T,
        end_angle: T,
    ) -> Result<Self> {
        if !radius.is_finite() || radius <= T::zero() {
            return Err(CurveError::invalid_argument(format!(
                "radius must be positive and finite, got {}",
                radius.to_f64_or_nan()
            )));
        }
        if !start_angle.is_finite() || !end_angle.is_finite() || end_angle <= start_angle {
            return Err(CurveError::invalid_argument(
                "the end angle must be finite and greater than the start angle",
            ));
        }
        let (xn, yn) = (x_axis.norm(), y_axis.norm());
        if !(xn.is_finite() && yn.is_finite()) || xn <= T::zero() || yn <= T::zero() {
            return Err(CurveError::invalid_argument("arc axes must be non-zero"));
        }

        let xaxis = x_axis / xn * radius;
        let yaxis = y_axis / yn * radius;

        let theta = (end_angle - start_angle).min(T::two_pi());
        let full = theta >= T::two_pi();
        let narcs: usize = if theta <= T::frac_pi_2() {
            1
        } else if theta <= T::pi() {
            2
        } else if theta <= T::frac_pi_2() * convert(3.0) {
            3
        } else {
            4
        };

        let half: T = convert(0.5);
        let dtheta = theta / convert(narcs as f64);
        let w1 = (dtheta * half).cos();
        let on_circle = |angle: T| center + &xaxis * angle.cos() + &yaxis * angle.sin();

        let mut points = Vec::with_capacity(2 * narcs + 1);
        let mut weights = Vec::with_capacity(2 * narcs + 1);
        points.push(on_circle(start_angle));
        weights.push(T::one());

        let mut angle = start_angle;
        for _ in 0..narcs {
            let mid = angle + dtheta * half;
            angle += dtheta;
            // middle point: where the end tangents meet
            points.push(center + (&xaxis * mid.cos() + &yaxis * mid.sin()) / w1);
            weights.push(w1);
            points.push(on_circle(angle));
            weights.push(T::one());
        }

        if full {
            // close exactly instead of relying on sin(2π) rounding to zero
            let first = points[0].clone();
            if let Some(last) = points.last_mut() {
                *last = first;
            }
        }

        let mut knots = vec![T::zero(); 3];
        for i in 1..narcs {
            let k: T = convert(i as f64 / narcs as f64);
            knots.push(k);
            knots.push(k);
        }
        knots.extend([T::one(); 3]);

        Self::try_rational(3, knots, &points, &weights)
    }
}

impl<T: FloatingPoint> NurbsCurve3D<T> {
    /// Create a full circle from its center, plane normal and radius
    /// The circle starts where the rotation taking +Z onto `normal` sends `radius * X`,
    /// and runs counter-clockwise around `normal`.
    /// # Example
    /// ```
    /// use spline_kernel::prelude::*;
    /// use nalgebra::{Point3, Vector3};
    /// use approx::assert_relative_eq;
    /// let circle = NurbsCurve3D::try_circle_with_normal(
    ///     &Point3::new(0., 0., 2.),
    ///     &Vector3::z(),
    ///     3.,
    /// ).unwrap();
    /// assert_relative_eq!(circle.point_at(0.).unwrap(), Point3::new(3., 0., 2.));
    /// assert_relative_eq!(circle.point_at(0.25).unwrap(), Point3::new(0., 3., 2.), epsilon = 1e-12);
    /// ```
    pub fn try_circle_with_normal(
        center: &Point3<T>,
        normal: &Vector3<T>,
        radius: T,
    ) -> Result<Self> {
        let length = normal.norm();
        if !length.is_finite() || length <= T::zero() {
            return Err(CurveError::invalid_argument(
                "circle normal must be non-zero and finite",
            ));
        }
        let n = normal / length;
        // no unique rotation between opposite vectors
        let rotation = UnitQuaternion::rotation_between(&Vector3::z(), &n).unwrap_or_else(|| {
            UnitQuaternion::from_axis_angle(&Vector3::x_axis(), T::pi())
        });
        let x_axis = rotation * Vector3::x();
        let y_axis = rotation * Vector3::y();
        Self::try_circle(center, &x_axis, &y_axis, radius)
    }
}
