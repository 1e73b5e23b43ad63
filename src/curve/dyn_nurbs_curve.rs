use nalgebra::Dyn;

use crate::error::Result;
use crate::knot::KnotVector;
use crate::misc::FloatingPoint;

use super::{CurveEvaluation, CurveEvaluator, CurveKind, NurbsCurve1D, NurbsCurve2D, NurbsCurve3D};

/// A curve whose dimension is only known at runtime
///
/// Built from flat arrays, the dimension is taken from the [`CurveKind`].
#[derive(Clone, Debug)]
pub enum DynNurbsCurve<T: FloatingPoint> {
    Curve1D(NurbsCurve1D<T>),
    Curve2D(NurbsCurve2D<T>),
    Curve3D(NurbsCurve3D<T>),
}

macro_rules! dispatch {
    ($self:expr, $curve:ident => $body:expr) => {
        match $self {
            DynNurbsCurve::Curve1D($curve) => $body,
            DynNurbsCurve::Curve2D($curve) => $body,
            DynNurbsCurve::Curve3D($curve) => $body,
        }
    };
}

impl<T: FloatingPoint> DynNurbsCurve<T> {
    /// Create a curve from flat knot and coefficient arrays
    /// # Example
    /// ```
    /// use spline_kernel::prelude::*;
    /// let curve = DynNurbsCurve::try_from_raw(
    ///     3,
    ///     &[0., 0., 0., 1., 1., 1.],
    ///     &[0., 0., 1., 1., 0., 1., 2., 0., 1.],
    ///     CurveKind::Polynomial3D,
    /// )
    /// .unwrap();
    /// assert_eq!(curve.dimension(), 3);
    /// let e = curve.evaluate(0.5, 1).unwrap();
    /// assert_eq!(e.position().as_slice(), &[1., 0., 1.]);
    /// ```
    pub fn try_from_raw(
        order: usize,
        knots: &[T],
        coefficients: &[T],
        kind: CurveKind,
    ) -> Result<Self> {
        match kind.dimension() {
            1 => NurbsCurve1D::try_from_raw(order, knots, coefficients, kind).map(Self::Curve1D),
            2 => NurbsCurve2D::try_from_raw(order, knots, coefficients, kind).map(Self::Curve2D),
            _ => NurbsCurve3D::try_from_raw(order, knots, coefficients, kind).map(Self::Curve3D),
        }
    }

    /// Cartesian dimension
    pub fn dimension(&self) -> usize {
        self.kind().dimension()
    }

    pub fn kind(&self) -> CurveKind {
        dispatch!(self, c => c.kind())
    }

    pub fn order(&self) -> usize {
        dispatch!(self, c => c.order())
    }

    pub fn degree(&self) -> usize {
        dispatch!(self, c => c.degree())
    }

    pub fn control_point_count(&self) -> usize {
        dispatch!(self, c => c.control_point_count())
    }

    pub fn knot_count(&self) -> usize {
        dispatch!(self, c => c.knot_count())
    }

    pub fn knots(&self) -> &KnotVector<T> {
        dispatch!(self, c => c.knots())
    }

    pub fn weights(&self) -> Vec<T> {
        dispatch!(self, c => c.weights())
    }

    pub fn domain_start(&self) -> T {
        dispatch!(self, c => c.domain_start())
    }

    pub fn domain_end(&self) -> T {
        dispatch!(self, c => c.domain_end())
    }

    /// Flat Cartesian control point coordinates
    pub fn coefficients(&self) -> Vec<T> {
        dispatch!(self, c => c.coefficients())
    }

    /// Flat coefficients with weights, as accepted by [`DynNurbsCurve::try_from_raw`]
    pub fn to_raw_coefficients(&self) -> Vec<T> {
        dispatch!(self, c => c.to_raw_coefficients())
    }

    pub fn evaluate(&self, t: T, derivative_order: usize) -> Result<CurveEvaluation<T, Dyn>> {
        self.evaluate_with(&CurveEvaluator::default(), t, derivative_order)
    }

    pub fn evaluate_with(
        &self,
        evaluator: &CurveEvaluator,
        t: T,
        derivative_order: usize,
    ) -> Result<CurveEvaluation<T, Dyn>> {
        dispatch!(self, c => evaluator
            .evaluate(c, t, derivative_order)
            .map(CurveEvaluation::into_dynamic))
    }
}

impl<T: FloatingPoint> From<NurbsCurve1D<T>> for DynNurbsCurve<T> {
    fn from(curve: NurbsCurve1D<T>) -> Self {
        Self::Curve1D(curve)
    }
}

impl<T: FloatingPoint> From<NurbsCurve2D<T>> for DynNurbsCurve<T> {
    fn from(curve: NurbsCurve2D<T>) -> Self {
        Self::Curve2D(curve)
    }
}

impl<T: FloatingPoint> From<NurbsCurve3D<T>> for DynNurbsCurve<T> {
    fn from(curve: NurbsCurve3D<T>) -> Self {
        Self::Curve3D(curve)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use nalgebra::Point2;

    use super::*;
    use crate::error::CurveError;

    #[test]
    fn dispatches_by_kind() {
        let curve = DynNurbsCurve::try_from_raw(
            2,
            &[0., 0., 1., 1.],
            &[1., 2.],
            CurveKind::Polynomial1D,
        )
        .unwrap();
        assert!(matches!(curve, DynNurbsCurve::Curve1D(_)));
        assert_eq!(curve.order(), 2);
        assert_eq!(curve.degree(), 1);
        assert_eq!(curve.control_point_count(), 2);
        assert_eq!(curve.knot_count(), 4);
        assert_eq!((curve.domain_start(), curve.domain_end()), (0., 1.));
        assert_eq!(curve.coefficients(), vec![1., 2.]);
        let e = curve.evaluate(0.25, 1).unwrap();
        assert_relative_eq!(e.position()[0], 1.25);
        assert_relative_eq!(e.tangent().unwrap()[0], 1.);
    }

    #[test]
    fn rational_coefficients_keep_weights_separate() {
        let raw = [1., 0., 1., 1., 1., 0.5, 0., 1., 1.];
        let curve =
            DynNurbsCurve::try_from_raw(3, &[0., 0., 0., 1., 1., 1.], &raw, CurveKind::Rational2D)
                .unwrap();
        assert_eq!(curve.weights(), vec![1., 0.5, 1.]);
        assert_eq!(curve.coefficients(), vec![1., 0., 1., 1., 0., 1.]);
        assert_eq!(curve.to_raw_coefficients(), raw.to_vec());
    }

    #[test]
    fn wraps_typed_curves() {
        let typed = NurbsCurve2D::try_polynomial(
            2,
            vec![0., 0., 1., 1.],
            &[Point2::new(0., 0.), Point2::new(2., 2.)],
        )
        .unwrap();
        let curve: DynNurbsCurve<f64> = typed.into();
        assert_eq!(curve.dimension(), 2);
        assert_eq!(curve.evaluate(0.5, 0).unwrap().position().as_slice(), &[1., 1.]);
    }

    #[test]
    fn rejects_mismatched_coefficients() {
        let err = DynNurbsCurve::try_from_raw(
            2,
            &[0., 0., 1., 1.],
            &[0., 0., 1.],
            CurveKind::Polynomial2D,
        )
        .unwrap_err();
        assert_eq!(
            err,
            CurveError::InvalidControlPointCount {
                required: 2,
                actual: 1
            }
        );
    }
}
