use nalgebra::allocator::Allocator;
use nalgebra::{
    convert, Const, DefaultAllocator, DimName, DimNameDiff, DimNameSub, OMatrix, OPoint, OVector,
    U1,
};
use simba::scalar::SupersetOf;

use crate::basis::{BasisEvaluator, BasisScratch};
use crate::error::{CurveError, Result};
use crate::knot::KnotVector;
use crate::misc::{FloatingPoint, Invertible, Transformable};

use super::curve_evaluator::evaluate_resolved;
use super::{ControlPoints, CurveEvaluation, CurveEvaluator, CurveKind};

/// NURBS curve representation
/// By generics, it can be used for 1D, 2D or 3D curves with f32 or f64 scalar types.
/// `D` is the homogeneous dimension: one more than the Cartesian dimension.
///
/// A curve is only obtainable through the validating constructors and never
/// changes afterwards, so shared references can be read from any thread.
#[derive(Clone, Debug)]
pub struct NurbsCurve<T: FloatingPoint, D: DimName>
where
    DefaultAllocator: Allocator<D>,
{
    /// polynomial degree + 1
    order: usize,
    kind: CurveKind,
    /// the length of the knot vector is equal to the `# of control points + order`
    knots: KnotVector<T>,
    control_points: ControlPoints<T, D>,
}

/// 1D NURBS curve alias
pub type NurbsCurve1D<T> = NurbsCurve<T, Const<2>>;

/// 2D NURBS curve alias
pub type NurbsCurve2D<T> = NurbsCurve<T, Const<3>>;

/// 3D NURBS curve alias
pub type NurbsCurve3D<T> = NurbsCurve<T, Const<4>>;

impl<T: FloatingPoint, D: DimName> NurbsCurve<T, D>
where
    DefaultAllocator: Allocator<D>,
{
    /// Create a curve from homogeneous control points (`w*x, .., w`)
    pub fn try_from_homogeneous(
        order: usize,
        knots: Vec<T>,
        control_points: Vec<OPoint<T, D>>,
        kind: CurveKind,
    ) -> Result<Self> {
        Self::check_header(order, kind)?;
        let control_points = ControlPoints::try_from_homogeneous(control_points)?;
        Self::try_assemble(order, knots, kind, control_points)
    }

    fn check_header(order: usize, kind: CurveKind) -> Result<()> {
        if order == 0 {
            return Err(CurveError::InvalidOrder { order });
        }
        let dimension = D::dim().saturating_sub(1);
        if kind.dimension() != dimension {
            return Err(CurveError::kind_mismatch(kind, dimension));
        }
        Ok(())
    }

    fn try_assemble(
        order: usize,
        knots: Vec<T>,
        kind: CurveKind,
        control_points: ControlPoints<T, D>,
    ) -> Result<Self> {
        let n = control_points.len();
        if n < order {
            log::debug!("rejected curve: {} control points for order {}", n, order);
            return Err(CurveError::InvalidControlPointCount {
                required: order,
                actual: n,
            });
        }

        if !kind.is_rational() && control_points.has_non_unit_weights() {
            return Err(CurveError::InvalidKind {
                reason: format!("{} has control points with non-unit weights", kind),
            });
        }

        let knots = KnotVector::try_new(knots, order, n).inspect_err(|e| {
            log::debug!("rejected curve: {}", e);
        })?;

        let (start, end) = knots.domain(order);
        if start >= end {
            log::debug!("rejected curve: empty domain");
            return Err(CurveError::DegenerateCurve {
                start: start.to_f64_or_nan(),
                end: end.to_f64_or_nan(),
            });
        }

        log::debug!(
            "built {} of order {} with {} control points on [{}, {}]",
            kind,
            order,
            n,
            start.to_f64_or_nan(),
            end.to_f64_or_nan()
        );

        Ok(Self {
            order,
            kind,
            knots,
            control_points,
        })
    }

    /// polynomial degree + 1
    pub fn order(&self) -> usize {
        self.order
    }

    pub fn degree(&self) -> usize {
        self.order - 1
    }

    pub fn control_point_count(&self) -> usize {
        self.control_points.len()
    }

    pub fn knot_count(&self) -> usize {
        self.knots.len()
    }

    pub fn kind(&self) -> CurveKind {
        self.kind
    }

    pub fn knots(&self) -> &KnotVector<T> {
        &self.knots
    }

    pub fn control_points(&self) -> &ControlPoints<T, D> {
        &self.control_points
    }

    pub fn weights(&self) -> Vec<T> {
        self.control_points.weights()
    }

    /// `knots[order - 1]`
    pub fn domain_start(&self) -> T {
        self.knots[self.order - 1]
    }

    /// `knots[control_point_count]`
    pub fn domain_end(&self) -> T {
        self.knots[self.control_points.len()]
    }

    pub fn knots_domain(&self) -> (T, T) {
        (self.domain_start(), self.domain_end())
    }

    pub fn knots_domain_interval(&self) -> T {
        let (d0, d1) = self.knots_domain();
        d1 - d0
    }

    pub fn is_clamped(&self) -> bool {
        self.knots.is_clamped(self.order)
    }

    /// Cast the curve to a curve with another floating point type
    /// The cast curve is validated again, since a narrower type can overflow
    /// coordinates or collapse the domain.
    pub fn try_cast<F: FloatingPoint + SupersetOf<T>>(&self) -> Result<NurbsCurve<F, D>> {
        let points = self.control_points.cast::<F>().to_vec();
        let control_points = ControlPoints::try_from_homogeneous(points)?;
        let knots = self.knots.cast::<F>().to_vec();
        NurbsCurve::try_assemble(self.order, knots, self.kind, control_points)
    }
}

impl<T: FloatingPoint, D: DimName> NurbsCurve<T, D>
where
    D: DimNameSub<U1>,
    DefaultAllocator: Allocator<D>,
    DefaultAllocator: Allocator<DimNameDiff<D, U1>>,
{
    /// Create a new NURBS curve from Cartesian control points
    /// The curve is rational when `weights` is given, polynomial otherwise.
    ///
    /// # Failures
    /// - `InvalidOrder` if the order is zero
    /// - `InvalidControlPointCount` if there are fewer control points than the order
    ///   or the weight count differs from the point count
    /// - `InvalidWeight` if a weight is not positive
    /// - `InvalidKnotVector` if the knots are not `# of control points + order`
    ///   non-decreasing finite values
    /// - `DegenerateCurve` if the domain is empty
    ///
    /// # Example
    /// ```
    /// use spline_kernel::prelude::*;
    /// use nalgebra::Point2;
    ///
    /// let control_points: Vec<Point2<f64>> = vec![
    ///     Point2::new(50., 50.),
    ///     Point2::new(30., 370.),
    ///     Point2::new(180., 350.),
    ///     Point2::new(150., 100.),
    ///     Point2::new(250., 50.),
    ///     Point2::new(350., 100.),
    ///     Point2::new(470., 400.),
    /// ];
    /// let order = 4;
    /// let m = control_points.len() + order;
    /// // create an uniform knot vector
    /// let knots = (0..m).map(|i| i as f64).collect();
    /// let nurbs = NurbsCurve2D::try_new(order, knots, &control_points, None);
    /// assert!(nurbs.is_ok());
    /// ```
    pub fn try_new(
        order: usize,
        knots: Vec<T>,
        control_points: &[OPoint<T, DimNameDiff<D, U1>>],
        weights: Option<&[T]>,
    ) -> Result<Self> {
        let kind = CurveKind::try_new(weights.is_some(), D::dim().saturating_sub(1))?;
        Self::check_header(order, kind)?;
        let control_points = ControlPoints::try_from_cartesian(control_points, weights)?;
        Self::try_assemble(order, knots, kind, control_points)
    }

    /// Create a polynomial B-spline curve
    pub fn try_polynomial(
        order: usize,
        knots: Vec<T>,
        control_points: &[OPoint<T, DimNameDiff<D, U1>>],
    ) -> Result<Self> {
        Self::try_new(order, knots, control_points, None)
    }

    /// Create a rational curve with one weight per control point
    pub fn try_rational(
        order: usize,
        knots: Vec<T>,
        control_points: &[OPoint<T, DimNameDiff<D, U1>>],
        weights: &[T],
    ) -> Result<Self> {
        Self::try_new(order, knots, control_points, Some(weights))
    }

    /// Create a polynomial curve with a clamped knot vector spread evenly over `[0, 1]`
    ///
    /// # Example
    /// ```
    /// use spline_kernel::prelude::*;
    /// use nalgebra::Point3;
    /// let curve = NurbsCurve3D::try_clamped_uniform(
    ///     3,
    ///     &[
    ///         Point3::new(0., 0., 0.),
    ///         Point3::new(1., 1., 0.),
    ///         Point3::new(2., 0., 1.),
    ///         Point3::new(3., 1., 1.),
    ///     ],
    /// )
    /// .unwrap();
    /// assert_eq!(curve.knots().to_vec(), vec![0., 0., 0., 0.5, 1., 1., 1.]);
    /// assert_eq!(curve.point_at(1.).unwrap(), Point3::new(3., 1., 1.));
    /// ```
    pub fn try_clamped_uniform(
        order: usize,
        control_points: &[OPoint<T, DimNameDiff<D, U1>>],
    ) -> Result<Self> {
        let knots = KnotVector::clamped_uniform(control_points.len(), order.max(1));
        Self::try_new(order, knots.to_vec(), control_points, None)
    }

    /// Create a curve from flat arrays
    ///
    /// `coefficients` holds `kind.dimension()` Cartesian coordinates per
    /// control point, followed by the weight when `kind` is rational.
    /// The control point count is implied by `knots.len() - order`.
    ///
    /// # Example
    /// ```
    /// use spline_kernel::prelude::*;
    /// let curve = NurbsCurve2D::try_from_raw(
    ///     2,
    ///     &[0., 0., 1., 1.],
    ///     &[0., 0., 2., 1.],
    ///     CurveKind::Polynomial2D,
    /// )
    /// .unwrap();
    /// assert_eq!(curve.control_point_count(), 2);
    /// assert_eq!(curve.to_raw_coefficients(), vec![0., 0., 2., 1.]);
    /// ```
    pub fn try_from_raw(
        order: usize,
        knots: &[T],
        coefficients: &[T],
        kind: CurveKind,
    ) -> Result<Self> {
        Self::check_header(order, kind)?;

        let stride = kind.coefficient_stride();
        let count = knots.len().saturating_sub(order);
        if coefficients.len() != count * stride {
            return Err(CurveError::InvalidControlPointCount {
                required: count,
                actual: coefficients.len() / stride,
            });
        }

        let dim = kind.dimension();
        let points: Vec<OPoint<T, DimNameDiff<D, U1>>> = coefficients
            .chunks_exact(stride)
            .map(|chunk| OPoint::from(OVector::<T, DimNameDiff<D, U1>>::from_fn(|i, _| chunk[i])))
            .collect();
        let weights: Option<Vec<T>> = kind
            .is_rational()
            .then(|| coefficients.chunks_exact(stride).map(|c| c[dim]).collect());

        let control_points = ControlPoints::try_from_cartesian(&points, weights.as_deref())?;
        Self::try_assemble(order, knots.to_vec(), kind, control_points)
    }

    /// Cartesian control point coordinates laid out one point after another
    pub fn coefficients(&self) -> Vec<T> {
        self.control_points
            .to_cartesian()
            .iter()
            .flat_map(|p| p.coords.iter().copied().collect::<Vec<_>>())
            .collect()
    }

    /// Flat coefficient array in the layout accepted by [`NurbsCurve::try_from_raw`]
    pub fn to_raw_coefficients(&self) -> Vec<T> {
        let rational = self.kind.is_rational();
        self.control_points
            .iter()
            .zip(self.control_points.to_cartesian())
            .flat_map(|(h, p)| {
                let w = h[D::dim() - 1];
                p.coords
                    .iter()
                    .copied()
                    .chain(rational.then_some(w))
                    .collect::<Vec<_>>()
            })
            .collect()
    }

    /// Return the dehomogenized control points
    pub fn dehomogenized_control_points(&self) -> Vec<OPoint<T, DimNameDiff<D, U1>>> {
        self.control_points.to_cartesian()
    }

    /// Evaluate the point and derivatives up to `derivative_order` with default options
    pub fn evaluate(
        &self,
        t: T,
        derivative_order: usize,
    ) -> Result<CurveEvaluation<T, DimNameDiff<D, U1>>> {
        CurveEvaluator::default().evaluate(self, t, derivative_order)
    }

    /// Evaluate the curve at a given parameter to get a dehomogenized point
    pub fn point_at(&self, t: T) -> Result<OPoint<T, DimNameDiff<D, U1>>> {
        self.evaluate(t, 0).map(|e| e.point())
    }

    /// Evaluate the curve at a given parameter to get a tangent vector
    pub fn tangent_at(&self, t: T) -> Result<OVector<T, DimNameDiff<D, U1>>> {
        self.evaluate(t, 1)
            .map(|e| e.into_derivatives().swap_remove(1))
    }

    /// Evaluate the rational derivatives at a given parameter
    pub fn derivatives_at(
        &self,
        t: T,
        derivative_order: usize,
    ) -> Result<Vec<OVector<T, DimNameDiff<D, U1>>>> {
        self.evaluate(t, derivative_order)
            .map(|e| e.into_derivatives())
    }

    /// Derivatives at `t` clamped into the domain
    pub(crate) fn rational_derivatives(
        &self,
        t: T,
        derivative_order: usize,
        scratch: &mut BasisScratch<T>,
    ) -> Vec<OVector<T, DimNameDiff<D, U1>>> {
        let basis = BasisEvaluator::for_validated(&self.knots, self.order);
        let t = self.knots.clamp(self.order, t);
        evaluate_resolved(self, &basis, t, derivative_order, scratch).into_derivatives()
    }

    pub(crate) fn point_at_clamped(&self, t: T) -> OPoint<T, DimNameDiff<D, U1>> {
        let mut scratch = BasisScratch::new(self.order);
        let mut derivatives = self.rational_derivatives(t, 0, &mut scratch);
        OPoint::from(derivatives.swap_remove(0))
    }

    /// Sample the curve at a given number of points between the start and end parameters
    /// Return the vector of tuples of parameter and point
    #[allow(clippy::type_complexity)]
    pub fn sample_regular_range_with_parameter(
        &self,
        start: T,
        end: T,
        samples: usize,
    ) -> Vec<(T, OPoint<T, DimNameDiff<D, U1>>)> {
        let mut scratch = BasisScratch::new(self.order);
        let step = if samples > 1 {
            (end - start) / convert((samples - 1) as f64)
        } else {
            T::zero()
        };
        (0..samples)
            .map(|i| {
                let t = start + step * convert(i as f64);
                let mut d = self.rational_derivatives(t, 0, &mut scratch);
                (t, OPoint::from(d.swap_remove(0)))
            })
            .collect()
    }

    /// Sample the curve at a given number of points between the start and end parameters
    pub fn sample_regular_range(
        &self,
        start: T,
        end: T,
        samples: usize,
    ) -> Vec<OPoint<T, DimNameDiff<D, U1>>> {
        self.sample_regular_range_with_parameter(start, end, samples)
            .into_iter()
            .map(|(_, p)| p)
            .collect()
    }
}

/// Enable to transform a NURBS curve by a given DxD matrix
/// The matrix acts on the homogeneous control points, so affine matrices keep the weights
/// and projective ones rescale them.
///
/// # Failures
/// - `InvalidWeight` if a transformed weight is not positive
/// - `InvalidControlPoint` if a transformed point is not finite
/// - `InvalidKind` if a polynomial curve would get non-unit weights
///
/// # Example
/// ```
/// use spline_kernel::prelude::*;
/// use nalgebra::{Matrix3, Point2};
/// let mut line = NurbsCurve2D::try_polynomial(
///     2,
///     vec![0., 0., 1., 1.],
///     &[Point2::new(0., 0.), Point2::new(1., 0.)],
/// ).unwrap();
/// let shift = Matrix3::new(1., 0., 2., 0., 1., 3., 0., 0., 1.);
/// line.try_transform(&shift).unwrap();
/// assert_eq!(line.point_at(1.).unwrap(), Point2::new(3., 3.));
///
/// // sends the end point to infinity
/// let projective = Matrix3::new(1., 0., 0., 0., 1., 0., -1., 0., 1.);
/// let before = line.clone();
/// assert!(line.try_transform(&projective).is_err());
/// assert_eq!(line.coefficients(), before.coefficients());
/// ```
impl<'a, T: FloatingPoint, const D: usize> Transformable<&'a OMatrix<T, Const<D>, Const<D>>>
    for NurbsCurve<T, Const<D>>
{
    fn try_transform(&mut self, transform: &'a OMatrix<T, Const<D>, Const<D>>) -> Result<()> {
        let points = self
            .control_points
            .iter()
            .map(|p| OPoint::from(transform * p.coords))
            .collect();
        let control_points = ControlPoints::try_from_homogeneous(points)?;
        let transformed =
            Self::try_assemble(self.order, self.knots.to_vec(), self.kind, control_points)?;
        *self = transformed;
        Ok(())
    }
}

impl<T: FloatingPoint, D: DimName> Invertible for NurbsCurve<T, D>
where
    DefaultAllocator: Allocator<D>,
{
    /// Reverse the direction of the curve
    /// # Example
    /// ```
    /// use spline_kernel::prelude::*;
    /// use nalgebra::Point2;
    /// use approx::assert_relative_eq;
    /// let points = vec![
    ///     Point2::new(0.0, 0.0),
    ///     Point2::new(1.0, 0.0),
    ///     Point2::new(1.0, 1.0),
    ///     Point2::new(0.0, 1.0),
    /// ];
    /// let mut curve = NurbsCurve2D::try_clamped_uniform(3, &points).unwrap();
    /// curve.invert();
    /// let (start, end) = curve.knots_domain();
    /// assert_relative_eq!(curve.point_at(start).unwrap(), points[points.len() - 1]);
    /// assert_relative_eq!(curve.point_at(end).unwrap(), points[0]);
    /// ```
    fn invert(&mut self) {
        let mut points = self.control_points.to_vec();
        points.reverse();
        self.control_points = ControlPoints::from_validated(points);
        self.knots.invert();
    }
}
