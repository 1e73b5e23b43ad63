use nalgebra::allocator::Allocator;
use nalgebra::{DefaultAllocator, DimName, DimNameDiff, DimNameSub, OVector, U1};

use crate::basis::{
    BasisEvaluator, BasisFunctions, BasisScratch, DomainPolicy, MAX_DERIVATIVE_ORDER,
};
use crate::error::{CurveError, Result};
use crate::misc::{Binomial, FloatingPoint};

use super::{CurveEvaluation, NurbsCurve};

/// Default limit on the derivative order an evaluator accepts
pub const DEFAULT_MAX_DERIVATIVE_ORDER: usize = 8;

/// Evaluation settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EvaluationOptions {
    max_derivative_order: usize,
    domain_policy: DomainPolicy,
}

impl Default for EvaluationOptions {
    fn default() -> Self {
        Self {
            max_derivative_order: DEFAULT_MAX_DERIVATIVE_ORDER,
            domain_policy: DomainPolicy::Strict,
        }
    }
}

impl EvaluationOptions {
    /// Limit accepted derivative orders, capped at [`MAX_DERIVATIVE_ORDER`]
    pub fn with_max_derivative_order(mut self, max: usize) -> Self {
        self.max_derivative_order = max.min(MAX_DERIVATIVE_ORDER);
        self
    }

    pub fn with_domain_policy(mut self, policy: DomainPolicy) -> Self {
        self.domain_policy = policy;
        self
    }

    pub fn max_derivative_order(&self) -> usize {
        self.max_derivative_order
    }

    pub fn domain_policy(&self) -> DomainPolicy {
        self.domain_policy
    }
}

/// Evaluates points and derivatives of NURBS curves
///
/// Holds only its options, so one evaluator can serve any number of curves
/// and threads at once.
#[derive(Debug, Clone, Copy, Default)]
pub struct CurveEvaluator {
    options: EvaluationOptions,
}

impl CurveEvaluator {
    pub fn new(options: EvaluationOptions) -> Self {
        Self { options }
    }

    /// Evaluator that clamps parameters into the domain
    pub fn clamped() -> Self {
        Self::new(EvaluationOptions::default().with_domain_policy(DomainPolicy::Clamp))
    }

    pub fn options(&self) -> &EvaluationOptions {
        &self.options
    }

    /// Evaluate the curve and its first `derivative_order` derivatives at `t`
    ///
    /// # Example
    /// ```
    /// use spline_kernel::prelude::*;
    /// use nalgebra::Point2;
    /// let curve = NurbsCurve2D::try_polynomial(
    ///     4,
    ///     vec![0., 0., 0., 0., 1., 1., 1., 1.],
    ///     &[
    ///         Point2::new(0., 0.),
    ///         Point2::new(1., 2.),
    ///         Point2::new(2., 2.),
    ///         Point2::new(3., 0.),
    ///     ],
    /// )
    /// .unwrap();
    /// let evaluator = CurveEvaluator::default();
    /// let e = evaluator.evaluate(&curve, 0.5, 1).unwrap();
    /// assert!((e.point() - Point2::new(1.5, 1.5)).norm() < 1e-12);
    /// assert!(evaluator.evaluate(&curve, 1.5, 0).is_err());
    /// ```
    pub fn evaluate<T: FloatingPoint, D: DimName>(
        &self,
        curve: &NurbsCurve<T, D>,
        t: T,
        derivative_order: usize,
    ) -> Result<CurveEvaluation<T, DimNameDiff<D, U1>>>
    where
        D: DimNameSub<U1>,
        DefaultAllocator: Allocator<D>,
        DefaultAllocator: Allocator<DimNameDiff<D, U1>>,
    {
        let mut scratch = BasisScratch::new(curve.order());
        self.evaluate_with(curve, t, derivative_order, &mut scratch)
    }

    /// Same as [`CurveEvaluator::evaluate`] with caller-supplied basis work tables
    pub fn evaluate_with<T: FloatingPoint, D: DimName>(
        &self,
        curve: &NurbsCurve<T, D>,
        t: T,
        derivative_order: usize,
        scratch: &mut BasisScratch<T>,
    ) -> Result<CurveEvaluation<T, DimNameDiff<D, U1>>>
    where
        D: DimNameSub<U1>,
        DefaultAllocator: Allocator<D>,
        DefaultAllocator: Allocator<DimNameDiff<D, U1>>,
    {
        // deserialized options skip the builder cap
        let max = self.options.max_derivative_order.min(MAX_DERIVATIVE_ORDER);
        if derivative_order > max {
            return Err(CurveError::UnsupportedDerivativeOrder {
                order: derivative_order,
                max,
            });
        }

        let basis = BasisEvaluator::for_validated(curve.knots(), curve.order())
            .with_policy(self.options.domain_policy);
        let t = basis.resolve_parameter(t)?;
        Ok(evaluate_resolved(curve, &basis, t, derivative_order, scratch))
    }
}

/// Evaluation for a parameter already inside the domain
pub(crate) fn evaluate_resolved<T: FloatingPoint, D: DimName>(
    curve: &NurbsCurve<T, D>,
    basis: &BasisEvaluator<'_, T>,
    t: T,
    derivative_order: usize,
    scratch: &mut BasisScratch<T>,
) -> CurveEvaluation<T, DimNameDiff<D, U1>>
where
    D: DimNameSub<U1>,
    DefaultAllocator: Allocator<D>,
    DefaultAllocator: Allocator<DimNameDiff<D, U1>>,
{
    let functions = basis.evaluate_resolved(t, derivative_order, scratch);

    let homogeneous = homogeneous_derivatives(curve, &functions);
    let derivatives = if curve.kind().is_rational() {
        rational_derivatives(&homogeneous)
    } else {
        homogeneous.iter().map(cartesian_part::<T, D>).collect()
    };

    CurveEvaluation::new(functions.parameter(), derivatives)
}

/// Weighted sums of the active homogeneous control points
fn homogeneous_derivatives<T: FloatingPoint, D: DimName>(
    curve: &NurbsCurve<T, D>,
    basis: &BasisFunctions<T>,
) -> Vec<OVector<T, D>>
where
    DefaultAllocator: Allocator<D>,
{
    let control_points = curve.control_points();
    (0..=basis.derivative_order())
        .map(|k| {
            basis
                .indexed(k)
                .fold(OVector::<T, D>::zeros(), |mut acc, (i, n)| {
                    acc += &control_points[i].coords * n;
                    acc
                })
        })
        .collect()
}

fn cartesian_part<T: FloatingPoint, D: DimName>(v: &OVector<T, D>) -> OVector<T, DimNameDiff<D, U1>>
where
    D: DimNameSub<U1>,
    DefaultAllocator: Allocator<D>,
    DefaultAllocator: Allocator<DimNameDiff<D, U1>>,
{
    OVector::<T, DimNameDiff<D, U1>>::from_fn(|i, _| v[i])
}

/// Recover Cartesian derivatives from homogeneous ones
/// `C_k = (A_k - sum_{i=1..k} binom(k, i) * w_i * C_{k-i}) / w_0`
fn rational_derivatives<T: FloatingPoint, D: DimName>(
    homogeneous: &[OVector<T, D>],
) -> Vec<OVector<T, DimNameDiff<D, U1>>>
where
    D: DimNameSub<U1>,
    DefaultAllocator: Allocator<D>,
    DefaultAllocator: Allocator<DimNameDiff<D, U1>>,
{
    let w = D::dim() - 1;
    let a_ders: Vec<_> = homogeneous.iter().map(cartesian_part::<T, D>).collect();
    let w_ders: Vec<T> = homogeneous.iter().map(|d| d[w]).collect();

    let derivs = homogeneous.len() - 1;
    let binom = Binomial::<T>::new(derivs);
    let mut ck: Vec<OVector<T, DimNameDiff<D, U1>>> = Vec::with_capacity(derivs + 1);
    for k in 0..=derivs {
        let mut v = a_ders[k].clone();

        for i in 1..=k {
            let coef = binom.get(k, i) * w_ders[i];
            v -= &ck[k - i] * coef;
        }

        ck.push(v / w_ders[0]);
    }
    ck
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use nalgebra::{Point1, Point2, Vector2};

    use crate::curve::{NurbsCurve1D, NurbsCurve2D};

    use super::*;

    #[test]
    fn options_builder() {
        let options = EvaluationOptions::default()
            .with_max_derivative_order(3)
            .with_domain_policy(DomainPolicy::Clamp);
        assert_eq!(options.max_derivative_order(), 3);
        assert_eq!(options.domain_policy(), DomainPolicy::Clamp);
        assert_eq!(
            CurveEvaluator::default().options().max_derivative_order(),
            DEFAULT_MAX_DERIVATIVE_ORDER
        );
    }

    #[test]
    fn max_derivative_order_is_capped() {
        let options = EvaluationOptions::default().with_max_derivative_order(usize::MAX);
        assert_eq!(options.max_derivative_order(), MAX_DERIVATIVE_ORDER);

        let curve = NurbsCurve1D::try_polynomial(
            2,
            vec![0., 0., 1., 1.],
            &[Point1::new(0.), Point1::new(1.)],
        )
        .unwrap();
        let evaluator = CurveEvaluator::new(options);
        assert_eq!(
            evaluator.evaluate(&curve, 0.5, usize::MAX).unwrap_err(),
            CurveError::UnsupportedDerivativeOrder {
                order: usize::MAX,
                max: MAX_DERIVATIVE_ORDER
            }
        );
        let e = evaluator.evaluate(&curve, 0.5, MAX_DERIVATIVE_ORDER).unwrap();
        assert_eq!(e.derivatives().len(), MAX_DERIVATIVE_ORDER + 1);
    }

    #[test]
    fn rejects_derivative_order_above_limit() {
        let curve = NurbsCurve1D::try_polynomial(
            2,
            vec![0., 0., 1., 1.],
            &[Point1::new(0.), Point1::new(1.)],
        )
        .unwrap();
        let evaluator = CurveEvaluator::new(EvaluationOptions::default().with_max_derivative_order(2));
        assert!(evaluator.evaluate(&curve, 0.5, 2).is_ok());
        assert_eq!(
            evaluator.evaluate(&curve, 0.5, 3).unwrap_err(),
            CurveError::UnsupportedDerivativeOrder { order: 3, max: 2 }
        );
    }

    #[test]
    fn rational_quotient_rule_on_quarter_circle() {
        let w = std::f64::consts::FRAC_1_SQRT_2;
        let curve = NurbsCurve2D::try_rational(
            3,
            vec![0., 0., 0., 1., 1., 1.],
            &[Point2::new(1., 0.), Point2::new(1., 1.), Point2::new(0., 1.)],
            &[1., w, 1.],
        )
        .unwrap();

        let evaluator = CurveEvaluator::default();
        for i in 0..=20 {
            let t = i as f64 / 20.;
            let e = evaluator.evaluate(&curve, t, 2).unwrap();
            let p = e.position();
            let d1 = e.tangent().unwrap();
            let d2 = e.derivative(2).unwrap();
            // |C|^2 = 1 differentiated once and twice
            assert_relative_eq!(p.norm(), 1., epsilon = 1e-12);
            assert_relative_eq!(p.dot(d1), 0., epsilon = 1e-12);
            assert_relative_eq!(p.dot(d2) + d1.dot(d1), 0., epsilon = 1e-10);
        }

        let start = evaluator.evaluate(&curve, 0., 1).unwrap();
        assert_relative_eq!(start.tangent().unwrap().normalize(), Vector2::new(0., 1.), epsilon = 1e-12);
    }

    #[test]
    fn polynomial_derivatives_are_homogeneous_derivatives() {
        // quadratic Bezier: C(t) = (2t(1-t) + t^2, t^2) for points (0,0) (1,0) (1,1)
        let curve = NurbsCurve2D::try_polynomial(
            3,
            vec![0., 0., 0., 1., 1., 1.],
            &[Point2::new(0., 0.), Point2::new(1., 0.), Point2::new(1., 1.)],
        )
        .unwrap();
        let e = CurveEvaluator::default().evaluate(&curve, 0.5, 3).unwrap();
        assert_relative_eq!(*e.position(), Vector2::new(0.75, 0.25), epsilon = 1e-12);
        assert_relative_eq!(*e.tangent().unwrap(), Vector2::new(1., 1.), epsilon = 1e-12);
        assert_relative_eq!(*e.derivative(2).unwrap(), Vector2::new(-2., 2.), epsilon = 1e-12);
        assert_relative_eq!(*e.derivative(3).unwrap(), Vector2::zeros(), epsilon = 1e-12);
    }

    #[test]
    fn clamped_evaluator_reports_clamped_parameter() {
        let curve = NurbsCurve1D::try_polynomial(
            2,
            vec![0., 0., 1., 1.],
            &[Point1::new(2.), Point1::new(4.)],
        )
        .unwrap();
        let e = CurveEvaluator::clamped().evaluate(&curve, 7., 0).unwrap();
        assert_eq!(e.parameter(), 1.);
        assert_relative_eq!(e.point(), Point1::new(4.));
    }
}
