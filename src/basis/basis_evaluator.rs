use nalgebra::convert;

use crate::error::{CurveError, Result};
use crate::knot::KnotVector;
use crate::misc::FloatingPoint;

use super::BasisFunctions;

/// Highest derivative order any evaluator computes
pub const MAX_DERIVATIVE_ORDER: usize = 32;

/// What to do with a parameter outside the domain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DomainPolicy {
    /// Reject with `ParameterOutOfDomain`
    #[default]
    Strict,
    /// Clamp into the domain. NaN is still rejected.
    Clamp,
}

/// Work tables for the basis recurrence
///
/// Owned by the caller so repeated evaluations reuse the allocation and no
/// table is shared between threads.
#[derive(Clone, Debug, Default)]
pub struct BasisScratch<T> {
    left: Vec<T>,
    right: Vec<T>,
    ndu: Vec<Vec<T>>,
    a: [Vec<T>; 2],
}

impl<T: FloatingPoint> BasisScratch<T> {
    pub fn new(order: usize) -> Self {
        let mut scratch = Self {
            left: vec![],
            right: vec![],
            ndu: vec![],
            a: [vec![], vec![]],
        };
        scratch.reserve(order);
        scratch
    }

    fn reserve(&mut self, order: usize) {
        if self.left.len() < order {
            self.left.resize(order, T::zero());
            self.right.resize(order, T::zero());
            self.ndu.resize(order, vec![]);
            self.ndu.iter_mut().for_each(|row| row.resize(order, T::zero()));
            self.a.iter_mut().for_each(|row| row.resize(order, T::zero()));
        }
    }

    /// Compute the non-vanishing basis functions
    fn fill_values(
        &mut self,
        knots: &KnotVector<T>,
        span: usize,
        u: T,
        degree: usize,
        basis_functions: &mut [T],
    ) {
        self.reserve(degree + 1);
        let Self { left, right, .. } = self;

        basis_functions[0] = T::one();

        for j in 1..=degree {
            left[j] = u - knots[span + 1 - j];
            right[j] = knots[span + j] - u;
            let mut saved = T::zero();

            for r in 0..j {
                let temp = ratio(basis_functions[r], right[r + 1] + left[j - r]);
                basis_functions[r] = saved + right[r + 1] * temp;
                saved = left[j - r] * temp;
            }

            basis_functions[j] = saved;
        }
    }

    /// Compute the non-vanishing basis functions and their derivatives up to `du <= degree`
    /// Row `k` of `ders` receives the `k`-th derivatives.
    fn fill_derivatives(
        &mut self,
        knots: &KnotVector<T>,
        span: usize,
        u: T,
        degree: usize,
        du: usize,
        ders: &mut [Vec<T>],
    ) {
        self.reserve(degree + 1);
        let Self {
            left,
            right,
            ndu,
            a,
        } = self;

        ndu[0][0] = T::one();

        for j in 1..=degree {
            left[j] = u - knots[span + 1 - j];
            right[j] = knots[span + j] - u;

            let mut saved = T::zero();
            for r in 0..j {
                // lower triangle: knot differences
                ndu[j][r] = right[r + 1] + left[j - r];
                let temp = ratio(ndu[r][j - 1], ndu[j][r]);

                // upper triangle: basis values
                ndu[r][j] = saved + right[r + 1] * temp;
                saved = left[j - r] * temp;
            }
            ndu[j][j] = saved;
        }

        for j in 0..=degree {
            ders[0][j] = ndu[j][degree];
        }

        let idegree = degree as isize;
        let n = du as isize;

        for r in 0..=idegree {
            // alternate rows in array a
            let mut s1 = 0;
            let mut s2 = 1;
            a[0][0] = T::one();

            for k in 1..=n {
                let mut d = T::zero();
                let rk = r - k;
                let pk = (idegree - k) as usize;

                if r >= k {
                    a[s2][0] = ratio(a[s1][0], ndu[pk + 1][rk as usize]);
                    d = a[s2][0] * ndu[rk as usize][pk];
                }

                let j1 = if rk >= -1 { 1 } else { -rk };
                let j2 = if r - 1 <= pk as isize { k - 1 } else { idegree - r };

                for j in j1..=j2 {
                    let j = j as usize;
                    let col = (rk + j as isize) as usize;
                    a[s2][j] = ratio(a[s1][j] - a[s1][j - 1], ndu[pk + 1][col]);
                    d += a[s2][j] * ndu[col][pk];
                }

                let uk = k as usize;
                let ur = r as usize;
                if r <= pk as isize {
                    a[s2][uk] = ratio(-a[s1][uk - 1], ndu[pk + 1][ur]);
                    d += a[s2][uk] * ndu[ur][pk];
                }

                ders[uk][ur] = d;

                std::mem::swap(&mut s1, &mut s2);
            }
        }

        // multiply through by degree! / (degree - k)!
        let mut acc = degree;
        for k in 1..=du {
            let factor: T = convert(acc as f64);
            ders[k].iter_mut().for_each(|v| *v *= factor);
            acc *= degree - k;
        }
    }
}

/// Quotient that resolves a zero knot difference to a zero term
fn ratio<T: FloatingPoint>(numerator: T, denominator: T) -> T {
    if denominator == T::zero() {
        T::zero()
    } else {
        numerator / denominator
    }
}

/// Evaluates the B-spline basis of one knot vector
#[derive(Clone, Debug)]
pub struct BasisEvaluator<'a, T> {
    knots: &'a KnotVector<T>,
    order: usize,
    control_point_count: usize,
    policy: DomainPolicy,
}

impl<'a, T: FloatingPoint> BasisEvaluator<'a, T> {
    /// Build an evaluator, checking that `knots` describes a usable basis of `order`
    /// The knots must pass [`KnotVector::validate`] for `knots.len() - order` functions.
    pub fn try_new(knots: &'a KnotVector<T>, order: usize) -> Result<Self> {
        if order == 0 {
            return Err(CurveError::InvalidOrder { order });
        }
        if knots.len() < 2 * order {
            return Err(CurveError::invalid_knot_vector(format!(
                "order {} needs at least {} knots, got {}",
                order,
                2 * order,
                knots.len()
            )));
        }
        knots.validate(order, knots.len() - order)?;
        let (start, end) = knots.domain(order);
        if start >= end {
            return Err(CurveError::DegenerateCurve {
                start: start.to_f64_or_nan(),
                end: end.to_f64_or_nan(),
            });
        }
        Ok(Self::for_validated(knots, order))
    }

    /// Evaluator over knots already validated by a curve
    pub(crate) fn for_validated(knots: &'a KnotVector<T>, order: usize) -> Self {
        Self {
            knots,
            order,
            control_point_count: knots.len() - order,
            policy: DomainPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: DomainPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn order(&self) -> usize {
        self.order
    }

    pub fn degree(&self) -> usize {
        self.order - 1
    }

    pub fn policy(&self) -> DomainPolicy {
        self.policy
    }

    pub fn domain(&self) -> (T, T) {
        self.knots.domain(self.order)
    }

    /// Check `t` against the domain, clamping it if the policy allows
    pub fn resolve_parameter(&self, t: T) -> Result<T> {
        let (start, end) = self.domain();
        if t >= start && t <= end {
            return Ok(t);
        }
        match self.policy {
            DomainPolicy::Clamp if t < start => Ok(start),
            DomainPolicy::Clamp if t > end => Ok(end),
            _ => Err(CurveError::ParameterOutOfDomain {
                parameter: t.to_f64_or_nan(),
                start: start.to_f64_or_nan(),
                end: end.to_f64_or_nan(),
            }),
        }
    }

    /// Knot span of a parameter after domain resolution
    pub fn span(&self, t: T) -> Result<usize> {
        let t = self.resolve_parameter(t)?;
        Ok(self
            .knots
            .find_span(self.order, self.control_point_count, t))
    }

    /// Basis values and derivatives up to `derivative_order` at `t`
    ///
    /// # Example
    /// ```
    /// use spline_kernel::prelude::*;
    /// let knots = KnotVector::new(vec![0., 0., 0., 1., 2., 3., 3., 3.]);
    /// let basis = BasisEvaluator::try_new(&knots, 3).unwrap();
    /// let functions = basis.evaluate(2.5, 1).unwrap();
    /// assert_eq!(functions.span(), 4);
    /// let sum: f64 = functions.values().iter().sum();
    /// assert!((sum - 1.).abs() < 1e-12);
    /// ```
    pub fn evaluate(&self, t: T, derivative_order: usize) -> Result<BasisFunctions<T>> {
        let mut scratch = BasisScratch::new(self.order);
        self.evaluate_with(t, derivative_order, &mut scratch)
    }

    /// Same as [`BasisEvaluator::evaluate`] with caller-supplied work tables
    pub fn evaluate_with(
        &self,
        t: T,
        derivative_order: usize,
        scratch: &mut BasisScratch<T>,
    ) -> Result<BasisFunctions<T>> {
        if derivative_order > MAX_DERIVATIVE_ORDER {
            return Err(CurveError::UnsupportedDerivativeOrder {
                order: derivative_order,
                max: MAX_DERIVATIVE_ORDER,
            });
        }
        let t = self.resolve_parameter(t)?;
        Ok(self.evaluate_resolved(t, derivative_order, scratch))
    }

    /// Evaluation for a parameter already inside the domain
    pub(crate) fn evaluate_resolved(
        &self,
        t: T,
        derivative_order: usize,
        scratch: &mut BasisScratch<T>,
    ) -> BasisFunctions<T> {
        let span = self
            .knots
            .find_span(self.order, self.control_point_count, t);
        log::trace!(
            "basis at {} in span {} (order {}, {} derivatives)",
            t.to_f64_or_nan(),
            span,
            self.order,
            derivative_order
        );

        let degree = self.degree();
        let mut table = vec![vec![T::zero(); self.order]; derivative_order + 1];
        if derivative_order == 0 {
            scratch.fill_values(self.knots, span, t, degree, &mut table[0]);
        } else {
            // derivatives above the degree vanish
            let du = derivative_order.min(degree);
            scratch.fill_derivatives(self.knots, span, t, degree, du, &mut table);
        }

        BasisFunctions::new(span, self.order, t, table)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    fn knots(values: &[f64]) -> KnotVector<f64> {
        KnotVector::new(values.to_vec())
    }

    #[test]
    fn partition_of_unity() {
        let k = knots(&[0., 0., 0., 0., 0.3, 0.5, 0.5, 0.8, 1., 1., 1., 1.]);
        let basis = BasisEvaluator::try_new(&k, 4).unwrap();
        let mut scratch = BasisScratch::new(4);
        for i in 0..=100 {
            let t = i as f64 / 100.;
            let f = basis.evaluate_with(t, 0, &mut scratch).unwrap();
            assert_relative_eq!(f.values().iter().sum::<f64>(), 1., epsilon = 1e-12);
            assert!(f.values().iter().all(|v| *v >= -1e-15));
        }
    }

    #[test]
    fn derivative_rows_match_value_only_path() {
        let k = knots(&[0., 0., 0., 1., 2., 3., 3., 3.]);
        let basis = BasisEvaluator::try_new(&k, 3).unwrap();
        for t in [0., 0.4, 1., 1.7, 2.5, 3.] {
            let values = basis.evaluate(t, 0).unwrap();
            let ders = basis.evaluate(t, 2).unwrap();
            for (a, b) in values.values().iter().zip(ders.values()) {
                assert_relative_eq!(a, b, epsilon = 1e-12);
            }
            // derivatives of a partition of unity sum to zero
            assert_relative_eq!(ders.derivative(1).unwrap().iter().sum::<f64>(), 0., epsilon = 1e-12);
            assert_relative_eq!(ders.derivative(2).unwrap().iter().sum::<f64>(), 0., epsilon = 1e-12);
        }
    }

    #[test]
    fn quadratic_bernstein_values() {
        let k = knots(&[0., 0., 0., 1., 1., 1.]);
        let basis = BasisEvaluator::try_new(&k, 3).unwrap();
        let f = basis.evaluate(0.25, 2).unwrap();
        let t: f64 = 0.25;
        assert_eq!(f.first_index(), 0);
        assert_relative_eq!(f.values()[0], (1. - t).powi(2));
        assert_relative_eq!(f.values()[1], 2. * t * (1. - t));
        assert_relative_eq!(f.values()[2], t * t);
        let d1 = f.derivative(1).unwrap();
        assert_relative_eq!(d1[0], -2. * (1. - t));
        assert_relative_eq!(d1[1], 2. - 4. * t);
        assert_relative_eq!(d1[2], 2. * t);
        let d2 = f.derivative(2).unwrap();
        assert_relative_eq!(d2[0], 2.);
        assert_relative_eq!(d2[1], -4.);
        assert_relative_eq!(d2[2], 2.);
    }

    #[test]
    fn derivatives_above_degree_are_zero() {
        let k = knots(&[0., 0., 1., 1.]);
        let basis = BasisEvaluator::try_new(&k, 2).unwrap();
        let f = basis.evaluate(0.5, 3).unwrap();
        assert_eq!(f.derivative_order(), 3);
        assert_eq!(f.derivative(2).unwrap(), &[0., 0.]);
        assert_eq!(f.derivative(3).unwrap(), &[0., 0.]);
        assert!(f.derivative(4).is_none());
    }

    #[test]
    fn order_one_is_piecewise_constant() {
        let k = knots(&[0., 1., 2., 3.]);
        let basis = BasisEvaluator::try_new(&k, 1).unwrap();
        let f = basis.evaluate(1.5, 1).unwrap();
        assert_eq!(f.span(), 1);
        assert_eq!(f.values(), &[1.]);
        assert_eq!(f.derivative(1).unwrap(), &[0.]);
    }

    #[test]
    fn coincident_knots_do_not_fault() {
        let k = knots(&[0., 0., 0., 0.5, 0.5, 1., 1., 1.]);
        let basis = BasisEvaluator::try_new(&k, 3).unwrap();
        for t in [0., 0.5, 1.] {
            let f = basis.evaluate(t, 2).unwrap();
            assert!(f.rows().iter().flatten().all(|v| v.is_finite()));
            assert_relative_eq!(f.values().iter().sum::<f64>(), 1., epsilon = 1e-12);
        }
        assert_eq!(ratio(0., 0.), 0.);
    }

    #[test]
    fn domain_policy() {
        let k = knots(&[0., 0., 1., 1.]);
        let strict = BasisEvaluator::try_new(&k, 2).unwrap();
        let err = strict.evaluate(1.5, 0).unwrap_err();
        assert_eq!(
            err,
            CurveError::ParameterOutOfDomain {
                parameter: 1.5,
                start: 0.,
                end: 1.
            }
        );
        assert!(strict.evaluate(f64::NAN, 0).is_err());

        let clamp = strict.clone().with_policy(DomainPolicy::Clamp);
        let f = clamp.evaluate(-3., 0).unwrap();
        assert_eq!(f.parameter(), 0.);
        assert_eq!(f.values(), &[1., 0.]);
        assert!(clamp.evaluate(f64::NAN, 0).is_err());
    }

    #[test]
    fn rejects_unvalidated_knots() {
        let decreasing = knots(&[0., 0., 2., 1., 3., 3.]);
        assert!(matches!(
            BasisEvaluator::try_new(&decreasing, 2),
            Err(CurveError::InvalidKnotVector { .. })
        ));
        let nan = knots(&[0., 0., f64::NAN, 1., 1.]);
        assert!(matches!(
            BasisEvaluator::try_new(&nan, 2),
            Err(CurveError::InvalidKnotVector { .. })
        ));
        let crowded = knots(&[0., 0., 0.5, 0.5, 0.5, 1., 1.]);
        assert!(matches!(
            BasisEvaluator::try_new(&crowded, 2),
            Err(CurveError::InvalidKnotVector { .. })
        ));
    }

    #[test]
    fn derivative_order_is_bounded() {
        let k = knots(&[0., 0., 1., 1.]);
        let basis = BasisEvaluator::try_new(&k, 2).unwrap();
        assert!(basis.evaluate(0.5, MAX_DERIVATIVE_ORDER).is_ok());
        assert_eq!(
            basis.evaluate(0.5, usize::MAX).unwrap_err(),
            CurveError::UnsupportedDerivativeOrder {
                order: usize::MAX,
                max: MAX_DERIVATIVE_ORDER
            }
        );
    }

    #[test]
    fn rejects_unusable_knots() {
        let k = knots(&[0., 0., 0., 0.]);
        assert!(matches!(
            BasisEvaluator::try_new(&k, 2),
            Err(CurveError::DegenerateCurve { .. })
        ));
        assert!(matches!(
            BasisEvaluator::try_new(&k, 3),
            Err(CurveError::InvalidKnotVector { .. })
        ));
        assert!(matches!(
            BasisEvaluator::try_new(&k, 0),
            Err(CurveError::InvalidOrder { order: 0 })
        ));
    }
}
