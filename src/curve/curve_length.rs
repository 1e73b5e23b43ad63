use gauss_quad::GaussLegendre;
use nalgebra::allocator::Allocator;
use nalgebra::{convert, DefaultAllocator, DimName, DimNameDiff, DimNameSub, U1};

use crate::basis::BasisScratch;
use crate::error::{CurveError, Result};
use crate::misc::FloatingPoint;

use super::{CurveLengthParameter, NurbsCurve};

/// Relative tolerance of the arc length bisection
const LENGTH_TOLERANCE: f64 = 1e-9;
const MAX_BISECTIONS: usize = 128;

impl<T: FloatingPoint, D: DimName> NurbsCurve<T, D>
where
    D: DimNameSub<U1>,
    DefaultAllocator: Allocator<D>,
    DefaultAllocator: Allocator<DimNameDiff<D, U1>>,
{
    /// Compute the length of the curve by gauss-legendre quadrature
    /// Each knot span is integrated separately so the speed is smooth inside every interval.
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
    /// let length = quarter.try_length().unwrap();
    /// assert_relative_eq!(length, std::f64::consts::FRAC_PI_2, epsilon = 1e-10);
    /// ```
    pub fn try_length(&self) -> Result<T> {
        let gauss = self.quadrature()?;
        let length = self
            .knots()
            .spans(self.order())
            .into_iter()
            .map(|(a, b)| self.span_length(a, b, &gauss))
            .fold(T::zero(), |acc, l| acc + l);
        if length.is_finite() {
            Ok(length)
        } else {
            Err(CurveError::invalid_argument("curve length is not finite"))
        }
    }

    /// Divide the curve into pieces of equal arc length `length`
    /// The first entry is the domain start; the remainder shorter than `length` is dropped.
    /// # Example
    /// ```
    /// use spline_kernel::prelude::*;
    /// use nalgebra::Point2;
    /// use approx::assert_relative_eq;
    /// let line = NurbsCurve2D::try_polynomial(
    ///     2,
    ///     vec![0., 0., 1., 1.],
    ///     &[Point2::new(0., 0.), Point2::new(4., 0.)],
    /// ).unwrap();
    /// let params = line.try_divide_by_length(1.5).unwrap();
    /// assert_eq!(params.len(), 3);
    /// assert_relative_eq!(params[1].length(), 1.5);
    /// assert_relative_eq!(params[2].parameter(), 0.75, epsilon = 1e-8);
    /// ```
    pub fn try_divide_by_length(&self, length: T) -> Result<Vec<CurveLengthParameter<T>>> {
        if length <= T::zero() || !length.is_finite() {
            return Err(CurveError::invalid_argument(
                "the division length must be positive and finite",
            ));
        }

        let gauss = self.quadrature()?;
        let spans = self.knots().spans(self.order());
        let lengths: Vec<T> = spans
            .iter()
            .map(|(a, b)| self.span_length(*a, *b, &gauss))
            .collect();
        let total = lengths.iter().fold(T::zero(), |a, b| a + *b);
        let eps = total * convert(LENGTH_TOLERANCE);

        if total + eps < length {
            return Err(CurveError::invalid_argument(
                "the curve is too short to divide by the given length",
            ));
        }

        let mut samples = vec![CurveLengthParameter::new(self.domain_start(), T::zero())];
        let mut target = length;
        let mut acc_prev = T::zero();

        for ((a, b), span_length) in spans.iter().zip(lengths.iter()) {
            let acc = acc_prev + *span_length;
            while target <= acc + eps {
                let u = self.parameter_at_span_length(
                    (*a, *b),
                    target - acc_prev,
                    *span_length,
                    &gauss,
                );
                samples.push(CurveLengthParameter::new(u, target));
                target += length;
            }
            acc_prev = acc;
        }

        Ok(samples)
    }

    /// Divide the curve into `segments` pieces of equal arc length
    /// Returns `segments + 1` entries from the domain start to the domain end.
    pub fn try_divide_by_count(&self, segments: usize) -> Result<Vec<CurveLengthParameter<T>>> {
        if segments == 0 {
            return Err(CurveError::invalid_argument(
                "the segment count must be at least one",
            ));
        }
        let total = self.try_length()?;
        let mut params = self.try_divide_by_length(total / convert(segments as f64))?;
        // rounding can add or drop the final sample
        params.truncate(segments + 1);
        if params.len() == segments {
            params.push(CurveLengthParameter::new(self.domain_end(), total));
        }
        Ok(params)
    }

    fn quadrature(&self) -> Result<GaussLegendre> {
        GaussLegendre::new(16 + self.degree())
            .map_err(|e| CurveError::invalid_argument(format!("quadrature rule: {}", e)))
    }

    /// Arc length of the curve over `[a, b]` with both ends in one knot span
    fn span_length(&self, a: T, b: T, gauss: &GaussLegendre) -> T {
        if b <= a {
            return T::zero();
        }
        let mut scratch = BasisScratch::new(self.order());
        let sum = gauss.integrate(a.to_f64_or_nan(), b.to_f64_or_nan(), |x| {
            let d = self.rational_derivatives(convert(x), 1, &mut scratch);
            d[1].norm().to_f64_or_nan()
        });
        convert(sum)
    }

    /// Find the parameter in `span` whose arc length from the span start is `length`
    /// by binary search
    fn parameter_at_span_length(
        &self,
        span: (T, T),
        length: T,
        span_length: T,
        gauss: &GaussLegendre,
    ) -> T {
        let (k0, k1) = span;
        if length <= T::zero() {
            return k0;
        } else if length >= span_length {
            return k1;
        }

        let tolerance = span_length * convert(LENGTH_TOLERANCE);
        let half: T = convert(0.5);
        let mut start = (k0, T::zero());
        let mut end = (k1, span_length);

        for _ in 0..MAX_BISECTIONS {
            if end.1 - start.1 <= tolerance {
                break;
            }
            let middle = (start.0 + end.0) * half;
            let mid = (middle, self.span_length(k0, middle, gauss));
            if mid.1 > length {
                end = mid;
            } else {
                start = mid;
            }
        }

        (start.0 + end.0) * half
    }
}
