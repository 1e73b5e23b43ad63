use std::ops::Index;

use itertools::Itertools;
use nalgebra::convert;
use simba::scalar::SupersetOf;

use crate::error::{CurveError, Result};
use crate::misc::{FloatingPoint, Invertible};

use super::KnotMultiplicity;

/// Knot vector representation
///
/// A validated knot vector (see [`KnotVector::try_new`]) is finite,
/// non-decreasing, has `control_point_count + order` entries and no interior
/// value repeated more than `order` times.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct KnotVector<T>(Vec<T>);

impl<T: FloatingPoint> KnotVector<T> {
    /// Wrap knots without validation.
    /// Curves and basis evaluators run [`KnotVector::validate`] on it before use.
    pub fn new(knots: Vec<T>) -> Self {
        Self(knots)
    }

    /// Validate knots for a curve of `order` with `control_point_count` control points
    ///
    /// # Example
    /// ```
    /// use spline_kernel::prelude::*;
    /// let knots = KnotVector::try_new(vec![0., 0., 0., 0., 1., 1., 1., 1.], 4, 4);
    /// assert!(knots.is_ok());
    ///
    /// let knots = KnotVector::try_new(vec![0., 1., 0., 2.], 2, 2);
    /// assert!(matches!(knots, Err(CurveError::InvalidKnotVector { .. })));
    /// ```
    pub fn try_new(knots: Vec<T>, order: usize, control_point_count: usize) -> Result<Self> {
        let vector = Self(knots);
        vector.validate(order, control_point_count)?;
        Ok(vector)
    }

    /// Check the knots against `order` and `control_point_count`
    /// Knot vectors wrapped with [`KnotVector::new`] must pass this before use.
    pub fn validate(&self, order: usize, control_point_count: usize) -> Result<()> {
        let knots = &self.0;
        if order == 0 {
            return Err(CurveError::InvalidOrder { order });
        }

        let expected = control_point_count + order;
        if knots.len() != expected {
            return Err(CurveError::invalid_knot_vector(format!(
                "expected {} knots ({} control points + order {}), got {}",
                expected,
                control_point_count,
                order,
                knots.len()
            )));
        }

        if let Some(i) = knots.iter().position(|k| !k.is_finite()) {
            return Err(CurveError::invalid_knot_vector(format!(
                "knot {} is not finite",
                i
            )));
        }

        if let Some((i, _)) = knots
            .iter()
            .tuple_windows()
            .enumerate()
            .find(|(_, (a, b))| b < a)
        {
            return Err(CurveError::invalid_knot_vector(format!(
                "knots must be non-decreasing, but knot {} ({}) is less than knot {} ({})",
                i + 1,
                knots[i + 1].to_f64_or_nan(),
                i,
                knots[i].to_f64_or_nan()
            )));
        }

        let (first, last) = (self.first(), self.last());
        let exceeding = self
            .runs(|a, b| a == b)
            .into_iter()
            .find(|run| {
                let knot = *run.knot();
                knot != first && knot != last && run.multiplicity() > order
            });
        if let Some(run) = exceeding {
            return Err(CurveError::invalid_knot_vector(format!(
                "interior knot {} at index {} has multiplicity {}, more than order {}",
                run.knot().to_f64_or_nan(),
                run.start_index(),
                run.multiplicity(),
                order
            )));
        }

        Ok(())
    }

    /// Create a clamped knot vector with integer spacing
    /// the first and last knots are repeated `order` times
    /// # Example
    /// ```
    /// use spline_kernel::prelude::KnotVector;
    /// let knots: KnotVector<f64> = KnotVector::uniform(5, 3);
    /// assert_eq!(knots.to_vec(), vec![0., 0., 0., 1., 2., 3., 3., 3.]);
    /// ```
    pub fn uniform(control_point_count: usize, order: usize) -> Self {
        let segments = control_point_count.saturating_sub(order) + 1;
        let mut knots = Vec::with_capacity(control_point_count + order);
        knots.extend(std::iter::repeat_n(T::zero(), order));
        for i in 1..segments {
            knots.push(convert(i as f64));
        }
        knots.extend(std::iter::repeat_n(convert::<f64, T>(segments as f64), order));
        Self(knots)
    }

    /// Create a clamped knot vector spread evenly over `[0, 1]`
    /// # Example
    /// ```
    /// use spline_kernel::prelude::KnotVector;
    /// let knots: KnotVector<f64> = KnotVector::clamped_uniform(6, 3);
    /// assert_eq!(knots.to_vec(), vec![0., 0., 0., 0.25, 0.5, 0.75, 1., 1., 1.]);
    /// ```
    pub fn clamped_uniform(control_point_count: usize, order: usize) -> Self {
        let segments = control_point_count.saturating_sub(order) + 1;
        let inv: T = T::one() / convert(segments as f64);
        let mut uniform = Self::uniform(control_point_count, order);
        uniform.0.iter_mut().for_each(|k| *k *= inv);
        uniform
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_vec(&self) -> Vec<T> {
        self.0.clone()
    }

    pub fn first(&self) -> T {
        self.0[0]
    }

    pub fn last(&self) -> T {
        self.0[self.0.len() - 1]
    }

    pub fn as_slice(&self) -> &[T] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.0.iter()
    }

    /// Get the domain of the knot vector by order
    /// `(knots[order - 1], knots[len - order])`
    pub fn domain(&self, order: usize) -> (T, T) {
        (self.0[order - 1], self.0[self.0.len() - order])
    }

    pub fn clamp(&self, order: usize, u: T) -> T {
        let (min, max) = self.domain(order);
        u.clamp(min, max)
    }

    /// Find the knot span containing `u` by binary search
    ///
    /// Returns the largest `i` in `[order - 1, control_point_count - 1]` with
    /// `knots[i] <= u < knots[i + 1]`. The domain end maps to the last span of
    /// nonzero length. Parameters outside the domain are clamped first.
    ///
    /// # Example
    /// ```
    /// use spline_kernel::prelude::KnotVector;
    /// let knots = KnotVector::new(vec![0., 0., 0., 1., 2., 3., 3., 3.]);
    /// assert_eq!(knots.find_span(3, 5, 2.5), 4);
    /// assert_eq!(knots.find_span(3, 5, 1.0), 3);
    /// assert_eq!(knots.find_span(3, 5, 3.0), 4);
    /// ```
    pub fn find_span(&self, order: usize, control_point_count: usize, u: T) -> usize {
        debug_assert!(order >= 1 && control_point_count >= order);
        let degree = order - 1;
        let n = control_point_count;
        let (start, end) = self.domain(order);

        if u >= end {
            let mut span = n - 1;
            while span > degree && self[span] >= self[span + 1] {
                span -= 1;
            }
            return span;
        }

        let u = if u < start { start } else { u };

        // knots[low] <= u < knots[high]
        let mut low = degree;
        let mut high = n;
        while high - low > 1 {
            let mid = (low + high) / 2;
            if u < self[mid] {
                high = mid;
            } else {
                low = mid;
            }
        }
        low
    }

    /// Get the multiplicity of each knot
    /// # Example
    /// ```
    /// use spline_kernel::prelude::KnotVector;
    /// let knots = KnotVector::new(vec![0., 0., 0., 1., 2., 3., 3., 3.]);
    /// let knot_multiplicity = knots.multiplicity();
    /// assert_eq!(knot_multiplicity[0].multiplicity(), 3);
    /// assert_eq!(knot_multiplicity[1].multiplicity(), 1);
    /// assert_eq!(knot_multiplicity[2].multiplicity(), 1);
    /// assert_eq!(knot_multiplicity[3].multiplicity(), 3);
    /// ```
    pub fn multiplicity(&self) -> Vec<KnotMultiplicity<T>> {
        self.runs(|a, b| (a - b).abs() <= T::default_epsilon())
    }

    fn runs(&self, same: impl Fn(T, T) -> bool) -> Vec<KnotMultiplicity<T>> {
        let Some(&head) = self.0.first() else {
            return vec![];
        };

        let mut mult = vec![];
        let mut current = KnotMultiplicity::new(head, 0, 0);
        self.0.iter().enumerate().for_each(|(i, knot)| {
            if !same(*knot, *current.knot()) {
                mult.push(current.clone());
                current = KnotMultiplicity::new(*knot, i, 0);
            }
            current.increment_multiplicity();
        });
        mult.push(current);

        mult
    }

    /// Check if the knot vector is clamped
    /// `clamped` means the first and last knots have a multiplicity of at least the order
    /// e.g. [0, 0, 0, 1, 2, 3, 3, 3] with order 3 is clamped
    pub fn is_clamped(&self, order: usize) -> bool {
        let multiplicity = self.multiplicity();
        match (multiplicity.first(), multiplicity.last()) {
            (Some(start), Some(end)) => {
                start.multiplicity() >= order && end.multiplicity() >= order
            }
            _ => false,
        }
    }

    /// Knot intervals of nonzero length inside the domain
    pub fn spans(&self, order: usize) -> Vec<(T, T)> {
        let (start, end) = self.domain(order);
        self.0[order - 1..=self.0.len() - order]
            .iter()
            .tuple_windows()
            .filter(|(a, b)| a < b && **a >= start && **b <= end)
            .map(|(a, b)| (*a, *b))
            .collect()
    }

    /// Cast the knot vector to another floating point type
    /// # Example
    /// ```
    /// use spline_kernel::prelude::*;
    /// let knots: KnotVector<f64> = KnotVector::new(vec![1., 2., 3., 4., 5., 6.]);
    /// let knots2 = knots.cast::<f32>();
    /// assert_eq!(knots2.first(), 1.0);
    /// ```
    pub fn cast<F: FloatingPoint + SupersetOf<T>>(&self) -> KnotVector<F> {
        KnotVector(self.0.iter().map(|v| convert(*v)).collect())
    }
}

impl<T> Index<usize> for KnotVector<T> {
    type Output = T;
    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

impl<T> AsRef<[T]> for KnotVector<T> {
    fn as_ref(&self) -> &[T] {
        &self.0
    }
}

impl<T: FloatingPoint> Invertible for KnotVector<T> {
    /// Mirror the knot vector so that the spacing runs backwards
    /// # Example
    /// ```
    /// use spline_kernel::prelude::*;
    /// let mut knot = KnotVector::new(vec![0., 0., 0., 1., 2., 2.5, 3.5, 4.0, 4.0]);
    /// knot.invert();
    ///
    /// let dst = vec![0.0, 0.0, 0.5, 1.5, 2.0, 3.0, 4.0, 4.0, 4.0];
    /// knot.iter().enumerate().for_each(|(i, v)| {
    ///     assert_eq!(*v, dst[i]);
    /// });
    /// ```
    fn invert(&mut self) {
        let Some(&min) = self.0.first() else {
            return;
        };

        let len = self.len();
        let mut next = Vec::with_capacity(len);
        next.push(min);
        for i in 1..len {
            next.push(next[i - 1] + (self[len - i] - self[len - i - 1]));
        }

        self.0 = next;
    }
}

#[cfg(test)]
mod tests {
    use crate::error::CurveError;

    use super::KnotVector;

    #[test]
    fn span_lookup() {
        let knots = KnotVector::new(vec![0., 0., 0., 1., 2., 3., 3., 3.]);
        assert_eq!(knots.find_span(3, 5, 0.), 2);
        assert_eq!(knots.find_span(3, 5, 0.5), 2);
        assert_eq!(knots.find_span(3, 5, 1.), 3);
        assert_eq!(knots.find_span(3, 5, 2.5), 4);
        assert_eq!(knots.find_span(3, 5, 3.), 4);
    }

    #[test]
    fn span_lookup_skips_repeated_interior_knots() {
        // interior knot 1 has multiplicity 2
        let knots = KnotVector::new(vec![0., 0., 0., 1., 1., 2., 2., 2.]);
        assert_eq!(knots.find_span(3, 5, 0.999), 2);
        assert_eq!(knots.find_span(3, 5, 1.), 4);
        assert_eq!(knots.find_span(3, 5, 2.), 4);
    }

    #[test]
    fn span_lookup_unclamped() {
        let knots = KnotVector::new((0..8).map(|i| i as f64).collect());
        // order 4, 4 control points: domain [3, 4]
        assert_eq!(knots.domain(4), (3., 4.));
        assert_eq!(knots.find_span(4, 4, 3.), 3);
        assert_eq!(knots.find_span(4, 4, 4.), 3);
    }

    #[test]
    fn span_lookup_order_one() {
        let knots = KnotVector::new(vec![0., 1., 2., 3.]);
        assert_eq!(knots.find_span(1, 3, 0.), 0);
        assert_eq!(knots.find_span(1, 3, 1.5), 1);
        assert_eq!(knots.find_span(1, 3, 3.), 2);
    }

    #[test]
    fn validation() {
        assert!(KnotVector::try_new(vec![0., 0., 1., 1.], 2, 2).is_ok());

        let err = KnotVector::try_new(vec![0., 0., 1.], 2, 2).unwrap_err();
        assert!(matches!(err, CurveError::InvalidKnotVector { .. }));

        let err = KnotVector::try_new(vec![0., 1., 0., 2.], 2, 2).unwrap_err();
        assert!(matches!(err, CurveError::InvalidKnotVector { .. }));

        let err = KnotVector::try_new(vec![0., f64::NAN, 1., 1.], 2, 2).unwrap_err();
        assert!(matches!(err, CurveError::InvalidKnotVector { .. }));

        let err = KnotVector::try_new(vec![0., 1.], 0, 2).unwrap_err();
        assert_eq!(err, CurveError::InvalidOrder { order: 0 });
    }

    #[test]
    fn interior_multiplicity_bound() {
        // order 2: interior knot 1 may appear twice, not three times
        assert!(KnotVector::try_new(vec![0., 0., 1., 1., 2., 2.], 2, 4).is_ok());
        let err = KnotVector::try_new(vec![0., 0., 1., 1., 1., 2., 2.], 2, 5).unwrap_err();
        assert!(matches!(err, CurveError::InvalidKnotVector { .. }));

        // end values may repeat past the order
        assert!(KnotVector::try_new(vec![0., 0., 0., 1., 1., 1.], 2, 4).is_ok());
    }

    #[test]
    fn multiplicity_runs() {
        let knots = KnotVector::new(vec![0., 0., 0., 1., 1., 2., 2., 2.]);
        let runs = knots.multiplicity();
        assert_eq!(runs.len(), 3);
        assert_eq!(runs[1].start_index(), 3);
        assert_eq!(runs[1].multiplicity(), 2);
        assert!(knots.is_clamped(3));
        assert!(!knots.is_clamped(4));
        assert!(KnotVector::<f64>::new(vec![]).multiplicity().is_empty());
    }

    #[test]
    fn nonzero_spans() {
        let knots = KnotVector::new(vec![0., 0., 0., 1., 1., 2., 2., 2.]);
        assert_eq!(knots.spans(3), vec![(0., 1.), (1., 2.)]);
    }

    #[test]
    fn generated_vectors_validate() {
        for order in 1..5 {
            for n in order..order + 4 {
                let knots: KnotVector<f64> = KnotVector::clamped_uniform(n, order);
                assert_eq!(knots.len(), n + order);
                assert_eq!(knots.domain(order), (0., 1.));
                assert!(KnotVector::try_new(knots.to_vec(), order, n).is_ok());
            }
        }
    }
}
