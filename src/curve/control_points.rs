use std::ops::Index;

use nalgebra::allocator::Allocator;
use nalgebra::{DefaultAllocator, DimName, DimNameDiff, DimNameSub, OPoint, OVector, U1};
use simba::scalar::SupersetOf;

use crate::error::{CurveError, Result};
use crate::misc::FloatingPoint;

/// Ordered control points in homogeneous coordinates
/// the last element of each point is the `weight`, the others are `weight * coordinate`
///
/// The collection never changes after construction; copy it with
/// [`ControlPoints::to_vec`] to build a modified set.
#[derive(Clone, Debug)]
pub struct ControlPoints<T: FloatingPoint, D: DimName>
where
    DefaultAllocator: Allocator<D>,
{
    points: Vec<OPoint<T, D>>,
}

impl<T: FloatingPoint, D: DimName> ControlPoints<T, D>
where
    DefaultAllocator: Allocator<D>,
{
    /// Wrap homogeneous points, checking that every coordinate is finite
    /// and every weight positive
    pub fn try_from_homogeneous(points: Vec<OPoint<T, D>>) -> Result<Self> {
        let w = D::dim() - 1;
        for (index, p) in points.iter().enumerate() {
            if p.coords.iter().any(|c| !c.is_finite()) {
                return Err(CurveError::InvalidControlPoint { index });
            }
            if p[w] <= T::zero() {
                return Err(CurveError::InvalidWeight {
                    index,
                    value: p[w].to_f64_or_nan(),
                });
            }
        }
        Ok(Self { points })
    }

    pub(crate) fn from_validated(points: Vec<OPoint<T, D>>) -> Self {
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Homogeneous point at `index`
    pub fn get(&self, index: usize) -> Option<&OPoint<T, D>> {
        self.points.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, OPoint<T, D>> {
        self.points.iter()
    }

    pub fn as_slice(&self) -> &[OPoint<T, D>] {
        &self.points
    }

    pub fn to_vec(&self) -> Vec<OPoint<T, D>> {
        self.points.clone()
    }

    pub fn weight(&self, index: usize) -> Option<T> {
        self.points.get(index).map(|p| p[D::dim() - 1])
    }

    pub fn weights(&self) -> Vec<T> {
        self.points.iter().map(|p| p[D::dim() - 1]).collect()
    }

    /// True when any weight differs from one
    pub fn has_non_unit_weights(&self) -> bool {
        self.points.iter().any(|p| p[D::dim() - 1] != T::one())
    }

    /// Cast the control points to another floating point type
    pub fn cast<F: FloatingPoint + SupersetOf<T>>(&self) -> ControlPoints<F, D> {
        ControlPoints {
            points: self.points.iter().map(|p| p.clone().cast()).collect(),
        }
    }
}

impl<T: FloatingPoint, D: DimName> ControlPoints<T, D>
where
    D: DimNameSub<U1>,
    DefaultAllocator: Allocator<D>,
    DefaultAllocator: Allocator<DimNameDiff<D, U1>>,
{
    /// Build homogeneous points from Cartesian points and optional weights
    ///
    /// # Example
    /// ```
    /// use spline_kernel::prelude::*;
    /// use nalgebra::{Const, Point2};
    /// let points = ControlPoints::<f64, Const<3>>::try_from_cartesian(
    ///     &[Point2::new(1., 0.), Point2::new(1., 1.)],
    ///     Some(&[1., 0.5]),
    /// )
    /// .unwrap();
    /// assert_eq!(points.get(1).unwrap().coords.as_slice(), &[0.5, 0.5, 0.5]);
    /// assert_eq!(points.cartesian(1).unwrap(), Point2::new(1., 1.));
    /// ```
    pub fn try_from_cartesian(
        points: &[OPoint<T, DimNameDiff<D, U1>>],
        weights: Option<&[T]>,
    ) -> Result<Self> {
        if let Some(weights) = weights {
            if weights.len() != points.len() {
                return Err(CurveError::InvalidControlPointCount {
                    required: points.len(),
                    actual: weights.len(),
                });
            }
        }

        let dim = D::dim() - 1;
        let mut homogeneous = Vec::with_capacity(points.len());
        for (index, p) in points.iter().enumerate() {
            if p.coords.iter().any(|c| !c.is_finite()) {
                return Err(CurveError::InvalidControlPoint { index });
            }
            let w = weights.map_or(T::one(), |ws| ws[index]);
            if !w.is_finite() || w <= T::zero() {
                return Err(CurveError::InvalidWeight {
                    index,
                    value: w.to_f64_or_nan(),
                });
            }
            homogeneous.push(homogenize(p, w, dim));
        }

        Ok(Self {
            points: homogeneous,
        })
    }

    /// Cartesian point at `index` with the weight divided out
    pub fn cartesian(&self, index: usize) -> Option<OPoint<T, DimNameDiff<D, U1>>> {
        self.points.get(index).and_then(dehomogenize)
    }

    /// All Cartesian points
    pub fn to_cartesian(&self) -> Vec<OPoint<T, DimNameDiff<D, U1>>> {
        self.points.iter().filter_map(dehomogenize).collect()
    }
}

impl<T: FloatingPoint, D: DimName> Index<usize> for ControlPoints<T, D>
where
    DefaultAllocator: Allocator<D>,
{
    type Output = OPoint<T, D>;
    fn index(&self, index: usize) -> &Self::Output {
        &self.points[index]
    }
}

impl<'a, T: FloatingPoint, D: DimName> IntoIterator for &'a ControlPoints<T, D>
where
    DefaultAllocator: Allocator<D>,
{
    type Item = &'a OPoint<T, D>;
    type IntoIter = std::slice::Iter<'a, OPoint<T, D>>;
    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}

fn homogenize<T: FloatingPoint, D: DimName>(
    point: &OPoint<T, DimNameDiff<D, U1>>,
    weight: T,
    dim: usize,
) -> OPoint<T, D>
where
    D: DimNameSub<U1>,
    DefaultAllocator: Allocator<D>,
    DefaultAllocator: Allocator<DimNameDiff<D, U1>>,
{
    OPoint::from(OVector::<T, D>::from_fn(|i, _| {
        if i < dim {
            point[i] * weight
        } else {
            weight
        }
    }))
}

/// Dehomogenize a point
/// Returns `None` for a zero weight
pub fn dehomogenize<T: FloatingPoint, D: DimName>(
    point: &OPoint<T, D>,
) -> Option<OPoint<T, DimNameDiff<D, U1>>>
where
    D: DimNameSub<U1>,
    DefaultAllocator: Allocator<D>,
    DefaultAllocator: Allocator<DimNameDiff<D, U1>>,
{
    let w = point[D::dim() - 1];
    if w != T::zero() {
        let coords = OVector::<T, DimNameDiff<D, U1>>::from_fn(|i, _| point[i] / w);
        Some(OPoint::from(coords))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use nalgebra::{Const, Point1, Point2, Point3};

    use super::*;

    #[test]
    fn rejects_bad_weights() {
        let pts = [Point2::new(0., 0.), Point2::new(1., 0.)];
        let err = ControlPoints::<f64, Const<3>>::try_from_cartesian(&pts, Some(&[1., 0.]))
            .unwrap_err();
        assert_eq!(err, CurveError::InvalidWeight { index: 1, value: 0. });

        let err = ControlPoints::<f64, Const<3>>::try_from_cartesian(&pts, Some(&[1.]))
            .unwrap_err();
        assert_eq!(
            err,
            CurveError::InvalidControlPointCount {
                required: 2,
                actual: 1
            }
        );

        let err =
            ControlPoints::<f64, Const<3>>::try_from_cartesian(&pts, Some(&[1., f64::INFINITY]))
                .unwrap_err();
        assert!(matches!(err, CurveError::InvalidWeight { index: 1, .. }));
    }

    #[test]
    fn rejects_non_finite_coordinates() {
        let pts = [Point1::new(0.), Point1::new(f64::NAN)];
        let err = ControlPoints::<f64, Const<2>>::try_from_cartesian(&pts, None).unwrap_err();
        assert_eq!(err, CurveError::InvalidControlPoint { index: 1 });

        let err = ControlPoints::<f64, Const<2>>::try_from_homogeneous(vec![Point2::new(1., -1.)])
            .unwrap_err();
        assert!(matches!(err, CurveError::InvalidWeight { index: 0, .. }));
    }

    #[test]
    fn homogeneous_round_trip() {
        let pts = [Point2::new(2., 4.), Point2::new(-1., 3.)];
        let cps =
            ControlPoints::<f64, Const<3>>::try_from_cartesian(&pts, Some(&[2., 0.25])).unwrap();
        assert_eq!(cps[0], Point3::new(4., 8., 2.));
        assert_eq!(cps.weights(), vec![2., 0.25]);
        assert_eq!(cps.to_cartesian(), pts.to_vec());
        assert!(cps.has_non_unit_weights());
        assert_eq!(cps.weight(2), None);
    }
}
