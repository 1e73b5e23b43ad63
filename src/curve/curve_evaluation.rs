use nalgebra::allocator::Allocator;
use nalgebra::{DVector, DefaultAllocator, Dim, DimName, Dyn, OPoint, OVector};

use crate::misc::FloatingPoint;

/// Point and derivatives of a curve at one parameter, in Cartesian space
///
/// `derivatives()[0]` is the position, `derivatives()[k]` the `k`-th
/// derivative. For rational curves the weights are already divided out.
#[derive(Clone, Debug)]
pub struct CurveEvaluation<T: FloatingPoint, D: Dim>
where
    DefaultAllocator: Allocator<D>,
{
    parameter: T,
    derivatives: Vec<OVector<T, D>>,
}

impl<T: FloatingPoint, D: Dim> CurveEvaluation<T, D>
where
    DefaultAllocator: Allocator<D>,
{
    pub(crate) fn new(parameter: T, derivatives: Vec<OVector<T, D>>) -> Self {
        Self {
            parameter,
            derivatives,
        }
    }

    /// Parameter actually evaluated, after any domain clamping
    pub fn parameter(&self) -> T {
        self.parameter
    }

    pub fn derivative_order(&self) -> usize {
        self.derivatives.len() - 1
    }

    /// Position as a vector
    pub fn position(&self) -> &OVector<T, D> {
        &self.derivatives[0]
    }

    /// First derivative, if requested
    pub fn tangent(&self) -> Option<&OVector<T, D>> {
        self.derivatives.get(1)
    }

    pub fn derivative(&self, k: usize) -> Option<&OVector<T, D>> {
        self.derivatives.get(k)
    }

    pub fn derivatives(&self) -> &[OVector<T, D>] {
        &self.derivatives
    }

    pub fn into_derivatives(self) -> Vec<OVector<T, D>> {
        self.derivatives
    }

    /// Copy into dynamically sized vectors
    pub fn into_dynamic(self) -> CurveEvaluation<T, Dyn> {
        CurveEvaluation::<T, Dyn> {
            parameter: self.parameter,
            derivatives: self
                .derivatives
                .iter()
                .map(|v| DVector::from_iterator(v.len(), v.iter().copied()))
                .collect(),
        }
    }
}

impl<T: FloatingPoint, D: DimName> CurveEvaluation<T, D>
where
    DefaultAllocator: Allocator<D>,
{
    pub fn point(&self) -> OPoint<T, D> {
        OPoint::from(self.derivatives[0].clone())
    }
}
