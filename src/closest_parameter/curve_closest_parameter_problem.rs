use argmin::core::{Error, Gradient, Hessian};
use nalgebra::{
    allocator::Allocator, DefaultAllocator, DimName, DimNameDiff, DimNameSub, OPoint, U1,
};

use crate::basis::BasisScratch;
use crate::curve::NurbsCurve;
use crate::misc::FloatingPoint;

/// Gradient & Hessian provider for finding the closest parameter on a curve to a given point.
pub struct CurveClosestParameterProblem<'a, T: FloatingPoint, D: DimName>
where
    DefaultAllocator: Allocator<D>,
    D: DimNameSub<U1>,
    DefaultAllocator: Allocator<DimNameDiff<D, U1>>,
{
    /// The point to find the closest parameter to.
    point: &'a OPoint<T, DimNameDiff<D, U1>>,
    /// The curve to find the closest parameter on.
    curve: &'a NurbsCurve<T, D>,
}

impl<'a, T: FloatingPoint, D: DimName> CurveClosestParameterProblem<'a, T, D>
where
    DefaultAllocator: Allocator<D>,
    D: DimNameSub<U1>,
    DefaultAllocator: Allocator<DimNameDiff<D, U1>>,
{
    pub fn new(point: &'a OPoint<T, DimNameDiff<D, U1>>, curve: &'a NurbsCurve<T, D>) -> Self {
        CurveClosestParameterProblem { point, curve }
    }
}

impl<T: FloatingPoint, D: DimName> Gradient for CurveClosestParameterProblem<'_, T, D>
where
    DefaultAllocator: Allocator<D>,
    D: DimNameSub<U1>,
    DefaultAllocator: Allocator<DimNameDiff<D, U1>>,
{
    type Param = T;
    type Gradient = T;

    /// C'(u) * ( C(u) - P )
    fn gradient(&self, param: &Self::Param) -> Result<Self::Gradient, Error> {
        let mut scratch = BasisScratch::new(self.curve.order());
        let e = self.curve.rational_derivatives(*param, 1, &mut scratch);
        let d = &e[0] - &self.point.coords;
        Ok(e[1].dot(&d))
    }
}

impl<T: FloatingPoint, D: DimName> Hessian for CurveClosestParameterProblem<'_, T, D>
where
    DefaultAllocator: Allocator<D>,
    D: DimNameSub<U1>,
    DefaultAllocator: Allocator<DimNameDiff<D, U1>>,
{
    type Param = T;
    type Hessian = T;

    /// C"(u) * ( C(u) - p ) + C'(u) * C'(u)
    fn hessian(&self, param: &Self::Param) -> Result<Self::Hessian, Error> {
        let mut scratch = BasisScratch::new(self.curve.order());
        let e = self.curve.rational_derivatives(*param, 2, &mut scratch);
        let d = &e[0] - &self.point.coords;
        let s0 = e[2].dot(&d);
        let s1 = e[1].dot(&e[1]);
        Ok(s0 + s1)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use argmin::core::{Gradient, Hessian};
    use nalgebra::Point2;

    use super::CurveClosestParameterProblem;
    use crate::curve::NurbsCurve2D;

    #[test]
    fn gradient_and_hessian_of_squared_distance() {
        // C(u) = (4u, 0), P = (1, 2): f(u) = 4 (4u - 1), f'(u) = 16
        let line = NurbsCurve2D::try_polynomial(
            2,
            vec![0., 0., 1., 1.],
            &[Point2::new(0., 0.), Point2::new(4., 0.)],
        )
        .unwrap();
        let point = Point2::new(1., 2.);
        let problem = CurveClosestParameterProblem::new(&point, &line);
        assert_relative_eq!(problem.gradient(&0.5).unwrap(), 4.);
        assert_relative_eq!(problem.gradient(&0.25).unwrap(), 0.);
        assert_relative_eq!(problem.hessian(&0.5).unwrap(), 16.);
    }
}
