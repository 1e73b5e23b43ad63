use nalgebra::{allocator::Allocator, DefaultAllocator, DimName, OPoint, RealField};

/// Find the closest point on a segment
/// * `pt` - point to project
/// * `start` - start point of segment
/// * `end` - end point of segment
/// * `u0` - first param of segment
/// * `u1` - second param of segment
pub fn segment_closest_point<T: RealField + Copy, D: DimName>(
    pt: &OPoint<T, D>,
    start: &OPoint<T, D>,
    end: &OPoint<T, D>,
    u0: T,
    u1: T,
) -> (T, OPoint<T, D>)
where
    DefaultAllocator: Allocator<D>,
{
    let dif = end - start;
    let l = dif.norm();

    if l < T::default_epsilon() {
        return (u0, start.clone());
    }

    let r = dif / l;
    let o2pt = pt - start;
    let do2ptr = o2pt.dot(&r);

    if do2ptr < T::zero() {
        (u0, start.clone())
    } else if do2ptr > l {
        (u1, end.clone())
    } else {
        (u0 + (u1 - u0) * do2ptr / l, (r * do2ptr + &start.coords).into())
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use nalgebra::Point2;

    use super::segment_closest_point;

    #[test]
    fn projects_inside_and_clamps_outside() {
        let a = Point2::new(0., 0.);
        let b = Point2::new(2., 0.);

        let (u, p) = segment_closest_point(&Point2::new(0.5, 1.), &a, &b, 0., 1.);
        assert_relative_eq!(u, 0.25);
        assert_relative_eq!(p, Point2::new(0.5, 0.));

        let (u, p) = segment_closest_point(&Point2::new(-1., 1.), &a, &b, 0., 1.);
        assert_relative_eq!(u, 0.);
        assert_relative_eq!(p, a);

        let (u, _) = segment_closest_point(&Point2::new(3., -1.), &a, &b, 0., 1.);
        assert_relative_eq!(u, 1.);
    }
}
