use nalgebra::Point2;

use spline_kernel::prelude::*;

fn main() -> anyhow::Result<()> {
    let w = std::f64::consts::FRAC_1_SQRT_2;
    let arc = NurbsCurve2D::try_rational(
        3,
        vec![0., 0., 0., 1., 1., 1.],
        &[Point2::new(1., 0.), Point2::new(1., 1.), Point2::new(0., 1.)],
        &[1., w, 1.],
    )?;

    let evaluator = CurveEvaluator::default();
    for i in 0..=8 {
        let t = i as f64 / 8.;
        let e = evaluator.evaluate(&arc, t, 2)?;
        let p = e.position();
        println!(
            "t = {:.3}  point = ({:+.6}, {:+.6})  radius = {:.12}  tangent = {:?}",
            t,
            p[0],
            p[1],
            p.norm(),
            e.tangent().map(|d| d.as_slice().to_vec()),
        );
    }

    println!("length = {:.12}", arc.try_length()?);
    for division in arc.try_divide_by_count(3)? {
        println!(
            "arc length {:.6} at parameter {:.6}",
            division.length(),
            division.parameter()
        );
    }

    Ok(())
}
