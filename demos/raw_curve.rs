use spline_kernel::prelude::*;

/// Build curves from flat arrays with legacy kind codes and query them
fn main() -> anyhow::Result<()> {
    let knots = [0., 0., 0., 0., 0.5, 1., 1., 1., 1.];
    let coefficients = [
        0., 0., 0., //
        1., 2., 0., //
        2., 2., 1., //
        3., 0., 1., //
        4., 1., 0.,
    ];

    let kind = CurveKind::from_legacy_code(1, 3)?;
    let curve = DynNurbsCurve::try_from_raw(4, &knots, &coefficients, kind)?;
    println!(
        "{}: order {}, {} control points, {} knots, domain [{}, {}]",
        curve.kind(),
        curve.order(),
        curve.control_point_count(),
        curve.knot_count(),
        curve.domain_start(),
        curve.domain_end()
    );

    for t in [0., 0.25, 0.5, 0.75, 1.] {
        let e = curve.evaluate(t, 1)?;
        println!(
            "t = {:.2}  point = {:?}  tangent = {:?}",
            t,
            e.position().as_slice(),
            e.tangent().map(|d| d.as_slice().to_vec())
        );
    }

    match curve.evaluate(1.5, 0) {
        Ok(_) => println!("unexpected evaluation outside the domain"),
        Err(err) => println!("rejected: {}", err),
    }

    // too few knots for five control points of order 4
    let broken = DynNurbsCurve::try_from_raw(4, &knots[..8], &coefficients, kind);
    if let Err(err) = broken {
        println!("rejected: {}", err);
    }

    Ok(())
}
