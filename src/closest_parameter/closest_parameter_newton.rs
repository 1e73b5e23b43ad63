use argmin::argmin_error_closure;
use argmin::core::{
    ArgminFloat, Error, Gradient, Hessian, IterState, Problem, Solver, State, TerminationReason,
    TerminationStatus, KV,
};

/// Newton's method on a bounded parameter domain
/// Steps leaving the domain are clamped to its ends, or wrapped around when the curve is closed.
#[derive(Clone, Copy)]
pub struct ClosestParameterNewton<F> {
    /// domain of the parameter
    knot_domain: (F, F),
    /// the target curve is closed or not
    closed: bool,
}

impl<F: ArgminFloat> ClosestParameterNewton<F> {
    pub fn new(domain: (F, F), closed: bool) -> Self {
        ClosestParameterNewton {
            knot_domain: domain,
            closed,
        }
    }

    /// Bring a parameter back into the domain
    fn constrain(&self, param: F) -> F {
        let (min, max) = self.knot_domain;
        let param = if param < min {
            if self.closed {
                max - (min - param)
            } else {
                min
            }
        } else if param > max {
            if self.closed {
                min + (param - max)
            } else {
                max
            }
        } else {
            param
        };
        // a step longer than the domain can wrap past the other end
        param.max(min).min(max)
    }
}

impl<O, F> Solver<O, IterState<F, F, (), F, (), F>> for ClosestParameterNewton<F>
where
    O: Gradient<Param = F, Gradient = F> + Hessian<Param = F, Hessian = F>,
    F: ArgminFloat,
{
    const NAME: &'static str = "Closest parameter newton method";

    fn next_iter(
        &mut self,
        problem: &mut Problem<O>,
        state: IterState<F, F, (), F, (), F>,
    ) -> Result<(IterState<F, F, (), F, (), F>, Option<KV>), Error> {
        let param = *state.get_param().ok_or_else(argmin_error_closure!(
            NotInitialized,
            "closest parameter search needs an initial parameter"
        ))?;

        let grad = problem.gradient(&param)?;
        let hessian = problem.hessian(&param)?;

        // flat or undefined curvature: stay put and let the solver converge
        let step = grad / hessian;
        if hessian.abs() < F::epsilon() || !step.is_finite() {
            return Ok((state.param(param), None));
        }

        let next = self.constrain(param - step);
        Ok((state.param(next), None))
    }

    fn terminate(&mut self, state: &IterState<F, F, (), F, (), F>) -> TerminationStatus {
        if state.iter > state.max_iters {
            return TerminationStatus::Terminated(TerminationReason::MaxItersReached);
        }

        match (state.get_param(), state.get_prev_param()) {
            (Some(current), Some(prev)) => {
                if (*current - *prev).abs() < F::epsilon() {
                    TerminationStatus::Terminated(TerminationReason::SolverConverged)
                } else {
                    TerminationStatus::NotTerminated
                }
            }
            _ => TerminationStatus::NotTerminated,
        }
    }
}

#[cfg(test)]
mod tests {
    use argmin::core::{Executor, Gradient, Hessian, State};

    use super::ClosestParameterNewton;

    /// f(x) = (x - target)^2 / 2
    struct Parabola {
        target: f64,
    }

    impl Gradient for Parabola {
        type Param = f64;
        type Gradient = f64;

        fn gradient(&self, x: &f64) -> Result<f64, argmin::core::Error> {
            Ok(x - self.target)
        }
    }

    impl Hessian for Parabola {
        type Param = f64;
        type Hessian = f64;

        fn hessian(&self, _: &f64) -> Result<f64, argmin::core::Error> {
            Ok(1.)
        }
    }

    fn solve(target: f64, closed: bool) -> f64 {
        let solver = ClosestParameterNewton::new((0., 1.), closed);
        let res = Executor::new(Parabola { target }, solver)
            .configure(|state| state.param(0.5).max_iters(8))
            .run()
            .unwrap();
        *res.state().get_best_param().unwrap()
    }

    #[test]
    fn converges_inside_the_domain() {
        assert_eq!(solve(0.25, false), 0.25);
    }

    #[test]
    fn clamps_open_domain() {
        assert_eq!(solve(1.5, false), 1.);
        assert_eq!(solve(-2., false), 0.);
    }

    #[test]
    fn wraps_closed_domain() {
        let solver = ClosestParameterNewton::<f64>::new((0., 1.), true);
        assert!((solver.constrain(1.25) - 0.25).abs() < 1e-12);
        assert!((solver.constrain(-0.25) - 0.75).abs() < 1e-12);
        assert_eq!(solver.constrain(3.), 1.);
    }
}
