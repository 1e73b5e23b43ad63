pub mod circle;
pub mod closest_parameter;
pub mod control_points;
pub mod curve_evaluation;
pub mod curve_evaluator;
pub mod curve_kind;
pub mod curve_length;
pub mod curve_length_parameter;
pub mod dyn_nurbs_curve;
pub mod nurbs_curve;
pub use control_points::*;
pub use curve_evaluation::*;
pub use curve_evaluator::{CurveEvaluator, EvaluationOptions, DEFAULT_MAX_DERIVATIVE_ORDER};
pub use curve_kind::*;
pub use curve_length_parameter::*;
pub use dyn_nurbs_curve::*;
pub use nurbs_curve::*;

#[cfg(feature = "serde")]
mod serialize;
