pub mod closest_parameter_newton;
pub mod curve_closest_parameter_problem;
pub use closest_parameter_newton::*;
pub use curve_closest_parameter_problem::*;
