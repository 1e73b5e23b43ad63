pub mod binomial;
pub mod end_points;
pub mod floating_point;
pub mod invertible;
pub mod transformable;
pub mod trigonometry;

pub use binomial::*;
pub use end_points::*;
pub use floating_point::*;
pub use invertible::*;
pub use transformable::*;
pub use trigonometry::*;
