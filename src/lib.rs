#![allow(clippy::needless_range_loop)]

mod basis;
mod closest_parameter;
mod curve;
pub mod error;
mod knot;
mod misc;

pub mod prelude {
    pub use crate::basis::*;
    pub use crate::curve::*;
    pub use crate::error::CurveError;
    pub use crate::knot::*;
    pub use crate::misc::*;
}
