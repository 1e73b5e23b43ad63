use nalgebra::RealField;
use num_traits::ToPrimitive;

/// Trait for floating point types (f32, f64)
/// Mainly used to identify the type of the field in nalgebra
pub trait FloatingPoint: RealField + ToPrimitive + Copy {
    /// Widen to `f64` for error payloads and quadrature.
    /// Values with no `f64` representation become NaN.
    fn to_f64_or_nan(self) -> f64 {
        self.to_f64().unwrap_or(f64::NAN)
    }
}

impl FloatingPoint for f32 {}
impl FloatingPoint for f64 {}
