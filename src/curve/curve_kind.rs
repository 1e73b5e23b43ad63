use std::fmt;

use crate::error::{CurveError, Result};

/// Closed set of curve kinds: polynomial or rational, in one to three dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CurveKind {
    Polynomial1D,
    Polynomial2D,
    Polynomial3D,
    Rational1D,
    Rational2D,
    Rational3D,
}

impl CurveKind {
    /// Kind from a rationality flag and a Cartesian dimension
    pub fn try_new(rational: bool, dimension: usize) -> Result<Self> {
        use CurveKind::*;
        match (rational, dimension) {
            (false, 1) => Ok(Polynomial1D),
            (false, 2) => Ok(Polynomial2D),
            (false, 3) => Ok(Polynomial3D),
            (true, 1) => Ok(Rational1D),
            (true, 2) => Ok(Rational2D),
            (true, 3) => Ok(Rational3D),
            _ => Err(CurveError::InvalidKind {
                reason: format!("unsupported dimension {}, expected 1, 2 or 3", dimension),
            }),
        }
    }

    pub fn polynomial(dimension: usize) -> Result<Self> {
        Self::try_new(false, dimension)
    }

    pub fn rational(dimension: usize) -> Result<Self> {
        Self::try_new(true, dimension)
    }

    /// Kind from a legacy integer tag
    /// `1`/`3` are polynomial (B-spline/Bezier), `2`/`4` are rational.
    ///
    /// # Example
    /// ```
    /// use spline_kernel::prelude::CurveKind;
    /// assert_eq!(CurveKind::from_legacy_code(2, 3).unwrap(), CurveKind::Rational3D);
    /// assert!(CurveKind::from_legacy_code(5, 3).is_err());
    /// ```
    pub fn from_legacy_code(code: i32, dimension: usize) -> Result<Self> {
        match code {
            1 | 3 => Self::polynomial(dimension),
            2 | 4 => Self::rational(dimension),
            _ => Err(CurveError::InvalidKind {
                reason: format!("unknown kind code {}", code),
            }),
        }
    }

    /// Legacy integer tag, B-spline flavour
    pub fn legacy_code(&self) -> i32 {
        if self.is_rational() {
            2
        } else {
            1
        }
    }

    pub fn is_rational(&self) -> bool {
        matches!(
            self,
            CurveKind::Rational1D | CurveKind::Rational2D | CurveKind::Rational3D
        )
    }

    /// Cartesian dimension
    pub fn dimension(&self) -> usize {
        match self {
            CurveKind::Polynomial1D | CurveKind::Rational1D => 1,
            CurveKind::Polynomial2D | CurveKind::Rational2D => 2,
            CurveKind::Polynomial3D | CurveKind::Rational3D => 3,
        }
    }

    /// Values per control point in a flat coefficient array
    pub fn coefficient_stride(&self) -> usize {
        if self.is_rational() {
            self.dimension() + 1
        } else {
            self.dimension()
        }
    }
}

impl fmt::Display for CurveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rationality = if self.is_rational() {
            "rational"
        } else {
            "polynomial"
        };
        write!(f, "{} {}D curve", rationality, self.dimension())
    }
}
