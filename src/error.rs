use thiserror::Error;

use crate::curve::CurveKind;

/// Errors raised while building or evaluating a curve.
///
/// Construction errors (`InvalidOrder`, `InvalidKind`, `InvalidKnotVector`,
/// `InvalidControlPointCount`, `InvalidControlPoint`, `InvalidWeight`,
/// `DegenerateCurve`) mean no curve was created.
/// Evaluation errors (`ParameterOutOfDomain`, `UnsupportedDerivativeOrder`,
/// `InvalidArgument`, `SolverFailure`) leave the curve untouched and can be
/// retried with adjusted input.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CurveError {
    /// Order must be at least 1.
    #[error("invalid order {order}: must be at least 1")]
    InvalidOrder {
        /// The rejected order.
        order: usize,
    },

    /// The requested kind does not fit the supplied control points.
    #[error("invalid curve kind: {reason}")]
    InvalidKind {
        /// Description of the mismatch.
        reason: String,
    },

    /// Knot vector is invalid for the given order and control point count.
    #[error("invalid knot vector: {reason}")]
    InvalidKnotVector {
        /// Description of what's wrong with the knot vector.
        reason: String,
    },

    /// Control point data does not match the order/knot-derived requirement.
    #[error("invalid control point count: required {required}, got {actual}")]
    InvalidControlPointCount {
        /// Number the curve needs.
        required: usize,
        /// Number supplied.
        actual: usize,
    },

    /// A control point has a non-finite coordinate.
    #[error("invalid control point at index {index}: coordinates must be finite")]
    InvalidControlPoint {
        /// Index of the offending control point.
        index: usize,
    },

    /// Weight values must be positive and finite.
    #[error("invalid weight at index {index}: {value} (must be positive)")]
    InvalidWeight {
        /// Index of the invalid weight.
        index: usize,
        /// The invalid weight value.
        value: f64,
    },

    /// The parametric domain has zero or negative length.
    #[error("degenerate curve: domain [{start}, {end}] is empty")]
    DegenerateCurve {
        /// First interior knot.
        start: f64,
        /// Last interior knot.
        end: f64,
    },

    /// Parameter lies outside the curve's domain.
    #[error("parameter {parameter} is outside the domain [{start}, {end}]")]
    ParameterOutOfDomain {
        /// The rejected parameter.
        parameter: f64,
        /// Domain start.
        start: f64,
        /// Domain end.
        end: f64,
    },

    /// Derivative order above the evaluator's configured limit.
    #[error("derivative order {order} exceeds the supported maximum {max}")]
    UnsupportedDerivativeOrder {
        /// Requested derivative order.
        order: usize,
        /// Configured maximum.
        max: usize,
    },

    /// The iterative closest-parameter search failed.
    #[error("solver failure: {reason}")]
    SolverFailure {
        /// Description reported by the solver.
        reason: String,
    },

    /// Argument to a derived operation (length division, quadrature) is unusable.
    #[error("invalid argument: {reason}")]
    InvalidArgument {
        /// Description of the problem.
        reason: String,
    },
}

impl CurveError {
    pub(crate) fn invalid_knot_vector(reason: impl Into<String>) -> Self {
        Self::InvalidKnotVector {
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_argument(reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            reason: reason.into(),
        }
    }

    pub(crate) fn solver_failure(reason: impl Into<String>) -> Self {
        Self::SolverFailure {
            reason: reason.into(),
        }
    }

    pub(crate) fn kind_mismatch(kind: CurveKind, dimension: usize) -> Self {
        Self::InvalidKind {
            reason: format!(
                "{} expects {}D control points, got {}D",
                kind,
                kind.dimension(),
                dimension
            ),
        }
    }

    /// Returns true for errors that can only happen while building a curve.
    pub fn is_construction_error(&self) -> bool {
        !matches!(
            self,
            Self::ParameterOutOfDomain { .. }
                | Self::UnsupportedDerivativeOrder { .. }
                | Self::InvalidArgument { .. }
                | Self::SolverFailure { .. }
        )
    }
}

/// Result alias for curve operations.
pub type Result<T> = std::result::Result<T, CurveError>;
