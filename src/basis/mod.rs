pub mod basis_evaluator;
pub mod basis_functions;
pub use basis_evaluator::*;
pub use basis_functions::*;
