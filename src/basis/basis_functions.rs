/// Nonzero basis functions at one parameter
///
/// Row `k` of the table holds the `k`-th derivatives of the `order` basis
/// functions `N_{first_index()}` .. `N_{span()}`; row 0 holds their values.
#[derive(Clone, Debug, PartialEq)]
pub struct BasisFunctions<T> {
    span: usize,
    order: usize,
    parameter: T,
    table: Vec<Vec<T>>,
}

impl<T: Copy> BasisFunctions<T> {
    pub(crate) fn new(span: usize, order: usize, parameter: T, table: Vec<Vec<T>>) -> Self {
        Self {
            span,
            order,
            parameter,
            table,
        }
    }

    /// Knot span index the parameter falls into
    pub fn span(&self) -> usize {
        self.span
    }

    /// Index of the first control point the nonzero functions belong to
    pub fn first_index(&self) -> usize {
        self.span + 1 - self.order
    }

    pub fn order(&self) -> usize {
        self.order
    }

    /// Parameter the functions were evaluated at, after domain clamping
    pub fn parameter(&self) -> T {
        self.parameter
    }

    /// Highest derivative order in the table
    pub fn derivative_order(&self) -> usize {
        self.table.len() - 1
    }

    /// Basis function values
    pub fn values(&self) -> &[T] {
        &self.table[0]
    }

    /// `k`-th derivatives, `None` if `k` was not requested
    pub fn derivative(&self, k: usize) -> Option<&[T]> {
        self.table.get(k).map(|row| row.as_slice())
    }

    pub fn rows(&self) -> &[Vec<T>] {
        &self.table
    }

    /// `(control point index, value)` pairs for row `k`
    pub fn indexed(&self, k: usize) -> impl Iterator<Item = (usize, T)> + '_ {
        let first = self.first_index();
        self.derivative(k)
            .unwrap_or_default()
            .iter()
            .enumerate()
            .map(move |(j, v)| (first + j, *v))
    }
}
