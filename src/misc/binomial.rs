use nalgebra::convert;

use super::FloatingPoint;

/// Returns the binomial coefficient of `n` and `k`.
pub fn binomial(n: usize, k: usize) -> f64 {
    if k == 0 || k == n {
        return 1.;
    } else if n == 0 || k > n {
        return 0.;
    }

    let k = k.min(n - k);
    let mut r = 1.;
    for i in 0..k {
        r = r * (n - i) as f64 / (i + 1) as f64;
    }
    r
}

/// Pascal's triangle up to a fixed row.
/// Built per evaluation so no table is shared between threads.
#[derive(Clone, Debug)]
pub struct Binomial<T> {
    rows: Vec<Vec<T>>,
}

impl<T: FloatingPoint> Binomial<T> {
    /// Build rows `0..=n`.
    pub fn new(n: usize) -> Self {
        let mut rows: Vec<Vec<T>> = Vec::with_capacity(n + 1);
        for i in 0..=n {
            let mut row = vec![T::one(); i + 1];
            for k in 1..i {
                row[k] = rows[i - 1][k - 1] + rows[i - 1][k];
            }
            rows.push(row);
        }
        Self { rows }
    }

    /// Returns the binomial coefficient of `n` and `k`.
    /// Rows beyond the table fall back to the direct product formula.
    pub fn get(&self, n: usize, k: usize) -> T {
        if k > n {
            return T::zero();
        }
        match self.rows.get(n) {
            Some(row) => row[k],
            None => convert(binomial(n, k)),
        }
    }
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_binomial() {
        assert_eq!(super::binomial(5, 0), 1.);
        assert_eq!(super::binomial(5, 1), 5.);
        assert_eq!(super::binomial(5, 2), 10.);
        assert_eq!(super::binomial(5, 3), 10.);
        assert_eq!(super::binomial(5, 4), 5.);
        assert_eq!(super::binomial(5, 5), 1.);
        assert_eq!(super::binomial(5, 6), 0.);
    }

    #[test]
    fn test_table_binomial() {
        let binomial = super::Binomial::<f64>::new(9);
        for n in 0..12 {
            for k in 0..=n + 1 {
                assert_eq!(binomial.get(n, k), super::binomial(n, k));
            }
        }
    }
}
