/// A run of equal knots: its value, where it starts and how often it repeats.
#[derive(Clone, Debug, PartialEq)]
pub struct KnotMultiplicity<T> {
    knot: T,
    start_index: usize,
    multiplicity: usize,
}

impl<T> KnotMultiplicity<T> {
    pub fn new(knot: T, start_index: usize, multiplicity: usize) -> Self {
        Self {
            knot,
            start_index,
            multiplicity,
        }
    }

    pub fn knot(&self) -> &T {
        &self.knot
    }

    /// Index of the first knot of the run
    pub fn start_index(&self) -> usize {
        self.start_index
    }

    pub fn multiplicity(&self) -> usize {
        self.multiplicity
    }

    pub fn increment_multiplicity(&mut self) {
        self.multiplicity += 1;
    }
}
