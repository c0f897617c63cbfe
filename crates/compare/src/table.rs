use optima_solvers::{Error, Method, Solution};

/// Outcome of one `(initial point, method)` cell.
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonRecord<const N: usize> {
    /// Index of the initial point in the slice passed to the harness.
    pub point_index: usize,

    /// Method that produced `result`.
    pub method: Method,

    /// The solve outcome, or the error that prevented it from starting.
    pub result: Result<Solution<N>, Error>,
}

impl<const N: usize> ComparisonRecord<N> {
    /// Returns `true` if the solve ran and converged.
    #[must_use]
    pub fn success(&self) -> bool {
        self.result.as_ref().is_ok_and(Solution::success)
    }
}

/// Records of a comparison run in point-major, then method, order.
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonTable<const N: usize> {
    records: Vec<ComparisonRecord<N>>,
}

impl<const N: usize> ComparisonTable<N> {
    pub(crate) fn new(records: Vec<ComparisonRecord<N>>) -> Self {
        Self { records }
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if the table has no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterator over the records in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, ComparisonRecord<N>> {
        self.records.iter()
    }

    /// Looks up the record for one cell.
    #[must_use]
    pub fn get(&self, point_index: usize, method: Method) -> Option<&ComparisonRecord<N>> {
        self.records
            .iter()
            .find(|r| r.point_index == point_index && r.method == method)
    }

    /// Number of cells that converged.
    #[must_use]
    pub fn successes(&self) -> usize {
        self.records.iter().filter(|r| r.success()).count()
    }

    /// Number of converged cells for `method`.
    #[must_use]
    pub fn successes_for(&self, method: Method) -> usize {
        self.records
            .iter()
            .filter(|r| r.method == method && r.success())
            .count()
    }
}

impl<'a, const N: usize> IntoIterator for &'a ComparisonTable<N> {
    type Item = &'a ComparisonRecord<N>;
    type IntoIter = std::slice::Iter<'a, ComparisonRecord<N>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<const N: usize> IntoIterator for ComparisonTable<N> {
    type Item = ComparisonRecord<N>;
    type IntoIter = std::vec::IntoIter<ComparisonRecord<N>>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}
