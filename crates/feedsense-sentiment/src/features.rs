/// Sparse feature representation of one feedback text.
///
/// Entries are sorted by column index and hold only non-zero values; reading a
/// missing column yields `0.0`.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    dim: usize,
    entries: Vec<(usize, f64)>,
}

impl FeatureVector {
    /// Build a vector from `(column, value)` pairs.
    ///
    /// Pairs are sorted, duplicate columns are summed, and zeros are dropped.
    /// Columns at or beyond `dim` are discarded.
    #[must_use]
    pub fn from_entries(dim: usize, mut entries: Vec<(usize, f64)>) -> Self {
        entries.retain(|&(col, value)| col < dim && value != 0.0);
        entries.sort_by_key(|&(col, _)| col);
        entries.dedup_by(|next, kept| {
            if next.0 == kept.0 {
                kept.1 += next.1;
                true
            } else {
                false
            }
        });
        Self { dim, entries }
    }

    #[must_use]
    pub fn zeros(dim: usize) -> Self {
        Self {
            dim,
            entries: Vec::new(),
        }
    }

    #[must_use]
    pub fn dim(&self) -> usize {
        self.dim
    }

    #[must_use]
    pub fn get(&self, col: usize) -> f64 {
        self.entries
            .binary_search_by_key(&col, |&(c, _)| c)
            .map_or(0.0, |pos| self.entries[pos].1)
    }

    /// Non-zero `(column, value)` pairs in column order.
    #[must_use]
    pub fn entries(&self) -> &[(usize, f64)] {
        &self.entries
    }

    #[must_use]
    pub fn nnz(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn scale(&mut self, factor: f64) {
        for (_, value) in &mut self.entries {
            *value *= factor;
        }
    }

    pub(crate) fn map_values(&mut self, f: impl Fn(usize, f64) -> f64) {
        for (col, value) in &mut self.entries {
            *value = f(*col, *value);
        }
        self.entries.retain(|&(_, value)| value != 0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_column_reads_zero() {
        let v = FeatureVector::from_entries(5, vec![(3, 0.5)]);
        assert_eq!(v.get(0), 0.0);
        assert_eq!(v.get(3), 0.5);
        assert_eq!(v.get(42), 0.0);
    }

    #[test]
    fn duplicate_columns_are_summed() {
        let v = FeatureVector::from_entries(4, vec![(2, 1.0), (0, 1.0), (2, 2.0)]);
        assert_eq!(v.entries(), &[(0, 1.0), (2, 3.0)]);
    }

    #[test]
    fn out_of_range_and_zero_entries_are_dropped() {
        let v = FeatureVector::from_entries(2, vec![(0, 0.0), (1, 1.0), (9, 1.0)]);
        assert_eq!(v.nnz(), 1);
        assert_eq!(v.dim(), 2);
    }
}
