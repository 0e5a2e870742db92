//! Column and table types produced by table readers.

use std::collections::BTreeMap;

/// A variable-length column: flat values plus per-entry offsets.
///
/// `offsets` has length `n_entries + 1`. Entry `i` holds
/// `flat[offsets[i]..offsets[i + 1]]`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JaggedColumn {
    /// All values of all entries, in entry order.
    pub flat: Vec<f64>,
    /// Entry boundaries into `flat`.
    pub offsets: Vec<usize>,
}

impl JaggedColumn {
    /// Build from one vector per entry.
    pub fn from_rows<I, R>(rows: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: AsRef<[f64]>,
    {
        let mut flat = Vec::new();
        let mut offsets = vec![0];
        for row in rows {
            flat.extend_from_slice(row.as_ref());
            offsets.push(flat.len());
        }
        Self { flat, offsets }
    }

    /// Number of entries.
    pub fn n_entries(&self) -> usize {
        self.offsets.len().saturating_sub(1)
    }

    /// Values of entry `row`, or `None` past the end.
    pub fn row(&self, row: usize) -> Option<&[f64]> {
        let start = *self.offsets.get(row)?;
        let end = *self.offsets.get(row + 1)?;
        self.flat.get(start..end)
    }

    /// Iterate entries in order.
    pub fn rows(&self) -> impl Iterator<Item = &[f64]> + '_ {
        self.offsets.windows(2).map(|w| &self.flat[w[0]..w[1]])
    }
}

/// One column of a per-event table.
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    /// One value per event.
    Scalar(Vec<f64>),
    /// A sequence of values per event.
    Jagged(JaggedColumn),
}

impl Column {
    /// Number of events (entries) the column covers.
    pub fn n_entries(&self) -> usize {
        match self {
            Column::Scalar(v) => v.len(),
            Column::Jagged(j) => j.n_entries(),
        }
    }

    /// Short shape name for diagnostics.
    pub fn shape_name(&self) -> &'static str {
        match self {
            Column::Scalar(_) => "scalar",
            Column::Jagged(_) => "nested",
        }
    }
}

/// A projected per-event table: only the requested columns are present.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    /// Number of events in the table.
    pub n_entries: usize,
    columns: BTreeMap<String, Column>,
}

impl Table {
    /// Create an empty table with the given event count.
    pub fn new(n_entries: usize) -> Self {
        Self { n_entries, columns: BTreeMap::new() }
    }

    /// Add (or replace) a column.
    pub fn insert(&mut self, name: impl Into<String>, column: Column) {
        self.columns.insert(name.into(), column);
    }

    /// Builder-style [`Table::insert`].
    pub fn with_column(mut self, name: impl Into<String>, column: Column) -> Self {
        self.insert(name, column);
        self
    }

    /// Look up a column by name.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.get(name)
    }

    /// Column names in sorted order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.columns.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jagged_rows_follow_offsets() {
        let j = JaggedColumn::from_rows([vec![1.0, 2.0], vec![], vec![3.0]]);
        assert_eq!(j.offsets, vec![0, 2, 2, 3]);
        assert_eq!(j.n_entries(), 3);
        assert_eq!(j.row(0), Some(&[1.0, 2.0][..]));
        assert_eq!(j.row(1), Some(&[][..]));
        assert_eq!(j.row(3), None);
        let collected: Vec<usize> = j.rows().map(<[f64]>::len).collect();
        assert_eq!(collected, vec![2, 0, 1]);
    }

    #[test]
    fn table_column_lookup() {
        let t = Table::new(2)
            .with_column("NumberTracks", Column::Scalar(vec![1.0, 4.0]))
            .with_column("TrackLength", Column::Jagged(JaggedColumn::from_rows([vec![3.0], vec![]])));
        assert_eq!(t.column("NumberTracks").map(Column::n_entries), Some(2));
        assert_eq!(t.column("TrackLength").map(Column::shape_name), Some("nested"));
        assert!(t.column("Missing").is_none());
        assert_eq!(t.column_names().collect::<Vec<_>>(), vec!["NumberTracks", "TrackLength"]);
    }
}
