//! Flatten per-event tables of many files into flat series.

use std::collections::BTreeMap;
use std::path::Path;

use nb_core::{Column, Error, Table, TableReader};
use tracing::{debug, warn};

use crate::config::FileLayout;

/// How a field's values are flattened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum FieldKind {
    /// One scalar per event.
    Event,
    /// A sequence per event; every element is appended.
    Object,
    /// A sequence per event indexed by detector module; element `m` goes to
    /// module series `m`.
    PerModule,
}

/// A field to read and how to flatten it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
}

impl FieldSpec {
    pub const fn event(name: &'static str) -> Self {
        Self { name, kind: FieldKind::Event }
    }

    pub const fn object(name: &'static str) -> Self {
        Self { name, kind: FieldKind::Object }
    }

    pub const fn per_module(name: &'static str) -> Self {
        Self { name, kind: FieldKind::PerModule }
    }
}

/// Growing series while files are read.
#[derive(Debug, Default)]
pub struct SeriesAccumulator {
    series: BTreeMap<&'static str, Vec<f64>>,
    modules: BTreeMap<&'static str, Vec<Vec<f64>>>,
    files_read: usize,
    files_skipped: usize,
    events: usize,
}

impl SeriesAccumulator {
    pub fn new(fields: &[FieldSpec]) -> Self {
        let mut acc = Self::default();
        for f in fields {
            match f.kind {
                FieldKind::PerModule => {
                    acc.modules.entry(f.name).or_default();
                }
                FieldKind::Event | FieldKind::Object => {
                    acc.series.entry(f.name).or_default();
                }
            }
        }
        acc
    }

    /// Append every requested field of one file's table.
    pub fn append(&mut self, path: &Path, table: &Table, fields: &[FieldSpec]) -> nb_core::Result<()> {
        // Check every column before touching the series so a bad file adds nothing.
        let mut columns = Vec::with_capacity(fields.len());
        for f in fields {
            let column = table.column(f.name).ok_or_else(|| shape_error(path, f.name, "missing from table"))?;
            check_shape(path, f, column, table.n_entries)?;
            columns.push((f, column));
        }

        for (f, column) in columns {
            match (f.kind, column) {
                (FieldKind::Event, Column::Scalar(values)) => {
                    self.series.entry(f.name).or_default().extend_from_slice(values);
                }
                (FieldKind::Object, Column::Jagged(j)) => {
                    self.series.entry(f.name).or_default().extend_from_slice(&j.flat);
                }
                (FieldKind::PerModule, Column::Jagged(j)) => {
                    let modules = self.modules.entry(f.name).or_default();
                    for row in j.rows() {
                        if modules.len() < row.len() {
                            modules.resize_with(row.len(), Vec::new);
                        }
                        for (m, &v) in row.iter().enumerate() {
                            modules[m].push(v);
                        }
                    }
                }
                // Ruled out by check_shape.
                _ => {}
            }
        }

        self.files_read += 1;
        self.events += table.n_entries;
        Ok(())
    }

    pub fn skip(&mut self) {
        self.files_skipped += 1;
    }

    pub fn finish(self, sample: impl Into<String>) -> AggregatedSample {
        AggregatedSample {
            sample: sample.into(),
            files_read: self.files_read,
            files_skipped: self.files_skipped,
            events: self.events,
            series: self.series,
            modules: self.modules,
        }
    }
}

fn check_shape(path: &Path, field: &FieldSpec, column: &Column, n_entries: usize) -> nb_core::Result<()> {
    let expected_nested = field.kind != FieldKind::Event;
    if matches!(column, Column::Jagged(_)) != expected_nested {
        let wanted = if expected_nested { "nested" } else { "scalar" };
        return Err(shape_error(
            path,
            field.name,
            &format!("requested as {:?}-level ({wanted}), found {} column", field.kind, column.shape_name()),
        ));
    }
    if column.n_entries() != n_entries {
        return Err(shape_error(
            path,
            field.name,
            &format!("{} entries, table has {n_entries}", column.n_entries()),
        ));
    }
    Ok(())
}

fn shape_error(path: &Path, column: &str, reason: &str) -> Error {
    Error::FieldShape { path: path.to_path_buf(), column: column.to_string(), reason: reason.to_string() }
}

/// Flat series of one sample. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedSample {
    pub sample: String,
    pub files_read: usize,
    pub files_skipped: usize,
    pub events: usize,
    series: BTreeMap<&'static str, Vec<f64>>,
    modules: BTreeMap<&'static str, Vec<Vec<f64>>>,
}

impl AggregatedSample {
    /// Flat series of an event- or object-level field; empty when not read.
    pub fn series(&self, name: &str) -> &[f64] {
        self.series.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Module series of a per-module field, indexed by module.
    pub fn module_series(&self, name: &str) -> &[Vec<f64>] {
        self.modules.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// `(field, length)` of every flat series.
    pub fn series_sizes(&self) -> impl Iterator<Item = (&str, usize)> + '_ {
        self.series.iter().map(|(name, values)| (*name, values.len()))
    }
}

/// Read `<base>/<sample>/anahist_<i>.root` for `i` in `0..max_files`, in order.
///
/// Missing files are skipped with a warning; any other failure aborts.
pub fn aggregate<R: TableReader>(
    reader: &R,
    layout: &FileLayout,
    sample: &str,
    fields: &[FieldSpec],
) -> nb_core::Result<AggregatedSample> {
    let columns: Vec<&str> = fields.iter().map(|f| f.name).collect();
    let mut acc = SeriesAccumulator::new(fields);

    for index in 0..layout.max_files {
        let path = layout.file_path(sample, index);
        if !path.is_file() {
            warn!("{} does not exist, skipping", path.display());
            acc.skip();
            continue;
        }
        let table = reader.open_table(&path, &layout.table, &columns)?;
        debug!(file = %path.display(), events = table.n_entries, "read table");
        acc.append(&path, &table, fields)?;
    }

    Ok(acc.finish(sample))
}
