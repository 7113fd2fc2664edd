//! Shared results pool with forward-only visibility.
//!
//! Three parallel, append-only lists (series, ensembles, tables), each
//! entry tagged with the index of the command that produced it. A command
//! at position `i` sees only entries produced at positions `< i`, and may
//! mutate a visible series in place only through its stable index.

use hs_core::{Ensemble, Table, TimeSeries};

#[derive(Clone, Debug)]
struct Produced<T> {
    producer: usize,
    value: T,
}

/// Shared mutable store of pipeline results.
#[derive(Clone, Debug, Default)]
pub struct ResultsPool {
    series: Vec<Produced<TimeSeries>>,
    ensembles: Vec<Produced<Ensemble>>,
    tables: Vec<Produced<Table>>,
}

impl ResultsPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a series, returning its stable position.
    pub fn append_series(&mut self, producer: usize, series: TimeSeries) -> usize {
        self.series.push(Produced {
            producer,
            value: series,
        });
        self.series.len() - 1
    }

    pub fn append_ensemble(&mut self, producer: usize, ensemble: Ensemble) -> usize {
        self.ensembles.push(Produced {
            producer,
            value: ensemble,
        });
        self.ensembles.len() - 1
    }

    /// Register a table, replacing any existing table with the same id.
    /// This is the one replace operation in the pool.
    pub fn register_or_replace_table(&mut self, producer: usize, table: Table) -> usize {
        if let Some(pos) = self.tables.iter().position(|t| t.value.id == table.id) {
            self.tables[pos] = Produced {
                producer,
                value: table,
            };
            pos
        } else {
            self.tables.push(Produced {
                producer,
                value: table,
            });
            self.tables.len() - 1
        }
    }

    pub fn series(&self, index: usize) -> Option<&TimeSeries> {
        self.series.get(index).map(|p| &p.value)
    }

    /// Mutable access to a series, restricted to entries visible before the
    /// given command position.
    pub fn series_mut_before(&mut self, index: usize, before: usize) -> Option<&mut TimeSeries> {
        self.series
            .get_mut(index)
            .filter(|p| p.producer < before)
            .map(|p| &mut p.value)
    }

    pub fn series_count(&self) -> usize {
        self.series.len()
    }

    pub fn table(&self, id: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.value.id == id).map(|t| &t.value)
    }

    pub fn ensemble(&self, id: &str) -> Option<&Ensemble> {
        self.ensembles
            .iter()
            .find(|e| e.value.id == id)
            .map(|e| &e.value)
    }

    /// Read-only view limited to entries produced by commands at
    /// positions `< before`.
    pub fn view(&self, before: usize) -> PoolView<'_> {
        PoolView { pool: self, before }
    }

    pub fn clear(&mut self) {
        self.series.clear();
        self.ensembles.clear();
        self.tables.clear();
    }
}

/// Forward-only snapshot of the pool as seen by one command.
#[derive(Clone, Copy, Debug)]
pub struct PoolView<'a> {
    pool: &'a ResultsPool,
    before: usize,
}

impl<'a> PoolView<'a> {
    pub fn series(&self, index: usize) -> Option<&'a TimeSeries> {
        self.pool
            .series
            .get(index)
            .filter(|p| p.producer < self.before)
            .map(|p| &p.value)
    }

    /// Visible series with their stable pool positions, in pool order.
    pub fn series_iter(&self) -> impl Iterator<Item = (usize, &'a TimeSeries)> + '_ {
        self.pool
            .series
            .iter()
            .enumerate()
            .filter(|(_, p)| p.producer < self.before)
            .map(|(i, p)| (i, &p.value))
    }

    pub fn ensemble(&self, id: &str) -> Option<&'a Ensemble> {
        self.pool
            .ensembles
            .iter()
            .find(|e| e.producer < self.before && e.value.id == id)
            .map(|e| &e.value)
    }

    pub fn table(&self, id: &str) -> Option<&'a Table> {
        self.pool
            .tables
            .iter()
            .find(|t| t.producer < self.before && t.value.id == id)
            .map(|t| &t.value)
    }

    /// Position of the first visible series whose alias or normalized
    /// identifier equals the key (case-insensitive).
    pub fn position_of(&self, key: &str) -> Option<usize> {
        let lower = key.to_ascii_lowercase();
        self.series_iter()
            .find(|(_, ts)| {
                ts.alias
                    .as_deref()
                    .is_some_and(|a| a.eq_ignore_ascii_case(&lower))
                    || ts.ident.normalized() == lower
            })
            .map(|(i, _)| i)
    }
}
