//! Summary table: one row per instance, one trailing aggregate row.

use crate::model::evaluate::InstanceOutcome;
use crate::model::Mode;
use serde::Serialize;
use serde_json::{Map, Value};

pub const VALUE: &str = "Value";
pub const TIME: &str = "Time";
pub const GAP: &str = "Gap";
pub const AVERAGE_GAP: &str = "Average gap";

/// `<label> / <name>`
pub fn column(label: &str, name: &str) -> String {
    format!("{} / {}", label, name)
}

pub type Row = Map<String, Value>;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryTable {
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
    pub aggregate: Row,
}

impl SummaryTable {
    /// Per-instance rows followed by the aggregate row.
    pub fn all_rows(&self) -> impl Iterator<Item = &Row> {
        self.rows.iter().chain(std::iter::once(&self.aggregate))
    }

    pub fn cell(&self, row: usize, column: &str) -> Option<&Value> {
        self.rows.get(row).and_then(|r| r.get(column))
    }
}

/// Collects rows in fold order and discovers metadata columns as they appear.
#[derive(Debug, Clone)]
pub struct SummaryBuilder {
    mode: Mode,
    labels: Vec<String>,
    reference_columns: Vec<String>,
    /// Per label, `Algorithm` keys in first-seen order.
    metadata_keys: Vec<Vec<String>>,
    rows: Vec<Row>,
}

impl SummaryBuilder {
    pub fn new(mode: Mode, labels: &[String]) -> Self {
        Self {
            mode,
            labels: labels.to_vec(),
            reference_columns: Vec::new(),
            metadata_keys: vec![Vec::new(); labels.len()],
            rows: Vec::new(),
        }
    }

    pub fn push(&mut self, instance: &InstanceOutcome) {
        if self.reference_columns.is_empty() {
            self.reference_columns = instance.row.fields.iter().map(|(k, _)| k.clone()).collect();
        }

        let mut row = Row::new();
        for (k, v) in &instance.row.fields {
            row.insert(k.clone(), Value::String(v.clone()));
        }

        for (i, outcome) in instance.labels.iter().enumerate() {
            for (key, value) in &outcome.algorithm {
                if let Some(keys) = self.metadata_keys.get_mut(i) {
                    if !keys.contains(key) {
                        keys.push(key.clone());
                    }
                }
                row.insert(column(&outcome.label, key), value.clone());
            }

            let s = &outcome.scalars;
            let cells = [
                (VALUE, s.value),
                (GAP, s.gap),
                (TIME, s.time),
                (AVERAGE_GAP, s.average_gap),
            ];
            for (name, value) in cells {
                if let Some(v) = value {
                    if self.mode.value_columns().contains(&name) {
                        row.insert(column(&outcome.label, name), Value::from(v));
                    }
                }
            }
        }
        self.rows.push(row);
    }

    pub fn finish(self, aggregate: Row) -> SummaryTable {
        let mut columns = self.reference_columns;
        for (label, keys) in self.labels.iter().zip(&self.metadata_keys) {
            columns.extend(
                keys.iter()
                    .filter(|k| !self.mode.value_columns().contains(&k.as_str()))
                    .map(|k| column(label, k)),
            );
            columns.extend(self.mode.value_columns().iter().map(|c| column(label, c)));
        }
        SummaryTable {
            columns,
            rows: self.rows,
            aggregate,
        }
    }
}
