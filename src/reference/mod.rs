//! Reference rows: per-instance static facts from the instance table.

pub mod load;

pub use load::{load_reference_csv, parse_reference_csv};

use crate::error::BenchError;
use serde::Serialize;

pub const DATASET: &str = "Dataset";
pub const PATH: &str = "Path";
pub const BEST_KNOWN_SOLUTION: &str = "Best known solution value";
pub const BEST_KNOWN_BOUND: &str = "Best known bound";
pub const OBJECTIVE_SENSE: &str = "Objective sense";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Sense {
    #[default]
    Min,
    Max,
}

impl Sense {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "min" | "minimize" => Some(Sense::Min),
            "max" | "maximize" => Some(Sense::Max),
            _ => None,
        }
    }

    /// Map a raw value into minimization orientation.
    pub fn normalize(self, value: f64) -> f64 {
        match self {
            Sense::Min => value,
            // `0.0 - x` keeps zero positive.
            Sense::Max => 0.0 - value,
        }
    }

    /// Inverse of `normalize` (the map is an involution).
    pub fn restore(self, value: f64) -> f64 {
        self.normalize(value)
    }
}

/// One row of the instance table.
///
/// Reference values are stored already normalized to minimization.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceRow {
    pub dataset: String,
    pub path: String,
    pub best_known_solution: Option<f64>,
    pub best_known_bound: Option<f64>,
    pub sense: Sense,
    /// All columns in header order, used by filters and summary rows.
    pub fields: Vec<(String, String)>,
}

impl ReferenceRow {
    /// Build from raw `(column, value)` pairs.
    pub fn from_fields(fields: Vec<(String, String)>) -> Result<Self, BenchError> {
        let lookup = |name: &str| {
            fields
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.trim().to_string())
        };

        let dataset = lookup(DATASET).unwrap_or_default();
        let path = lookup(PATH).unwrap_or_default();
        let invalid = |reason: String| BenchError::InvalidReference {
            dataset: dataset.clone(),
            path: path.clone(),
            reason,
        };

        if path.is_empty() {
            return Err(invalid(format!("column '{}' is empty", PATH)));
        }

        let sense_raw = lookup(OBJECTIVE_SENSE).unwrap_or_default();
        let sense = Sense::parse(&sense_raw)
            .ok_or_else(|| invalid(format!("unknown objective sense '{}'", sense_raw)))?;

        let parse_value = |column: &str| -> Result<Option<f64>, BenchError> {
            match lookup(column) {
                None => Ok(None),
                Some(s) if s.is_empty() => Ok(None),
                Some(s) => s
                    .parse::<f64>()
                    .map(|v| Some(sense.normalize(v)))
                    .map_err(|_| invalid(format!("column '{}' is not a number: '{}'", column, s))),
            }
        };

        let best_known_solution = parse_value(BEST_KNOWN_SOLUTION)?;
        let best_known_bound = parse_value(BEST_KNOWN_BOUND)?;

        Ok(Self {
            dataset,
            path,
            best_known_solution,
            best_known_bound,
            sense,
            fields,
        })
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn id(&self) -> String {
        format!("{}/{}", self.dataset, self.path)
    }
}

/// Header plus rows, in file order.
#[derive(Debug, Clone, Default)]
pub struct ReferenceTable {
    pub columns: Vec<String>,
    pub rows: Vec<ReferenceRow>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn maximization_values_are_normalized() {
        let row = ReferenceRow::from_fields(fields(&[
            (DATASET, "knapsack"),
            (PATH, "a.txt"),
            (BEST_KNOWN_SOLUTION, "120"),
            (BEST_KNOWN_BOUND, "125"),
            (OBJECTIVE_SENSE, "max"),
        ]))
        .unwrap();
        assert_eq!(row.sense, Sense::Max);
        assert_eq!(row.best_known_solution, Some(-120.0));
        assert_eq!(row.best_known_bound, Some(-125.0));
        assert_eq!(row.sense.restore(-120.0), 120.0);
    }

    #[test]
    fn sense_defaults_to_min_and_blank_values_are_absent() {
        let row = ReferenceRow::from_fields(fields(&[
            (DATASET, "d"),
            (PATH, "p"),
            (BEST_KNOWN_SOLUTION, ""),
        ]))
        .unwrap();
        assert_eq!(row.sense, Sense::Min);
        assert_eq!(row.best_known_solution, None);
        assert_eq!(row.best_known_bound, None);
    }

    #[test]
    fn rejects_unknown_sense_and_bad_numbers() {
        let bad_sense = ReferenceRow::from_fields(fields(&[(PATH, "p"), (OBJECTIVE_SENSE, "up")]));
        assert!(bad_sense.is_err());
        let bad_value =
            ReferenceRow::from_fields(fields(&[(PATH, "p"), (BEST_KNOWN_BOUND, "twelve")]));
        assert!(bad_value.is_err());
    }
}
