//! Regression comparison of two output trees.
//!
//! Every file of the reference set is matched by relative path in the
//! candidate set and compared on its `Output` object. Exact fields must be
//! equal; near-equal fields must satisfy `|new - ref| / |ref| <= 0.05`.
//! Files absent from the candidate set and files only present there are
//! reported separately.

pub mod load;

pub use load::load_output_set;

use crate::diagnostics::{Diagnostic, DiagnosticKind};
use crate::error::BenchError;

use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeSet;

pub const NEAR_EQUAL_TOLERANCE: f64 = 0.05;

const OUTPUT: &str = "Output";

/// Parsed output files keyed by path relative to the set root, in walk order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OutputSet {
    pub files: Vec<(String, Value)>,
}

impl OutputSet {
    pub fn new(files: Vec<(String, Value)>) -> Self {
        Self { files }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.files.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    fn names(&self) -> BTreeSet<&str> {
        self.files.iter().map(|(n, _)| n.as_str()).collect()
    }
}

/// Fields to compare.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldSpec {
    pub equal: Vec<String>,
    pub near_equal: Vec<String>,
}

impl FieldSpec {
    fn all(&self) -> impl Iterator<Item = &String> {
        self.equal.iter().chain(&self.near_equal)
    }
}

/// `count/mean/std/min/max` over the numeric values of one column.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Describe {
    pub count: usize,
    pub mean: Option<f64>,
    /// Sample standard deviation; undefined below two values.
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl Describe {
    pub fn of(values: &[f64]) -> Self {
        let count = values.len();
        if count == 0 {
            return Self {
                count,
                mean: None,
                std: None,
                min: None,
                max: None,
            };
        }
        let n = count as f64;
        let mean = values.iter().sum::<f64>() / n;
        let std = (count > 1).then(|| {
            let ss: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
            (ss / (n - 1.0)).sqrt()
        });
        Self {
            count,
            mean: Some(mean),
            std,
            min: values.iter().copied().reduce(f64::min),
            max: values.iter().copied().reduce(f64::max),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldSummary {
    pub field: String,
    pub reference: Describe,
    pub candidate: Describe,
}

/// One compared file: `Name`, then `<field> / ref`, `<field> / new` and,
/// for near-equal fields, `<field> / gap`.
pub type Line = Map<String, Value>;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comparison {
    pub ok: bool,
    pub columns: Vec<String>,
    pub lines: Vec<Line>,
    pub missing: Vec<String>,
    pub extra: Vec<String>,
    /// Fields that failed on at least one file, in declaration order.
    pub failing_fields: Vec<String>,
    /// Statistics for every failing field.
    pub summaries: Vec<FieldSummary>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Relative difference of `new` against `reference`.
///
/// Two zeros agree; a zero reference against anything else is infinitely far.
pub fn relative_difference(reference: f64, new: f64) -> f64 {
    if reference == new {
        return 0.0;
    }
    (new - reference).abs() / reference.abs()
}

fn values_equal(a: &Value, b: &Value) -> bool {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x == y,
        _ => a == b,
    }
}

fn as_number(v: &Value, file: &str, field: &str) -> Result<f64, BenchError> {
    let parsed = match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| BenchError::MalformedOutput {
        file: file.to_string(),
        reason: format!("field '{}' is not numeric: {}", field, v),
    })
}

fn output_field<'a>(root: &'a Value, file: &str, field: &str) -> Result<&'a Value, BenchError> {
    let output = root
        .get(OUTPUT)
        .and_then(Value::as_object)
        .ok_or_else(|| BenchError::MalformedOutput {
            file: file.to_string(),
            reason: format!("no '{}' object", OUTPUT),
        })?;
    output.get(field).ok_or_else(|| BenchError::MalformedOutput {
        file: file.to_string(),
        reason: format!("'{}' has no field '{}'", OUTPUT, field),
    })
}

fn file_diagnostic(kind: DiagnosticKind, name: &str, message: impl Into<String>) -> Diagnostic {
    Diagnostic::new(kind, "", name, "", message)
}

/// Compare `candidate` against `reference`.
///
/// A file lacking the `Output` object or a requested field is fatal.
pub fn compare_outputs(
    reference: &OutputSet,
    candidate: &OutputSet,
    fields: &FieldSpec,
) -> Result<Comparison, BenchError> {
    let mut ok = true;
    let mut lines = Vec::new();
    let mut missing = Vec::new();
    let mut failing = BTreeSet::new();
    let mut diagnostics = Vec::new();

    for (name, ref_root) in &reference.files {
        let Some(new_root) = candidate.get(name) else {
            ok = false;
            diagnostics.push(file_diagnostic(DiagnosticKind::Missing, name, "absent from new outputs"));
            missing.push(name.clone());
            continue;
        };

        let mut line = Line::new();
        line.insert("Name".to_string(), Value::String(name.clone()));

        for field in &fields.equal {
            let v_ref = output_field(ref_root, name, field)?;
            let v_new = output_field(new_root, name, field)?;
            line.insert(format!("{} / ref", field), v_ref.clone());
            line.insert(format!("{} / new", field), v_new.clone());
            if !values_equal(v_ref, v_new) {
                ok = false;
                failing.insert(field.clone());
                diagnostics.push(file_diagnostic(
                    DiagnosticKind::FieldMismatch,
                    name,
                    format!("{}: ref {} new {}", field, v_ref, v_new),
                ));
            }
        }

        for field in &fields.near_equal {
            let v_ref = as_number(output_field(ref_root, name, field)?, name, field)?;
            let v_new = as_number(output_field(new_root, name, field)?, name, field)?;
            let diff = relative_difference(v_ref, v_new);
            line.insert(format!("{} / ref", field), Value::from(v_ref));
            line.insert(format!("{} / new", field), Value::from(v_new));
            line.insert(format!("{} / gap", field), Value::from(diff));
            if diff.is_nan() || diff > NEAR_EQUAL_TOLERANCE {
                ok = false;
                failing.insert(field.clone());
                diagnostics.push(file_diagnostic(
                    DiagnosticKind::FieldMismatch,
                    name,
                    format!("{}: ref {} new {} relative difference {}", field, v_ref, v_new, diff),
                ));
            }
        }
        lines.push(line);
    }

    let known = reference.names();
    let mut extra = Vec::new();
    for (name, _) in &candidate.files {
        if !known.contains(name.as_str()) {
            ok = false;
            diagnostics.push(file_diagnostic(DiagnosticKind::ExtraFile, name, "absent from reference outputs"));
            extra.push(name.clone());
        }
    }

    let failing_fields: Vec<String> = fields.all().filter(|f| failing.contains(*f)).cloned().collect();
    let summaries = failing_fields
        .iter()
        .map(|field| FieldSummary {
            field: field.clone(),
            reference: describe_column(&lines, &format!("{} / ref", field)),
            candidate: describe_column(&lines, &format!("{} / new", field)),
        })
        .collect();

    let mut columns = vec!["Name".to_string()];
    for field in &fields.equal {
        columns.push(format!("{} / ref", field));
        columns.push(format!("{} / new", field));
    }
    for field in &fields.near_equal {
        columns.push(format!("{} / ref", field));
        columns.push(format!("{} / new", field));
        columns.push(format!("{} / gap", field));
    }

    Ok(Comparison {
        ok,
        columns,
        lines,
        missing,
        extra,
        failing_fields,
        summaries,
        diagnostics,
    })
}

fn describe_column(lines: &[Line], column: &str) -> Describe {
    let values: Vec<f64> = lines
        .iter()
        .filter_map(|l| l.get(column))
        .filter_map(Value::as_f64)
        .collect();
    Describe::of(&values)
}
