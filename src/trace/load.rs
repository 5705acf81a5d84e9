use crate::Result;
use crate::diagnostics;
use crate::model::TraceSource;
use crate::reference::ReferenceRow;
use crate::trace::parse::parse_trace;
use crate::trace::row::RunTrace;

use anyhow::Context;
use std::path::{Path, PathBuf};

/// `<output>/<label>/<Dataset>/<Path>.json`
pub fn trace_path(output_root: &Path, label: &str, row: &ReferenceRow) -> PathBuf {
    output_root
        .join(label)
        .join(&row.dataset)
        .join(format!("{}.json", row.path))
}

/// Read and parse the trace of `label` on `row`.
///
/// An absent file is a `Missing` trace. Unreadable files are errors; content
/// that is not JSON becomes a `Malformed` trace so the batch can report it
/// with instance context.
pub fn load_trace(output_root: &Path, label: &str, row: &ReferenceRow) -> Result<RunTrace> {
    let path = trace_path(output_root, label, row);
    if !path.exists() {
        return Ok(RunTrace::missing(format!("no output file {}", path.display())));
    }
    log::debug!("reading trace {}", path.display());

    let text = std::fs::read_to_string(&path)
        .with_context(|| diagnostics::error_message(format!("read trace {}", path.display())))?;
    let record: serde_json::Value = match serde_json::from_str(&text) {
        Ok(v) => v,
        Err(e) => {
            return Ok(RunTrace::malformed(format!(
                "{}: invalid JSON: {}",
                path.display(),
                e
            )));
        }
    };
    Ok(parse_trace(&record, row.sense))
}

/// Traces laid out under one output root.
#[derive(Debug, Clone)]
pub struct OutputDir {
    pub root: PathBuf,
}

impl OutputDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl TraceSource for OutputDir {
    fn trace(&self, label: &str, row: &ReferenceRow) -> Result<RunTrace> {
        load_trace(&self.root, label, row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::{DATASET, PATH};
    use crate::trace::TraceStatus;

    fn row() -> ReferenceRow {
        ReferenceRow::from_fields(vec![
            (DATASET.to_string(), "set".to_string()),
            (PATH.to_string(), "inst_1".to_string()),
        ])
        .unwrap()
    }

    #[test]
    fn absent_file_is_missing() {
        let dir = tempfile::tempdir().unwrap();
        let trace = load_trace(dir.path(), "greedy", &row()).unwrap();
        assert_eq!(trace.status, TraceStatus::Missing);
    }

    #[test]
    fn reads_from_label_dataset_path_layout() {
        let dir = tempfile::tempdir().unwrap();
        let target = trace_path(dir.path(), "greedy", &row());
        std::fs::create_dir_all(target.parent().unwrap()).unwrap();
        std::fs::write(&target, r#"{"Solution": {"Value": 4, "Time": 1.5}}"#).unwrap();

        let trace = load_trace(dir.path(), "greedy", &row()).unwrap();
        assert_eq!(trace.status, TraceStatus::Ok);
        assert_eq!(trace.primal.len(), 1);
        assert!(target.ends_with("greedy/set/inst_1.json"));
    }

    #[test]
    fn invalid_json_is_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let target = trace_path(dir.path(), "greedy", &row());
        std::fs::create_dir_all(target.parent().unwrap()).unwrap();
        std::fs::write(&target, "{ not json").unwrap();

        let trace = load_trace(dir.path(), "greedy", &row()).unwrap();
        assert_eq!(trace.status, TraceStatus::Malformed);
    }
}
