//! Report emitter: turns finished reports into files. Computes nothing.

pub mod html;
pub mod table;

pub use html::render_html_report;
pub use table::{write_comparison_csv, write_summary_csv};

use crate::Result;
use crate::compare::Comparison;
use crate::diagnostics;
use crate::model::BenchmarkReport;

use anyhow::Context;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

pub const RESULTS_CSV: &str = "results.csv";
pub const REPORT_JSON: &str = "report.json";
pub const REPORT_HTML: &str = "report.html";

fn create(path: &Path) -> Result<BufWriter<File>> {
    let file = File::create(path)
        .with_context(|| diagnostics::error_message(format!("create {}", path.display())))?;
    Ok(BufWriter::new(file))
}

/// Write `results.csv`, `report.json` and `report.html` into `out_dir`.
pub fn write_report(report: &BenchmarkReport, out_dir: &Path) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(out_dir)
        .with_context(|| diagnostics::error_message(format!("create {}", out_dir.display())))?;

    let csv_path = out_dir.join(RESULTS_CSV);
    write_summary_csv(&report.summary, create(&csv_path)?)
        .with_context(|| diagnostics::error_message(format!("write {}", csv_path.display())))?;

    let json_path = out_dir.join(REPORT_JSON);
    let mut json = create(&json_path)?;
    serde_json::to_writer(&mut json, report)
        .map_err(anyhow::Error::from)
        .and_then(|_| Ok(json.flush()?))
        .with_context(|| diagnostics::error_message(format!("write {}", json_path.display())))?;

    let html_path = out_dir.join(REPORT_HTML);
    std::fs::write(&html_path, render_html_report(report)?)
        .with_context(|| diagnostics::error_message(format!("write {}", html_path.display())))?;

    Ok(vec![csv_path, json_path, html_path])
}

/// Write the per-file comparison lines to `path`.
pub fn write_comparison(comparison: &Comparison, path: &Path) -> Result<()> {
    write_comparison_csv(comparison, create(path)?)
        .with_context(|| diagnostics::error_message(format!("write {}", path.display())))
}

/// Human-readable comparison digest, in the order missing, extra, fields.
pub fn comparison_text(comparison: &Comparison) -> String {
    let mut out = String::new();
    out.push_str(&format!("Ok: {}\n", comparison.ok));
    if comparison.ok {
        return out;
    }

    out.push_str("\nMissing files\n-------------\n");
    out.push_str(&format!("Number of missing output files: {}\n", comparison.missing.len()));
    for f in &comparison.missing {
        out.push_str(&format!("* {}\n", f));
    }

    out.push_str("\nExtra files\n-----------\n");
    out.push_str(&format!("Number of extra output files: {}\n", comparison.extra.len()));
    for f in &comparison.extra {
        out.push_str(&format!("* {}\n", f));
    }

    out.push_str("\nSummary\n-------\n");
    let opt = |v: Option<f64>| v.map(|x| x.to_string()).unwrap_or_else(|| "NaN".to_string());
    for s in &comparison.summaries {
        out.push_str(&format!("\n* Field: {}\n", s.field));
        out.push_str(&format!("{:>6} {:>14} {:>14}\n", "", "ref", "new"));
        out.push_str(&format!(
            "{:>6} {:>14} {:>14}\n",
            "count", s.reference.count, s.candidate.count
        ));
        for (name, r, n) in [
            ("mean", s.reference.mean, s.candidate.mean),
            ("std", s.reference.std, s.candidate.std),
            ("min", s.reference.min, s.candidate.min),
            ("max", s.reference.max, s.candidate.max),
        ] {
            out.push_str(&format!("{:>6} {:>14} {:>14}\n", name, opt(r), opt(n)));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compare::{FieldSpec, OutputSet, compare_outputs};
    use serde_json::json;

    #[test]
    fn digest_lists_missing_and_extra() {
        let reference = OutputSet::new(vec![("a.json".to_string(), json!({ "Output": {} }))]);
        let candidate = OutputSet::new(vec![("b.json".to_string(), json!({ "Output": {} }))]);
        let cmp = compare_outputs(&reference, &candidate, &FieldSpec::default()).unwrap();
        let text = comparison_text(&cmp);
        assert!(text.starts_with("Ok: false"));
        assert!(text.contains("Number of missing output files: 1\n* a.json"));
        assert!(text.contains("Number of extra output files: 1\n* b.json"));
    }

    #[test]
    fn ok_digest_is_one_line() {
        let set = OutputSet::default();
        let cmp = compare_outputs(&set, &set, &FieldSpec::default()).unwrap();
        assert_eq!(comparison_text(&cmp), "Ok: true\n");
    }
}
