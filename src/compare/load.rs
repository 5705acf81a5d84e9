use crate::Result;
use crate::compare::OutputSet;
use crate::diagnostics;

use anyhow::Context;
use std::path::Path;
use walkdir::WalkDir;

/// Directory under a label holding its output files.
pub const OUTPUTS_DIR: &str = "outputs";

/// Read every file under `<label_dir>/outputs`, sorted by path.
///
/// Unlike traces, output files that are not JSON are an error here: a
/// regression comparison has no per-run failure category to fall back on.
pub fn load_output_set(label_dir: &Path) -> Result<OutputSet> {
    let root = label_dir.join(OUTPUTS_DIR);
    log::debug!("walking {}", root.display());

    let mut files = Vec::new();
    for entry in WalkDir::new(&root).sort_by_file_name() {
        let entry = entry.with_context(|| diagnostics::error_message(format!("walk {}", root.display())))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let name = path
            .strip_prefix(&root)
            .with_context(|| format!("{} is outside {}", path.display(), root.display()))?
            .to_string_lossy()
            .replace('\\', "/");

        let text = std::fs::read_to_string(path)
            .with_context(|| diagnostics::error_message(format!("read {}", path.display())))?;
        let value: serde_json::Value = serde_json::from_str(&text)
            .with_context(|| diagnostics::error_message(format!("parse {}", path.display())))?;
        files.push((name, value));
    }
    Ok(OutputSet::new(files))
}
