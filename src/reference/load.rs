use crate::Result;
use crate::diagnostics;
use crate::reference::{ReferenceRow, ReferenceTable};

use anyhow::Context;
use std::io::Read;
use std::path::Path;

/// Read the instance table (`data/data.csv` by convention).
pub fn load_reference_csv(path: &Path) -> Result<ReferenceTable> {
    log::debug!("reading reference table {}", path.display());
    let file = std::fs::File::open(path).with_context(|| {
        diagnostics::error_message(format!("open reference table {}", path.display()))
    })?;
    parse_reference_csv(file)
        .with_context(|| diagnostics::error_message(format!("parse {}", path.display())))
}

pub fn parse_reference_csv<R: Read>(reader: R) -> Result<ReferenceTable> {
    let mut reader = csv::Reader::from_reader(reader);
    let columns: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();

    let mut rows = Vec::new();
    for (lineno, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("record {}", lineno + 1))?;
        let fields = columns
            .iter()
            .cloned()
            .zip(record.iter().map(str::to_string))
            .collect();
        rows.push(ReferenceRow::from_fields(fields)?);
    }

    Ok(ReferenceTable { columns, rows })
}
