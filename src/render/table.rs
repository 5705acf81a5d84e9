use crate::Result;
use crate::compare::Comparison;
use crate::model::SummaryTable;

use serde_json::{Map, Value};
use std::io::Write;

fn cell(v: Option<&Value>) -> String {
    match v {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn write_rows<'a, W: Write>(
    writer: W,
    columns: &[String],
    rows: impl Iterator<Item = &'a Map<String, Value>>,
) -> Result<()> {
    let mut out = ::csv::Writer::from_writer(writer);
    out.write_record(columns)?;
    for row in rows {
        out.write_record(columns.iter().map(|c| cell(row.get(c))))?;
    }
    out.flush()?;
    Ok(())
}

/// Per-instance rows, then the aggregate row, under one header.
pub fn write_summary_csv<W: Write>(table: &SummaryTable, writer: W) -> Result<()> {
    write_rows(writer, &table.columns, table.all_rows())
}

/// One line per compared file.
pub fn write_comparison_csv<W: Write>(comparison: &Comparison, writer: W) -> Result<()> {
    write_rows(writer, &comparison.columns, comparison.lines.iter())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::summary::Row;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn aggregate_row_shares_the_header() {
        let mut row = Row::new();
        row.insert("Path".to_string(), json!("a, b.txt"));
        row.insert("x / Value".to_string(), json!(12.5));
        let mut aggregate = Row::new();
        aggregate.insert("x / Time".to_string(), json!(3.0));
        let table = SummaryTable {
            columns: vec!["Path".to_string(), "x / Value".to_string(), "x / Time".to_string()],
            rows: vec![row],
            aggregate,
        };

        let mut buf = Vec::new();
        write_summary_csv(&table, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text, "Path,x / Value,x / Time\n\"a, b.txt\",12.5,\n,,3.0\n");
    }
}
