//! Run traces: one algorithm's recorded history on one instance.

pub mod load;
pub mod parse;
pub mod row;

pub use load::{OutputDir, load_trace, trace_path};
pub use parse::{parse_numeric, parse_trace};
pub use row::{RunTrace, TraceStatus};
