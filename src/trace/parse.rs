use crate::metrics::Checkpoint;
use crate::reference::Sense;
use crate::trace::row::RunTrace;

use anyhow::{Context, anyhow, bail};
use serde_json::{Map, Value};

const ALGORITHM: &str = "Algorithm";
const SOLUTION: &str = "Solution";
const BOUND: &str = "Bound";
const VALUE: &str = "Value";
const TIME: &str = "Time";

/// Translate one trace record into a `RunTrace`.
///
/// Expected shape:
/// {
///   "Algorithm": { ... },                    // optional, opaque
///   "Solution":  { "Value": .., "Time": .. }, // final primal
///   "Solution1": { .. }, "Solution2": { .. }, // revisions, read until the first gap
///   "Bound":     { .. }, "Bound1": { .. }, ...
/// }
///
/// Absent keys leave the corresponding track empty; the mode decides whether
/// that is a missing run. Anything structurally wrong yields a `Malformed`
/// trace rather than an error, so the caller can attach instance context.
pub fn parse_trace(record: &Value, sense: Sense) -> RunTrace {
    match parse_record(record, sense) {
        Ok(trace) => trace,
        Err(e) => RunTrace::malformed(format!("{:#}", e)),
    }
}

fn parse_record(record: &Value, sense: Sense) -> anyhow::Result<RunTrace> {
    let obj = record
        .as_object()
        .ok_or_else(|| anyhow!("trace root must be a JSON object"))?;

    let algorithm = match obj.get(ALGORITHM) {
        None => Map::new(),
        Some(Value::Object(m)) => m.clone(),
        Some(other) => bail!("'{}' must be an object, got {}", ALGORITHM, other),
    };

    let primal = parse_track(obj, SOLUTION, sense)?;
    let dual = parse_track(obj, BOUND, sense)?;

    Ok(RunTrace::ok(primal, dual).with_algorithm(algorithm))
}

/// Numbered revisions `<base>1, <base>2, ...` followed by the unnumbered
/// `<base>` when it adds a later state.
fn parse_track(obj: &Map<String, Value>, base: &str, sense: Sense) -> anyhow::Result<Vec<Checkpoint>> {
    let mut track: Vec<Checkpoint> = Vec::new();
    let mut k = 1usize;
    loop {
        let key = format!("{}{}", base, k);
        let Some(entry) = obj.get(&key) else {
            break;
        };
        let checkpoint = parse_checkpoint(entry, sense).with_context(|| format!("key '{}'", key))?;
        if let Some(prev) = track.last() {
            if checkpoint.time < prev.time {
                bail!(
                    "key '{}' goes back in time ({} after {})",
                    key,
                    checkpoint.time,
                    prev.time
                );
            }
        }
        track.push(checkpoint);
        k += 1;
    }

    if let Some(entry) = obj.get(base) {
        let checkpoint = parse_checkpoint(entry, sense).with_context(|| format!("key '{}'", base))?;
        match track.last() {
            None => track.push(checkpoint),
            Some(last) if *last == checkpoint => {}
            Some(last) if checkpoint.time >= last.time => track.push(checkpoint),
            Some(last) => bail!(
                "key '{}' at time {} precedes its last revision at {}",
                base,
                checkpoint.time,
                last.time
            ),
        }
    }

    Ok(track)
}

fn parse_checkpoint(entry: &Value, sense: Sense) -> anyhow::Result<Checkpoint> {
    let obj = entry
        .as_object()
        .ok_or_else(|| anyhow!("checkpoint must be an object"))?;
    let value = obj
        .get(VALUE)
        .ok_or_else(|| anyhow!("missing '{}'", VALUE))
        .and_then(|v| parse_numeric(v).with_context(|| format!("bad '{}'", VALUE)))?;
    let time = obj
        .get(TIME)
        .ok_or_else(|| anyhow!("missing '{}'", TIME))
        .and_then(|v| parse_numeric(v).with_context(|| format!("bad '{}'", TIME)))?;
    if time.is_nan() || time < 0.0 {
        bail!("time must be non-negative, got {}", time);
    }
    Ok(Checkpoint::new(sense.normalize(value), time))
}

/// Number, or a string holding a number. A string may carry a pair
/// (`"v,aux"` or `"v aux"`); the first component is taken.
pub fn parse_numeric(v: &Value) -> anyhow::Result<f64> {
    match v {
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| anyhow!("number {} is not representable as f64", n)),
        Value::String(s) => {
            let s = s.trim();
            let first = match s.split_once(',') {
                Some((head, _)) => head,
                None => s.split_whitespace().next().unwrap_or(""),
            };
            first
                .trim()
                .parse::<f64>()
                .with_context(|| format!("cannot parse {:?} as a number", s))
        }
        other => bail!("expected a number or numeric string, got {}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::TraceStatus;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn numeric_strings_take_the_first_component() {
        assert_eq!(parse_numeric(&json!(3.5)).unwrap(), 3.5);
        assert_eq!(parse_numeric(&json!("42")).unwrap(), 42.0);
        assert_eq!(parse_numeric(&json!("17,3")).unwrap(), 17.0);
        assert_eq!(parse_numeric(&json!(" -8 2 ")).unwrap(), -8.0);
        assert_eq!(parse_numeric(&json!("inf")).unwrap(), f64::INFINITY);
        assert!(parse_numeric(&json!("abc")).is_err());
        assert!(parse_numeric(&json!(null)).is_err());
    }

    #[test]
    fn numbered_revisions_become_a_track() {
        let record = json!({
            "Algorithm": { "Name": "tabu", "Seed": 3 },
            "Solution1": { "Value": 30, "Time": 0.5 },
            "Solution2": { "Value": "25", "Time": 2.0 },
            "Solution3": { "Value": 22, "Time": 9.0 },
            "Solution": { "Value": 22, "Time": 9.0 },
        });
        let trace = parse_trace(&record, Sense::Min);
        assert_eq!(trace.status, TraceStatus::Ok);
        assert_eq!(
            trace.primal,
            vec![
                Checkpoint::new(30.0, 0.5),
                Checkpoint::new(25.0, 2.0),
                Checkpoint::new(22.0, 9.0),
            ]
        );
        assert!(trace.dual.is_empty());
        assert_eq!(trace.algorithm.get("Name"), Some(&json!("tabu")));
    }

    #[test]
    fn numbering_stops_at_first_gap() {
        let record = json!({
            "Bound1": { "Value": 1, "Time": 1 },
            "Bound3": { "Value": 3, "Time": 3 },
        });
        let trace = parse_trace(&record, Sense::Min);
        assert_eq!(trace.dual, vec![Checkpoint::new(1.0, 1.0)]);
    }

    #[test]
    fn maximization_flips_values() {
        let record = json!({ "Solution": { "Value": 12, "Time": 1 } });
        let trace = parse_trace(&record, Sense::Max);
        assert_eq!(trace.final_primal(), Some(Checkpoint::new(-12.0, 1.0)));
    }

    #[test]
    fn structural_errors_are_malformed() {
        let no_time = json!({ "Solution": { "Value": 1 } });
        assert_eq!(parse_trace(&no_time, Sense::Min).status, TraceStatus::Malformed);

        let backwards = json!({
            "Solution1": { "Value": 3, "Time": 5 },
            "Solution2": { "Value": 2, "Time": 4 },
        });
        let trace = parse_trace(&backwards, Sense::Min);
        assert_eq!(trace.status, TraceStatus::Malformed);
        assert!(trace.reason.unwrap().contains("Solution2"));

        assert_eq!(parse_trace(&json!([1, 2]), Sense::Min).status, TraceStatus::Malformed);
    }
}
