use crate::Result;
use crate::model::accumulate::{Accumulator, BenchmarkReport};
use crate::model::evaluate::{InstanceOutcome, evaluate_instance};
use crate::model::EvalContext;
use crate::reference::ReferenceRow;
use crate::trace::RunTrace;

use anyhow::Context;
use rayon::prelude::*;

/// Where traces come from. The directory layout lives in `trace::load`;
/// tests use in-memory sources.
pub trait TraceSource: Sync {
    fn trace(&self, label: &str, row: &ReferenceRow) -> Result<RunTrace>;
}

fn evaluate_row(
    ctx: &EvalContext,
    labels: &[String],
    index: usize,
    row: &ReferenceRow,
    source: &dyn TraceSource,
) -> Result<InstanceOutcome> {
    let traces = labels
        .iter()
        .map(|label| source.trace(label, row).map(|t| (label.clone(), t)))
        .collect::<Result<Vec<_>>>()?;
    Ok(evaluate_instance(ctx, index, row, &traces)?)
}

/// Run one aggregation pass over the filtered `rows`.
///
/// With `jobs > 1` evaluation fans out over a rayon pool; outcomes are
/// collected in instance order and folded sequentially either way.
pub fn run_batch(
    ctx: &EvalContext,
    labels: &[String],
    rows: &[ReferenceRow],
    source: &dyn TraceSource,
    jobs: usize,
) -> Result<BenchmarkReport> {
    let acc = Accumulator::new(ctx, labels, rows.len())?;

    let acc = if jobs <= 1 {
        rows.iter()
            .enumerate()
            .try_fold(acc, |acc, (i, row)| -> Result<Accumulator> {
                Ok(acc.fold(evaluate_row(ctx, labels, i, row, source)?)?)
            })?
    } else {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(jobs)
            .build()
            .context("build evaluation thread pool")?;
        let outcomes: Vec<InstanceOutcome> = pool.install(|| {
            rows.par_iter()
                .enumerate()
                .map(|(i, row)| evaluate_row(ctx, labels, i, row, source))
                .collect::<Result<Vec<_>>>()
        })?;
        outcomes.into_iter().try_fold(acc, Accumulator::fold)?
    };

    Ok(acc.finish()?)
}
