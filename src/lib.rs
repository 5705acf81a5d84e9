//! Benchmark profiler for optimization algorithms.
//!
//! Turns per-(instance, label) run traces into normalized curves and summary
//! tables. The metric core (`metrics`, `model`) is pure; loaders and the
//! report emitter live in `trace::load`, `reference::load`, `compare::load`
//! and `render`.

pub mod compare;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod filter;
pub mod metrics;
pub mod model;
pub mod reference;
pub mod render;
pub mod trace;

pub use error::BenchError;

pub type Result<T> = anyhow::Result<T>;
