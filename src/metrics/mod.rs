//! Metric primitives: gap arithmetic, the time grid, step curves and the
//! consistency audit.

pub mod check;
pub mod curve;
pub mod gap;
pub mod grid;

pub use check::{CONSISTENCY_TOLERANCE, Inconsistency, check_consistency};
pub use curve::{Checkpoint, Curve, GapClosure};
pub use gap::gap;
pub use grid::{DEFAULT_RESOLUTION, TimeGrid};
