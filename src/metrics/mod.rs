//! metrics
//!
//! The report pipeline, free of I/O.
//!
//! # Modules
//!
//! - [`problem_tags`] - Flag issues with malformed `From_`/`Type_` tags
//! - [`aggregate`] - Count issues per category/label pair and per label
//! - [`payload`] - Render counters and reports as monitoring items
//!
//! # Flow
//!
//! ```text
//! issues ──> problem_tags::detect ──> excluded keys
//!    └────────────────> aggregate(.., excluded) ──> payload::render
//! ```

pub mod aggregate;
pub mod payload;
pub mod problem_tags;

pub use aggregate::{aggregate, MetricTable};
pub use payload::{BacklogReport, Items};
pub use problem_tags::{ProblemList, ProblemTag, ProblemTagDetector};
