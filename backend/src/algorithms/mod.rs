//! Bottleneck detection algorithms.
//!
//! - [`grouping`]: time groups, adjacent pairs and calendar weeks
//! - [`classifiers`]: distant-classroom and large-gap predicates
//! - [`analysis`]: the [`BottleneckAnalyzer`] combining them with the week balance

pub mod analysis;
pub mod classifiers;
pub mod grouping;

pub use analysis::{AnalysisError, AnalysisResult, BottleneckAnalyzer};
pub use grouping::{arrange_into_pairs, collapse_to_groups, week_start};
