//! Survey aggregation.
//!
//! Turns a loaded survey table into the count tables behind each chart: per-field
//! tallies and percentages, the county map join, condition overlaps, and the nested
//! bubble series. [`aggregate::aggregate_survey`] assembles them into one report.

pub mod aggregate;
pub mod analyzer;
pub mod bubble;
pub mod geo;
pub mod overlap;
pub mod tally;
pub mod types;
pub mod utility;
