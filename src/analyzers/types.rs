//! Data types produced by the aggregation pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::analyzers::bubble::BubbleChart;
use crate::analyzers::geo::GeoJoin;
use crate::analyzers::overlap::OverlapCounts;
use crate::analyzers::tally::{CategoryCount, PercentageTally};

/// Counts and shares for one tallied field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSummary {
    pub field: String,
    pub title: Option<String>,
    pub counts: CategoryCount,
    pub percentages: PercentageTally,
}

/// County counts after suffix stripping, and the ones that could be placed on the map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountySection {
    pub counts: CategoryCount,
    pub map: GeoJoin,
}

/// A titled three-way overlap with the exclusive regions a Venn renderer draws.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlapSection {
    pub title: Option<String>,
    pub counts: OverlapCounts,
    pub exclusive: [u64; 7],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionSection {
    /// Respondents reporting each condition.
    pub impacts: CategoryCount,
    pub overlaps: Vec<OverlapSection>,
}

/// Complete report for one survey export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurveyReport {
    pub generated_at: DateTime<Utc>,
    pub title: String,
    pub respondents: usize,
    pub tallies: Vec<FieldSummary>,
    pub county: Option<CountySection>,
    pub conditions: Option<ConditionSection>,
    pub bubbles: Vec<BubbleChart>,
    pub warnings: Vec<String>,
}
