//! Report layout: which fields are tallied and how each section is built.
//!
//! Stored as JSON on disk. Every key is optional; anything left out falls back to
//! the arts-survey defaults in [`ReportConfig::default`]:
//! ```json
//! {
//!   "title": "Artist survey",
//!   "tallies": [{ "field": "p41_gender1", "title": "Gender" }],
//!   "county": { "field": "p34_county", "strip_suffix": " County" },
//!   "conditions": {
//!     "columns": ["p30_employimpact1", "p30_employimpact2"],
//!     "groupings": [{ "sets": ["furloughed", "freelanceworkcanceled", "industryshutdown"] }]
//!   },
//!   "bubbles": [{ "field": "p5_amountofenergy", "colors": ["#fd8d3c"] }]
//! }
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::analyzers::bubble::BubbleChartConfig;
use crate::analyzers::tally::TallyOptions;
use crate::error::{Result, SurveyError};
use crate::survey::fields;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub title: String,
    pub tallies: Vec<TallyConfig>,
    pub county: Option<CountyConfig>,
    pub conditions: Option<ConditionConfig>,
    pub bubbles: Vec<BubbleChartConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TallyConfig {
    pub field: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub include_missing: bool,
    #[serde(default)]
    pub replacements: BTreeMap<String, String>,
    /// Keep the largest `top_n` answers and fold the rest into "Other".
    #[serde(default)]
    pub top_n: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountyConfig {
    pub field: String,
    #[serde(default)]
    pub strip_suffix: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionConfig {
    pub columns: Vec<String>,
    #[serde(default)]
    pub groupings: Vec<OverlapGrouping>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlapGrouping {
    #[serde(default)]
    pub title: Option<String>,
    pub sets: [String; 3],
}

impl TallyConfig {
    pub fn new(field: &str, title: &str) -> Self {
        Self {
            field: field.to_string(),
            title: Some(title.to_string()),
            include_missing: false,
            replacements: BTreeMap::new(),
            top_n: None,
        }
    }

    pub fn options(&self) -> TallyOptions {
        TallyOptions {
            include_missing: self.include_missing,
            replacements: self.replacements.clone(),
            ..Default::default()
        }
    }
}

impl CountyConfig {
    pub fn options(&self) -> TallyOptions {
        TallyOptions {
            strip_suffix: self.strip_suffix.clone(),
            ..Default::default()
        }
    }
}

impl ConditionConfig {
    /// Every condition some grouping names, without repeats.
    pub fn tracked_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for name in self.groupings.iter().flat_map(|g| g.sets()) {
            if !names.contains(&name) {
                names.push(name);
            }
        }
        names
    }
}

impl OverlapGrouping {
    pub fn sets(&self) -> [&str; 3] {
        [
            self.sets[0].as_str(),
            self.sets[1].as_str(),
            self.sets[2].as_str(),
        ]
    }
}

impl ReportConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| SurveyError::io(path, e))?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Every column some section reads, in section order, without repeats.
    pub fn required_fields(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        let tallies = self.tallies.iter().map(|t| t.field.as_str());
        let county = self.county.iter().map(|c| c.field.as_str());
        let conditions = self
            .conditions
            .iter()
            .flat_map(|c| c.columns.iter().map(String::as_str));
        let bubbles = self.bubbles.iter().map(|b| b.field.as_str());

        for field in tallies.chain(county).chain(conditions).chain(bubbles) {
            if !out.contains(&field) {
                out.push(field);
            }
        }
        out
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        let mut carrying_debt = TallyConfig::new(fields::CARRYING_DEBT, "Participants Carrying Debt");
        carrying_debt.replacements.insert(
            "Prefer not to answer ".to_string(),
            "Prefer not to answer".to_string(),
        );

        let mut energy = BubbleChartConfig::new(
            fields::ENERGY,
            &["#fd8d3c", "#fdae6b", "#fdd0a2", "#fee6ce", "#fff5eb"],
        );
        energy.title = Some("Energy Pulse of Artists".to_string());
        energy.hover_template = "{count} people expended {label}".to_string();

        let mut time = BubbleChartConfig::new(
            fields::TIME,
            &["#00bcd4", "#26c6da", "#4dd0e1", "#80deea", "#b2ebf2"],
        );
        time.title = Some("Time Devoted to Artistic Practice".to_string());
        time.hover_template = "{count} people spent {label}".to_string();

        let grouping = |title: &str, first: &str| OverlapGrouping {
            title: Some(title.to_string()),
            sets: [
                first.to_string(),
                "freelanceworkcanceled".to_string(),
                "industryshutdown".to_string(),
            ],
        };

        Self {
            title: "Bridging Gaps and Building Futures".to_string(),
            tallies: vec![
                TallyConfig::new(fields::ETHNICITY, "Ethnicity"),
                TallyConfig::new(fields::GENDER, "Gender"),
                TallyConfig::new(fields::COMMUNITY, "Community"),
                TallyConfig::new(fields::AGE_RANGE, "Age Range"),
                TallyConfig::new(fields::LGBTQIAP, "LGBTQIAP+"),
                TallyConfig::new(fields::LANGUAGE, "Language"),
                TallyConfig::new(fields::AWARE_OF_GI, "Artists' Knowledge of Financial Aid Programs"),
                TallyConfig::new(fields::POLICY_GROUP, "Artists' Engagement in Shaping Policy"),
                TallyConfig::new(
                    fields::HEALTH_INSURANCE,
                    "Participants with Health Insurance Coverage",
                ),
                TallyConfig::new(fields::STABLE_HOUSING, "Stability of Housing"),
                TallyConfig::new(fields::PHYSICAL_HEALTH, "Physical Health Status"),
                TallyConfig::new(fields::MENTAL_HEALTH, "Mental Health Status"),
                carrying_debt,
                TallyConfig::new(fields::DEBT_MANAGEABLE, "Debt Management"),
            ],
            county: Some(CountyConfig {
                field: fields::COUNTY.to_string(),
                strip_suffix: Some(" County".to_string()),
            }),
            conditions: Some(ConditionConfig {
                columns: fields::EMPLOYMENT_IMPACT.iter().map(|c| c.to_string()).collect(),
                groupings: vec![
                    grouping("Furloughed", "furloughed"),
                    grouping("Laid off or Fired", "laidofforfired"),
                ],
            }),
            bubbles: vec![energy, time],
        }
    }
}
