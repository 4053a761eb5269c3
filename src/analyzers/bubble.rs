//! Nested-bubble series for five-point scale questions (energy, time).
//!
//! Bubbles are concentric and bottom-aligned: each one sits on the bottom edge of
//! the largest, so its centre is `-max_radius / 2 + radius / 2`.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::analyzers::tally::CategoryCount;

pub const DEFAULT_RADII: [f64; 5] = [150.0, 110.0, 90.0, 70.0, 55.0];
pub const DEFAULT_HOVER: &str = "{count} people answered {label}";

fn default_radii() -> Vec<f64> {
    DEFAULT_RADII.to_vec()
}

fn default_hover() -> String {
    DEFAULT_HOVER.to_string()
}

/// Which field to draw and how.
///
/// With an empty `buckets` list the answers are drawn in tally order, most
/// frequent first. Otherwise bubble `i` is bucket `i`, and answers outside the
/// list are reported as unexpected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BubbleChartConfig {
    pub field: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub buckets: Vec<String>,
    #[serde(default)]
    pub colors: Vec<String>,
    #[serde(default = "default_radii")]
    pub radii: Vec<f64>,
    /// `{count}` and `{label}` are substituted.
    #[serde(default = "default_hover")]
    pub hover_template: String,
}

impl BubbleChartConfig {
    pub fn new(field: &str, colors: &[&str]) -> Self {
        Self {
            field: field.to_string(),
            title: None,
            buckets: Vec::new(),
            colors: colors.iter().map(|c| c.to_string()).collect(),
            radii: default_radii(),
            hover_template: default_hover(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bubble {
    pub label: String,
    pub count: u64,
    pub radius: f64,
    pub y: f64,
    pub color: Option<String>,
    pub hover: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BubbleChart {
    pub field: String,
    pub title: Option<String>,
    pub bubbles: Vec<Bubble>,
    pub unexpected: Vec<String>,
}

/// Lays out one bubble per bucket from the tally of the configured field.
///
/// Buckets beyond the number of radii reuse the smallest radius.
pub fn bubble_chart(counts: &CategoryCount, config: &BubbleChartConfig) -> BubbleChart {
    let (ordered, unexpected): (Vec<(String, u64)>, Vec<String>) = if config.buckets.is_empty() {
        (
            counts
                .entries
                .iter()
                .map(|e| (e.label.clone(), e.count))
                .collect(),
            Vec::new(),
        )
    } else {
        let ordered = config
            .buckets
            .iter()
            .map(|b| (b.clone(), counts.get(b).unwrap_or(0)))
            .collect();
        let unexpected = counts
            .entries
            .iter()
            .filter(|e| !config.buckets.contains(&e.label))
            .map(|e| e.label.clone())
            .collect();
        (ordered, unexpected)
    };

    for label in &unexpected {
        warn!(field = %config.field, label = %label, "Answer outside the configured buckets");
    }

    let max_radius = config.radii.iter().copied().fold(0.0_f64, f64::max);
    let reference_bottom = -max_radius / 2.0;
    let smallest = config.radii.last().copied().unwrap_or(0.0);

    let bubbles = ordered
        .into_iter()
        .enumerate()
        .map(|(i, (label, count))| {
            let radius = config.radii.get(i).copied().unwrap_or(smallest);
            Bubble {
                hover: config
                    .hover_template
                    .replace("{count}", &count.to_string())
                    .replace("{label}", &label),
                y: reference_bottom + radius / 2.0,
                color: config.colors.get(i).cloned(),
                radius,
                label,
                count,
            }
        })
        .collect();

    BubbleChart {
        field: config.field.clone(),
        title: config.title.clone(),
        bubbles,
        unexpected,
    }
}
