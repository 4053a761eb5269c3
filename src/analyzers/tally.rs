//! Value counts and percentage shares for a single survey field.

use std::cmp::Reverse;
use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::analyzers::utility::pct;
use crate::error::{Result, SurveyError};
use crate::survey::SurveyTable;

/// One label and how many respondents gave it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryEntry {
    pub label: String,
    pub count: u64,
}

/// Label counts for one field, ordered by descending count.
///
/// Equal counts keep the order in which their labels were first seen.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCount {
    pub field: String,
    pub entries: Vec<CategoryEntry>,
}

/// One label and its share of the responses, in [0, 100].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryShare {
    pub label: String,
    pub percent: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PercentageTally {
    pub field: String,
    pub total: u64,
    pub entries: Vec<CategoryShare>,
}

impl PercentageTally {
    pub fn empty(field: &str) -> Self {
        Self {
            field: field.to_string(),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, label: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|e| e.label == label)
            .map(|e| e.percent)
    }
}

/// How raw cells turn into tally labels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TallyOptions {
    /// Count missing answers under `missing_label` instead of skipping them.
    pub include_missing: bool,
    pub missing_label: String,
    /// Suffix removed from labels before counting, e.g. `" County"`.
    pub strip_suffix: Option<String>,
    /// Exact-match relabelling applied before suffix stripping.
    pub replacements: BTreeMap<String, String>,
}

impl Default for TallyOptions {
    fn default() -> Self {
        Self {
            include_missing: false,
            missing_label: "Missing".to_string(),
            strip_suffix: None,
            replacements: BTreeMap::new(),
        }
    }
}

impl TallyOptions {
    pub fn label(&self, raw: &str) -> String {
        let replaced = self.replacements.get(raw).map(String::as_str).unwrap_or(raw);
        match &self.strip_suffix {
            Some(suffix) => replaced
                .strip_suffix(suffix.as_str())
                .unwrap_or(replaced)
                .trim_end()
                .to_string(),
            None => replaced.to_string(),
        }
    }
}

impl CategoryCount {
    /// Counts `labels`, ordering by descending count with first-seen tie-breaking.
    pub fn from_labels<I, S>(field: &str, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut entries: Vec<CategoryEntry> = Vec::new();
        let mut seen: HashMap<String, usize> = HashMap::new();

        for label in labels {
            let label = label.as_ref();
            match seen.get(label) {
                Some(&idx) => entries[idx].count += 1,
                None => {
                    seen.insert(label.to_string(), entries.len());
                    entries.push(CategoryEntry {
                        label: label.to_string(),
                        count: 1,
                    });
                }
            }
        }

        // stable: ties stay in first-seen order
        entries.sort_by_key(|e| Reverse(e.count));

        Self {
            field: field.to_string(),
            entries,
        }
    }

    pub fn total(&self) -> u64 {
        self.entries.iter().map(|e| e.count).sum()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, label: &str) -> Option<u64> {
        self.entries
            .iter()
            .find(|e| e.label == label)
            .map(|e| e.count)
    }

    /// Keeps the `n` largest labels and folds the rest into `other_label`.
    ///
    /// An existing `other_label` entry among the kept ones absorbs the remainder.
    pub fn top(mut self, n: usize, other_label: &str) -> Self {
        if self.entries.len() <= n {
            return self;
        }
        let rest: u64 = self.entries.split_off(n).iter().map(|e| e.count).sum();
        match self.entries.iter_mut().find(|e| e.label == other_label) {
            Some(existing) => existing.count += rest,
            None => self.entries.push(CategoryEntry {
                label: other_label.to_string(),
                count: rest,
            }),
        }
        self.entries.sort_by_key(|e| Reverse(e.count));
        self
    }

    /// Each count as a percentage of the total.
    ///
    /// # Errors
    ///
    /// [`SurveyError::EmptyInput`] when there is nothing to divide by.
    pub fn percentages(&self) -> Result<PercentageTally> {
        let total = self.total();
        if total == 0 {
            return Err(SurveyError::EmptyInput {
                field: self.field.clone(),
            });
        }
        Ok(PercentageTally {
            field: self.field.clone(),
            total,
            entries: self
                .entries
                .iter()
                .map(|e| CategoryShare {
                    label: e.label.clone(),
                    percent: pct(e.count, total),
                })
                .collect(),
        })
    }
}

/// Counts the answers given to `field`.
pub fn categorical_tally(
    table: &SurveyTable,
    field: &str,
    options: &TallyOptions,
) -> Result<CategoryCount> {
    let labels = table.values(field)?.filter_map(|value| match value {
        Some(raw) => Some(options.label(raw)),
        None if options.include_missing => Some(options.missing_label.clone()),
        None => None,
    });
    let counts = CategoryCount::from_labels(field, labels);
    debug!(
        field,
        categories = counts.len(),
        total = counts.total(),
        "Field tallied"
    );
    Ok(counts)
}

/// Like [`percentage_tally`] but surfaces [`SurveyError::EmptyInput`].
pub fn try_percentage_tally(
    table: &SurveyTable,
    field: &str,
    options: &TallyOptions,
) -> Result<PercentageTally> {
    categorical_tally(table, field, options)?.percentages()
}

/// Share of each answer to `field`; empty when the field has no answers.
///
/// The denominator is the total of the counted labels. With
/// [`TallyOptions::include_missing`] the missing bucket is one of them, so missing
/// answers take their own share and lower every other percentage.
pub fn percentage_tally(
    table: &SurveyTable,
    field: &str,
    options: &TallyOptions,
) -> Result<PercentageTally> {
    match try_percentage_tally(table, field, options) {
        Err(SurveyError::EmptyInput { field }) => {
            debug!(field = %field, "No answers, percentage table left empty");
            Ok(PercentageTally::empty(&field))
        }
        other => other,
    }
}
