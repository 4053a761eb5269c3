//! Multi-select condition lists and their three-way overlaps.
//!
//! Respondents pick any number of options spread over several columns. Those are
//! merged into one list per respondent. The conditions the groupings name are then
//! indexed as a bit mask, so that single and pairwise counts are computed once and
//! shared by every grouping asked for. Other answers, free text included, take no bit.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::analyzers::tally::CategoryCount;
use crate::error::{Result, SurveyError};
use crate::survey::SurveyTable;

/// Collects the non-missing values of `columns` for every respondent.
pub fn merge_conditions<S: AsRef<str>>(
    table: &SurveyTable,
    columns: &[S],
) -> Result<Vec<Vec<String>>> {
    let positions = columns
        .iter()
        .map(|c| table.position(c.as_ref()))
        .collect::<Result<Vec<_>>>()?;

    Ok(table
        .records()
        .iter()
        .map(|record| {
            positions
                .iter()
                .filter_map(|&idx| record.get(idx).map(str::to_string))
                .collect()
        })
        .collect())
}

/// Number of respondents reporting each condition. Repeats within one respondent count once.
pub fn condition_tally(field: &str, conditions: &[Vec<String>]) -> CategoryCount {
    CategoryCount::from_labels(
        field,
        conditions.iter().flat_map(|list| {
            let mut unique: Vec<&str> = Vec::with_capacity(list.len());
            for c in list {
                if !unique.contains(&c.as_str()) {
                    unique.push(c.as_str());
                }
            }
            unique
        }),
    )
}

/// Inclusive respondent counts for the seven regions of a three-set Venn diagram.
///
/// Fields are declared, and serialized, in the canonical subset order
/// `A, B, AB, C, AC, BC, ABC` under their `100`..`111` identifiers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverlapCounts {
    pub sets: [String; 3],
    #[serde(rename = "100")]
    pub a: u64,
    #[serde(rename = "010")]
    pub b: u64,
    #[serde(rename = "110")]
    pub ab: u64,
    #[serde(rename = "001")]
    pub c: u64,
    #[serde(rename = "101")]
    pub ac: u64,
    #[serde(rename = "011")]
    pub bc: u64,
    #[serde(rename = "111")]
    pub abc: u64,
}

impl OverlapCounts {
    /// The seven counts in canonical order.
    pub fn subsets(&self) -> [u64; 7] {
        [self.a, self.b, self.ab, self.c, self.ac, self.bc, self.abc]
    }

    /// Respondents in exactly each region, i.e. what a three-circle diagram draws.
    pub fn exclusive_regions(&self) -> [u64; 7] {
        let only_ab = self.ab.saturating_sub(self.abc);
        let only_ac = self.ac.saturating_sub(self.abc);
        let only_bc = self.bc.saturating_sub(self.abc);
        let only = |total: u64, x: u64, y: u64| {
            total
                .saturating_sub(x)
                .saturating_sub(y)
                .saturating_sub(self.abc)
        };
        [
            only(self.a, only_ab, only_ac),
            only(self.b, only_ab, only_bc),
            only_ab,
            only(self.c, only_ac, only_bc),
            only_ac,
            only_bc,
            self.abc,
        ]
    }
}

/// Per-respondent condition masks plus cached single and pair counts.
#[derive(Debug, Clone, Default)]
pub struct ConditionIndex {
    lookup: HashMap<String, usize>,
    masks: Vec<u64>,
    singles: Vec<u64>,
    pairs: HashMap<(usize, usize), u64>,
}

impl ConditionIndex {
    pub const MAX_CONDITIONS: usize = 64;

    /// Indexes the conditions named in `tracked`. Any other answer is ignored.
    ///
    /// # Errors
    ///
    /// [`SurveyError::TooManyConditions`] when `tracked` holds more than 64 distinct names.
    pub fn build(conditions: &[Vec<String>], tracked: &[&str]) -> Result<Self> {
        let mut lookup: HashMap<String, usize> = HashMap::new();
        for name in tracked {
            let next = lookup.len();
            lookup.entry(name.to_string()).or_insert(next);
        }
        if lookup.len() > Self::MAX_CONDITIONS {
            return Err(SurveyError::TooManyConditions {
                count: lookup.len(),
            });
        }

        let masks: Vec<u64> = conditions
            .iter()
            .map(|list| {
                list.iter()
                    .filter_map(|name| lookup.get(name))
                    .fold(0u64, |mask, &bit| mask | (1 << bit))
            })
            .collect();

        let n = lookup.len();
        let mut singles = vec![0u64; n];
        let mut pairs = HashMap::new();
        for &mask in &masks {
            for i in (0..n).filter(|&i| mask & (1 << i) != 0) {
                singles[i] += 1;
                for j in (i + 1..n).filter(|&j| mask & (1 << j) != 0) {
                    *pairs.entry((i, j)).or_insert(0u64) += 1;
                }
            }
        }

        debug!(
            respondents = masks.len(),
            conditions = n,
            "Condition index built"
        );
        Ok(Self {
            lookup,
            masks,
            singles,
            pairs,
        })
    }

    pub fn respondents(&self) -> usize {
        self.masks.len()
    }

    /// Respondents reporting every condition in `names`. Unknown names match nobody.
    pub fn count_all(&self, names: &[&str]) -> u64 {
        let mut bits = Vec::with_capacity(names.len());
        for name in names {
            match self.lookup.get(*name) {
                Some(&bit) => bits.push(bit),
                None => return 0,
            }
        }
        bits.sort_unstable();
        bits.dedup();

        match bits.as_slice() {
            [] => self.masks.len() as u64,
            [i] => self.singles[*i],
            [i, j] => self.pairs.get(&(*i, *j)).copied().unwrap_or(0),
            _ => {
                let wanted = bits.iter().fold(0u64, |m, b| m | (1 << b));
                self.masks.iter().filter(|&&m| m & wanted == wanted).count() as u64
            }
        }
    }

    /// The seven inclusive counts for the ordered triple `sets`.
    pub fn overlap(&self, sets: [&str; 3]) -> OverlapCounts {
        let [a, b, c] = sets;
        OverlapCounts {
            sets: sets.map(str::to_string),
            a: self.count_all(&[a]),
            b: self.count_all(&[b]),
            ab: self.count_all(&[a, b]),
            c: self.count_all(&[c]),
            ac: self.count_all(&[a, c]),
            bc: self.count_all(&[b, c]),
            abc: self.count_all(&[a, b, c]),
        }
    }
}

/// One-shot overlap count for a single grouping.
pub fn multi_condition_overlap(
    conditions: &[Vec<String>],
    sets: [&str; 3],
) -> Result<OverlapCounts> {
    Ok(ConditionIndex::build(conditions, &sets)?.overlap(sets))
}

#[cfg(test)]
mod tests {
    use super::*;

    const FURLOUGHED: &str = "furloughed";
    const LAID_OFF: &str = "laidofforfired";
    const FREELANCE: &str = "freelanceworkcanceled";
    const SHUTDOWN: &str = "industryshutdown";
    const TRACKED: &[&str] = &[FURLOUGHED, LAID_OFF, FREELANCE, SHUTDOWN];

    #[test]
    fn test_three_respondent_scenario() {
        let conditions = lists(&[&[FURLOUGHED], &[FURLOUGHED, SHUTDOWN], &[]]);

        let tally = condition_tally("impacts", &conditions);
        assert_eq!(tally.get(FURLOUGHED), Some(2));
        assert_eq!(tally.get(SHUTDOWN), Some(1));
        assert_eq!(tally.len(), 2);

        let counts = multi_condition_overlap(&conditions, [FURLOUGHED, FREELANCE, SHUTDOWN]).unwrap();
        assert_eq!(counts.a, 2);
        assert_eq!(counts.b, 0);
        assert_eq!(counts.c, 1);
        assert_eq!(counts.ac, 1);
        assert_eq!(counts.ab, 0);
        assert_eq!(counts.bc, 0);
        assert_eq!(counts.abc, 0);
    }

    #[test]
    fn test_counts_are_monotonic() {
        let conditions = lists(&[
            &[FURLOUGHED, FREELANCE, SHUTDOWN],
            &[FURLOUGHED, FREELANCE],
            &[FREELANCE, SHUTDOWN],
            &[SHUTDOWN],
            &[LAID_OFF, FREELANCE],
            &[FURLOUGHED, SHUTDOWN, LAID_OFF],
        ]);
        let index = ConditionIndex::build(&conditions, TRACKED).unwrap();

        for sets in [[FURLOUGHED, FREELANCE, SHUTDOWN], [LAID_OFF, FREELANCE, SHUTDOWN]] {
            let o = index.overlap(sets);
            assert!(o.ab <= o.a && o.ab <= o.b);
            assert!(o.ac <= o.a && o.ac <= o.c);
            assert!(o.bc <= o.b && o.bc <= o.c);
            assert!(o.abc <= o.ab.min(o.ac).min(o.bc));
        }
    }

    #[test]
    fn test_two_groupings_share_index() {
        let conditions = lists(&[
            &[FURLOUGHED, FREELANCE, SHUTDOWN],
            &[LAID_OFF, FREELANCE, SHUTDOWN],
            &[LAID_OFF],
        ]);
        let index = ConditionIndex::build(&conditions, TRACKED).unwrap();
        let first = index.overlap([FURLOUGHED, FREELANCE, SHUTDOWN]);
        let second = index.overlap([LAID_OFF, FREELANCE, SHUTDOWN]);

        assert_eq!(first.a, 1);
        assert_eq!(second.a, 2);
        assert_eq!(first.bc, second.bc);
        assert_eq!(first.bc, 2);
        assert_eq!(first.abc, 1);
        assert_eq!(second.abc, 1);
    }

    #[test]
    fn test_exclusive_regions_partition_union() {
        let conditions = lists(&[
            &["a", "b", "c"],
            &["a", "b"],
            &["a"],
            &["b", "c"],
            &["c"],
            &["a", "c"],
            &[],
        ]);
        let o = multi_condition_overlap(&conditions, ["a", "b", "c"]).unwrap();
        let regions = o.exclusive_regions();
        assert_eq!(regions, [1, 0, 1, 1, 1, 1, 1]);
        // six respondents have at least one condition
        assert_eq!(regions.iter().sum::<u64>(), 6);
    }

    #[test]
    fn test_unknown_condition_counts_zero() {
        let conditions = lists(&[&["a"], &["a", "b"]]);
        let o = multi_condition_overlap(&conditions, ["a", "b", "zzz"]).unwrap();
        assert_eq!(o.subsets(), [2, 1, 1, 0, 0, 0, 0]);
    }

    #[test]
    fn test_duplicates_within_respondent_count_once() {
        let conditions = lists(&[&["a", "a"], &["a"]]);
        assert_eq!(condition_tally("impacts", &conditions).get("a"), Some(2));
        let index = ConditionIndex::build(&conditions, &["a"]).unwrap();
        assert_eq!(index.count_all(&["a"]), 2);
        assert_eq!(index.count_all(&["a", "a"]), 2);
    }

    #[test]
    fn test_too_many_tracked_conditions() {
        let names: Vec<String> = (0..65).map(|i| format!("c{}", i)).collect();
        let tracked: Vec<&str> = names.iter().map(String::as_str).collect();
        let result = ConditionIndex::build(&[names.clone()], &tracked);
        assert!(matches!(
            result,
            Err(SurveyError::TooManyConditions { count: 65 })
        ));
    }

    #[test]
    fn test_free_text_answers_take_no_bit() {
        let mut conditions: Vec<Vec<String>> =
            (0..70).map(|i| vec![format!("other: reason {}", i)]).collect();
        conditions.push(vec![FURLOUGHED.to_string(), SHUTDOWN.to_string()]);

        let counts = multi_condition_overlap(&conditions, [FURLOUGHED, FREELANCE, SHUTDOWN]).unwrap();
        assert_eq!(counts.subsets(), [1, 0, 0, 1, 1, 0, 0]);
        assert_eq!(condition_tally("impacts", &conditions).len(), 72);
    }

    #[test]
    fn test_merge_conditions_skips_missing() {
        let table = SurveyTable::from_rows(
            &["id", "impact1", "impact2"],
            &[
                vec!["1", "furloughed", ""],
                vec!["2", "", "industryshutdown"],
                vec!["3", "NA", ""],
            ],
        );
        let merged = merge_conditions(&table, &["impact1", "impact2"]).unwrap();
        assert_eq!(
            merged,
            lists(&[&[FURLOUGHED], &[SHUTDOWN], &[]])
        );
    }

    #[test]
    fn test_merge_conditions_missing_column() {
        let table = SurveyTable::from_rows(&["impact1"], &[vec!["furloughed"]]);
        let result = merge_conditions(&table, &["impact1", "impact2"]);
        assert!(matches!(result, Err(SurveyError::Schema { field }) if field == "impact2"));
    }

    #[test]
    fn test_serialized_subset_ids() {
        let o = OverlapCounts {
            sets: ["a".into(), "b".into(), "c".into()],
            a: 3,
            b: 2,
            ab: 1,
            c: 4,
            ac: 1,
            bc: 1,
            abc: 0,
        };
        let js = serde_json::to_value(&o).unwrap();
        assert_eq!(js["100"], 3);
        assert_eq!(js["110"], 1);
        assert_eq!(js["001"], 4);
        assert_eq!(js["111"], 0);
    }

    fn lists(raw: &[&[&str]]) -> Vec<Vec<String>> {
        raw.iter()
            .map(|l| l.iter().map(|s| s.to_string()).collect())
            .collect()
    }
}
