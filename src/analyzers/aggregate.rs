use crate::analyzers::bubble::bubble_chart;
use crate::analyzers::geo::geographic_join;
use crate::analyzers::overlap::{ConditionIndex, condition_tally, merge_conditions};
use crate::analyzers::tally::{CategoryCount, PercentageTally, TallyOptions, categorical_tally};
use crate::analyzers::types::{
    ConditionSection, CountySection, FieldSummary, OverlapSection, SurveyReport,
};
use crate::config::{ConditionConfig, CountyConfig, ReportConfig, TallyConfig};
use crate::error::{Result, SurveyError};
use crate::reference::CountyGeo;
use crate::survey::SurveyTable;
use chrono::Utc;
use tracing::{debug, info};

/// Label that absorbs answers cut by a `top_n` limit.
pub const OTHER_LABEL: &str = "Other";

/// Field name the merged condition tally is reported under.
pub const IMPACT_FIELD: &str = "impacts";

/// Builds every section of `config` from one survey table.
///
/// All referenced columns are checked up front, so a bad config fails before any
/// counting starts. Empty fields do not fail the report: they yield empty tables and
/// a warning, as do counties missing from `geo` and answers outside bubble buckets.
#[tracing::instrument(skip_all, fields(respondents = table.len()))]
pub fn aggregate_survey(
    table: &SurveyTable,
    config: &ReportConfig,
    geo: &CountyGeo,
) -> Result<SurveyReport> {
    table.require(config.required_fields())?;

    let mut warnings = Vec::new();

    let tallies = config
        .tallies
        .iter()
        .map(|tally| summarize_field(table, tally, &mut warnings))
        .collect::<Result<Vec<_>>>()?;

    let county = config
        .county
        .as_ref()
        .map(|county| county_section(table, county, geo, &mut warnings))
        .transpose()?;

    let conditions = config
        .conditions
        .as_ref()
        .map(|conditions| condition_section(table, conditions))
        .transpose()?;

    let mut bubbles = Vec::with_capacity(config.bubbles.len());
    for chart_config in &config.bubbles {
        let counts = categorical_tally(table, &chart_config.field, &TallyOptions::default())?;
        let chart = bubble_chart(&counts, chart_config);
        for label in &chart.unexpected {
            warnings.push(format!(
                "{}: answer '{}' is not one of the configured buckets",
                chart.field, label
            ));
        }
        bubbles.push(chart);
    }

    info!(
        tallies = tallies.len(),
        bubbles = bubbles.len(),
        warnings = warnings.len(),
        "Survey aggregated"
    );

    Ok(SurveyReport {
        generated_at: Utc::now(),
        title: config.title.clone(),
        respondents: table.len(),
        tallies,
        county,
        conditions,
        bubbles,
        warnings,
    })
}

fn summarize_field(
    table: &SurveyTable,
    config: &TallyConfig,
    warnings: &mut Vec<String>,
) -> Result<FieldSummary> {
    let mut counts = categorical_tally(table, &config.field, &config.options())?;
    if let Some(n) = config.top_n {
        counts = counts.top(n, OTHER_LABEL);
    }

    let percentages = match counts.percentages() {
        Ok(p) => p,
        Err(SurveyError::EmptyInput { field }) => {
            warnings.push(format!("{}: no answers", field));
            PercentageTally::empty(&field)
        }
        Err(e) => return Err(e),
    };

    Ok(FieldSummary {
        field: config.field.clone(),
        title: config.title.clone(),
        counts,
        percentages,
    })
}

fn county_section(
    table: &SurveyTable,
    config: &CountyConfig,
    geo: &CountyGeo,
    warnings: &mut Vec<String>,
) -> Result<CountySection> {
    let counts = categorical_tally(table, &config.field, &config.options())?;
    let map = geographic_join(&counts, geo);

    for county in &map.unmatched {
        let count = counts.get(county).unwrap_or(0);
        warnings.push(format!(
            "{}: county '{}' ({} respondents) has no coordinates",
            config.field, county, count
        ));
    }

    debug!(
        counties = counts.len(),
        mapped = map.points.len(),
        "County section built"
    );
    Ok(CountySection { counts, map })
}

fn condition_section(table: &SurveyTable, config: &ConditionConfig) -> Result<ConditionSection> {
    let conditions = merge_conditions(table, &config.columns)?;
    let impacts: CategoryCount = condition_tally(IMPACT_FIELD, &conditions);

    // one index for every grouping; shared subsets are counted once
    let index = ConditionIndex::build(&conditions, &config.tracked_names())?;
    let overlaps = config
        .groupings
        .iter()
        .map(|grouping| {
            let counts = index.overlap(grouping.sets());
            OverlapSection {
                title: grouping.title.clone(),
                exclusive: counts.exclusive_regions(),
                counts,
            }
        })
        .collect();

    debug!(
        respondents = index.respondents(),
        conditions = impacts.len(),
        groupings = config.groupings.len(),
        "Condition section built"
    );
    Ok(ConditionSection { impacts, overlaps })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::bubble::BubbleChartConfig;
    use crate::config::OverlapGrouping;
    use crate::reference::Coordinates;

    #[test]
    fn test_missing_column_fails_before_counting() {
        let table = SurveyTable::from_rows(&["p41_gender1"], &[vec!["Woman"]]);
        let config = ReportConfig {
            tallies: vec![
                TallyConfig::new("p41_gender1", "Gender"),
                TallyConfig::new("p99_nothing", "Nothing"),
            ],
            county: None,
            conditions: None,
            bubbles: vec![],
            ..Default::default()
        };
        let result = aggregate_survey(&table, &config, &CountyGeo::new());
        assert!(matches!(result, Err(SurveyError::Schema { field }) if field == "p99_nothing"));
    }

    #[test]
    fn test_empty_field_gives_warning_not_error() {
        let table = SurveyTable::from_rows(&["p41_gender1"], &[vec![""], vec!["NA"]]);
        let report = aggregate_survey(&table, &gender_only(), &CountyGeo::new()).unwrap();

        assert_eq!(report.respondents, 2);
        assert!(report.tallies[0].counts.is_empty());
        assert!(report.tallies[0].percentages.is_empty());
        assert_eq!(report.warnings, vec!["p41_gender1: no answers".to_string()]);
    }

    #[test]
    fn test_top_n_rolls_into_other() {
        let table = SurveyTable::from_rows(
            &["p40_language"],
            &[
                vec!["English"],
                vec!["English"],
                vec!["Spanish"],
                vec!["French"],
                vec!["Korean"],
            ],
        );
        let mut tally = TallyConfig::new("p40_language", "Language");
        tally.top_n = Some(1);
        let config = ReportConfig {
            tallies: vec![tally],
            county: None,
            conditions: None,
            bubbles: vec![],
            ..Default::default()
        };
        let report = aggregate_survey(&table, &config, &CountyGeo::new()).unwrap();
        let counts = &report.tallies[0].counts;

        assert_eq!(counts.get("Other"), Some(3));
        assert_eq!(counts.get("English"), Some(2));
        assert_eq!(counts.total(), 5);
    }

    #[test]
    fn test_county_suffix_merged_and_unmatched_warned() {
        let table = SurveyTable::from_rows(
            &["p34_county"],
            &[
                vec!["Albany County"],
                vec!["Albany"],
                vec!["Atlantis County"],
            ],
        );
        let config = ReportConfig {
            tallies: vec![],
            county: Some(CountyConfig {
                field: "p34_county".to_string(),
                strip_suffix: Some(" County".to_string()),
            }),
            conditions: None,
            bubbles: vec![],
            ..Default::default()
        };
        let mut geo = CountyGeo::new();
        geo.insert(
            "Albany",
            Coordinates {
                latitude: 42.65,
                longitude: -73.75,
            },
        );

        let report = aggregate_survey(&table, &config, &geo).unwrap();
        let county = report.county.unwrap();

        assert_eq!(county.counts.get("Albany"), Some(2));
        assert_eq!(county.map.points.len(), 1);
        assert_eq!(county.map.unmatched, vec!["Atlantis".to_string()]);
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].contains("Atlantis"));
    }

    #[test]
    fn test_conditions_share_one_index() {
        let table = SurveyTable::from_rows(
            &["impact1", "impact2"],
            &[
                vec!["furloughed", ""],
                vec!["furloughed", "industryshutdown"],
                vec!["laidofforfired", "freelanceworkcanceled"],
            ],
        );
        let grouping = |first: &str| OverlapGrouping {
            title: None,
            sets: [
                first.to_string(),
                "freelanceworkcanceled".to_string(),
                "industryshutdown".to_string(),
            ],
        };
        let config = ReportConfig {
            tallies: vec![],
            county: None,
            conditions: Some(ConditionConfig {
                columns: vec!["impact1".to_string(), "impact2".to_string()],
                groupings: vec![grouping("furloughed"), grouping("laidofforfired")],
            }),
            bubbles: vec![],
            ..Default::default()
        };

        let report = aggregate_survey(&table, &config, &CountyGeo::new()).unwrap();
        let section = report.conditions.unwrap();

        assert_eq!(section.impacts.get("furloughed"), Some(2));
        assert_eq!(section.overlaps.len(), 2);
        assert_eq!(section.overlaps[0].counts.a, 2);
        assert_eq!(section.overlaps[0].counts.ac, 1);
        assert_eq!(section.overlaps[1].counts.a, 1);
        assert_eq!(section.overlaps[1].counts.ab, 1);
        // BC is the same subset in both groupings
        assert_eq!(section.overlaps[0].counts.bc, section.overlaps[1].counts.bc);
    }

    #[test]
    fn test_unexpected_bubble_answer_warned() {
        let table = SurveyTable::from_rows(&["p5_amountofenergy"], &[vec!["Lots"], vec!["Odd"]]);
        let mut chart = BubbleChartConfig::new("p5_amountofenergy", &[]);
        chart.buckets = vec!["Lots".to_string(), "Little".to_string()];
        let config = ReportConfig {
            tallies: vec![],
            county: None,
            conditions: None,
            bubbles: vec![chart],
            ..Default::default()
        };

        let report = aggregate_survey(&table, &config, &CountyGeo::new()).unwrap();
        assert_eq!(report.bubbles[0].bubbles.len(), 2);
        assert_eq!(report.bubbles[0].unexpected, vec!["Odd".to_string()]);
        assert_eq!(report.warnings.len(), 1);
    }

    #[test]
    fn test_free_text_impacts_do_not_abort_report() {
        let mut rows: Vec<Vec<String>> = (0..70)
            .map(|i| vec!["Woman".to_string(), format!("other: reason {}", i), String::new()])
            .collect();
        rows.push(vec![
            "Man".to_string(),
            "furloughed".to_string(),
            "industryshutdown".to_string(),
        ]);
        let rows: Vec<Vec<&str>> = rows
            .iter()
            .map(|r| r.iter().map(String::as_str).collect())
            .collect();
        let table = SurveyTable::from_rows(&["p41_gender1", "impact1", "impact2"], &rows);

        let mut config = gender_only();
        config.conditions = Some(ConditionConfig {
            columns: vec!["impact1".to_string(), "impact2".to_string()],
            groupings: vec![OverlapGrouping {
                title: None,
                sets: [
                    "furloughed".to_string(),
                    "freelanceworkcanceled".to_string(),
                    "industryshutdown".to_string(),
                ],
            }],
        });

        let report = aggregate_survey(&table, &config, &CountyGeo::new()).unwrap();
        assert_eq!(report.tallies[0].counts.get("Woman"), Some(70));
        let section = report.conditions.unwrap();
        assert_eq!(section.impacts.len(), 72);
        assert_eq!(section.overlaps[0].counts.subsets(), [1, 0, 0, 1, 1, 0, 0]);
    }

    fn gender_only() -> ReportConfig {
        ReportConfig {
            tallies: vec![TallyConfig::new("p41_gender1", "Gender")],
            county: None,
            conditions: None,
            bubbles: vec![],
            ..Default::default()
        }
    }
}
