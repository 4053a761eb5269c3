use crate::analyzers::aggregate::aggregate_survey;
use crate::analyzers::types::SurveyReport;
use crate::config::ReportConfig;
use crate::parser::load_survey;
use crate::reference::CountyGeo;
use crate::survey::SurveyTable;
use anyhow::{Context, Result};
use std::path::Path;
use tracing::info;

/// Where the report inputs come from. Unset paths fall back to the built-in defaults.
#[derive(Debug, Clone, Copy)]
pub struct ReportSources<'a> {
    pub input: &'a Path,
    pub config: Option<&'a Path>,
    pub counties: Option<&'a Path>,
    pub delimiter: u8,
}

impl<'a> ReportSources<'a> {
    pub fn new(input: &'a Path) -> Self {
        Self {
            input,
            config: None,
            counties: None,
            delimiter: b',',
        }
    }
}

/// Loads the survey export, the report layout and the county table, then aggregates.
pub fn analyze(sources: ReportSources<'_>) -> Result<SurveyReport> {
    let table = load_table(sources.input, sources.delimiter)?;
    let config = load_config(sources.config)?;
    let geo = load_counties(sources.counties)?;

    let report = aggregate_survey(&table, &config, &geo)
        .with_context(|| format!("Failed to aggregate {}", sources.input.display()))?;

    info!(
        respondents = report.respondents,
        warnings = report.warnings.len(),
        "Report built"
    );
    Ok(report)
}

pub fn load_table(path: &Path, delimiter: u8) -> Result<SurveyTable> {
    let table = load_survey(path, delimiter)
        .with_context(|| format!("Failed to load survey {}", path.display()))?;
    info!(
        path = %path.display(),
        respondents = table.len(),
        columns = table.headers().len(),
        "Survey loaded"
    );
    Ok(table)
}

pub fn load_config(path: Option<&Path>) -> Result<ReportConfig> {
    match path {
        Some(path) => ReportConfig::load(path)
            .with_context(|| format!("Failed to load report config {}", path.display())),
        None => Ok(ReportConfig::default()),
    }
}

pub fn load_counties(path: Option<&Path>) -> Result<CountyGeo> {
    match path {
        Some(path) => CountyGeo::load(path)
            .with_context(|| format!("Failed to load county coordinates {}", path.display())),
        None => CountyGeo::builtin().context("Built-in county table is invalid"),
    }
}
