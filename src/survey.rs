//! In-memory survey table: one [`SurveyRecord`] per respondent, addressed by field name.

use std::collections::HashMap;

use crate::error::{Result, SurveyError};

/// Column names of the arts-survey export the default report is built for.
pub mod fields {
    pub const ETHNICITY: &str = "p38_race1";
    pub const GENDER: &str = "p41_gender1";
    pub const COMMUNITY: &str = "p36_community";
    pub const AGE_RANGE: &str = "p_agerange";
    pub const LGBTQIAP: &str = "p43_lgbtqiap";
    pub const LANGUAGE: &str = "p40_language";
    pub const COUNTY: &str = "p34_county";
    pub const ENERGY: &str = "p5_amountofenergy";
    pub const TIME: &str = "p6_amountoftime";
    pub const HEALTH_INSURANCE: &str = "p12_healthinsurance";
    pub const STABLE_HOUSING: &str = "p17_stablehousing";
    pub const PHYSICAL_HEALTH: &str = "p15_physicalhealth";
    pub const MENTAL_HEALTH: &str = "p16_mentalhealth";
    pub const CARRYING_DEBT: &str = "p14_carryingdebt";
    pub const DEBT_MANAGEABLE: &str = "p14b_debtmanageable";
    pub const AWARE_OF_GI: &str = "p26_awareofgi";
    pub const POLICY_GROUP: &str = "p28_policygroup";

    /// Multi-select employment impact answers, one selected option per column.
    pub const EMPLOYMENT_IMPACT: [&str; 8] = [
        "p30_employimpact1",
        "p30_employimpact2",
        "p30_employimpact3",
        "p30_employimpact4",
        "p30_employimpact5",
        "p30_employimpact6",
        "p30_employimpact7",
        "p30_employimpact8",
    ];
}

/// Cell contents treated as "no answer" after trimming.
pub const MISSING_MARKERS: &[&str] = &["", "NA", "N/A", "NaN", "nan", "null", "NULL", "None"];

/// Trims a raw cell and maps missing markers to `None`.
pub fn normalize_cell(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if MISSING_MARKERS.contains(&trimmed) {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// One respondent. Values are positional and line up with [`SurveyTable::headers`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SurveyRecord {
    values: Vec<Option<String>>,
}

impl SurveyRecord {
    pub fn new(values: Vec<Option<String>>) -> Self {
        Self { values }
    }

    pub fn get(&self, idx: usize) -> Option<&str> {
        self.values.get(idx).and_then(|v| v.as_deref())
    }
}

#[derive(Debug, Clone, Default)]
pub struct SurveyTable {
    headers: Vec<String>,
    index: HashMap<String, usize>,
    records: Vec<SurveyRecord>,
}

impl SurveyTable {
    pub fn new(headers: Vec<String>, records: Vec<SurveyRecord>) -> Self {
        let mut index = HashMap::with_capacity(headers.len());
        for (i, h) in headers.iter().enumerate() {
            // first occurrence wins on duplicated headers
            index.entry(h.trim().to_string()).or_insert(i);
        }
        Self {
            headers,
            index,
            records,
        }
    }

    /// Builds a table from string cells, applying [`normalize_cell`] to each one.
    pub fn from_rows(headers: &[&str], rows: &[Vec<&str>]) -> Self {
        let records = rows
            .iter()
            .map(|row| SurveyRecord::new(row.iter().map(|c| normalize_cell(c)).collect()))
            .collect();
        Self::new(headers.iter().map(|h| h.to_string()).collect(), records)
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn records(&self) -> &[SurveyRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Column position of `field`, or a schema error naming it.
    pub fn position(&self, field: &str) -> Result<usize> {
        self.index
            .get(field)
            .copied()
            .ok_or_else(|| SurveyError::schema(field))
    }

    /// Fails on the first field of `fields` that the table does not carry.
    pub fn require<'f, I>(&self, fields: I) -> Result<()>
    where
        I: IntoIterator<Item = &'f str>,
    {
        for field in fields {
            self.position(field)?;
        }
        Ok(())
    }

    /// Values of one field, `None` for missing answers.
    pub fn values<'a>(
        &'a self,
        field: &str,
    ) -> Result<impl Iterator<Item = Option<&'a str>> + use<'a>> {
        let idx = self.position(field)?;
        Ok(self.records.iter().map(move |r| r.get(idx)))
    }

    pub fn non_missing(&self, field: &str) -> Result<usize> {
        Ok(self.values(field)?.flatten().count())
    }
}
