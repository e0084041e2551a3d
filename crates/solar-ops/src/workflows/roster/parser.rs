use serde::{Deserialize, Deserializer};
use std::io::Read;

/// One roster CSV row with the source line kept for error reporting.
#[derive(Debug)]
pub(crate) struct RosterRow {
    pub(crate) line: u64,
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) active: Option<String>,
    pub(crate) performance: Option<String>,
    pub(crate) compliance: Option<String>,
    pub(crate) max_concurrent_jobs: Option<String>,
    pub(crate) home_base_city: Option<String>,
}

pub(crate) fn parse_rows<R: Read>(reader: R) -> Result<Vec<RosterRow>, csv::Error> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let headers = csv_reader.headers()?.clone();
    let mut rows = Vec::new();

    for result in csv_reader.records() {
        let record = result?;
        let line = record.position().map(|pos| pos.line()).unwrap_or_default();
        let raw: RawRosterRow = record.deserialize(Some(&headers))?;

        rows.push(RosterRow {
            line,
            id: raw.id,
            name: raw.name,
            active: raw.active,
            performance: raw.performance,
            compliance: raw.compliance,
            max_concurrent_jobs: raw.max_concurrent_jobs,
            home_base_city: raw.home_base_city,
        });
    }

    Ok(rows)
}

#[derive(Debug, Deserialize)]
struct RawRosterRow {
    #[serde(rename = "Subcontractor ID")]
    id: String,
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Active", default, deserialize_with = "empty_string_as_none")]
    active: Option<String>,
    #[serde(
        rename = "Performance",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    performance: Option<String>,
    #[serde(
        rename = "Compliance",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    compliance: Option<String>,
    #[serde(
        rename = "Max Concurrent Jobs",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    max_concurrent_jobs: Option<String>,
    #[serde(
        rename = "Home Base City",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    home_base_city: Option<String>,
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}
