use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Record – one row of the insights table
// ---------------------------------------------------------------------------

/// A single dataset entry.
///
/// Text fields are `None` when the source had null or an empty string.
/// Scores default to `0.0` when absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Record {
    pub end_year: Option<i32>,
    pub start_year: Option<i32>,
    pub intensity: f64,
    pub relevance: f64,
    pub likelihood: f64,
    pub topic: Option<String>,
    pub sector: Option<String>,
    pub region: Option<String>,
    pub pestle: Option<String>,
    pub source: Option<String>,
    pub country: Option<String>,
    pub insight: Option<String>,
    pub url: Option<String>,
    pub impact: Option<String>,
    pub added: Option<String>,
    pub published: Option<String>,
    pub title: Option<String>,
}

// ---------------------------------------------------------------------------
// Field – a named column of the table
// ---------------------------------------------------------------------------

/// Every column a [`Record`] carries, addressed by its wire name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    EndYear,
    StartYear,
    Intensity,
    Relevance,
    Likelihood,
    Topic,
    Sector,
    Region,
    Pestle,
    Source,
    Country,
    Insight,
    Url,
    Impact,
    Added,
    Published,
    Title,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown field `{0}`")]
pub struct UnknownField(pub String);

impl Field {
    pub const ALL: [Field; 17] = [
        Field::EndYear,
        Field::StartYear,
        Field::Intensity,
        Field::Relevance,
        Field::Likelihood,
        Field::Topic,
        Field::Sector,
        Field::Region,
        Field::Pestle,
        Field::Source,
        Field::Country,
        Field::Insight,
        Field::Url,
        Field::Impact,
        Field::Added,
        Field::Published,
        Field::Title,
    ];

    /// Column name as it appears in JSON, CSV and Parquet input.
    pub fn name(self) -> &'static str {
        match self {
            Field::EndYear => "end_year",
            Field::StartYear => "start_year",
            Field::Intensity => "intensity",
            Field::Relevance => "relevance",
            Field::Likelihood => "likelihood",
            Field::Topic => "topic",
            Field::Sector => "sector",
            Field::Region => "region",
            Field::Pestle => "pestle",
            Field::Source => "source",
            Field::Country => "country",
            Field::Insight => "insight",
            Field::Url => "url",
            Field::Impact => "impact",
            Field::Added => "added",
            Field::Published => "published",
            Field::Title => "title",
        }
    }

    /// Render this field of `record` as text, `None` when absent.
    ///
    /// Scores are always present; `6.0` renders as `"6"`.
    pub fn text<'a>(self, record: &'a Record) -> Option<Cow<'a, str>> {
        let borrowed = |v: &'a Option<String>| v.as_deref().map(Cow::Borrowed);
        match self {
            Field::EndYear => record.end_year.map(|y| Cow::Owned(y.to_string())),
            Field::StartYear => record.start_year.map(|y| Cow::Owned(y.to_string())),
            Field::Intensity => Some(Cow::Owned(record.intensity.to_string())),
            Field::Relevance => Some(Cow::Owned(record.relevance.to_string())),
            Field::Likelihood => Some(Cow::Owned(record.likelihood.to_string())),
            Field::Topic => borrowed(&record.topic),
            Field::Sector => borrowed(&record.sector),
            Field::Region => borrowed(&record.region),
            Field::Pestle => borrowed(&record.pestle),
            Field::Source => borrowed(&record.source),
            Field::Country => borrowed(&record.country),
            Field::Insight => borrowed(&record.insight),
            Field::Url => borrowed(&record.url),
            Field::Impact => borrowed(&record.impact),
            Field::Added => borrowed(&record.added),
            Field::Published => borrowed(&record.published),
            Field::Title => borrowed(&record.title),
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Field {
    type Err = UnknownField;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Field::ALL
            .into_iter()
            .find(|field| field.name() == s)
            .ok_or_else(|| UnknownField(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// FilterKey – the subset of fields the filter panel exposes
// ---------------------------------------------------------------------------

/// A key the filter panel can constrain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterKey {
    EndYear,
    Topic,
    Sector,
    Region,
    Pestle,
    Source,
    Country,
    StartYear,
}

impl FilterKey {
    /// Panel order.
    pub const ALL: [FilterKey; 8] = [
        FilterKey::EndYear,
        FilterKey::Topic,
        FilterKey::Sector,
        FilterKey::Region,
        FilterKey::Pestle,
        FilterKey::Source,
        FilterKey::Country,
        FilterKey::StartYear,
    ];

    pub fn field(self) -> Field {
        match self {
            FilterKey::EndYear => Field::EndYear,
            FilterKey::Topic => Field::Topic,
            FilterKey::Sector => Field::Sector,
            FilterKey::Region => Field::Region,
            FilterKey::Pestle => Field::Pestle,
            FilterKey::Source => Field::Source,
            FilterKey::Country => Field::Country,
            FilterKey::StartYear => Field::StartYear,
        }
    }

    /// Year keys match exactly; every other key is a substring match.
    pub fn is_year(self) -> bool {
        matches!(self, FilterKey::EndYear | FilterKey::StartYear)
    }
}

impl fmt::Display for FilterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.field().name())
    }
}

impl FromStr for FilterKey {
    type Err = UnknownField;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FilterKey::ALL
            .into_iter()
            .find(|key| key.field().name() == s)
            .ok_or_else(|| UnknownField(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Dataset – the complete loaded table
// ---------------------------------------------------------------------------

/// The full parsed dataset with the filter panel's options pre-computed.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    /// All records, in source order.
    pub records: Vec<Record>,
    /// For each filter key the sorted set of distinct non-empty values.
    pub filter_options: BTreeMap<FilterKey, BTreeSet<String>>,
}

impl Dataset {
    /// Build the filter option index from the loaded records.
    pub fn from_records(records: Vec<Record>) -> Self {
        let filter_options = FilterKey::ALL
            .into_iter()
            .map(|key| (key, unique_values(&records, key.field())))
            .collect();

        Dataset {
            records,
            filter_options,
        }
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Distinct non-empty values of `field` across `records`, sorted.
pub fn unique_values(records: &[Record], field: Field) -> BTreeSet<String> {
    records
        .iter()
        .filter_map(|record| field.text(record))
        .filter(|value| !value.is_empty())
        .map(Cow::into_owned)
        .collect()
}
