use std::borrow::Borrow;

use serde::Serialize;

use super::group::{Metric, group_by, mean, round1};
use crate::data::model::Record;

/// Year a record falls under in the trend chart when it has neither an end
/// nor a start year.
pub const DEFAULT_TREND_YEAR: i32 = 2024;

/// Topics kept in the top-topics chart.
pub const DEFAULT_TOP_TOPICS: usize = 10;

/// Rows shown in the preview table.
pub const DEFAULT_PREVIEW_ROWS: usize = 5;

// ---------------------------------------------------------------------------
// View-model rows
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SectorIntensity {
    pub sector: String,
    pub avg_intensity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionShare {
    pub region: String,
    pub count: usize,
    /// Share of all filtered records, one decimal, e.g. `"66.7"`.
    pub percentage: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SectorRollup {
    pub sector: String,
    pub count: usize,
    pub avg_intensity: f64,
    pub avg_relevance: f64,
    pub avg_likelihood: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicRollup {
    pub topic: String,
    pub avg_relevance: f64,
    pub avg_likelihood: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct YearTrend {
    pub year: i32,
    pub avg_intensity: f64,
    pub avg_relevance: f64,
    pub avg_likelihood: f64,
    pub count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryStats {
    pub total: usize,
    pub avg_intensity: f64,
    pub avg_relevance: f64,
    pub avg_likelihood: f64,
}

/// Colour band of a score cell in the preview table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreLevel {
    High,
    Medium,
    Low,
}

impl ScoreLevel {
    pub fn of(score: f64) -> Self {
        if score > 7.0 {
            ScoreLevel::High
        } else if score > 4.0 {
            ScoreLevel::Medium
        } else {
            ScoreLevel::Low
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreCell {
    pub value: f64,
    pub level: ScoreLevel,
}

impl From<f64> for ScoreCell {
    fn from(value: f64) -> Self {
        ScoreCell {
            value,
            level: ScoreLevel::of(value),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PreviewRow {
    pub topic: String,
    pub sector: String,
    pub region: String,
    pub intensity: ScoreCell,
    pub relevance: ScoreCell,
    pub likelihood: ScoreCell,
}

// ---------------------------------------------------------------------------
// Group-by passes
// ---------------------------------------------------------------------------

/// Average intensity per sector, highest first.
pub fn sector_intensity<R: Borrow<Record>>(records: &[R]) -> Vec<SectorIntensity> {
    let mut rows: Vec<SectorIntensity> =
        group_by(records, |r| r.sector.as_deref(), [Metric::Intensity])
            .into_iter()
            .map(|(sector, g)| SectorIntensity {
                sector: sector.to_string(),
                avg_intensity: g.mean(0),
            })
            .collect();
    rows.sort_by(|a, b| b.avg_intensity.total_cmp(&a.avg_intensity));
    rows
}

/// Record count per region and its share of all `records`.
pub fn region_distribution<R: Borrow<Record>>(records: &[R]) -> Vec<RegionShare> {
    let total = records.len();
    group_by(records, |r| r.region.as_deref(), [])
        .into_iter()
        .map(|(region, g)| RegionShare {
            region: region.to_string(),
            count: g.count,
            percentage: format!("{:.1}", round1(g.count as f64 / total as f64 * 100.0)),
        })
        .collect()
}

/// Count and average scores per sector, most populated first.
pub fn sector_rollup<R: Borrow<Record>>(records: &[R]) -> Vec<SectorRollup> {
    let mut rows: Vec<SectorRollup> = group_by(
        records,
        |r| r.sector.as_deref(),
        [Metric::Intensity, Metric::Relevance, Metric::Likelihood],
    )
    .into_iter()
    .map(|(sector, g)| SectorRollup {
        sector: sector.to_string(),
        count: g.count,
        avg_intensity: g.mean(0),
        avg_relevance: g.mean(1),
        avg_likelihood: g.mean(2),
    })
    .collect();
    rows.sort_by(|a, b| b.count.cmp(&a.count));
    rows
}

/// The `limit` most frequent topics with their average relevance and likelihood.
pub fn topic_rollup<R: Borrow<Record>>(records: &[R], limit: usize) -> Vec<TopicRollup> {
    let mut rows: Vec<TopicRollup> = group_by(
        records,
        |r| r.topic.as_deref(),
        [Metric::Relevance, Metric::Likelihood],
    )
    .into_iter()
    .filter(|(_, g)| g.count > 0)
    .map(|(topic, g)| TopicRollup {
        topic: topic.to_string(),
        avg_relevance: g.mean(0),
        avg_likelihood: g.mean(1),
        count: g.count,
    })
    .collect();
    rows.sort_by(|a, b| b.count.cmp(&a.count));
    rows.truncate(limit);
    rows
}

/// Average scores per year, oldest first.
///
/// A record counts under its end year, else its start year, else
/// [`DEFAULT_TREND_YEAR`].
pub fn year_trend<R: Borrow<Record>>(records: &[R]) -> Vec<YearTrend> {
    group_by(
        records,
        |r| Some(r.end_year.or(r.start_year).unwrap_or(DEFAULT_TREND_YEAR)),
        [Metric::Intensity, Metric::Relevance, Metric::Likelihood],
    )
    .into_iter()
    .map(|(year, g)| YearTrend {
        year,
        avg_intensity: g.mean(0),
        avg_relevance: g.mean(1),
        avg_likelihood: g.mean(2),
        count: g.count,
    })
    .collect()
}

// ---------------------------------------------------------------------------
// Whole-set views
// ---------------------------------------------------------------------------

/// Record count and mean scores over all `records`; zeros when empty.
pub fn summary<R: Borrow<Record>>(records: &[R]) -> SummaryStats {
    let total = records.len();
    let (mut intensity, mut relevance, mut likelihood) = (0.0, 0.0, 0.0);
    for record in records {
        let record: &Record = record.borrow();
        intensity += record.intensity;
        relevance += record.relevance;
        likelihood += record.likelihood;
    }

    SummaryStats {
        total,
        avg_intensity: mean(intensity, total),
        avg_relevance: mean(relevance, total),
        avg_likelihood: mean(likelihood, total),
    }
}

/// The first `limit` records as table rows, `"N/A"` for absent categories.
pub fn preview<R: Borrow<Record>>(records: &[R], limit: usize) -> Vec<PreviewRow> {
    let or_na = |v: &Option<String>| v.clone().unwrap_or_else(|| "N/A".to_string());
    records
        .iter()
        .take(limit)
        .map(|r| {
            let r: &Record = r.borrow();
            PreviewRow {
                topic: or_na(&r.topic),
                sector: or_na(&r.sector),
                region: or_na(&r.region),
                intensity: r.intensity.into(),
                relevance: r.relevance.into(),
                likelihood: r.likelihood.into(),
            }
        })
        .collect()
}
