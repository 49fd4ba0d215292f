/// Aggregation layer: filtered records → chart view models.
///
/// Every chart is one pass of [`group::group_by`] over the same filtered
/// slice. Nothing is cached between passes; [`DashboardViews::compute`] is a
/// pure function of its inputs.
pub mod group;
pub mod views;

use std::borrow::Borrow;

use serde::Serialize;

use crate::data::model::Record;
use views::{
    DEFAULT_PREVIEW_ROWS, DEFAULT_TOP_TOPICS, PreviewRow, RegionShare, SectorIntensity,
    SectorRollup, SummaryStats, TopicRollup, YearTrend,
};

/// Knobs for the bounded views.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AggregateOptions {
    /// Topics kept in the top-topics chart.
    pub top_topics: usize,
    /// Rows in the preview table.
    pub preview_rows: usize,
}

impl Default for AggregateOptions {
    fn default() -> Self {
        Self {
            top_topics: DEFAULT_TOP_TOPICS,
            preview_rows: DEFAULT_PREVIEW_ROWS,
        }
    }
}

/// Everything the render layer draws for one set of filtered records.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardViews {
    pub summary: SummaryStats,
    pub sector_intensity: Vec<SectorIntensity>,
    pub region_distribution: Vec<RegionShare>,
    pub sector_rollup: Vec<SectorRollup>,
    pub top_topics: Vec<TopicRollup>,
    pub year_trend: Vec<YearTrend>,
    pub preview: Vec<PreviewRow>,
}

impl DashboardViews {
    pub fn compute<R: Borrow<Record>>(records: &[R], options: &AggregateOptions) -> Self {
        DashboardViews {
            summary: views::summary(records),
            sector_intensity: views::sector_intensity(records),
            region_distribution: views::region_distribution(records),
            sector_rollup: views::sector_rollup(records),
            top_topics: views::topic_rollup(records, options.top_topics),
            year_trend: views::year_trend(records),
            preview: views::preview(records, options.preview_rows),
        }
    }
}
