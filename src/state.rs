use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::aggregate::{AggregateOptions, DashboardViews};
use crate::data::filter::{FilterCriteria, filter_records};
use crate::data::model::{Dataset, FilterKey, Record};
use crate::data::source::RecordSource;

// ---------------------------------------------------------------------------
// Dashboard state
// ---------------------------------------------------------------------------

/// The full dashboard state, independent of rendering.
#[derive(Debug, Default)]
pub struct DashboardState {
    /// Loaded dataset (None until a source delivers, or after it fails).
    pub dataset: Option<Dataset>,

    /// The one active filter selection.
    criteria: FilterCriteria,

    /// Views for the current criteria.
    views: DashboardViews,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,

    options: AggregateOptions,

    /// Bumped on every criteria or dataset change.
    generation: u64,
}

/// A recomputation started for one generation of the state.
///
/// Finishing it after a newer one has started is a no-op.
#[derive(Debug, Clone)]
pub struct PendingRefresh {
    generation: u64,
    criteria: FilterCriteria,
}

impl PendingRefresh {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn criteria(&self) -> &FilterCriteria {
        &self.criteria
    }

    /// Filter and aggregate `dataset` for this refresh's criteria.
    pub fn compute(&self, dataset: Option<&Dataset>, options: &AggregateOptions) -> DashboardViews {
        match dataset {
            Some(ds) => {
                let visible = filter_records(&ds.records, &self.criteria);
                DashboardViews::compute(&visible, options)
            }
            None => DashboardViews::default(),
        }
    }
}

/// What the render layer receives after each transition.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSnapshot<'a> {
    pub criteria: &'a FilterCriteria,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<&'a str>,
    pub views: &'a DashboardViews,
}

impl DashboardState {
    pub fn new(options: AggregateOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    /// Fetch every record from `source` and recompute.
    ///
    /// A failing source leaves no dataset, empty views and the error as the
    /// status message. Calling `load` again retries.
    pub fn load(&mut self, source: &dyn RecordSource) {
        match source.get_all() {
            Ok(records) => {
                log::info!("Dashboard loaded {} records", records.len());
                self.set_dataset(Dataset::from_records(records));
            }
            Err(e) => {
                log::error!("Failed to load records: {e}");
                self.dataset = None;
                self.status_message = Some(format!("Error: {e}"));
                self.refilter();
            }
        }
    }

    /// Ingest a newly loaded dataset and recompute under the current criteria.
    pub fn set_dataset(&mut self, dataset: Dataset) {
        self.dataset = Some(dataset);
        self.status_message = None;
        self.refilter();
    }

    pub fn criteria(&self) -> &FilterCriteria {
        &self.criteria
    }

    pub fn views(&self) -> &DashboardViews {
        &self.views
    }

    pub fn options(&self) -> &AggregateOptions {
        &self.options
    }

    /// Replace the active criteria in one transition and recompute.
    pub fn apply_criteria(&mut self, criteria: FilterCriteria) {
        self.criteria = criteria;
        self.refilter();
    }

    /// Change a single key, leaving the others as they are.
    pub fn set_filter(&mut self, key: FilterKey, value: impl Into<String>) {
        let criteria = self.criteria.clone().with(key, value);
        self.apply_criteria(criteria);
    }

    /// Drop every constraint.
    pub fn clear_filters(&mut self) {
        self.apply_criteria(FilterCriteria::default());
    }

    /// Start a recomputation for the current criteria.
    ///
    /// Any refresh begun earlier becomes stale.
    pub fn begin_refresh(&mut self) -> PendingRefresh {
        self.generation += 1;
        PendingRefresh {
            generation: self.generation,
            criteria: self.criteria.clone(),
        }
    }

    /// Install `views` computed for `pending`.
    ///
    /// Returns `false`, discarding `views`, when a later refresh has started.
    pub fn finish_refresh(&mut self, pending: PendingRefresh, views: DashboardViews) -> bool {
        if pending.generation != self.generation {
            log::debug!(
                "Discarding stale refresh {} (current {})",
                pending.generation,
                self.generation
            );
            return false;
        }
        self.views = views;
        true
    }

    /// Recompute the views synchronously.
    pub fn refilter(&mut self) {
        let pending = self.begin_refresh();
        let views = pending.compute(self.dataset.as_ref(), &self.options);
        self.finish_refresh(pending, views);
    }

    /// Records passing the current criteria, in dataset order.
    pub fn visible_records(&self) -> Vec<&Record> {
        match &self.dataset {
            Some(ds) => filter_records(&ds.records, &self.criteria),
            None => Vec::new(),
        }
    }

    /// Choices for each filter panel dropdown.
    pub fn filter_options(&self) -> BTreeMap<FilterKey, BTreeSet<String>> {
        self.dataset
            .as_ref()
            .map(|ds| ds.filter_options.clone())
            .unwrap_or_default()
    }

    pub fn snapshot(&self) -> DashboardSnapshot<'_> {
        DashboardSnapshot {
            criteria: &self.criteria,
            status: self.status_message.as_deref(),
            views: &self.views,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SourceError;
    use pretty_assertions::assert_eq;
    use std::cell::Cell;

    fn records() -> Vec<Record> {
        vec![
            Record {
                sector: Some("Power".into()),
                region: Some("Asia".into()),
                intensity: 8.0,
                ..Record::default()
            },
            Record {
                sector: Some("Power".into()),
                region: Some("Europe".into()),
                intensity: 6.0,
                ..Record::default()
            },
            Record {
                sector: Some("IT".into()),
                region: Some("Asia".into()),
                intensity: 9.0,
                ..Record::default()
            },
        ]
    }

    /// Fails until `healthy` is set.
    struct FlakySource {
        healthy: Cell<bool>,
    }

    impl RecordSource for FlakySource {
        fn get_all(&self) -> Result<Vec<Record>, SourceError> {
            if self.healthy.get() {
                Ok(records())
            } else {
                Err(SourceError::unavailable("connection refused"))
            }
        }
    }

    fn loaded() -> DashboardState {
        let mut state = DashboardState::new(AggregateOptions::default());
        state.load(&Dataset::from_records(records()));
        state
    }

    #[test]
    fn load_computes_views_for_all_records() {
        let state = loaded();
        assert_eq!(state.status_message, None);
        assert_eq!(state.views().summary.total, 3);
        assert_eq!(state.views().sector_intensity[0].sector, "IT");
        assert_eq!(state.visible_records().len(), 3);
    }

    #[test]
    fn filter_changes_recompute_from_scratch() {
        let mut state = loaded();
        state.set_filter(FilterKey::Region, "asia");
        assert_eq!(state.views().summary.total, 2);
        assert_eq!(state.views().region_distribution.len(), 1);
        assert_eq!(state.views().region_distribution[0].percentage, "100.0");

        state.set_filter(FilterKey::Sector, "power");
        assert_eq!(state.criteria().get(FilterKey::Region), Some("asia"));
        assert_eq!(state.views().summary.total, 1);

        state.clear_filters();
        assert!(state.criteria().is_empty());
        assert_eq!(state.views().summary.total, 3);
    }

    #[test]
    fn empty_result_is_not_an_error() {
        let mut state = loaded();
        state.set_filter(FilterKey::Country, "Peru");
        assert_eq!(state.views(), &DashboardViews::default());
        assert_eq!(state.status_message, None);
    }

    #[test]
    fn failed_source_empties_views_until_retried() {
        let source = FlakySource {
            healthy: Cell::new(true),
        };
        let mut state = DashboardState::new(AggregateOptions::default());
        state.load(&source);
        assert_eq!(state.views().summary.total, 3);

        source.healthy.set(false);
        state.load(&source);
        assert!(state.dataset.is_none());
        assert_eq!(state.views(), &DashboardViews::default());
        let message = state.status_message.clone().unwrap();
        assert!(message.contains("connection refused"));

        source.healthy.set(true);
        state.load(&source);
        assert_eq!(state.status_message, None);
        assert_eq!(state.views().summary.total, 3);
    }

    #[test]
    fn stale_refresh_is_discarded() {
        let mut state = loaded();

        state.apply_criteria(FilterCriteria::default().with(FilterKey::Sector, "IT"));
        let stale = state.begin_refresh();
        let stale_views = stale.compute(state.dataset.as_ref(), state.options());

        state.apply_criteria(FilterCriteria::default().with(FilterKey::Sector, "Power"));
        assert!(!state.finish_refresh(stale, stale_views));
        assert_eq!(state.views().summary.total, 2);
        assert_eq!(state.views().sector_intensity[0].sector, "Power");
    }

    #[test]
    fn latest_refresh_wins_when_finished_out_of_order() {
        let mut state = loaded();

        state.criteria = FilterCriteria::default().with(FilterKey::Region, "Europe");
        let first = state.begin_refresh();
        state.criteria = FilterCriteria::default().with(FilterKey::Region, "Asia");
        let second = state.begin_refresh();

        let second_views = second.compute(state.dataset.as_ref(), state.options());
        let first_views = first.compute(state.dataset.as_ref(), state.options());
        assert!(state.finish_refresh(second, second_views));
        assert!(!state.finish_refresh(first, first_views));
        assert_eq!(state.views().summary.total, 2);
    }

    #[test]
    fn snapshot_serializes_criteria_status_and_views() {
        let mut state = loaded();
        state.set_filter(FilterKey::Sector, "IT");
        let value = serde_json::to_value(state.snapshot()).unwrap();
        assert_eq!(value["criteria"], serde_json::json!({ "sector": "IT" }));
        assert_eq!(value["views"]["summary"]["total"], 1);
        assert!(value.get("status").is_none());
    }

    #[test]
    fn filter_options_come_from_the_dataset() {
        let state = loaded();
        let options = state.filter_options();
        assert_eq!(options[&FilterKey::Sector].len(), 2);
        assert!(DashboardState::default().filter_options().is_empty());
    }
}
