use std::borrow::Borrow;
use std::collections::BTreeMap;

use crate::data::model::Record;

// ---------------------------------------------------------------------------
// Metric – a numeric score summed per group
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    Intensity,
    Relevance,
    Likelihood,
}

impl Metric {
    pub fn of(self, record: &Record) -> f64 {
        match self {
            Metric::Intensity => record.intensity,
            Metric::Relevance => record.relevance,
            Metric::Likelihood => record.likelihood,
        }
    }
}

/// Round to two decimals, halves away from zero.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Round to one decimal, halves away from zero.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Arithmetic mean rounded with [`round2`]; zero when `count` is zero.
pub fn mean(sum: f64, count: usize) -> f64 {
    if count == 0 {
        0.0
    } else {
        round2(sum / count as f64)
    }
}

// ---------------------------------------------------------------------------
// Group – running count and per-metric sums of one partition
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Group<const N: usize> {
    pub count: usize,
    sums: [f64; N],
}

impl<const N: usize> Default for Group<N> {
    fn default() -> Self {
        Group {
            count: 0,
            sums: [0.0; N],
        }
    }
}

impl<const N: usize> Group<N> {
    /// Rounded mean of the `i`-th metric passed to [`group_by`].
    pub fn mean(&self, i: usize) -> f64 {
        mean(self.sums[i], self.count)
    }
}

/// Partition `records` by `key`, counting members and summing `metrics`.
///
/// Records whose key is `None` join no group. Groups come back in key order.
pub fn group_by<'a, R, K, F, const N: usize>(
    records: &'a [R],
    key: F,
    metrics: [Metric; N],
) -> BTreeMap<K, Group<N>>
where
    R: Borrow<Record>,
    K: Ord,
    F: Fn(&'a Record) -> Option<K>,
{
    let mut groups: BTreeMap<K, Group<N>> = BTreeMap::new();
    for record in records {
        let record: &'a Record = record.borrow();
        let Some(k) = key(record) else {
            continue;
        };
        let group = groups.entry(k).or_default();
        group.count += 1;
        for (sum, metric) in group.sums.iter_mut().zip(metrics) {
            *sum += metric.of(record);
        }
    }
    groups
}
