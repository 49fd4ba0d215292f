use serde::{Deserialize, Serialize};

use super::model::{FilterKey, Record};

// ---------------------------------------------------------------------------
// FilterCriteria – the one active set of filter panel selections
// ---------------------------------------------------------------------------

/// One optional value per filter key.
/// A key that is `None` or holds an empty string places no constraint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterCriteria {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_year: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sector: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pestle: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_year: Option<String>,
}

impl FilterCriteria {
    fn slot(&self, key: FilterKey) -> &Option<String> {
        match key {
            FilterKey::EndYear => &self.end_year,
            FilterKey::Topic => &self.topic,
            FilterKey::Sector => &self.sector,
            FilterKey::Region => &self.region,
            FilterKey::Pestle => &self.pestle,
            FilterKey::Source => &self.source,
            FilterKey::Country => &self.country,
            FilterKey::StartYear => &self.start_year,
        }
    }

    fn slot_mut(&mut self, key: FilterKey) -> &mut Option<String> {
        match key {
            FilterKey::EndYear => &mut self.end_year,
            FilterKey::Topic => &mut self.topic,
            FilterKey::Sector => &mut self.sector,
            FilterKey::Region => &mut self.region,
            FilterKey::Pestle => &mut self.pestle,
            FilterKey::Source => &mut self.source,
            FilterKey::Country => &mut self.country,
            FilterKey::StartYear => &mut self.start_year,
        }
    }

    /// The constraint on `key`, if it is active.
    pub fn get(&self, key: FilterKey) -> Option<&str> {
        self.slot(key).as_deref().filter(|v| !v.is_empty())
    }

    /// Set or clear the value for `key`. An empty value clears it.
    pub fn set(&mut self, key: FilterKey, value: impl Into<String>) {
        let value = value.into();
        *self.slot_mut(key) = (!value.is_empty()).then_some(value);
    }

    /// Builder form of [`FilterCriteria::set`].
    pub fn with(mut self, key: FilterKey, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    /// Active constraints in filter panel order.
    pub fn active(&self) -> impl Iterator<Item = (FilterKey, &str)> + '_ {
        FilterKey::ALL
            .into_iter()
            .filter_map(|key| self.get(key).map(|value| (key, value)))
    }

    /// Whether no key is constrained.
    pub fn is_empty(&self) -> bool {
        self.active().next().is_none()
    }
}

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

/// A criterion prepared for repeated evaluation: substring needles are
/// lowercased once instead of once per record.
struct Predicate {
    key: FilterKey,
    needle: String,
}

impl Predicate {
    fn compile(criteria: &FilterCriteria) -> Vec<Predicate> {
        criteria
            .active()
            .map(|(key, value)| Predicate {
                key,
                needle: if key.is_year() {
                    value.to_string()
                } else {
                    value.to_lowercase()
                },
            })
            .collect()
    }

    /// A record passes a predicate when:
    /// * the field is absent → fails
    /// * year key → the year text equals the needle exactly
    /// * other key → the lowercased field text contains the needle
    fn accepts(&self, record: &Record) -> bool {
        let Some(value) = self.key.field().text(record) else {
            return false;
        };
        if self.key.is_year() {
            value == self.needle.as_str()
        } else {
            value.to_lowercase().contains(&self.needle)
        }
    }
}

/// Whether `record` satisfies every active constraint in `criteria`.
pub fn matches(record: &Record, criteria: &FilterCriteria) -> bool {
    Predicate::compile(criteria)
        .iter()
        .all(|p| p.accepts(record))
}

/// Return the records that pass all active filters, in their original order.
pub fn filter_records<'a>(records: &'a [Record], criteria: &FilterCriteria) -> Vec<&'a Record> {
    let predicates = Predicate::compile(criteria);
    records
        .iter()
        .filter(|record| predicates.iter().all(|p| p.accepts(record)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::loader::records_from_json;
    use pretty_assertions::assert_eq;

    fn sample() -> Vec<Record> {
        vec![
            Record {
                topic: Some("Energy".into()),
                sector: Some("Power".into()),
                end_year: Some(2024),
                ..Record::default()
            },
            Record {
                topic: Some("Finance".into()),
                sector: Some("Banking".into()),
                end_year: Some(2025),
                ..Record::default()
            },
            Record {
                topic: Some("renewable energy".into()),
                start_year: Some(2025),
                ..Record::default()
            },
            Record::default(),
        ]
    }

    #[test]
    fn empty_criteria_is_identity() {
        let records = sample();
        let kept = filter_records(&records, &FilterCriteria::default());
        assert_eq!(kept, records.iter().collect::<Vec<_>>());

        let blank = FilterCriteria {
            topic: Some(String::new()),
            ..FilterCriteria::default()
        };
        assert!(blank.is_empty());
        assert_eq!(filter_records(&records, &blank).len(), records.len());
    }

    #[test]
    fn year_keys_are_exact_matches() {
        let records = sample();
        let criteria = FilterCriteria::default().with(FilterKey::EndYear, "2025");
        let kept = filter_records(&records, &criteria);
        assert_eq!(kept, vec![&records[1]]);

        let partial = FilterCriteria::default().with(FilterKey::EndYear, "202");
        assert!(filter_records(&records, &partial).is_empty());
    }

    #[test]
    fn year_given_as_text_matches_like_a_number() {
        let records = records_from_json(&serde_json::json!([
            { "end_year": "2025", "topic": "oil" },
            { "end_year": 2024, "topic": "gas" },
            { "end_year": 2025, "topic": "gas" },
        ]))
        .unwrap();
        let criteria = FilterCriteria::default().with(FilterKey::EndYear, "2025");
        let topics: Vec<_> = filter_records(&records, &criteria)
            .into_iter()
            .map(|r| r.topic.as_deref())
            .collect();
        assert_eq!(topics, vec![Some("oil"), Some("gas")]);
    }

    #[test]
    fn text_keys_are_case_insensitive_substrings() {
        let records = sample();
        let criteria = FilterCriteria::default().with(FilterKey::Topic, "ENE");
        let kept = filter_records(&records, &criteria);
        assert_eq!(kept, vec![&records[0], &records[2]]);
        assert!(!matches(&records[1], &criteria));
    }

    #[test]
    fn absent_field_fails_an_active_criterion() {
        let records = sample();
        let criteria = FilterCriteria::default().with(FilterKey::Sector, "o");
        let kept = filter_records(&records, &criteria);
        assert_eq!(kept, vec![&records[0]]);
    }

    #[test]
    fn all_active_criteria_must_hold() {
        let records = sample();
        let criteria = FilterCriteria::default()
            .with(FilterKey::Topic, "energy")
            .with(FilterKey::StartYear, "2025");
        assert_eq!(filter_records(&records, &criteria), vec![&records[2]]);
    }

    #[test]
    fn set_with_empty_value_clears_the_key() {
        let mut criteria = FilterCriteria::default().with(FilterKey::Region, "Asia");
        assert_eq!(criteria.get(FilterKey::Region), Some("Asia"));
        criteria.set(FilterKey::Region, "");
        assert_eq!(criteria, FilterCriteria::default());
    }
}
