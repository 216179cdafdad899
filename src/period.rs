//! Current vs previous period aggregation
//!
//! The previous period is the run of months directly before the earliest
//! selected month, sized like the selection and clipped at the start of the
//! series. A three-month selection is compared against the three months
//! before it, not against a single prior month.

use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::{debug, instrument};

use crate::delta::{Delta, DeltaFlavor};
use crate::metrics::{MetricField, MetricTable};
use crate::month::MonthVocabulary;

/// Stable chronological sort; labels with equal keys keep their input order
pub fn chronological_order<S: AsRef<str>>(labels: &[S], vocab: &MonthVocabulary) -> Vec<String> {
    let mut keyed: Vec<_> = labels
        .iter()
        .map(|l| (vocab.sort_key(l.as_ref()), l.as_ref().to_string()))
        .collect();
    keyed.sort_by_key(|(key, _)| *key);
    keyed.into_iter().map(|(_, label)| label).collect()
}

/// Resolve the window preceding `selected` within `ordering`.
///
/// Labels missing from `ordering` are ignored; they can't anchor a window.
/// Returns the previous months in chronological order.
pub fn previous_period<S: AsRef<str>>(ordering: &[String], selected: &[S]) -> Vec<String> {
    let positions: HashMap<&str, usize> = ordering
        .iter()
        .enumerate()
        .map(|(i, label)| (label.as_str(), i))
        .collect();

    let resolved: HashSet<usize> = selected
        .iter()
        .filter_map(|s| positions.get(s.as_ref()).copied())
        .collect();

    let Some(&earliest) = resolved.iter().min() else {
        return Vec::new();
    };

    let start = earliest.saturating_sub(resolved.len());
    ordering[start..earliest].to_vec()
}

/// Summed value per field for one period
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FieldSums(BTreeMap<MetricField, f64>);

impl FieldSums {
    pub fn over(table: &MetricTable, months: &[String]) -> Self {
        Self(
            MetricField::ALL
                .into_iter()
                .map(|field| (field, table.sum(field, months)))
                .collect(),
        )
    }

    pub fn get(&self, field: MetricField) -> f64 {
        self.0.get(&field).copied().unwrap_or(0.0)
    }
}

/// Sums for a selected period and the period before it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodAggregate {
    pub current_months: Vec<String>,
    pub previous_months: Vec<String>,
    pub current: FieldSums,
    pub previous: FieldSums,
}

impl PeriodAggregate {
    pub fn current(&self, field: MetricField) -> f64 {
        self.current.get(field)
    }

    pub fn previous(&self, field: MetricField) -> f64 {
        self.previous.get(field)
    }

    pub fn delta(&self, field: MetricField) -> Delta {
        let previous = if self.previous_months.is_empty() {
            None
        } else {
            Some(self.previous(field))
        };
        Delta::compute(self.current(field), previous)
    }

    pub fn formatted_delta(&self, field: MetricField, flavor: DeltaFlavor) -> String {
        self.delta(field).format(flavor)
    }
}

/// Read-only view over a table with its months in chronological order
pub struct PeriodAggregator<'a> {
    table: &'a MetricTable,
    ordering: Vec<String>,
}

impl<'a> PeriodAggregator<'a> {
    pub fn new(table: &'a MetricTable, vocab: &MonthVocabulary) -> Self {
        let ordering = chronological_order(table.month_labels().as_slice(), vocab);
        Self { table, ordering }
    }

    /// Every known month, oldest first
    pub fn ordering(&self) -> &[String] {
        &self.ordering
    }

    pub fn latest_month(&self) -> Option<&str> {
        self.ordering.last().map(String::as_str)
    }

    #[instrument(skip(self, selection), fields(selected = selection.len()))]
    pub fn aggregate<S: AsRef<str>>(&self, selection: &[S]) -> PeriodAggregate {
        let wanted: HashSet<&str> = selection.iter().map(|s| s.as_ref()).collect();

        // Keep chronological order and drop labels the table doesn't know
        let current_months: Vec<String> = self
            .ordering
            .iter()
            .filter(|m| wanted.contains(m.as_str()))
            .cloned()
            .collect();

        if current_months.len() < wanted.len() {
            debug!(
                "Ignoring {} unknown month label(s) in selection",
                wanted.len() - current_months.len()
            );
        }

        let previous_months = previous_period(&self.ordering, current_months.as_slice());
        debug!(
            "Current period {:?}, previous period {:?}",
            current_months, previous_months
        );

        PeriodAggregate {
            current: FieldSums::over(self.table, &current_months),
            previous: FieldSums::over(self.table, &previous_months),
            current_months,
            previous_months,
        }
    }
}
