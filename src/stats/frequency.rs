//! Frequency Tables
//! Category counting, proportions and top-N filtering with an "Others" bucket.

use crate::config::ConfigError;
use crate::data::{DataProcessor, ProcessorError};
use log::debug;
use polars::prelude::Column;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Sort direction for frequency entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortOrder {
    Ascending,
    #[default]
    Descending,
}

/// Thresholds used by [`FrequencyTable::top_n`].
///
/// The defaults are fixed policy: entries with value <= total/20 are noise;
/// tables over 100 entries keep size/50, tables of 20 to 100 entries keep
/// size/10, smaller tables keep everything.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BucketPolicy {
    pub noise_divisor: usize,
    pub large_table: usize,
    pub large_divisor: usize,
    pub medium_table: usize,
    pub medium_divisor: usize,
    pub others_label: String,
}

impl Default for BucketPolicy {
    fn default() -> Self {
        Self {
            noise_divisor: 20,
            large_table: 100,
            large_divisor: 50,
            medium_table: 20,
            medium_divisor: 10,
            others_label: "Others".to_string(),
        }
    }
}

impl BucketPolicy {
    /// Number of entries kept when no explicit limit is given.
    ///
    /// A zero divisor keeps the whole table.
    pub fn default_limit(&self, table_size: usize) -> usize {
        let divisor = if table_size > self.large_table {
            self.large_divisor
        } else if table_size >= self.medium_table {
            self.medium_divisor
        } else {
            return table_size;
        };
        table_size.checked_div(divisor).unwrap_or(table_size)
    }

    /// Entries whose value is at or below this are discarded. A zero divisor
    /// disables the filter.
    pub fn noise_threshold(&self, total: f64) -> f64 {
        if self.noise_divisor == 0 {
            return 0.0;
        }
        total / self.noise_divisor as f64
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.noise_divisor == 0 || self.large_divisor == 0 || self.medium_divisor == 0 {
            return Err(ConfigError::Invalid("bucket divisors must be non-zero".into()));
        }
        if self.medium_table > self.large_table {
            return Err(ConfigError::Invalid(
                "medium_table must not exceed large_table".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrequencyEntry {
    pub label: String,
    pub value: f64,
    /// True for the synthetic "Others" bucket.
    pub others: bool,
}

/// Category label to count (or proportion), in a defined order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrequencyTable {
    entries: Vec<FrequencyEntry>,
}

impl FrequencyTable {
    /// Count labels in first-occurrence order. `None` values are skipped.
    pub fn from_labels<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = Option<S>>,
        S: AsRef<str>,
    {
        let mut index: HashMap<String, usize> = HashMap::new();
        let mut entries: Vec<FrequencyEntry> = Vec::new();

        for label in labels.into_iter().flatten() {
            let label = label.as_ref();
            match index.get(label) {
                Some(&i) => entries[i].value += 1.0,
                None => {
                    index.insert(label.to_string(), entries.len());
                    entries.push(FrequencyEntry {
                        label: label.to_string(),
                        value: 1.0,
                        others: false,
                    });
                }
            }
        }

        Self { entries }
    }

    pub fn from_entries(entries: Vec<FrequencyEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[FrequencyEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total(&self) -> f64 {
        self.entries.iter().map(|e| e.value).sum()
    }

    pub fn labels(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.label.clone()).collect()
    }

    pub fn values(&self) -> Vec<f64> {
        self.entries.iter().map(|e| e.value).collect()
    }

    pub fn get(&self, label: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|e| e.label == label && !e.others)
            .map(|e| e.value)
    }

    /// The synthetic "Others" entry, if present.
    pub fn others(&self) -> Option<&FrequencyEntry> {
        self.entries.iter().find(|e| e.others)
    }

    /// Every value divided by the table total. An all-zero table is returned as is.
    pub fn proportions(&self) -> Self {
        let total = self.total();
        if total == 0.0 {
            return self.clone();
        }
        let entries = self
            .entries
            .iter()
            .map(|e| FrequencyEntry {
                value: e.value / total,
                ..e.clone()
            })
            .collect();
        Self { entries }
    }

    /// Stable sort by value; equal values keep their current order.
    pub fn sorted(&self, order: SortOrder) -> Self {
        let mut entries = self.entries.clone();
        entries.sort_by(|a, b| {
            let ord = a
                .value
                .partial_cmp(&b.value)
                .unwrap_or(std::cmp::Ordering::Equal);
            match order {
                SortOrder::Ascending => ord,
                SortOrder::Descending => ord.reverse(),
            }
        });
        Self { entries }
    }

    /// Keep the leading `limit` entries above the noise threshold and fold the rest
    /// into a trailing "Others" entry.
    ///
    /// Without `limit` the count comes from [`BucketPolicy::default_limit`] applied to
    /// this table's size. "Others" holds `total - sum(retained)` and only appears when
    /// at least one entry was discarded.
    pub fn top_n(&self, limit: Option<usize>, order: SortOrder, policy: &BucketPolicy) -> Self {
        let size = self.entries.len();
        let total = self.total();
        let limit = limit.unwrap_or_else(|| policy.default_limit(size));
        let threshold = policy.noise_threshold(total);

        let mut retained: Vec<FrequencyEntry> = self
            .sorted(order)
            .entries
            .into_iter()
            .filter(|e| e.value > threshold)
            .collect();
        retained.truncate(limit);

        debug!(
            "top_n: {} of {} entries kept (limit {}, noise threshold {:.3})",
            retained.len(),
            size,
            limit,
            threshold
        );

        if retained.len() < size {
            let kept: f64 = retained.iter().map(|e| e.value).sum();
            retained.push(FrequencyEntry {
                label: policy.others_label.clone(),
                value: total - kept,
                others: true,
            });
        }

        Self { entries: retained }
    }
}

/// Count the distinct values of a column. Nulls are not counted.
pub fn count_categories(column: &Column) -> Result<FrequencyTable, ProcessorError> {
    let labels = DataProcessor::categorical_values(column)?;
    let table = FrequencyTable::from_labels(labels);
    debug!(
        "Column '{}': {} categories over {} values",
        column.name(),
        table.len(),
        table.total()
    );
    Ok(table)
}
