//! Distinct-value histograms

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::error::SourceError;
use crate::models::{DataFrame, Value};

/// Histogram of one variable
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UniqueValues {
    /// Distinct non-missing values with their row counts, in value order
    pub counts: Vec<(Value, u64)>,
    /// Rows where the variable is missing
    pub missing: u64,
}

impl UniqueValues {
    /// Rows covered by the histogram, missing included
    pub fn total(&self) -> u64 {
        self.counts.iter().map(|(_, n)| n).sum::<u64>() + self.missing
    }

    /// Number of distinct non-missing values
    pub fn distinct(&self) -> usize {
        self.counts.len()
    }
}

/// Accumulates histograms for many variables across chunks and locations
#[derive(Debug, Default)]
pub(crate) struct HistogramSet {
    variables: BTreeMap<String, Histogram>,
}

#[derive(Debug, Default)]
struct Histogram {
    counts: BTreeMap<String, (Value, u64)>,
    missing: u64,
}

impl Histogram {
    fn add(&mut self, value: Value, count: u64) {
        if value.is_null() {
            self.missing += count;
            return;
        }
        self.counts
            .entry(value.group_key())
            .and_modify(|(_, n)| *n += count)
            .or_insert((value, count));
    }
}

impl HistogramSet {
    /// Register a variable so it appears even with no rows
    pub(crate) fn declare(&mut self, variable: &str) {
        self.variables.entry(variable.to_string()).or_default();
    }

    /// Count `count` occurrences of `value`
    pub(crate) fn add(&mut self, variable: &str, value: Value, count: u64) {
        self.variables
            .entry(variable.to_string())
            .or_default()
            .add(value, count);
    }

    /// Count every cell of a chunk
    pub(crate) fn add_frame(&mut self, frame: &DataFrame) {
        for column in frame.columns() {
            for value in &column.values {
                self.add(&column.name, value.clone(), 1);
            }
        }
    }

    /// Finished histograms, checked against the declared row count
    pub(crate) fn finish(
        self,
        expected_rows: Option<u64>,
    ) -> Result<BTreeMap<String, UniqueValues>, SourceError> {
        let uniques: BTreeMap<String, UniqueValues> = self
            .variables
            .into_iter()
            .map(|(name, histogram)| {
                let values = UniqueValues {
                    counts: histogram.counts.into_values().collect(),
                    missing: histogram.missing,
                };
                (name, values)
            })
            .collect();
        if let Some(expected) = expected_rows {
            for (variable, values) in &uniques {
                let actual = values.total();
                if actual != expected {
                    return Err(SourceError::Consistency {
                        variable: variable.clone(),
                        expected,
                        actual,
                    });
                }
            }
        }
        Ok(uniques)
    }
}
