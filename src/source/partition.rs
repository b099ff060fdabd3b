//! Partitioning rows across the locations of a sink

use std::collections::BTreeMap;

use super::error::SourceError;
use crate::models::{DataFrame, Value};

/// How rows are spread over a sink's locations
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Partitioning {
    /// Contiguous, near-even blocks by row position
    #[default]
    Even,
    /// One location per distinct value of a variable
    ///
    /// Without an explicit assignment, the sorted distinct values map to the
    /// locations in order, and their count must equal the location count.
    ByVariable {
        variable: String,
        assignment: Option<Vec<(Value, usize)>>,
    },
}

impl Partitioning {
    /// Group by the distinct values of `variable`
    pub fn by_variable(variable: impl Into<String>) -> Self {
        Partitioning::ByVariable {
            variable: variable.into(),
            assignment: None,
        }
    }
}

/// Row indices for each of `targets` locations
///
/// Every row appears in exactly one partition.
pub fn partition_rows(
    frame: &DataFrame,
    targets: usize,
    partitioning: &Partitioning,
) -> Result<Vec<Vec<usize>>, SourceError> {
    if targets == 0 {
        return Err(SourceError::Partition("no target locations".to_string()));
    }
    match partitioning {
        Partitioning::Even => Ok(even_partitions(frame.num_rows(), targets)),
        Partitioning::ByVariable {
            variable,
            assignment,
        } => {
            let column = frame.column(variable).ok_or_else(|| {
                SourceError::Partition(format!("grouping variable {} not found", variable))
            })?;
            match assignment {
                Some(assignment) => assigned_partitions(&column.values, targets, assignment),
                None => grouped_partitions(&column.values, targets),
            }
        }
    }
}

/// First `rows % targets` partitions take one extra row
fn even_partitions(rows: usize, targets: usize) -> Vec<Vec<usize>> {
    let base = rows / targets;
    let extra = rows % targets;
    let mut start = 0;
    (0..targets)
        .map(|i| {
            let len = base + usize::from(i < extra);
            let partition: Vec<usize> = (start..start + len).collect();
            start += len;
            partition
        })
        .collect()
}

fn grouped_partitions(values: &[Value], targets: usize) -> Result<Vec<Vec<usize>>, SourceError> {
    let mut groups: BTreeMap<String, Vec<usize>> = BTreeMap::new();
    for (row, value) in values.iter().enumerate() {
        groups.entry(value.group_key()).or_default().push(row);
    }
    if groups.len() != targets {
        return Err(SourceError::Partition(format!(
            "{} distinct group values for {} locations",
            groups.len(),
            targets
        )));
    }
    Ok(groups.into_values().collect())
}

fn assigned_partitions(
    values: &[Value],
    targets: usize,
    assignment: &[(Value, usize)],
) -> Result<Vec<Vec<usize>>, SourceError> {
    let lookup: BTreeMap<String, usize> = assignment
        .iter()
        .map(|(value, index)| (value.group_key(), *index))
        .collect();
    if let Some((value, index)) = assignment.iter().find(|(_, index)| *index >= targets) {
        return Err(SourceError::Partition(format!(
            "value {} assigned to location {} but there are only {}",
            value, index, targets
        )));
    }

    let mut partitions = vec![Vec::new(); targets];
    for (row, value) in values.iter().enumerate() {
        let index = lookup.get(&value.group_key()).ok_or_else(|| {
            SourceError::Partition(format!("no location assigned to value '{}'", value))
        })?;
        partitions[*index].push(row);
    }
    Ok(partitions)
}
