//! Column-oriented row batches

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::value::Value;

/// Errors raised when a row batch would become malformed
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FrameError {
    #[error("Column '{column}' has {len} values, expected {expected}")]
    RaggedColumn {
        column: String,
        len: usize,
        expected: usize,
    },

    #[error("Row {row} has {len} values, expected {expected}")]
    RaggedRow {
        row: usize,
        len: usize,
        expected: usize,
    },

    #[error("Column '{0}' not found")]
    ColumnNotFound(String),

    #[error("Column index {0} out of range")]
    IndexOutOfRange(usize),

    #[error("Cannot order {columns} columns by {names} names")]
    ColumnCount { columns: usize, names: usize },

    #[error("Cannot append frame with columns {found:?} to frame with columns {expected:?}")]
    ColumnMismatch {
        expected: Vec<String>,
        found: Vec<String>,
    },
}

/// A named column of values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    /// Column name as observed in the source
    pub name: String,
    /// Column values, one per row
    pub values: Vec<Value>,
}

impl Column {
    /// Create a new column
    pub fn new(name: impl Into<String>, values: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }
}

/// A batch of rows stored column by column
///
/// All columns hold the same number of values. A frame with no columns has
/// zero rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataFrame {
    columns: Vec<Column>,
}

impl DataFrame {
    /// Create an empty frame with the given column names
    pub fn empty(names: &[String]) -> Self {
        Self {
            columns: names.iter().map(|n| Column::new(n.clone(), Vec::new())).collect(),
        }
    }

    /// Build a frame from columns, checking they have equal lengths
    pub fn from_columns(columns: Vec<Column>) -> Result<Self, FrameError> {
        if let Some(first) = columns.first() {
            let expected = first.values.len();
            if let Some(bad) = columns.iter().find(|c| c.values.len() != expected) {
                return Err(FrameError::RaggedColumn {
                    column: bad.name.clone(),
                    len: bad.values.len(),
                    expected,
                });
            }
        }
        Ok(Self { columns })
    }

    /// Build a frame from row-oriented data
    pub fn from_rows(names: &[String], rows: Vec<Vec<Value>>) -> Result<Self, FrameError> {
        let mut columns: Vec<Column> = names
            .iter()
            .map(|n| Column::new(n.clone(), Vec::with_capacity(rows.len())))
            .collect();
        for (index, row) in rows.into_iter().enumerate() {
            if row.len() != names.len() {
                return Err(FrameError::RaggedRow {
                    row: index,
                    len: row.len(),
                    expected: names.len(),
                });
            }
            for (column, value) in columns.iter_mut().zip(row) {
                column.values.push(value);
            }
        }
        Ok(Self { columns })
    }

    /// Number of rows
    pub fn num_rows(&self) -> usize {
        self.columns.first().map(|c| c.values.len()).unwrap_or(0)
    }

    /// Number of columns
    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    /// Check if the frame holds no rows
    pub fn is_empty(&self) -> bool {
        self.num_rows() == 0
    }

    /// Column names in frame order
    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    /// All columns
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Look up a column by exact name
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Position of a column by exact name
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Replace the values of the column at `index`
    pub fn set_column_values(&mut self, index: usize, values: Vec<Value>) -> Result<(), FrameError> {
        let expected = self.num_rows();
        let column = self
            .columns
            .get_mut(index)
            .ok_or(FrameError::IndexOutOfRange(index))?;
        if values.len() != expected {
            return Err(FrameError::RaggedColumn {
                column: column.name.clone(),
                len: values.len(),
                expected,
            });
        }
        column.values = values;
        Ok(())
    }

    /// Rewrite the values of the column at `index` in one pass
    ///
    /// `f` must return one value per row.
    pub fn map_column_values<E>(
        &mut self,
        index: usize,
        f: impl FnOnce(&str, Vec<Value>) -> Result<Vec<Value>, E>,
    ) -> Result<(), E>
    where
        E: From<FrameError>,
    {
        let expected = self.num_rows();
        let column = self
            .columns
            .get_mut(index)
            .ok_or(FrameError::IndexOutOfRange(index))?;
        let values = f(&column.name, std::mem::take(&mut column.values))?;
        if values.len() != expected {
            return Err(FrameError::RaggedColumn {
                column: column.name.clone(),
                len: values.len(),
                expected,
            }
            .into());
        }
        column.values = values;
        Ok(())
    }

    /// Rename every column with the given function
    pub fn rename_columns(&mut self, f: impl Fn(&str) -> String) {
        for column in &mut self.columns {
            column.name = f(&column.name);
        }
    }

    /// Put columns in the given order; `names` must list every column once
    pub fn reorder_columns(&mut self, names: &[String]) -> Result<(), FrameError> {
        if names.len() != self.columns.len() {
            return Err(FrameError::ColumnCount {
                columns: self.columns.len(),
                names: names.len(),
            });
        }
        let mut remaining = std::mem::take(&mut self.columns);
        for name in names {
            match remaining.iter().position(|c| &c.name == name) {
                Some(index) => self.columns.push(remaining.swap_remove(index)),
                None => {
                    self.columns.append(&mut remaining);
                    return Err(FrameError::ColumnNotFound(name.clone()));
                }
            }
        }
        Ok(())
    }

    /// A single row as owned values
    pub fn row(&self, index: usize) -> Option<Vec<Value>> {
        if index >= self.num_rows() {
            return None;
        }
        Some(self.columns.iter().map(|c| c.values[index].clone()).collect())
    }

    /// Iterate over rows as owned values
    pub fn rows(&self) -> impl Iterator<Item = Vec<Value>> + '_ {
        (0..self.num_rows()).map(move |i| self.columns.iter().map(|c| c.values[i].clone()).collect())
    }

    /// Append the rows of `other`, which must have the same columns in the same order
    pub fn append(&mut self, other: DataFrame) -> Result<(), FrameError> {
        if self.columns.is_empty() {
            self.columns = other.columns;
            return Ok(());
        }
        if self.column_names() != other.column_names() {
            return Err(FrameError::ColumnMismatch {
                expected: self.column_names(),
                found: other.column_names(),
            });
        }
        for (mine, theirs) in self.columns.iter_mut().zip(other.columns) {
            mine.values.extend(theirs.values);
        }
        Ok(())
    }

    /// Copy a contiguous range of rows
    pub fn slice_rows(&self, start: usize, len: usize) -> DataFrame {
        let end = (start + len).min(self.num_rows());
        let start = start.min(end);
        DataFrame {
            columns: self
                .columns
                .iter()
                .map(|c| Column::new(c.name.clone(), c.values[start..end].to_vec()))
                .collect(),
        }
    }

    /// Copy the rows at the given positions, in order
    pub fn take_rows(&self, indices: &[usize]) -> DataFrame {
        DataFrame {
            columns: self
                .columns
                .iter()
                .map(|c| {
                    Column::new(
                        c.name.clone(),
                        indices.iter().filter_map(|&i| c.values.get(i).cloned()).collect(),
                    )
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(n: &[&str]) -> Vec<String> {
        n.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_from_rows_rejects_ragged_input() {
        let err = DataFrame::from_rows(
            &names(&["A", "B"]),
            vec![vec![Value::from("x"), Value::from("y")], vec![Value::from("z")]],
        )
        .unwrap_err();
        assert_eq!(
            err,
            FrameError::RaggedRow {
                row: 1,
                len: 1,
                expected: 2
            }
        );
    }

    #[test]
    fn test_append_requires_same_columns() {
        let mut a = DataFrame::from_rows(&names(&["A"]), vec![vec![Value::Integer(1)]]).unwrap();
        let b = DataFrame::from_rows(&names(&["A"]), vec![vec![Value::Integer(2)]]).unwrap();
        let c = DataFrame::from_rows(&names(&["B"]), vec![vec![Value::Integer(3)]]).unwrap();
        a.append(b).unwrap();
        assert_eq!(a.num_rows(), 2);
        assert!(matches!(a.append(c), Err(FrameError::ColumnMismatch { .. })));
    }

    #[test]
    fn test_map_first_column_keeps_row_count() {
        let mut frame = DataFrame::from_rows(
            &names(&["A", "B"]),
            vec![
                vec![Value::Integer(1), Value::from("x")],
                vec![Value::Integer(2), Value::from("y")],
            ],
        )
        .unwrap();
        frame
            .map_column_values::<FrameError>(0, |name, values| {
                assert_eq!(name, "A");
                Ok(values.into_iter().map(|v| Value::Text(v.to_string())).collect())
            })
            .unwrap();
        assert_eq!(
            frame.column("A").unwrap().values,
            vec![Value::from("1"), Value::from("2")]
        );
        frame.set_column_values(0, vec![Value::Null, Value::Null]).unwrap();
        assert_eq!(frame.num_rows(), 2);

        let err = frame
            .map_column_values::<FrameError>(1, |_, _| Ok(vec![Value::Null]))
            .unwrap_err();
        assert!(matches!(err, FrameError::RaggedColumn { len: 1, expected: 2, .. }));
        assert!(frame.set_column_values(5, vec![]).is_err());
    }

    #[test]
    fn test_reorder_columns() {
        let mut frame = DataFrame::from_rows(
            &names(&["B", "A"]),
            vec![vec![Value::Integer(2), Value::Integer(1)]],
        )
        .unwrap();
        frame.reorder_columns(&names(&["A", "B"])).unwrap();
        assert_eq!(frame.column_names(), names(&["A", "B"]));
        assert_eq!(frame.row(0).unwrap(), vec![Value::Integer(1), Value::Integer(2)]);
        assert!(frame.reorder_columns(&names(&["A", "C"])).is_err());
        assert_eq!(frame.num_columns(), 2);
    }

    #[test]
    fn test_slice_and_take_rows() {
        let rows = (0..5).map(|i| vec![Value::Integer(i)]).collect();
        let frame = DataFrame::from_rows(&names(&["N"]), rows).unwrap();
        let slice = frame.slice_rows(3, 10);
        assert_eq!(slice.num_rows(), 2);
        let taken = frame.take_rows(&[4, 0]);
        assert_eq!(
            taken.column("N").unwrap().values,
            vec![Value::Integer(4), Value::Integer(0)]
        );
    }
}
