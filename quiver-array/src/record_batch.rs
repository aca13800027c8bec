// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! [`RecordBatch`]: equal-length columns paired with a [`Schema`]

use std::sync::Arc;

use quiver_schema::{Field, QuiverError, Schema, SchemaRef};

use crate::{new_empty_array, Array, ArrayRef, StructArray};

/// A sink of [`RecordBatch`]es sharing one schema
pub trait RecordBatchWriter {
    /// Append `batch`
    fn write(&mut self, batch: &RecordBatch) -> Result<(), QuiverError>;

    /// Write any trailer and consume the writer
    fn close(self) -> Result<(), QuiverError>;
}

/// A set of columns of equal length, described by a [`Schema`]
///
/// This is the unit the IPC stream reader yields and the stream writer accepts.
/// The row count is stored alongside the columns so that a batch without columns
/// still has one.
///
/// ```
/// # use std::sync::Arc;
/// # use quiver_array::{ArrayRef, Int32Array, RecordBatch, StringArray};
/// let batch = RecordBatch::try_from_iter([
///     ("id", Arc::new(Int32Array::from(vec![1, 2, 3])) as ArrayRef),
///     ("tag", Arc::new(StringArray::from(vec![Some("a"), None, Some("c")])) as ArrayRef),
/// ])
/// .unwrap();
///
/// assert_eq!(batch.num_rows(), 3);
/// assert!(!batch.schema().field(0).is_nullable());
/// assert!(batch.schema().field(1).is_nullable());
/// assert_eq!(batch.slice(1, 2).column(0).len(), 2);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct RecordBatch {
    schema: SchemaRef,
    columns: Vec<ArrayRef>,
    row_count: usize,
}

impl RecordBatch {
    /// Pair `columns` with `schema`, taking the row count from the first column
    ///
    /// Fails with [`QuiverError::InvalidArgument`] when there are no columns, when the
    /// column count, a column type or a column length disagrees, or when a
    /// non-nullable field holds nulls.
    pub fn try_new(schema: SchemaRef, columns: Vec<ArrayRef>) -> Result<Self, QuiverError> {
        Self::try_new_with_options(schema, columns, &RecordBatchOptions::default())
    }

    /// As [`Self::try_new`], with an explicit row count allowing zero columns
    pub fn try_new_with_options(
        schema: SchemaRef,
        columns: Vec<ArrayRef>,
        options: &RecordBatchOptions,
    ) -> Result<Self, QuiverError> {
        let fields = schema.fields();
        if fields.len() != columns.len() {
            return Err(QuiverError::InvalidArgument(format!(
                "schema has {} fields but {} columns were given",
                fields.len(),
                columns.len(),
            )));
        }

        let Some(row_count) = options.row_count.or_else(|| columns.first().map(|c| c.len()))
        else {
            return Err(QuiverError::InvalidArgument(
                "a batch without columns needs an explicit row count".to_string(),
            ));
        };

        for (idx, (column, field)) in columns.iter().zip(fields.iter()).enumerate() {
            if column.data_type() != field.data_type() {
                return Err(QuiverError::InvalidArgument(format!(
                    "column {idx} has type {} but field {:?} is {}",
                    column.data_type(),
                    field.name(),
                    field.data_type()
                )));
            }
            if column.len() != row_count {
                return Err(QuiverError::InvalidArgument(format!(
                    "column {idx} has {} rows, expected {row_count}",
                    column.len()
                )));
            }
            if !field.is_nullable() && column.null_count() > 0 {
                return Err(QuiverError::InvalidArgument(format!(
                    "non-nullable column {:?} contains nulls",
                    field.name()
                )));
            }
        }

        Ok(Self {
            schema,
            columns,
            row_count,
        })
    }

    /// A batch of zero rows with an empty column per field
    pub fn new_empty(schema: SchemaRef) -> Self {
        let columns = schema
            .fields()
            .iter()
            .map(|f| new_empty_array(f.data_type()))
            .collect();
        Self {
            schema,
            columns,
            row_count: 0,
        }
    }

    /// Build a batch from `(name, column)` pairs
    ///
    /// A field is nullable exactly when its column contains a null.
    pub fn try_from_iter<I, F>(value: I) -> Result<Self, QuiverError>
    where
        I: IntoIterator<Item = (F, ArrayRef)>,
        F: AsRef<str>,
    {
        let (fields, columns): (Vec<_>, Vec<_>) = value
            .into_iter()
            .map(|(name, column)| {
                let nullable = column.null_count() > 0;
                (Field::new(name.as_ref(), column.data_type().clone(), nullable), column)
            })
            .unzip();
        Self::try_new(Arc::new(Schema::new(fields)), columns)
    }

    /// Shared handle to the schema
    pub fn schema(&self) -> SchemaRef {
        Arc::clone(&self.schema)
    }

    /// Borrow the schema
    pub fn schema_ref(&self) -> &SchemaRef {
        &self.schema
    }

    /// Number of columns
    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    /// Number of rows
    pub fn num_rows(&self) -> usize {
        self.row_count
    }

    /// The column at `index`
    ///
    /// # Panics
    ///
    /// Panics if `index >= self.num_columns()`
    pub fn column(&self, index: usize) -> &ArrayRef {
        &self.columns[index]
    }

    /// The column whose field is called `name`
    pub fn column_by_name(&self, name: &str) -> Option<&ArrayRef> {
        let index = self.schema.index_of(name).ok()?;
        self.columns.get(index)
    }

    /// All columns, in schema order
    pub fn columns(&self) -> &[ArrayRef] {
        &self.columns
    }

    /// A batch of the columns at `indices`, in that order
    pub fn project(&self, indices: &[usize]) -> Result<Self, QuiverError> {
        let schema = self.schema.project(indices)?;
        let columns = indices
            .iter()
            .map(|&i| self.columns[i].clone())
            .collect();
        Self::try_new_with_options(
            Arc::new(schema),
            columns,
            &RecordBatchOptions::new().with_row_count(Some(self.row_count)),
        )
    }

    /// Zero-copy view of `length` rows starting at `offset`
    ///
    /// # Panics
    ///
    /// Panics if `offset + length > self.num_rows()`
    pub fn slice(&self, offset: usize, length: usize) -> Self {
        assert!(
            offset + length <= self.row_count,
            "cannot slice {length} rows at offset {offset} from a batch of {} rows",
            self.row_count
        );
        Self {
            schema: Arc::clone(&self.schema),
            columns: self.columns.iter().map(|c| c.slice(offset, length)).collect(),
            row_count: length,
        }
    }
}

/// Settings for [`RecordBatch::try_new_with_options`]
#[derive(Debug, Clone, Default)]
#[non_exhaustive]
pub struct RecordBatchOptions {
    /// Row count to use instead of the first column's length
    pub row_count: Option<usize>,
}

impl RecordBatchOptions {
    /// Options with no explicit row count
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the explicit row count
    pub fn with_row_count(mut self, row_count: Option<usize>) -> Self {
        self.row_count = row_count;
        self
    }
}

impl From<StructArray> for RecordBatch {
    fn from(array: StructArray) -> Self {
        Self {
            schema: Arc::new(Schema::new(array.fields().clone())),
            columns: array.columns().to_vec(),
            row_count: array.len(),
        }
    }
}

impl From<&RecordBatch> for StructArray {
    fn from(batch: &RecordBatch) -> Self {
        let fields = batch.schema.fields().clone();
        Self::new(fields, batch.columns.clone(), None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cast::AsArray;
    use crate::types::Int64Type;
    use crate::{BooleanArray, Int32Array, Int64Array, StringArray};
    use quiver_schema::DataType;

    fn sample() -> RecordBatch {
        RecordBatch::try_from_iter([
            ("n", Arc::new(Int64Array::from(vec![10, 20, 30, 40])) as ArrayRef),
            (
                "s",
                Arc::new(StringArray::from(vec![Some("w"), Some("x"), None, Some("z")])) as ArrayRef,
            ),
            ("b", Arc::new(BooleanArray::from(vec![true, true, false, true])) as ArrayRef),
        ])
        .unwrap()
    }

    #[test]
    fn test_try_from_iter_infers_nullability() {
        let batch = sample();
        assert_eq!(batch.num_rows(), 4);
        assert_eq!(batch.num_columns(), 3);
        let nullable: Vec<_> = batch.schema().fields().iter().map(|f| f.is_nullable()).collect();
        assert_eq!(nullable, vec![false, true, false]);
        assert_eq!(batch.schema_ref().field(1).data_type(), &DataType::Utf8);
    }

    #[test]
    fn test_slice() {
        let sliced = sample().slice(1, 2);
        assert_eq!(sliced.num_rows(), 2);
        assert_eq!(sliced.schema(), sample().schema());
        assert_eq!(sliced.column(0).as_primitive::<Int64Type>().values(), &[20, 30]);
        assert!(sliced.column(1).is_null(1));

        let empty = sample().slice(4, 0);
        assert_eq!(empty.num_rows(), 0);
        assert!(empty.columns().iter().all(|c| c.is_empty()));
    }

    #[test]
    #[should_panic(expected = "cannot slice 2 rows at offset 3 from a batch of 4 rows")]
    fn test_slice_out_of_bounds() {
        sample().slice(3, 2);
    }

    #[test]
    fn test_validation_errors() {
        let schema = Arc::new(Schema::new(vec![
            Field::new("a", DataType::Int32, false),
            Field::new("b", DataType::Int32, true),
        ]));
        let short: ArrayRef = Arc::new(Int32Array::from(vec![1]));
        let long: ArrayRef = Arc::new(Int32Array::from(vec![1, 2]));
        let text: ArrayRef = Arc::new(StringArray::from(vec!["x", "y"]));
        let nulls: ArrayRef = Arc::new(Int32Array::from(vec![None, Some(1)]));

        let cases = [
            (vec![long.clone()], "2 fields but 1 columns"),
            (vec![long.clone(), text], "column 1 has type Utf8"),
            (vec![long.clone(), short], "column 1 has 1 rows, expected 2"),
            (vec![nulls, long], "non-nullable column \"a\" contains nulls"),
        ];
        for (columns, expected) in cases {
            let err = RecordBatch::try_new(schema.clone(), columns).unwrap_err();
            assert!(err.to_string().contains(expected), "{err}");
        }
    }

    #[test]
    fn test_zero_columns() {
        let schema = Arc::new(Schema::empty());
        let err = RecordBatch::try_new(schema.clone(), vec![]).unwrap_err();
        assert!(err.to_string().contains("explicit row count"), "{err}");

        let options = RecordBatchOptions::new().with_row_count(Some(7));
        let batch = RecordBatch::try_new_with_options(schema, vec![], &options).unwrap();
        assert_eq!(batch.num_rows(), 7);
        assert_eq!(batch.num_columns(), 0);
    }

    #[test]
    fn test_new_empty() {
        let batch = RecordBatch::new_empty(sample().schema());
        assert_eq!(batch.num_rows(), 0);
        assert_eq!(batch.num_columns(), 3);
        assert_eq!(batch.column(1).data_type(), &DataType::Utf8);
    }

    #[test]
    fn test_project_and_lookup() {
        let batch = sample();
        let projected = batch.project(&[2, 0]).unwrap();
        assert_eq!(projected.schema().field(0).name(), "b");
        assert_eq!(projected.num_rows(), 4);
        assert!(projected.column_by_name("b").unwrap().as_boolean().value(0));
        assert!(projected.column_by_name("s").is_none());
        assert!(batch.column_by_name("s").is_some());
    }

    #[test]
    fn test_struct_conversion() {
        let batch = sample();
        let array = StructArray::from(&batch);
        assert_eq!(array.len(), 4);
        assert_eq!(array.column_names(), vec!["n", "s", "b"]);
        assert_eq!(RecordBatch::from(array), batch);
    }
}
