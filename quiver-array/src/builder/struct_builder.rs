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

use quiver_buffer::{NullBuffer, NullBufferBuilder};
use quiver_data::ArrayData;
use quiver_schema::{DataType, Fields};

use crate::builder::{make_builder, ArrayBuilder};
use crate::{Array, StructArray};

/// Builds a [`StructArray`] from one child builder per field
///
/// Children are filled through [`StructBuilder::field_builder`], then each row is
/// closed with [`StructBuilder::append`]. Every child must hold exactly one value per
/// row by the time the builder is finished, nulls included.
///
/// ```
/// # use quiver_array::builder::{Float64Builder, StringBuilder, StructBuilder};
/// # use quiver_array::{Array, cast::AsArray, types::Float64Type};
/// # use quiver_schema::{DataType, Field, Fields};
/// let fields = Fields::from(vec![
///     Field::new("city", DataType::Utf8, false),
///     Field::new("temp", DataType::Float64, true),
/// ]);
/// let mut readings = StructBuilder::from_fields(fields, 2);
///
/// readings.field_builder::<StringBuilder>(0).unwrap().append_value("Oslo");
/// readings.field_builder::<Float64Builder>(1).unwrap().append_value(-3.5);
/// readings.append(true);
///
/// readings.field_builder::<StringBuilder>(0).unwrap().append_value("");
/// readings.field_builder::<Float64Builder>(1).unwrap().append_null();
/// readings.append_null();
///
/// let readings = readings.finish();
/// assert_eq!(readings.null_count(), 1);
/// assert_eq!(readings.column(1).as_primitive::<Float64Type>().value(0), -3.5);
/// ```
pub struct StructBuilder {
    fields: Fields,
    columns: Vec<Box<dyn ArrayBuilder>>,
    validity: NullBufferBuilder,
}

impl std::fmt::Debug for StructBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StructBuilder")
            .field("fields", &self.fields)
            .field("rows", &self.validity.len())
            .finish_non_exhaustive()
    }
}

forward_array_builder!(StructBuilder, |b| b.validity.len());

impl StructBuilder {
    /// Create a builder over the given child builders, one per entry of `fields`
    ///
    /// # Panics
    ///
    /// Panics if the number of builders differs from the number of fields
    pub fn new(fields: impl Into<Fields>, columns: Vec<Box<dyn ArrayBuilder>>) -> Self {
        let fields = fields.into();
        assert_eq!(
            fields.len(),
            columns.len(),
            "StructBuilder needs one child builder per field"
        );
        Self {
            fields,
            columns,
            validity: NullBufferBuilder::new(0),
        }
    }

    /// Create a builder whose children come from [`make_builder`]
    pub fn from_fields(fields: impl Into<Fields>, capacity: usize) -> Self {
        let fields = fields.into();
        let columns = fields
            .iter()
            .map(|f| make_builder(f.data_type(), capacity))
            .collect();
        Self::new(fields, columns)
    }

    /// The child builder for field `i`, or `None` if `i` is out of range or the
    /// builder is not a `T`
    pub fn field_builder<T: ArrayBuilder>(&mut self, i: usize) -> Option<&mut T> {
        self.columns.get_mut(i)?.as_any_mut().downcast_mut()
    }

    /// All child builders, in field order
    pub fn field_builders(&self) -> &[Box<dyn ArrayBuilder>] {
        &self.columns
    }

    /// Number of child builders
    pub fn num_fields(&self) -> usize {
        self.columns.len()
    }

    /// Close the current row, valid or not
    #[inline]
    pub fn append(&mut self, is_valid: bool) {
        self.validity.append(is_valid);
    }

    /// Close the current row as null
    ///
    /// The children still need a value for this row.
    #[inline]
    pub fn append_null(&mut self) {
        self.validity.append_null();
    }

    /// Build the array and reset the builder
    ///
    /// # Panics
    ///
    /// Panics if any child holds a different number of values than there are rows
    pub fn finish(&mut self) -> StructArray {
        self.check_children();
        let len = self.validity.len();
        let children = self.columns.iter_mut().map(|c| c.finish().to_data()).collect();
        let nulls = self.validity.finish();
        self.assemble(len, children, nulls)
    }

    /// Build the array, leaving the builder untouched
    ///
    /// # Panics
    ///
    /// Panics if any child holds a different number of values than there are rows
    pub fn finish_cloned(&self) -> StructArray {
        self.check_children();
        let children = self.columns.iter().map(|c| c.finish_cloned().to_data()).collect();
        self.assemble(self.validity.len(), children, self.validity.finish_cloned())
    }

    fn assemble(&self, len: usize, children: Vec<ArrayData>, nulls: Option<NullBuffer>) -> StructArray {
        let data = ArrayData::builder(DataType::Struct(self.fields.clone()))
            .len(len)
            .child_data(children)
            .nulls(nulls)
            .build();
        match data {
            Ok(data) => StructArray::from(data),
            Err(e) => panic!("{e}"),
        }
    }

    fn check_children(&self) {
        let rows = self.validity.len();
        let short = self.fields.iter().zip(&self.columns).find(|(_, c)| c.len() != rows);
        if let Some((field, column)) = short {
            panic!(
                "StructBuilder has {rows} rows but the builder for field {:?} holds {} values",
                field.name(),
                column.len()
            );
        }
    }
}
