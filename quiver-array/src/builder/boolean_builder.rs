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

use quiver_buffer::{BooleanBufferBuilder, Buffer, NullBuffer, NullBufferBuilder};
use quiver_data::ArrayData;
use quiver_schema::DataType;

use crate::BooleanArray;

/// Builder for [`BooleanArray`]
///
/// ```
/// # use quiver_array::{Array, BooleanArray, builder::BooleanBuilder};
/// let mut builder = BooleanBuilder::new();
/// builder.append_value(true);
/// builder.append_null();
/// builder.append_n(2, false);
///
/// let array = builder.finish();
/// assert_eq!(array.null_count(), 1);
/// assert_eq!(
///     array,
///     BooleanArray::from(vec![Some(true), None, Some(false), Some(false)])
/// );
/// ```
#[derive(Debug)]
pub struct BooleanBuilder {
    values: BooleanBufferBuilder,
    nulls: NullBufferBuilder,
}

forward_array_builder!(BooleanBuilder, |b| b.values.len());

impl Default for BooleanBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl BooleanBuilder {
    /// Creates a new builder with room for 1024 values
    pub fn new() -> Self {
        Self::with_capacity(1024)
    }

    /// Creates a new builder with room for `capacity` values
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            values: BooleanBufferBuilder::new(capacity),
            nulls: NullBufferBuilder::new(capacity),
        }
    }

    /// Returns the number of values that fit without reallocating
    pub fn capacity(&self) -> usize {
        self.values.capacity()
    }

    /// Appends a non-null value
    #[inline]
    pub fn append_value(&mut self, v: bool) {
        self.append_n(1, v)
    }

    /// Appends `v` `n` times
    #[inline]
    pub fn append_n(&mut self, n: usize, v: bool) {
        self.values.append_n(n, v);
        self.nulls.append_n_non_nulls(n);
    }

    /// Appends a null slot
    #[inline]
    pub fn append_null(&mut self) {
        self.append_nulls(1)
    }

    /// Appends `n` null slots, their value bits are unset
    #[inline]
    pub fn append_nulls(&mut self, n: usize) {
        self.values.append_n(n, false);
        self.nulls.append_n_nulls(n);
    }

    /// Appends `v`, or a null slot if `None`
    #[inline]
    pub fn append_option(&mut self, v: Option<bool>) {
        match v {
            Some(v) => self.append_value(v),
            None => self.append_null(),
        }
    }

    /// Appends every value of `v` as a non-null slot
    pub fn append_slice(&mut self, v: &[bool]) {
        self.values.append_slice(v);
        self.nulls.append_n_non_nulls(v.len());
    }

    /// Builds the [`BooleanArray`] and resets this builder
    pub fn finish(&mut self) -> BooleanArray {
        let len = self.values.len();
        Self::build(len, self.values.finish().into_inner(), self.nulls.finish())
    }

    /// Builds the [`BooleanArray`] from a copy of the current state
    pub fn finish_cloned(&self) -> BooleanArray {
        let values = self.values.finish_cloned().into_inner();
        Self::build(self.values.len(), values, self.nulls.finish_cloned())
    }

    fn build(len: usize, values: Buffer, nulls: Option<NullBuffer>) -> BooleanArray {
        let builder = ArrayData::builder(DataType::Boolean)
            .len(len)
            .add_buffer(values)
            .nulls(nulls);
        // SAFETY: both bitmaps hold exactly `len` bits
        BooleanArray::from(unsafe { builder.build_unchecked() })
    }
}

impl Extend<Option<bool>> for BooleanBuilder {
    #[inline]
    fn extend<I: IntoIterator<Item = Option<bool>>>(&mut self, iter: I) {
        iter.into_iter().for_each(|v| self.append_option(v))
    }
}
