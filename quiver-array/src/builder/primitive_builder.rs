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

use quiver_buffer::{Buffer, BufferBuilder, NullBuffer, NullBufferBuilder};
use quiver_data::ArrayData;

use crate::types::*;
use crate::PrimitiveArray;

/// Builder for [`PrimitiveArray<Int8Type>`]
pub type Int8Builder = PrimitiveBuilder<Int8Type>;
/// Builder for [`PrimitiveArray<Int16Type>`]
pub type Int16Builder = PrimitiveBuilder<Int16Type>;
/// Builder for [`PrimitiveArray<Int32Type>`]
pub type Int32Builder = PrimitiveBuilder<Int32Type>;
/// Builder for [`PrimitiveArray<Int64Type>`]
pub type Int64Builder = PrimitiveBuilder<Int64Type>;
/// Builder for [`PrimitiveArray<UInt8Type>`]
pub type UInt8Builder = PrimitiveBuilder<UInt8Type>;
/// Builder for [`PrimitiveArray<UInt16Type>`]
pub type UInt16Builder = PrimitiveBuilder<UInt16Type>;
/// Builder for [`PrimitiveArray<UInt32Type>`]
pub type UInt32Builder = PrimitiveBuilder<UInt32Type>;
/// Builder for [`PrimitiveArray<UInt64Type>`]
pub type UInt64Builder = PrimitiveBuilder<UInt64Type>;
/// Builder for [`PrimitiveArray<Float16Type>`]
pub type Float16Builder = PrimitiveBuilder<Float16Type>;
/// Builder for [`PrimitiveArray<Float32Type>`]
pub type Float32Builder = PrimitiveBuilder<Float32Type>;
/// Builder for [`PrimitiveArray<Float64Type>`]
pub type Float64Builder = PrimitiveBuilder<Float64Type>;

/// Builder for [`PrimitiveArray`]
///
/// Null slots occupy a zeroed value so that the values buffer always holds one
/// element per slot.
///
/// ```
/// # use quiver_array::builder::Int64Builder;
/// # use quiver_array::Int64Array;
/// let mut builder = Int64Builder::with_capacity(4);
/// builder.append_value(1);
/// builder.append_null();
/// builder.extend([Some(3), None]);
///
/// let array = builder.finish();
/// assert_eq!(array, Int64Array::from(vec![Some(1), None, Some(3), None]));
/// assert_eq!(array.values(), &[1, 0, 3, 0]);
/// ```
#[derive(Debug)]
pub struct PrimitiveBuilder<T: QuiverPrimitiveType> {
    values: BufferBuilder<T::Native>,
    nulls: NullBufferBuilder,
}

forward_array_builder!(PrimitiveBuilder<T>, <T: QuiverPrimitiveType>, |b| b.values.len());

impl<T: QuiverPrimitiveType> Default for PrimitiveBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: QuiverPrimitiveType> PrimitiveBuilder<T> {
    /// Creates a new builder with room for 1024 values
    pub fn new() -> Self {
        Self::with_capacity(1024)
    }

    /// Creates a new builder with room for `capacity` values
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            values: BufferBuilder::new(capacity),
            nulls: NullBufferBuilder::new(capacity),
        }
    }

    /// Returns the number of values that fit without reallocating
    pub fn capacity(&self) -> usize {
        self.values.capacity()
    }

    /// Appends a non-null value
    #[inline]
    pub fn append_value(&mut self, v: T::Native) {
        self.values.append(v);
        self.nulls.append_non_null();
    }

    /// Appends `v` `n` times
    #[inline]
    pub fn append_value_n(&mut self, v: T::Native, n: usize) {
        self.values.append_n(n, v);
        self.nulls.append_n_non_nulls(n);
    }

    /// Appends a null slot
    #[inline]
    pub fn append_null(&mut self) {
        self.append_nulls(1)
    }

    /// Appends `n` null slots
    #[inline]
    pub fn append_nulls(&mut self, n: usize) {
        self.values.advance(n);
        self.nulls.append_n_nulls(n);
    }

    /// Appends `v`, or a null slot if `None`
    #[inline]
    pub fn append_option(&mut self, v: Option<T::Native>) {
        match v {
            Some(v) => self.append_value(v),
            None => self.append_null(),
        }
    }

    /// Appends every value of `v` as a non-null slot
    #[inline]
    pub fn append_slice(&mut self, v: &[T::Native]) {
        self.values.append_slice(v);
        self.nulls.append_n_non_nulls(v.len());
    }

    /// Appends `values`, masking those whose entry in `is_valid` is false
    ///
    /// # Panics
    ///
    /// Panics if `values` and `is_valid` differ in length
    pub fn append_values(&mut self, values: &[T::Native], is_valid: &[bool]) {
        assert_eq!(values.len(), is_valid.len(), "values and validity differ in length");
        self.values.append_slice(values);
        self.nulls.append_slice(is_valid);
    }

    /// Builds the [`PrimitiveArray`] and resets this builder
    pub fn finish(&mut self) -> PrimitiveArray<T> {
        let len = self.values.len();
        Self::build(len, self.values.finish(), self.nulls.finish())
    }

    /// Builds the [`PrimitiveArray`] from a copy of the current state
    pub fn finish_cloned(&self) -> PrimitiveArray<T> {
        let values = Buffer::from_slice_ref(self.values.as_slice());
        Self::build(self.values.len(), values, self.nulls.finish_cloned())
    }

    fn build(len: usize, values: Buffer, nulls: Option<NullBuffer>) -> PrimitiveArray<T> {
        let builder = ArrayData::builder(T::DATA_TYPE)
            .len(len)
            .add_buffer(values)
            .nulls(nulls);
        // SAFETY: `values` holds exactly `len` elements and `nulls` exactly `len` bits
        PrimitiveArray::from(unsafe { builder.build_unchecked() })
    }

    /// Returns the values appended so far, null slots included
    pub fn values_slice(&self) -> &[T::Native] {
        self.values.as_slice()
    }

    /// Mutable access to the values appended so far
    pub fn values_slice_mut(&mut self) -> &mut [T::Native] {
        self.values.as_slice_mut()
    }

    /// Returns the validity bitmap, `None` while no null has been appended
    pub fn validity_slice(&self) -> Option<&[u8]> {
        self.nulls.as_slice()
    }
}

impl<T: QuiverPrimitiveType> Extend<Option<T::Native>> for PrimitiveBuilder<T> {
    #[inline]
    fn extend<I: IntoIterator<Item = Option<T::Native>>>(&mut self, iter: I) {
        iter.into_iter().for_each(|v| self.append_option(v))
    }
}
