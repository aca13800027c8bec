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

use std::fmt;
use std::marker::PhantomData;

use quiver_buffer::{Buffer, BufferBuilder, NullBuffer, NullBufferBuilder};
use quiver_data::ArrayData;

use crate::types::{ByteArrayType, Utf8Type};
use crate::GenericByteArray;

/// Builder for [`GenericByteArray`]
///
/// Values are appended to one contiguous byte buffer and each slot, null or not,
/// appends the running byte length to the offsets.
///
/// ```
/// # use quiver_array::builder::BinaryBuilder;
/// let mut builder = BinaryBuilder::new();
/// builder.append_value(b"ab");
/// builder.append_null();
/// builder.append_value(b"");
/// builder.append_value([0xff_u8]);
///
/// let array = builder.finish();
/// assert_eq!(array.value_offsets(), &[0, 2, 2, 2, 3]);
/// assert_eq!(array.value_data(), &[b'a', b'b', 0xff]);
/// ```
///
/// See also [`StringBuilder`](crate::builder::StringBuilder) and
/// [`BinaryBuilder`](crate::builder::BinaryBuilder)
pub struct GenericByteBuilder<T: ByteArrayType> {
    data: BufferBuilder<u8>,
    offsets: BufferBuilder<i32>,
    nulls: NullBufferBuilder,
    phantom: PhantomData<T>,
}

forward_array_builder!(GenericByteBuilder<T>, <T: ByteArrayType>, |b| b.nulls.len());

impl<T: ByteArrayType> GenericByteBuilder<T> {
    /// Creates a new builder with room for 1024 values of 1024 bytes in total
    pub fn new() -> Self {
        Self::with_capacity(1024, 1024)
    }

    /// Creates a new builder with room for `item_capacity` values whose bytes
    /// total `data_capacity`
    pub fn with_capacity(item_capacity: usize, data_capacity: usize) -> Self {
        let mut offsets = BufferBuilder::new(item_capacity + 1);
        offsets.append(0);
        Self {
            data: BufferBuilder::new(data_capacity),
            offsets,
            nulls: NullBufferBuilder::new(item_capacity),
            phantom: PhantomData,
        }
    }

    /// Closes `n` slots at the current end of the data
    ///
    /// # Panics
    ///
    /// Panics if the data has grown past `i32::MAX` bytes
    #[inline]
    fn close_slots(&mut self, n: usize) {
        let end = self.data.len();
        let end = i32::try_from(end)
            .unwrap_or_else(|_| panic!("byte array offset overflow: {end} bytes exceed i32::MAX"));
        self.offsets.append_n(n, end);
    }

    /// Appends a non-null value
    ///
    /// # Panics
    ///
    /// Panics if the total size of the values would exceed `i32::MAX` bytes
    #[inline]
    pub fn append_value(&mut self, value: impl AsRef<T::Native>) {
        self.data.append_slice(value.as_ref().as_ref());
        self.nulls.append_non_null();
        self.close_slots(1);
    }

    /// Appends `value`, or a null slot if `None`
    #[inline]
    pub fn append_option(&mut self, value: Option<impl AsRef<T::Native>>) {
        match value {
            Some(v) => self.append_value(v),
            None => self.append_null(),
        }
    }

    /// Appends a null slot
    #[inline]
    pub fn append_null(&mut self) {
        self.append_nulls(1)
    }

    /// Appends `n` null slots, each of zero length
    #[inline]
    pub fn append_nulls(&mut self, n: usize) {
        self.nulls.append_n_nulls(n);
        self.close_slots(n);
    }

    /// Builds the [`GenericByteArray`] and resets this builder
    pub fn finish(&mut self) -> GenericByteArray<T> {
        let len = self.nulls.len();
        let offsets = self.offsets.finish();
        self.offsets.append(0);
        Self::build(len, offsets, self.data.finish(), self.nulls.finish())
    }

    /// Builds the [`GenericByteArray`] from a copy of the current state
    pub fn finish_cloned(&self) -> GenericByteArray<T> {
        Self::build(
            self.nulls.len(),
            Buffer::from_slice_ref(self.offsets.as_slice()),
            Buffer::from_slice_ref(self.data.as_slice()),
            self.nulls.finish_cloned(),
        )
    }

    fn build(
        len: usize,
        offsets: Buffer,
        data: Buffer,
        nulls: Option<NullBuffer>,
    ) -> GenericByteArray<T> {
        let builder = ArrayData::builder(T::DATA_TYPE)
            .len(len)
            .add_buffer(offsets)
            .add_buffer(data)
            .nulls(nulls);
        // SAFETY: offsets are monotonic, start at zero and end at the data length, and
        // string values were appended from `str`
        GenericByteArray::from(unsafe { builder.build_unchecked() })
    }

    /// Returns the bytes appended so far
    pub fn values_slice(&self) -> &[u8] {
        self.data.as_slice()
    }

    /// Returns the offsets appended so far, including the leading zero
    pub fn offsets_slice(&self) -> &[i32] {
        self.offsets.as_slice()
    }
}

impl<T: ByteArrayType> fmt::Debug for GenericByteBuilder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(&format!("{}Builder", T::PREFIX))
            .field("data", &self.data)
            .field("offsets", &self.offsets)
            .field("nulls", &self.nulls)
            .finish()
    }
}

impl<T: ByteArrayType> Default for GenericByteBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ByteArrayType, V: AsRef<T::Native>> Extend<Option<V>> for GenericByteBuilder<T> {
    #[inline]
    fn extend<I: IntoIterator<Item = Option<V>>>(&mut self, iter: I) {
        iter.into_iter().for_each(|v| self.append_option(v))
    }
}

/// Text written through [`std::fmt::Write`] becomes the prefix of the next appended value
///
/// ```
/// # use std::fmt::Write;
/// # use quiver_array::builder::StringBuilder;
/// let mut builder = StringBuilder::new();
/// write!(builder, "{}-{}", 1, 2).unwrap();
/// builder.append_value("");
/// write!(builder, "x").unwrap();
/// builder.append_value("yz");
///
/// let array = builder.finish();
/// assert_eq!(array.value(0), "1-2");
/// assert_eq!(array.value(1), "xyz");
/// ```
impl fmt::Write for GenericByteBuilder<Utf8Type> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.data.append_slice(s.as_bytes());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::builder::{ArrayBuilder, BinaryBuilder, StringBuilder};
    use crate::{Array, BinaryArray, StringArray};

    #[test]
    fn test_binary_builder() {
        let mut builder = BinaryBuilder::new();
        builder.append_value(b"hello");
        builder.append_value(b"");
        builder.append_null();
        builder.append_value(b"rust");

        let array = builder.finish();
        assert_eq!(array.len(), 4);
        assert_eq!(array.null_count(), 1);
        assert_eq!(array.value(0), b"hello");
        assert!(array.value(1).is_empty());
        assert!(array.value(2).is_empty());
        assert_eq!(array.value_offsets(), &[0, 5, 5, 5, 9]);
        assert_eq!(array.value_length(3), 4);
    }

    #[test]
    fn test_all_nulls() {
        let mut builder = BinaryBuilder::new();
        builder.append_null();
        builder.append_nulls(4);
        assert_eq!(builder.len(), 5);

        let array = builder.finish();
        assert_eq!(array.null_count(), 5);
        assert_eq!(array.value_offsets(), &[0; 6]);
        assert!(array.value_data().is_empty());
    }

    #[test]
    fn test_finish_resets() {
        let mut builder = StringBuilder::new();
        builder.append_value("first");
        builder.finish();
        assert!(builder.is_empty());
        assert_eq!(builder.offsets_slice(), &[0]);

        builder.extend([Some("a"), None, Some("bc")]);
        let array = builder.finish();
        assert_eq!(array, StringArray::from(vec![Some("a"), None, Some("bc")]));
        assert_eq!(array.value_offsets(), &[0, 1, 1, 3]);
    }

    #[test]
    fn test_string_options() {
        let mut builder = StringBuilder::new();
        let owned = String::from("owned");
        builder.append_value(&owned);
        builder.append_option(Some("borrowed"));
        builder.append_option(None::<&str>);
        builder.append_option(None::<String>);

        assert_eq!(builder.values_slice(), b"ownedborrowed");
        assert_eq!(
            builder.finish(),
            StringArray::from(vec![Some("owned"), Some("borrowed"), None, None])
        );
    }

    #[test]
    fn test_finish_cloned_is_independent() {
        let mut builder = BinaryBuilder::with_capacity(2, 8);
        builder.append_value(b"ab");
        let first: BinaryArray = builder.finish_cloned();
        builder.append_value(b"cd");
        assert_eq!(first.len(), 1);
        assert_eq!(first.value_data(), b"ab");

        let second = builder.finish();
        assert_eq!(second.value_offsets(), &[0, 2, 4]);
    }

    #[test]
    fn test_write_spans_values() {
        use std::fmt::Write;
        let mut builder = StringBuilder::new();
        writeln!(builder, "bar").unwrap();
        builder.append_value("");
        builder.append_null();
        write!(builder, "fiz").unwrap();
        write!(builder, "buz").unwrap();
        builder.append_value("");

        let array = builder.finish();
        let values: Vec<_> = array.iter().collect();
        assert_eq!(values, vec![Some("bar\n"), None, Some("fizbuz")]);
    }

    #[test]
    fn test_debug_names_type() {
        let builder = StringBuilder::new();
        assert!(format!("{builder:?}").starts_with("StringBuilder"));
        let builder = BinaryBuilder::new();
        assert!(format!("{builder:?}").starts_with("BinaryBuilder"));
    }
}
