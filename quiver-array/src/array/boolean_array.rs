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

use quiver_buffer::{bit_util, BooleanBuffer, Buffer, MutableBuffer, NullBuffer, NullBufferBuilder};
use quiver_data::ArrayData;
use quiver_schema::{DataType, QuiverError};

use crate::array::{check_buffer_count, check_data_type, print_long_array};
use crate::builder::BooleanBuilder;
use crate::iterator::BooleanIter;
use crate::{Array, ArrayAccessor};

/// An array of [boolean values](https://arrow.apache.org/docs/format/Columnar.html#fixed-size-primitive-layout)
///
/// Values are bit-packed, least significant bit first, in the first buffer.
///
/// # Example: From a Vec
///
/// ```
/// # use quiver_array::{Array, BooleanArray};
/// let arr: BooleanArray = vec![true, true, false].into();
/// let values: Vec<_> = arr.iter().collect();
/// assert_eq!(&values, &[Some(true), Some(true), Some(false)])
/// ```
///
/// # Example: Using Builder
///
/// ```
/// # use quiver_array::{Array, BooleanArray};
/// # use quiver_array::builder::BooleanBuilder;
/// let mut builder = BooleanBuilder::new();
/// builder.append_value(true);
/// builder.append_null();
/// builder.append_value(false);
/// let array = builder.finish();
/// let values: Vec<_> = array.iter().collect();
/// assert_eq!(&values, &[Some(true), None, Some(false)])
/// ```
#[derive(Clone)]
pub struct BooleanArray {
    data: ArrayData,
}

impl std::fmt::Debug for BooleanArray {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "BooleanArray\n[\n")?;
        print_long_array(self, f, |array, index, f| {
            std::fmt::Debug::fmt(&array.value(index), f)
        })?;
        write!(f, "]")
    }
}

impl BooleanArray {
    /// Create a new [`BooleanArray`] from the provided values and nulls
    ///
    /// # Panics
    ///
    /// Panics if `values.len() != nulls.len()`
    pub fn new(values: BooleanBuffer, nulls: Option<NullBuffer>) -> Self {
        if let Some(n) = nulls.as_ref() {
            assert_eq!(values.len(), n.len());
        }
        let data = unsafe {
            ArrayData::builder(DataType::Boolean)
                .len(values.len())
                .offset(values.offset())
                .add_buffer(values.into_inner())
                .nulls(nulls)
                .build_unchecked()
        };
        Self { data }
    }

    /// Wraps `data` in a [`BooleanArray`]
    ///
    /// Fails with [`QuiverError::TypeMismatch`] unless `data` is [`DataType::Boolean`]
    pub fn try_new_from_data(data: ArrayData) -> Result<Self, QuiverError> {
        check_data_type(&data, &DataType::Boolean)?;
        check_buffer_count(&data, 1)?;
        let needed = bit_util::ceil(data.offset() + data.len(), 8);
        if data.buffers()[0].len() < needed {
            return Err(QuiverError::StructuralMismatch(format!(
                "BooleanArray of length {} at offset {} needs {needed} bytes, got {}",
                data.len(),
                data.offset(),
                data.buffers()[0].len()
            )));
        }
        Ok(Self { data })
    }

    /// Create a new [`BooleanArray`] with length `len` consisting only of nulls
    pub fn new_null(len: usize) -> Self {
        Self::new(BooleanBuffer::new_unset(len), Some(NullBuffer::new_null(len)))
    }

    /// Returns the length of this array.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns whether this array is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns a zero-copy slice of this array with the indicated offset and length.
    pub fn slice(&self, offset: usize, length: usize) -> Self {
        Self {
            data: self.data.slice(offset, length),
        }
    }

    /// Returns a new boolean array builder
    pub fn builder(capacity: usize) -> BooleanBuilder {
        BooleanBuilder::with_capacity(capacity)
    }

    /// Returns the underlying [`BooleanBuffer`] holding all the values of this array
    pub fn values(&self) -> BooleanBuffer {
        BooleanBuffer::new(self.data.buffers()[0].clone(), self.data.offset(), self.len())
    }

    /// Returns the number of non null, true values within this array
    pub fn true_count(&self) -> usize {
        match self.data.nulls() {
            Some(nulls) => (0..self.len())
                .filter(|i| nulls.is_valid(*i) && self.value(*i))
                .count(),
            None => self.values().count_set_bits(),
        }
    }

    /// Returns the number of non null, false values within this array
    pub fn false_count(&self) -> usize {
        self.len() - self.null_count() - self.true_count()
    }

    /// Returns the boolean value at index `i`.
    ///
    /// # Safety
    /// This doesn't check bounds, the caller must ensure that index < self.len()
    pub unsafe fn value_unchecked(&self, i: usize) -> bool {
        bit_util::get_bit(self.data.buffers()[0].as_slice(), self.data.offset() + i)
    }

    /// Returns the boolean value at index `i`.
    /// # Panics
    /// Panics if index `i` is out of bounds
    pub fn value(&self, i: usize) -> bool {
        assert!(
            i < self.len(),
            "Trying to access an element at index {} from a BooleanArray of length {}",
            i,
            self.len()
        );
        // Safety:
        // `i < self.len()
        unsafe { self.value_unchecked(i) }
    }

    /// constructs a new iterator
    pub fn iter(&self) -> BooleanIter<'_> {
        BooleanIter::<'_>::new(self)
    }
}

data_backed_array!(BooleanArray);

impl<'a> ArrayAccessor for &'a BooleanArray {
    type Item = bool;

    fn value(&self, index: usize) -> Self::Item {
        BooleanArray::value(self, index)
    }

    unsafe fn value_unchecked(&self, index: usize) -> Self::Item {
        BooleanArray::value_unchecked(self, index)
    }
}

impl PartialEq for BooleanArray {
    fn eq(&self, other: &Self) -> bool {
        self.data == other.data
    }
}

impl From<Vec<bool>> for BooleanArray {
    fn from(data: Vec<bool>) -> Self {
        Self::new(BooleanBuffer::from(data), None)
    }
}

impl From<Vec<Option<bool>>> for BooleanArray {
    fn from(data: Vec<Option<bool>>) -> Self {
        data.iter().collect()
    }
}

/// # Panics
///
/// Panics if [`BooleanArray::try_new_from_data`] fails
impl From<ArrayData> for BooleanArray {
    fn from(data: ArrayData) -> Self {
        match Self::try_new_from_data(data) {
            Ok(array) => array,
            Err(e) => panic!("BooleanArray: {e}"),
        }
    }
}

impl From<BooleanArray> for ArrayData {
    fn from(array: BooleanArray) -> Self {
        array.data
    }
}

impl<'a> IntoIterator for &'a BooleanArray {
    type Item = Option<bool>;
    type IntoIter = BooleanIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        BooleanIter::<'a>::new(self)
    }
}

impl<Ptr: std::borrow::Borrow<Option<bool>>> FromIterator<Ptr> for BooleanArray {
    fn from_iter<I: IntoIterator<Item = Ptr>>(iter: I) -> Self {
        let iter = iter.into_iter();
        let (lower, _) = iter.size_hint();

        let mut val_buf = MutableBuffer::from_len_zeroed(bit_util::ceil(lower, 8));
        let mut nulls = NullBufferBuilder::new(lower);
        let mut len = 0;

        for item in iter {
            if val_buf.len() * 8 <= len {
                val_buf.resize(val_buf.len() + 8, 0);
            }
            match *item.borrow() {
                Some(v) => {
                    if v {
                        bit_util::set_bit(val_buf.as_slice_mut(), len);
                    }
                    nulls.append_non_null();
                }
                None => nulls.append_null(),
            }
            len += 1;
        }
        val_buf.truncate(bit_util::ceil(len, 8));

        let values = BooleanBuffer::new(Buffer::from(val_buf), 0, len);
        BooleanArray::new(values, nulls.finish())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boolean_fmt_debug() {
        let arr = BooleanArray::from(vec![true, false, false]);
        assert_eq!(
            "BooleanArray\n[\n  true,\n  false,\n  false,\n]",
            format!("{arr:?}")
        );
    }

    #[test]
    fn test_boolean_with_null_fmt_debug() {
        let mut builder = BooleanArray::builder(3);
        builder.append_value(true);
        builder.append_null();
        builder.append_value(false);
        let arr = builder.finish();
        assert_eq!(
            "BooleanArray\n[\n  true,\n  null,\n  false,\n]",
            format!("{arr:?}")
        );
    }

    #[test]
    fn test_boolean_array_from_vec() {
        let buf = Buffer::from_slice_ref([10_u8]);
        let arr = BooleanArray::from(vec![false, true, false, true]);
        assert_eq!(&buf, arr.values().inner());
        assert_eq!(4, arr.len());
        assert_eq!(0, arr.offset());
        assert_eq!(0, arr.null_count());
        for i in 0..4 {
            assert!(!arr.is_null(i));
            assert!(arr.is_valid(i));
            assert_eq!(i == 1 || i == 3, arr.value(i), "failed at {i}")
        }
    }

    #[test]
    fn test_boolean_array_from_vec_option() {
        let buf = Buffer::from_slice_ref([10_u8]);
        let arr = BooleanArray::from(vec![Some(false), Some(true), None, Some(true)]);
        assert_eq!(&buf, arr.values().inner());
        assert_eq!(4, arr.len());
        assert_eq!(0, arr.offset());
        assert_eq!(1, arr.null_count());
        for i in 0..4 {
            if i == 2 {
                assert!(arr.is_null(i));
                assert!(!arr.is_valid(i));
            } else {
                assert!(!arr.is_null(i));
                assert!(arr.is_valid(i));
                assert_eq!(i == 1 || i == 3, arr.value(i), "failed at {i}")
            }
        }
    }

    #[test]
    fn test_boolean_array_from_iter() {
        let v = vec![Some(false), Some(true), Some(false), Some(true)];
        let arr = v.into_iter().collect::<BooleanArray>();
        assert_eq!(4, arr.len());
        assert_eq!(0, arr.offset());
        assert_eq!(0, arr.null_count());
        assert!(arr.nulls().is_none());
        for i in 0..3 {
            assert!(!arr.is_null(i));
            assert!(arr.is_valid(i));
            assert_eq!(i == 1 || i == 3, arr.value(i), "failed at {i}")
        }
    }

    #[test]
    fn test_boolean_array_from_long_iter() {
        let values: Vec<_> = (0..100).map(|i| (i % 3 != 0).then_some(i % 2 == 0)).collect();
        let arr: BooleanArray = values.iter().collect();
        assert_eq!(arr.len(), 100);
        assert_eq!(arr.iter().collect::<Vec<_>>(), values);
        assert_eq!(arr.null_count(), 34);
    }

    #[test]
    fn test_boolean_array_slice_counts() {
        let arr = BooleanArray::from(vec![
            Some(true),
            None,
            Some(false),
            Some(true),
            Some(true),
            None,
            Some(false),
        ]);
        assert_eq!(arr.true_count(), 3);
        assert_eq!(arr.false_count(), 2);

        let sliced = arr.slice(3, 4);
        assert_eq!(sliced.offset(), 3);
        assert_eq!(sliced.null_count(), 1);
        assert_eq!(sliced.true_count(), 2);
        assert_eq!(sliced.false_count(), 1);
        assert_eq!(
            sliced.iter().collect::<Vec<_>>(),
            vec![Some(true), Some(true), None, Some(false)]
        );
        assert_eq!(sliced.values().offset(), 3);
    }

    #[test]
    #[should_panic(expected = "Trying to access an element at index 4 from a BooleanArray of length 3")]
    fn test_fixed_size_binary_array_get_value_index_out_of_bound() {
        let v = vec![Some(true), None, Some(false)];
        let array = BooleanArray::from(v);

        array.value(4);
    }

    #[test]
    fn test_boolean_array_try_new_from_data() {
        let data = ArrayData::builder(DataType::Boolean)
            .len(20)
            .add_buffer(Buffer::from_slice_ref([0_u8]))
            .build();
        assert!(data.is_err());

        let data = crate::Int8Array::from(vec![1]).into_data();
        let err = BooleanArray::try_new_from_data(data).unwrap_err();
        assert!(matches!(err, QuiverError::TypeMismatch(_)), "{err}");
    }

    #[test]
    fn test_new_null() {
        let arr = BooleanArray::new_null(5);
        assert_eq!(arr.null_count(), 5);
        assert_eq!(arr.true_count(), 0);
        assert_eq!(arr.false_count(), 0);
    }
}
