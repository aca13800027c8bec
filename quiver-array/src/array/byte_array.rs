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

use std::marker::PhantomData;

use quiver_buffer::{Buffer, NullBuffer};
use quiver_data::ArrayData;
use quiver_schema::QuiverError;

use crate::array::{check_buffer_count, check_data_type, print_long_array};
use crate::builder::GenericByteBuilder;
use crate::iterator::ArrayIter;
use crate::types::bytes::ByteArrayNativeType;
use crate::types::{BinaryType, ByteArrayType, Utf8Type};
use crate::{Array, ArrayAccessor};

/// A variable-length array of byte strings, see [`StringArray`] and [`BinaryArray`]
///
/// Two buffers back the array: `len + 1` non-decreasing `i32` offsets, then the
/// concatenated value bytes. Slot `i` is `value_data()[offsets[i]..offsets[i + 1]]`.
pub struct GenericByteArray<T: ByteArrayType> {
    data: ArrayData,
    phantom: PhantomData<T>,
}

impl<T: ByteArrayType> Clone for GenericByteArray<T> {
    fn clone(&self) -> Self {
        Self {
            data: self.data.clone(),
            phantom: PhantomData,
        }
    }
}

impl<T: ByteArrayType> GenericByteArray<T> {
    /// Assemble an array from its offsets, value bytes and validity
    ///
    /// Offsets must be `i32` aligned, non-decreasing and within `values`; a
    /// [`StringArray`] additionally requires every slot to be valid UTF-8.
    pub fn try_new(
        offsets: Buffer,
        values: Buffer,
        nulls: Option<NullBuffer>,
    ) -> Result<Self, QuiverError> {
        let len = (offsets.len() / std::mem::size_of::<i32>()).saturating_sub(1);
        if let Some(n) = &nulls {
            if n.len() != len {
                return Err(QuiverError::InvalidArgument(format!(
                    "{}Array validity covers {} slots, expected {len}",
                    T::PREFIX,
                    n.len(),
                )));
            }
        }

        ArrayData::builder(T::DATA_TYPE)
            .len(len)
            .add_buffer(offsets)
            .add_buffer(values)
            .nulls(nulls)
            .build()
            .map(|data| Self {
                data,
                phantom: PhantomData,
            })
    }

    /// Like [`Self::try_new`] but panics on invalid input
    pub fn new(offsets: Buffer, values: Buffer, nulls: Option<NullBuffer>) -> Self {
        Self::try_new(offsets, values, nulls).unwrap_or_else(|e| panic!("{e}"))
    }

    /// Wraps `data`, checking its type and that enough offsets are present
    pub fn try_new_from_data(data: ArrayData) -> Result<Self, QuiverError> {
        check_data_type(&data, &T::DATA_TYPE)?;
        check_buffer_count(&data, 2)?;
        let needed = data.offset() + data.len() + 1;
        let available = data.buffers()[0].try_typed_data::<i32>()?.len();
        if available < needed {
            return Err(QuiverError::StructuralMismatch(format!(
                "{}Array needs {needed} offsets, got {available}",
                T::PREFIX,
            )));
        }
        Ok(Self {
            data,
            phantom: PhantomData,
        })
    }

    /// Number of slots
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True when there are no slots
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// The `len() + 1` offsets visible through this array's window
    #[inline]
    pub fn value_offsets(&self) -> &[i32] {
        &self.data.buffer::<i32>(0)[..self.len() + 1]
    }

    /// The whole value buffer, including bytes outside this array's window
    pub fn value_data(&self) -> &[u8] {
        self.data.buffers()[1].as_slice()
    }

    /// Byte length of slot `i`
    #[inline]
    pub fn value_length(&self, i: usize) -> i32 {
        let offsets = self.value_offsets();
        offsets[i + 1] - offsets[i]
    }

    /// Raw bytes of slot `i`
    pub fn value_bytes(&self, i: usize) -> &[u8] {
        let o = &self.value_offsets()[i..i + 2];
        &self.value_data()[o[0] as usize..o[1] as usize]
    }

    /// Slot `i` without a bounds check
    ///
    /// # Safety
    ///
    /// `i` must be less than `self.len()`
    pub unsafe fn value_unchecked(&self, i: usize) -> &T::Native {
        let offsets = self.value_offsets();
        let start = *offsets.get_unchecked(i) as usize;
        let end = *offsets.get_unchecked(i + 1) as usize;
        // SAFETY: offsets and contents were validated for T when the data was built
        <T::Native as ByteArrayNativeType>::from_bytes_unchecked(self.value_data().get_unchecked(start..end))
    }

    /// Slot `i`
    ///
    /// # Panics
    ///
    /// Panics if `i >= self.len()`
    pub fn value(&self, i: usize) -> &T::Native {
        assert!(
            i < self.len(),
            "cannot read index {i} from a {}Array of length {}",
            T::PREFIX,
            self.len()
        );
        // SAFETY: bounds checked above
        unsafe { self.value_unchecked(i) }
    }

    /// Iterate the slots as options
    pub fn iter(&self) -> ArrayIter<&Self> {
        ArrayIter::new(self)
    }

    /// Zero-copy view of `length` slots starting at `offset`
    pub fn slice(&self, offset: usize, length: usize) -> Self {
        Self {
            data: self.data.slice(offset, length),
            phantom: PhantomData,
        }
    }

    /// A [`GenericByteBuilder`] sized for `item_capacity` slots and `data_capacity` bytes
    pub fn builder(item_capacity: usize, data_capacity: usize) -> GenericByteBuilder<T> {
        GenericByteBuilder::with_capacity(item_capacity, data_capacity)
    }

    /// Build an array without nulls from `iter`
    pub fn from_iter_values<Ptr, I>(iter: I) -> Self
    where
        Ptr: AsRef<T::Native>,
        I: IntoIterator<Item = Ptr>,
    {
        let iter = iter.into_iter();
        let mut builder = Self::builder(iter.size_hint().0, 0);
        iter.for_each(|v| builder.append_value(v));
        builder.finish()
    }
}

impl<T: ByteArrayType> std::fmt::Debug for GenericByteArray<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}Array\n[\n", T::PREFIX)?;
        print_long_array(self, f, |array, idx, f| std::fmt::Debug::fmt(&array.value(idx), f))?;
        write!(f, "]")
    }
}

impl<T: ByteArrayType> PartialEq for GenericByteArray<T> {
    fn eq(&self, other: &Self) -> bool {
        self.data == other.data
    }
}

data_backed_array!(GenericByteArray<T>, <T: ByteArrayType>);

impl<'a, T: ByteArrayType> ArrayAccessor for &'a GenericByteArray<T> {
    type Item = &'a T::Native;

    fn value(&self, index: usize) -> Self::Item {
        GenericByteArray::value(self, index)
    }

    unsafe fn value_unchecked(&self, index: usize) -> Self::Item {
        GenericByteArray::value_unchecked(self, index)
    }
}

/// Panics if [`GenericByteArray::try_new_from_data`] fails
impl<T: ByteArrayType> From<ArrayData> for GenericByteArray<T> {
    fn from(data: ArrayData) -> Self {
        Self::try_new_from_data(data).unwrap_or_else(|e| panic!("{}Array: {e}", T::PREFIX))
    }
}

impl<T: ByteArrayType> From<GenericByteArray<T>> for ArrayData {
    fn from(array: GenericByteArray<T>) -> Self {
        array.data
    }
}

impl<'a, T: ByteArrayType> IntoIterator for &'a GenericByteArray<T> {
    type Item = Option<&'a T::Native>;
    type IntoIter = ArrayIter<Self>;

    fn into_iter(self) -> Self::IntoIter {
        ArrayIter::new(self)
    }
}

impl<Ptr, T: ByteArrayType> FromIterator<Option<Ptr>> for GenericByteArray<T>
where
    Ptr: AsRef<T::Native>,
{
    fn from_iter<I: IntoIterator<Item = Option<Ptr>>>(iter: I) -> Self {
        let iter = iter.into_iter();
        let mut builder = Self::builder(iter.size_hint().0, 1024);
        builder.extend(iter);
        builder.finish()
    }
}

/// A [`GenericByteArray`] of UTF-8 `str` slots
///
/// ```
/// # use quiver_array::StringArray;
/// let a = StringArray::from(vec![Some("x"), None, Some("yz")]);
/// let b: StringArray = std::iter::repeat(Some("ab")).take(3).collect();
///
/// assert_eq!(a.iter().collect::<Vec<_>>(), vec![Some("x"), None, Some("yz")]);
/// assert_eq!(b.value_offsets(), &[0, 2, 4, 6]);
/// ```
pub type StringArray = GenericByteArray<Utf8Type>;

/// A [`GenericByteArray`] of opaque `[u8]` slots
///
/// ```
/// use quiver_array::{Array, BinaryArray};
/// let array = BinaryArray::from(vec![Some(&b"ab"[..]), None, Some(&b""[..])]);
/// assert_eq!(array.len(), 3);
/// assert!(array.is_null(1));
/// assert_eq!(array.value(0), b"ab");
/// assert!(array.value(2).is_empty());
/// ```
pub type BinaryArray = GenericByteArray<BinaryType>;

macro_rules! byte_array_from_vec {
    ($array:ty: $($item:ty),*) => {$(
        impl From<Vec<$item>> for $array {
            fn from(v: Vec<$item>) -> Self {
                Self::from_iter_values(v)
            }
        }

        impl From<Vec<Option<$item>>> for $array {
            fn from(v: Vec<Option<$item>>) -> Self {
                v.into_iter().collect()
            }
        }
    )*};
}

byte_array_from_vec!(StringArray: &str, String);
byte_array_from_vec!(BinaryArray: &[u8], Vec<u8>);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multibyte_values() {
        let array = StringArray::from(vec!["ab", "", "ü€😀"]);
        assert_eq!(array.null_count(), 0);
        assert_eq!(array.value(2), "ü€😀");
        assert_eq!(unsafe { array.value_unchecked(0) }, "ab");
        assert_eq!(array.value_length(1), 0);
        assert_eq!(array.value_length(2), 2 + 3 + 4);
        assert_eq!(array.value_bytes(0), b"ab");
        assert_eq!(array.value_offsets(), &[0, 2, 2, 11]);
    }

    #[test]
    fn test_slice_shares_value_data() {
        let array = StringArray::from(vec![Some("one"), None, Some("three"), Some("")]);
        let sliced = array.slice(1, 3);
        assert_eq!(sliced.offset(), 1);
        assert_eq!(sliced.null_count(), 1);
        assert_eq!(sliced.value_offsets(), &[3, 3, 8, 8]);
        assert_eq!(sliced.iter().collect::<Vec<_>>(), vec![None, Some("three"), Some("")]);
        assert!(sliced.to_data().buffers()[1].ptr_eq(&array.to_data().buffers()[1]));
    }

    #[test]
    fn test_debug() {
        let strings = StringArray::from(vec![Some("a"), None]);
        assert_eq!(format!("{strings:?}"), "StringArray\n[\n  \"a\",\n  null,\n]");

        let binary = BinaryArray::from(vec![b"hi".to_vec()]);
        assert_eq!(format!("{binary:?}"), "BinaryArray\n[\n  [104, 105],\n]");
    }

    #[test]
    fn test_from_owned() {
        let array = StringArray::from(vec![Some("p".to_string()), None]);
        assert_eq!(array.value(0), "p");
        assert!(array.is_null(1));

        let array = BinaryArray::from(vec![vec![1_u8, 2], vec![]]);
        assert_eq!(array.value(0), &[1, 2]);
        assert_eq!(array.value_length(1), 0);
    }

    #[test]
    fn test_try_new_validation() {
        let offsets = || Buffer::from_vec(vec![0_i32, 2]);
        let bad_utf8 = || Buffer::from_slice_ref([0xc3_u8, 0x28]);

        let err = StringArray::try_new(offsets(), bad_utf8(), None).unwrap_err();
        assert!(err.to_string().contains("Invalid UTF8"), "{err}");

        let array = BinaryArray::try_new(offsets(), bad_utf8(), None).unwrap();
        assert_eq!(array.value(0), &[0xc3, 0x28]);

        let decreasing = Buffer::from_vec(vec![0_i32, 3, 2]);
        let err = BinaryArray::try_new(decreasing, Buffer::from_slice_ref(b"abc"), None).unwrap_err();
        assert!(matches!(err, QuiverError::StructuralMismatch(_)), "{err}");

        let nulls = NullBuffer::new_valid(2);
        let err = BinaryArray::try_new(offsets(), bad_utf8(), Some(nulls)).unwrap_err();
        assert!(err.to_string().contains("covers 2 slots, expected 1"), "{err}");
    }

    #[test]
    fn test_empty() {
        let array = StringArray::from_iter_values(Vec::<&str>::new());
        assert!(array.is_empty());
        assert_eq!(array.value_offsets(), &[0]);
    }

    #[test]
    #[should_panic(expected = "cannot read index 3 from a StringArray of length 3")]
    fn test_value_out_of_bounds() {
        StringArray::from(vec!["a", "b", "c"]).value(3);
    }
}
