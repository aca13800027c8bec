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
use std::mem::size_of;

use half::f16;
use quiver_buffer::{Buffer, NullBuffer, NullBufferBuilder};
use quiver_data::ArrayData;
use quiver_schema::QuiverError;

use crate::array::{check_buffer_count, check_data_type, print_long_array};
use crate::builder::PrimitiveBuilder;
use crate::iterator::PrimitiveIter;
use crate::types::*;
use crate::ArrayAccessor;

macro_rules! primitive_arrays {
    ($($name:ident: $ty:ident = $native:literal),* $(,)?) => {$(
        #[doc = concat!("A [`PrimitiveArray`] of `", $native, "`")]
        pub type $name = PrimitiveArray<$ty>;
    )*};
}

primitive_arrays!(
    Int8Array: Int8Type = "i8",
    Int16Array: Int16Type = "i16",
    Int32Array: Int32Type = "i32",
    Int64Array: Int64Type = "i64",
    UInt8Array: UInt8Type = "u8",
    UInt16Array: UInt16Type = "u16",
    UInt32Array: UInt32Type = "u32",
    UInt64Array: UInt64Type = "u64",
    Float16Array: Float16Type = "f16",
    Float32Array: Float32Type = "f32",
    Float64Array: Float64Type = "f64",
);

/// An array of fixed-width values, one [`QuiverPrimitiveType::Native`] per slot
///
/// The single values buffer holds a (possibly garbage) value for null slots too.
///
/// ```
/// # use half::f16;
/// # use quiver_array::{Array, Float16Array, Int8Array, Int32Array};
/// let a = Int8Array::from(vec![Some(1), None, Some(2)]);
/// let b: Int32Array = (1..=10).map(Some).collect();
/// let c = Float16Array::from(vec![f16::from_f64(1.5)]);
///
/// assert_eq!(a.null_count(), 1);
/// assert_eq!(b.value(9), 10);
/// assert_eq!(c.value(0).to_f64(), 1.5);
/// ```
pub struct PrimitiveArray<T: QuiverPrimitiveType> {
    /// One buffer, aligned to `T::Native`
    data: ArrayData,
    phantom: PhantomData<T>,
}

impl<T: QuiverPrimitiveType> Clone for PrimitiveArray<T> {
    fn clone(&self) -> Self {
        Self {
            data: self.data.clone(),
            phantom: PhantomData,
        }
    }
}

impl<T: QuiverPrimitiveType> PrimitiveArray<T> {
    /// Create a new [`PrimitiveArray`] from the provided values and nulls
    ///
    /// # Panics
    ///
    /// Panics if [`Self::try_new`] returns an error
    ///
    /// # Example
    ///
    /// ```
    /// # use quiver_array::Int32Array;
    /// # use quiver_buffer::{Buffer, NullBuffer};
    /// // [1, 2, 3, 4]
    /// let array = Int32Array::new(Buffer::from_vec(vec![1, 2, 3, 4]), None);
    ///
    /// // [1, null, 3, 4]
    /// let nulls = NullBuffer::from(vec![true, false, true, true]);
    /// let array = Int32Array::new(Buffer::from_vec(vec![1, 2, 3, 4]), Some(nulls));
    /// ```
    pub fn new(values: Buffer, nulls: Option<NullBuffer>) -> Self {
        match Self::try_new(values, nulls) {
            Ok(array) => array,
            Err(e) => panic!("{e}"),
        }
    }

    /// Create a new [`PrimitiveArray`] from the provided values and nulls
    ///
    /// # Errors
    ///
    /// Errors if:
    /// - `values.len()` is not a multiple of the width of `T::Native`
    /// - `values.len() / width != nulls.len()`
    /// - `values` is not aligned to `T::Native`
    pub fn try_new(values: Buffer, nulls: Option<NullBuffer>) -> Result<Self, QuiverError> {
        let width = size_of::<T::Native>();
        if values.len() % width != 0 {
            return Err(QuiverError::InvalidArgument(format!(
                "Buffer of {} bytes is not a multiple of the {width} byte width of {}",
                values.len(),
                T::DATA_TYPE
            )));
        }
        let len = values.len() / width;

        if let Some(n) = nulls.as_ref() {
            if n.len() != len {
                return Err(QuiverError::InvalidArgument(format!(
                    "Null buffer length mismatch for PrimitiveArray, expected {len} got {}",
                    n.len(),
                )));
            }
        }

        let data = ArrayData::builder(T::DATA_TYPE)
            .len(len)
            .add_buffer(values)
            .nulls(nulls)
            .build()?;
        Ok(Self {
            data,
            phantom: PhantomData,
        })
    }

    /// Wraps `data` in a [`PrimitiveArray`], checking it has type `T::DATA_TYPE`
    ///
    /// Fails with [`QuiverError::TypeMismatch`] when the data type differs
    pub fn try_new_from_data(data: ArrayData) -> Result<Self, QuiverError> {
        check_data_type(&data, &T::DATA_TYPE)?;
        check_buffer_count(&data, 1)?;
        let values = data.buffers()[0].try_typed_data::<T::Native>()?;
        if values.len() < data.offset() + data.len() {
            return Err(QuiverError::StructuralMismatch(format!(
                "PrimitiveArray of {} values cannot hold {} values at offset {}",
                values.len(),
                data.len(),
                data.offset()
            )));
        }
        Ok(Self {
            data,
            phantom: PhantomData,
        })
    }

    /// Returns the length of this array.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns whether this array is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns a slice of the values of this array
    #[inline]
    pub fn values(&self) -> &[T::Native] {
        &self.data.buffer::<T::Native>(0)[..self.len()]
    }

    /// Returns a new primitive array builder
    pub fn builder(capacity: usize) -> PrimitiveBuilder<T> {
        PrimitiveBuilder::<T>::with_capacity(capacity)
    }

    /// Returns the primitive value at index `i`.
    ///
    /// # Safety
    ///
    /// caller must ensure that the passed in offset is less than the array len()
    #[inline]
    pub unsafe fn value_unchecked(&self, i: usize) -> T::Native {
        *self.values().get_unchecked(i)
    }

    /// Returns the primitive value at index `i`.
    /// # Panics
    /// Panics if index `i` is out of bounds
    #[inline]
    pub fn value(&self, i: usize) -> T::Native {
        assert!(
            i < self.len(),
            "cannot read index {i} from a PrimitiveArray of length {}",
            self.len()
        );
        unsafe { self.value_unchecked(i) }
    }

    /// Creates a PrimitiveArray based on an iterator of values without nulls
    pub fn from_iter_values<I: IntoIterator<Item = T::Native>>(iter: I) -> Self {
        let val_buf: Buffer = iter.into_iter().collect();
        let len = val_buf.len() / size_of::<T::Native>();
        let data = unsafe {
            ArrayData::builder(T::DATA_TYPE)
                .len(len)
                .add_buffer(val_buf)
                .build_unchecked()
        };
        Self {
            data,
            phantom: PhantomData,
        }
    }

    /// Creates a PrimitiveArray based on a constant value with `count` elements
    pub fn from_value(value: T::Native, count: usize) -> Self {
        Self::from_iter_values(std::iter::repeat(value).take(count))
    }

    /// Returns a zero-copy slice of this array with the indicated offset and length.
    pub fn slice(&self, offset: usize, length: usize) -> Self {
        Self {
            data: self.data.slice(offset, length),
            phantom: PhantomData,
        }
    }

    /// constructs a new iterator
    pub fn iter(&self) -> PrimitiveIter<'_, T> {
        PrimitiveIter::<'_, T>::new(self)
    }
}

impl<T: QuiverPrimitiveType> From<PrimitiveArray<T>> for ArrayData {
    fn from(array: PrimitiveArray<T>) -> Self {
        array.data
    }
}

data_backed_array!(PrimitiveArray<T>, <T: QuiverPrimitiveType>);

impl<'a, T: QuiverPrimitiveType> ArrayAccessor for &'a PrimitiveArray<T> {
    type Item = T::Native;

    fn value(&self, index: usize) -> Self::Item {
        PrimitiveArray::value(self, index)
    }

    #[inline]
    unsafe fn value_unchecked(&self, index: usize) -> Self::Item {
        PrimitiveArray::value_unchecked(self, index)
    }
}

impl<T: QuiverPrimitiveType> std::fmt::Debug for PrimitiveArray<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "PrimitiveArray<{}>\n[\n", T::DATA_TYPE)?;
        print_long_array(self, f, |array, index, f| {
            std::fmt::Debug::fmt(&array.value(index), f)
        })?;
        write!(f, "]")
    }
}

impl<T: QuiverPrimitiveType> PartialEq for PrimitiveArray<T> {
    fn eq(&self, other: &Self) -> bool {
        self.data == other.data
    }
}

impl<'a, T: QuiverPrimitiveType> IntoIterator for &'a PrimitiveArray<T> {
    type Item = Option<T::Native>;
    type IntoIter = PrimitiveIter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        PrimitiveIter::<'a, T>::new(self)
    }
}

/// An optional native value accepted by [`PrimitiveArray`]'s [`FromIterator`]
///
/// Plain natives, `Option`s and `&Option`s all convert into it, so any of them can be
/// collected into an array.
#[derive(Debug)]
pub struct NativeAdapter<T: QuiverPrimitiveType> {
    /// The value, `None` for a null slot
    pub native: Option<T::Native>,
}

impl<T: QuiverPrimitiveType> From<Option<T::Native>> for NativeAdapter<T> {
    fn from(native: Option<T::Native>) -> Self {
        Self { native }
    }
}

impl<T: QuiverPrimitiveType> From<&Option<T::Native>> for NativeAdapter<T> {
    fn from(native: &Option<T::Native>) -> Self {
        Self { native: *native }
    }
}

impl<T: QuiverPrimitiveType, Ptr: Into<NativeAdapter<T>>> FromIterator<Ptr> for PrimitiveArray<T> {
    fn from_iter<I: IntoIterator<Item = Ptr>>(iter: I) -> Self {
        let iter = iter.into_iter();
        let mut nulls = NullBufferBuilder::new(iter.size_hint().0);
        let values: Buffer = iter
            .map(|item| match item.into().native {
                Some(v) => {
                    nulls.append_non_null();
                    v
                }
                None => {
                    nulls.append_null();
                    T::default_value()
                }
            })
            .collect();
        Self::new(values, nulls.finish())
    }
}

// Per native type, a blanket impl would conflict with the `Option` conversions above
macro_rules! native_conversions {
    ($($ty:ident: $native:ty),* $(,)?) => {$(
        impl From<$native> for NativeAdapter<$ty> {
            fn from(value: $native) -> Self {
                Self { native: Some(value) }
            }
        }

        impl From<Vec<$native>> for PrimitiveArray<$ty> {
            fn from(values: Vec<$native>) -> Self {
                Self::new(Buffer::from_vec(values), None)
            }
        }

        impl From<Vec<Option<$native>>> for PrimitiveArray<$ty> {
            fn from(values: Vec<Option<$native>>) -> Self {
                values.iter().collect()
            }
        }
    )*};
}

native_conversions!(
    Int8Type: i8,
    Int16Type: i16,
    Int32Type: i32,
    Int64Type: i64,
    UInt8Type: u8,
    UInt16Type: u16,
    UInt32Type: u32,
    UInt64Type: u64,
    Float16Type: f16,
    Float32Type: f32,
    Float64Type: f64,
);

/// Panics if [`PrimitiveArray::try_new_from_data`] fails
impl<T: QuiverPrimitiveType> From<ArrayData> for PrimitiveArray<T> {
    fn from(data: ArrayData) -> Self {
        match Self::try_new_from_data(data) {
            Ok(array) => array,
            Err(e) => panic!("PrimitiveArray: {e}"),
        }
    }
}
