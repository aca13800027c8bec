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

//! The concrete array definitions

use std::any::Any;
use std::sync::Arc;

use quiver_buffer::NullBuffer;
use quiver_data::ArrayData;
use quiver_schema::{DataType, QuiverError};

/// Implements [`Array`] for a type holding its [`ArrayData`] in a `data` field and
/// providing an inherent zero-copy `slice`
///
/// `all_null` marks a type whose every slot is null without a validity bitmap.
macro_rules! data_backed_array {
    ($ty:ty $(, <$g:ident: $bound:path>)? $(, $mode:ident)?) => {
        impl$(<$g: $bound>)? $crate::Array for $ty {
            fn as_any(&self) -> &dyn std::any::Any {
                self
            }

            fn to_data(&self) -> quiver_data::ArrayData {
                self.data.clone()
            }

            fn into_data(self) -> quiver_data::ArrayData {
                self.data
            }

            fn data_type(&self) -> &quiver_schema::DataType {
                self.data.data_type()
            }

            fn slice(&self, offset: usize, length: usize) -> $crate::ArrayRef {
                std::sync::Arc::new(<$ty>::slice(self, offset, length))
            }

            fn len(&self) -> usize {
                self.data.len()
            }

            fn is_empty(&self) -> bool {
                self.data.is_empty()
            }

            fn offset(&self) -> usize {
                self.data.offset()
            }

            fn nulls(&self) -> Option<&quiver_buffer::NullBuffer> {
                self.data.nulls()
            }

            data_backed_array!(@mode $($mode)?);
        }
    };
    (@mode) => {};
    (@mode all_null) => {
        fn is_null(&self, _index: usize) -> bool {
            true
        }

        fn null_count(&self) -> usize {
            self.data.len()
        }
    };
}

mod boolean_array;
pub use boolean_array::*;

mod byte_array;
pub use byte_array::*;

mod list_array;
pub use list_array::*;

mod null_array;
pub use null_array::*;

mod primitive_array;
pub use primitive_array::*;

mod struct_array;
pub use struct_array::*;

/// An array in the quiver columnar format
///
/// Every concrete array is a typed view over an [`ArrayData`], sharing its buffers.
/// Arrays are immutable, cloning or slicing one only bumps reference counts.
pub trait Array: std::fmt::Debug + Send + Sync {
    /// The array as [`Any`], for downcasting to its concrete type
    ///
    /// ```
    /// # use std::sync::Arc;
    /// # use quiver_array::{Array, ArrayRef, StringArray};
    /// let column: ArrayRef = Arc::new(StringArray::from(vec!["p", "q"]));
    /// let strings = column.as_any().downcast_ref::<StringArray>().unwrap();
    /// assert_eq!(strings.value(1), "q");
    /// ```
    fn as_any(&self) -> &dyn Any;

    /// A clone of the backing [`ArrayData`]
    fn to_data(&self) -> ArrayData;

    /// The backing [`ArrayData`], without cloning when `self` is owned
    fn into_data(self) -> ArrayData;

    /// The logical type
    fn data_type(&self) -> &DataType;

    /// Zero-copy view of `length` slots starting at `offset`
    ///
    /// # Panics
    ///
    /// Panics if `offset + length > self.len()`
    fn slice(&self, offset: usize, length: usize) -> ArrayRef;

    /// Number of slots
    fn len(&self) -> usize;

    /// True when there are no slots
    fn is_empty(&self) -> bool;

    /// Position of this view within the backing buffers
    ///
    /// ```
    /// # use quiver_array::{Array, UInt8Array};
    /// let array = UInt8Array::from(vec![1, 2, 3, 4]);
    /// assert_eq!(array.slice(1, 3).slice(1, 1).offset(), 2);
    /// ```
    fn offset(&self) -> usize;

    /// Validity of the visible slots, `None` when no bitmap is stored
    fn nulls(&self) -> Option<&NullBuffer>;

    /// True if slot `index` is null
    fn is_null(&self, index: usize) -> bool {
        self.nulls().is_some_and(|n| n.is_null(index))
    }

    /// True if slot `index` holds a value
    fn is_valid(&self, index: usize) -> bool {
        !self.is_null(index)
    }

    /// Number of null slots
    fn null_count(&self) -> usize {
        self.nulls().map_or(0, |n| n.null_count())
    }
}

/// A shared, type-erased [`Array`]
pub type ArrayRef = Arc<dyn Array>;

/// Forwards every [`Array`] method to the array behind a pointer-like wrapper
macro_rules! forward_array {
    ($($target:tt)*) => {
        fn as_any(&self) -> &dyn Any {
            $($target)*::as_any(&**self)
        }

        fn to_data(&self) -> ArrayData {
            $($target)*::to_data(&**self)
        }

        fn into_data(self) -> ArrayData {
            $($target)*::to_data(&*self)
        }

        fn data_type(&self) -> &DataType {
            $($target)*::data_type(&**self)
        }

        fn slice(&self, offset: usize, length: usize) -> ArrayRef {
            $($target)*::slice(&**self, offset, length)
        }

        fn len(&self) -> usize {
            $($target)*::len(&**self)
        }

        fn is_empty(&self) -> bool {
            $($target)*::is_empty(&**self)
        }

        fn offset(&self) -> usize {
            $($target)*::offset(&**self)
        }

        fn nulls(&self) -> Option<&NullBuffer> {
            $($target)*::nulls(&**self)
        }

        fn is_null(&self, index: usize) -> bool {
            $($target)*::is_null(&**self, index)
        }

        fn null_count(&self) -> usize {
            $($target)*::null_count(&**self)
        }
    };
}

impl Array for ArrayRef {
    forward_array!(<dyn Array>);
}

impl<T: Array> Array for &T {
    forward_array!(T);
}

/// Typed element access for an [`Array`]
///
/// Every index in `0..len` yields a value, null slots included; what a null slot
/// yields is unspecified.
pub trait ArrayAccessor: Array {
    /// The element type
    type Item: Send + Sync;

    /// The element at `index`
    ///
    /// # Panics
    ///
    /// Panics if `index >= self.len()`
    fn value(&self, index: usize) -> Self::Item;

    /// The element at `index` without a bounds check
    ///
    /// # Safety
    ///
    /// `index` must be less than `self.len()`
    unsafe fn value_unchecked(&self, index: usize) -> Self::Item;
}

impl PartialEq for dyn Array + '_ {
    fn eq(&self, other: &Self) -> bool {
        self.to_data() == other.to_data()
    }
}

impl<T: Array> PartialEq<T> for dyn Array + '_ {
    fn eq(&self, other: &T) -> bool {
        self.to_data() == other.to_data()
    }
}

/// Wrap `data` in the concrete array type matching its [`DataType`]
///
/// # Panics
///
/// Panics if `data` does not have the layout of its type, which cannot happen for
/// data that passed [`ArrayData::validate`]
pub fn make_array(data: ArrayData) -> ArrayRef {
    macro_rules! wrap {
        ($array:ty) => {
            Arc::new(<$array>::from(data)) as ArrayRef
        };
    }
    match data.data_type() {
        DataType::Null => wrap!(NullArray),
        DataType::Boolean => wrap!(BooleanArray),
        DataType::Int8 => wrap!(Int8Array),
        DataType::Int16 => wrap!(Int16Array),
        DataType::Int32 => wrap!(Int32Array),
        DataType::Int64 => wrap!(Int64Array),
        DataType::UInt8 => wrap!(UInt8Array),
        DataType::UInt16 => wrap!(UInt16Array),
        DataType::UInt32 => wrap!(UInt32Array),
        DataType::UInt64 => wrap!(UInt64Array),
        DataType::Float16 => wrap!(Float16Array),
        DataType::Float32 => wrap!(Float32Array),
        DataType::Float64 => wrap!(Float64Array),
        DataType::Utf8 => wrap!(StringArray),
        DataType::Binary => wrap!(BinaryArray),
        DataType::List(_) => wrap!(ListArray),
        DataType::Struct(_) => wrap!(StructArray),
    }
}

/// An array of `data_type` with no slots
///
/// ```
/// # use quiver_array::{new_empty_array, Array};
/// # use quiver_schema::DataType;
/// let array = new_empty_array(&DataType::new_list(DataType::Utf8, true));
/// assert!(array.is_empty());
/// assert_eq!(array.to_data().buffers().len(), 1);
/// ```
pub fn new_empty_array(data_type: &DataType) -> ArrayRef {
    make_array(ArrayData::new_empty(data_type))
}

/// An array of `data_type` whose `length` slots are all null
///
/// ```
/// # use quiver_array::{new_null_array, Array, Float64Array};
/// # use quiver_schema::DataType;
/// let array = new_null_array(&DataType::Float64, 2);
/// assert_eq!(array.null_count(), 2);
/// assert!(*array == Float64Array::from(vec![None, None]));
/// ```
pub fn new_null_array(data_type: &DataType, length: usize) -> ArrayRef {
    make_array(ArrayData::new_null(data_type, length))
}

pub(crate) fn check_data_type(data: &ArrayData, expected: &DataType) -> Result<(), QuiverError> {
    match data.data_type() == expected {
        true => Ok(()),
        false => Err(QuiverError::TypeMismatch(format!(
            "expected ArrayData with type {expected} got {}",
            data.data_type()
        ))),
    }
}

pub(crate) fn check_buffer_count(data: &ArrayData, expected: usize) -> Result<(), QuiverError> {
    match data.buffers().len() {
        n if n == expected => Ok(()),
        n => Err(QuiverError::StructuralMismatch(format!(
            "{} data should contain {expected} buffers, got {n}",
            data.data_type(),
        ))),
    }
}

/// Writes one line per slot, eliding the middle of arrays longer than 20
pub(crate) fn print_long_array<A, F>(
    array: &A,
    f: &mut std::fmt::Formatter,
    print_item: F,
) -> std::fmt::Result
where
    A: Array,
    F: Fn(&A, usize, &mut std::fmt::Formatter) -> std::fmt::Result,
{
    let len = array.len();
    let shown = |i: usize| len <= 20 || !(10..len - 10).contains(&i);
    for i in (0..len).filter(|&i| shown(i)) {
        if len > 20 && i == len - 10 {
            writeln!(f, "  ...{} elements...,", len - 20)?;
        }
        match array.is_null(i) {
            true => writeln!(f, "  null,")?,
            false => {
                write!(f, "  ")?;
                print_item(array, i, f)?;
                writeln!(f, ",")?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cast::AsArray;
    use crate::types::Int32Type;
    use quiver_schema::{Field, Fields};

    #[test]
    fn test_array_ref_forwards_to_pointee() {
        let array: ArrayRef = Arc::new(Int32Array::from(vec![Some(1), None, Some(3)]));
        assert_eq!(array.len(), 3);
        assert!(!array.is_empty());
        assert_eq!(array.null_count(), 1);
        assert!(array.is_null(1));
        assert_eq!(array.data_type(), &DataType::Int32);
        assert!(array.as_any().downcast_ref::<Int32Array>().is_some());

        let sliced = array.slice(1, 2);
        assert_eq!((sliced.offset(), sliced.len(), sliced.null_count()), (1, 2, 1));
        assert_eq!(sliced.to_data(), Int32Array::from(vec![None, Some(3)]).into_data());

        let by_ref = &array;
        assert_eq!(Array::len(&by_ref), 3);
        assert_eq!(array.into_data().len(), 3);
    }

    #[test]
    fn test_empty_arrays() {
        let ints = new_empty_array(&DataType::Int32);
        assert!(ints.as_primitive::<Int32Type>().values().is_empty());

        let strings = new_empty_array(&DataType::Utf8);
        assert_eq!(strings.as_string().value_offsets(), &[0]);

        let lists = new_empty_array(&DataType::new_list(DataType::Int32, false));
        assert_eq!(lists.as_list().value_offsets(), &[0]);
        assert!(lists.as_list().values().is_empty());
    }

    #[test]
    fn test_null_arrays() {
        let bools = new_null_array(&DataType::Boolean, 5);
        assert!((0..5).all(|i| bools.is_null(i)));

        let fields = Fields::from(vec![Field::new("v", DataType::Int64, false)]);
        let structs = new_null_array(&DataType::Struct(fields), 5);
        assert_eq!(structs.as_struct().column(0).len(), 5);
        assert_eq!(structs.null_count(), 5);

        let lists = new_null_array(&DataType::new_list(DataType::Int32, true), 5);
        assert_eq!(lists.as_list().value_offsets(), &[0; 6]);
        assert_eq!(lists.null_count(), 5);

        let nulls = new_null_array(&DataType::Null, 4);
        assert_eq!(nulls.null_count(), 4);
        assert!(nulls.nulls().is_none());
    }

    #[test]
    fn test_make_array_round_trip() {
        let original = StringArray::from(vec![Some("a"), None, Some("ccc")]);
        let array = make_array(original.to_data());
        assert_eq!(array.data_type(), &DataType::Utf8);
        assert_eq!(array.as_string(), &original);
    }

    #[test]
    fn test_dyn_equality_respects_slices() {
        let a: ArrayRef = Arc::new(Int32Array::from(vec![1, 2, 3, 4]));
        let b: ArrayRef = Arc::new(Int32Array::from(vec![2, 3]));
        assert_eq!(&a.slice(1, 2), &b);
        assert_ne!(&a.slice(0, 2), &b);
        assert!(*a.slice(1, 2) == Int32Array::from(vec![2, 3]));
    }

    #[test]
    fn test_debug_elides_long_arrays() {
        let short = format!("{:?}", Int32Array::from_iter_values(0..20));
        assert_eq!(short.lines().count(), 23);
        assert!(!short.contains("elements"));

        let long = format!("{:?}", Int32Array::from_iter_values(0..25));
        let lines: Vec<_> = long.lines().collect();
        assert_eq!(lines[11], "  9,");
        assert_eq!(lines[12], "  ...5 elements...,");
        assert_eq!(lines[13], "  15,");
        assert_eq!(lines.len(), 24);
    }
}
