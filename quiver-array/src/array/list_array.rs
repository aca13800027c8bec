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

use std::sync::Arc;

use quiver_buffer::{Buffer, NullBuffer};
use quiver_data::ArrayData;
use quiver_schema::{DataType, Field, FieldRef, QuiverError};

use crate::array::{check_buffer_count, check_data_type, make_array, print_long_array};
use crate::builder::{ListBuilder, PrimitiveBuilder};
use crate::iterator::ArrayIter;
use crate::types::QuiverPrimitiveType;
use crate::{Array, ArrayAccessor, ArrayRef};

/// Variable length lists of a single child type
///
/// A list of `n` elements holds `n + 1` `i32` offsets into one child array. List
/// `i` is `values[offsets[i]..offsets[i + 1]]`, and a null list has two equal
/// offsets.
///
/// ```text
///  lists          offsets     values
///  [a, b, c]      0           a b c d
///  []             3
///  null           3
///  [d]            3
///                 4
/// ```
///
/// [`Self::slice`] only narrows the window over the offsets, [`Self::values`]
/// stays the whole child.
#[derive(Clone)]
pub struct ListArray {
    data: ArrayData,
    values: ArrayRef,
}

impl ListArray {
    /// A list array over `values` with element `i` spanning `offsets[i]..offsets[i + 1]`
    ///
    /// # Errors
    ///
    /// [`QuiverError::InvalidArgument`] if `nulls` has the wrong length, if `values`
    /// is not of the type of `field`, or if it has nulls while `field` is not
    /// nullable. [`QuiverError::StructuralMismatch`] if the offsets are empty,
    /// decrease or run past the end of `values`.
    pub fn try_new(
        field: FieldRef,
        offsets: Buffer,
        values: ArrayRef,
        nulls: Option<NullBuffer>,
    ) -> Result<Self, QuiverError> {
        let len = match offsets.len() / std::mem::size_of::<i32>() {
            0 => {
                return Err(QuiverError::StructuralMismatch(
                    "a list array needs at least one offset".to_string(),
                ))
            }
            n => n - 1,
        };
        if let Some(n) = nulls.as_ref().filter(|n| n.len() != len) {
            return Err(QuiverError::InvalidArgument(format!(
                "validity of {} slots for a ListArray of {len} lists",
                n.len(),
            )));
        }
        if field.data_type() != values.data_type() {
            return Err(QuiverError::InvalidArgument(format!(
                "ListArray expected data type {} got {} for {:?}",
                field.data_type(),
                values.data_type(),
                field.name()
            )));
        }
        if !field.is_nullable() && values.null_count() != 0 {
            return Err(QuiverError::InvalidArgument(format!(
                "list field {:?} is not nullable and cannot contain nulls",
                field.name()
            )));
        }

        let data = ArrayData::builder(DataType::List(field))
            .len(len)
            .add_buffer(offsets)
            .add_child_data(values.to_data())
            .nulls(nulls)
            .build()?;
        Ok(Self { data, values })
    }

    /// [`Self::try_new`], panicking on error
    pub fn new(
        field: FieldRef,
        offsets: Buffer,
        values: ArrayRef,
        nulls: Option<NullBuffer>,
    ) -> Self {
        Self::try_new(field, offsets, values, nulls).unwrap_or_else(|e| panic!("{e}"))
    }

    /// View `data` as a list array
    ///
    /// [`QuiverError::TypeMismatch`] unless it is a [`DataType::List`] whose child
    /// matches the item field.
    pub fn try_new_from_data(data: ArrayData) -> Result<Self, QuiverError> {
        let DataType::List(field) = data.data_type() else {
            return Err(QuiverError::TypeMismatch(format!(
                "cannot view {} data as a ListArray",
                data.data_type()
            )));
        };
        check_data_type(&data, &DataType::List(field.clone()))?;
        check_buffer_count(&data, 1)?;
        let [child] = data.child_data() else {
            return Err(QuiverError::StructuralMismatch(format!(
                "list data has {} children instead of one",
                data.child_data().len()
            )));
        };
        if child.data_type() != field.data_type() {
            return Err(QuiverError::TypeMismatch(format!(
                "list of {} holds a {} child",
                field.data_type(),
                child.data_type(),
            )));
        }
        let needed = data.offset() + data.len() + 1;
        let available = data.buffers()[0].try_typed_data::<i32>()?.len();
        if available < needed {
            return Err(QuiverError::StructuralMismatch(format!(
                "{needed} offsets needed, the buffer has {available}"
            )));
        }
        let values = make_array(child.clone());
        Ok(Self { data, values })
    }

    /// Number of lists
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// The whole child, including values outside a sliced window
    pub fn values(&self) -> &ArrayRef {
        &self.values
    }

    pub fn value_type(&self) -> DataType {
        self.values.data_type().clone()
    }

    /// The item field
    pub fn field(&self) -> &FieldRef {
        match self.data.data_type() {
            DataType::List(field) => field,
            _ => unreachable!(),
        }
    }

    /// List `i` as a slice of the child
    ///
    /// # Safety
    ///
    /// `i` must be less than [`Self::len`]
    pub unsafe fn value_unchecked(&self, i: usize) -> ArrayRef {
        let offsets = self.value_offsets();
        let start = *offsets.get_unchecked(i) as usize;
        let end = *offsets.get_unchecked(i + 1) as usize;
        self.values.slice(start, end - start)
    }

    /// List `i` as a slice of the child
    ///
    /// # Panics
    ///
    /// Panics if `i >= self.len()`
    pub fn value(&self, i: usize) -> ArrayRef {
        assert!(
            i < self.len(),
            "cannot read list {i} of a ListArray of length {}",
            self.len()
        );
        // SAFETY: checked above
        unsafe { self.value_unchecked(i) }
    }

    /// The `len() + 1` offsets of this window, not rebased to zero
    #[inline]
    pub fn value_offsets(&self) -> &[i32] {
        &self.data.buffer::<i32>(0)[..=self.len()]
    }

    /// Where list `i` starts in [`Self::values`]
    ///
    /// ```
    /// # use quiver_array::ListArray;
    /// # use quiver_array::types::Int32Type;
    /// let list = ListArray::from_iter_primitive::<Int32Type, _, _>(vec![
    ///     Some(vec![Some(1), Some(2)]),
    ///     Some(vec![Some(3)]),
    /// ]);
    /// assert_eq!(list.value_offset(1).unwrap(), 2);
    /// assert!(list.value_offset(2).is_err());
    /// ```
    #[inline]
    pub fn value_offset(&self, i: usize) -> Result<i32, QuiverError> {
        self.span(i).map(|(start, _)| start)
    }

    /// Number of values in list `i`, zero for a null list
    #[inline]
    pub fn value_length(&self, i: usize) -> Result<i32, QuiverError> {
        self.span(i).map(|(start, end)| end - start)
    }

    fn span(&self, i: usize) -> Result<(i32, i32), QuiverError> {
        match self.value_offsets().get(i..i + 2) {
            Some(&[start, end]) if i < self.len() => Ok((start, end)),
            _ => Err(QuiverError::IndexOutOfRange {
                index: i,
                len: self.len(),
            }),
        }
    }

    /// Iterate over the lists, `None` for nulls
    pub fn iter(&self) -> ArrayIter<&ListArray> {
        ArrayIter::new(self)
    }

    /// The `length` lists starting at `offset`, sharing offsets and child
    pub fn slice(&self, offset: usize, length: usize) -> Self {
        Self {
            data: self.data.slice(offset, length),
            values: Arc::clone(&self.values),
        }
    }

    /// Build a list array of primitives from nested options
    ///
    /// ```
    /// # use quiver_array::{Array, ListArray};
    /// # use quiver_array::types::UInt8Type;
    /// let lists = ListArray::from_iter_primitive::<UInt8Type, _, _>(vec![
    ///    Some(vec![Some(0), None]),
    ///    None,
    ///    Some(vec![]),
    /// ]);
    /// assert_eq!(lists.value_offsets(), &[0, 2, 2, 2]);
    /// assert!(lists.is_null(1));
    /// ```
    pub fn from_iter_primitive<T, P, I>(iter: I) -> Self
    where
        T: QuiverPrimitiveType,
        P: IntoIterator<Item = Option<<T as QuiverPrimitiveType>::Native>>,
        I: IntoIterator<Item = Option<P>>,
    {
        let iter = iter.into_iter();
        let mut builder = ListBuilder::with_capacity(PrimitiveBuilder::<T>::new(), iter.size_hint().0);
        iter.for_each(|list| builder.append_option(list));
        builder.finish()
    }
}

impl From<ListArray> for ArrayData {
    fn from(array: ListArray) -> Self {
        array.data
    }
}

/// # Panics
///
/// Panics if [`ListArray::try_new_from_data`] fails
impl From<ArrayData> for ListArray {
    fn from(data: ArrayData) -> Self {
        Self::try_new_from_data(data).unwrap_or_else(|e| panic!("ListArray: {e}"))
    }
}

data_backed_array!(ListArray);

impl<'a> ArrayAccessor for &'a ListArray {
    type Item = ArrayRef;

    fn value(&self, index: usize) -> Self::Item {
        ListArray::value(self, index)
    }

    unsafe fn value_unchecked(&self, index: usize) -> Self::Item {
        ListArray::value_unchecked(self, index)
    }
}

impl<'a> IntoIterator for &'a ListArray {
    type Item = Option<ArrayRef>;
    type IntoIter = ArrayIter<Self>;

    fn into_iter(self) -> Self::IntoIter {
        ArrayIter::new(self)
    }
}

impl PartialEq for ListArray {
    fn eq(&self, other: &Self) -> bool {
        self.data == other.data
    }
}

impl std::fmt::Debug for ListArray {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        writeln!(f, "ListArray\n[")?;
        print_long_array(self, f, |array, index, f| {
            std::fmt::Debug::fmt(&array.value(index), f)
        })?;
        write!(f, "]")
    }
}

/// The nullable `item` field used when a list is built without one
pub(crate) fn default_list_field(data_type: DataType) -> FieldRef {
    Arc::new(Field::new_list_field(data_type, true))
}
