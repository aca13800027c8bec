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

use quiver_buffer::{Buffer, BufferBuilder, NullBufferBuilder};
use quiver_schema::FieldRef;

use crate::array::default_list_field;
use crate::builder::ArrayBuilder;
use crate::{Array, ListArray};

/// Incrementally builds a [`ListArray`] on top of a child builder `T`
///
/// An element is *opened* by [`Self::append`] or [`Self::append_null`], which record
/// the child's current length as the element's start. Everything pushed through
/// [`Self::values`] afterwards belongs to the open element. There is no explicit
/// close: opening the next element ends the previous one, and [`Self::finish`] ends
/// the last one at the child's final length.
///
/// ```
/// # use quiver_array::builder::{ListBuilder, StringBuilder};
/// # use quiver_array::cast::AsArray;
/// # use quiver_array::Array;
/// // [["red", "green"], null, [], ["blue"]]
/// let mut builder = ListBuilder::new(StringBuilder::new());
/// builder.append();
/// builder.values().append_value("red");
/// builder.values().append_value("green");
/// builder.append_null();
/// builder.append();
/// builder.append();
/// builder.values().append_value("blue");
///
/// let list = builder.finish();
/// assert_eq!(list.value_offsets(), &[0, 2, 2, 2, 3]);
/// assert!(list.is_null(1));
/// assert_eq!(list.value(3).as_string().value(0), "blue");
/// ```
#[derive(Debug)]
pub struct GenericListBuilder<T: ArrayBuilder> {
    /// One start offset per element opened so far
    starts: BufferBuilder<i32>,
    validity: NullBufferBuilder,
    child: T,
    field: Option<FieldRef>,
}

impl<T: ArrayBuilder + Default> Default for GenericListBuilder<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: ArrayBuilder> GenericListBuilder<T> {
    /// Wrap `child`, which receives the values of every element
    pub fn new(child: T) -> Self {
        let capacity = child.len();
        Self::with_capacity(child, capacity)
    }

    /// Wrap `child`, reserving room for `capacity` elements
    pub fn with_capacity(child: T, capacity: usize) -> Self {
        Self {
            starts: BufferBuilder::new(capacity + 1),
            validity: NullBufferBuilder::new(capacity),
            child,
            field: None,
        }
    }

    /// Use `field` as the list's child field instead of a nullable "item" field
    ///
    /// [`Self::finish`] panics if the field does not agree with the child values.
    pub fn with_field(mut self, field: impl Into<FieldRef>) -> Self {
        self.field = Some(field.into());
        self
    }
}

forward_array_builder!(GenericListBuilder<T>, <T: ArrayBuilder>, |b| b.validity.len());

impl<T: ArrayBuilder> GenericListBuilder<T> {
    /// The child builder; values pushed here join the open element
    pub fn values(&mut self) -> &mut T {
        &mut self.child
    }

    /// Borrow the child builder
    pub fn values_ref(&self) -> &T {
        &self.child
    }

    /// The child's length as an `i32` offset
    #[inline]
    fn child_offset(&self) -> i32 {
        let len = self.child.len();
        i32::try_from(len)
            .unwrap_or_else(|_| panic!("list child of {len} values overflows i32 offsets"))
    }

    #[inline]
    fn open(&mut self, valid: bool) {
        let start = self.child_offset();
        self.starts.append(start);
        self.validity.append(valid);
    }

    /// Open a valid element
    ///
    /// # Panics
    ///
    /// Panics once the child holds more than `i32::MAX` values
    #[inline]
    pub fn append(&mut self) {
        self.open(true)
    }

    /// Open a null element
    ///
    /// Values pushed before the next element is opened are still stored, hidden
    /// behind the null slot.
    #[inline]
    pub fn append_null(&mut self) {
        self.open(false)
    }

    /// Open a valid element and push all of `values` into it
    ///
    /// ```
    /// # use quiver_array::builder::{Int32Builder, ListBuilder};
    /// let mut builder = ListBuilder::new(Int32Builder::new());
    /// builder.append_value([Some(1), None]);
    /// builder.append_value(Vec::<Option<i32>>::new());
    /// builder.append_value((2..5).map(Some));
    /// assert_eq!(builder.finish().value_offsets(), &[0, 2, 2, 5]);
    /// ```
    #[inline]
    pub fn append_value<I, V>(&mut self, values: I)
    where
        T: Extend<Option<V>>,
        I: IntoIterator<Item = Option<V>>,
    {
        self.append();
        self.child.extend(values);
    }

    /// [`Self::append_value`] for `Some`, [`Self::append_null`] for `None`
    #[inline]
    pub fn append_option<I, V>(&mut self, values: Option<I>)
    where
        T: Extend<Option<V>>,
        I: IntoIterator<Item = Option<V>>,
    {
        match values {
            Some(values) => self.append_value(values),
            None => self.append_null(),
        }
    }

    /// Close the open element, build the [`ListArray`] and reset the builder
    ///
    /// # Panics
    ///
    /// Panics if a field given to [`Self::with_field`] does not match the child values
    pub fn finish(&mut self) -> ListArray {
        let end = self.child_offset();
        self.starts.append(end);
        let offsets = self.starts.finish();
        let nulls = self.validity.finish();
        let values = self.child.finish();
        let field = self.child_field(values.as_ref());
        ListArray::new(field, offsets, values, nulls)
    }

    /// Build a [`ListArray`] of the current contents, leaving the last element open
    pub fn finish_cloned(&self) -> ListArray {
        let mut offsets = self.starts.as_slice().to_vec();
        offsets.push(self.child_offset());
        let nulls = self.validity.finish_cloned();
        let values = self.child.finish_cloned();
        let field = self.child_field(values.as_ref());
        ListArray::new(field, Buffer::from_vec(offsets), values, nulls)
    }

    fn child_field(&self, values: &dyn Array) -> FieldRef {
        self.field
            .clone()
            .unwrap_or_else(|| default_list_field(values.data_type().clone()))
    }

    /// Start offsets of the elements opened so far
    pub fn starts_slice(&self) -> &[i32] {
        self.starts.as_slice()
    }

    /// The validity bitmap built so far, `None` while every element is valid
    pub fn validity_slice(&self) -> Option<&[u8]> {
        self.validity.as_slice()
    }
}

/// Each `Some` opens a valid element holding its values, each `None` a null one
impl<B, V, E> Extend<Option<V>> for GenericListBuilder<B>
where
    B: ArrayBuilder + Extend<E>,
    V: IntoIterator<Item = E>,
{
    #[inline]
    fn extend<T: IntoIterator<Item = Option<V>>>(&mut self, iter: T) {
        iter.into_iter().for_each(|item| match item {
            Some(values) => {
                self.append();
                self.child.extend(values);
            }
            None => self.append_null(),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::builder::{Int32Builder, ListBuilder, StringBuilder};
    use crate::cast::AsArray;
    use crate::types::Int32Type;
    use crate::{Int32Array, StringArray};
    use quiver_schema::{DataType, Field};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn ints(list: &ListArray) -> &Int32Array {
        list.values().as_primitive::<Int32Type>()
    }

    #[test]
    fn test_open_elements() {
        // [[10, 11], [12], [13, 14, 15]]
        let mut builder = ListBuilder::new(Int32Builder::with_capacity(6));
        let mut next = 10;
        for len in [2, 1, 3] {
            builder.append();
            for _ in 0..len {
                builder.values().append_value(next);
                next += 1;
            }
        }
        let list = builder.finish();

        assert_eq!(list.len(), 3);
        assert_eq!(list.null_count(), 0);
        assert!(list.nulls().is_none());
        assert_eq!(list.value_type(), DataType::Int32);
        assert_eq!(list.value_offsets(), &[0, 2, 3, 6]);
        assert_eq!(list.value_offset(2).unwrap(), 3);
        assert_eq!(list.value_length(2).unwrap(), 3);
        assert_eq!(ints(&list).values(), &[10, 11, 12, 13, 14, 15]);
    }

    #[test]
    fn test_null_and_empty_elements() {
        // [[], null, [null, 8], null]
        let mut builder = ListBuilder::new(Int32Builder::new());
        builder.append();
        builder.append_null();
        builder.append();
        builder.values().append_null();
        builder.values().append_value(8);
        builder.append_null();
        let list = builder.finish();

        assert_eq!(list.value_offsets(), &[0, 0, 0, 2, 2]);
        assert_eq!(list.null_count(), 2);
        assert!(list.is_valid(0) && list.is_null(1) && list.is_valid(2) && list.is_null(3));
        assert_eq!(list.value_length(0).unwrap(), 0);
        assert_eq!(ints(&list).null_count(), 1);
    }

    #[test]
    fn test_values_after_last_open_join_it() {
        let mut builder = ListBuilder::new(Int32Builder::new());
        builder.append();
        builder.values().append_value(1);
        builder.append();
        builder.values().append_slice(&[2, 3, 4]);

        let list = builder.finish();
        assert_eq!(list.value_offsets(), &[0, 1, 4]);
        assert_eq!(list.value(1).as_primitive::<Int32Type>().values(), &[2, 3, 4]);
    }

    #[test]
    fn test_values_under_null_element_are_kept() {
        let mut builder = ListBuilder::new(Int32Builder::new());
        builder.append_null();
        builder.values().append_value(9);
        builder.append();
        builder.values().append_value(1);

        let list = builder.finish();
        assert_eq!(list.value_offsets(), &[0, 1, 2]);
        assert!(list.is_null(0));
        assert_eq!(ints(&list).values(), &[9, 1]);
    }

    #[test]
    fn test_no_elements() {
        let list = ListBuilder::new(Int32Builder::new()).finish();
        assert!(list.is_empty());
        assert_eq!(list.value_offsets(), &[0]);

        // child values without an opened element are not referenced
        let mut builder = ListBuilder::new(Int32Builder::new());
        builder.values().append_slice(&[1, 2]);
        let list = builder.finish();
        assert!(list.is_empty());
        assert_eq!(list.value_offsets(), &[2]);
        assert_eq!(list.values().len(), 2);
    }

    #[test]
    fn test_append_option_and_extend() {
        let mut builder = ListBuilder::new(Int32Builder::new());
        builder.append_option(Some([Some(3)]));
        builder.append_option(None::<[Option<i32>; 0]>);
        builder.extend([None, Some(vec![Some(4), None]), Some(vec![])]);

        let expected = ListArray::from_iter_primitive::<Int32Type, _, _>([
            Some(vec![Some(3)]),
            None,
            None,
            Some(vec![Some(4), None]),
            Some(vec![]),
        ]);
        let list = builder.finish();
        assert_eq!(list, expected);
        assert_eq!(list.value_offsets(), &[0, 1, 1, 1, 3, 3]);
    }

    #[test]
    fn test_finish_resets() {
        let mut builder = ListBuilder::new(Int32Builder::new());
        builder.append_value([Some(1), Some(2)]);
        builder.append_null();
        assert_eq!(builder.finish().len(), 2);

        assert!(builder.is_empty());
        assert!(builder.values_ref().is_empty());
        assert!(builder.starts_slice().is_empty());
        assert!(builder.validity_slice().is_none());

        builder.append_value([Some(3)]);
        let list = builder.finish();
        assert_eq!(list.value_offsets(), &[0, 1]);
        assert_eq!(list.null_count(), 0);
    }

    #[test]
    fn test_finish_cloned_keeps_last_element_open() {
        let mut builder = ListBuilder::new(Int32Builder::new());
        builder.append_value([Some(1), Some(2)]);
        builder.append();
        builder.values().append_value(3);

        let snapshot = builder.finish_cloned();
        assert_eq!(snapshot.value_offsets(), &[0, 2, 3]);

        builder.values().append_value(4);
        assert_eq!(builder.len(), 2);
        assert_eq!(builder.starts_slice(), &[0, 2]);

        let list = builder.finish();
        assert_eq!(list.value_offsets(), &[0, 2, 4]);
        assert_eq!(snapshot.values().len(), 3);
    }

    #[test]
    fn test_nested_lists() {
        // [[[1], [2, 3]], null, [[], null, [4]]]
        let mut builder = ListBuilder::new(ListBuilder::new(Int32Builder::new()));
        builder.append();
        builder.values().append_value([Some(1)]);
        builder.values().append_value([Some(2), Some(3)]);
        builder.append_null();
        builder.append();
        builder.values().append();
        builder.values().append_null();
        builder.values().append_value([Some(4)]);

        let outer = builder.finish();
        assert_eq!(outer.value_offsets(), &[0, 2, 2, 5]);
        assert_eq!(outer.null_count(), 1);

        let inner = outer.values().as_list();
        assert_eq!(inner.value_offsets(), &[0, 1, 3, 3, 3, 4]);
        assert_eq!(inner.null_count(), 1);
        assert_eq!(ints(inner).values(), &[1, 2, 3, 4]);

        let last = outer.value(2);
        let lengths: Vec<_> = (0..3).map(|i| last.as_list().value_length(i).unwrap()).collect();
        assert_eq!(lengths, vec![0, 0, 1]);
    }

    #[test]
    fn test_custom_field() {
        let field = Arc::new(Field::new("tag", DataType::Utf8, false));
        let mut builder = ListBuilder::new(StringBuilder::new()).with_field(field.clone());
        builder.append_value([Some("x")]);
        builder.append();
        let list = builder.finish();

        assert_eq!(list.field(), &field);
        assert_eq!(list.data_type(), &DataType::List(field));
        assert_eq!(list.values().as_string(), &StringArray::from(vec!["x"]));
    }

    #[test]
    #[should_panic(expected = "cannot contain nulls")]
    fn test_custom_field_rejects_nulls() {
        let field = Field::new_list_field(DataType::Int32, false);
        let mut builder = ListBuilder::new(Int32Builder::new()).with_field(field);
        builder.append_value([None]);
        builder.finish();
    }

    #[test]
    #[should_panic(expected = "ListArray expected data type Int64 got Int32")]
    fn test_custom_field_rejects_other_type() {
        let field = Field::new_list_field(DataType::Int64, true);
        let mut builder = ListBuilder::new(Int32Builder::new()).with_field(field);
        builder.append();
        builder.finish();
    }

    #[test]
    fn test_random_lists_match_from_iter() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..25 {
            let lists: Vec<Option<Vec<Option<i32>>>> = (0..rng.random_range(0..40))
                .map(|_| {
                    rng.random_bool(0.75).then(|| {
                        (0..rng.random_range(0..5))
                            .map(|_| rng.random_bool(0.85).then(|| rng.random()))
                            .collect()
                    })
                })
                .collect();

            let mut builder = ListBuilder::new(Int32Builder::new());
            for list in &lists {
                match list {
                    Some(values) => {
                        builder.append();
                        values.iter().for_each(|v| builder.values().append_option(*v));
                    }
                    None => builder.append_null(),
                }
            }
            let built = builder.finish();
            assert_eq!(built, ListArray::from_iter_primitive::<Int32Type, _, _>(lists));

            let offsets = built.value_offsets();
            assert_eq!(offsets.len(), built.len() + 1);
            assert!(offsets.windows(2).all(|w| w[0] <= w[1]));
            assert_eq!(*offsets.last().unwrap() as usize, built.values().len());
        }
    }
}
