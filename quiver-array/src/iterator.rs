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

//! Iterators over the slots of an [`Array`](crate::Array)

use std::ops::Range;

use quiver_buffer::NullBuffer;

use crate::array::{ArrayAccessor, BinaryArray, BooleanArray, ListArray, PrimitiveArray, StringArray};

/// Iterates the slots of an [`ArrayAccessor`], yielding `None` for null slots
///
/// Walks from both ends and knows its exact length.
#[derive(Debug, Clone)]
pub struct ArrayIter<T: ArrayAccessor> {
    array: T,
    nulls: Option<NullBuffer>,
    remaining: Range<usize>,
}

impl<T: ArrayAccessor> ArrayIter<T> {
    /// Creates an iterator over every slot of `array`
    pub fn new(array: T) -> Self {
        // an all-valid bitmap is skipped entirely
        let nulls = array.nulls().filter(|n| n.null_count() > 0).cloned();
        let remaining = 0..array.len();
        Self {
            array,
            nulls,
            remaining,
        }
    }

    #[inline]
    fn slot(&self, idx: usize) -> Option<T::Item> {
        match &self.nulls {
            Some(nulls) if nulls.is_null(idx) => None,
            // SAFETY: `idx` was drawn from `0..array.len()`
            _ => Some(unsafe { self.array.value_unchecked(idx) }),
        }
    }
}

impl<T: ArrayAccessor> Iterator for ArrayIter<T> {
    type Item = Option<T::Item>;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let idx = self.remaining.next()?;
        Some(self.slot(idx))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.remaining.size_hint()
    }
}

impl<T: ArrayAccessor> DoubleEndedIterator for ArrayIter<T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        let idx = self.remaining.next_back()?;
        Some(self.slot(idx))
    }
}

impl<T: ArrayAccessor> ExactSizeIterator for ArrayIter<T> {}

/// [`ArrayIter`] over a [`PrimitiveArray`]
pub type PrimitiveIter<'a, T> = ArrayIter<&'a PrimitiveArray<T>>;
/// [`ArrayIter`] over a [`BooleanArray`]
pub type BooleanIter<'a> = ArrayIter<&'a BooleanArray>;
/// [`ArrayIter`] over a [`StringArray`]
pub type StringIter<'a> = ArrayIter<&'a StringArray>;
/// [`ArrayIter`] over a [`BinaryArray`]
pub type BinaryIter<'a> = ArrayIter<&'a BinaryArray>;
/// [`ArrayIter`] over a [`ListArray`], yielding each element as an [`ArrayRef`](crate::ArrayRef)
pub type ListIter<'a> = ArrayIter<&'a ListArray>;

#[cfg(test)]
mod tests {
    use crate::array::{BinaryArray, BooleanArray, Int32Array, StringArray};

    #[test]
    fn test_collect_round_trip() {
        let ints = Int32Array::from(vec![Some(0), None, Some(2)]);
        let plus_one: Int32Array = ints.iter().map(|v| v.map(|v| v + 1)).collect();
        assert_eq!(plus_one, Int32Array::from(vec![Some(1), None, Some(3)]));

        let strings = StringArray::from(vec![Some("a"), None, Some("ccc")]);
        let suffixed: StringArray = strings.iter().map(|v| v.map(|v| format!("{v}!"))).collect();
        assert_eq!(suffixed, StringArray::from(vec![Some("a!"), None, Some("ccc!")]));

        let binary = BinaryArray::from(vec![None, Some(&b"xy"[..])]);
        assert_eq!(binary.iter().collect::<BinaryArray>(), binary);

        let bools = BooleanArray::from(vec![Some(true), None, Some(false)]);
        assert_eq!(bools.iter().collect::<BooleanArray>(), bools);
    }

    #[test]
    fn test_both_ends_meet() {
        let array = Int32Array::from(vec![Some(0), None, Some(2), None, Some(4)]);
        let mut iter = array.iter();
        assert_eq!(iter.len(), 5);
        assert_eq!(iter.next(), Some(Some(0)));
        assert_eq!(iter.next_back(), Some(Some(4)));
        assert_eq!(iter.next_back(), Some(None));
        assert_eq!(iter.len(), 2);
        assert_eq!(iter.next(), Some(None));
        assert_eq!(iter.next_back(), Some(Some(2)));
        assert_eq!(iter.next(), None);
        assert_eq!(iter.next_back(), None);
    }

    #[test]
    fn test_reversed() {
        let array = StringArray::from(vec![Some("a"), None, Some("b")]);
        let reversed: StringArray = array.iter().rev().collect();
        assert_eq!(reversed, StringArray::from(vec![Some("b"), None, Some("a")]));
    }

    #[test]
    fn test_iter_on_slice() {
        let array = StringArray::from(vec![Some("x"), None, Some("y"), Some("z")]);
        let sliced = array.slice(1, 2);
        assert_eq!(sliced.iter().len(), 2);
        assert_eq!(sliced.iter().collect::<Vec<_>>(), vec![None, Some("y")]);

        // the slice is valid throughout, its parent's bitmap must not leak in
        let valid = array.slice(2, 2);
        assert_eq!(valid.iter().collect::<Vec<_>>(), vec![Some("y"), Some("z")]);
    }
}
