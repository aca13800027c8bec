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

//! Append-only builders that freeze into immutable buffers

mod boolean;
mod null;

pub use boolean::*;
pub use null::*;

use std::marker::PhantomData;

use crate::{Buffer, MutableBuffer, NativeType};

/// Grows a [`Buffer`] one native value of type `T` at a time
///
/// Lengths are counted in values, not bytes.
///
/// ```
/// # use quiver_buffer::builder::BufferBuilder;
/// let mut offsets = BufferBuilder::<i32>::new(4);
/// offsets.append(0);
/// offsets.append_slice(&[3, 3]);
/// offsets.append_n(2, 9);
/// assert_eq!(offsets.as_slice(), &[0, 3, 3, 9, 9]);
///
/// let frozen = offsets.finish();
/// assert_eq!(frozen.len(), 20);
/// assert!(offsets.is_empty());
/// ```
#[derive(Debug)]
pub struct BufferBuilder<T: NativeType> {
    buffer: MutableBuffer,
    len: usize,
    _marker: PhantomData<T>,
}

impl<T: NativeType> BufferBuilder<T> {
    /// An empty builder with room for `capacity` values
    #[inline]
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: MutableBuffer::new(capacity * std::mem::size_of::<T>()),
            len: 0,
            _marker: PhantomData,
        }
    }

    /// Values appended so far
    pub fn len(&self) -> usize {
        self.len
    }

    /// True before the first append
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Values that fit without reallocating
    pub fn capacity(&self) -> usize {
        self.buffer.capacity() / std::mem::size_of::<T>()
    }

    /// Append `n` zeroed values, the placeholder behind a null slot
    #[inline]
    pub fn advance(&mut self, n: usize) {
        self.buffer.extend_zeros(n * std::mem::size_of::<T>());
        self.len += n;
    }

    /// Make room for `n` more values
    #[inline]
    pub fn reserve(&mut self, n: usize) {
        self.buffer.reserve(n * std::mem::size_of::<T>());
    }

    /// Append one value
    #[inline]
    pub fn append(&mut self, v: T) {
        self.buffer.push(v);
        self.len += 1;
    }

    /// Append `v`, `n` times
    #[inline]
    pub fn append_n(&mut self, n: usize, v: T) {
        self.extend(std::iter::repeat(v).take(n));
    }

    /// Append every value of `slice`
    #[inline]
    pub fn append_slice(&mut self, slice: &[T]) {
        self.buffer.extend_from_slice(slice);
        self.len += slice.len();
    }

    /// The values appended so far
    pub fn as_slice(&self) -> &[T] {
        self.buffer.typed_data()
    }

    /// Mutable access to the values appended so far
    pub fn as_slice_mut(&mut self) -> &mut [T] {
        self.buffer.typed_data_mut()
    }

    /// Keep only the first `len` values
    #[inline]
    pub fn truncate(&mut self, len: usize) {
        self.buffer.truncate(len * std::mem::size_of::<T>());
        self.len = self.len.min(len);
    }

    /// Freeze the values into a [`Buffer`], leaving the builder empty
    #[inline]
    pub fn finish(&mut self) -> Buffer {
        self.len = 0;
        std::mem::take(&mut self.buffer).into()
    }
}

impl<T: NativeType> Default for BufferBuilder<T> {
    fn default() -> Self {
        Self::new(0)
    }
}

impl<T: NativeType> Extend<T> for BufferBuilder<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        let before = self.buffer.len();
        self.buffer.extend(iter);
        self.len += (self.buffer.len() - before) / std::mem::size_of::<T>();
    }
}
