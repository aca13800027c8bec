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

use crate::{bit_util, BooleanBuffer, Buffer, MutableBuffer};

/// Builder for [`BooleanBuffer`]
#[derive(Debug)]
pub struct BooleanBufferBuilder {
    buffer: MutableBuffer,
    len: usize,
}

impl BooleanBufferBuilder {
    /// Creates a new [`BooleanBufferBuilder`] with room for at least `capacity` bits
    #[inline]
    pub fn new(capacity: usize) -> Self {
        let byte_capacity = bit_util::ceil(capacity, 8);
        let buffer = MutableBuffer::new(byte_capacity);
        Self { buffer, len: 0 }
    }

    /// Returns the number of bits in this builder
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if no bits have been appended
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the capacity of this builder in bits
    #[inline]
    pub fn capacity(&self) -> usize {
        self.buffer.capacity() * 8
    }

    /// Sets the bit at `index` to `v`
    ///
    /// # Panics
    ///
    /// Panics if `index >= self.len()`
    #[inline]
    pub fn set_bit(&mut self, index: usize, v: bool) {
        assert!(index < self.len, "bit index {index} out of bounds");
        match v {
            true => bit_util::set_bit(self.buffer.as_slice_mut(), index),
            false => bit_util::unset_bit(self.buffer.as_slice_mut(), index),
        }
    }

    /// Returns the bit at `index`
    #[inline]
    pub fn get_bit(&self, index: usize) -> bool {
        assert!(index < self.len, "bit index {index} out of bounds");
        bit_util::get_bit(self.buffer.as_slice(), index)
    }

    #[inline]
    fn advance(&mut self, additional: usize) {
        let new_len = self.len + additional;
        let new_len_bytes = bit_util::ceil(new_len, 8);
        if new_len_bytes > self.buffer.len() {
            self.buffer.resize(new_len_bytes, 0);
        }
        self.len = new_len;
    }

    /// Appends a single bit
    #[inline]
    pub fn append(&mut self, v: bool) {
        self.advance(1);
        if v {
            bit_util::set_bit(self.buffer.as_slice_mut(), self.len - 1);
        }
    }

    /// Appends `additional` copies of `v`
    #[inline]
    pub fn append_n(&mut self, additional: usize, v: bool) {
        let start = self.len;
        self.advance(additional);
        if v {
            let slice = self.buffer.as_slice_mut();
            (start..start + additional).for_each(|i| bit_util::set_bit(slice, i));
        }
    }

    /// Appends every bit of `slice`
    #[inline]
    pub fn append_slice(&mut self, slice: &[bool]) {
        slice.iter().for_each(|b| self.append(*b))
    }

    /// Shorten this builder to `len` bits, no-op if `len` exceeds the current length
    pub fn truncate(&mut self, len: usize) {
        if len > self.len {
            return;
        }
        let new_len_bytes = bit_util::ceil(len, 8);
        self.buffer.truncate(new_len_bytes);
        // clear the unused bits of the last byte so appends start from zero
        if len % 8 != 0 {
            let last = &mut self.buffer.as_slice_mut()[new_len_bytes - 1];
            *last &= (1_u8 << (len % 8)) - 1;
        }
        self.len = len;
    }

    /// Returns the packed bits appended so far
    pub fn as_slice(&self) -> &[u8] {
        self.buffer.as_slice()
    }

    /// Resets this builder and returns the built [`BooleanBuffer`]
    #[inline]
    pub fn finish(&mut self) -> BooleanBuffer {
        let buf = std::mem::take(&mut self.buffer);
        let len = std::mem::replace(&mut self.len, 0);
        BooleanBuffer::new(buf.into(), 0, len)
    }

    /// Returns a [`BooleanBuffer`] of the bits appended so far, leaving the builder intact
    pub fn finish_cloned(&self) -> BooleanBuffer {
        BooleanBuffer::new(Buffer::from_slice_ref(self.as_slice()), 0, self.len)
    }
}

impl From<BooleanBufferBuilder> for BooleanBuffer {
    fn from(mut value: BooleanBufferBuilder) -> Self {
        value.finish()
    }
}
