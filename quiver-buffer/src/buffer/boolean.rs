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

use crate::{bit_util, Buffer, MutableBuffer};

/// Bit-packed booleans viewed through a bit `offset` and `len`
///
/// Slicing only moves the window, the packed bytes are shared. Equality compares the
/// bits in the window, not the bytes around it.
///
/// ```
/// # use quiver_buffer::BooleanBuffer;
/// let bits = BooleanBuffer::from(vec![true, false, false, true, true]);
/// let tail = bits.slice(2, 3);
/// assert_eq!(tail.iter().collect::<Vec<_>>(), [false, true, true]);
/// assert_eq!(tail.count_set_bits(), 2);
/// ```
#[derive(Debug, Clone, Eq)]
pub struct BooleanBuffer {
    buffer: Buffer,
    offset: usize,
    len: usize,
}

impl PartialEq for BooleanBuffer {
    fn eq(&self, other: &Self) -> bool {
        self.len == other.len && self.iter().eq(other.iter())
    }
}

impl BooleanBuffer {
    /// View `len` bits of `buffer` starting at bit `offset`
    ///
    /// # Panics
    ///
    /// Panics if `buffer` holds fewer than `offset + len` bits
    pub fn new(buffer: Buffer, offset: usize, len: usize) -> Self {
        let available = buffer.len().saturating_mul(8);
        assert!(
            offset.saturating_add(len) <= available,
            "buffer of {} bytes cannot hold {len} bits at offset {offset}",
            buffer.len()
        );
        Self {
            buffer,
            offset,
            len,
        }
    }

    /// `len` ones
    pub fn new_set(len: usize) -> Self {
        let bytes = bit_util::ceil(len, 8);
        let ones = MutableBuffer::new(bytes).with_bitset(bytes, true);
        Self::new(ones.into(), 0, len)
    }

    /// `len` zeros
    pub fn new_unset(len: usize) -> Self {
        Self::new(MutableBuffer::new_null(len).into(), 0, len)
    }

    /// Number of ones in the window
    pub fn count_set_bits(&self) -> usize {
        self.buffer.count_set_bits_offset(self.offset, self.len)
    }

    /// Bit `i` of the window
    ///
    /// # Panics
    ///
    /// Panics if `i >= self.len()`
    #[inline]
    pub fn value(&self, i: usize) -> bool {
        assert!(
            i < self.len,
            "bit index {i} out of bounds for BooleanBuffer of length {}",
            self.len
        );
        bit_util::get_bit(&self.buffer, self.offset + i)
    }

    /// Bit position of the window within [`Self::values`]
    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Length of the window in bits
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// True for a zero-length window
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// All packed bytes, ignoring the window
    #[inline]
    pub fn values(&self) -> &[u8] {
        &self.buffer
    }

    /// Narrow the window to `len` bits starting `offset` bits in
    ///
    /// # Panics
    ///
    /// Panics if the new window does not fit in the current one
    pub fn slice(&self, offset: usize, len: usize) -> Self {
        assert!(
            offset.saturating_add(len) <= self.len,
            "cannot slice {len} bits at offset {offset} from a BooleanBuffer of length {}",
            self.len
        );
        Self {
            buffer: self.buffer.clone(),
            offset: self.offset + offset,
            len,
        }
    }

    /// Copy the window into a new [`Buffer`] starting at bit 0
    pub fn sliced(&self) -> Buffer {
        self.buffer.bit_slice(self.offset, self.len)
    }

    /// True if both windows cover the same bits of the same allocation
    pub fn ptr_eq(&self, other: &Self) -> bool {
        (self.offset, self.len) == (other.offset, other.len)
            && self.buffer.as_ptr() == other.buffer.as_ptr()
    }

    /// The packed bytes
    #[inline]
    pub fn inner(&self) -> &Buffer {
        &self.buffer
    }

    /// Unwrap the packed bytes
    pub fn into_inner(self) -> Buffer {
        self.buffer
    }

    /// The bits of the window, in order
    pub fn iter(&self) -> impl Iterator<Item = bool> + '_ {
        let bytes = self.buffer.as_slice();
        (self.offset..self.offset + self.len).map(move |i| bit_util::get_bit(bytes, i))
    }
}

impl From<&[bool]> for BooleanBuffer {
    fn from(bits: &[bool]) -> Self {
        bits.iter().copied().collect()
    }
}

impl From<Vec<bool>> for BooleanBuffer {
    fn from(bits: Vec<bool>) -> Self {
        bits.into_iter().collect()
    }
}

impl FromIterator<bool> for BooleanBuffer {
    fn from_iter<T: IntoIterator<Item = bool>>(iter: T) -> Self {
        let iter = iter.into_iter();
        let mut builder = crate::BooleanBufferBuilder::new(iter.size_hint().0);
        iter.for_each(|bit| builder.append(bit));
        builder.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_over_bytes() {
        let raw = Buffer::from(&[0b1000_0001_u8, 0b0000_0000, 0b0000_0010][..]);
        let bits = BooleanBuffer::new(raw.clone(), 4, 16);
        assert_eq!(bits.values(), raw.as_slice());
        assert_eq!(bits.offset(), 4);
        assert_eq!(bits.count_set_bits(), 2);
        assert!(bits.value(3));
        assert!(bits.value(13));
        assert!(!bits.value(0));
        assert_eq!(bits.inner(), &raw);
        assert_eq!(bits.clone().into_inner(), raw);
        assert!(bits.ptr_eq(&bits.clone()));
        assert!(!bits.ptr_eq(&bits.slice(0, 15)));
    }

    #[test]
    #[should_panic(expected = "buffer of 2 bytes cannot hold 17 bits at offset 0")]
    fn test_window_too_long() {
        BooleanBuffer::new(Buffer::from(&[0_u8, 1][..]), 0, 17);
    }

    #[test]
    #[should_panic(expected = "cannot slice 4 bits at offset 7 from a BooleanBuffer of length 10")]
    fn test_slice_past_end() {
        BooleanBuffer::new_unset(10).slice(7, 4);
    }

    #[test]
    #[should_panic(expected = "bit index 5 out of bounds for BooleanBuffer of length 5")]
    fn test_value_past_end() {
        BooleanBuffer::new_set(5).value(5);
    }

    #[test]
    fn test_equality_ignores_offset() {
        let pattern: Vec<bool> = (0..24).map(|i| i % 5 == 1).collect();
        let whole = BooleanBuffer::from(pattern.as_slice());
        let shifted = whole.slice(5, 10);
        let fresh = BooleanBuffer::from(&pattern[5..15]);

        assert_eq!(shifted, fresh);
        assert_ne!(shifted.offset(), fresh.offset());
        assert_ne!(whole, shifted);
        assert_eq!(whole, whole.slice(0, 24));
        assert_ne!(whole.slice(0, 23), whole.slice(1, 23));
    }

    #[test]
    fn test_sliced_rebases() {
        let bits = BooleanBuffer::from(vec![false, true, true, false, true, false, false, true, true, true]);
        let window = bits.slice(3, 6);
        let rebased = BooleanBuffer::new(window.sliced(), 0, 6);
        assert_eq!(rebased, window);
        assert_eq!(rebased.offset(), 0);
        assert_eq!(rebased.count_set_bits(), 3);
    }

    #[test]
    fn test_uniform() {
        let ones = BooleanBuffer::new_set(13);
        assert_eq!(ones.count_set_bits(), 13);
        assert!(ones.iter().all(|b| b));
        let zeros = BooleanBuffer::new_unset(13);
        assert_eq!(zeros.count_set_bits(), 0);
        assert!(!zeros.is_empty());
        assert!(!zeros.value(12));
    }
}
