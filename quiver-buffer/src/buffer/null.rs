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

use crate::buffer::BooleanBuffer;
use crate::Buffer;

/// Validity of a column: a set bit is a valid slot, a cleared bit a null one
///
/// Wraps a [`BooleanBuffer`] and remembers how many of its bits are cleared, so
/// `null_count` is free after construction.
///
/// ```
/// # use quiver_buffer::NullBuffer;
/// let nulls = NullBuffer::from(vec![true, true, false, true]);
/// assert_eq!(nulls.null_count(), 1);
/// assert!(nulls.is_null(2));
/// assert_eq!(nulls.slice(3, 1).null_count(), 0);
/// ```
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct NullBuffer {
    bits: BooleanBuffer,
    nulls: usize,
}

impl NullBuffer {
    /// Wrap `bits`, counting the cleared ones
    pub fn new(bits: BooleanBuffer) -> Self {
        let nulls = bits.len() - bits.count_set_bits();
        Self { bits, nulls }
    }

    /// `len` null slots
    pub fn new_null(len: usize) -> Self {
        Self {
            bits: BooleanBuffer::new_unset(len),
            nulls: len,
        }
    }

    /// `len` valid slots
    pub fn new_valid(len: usize) -> Self {
        Self {
            bits: BooleanBuffer::new_set(len),
            nulls: 0,
        }
    }

    /// Wrap `bits` with a null count computed elsewhere
    ///
    /// # Safety
    ///
    /// Exactly `null_count` bits of `bits` must be cleared
    pub unsafe fn new_unchecked(bits: BooleanBuffer, null_count: usize) -> Self {
        Self {
            bits,
            nulls: null_count,
        }
    }

    /// Number of slots covered
    #[inline]
    pub fn len(&self) -> usize {
        self.bits.len()
    }

    /// Bit offset into [`Self::validity`] of the first slot
    #[inline]
    pub fn offset(&self) -> usize {
        self.bits.offset()
    }

    /// True if no slots are covered
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// Number of cleared bits
    #[inline]
    pub fn null_count(&self) -> usize {
        self.nulls
    }

    /// Whether slot `idx` holds a value
    #[inline]
    pub fn is_valid(&self, idx: usize) -> bool {
        self.bits.value(idx)
    }

    /// Whether slot `idx` is null
    #[inline]
    pub fn is_null(&self, idx: usize) -> bool {
        !self.bits.value(idx)
    }

    /// The packed bytes, starting at the byte holding bit 0 rather than [`Self::offset`]
    #[inline]
    pub fn validity(&self) -> &[u8] {
        self.bits.values()
    }

    /// `len` slots starting at `offset`, recounting their nulls
    pub fn slice(&self, offset: usize, len: usize) -> Self {
        Self::new(self.bits.slice(offset, len))
    }

    /// Positions of the valid slots, ascending
    pub fn valid_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.bits.iter().enumerate().filter(|(_, v)| *v).map(|(i, _)| i)
    }

    /// The wrapped bits
    #[inline]
    pub fn inner(&self) -> &BooleanBuffer {
        &self.bits
    }

    /// Unwrap the bits
    #[inline]
    pub fn into_inner(self) -> BooleanBuffer {
        self.bits
    }

    /// The byte buffer behind the bits
    #[inline]
    pub fn buffer(&self) -> &Buffer {
        self.bits.inner()
    }
}

impl From<BooleanBuffer> for NullBuffer {
    fn from(bits: BooleanBuffer) -> Self {
        Self::new(bits)
    }
}

impl From<Vec<bool>> for NullBuffer {
    fn from(valid: Vec<bool>) -> Self {
        Self::new(valid.into())
    }
}

impl From<&[bool]> for NullBuffer {
    fn from(valid: &[bool]) -> Self {
        Self::new(valid.into())
    }
}
