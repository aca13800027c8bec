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

use crate::{BooleanBufferBuilder, NullBuffer};

#[derive(Debug)]
enum Validity {
    /// Only valid slots so far
    AllValid(usize),
    Bitmap(BooleanBufferBuilder),
}

/// Incrementally builds an optional [`NullBuffer`]
///
/// No bitmap is allocated until the first null arrives, and a builder that never saw
/// one finishes to `None`.
///
/// ```
/// # use quiver_buffer::NullBufferBuilder;
/// let mut validity = NullBufferBuilder::new(16);
/// validity.append_n_non_nulls(5);
/// assert!(validity.as_slice().is_none());
///
/// validity.append_null();
/// let nulls = validity.finish().unwrap();
/// assert_eq!((nulls.len(), nulls.null_count()), (6, 1));
/// assert!(validity.finish().is_none());
/// ```
#[derive(Debug)]
pub struct NullBufferBuilder {
    state: Validity,
    /// Bits to reserve once the bitmap is allocated
    capacity: usize,
}

impl NullBufferBuilder {
    /// An empty builder that will reserve `capacity` bits if it ever allocates
    pub fn new(capacity: usize) -> Self {
        Self {
            state: Validity::AllValid(0),
            capacity,
        }
    }

    /// Add `n` valid slots
    #[inline]
    pub fn append_n_non_nulls(&mut self, n: usize) {
        match &mut self.state {
            Validity::AllValid(len) => *len += n,
            Validity::Bitmap(bits) => bits.append_n(n, true),
        }
    }

    /// Add one valid slot
    #[inline]
    pub fn append_non_null(&mut self) {
        self.append_n_non_nulls(1)
    }

    /// Add `n` null slots
    #[inline]
    pub fn append_n_nulls(&mut self, n: usize) {
        self.bitmap().append_n(n, false);
    }

    /// Add one null slot
    #[inline]
    pub fn append_null(&mut self) {
        self.bitmap().append(false);
    }

    /// Add one slot, valid if `not_null`
    #[inline]
    pub fn append(&mut self, not_null: bool) {
        if not_null {
            self.append_non_null()
        } else {
            self.append_null()
        }
    }

    /// Add one slot per entry of `slice`, `true` marking a valid slot
    pub fn append_slice(&mut self, slice: &[bool]) {
        match slice.contains(&false) {
            true => self.bitmap().append_slice(slice),
            false => self.append_n_non_nulls(slice.len()),
        }
    }

    /// Whether slot `index` is valid
    #[inline]
    pub fn is_valid(&self, index: usize) -> bool {
        match &self.state {
            Validity::AllValid(_) => true,
            Validity::Bitmap(bits) => bits.get_bit(index),
        }
    }

    /// Drop every slot from `len` on, a no-op if `len` is not shorter
    #[inline]
    pub fn truncate(&mut self, len: usize) {
        match &mut self.state {
            Validity::AllValid(n) => *n = len.min(*n),
            Validity::Bitmap(bits) => bits.truncate(len),
        }
    }

    /// Take the validity collected so far, leaving the builder empty
    ///
    /// Returns `None` when every slot was valid.
    pub fn finish(&mut self) -> Option<NullBuffer> {
        match std::mem::replace(&mut self.state, Validity::AllValid(0)) {
            Validity::AllValid(_) => None,
            Validity::Bitmap(mut bits) => Some(NullBuffer::new(bits.finish())),
        }
    }

    /// Like [`Self::finish`] but leaves the builder as it was
    pub fn finish_cloned(&self) -> Option<NullBuffer> {
        match &self.state {
            Validity::AllValid(_) => None,
            Validity::Bitmap(bits) => Some(NullBuffer::new(bits.finish_cloned())),
        }
    }

    /// The packed bitmap, once a null has been appended
    pub fn as_slice(&self) -> Option<&[u8]> {
        match &self.state {
            Validity::AllValid(_) => None,
            Validity::Bitmap(bits) => Some(bits.as_slice()),
        }
    }

    fn bitmap(&mut self) -> &mut BooleanBufferBuilder {
        if let Validity::AllValid(len) = self.state {
            let mut bits = BooleanBufferBuilder::new(len.max(self.capacity));
            bits.append_n(len, true);
            self.state = Validity::Bitmap(bits);
        }
        match &mut self.state {
            Validity::Bitmap(bits) => bits,
            Validity::AllValid(_) => unreachable!("bitmap allocated above"),
        }
    }

    /// Number of slots appended
    pub fn len(&self) -> usize {
        match &self.state {
            Validity::AllValid(len) => *len,
            Validity::Bitmap(bits) => bits.len(),
        }
    }

    /// True if no slots were appended
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
