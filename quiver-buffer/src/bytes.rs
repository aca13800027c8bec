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

//! [`Bytes`], the reference counted storage behind every [`Buffer`](crate::Buffer)

use core::slice;
use std::fmt::{Debug, Formatter};
use std::ptr::NonNull;
use std::sync::{Arc, Mutex};

use crate::alloc::Deallocation;
use crate::buffer::dangling_ptr;
use crate::pool::{MemoryPool, MemoryReservation};

/// An immutable region of memory together with the means to release it
///
/// Regions frozen from a [`MutableBuffer`](crate::MutableBuffer) are freed with the
/// layout they were allocated with. Regions borrowed from elsewhere, such as a
/// [`bytes::Bytes`] read off a socket, hold their owner until dropped.
pub struct Bytes {
    ptr: NonNull<u8>,

    /// Never more than the allocation
    len: usize,

    deallocation: Deallocation,

    /// Set by [`Bytes::claim`]
    reservation: Mutex<Option<Box<dyn MemoryReservation>>>,
}

impl Bytes {
    /// # Safety
    ///
    /// `ptr` must stay readable for `len` bytes until `deallocation` releases it
    #[inline]
    pub(crate) unsafe fn new(ptr: NonNull<u8>, len: usize, deallocation: Deallocation) -> Bytes {
        Bytes {
            ptr,
            len,
            deallocation,
            reservation: Mutex::new(None),
        }
    }

    /// Visible length in bytes
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// True for a zero-length region
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// First byte of the region
    #[inline]
    pub fn ptr(&self) -> NonNull<u8> {
        self.ptr
    }

    /// Bytes held by the allocation, which for foreign regions is their visible size
    pub fn capacity(&self) -> usize {
        match &self.deallocation {
            Deallocation::Standard(layout) => layout.size(),
            Deallocation::Custom(_, visible) => *visible,
        }
    }

    /// Account the allocation against `pool` until this region drops
    ///
    /// Claiming again moves the reservation, so a region is counted at most once.
    pub fn claim(&self, pool: &dyn MemoryPool) {
        let reservation = pool.reserve(self.capacity());
        let mut slot = self.reservation.lock().unwrap_or_else(|p| p.into_inner());
        *slot = Some(reservation);
    }

    #[inline]
    pub(crate) fn deallocation(&self) -> &Deallocation {
        &self.deallocation
    }
}

// the region is never written through `ptr` and lives as long as `deallocation`
unsafe impl Send for Bytes where Deallocation: Send {}
unsafe impl Sync for Bytes where Deallocation: Sync {}

impl Drop for Bytes {
    #[inline]
    fn drop(&mut self) {
        if let Deallocation::Standard(layout) = &self.deallocation {
            if layout.size() != 0 {
                // SAFETY: allocated by the global allocator with this layout
                unsafe { std::alloc::dealloc(self.ptr.as_ptr(), *layout) }
            }
        }
    }
}

impl std::ops::Deref for Bytes {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        // SAFETY: guaranteed by the contract of `Bytes::new`
        unsafe { slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }
}

impl PartialEq for Bytes {
    fn eq(&self, other: &Self) -> bool {
        **self == **other
    }
}

impl Debug for Bytes {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        f.debug_struct("Bytes")
            .field("ptr", &self.ptr)
            .field("len", &self.len)
            .field("data", &&**self)
            .finish()
    }
}

impl From<bytes::Bytes> for Bytes {
    fn from(owner: bytes::Bytes) -> Self {
        let len = owner.len();
        let ptr = NonNull::new(owner.as_ptr().cast_mut()).unwrap_or_else(dangling_ptr);
        // SAFETY: `owner` keeps the region alive and is moved into the deallocation
        unsafe { Self::new(ptr, len, Deallocation::Custom(Arc::new(owner), len)) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::TrackingMemoryPool;

    fn aligned(len: usize) -> Bytes {
        let layout = std::alloc::Layout::from_size_align(len, crate::alloc::ALIGNMENT).unwrap();
        // SAFETY: freshly zero-allocated with `layout`
        unsafe {
            let ptr = NonNull::new(std::alloc::alloc_zeroed(layout)).unwrap();
            Bytes::new(ptr, len, Deallocation::Standard(layout))
        }
    }

    #[test]
    fn test_wraps_foreign_bytes() {
        let frame = bytes::Bytes::from_static(b"\xff\xff\xff\xff payload");
        let region = Bytes::from(frame.slice(5..));
        assert_eq!(&*region, b"payload");
        assert_eq!(region.capacity(), 7);
        assert!(matches!(region.deallocation(), Deallocation::Custom(_, 7)));

        let empty = Bytes::from(bytes::Bytes::new());
        assert!(empty.is_empty());
        assert_eq!(empty, Bytes::from(bytes::Bytes::from(vec![])));
    }

    #[test]
    fn test_debug_shows_contents() {
        let region = Bytes::from(bytes::Bytes::from(vec![1_u8, 2]));
        let debug = format!("{region:?}");
        assert!(debug.starts_with("Bytes { ptr: "), "{debug}");
        assert!(debug.ends_with("len: 2, data: [1, 2] }"), "{debug}");
    }

    #[test]
    fn test_reclaim_moves_reservation() {
        let region = aligned(256);
        assert!(region.iter().all(|b| *b == 0));

        let first = TrackingMemoryPool::default();
        let second = TrackingMemoryPool::default();
        region.claim(&first);
        region.claim(&first);
        assert_eq!(first.used(), 256);

        region.claim(&second);
        assert_eq!((first.used(), second.used()), (0, 256));
        drop(region);
        assert_eq!(second.used(), 0);
    }
}
