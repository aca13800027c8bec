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

use std::fmt::Debug;
use std::sync::Arc;

use crate::pool::MemoryPool;
use crate::{Buffer, MutableBuffer};

/// Source of zero-initialized, [`ALIGNMENT`](super::ALIGNMENT) aligned memory
///
/// Consumers such as the IPC readers accept an `Arc<dyn MemoryAllocator>` and fall back
/// to [`DefaultAllocator`] when none is configured.
pub trait MemoryAllocator: Debug + Send + Sync {
    /// Allocate a zeroed [`MutableBuffer`] of exactly `len` bytes
    fn allocate(&self, len: usize) -> MutableBuffer;

    /// Convert a buffer previously returned by [`Self::allocate`] into an immutable [`Buffer`]
    fn freeze(&self, buffer: MutableBuffer) -> Buffer {
        buffer.into()
    }
}

/// A [`MemoryAllocator`] backed by the global allocator
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultAllocator;

impl MemoryAllocator for DefaultAllocator {
    fn allocate(&self, len: usize) -> MutableBuffer {
        MutableBuffer::from_len_zeroed(len)
    }
}

/// Returns the process wide [`DefaultAllocator`]
pub fn default_allocator() -> Arc<dyn MemoryAllocator> {
    Arc::new(DefaultAllocator)
}

/// A [`MemoryAllocator`] that claims every frozen buffer against a [`MemoryPool`]
///
/// The reservation lives as long as the frozen [`Buffer`] (or any slice of it)
#[derive(Debug, Clone)]
pub struct PoolAllocator {
    pool: Arc<dyn MemoryPool>,
}

impl PoolAllocator {
    /// Create a new [`PoolAllocator`] reporting to `pool`
    pub fn new(pool: Arc<dyn MemoryPool>) -> Self {
        Self { pool }
    }

    /// Returns the pool allocations are reported to
    pub fn pool(&self) -> &Arc<dyn MemoryPool> {
        &self.pool
    }
}

impl MemoryAllocator for PoolAllocator {
    fn allocate(&self, len: usize) -> MutableBuffer {
        MutableBuffer::from_len_zeroed(len)
    }

    fn freeze(&self, buffer: MutableBuffer) -> Buffer {
        let buffer: Buffer = buffer.into();
        buffer.claim(self.pool.as_ref());
        buffer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::TrackingMemoryPool;

    #[test]
    fn test_default_allocator_zeroed() {
        let buffer = DefaultAllocator.allocate(100);
        assert_eq!(buffer.len(), 100);
        assert!(buffer.iter().all(|b| *b == 0));
        assert_eq!(buffer.as_ptr() as usize % super::super::ALIGNMENT, 0);
    }

    #[test]
    fn test_pool_allocator_tracks_frozen_buffers() {
        let pool = Arc::new(TrackingMemoryPool::default());
        let allocator = PoolAllocator::new(pool.clone());

        let buffer = allocator.freeze(allocator.allocate(100));
        let capacity = buffer.capacity();
        assert_eq!(pool.used(), capacity);

        let slice = buffer.slice(10);
        drop(buffer);
        assert_eq!(pool.used(), capacity);
        drop(slice);
        assert_eq!(pool.used(), 0);
    }
}
