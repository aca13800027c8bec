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

//! Reusable staging memory for frame prefixes and message headers

use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

/// A pool of byte vectors used to stage the prefix and flatbuffer bytes of each frame
///
/// Buffers are handed out as [`ScratchBuffer`] guards that return themselves to the pool
/// when dropped, whether the read that rented them succeeded, failed or was cancelled.
/// At most `max_retained` idle buffers are kept, and none whose capacity exceeds
/// [`Self::max_capacity`].
pub struct ScratchPool {
    free: Mutex<Vec<Vec<u8>>>,
    max_retained: usize,
    max_capacity: usize,
    outstanding: AtomicUsize,
}

/// Default for [`ScratchPool::with_max_capacity`]
pub const DEFAULT_SCRATCH_CAPACITY: usize = 64 * 1024;

impl ScratchPool {
    /// Create a pool that keeps at most `max_retained` idle buffers
    pub fn new(max_retained: usize) -> Self {
        Self {
            free: Mutex::new(Vec::new()),
            max_retained,
            max_capacity: DEFAULT_SCRATCH_CAPACITY,
            outstanding: AtomicUsize::new(0),
        }
    }

    /// Drop returned buffers of more than `bytes` capacity instead of keeping them
    pub fn with_max_capacity(mut self, bytes: usize) -> Self {
        self.max_capacity = bytes;
        self
    }

    /// The largest capacity an idle buffer may keep
    pub fn max_capacity(&self) -> usize {
        self.max_capacity
    }

    fn free(&self) -> MutexGuard<'_, Vec<Vec<u8>>> {
        // a panic while holding the lock cannot leave the free list inconsistent
        match self.free.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Rent a zeroed buffer of exactly `len` bytes
    pub fn rent(self: &Arc<Self>, len: usize) -> ScratchBuffer {
        let mut data = self.free().pop().unwrap_or_default();
        data.clear();
        data.resize(len, 0);
        self.outstanding.fetch_add(1, Ordering::Relaxed);
        ScratchBuffer {
            data,
            pool: Arc::clone(self),
        }
    }

    /// Returns the number of rented buffers not yet returned
    pub fn outstanding(&self) -> usize {
        self.outstanding.load(Ordering::Relaxed)
    }

    /// Returns the number of idle buffers held by the pool
    pub fn retained(&self) -> usize {
        self.free().len()
    }

    fn give_back(&self, data: Vec<u8>) {
        self.outstanding.fetch_sub(1, Ordering::Relaxed);
        if data.capacity() > self.max_capacity {
            return;
        }
        let mut free = self.free();
        if free.len() < self.max_retained {
            free.push(data);
        }
    }
}

impl Default for ScratchPool {
    fn default() -> Self {
        Self::new(8)
    }
}

impl fmt::Debug for ScratchPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScratchPool")
            .field("max_retained", &self.max_retained)
            .field("max_capacity", &self.max_capacity)
            .field("retained", &self.retained())
            .field("outstanding", &self.outstanding())
            .finish()
    }
}

/// A buffer rented from a [`ScratchPool`], returned to it on drop
pub struct ScratchBuffer {
    data: Vec<u8>,
    pool: Arc<ScratchPool>,
}

impl Deref for ScratchBuffer {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.data
    }
}

impl DerefMut for ScratchBuffer {
    fn deref_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }
}

impl Drop for ScratchBuffer {
    fn drop(&mut self) {
        self.pool.give_back(std::mem::take(&mut self.data));
    }
}

impl fmt::Debug for ScratchBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScratchBuffer")
            .field("len", &self.data.len())
            .finish()
    }
}
