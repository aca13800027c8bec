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

//! Accounting of the memory held by [`Buffer`](crate::Buffer)s

use std::fmt::Debug;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// A pool that buffers can report their memory usage to
///
/// See [`Buffer::claim`](crate::Buffer::claim)
pub trait MemoryPool: Debug + Send + Sync {
    /// Reserve `size` bytes, returning a handle that releases them on drop
    fn reserve(&self, size: usize) -> Box<dyn MemoryReservation>;

    /// Returns the number of bytes currently reserved
    fn used(&self) -> usize;
}

/// An outstanding reservation against a [`MemoryPool`], released on drop
pub trait MemoryReservation: Debug + Send + Sync {
    /// Returns the reserved size in bytes
    fn size(&self) -> usize;

    /// Change the reserved size to `new`
    fn resize(&mut self, new: usize);
}

/// A [`MemoryPool`] that only counts the bytes reserved against it
#[derive(Debug, Default, Clone)]
pub struct TrackingMemoryPool(Arc<AtomicUsize>);

impl MemoryPool for TrackingMemoryPool {
    fn reserve(&self, size: usize) -> Box<dyn MemoryReservation> {
        self.0.fetch_add(size, Ordering::Relaxed);
        Box::new(Tracker {
            size,
            shared: Arc::clone(&self.0),
        })
    }

    fn used(&self) -> usize {
        self.0.load(Ordering::Relaxed)
    }
}

#[derive(Debug)]
struct Tracker {
    size: usize,
    shared: Arc<AtomicUsize>,
}

impl Drop for Tracker {
    fn drop(&mut self) {
        self.shared.fetch_sub(self.size, Ordering::Relaxed);
    }
}

impl MemoryReservation for Tracker {
    fn size(&self) -> usize {
        self.size
    }

    fn resize(&mut self, new: usize) {
        match self.size < new {
            true => self.shared.fetch_add(new - self.size, Ordering::Relaxed),
            false => self.shared.fetch_sub(self.size - new, Ordering::Relaxed),
        };
        self.size = new;
    }
}
