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

//! Where buffer memory comes from and how it is given back

use std::alloc::Layout;
use std::fmt::{Debug, Formatter};
use std::panic::RefUnwindSafe;
use std::sync::Arc;

mod allocator;

pub use allocator::*;

/// Alignment of every region a [`MutableBuffer`](crate::MutableBuffer) allocates
///
/// One cache line, which is also the widest alignment a stream may request.
pub const ALIGNMENT: usize = 64;

/// Anything that can own memory on behalf of a [`Buffer`](crate::Buffer)
pub trait Allocation: RefUnwindSafe + Send + Sync {}

impl<T: RefUnwindSafe + Send + Sync> Allocation for T {}

pub(crate) enum Deallocation {
    /// Returned to the global allocator with this layout
    Standard(Layout),
    /// Freed when the last clone of the owner drops, with the visible size
    Custom(Arc<dyn Allocation>, usize),
}

impl Debug for Deallocation {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            Self::Standard(layout) => f
                .debug_struct("Standard")
                .field("size", &layout.size())
                .field("align", &layout.align())
                .finish(),
            Self::Custom(_, size) => f.debug_tuple("Custom").field(size).finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug() {
        let layout = Layout::from_size_align(128, ALIGNMENT).unwrap();
        let standard = format!("{:?}", Deallocation::Standard(layout));
        assert_eq!(standard, "Standard { size: 128, align: 64 }");

        let custom = Deallocation::Custom(Arc::new(vec![0_u8; 3]), 3);
        assert_eq!(format!("{custom:?}"), "Custom(3)");
    }
}
