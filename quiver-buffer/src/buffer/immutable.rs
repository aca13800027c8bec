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

use std::alloc::Layout;
use std::fmt::Debug;
use std::mem::ManuallyDrop;
use std::ptr::NonNull;
use std::sync::Arc;

use quiver_schema::QuiverError;

use crate::alloc::Deallocation;
use crate::bytes::Bytes;
use crate::native::NativeType;
use crate::pool::MemoryPool;
use crate::util::bit_util;

use super::MutableBuffer;

/// A contiguous, immutable, reference counted region of bytes
///
/// Cloning and slicing a [`Buffer`] is O(1): every clone and slice points into the
/// same [`Bytes`] allocation, which is released once the last of them is dropped.
///
/// ```
/// # use quiver_buffer::Buffer;
/// let buffer = Buffer::from_vec(vec![1_i32, 2, 3, 4]);
/// let sliced = buffer.slice(8);
/// assert_eq!(sliced.typed_data::<i32>(), &[3, 4]);
/// assert!(sliced.ptr_eq(&buffer.slice(8)));
/// ```
#[derive(Clone)]
pub struct Buffer {
    /// the internal byte buffer.
    data: Arc<Bytes>,

    /// Pointer into `data` valid for `length` bytes
    ///
    /// Invariant: `ptr..ptr + length` lies within `data`
    ptr: *const u8,

    /// Byte length of the buffer.
    length: usize,
}

// `ptr` only ever points into the immutable region owned by `data`
unsafe impl Send for Buffer where Bytes: Send {}
unsafe impl Sync for Buffer where Bytes: Sync {}

impl Buffer {
    /// Create a [`Buffer`] covering the whole of `bytes`
    pub fn from_bytes(bytes: Bytes) -> Self {
        let length = bytes.len();
        let ptr = bytes.as_ptr();
        Buffer {
            data: Arc::new(bytes),
            ptr,
            length,
        }
    }

    /// Create a [`Buffer`] from a [`Vec`] without copying its contents
    pub fn from_vec<T: NativeType>(vec: Vec<T>) -> Self {
        let mut vec = ManuallyDrop::new(vec);
        let len = vec.len() * std::mem::size_of::<T>();
        // Layout of the Vec's allocation
        let layout = match Layout::array::<T>(vec.capacity()) {
            Ok(layout) => layout,
            Err(_) => unreachable!("a Vec allocation always has a valid layout"),
        };
        // Safety: the pointer of a Vec is never null
        let ptr = unsafe { NonNull::new_unchecked(vec.as_mut_ptr() as *mut u8) };
        // Safety: the Vec's memory is now owned by the Bytes and released with its layout
        let bytes = unsafe { Bytes::new(ptr, len, Deallocation::Standard(layout)) };
        Self::from_bytes(bytes)
    }

    /// Create a [`Buffer`] by copying the contents of `items`
    pub fn from_slice_ref<U: NativeType, T: AsRef<[U]>>(items: T) -> Self {
        let mut buffer = MutableBuffer::new(std::mem::size_of_val(items.as_ref()));
        buffer.extend_from_slice(items.as_ref());
        buffer.into()
    }

    /// Returns the number of bytes in this buffer
    #[inline]
    pub fn len(&self) -> usize {
        self.length
    }

    /// Returns true if the buffer is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Returns the capacity of the allocation backing this buffer
    ///
    /// Slices report the capacity of the whole allocation
    pub fn capacity(&self) -> usize {
        self.data.capacity()
    }

    /// Returns the byte slice stored in this buffer
    pub fn as_slice(&self) -> &[u8] {
        self
    }

    /// Returns a pointer to the start of this buffer
    #[inline]
    pub fn as_ptr(&self) -> *const u8 {
        self.ptr
    }

    /// Returns the pointer to the start of the underlying allocation
    #[inline]
    pub fn data_ptr(&self) -> NonNull<u8> {
        self.data.ptr()
    }

    /// Returns a new [`Buffer`] that is a slice of this buffer starting at `offset`
    ///
    /// # Panics
    ///
    /// Panics iff `offset` is larger than `len`.
    pub fn slice(&self, offset: usize) -> Self {
        let mut s = self.clone();
        s.advance(offset);
        s
    }

    /// Increases the offset of this buffer by `offset` without cloning it
    ///
    /// # Panics
    ///
    /// Panics iff `offset` is larger than `len`.
    #[inline]
    pub fn advance(&mut self, offset: usize) {
        assert!(
            offset <= self.length,
            "the offset of the new Buffer cannot exceed the existing length: offset={} length={}",
            offset,
            self.length
        );
        self.length -= offset;
        // Safety: offset <= length, so the pointer stays inside the allocation
        self.ptr = unsafe { self.ptr.add(offset) };
    }

    /// Returns a new [`Buffer`] of `length` bytes starting at `offset`
    ///
    /// # Panics
    ///
    /// Panics iff `(offset + length)` is larger than the existing length.
    pub fn slice_with_length(&self, offset: usize, length: usize) -> Self {
        assert!(
            offset.saturating_add(length) <= self.length,
            "the offset of the new Buffer cannot exceed the existing length: slice offset={offset} length={length} selflen={}",
            self.length
        );
        // Safety: offset + length <= self.length
        let ptr = unsafe { self.ptr.add(offset) };
        Self {
            data: self.data.clone(),
            ptr,
            length,
        }
    }

    /// Returns true if this buffer's start is suitably aligned to be viewed as `T`
    pub fn is_aligned_to<T: NativeType>(&self) -> bool {
        self.ptr.align_offset(std::mem::align_of::<T>()) == 0
    }

    /// View this buffer as a slice of `T`
    ///
    /// # Panics
    ///
    /// Panics if the buffer is not aligned to `T` or its length is not a multiple of
    /// the size of `T`, see [`Self::try_typed_data`]
    pub fn typed_data<T: NativeType>(&self) -> &[T] {
        bytemuck::cast_slice(self.as_slice())
    }

    /// View this buffer as a slice of `T`, returning an error if the buffer is not
    /// aligned to `T` or its length is not a multiple of the size of `T`
    pub fn try_typed_data<T: NativeType>(&self) -> Result<&[T], QuiverError> {
        bytemuck::try_cast_slice(self.as_slice()).map_err(|e| {
            QuiverError::AlignmentMismatch(format!(
                "cannot view buffer of {} bytes at {:p} as {}: {e:?}",
                self.length,
                self.ptr,
                std::any::type_name::<T>()
            ))
        })
    }

    /// Returns a [`Buffer`] holding `len` bits of this buffer starting at bit `offset`,
    /// re-based to bit 0
    ///
    /// This is zero-copy when `offset` is a multiple of 8
    pub fn bit_slice(&self, offset: usize, len: usize) -> Self {
        if offset % 8 == 0 {
            return self.slice_with_length(offset / 8, bit_util::ceil(len, 8));
        }
        let mut out = MutableBuffer::new_null(len);
        bit_util::copy_bits(self.as_slice(), offset, out.as_slice_mut(), len);
        out.into()
    }

    /// Returns the number of 1-bits in `[offset, offset + len)`, counted in bits
    pub fn count_set_bits_offset(&self, offset: usize, len: usize) -> usize {
        bit_util::count_set_bits_offset(self.as_slice(), offset, len)
    }

    /// Register the memory of this buffer with `pool`
    ///
    /// Every clone and slice shares one reservation, claiming again replaces it
    pub fn claim(&self, pool: &dyn MemoryPool) {
        self.data.claim(pool)
    }

    /// Returns true if both buffers point at the same bytes of the same allocation
    pub fn ptr_eq(&self, other: &Self) -> bool {
        self.ptr == other.ptr && self.length == other.length
    }

    /// Returns the number of [`Buffer`]s sharing the underlying allocation
    pub fn strong_count(&self) -> usize {
        Arc::strong_count(&self.data)
    }
}

impl Debug for Buffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Buffer")
            .field("ptr", &self.ptr)
            .field("length", &self.length)
            .field("data", &self.as_slice())
            .finish()
    }
}

impl PartialEq for Buffer {
    fn eq(&self, other: &Self) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl Eq for Buffer {}

impl std::ops::Deref for Buffer {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        unsafe { std::slice::from_raw_parts(self.as_ptr(), self.len()) }
    }
}

impl From<MutableBuffer> for Buffer {
    #[inline]
    fn from(buffer: MutableBuffer) -> Self {
        buffer.into_buffer()
    }
}

impl<T: NativeType> From<Vec<T>> for Buffer {
    fn from(value: Vec<T>) -> Self {
        Self::from_vec(value)
    }
}

impl<T: NativeType> From<&[T]> for Buffer {
    fn from(value: &[T]) -> Self {
        Self::from_slice_ref(value)
    }
}

impl From<bytes::Bytes> for Buffer {
    fn from(bytes: bytes::Bytes) -> Self {
        Self::from_bytes(bytes.into())
    }
}

impl<T: NativeType> FromIterator<T> for Buffer {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let vec: Vec<T> = iter.into_iter().collect();
        Self::from_vec(vec)
    }
}
