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

use std::alloc::{handle_alloc_error, Layout};
use std::mem;
use std::ops::{Deref, DerefMut};
use std::ptr::NonNull;

use crate::alloc::{Deallocation, ALIGNMENT};
use crate::bytes::Bytes;
use crate::native::{NativeType, ToByteSlice};
use crate::util::bit_util;

use super::Buffer;

/// A growable, [`ALIGNMENT`] aligned region of bytes that can be frozen into a [`Buffer`]
///
/// Freezing with `into` hands the allocation to the [`Buffer`] without copying.
///
/// ```
/// # use quiver_buffer::{Buffer, MutableBuffer};
/// let mut buffer = MutableBuffer::new(0);
/// buffer.push(256u32);
/// buffer.extend_from_slice(&[1u32]);
/// let buffer: Buffer = buffer.into();
/// assert_eq!(buffer.as_slice(), &[0u8, 1, 0, 0, 1, 0, 0, 0])
/// ```
#[derive(Debug)]
pub struct MutableBuffer {
    /// Dangling while `layout` is zero sized
    ptr: NonNull<u8>,
    /// Bytes written, never more than `layout.size()`
    len: usize,
    layout: Layout,
}

/// Layout of an [`ALIGNMENT`] aligned allocation of `size` bytes
///
/// # Panics
///
/// Panics if `size` rounded up to [`ALIGNMENT`] overflows `isize`
fn aligned_layout(size: usize) -> Layout {
    match Layout::from_size_align(size, ALIGNMENT) {
        Ok(layout) => layout,
        Err(_) => panic!("MutableBuffer of {size} bytes exceeds the address space"),
    }
}

/// Allocates `layout`, returning a dangling pointer for zero sized layouts
fn allocate(layout: Layout, zeroed: bool) -> NonNull<u8> {
    if layout.size() == 0 {
        return dangling_ptr();
    }
    // SAFETY: the layout is not zero sized
    let raw = unsafe {
        match zeroed {
            true => std::alloc::alloc_zeroed(layout),
            false => std::alloc::alloc(layout),
        }
    };
    NonNull::new(raw).unwrap_or_else(|| handle_alloc_error(layout))
}

impl MutableBuffer {
    /// Allocate a new [`MutableBuffer`] with a capacity of at least `capacity` bytes
    #[inline]
    pub fn new(capacity: usize) -> Self {
        Self::with_capacity(capacity)
    }

    /// Allocate a new empty [`MutableBuffer`] with `capacity` rounded up to a multiple of 64
    #[inline]
    pub fn with_capacity(capacity: usize) -> Self {
        let layout = aligned_layout(bit_util::round_upto_multiple_of_64(capacity));
        Self {
            ptr: allocate(layout, false),
            len: 0,
            layout,
        }
    }

    /// Allocates a [`MutableBuffer`] of exactly `len` bytes, all zero
    ///
    /// ```
    /// # use quiver_buffer::MutableBuffer;
    /// let buffer = MutableBuffer::from_len_zeroed(127);
    /// assert_eq!(buffer.len(), 127);
    /// assert_eq!(buffer.as_slice()[126], 0u8);
    /// ```
    pub fn from_len_zeroed(len: usize) -> Self {
        let layout = aligned_layout(len);
        Self {
            ptr: allocate(layout, true),
            len,
            layout,
        }
    }

    /// Creates a zeroed buffer able to hold `len` bits
    pub fn new_null(len: usize) -> Self {
        Self::from_len_zeroed(bit_util::ceil(len, 8))
    }

    /// Fills the first `end` bytes with ones if `val`, zeros otherwise, and sets the
    /// length to `end`
    ///
    /// # Panics
    ///
    /// Panics if `end` exceeds the capacity
    pub fn with_bitset(mut self, end: usize, val: bool) -> Self {
        assert!(end <= self.capacity(), "bitset of {end} bytes exceeds capacity");
        let byte = if val { u8::MAX } else { 0 };
        // SAFETY: the allocation holds at least `end` bytes
        unsafe { self.ptr.as_ptr().write_bytes(byte, end) };
        self.len = end;
        self
    }

    /// Ensures room for `additional` more bytes, at least doubling the capacity when
    /// it has to grow
    #[inline(always)]
    pub fn reserve(&mut self, additional: usize) {
        let required = self.len + additional;
        if required > self.capacity() {
            let grown = bit_util::round_upto_multiple_of_64(required).max(self.capacity() * 2);
            self.grow(grown)
        }
    }

    #[cold]
    fn grow(&mut self, capacity: usize) {
        let layout = aligned_layout(capacity);
        let ptr = match self.layout.size() {
            0 => allocate(layout, false),
            // SAFETY: `ptr` was allocated with `self.layout` and `capacity` is not zero
            _ => {
                let raw = unsafe { std::alloc::realloc(self.ptr.as_ptr(), self.layout, capacity) };
                NonNull::new(raw).unwrap_or_else(|| handle_alloc_error(layout))
            }
        };
        self.ptr = ptr;
        self.layout = layout;
    }

    /// Shortens the buffer to `len` bytes, keeping the capacity
    ///
    /// Has no effect if `len` is not shorter than the current length
    #[inline]
    pub fn truncate(&mut self, len: usize) {
        self.len = self.len.min(len);
    }

    /// Resizes the buffer to `new_len`, filling any new bytes with `value`
    #[inline(always)]
    pub fn resize(&mut self, new_len: usize, value: u8) {
        if new_len > self.len {
            let additional = new_len - self.len;
            self.reserve(additional);
            // SAFETY: `reserve` made room for `additional` bytes past `len`
            unsafe { self.ptr.as_ptr().add(self.len).write_bytes(value, additional) };
        }
        self.len = new_len;
    }

    /// Appends `additional` zero bytes
    #[inline]
    pub fn extend_zeros(&mut self, additional: usize) {
        self.resize(self.len + additional, 0);
    }

    /// Returns true if no bytes have been written
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the number of bytes written
    #[inline]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns the size of the allocation in bytes
    #[inline]
    pub const fn capacity(&self) -> usize {
        self.layout.size()
    }

    /// Discards every byte written, keeping the allocation
    pub fn clear(&mut self) {
        self.len = 0
    }

    /// Returns the bytes written so far
    pub fn as_slice(&self) -> &[u8] {
        self
    }

    /// Returns the bytes written so far, mutably
    pub fn as_slice_mut(&mut self) -> &mut [u8] {
        self
    }

    /// Returns a raw pointer to the start of the allocation
    #[inline]
    pub const fn as_ptr(&self) -> *const u8 {
        self.ptr.as_ptr()
    }

    /// Returns a mutable raw pointer to the start of the allocation
    #[inline]
    pub fn as_mut_ptr(&mut self) -> *mut u8 {
        self.ptr.as_ptr()
    }

    /// Hands the allocation to an immutable [`Buffer`]
    #[inline]
    pub(super) fn into_buffer(self) -> Buffer {
        // SAFETY: `ptr` holds `len` initialized bytes of an allocation made with `layout`
        let bytes = unsafe { Bytes::new(self.ptr, self.len, Deallocation::Standard(self.layout)) };
        mem::forget(self);
        Buffer::from_bytes(bytes)
    }

    /// View the bytes as a slice of `T`
    ///
    /// # Panics
    ///
    /// Panics if the length is not a multiple of the size of `T`
    pub fn typed_data<T: NativeType>(&self) -> &[T] {
        bytemuck::cast_slice(self.as_slice())
    }

    /// View the bytes as a mutable slice of `T`
    ///
    /// # Panics
    ///
    /// Panics if the length is not a multiple of the size of `T`
    pub fn typed_data_mut<T: NativeType>(&mut self) -> &mut [T] {
        bytemuck::cast_slice_mut(self.as_slice_mut())
    }

    #[inline]
    fn extend_bytes(&mut self, src: &[u8]) {
        self.reserve(src.len());
        // SAFETY: `reserve` made room for `src.len()` bytes past `len`, and `src` is
        // borrowed immutably so it cannot alias the spare capacity
        unsafe {
            let dst = self.ptr.as_ptr().add(self.len);
            std::ptr::copy_nonoverlapping(src.as_ptr(), dst, src.len());
        }
        self.len += src.len();
    }

    /// Appends the bytes of `items`
    ///
    /// ```
    /// # use quiver_buffer::MutableBuffer;
    /// let mut buffer = MutableBuffer::new(0);
    /// buffer.extend_from_slice(&[2u32, 0]);
    /// assert_eq!(buffer.len(), 8)
    /// ```
    #[inline]
    pub fn extend_from_slice<T: NativeType>(&mut self, items: &[T]) {
        self.extend_bytes(items.to_byte_slice())
    }

    /// Appends the bytes of a single value
    #[inline]
    pub fn push<T: ToByteSlice>(&mut self, item: T) {
        self.extend_bytes(item.to_byte_slice())
    }
}

/// A dangling pointer aligned to [`ALIGNMENT`], used for zero sized allocations
#[inline]
pub(crate) fn dangling_ptr() -> NonNull<u8> {
    // SAFETY: ALIGNMENT is non-zero
    unsafe { NonNull::new_unchecked(ALIGNMENT as *mut u8) }
}

impl<T: NativeType> Extend<T> for MutableBuffer {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        let iter = iter.into_iter();
        self.reserve(iter.size_hint().0 * mem::size_of::<T>());
        iter.for_each(|item| self.push(item))
    }
}

impl<T: NativeType> From<Vec<T>> for MutableBuffer {
    fn from(value: Vec<T>) -> Self {
        let mut buffer = Self::with_capacity(mem::size_of_val(value.as_slice()));
        buffer.extend_from_slice(&value);
        buffer
    }
}

impl<T: NativeType> FromIterator<T> for MutableBuffer {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut buffer = Self::default();
        buffer.extend(iter);
        buffer
    }
}

impl Default for MutableBuffer {
    fn default() -> Self {
        Self::with_capacity(0)
    }
}

impl Deref for MutableBuffer {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        // SAFETY: the first `len` bytes are initialized
        unsafe { std::slice::from_raw_parts(self.as_ptr(), self.len) }
    }
}

impl DerefMut for MutableBuffer {
    fn deref_mut(&mut self) -> &mut [u8] {
        // SAFETY: the first `len` bytes are initialized and uniquely borrowed
        unsafe { std::slice::from_raw_parts_mut(self.as_mut_ptr(), self.len) }
    }
}

impl Drop for MutableBuffer {
    fn drop(&mut self) {
        if self.layout.size() != 0 {
            // SAFETY: `ptr` was allocated with `layout`
            unsafe { std::alloc::dealloc(self.ptr.as_ptr(), self.layout) };
        }
    }
}

impl PartialEq for MutableBuffer {
    fn eq(&self, other: &MutableBuffer) -> bool {
        self.as_slice() == other.as_slice()
    }
}

// SAFETY: the allocation is uniquely owned
unsafe impl Sync for MutableBuffer {}
unsafe impl Send for MutableBuffer {}
