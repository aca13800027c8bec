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

use half::f16;

mod private {
    pub trait Sealed {}
}

/// Trait expressing a Rust type that has the same in-memory representation as a
/// fixed-width value of the columnar format
///
/// Every implementation is plain old data ([`bytemuck::Pod`]), so a byte region of the
/// right size and alignment can be reinterpreted as a slice of it without copying.
///
/// This trait is sealed to the primitive widths the format defines.
pub trait NativeType:
    bytemuck::Pod
    + std::fmt::Debug
    + Send
    + Sync
    + Copy
    + PartialOrd
    + Default
    + private::Sealed
    + 'static
{
    /// Convert a [`usize`] into this type, wrapping or truncating as `as` does
    fn usize_as(i: usize) -> Self;

    /// Convert to a [`usize`], wrapping or truncating as `as` does
    fn as_usize(self) -> usize;

    /// Checked conversion from [`usize`]
    fn from_usize(v: usize) -> Option<Self>;

    /// Checked conversion to [`usize`]
    fn to_usize(self) -> Option<usize>;
}

macro_rules! native_integer {
    ($($t:ty),*) => {$(
        impl private::Sealed for $t {}
        impl NativeType for $t {
            #[inline]
            fn usize_as(i: usize) -> Self {
                i as _
            }

            #[inline]
            fn as_usize(self) -> usize {
                self as _
            }

            #[inline]
            fn from_usize(v: usize) -> Option<Self> {
                v.try_into().ok()
            }

            #[inline]
            fn to_usize(self) -> Option<usize> {
                self.try_into().ok()
            }
        }
    )*};
}

native_integer!(i8, i16, i32, i64, u8, u16, u32, u64);

macro_rules! native_float {
    ($t:ty, $to_f64:ident, $from_f64:ident) => {
        impl private::Sealed for $t {}
        impl NativeType for $t {
            #[inline]
            fn usize_as(i: usize) -> Self {
                $from_f64(i as f64)
            }

            #[inline]
            fn as_usize(self) -> usize {
                $to_f64(self) as usize
            }

            #[inline]
            fn from_usize(_: usize) -> Option<Self> {
                None
            }

            #[inline]
            fn to_usize(self) -> Option<usize> {
                None
            }
        }
    };
}

#[inline]
fn f16_to_f64(v: f16) -> f64 {
    v.to_f64()
}

#[inline]
fn f16_from_f64(v: f64) -> f16 {
    f16::from_f64(v)
}

#[inline]
fn f32_to_f64(v: f32) -> f64 {
    v as f64
}

#[inline]
fn f32_from_f64(v: f64) -> f32 {
    v as f32
}

#[inline]
fn f64_identity(v: f64) -> f64 {
    v
}

native_float!(f16, f16_to_f64, f16_from_f64);
native_float!(f32, f32_to_f64, f32_from_f64);
native_float!(f64, f64_identity, f64_identity);

/// Allows conversion from supported native types to their byte representation
pub trait ToByteSlice {
    /// Returns the native in-memory representation of this value
    fn to_byte_slice(&self) -> &[u8];
}

impl<T: NativeType> ToByteSlice for [T] {
    #[inline]
    fn to_byte_slice(&self) -> &[u8] {
        bytemuck::cast_slice(self)
    }
}

impl<T: NativeType> ToByteSlice for T {
    #[inline]
    fn to_byte_slice(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }
}
