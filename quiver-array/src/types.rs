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

//! Marker types selecting the value type of generic arrays and builders

use half::f16;
use quiver_buffer::NativeType;
use quiver_schema::DataType;

/// Ties a fixed-width [`DataType`] to the [`NativeType`] its values are stored as
///
/// Implemented by the zero-sized markers below, which parameterize
/// [`PrimitiveArray`](crate::PrimitiveArray) and
/// [`PrimitiveBuilder`](crate::builder::PrimitiveBuilder).
pub trait QuiverPrimitiveType: std::fmt::Debug + Send + Sync + 'static {
    /// Storage type of one value
    type Native: NativeType;

    /// Logical type of arrays of this marker
    const DATA_TYPE: DataType;

    /// Placeholder stored behind a null slot
    fn default_value() -> Self::Native {
        Self::Native::default()
    }
}

macro_rules! primitive_markers {
    ($($name:ident: $native:ty => $variant:ident,)*) => {$(
        #[doc = concat!("Marker for [`DataType::", stringify!($variant), "`], stored as `", stringify!($native), "`")]
        #[derive(Debug)]
        pub struct $name {}

        impl QuiverPrimitiveType for $name {
            type Native = $native;
            const DATA_TYPE: DataType = DataType::$variant;
        }
    )*};
}

primitive_markers! {
    Int8Type: i8 => Int8,
    Int16Type: i16 => Int16,
    Int32Type: i32 => Int32,
    Int64Type: i64 => Int64,
    UInt8Type: u8 => UInt8,
    UInt16Type: u16 => UInt16,
    UInt32Type: u32 => UInt32,
    UInt64Type: u64 => UInt64,
    Float16Type: f16 => Float16,
    Float32Type: f32 => Float32,
    Float64Type: f64 => Float64,
}

pub(crate) mod bytes {
    use super::*;

    pub trait Sealed {}
    impl Sealed for Utf8Type {}
    impl Sealed for BinaryType {}

    /// Reinterprets the bytes of one value
    pub trait ByteArrayNativeType: std::fmt::Debug + Send + Sync {
        /// # Safety
        ///
        /// `b` must already be known to be a valid `Self`, e.g. UTF-8 for `str`
        unsafe fn from_bytes_unchecked(b: &[u8]) -> &Self;
    }

    impl ByteArrayNativeType for [u8] {
        #[inline]
        unsafe fn from_bytes_unchecked(b: &[u8]) -> &Self {
            b
        }
    }

    impl ByteArrayNativeType for str {
        #[inline]
        unsafe fn from_bytes_unchecked(b: &[u8]) -> &Self {
            std::str::from_utf8_unchecked(b)
        }
    }
}

/// Selects between the variable-length [`StringArray`](crate::StringArray) and
/// [`BinaryArray`](crate::BinaryArray)
pub trait ByteArrayType: 'static + Send + Sync + bytes::Sealed {
    /// `str` or `[u8]`
    type Native: bytes::ByteArrayNativeType + AsRef<Self::Native> + AsRef<[u8]> + ?Sized;

    /// Name used in panics and errors, as in "StringArray"
    const PREFIX: &'static str;

    /// Logical type of arrays of this marker
    const DATA_TYPE: DataType;
}

/// Marker for UTF-8 values, see [`StringArray`](crate::StringArray)
#[derive(Debug)]
pub struct Utf8Type {}

impl ByteArrayType for Utf8Type {
    type Native = str;
    const PREFIX: &'static str = "String";
    const DATA_TYPE: DataType = DataType::Utf8;
}

/// Marker for opaque byte values, see [`BinaryArray`](crate::BinaryArray)
#[derive(Debug)]
pub struct BinaryType {}

impl ByteArrayType for BinaryType {
    type Native = [u8];
    const PREFIX: &'static str = "Binary";
    const DATA_TYPE: DataType = DataType::Binary;
}
