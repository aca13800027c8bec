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

//! Logical equality of [`ArrayData`]
//!
//! Arrays compare by the values they present, so a slice equals a copy of the same
//! values whatever its offset, buffer sizes or bytes hidden behind nulls.

use crate::data::{ArrayData, PhysicalType, PrimitiveType};
use half::f16;

mod fixed;
mod nested;
mod utils;
mod variable_size;

macro_rules! by_native {
    ($p:expr, $lhs:ident, $rhs:ident, $l:ident, $r:ident, $n:ident; $($variant:ident => $t:ty),*) => {
        match $p {
            $(PrimitiveType::$variant => fixed::primitive_run::<$t>($lhs, $rhs, $l, $r, $n),)*
        }
    };
}

/// Values of the `n` slots from `l` and `r`, all of them valid
fn equal_run(lhs: &ArrayData, rhs: &ArrayData, l: usize, r: usize, n: usize) -> bool {
    match PhysicalType::from(lhs.data_type()) {
        PhysicalType::Null => true,
        PhysicalType::Boolean => fixed::boolean_run(lhs, rhs, l, r, n),
        PhysicalType::Primitive(p) => by_native!(p, lhs, rhs, l, r, n;
            Int8 => i8, Int16 => i16, Int32 => i32, Int64 => i64,
            UInt8 => u8, UInt16 => u16, UInt32 => u32, UInt64 => u64,
            Float16 => f16, Float32 => f32, Float64 => f64),
        PhysicalType::Bytes(_) => variable_size::bytes_run(lhs, rhs, l, r, n),
        PhysicalType::List => nested::list_run(lhs, rhs, l, r, n),
        PhysicalType::Struct => nested::struct_run(lhs, rhs, l, r, n),
    }
}

/// Validity then the values of every valid run of `len` slots
///
/// Both sides must share type, and `lhs_start + len` and `rhs_start + len` must be
/// in bounds.
fn equal_range(
    lhs: &ArrayData,
    rhs: &ArrayData,
    lhs_start: usize,
    rhs_start: usize,
    len: usize,
) -> bool {
    utils::equal_nulls(lhs, rhs, lhs_start, rhs_start, len)
        && utils::valid_runs(lhs, lhs_start, rhs_start, len)
            .all(|(l, r, n)| equal_run(lhs, rhs, l, r, n))
}

/// True if `lhs` and `rhs` present the same values
///
/// That takes an equal type and length, nulls in the same slots, and equal bits in
/// every valid slot. Floats compare by bits, so a NaN equals itself and `0.0`
/// differs from `-0.0`.
///
/// # Panics
///
/// May panic if either side fails [`ArrayData::validate`]
pub fn equal(lhs: &ArrayData, rhs: &ArrayData) -> bool {
    lhs.data_type() == rhs.data_type()
        && lhs.len() == rhs.len()
        && lhs.null_count() == rhs.null_count()
        && equal_range(lhs, rhs, 0, 0, lhs.len())
}
