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

//! Runs of fixed width values

use quiver_buffer::{NativeType, ToByteSlice};

use super::utils::equal_bits;
use crate::data::ArrayData;

pub(super) fn boolean_run(lhs: &ArrayData, rhs: &ArrayData, l: usize, r: usize, n: usize) -> bool {
    equal_bits(
        lhs.buffers()[0].as_slice(),
        rhs.buffers()[0].as_slice(),
        lhs.offset() + l,
        rhs.offset() + r,
        n,
    )
}

/// Compares bytes, not values, so NaNs with equal payloads match
pub(super) fn primitive_run<T: NativeType>(
    lhs: &ArrayData,
    rhs: &ArrayData,
    l: usize,
    r: usize,
    n: usize,
) -> bool {
    lhs.buffer::<T>(0)[l..l + n].to_byte_slice() == rhs.buffer::<T>(0)[r..r + n].to_byte_slice()
}
