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

use super::utils::equal_len;
use crate::data::ArrayData;

/// True if both offset windows delimit elements of the same lengths
///
/// The windows may start anywhere: `[0, 2, 4, 6, 9]` matches `[4, 6, 8, 10, 13]`.
pub(super) fn lengths_equal(lhs: &[i32], rhs: &[i32]) -> bool {
    debug_assert_eq!(lhs.len(), rhs.len());
    match (lhs.first(), rhs.first()) {
        (Some(l), Some(r)) if l == r => lhs == rhs,
        (Some(l), Some(r)) => lhs.iter().zip(rhs).all(|(a, b)| a - l == b - r),
        _ => true,
    }
}

/// Strings or binaries, which may sit at different places in their value buffers
pub(super) fn bytes_run(lhs: &ArrayData, rhs: &ArrayData, l: usize, r: usize, n: usize) -> bool {
    let lhs_offsets = &lhs.buffer::<i32>(0)[l..=l + n];
    let rhs_offsets = &rhs.buffer::<i32>(0)[r..=r + n];
    lengths_equal(lhs_offsets, rhs_offsets)
        && equal_len(
            lhs.buffers()[1].as_slice(),
            rhs.buffers()[1].as_slice(),
            lhs_offsets[0] as usize,
            rhs_offsets[0] as usize,
            (lhs_offsets[n] - lhs_offsets[0]) as usize,
        )
}
