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

//! Runs of lists and structs, which recurse into their children

use super::equal_range;
use super::variable_size::lengths_equal;
use crate::data::ArrayData;

/// Lists of equal lengths whose child ranges are equal
pub(super) fn list_run(lhs: &ArrayData, rhs: &ArrayData, l: usize, r: usize, n: usize) -> bool {
    let lhs_offsets = &lhs.buffer::<i32>(0)[l..=l + n];
    let rhs_offsets = &rhs.buffer::<i32>(0)[r..=r + n];
    if !lengths_equal(lhs_offsets, rhs_offsets) {
        return false;
    }
    let start = |offsets: &[i32]| offsets[0] as usize;
    let values = (lhs_offsets[n] - lhs_offsets[0]) as usize;
    equal_range(
        &lhs.child_data()[0],
        &rhs.child_data()[0],
        start(lhs_offsets),
        start(rhs_offsets),
        values,
    )
}

/// Structs share their offset with children that are not sliced along with them
pub(super) fn struct_run(lhs: &ArrayData, rhs: &ArrayData, l: usize, r: usize, n: usize) -> bool {
    let (l, r) = (lhs.offset() + l, rhs.offset() + r);
    lhs.child_data()
        .iter()
        .zip(rhs.child_data())
        .all(|(lhs, rhs)| equal_range(lhs, rhs, l, r, n))
}
