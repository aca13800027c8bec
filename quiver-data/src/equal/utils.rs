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

use crate::data::{contains_nulls, ArrayData};
use quiver_buffer::bit_util::get_bit;

/// Bits `lhs_start..lhs_start + len` of `lhs_values` against those of `rhs_values`
/// from `rhs_start`
#[inline]
pub(super) fn equal_bits(
    lhs_values: &[u8],
    rhs_values: &[u8],
    lhs_start: usize,
    rhs_start: usize,
    len: usize,
) -> bool {
    if (lhs_start | rhs_start | len) % 8 == 0 {
        return equal_len(lhs_values, rhs_values, lhs_start / 8, rhs_start / 8, len / 8);
    }
    (0..len).all(|i| get_bit(lhs_values, lhs_start + i) == get_bit(rhs_values, rhs_start + i))
}

/// Validity of `len` slots, a missing bitmap counting as all valid
#[inline]
pub(super) fn equal_nulls(
    lhs: &ArrayData,
    rhs: &ArrayData,
    lhs_start: usize,
    rhs_start: usize,
    len: usize,
) -> bool {
    match (lhs.nulls(), rhs.nulls()) {
        (Some(l), Some(r)) => equal_bits(
            l.validity(),
            r.validity(),
            l.offset() + lhs_start,
            r.offset() + rhs_start,
            len,
        ),
        (Some(l), None) => !contains_nulls(Some(l), lhs_start, len),
        (None, Some(r)) => !contains_nulls(Some(r), rhs_start, len),
        (None, None) => true,
    }
}

/// Maximal runs of valid slots of `lhs` within `lhs_start..lhs_start + len`, as
/// `(lhs position, rhs position, length)`
///
/// Without nulls this is the whole range in one run.
pub(super) fn valid_runs(
    lhs: &ArrayData,
    lhs_start: usize,
    rhs_start: usize,
    len: usize,
) -> impl Iterator<Item = (usize, usize, usize)> + '_ {
    let mut i = 0;
    std::iter::from_fn(move || {
        while i < len && lhs.is_null(lhs_start + i) {
            i += 1;
        }
        let start = i;
        while i < len && lhs.is_valid(lhs_start + i) {
            i += 1;
        }
        (i > start).then(|| (lhs_start + start, rhs_start + start, i - start))
    })
}

#[inline]
pub(super) fn equal_len(
    lhs_values: &[u8],
    rhs_values: &[u8],
    lhs_start: usize,
    rhs_start: usize,
    len: usize,
) -> bool {
    lhs_values[lhs_start..lhs_start + len] == rhs_values[rhs_start..rhs_start + len]
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiver_buffer::{Buffer, NullBuffer};
    use quiver_schema::DataType;

    #[test]
    fn test_equal_bits_unaligned() {
        let a = [0b1011_0110_u8, 0b0000_0001];
        let b = [0b1101_1011_u8];
        // a[1..9] == b[0..8]
        assert!(equal_bits(&a, &b, 1, 0, 8));
        assert!(!equal_bits(&a, &b, 0, 0, 8));
        assert!(equal_bits(&a, &a, 0, 0, 16));
        assert!(equal_bits(&a, &b, 3, 5, 0));
    }

    #[test]
    fn test_valid_runs() {
        let validity = NullBuffer::from(vec![false, true, true, false, false, true, true, true]);
        let data = ArrayData::builder(DataType::UInt8)
            .len(8)
            .add_buffer(Buffer::from_vec(vec![0_u8; 8]))
            .nulls(Some(validity))
            .build()
            .unwrap();
        let runs: Vec<_> = valid_runs(&data, 0, 10, 8).collect();
        assert_eq!(runs, vec![(1, 11, 2), (5, 15, 3)]);

        let runs: Vec<_> = valid_runs(&data, 2, 0, 2).collect();
        assert_eq!(runs, vec![(2, 0, 1)]);
        assert_eq!(valid_runs(&data, 3, 0, 2).count(), 0);

        let all_valid = data.into_builder().nulls(None).build().unwrap();
        let runs: Vec<_> = valid_runs(&all_valid, 1, 1, 6).collect();
        assert_eq!(runs, vec![(1, 1, 6)]);
    }
}
