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

//! Bit level helpers for validity bitmaps and boolean values
//!
//! Bits are numbered least significant first, so bit `i` lives in byte `i / 8`
//! at position `i % 8`.

#[inline]
fn mask(i: usize) -> u8 {
    1 << (i % 8)
}

/// Round `num` up to a multiple of 64
///
/// # Panics
///
/// Panics if the result does not fit in a `usize`
#[inline]
pub fn round_upto_multiple_of_64(num: usize) -> usize {
    match num % 64 {
        0 => num,
        rem => num
            .checked_add(64 - rem)
            .unwrap_or_else(|| panic!("{num} rounded up to a multiple of 64 overflows usize")),
    }
}

/// Value of bit `i`
#[inline]
pub fn get_bit(data: &[u8], i: usize) -> bool {
    data[i / 8] & mask(i) != 0
}

/// Set bit `i` to one
#[inline]
pub fn set_bit(data: &mut [u8], i: usize) {
    data[i / 8] |= mask(i);
}

/// Clear bit `i`
#[inline]
pub fn unset_bit(data: &mut [u8], i: usize) {
    data[i / 8] &= !mask(i);
}

#[inline]
fn write_bit(data: &mut [u8], i: usize, value: bool) {
    match value {
        true => set_bit(data, i),
        false => unset_bit(data, i),
    }
}

/// `value / divisor`, rounded up
#[inline]
pub fn ceil(value: usize, divisor: usize) -> usize {
    value.div_ceil(divisor)
}

/// Number of ones among the `len` bits of `data` starting at bit `offset`
///
/// # Panics
///
/// Panics if the range reaches past the end of `data`
pub fn count_set_bits_offset(data: &[u8], offset: usize, len: usize) -> usize {
    let end = offset + len;
    assert!(ceil(end, 8) <= data.len(), "bit range out of bounds");

    let first_whole = ceil(offset, 8);
    let last_whole = end / 8;
    if first_whole >= last_whole {
        return (offset..end).filter(|&i| get_bit(data, i)).count();
    }
    let head = (offset..first_whole * 8).filter(|&i| get_bit(data, i)).count();
    let body: u32 = data[first_whole..last_whole].iter().map(|b| b.count_ones()).sum();
    let tail = (last_whole * 8..end).filter(|&i| get_bit(data, i)).count();
    head + body as usize + tail
}

/// Copy `len` bits of `src`, starting at bit `src_offset`, to the start of `dst`
///
/// Bits of `dst` past `len` are left as they were.
pub fn copy_bits(src: &[u8], src_offset: usize, dst: &mut [u8], len: usize) {
    let mut done = 0;
    if src_offset % 8 == 0 {
        let from = src_offset / 8;
        done = len / 8 * 8;
        dst[..done / 8].copy_from_slice(&src[from..from + done / 8]);
    }
    for i in done..len {
        write_bit(dst, i, get_bit(src, src_offset + i));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn random_bytes(n: usize) -> Vec<u8> {
        let mut rng = StdRng::seed_from_u64(42);
        (0..n).map(|_| rng.random()).collect()
    }

    #[test]
    fn test_round_to_64() {
        let rounded: Vec<_> = [0, 1, 63, 64, 65, 200]
            .into_iter()
            .map(round_upto_multiple_of_64)
            .collect();
        assert_eq!(rounded, [0, 64, 64, 64, 128, 256]);
    }

    #[test]
    #[should_panic(expected = "rounded up to a multiple of 64 overflows usize")]
    fn test_round_to_64_overflow() {
        round_upto_multiple_of_64(usize::MAX - 3);
    }

    #[test]
    fn test_bits_are_lsb_first() {
        let data = [0b0000_0101, 0b1000_0000];
        let ones: Vec<_> = (0..16).filter(|&i| get_bit(&data, i)).collect();
        assert_eq!(ones, [0, 2, 15]);

        let mut bits = [0_u8; 2];
        for i in ones {
            set_bit(&mut bits, i);
        }
        assert_eq!(bits, data);
        unset_bit(&mut bits, 2);
        unset_bit(&mut bits, 3);
        assert_eq!(bits, [0b0000_0001, 0b1000_0000]);
    }

    #[test]
    fn test_random_writes_read_back() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut expected = [false; 96];
        let mut bits = [0_u8; 12];
        for _ in 0..200 {
            let i = rng.random_range(0..96);
            let v = rng.random_bool(0.5);
            expected[i] = v;
            write_bit(&mut bits, i, v);
        }
        for (i, v) in expected.iter().enumerate() {
            assert_eq!(get_bit(&bits, i), *v, "bit {i}");
        }
    }

    #[test]
    fn test_ceil() {
        assert_eq!(ceil(0, 8), 0);
        assert_eq!(ceil(7, 8), 1);
        assert_eq!(ceil(16, 8), 2);
        assert_eq!(ceil(17, 8), 3);
        assert_eq!(ceil(1 << 40, 3), (1 << 40) / 3 + 1);
    }

    #[test]
    fn test_count_set_bits_offset() {
        let data = random_bytes(16);
        for offset in 0..20 {
            for len in [0, 1, 5, 8, 12, 16, 31, 64, 100] {
                let naive = (offset..offset + len).filter(|&i| get_bit(&data, i)).count();
                assert_eq!(count_set_bits_offset(&data, offset, len), naive, "{offset}+{len}");
            }
        }
        assert_eq!(count_set_bits_offset(&[0xff; 3], 0, 24), 24);
    }

    #[test]
    fn test_count_within_one_byte() {
        for byte in [0b1010_0101_u8, 0b0000_0001, 0b1000_0000, 0xff, 0] {
            let data = [byte, 0xff];
            for offset in 0..8 {
                for len in 0..=8 - offset {
                    let naive = (offset..offset + len).filter(|&i| get_bit(&data, i)).count();
                    let counted = count_set_bits_offset(&data, offset, len);
                    assert_eq!(counted, naive, "{byte:#010b} {offset}+{len}");
                }
            }
        }
        // straddles the byte boundary without a whole byte inside
        assert_eq!(count_set_bits_offset(&[0b1000_0000, 0b0000_0001], 7, 2), 2);
        assert_eq!(count_set_bits_offset(&[0b0111_1111, 0b1111_1110], 7, 2), 0);
    }

    #[test]
    #[should_panic(expected = "bit range out of bounds")]
    fn test_count_past_end() {
        count_set_bits_offset(&[0xff], 4, 5);
    }

    #[test]
    fn test_copy_bits_keeps_trailing_bits() {
        let src = random_bytes(8);
        for offset in [0, 3, 8, 13] {
            for len in [0, 6, 16, 21] {
                let mut dst = vec![0xaa_u8; 4];
                copy_bits(&src, offset, &mut dst, len);
                for i in 0..32 {
                    let want = match i < len {
                        true => get_bit(&src, offset + i),
                        false => get_bit(&[0xaa; 4], i),
                    };
                    assert_eq!(get_bit(&dst, i), want, "{offset}+{len} bit {i}");
                }
            }
        }
    }
}
