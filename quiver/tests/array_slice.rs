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

//! Slicing of arrays and buffers

use std::sync::Arc;

use quiver::array::*;
use quiver::buffer::Buffer;
use quiver::datatypes::DataType;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Every `(offset, len)` window of a length 3 array
fn windows() -> impl Iterator<Item = (usize, usize)> {
    (0..=3).flat_map(|offset| (0..=3 - offset).map(move |len| (offset, len)))
}

#[test]
fn test_slice_primitive_exhaustive() {
    let array = Int32Array::from(vec![Some(7), None, Some(-3)]);
    for (offset, len) in windows() {
        let sliced = array.slice(offset, len);
        assert_eq!(sliced.len(), len);
        for i in 0..len {
            assert_eq!(sliced.is_null(i), array.is_null(offset + i));
            if sliced.is_valid(i) {
                assert_eq!(sliced.value(i), array.value(offset + i));
            }
        }
        let nulls = (offset..offset + len).filter(|i| *i == 1).count();
        assert_eq!(sliced.null_count(), nulls, "{offset} {len}");
    }
}

#[test]
fn test_slice_string_exhaustive() {
    let array = StringArray::from(vec![Some("hello"), Some(""), None]);
    for (offset, len) in windows() {
        let sliced = array.slice(offset, len);
        assert_eq!(sliced.len(), len);
        for i in 0..len {
            assert_eq!(sliced.is_null(i), array.is_null(offset + i));
            assert_eq!(sliced.value(i), array.value(offset + i));
        }
    }
}

#[test]
fn test_slice_boolean_exhaustive() {
    let array = BooleanArray::from(vec![Some(true), Some(false), None]);
    for (offset, len) in windows() {
        let sliced = array.slice(offset, len);
        for i in 0..len {
            assert_eq!(sliced.is_null(i), array.is_null(offset + i));
            assert_eq!(sliced.value(i), array.value(offset + i));
        }
    }
}

#[test]
fn test_slice_of_slice_random() {
    let mut rng = StdRng::seed_from_u64(42);
    let values: Vec<Option<i64>> = (0..200)
        .map(|_| rng.random_bool(0.8).then(|| rng.random()))
        .collect();
    let array = Int64Array::from(values.clone());

    for _ in 0..100 {
        let a = rng.random_range(0..=values.len());
        let b = rng.random_range(0..=values.len() - a);
        let outer = array.slice(a, b);
        let c = rng.random_range(0..=b);
        let d = rng.random_range(0..=b - c);
        let inner = outer.slice(c, d);

        let expected: Vec<_> = values[a + c..a + c + d].to_vec();
        let actual: Vec<_> = inner.iter().collect();
        assert_eq!(actual, expected);
    }
}

#[test]
fn test_slice_is_zero_copy() {
    let array = Int32Array::from(vec![1, 2, 3, 4]);
    let data = array.to_data();
    let values = &data.buffers()[0];
    let before = values.strong_count();

    let sliced = array.slice(1, 2);
    let sliced_data = sliced.to_data();
    let sliced_values = &sliced_data.buffers()[0];
    assert_eq!(sliced_values.as_ptr(), values.as_ptr());
    assert!(sliced_values.ptr_eq(values));
    assert!(sliced_values.strong_count() > before);
    assert_eq!(sliced.values(), &[2, 3]);

    let buffer = Buffer::from_vec(vec![0_u8; 64]);
    let tail = buffer.slice(16);
    assert_eq!(tail.as_ptr(), unsafe { buffer.as_ptr().add(16) });
    assert_eq!(buffer.strong_count(), 2);
    drop(tail);
    assert_eq!(buffer.strong_count(), 1);
}

#[test]
fn test_slice_leaves_original_untouched() {
    let array: ArrayRef = Arc::new(StringArray::from(vec!["a", "bc", "def"]));
    let sliced = array.slice(1, 1);
    drop(array.clone());
    assert_eq!(sliced.len(), 1);
    assert_eq!(array.len(), 3);
    assert_eq!(array.offset(), 0);
    assert_eq!(sliced.offset(), 1);
    assert_eq!(sliced.data_type(), &DataType::Utf8);

    let data = sliced.to_data();
    assert_eq!(data.buffer::<i32>(0)[..2], [1, 3]);
}

#[test]
fn test_validation_failures() {
    // offsets need len + 1 entries
    let err = ArrayData::builder(DataType::Utf8)
        .len(3)
        .add_buffer(Buffer::from_vec(vec![0_i32, 1, 2]))
        .add_buffer(Buffer::from_vec(b"ab".to_vec()))
        .build()
        .unwrap_err();
    assert!(matches!(err, quiver::error::QuiverError::StructuralMismatch(_)), "{err}");

    // decreasing offsets
    let err = ArrayData::builder(DataType::Binary)
        .len(2)
        .add_buffer(Buffer::from_vec(vec![0_i32, 2, 1]))
        .add_buffer(Buffer::from_vec(b"ab".to_vec()))
        .build()
        .unwrap_err();
    assert!(matches!(err, quiver::error::QuiverError::StructuralMismatch(_)), "{err}");

    // values too short
    let err = ArrayData::builder(DataType::Int64)
        .len(3)
        .add_buffer(Buffer::from_vec(vec![1_i64, 2]))
        .build()
        .unwrap_err();
    assert!(matches!(err, quiver::error::QuiverError::StructuralMismatch(_)), "{err}");

    // wrapping in the wrong concrete type
    let data = Int32Array::from(vec![1]).into_data();
    let err = StringArray::try_new_from_data(data).unwrap_err();
    assert!(matches!(err, quiver::error::QuiverError::TypeMismatch(_)), "{err}");
}
