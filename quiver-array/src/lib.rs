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

//! Typed, immutable columnar arrays
//!
//! Every array wraps an [`ArrayData`](quiver_data::ArrayData): a length, an offset and
//! a set of shared [`Buffer`](quiver_buffer::Buffer)s laid out according to its
//! [`DataType`](quiver_schema::DataType). The [`Array`] trait erases the concrete type,
//! and [`make_array`] restores it from raw data.
//!
//! # Constructing arrays
//!
//! ```
//! # use quiver_array::{Array, BooleanArray, Int32Array, ListArray, StringArray};
//! # use quiver_array::types::Int32Type;
//! let ints = Int32Array::from(vec![Some(1), None, Some(3)]);
//! let strings: StringArray = ["a", "bc"].into_iter().map(Some).collect();
//! let bools = BooleanArray::from(vec![true, false]);
//! let lists = ListArray::from_iter_primitive::<Int32Type, _, _>([
//!     Some(vec![Some(1), None]),
//!     None,
//!     Some(vec![]),
//! ]);
//!
//! assert_eq!(ints.null_count(), 1);
//! assert_eq!(strings.value(1), "bc");
//! assert_eq!(bools.len(), 2);
//! assert_eq!(lists.value_offsets(), &[0, 2, 2, 2]);
//! ```
//!
//! The [`builder`] module offers push-based construction, including nested lists whose
//! elements are opened one at a time.
//!
//! # Slicing
//!
//! [`Array::slice`] returns a view sharing the parent's buffers. Only the offset and
//! length change, so slicing a slice is as cheap as the first slice.
//!
//! ```
//! # use quiver_array::{Array, Int64Array};
//! let array = Int64Array::from_iter_values(0..10);
//! let sliced = array.slice(2, 6).slice(1, 3);
//! assert_eq!(sliced.values(), &[3, 4, 5]);
//! assert_eq!(sliced.offset(), 3);
//! ```
//!
//! # Downcasting
//!
//! [`AsArray`](cast::AsArray) recovers the concrete array behind an [`ArrayRef`].
//!
//! ```
//! # use std::sync::Arc;
//! # use quiver_array::{ArrayRef, Float32Array};
//! # use quiver_array::cast::AsArray;
//! # use quiver_array::types::Float32Type;
//! let array: ArrayRef = Arc::new(Float32Array::from(vec![Some(1.), None, Some(2.5)]));
//! let total: f32 = array.as_primitive::<Float32Type>().iter().flatten().sum();
//! assert_eq!(total, 3.5);
//! ```

#![warn(missing_docs)]

pub mod array;
pub use array::*;

pub mod builder;
pub mod cast;
mod iterator;
pub use iterator::*;

mod record_batch;
pub use record_batch::{RecordBatch, RecordBatchOptions, RecordBatchWriter};

pub mod types;
