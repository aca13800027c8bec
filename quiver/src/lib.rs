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

//! A columnar in-memory format and its IPC stream encoding
//!
//! This crate re-exports the component crates under a single namespace:
//!
//! * [`buffer`]: aligned, reference counted memory and memory accounting
//! * [`array`]: typed arrays, builders and [`ArrayData`](array::ArrayData)
//! * [`datatypes`]: the logical types, fields and schemas
//! * [`record_batch`]: equal length columns under a schema
//! * [`ipc`]: the streaming wire format, blocking and async
//!
//! # Example
//!
//! ```
//! # use std::sync::Arc;
//! use quiver::array::{ArrayRef, Int32Array, StringArray};
//! use quiver::ipc::reader::StreamReader;
//! use quiver::ipc::writer::StreamWriter;
//! use quiver::record_batch::RecordBatch;
//!
//! let batch = RecordBatch::try_from_iter([
//!     ("id", Arc::new(Int32Array::from(vec![1, 2, 3])) as ArrayRef),
//!     ("name", Arc::new(StringArray::from(vec![Some("a"), None, Some("c")])) as ArrayRef),
//! ])?;
//!
//! let mut writer = StreamWriter::try_new(vec![], &batch.schema())?;
//! writer.write(&batch)?;
//! let bytes = writer.into_inner()?;
//!
//! let batches = StreamReader::new(bytes.as_slice()).collect::<Result<Vec<_>, _>>()?;
//! assert_eq!(batches, vec![batch]);
//! # Ok::<_, quiver::error::QuiverError>(())
//! ```

#![warn(missing_docs)]

pub mod array;
pub mod datatypes;
pub mod error;
#[cfg(feature = "ipc")]
pub use quiver_ipc as ipc;
pub mod record_batch;

pub use quiver_buffer as buffer;
