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

//! Support for the quiver IPC stream format
//!
//! A stream is a sequence of length prefixed flatbuffer messages: one `Schema` message
//! followed by any number of `RecordBatch` messages, each carrying a body of buffers,
//! and terminated by an end-of-stream marker.
//!
//! ```
//! # use std::sync::Arc;
//! # use quiver_array::{Int32Array, RecordBatch};
//! # use quiver_ipc::reader::StreamReader;
//! # use quiver_ipc::writer::StreamWriter;
//! let batch = RecordBatch::try_from_iter([(
//!     "a",
//!     Arc::new(Int32Array::from(vec![1, 2, 3])) as _,
//! )])
//! .unwrap();
//!
//! let mut writer = StreamWriter::try_new(vec![], &batch.schema()).unwrap();
//! writer.write(&batch).unwrap();
//! let bytes = writer.into_inner().unwrap();
//!
//! let mut reader = StreamReader::new(bytes.as_slice());
//! assert_eq!(reader.schema().unwrap(), batch.schema());
//! assert_eq!(reader.next_batch().unwrap().unwrap(), batch);
//! assert!(reader.next_batch().unwrap().is_none());
//! ```
//!
//! The `async` feature, enabled by default, adds [`reader::AsyncStreamReader`] and
//! [`writer::AsyncStreamWriter`] over tokio's `AsyncRead` and `AsyncWrite`.

#![warn(missing_docs)]

pub mod convert;
pub mod reader;
pub mod writer;

#[allow(missing_docs)]
#[allow(clippy::all)]
pub mod gen;

pub use gen::*;

const CONTINUATION_MARKER: [u8; 4] = [0xff; 4];
