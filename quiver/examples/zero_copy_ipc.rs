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

//! Decodes an IPC stream held in a [`bytes::Bytes`] without copying array data

use std::sync::Arc;

use quiver::array::builder::{Int64Builder, ListBuilder};
use quiver::array::cast::AsArray;
use quiver::array::{Array, ArrayRef, StringArray};
use quiver::buffer::Buffer;
use quiver::error::Result;
use quiver::ipc::reader::StreamDecoder;
use quiver::ipc::writer::StreamWriter;
use quiver::record_batch::RecordBatch;

fn main() -> Result<()> {
    let mut lists = ListBuilder::new(Int64Builder::new());
    lists.append_value([Some(1), Some(2), Some(3)]);
    lists.append_null();
    lists.append_value([Some(4)]);
    let names = StringArray::from(vec!["a", "b", "c"]);

    let batch = RecordBatch::try_from_iter([
        ("lists", Arc::new(lists.finish()) as ArrayRef),
        ("names", Arc::new(names) as ArrayRef),
    ])?;

    let mut writer = StreamWriter::try_new(vec![], &batch.schema())?;
    writer.write(&batch)?;
    writer.write(&batch.slice(1, 2))?;
    let bytes = bytes::Bytes::from(writer.into_inner()?);
    let (start, end) = (bytes.as_ptr() as usize, bytes.as_ptr() as usize + bytes.len());

    let mut buffer = Buffer::from(bytes);
    let mut decoder = StreamDecoder::new();
    while !buffer.is_empty() {
        let Some(batch) = decoder.decode(&mut buffer)? else {
            continue;
        };
        let names = batch.column(1).as_string();
        let shared = names.value_data().as_ptr() as usize;
        println!(
            "{} rows, names {:?}, borrowed from input: {}",
            batch.num_rows(),
            names.iter().collect::<Vec<_>>(),
            (start..end).contains(&shared),
        );
        let lists = batch.column(0).as_list();
        for i in 0..lists.len() {
            match lists.is_valid(i) {
                true => println!("  [{i}] {:?}", lists.value(i)),
                false => println!("  [{i}] null"),
            }
        }
    }
    decoder.finish()
}
