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

use criterion::{criterion_group, criterion_main, Criterion};
use quiver_array::builder::{Int32Builder, ListBuilder, StringBuilder};
use quiver_array::{ArrayRef, RecordBatch};
use quiver_ipc::reader::{StreamDecoder, StreamReader};
use quiver_ipc::writer::StreamWriter;
use quiver_buffer::Buffer;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;

fn criterion_benchmark(c: &mut Criterion) {
    let _ = env_logger::try_init();
    let batch = create_batch(8192, true);
    let stream = ipc_stream(&batch);

    let mut group = c.benchmark_group("quiver_ipc_stream");

    group.bench_function("StreamWriter/write_10", |b| {
        let mut buffer = Vec::with_capacity(2 * 1024 * 1024);
        b.iter(|| {
            buffer.clear();
            let mut writer = StreamWriter::try_new(&mut buffer, &batch.schema()).unwrap();
            for _ in 0..10 {
                writer.write(&batch).unwrap();
            }
            writer.finish().unwrap();
        })
    });

    group.bench_function("StreamReader/read_10", |b| {
        b.iter(|| {
            let reader = StreamReader::new(stream.as_slice());
            for batch in reader {
                batch.unwrap();
            }
        })
    });

    group.bench_function("StreamDecoder/read_10", |b| {
        let buffer = Buffer::from_vec(stream.clone());
        b.iter(|| {
            let mut buffer = buffer.clone();
            let mut decoder = StreamDecoder::new();
            while decoder.decode(&mut buffer).unwrap().is_some() {}
            decoder.finish().unwrap();
        })
    });
}

fn ipc_stream(batch: &RecordBatch) -> Vec<u8> {
    let mut writer = StreamWriter::try_new(vec![], &batch.schema()).unwrap();
    for _ in 0..10 {
        writer.write(batch).unwrap();
    }
    writer.into_inner().unwrap()
}

fn create_batch(num_rows: usize, allow_nulls: bool) -> RecordBatch {
    let mut rng = StdRng::seed_from_u64(42);
    let mut ints = Int32Builder::new();
    let mut strings = StringBuilder::new();
    let mut lists = ListBuilder::new(Int32Builder::new());

    for _ in 0..num_rows {
        let valid = !allow_nulls || rng.random_bool(0.9);
        match valid {
            true => {
                ints.append_value(rng.random());
                strings.append_value(format!("value {}", rng.random_range(0..1000)));
                let n = rng.random_range(0..5);
                lists.append_value((0..n).map(|_| Some(rng.random::<i32>())));
            }
            false => {
                ints.append_null();
                strings.append_null();
                lists.append_null();
            }
        }
    }

    RecordBatch::try_from_iter([
        ("c0", Arc::new(ints.finish()) as ArrayRef),
        ("c1", Arc::new(strings.finish()) as ArrayRef),
        ("c2", Arc::new(lists.finish()) as ArrayRef),
    ])
    .unwrap()
}

fn config() -> Criterion {
    Criterion::default().sample_size(20)
}

criterion_group! {
    name = benches;
    config = config();
    targets = criterion_benchmark
}
criterion_main!(benches);
