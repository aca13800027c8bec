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

//! IPC stream readers
//!
//! [`StreamReader`] pulls frames from a [`Read`], [`AsyncStreamReader`] from a tokio
//! `AsyncRead`, and [`StreamDecoder`] decodes bytes pushed to it. All three share the
//! decoding in [`StreamDecoder`] and [`RecordBatchDecoder`].

mod scratch;
mod stream;

#[cfg(feature = "async")]
mod async_stream;

#[cfg(feature = "async")]
pub use async_stream::*;
pub use scratch::*;
pub use stream::*;

use std::fmt;
use std::io::{ErrorKind, Read};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use flatbuffers::VectorIter;
use quiver_array::{make_array, RecordBatch, RecordBatchOptions};
use quiver_buffer::alloc::{default_allocator, MemoryAllocator};
use quiver_buffer::{Buffer, MutableBuffer};
use quiver_data::{layout, ArrayData, BufferSpec};
use quiver_schema::{DataType, Field, QuiverError, SchemaRef};

use crate::FieldNode;

/// Options controlling how IPC streams are read
#[derive(Debug, Clone)]
pub struct IpcReadOptions {
    require_end_marker: bool,
    require_alignment: bool,
    allocator: Arc<dyn MemoryAllocator>,
    scratch_pool: Arc<ScratchPool>,
}

impl Default for IpcReadOptions {
    fn default() -> Self {
        Self {
            require_end_marker: true,
            require_alignment: false,
            allocator: default_allocator(),
            scratch_pool: Arc::new(ScratchPool::default()),
        }
    }
}

impl IpcReadOptions {
    /// Create the default options
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether input that ends on a frame boundary without an end-of-stream marker is an
    /// error (`true`, the default) or a clean end of stream
    pub fn with_require_end_marker(mut self, require_end_marker: bool) -> Self {
        self.require_end_marker = require_end_marker;
        self
    }

    /// Whether misaligned buffers are an error (`true`) or copied into aligned memory
    /// (`false`, the default)
    pub fn with_require_alignment(mut self, require_alignment: bool) -> Self {
        self.require_alignment = require_alignment;
        self
    }

    /// Set the allocator providing the memory message bodies are read into
    pub fn with_allocator(mut self, allocator: Arc<dyn MemoryAllocator>) -> Self {
        self.allocator = allocator;
        self
    }

    /// Set the pool frame prefixes and messages are staged in
    pub fn with_scratch_pool(mut self, scratch_pool: Arc<ScratchPool>) -> Self {
        self.scratch_pool = scratch_pool;
        self
    }

    /// Returns true if an end-of-stream marker is required
    pub fn require_end_marker(&self) -> bool {
        self.require_end_marker
    }

    /// Returns true if misaligned buffers are an error
    pub fn require_alignment(&self) -> bool {
        self.require_alignment
    }

    /// Returns the allocator used for message bodies
    pub fn allocator(&self) -> &Arc<dyn MemoryAllocator> {
        &self.allocator
    }

    /// Returns the scratch pool
    pub fn scratch_pool(&self) -> &Arc<ScratchPool> {
        &self.scratch_pool
    }

    fn decoder(&self) -> StreamDecoder {
        StreamDecoder::new()
            .with_require_alignment(self.require_alignment)
            .with_require_end_marker(self.require_end_marker)
    }
}

/// A flag shared between a reader and the code that wants to stop it
///
/// Cloning the token shares the flag. Once cancelled, a token stays cancelled.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    /// Create a token that is not cancelled
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel every reader observing this token
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Returns true if [`Self::cancel`] was called on this token or a clone of it
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Decodes the arrays of a `RecordBatch` message from its body
///
/// Field nodes and buffers are consumed in pre-order of the schema: each field takes one
/// node, its validity bitmap (except for `Null`), the buffers of its layout, and then its
/// children.
pub struct RecordBatchDecoder<'a> {
    /// The flatbuffer header of the batch
    batch: crate::RecordBatch<'a>,
    /// The schema of the stream
    schema: SchemaRef,
    /// The message body
    data: &'a Buffer,
    /// The field nodes, in pre-order
    nodes: VectorIter<'a, FieldNode>,
    /// The buffers, in pre-order
    buffers: VectorIter<'a, crate::Buffer>,
    require_alignment: bool,
}

impl fmt::Debug for RecordBatchDecoder<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordBatchDecoder")
            .field("schema", &self.schema)
            .field("body_len", &self.data.len())
            .field("require_alignment", &self.require_alignment)
            .finish()
    }
}

impl<'a> RecordBatchDecoder<'a> {
    /// Create a decoder for `batch`, whose buffers are located in `buf`
    pub fn try_new(
        buf: &'a Buffer,
        batch: crate::RecordBatch<'a>,
        schema: SchemaRef,
    ) -> Result<Self, QuiverError> {
        if let Some(compression) = batch.compression() {
            return Err(QuiverError::NotYetImplemented(format!(
                "Compressed record batches ({:?}) are not supported",
                compression.codec()
            )));
        }
        let buffers = batch.buffers().ok_or_else(|| {
            QuiverError::Ipc("Unable to get buffers from IPC RecordBatch".to_string())
        })?;
        let nodes = batch.nodes().ok_or_else(|| {
            QuiverError::Ipc("Unable to get field nodes from IPC RecordBatch".to_string())
        })?;
        Ok(Self {
            batch,
            schema,
            data: buf,
            nodes: nodes.iter(),
            buffers: buffers.iter(),
            require_alignment: false,
        })
    }

    /// Specifies whether misaligned buffers are an error
    ///
    /// If `false` (the default) misaligned buffers are copied into aligned memory, aligned
    /// buffers remain zero-copy slices of the body.
    pub fn with_require_alignment(mut self, require_alignment: bool) -> Self {
        self.require_alignment = require_alignment;
        self
    }

    /// Decode the batch
    pub fn read_record_batch(mut self) -> Result<RecordBatch, QuiverError> {
        let length = self.batch.length();
        let length = usize::try_from(length)
            .map_err(|_| QuiverError::Ipc(format!("Invalid record batch length {length}")))?;

        let schema = self.schema.clone();
        let columns = schema
            .fields()
            .iter()
            .map(|field| self.create_array(field).map(make_array))
            .collect::<Result<Vec<_>, _>>()?;

        let options = RecordBatchOptions::new().with_row_count(Some(length));
        RecordBatch::try_new_with_options(schema, columns, &options)
    }

    fn create_array(&mut self, field: &Field) -> Result<ArrayData, QuiverError> {
        let data_type = field.data_type();
        let node = self.next_node(field)?;
        let length = non_negative(node.length(), "length")?;
        let null_count = non_negative(node.null_count(), "null count")?;
        let layout = layout(data_type);

        let nulls = match layout.can_contain_null_mask {
            true => {
                let validity = self.next_buffer(1)?;
                (null_count > 0).then_some(validity)
            }
            false => {
                if length != null_count {
                    return Err(QuiverError::Ipc(format!(
                        "Field {} of type Null has unequal null_count {null_count} and len {length}",
                        field.name()
                    )));
                }
                None
            }
        };

        let buffers = layout
            .buffers
            .iter()
            .map(|spec| match spec {
                BufferSpec::FixedWidth { alignment, .. } => self.next_buffer(*alignment),
                BufferSpec::VariableWidth | BufferSpec::BitMap => self.next_buffer(1),
            })
            .collect::<Result<Vec<_>, _>>()?;

        let child_data = match data_type {
            DataType::List(child) => vec![self.create_array(child)?],
            DataType::Struct(fields) => fields
                .iter()
                .map(|child| self.create_array(child))
                .collect::<Result<Vec<_>, _>>()?,
            _ => vec![],
        };

        ArrayData::builder(data_type.clone())
            .len(length)
            .buffers(buffers)
            .child_data(child_data)
            .null_bit_buffer(nulls)
            .build()
    }

    fn next_node(&mut self, field: &Field) -> Result<&'a FieldNode, QuiverError> {
        self.nodes.next().ok_or_else(|| {
            QuiverError::Ipc(format!(
                "Invalid data for schema. Field {} refers to node not found in message",
                field.name()
            ))
        })
    }

    /// Slice the next buffer from the body, copying it if not aligned to `alignment`
    fn next_buffer(&mut self, alignment: usize) -> Result<Buffer, QuiverError> {
        let buf = self.buffers.next().ok_or_else(|| {
            QuiverError::Ipc("Buffer count mismatched with metadata".to_string())
        })?;
        let (offset, length) = (buf.offset(), buf.length());
        let outside = || {
            QuiverError::Ipc(format!(
                "Buffer at offset {offset} of length {length} is outside the message body of {} bytes",
                self.data.len()
            ))
        };
        let start = usize::try_from(offset).map_err(|_| outside())?;
        let len = usize::try_from(length).map_err(|_| outside())?;
        match start.checked_add(len) {
            Some(end) if end <= self.data.len() => {}
            _ => return Err(outside()),
        }

        let buffer = self.data.slice_with_length(start, len);
        if self.require_alignment || buffer.as_ptr().align_offset(alignment) == 0 {
            return Ok(buffer);
        }
        Ok(Buffer::from(buffer.as_slice()))
    }
}

/// Body bytes allocated before any of them are read, larger bodies grow as they arrive
const BODY_CHUNK: usize = 1 << 20;

/// Double a filled `body`, up to the `n` bytes its header declares
fn grow_body(body: &mut MutableBuffer, n: usize) {
    let len = body.len().saturating_mul(2).min(n);
    body.resize(len, 0);
}

fn non_negative(v: i64, what: &str) -> Result<usize, QuiverError> {
    usize::try_from(v).map_err(|_| QuiverError::Ipc(format!("Invalid field node {what} {v}")))
}

/// Read into `buf` until it is full or the source is exhausted, returning the bytes read
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<usize, QuiverError> {
    let mut read = 0;
    while read < buf.len() {
        match reader.read(&mut buf[read..]) {
            Ok(0) => break,
            Ok(n) => read += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            Err(e) => return Err(e.into()),
        }
    }
    Ok(read)
}

/// The outcome of reading one region of a frame
enum Step {
    Batch(RecordBatch),
    Progress,
    End,
}

fn missing_schema() -> QuiverError {
    QuiverError::ProtocolSequence("Stream ended before a schema message".to_string())
}

/// Blocking reader of an IPC stream
///
/// The schema is read on first use of [`Self::schema`] or [`Self::next_batch`]. Once the
/// end of the stream is reached every further call to [`Self::next_batch`] returns `Ok(None)`.
///
/// There is no internal buffering, wrap unbuffered sources in a [`std::io::BufReader`].
pub struct StreamReader<R> {
    /// Stream reader
    reader: R,
    decoder: StreamDecoder,
    options: IpcReadOptions,
}

impl<R> fmt::Debug for StreamReader<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamReader<R>")
            .field("reader", &"R")
            .field("decoder", &self.decoder)
            .field("options", &self.options)
            .finish()
    }
}

impl<R: Read> StreamReader<R> {
    /// Create a new stream reader with the default [`IpcReadOptions`]
    pub fn new(reader: R) -> Self {
        Self::new_with_options(reader, IpcReadOptions::default())
    }

    /// Create a new stream reader
    pub fn new_with_options(reader: R, options: IpcReadOptions) -> Self {
        Self {
            reader,
            decoder: options.decoder(),
            options,
        }
    }

    /// Return the schema of the stream, reading it if not yet read
    ///
    /// # Errors
    ///
    /// Returns [`QuiverError::ProtocolSequence`] if the stream ends before a schema message.
    pub fn schema(&mut self) -> Result<SchemaRef, QuiverError> {
        loop {
            if let Some(schema) = self.decoder.schema() {
                return Ok(schema);
            }
            match self.step()? {
                Step::Progress => {}
                Step::End | Step::Batch(_) => return Err(missing_schema()),
            }
        }
    }

    /// Read the next batch, returning `Ok(None)` at the end of the stream
    pub fn next_batch(&mut self) -> Result<Option<RecordBatch>, QuiverError> {
        self.schema()?;
        loop {
            match self.step()? {
                Step::Batch(batch) => return Ok(Some(batch)),
                Step::Progress => {}
                Step::End => return Ok(None),
            }
        }
    }

    /// Perform the read requested by the decoder
    fn step(&mut self) -> Result<Step, QuiverError> {
        let n = match self.decoder.next_read() {
            NextRead::Finished => return Ok(Step::End),
            NextRead::Body(n) => return self.step_body(n),
            NextRead::Prefix(n) | NextRead::Message(n) => n,
        };

        let mut scratch = self.options.scratch_pool.rent(n);
        let read = read_full(&mut self.reader, &mut scratch)?;
        let mut slice = &scratch[..read];
        let batch = self.decoder.decode_slice(&mut slice)?;
        if read < n {
            self.decoder.finish()?;
            return Ok(Step::End);
        }
        Ok(batch.map_or(Step::Progress, Step::Batch))
    }

    /// Read a message body straight into allocator memory, which backs the decoded arrays
    fn step_body(&mut self, n: usize) -> Result<Step, QuiverError> {
        let mut body = self.options.allocator.allocate(n.min(BODY_CHUNK));
        let mut read = read_full(&mut self.reader, &mut body)?;
        while read == body.len() && read < n {
            grow_body(&mut body, n);
            read += read_full(&mut self.reader, &mut body[read..])?;
        }
        if read < n {
            let mut partial = &body[..read];
            self.decoder.decode_slice(&mut partial)?;
            self.decoder.finish()?;
            return Ok(Step::End);
        }
        let mut body = self.options.allocator.freeze(body);
        let batch = self.decoder.decode(&mut body)?;
        Ok(batch.map_or(Step::Progress, Step::Batch))
    }

    /// Check if the stream is finished
    pub fn is_finished(&self) -> bool {
        self.decoder.is_finished()
    }

    /// Gets a reference to the underlying reader.
    ///
    /// It is inadvisable to directly read from the underlying reader.
    pub fn get_ref(&self) -> &R {
        &self.reader
    }

    /// Gets a mutable reference to the underlying reader.
    ///
    /// It is inadvisable to directly read from the underlying reader.
    pub fn get_mut(&mut self) -> &mut R {
        &mut self.reader
    }

    /// Unwraps the underlying reader
    pub fn into_inner(self) -> R {
        self.reader
    }
}

impl<R: Read> Iterator for StreamReader<R> {
    type Item = Result<RecordBatch, QuiverError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_batch().transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writer::{IpcWriteOptions, StreamWriter};
    use quiver_array::builder::{ListBuilder, StringBuilder};
    use quiver_array::*;
    use quiver_buffer::alloc::PoolAllocator;
    use quiver_buffer::pool::{MemoryPool, TrackingMemoryPool};
    use quiver_schema::{Fields, Schema};

    fn roundtrip_ipc_stream(rb: &RecordBatch) -> RecordBatch {
        let mut writer = StreamWriter::try_new(vec![], &rb.schema()).unwrap();
        writer.write(rb).unwrap();
        let buf = writer.into_inner().unwrap();

        let mut reader = StreamReader::new(buf.as_slice());
        let batch = reader.next_batch().unwrap().unwrap();
        assert!(reader.next_batch().unwrap().is_none());
        assert!(reader.is_finished());
        batch
    }

    fn all_types_batch() -> RecordBatch {
        let mut list = ListBuilder::new(StringBuilder::new());
        list.append_value([Some("a"), None]);
        list.append_null();
        list.append_value([Some("bc")]);

        let strukt = StructArray::from(vec![
            (
                Arc::new(Field::new("b", DataType::Boolean, true)),
                Arc::new(BooleanArray::from(vec![Some(true), None, Some(false)])) as ArrayRef,
            ),
            (
                Arc::new(Field::new("f", DataType::Float64, false)),
                Arc::new(Float64Array::from(vec![1.5, 2.5, 3.5])) as ArrayRef,
            ),
        ]);

        RecordBatch::try_from_iter([
            ("null", Arc::new(NullArray::new(3)) as ArrayRef),
            ("u8", Arc::new(UInt8Array::from(vec![1, 2, 3])) as _),
            ("i16", Arc::new(Int16Array::from(vec![Some(-1), None, Some(3)])) as _),
            ("u64", Arc::new(UInt64Array::from(vec![u64::MAX, 0, 7])) as _),
            ("f32", Arc::new(Float32Array::from(vec![0.5, f32::NAN, -1.0])) as _),
            (
                "bin",
                Arc::new(BinaryArray::from(vec![Some(&b"xy"[..]), Some(&b""[..]), None])) as _,
            ),
            ("list", Arc::new(list.finish()) as _),
            ("struct", Arc::new(strukt) as _),
        ])
        .unwrap()
    }

    #[test]
    fn test_roundtrip_all_types() {
        let batch = all_types_batch();
        let output = roundtrip_ipc_stream(&batch);
        assert_eq!(output.schema(), batch.schema());
        assert_eq!(output.num_rows(), 3);
        for (a, b) in output.columns().iter().zip(batch.columns()) {
            assert_eq!(&a.to_data(), &b.to_data());
        }
    }

    #[test]
    fn test_roundtrip_sliced() {
        let batch = all_types_batch();
        for (offset, len) in [(0, 0), (1, 2), (2, 1), (0, 3)] {
            let sliced = batch.slice(offset, len);
            let output = roundtrip_ipc_stream(&sliced);
            assert_eq!(output.num_rows(), len);
            for (a, b) in output.columns().iter().zip(sliced.columns()) {
                assert_eq!(&a.to_data(), &b.to_data(), "slice {offset}..{len}");
            }
        }
    }

    #[test]
    fn test_no_columns_batch() {
        let schema = Arc::new(Schema::empty());
        let options = RecordBatchOptions::new().with_row_count(Some(10));
        let input = RecordBatch::try_new_with_options(schema, vec![], &options).unwrap();
        let output = roundtrip_ipc_stream(&input);
        assert_eq!(input, output);
    }

    #[test]
    fn test_roundtrip_struct_empty_fields() {
        let data = ArrayData::builder(DataType::Struct(Fields::empty()))
            .len(5)
            .build()
            .unwrap();
        let batch = RecordBatch::try_from_iter([("c", make_array(data))]).unwrap();
        let output = roundtrip_ipc_stream(&batch);
        assert_eq!(output.column(0).len(), 5);
    }

    fn stream_bytes(batch: &RecordBatch, alignment: usize) -> Vec<u8> {
        let options =
            IpcWriteOptions::try_new(alignment, false, crate::MetadataVersion::V5).unwrap();
        let mut writer = StreamWriter::try_new_with_options(vec![], &batch.schema(), options).unwrap();
        writer.write(batch).unwrap();
        writer.into_inner().unwrap()
    }

    fn unaligned_batch() -> (RecordBatch, Buffer) {
        let batch = RecordBatch::try_from_iter([(
            "i64",
            Arc::new(Int64Array::from(vec![1, 2, 3, 4])) as ArrayRef,
        )])
        .unwrap();
        let mut bytes = vec![0_u8];
        bytes.extend(stream_bytes(&batch, 8));
        // every region now starts one byte past an aligned address
        (batch, Buffer::from_vec(bytes).slice(1))
    }

    #[test]
    fn test_unaligned() {
        let (batch, mut buffer) = unaligned_batch();
        let mut decoder = StreamDecoder::new().with_require_alignment(false);
        let output = decoder.decode(&mut buffer).unwrap().unwrap();
        assert_eq!(output, batch);
        let values = output.column(0).to_data().buffers()[0].clone();
        assert_eq!(values.as_ptr().align_offset(8), 0);
    }

    #[test]
    fn test_unaligned_throws_error_with_require_alignment() {
        let (_, mut buffer) = unaligned_batch();
        let mut decoder = StreamDecoder::new().with_require_alignment(true);
        let err = decoder.decode(&mut buffer).unwrap_err();
        assert!(matches!(err, QuiverError::AlignmentMismatch(_)), "{err}");
    }

    #[test]
    fn test_truncated_stream() {
        let batch = all_types_batch();
        let bytes = stream_bytes(&batch, 64);
        // cut inside the prefix, the message and the body of the batch frame
        for cut in [2, 12, bytes.len() - 20, bytes.len() - 4] {
            let mut reader = StreamReader::new(&bytes[..cut]);
            let err = loop {
                match reader.next_batch() {
                    Ok(Some(_)) => continue,
                    Ok(None) => panic!("cut at {cut} read as a clean end"),
                    Err(e) => break e,
                }
            };
            assert!(matches!(err, QuiverError::IncompleteFrame(_)), "{cut}: {err}");
        }
    }

    #[test]
    fn test_empty_stream() {
        let options = IpcReadOptions::new().with_require_end_marker(false);
        let mut reader = StreamReader::new_with_options(&[][..], options);
        let err = reader.schema().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Protocol sequence error: Stream ended before a schema message"
        );

        let mut reader = StreamReader::new(&[][..]);
        let err = reader.next_batch().unwrap_err();
        assert!(matches!(err, QuiverError::IncompleteFrame(_)), "{err}");
    }

    #[test]
    fn test_finished_stays_finished() {
        let batch = all_types_batch();
        let bytes = stream_bytes(&batch, 64);
        let mut reader = StreamReader::new(bytes.as_slice());
        assert_eq!(reader.by_ref().count(), 1);
        for _ in 0..3 {
            assert!(reader.next_batch().unwrap().is_none());
        }
    }

    #[test]
    fn test_scratch_released_on_error() {
        let pool = Arc::new(ScratchPool::new(4));
        let options = IpcReadOptions::new().with_scratch_pool(Arc::clone(&pool));
        // a frame announcing 16 bytes of garbage message
        let mut bytes = vec![0xff, 0xff, 0xff, 0xff, 16, 0, 0, 0];
        bytes.extend_from_slice(&[0xab; 16]);

        let mut reader = StreamReader::new_with_options(bytes.as_slice(), options);
        let err = reader.schema().unwrap_err();
        assert!(matches!(err, QuiverError::Ipc(_)), "{err}");
        assert_eq!(pool.outstanding(), 0);
        assert!(pool.retained() > 0);
    }

    /// Remembers the largest allocation asked of it
    #[derive(Debug, Default)]
    struct LargestAllocation(std::sync::atomic::AtomicUsize);

    impl MemoryAllocator for LargestAllocation {
        fn allocate(&self, len: usize) -> MutableBuffer {
            self.0.fetch_max(len, Ordering::Relaxed);
            MutableBuffer::from_len_zeroed(len)
        }
    }

    #[test]
    fn test_large_body_grows_as_read() {
        let values: Vec<i64> = (0..300_000).collect();
        let batch = RecordBatch::try_from_iter([(
            "v",
            Arc::new(Int64Array::from(values)) as ArrayRef,
        )])
        .unwrap();
        let bytes = stream_bytes(&batch, 64);

        let allocator = Arc::new(LargestAllocation::default());
        let options = IpcReadOptions::new().with_allocator(allocator.clone());
        let mut reader = StreamReader::new_with_options(bytes.as_slice(), options);
        assert_eq!(reader.next_batch().unwrap().unwrap(), batch);
        assert!(reader.next_batch().unwrap().is_none());
        assert_eq!(allocator.0.load(Ordering::Relaxed), BODY_CHUNK);

        // a body cut short fails once the input runs out, not when it is announced
        let allocator = Arc::new(LargestAllocation::default());
        let options = IpcReadOptions::new().with_allocator(allocator.clone());
        let cut = &bytes[..bytes.len() / 2];
        let err = StreamReader::new_with_options(cut, options)
            .next_batch()
            .unwrap_err();
        assert!(matches!(err, QuiverError::IncompleteFrame(_)), "{err}");
        assert_eq!(allocator.0.load(Ordering::Relaxed), BODY_CHUNK);
    }

    #[test]
    fn test_pool_allocator_accounting() {
        let batch = all_types_batch();
        let bytes = stream_bytes(&batch, 64);

        let pool = Arc::new(TrackingMemoryPool::default());
        let allocator = Arc::new(PoolAllocator::new(pool.clone()));
        let options = IpcReadOptions::new().with_allocator(allocator);
        let mut reader = StreamReader::new_with_options(bytes.as_slice(), options);
        let output = reader.next_batch().unwrap().unwrap();
        assert!(pool.used() > 0);

        // every column shares the one body allocation
        let column = output.column(1).clone();
        drop(reader);
        drop(output);
        assert!(pool.used() > 0);
        drop(column);
        assert_eq!(pool.used(), 0);
    }
}
