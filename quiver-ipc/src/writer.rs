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

//! Encoding record batches as IPC stream messages
//!
//! [`StreamWriter`] writes to a [`std::io::Write`], the async writer to a tokio
//! `AsyncWrite`. Both frame their messages through the same [`FrameEncoder`], so a
//! stream is byte for byte the same whichever wrote it.

#[cfg(feature = "async")]
mod async_stream;

#[cfg(feature = "async")]
pub use async_stream::*;

use std::io::{BufWriter, Write};

use flatbuffers::FlatBufferBuilder;
use log::{debug, trace};
use quiver_array::{Array, RecordBatch, RecordBatchWriter};
use quiver_buffer::{BooleanBuffer, ToByteSlice};
use quiver_data::{layout, ArrayData};
use quiver_schema::{DataType, QuiverError, Schema, SchemaRef};

use crate::convert::write_schema;
use crate::{MessageBuilder, MessageHeader, MetadataVersion, RecordBatchBuilder, CONTINUATION_MARKER};

const MAX_ALIGNMENT: usize = 64;
const ZEROES: [u8; MAX_ALIGNMENT] = [0; MAX_ALIGNMENT];

/// Bytes needed to take `len` to a multiple of `alignment`, a power of two
#[inline]
fn padding(alignment: usize, len: usize) -> usize {
    len.wrapping_neg() & (alignment - 1)
}

/// Settings for how messages are framed and padded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IpcWriteOptions {
    alignment: usize,
    write_legacy_ipc_format: bool,
    metadata_version: MetadataVersion,
}

impl IpcWriteOptions {
    /// Pad buffers and frames to `alignment` bytes and write `metadata_version`
    ///
    /// `write_legacy_ipc_format` leaves out the continuation marker, which readers
    /// only accept with [`MetadataVersion::V4`].
    ///
    /// # Errors
    ///
    /// An alignment other than 8, 16, 32 or 64, legacy framing with anything but V4,
    /// or a version before V4.
    pub fn try_new(
        alignment: usize,
        write_legacy_ipc_format: bool,
        metadata_version: MetadataVersion,
    ) -> Result<Self, QuiverError> {
        if !matches!(alignment, 8 | 16 | 32 | 64) {
            return Err(QuiverError::InvalidArgument(format!(
                "alignment must be 8, 16, 32 or 64, got {alignment}"
            )));
        }
        match (metadata_version, write_legacy_ipc_format) {
            (MetadataVersion::V4, _) | (MetadataVersion::V5, false) => Ok(Self {
                alignment,
                write_legacy_ipc_format,
                metadata_version,
            }),
            (MetadataVersion::V5, true) => Err(QuiverError::InvalidArgument(
                "the legacy framing can only carry V4 metadata".to_string(),
            )),
            (version, _) => Err(QuiverError::InvalidArgument(format!(
                "cannot write {version:?} metadata"
            ))),
        }
    }

    /// Alignment of every buffer, message and body
    pub fn alignment(&self) -> usize {
        self.alignment
    }

    /// True if frames go without the continuation marker
    pub fn write_legacy_ipc_format(&self) -> bool {
        self.write_legacy_ipc_format
    }

    /// Version stamped on every message
    pub fn metadata_version(&self) -> MetadataVersion {
        self.metadata_version
    }

    fn prefix_len(&self) -> usize {
        match self.write_legacy_ipc_format {
            true => 4,
            false => 8,
        }
    }
}

impl Default for IpcWriteOptions {
    fn default() -> Self {
        Self {
            alignment: MAX_ALIGNMENT,
            write_legacy_ipc_format: false,
            metadata_version: MetadataVersion::V5,
        }
    }
}

/// A message flatbuffer and the body that follows it
#[derive(Debug)]
pub struct EncodedMessage {
    /// The finished `Message` flatbuffer, unpadded
    pub header: Vec<u8>,
    /// Padded buffers, empty for a schema
    pub body: Vec<u8>,
}

/// Turns schemas and record batches into [`EncodedMessage`]s
///
/// ```
/// # use std::sync::Arc;
/// # use quiver_array::{RecordBatch, UInt64Array};
/// # use quiver_ipc::writer::{IpcDataGenerator, IpcWriteOptions};
/// let batch = RecordBatch::try_from_iter(vec![
///     ("id", Arc::new(UInt64Array::from(vec![10, 23, 33])) as _)
/// ]).unwrap();
///
/// let message = IpcDataGenerator::default()
///     .batch_message(&batch, &IpcWriteOptions::default())
///     .unwrap();
/// // one 64 byte slot each for the validity and the values
/// assert_eq!(message.body.len(), 128);
/// ```
#[derive(Debug, Default, Clone, Copy)]
pub struct IpcDataGenerator;

impl IpcDataGenerator {
    /// The message announcing `schema`
    pub fn schema_message(&self, schema: &Schema, options: &IpcWriteOptions) -> EncodedMessage {
        let mut fbb = FlatBufferBuilder::new();
        let header = write_schema(&mut fbb, schema).as_union_value();
        EncodedMessage {
            header: finish_message(fbb, options, MessageHeader::Schema, header, 0),
            body: vec![],
        }
    }

    /// The message carrying `batch`
    ///
    /// Sliced columns are written as if they had been copied, only the referenced
    /// values go into the body and offsets are shifted to start at zero.
    pub fn batch_message(
        &self,
        batch: &RecordBatch,
        options: &IpcWriteOptions,
    ) -> Result<EncodedMessage, QuiverError> {
        let mut body = BodyWriter::new(options.alignment);
        for column in batch.columns() {
            body.append(&column.to_data())?;
        }

        let mut fbb = FlatBufferBuilder::new();
        let buffers = fbb.create_vector(&body.buffers);
        let nodes = fbb.create_vector(&body.nodes);
        let mut record = RecordBatchBuilder::new(&mut fbb);
        record.add_length(batch.num_rows() as i64);
        record.add_nodes(nodes);
        record.add_buffers(buffers);
        let header = record.finish().as_union_value();

        let body_len = body.bytes.len() as i64;
        Ok(EncodedMessage {
            header: finish_message(fbb, options, MessageHeader::RecordBatch, header, body_len),
            body: body.bytes,
        })
    }
}

fn finish_message(
    mut fbb: FlatBufferBuilder<'_>,
    options: &IpcWriteOptions,
    kind: MessageHeader,
    header: flatbuffers::WIPOffset<flatbuffers::UnionWIPOffset>,
    body_len: i64,
) -> Vec<u8> {
    let mut message = MessageBuilder::new(&mut fbb);
    message.add_version(options.metadata_version);
    message.add_header_type(kind);
    message.add_header(header);
    message.add_body_length(body_len);
    let message = message.finish();
    fbb.finish(message, None);
    fbb.finished_data().to_vec()
}

/// The nodes, buffer locations and bytes of one message body
struct BodyWriter {
    alignment: usize,
    nodes: Vec<crate::FieldNode>,
    buffers: Vec<crate::Buffer>,
    bytes: Vec<u8>,
}

impl BodyWriter {
    fn new(alignment: usize) -> Self {
        Self {
            alignment,
            nodes: vec![],
            buffers: vec![],
            bytes: vec![],
        }
    }

    /// Append `data` then its children, depth first
    fn append(&mut self, data: &ArrayData) -> Result<(), QuiverError> {
        let (offset, len) = (data.offset(), data.len());
        let data_type = data.data_type();
        let null_count = match data_type {
            DataType::Null => len,
            _ => data.null_count(),
        };
        self.nodes.push(crate::FieldNode::new(len as i64, null_count as i64));

        if layout(data_type).can_contain_null_mask {
            let bits = data.nulls().map_or_else(
                || BooleanBuffer::new_set(len),
                |n| n.inner().clone(),
            );
            self.push(&bits.sliced());
        }

        match data_type {
            DataType::Null => {}
            DataType::Boolean => self.push(&data.buffers()[0].bit_slice(offset, len)),
            DataType::Utf8 | DataType::Binary => {
                let values = self.push_offsets(data)?;
                let bytes = data.buffers()[1].get(values.clone()).ok_or_else(|| {
                    QuiverError::StructuralMismatch(format!(
                        "offsets reference bytes {values:?} of {} value bytes",
                        data.buffers()[1].len()
                    ))
                })?;
                self.push(bytes);
            }
            DataType::List(_) => {
                let values = self.push_offsets(data)?;
                let child = &data.child_data()[0];
                if values.end > child.len() {
                    return Err(QuiverError::StructuralMismatch(format!(
                        "offsets reference elements {values:?} of a child of {}",
                        child.len()
                    )));
                }
                self.append(&child.slice(values.start, values.len()))?;
            }
            DataType::Struct(_) => {
                for child in data.child_data() {
                    self.append(&child.slice(offset, len))?;
                }
            }
            other => {
                let width = other.primitive_width().ok_or_else(|| {
                    QuiverError::NotYetImplemented(format!("writing {other} columns"))
                })?;
                let range = offset * width..(offset + len) * width;
                let bytes = data.buffers()[0].get(range).ok_or_else(|| {
                    QuiverError::StructuralMismatch(format!(
                        "{other} buffer too short for {len} values at offset {offset}"
                    ))
                })?;
                self.push(bytes);
            }
        }
        Ok(())
    }

    /// Push the offsets of `data` shifted to start at zero, returning the range of
    /// values they cover
    fn push_offsets(&mut self, data: &ArrayData) -> Result<std::ops::Range<usize>, QuiverError> {
        let window = data.offset()..=data.offset() + data.len();
        let offsets = data.buffers()[0]
            .typed_data::<i32>()
            .get(window)
            .ok_or_else(|| {
                QuiverError::StructuralMismatch(format!(
                    "offsets buffer too short for {} elements at offset {}",
                    data.len(),
                    data.offset()
                ))
            })?;

        let (first, last) = (offsets[0], offsets[offsets.len() - 1]);
        let range = match (usize::try_from(first), usize::try_from(last)) {
            (Ok(start), Ok(end)) if start <= end => start..end,
            _ => {
                return Err(QuiverError::StructuralMismatch(format!(
                    "offsets run from {first} to {last}"
                )))
            }
        };
        match first {
            0 => self.push(offsets.to_byte_slice()),
            _ => {
                let shifted: Vec<i32> = offsets.iter().map(|o| o - first).collect();
                self.push(shifted.to_byte_slice())
            }
        }
        Ok(range)
    }

    fn push(&mut self, bytes: &[u8]) {
        let start = self.bytes.len();
        self.buffers
            .push(crate::Buffer::new(start as i64, bytes.len() as i64));
        self.bytes.extend_from_slice(bytes);
        self.bytes
            .extend_from_slice(&ZEROES[..padding(self.alignment, bytes.len())]);
    }
}

/// Writes `message` as one frame, returning the bytes written
///
/// The frame is the prefix, the header padded so the body starts aligned, then the
/// padded body.
pub fn write_frame<W: Write>(
    mut writer: W,
    message: &EncodedMessage,
    options: &IpcWriteOptions,
) -> Result<usize, QuiverError> {
    let prefix_len = options.prefix_len();
    let header_len = message.header.len();
    let framed = header_len + prefix_len;
    let framed = framed + padding(options.alignment, framed);
    let declared = i32::try_from(framed - prefix_len).map_err(|_| {
        QuiverError::InvalidArgument(format!("message header of {header_len} bytes is too large"))
    })?;

    write_prefix(&mut writer, options, declared)?;
    writer.write_all(&message.header)?;
    writer.write_all(&ZEROES[..framed - prefix_len - header_len])?;

    let body_pad = padding(options.alignment, message.body.len());
    writer.write_all(&message.body)?;
    writer.write_all(&ZEROES[..body_pad])?;
    Ok(framed + message.body.len() + body_pad)
}

fn write_prefix<W: Write>(
    mut writer: W,
    options: &IpcWriteOptions,
    declared: i32,
) -> Result<(), QuiverError> {
    if !options.write_legacy_ipc_format {
        writer.write_all(&CONTINUATION_MARKER)?;
    }
    writer.write_all(&declared.to_le_bytes())?;
    Ok(())
}

/// The protocol state of a stream being written, independent of where the bytes go
#[derive(Debug)]
pub(crate) struct FrameEncoder {
    options: IpcWriteOptions,
    schema: SchemaRef,
    finished: bool,
}

impl FrameEncoder {
    pub(crate) fn new(schema: &Schema, options: IpcWriteOptions) -> Self {
        Self {
            options,
            schema: SchemaRef::new(schema.clone()),
            finished: false,
        }
    }

    pub(crate) fn schema(&self) -> &SchemaRef {
        &self.schema
    }

    pub(crate) fn is_finished(&self) -> bool {
        self.finished
    }

    pub(crate) fn write_schema<W: Write>(&self, out: W) -> Result<usize, QuiverError> {
        let message = IpcDataGenerator.schema_message(&self.schema, &self.options);
        let n = write_frame(out, &message, &self.options)?;
        debug!("wrote schema of {} fields in {n} bytes", self.schema.fields().len());
        Ok(n)
    }

    pub(crate) fn write_batch<W: Write>(
        &self,
        batch: &RecordBatch,
        out: W,
    ) -> Result<usize, QuiverError> {
        if self.finished {
            return Err(QuiverError::Ipc(
                "cannot write a batch after the end of the stream".to_string(),
            ));
        }
        if batch.schema().fields() != self.schema.fields() {
            return Err(QuiverError::Schema(format!(
                "batch fields {} differ from the stream fields {}",
                batch.schema(),
                self.schema
            )));
        }
        let message = IpcDataGenerator.batch_message(batch, &self.options)?;
        let n = write_frame(out, &message, &self.options)?;
        trace!("wrote batch of {} rows in {n} bytes", batch.num_rows());
        Ok(n)
    }

    /// Write the end-of-stream marker, after which only errors are returned
    pub(crate) fn write_end<W: Write>(&mut self, out: W) -> Result<(), QuiverError> {
        if self.finished {
            return Err(QuiverError::Ipc("the stream is already finished".to_string()));
        }
        write_prefix(out, &self.options, 0)?;
        self.finished = true;
        debug!("wrote end of stream");
        Ok(())
    }
}

/// Writes a schema and then record batches to a [`Write`]
///
/// Nothing is buffered, wrap the sink in a [`BufWriter`] or use
/// [`StreamWriter::try_new_buffered`] when it is a socket or file.
///
/// ```
/// # use std::sync::Arc;
/// # use quiver_array::{ArrayRef, Int32Array, RecordBatch};
/// # use quiver_ipc::writer::StreamWriter;
/// let batch = RecordBatch::try_from_iter([
///     ("a", Arc::new(Int32Array::from(vec![1, 2, 3])) as ArrayRef),
/// ]).unwrap();
///
/// let mut writer = StreamWriter::try_new(vec![], &batch.schema()).unwrap();
/// writer.write(&batch).unwrap();
/// let bytes = writer.into_inner().unwrap();
///
/// // the stream closes with a zero length frame
/// assert_eq!(&bytes[bytes.len() - 8..], &[255, 255, 255, 255, 0, 0, 0, 0]);
/// ```
pub struct StreamWriter<W> {
    writer: W,
    encoder: FrameEncoder,
}

impl<W> std::fmt::Debug for StreamWriter<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamWriter")
            .field("encoder", &self.encoder)
            .finish_non_exhaustive()
    }
}

impl<W: Write> StreamWriter<BufWriter<W>> {
    /// [`StreamWriter::try_new`] over a [`BufWriter`]
    pub fn try_new_buffered(writer: W, schema: &Schema) -> Result<Self, QuiverError> {
        Self::try_new(BufWriter::new(writer), schema)
    }
}

impl<W: Write> StreamWriter<W> {
    /// Start a stream of `schema` with the default [`IpcWriteOptions`]
    pub fn try_new(writer: W, schema: &Schema) -> Result<Self, QuiverError> {
        Self::try_new_with_options(writer, schema, IpcWriteOptions::default())
    }

    /// Start a stream of `schema`, writing the schema message right away
    pub fn try_new_with_options(
        mut writer: W,
        schema: &Schema,
        options: IpcWriteOptions,
    ) -> Result<Self, QuiverError> {
        let encoder = FrameEncoder::new(schema, options);
        encoder.write_schema(&mut writer)?;
        Ok(Self { writer, encoder })
    }

    /// Schema every batch must have
    pub fn schema(&self) -> &SchemaRef {
        self.encoder.schema()
    }

    /// Append `batch` to the stream
    ///
    /// # Errors
    ///
    /// [`QuiverError::Schema`] if the fields of `batch` differ from the stream's, and
    /// [`QuiverError::Ipc`] once the stream is finished.
    pub fn write(&mut self, batch: &RecordBatch) -> Result<(), QuiverError> {
        self.encoder.write_batch(batch, &mut self.writer)?;
        Ok(())
    }

    /// Write the end-of-stream marker and flush
    pub fn finish(&mut self) -> Result<(), QuiverError> {
        self.encoder.write_end(&mut self.writer)?;
        self.writer.flush()?;
        Ok(())
    }

    /// The sink
    pub fn get_ref(&self) -> &W {
        &self.writer
    }

    /// Writing through this reference corrupts the stream
    pub fn get_mut(&mut self) -> &mut W {
        &mut self.writer
    }

    /// Flush the sink
    pub fn flush(&mut self) -> Result<(), QuiverError> {
        self.writer.flush()?;
        Ok(())
    }

    /// Finish the stream if that has not happened yet and hand back the sink
    pub fn into_inner(mut self) -> Result<W, QuiverError> {
        if !self.encoder.is_finished() {
            self.finish()?;
        }
        Ok(self.writer)
    }
}

impl<W: Write> RecordBatchWriter for StreamWriter<W> {
    fn write(&mut self, batch: &RecordBatch) -> Result<(), QuiverError> {
        StreamWriter::write(self, batch)
    }

    fn close(mut self) -> Result<(), QuiverError> {
        self.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::StreamReader;
    use quiver_array::builder::{ListBuilder, StringBuilder};
    use quiver_array::*;
    use quiver_schema::Field;
    use std::sync::Arc;

    fn serialize_stream(record: &RecordBatch) -> Vec<u8> {
        // an alignment of 8 keeps the truncation tests small
        let options = IpcWriteOptions::try_new(8, false, MetadataVersion::V5).unwrap();
        let mut stream_writer =
            StreamWriter::try_new_with_options(vec![], &record.schema(), options).unwrap();
        stream_writer.write(record).unwrap();
        stream_writer.finish().unwrap();
        stream_writer.into_inner().unwrap()
    }

    fn deserialize_stream(bytes: Vec<u8>) -> RecordBatch {
        let mut stream_reader = StreamReader::new(bytes.as_slice());
        stream_reader.next().unwrap().unwrap()
    }

    #[test]
    fn test_options() {
        assert!(IpcWriteOptions::try_new(8, false, MetadataVersion::V5).is_ok());
        assert!(IpcWriteOptions::try_new(64, true, MetadataVersion::V4).is_ok());

        let err = IpcWriteOptions::try_new(12, false, MetadataVersion::V5).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid argument error: alignment must be 8, 16, 32 or 64, got 12"
        );
        assert!(IpcWriteOptions::try_new(8, true, MetadataVersion::V5).is_err());
        assert!(IpcWriteOptions::try_new(8, false, MetadataVersion::V3).is_err());

        let options = IpcWriteOptions::default();
        assert_eq!(options.alignment(), 64);
        assert!(!options.write_legacy_ipc_format());
        assert_eq!(options.metadata_version(), MetadataVersion::V5);
    }

    #[test]
    fn test_padding() {
        assert_eq!(padding(8, 0), 0);
        assert_eq!(padding(8, 5), 3);
        assert_eq!(padding(64, 64), 0);
        assert_eq!(padding(64, 65), 63);
    }

    #[test]
    fn test_frame_layout() {
        let message = EncodedMessage {
            header: vec![1; 13],
            body: vec![2; 3],
        };
        let options = IpcWriteOptions::try_new(16, false, MetadataVersion::V5).unwrap();
        let mut out = vec![];
        let written = write_frame(&mut out, &message, &options).unwrap();
        assert_eq!(written, out.len());
        // 8 prefix + 13 header padded to 32, then 3 body padded to 16
        assert_eq!(out.len(), 48);
        assert_eq!(&out[4..8], &24_i32.to_le_bytes());
        assert_eq!(&out[21..32], &[0; 11]);
        assert_eq!(&out[32..35], &[2, 2, 2]);

        let legacy = IpcWriteOptions::try_new(8, true, MetadataVersion::V4).unwrap();
        let mut out = vec![];
        write_frame(&mut out, &message, &legacy).unwrap();
        assert_eq!(&out[..4], &20_i32.to_le_bytes());
        assert_eq!(out.len(), 24 + 8);
    }

    #[test]
    fn test_empty_schema_stream() {
        let options = IpcWriteOptions::try_new(8, false, MetadataVersion::V5).unwrap();
        let writer = StreamWriter::try_new_with_options(vec![], &Schema::empty(), options).unwrap();
        let bytes = writer.into_inner().unwrap();

        assert_eq!(&bytes[..4], &CONTINUATION_MARKER);
        let len = i32::from_le_bytes(bytes[4..8].try_into().unwrap()) as usize;
        assert_eq!((len + 8) % 8, 0);
        assert_eq!(bytes.len(), 8 + len + 8);
        assert_eq!(&bytes[bytes.len() - 8..], &[255, 255, 255, 255, 0, 0, 0, 0]);

        let mut reader = StreamReader::new(bytes.as_slice());
        assert_eq!(reader.schema().unwrap().fields().len(), 0);
        assert!(reader.next_batch().unwrap().is_none());
    }

    #[test]
    fn test_legacy_format() {
        let batch = RecordBatch::try_from_iter([(
            "a",
            Arc::new(Int32Array::from(vec![Some(1), None])) as ArrayRef,
        )])
        .unwrap();
        let options = IpcWriteOptions::try_new(8, true, MetadataVersion::V4).unwrap();
        let mut writer =
            StreamWriter::try_new_with_options(vec![], &batch.schema(), options).unwrap();
        writer.write(&batch).unwrap();
        let bytes = writer.into_inner().unwrap();

        assert_ne!(&bytes[..4], &CONTINUATION_MARKER);
        assert_eq!(&bytes[bytes.len() - 4..], &[0, 0, 0, 0]);
        assert_eq!(deserialize_stream(bytes), batch);
    }

    #[test]
    fn test_buffers_are_aligned() {
        let batch = RecordBatch::try_from_iter([
            ("a", Arc::new(Int8Array::from(vec![1, 2, 3])) as ArrayRef),
            ("b", Arc::new(StringArray::from(vec!["xyz", "", "ab"])) as ArrayRef),
        ])
        .unwrap();
        for alignment in [8, 16, 32, 64] {
            let options = IpcWriteOptions::try_new(alignment, false, MetadataVersion::V5).unwrap();
            let encoded = IpcDataGenerator::default()
                .batch_message(&batch, &options)
                .unwrap();
            assert_eq!(encoded.body.len() % alignment, 0);

            let message = crate::root_as_message(&encoded.header).unwrap();
            let header = message.header_as_record_batch().unwrap();
            assert_eq!(header.length(), 3);
            assert_eq!(header.nodes().unwrap().len(), 2);
            // validity + values, validity + offsets + values
            let buffers = header.buffers().unwrap();
            assert_eq!(buffers.len(), 5);
            for b in buffers.iter() {
                assert_eq!(b.offset() as usize % alignment, 0);
            }
        }
    }

    #[test]
    fn test_write_sliced_boolean() {
        let array = BooleanArray::from(vec![
            Some(true),
            None,
            Some(false),
            Some(true),
            Some(true),
            None,
            Some(false),
            Some(false),
            Some(true),
            Some(true),
            Some(false),
        ]);
        let batch =
            RecordBatch::try_from_iter([("b", Arc::new(array) as ArrayRef)]).unwrap();
        for offset in 0..batch.num_rows() {
            let sliced = batch.slice(offset, batch.num_rows() - offset);
            let output = deserialize_stream(serialize_stream(&sliced));
            assert_eq!(output, sliced, "offset {offset}");
            assert_eq!(output.column(0).offset(), 0);
        }
    }

    #[test]
    fn test_truncate_sliced_arrays() {
        let strings: Vec<_> = (0..1000).map(|i| format!("value {i}")).collect();
        let strings = StringArray::from(strings);
        let ints = Int64Array::from((0..1000).collect::<Vec<i64>>());

        let mut lists = ListBuilder::new(StringBuilder::new());
        for i in 0..1000 {
            lists.append_value([Some(format!("{i}")), None]);
        }

        let batch = RecordBatch::try_from_iter([
            ("s", Arc::new(strings) as ArrayRef),
            ("i", Arc::new(ints) as ArrayRef),
            ("l", Arc::new(lists.finish()) as ArrayRef),
        ])
        .unwrap();

        let full = serialize_stream(&batch);
        let sliced = batch.slice(500, 10);
        let small = serialize_stream(&sliced);
        assert!(small.len() * 20 < full.len(), "{} vs {}", small.len(), full.len());

        let output = deserialize_stream(small);
        assert_eq!(output, sliced);
        let list = output.column(2).as_any().downcast_ref::<ListArray>().unwrap();
        assert_eq!(list.value_offsets()[0], 0);
        assert_eq!(list.values().len(), 20);
    }

    #[test]
    fn test_write_sliced_struct() {
        let strukt = StructArray::from(vec![
            (
                Arc::new(Field::new("i", DataType::Int32, true)),
                Arc::new(Int32Array::from(vec![Some(1), None, Some(3), Some(4)])) as ArrayRef,
            ),
            (
                Arc::new(Field::new("s", DataType::Utf8, true)),
                Arc::new(StringArray::from(vec![Some("a"), Some("b"), None, Some("d")]))
                    as ArrayRef,
            ),
        ]);
        let batch = RecordBatch::try_from_iter([("st", Arc::new(strukt) as ArrayRef)]).unwrap();
        let sliced = batch.slice(1, 2);
        let output = deserialize_stream(serialize_stream(&sliced));
        assert_eq!(output, sliced);
    }

    #[test]
    fn test_write_null_column() {
        let batch =
            RecordBatch::try_from_iter([("n", Arc::new(NullArray::new(4)) as ArrayRef)]).unwrap();
        let encoded = IpcDataGenerator::default()
            .batch_message(&batch, &IpcWriteOptions::default())
            .unwrap();
        let message = crate::root_as_message(&encoded.header).unwrap();
        let header = message.header_as_record_batch().unwrap();
        let node = header.nodes().unwrap().get(0);
        assert_eq!((node.length(), node.null_count()), (4, 4));
        assert_eq!(header.buffers().unwrap().len(), 0);
        assert!(encoded.body.is_empty());

        let output = deserialize_stream(serialize_stream(&batch));
        assert_eq!(output.column(0).len(), 4);
        assert_eq!(output.column(0).data_type(), &DataType::Null);
    }

    #[test]
    fn test_write_after_finish() {
        let batch =
            RecordBatch::try_from_iter([("a", Arc::new(Int32Array::from(vec![1])) as ArrayRef)])
                .unwrap();
        let mut writer = StreamWriter::try_new(vec![], &batch.schema()).unwrap();
        writer.finish().unwrap();
        let err = writer.write(&batch).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Ipc error: cannot write a batch after the end of the stream"
        );
        assert!(writer.finish().is_err());
    }

    #[test]
    fn test_schema_mismatch() {
        let a = RecordBatch::try_from_iter([("a", Arc::new(Int32Array::from(vec![1])) as ArrayRef)])
            .unwrap();
        let b = RecordBatch::try_from_iter([("a", Arc::new(Int64Array::from(vec![1])) as ArrayRef)])
            .unwrap();
        let mut writer = StreamWriter::try_new(vec![], &a.schema()).unwrap();
        let err = writer.write(&b).unwrap_err();
        assert!(matches!(err, QuiverError::Schema(_)), "{err}");
        writer.write(&a).unwrap();
    }

    #[test]
    fn test_record_batch_writer_close() {
        let batch =
            RecordBatch::try_from_iter([("a", Arc::new(Int32Array::from(vec![1, 2])) as ArrayRef)])
                .unwrap();
        let mut bytes = vec![];
        {
            let mut writer = StreamWriter::try_new(&mut bytes, &batch.schema()).unwrap();
            RecordBatchWriter::write(&mut writer, &batch).unwrap();
            writer.close().unwrap();
        }
        assert_eq!(&bytes[bytes.len() - 8..], &[255, 255, 255, 255, 0, 0, 0, 0]);
        assert_eq!(deserialize_stream(bytes), batch);
    }
}
