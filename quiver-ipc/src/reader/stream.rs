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

use std::sync::Arc;

use log::{debug, trace, warn};
use quiver_array::RecordBatch;
use quiver_buffer::{Buffer, MutableBuffer};
use quiver_schema::{QuiverError, SchemaRef};

use crate::convert::MessageBuffer;
use crate::reader::RecordBatchDecoder;
use crate::{MessageHeader, CONTINUATION_MARKER};

/// What a pull based reader should fetch next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextRead {
    /// At most this many bytes of a continuation marker or length
    Prefix(usize),
    /// The rest of the message flatbuffer
    Message(usize),
    /// The rest of the message body
    Body(usize),
    /// The end-of-stream marker has been seen
    Finished,
}

/// Sans-IO decoder of an IPC stream
///
/// Input arrives in chunks of any size, either pushed with [`Self::decode`] or pulled
/// by asking [`Self::next_read`] how much is wanted. Frames that arrive whole in a
/// [`Buffer`] are sliced, frames split across chunks are assembled in a scratch
/// buffer.
///
/// [StreamReader](crate::reader::StreamReader) wraps this around a [`std::io::Read`].
#[derive(Debug)]
pub struct StreamDecoder {
    schema: Option<SchemaRef>,
    stage: Stage,
    /// Bytes of a split message or body
    partial: MutableBuffer,
    require_alignment: bool,
    require_end_marker: bool,
    saw_legacy_frame: bool,
}

#[derive(Debug)]
enum Stage {
    Prefix {
        bytes: [u8; 4],
        filled: u8,
        /// A continuation marker came first
        marked: bool,
    },
    Metadata {
        len: usize,
    },
    Body {
        message: MessageBuffer,
        len: usize,
    },
    Done,
}

impl Stage {
    const FRAME_START: Self = Self::Prefix {
        bytes: [0; 4],
        filled: 0,
        marked: false,
    };
}

impl Default for StreamDecoder {
    fn default() -> Self {
        Self {
            schema: None,
            stage: Stage::FRAME_START,
            partial: MutableBuffer::new(0),
            require_alignment: false,
            require_end_marker: true,
            saw_legacy_frame: false,
        }
    }
}

/// Where the decoder pulls bytes from
trait Source {
    fn remaining(&self) -> usize;

    /// The first `n` bytes as a shared [`Buffer`], if the source can share them
    fn split_shared(&mut self, n: usize) -> Option<Buffer>;

    /// Append the first `n` bytes to `dst`
    fn append_to(&mut self, n: usize, dst: &mut MutableBuffer);

    /// Fill `dst` from the front
    fn fill(&mut self, dst: &mut [u8]);
}

impl Source for Buffer {
    fn remaining(&self) -> usize {
        self.len()
    }

    fn split_shared(&mut self, n: usize) -> Option<Buffer> {
        let head = self.slice_with_length(0, n);
        self.advance(n);
        Some(head)
    }

    fn append_to(&mut self, n: usize, dst: &mut MutableBuffer) {
        dst.extend_from_slice(&self[..n]);
        self.advance(n);
    }

    fn fill(&mut self, dst: &mut [u8]) {
        dst.copy_from_slice(&self[..dst.len()]);
        self.advance(dst.len());
    }
}

impl Source for &[u8] {
    fn remaining(&self) -> usize {
        self.len()
    }

    fn split_shared(&mut self, _: usize) -> Option<Buffer> {
        None
    }

    fn append_to(&mut self, n: usize, dst: &mut MutableBuffer) {
        let (head, rest) = self.split_at(n);
        dst.extend_from_slice(head);
        *self = rest;
    }

    fn fill(&mut self, dst: &mut [u8]) {
        let (head, rest) = self.split_at(dst.len());
        dst.copy_from_slice(head);
        *self = rest;
    }
}

/// Collect `want` bytes, slicing them from `src` when they are all there and nothing
/// is pending in `partial`
fn gather<S: Source>(src: &mut S, partial: &mut MutableBuffer, want: usize) -> Option<Buffer> {
    if partial.is_empty() && src.remaining() >= want {
        if let Some(whole) = src.split_shared(want) {
            return Some(whole);
        }
    }
    let n = src.remaining().min(want - partial.len());
    src.append_to(n, partial);
    (partial.len() == want).then(|| std::mem::take(partial).into())
}

impl StreamDecoder {
    /// A decoder expecting a schema message first
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail with [`QuiverError::AlignmentMismatch`] on misaligned buffers instead of
    /// copying them into aligned memory
    pub fn with_require_alignment(mut self, require_alignment: bool) -> Self {
        self.require_alignment = require_alignment;
        self
    }

    /// Whether [`Self::finish`] on a frame boundary needs the end-of-stream marker
    /// to have been seen, true by default
    pub fn with_require_end_marker(mut self, require_end_marker: bool) -> Self {
        self.require_end_marker = require_end_marker;
        self
    }

    /// The schema, once its message is decoded
    pub fn schema(&self) -> Option<SchemaRef> {
        self.schema.clone()
    }

    /// True after the end-of-stream marker, or a clean [`Self::finish`]
    pub fn is_finished(&self) -> bool {
        matches!(self.stage, Stage::Done)
    }

    pub fn next_read(&self) -> NextRead {
        let pending = self.partial.len();
        match &self.stage {
            Stage::Prefix { filled, .. } => NextRead::Prefix(4 - usize::from(*filled)),
            Stage::Metadata { len } => NextRead::Message(len - pending),
            Stage::Body { len, .. } => NextRead::Body(len - pending),
            Stage::Done => NextRead::Finished,
        }
    }

    /// Consume bytes from the front of `buffer` until a batch is complete or the
    /// buffer is used up
    ///
    /// ```
    /// # use quiver_array::RecordBatch;
    /// # use quiver_buffer::Buffer;
    /// # use quiver_ipc::reader::StreamDecoder;
    /// # use quiver_schema::QuiverError;
    /// fn collect(chunks: Vec<Buffer>) -> Result<Vec<RecordBatch>, QuiverError> {
    ///     let mut decoder = StreamDecoder::new();
    ///     let mut batches = vec![];
    ///     for mut chunk in chunks {
    ///         while !chunk.is_empty() {
    ///             batches.extend(decoder.decode(&mut chunk)?);
    ///         }
    ///     }
    ///     decoder.finish()?;
    ///     Ok(batches)
    /// }
    /// ```
    pub fn decode(&mut self, buffer: &mut Buffer) -> Result<Option<RecordBatch>, QuiverError> {
        self.run(buffer)
    }

    /// [`Self::decode`] for borrowed bytes, which are always copied
    pub fn decode_slice(&mut self, slice: &mut &[u8]) -> Result<Option<RecordBatch>, QuiverError> {
        self.run(slice)
    }

    fn run<S: Source>(&mut self, src: &mut S) -> Result<Option<RecordBatch>, QuiverError> {
        loop {
            let body_complete =
                matches!(&self.stage, Stage::Body { len, .. } if self.partial.len() == *len);
            if src.remaining() == 0 && !body_complete {
                return Ok(None);
            }
            match &mut self.stage {
                Stage::Prefix {
                    bytes,
                    filled,
                    marked,
                } => {
                    let start = usize::from(*filled);
                    let n = src.remaining().min(4 - start);
                    src.fill(&mut bytes[start..start + n]);
                    *filled += n as u8;
                    if *filled == 4 {
                        if !*marked && *bytes == CONTINUATION_MARKER {
                            (*marked, *filled) = (true, 0);
                        } else {
                            let (len, marked) = (i32::from_le_bytes(*bytes), *marked);
                            self.begin_frame(len, marked)?;
                        }
                    }
                }
                Stage::Metadata { len } => {
                    let len = *len;
                    if let Some(bytes) = gather(src, &mut self.partial, len) {
                        let message = MessageBuffer::try_new(bytes)?;
                        let declared = message.message().body_length();
                        let len = usize::try_from(declared).map_err(|_| {
                            QuiverError::Ipc(format!("negative body length {declared}"))
                        })?;
                        trace!("{:?} message, {len} body bytes", message.message().header_type());
                        self.stage = Stage::Body { message, len };
                    }
                }
                Stage::Body { len, .. } => {
                    let len = *len;
                    if let Some(body) = gather(src, &mut self.partial, len) {
                        let Stage::Body { message, .. } =
                            std::mem::replace(&mut self.stage, Stage::FRAME_START)
                        else {
                            unreachable!()
                        };
                        if let Some(batch) = self.apply(&message, body)? {
                            return Ok(Some(batch));
                        }
                    }
                }
                Stage::Done => {
                    return Err(QuiverError::Ipc(
                        "bytes after the end-of-stream marker".to_string(),
                    ))
                }
            }
        }
    }

    fn begin_frame(&mut self, len: i32, marked: bool) -> Result<(), QuiverError> {
        let len = usize::try_from(len)
            .map_err(|_| QuiverError::Ipc(format!("negative message length {len}")))?;
        if len == 0 {
            debug!("end-of-stream marker");
            self.stage = Stage::Done;
            return Ok(());
        }
        if !marked && !self.saw_legacy_frame {
            warn!("stream uses the legacy framing without continuation markers");
            self.saw_legacy_frame = true;
        }
        self.stage = Stage::Metadata { len };
        Ok(())
    }

    /// Act on a complete frame
    fn apply(
        &mut self,
        message: &MessageBuffer,
        body: Buffer,
    ) -> Result<Option<RecordBatch>, QuiverError> {
        let message = message.message();
        let kind = message.header_type();
        match kind {
            MessageHeader::Schema => {
                if self.schema.is_some() {
                    return Err(QuiverError::ProtocolSequence(
                        "a second schema message".to_string(),
                    ));
                }
                let header = message
                    .header_as_schema()
                    .ok_or_else(|| QuiverError::Ipc("schema message without a schema".to_string()))?;
                let schema = crate::convert::decode_schema(header)?;
                debug!("stream schema: {schema}");
                self.schema = Some(Arc::new(schema));
                Ok(None)
            }
            MessageHeader::RecordBatch => {
                let Some(schema) = self.schema.clone() else {
                    return Err(QuiverError::ProtocolSequence(
                        "record batch before the schema".to_string(),
                    ));
                };
                let header = message.header_as_record_batch().ok_or_else(|| {
                    QuiverError::Ipc("record batch message without a record batch".to_string())
                })?;
                let batch = RecordBatchDecoder::try_new(&body, header, schema)?
                    .with_require_alignment(self.require_alignment)
                    .read_record_batch()?;
                Ok(Some(batch))
            }
            MessageHeader::DictionaryBatch => Err(QuiverError::NotYetImplemented(
                "dictionary batches".to_string(),
            )),
            other => Err(QuiverError::Ipc(format!("unexpected {other:?} message in a stream"))),
        }
    }

    /// Declare the input over
    ///
    /// [`QuiverError::IncompleteFrame`] if it stopped inside a frame, or on a frame
    /// boundary before the end-of-stream marker while that marker is required.
    pub fn finish(&mut self) -> Result<(), QuiverError> {
        let pending = self.partial.len();
        let cut = match &self.stage {
            Stage::Done => return Ok(()),
            Stage::Prefix {
                filled: 0,
                marked: false,
                ..
            } => {
                if self.require_end_marker {
                    return Err(QuiverError::IncompleteFrame(
                        "input ended without an end-of-stream marker".to_string(),
                    ));
                }
                debug!("input ended on a frame boundary");
                self.stage = Stage::Done;
                return Ok(());
            }
            Stage::Prefix { filled, marked, .. } => {
                let seen = usize::from(*filled) + 4 * usize::from(*marked);
                format!("{seen} bytes into a frame prefix")
            }
            Stage::Metadata { len } => format!("{pending} of {len} message bytes"),
            Stage::Body { len, .. } => format!("{pending} of {len} body bytes"),
        };
        Err(QuiverError::IncompleteFrame(format!("input ended {cut}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writer::{IpcWriteOptions, StreamWriter};
    use crate::MetadataVersion;
    use quiver_array::{Int32Array, Int64Array, StringArray};
    use quiver_schema::{DataType, Field, Schema};

    fn test_batch() -> RecordBatch {
        let schema = Arc::new(Schema::new(vec![
            Field::new("int32", DataType::Int32, false),
            Field::new("int64", DataType::Int64, true),
            Field::new("utf8", DataType::Utf8, true),
        ]));
        RecordBatch::try_new(
            schema,
            vec![
                Arc::new(Int32Array::from(vec![1, 2, 3])) as _,
                Arc::new(Int64Array::from(vec![Some(1), None, Some(3)])) as _,
                Arc::new(StringArray::from(vec![Some("a"), Some("bcd"), None])) as _,
            ],
        )
        .unwrap()
    }

    fn write_stream(batch: &RecordBatch, options: IpcWriteOptions) -> Vec<u8> {
        let mut s = StreamWriter::try_new_with_options(vec![], &batch.schema(), options).unwrap();
        s.write(batch).unwrap();
        s.into_inner().unwrap()
    }

    #[test]
    fn test_eos() {
        let input = test_batch();
        let buffer = Buffer::from_vec(write_stream(&input, IpcWriteOptions::default()));

        let mut b = buffer.slice_with_length(0, buffer.len() - 1);
        let mut decoder = StreamDecoder::new();
        let output = decoder.decode(&mut b).unwrap().unwrap();
        assert_eq!(output, input);
        assert_eq!(b.len(), 7); // 8 byte EOS truncated by 1 byte
        assert!(decoder.decode(&mut b).unwrap().is_none());
        assert_eq!(decoder.next_read(), NextRead::Prefix(1));

        let err = decoder.finish().unwrap_err();
        assert!(matches!(err, QuiverError::IncompleteFrame(_)), "{err}");
    }

    #[test]
    fn test_decode_byte_by_byte() {
        let input = test_batch();
        let bytes = write_stream(&input, IpcWriteOptions::default());

        let mut decoder = StreamDecoder::new();
        let mut batches = vec![];
        for byte in bytes.chunks(1) {
            let mut slice = byte;
            if let Some(batch) = decoder.decode_slice(&mut slice).unwrap() {
                batches.push(batch);
            }
            assert!(slice.is_empty());
        }
        decoder.finish().unwrap();
        assert!(decoder.is_finished());
        assert_eq!(decoder.next_read(), NextRead::Finished);
        assert_eq!(batches, vec![input]);
    }

    #[test]
    fn test_next_read_sequence() {
        let input = test_batch();
        let bytes = write_stream(&input, IpcWriteOptions::default());

        let mut decoder = StreamDecoder::new();
        let mut src = bytes.as_slice();
        let mut reads = vec![];
        loop {
            let next = decoder.next_read();
            reads.push(next);
            let n = match next {
                NextRead::Prefix(n) | NextRead::Message(n) | NextRead::Body(n) => n,
                NextRead::Finished => break,
            };
            let mut chunk = &src[..n];
            src = &src[n..];
            decoder.decode_slice(&mut chunk).unwrap();
        }
        assert!(src.is_empty());
        assert_eq!(reads[0], NextRead::Prefix(4));
        assert_eq!(reads[1], NextRead::Prefix(4));
        assert!(matches!(reads[2], NextRead::Message(_)));
        // the schema message has an empty body
        assert_eq!(reads[3], NextRead::Body(0));
        assert!(decoder.schema().is_some());
    }

    #[test]
    fn test_missing_end_marker() {
        let input = test_batch();
        let bytes = write_stream(&input, IpcWriteOptions::default());
        let without_eos = Buffer::from_vec(bytes[..bytes.len() - 8].to_vec());

        let mut decoder = StreamDecoder::new();
        let mut b = without_eos.clone();
        assert_eq!(decoder.decode(&mut b).unwrap().unwrap(), input);
        let err = decoder.finish().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Incomplete frame: input ended without an end-of-stream marker"
        );

        let mut decoder = StreamDecoder::new().with_require_end_marker(false);
        let mut b = without_eos;
        assert_eq!(decoder.decode(&mut b).unwrap().unwrap(), input);
        decoder.finish().unwrap();
        assert!(decoder.is_finished());
    }

    #[test]
    fn test_legacy_framing() {
        let input = test_batch();
        let options = IpcWriteOptions::try_new(8, true, MetadataVersion::V4).unwrap();
        let bytes = write_stream(&input, options);
        assert_ne!(&bytes[..4], &CONTINUATION_MARKER);

        let mut decoder = StreamDecoder::new();
        let mut b = Buffer::from_vec(bytes);
        assert_eq!(decoder.decode(&mut b).unwrap().unwrap(), input);
        assert!(decoder.decode(&mut b).unwrap().is_none());
        decoder.finish().unwrap();
        assert!(decoder.saw_legacy_frame);
    }

    #[test]
    fn test_data_after_eos() {
        let input = test_batch();
        let mut bytes = write_stream(&input, IpcWriteOptions::default());
        bytes.extend_from_slice(&[1, 2, 3]);

        let mut decoder = StreamDecoder::new();
        let mut b = Buffer::from_vec(bytes);
        decoder.decode(&mut b).unwrap().unwrap();
        let err = decoder.decode(&mut b).unwrap_err();
        assert_eq!(err.to_string(), "Ipc error: bytes after the end-of-stream marker");
    }

    #[test]
    fn test_second_schema() {
        let input = test_batch();
        let bytes = write_stream(&input, IpcWriteOptions::default());
        // schema frame, then the schema frame again
        let schema_frame_len = 8 + i32::from_le_bytes(bytes[4..8].try_into().unwrap()) as usize;
        let mut doubled = bytes[..schema_frame_len].to_vec();
        doubled.extend_from_slice(&bytes[..schema_frame_len]);

        let mut decoder = StreamDecoder::new();
        let err = decoder.decode(&mut Buffer::from_vec(doubled)).unwrap_err();
        assert!(matches!(err, QuiverError::ProtocolSequence(_)), "{err}");
    }

    #[test]
    fn test_batch_before_schema() {
        let input = test_batch();
        let bytes = write_stream(&input, IpcWriteOptions::default());
        let schema_frame_len = 8 + i32::from_le_bytes(bytes[4..8].try_into().unwrap()) as usize;

        let mut decoder = StreamDecoder::new();
        let err = decoder
            .decode(&mut Buffer::from_vec(bytes[schema_frame_len..].to_vec()))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Protocol sequence error: record batch before the schema"
        );
    }

    #[test]
    fn test_negative_length() {
        let mut decoder = StreamDecoder::new();
        let mut bytes: &[u8] = &[0xff, 0xff, 0xff, 0xff, 0xfe, 0xff, 0xff, 0xff];
        let err = decoder.decode_slice(&mut bytes).unwrap_err();
        assert_eq!(err.to_string(), "Ipc error: negative message length -2");
    }
}
