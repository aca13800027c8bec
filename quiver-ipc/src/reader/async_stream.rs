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

//! Async reader of IPC streams

use std::fmt;

use futures::Stream;
use log::debug;
use quiver_array::RecordBatch;
use quiver_schema::{QuiverError, SchemaRef};
use tokio::io::{AsyncRead, AsyncReadExt};

use super::{
    grow_body, missing_schema, CancellationToken, IpcReadOptions, NextRead, Step, StreamDecoder,
    BODY_CHUNK,
};

/// Reads an IPC stream from a tokio [`AsyncRead`]
///
/// Frames are pulled one region at a time in the same way as
/// [`StreamReader`](super::StreamReader). A [`CancellationToken`] is checked before every
/// read, a cancelled read returns [`QuiverError::Cancelled`] and leaves the reader
/// positioned so that a later call, with a fresh token, resumes the stream.
///
/// Dropping a pending future instead of cancelling it returns any scratch memory it held,
/// but the bytes it already consumed from the source are lost.
///
/// ```
/// # use std::sync::Arc;
/// # use quiver_array::{ArrayRef, Int32Array, RecordBatch};
/// # use quiver_ipc::reader::AsyncStreamReader;
/// # use quiver_ipc::writer::StreamWriter;
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let batch = RecordBatch::try_from_iter([
///     ("a", Arc::new(Int32Array::from(vec![1, 2])) as ArrayRef),
/// ]).unwrap();
/// let mut writer = StreamWriter::try_new(vec![], &batch.schema()).unwrap();
/// writer.write(&batch).unwrap();
/// let bytes = writer.into_inner().unwrap();
///
/// let mut reader = AsyncStreamReader::new(bytes.as_slice());
/// assert_eq!(reader.next_batch().await.unwrap(), Some(batch));
/// assert_eq!(reader.next_batch().await.unwrap(), None);
/// # }
/// ```
pub struct AsyncStreamReader<R> {
    reader: R,
    decoder: StreamDecoder,
    options: IpcReadOptions,
    token: Option<CancellationToken>,
}

impl<R> fmt::Debug for AsyncStreamReader<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncStreamReader<R>")
            .field("reader", &"R")
            .field("decoder", &self.decoder)
            .field("options", &self.options)
            .field("token", &self.token)
            .finish()
    }
}

impl<R: AsyncRead + Unpin> AsyncStreamReader<R> {
    /// Create a new reader with the default [`IpcReadOptions`]
    pub fn new(reader: R) -> Self {
        Self::new_with_options(reader, IpcReadOptions::default())
    }

    /// Create a new reader
    pub fn new_with_options(reader: R, options: IpcReadOptions) -> Self {
        Self {
            reader,
            decoder: options.decoder(),
            options,
            token: None,
        }
    }

    /// Observe `token` before every read
    pub fn with_cancellation_token(mut self, token: CancellationToken) -> Self {
        self.token = Some(token);
        self
    }

    /// Replace the token observed before every read, `None` disables cancellation
    pub fn set_cancellation_token(&mut self, token: Option<CancellationToken>) {
        self.token = token;
    }

    /// Return the schema of the stream, reading it if not yet read
    pub async fn schema(&mut self) -> Result<SchemaRef, QuiverError> {
        loop {
            if let Some(schema) = self.decoder.schema() {
                return Ok(schema);
            }
            match self.step().await? {
                Step::Progress => {}
                Step::End | Step::Batch(_) => return Err(missing_schema()),
            }
        }
    }

    /// Read the next batch, returning `Ok(None)` at the end of the stream
    pub async fn next_batch(&mut self) -> Result<Option<RecordBatch>, QuiverError> {
        self.schema().await?;
        loop {
            match self.step().await? {
                Step::Batch(batch) => return Ok(Some(batch)),
                Step::Progress => {}
                Step::End => return Ok(None),
            }
        }
    }

    fn check_cancelled(&self) -> Result<(), QuiverError> {
        match &self.token {
            Some(token) if token.is_cancelled() => {
                debug!("stream read cancelled");
                Err(QuiverError::Cancelled)
            }
            _ => Ok(()),
        }
    }

    async fn step(&mut self) -> Result<Step, QuiverError> {
        let n = match self.decoder.next_read() {
            NextRead::Finished => return Ok(Step::End),
            NextRead::Body(n) => return self.step_body(n).await,
            NextRead::Prefix(n) | NextRead::Message(n) => n,
        };
        self.check_cancelled()?;

        let mut scratch = self.options.scratch_pool().rent(n);
        let read = read_full_async(&mut self.reader, &mut scratch).await?;
        let mut slice = &scratch[..read];
        let batch = self.decoder.decode_slice(&mut slice)?;
        if read < n {
            self.decoder.finish()?;
            return Ok(Step::End);
        }
        Ok(batch.map_or(Step::Progress, Step::Batch))
    }

    async fn step_body(&mut self, n: usize) -> Result<Step, QuiverError> {
        self.check_cancelled()?;
        let allocator = self.options.allocator().clone();
        let mut body = allocator.allocate(n.min(BODY_CHUNK));
        let mut read = read_full_async(&mut self.reader, &mut body).await?;
        while read == body.len() && read < n {
            grow_body(&mut body, n);
            read += read_full_async(&mut self.reader, &mut body[read..]).await?;
        }
        if read < n {
            let mut partial = &body[..read];
            self.decoder.decode_slice(&mut partial)?;
            self.decoder.finish()?;
            return Ok(Step::End);
        }
        let mut body = allocator.freeze(body);
        let batch = self.decoder.decode(&mut body)?;
        Ok(batch.map_or(Step::Progress, Step::Batch))
    }

    /// Convert this reader into a [`Stream`] of batches
    ///
    /// The stream ends after the end of the IPC stream or the first error.
    pub fn into_stream(self) -> impl Stream<Item = Result<RecordBatch, QuiverError>> {
        futures::stream::unfold(Some(self), |state| async move {
            let mut reader = state?;
            match reader.next_batch().await {
                Ok(Some(batch)) => Some((Ok(batch), Some(reader))),
                Ok(None) => None,
                Err(e) => Some((Err(e), None)),
            }
        })
    }

    /// Check if the stream is finished
    pub fn is_finished(&self) -> bool {
        self.decoder.is_finished()
    }

    /// Gets a reference to the underlying reader
    pub fn get_ref(&self) -> &R {
        &self.reader
    }

    /// Gets a mutable reference to the underlying reader
    pub fn get_mut(&mut self) -> &mut R {
        &mut self.reader
    }

    /// Unwraps the underlying reader
    pub fn into_inner(self) -> R {
        self.reader
    }
}

async fn read_full_async<R: AsyncRead + Unpin>(
    reader: &mut R,
    buf: &mut [u8],
) -> Result<usize, QuiverError> {
    let mut read = 0;
    while read < buf.len() {
        match reader.read(&mut buf[read..]).await? {
            0 => break,
            n => read += n,
        }
    }
    Ok(read)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::ScratchPool;
    use crate::writer::StreamWriter;
    use futures::TryStreamExt;
    use quiver_array::{ArrayRef, Int32Array, StringArray};
    use std::pin::Pin;
    use std::sync::Arc;
    use std::task::{Context, Poll};
    use tokio::io::ReadBuf;

    fn batches() -> Vec<RecordBatch> {
        (0..3)
            .map(|i| {
                RecordBatch::try_from_iter([
                    ("i", Arc::new(Int32Array::from(vec![i, i + 1])) as ArrayRef),
                    ("s", Arc::new(StringArray::from(vec![Some("x"), None])) as ArrayRef),
                ])
                .unwrap()
            })
            .collect()
    }

    fn stream_bytes(batches: &[RecordBatch]) -> Vec<u8> {
        let mut writer = StreamWriter::try_new(vec![], &batches[0].schema()).unwrap();
        for b in batches {
            writer.write(b).unwrap();
        }
        writer.into_inner().unwrap()
    }

    /// Cancels `token` once `after` bytes were handed out, delivering at most 7 bytes per read
    struct CancelAfter<'a> {
        data: &'a [u8],
        token: CancellationToken,
        after: usize,
        delivered: usize,
    }

    impl AsyncRead for CancelAfter<'_> {
        fn poll_read(
            mut self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            buf: &mut ReadBuf<'_>,
        ) -> Poll<std::io::Result<()>> {
            let n = self.data.len().min(buf.remaining()).min(7);
            let data = self.data;
            let (head, tail) = data.split_at(n);
            buf.put_slice(head);
            self.data = tail;
            self.delivered += n;
            if self.delivered >= self.after {
                self.token.cancel();
            }
            Poll::Ready(Ok(()))
        }
    }

    #[tokio::test]
    async fn test_async_roundtrip() {
        let input = batches();
        let bytes = stream_bytes(&input);
        let mut reader = AsyncStreamReader::new(bytes.as_slice());
        assert_eq!(reader.schema().await.unwrap(), input[0].schema());

        let output: Vec<_> = reader.into_stream().try_collect().await.unwrap();
        assert_eq!(output, input);
    }

    #[tokio::test]
    async fn test_cancel_and_resume() {
        let input = batches();
        let bytes = stream_bytes(&input);
        let pool = Arc::new(ScratchPool::new(2));
        let options = IpcReadOptions::new().with_scratch_pool(Arc::clone(&pool));

        let token = CancellationToken::new();
        let source = CancelAfter {
            data: &bytes,
            token: token.clone(),
            after: bytes.len() / 2,
            delivered: 0,
        };
        let mut reader =
            AsyncStreamReader::new_with_options(source, options).with_cancellation_token(token);

        let mut output = vec![];
        let err = loop {
            match reader.next_batch().await {
                Ok(Some(batch)) => output.push(batch),
                Ok(None) => panic!("stream ended without cancellation"),
                Err(e) => break e,
            }
        };
        assert!(matches!(err, QuiverError::Cancelled), "{err}");
        assert_eq!(pool.outstanding(), 0);
        assert!(output.len() < input.len());

        reader.set_cancellation_token(Some(CancellationToken::new()));
        while let Some(batch) = reader.next_batch().await.unwrap() {
            output.push(batch);
        }
        assert_eq!(output, input);
        assert!(reader.is_finished());
    }

    #[tokio::test]
    async fn test_cancelled_before_schema() {
        let bytes = stream_bytes(&batches());
        let token = CancellationToken::new();
        token.cancel();
        let mut reader = AsyncStreamReader::new(bytes.as_slice()).with_cancellation_token(token);
        assert!(matches!(
            reader.schema().await.unwrap_err(),
            QuiverError::Cancelled
        ));
        reader.set_cancellation_token(None);
        assert_eq!(reader.schema().await.unwrap(), batches()[0].schema());
    }

    #[tokio::test]
    async fn test_async_truncated() {
        let bytes = stream_bytes(&batches());
        let mut reader = AsyncStreamReader::new(&bytes[..bytes.len() - 3]);
        let err = loop {
            match reader.next_batch().await {
                Ok(Some(_)) => {}
                Ok(None) => panic!("truncated stream read as complete"),
                Err(e) => break e,
            }
        };
        assert!(matches!(err, QuiverError::IncompleteFrame(_)), "{err}");
    }
}
