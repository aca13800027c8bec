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

//! Writing IPC streams to a tokio [`AsyncWrite`]

use quiver_array::RecordBatch;
use quiver_schema::{QuiverError, Schema, SchemaRef};
use tokio::io::{AsyncWrite, AsyncWriteExt};

use super::{FrameEncoder, IpcWriteOptions};

/// The async counterpart of [`StreamWriter`](super::StreamWriter)
///
/// Each frame is encoded into a reused staging buffer and handed to the sink with a
/// single `write_all`. Dropping a pending future can leave a partial frame behind.
pub struct AsyncStreamWriter<W> {
    writer: W,
    encoder: FrameEncoder,
    staging: Vec<u8>,
}

impl<W> std::fmt::Debug for AsyncStreamWriter<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsyncStreamWriter")
            .field("encoder", &self.encoder)
            .field("staged", &self.staging.len())
            .finish_non_exhaustive()
    }
}

impl<W: AsyncWrite + Unpin> AsyncStreamWriter<W> {
    /// Start a stream of `schema` with the default [`IpcWriteOptions`]
    pub async fn try_new(writer: W, schema: &Schema) -> Result<Self, QuiverError> {
        Self::try_new_with_options(writer, schema, IpcWriteOptions::default()).await
    }

    /// Start a stream of `schema`, writing the schema message right away
    pub async fn try_new_with_options(
        writer: W,
        schema: &Schema,
        options: IpcWriteOptions,
    ) -> Result<Self, QuiverError> {
        let mut this = Self {
            writer,
            encoder: FrameEncoder::new(schema, options),
            staging: vec![],
        };
        this.encoder.write_schema(&mut this.staging)?;
        this.send().await?;
        Ok(this)
    }

    async fn send(&mut self) -> Result<(), QuiverError> {
        let sent = self.writer.write_all(&self.staging).await;
        self.staging.clear();
        Ok(sent?)
    }

    /// Schema every batch must have
    pub fn schema(&self) -> &SchemaRef {
        self.encoder.schema()
    }

    /// Append `batch` to the stream, with the errors of
    /// [`StreamWriter::write`](super::StreamWriter::write)
    pub async fn write(&mut self, batch: &RecordBatch) -> Result<(), QuiverError> {
        self.encoder.write_batch(batch, &mut self.staging)?;
        self.send().await
    }

    /// Write the end-of-stream marker and flush
    pub async fn finish(&mut self) -> Result<(), QuiverError> {
        self.encoder.write_end(&mut self.staging)?;
        self.send().await?;
        self.writer.flush().await?;
        Ok(())
    }

    /// Flush the sink
    pub async fn flush(&mut self) -> Result<(), QuiverError> {
        self.writer.flush().await?;
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

    /// Finish the stream if that has not happened yet and hand back the sink
    pub async fn into_inner(mut self) -> Result<W, QuiverError> {
        if !self.encoder.is_finished() {
            self.finish().await?;
        }
        Ok(self.writer)
    }
}
