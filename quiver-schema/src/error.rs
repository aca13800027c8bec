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

//! Defines [`QuiverError`] for representing failures in the quiver crates

use std::error::Error;

/// Many different operations in the quiver crates return this error type.
#[derive(Debug)]
pub enum QuiverError {
    /// The buffers or children of an array do not match the layout its type requires
    StructuralMismatch(String),
    /// An array was interpreted as a type it was not built as
    TypeMismatch(String),
    /// The input ended part way through a frame
    IncompleteFrame(String),
    /// Messages arrived in an order the stream protocol does not allow
    ProtocolSequence(String),
    /// An index was outside `0..len`
    IndexOutOfRange {
        /// The requested index
        index: usize,
        /// The length of the indexed collection
        len: usize,
    },
    /// A memory region cannot be viewed as the requested type
    AlignmentMismatch(String),
    /// An argument was outside the range an operation accepts
    InvalidArgument(String),
    /// A schema or field lookup failed
    Schema(String),
    /// An IPC message could not be encoded or decoded
    Ipc(String),
    /// An error from the underlying reader or writer
    Io(String, std::io::Error),
    /// The feature is part of the format but not supported here
    NotYetImplemented(String),
    /// A read was abandoned through a cancellation token
    Cancelled,
    /// An error raised outside the quiver crates
    External(Box<dyn Error + Send + Sync>),
}

impl QuiverError {
    /// Wraps an external error in a [`QuiverError`]
    pub fn from_external_error(error: Box<dyn Error + Send + Sync>) -> Self {
        Self::External(error)
    }
}

impl From<std::io::Error> for QuiverError {
    fn from(error: std::io::Error) -> Self {
        QuiverError::Io(error.to_string(), error)
    }
}

impl std::fmt::Display for QuiverError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QuiverError::StructuralMismatch(message) => {
                write!(f, "Structural mismatch: {message}")
            }
            QuiverError::TypeMismatch(message) => write!(f, "Type mismatch: {message}"),
            QuiverError::IncompleteFrame(message) => {
                write!(f, "Incomplete frame: {message}")
            }
            QuiverError::ProtocolSequence(message) => {
                write!(f, "Protocol sequence error: {message}")
            }
            QuiverError::IndexOutOfRange { index, len } => {
                write!(f, "Index out of range: index {index} but length is {len}")
            }
            QuiverError::AlignmentMismatch(message) => {
                write!(f, "Alignment mismatch: {message}")
            }
            QuiverError::InvalidArgument(message) => {
                write!(f, "Invalid argument error: {message}")
            }
            QuiverError::Schema(message) => write!(f, "Schema error: {message}"),
            QuiverError::Ipc(message) => write!(f, "Ipc error: {message}"),
            QuiverError::Io(message, _) => write!(f, "Io error: {message}"),
            QuiverError::NotYetImplemented(message) => {
                write!(f, "Not yet implemented: {message}")
            }
            QuiverError::Cancelled => write!(f, "Operation cancelled"),
            QuiverError::External(source) => write!(f, "External error: {source}"),
        }
    }
}

impl Error for QuiverError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            QuiverError::Io(_, source) => Some(source),
            QuiverError::External(source) => Some(source.as_ref()),
            _ => None,
        }
    }
}
