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

use quiver_schema::DataType;

use super::types::PhysicalType;

/// What one buffer of an array holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferSpec {
    /// One value of `byte_width` bytes per slot, offsets included
    FixedWidth {
        /// Bytes per slot
        byte_width: usize,
        /// Required alignment of the first byte
        alignment: usize,
    },
    /// Bytes addressed by a preceding offsets buffer
    VariableWidth,
    /// One bit per slot
    BitMap,
}

impl BufferSpec {
    const OFFSETS: Self = Self::fixed(std::mem::size_of::<i32>());

    const fn fixed(byte_width: usize) -> Self {
        Self::FixedWidth {
            byte_width,
            alignment: byte_width,
        }
    }
}

/// The buffers an array of some [`DataType`] carries
///
/// `buffers` leaves out the validity, which lives in
/// [`ArrayData::nulls`](crate::ArrayData::nulls) and goes first on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataTypeLayout {
    /// In wire order
    pub buffers: Vec<BufferSpec>,

    /// False only for the null type, which has no validity
    pub can_contain_null_mask: bool,
}

impl DataTypeLayout {
    /// Number of buffers an array of this layout occupies in a message body
    pub fn wire_buffer_count(&self) -> usize {
        self.buffers.len() + usize::from(self.can_contain_null_mask)
    }
}

/// The [`DataTypeLayout`] of arrays of `data_type`
pub fn layout(data_type: &DataType) -> DataTypeLayout {
    let buffers = match PhysicalType::from(data_type) {
        PhysicalType::Null | PhysicalType::Struct => vec![],
        PhysicalType::Boolean => vec![BufferSpec::BitMap],
        PhysicalType::Primitive(p) => vec![BufferSpec::fixed(p.byte_width())],
        PhysicalType::Bytes(_) => vec![BufferSpec::OFFSETS, BufferSpec::VariableWidth],
        PhysicalType::List => vec![BufferSpec::OFFSETS],
    };
    DataTypeLayout {
        buffers,
        can_contain_null_mask: !matches!(data_type, DataType::Null),
    }
}
