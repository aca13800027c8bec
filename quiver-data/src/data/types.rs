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

macro_rules! primitive_types {
    ($($variant:ident => $width:literal),* $(,)?) => {
        /// The fixed-width [`DataType`]s, one per [`NativeType`](quiver_buffer::NativeType)
        #[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
        #[allow(missing_docs)]
        pub enum PrimitiveType {
            $($variant,)*
        }

        impl PrimitiveType {
            /// Bytes per value
            pub fn byte_width(&self) -> usize {
                match self {
                    $(Self::$variant => $width,)*
                }
            }

            fn of(data_type: &DataType) -> Option<Self> {
                match data_type {
                    $(DataType::$variant => Some(Self::$variant),)*
                    _ => None,
                }
            }
        }
    };
}

primitive_types! {
    Int8 => 1,
    Int16 => 2,
    Int32 => 4,
    Int64 => 8,
    UInt8 => 1,
    UInt16 => 2,
    UInt32 => 4,
    UInt64 => 8,
    Float16 => 2,
    Float32 => 4,
    Float64 => 8,
}

/// Whether the values of a variable width array must be UTF-8
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
#[allow(missing_docs)]
pub enum BytesType {
    Binary,
    Utf8,
}

/// A [`DataType`] with its nested types erased, enough to pick a memory layout
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
#[allow(missing_docs)]
pub enum PhysicalType {
    Null,
    Boolean,
    Primitive(PrimitiveType),
    Bytes(BytesType),
    List,
    Struct,
}

impl From<&DataType> for PhysicalType {
    fn from(data_type: &DataType) -> Self {
        if let Some(p) = PrimitiveType::of(data_type) {
            return Self::Primitive(p);
        }
        match data_type {
            DataType::Null => Self::Null,
            DataType::Boolean => Self::Boolean,
            DataType::Binary => Self::Bytes(BytesType::Binary),
            DataType::Utf8 => Self::Bytes(BytesType::Utf8),
            DataType::List(_) => Self::List,
            DataType::Struct(_) => Self::Struct,
            _ => unreachable!("{data_type} is primitive"),
        }
    }
}
