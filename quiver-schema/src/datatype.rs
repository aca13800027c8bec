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

use std::fmt;
use std::sync::Arc;

use crate::{Field, FieldRef, Fields};

/// Logical type of a column
///
/// The fixed-width numeric types store one native value per slot. [`DataType::Utf8`]
/// and [`DataType::Binary`] store variable-length values behind 32-bit offsets, while
/// [`DataType::List`] and [`DataType::Struct`] are built from child columns.
///
/// Two list types are equal only if their element fields agree on name, type and
/// nullability.
///
/// ```
/// # use quiver_schema::{DataType, Field};
/// # use std::sync::Arc;
/// let words = DataType::new_list(DataType::Utf8, false);
/// assert_eq!(words, DataType::List(Arc::new(Field::new("item", DataType::Utf8, false))));
/// assert_ne!(words, DataType::new_list(DataType::Utf8, true));
/// assert_eq!(words.to_string(), "List(Utf8)");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DataType {
    /// Every slot is null, no buffers are stored
    Null,
    /// Bit-packed `true`/`false`
    Boolean,
    /// Signed 8-bit integer
    Int8,
    /// Signed 16-bit integer
    Int16,
    /// Signed 32-bit integer
    Int32,
    /// Signed 64-bit integer
    Int64,
    /// Unsigned 8-bit integer
    UInt8,
    /// Unsigned 16-bit
    UInt16,
    /// Unsigned 32-bit
    UInt32,
    /// Unsigned 64-bit
    UInt64,
    /// IEEE 754 half precision
    Float16,
    /// IEEE 754 single
    Float32,
    /// IEEE 754 double
    Float64,
    /// Variable-length bytes
    Binary,
    /// Variable-length UTF-8 text
    Utf8,
    /// Variable-length sequences of the element field's type
    List(FieldRef),
    /// One child column per field, all of the parent's length
    Struct(Fields),
}

impl DataType {
    /// Fixed-width numeric type
    #[inline]
    pub fn is_primitive(&self) -> bool {
        self.primitive_width().is_some()
    }

    /// Float16, Float32 or Float64
    #[inline]
    pub fn is_floating(&self) -> bool {
        matches!(self, Self::Float16 | Self::Float32 | Self::Float64)
    }

    /// Signed or unsigned integer of any width
    #[inline]
    pub fn is_integer(&self) -> bool {
        self.is_primitive() && !self.is_floating()
    }

    /// List or struct
    #[inline]
    pub fn is_nested(&self) -> bool {
        matches!(self, Self::List(_) | Self::Struct(_))
    }

    /// [`DataType::Null`]
    #[inline]
    pub fn is_null(&self) -> bool {
        *self == Self::Null
    }

    /// Size in bytes of one value, for the fixed-width numeric types only
    pub fn primitive_width(&self) -> Option<usize> {
        use DataType::*;
        let width = match self {
            Int8 | UInt8 => 1,
            Int16 | UInt16 | Float16 => 2,
            Int32 | UInt32 | Float32 => 4,
            Int64 | UInt64 | Float64 => 8,
            Null | Boolean | Binary | Utf8 | List(_) | Struct(_) => return None,
        };
        Some(width)
    }

    /// A list whose element field is [`Field::new_list_field`]
    pub fn new_list(data_type: DataType, nullable: bool) -> Self {
        Self::List(Arc::new(Field::new_list_field(data_type, nullable)))
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::List(item) => write!(f, "List({})", item.data_type()),
            Self::Struct(fields) => {
                f.write_str("Struct(")?;
                let mut sep = "";
                for field in fields.iter() {
                    write!(f, "{sep}{}: {}", field.name(), field.data_type())?;
                    sep = ", ";
                }
                f.write_str(")")
            }
            other => fmt::Debug::fmt(other, f),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_equality_covers_element_field() {
        let base = DataType::new_list(DataType::Float64, true);
        assert_eq!(base, DataType::new_list(DataType::Float64, true));
        assert_ne!(base, DataType::new_list(DataType::Float64, false));
        assert_ne!(base, DataType::new_list(DataType::Float32, true));
        let renamed = DataType::List(Arc::new(Field::new("element", DataType::Float64, true)));
        assert_ne!(base, renamed);
    }

    #[test]
    fn test_classification() {
        let widths: Vec<_> = [DataType::UInt8, DataType::Int16, DataType::Float32, DataType::Int64]
            .iter()
            .map(|t| t.primitive_width())
            .collect();
        assert_eq!(widths, [Some(1), Some(2), Some(4), Some(8)]);

        for t in [DataType::Null, DataType::Boolean, DataType::Binary, DataType::Utf8] {
            assert!(!t.is_primitive(), "{t}");
            assert!(!t.is_nested(), "{t}");
        }
        assert!(DataType::Float16.is_floating());
        assert!(!DataType::Float16.is_integer());
        assert!(DataType::UInt32.is_integer());
        assert!(!DataType::Boolean.is_integer());
        assert!(DataType::Null.is_null());
        assert!(DataType::Struct(Fields::empty()).is_nested());
    }

    #[test]
    fn test_display_nested() {
        let inner = DataType::Struct(Fields::from(vec![Field::new("k", DataType::Utf8, false)]));
        let outer = DataType::Struct(Fields::from(vec![
            Field::new("id", DataType::UInt16, false),
            Field::new("pairs", DataType::new_list(inner, true), true),
        ]));
        assert_eq!(outer.to_string(), "Struct(id: UInt16, pairs: List(Struct(k: Utf8)))");
        assert_eq!(DataType::Struct(Fields::empty()).to_string(), "Struct()");
        assert_eq!(DataType::Binary.to_string(), "Binary");
    }
}
