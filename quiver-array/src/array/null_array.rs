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

use quiver_data::ArrayData;
use quiver_schema::{DataType, QuiverError};

use crate::array::{check_buffer_count, check_data_type};
use crate::builder::NullBuilder;

/// An array of the `Null` type: every slot is null and no buffers are stored
///
/// Because the validity is implied by the type, [`Array::nulls`] is `None` while
/// [`Array::null_count`] equals the length.
///
/// ```
/// use quiver_array::{Array, NullArray};
///
/// let array = NullArray::new(4).slice(1, 2);
/// assert_eq!(array.len(), 2);
/// assert_eq!(array.null_count(), 2);
/// assert!(array.is_null(0));
/// assert!(array.nulls().is_none());
/// ```
#[derive(Clone)]
pub struct NullArray {
    data: ArrayData,
}

impl NullArray {
    /// Create a [`NullArray`] of `length` slots
    ///
    /// See [`new_null_array`](crate::array::new_null_array) for an all-null array of
    /// another type.
    pub fn new(length: usize) -> Self {
        Self {
            data: ArrayData::new_null(&DataType::Null, length),
        }
    }

    /// Wraps `data`, which must be of type `Null` with neither buffers nor validity
    pub fn try_new_from_data(data: ArrayData) -> Result<Self, QuiverError> {
        check_data_type(&data, &DataType::Null)?;
        check_buffer_count(&data, 0)?;
        match data.nulls() {
            Some(_) => Err(QuiverError::StructuralMismatch(
                "a Null typed array carries no validity buffer".to_string(),
            )),
            None => Ok(Self { data }),
        }
    }

    /// Number of slots
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True when there are no slots
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Zero-copy view of `len` slots starting at `offset`
    pub fn slice(&self, offset: usize, len: usize) -> Self {
        Self {
            data: self.data.slice(offset, len),
        }
    }

    /// A [`NullBuilder`]; `_capacity` is accepted for symmetry with the other arrays
    pub fn builder(_capacity: usize) -> NullBuilder {
        NullBuilder::new()
    }
}

data_backed_array!(NullArray, all_null);

/// Panics if [`NullArray::try_new_from_data`] fails
impl From<ArrayData> for NullArray {
    fn from(data: ArrayData) -> Self {
        Self::try_new_from_data(data).unwrap_or_else(|e| panic!("NullArray: {e}"))
    }
}

impl From<NullArray> for ArrayData {
    fn from(array: NullArray) -> Self {
        array.data
    }
}

impl std::fmt::Debug for NullArray {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "NullArray({})", self.len())
    }
}
