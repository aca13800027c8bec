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

use crate::NullArray;

/// Builder for [`NullArray`], which only has to count slots
///
/// ```
/// # use quiver_array::{Array, builder::NullBuilder};
/// let mut builder = NullBuilder::new();
/// builder.append_null();
/// builder.append_nulls(3);
///
/// let array = builder.finish();
/// assert_eq!(array.len(), 4);
/// assert_eq!(array.null_count(), 4);
/// ```
#[derive(Debug, Default)]
pub struct NullBuilder {
    len: usize,
}

forward_array_builder!(NullBuilder, |b| b.len);

impl NullBuilder {
    /// Creates an empty builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a null slot
    #[inline]
    pub fn append_null(&mut self) {
        self.len += 1;
    }

    /// Appends `n` null slots
    #[inline]
    pub fn append_nulls(&mut self, n: usize) {
        self.len += n;
    }

    /// Builds the [`NullArray`] and resets this builder
    pub fn finish(&mut self) -> NullArray {
        NullArray::new(std::mem::take(&mut self.len))
    }

    /// Builds the [`NullArray`] without resetting this builder
    pub fn finish_cloned(&self) -> NullArray {
        NullArray::new(self.len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::ArrayBuilder;
    use crate::Array;
    use quiver_schema::DataType;

    #[test]
    fn test_null_builder() {
        let mut builder = NullBuilder::new();
        builder.append_null();
        builder.append_nulls(4);
        let snapshot = builder.finish_cloned();
        builder.append_nulls(5);

        let array = builder.finish();
        assert_eq!(snapshot.len(), 5);
        assert_eq!(array.len(), 10);
        assert_eq!(array.null_count(), 10);
        assert!(array.nulls().is_none());
        assert_eq!(array.data_type(), &DataType::Null);
        assert!(builder.is_empty());
    }
}
