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

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::QuiverError;
use crate::field::Field;
use crate::{FieldRef, Fields};

/// Shared handle to a [`Schema`]
pub type SchemaRef = Arc<Schema>;

/// The ordered [`Fields`] of a batch or stream, plus string metadata
///
/// A schema says nothing about the memory layout of the columns it describes.
///
/// ```
/// # use quiver_schema::{DataType, Field, Schema};
/// let schema = Schema::new(vec![
///     Field::new("ts", DataType::Int64, false),
///     Field::new("msg", DataType::Utf8, true),
/// ]);
/// assert_eq!(schema.index_of("msg").unwrap(), 1);
/// assert_eq!(schema.to_string(), "ts: Int64 not null, msg: Utf8");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    /// Column descriptions, in column order
    pub fields: Fields,
    /// Free-form key/value annotations
    pub metadata: HashMap<String, String>,
}

impl Schema {
    /// A schema without fields or metadata
    pub fn empty() -> Self {
        Self::new(Fields::empty())
    }

    /// A schema over `fields` without metadata
    pub fn new(fields: impl Into<Fields>) -> Self {
        Self::new_with_metadata(fields, HashMap::new())
    }

    /// A schema over `fields` carrying `metadata`
    #[inline]
    pub fn new_with_metadata(fields: impl Into<Fields>, metadata: HashMap<String, String>) -> Self {
        Self {
            fields: fields.into(),
            metadata,
        }
    }

    /// Replace the metadata
    pub fn with_metadata(self, metadata: HashMap<String, String>) -> Self {
        Self { metadata, ..self }
    }

    /// All fields, in column order
    #[inline]
    pub const fn fields(&self) -> &Fields {
        &self.fields
    }

    /// The field at position `i`
    ///
    /// # Panics
    ///
    /// Panics if `i >= self.fields().len()`
    pub fn field(&self, i: usize) -> &Field {
        &self.fields[i]
    }

    /// The first field named `name`
    pub fn field_with_name(&self, name: &str) -> Result<&FieldRef, QuiverError> {
        let idx = self.index_of(name)?;
        Ok(&self.fields[idx])
    }

    /// Position of the first field named `name`, or [`QuiverError::Schema`] listing
    /// the names that do exist
    pub fn index_of(&self, name: &str) -> Result<usize, QuiverError> {
        match self.fields.find(name) {
            Some((idx, _)) => Ok(idx),
            None => {
                let names: Vec<&str> = self.fields.iter().map(|f| f.name().as_str()).collect();
                Err(QuiverError::Schema(format!(
                    "no field named {name:?} among {names:?}"
                )))
            }
        }
    }

    /// A schema holding the fields at `indices`, in that order, with the same metadata
    pub fn project(&self, indices: &[usize]) -> Result<Schema, QuiverError> {
        let mut fields = Vec::with_capacity(indices.len());
        for &i in indices {
            let field = self.fields.get(i).ok_or_else(|| {
                QuiverError::Schema(format!(
                    "cannot project field {i} from a schema of {} fields",
                    self.fields.len()
                ))
            })?;
            fields.push(Arc::clone(field));
        }
        Ok(Self::new_with_metadata(fields, self.metadata.clone()))
    }

    /// Returns true if `self` accepts everything `other` does
    ///
    /// See [`Field::contains`]. Metadata of `other` must also be present in `self`.
    pub fn contains(&self, other: &Schema) -> bool {
        self.fields.contains(&other.fields)
            && other
                .metadata
                .iter()
                .all(|(key, value)| self.metadata.get(key) == Some(value))
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (i, field) in self.fields.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{field}")?;
        }
        Ok(())
    }
}
