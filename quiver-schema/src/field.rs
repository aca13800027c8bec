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
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::datatype::DataType;

/// Shared handle to a [`Field`]
pub type FieldRef = Arc<Field>;

/// A named, typed column of a [`Schema`](crate::Schema)
///
/// Besides its name and [`DataType`], a field records whether its column may hold
/// nulls and carries free-form string metadata.
///
/// ```
/// # use quiver_schema::{DataType, Field};
/// let score = Field::new("score", DataType::Float32, false);
/// assert_eq!(score.to_string(), "score: Float32 not null");
///
/// let renamed = score.with_name("rating").with_nullable(true);
/// assert_eq!(renamed.to_string(), "rating: Float32");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    name: String,
    data_type: DataType,
    nullable: bool,
    metadata: HashMap<String, String>,
}

impl Hash for Field {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.data_type.hash(state);
        self.nullable.hash(state);
        // HashMap iteration order is unspecified
        let mut entries: Vec<_> = self.metadata.iter().collect();
        entries.sort_unstable();
        entries.hash(state);
    }
}

impl Field {
    /// Name given to the element field of a list when none is chosen
    pub const LIST_FIELD_DEFAULT_NAME: &'static str = "item";

    /// Create a field without metadata
    pub fn new(name: impl Into<String>, data_type: DataType, nullable: bool) -> Self {
        Self {
            name: name.into(),
            data_type,
            nullable,
            metadata: HashMap::new(),
        }
    }

    /// The element field of a list, named [`Self::LIST_FIELD_DEFAULT_NAME`]
    pub fn new_list_field(data_type: DataType, nullable: bool) -> Self {
        Self::new(Self::LIST_FIELD_DEFAULT_NAME, data_type, nullable)
    }

    /// Replace the metadata in place
    #[inline]
    pub fn set_metadata(&mut self, metadata: HashMap<String, String>) {
        self.metadata = metadata;
    }

    /// Replace the metadata
    pub fn with_metadata(self, metadata: HashMap<String, String>) -> Self {
        Self { metadata, ..self }
    }

    /// Free-form key/value annotations
    #[inline]
    pub const fn metadata(&self) -> &HashMap<String, String> {
        &self.metadata
    }

    /// Column name
    #[inline]
    pub const fn name(&self) -> &String {
        &self.name
    }

    /// Rename the field
    pub fn with_name(self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..self
        }
    }

    /// Logical type of the column
    #[inline]
    pub const fn data_type(&self) -> &DataType {
        &self.data_type
    }

    /// Change the logical type
    pub fn with_data_type(self, data_type: DataType) -> Self {
        Self { data_type, ..self }
    }

    /// Whether the column may hold nulls
    #[inline]
    pub const fn is_nullable(&self) -> bool {
        self.nullable
    }

    /// Change the nullability
    pub fn with_nullable(self, nullable: bool) -> Self {
        Self { nullable, ..self }
    }

    /// Returns true if every column valid under `other` is also valid under `self`
    ///
    /// Name and type must be equal. A nullable `self` accepts a non-nullable `other`
    /// but not the reverse, and `self` must carry every metadata entry of `other`.
    pub fn contains(&self, other: &Field) -> bool {
        let metadata_covered = other
            .metadata
            .iter()
            .all(|(key, value)| self.metadata.get(key) == Some(value));
        self.name == other.name
            && self.data_type == other.data_type
            && (self.nullable || !other.nullable)
            && metadata_covered
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let suffix = if self.nullable { "" } else { " not null" };
        write!(f, "{}: {}{suffix}", self.name, self.data_type)
    }
}
