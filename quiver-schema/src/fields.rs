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
use std::ops::Deref;
use std::sync::Arc;

use crate::FieldRef;

/// The ordered children of a struct or schema, shared behind an [`Arc`]
///
/// Anything convertible into a [`FieldRef`], owned [`Field`](crate::Field)s included,
/// can be collected into [`Fields`].
///
/// ```
/// # use std::sync::Arc;
/// # use quiver_schema::{DataType, Field, Fields};
/// let a = Fields::from(vec![Field::new("a", DataType::Boolean, false)]);
/// let b = Fields::from(vec![Arc::new(Field::new("a", DataType::Boolean, false))]);
/// let c: Fields = std::iter::once(Field::new("a", DataType::Boolean, false)).collect();
/// assert_eq!(a, b);
/// assert_eq!(b, c);
/// ```
#[derive(Clone, Eq, PartialEq, Hash)]
pub struct Fields(Arc<[FieldRef]>);

impl Fields {
    /// Returns a new empty [`Fields`]
    pub fn empty() -> Self {
        Self(Arc::new([]))
    }

    /// Returns the position and definition of the first field named `name`
    pub fn find(&self, name: &str) -> Option<(usize, &FieldRef)> {
        self.iter().enumerate().find(|(_, f)| f.name() == name)
    }

    /// Returns true if `other` has the same arity and each of its fields is
    /// [contained](crate::Field::contains) in the field at the same position
    pub fn contains(&self, other: &Fields) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
            || (self.len() == other.len()
                && self
                    .iter()
                    .zip(other.iter())
                    .all(|(a, b)| Arc::ptr_eq(a, b) || a.contains(b)))
    }
}

impl fmt::Debug for Fields {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl Default for Fields {
    fn default() -> Self {
        Self::empty()
    }
}

impl<F: Into<FieldRef>> FromIterator<F> for Fields {
    fn from_iter<T: IntoIterator<Item = F>>(iter: T) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl<F: Into<FieldRef>> From<Vec<F>> for Fields {
    fn from(value: Vec<F>) -> Self {
        value.into_iter().collect()
    }
}

impl From<&[FieldRef]> for Fields {
    fn from(value: &[FieldRef]) -> Self {
        Self(value.into())
    }
}

impl Deref for Fields {
    type Target = [FieldRef];

    fn deref(&self) -> &[FieldRef] {
        &self.0
    }
}

impl<'a> IntoIterator for &'a Fields {
    type Item = &'a FieldRef;
    type IntoIter = std::slice::Iter<'a, FieldRef>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
