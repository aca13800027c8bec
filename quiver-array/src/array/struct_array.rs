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

use std::sync::Arc;

use quiver_buffer::NullBuffer;
use quiver_data::ArrayData;
use quiver_schema::{DataType, Field, FieldRef, Fields, QuiverError};

use crate::array::{check_buffer_count, make_array};
use crate::{Array, ArrayRef};

/// A nested array with one child array per [`Field`] of its [`DataType::Struct`]
///
/// Every child has the same length as the struct. A struct slot may itself be null,
/// in which case the child slots beneath it are ignored.
///
/// Unlike a [`RecordBatch`](crate::RecordBatch), a `StructArray` can be nested inside
/// other arrays and carry its own validity.
///
/// ```
/// use std::sync::Arc;
/// use quiver_array::{Array, ArrayRef, BooleanArray, Int32Array, StructArray};
/// use quiver_schema::{DataType, Field};
///
/// let flags: ArrayRef = Arc::new(BooleanArray::from(vec![true, false, true]));
/// let ids: ArrayRef = Arc::new(Int32Array::from(vec![7, 8, 9]));
///
/// let array = StructArray::from(vec![
///     (Arc::new(Field::new("flag", DataType::Boolean, false)), flags.clone()),
///     (Arc::new(Field::new("id", DataType::Int32, false)), ids),
/// ]);
/// assert_eq!(array.len(), 3);
/// assert_eq!(array.column(0), &flags);
/// assert_eq!(array.column_by_name("id").unwrap().len(), 3);
/// ```
#[derive(Clone)]
pub struct StructArray {
    data: ArrayData,
    /// Children already sliced to this array's window
    columns: Vec<ArrayRef>,
}

impl StructArray {
    /// Like [`Self::try_new`] but panics on invalid input
    pub fn new(fields: Fields, arrays: Vec<ArrayRef>, nulls: Option<NullBuffer>) -> Self {
        Self::try_new(fields, arrays, nulls).unwrap_or_else(|e| panic!("{e}"))
    }

    /// Assemble a [`StructArray`] from its fields, one array per field, and validity
    ///
    /// The length is taken from the first array, or zero with no fields. Fails with
    /// [`QuiverError::InvalidArgument`] when the field and array counts differ, when an
    /// array's type or length does not match, or when a non-nullable field has a null
    /// that `nulls` does not mask.
    pub fn try_new(
        fields: Fields,
        arrays: Vec<ArrayRef>,
        nulls: Option<NullBuffer>,
    ) -> Result<Self, QuiverError> {
        if fields.len() != arrays.len() {
            return Err(QuiverError::InvalidArgument(format!(
                "StructArray has {} fields but {} arrays",
                fields.len(),
                arrays.len()
            )));
        }
        let len = arrays.first().map_or(0, |a| a.len());

        if let Some(n) = &nulls {
            if n.len() != len {
                return Err(QuiverError::InvalidArgument(format!(
                    "StructArray validity covers {} slots, expected {len}",
                    n.len(),
                )));
            }
        }

        for (field, array) in fields.iter().zip(&arrays) {
            check_column(field, array.as_ref(), len, nulls.as_ref())?;
        }

        let data = ArrayData::builder(DataType::Struct(fields))
            .len(len)
            .child_data(arrays.iter().map(|a| a.to_data()).collect())
            .nulls(nulls)
            .build()?;
        Ok(Self {
            data,
            columns: arrays,
        })
    }

    /// Wraps `data` in a [`StructArray`], slicing each child to the data's window
    pub fn try_new_from_data(data: ArrayData) -> Result<Self, QuiverError> {
        let DataType::Struct(fields) = data.data_type() else {
            return Err(QuiverError::TypeMismatch(format!(
                "StructArray expected ArrayData with type Struct got {}",
                data.data_type()
            )));
        };
        check_buffer_count(&data, 0)?;
        if data.child_data().len() != fields.len() {
            return Err(QuiverError::StructuralMismatch(format!(
                "StructArray with {} fields has {} children",
                fields.len(),
                data.child_data().len()
            )));
        }

        let end = data.offset() + data.len();
        let columns = fields
            .iter()
            .zip(data.child_data())
            .map(|(field, child)| {
                if child.data_type() != field.data_type() {
                    return Err(QuiverError::TypeMismatch(format!(
                        "StructArray field {:?} expected {} got {}",
                        field.name(),
                        field.data_type(),
                        child.data_type()
                    )));
                }
                if child.len() < end {
                    return Err(QuiverError::StructuralMismatch(format!(
                        "StructArray field {:?} has {} slots, needs {end}",
                        field.name(),
                        child.len(),
                    )));
                }
                Ok(make_array(child.slice(data.offset(), data.len())))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { data, columns })
    }

    /// A [`StructArray`] of `len` null slots
    pub fn new_null(fields: Fields, len: usize) -> Self {
        Self::from(ArrayData::new_null(&DataType::Struct(fields), len))
    }

    /// Number of slots
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True when there are no slots
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// The child array at `pos`, windowed to this array
    pub fn column(&self, pos: usize) -> &ArrayRef {
        &self.columns[pos]
    }

    /// Number of children
    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    /// All children, windowed to this array
    pub fn columns(&self) -> &[ArrayRef] {
        &self.columns
    }

    /// The [`Fields`] of this struct's type
    pub fn fields(&self) -> &Fields {
        match self.data.data_type() {
            DataType::Struct(f) => f,
            _ => unreachable!("StructArray always has a Struct data type"),
        }
    }

    /// Names of the children, in order
    pub fn column_names(&self) -> Vec<&str> {
        self.fields().iter().map(|f| f.name().as_str()).collect()
    }

    /// The first child named `name`
    pub fn column_by_name(&self, name: &str) -> Option<&ArrayRef> {
        let pos = self.fields().iter().position(|f| f.name() == name)?;
        Some(self.column(pos))
    }

    /// Zero-copy view of `len` slots starting at `offset`
    ///
    /// # Panics
    ///
    /// Panics if `offset + len > self.len()`
    pub fn slice(&self, offset: usize, len: usize) -> Self {
        assert!(
            offset.saturating_add(len) <= self.len(),
            "cannot slice {len} slots at offset {offset} from a StructArray of length {}",
            self.len()
        );
        Self {
            data: self.data.slice(offset, len),
            columns: self.columns.iter().map(|c| c.slice(offset, len)).collect(),
        }
    }
}

fn check_column(
    field: &Field,
    array: &dyn Array,
    len: usize,
    parent: Option<&NullBuffer>,
) -> Result<(), QuiverError> {
    if field.data_type() != array.data_type() {
        return Err(QuiverError::InvalidArgument(format!(
            "StructArray field {:?} expected {} got {}",
            field.name(),
            field.data_type(),
            array.data_type()
        )));
    }
    if array.len() != len {
        return Err(QuiverError::InvalidArgument(format!(
            "StructArray field {:?} has length {}, expected {len}",
            field.name(),
            array.len(),
        )));
    }
    if field.is_nullable() {
        return Ok(());
    }
    let Some(child) = array.nulls() else {
        return Ok(());
    };
    // a null child slot is fine beneath a null parent slot
    let exposed = (0..len).any(|i| child.is_null(i) && parent.map_or(true, |p| p.is_valid(i)));
    match exposed {
        true => Err(QuiverError::InvalidArgument(format!(
            "non-nullable StructArray field {:?} contains nulls",
            field.name()
        ))),
        false => Ok(()),
    }
}

/// Panics if [`StructArray::try_new_from_data`] fails
impl From<ArrayData> for StructArray {
    fn from(data: ArrayData) -> Self {
        Self::try_new_from_data(data).unwrap_or_else(|e| panic!("StructArray: {e}"))
    }
}

impl From<StructArray> for ArrayData {
    fn from(array: StructArray) -> Self {
        array.data
    }
}

/// Fields are named after the first element, nullable when the array has nulls
impl TryFrom<Vec<(&str, ArrayRef)>> for StructArray {
    type Error = QuiverError;

    fn try_from(values: Vec<(&str, ArrayRef)>) -> Result<Self, QuiverError> {
        let (fields, arrays): (Vec<_>, Vec<_>) = values
            .into_iter()
            .map(|(name, array)| {
                let field = Field::new(name, array.data_type().clone(), array.null_count() > 0);
                (Arc::new(field), array)
            })
            .unzip();
        Self::try_new(fields.into(), arrays, None)
    }
}

impl From<Vec<(FieldRef, ArrayRef)>> for StructArray {
    fn from(v: Vec<(FieldRef, ArrayRef)>) -> Self {
        let (fields, arrays): (Vec<_>, Vec<_>) = v.into_iter().unzip();
        Self::new(fields.into(), arrays, None)
    }
}

data_backed_array!(StructArray);

impl PartialEq for StructArray {
    fn eq(&self, other: &Self) -> bool {
        self.data == other.data
    }
}

impl std::fmt::Debug for StructArray {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        writeln!(f, "StructArray\n[")?;
        for (idx, (field, column)) in self.fields().iter().zip(&self.columns).enumerate() {
            writeln!(f, "-- child {idx}: {:?} ({})", field.name(), column.data_type())?;
            writeln!(f, "{column:?}")?;
        }
        write!(f, "]")
    }
}
