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

//! Recovering concrete arrays from [`dyn Array`](Array) and [`ArrayRef`]

use crate::array::*;
use crate::types::*;

mod private {
    pub trait Sealed {}
}

#[inline]
fn expect_array<'a, A>(array: Option<&'a A>) -> &'a A {
    match array {
        Some(array) => array,
        None => panic!("array is not a {}", std::any::type_name::<A>()),
    }
}

/// Downcasting for type erased arrays
///
/// The `_opt` methods return `None` when the array has another concrete type, the
/// others panic.
///
/// ```
/// # use std::sync::Arc;
/// # use quiver_array::{ArrayRef, Int32Array, StringArray};
/// # use quiver_array::cast::AsArray;
/// # use quiver_array::types::Int32Type;
/// let column = Arc::new(Int32Array::from(vec![1, 2, 3])) as ArrayRef;
/// assert_eq!(column.as_primitive::<Int32Type>().values(), &[1, 2, 3]);
/// assert!(column.as_string_opt().is_none());
/// assert!(column.as_array_opt::<StringArray>().is_none());
/// ```
pub trait AsArray: private::Sealed {
    /// Downcast to the concrete array `A`, or `None` if this is another type
    fn as_array_opt<A: Array + 'static>(&self) -> Option<&A>;

    /// Downcast this to a [`BooleanArray`], or `None` if this is another type
    fn as_boolean_opt(&self) -> Option<&BooleanArray> {
        self.as_array_opt()
    }

    /// Downcast this to a [`BooleanArray`]
    fn as_boolean(&self) -> &BooleanArray {
        expect_array(self.as_boolean_opt())
    }

    /// Downcast this to a [`PrimitiveArray`], or `None` if this is another type
    fn as_primitive_opt<T: QuiverPrimitiveType>(&self) -> Option<&PrimitiveArray<T>> {
        self.as_array_opt()
    }

    /// Downcast this to a [`PrimitiveArray`]
    fn as_primitive<T: QuiverPrimitiveType>(&self) -> &PrimitiveArray<T> {
        expect_array(self.as_primitive_opt())
    }

    /// Downcast this to a [`GenericByteArray`], or `None` if this is another type
    fn as_bytes_opt<T: ByteArrayType>(&self) -> Option<&GenericByteArray<T>> {
        self.as_array_opt()
    }

    /// Downcast this to a [`GenericByteArray`]
    fn as_bytes<T: ByteArrayType>(&self) -> &GenericByteArray<T> {
        expect_array(self.as_bytes_opt())
    }

    /// Downcast this to a [`StringArray`], or `None` if this is another type
    fn as_string_opt(&self) -> Option<&StringArray> {
        self.as_bytes_opt()
    }

    /// Downcast this to a [`StringArray`]
    fn as_string(&self) -> &StringArray {
        self.as_bytes()
    }

    /// Downcast this to a [`BinaryArray`], or `None` if this is another type
    fn as_binary_opt(&self) -> Option<&BinaryArray> {
        self.as_bytes_opt()
    }

    /// Downcast this to a [`BinaryArray`]
    fn as_binary(&self) -> &BinaryArray {
        self.as_bytes()
    }

    /// Downcast this to a [`StructArray`], or `None` if this is another type
    fn as_struct_opt(&self) -> Option<&StructArray> {
        self.as_array_opt()
    }

    /// Downcast this to a [`StructArray`]
    fn as_struct(&self) -> &StructArray {
        expect_array(self.as_struct_opt())
    }

    /// Downcast this to a [`ListArray`], or `None` if this is another type
    fn as_list_opt(&self) -> Option<&ListArray> {
        self.as_array_opt()
    }

    /// Downcast this to a [`ListArray`]
    fn as_list(&self) -> &ListArray {
        expect_array(self.as_list_opt())
    }
}

impl private::Sealed for dyn Array + '_ {}
impl AsArray for dyn Array + '_ {
    fn as_array_opt<A: Array + 'static>(&self) -> Option<&A> {
        self.as_any().downcast_ref()
    }
}

impl private::Sealed for ArrayRef {}
impl AsArray for ArrayRef {
    fn as_array_opt<A: Array + 'static>(&self) -> Option<&A> {
        self.as_ref().as_array_opt()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use quiver_schema::DataType;

    use super::*;

    #[test]
    fn test_downcast_through_arc() {
        let array: ArrayRef = Arc::new(Int32Array::from(vec![1, 2, 3]));
        assert_eq!(array.as_primitive::<Int32Type>().len(), 3);
        assert_eq!(array.as_ref().as_primitive::<Int32Type>().len(), 3);
        assert!(array.as_primitive_opt::<Int64Type>().is_none());

        let strings: ArrayRef = Arc::new(StringArray::from(vec!["foo"]));
        assert_eq!(strings.as_string().value(0), "foo");
        assert_eq!(strings.as_bytes::<Utf8Type>().value(0), "foo");
        assert!(strings.as_binary_opt().is_none());
    }

    #[test]
    fn test_as_array_opt() {
        let array: ArrayRef = Arc::new(BooleanArray::from(vec![true]));
        assert!(array.as_boolean_opt().is_some());
        assert!(array.as_primitive_opt::<Int8Type>().is_none());
        assert!(array.as_string_opt().is_none());
        assert!(array.as_list_opt().is_none());
        assert!(array.as_array_opt::<BooleanArray>().is_some());

        let list = new_empty_array(&DataType::new_list(DataType::Utf8, true));
        assert_eq!(list.as_list().value_type(), DataType::Utf8);
        assert!(list.as_list().is_empty());
    }

    #[test]
    #[should_panic(expected = "StructArray")]
    fn test_wrong_type_panics() {
        let array: ArrayRef = Arc::new(NullArray::new(1));
        array.as_struct();
    }
}
