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

//! Append-only builders producing each array type
//!
//! Flat builders take one slot per call:
//!
//! ```
//! # use quiver_array::builder::{BooleanBuilder, Float64Builder, StringBuilder};
//! # use quiver_array::{Array, Float64Array};
//! let mut prices = Float64Builder::new();
//! prices.append_value(9.5);
//! prices.append_null();
//! prices.append_slice(&[1.25, 3.0]);
//! assert_eq!(prices.finish(), Float64Array::from(vec![Some(9.5), None, Some(1.25), Some(3.0)]));
//!
//! let mut names = StringBuilder::new();
//! names.extend([Some("pear"), None, Some("fig")]);
//! assert_eq!(names.finish().value(2), "fig");
//!
//! let mut flags = BooleanBuilder::new();
//! flags.append_n(3, true);
//! assert_eq!(flags.finish().len(), 3);
//! ```
//!
//! # Lists
//!
//! A [`ListBuilder`] wraps a builder for its values. [`ListBuilder::append`] and
//! [`ListBuilder::append_null`] open an element at the child's current length, and the
//! values pushed through [`ListBuilder::values`] until the next element is opened land
//! in it. Finishing closes the last element.
//!
//! ```
//! # use quiver_array::builder::{ListBuilder, UInt8Builder};
//! # use quiver_array::types::UInt8Type;
//! # use quiver_array::ListArray;
//! let mut bytes = ListBuilder::new(UInt8Builder::new());
//! bytes.append();
//! bytes.values().append_slice(&[0xca, 0xfe]);
//! bytes.append_null();
//! bytes.append();
//! bytes.values().append_value(0x01);
//!
//! let expected = ListArray::from_iter_primitive::<UInt8Type, _, _>([
//!     Some(vec![Some(0xca), Some(0xfe)]),
//!     None,
//!     Some(vec![Some(0x01)]),
//! ]);
//! assert_eq!(bytes.finish(), expected);
//! ```
//!
//! # Dynamic typing
//!
//! [`make_builder`] returns a `Box<dyn ArrayBuilder>` for any [`DataType`]. Nested
//! types yield trees of boxed builders, reachable by downcasting through
//! [`ArrayBuilder::as_any_mut`].
//!
//! ```
//! # use quiver_array::builder::{make_builder, ArrayBuilder, Int64Builder, ListBuilder};
//! # use quiver_array::cast::AsArray;
//! # use quiver_schema::DataType;
//! let mut builder = make_builder(&DataType::new_list(DataType::Int64, true), 16);
//! let list = builder
//!     .as_any_mut()
//!     .downcast_mut::<ListBuilder<Box<dyn ArrayBuilder>>>()
//!     .unwrap();
//! list.append();
//! let ints = list.values().as_any_mut().downcast_mut::<Int64Builder>().unwrap();
//! ints.append_value(7);
//!
//! let array = builder.finish();
//! assert_eq!(array.as_list().value_length(0).unwrap(), 1);
//! ```

pub use quiver_buffer::{BooleanBufferBuilder, BufferBuilder, NullBufferBuilder};

/// Implements [`ArrayBuilder`] by forwarding to the builder's inherent `finish` and
/// `finish_cloned`, with `$len` computing the number of slots
macro_rules! forward_array_builder {
    ($ty:ty $(, <$g:ident: $bound:path>)?, |$this:ident| $len:expr) => {
        impl$(<$g: $bound>)? $crate::builder::ArrayBuilder for $ty {
            fn len(&self) -> usize {
                let $this = self;
                $len
            }

            fn finish(&mut self) -> $crate::ArrayRef {
                std::sync::Arc::new(<$ty>::finish(self))
            }

            fn finish_cloned(&self) -> $crate::ArrayRef {
                std::sync::Arc::new(<$ty>::finish_cloned(self))
            }

            fn as_any(&self) -> &dyn std::any::Any {
                self
            }

            fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
                self
            }

            fn into_box_any(self: Box<Self>) -> Box<dyn std::any::Any> {
                self
            }
        }
    };
}

mod boolean_builder;
pub use boolean_builder::*;
mod generic_bytes_builder;
pub use generic_bytes_builder::*;
mod generic_list_builder;
pub use generic_list_builder::*;
mod null_builder;
pub use null_builder::*;
mod primitive_builder;
pub use primitive_builder::*;
mod struct_builder;
pub use struct_builder::*;

use std::any::Any;

use quiver_schema::DataType;

use crate::types::{BinaryType, Utf8Type};
use crate::ArrayRef;

/// A type-erased array builder
///
/// Implemented by every builder in this module so that heterogeneous columns can be
/// built side by side, as [`StructBuilder`] does for its fields.
pub trait ArrayBuilder: Any + Send + Sync {
    /// Number of slots appended so far
    fn len(&self) -> usize;

    /// True when nothing has been appended
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Build the array and reset the builder
    fn finish(&mut self) -> ArrayRef;

    /// Build an array of the current contents, leaving the builder untouched
    fn finish_cloned(&self) -> ArrayRef;

    /// The builder as [`Any`], for `downcast_ref` to the concrete builder
    fn as_any(&self) -> &dyn Any;

    /// The builder as mutable [`Any`], for `downcast_mut` to the concrete builder
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Convert a boxed builder into a boxed [`Any`]
    fn into_box_any(self: Box<Self>) -> Box<dyn Any>;
}

impl ArrayBuilder for Box<dyn ArrayBuilder> {
    fn len(&self) -> usize {
        (**self).len()
    }

    fn is_empty(&self) -> bool {
        (**self).is_empty()
    }

    fn finish(&mut self) -> ArrayRef {
        (**self).finish()
    }

    fn finish_cloned(&self) -> ArrayRef {
        (**self).finish_cloned()
    }

    fn as_any(&self) -> &dyn Any {
        (**self).as_any()
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        (**self).as_any_mut()
    }

    fn into_box_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

/// A [`GenericListBuilder`] producing [`ListArray`](crate::array::ListArray)
pub type ListBuilder<T> = GenericListBuilder<T>;

/// A [`GenericByteBuilder`] producing [`BinaryArray`](crate::array::BinaryArray)
pub type BinaryBuilder = GenericByteBuilder<BinaryType>;

/// A [`GenericByteBuilder`] producing [`StringArray`](crate::array::StringArray)
pub type StringBuilder = GenericByteBuilder<Utf8Type>;

/// A boxed builder for `datatype` with room for `capacity` slots
///
/// A list gets a boxed builder for its child, a struct one boxed builder per field.
pub fn make_builder(datatype: &DataType, capacity: usize) -> Box<dyn ArrayBuilder> {
    use crate::types::*;
    match datatype {
        DataType::Null => Box::new(NullBuilder::new()),
        DataType::Boolean => Box::new(BooleanBuilder::with_capacity(capacity)),
        DataType::Int8 => Box::new(Int8Builder::with_capacity(capacity)),
        DataType::Int16 => Box::new(Int16Builder::with_capacity(capacity)),
        DataType::Int32 => Box::new(Int32Builder::with_capacity(capacity)),
        DataType::Int64 => Box::new(Int64Builder::with_capacity(capacity)),
        DataType::UInt8 => Box::new(UInt8Builder::with_capacity(capacity)),
        DataType::UInt16 => Box::new(UInt16Builder::with_capacity(capacity)),
        DataType::UInt32 => Box::new(UInt32Builder::with_capacity(capacity)),
        DataType::UInt64 => Box::new(UInt64Builder::with_capacity(capacity)),
        DataType::Float16 => Box::new(PrimitiveBuilder::<Float16Type>::with_capacity(capacity)),
        DataType::Float32 => Box::new(Float32Builder::with_capacity(capacity)),
        DataType::Float64 => Box::new(Float64Builder::with_capacity(capacity)),
        DataType::Binary => Box::new(BinaryBuilder::with_capacity(capacity, 1024)),
        DataType::Utf8 => Box::new(StringBuilder::with_capacity(capacity, 1024)),
        DataType::List(field) => {
            let builder = make_builder(field.data_type(), capacity);
            Box::new(ListBuilder::with_capacity(builder, capacity).with_field(field.clone()))
        }
        DataType::Struct(fields) => Box::new(StructBuilder::from_fields(fields.clone(), capacity)),
    }
}
