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

//! Flatbuffer bindings for the IPC `Schema.fbs` and `Message.fbs` tables
//!
//! Only the tables and fields this crate reads or writes are bound. Accessors assume the
//! buffer was checked with [`root_as_message`] (or another verifying entry point) first.

mod message;
mod schema;

pub use message::*;
pub use schema::*;

/// Declares a flatbuffer enum or union tag as a transparent newtype over its scalar
macro_rules! fb_enum {
    (
        $(#[$meta:meta])*
        $name:ident: $repr:ty {
            $($(#[$vmeta:meta])* $variant:ident = $value:expr,)*
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
        #[repr(transparent)]
        pub struct $name(pub $repr);

        #[allow(non_upper_case_globals)]
        impl $name {
            $($(#[$vmeta])* pub const $variant: Self = Self($value);)*

            /// Returns the schema name of this value, if it is a known variant
            pub fn variant_name(self) -> Option<&'static str> {
                match self {
                    $(Self::$variant => Some(stringify!($variant)),)*
                    _ => None,
                }
            }
        }

        impl std::fmt::Debug for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self.variant_name() {
                    Some(name) => f.write_str(name),
                    None => write!(f, "<UNKNOWN {:?}>", self.0),
                }
            }
        }

        impl<'a> flatbuffers::Follow<'a> for $name {
            type Inner = Self;
            #[inline]
            unsafe fn follow(buf: &'a [u8], loc: usize) -> Self::Inner {
                Self(flatbuffers::read_scalar_at::<$repr>(buf, loc))
            }
        }

        impl flatbuffers::Push for $name {
            type Output = $name;
            #[inline]
            unsafe fn push(&self, dst: &mut [u8], _written_len: usize) {
                flatbuffers::emplace_scalar::<$repr>(dst, self.0);
            }
        }

        impl flatbuffers::Verifiable for $name {
            #[inline]
            fn run_verifier(
                v: &mut flatbuffers::Verifier,
                pos: usize,
            ) -> Result<(), flatbuffers::InvalidFlatbuffer> {
                <$repr as flatbuffers::Verifiable>::run_verifier(v, pos)
            }
        }

        impl flatbuffers::SimpleToVerifyInSlice for $name {}
    };
}

/// Declares a flatbuffer table wrapper with its `Follow` implementation
macro_rules! fb_table {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Copy, Clone)]
        pub struct $name<'a> {
            pub(crate) _tab: flatbuffers::Table<'a>,
        }

        impl<'a> flatbuffers::Follow<'a> for $name<'a> {
            type Inner = $name<'a>;
            #[inline]
            unsafe fn follow(buf: &'a [u8], loc: usize) -> Self::Inner {
                Self {
                    _tab: flatbuffers::Table::new(buf, loc),
                }
            }
        }
    };
}

/// Declares the builder of a flatbuffer table
macro_rules! fb_table_builder {
    ($(#[$meta:meta])* $builder:ident => $table:ident) => {
        $(#[$meta])*
        pub struct $builder<'a: 'b, 'b> {
            fbb_: &'b mut flatbuffers::FlatBufferBuilder<'a>,
            start_: flatbuffers::WIPOffset<flatbuffers::TableUnfinishedWIPOffset>,
        }

        impl<'a: 'b, 'b> $builder<'a, 'b> {
            /// Start a new table in `fbb`
            #[inline]
            pub fn new(fbb: &'b mut flatbuffers::FlatBufferBuilder<'a>) -> Self {
                let start_ = fbb.start_table();
                Self { fbb_: fbb, start_ }
            }

            /// Finish the table, returning its offset
            #[inline]
            pub fn finish(self) -> flatbuffers::WIPOffset<$table<'a>> {
                let o = self.fbb_.end_table(self.start_);
                flatbuffers::WIPOffset::new(o.value())
            }
        }
    };
}

pub(crate) use {fb_enum, fb_table, fb_table_builder};

/// Reads a little endian `i64` stored at `at` within a flatbuffer struct
#[inline]
pub(crate) fn struct_i64(bytes: &[u8], at: usize) -> i64 {
    let mut le = [0_u8; 8];
    le.copy_from_slice(&bytes[at..at + 8]);
    i64::from_le_bytes(le)
}
