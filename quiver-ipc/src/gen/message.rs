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

//! Bindings for the tables of `Message.fbs`

use flatbuffers::{
    FlatBufferBuilder, Follow, ForwardsUOffset, InvalidFlatbuffer, Push, PushAlignment,
    SimpleToVerifyInSlice, Table, UnionWIPOffset, VOffsetT, Vector, Verifiable, Verifier,
    WIPOffset,
};

use super::{fb_enum, fb_table, fb_table_builder, struct_i64, KeyValue, MetadataVersion, Schema};

fb_enum! {
    /// Tag of the `MessageHeader` union
    MessageHeader: u8 {
        NONE = 0,
        Schema = 1,
        DictionaryBatch = 2,
        RecordBatch = 3,
        Tensor = 4,
        SparseTensor = 5,
    }
}

fb_enum! {
    /// Codec of a compressed record batch body
    CompressionType: i8 {
        LZ4_FRAME = 0,
        ZSTD = 1,
    }
}

/// Declares a 16 byte flatbuffer struct made of two little endian `i64`
macro_rules! fb_pair_struct {
    ($(#[$meta:meta])* $name:ident { $first:ident, $second:ident }) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Default)]
        #[repr(transparent)]
        pub struct $name(pub [u8; 16]);

        impl $name {
            /// Create a new value from its two fields
            pub fn new($first: i64, $second: i64) -> Self {
                let mut bytes = [0_u8; 16];
                bytes[..8].copy_from_slice(&$first.to_le_bytes());
                bytes[8..].copy_from_slice(&$second.to_le_bytes());
                Self(bytes)
            }

            #[allow(missing_docs)]
            pub fn $first(&self) -> i64 {
                struct_i64(&self.0, 0)
            }

            #[allow(missing_docs)]
            pub fn $second(&self) -> i64 {
                struct_i64(&self.0, 8)
            }
        }

        impl std::fmt::Debug for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.debug_struct(stringify!($name))
                    .field(stringify!($first), &self.$first())
                    .field(stringify!($second), &self.$second())
                    .finish()
            }
        }

        impl<'a> Follow<'a> for $name {
            type Inner = &'a $name;
            #[inline]
            unsafe fn follow(buf: &'a [u8], loc: usize) -> Self::Inner {
                <&'a $name>::follow(buf, loc)
            }
        }

        impl<'a> Follow<'a> for &'a $name {
            type Inner = &'a $name;
            #[inline]
            unsafe fn follow(buf: &'a [u8], loc: usize) -> Self::Inner {
                flatbuffers::follow_cast_ref::<$name>(buf, loc)
            }
        }

        impl Push for $name {
            type Output = $name;
            #[inline]
            unsafe fn push(&self, dst: &mut [u8], _written_len: usize) {
                dst.copy_from_slice(&self.0);
            }

            #[inline]
            fn alignment() -> PushAlignment {
                PushAlignment::new(8)
            }
        }

        impl Verifiable for $name {
            #[inline]
            fn run_verifier(v: &mut Verifier, pos: usize) -> Result<(), InvalidFlatbuffer> {
                v.in_buffer::<Self>(pos)
            }
        }

        impl SimpleToVerifyInSlice for $name {}
    };
}

fb_pair_struct!(
    /// Metadata of one array in the pre-order flattening of a record batch
    FieldNode { length, null_count }
);

fb_pair_struct!(
    /// Location of one buffer relative to the start of the message body
    Buffer { offset, length }
);

fb_table!(
    /// Compression applied to the buffers of a record batch
    BodyCompression
);

impl<'a> BodyCompression<'a> {
    pub const VT_CODEC: VOffsetT = 4;
    pub const VT_METHOD: VOffsetT = 6;

    pub fn codec(&self) -> CompressionType {
        unsafe {
            self._tab
                .get::<CompressionType>(Self::VT_CODEC, Some(CompressionType::LZ4_FRAME))
                .unwrap_or(CompressionType::LZ4_FRAME)
        }
    }
}

impl Verifiable for BodyCompression<'_> {
    #[inline]
    fn run_verifier(v: &mut Verifier, pos: usize) -> Result<(), InvalidFlatbuffer> {
        v.visit_table(pos)?
            .visit_field::<CompressionType>("codec", Self::VT_CODEC, false)?
            .visit_field::<i8>("method", Self::VT_METHOD, false)?
            .finish();
        Ok(())
    }
}

fb_table!(
    /// The data header of one batch of rows
    RecordBatch
);

impl<'a> RecordBatch<'a> {
    pub const VT_LENGTH: VOffsetT = 4;
    pub const VT_NODES: VOffsetT = 6;
    pub const VT_BUFFERS: VOffsetT = 8;
    pub const VT_COMPRESSION: VOffsetT = 10;
    pub const VT_VARIADICBUFFERCOUNTS: VOffsetT = 12;

    pub fn length(&self) -> i64 {
        unsafe { self._tab.get::<i64>(Self::VT_LENGTH, Some(0)).unwrap_or(0) }
    }

    pub fn nodes(&self) -> Option<Vector<'a, FieldNode>> {
        unsafe {
            self._tab
                .get::<ForwardsUOffset<Vector<'a, FieldNode>>>(Self::VT_NODES, None)
        }
    }

    pub fn buffers(&self) -> Option<Vector<'a, Buffer>> {
        unsafe {
            self._tab
                .get::<ForwardsUOffset<Vector<'a, Buffer>>>(Self::VT_BUFFERS, None)
        }
    }

    pub fn compression(&self) -> Option<BodyCompression<'a>> {
        unsafe {
            self._tab
                .get::<ForwardsUOffset<BodyCompression>>(Self::VT_COMPRESSION, None)
        }
    }
}

impl Verifiable for RecordBatch<'_> {
    #[inline]
    fn run_verifier(v: &mut Verifier, pos: usize) -> Result<(), InvalidFlatbuffer> {
        v.visit_table(pos)?
            .visit_field::<i64>("length", Self::VT_LENGTH, false)?
            .visit_field::<ForwardsUOffset<Vector<'_, FieldNode>>>("nodes", Self::VT_NODES, false)?
            .visit_field::<ForwardsUOffset<Vector<'_, Buffer>>>(
                "buffers",
                Self::VT_BUFFERS,
                false,
            )?
            .visit_field::<ForwardsUOffset<BodyCompression>>(
                "compression",
                Self::VT_COMPRESSION,
                false,
            )?
            .visit_field::<ForwardsUOffset<Vector<'_, i64>>>(
                "variadicBufferCounts",
                Self::VT_VARIADICBUFFERCOUNTS,
                false,
            )?
            .finish();
        Ok(())
    }
}

fb_table_builder!(
    /// Builder of [`RecordBatch`]
    RecordBatchBuilder => RecordBatch
);

impl<'a> RecordBatchBuilder<'a, '_> {
    #[inline]
    pub fn add_length(&mut self, length: i64) {
        self.fbb_.push_slot::<i64>(RecordBatch::VT_LENGTH, length, 0);
    }

    #[inline]
    pub fn add_nodes(&mut self, nodes: WIPOffset<Vector<'a, FieldNode>>) {
        self.fbb_
            .push_slot_always::<WIPOffset<_>>(RecordBatch::VT_NODES, nodes);
    }

    #[inline]
    pub fn add_buffers(&mut self, buffers: WIPOffset<Vector<'a, Buffer>>) {
        self.fbb_
            .push_slot_always::<WIPOffset<_>>(RecordBatch::VT_BUFFERS, buffers);
    }
}

fb_table!(
    /// The envelope of every frame in a stream
    Message
);

impl<'a> Message<'a> {
    pub const VT_VERSION: VOffsetT = 4;
    pub const VT_HEADER_TYPE: VOffsetT = 6;
    pub const VT_HEADER: VOffsetT = 8;
    pub const VT_BODYLENGTH: VOffsetT = 10;
    pub const VT_CUSTOM_METADATA: VOffsetT = 12;

    pub fn version(&self) -> MetadataVersion {
        unsafe {
            self._tab
                .get::<MetadataVersion>(Self::VT_VERSION, Some(MetadataVersion::V1))
                .unwrap_or(MetadataVersion::V1)
        }
    }

    pub fn header_type(&self) -> MessageHeader {
        unsafe {
            self._tab
                .get::<MessageHeader>(Self::VT_HEADER_TYPE, Some(MessageHeader::NONE))
                .unwrap_or(MessageHeader::NONE)
        }
    }

    pub fn header(&self) -> Option<Table<'a>> {
        unsafe { self._tab.get::<ForwardsUOffset<Table<'a>>>(Self::VT_HEADER, None) }
    }

    pub fn body_length(&self) -> i64 {
        unsafe { self._tab.get::<i64>(Self::VT_BODYLENGTH, Some(0)).unwrap_or(0) }
    }

    pub fn custom_metadata(&self) -> Option<Vector<'a, ForwardsUOffset<KeyValue<'a>>>> {
        unsafe {
            self._tab
                .get::<ForwardsUOffset<Vector<'a, ForwardsUOffset<KeyValue>>>>(
                    Self::VT_CUSTOM_METADATA,
                    None,
                )
        }
    }

    pub fn header_as_schema(&self) -> Option<Schema<'a>> {
        match self.header_type() {
            MessageHeader::Schema => self.header().map(|_tab| Schema { _tab }),
            _ => None,
        }
    }

    pub fn header_as_record_batch(&self) -> Option<RecordBatch<'a>> {
        match self.header_type() {
            MessageHeader::RecordBatch => self.header().map(|_tab| RecordBatch { _tab }),
            _ => None,
        }
    }
}

impl Verifiable for Message<'_> {
    #[inline]
    fn run_verifier(v: &mut Verifier, pos: usize) -> Result<(), InvalidFlatbuffer> {
        v.visit_table(pos)?
            .visit_field::<MetadataVersion>("version", Self::VT_VERSION, false)?
            .visit_union::<MessageHeader, _>(
                "header_type",
                Self::VT_HEADER_TYPE,
                "header",
                Self::VT_HEADER,
                false,
                |key, v, pos| match key {
                    MessageHeader::Schema => v
                        .verify_union_variant::<ForwardsUOffset<Schema>>("MessageHeader::Schema", pos),
                    MessageHeader::RecordBatch => v.verify_union_variant::<ForwardsUOffset<RecordBatch>>(
                        "MessageHeader::RecordBatch",
                        pos,
                    ),
                    _ => Ok(()),
                },
            )?
            .visit_field::<i64>("bodyLength", Self::VT_BODYLENGTH, false)?
            .visit_field::<ForwardsUOffset<Vector<'_, ForwardsUOffset<KeyValue>>>>(
                "custom_metadata",
                Self::VT_CUSTOM_METADATA,
                false,
            )?
            .finish();
        Ok(())
    }
}

fb_table_builder!(
    /// Builder of [`Message`]
    MessageBuilder => Message
);

impl MessageBuilder<'_, '_> {
    #[inline]
    pub fn add_version(&mut self, version: MetadataVersion) {
        self.fbb_
            .push_slot::<MetadataVersion>(Message::VT_VERSION, version, MetadataVersion::V1);
    }

    #[inline]
    pub fn add_header_type(&mut self, header_type: MessageHeader) {
        self.fbb_
            .push_slot::<MessageHeader>(Message::VT_HEADER_TYPE, header_type, MessageHeader::NONE);
    }

    #[inline]
    pub fn add_header(&mut self, header: WIPOffset<UnionWIPOffset>) {
        self.fbb_
            .push_slot_always::<WIPOffset<_>>(Message::VT_HEADER, header);
    }

    #[inline]
    pub fn add_body_length(&mut self, body_length: i64) {
        self.fbb_
            .push_slot::<i64>(Message::VT_BODYLENGTH, body_length, 0);
    }
}

/// Verifies that `buf` holds a [`Message`] and returns it
pub fn root_as_message(buf: &[u8]) -> Result<Message<'_>, InvalidFlatbuffer> {
    flatbuffers::root::<Message>(buf)
}

/// Returns the [`Message`] at the root of `buf` without verification
///
/// # Safety
///
/// `buf` must hold a valid `Message`, for instance one already accepted by [`root_as_message`]
pub unsafe fn root_as_message_unchecked(buf: &[u8]) -> Message<'_> {
    flatbuffers::root_unchecked::<Message>(buf)
}

/// Finishes `fbb` with `root` as its root table
pub fn finish_message_buffer<'a>(fbb: &mut FlatBufferBuilder<'a>, root: WIPOffset<Message<'a>>) {
    fbb.finish(root, None);
}
