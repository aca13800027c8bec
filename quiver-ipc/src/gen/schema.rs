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

//! Bindings for the tables of `Schema.fbs`

use flatbuffers::{
    FlatBufferBuilder, ForwardsUOffset, InvalidFlatbuffer, Table, UnionWIPOffset, VOffsetT,
    Vector, Verifiable, Verifier, WIPOffset,
};

use super::{fb_enum, fb_table, fb_table_builder};

fb_enum! {
    /// Version of the columnar format metadata
    MetadataVersion: i16 {
        /// 0.1.0 (October 2016)
        V1 = 0,
        /// 0.2.0 (February 2017), not backwards compatible with V1
        V2 = 1,
        /// 0.3.0 to 0.7.1 (May to December 2017)
        V3 = 2,
        /// >= 0.8.0 (December 2017)
        V4 = 3,
        /// >= 1.0.0 (July 2020), adds the continuation marker by default
        V5 = 4,
    }
}

fb_enum! {
    /// Tag of the `Type` union
    Type: u8 {
        NONE = 0,
        Null = 1,
        Int = 2,
        FloatingPoint = 3,
        Binary = 4,
        Utf8 = 5,
        Bool = 6,
        Decimal = 7,
        Date = 8,
        Time = 9,
        Timestamp = 10,
        Interval = 11,
        List = 12,
        Struct_ = 13,
        Union = 14,
        FixedSizeBinary = 15,
        FixedSizeList = 16,
        Map = 17,
        Duration = 18,
        LargeBinary = 19,
        LargeUtf8 = 20,
        LargeList = 21,
        RunEndEncoded = 22,
        BinaryView = 23,
        Utf8View = 24,
        ListView = 25,
        LargeListView = 26,
    }
}

fb_enum! {
    /// Width of a floating point type
    Precision: i16 {
        HALF = 0,
        SINGLE = 1,
        DOUBLE = 2,
    }
}

fb_enum! {
    /// Byte order of the sender
    Endianness: i16 {
        Little = 0,
        Big = 1,
    }
}

/// Writes one of the parameterless type tables (`Null`, `Bool`, `Utf8`, ...)
pub fn empty_type_table(fbb: &mut FlatBufferBuilder) -> WIPOffset<UnionWIPOffset> {
    let start = fbb.start_table();
    fbb.end_table(start).as_union_value()
}

fb_table!(
    /// An integer type of a given width and signedness
    Int
);

impl<'a> Int<'a> {
    pub const VT_BITWIDTH: VOffsetT = 4;
    pub const VT_IS_SIGNED: VOffsetT = 6;

    pub fn bit_width(&self) -> i32 {
        unsafe { self._tab.get::<i32>(Self::VT_BITWIDTH, Some(0)).unwrap_or(0) }
    }

    pub fn is_signed(&self) -> bool {
        unsafe {
            self._tab
                .get::<bool>(Self::VT_IS_SIGNED, Some(false))
                .unwrap_or(false)
        }
    }
}

impl Verifiable for Int<'_> {
    #[inline]
    fn run_verifier(v: &mut Verifier, pos: usize) -> Result<(), InvalidFlatbuffer> {
        v.visit_table(pos)?
            .visit_field::<i32>("bitWidth", Self::VT_BITWIDTH, false)?
            .visit_field::<bool>("is_signed", Self::VT_IS_SIGNED, false)?
            .finish();
        Ok(())
    }
}

fb_table_builder!(
    /// Builder of [`Int`]
    IntBuilder => Int
);

impl IntBuilder<'_, '_> {
    #[inline]
    pub fn add_bit_width(&mut self, bit_width: i32) {
        self.fbb_.push_slot::<i32>(Int::VT_BITWIDTH, bit_width, 0);
    }

    #[inline]
    pub fn add_is_signed(&mut self, is_signed: bool) {
        self.fbb_.push_slot::<bool>(Int::VT_IS_SIGNED, is_signed, false);
    }
}

fb_table!(
    /// A floating point type
    FloatingPoint
);

impl<'a> FloatingPoint<'a> {
    pub const VT_PRECISION: VOffsetT = 4;

    pub fn precision(&self) -> Precision {
        unsafe {
            self._tab
                .get::<Precision>(Self::VT_PRECISION, Some(Precision::HALF))
                .unwrap_or(Precision::HALF)
        }
    }
}

impl Verifiable for FloatingPoint<'_> {
    #[inline]
    fn run_verifier(v: &mut Verifier, pos: usize) -> Result<(), InvalidFlatbuffer> {
        v.visit_table(pos)?
            .visit_field::<Precision>("precision", Self::VT_PRECISION, false)?
            .finish();
        Ok(())
    }
}

fb_table_builder!(
    /// Builder of [`FloatingPoint`]
    FloatingPointBuilder => FloatingPoint
);

impl FloatingPointBuilder<'_, '_> {
    #[inline]
    pub fn add_precision(&mut self, precision: Precision) {
        self.fbb_
            .push_slot::<Precision>(FloatingPoint::VT_PRECISION, precision, Precision::HALF);
    }
}

fb_table!(
    /// User defined key value pairs attached to a field, schema or message
    KeyValue
);

impl<'a> KeyValue<'a> {
    pub const VT_KEY: VOffsetT = 4;
    pub const VT_VALUE: VOffsetT = 6;

    pub fn key(&self) -> Option<&'a str> {
        unsafe { self._tab.get::<ForwardsUOffset<&str>>(Self::VT_KEY, None) }
    }

    pub fn value(&self) -> Option<&'a str> {
        unsafe { self._tab.get::<ForwardsUOffset<&str>>(Self::VT_VALUE, None) }
    }
}

impl Verifiable for KeyValue<'_> {
    #[inline]
    fn run_verifier(v: &mut Verifier, pos: usize) -> Result<(), InvalidFlatbuffer> {
        v.visit_table(pos)?
            .visit_field::<ForwardsUOffset<&str>>("key", Self::VT_KEY, false)?
            .visit_field::<ForwardsUOffset<&str>>("value", Self::VT_VALUE, false)?
            .finish();
        Ok(())
    }
}

fb_table_builder!(
    /// Builder of [`KeyValue`]
    KeyValueBuilder => KeyValue
);

impl<'a> KeyValueBuilder<'a, '_> {
    #[inline]
    pub fn add_key(&mut self, key: WIPOffset<&'a str>) {
        self.fbb_.push_slot_always::<WIPOffset<_>>(KeyValue::VT_KEY, key);
    }

    #[inline]
    pub fn add_value(&mut self, value: WIPOffset<&'a str>) {
        self.fbb_.push_slot_always::<WIPOffset<_>>(KeyValue::VT_VALUE, value);
    }
}

fb_table!(
    /// Dictionary encoding of a field
    ///
    /// Only bound far enough to detect that a field is dictionary encoded
    DictionaryEncoding
);

impl<'a> DictionaryEncoding<'a> {
    pub const VT_ID: VOffsetT = 4;

    pub fn id(&self) -> i64 {
        unsafe { self._tab.get::<i64>(Self::VT_ID, Some(0)).unwrap_or(0) }
    }
}

impl Verifiable for DictionaryEncoding<'_> {
    #[inline]
    fn run_verifier(v: &mut Verifier, pos: usize) -> Result<(), InvalidFlatbuffer> {
        v.visit_table(pos)?
            .visit_field::<i64>("id", Self::VT_ID, false)?
            .finish();
        Ok(())
    }
}

fb_table!(
    /// A named, typed column of a [`Schema`], possibly with children
    Field
);

impl<'a> Field<'a> {
    pub const VT_NAME: VOffsetT = 4;
    pub const VT_NULLABLE: VOffsetT = 6;
    pub const VT_TYPE_TYPE: VOffsetT = 8;
    pub const VT_TYPE_: VOffsetT = 10;
    pub const VT_DICTIONARY: VOffsetT = 12;
    pub const VT_CHILDREN: VOffsetT = 14;
    pub const VT_CUSTOM_METADATA: VOffsetT = 16;

    pub fn name(&self) -> Option<&'a str> {
        unsafe { self._tab.get::<ForwardsUOffset<&str>>(Self::VT_NAME, None) }
    }

    pub fn nullable(&self) -> bool {
        unsafe {
            self._tab
                .get::<bool>(Self::VT_NULLABLE, Some(false))
                .unwrap_or(false)
        }
    }

    pub fn type_type(&self) -> Type {
        unsafe {
            self._tab
                .get::<Type>(Self::VT_TYPE_TYPE, Some(Type::NONE))
                .unwrap_or(Type::NONE)
        }
    }

    pub fn type_(&self) -> Option<Table<'a>> {
        unsafe { self._tab.get::<ForwardsUOffset<Table<'a>>>(Self::VT_TYPE_, None) }
    }

    pub fn type_as_int(&self) -> Option<Int<'a>> {
        match self.type_type() {
            Type::Int => self.type_().map(|_tab| Int { _tab }),
            _ => None,
        }
    }

    pub fn type_as_floating_point(&self) -> Option<FloatingPoint<'a>> {
        match self.type_type() {
            Type::FloatingPoint => self.type_().map(|_tab| FloatingPoint { _tab }),
            _ => None,
        }
    }

    pub fn dictionary(&self) -> Option<DictionaryEncoding<'a>> {
        unsafe {
            self._tab
                .get::<ForwardsUOffset<DictionaryEncoding>>(Self::VT_DICTIONARY, None)
        }
    }

    pub fn children(&self) -> Option<Vector<'a, ForwardsUOffset<Field<'a>>>> {
        unsafe {
            self._tab
                .get::<ForwardsUOffset<Vector<'a, ForwardsUOffset<Field>>>>(Self::VT_CHILDREN, None)
        }
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
}

impl Verifiable for Field<'_> {
    #[inline]
    fn run_verifier(v: &mut Verifier, pos: usize) -> Result<(), InvalidFlatbuffer> {
        v.visit_table(pos)?
            .visit_field::<ForwardsUOffset<&str>>("name", Self::VT_NAME, false)?
            .visit_field::<bool>("nullable", Self::VT_NULLABLE, false)?
            .visit_union::<Type, _>(
                "type_type",
                Self::VT_TYPE_TYPE,
                "type_",
                Self::VT_TYPE_,
                false,
                |key, v, pos| match key {
                    Type::Int => v.verify_union_variant::<ForwardsUOffset<Int>>("Type::Int", pos),
                    Type::FloatingPoint => v.verify_union_variant::<ForwardsUOffset<FloatingPoint>>(
                        "Type::FloatingPoint",
                        pos,
                    ),
                    // the remaining supported types carry no parameters
                    _ => Ok(()),
                },
            )?
            .visit_field::<ForwardsUOffset<DictionaryEncoding>>(
                "dictionary",
                Self::VT_DICTIONARY,
                false,
            )?
            .visit_field::<ForwardsUOffset<Vector<'_, ForwardsUOffset<Field>>>>(
                "children",
                Self::VT_CHILDREN,
                false,
            )?
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
    /// Builder of [`Field`]
    FieldBuilder => Field
);

impl<'a> FieldBuilder<'a, '_> {
    #[inline]
    pub fn add_name(&mut self, name: WIPOffset<&'a str>) {
        self.fbb_.push_slot_always::<WIPOffset<_>>(Field::VT_NAME, name);
    }

    #[inline]
    pub fn add_nullable(&mut self, nullable: bool) {
        self.fbb_.push_slot::<bool>(Field::VT_NULLABLE, nullable, false);
    }

    #[inline]
    pub fn add_type_type(&mut self, type_type: Type) {
        self.fbb_
            .push_slot::<Type>(Field::VT_TYPE_TYPE, type_type, Type::NONE);
    }

    #[inline]
    pub fn add_type_(&mut self, type_: WIPOffset<UnionWIPOffset>) {
        self.fbb_.push_slot_always::<WIPOffset<_>>(Field::VT_TYPE_, type_);
    }

    #[inline]
    pub fn add_children(&mut self, children: WIPOffset<Vector<'a, ForwardsUOffset<Field<'a>>>>) {
        self.fbb_
            .push_slot_always::<WIPOffset<_>>(Field::VT_CHILDREN, children);
    }

    #[inline]
    pub fn add_custom_metadata(
        &mut self,
        custom_metadata: WIPOffset<Vector<'a, ForwardsUOffset<KeyValue<'a>>>>,
    ) {
        self.fbb_
            .push_slot_always::<WIPOffset<_>>(Field::VT_CUSTOM_METADATA, custom_metadata);
    }
}

fb_table!(
    /// The list of fields of a stream, sent once before any record batch
    Schema
);

impl<'a> Schema<'a> {
    pub const VT_ENDIANNESS: VOffsetT = 4;
    pub const VT_FIELDS: VOffsetT = 6;
    pub const VT_CUSTOM_METADATA: VOffsetT = 8;
    pub const VT_FEATURES: VOffsetT = 10;

    pub fn endianness(&self) -> Endianness {
        unsafe {
            self._tab
                .get::<Endianness>(Self::VT_ENDIANNESS, Some(Endianness::Little))
                .unwrap_or(Endianness::Little)
        }
    }

    pub fn fields(&self) -> Option<Vector<'a, ForwardsUOffset<Field<'a>>>> {
        unsafe {
            self._tab
                .get::<ForwardsUOffset<Vector<'a, ForwardsUOffset<Field>>>>(Self::VT_FIELDS, None)
        }
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

    pub fn features(&self) -> Option<Vector<'a, i64>> {
        unsafe {
            self._tab
                .get::<ForwardsUOffset<Vector<'a, i64>>>(Self::VT_FEATURES, None)
        }
    }
}

impl Verifiable for Schema<'_> {
    #[inline]
    fn run_verifier(v: &mut Verifier, pos: usize) -> Result<(), InvalidFlatbuffer> {
        v.visit_table(pos)?
            .visit_field::<Endianness>("endianness", Self::VT_ENDIANNESS, false)?
            .visit_field::<ForwardsUOffset<Vector<'_, ForwardsUOffset<Field>>>>(
                "fields",
                Self::VT_FIELDS,
                false,
            )?
            .visit_field::<ForwardsUOffset<Vector<'_, ForwardsUOffset<KeyValue>>>>(
                "custom_metadata",
                Self::VT_CUSTOM_METADATA,
                false,
            )?
            .visit_field::<ForwardsUOffset<Vector<'_, i64>>>("features", Self::VT_FEATURES, false)?
            .finish();
        Ok(())
    }
}

fb_table_builder!(
    /// Builder of [`Schema`]
    SchemaBuilder => Schema
);

impl<'a> SchemaBuilder<'a, '_> {
    #[inline]
    pub fn add_endianness(&mut self, endianness: Endianness) {
        self.fbb_
            .push_slot::<Endianness>(Schema::VT_ENDIANNESS, endianness, Endianness::Little);
    }

    #[inline]
    pub fn add_fields(&mut self, fields: WIPOffset<Vector<'a, ForwardsUOffset<Field<'a>>>>) {
        self.fbb_.push_slot_always::<WIPOffset<_>>(Schema::VT_FIELDS, fields);
    }

    #[inline]
    pub fn add_custom_metadata(
        &mut self,
        custom_metadata: WIPOffset<Vector<'a, ForwardsUOffset<KeyValue<'a>>>>,
    ) {
        self.fbb_
            .push_slot_always::<WIPOffset<_>>(Schema::VT_CUSTOM_METADATA, custom_metadata);
    }
}
