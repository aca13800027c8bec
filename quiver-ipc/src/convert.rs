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

//! Translation between [`Schema`]s and their flatbuffer tables

use std::collections::HashMap;

use flatbuffers::{FlatBufferBuilder, ForwardsUOffset, UnionWIPOffset, Vector, WIPOffset};
use quiver_buffer::Buffer;
use quiver_schema::{DataType, Field, QuiverError, Schema};

use crate::{empty_type_table, root_as_message, root_as_message_unchecked, CONTINUATION_MARKER};

type KeyValues<'a> = Vector<'a, ForwardsUOffset<crate::KeyValue<'a>>>;
type FieldTables<'a> = Vector<'a, ForwardsUOffset<crate::Field<'a>>>;

/// Encode `schema` as a finished, standalone `Schema` table
pub fn encode_schema(schema: &Schema) -> FlatBufferBuilder<'static> {
    let mut fbb = FlatBufferBuilder::new();
    let root = write_schema(&mut fbb, schema);
    fbb.finish(root, None);
    fbb
}

/// Write a `Schema` table for `schema` into `fbb`
pub fn write_schema<'a>(
    fbb: &mut FlatBufferBuilder<'a>,
    schema: &Schema,
) -> WIPOffset<crate::Schema<'a>> {
    let fields: Vec<_> = schema.fields().iter().map(|f| write_field(fbb, f)).collect();
    let fields = fbb.create_vector(&fields);
    let metadata = write_metadata(fbb, &schema.metadata);

    let mut table = crate::SchemaBuilder::new(fbb);
    table.add_endianness(crate::Endianness::Little);
    table.add_fields(fields);
    if let Some(metadata) = metadata {
        table.add_custom_metadata(metadata);
    }
    table.finish()
}

fn write_metadata<'a>(
    fbb: &mut FlatBufferBuilder<'a>,
    metadata: &HashMap<String, String>,
) -> Option<WIPOffset<KeyValues<'a>>> {
    if metadata.is_empty() {
        return None;
    }
    // key order makes the encoding deterministic
    let mut pairs: Vec<_> = metadata.iter().collect();
    pairs.sort();

    let tables: Vec<_> = pairs
        .into_iter()
        .map(|(key, value)| {
            let key = fbb.create_string(key);
            let value = fbb.create_string(value);
            let mut kv = crate::KeyValueBuilder::new(fbb);
            kv.add_key(key);
            kv.add_value(value);
            kv.finish()
        })
        .collect();
    Some(fbb.create_vector(&tables))
}

fn write_field<'a>(fbb: &mut FlatBufferBuilder<'a>, field: &Field) -> WIPOffset<crate::Field<'a>> {
    let metadata = write_metadata(fbb, field.metadata());
    let name = fbb.create_string(field.name());
    let (type_type, type_table) = write_type(fbb, field.data_type());

    let children: Vec<_> = match field.data_type() {
        DataType::List(item) => vec![write_field(fbb, item)],
        DataType::Struct(fields) => fields.iter().map(|f| write_field(fbb, f)).collect(),
        _ => vec![],
    };
    // an absent child list trips up some readers, so it is always written
    let children = fbb.create_vector(&children);

    let mut table = crate::FieldBuilder::new(fbb);
    table.add_name(name);
    table.add_nullable(field.is_nullable());
    table.add_type_type(type_type);
    table.add_type_(type_table);
    table.add_children(children);
    if let Some(metadata) = metadata {
        table.add_custom_metadata(metadata);
    }
    table.finish()
}

/// The union tag and type table describing `data_type`, excluding any children
fn write_type(
    fbb: &mut FlatBufferBuilder<'_>,
    data_type: &DataType,
) -> (crate::Type, WIPOffset<UnionWIPOffset>) {
    use DataType::*;
    match data_type {
        Int8 | Int16 | Int32 | Int64 | UInt8 | UInt16 | UInt32 | UInt64 => {
            let bits = data_type.primitive_width().unwrap_or_default() * 8;
            let mut int = crate::IntBuilder::new(fbb);
            int.add_bit_width(bits as i32);
            int.add_is_signed(matches!(data_type, Int8 | Int16 | Int32 | Int64));
            (crate::Type::Int, int.finish().as_union_value())
        }
        Float16 | Float32 | Float64 => {
            let precision = match data_type {
                Float16 => crate::Precision::HALF,
                Float32 => crate::Precision::SINGLE,
                _ => crate::Precision::DOUBLE,
            };
            let mut float = crate::FloatingPointBuilder::new(fbb);
            float.add_precision(precision);
            (crate::Type::FloatingPoint, float.finish().as_union_value())
        }
        Null => (crate::Type::Null, empty_type_table(fbb)),
        Boolean => (crate::Type::Bool, empty_type_table(fbb)),
        Utf8 => (crate::Type::Utf8, empty_type_table(fbb)),
        Binary => (crate::Type::Binary, empty_type_table(fbb)),
        List(_) => (crate::Type::List, empty_type_table(fbb)),
        Struct(_) => (crate::Type::Struct_, empty_type_table(fbb)),
    }
}

fn read_metadata(tables: Option<KeyValues<'_>>) -> HashMap<String, String> {
    tables
        .into_iter()
        .flatten()
        .filter_map(|kv| Some((kv.key()?.to_string(), kv.value()?.to_string())))
        .collect()
}

fn read_children(children: Option<FieldTables<'_>>) -> Result<Vec<Field>, QuiverError> {
    children.into_iter().flatten().map(read_field).collect()
}

fn read_field(table: crate::Field<'_>) -> Result<Field, QuiverError> {
    let name = table
        .name()
        .ok_or_else(|| QuiverError::Ipc("Field is missing a name".to_string()))?;
    let data_type = read_type(&table)?;
    Ok(Field::new(name, data_type, table.nullable())
        .with_metadata(read_metadata(table.custom_metadata())))
}

fn read_type(table: &crate::Field<'_>) -> Result<DataType, QuiverError> {
    if table.dictionary().is_some() {
        return Err(QuiverError::NotYetImplemented(
            "Dictionary encoded fields are not supported".to_string(),
        ));
    }
    let missing = |t: &str| QuiverError::Ipc(format!("Field is missing its {t} type table"));

    let data_type = match table.type_type() {
        crate::Type::Null => DataType::Null,
        crate::Type::Bool => DataType::Boolean,
        crate::Type::Utf8 => DataType::Utf8,
        crate::Type::Binary => DataType::Binary,
        crate::Type::Int => {
            let int = table.type_as_int().ok_or_else(|| missing("Int"))?;
            let signed = int.is_signed();
            match int.bit_width() {
                8 if signed => DataType::Int8,
                16 if signed => DataType::Int16,
                32 if signed => DataType::Int32,
                64 if signed => DataType::Int64,
                8 => DataType::UInt8,
                16 => DataType::UInt16,
                32 => DataType::UInt32,
                64 => DataType::UInt64,
                w => return Err(QuiverError::Ipc(format!("Unexpected bit width {w} for an integer"))),
            }
        }
        crate::Type::FloatingPoint => {
            let float = table
                .type_as_floating_point()
                .ok_or_else(|| missing("FloatingPoint"))?;
            match float.precision() {
                crate::Precision::HALF => DataType::Float16,
                crate::Precision::SINGLE => DataType::Float32,
                crate::Precision::DOUBLE => DataType::Float64,
                p => return Err(QuiverError::Ipc(format!("Unexpected precision {p:?}"))),
            }
        }
        crate::Type::List => match read_children(table.children())?.as_slice() {
            [item] => DataType::List(item.clone().into()),
            other => {
                return Err(QuiverError::Ipc(format!(
                    "List field must have exactly one child, found {}",
                    other.len()
                )))
            }
        },
        crate::Type::Struct_ => DataType::Struct(read_children(table.children())?.into()),
        t => return Err(QuiverError::Ipc(format!("Type {t:?} not supported"))),
    };
    Ok(data_type)
}

/// Decode a `Schema` table, rejecting big endian senders
pub fn decode_schema(table: crate::Schema<'_>) -> Result<Schema, QuiverError> {
    if table.endianness() == crate::Endianness::Big {
        return Err(QuiverError::NotYetImplemented(
            "Big endian streams are not supported".to_string(),
        ));
    }
    let fields = read_children(table.fields())?;
    Ok(Schema::new_with_metadata(fields, read_metadata(table.custom_metadata())))
}

/// Decode the schema carried by a serialized `Message`
pub fn schema_from_message_bytes(bytes: &[u8]) -> Result<Schema, QuiverError> {
    let message = root_as_message(bytes)
        .map_err(|e| QuiverError::Ipc(format!("Unable to get root as message: {e:?}")))?;
    let schema = message
        .header_as_schema()
        .ok_or_else(|| QuiverError::Ipc("Message header is not a Schema".to_string()))?;
    decode_schema(schema)
}

/// Decode the schema from a framed message, accepting both framing styles
pub fn schema_from_frame(frame: &[u8]) -> Result<Schema, QuiverError> {
    let read_i32 = |at: usize| {
        frame
            .get(at..at + 4)
            .map(|b| i32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .ok_or_else(|| QuiverError::IncompleteFrame(format!("frame of {} bytes has no length prefix", frame.len())))
    };
    let start = match frame.get(..4) == Some(CONTINUATION_MARKER.as_slice()) {
        true => 8,
        false => 4,
    };
    let len = read_i32(start - 4)?;
    let len = usize::try_from(len)
        .map_err(|_| QuiverError::Ipc(format!("Invalid message length {len}")))?;
    let body = frame.get(start..start + len).ok_or_else(|| {
        QuiverError::IncompleteFrame(format!(
            "frame declares {len} bytes of metadata but holds {}",
            frame.len() - start
        ))
    })?;
    schema_from_message_bytes(body)
}

/// An owned buffer holding a verified flatbuffer `Message`
///
/// Verification happens once in [`MessageBuffer::try_new`], later accesses are unchecked.
#[derive(Debug, Clone)]
pub struct MessageBuffer(Buffer);

impl MessageBuffer {
    /// Verify `buf` as a `Message`, failing with [`QuiverError::Ipc`] if it is malformed
    pub fn try_new(buf: Buffer) -> Result<Self, QuiverError> {
        root_as_message(&buf)
            .map_err(|e| QuiverError::Ipc(format!("Unable to get root as message: {e:?}")))?;
        Ok(Self(buf))
    }

    /// The verified message
    #[inline]
    pub fn message(&self) -> crate::Message<'_> {
        // SAFETY: verified in try_new
        unsafe { root_as_message_unchecked(&self.0) }
    }

    /// The message bytes
    pub fn into_inner(self) -> Buffer {
        self.0
    }
}
