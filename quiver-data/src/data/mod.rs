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

//! [`ArrayData`], the type-erased, immutable contents of one array

use quiver_buffer::bit_util;
use quiver_buffer::{BooleanBuffer, Buffer, MutableBuffer, NativeType, NullBuffer};
use quiver_schema::{DataType, QuiverError};

mod layout;
pub use layout::*;

mod types;
pub use types::*;

/// True if `nulls` has a null among the `len` slots starting at `offset`
#[inline]
pub(crate) fn contains_nulls(nulls: Option<&NullBuffer>, offset: usize, len: usize) -> bool {
    count_nulls(nulls, offset, len) != 0
}

/// Nulls of `nulls` among the `len` slots starting at `offset`
#[inline]
pub(crate) fn count_nulls(nulls: Option<&NullBuffer>, offset: usize, len: usize) -> usize {
    match nulls.filter(|n| n.null_count() != 0) {
        Some(n) => len - bit_util::count_set_bits_offset(n.validity(), n.offset() + offset, len),
        None => 0,
    }
}

fn mismatch(message: String) -> QuiverError {
    QuiverError::StructuralMismatch(message)
}

/// The buffers and children of one array, not tied to a concrete array type
///
/// Element `i` of the array lives at position `offset + i` of each buffer, while the
/// validity in [`ArrayData::nulls`] is already narrowed to the `len` elements.
/// Which buffers and children are present is fixed by the [`DataType`], see
/// [`layout`]. Slicing shares every buffer and child.
///
/// ```
/// # use quiver_data::ArrayData;
/// # use quiver_schema::DataType;
/// # use quiver_buffer::Buffer;
/// let data = ArrayData::builder(DataType::UInt16)
///     .len(4)
///     .add_buffer(Buffer::from_vec(vec![7_u16, 8, 9, 10]))
///     .build()
///     .unwrap();
///
/// let tail = data.slice(2, 2);
/// assert_eq!(tail.offset(), 2);
/// assert_eq!(tail.buffer::<u16>(0), &[9, 10]);
/// assert!(tail.buffers()[0].ptr_eq(&data.buffers()[0]));
/// ```
#[derive(Debug, Clone)]
pub struct ArrayData {
    data_type: DataType,
    len: usize,
    offset: usize,
    buffers: Vec<Buffer>,
    children: Vec<ArrayData>,
    /// `None` when every element is valid
    nulls: Option<NullBuffer>,
}

impl ArrayData {
    /// Start building an [`ArrayData`] of `data_type`
    #[inline]
    pub const fn builder(data_type: DataType) -> ArrayDataBuilder {
        ArrayDataBuilder::new(data_type)
    }

    #[inline]
    pub const fn data_type(&self) -> &DataType {
        &self.data_type
    }

    /// The type specific buffers, the validity is kept apart in [`Self::nulls`]
    pub fn buffers(&self) -> &[Buffer] {
        &self.buffers
    }

    /// Children of a list or struct
    ///
    /// A struct's children are not narrowed by [`Self::slice`], its element `i`
    /// is at `offset() + i` in each of them.
    pub fn child_data(&self) -> &[ArrayData] {
        &self.children
    }

    #[inline]
    pub fn is_null(&self, i: usize) -> bool {
        self.nulls.as_ref().is_some_and(|n| n.is_null(i))
    }

    #[inline]
    pub fn is_valid(&self, i: usize) -> bool {
        !self.is_null(i)
    }

    #[inline]
    pub fn nulls(&self) -> Option<&NullBuffer> {
        self.nulls.as_ref()
    }

    /// Number of elements
    #[inline]
    pub const fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Position of element 0 within the buffers
    #[inline]
    pub const fn offset(&self) -> usize {
        self.offset
    }

    #[inline]
    pub fn null_count(&self) -> usize {
        self.nulls.as_ref().map_or(0, NullBuffer::null_count)
    }

    /// The `length` elements starting at element `offset`, sharing all memory
    ///
    /// # Panics
    ///
    /// Panics if `offset + length > self.len()`
    pub fn slice(&self, offset: usize, length: usize) -> ArrayData {
        assert!(
            offset.saturating_add(length) <= self.len,
            "cannot slice {length} elements at offset {offset} from ArrayData of length {}",
            self.len
        );
        ArrayData {
            data_type: self.data_type.clone(),
            len: length,
            offset: self.offset + offset,
            buffers: self.buffers.clone(),
            children: self.children.clone(),
            nulls: self.nulls.as_ref().map(|n| n.slice(offset, length)),
        }
    }

    /// Buffer `buffer` viewed as `T`s, starting at element 0
    ///
    /// # Panics
    ///
    /// Panics if the buffer is not a whole number of aligned `T`s. Not meaningful for
    /// the bit-packed values of a boolean array.
    pub fn buffer<T: NativeType>(&self, buffer: usize) -> &[T] {
        &self.buffers[buffer].typed_data()[self.offset..]
    }

    /// Zero elements of `data_type`, with every buffer and child its layout needs
    pub fn new_empty(data_type: &DataType) -> Self {
        Self::new_null(data_type, 0)
    }

    /// `len` null elements of `data_type`
    ///
    /// Buffers are zeroed, offsets all zero. A struct gets `len` null elements in
    /// each child, a list an empty child.
    pub fn new_null(data_type: &DataType, len: usize) -> Self {
        let zeroed = |bytes: usize| -> Buffer { MutableBuffer::from_len_zeroed(bytes).into() };
        let offsets = || zeroed((len + 1) * std::mem::size_of::<i32>());

        let buffers = match PhysicalType::from(data_type) {
            PhysicalType::Null | PhysicalType::Struct => vec![],
            PhysicalType::Boolean => vec![zeroed(bit_util::ceil(len, 8))],
            PhysicalType::Primitive(p) => vec![zeroed(len * p.byte_width())],
            PhysicalType::Bytes(_) => vec![offsets(), zeroed(0)],
            PhysicalType::List => vec![offsets()],
        };
        let children = match data_type {
            DataType::List(item) => vec![Self::new_empty(item.data_type())],
            DataType::Struct(fields) => fields
                .iter()
                .map(|f| Self::new_null(f.data_type(), len))
                .collect(),
            _ => vec![],
        };
        let nulls = match data_type {
            DataType::Null => None,
            _ => Some(NullBuffer::new_null(len)).filter(|n| n.null_count() != 0),
        };
        Self {
            data_type: data_type.clone(),
            len,
            offset: 0,
            buffers,
            children,
            nulls,
        }
    }

    /// Check this data against the layout of its type, recursing into children
    ///
    /// Covers buffer count, size and alignment, the validity length, child count,
    /// type and length, offsets being in bounds and non-decreasing, and the UTF-8
    /// of string values.
    pub fn validate(&self) -> Result<(), QuiverError> {
        let end = self.len.checked_add(self.offset).ok_or_else(|| {
            mismatch(format!("length {} at offset {} overflows", self.len, self.offset))
        })?;
        let layout = layout(&self.data_type);

        if self.nulls.is_some() && !layout.can_contain_null_mask {
            return Err(mismatch(format!("{} arrays have no validity", self.data_type)));
        }
        if let Some(n) = self.nulls.as_ref().filter(|n| n.len() != self.len) {
            return Err(mismatch(format!(
                "validity covers {} elements, expected {}",
                n.len(),
                self.len
            )));
        }
        if self.buffers.len() != layout.buffers.len() {
            return Err(mismatch(format!(
                "{} arrays have {} buffers, got {}",
                self.data_type,
                layout.buffers.len(),
                self.buffers.len(),
            )));
        }
        let has_offsets = matches!(
            PhysicalType::from(&self.data_type),
            PhysicalType::Bytes(_) | PhysicalType::List
        );
        for (i, (buffer, spec)) in self.buffers.iter().zip(&layout.buffers).enumerate() {
            let needed = match *spec {
                BufferSpec::FixedWidth { byte_width, alignment } => {
                    if buffer.as_ptr().align_offset(alignment) != 0 {
                        return Err(QuiverError::AlignmentMismatch(format!(
                            "buffer {i} of a {} array is not aligned to {alignment} bytes",
                            self.data_type
                        )));
                    }
                    (end + has_offsets as usize).saturating_mul(byte_width)
                }
                BufferSpec::BitMap => bit_util::ceil(end, 8),
                // bounded by the offsets
                BufferSpec::VariableWidth => 0,
            };
            if buffer.len() < needed {
                return Err(mismatch(format!(
                    "buffer {i} of a {} array of {end} slots needs {needed} bytes, got {}",
                    self.data_type,
                    buffer.len()
                )));
            }
        }

        self.validate_children()?;

        match PhysicalType::from(&self.data_type) {
            PhysicalType::Bytes(kind) => {
                let values = self.buffers[1].as_slice();
                let offsets = self.offsets_within(values.len())?;
                if kind == BytesType::Utf8 {
                    self.validate_utf8(offsets, values)?;
                }
            }
            PhysicalType::List => {
                self.offsets_within(self.children[0].len())?;
            }
            _ => {}
        }
        Ok(())
    }

    /// The `len + 1` offsets of this array, checked to be non-decreasing and to
    /// stay within `0..=values`
    fn offsets_within(&self, values: usize) -> Result<&[i32], QuiverError> {
        let all = self.buffers[0].try_typed_data::<i32>()?;
        let offsets = &all[self.offset..=self.offset + self.len];
        if offsets[0] < 0 {
            return Err(mismatch(format!("first offset {} is negative", offsets[0])));
        }
        if let Some(i) = offsets.windows(2).position(|w| w[1] < w[0]) {
            return Err(mismatch(format!(
                "offsets decrease at element {i}: {} then {}",
                offsets[i],
                offsets[i + 1]
            )));
        }
        let last = offsets[self.len] as usize;
        if last > values {
            return Err(mismatch(format!(
                "last offset {last} of a {} array is past the {values} values",
                self.data_type
            )));
        }
        Ok(offsets)
    }

    fn validate_utf8(&self, offsets: &[i32], values: &[u8]) -> Result<(), QuiverError> {
        let spans = offsets.windows(2).map(|w| w[0] as usize..w[1] as usize);
        for (i, span) in spans.enumerate().filter(|(i, _)| self.is_valid(*i)) {
            if let Err(e) = std::str::from_utf8(&values[span]) {
                return Err(mismatch(format!("Invalid UTF8 sequence at string index {i}: {e}")));
            }
        }
        Ok(())
    }

    fn validate_children(&self) -> Result<(), QuiverError> {
        let expected: Vec<(&str, &DataType)> = match &self.data_type {
            DataType::List(item) => vec![(item.name().as_str(), item.data_type())],
            DataType::Struct(fields) => fields.iter().map(|f| (f.name().as_str(), f.data_type())).collect(),
            _ => vec![],
        };
        if self.children.len() != expected.len() {
            return Err(mismatch(format!(
                "{} arrays have {} children, got {}",
                self.data_type,
                expected.len(),
                self.children.len()
            )));
        }
        let is_struct = matches!(self.data_type, DataType::Struct(_));
        for (child, (name, data_type)) in self.children.iter().zip(expected) {
            if child.data_type() != data_type {
                return Err(mismatch(format!(
                    "child {name:?} has type {}, expected {data_type}",
                    child.data_type()
                )));
            }
            if is_struct && child.len() < self.offset + self.len {
                return Err(mismatch(format!(
                    "struct child {name:?} has {} elements, needs at least {}",
                    child.len(),
                    self.offset + self.len
                )));
            }
            child.validate()?;
        }
        Ok(())
    }

    /// True if both describe the same elements of the same memory
    pub fn ptr_eq(&self, other: &Self) -> bool {
        let nulls_eq = match (&self.nulls, &other.nulls) {
            (Some(a), Some(b)) => a.inner().ptr_eq(b.inner()),
            (None, None) => true,
            _ => false,
        };
        (self.offset, self.len) == (other.offset, other.len)
            && self.data_type == other.data_type
            && nulls_eq
            && self.buffers.len() == other.buffers.len()
            && self.buffers.iter().zip(&other.buffers).all(|(a, b)| a.ptr_eq(b))
            && self.children.len() == other.children.len()
            && self.children.iter().zip(&other.children).all(|(a, b)| a.ptr_eq(b))
    }

    /// A builder primed with the contents of `self`
    pub fn into_builder(self) -> ArrayDataBuilder {
        self.into()
    }
}

impl PartialEq for ArrayData {
    fn eq(&self, other: &Self) -> bool {
        crate::equal::equal(self, other)
    }
}

/// How the validity of a builder was supplied
#[derive(Debug)]
enum Validity {
    AllValid,
    /// Already narrowed to the elements
    Nulls(NullBuffer),
    /// Covers `offset + len` bits, with an optional precomputed null count
    Bitmap(Buffer, Option<usize>),
}

/// Assembles an [`ArrayData`]
#[derive(Debug)]
pub struct ArrayDataBuilder {
    data_type: DataType,
    len: usize,
    offset: usize,
    buffers: Vec<Buffer>,
    children: Vec<ArrayData>,
    validity: Validity,
}

impl ArrayDataBuilder {
    /// An empty builder for `data_type`
    #[inline]
    pub const fn new(data_type: DataType) -> Self {
        Self {
            data_type,
            len: 0,
            offset: 0,
            buffers: vec![],
            children: vec![],
            validity: Validity::AllValid,
        }
    }

    /// Replace the data type
    pub fn data_type(self, data_type: DataType) -> Self {
        Self { data_type, ..self }
    }

    /// Number of elements
    #[inline]
    #[allow(clippy::len_without_is_empty)]
    pub const fn len(mut self, n: usize) -> Self {
        self.len = n;
        self
    }

    /// Validity already narrowed to the `len` elements
    pub fn nulls(mut self, nulls: Option<NullBuffer>) -> Self {
        self.validity = nulls.map_or(Validity::AllValid, Validity::Nulls);
        self
    }

    /// Precomputed null count of the bitmap from [`Self::null_bit_buffer`], only
    /// trusted by [`Self::build_unchecked`]
    pub fn null_count(mut self, null_count: usize) -> Self {
        if let Validity::Bitmap(_, count) = &mut self.validity {
            *count = Some(null_count);
        }
        self
    }

    /// Validity as a bitmap whose bit `offset + i` belongs to element `i`
    pub fn null_bit_buffer(mut self, bits: Option<Buffer>) -> Self {
        self.validity = bits.map_or(Validity::AllValid, |b| Validity::Bitmap(b, None));
        self
    }

    /// Position of element 0 within the buffers
    #[inline]
    pub const fn offset(mut self, n: usize) -> Self {
        self.offset = n;
        self
    }

    /// Replace all buffers
    pub fn buffers(mut self, v: Vec<Buffer>) -> Self {
        self.buffers = v;
        self
    }

    /// Append one buffer
    pub fn add_buffer(mut self, b: Buffer) -> Self {
        self.buffers.push(b);
        self
    }

    /// Replace all children
    pub fn child_data(mut self, v: Vec<ArrayData>) -> Self {
        self.children = v;
        self
    }

    /// Append one child
    pub fn add_child_data(mut self, r: ArrayData) -> Self {
        self.children.push(r);
        self
    }

    /// Resolve the validity, dropping it when it has no nulls
    fn resolve_nulls(&mut self, trusted: bool) -> Result<Option<NullBuffer>, QuiverError> {
        let nulls = match std::mem::replace(&mut self.validity, Validity::AllValid) {
            Validity::AllValid => None,
            Validity::Nulls(nulls) => Some(nulls),
            Validity::Bitmap(bits, count) => {
                let needed = bit_util::ceil(self.offset.saturating_add(self.len), 8);
                if !trusted && bits.len() < needed {
                    return Err(mismatch(format!(
                        "validity bitmap of {} bytes is shorter than the {needed} needed",
                        bits.len()
                    )));
                }
                let bits = BooleanBuffer::new(bits, self.offset, self.len);
                Some(match count.filter(|_| trusted) {
                    // SAFETY: the caller of build_unchecked vouches for the count
                    Some(count) => unsafe { NullBuffer::new_unchecked(bits, count) },
                    None => NullBuffer::new(bits),
                })
            }
        };
        Ok(nulls.filter(|n| n.null_count() != 0))
    }

    fn assemble(self, nulls: Option<NullBuffer>) -> ArrayData {
        ArrayData {
            data_type: self.data_type,
            len: self.len,
            offset: self.offset,
            buffers: self.buffers,
            children: self.children,
            nulls,
        }
    }

    /// Build without validating
    ///
    /// # Safety
    ///
    /// The result must pass [`ArrayData::validate`]. A null count given with
    /// [`Self::null_count`] must be exact.
    pub unsafe fn build_unchecked(mut self) -> ArrayData {
        // trusted resolution does no checks that could fail
        let nulls = self.resolve_nulls(true).unwrap_or_default();
        self.assemble(nulls)
    }

    /// Build, checking the result with [`ArrayData::validate`]
    pub fn build(mut self) -> Result<ArrayData, QuiverError> {
        let nulls = self.resolve_nulls(false)?;
        let data = self.assemble(nulls);
        data.validate()?;
        Ok(data)
    }
}

impl From<ArrayData> for ArrayDataBuilder {
    fn from(data: ArrayData) -> Self {
        Self {
            data_type: data.data_type,
            len: data.len,
            offset: data.offset,
            buffers: data.buffers,
            children: data.children,
            validity: data.nulls.map_or(Validity::AllValid, Validity::Nulls),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiver_schema::{Field, Fields};

    fn ints(values: Vec<i32>) -> ArrayData {
        ArrayData::builder(DataType::Int32)
            .len(values.len())
            .add_buffer(Buffer::from_vec(values))
            .build()
            .unwrap()
    }

    fn utf8(offsets: Vec<i32>, values: &[u8]) -> Result<ArrayData, QuiverError> {
        ArrayData::builder(DataType::Utf8)
            .len(offsets.len().saturating_sub(1))
            .add_buffer(Buffer::from_vec(offsets))
            .add_buffer(Buffer::from_slice_ref(values))
            .build()
    }

    fn message(result: Result<ArrayData, QuiverError>) -> String {
        let err = result.unwrap_err();
        assert!(
            matches!(err, QuiverError::StructuralMismatch(_)),
            "unexpected {err:?}"
        );
        err.to_string()
    }

    #[test]
    fn test_offset_and_bitmap() {
        let values: Vec<i64> = (100..130).collect();
        // bits 3.. belong to the elements, one null in four
        let bits: Vec<bool> = (0..30).map(|i| i < 3 || (i - 3) % 4 != 0).collect();
        let data = ArrayData::builder(DataType::Int64)
            .len(27)
            .offset(3)
            .add_buffer(Buffer::from_vec(values.clone()))
            .null_bit_buffer(Some(BooleanBuffer::from(bits).into_inner()))
            .build()
            .unwrap();

        assert_eq!(data.len(), 27);
        assert_eq!(data.null_count(), 7);
        assert!(data.is_null(0));
        assert!(data.is_valid(1));
        assert_eq!(data.buffer::<i64>(0), &values[3..]);
        assert!(data.child_data().is_empty());
    }

    #[test]
    fn test_nested_slices() {
        let validity = NullBuffer::from((0..16).map(|i| i % 5 != 2).collect::<Vec<_>>());
        let data = ArrayData::builder(DataType::UInt8)
            .len(16)
            .add_buffer(Buffer::from_vec((0..16_u8).collect::<Vec<_>>()))
            .nulls(Some(validity))
            .build()
            .unwrap();
        assert_eq!(data.null_count(), 3);

        let once = data.slice(3, 12);
        assert_eq!((once.offset(), once.null_count()), (3, 2));
        assert!(once.is_null(4));
        let twice = once.slice(5, 7);
        assert_eq!((twice.offset(), twice.len(), twice.null_count()), (8, 7, 1));
        assert_eq!(twice.buffer::<u8>(0)[0], 8);
        assert!(twice.buffers()[0].ptr_eq(&data.buffers()[0]));
    }

    #[test]
    #[should_panic(expected = "cannot slice 2 elements at offset 2 from ArrayData of length 3")]
    fn test_slice_past_end() {
        ints(vec![1, 2, 3]).slice(2, 2);
    }

    #[test]
    fn test_equality_is_logical() {
        let window = ints(vec![9, 4, 5, 9]).slice(1, 2);
        assert_eq!(window, ints(vec![4, 5]));
        assert_ne!(window, ints(vec![4, 6]));
        assert_ne!(window, ints(vec![4, 5, 9]));
    }

    #[test]
    fn test_buffer_shape_errors() {
        let short = ArrayData::builder(DataType::Float64)
            .len(4)
            .add_buffer(Buffer::from_vec(vec![1.0_f64, 2.0, 3.0]))
            .build();
        assert_eq!(
            message(short),
            "Structural mismatch: buffer 0 of a Float64 array of 4 slots needs 32 bytes, got 24"
        );

        let missing = ArrayData::builder(DataType::Binary)
            .len(1)
            .add_buffer(Buffer::from_vec(vec![0_i32, 1]))
            .build();
        assert!(message(missing).contains("Binary arrays have 2 buffers, got 1"));

        let bitmap = ArrayData::builder(DataType::Int32)
            .len(16)
            .add_buffer(Buffer::from_vec(vec![0_i32; 16]))
            .null_bit_buffer(Some(Buffer::from(&[0_u8][..])))
            .build();
        assert!(message(bitmap).contains("shorter than the 2 needed"));

        let null_with_validity = ArrayData::builder(DataType::Null)
            .len(2)
            .nulls(Some(NullBuffer::new_null(2)))
            .build();
        assert!(message(null_with_validity).contains("Null arrays have no validity"));
    }

    #[test]
    fn test_offset_errors() {
        assert!(message(utf8(vec![0, 3, 2], b"abc")).contains("offsets decrease at element 1: 3 then 2"));
        assert!(message(utf8(vec![-1, 2], b"abc")).contains("first offset -1 is negative"));
        assert!(message(utf8(vec![0, 4], b"abc")).contains("last offset 4 of a Utf8 array is past the 3 values"));
        assert!(message(utf8(vec![0, 2], &[0xc3, 0x28])).contains("Invalid UTF8 sequence at string index 0"));
        assert_eq!(utf8(vec![0, 1, 3], b"abc").unwrap().len(), 2);
    }

    #[test]
    fn test_invalid_utf8_under_null_is_accepted() {
        let data = ArrayData::builder(DataType::Utf8)
            .len(2)
            .add_buffer(Buffer::from_vec(vec![0_i32, 2, 3]))
            .add_buffer(Buffer::from_slice_ref([0xc3_u8, 0x28, b'a']))
            .nulls(Some(NullBuffer::from(vec![false, true])))
            .build()
            .unwrap();
        assert_eq!(data.null_count(), 1);
    }

    #[test]
    fn test_list_children() {
        let list = DataType::new_list(DataType::Int32, true);
        let childless = ArrayData::builder(list.clone())
            .len(1)
            .add_buffer(Buffer::from_vec(vec![0_i32, 2]))
            .build();
        assert!(message(childless).contains("arrays have 1 children, got 0"));

        let mistyped = ArrayData::builder(list.clone())
            .add_buffer(Buffer::from_vec(vec![0_i32]))
            .add_child_data(ArrayData::new_empty(&DataType::Int64))
            .build();
        assert!(message(mistyped).contains("child \"item\" has type Int64, expected Int32"));

        let overrun = ArrayData::builder(list.clone())
            .len(1)
            .add_buffer(Buffer::from_vec(vec![0_i32, 4]))
            .add_child_data(ints(vec![1, 2, 3]))
            .build();
        assert!(message(overrun).contains("past the 3 values"));

        let data = ArrayData::builder(list)
            .len(2)
            .add_buffer(Buffer::from_vec(vec![0_i32, 1, 3]))
            .add_child_data(ints(vec![1, 2, 3]))
            .build()
            .unwrap();
        assert_eq!(data.child_data()[0].len(), 3);
    }

    #[test]
    fn test_struct_child_too_short() {
        let fields = Fields::from(vec![
            Field::new("lat", DataType::Int32, true),
            Field::new("lon", DataType::Int32, true),
        ]);
        let short = ArrayData::builder(DataType::Struct(fields))
            .len(2)
            .offset(1)
            .child_data(vec![ints(vec![1, 2, 3]), ints(vec![1, 2])])
            .build();
        assert!(message(short).contains("struct child \"lon\" has 2 elements, needs at least 3"));
    }

    #[test]
    fn test_alignment() {
        let shifted = Buffer::from_vec(vec![0_i64, 1, 2]).slice(4);
        let as_i32 = ArrayData::builder(DataType::Int32)
            .len(2)
            .add_buffer(shifted.clone())
            .build();
        assert!(as_i32.is_ok());

        let err = ArrayData::builder(DataType::Int64)
            .len(2)
            .add_buffer(shifted)
            .build()
            .unwrap_err();
        assert!(matches!(err, QuiverError::AlignmentMismatch(_)), "{err}");
    }

    #[test]
    fn test_validity_without_nulls_is_dropped() {
        let from_bits = ArrayData::builder(DataType::Int32)
            .len(3)
            .add_buffer(Buffer::from_vec(vec![1_i32, 2, 3]))
            .null_bit_buffer(Some(Buffer::from(&[0b111_u8][..])))
            .build()
            .unwrap();
        assert!(from_bits.nulls().is_none());

        let from_nulls = from_bits
            .into_builder()
            .nulls(Some(NullBuffer::new_valid(3)))
            .build()
            .unwrap();
        assert_eq!(from_nulls.null_count(), 0);
        assert!(from_nulls.nulls().is_none());
    }

    #[test]
    fn test_trusted_null_count() {
        let builder = ArrayData::builder(DataType::Int32)
            .len(4)
            .add_buffer(Buffer::from_vec(vec![0_i32; 4]))
            .null_bit_buffer(Some(Buffer::from(&[0b0101_u8][..])))
            .null_count(2);
        let data = unsafe { builder.build_unchecked() };
        assert_eq!(data.null_count(), 2);
        assert!(data.is_null(1));
    }

    #[test]
    fn test_new_empty_and_null() {
        let list = DataType::new_list(DataType::Utf8, true);
        let empty = ArrayData::new_empty(&list);
        empty.validate().unwrap();
        assert_eq!(empty.buffer::<i32>(0), &[0]);
        assert!(empty.nulls().is_none());

        let record = DataType::Struct(Fields::from(vec![
            Field::new("ok", DataType::Boolean, true),
            Field::new("tags", list, true),
        ]));
        let nulls = ArrayData::new_null(&record, 5);
        nulls.validate().unwrap();
        assert_eq!(nulls.null_count(), 5);
        assert_eq!(nulls.child_data()[1].null_count(), 5);
        assert_eq!(nulls.child_data()[1].buffer::<i32>(0), &[0; 6]);

        let null = ArrayData::new_null(&DataType::Null, 3);
        null.validate().unwrap();
        assert!(null.nulls().is_none());
        assert_eq!(null.len(), 3);
    }

    #[test]
    fn test_ptr_eq() {
        let data = ints(vec![1, 2, 3]);
        assert!(data.ptr_eq(&data.clone()));
        assert!(!data.ptr_eq(&ints(vec![1, 2, 3])));
        assert!(!data.ptr_eq(&data.slice(1, 2)));
        assert!(data.slice(1, 2).ptr_eq(&data.slice(1, 2)));
        let rebuilt = data.clone().into_builder().build().unwrap();
        assert!(data.ptr_eq(&rebuilt));
    }
}
