use bytes::Bytes;
use zerocopy::byteorder::{LittleEndian, U64};

use crate::translator::attribute_translator;
use crate::util::{read_variable_value_length, read_variable_value_length_reverse};
use crate::{Error, Result, ValueType, cold_path};

const NONE_SLICE: [u8; 1] = [0x00];

/// Borrowed view of one encoded value, starting at its head byte.
///
/// A slice does not own its storage and never copies; navigation hands out
/// further slices into the same bytes. The underlying slice may extend past
/// the value, [`byte_size`] bounds it.
///
/// [`byte_size`]: Slice::byte_size
#[derive(Clone, Copy, Debug)]
pub struct Slice<'a> {
    data: &'a [u8],
}

impl<'a> Slice<'a> {
    #[inline]
    pub fn new(data: &'a [u8]) -> Slice<'a> {
        Slice { data }
    }

    /// The slice of type `None`, used where no value exists.
    #[inline]
    pub const fn none() -> Slice<'static> {
        Slice { data: &NONE_SLICE }
    }

    /// The raw bytes from the head byte to the end of the backing storage.
    #[inline]
    pub fn start(&self) -> &'a [u8] {
        self.data
    }

    #[inline]
    pub fn head(&self) -> u8 {
        self.data.first().copied().unwrap_or(0)
    }

    #[inline]
    pub fn value_type(&self) -> ValueType {
        ValueType::from_head(self.head())
    }

    /// The bytes of just this value.
    pub fn to_vec(&self) -> Result<Vec<u8>> {
        let len = self.byte_size()?;
        Ok(self.data[..len].to_vec())
    }

    #[inline]
    pub fn is_none(&self) -> bool {
        self.value_type() == ValueType::None
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        self.value_type() == ValueType::Null
    }

    #[inline]
    pub fn is_bool(&self) -> bool {
        self.value_type() == ValueType::Bool
    }

    #[inline]
    pub fn is_double(&self) -> bool {
        self.value_type() == ValueType::Double
    }

    #[inline]
    pub fn is_array(&self) -> bool {
        self.value_type() == ValueType::Array
    }

    #[inline]
    pub fn is_object(&self) -> bool {
        self.value_type() == ValueType::Object
    }

    #[inline]
    pub fn is_string(&self) -> bool {
        self.value_type() == ValueType::String
    }

    #[inline]
    pub fn is_binary(&self) -> bool {
        self.value_type() == ValueType::Binary
    }

    #[inline]
    pub fn is_integer(&self) -> bool {
        matches!(
            self.value_type(),
            ValueType::Int | ValueType::UInt | ValueType::SmallInt
        )
    }

    #[inline]
    pub fn is_number(&self) -> bool {
        self.value_type().is_number()
    }

    /// Total encoded length of this value in bytes.
    pub fn byte_size(&self) -> Result<usize> {
        let head = self.head();
        match head {
            0x01 | 0x0a => Ok(1),
            0x02..=0x05 => {
                let width = 1usize << (head - 0x02);
                Ok(read_integer(self.data, 1, width)? as usize)
            }
            0x06..=0x09 => {
                let width = 1usize << (head - 0x06);
                Ok(read_integer(self.data, 1, width)? as usize)
            }
            0x0b..=0x0e => {
                let width = 1usize << (head - 0x0b);
                Ok(read_integer(self.data, 1, width)? as usize)
            }
            0x13 | 0x14 => {
                if self.data.len() < 2 {
                    return Err(Error::IndexOutOfBounds);
                }
                let (size, _) = read_variable_value_length(self.data, 1);
                Ok(size as usize)
            }
            0x17..=0x1a | 0x1e | 0x1f => Ok(1),
            0x1b | 0x1c => Ok(9),
            0x1d => Ok(1 + size_of::<usize>()),
            0x20..=0x27 => Ok(1 + (head - 0x1f) as usize),
            0x28..=0x2f => Ok(1 + (head - 0x27) as usize),
            0x30..=0x3f => Ok(1),
            0x40..=0xbe => Ok(1 + (head - 0x40) as usize),
            0xbf => {
                let len = read_u64_le(self.data, 1)? as usize;
                Ok(1 + 8 + len)
            }
            0xc0..=0xc7 => {
                let width = (head - 0xbf) as usize;
                let len = read_integer(self.data, 1, width)? as usize;
                Ok(1 + width + len)
            }
            _ => Err(Error::InvalidHead(head)),
        }
    }

    /// Number of members of an array or object.
    pub fn length(&self) -> Result<usize> {
        let head = self.head();
        match head {
            0x01 | 0x0a => Ok(0),
            0x02..=0x05 => {
                // equally sized members, no table and no count stored
                let byte_size = self.byte_size()?;
                let data_offset = self.data_offset()?;
                let first = Slice::new(&self.data[data_offset..]);
                Ok((byte_size - data_offset) / first.byte_size()?)
            }
            0x06..=0x09 => {
                let width = 1usize << (head - 0x06);
                if width == 8 {
                    let byte_size = self.byte_size()?;
                    Ok(read_u64_le(self.data, byte_size - 8)? as usize)
                } else {
                    Ok(read_integer(self.data, 1 + width, width)? as usize)
                }
            }
            0x0b..=0x0e => Ok(self.object_meta()?.n),
            0x13 | 0x14 => {
                let byte_size = self.byte_size()?;
                Ok(read_variable_value_length_reverse(self.data, byte_size - 1) as usize)
            }
            _ => Err(Error::UnexpectedType("need an array or object")),
        }
    }

    /// The array member at position `index`.
    pub fn at(&self, index: usize) -> Result<Slice<'a>> {
        let head = self.head();
        match head {
            0x01 => Err(Error::IndexOutOfBounds),
            0x02..=0x05 => {
                let length = self.length()?;
                if index >= length {
                    return Err(Error::IndexOutOfBounds);
                }
                let data_offset = self.data_offset()?;
                let first = Slice::new(&self.data[data_offset..]);
                let stride = first.byte_size()?;
                Ok(Slice::new(&self.data[data_offset + index * stride..]))
            }
            0x06..=0x09 => {
                let width = 1usize << (head - 0x06);
                let length = self.length()?;
                if index >= length {
                    return Err(Error::IndexOutOfBounds);
                }
                let byte_size = self.byte_size()?;
                let table_base =
                    byte_size - width * length - if width == 8 { 8 } else { 0 };
                let offset = read_integer(self.data, table_base + width * index, width)? as usize;
                Ok(Slice::new(&self.data[offset..]))
            }
            0x13 => {
                let length = self.length()?;
                if index >= length {
                    return Err(Error::IndexOutOfBounds);
                }
                let mut position = self.data_offset()?;
                for _ in 0..index {
                    position += Slice::new(&self.data[position..]).byte_size()?;
                }
                Ok(Slice::new(&self.data[position..]))
            }
            _ => Err(Error::UnexpectedType("need an array")),
        }
    }

    /// Look up `name` in an object.
    ///
    /// Hashed objects are probed at the key's three candidate slots under
    /// the stored seed; compact objects are scanned. Translated keys
    /// compare by their resolved names.
    pub fn get(&self, name: &str) -> Result<Option<Slice<'a>>> {
        match self.head() {
            0x0a => Ok(None),
            0x0b..=0x0e => self.get_hashed(name),
            0x14 => self.get_sequential(name),
            _ => Err(Error::UnexpectedType("need an object")),
        }
    }

    fn get_hashed(&self, name: &str) -> Result<Option<Slice<'a>>> {
        let meta = self.object_meta()?;
        if meta.nr_slots == 0 {
            return Ok(None);
        }
        let small = meta.nr_slots <= 0x0100_0000;
        let hashes = crate::hash::hash_triple(name.as_bytes(), meta.seed);
        for hash in hashes {
            let slot = crate::hash::slot_of(hash, meta.nr_slots, small);
            let offset =
                read_integer(self.data, meta.table_base + meta.offset_size * slot, meta.offset_size)?
                    as usize;
            if offset == 0 {
                // an empty candidate is not a miss yet, the key may sit in
                // a later candidate after an eviction
                continue;
            }
            let key = Slice::new(&self.data[offset..]);
            if find_attr_name(key.start())? == name.as_bytes() {
                let key_size = key.byte_size()?;
                return Ok(Some(Slice::new(&self.data[offset + key_size..])));
            }
        }
        Ok(None)
    }

    fn get_sequential(&self, name: &str) -> Result<Option<Slice<'a>>> {
        let length = self.length()?;
        let mut position = self.data_offset()?;
        for _ in 0..length {
            let key = Slice::new(&self.data[position..]);
            let key_size = key.byte_size()?;
            let value = Slice::new(&self.data[position + key_size..]);
            if find_attr_name(key.start())? == name.as_bytes() {
                return Ok(Some(value));
            }
            position += key_size + value.byte_size()?;
        }
        Ok(None)
    }

    /// Resolve this slice as an object key: strings are returned as-is,
    /// integers are translated through the process attribute translator.
    pub fn make_key(&self) -> Result<Slice<'a>> {
        if self.is_string() {
            return Ok(*self);
        }
        if self.is_integer() {
            let id = self.get_uint()?;
            let translator =
                attribute_translator().ok_or(Error::NeedAttributeTranslator)?;
            let bytes = translator
                .id_to_key(id)
                .ok_or(Error::UnexpectedValue("unknown translated key id"))?;
            return Ok(Slice::new(bytes));
        }
        Err(Error::UnexpectedType("cannot use this type as an object key"))
    }

    /// The resolved attribute name of this key slice.
    pub fn key_name(&self) -> Result<&'a str> {
        let bytes = find_attr_name(self.data)?;
        std::str::from_utf8(bytes).map_err(|_| Error::InvalidUtf8)
    }

    pub fn get_bool(&self) -> Result<bool> {
        match self.head() {
            0x19 => Ok(false),
            0x1a => Ok(true),
            _ => Err(Error::UnexpectedType("need a bool")),
        }
    }

    pub fn get_double(&self) -> Result<f64> {
        if self.head() != 0x1b {
            return Err(Error::UnexpectedType("need a double"));
        }
        Ok(f64::from_bits(read_u64_le(self.data, 1)?))
    }

    pub fn get_small_int(&self) -> Result<i64> {
        match self.head() {
            head @ 0x30..=0x39 => Ok(i64::from(head - 0x30)),
            head @ 0x3a..=0x3f => Ok(i64::from(head) - 0x40),
            _ => Err(Error::UnexpectedType("need a small integer")),
        }
    }

    pub fn get_int(&self) -> Result<i64> {
        match self.head() {
            head @ 0x20..=0x27 => {
                let width = (head - 0x1f) as usize;
                let raw = read_integer(self.data, 1, width)?;
                let shift = 64 - 8 * width as u32;
                Ok(((raw << shift) as i64) >> shift)
            }
            0x28..=0x2f => {
                let v = self.get_uint()?;
                if v > i64::MAX as u64 {
                    return Err(Error::NumberOutOfRange);
                }
                Ok(v as i64)
            }
            0x30..=0x3f => self.get_small_int(),
            _ => Err(Error::UnexpectedType("need an integer")),
        }
    }

    pub fn get_uint(&self) -> Result<u64> {
        match self.head() {
            head @ 0x28..=0x2f => read_integer(self.data, 1, (head - 0x27) as usize),
            0x20..=0x27 | 0x30..=0x3f => {
                let v = self.get_int()?;
                if v < 0 {
                    return Err(Error::NumberOutOfRange);
                }
                Ok(v as u64)
            }
            _ => Err(Error::UnexpectedType("need an unsigned integer")),
        }
    }

    /// Milliseconds since the epoch.
    pub fn get_utc_date(&self) -> Result<i64> {
        if self.head() != 0x1c {
            return Err(Error::UnexpectedType("need a date"));
        }
        Ok(read_u64_le(self.data, 1)? as i64)
    }

    pub fn get_str(&self) -> Result<&'a str> {
        std::str::from_utf8(self.string_bytes()?).map_err(|_| Error::InvalidUtf8)
    }

    pub fn get_string(&self) -> Result<String> {
        Ok(self.get_str()?.to_owned())
    }

    pub fn get_binary(&self) -> Result<&'a [u8]> {
        let head = self.head();
        if !(0xc0..=0xc7).contains(&head) {
            return Err(Error::UnexpectedType("need binary data"));
        }
        let width = (head - 0xbf) as usize;
        let len = read_integer(self.data, 1, width)? as usize;
        self.data
            .get(1 + width..1 + width + len)
            .ok_or(Error::IndexOutOfBounds)
    }

    /// The embedded raw pointer of an external value. Dereferencing it is
    /// only sound in the process that built the document.
    pub fn get_external(&self) -> Result<*const u8> {
        if self.head() != 0x1d {
            return Err(Error::UnexpectedType("need an external"));
        }
        let bytes: [u8; size_of::<usize>()] = self
            .data
            .get(1..1 + size_of::<usize>())
            .ok_or(Error::IndexOutOfBounds)?
            .try_into()
            .unwrap();
        Ok(usize::from_ne_bytes(bytes) as *const u8)
    }

    fn string_bytes(&self) -> Result<&'a [u8]> {
        let head = self.head();
        if (0x40..=0xbe).contains(&head) {
            let len = (head - 0x40) as usize;
            return self.data.get(1..1 + len).ok_or(Error::IndexOutOfBounds);
        }
        if head == 0xbf {
            let len = read_u64_le(self.data, 1)? as usize;
            return self.data.get(9..9 + len).ok_or(Error::IndexOutOfBounds);
        }
        Err(Error::UnexpectedType("need a string"))
    }

    /// Offset of the first member of a non-empty array or object.
    pub(crate) fn data_offset(&self) -> Result<usize> {
        match self.head() {
            0x02 => Ok(2),
            0x06 => Ok(3),
            0x0b => Ok(5),
            0x03..=0x05 | 0x07..=0x09 | 0x0c..=0x0e => Ok(9),
            0x13 | 0x14 => {
                if self.data.len() < 2 {
                    return Err(Error::IndexOutOfBounds);
                }
                let (_, varint_len) = read_variable_value_length(self.data, 1);
                Ok(1 + varint_len)
            }
            head => Err(Error::InvalidHead(head)),
        }
    }

    fn object_meta(&self) -> Result<ObjectMeta> {
        let head = self.head();
        if !(0x0b..=0x0e).contains(&head) {
            return Err(Error::UnexpectedType("need an object"));
        }
        let offset_size = 1usize << (head - 0x0b);
        let byte_size = self.byte_size()?;
        let meta = match offset_size {
            1 => ObjectMeta {
                offset_size,
                n: read_integer(self.data, 2, 1)? as usize,
                nr_slots: read_integer(self.data, 3, 1)? as usize,
                seed: *self.data.get(4).ok_or(Error::IndexOutOfBounds)?,
                table_base: 0,
            },
            2 => ObjectMeta {
                offset_size,
                n: read_integer(self.data, 3, 2)? as usize,
                nr_slots: read_integer(self.data, 5, 2)? as usize,
                seed: *self.data.get(7).ok_or(Error::IndexOutOfBounds)?,
                table_base: 0,
            },
            4 => ObjectMeta {
                offset_size,
                n: read_integer(self.data, 5, 4)? as usize,
                nr_slots: read_integer(self.data, byte_size - 5, 4)? as usize,
                seed: *self.data.get(byte_size - 1).ok_or(Error::IndexOutOfBounds)?,
                table_base: 0,
            },
            _ => ObjectMeta {
                offset_size,
                n: read_u64_le(self.data, byte_size - 17)? as usize,
                nr_slots: read_u64_le(self.data, byte_size - 9)? as usize,
                seed: *self.data.get(byte_size - 1).ok_or(Error::IndexOutOfBounds)?,
                table_base: 0,
            },
        };
        let trailer = match offset_size {
            1 | 2 => 0,
            4 => 5,
            _ => 17,
        };
        Ok(ObjectMeta {
            table_base: byte_size - trailer - meta.offset_size * meta.nr_slots,
            ..meta
        })
    }
}

struct ObjectMeta {
    offset_size: usize,
    n: usize,
    nr_slots: usize,
    seed: u8,
    table_base: usize,
}

/// Owner of a complete encoded document, sharing its storage.
pub struct SharedSlice {
    data: Bytes,
}

impl SharedSlice {
    pub fn new(data: Bytes) -> SharedSlice {
        SharedSlice { data }
    }

    #[inline]
    pub fn slice(&self) -> Slice<'_> {
        Slice::new(&self.data)
    }

    #[inline]
    pub fn bytes(&self) -> &Bytes {
        &self.data
    }
}

impl Clone for SharedSlice {
    fn clone(&self) -> Self {
        SharedSlice {
            data: self.data.clone(),
        }
    }
}

/// Resolve the attribute name a key slice denotes.
///
/// Short and long strings resolve in place; anything else is a translated
/// key and resolves through the attribute translator.
pub(crate) fn find_attr_name(key: &[u8]) -> Result<&[u8]> {
    let head = *key.first().ok_or(Error::IndexOutOfBounds)?;
    if (0x40..=0xbe).contains(&head) {
        // short string
        let len = (head - 0x40) as usize;
        return key.get(1..1 + len).ok_or(Error::IndexOutOfBounds);
    }
    if head == 0xbf {
        // long string
        let len = read_u64_le(key, 1)? as usize;
        return key.get(9..9 + len).ok_or(Error::IndexOutOfBounds);
    }
    cold_path();
    let translated = Slice::new(key).make_key()?;
    find_attr_name(translated.start())
}

/// Little-endian read of `width` bytes, 1 to 8.
fn read_integer(data: &[u8], offset: usize, width: usize) -> Result<u64> {
    let bytes = data
        .get(offset..offset + width)
        .ok_or(Error::IndexOutOfBounds)?;
    let mut x = 0u64;
    for &byte in bytes.iter().rev() {
        x = (x << 8) | u64::from(byte);
    }
    Ok(x)
}

fn read_u64_le(data: &[u8], offset: usize) -> Result<u64> {
    let bytes: [u8; 8] = data
        .get(offset..offset + 8)
        .ok_or(Error::IndexOutOfBounds)?
        .try_into()
        .unwrap();
    Ok(U64::<LittleEndian>::from_bytes(bytes).get())
}
