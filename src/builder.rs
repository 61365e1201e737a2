use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use bytes::Bytes;

use crate::buffer::Buffer;
use crate::hash::{hash_triple, slot_of};
use crate::slice::find_attr_name;
use crate::translator::attribute_translator;
use crate::util::{
    get_variable_value_length, store_variable_value_length, store_variable_value_length_reverse,
};
use crate::{
    ArrayIterator, Error, ObjectIterator, Options, Result, Slice, Value, ValueData, ValuePair,
    ValueType, cold_path,
};

/// Incremental writer of one encoded document.
///
/// Values are appended depth-first: opening an array or object pushes a
/// stack frame, `add` appends children, `close` finalizes the innermost
/// frame and picks the cheapest encoding for it. When the last frame is
/// closed the buffer holds one complete value.
///
/// Errors are not recoverable; after any `Err` the buffer contents are
/// indeterminate and the builder should be dropped.
///
/// ```
/// use vpack::{Builder, Value};
///
/// let mut builder = Builder::new();
/// builder.open_array()?;
/// builder.add(1i64)?;
/// builder.add(2i64)?;
/// builder.close()?;
/// assert_eq!(builder.as_bytes(), &[0x02, 0x04, 0x31, 0x32]);
/// # Ok::<(), vpack::Error>(())
/// ```
#[derive(Debug)]
pub struct Builder {
    buffer: Buffer,
    stack: Vec<usize>,
    index: Vec<Vec<usize>>,
    key_written: bool,
    options: Options,
}

impl Default for Builder {
    fn default() -> Self {
        Self::new()
    }
}

impl Builder {
    pub fn new() -> Builder {
        Builder::with_options(Options::default())
    }

    pub fn with_options(options: Options) -> Builder {
        Builder {
            buffer: Buffer::new(),
            stack: Vec::new(),
            index: Vec::new(),
            key_written: false,
            options,
        }
    }

    pub fn with_capacity(capacity: usize) -> Builder {
        Builder {
            buffer: Buffer::with_capacity(capacity),
            stack: Vec::new(),
            index: Vec::new(),
            key_written: false,
            options: Options::default(),
        }
    }

    #[inline]
    pub fn options(&self) -> Options {
        self.options
    }

    /// True when no container is open.
    #[inline]
    pub fn is_closed(&self) -> bool {
        self.stack.is_empty()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buffer.pos() == 0
    }

    /// The bytes written so far. Only a complete value once [`is_closed`]
    /// holds.
    ///
    /// [`is_closed`]: Builder::is_closed
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        self.buffer.as_slice()
    }

    /// Reset for reuse. The per-depth index allocations are kept.
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.stack.clear();
        self.key_written = false;
    }

    /// View the sealed document.
    pub fn slice(&self) -> Result<Slice<'_>> {
        if !self.is_closed() {
            return Err(Error::NotSealed);
        }
        if self.is_empty() {
            return Ok(Slice::none());
        }
        Ok(Slice::new(self.buffer.as_slice()))
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.buffer.into_vec()
    }

    pub fn into_bytes(self) -> Bytes {
        self.buffer.into_bytes()
    }

    /// Dump the sealed document as JSON.
    pub fn to_json(&self) -> Result<String> {
        crate::dump::to_json(self.slice()?)
    }

    /// Dump the sealed document as indented JSON.
    pub fn to_json_pretty(&self) -> Result<String> {
        crate::dump::to_json_pretty(self.slice()?)
    }

    /// Open an array that closes to one of the indexed encodings.
    pub fn open_array(&mut self) -> Result<usize> {
        self.add(Value::array())
    }

    /// Open an array that prefers the compact encoding.
    pub fn open_array_compact(&mut self) -> Result<usize> {
        self.add(Value::array_compact())
    }

    /// Open an object that closes to the hashed encoding.
    pub fn open_object(&mut self) -> Result<usize> {
        self.add(Value::object())
    }

    /// Open an object that prefers the compact encoding.
    pub fn open_object_compact(&mut self) -> Result<usize> {
        self.add(Value::object_compact())
    }

    /// Append one value; inside an open object a string appended without a
    /// pending key becomes the next key. Returns the value's start offset.
    pub fn add(&mut self, value: impl Into<Value>) -> Result<usize> {
        let value = value.into();
        if !self.stack.is_empty() && !self.key_written {
            self.report_add();
        }
        self.set(&value)
    }

    /// Append a key and its value to the open object.
    pub fn add_key_value(&mut self, key: &str, value: impl Into<Value>) -> Result<usize> {
        let value = value.into();
        self.write_key(key)?;
        self.set(&value)
    }

    /// Append caller-owned bytes without an intermediate copy.
    pub fn add_pair(&mut self, pair: ValuePair) -> Result<usize> {
        if !self.stack.is_empty() && !self.key_written {
            self.report_add();
        }
        self.set_pair(&pair)
    }

    pub fn add_key_pair(&mut self, key: &str, pair: ValuePair) -> Result<usize> {
        self.write_key(key)?;
        self.set_pair(&pair)
    }

    /// Append an already encoded value verbatim.
    pub fn add_slice(&mut self, slice: Slice<'_>) -> Result<usize> {
        if !self.stack.is_empty() && !self.key_written {
            self.report_add();
        }
        self.set_slice(slice)
    }

    pub fn add_key_slice(&mut self, key: &str, slice: Slice<'_>) -> Result<usize> {
        self.write_key(key)?;
        self.set_slice(slice)
    }

    /// Append every element of `iter` to the open array, leaving it open.
    pub fn add_array_iterator(&mut self, iter: ArrayIterator<'_>) -> Result<usize> {
        let Some(&tos) = self.stack.last() else {
            return Err(Error::NeedOpenArray);
        };
        let head = self.buffer.get(tos);
        if head != 0x06 && head != 0x13 {
            return Err(Error::NeedOpenArray);
        }
        let old_pos = self.buffer.pos();
        for element in iter {
            self.add_slice(element?)?;
        }
        Ok(old_pos)
    }

    /// Append every pair of `iter` to the open object, leaving it open.
    /// Translated keys are resolved to their names first.
    pub fn add_object_iterator(&mut self, iter: ObjectIterator<'_>) -> Result<usize> {
        let Some(&tos) = self.stack.last() else {
            return Err(Error::NeedOpenObject);
        };
        let head = self.buffer.get(tos);
        if head != 0x0b && head != 0x14 {
            return Err(Error::NeedOpenObject);
        }
        if self.key_written {
            return Err(Error::KeyAlreadyWritten);
        }
        let old_pos = self.buffer.pos();
        for pair in iter {
            let (key, value) = pair?;
            self.add_slice(key.make_key()?)?;
            self.add_slice(value)?;
        }
        Ok(old_pos)
    }

    /// Drop the last subvalue appended to the open container.
    pub fn remove_last(&mut self) -> Result<()> {
        let Some(&tos) = self.stack.last() else {
            return Err(Error::NeedOpenCompound);
        };
        let depth = self.stack.len();
        let Some(last) = self.index[depth - 1].pop() else {
            return Err(Error::NeedSubvalue);
        };
        self.buffer.truncate(tos + last);
        Ok(())
    }

    /// Whether the open object already holds `key`.
    pub fn has_key(&self, key: &str) -> Result<bool> {
        Ok(self.get_key(key)?.is_some())
    }

    /// The value stored under `key` in the open object, if any.
    pub fn get_key(&self, key: &str) -> Result<Option<Slice<'_>>> {
        let Some(&tos) = self.stack.last() else {
            return Err(Error::NeedOpenObject);
        };
        let head = self.buffer.get(tos);
        if head != 0x0b && head != 0x14 {
            return Err(Error::NeedOpenObject);
        }
        let buffer = self.buffer.as_slice();
        for &entry in &self.index[self.stack.len() - 1] {
            let key_slice = Slice::new(&buffer[tos + entry..]);
            if find_attr_name(key_slice.start())? == key.as_bytes() {
                let key_size = key_slice.byte_size()?;
                return Ok(Some(Slice::new(&buffer[tos + entry + key_size..])));
            }
        }
        Ok(None)
    }

    /// Encode one value at the append position.
    ///
    /// Opening an array or object pushes a stack frame and reserves the
    /// 8-byte header that `close` patches later.
    pub fn set(&mut self, item: &Value) -> Result<usize> {
        let old_pos = self.buffer.pos();
        self.check_key_is_string(item.value_type() == ValueType::String)?;

        match item.value_type() {
            ValueType::None => {
                return Err(Error::UnexpectedType("cannot set a ValueType::None"));
            }
            ValueType::Null => self.buffer.push(0x18),
            ValueType::Bool => match item.data() {
                ValueData::Bool(true) => self.buffer.push(0x1a),
                ValueData::Bool(false) => self.buffer.push(0x19),
                _ => {
                    return Err(Error::UnexpectedValue("must give bool for ValueType::Bool"));
                }
            },
            ValueType::Double => {
                let v = match item.data() {
                    ValueData::Double(v) => *v,
                    ValueData::Int(v) => *v as f64,
                    ValueData::UInt(v) => *v as f64,
                    _ => {
                        return Err(Error::UnexpectedValue(
                            "must give number for ValueType::Double",
                        ));
                    }
                };
                self.buffer.reserve(1 + 8);
                self.buffer.push(0x1b);
                self.buffer.append_length(v.to_bits(), 8);
            }
            ValueType::External => {
                if self.options.disallow_externals {
                    return Err(Error::ExternalsDisallowed);
                }
                let ValueData::Pointer(pointer) = item.data() else {
                    return Err(Error::UnexpectedValue(
                        "must give a pointer for ValueType::External",
                    ));
                };
                self.buffer.reserve(1 + size_of::<usize>());
                self.buffer.push(0x1d);
                self.buffer
                    .extend_from_slice(&(*pointer as usize).to_ne_bytes());
            }
            ValueType::SmallInt => {
                let vv = match item.data() {
                    ValueData::Double(v) => *v as i64,
                    ValueData::Int(v) => *v,
                    ValueData::UInt(v) => *v as i64,
                    _ => {
                        return Err(Error::UnexpectedValue(
                            "must give number for ValueType::SmallInt",
                        ));
                    }
                };
                if !(-6..=9).contains(&vv) {
                    return Err(Error::NumberOutOfRange);
                }
                if vv >= 0 {
                    self.buffer.push(0x30 + vv as u8);
                } else {
                    self.buffer.push((0x40 + vv) as u8);
                }
            }
            ValueType::Int => {
                let v = match item.data() {
                    ValueData::Double(v) => *v as i64,
                    ValueData::Int(v) => *v,
                    ValueData::UInt(v) => *v as i64,
                    _ => {
                        return Err(Error::UnexpectedValue(
                            "must give number for ValueType::Int",
                        ));
                    }
                };
                self.add_int(v);
            }
            ValueType::UInt => {
                let v = match item.data() {
                    ValueData::Double(v) => {
                        if *v < 0.0 {
                            return Err(Error::UnexpectedValue(
                                "must give non-negative number for ValueType::UInt",
                            ));
                        }
                        *v as u64
                    }
                    ValueData::Int(v) => {
                        if *v < 0 {
                            return Err(Error::UnexpectedValue(
                                "must give non-negative number for ValueType::UInt",
                            ));
                        }
                        *v as u64
                    }
                    ValueData::UInt(v) => *v,
                    _ => {
                        return Err(Error::UnexpectedValue(
                            "must give number for ValueType::UInt",
                        ));
                    }
                };
                self.add_uint(v);
            }
            ValueType::UTCDate => {
                let v = match item.data() {
                    ValueData::Double(v) => *v as i64,
                    ValueData::Int(v) => *v,
                    ValueData::UInt(v) => *v as i64,
                    _ => {
                        return Err(Error::UnexpectedValue(
                            "must give number for ValueType::UTCDate",
                        ));
                    }
                };
                self.buffer.reserve(1 + 8);
                self.buffer.push(0x1c);
                self.buffer.append_length(v as u64, 8);
            }
            ValueType::String => {
                let ValueData::String(s) = item.data() else {
                    return Err(Error::UnexpectedValue(
                        "must give a string for ValueType::String",
                    ));
                };
                self.append_string(s.as_bytes());
            }
            ValueType::Array => {
                self.open_compound(if item.is_unindexed() { 0x13 } else { 0x06 });
            }
            ValueType::Object => {
                self.open_compound(if item.is_unindexed() { 0x14 } else { 0x0b });
            }
            ValueType::Binary => {
                let bytes: &[u8] = match item.data() {
                    ValueData::Bytes(bytes) => bytes,
                    ValueData::String(s) => s.as_bytes(),
                    _ => {
                        return Err(Error::UnexpectedValue(
                            "must give bytes for ValueType::Binary",
                        ));
                    }
                };
                self.buffer.reserve(9 + bytes.len());
                self.append_uint(bytes.len() as u64, 0xbf);
                self.buffer.extend_from_slice(bytes);
            }
            ValueType::Illegal => self.buffer.push(0x17),
            ValueType::MinKey => self.buffer.push(0x1e),
            ValueType::MaxKey => self.buffer.push(0x1f),
            ValueType::BCD => return Err(Error::NotImplemented),
            ValueType::Custom => {
                return Err(Error::UnexpectedType(
                    "cannot set a ValueType::Custom with this method",
                ));
            }
        }
        Ok(old_pos)
    }

    /// Encode caller-owned bytes at the append position.
    pub fn set_pair(&mut self, pair: &ValuePair) -> Result<usize> {
        let old_pos = self.buffer.pos();
        self.check_key_is_string(pair.value_type() == ValueType::String)?;

        match pair.value_type() {
            ValueType::Binary => {
                let bytes = pair.bytes();
                self.buffer.reserve(9 + bytes.len());
                self.append_uint(bytes.len() as u64, 0xbf);
                self.buffer.extend_from_slice(bytes);
            }
            ValueType::String => self.append_string(pair.bytes()),
            ValueType::Custom => {
                // only space is claimed here; the caller fills in the
                // custom head and body at the returned offset
                self.buffer.reserve(pair.bytes().len());
                self.buffer.extend_from_slice(pair.bytes());
            }
            _ => {
                return Err(Error::UnexpectedType(
                    "only ValueType::Binary, ValueType::String and ValueType::Custom \
                     are valid for a ValuePair",
                ));
            }
        }
        Ok(old_pos)
    }

    /// Copy an already encoded value to the append position.
    pub fn set_slice(&mut self, item: Slice<'_>) -> Result<usize> {
        self.check_key_is_string(item.is_string())?;
        let len = item.byte_size()?;
        let old_pos = self.buffer.pos();
        self.buffer.extend_from_slice(&item.start()[..len]);
        Ok(old_pos)
    }

    /// Finalize the innermost open container.
    pub fn close(&mut self) -> Result<()> {
        if self.stack.is_empty() {
            return Err(Error::NeedOpenCompound);
        }
        let tos = *self.stack.last().unwrap();
        let head = self.buffer.get(tos);
        debug_assert!(head == 0x06 || head == 0x0b || head == 0x13 || head == 0x14);
        let is_array = head == 0x06 || head == 0x13;
        let depth = self.stack.len();

        if self.index[depth - 1].is_empty() {
            return self.close_empty(tos, is_array);
        }

        let mut index = std::mem::take(&mut self.index[depth - 1]);
        let n = index.len();

        // check if the compact format applies
        if head == 0x13
            || head == 0x14
            || (head == 0x06 && self.options.build_unindexed_arrays)
            || (head == 0x0b && (self.options.build_unindexed_objects || n == 1))
        {
            if self.close_compact(tos, is_array, n) {
                self.finish_close(depth, index);
                return Ok(());
            }
            // fall through when the compact header does not fit
        }

        if is_array {
            self.close_array(tos, &mut index);
        } else if let Err(error) = self.close_object(tos, &mut index) {
            self.index[depth - 1] = index;
            return Err(error);
        }
        self.finish_close(depth, index);
        Ok(())
    }

    fn finish_close(&mut self, depth: usize, mut index: Vec<usize>) {
        // keep the allocation for the next container at this depth
        index.clear();
        self.index[depth - 1] = index;
        self.stack.pop();
    }

    fn close_empty(&mut self, tos: usize, is_array: bool) -> Result<()> {
        self.buffer.set(tos, if is_array { 0x01 } else { 0x0a });
        debug_assert_eq!(self.buffer.pos(), tos + 9);
        // no byte length and no subvalue count needed
        self.buffer.truncate(tos + 1);
        self.stack.pop();
        Ok(())
    }

    /// Try the compact notation. Gives up (returns `false`) when the head
    /// and byte-length varint would exceed 8 bytes together.
    fn close_compact(&mut self, tos: usize, is_array: bool, n: usize) -> bool {
        let pos = self.buffer.pos();
        let n_len = get_variable_value_length(n as u64);
        let mut byte_size = pos - (tos + 8) + n_len;
        let mut b_len = get_variable_value_length(byte_size as u64);
        byte_size += b_len;
        if get_variable_value_length(byte_size as u64) != b_len {
            byte_size += 1;
            b_len += 1;
        }
        if b_len >= 9 {
            return false;
        }

        self.buffer.set(tos, if is_array { 0x13 } else { 0x14 });
        let target_pos = 1 + b_len;
        if pos > tos + 9 {
            let len = pos - (tos + 9);
            self.buffer.memmove(tos + target_pos, tos + 9, len);
        }

        store_variable_value_length(self.buffer.storage_mut(), tos + 1, byte_size as u64);

        // the count varint may reach past the moved payload
        if n_len > 8 - b_len {
            self.buffer.reserve(n_len);
        }
        store_variable_value_length_reverse(
            self.buffer.storage_mut(),
            tos + byte_size - 1,
            n as u64,
        );

        self.buffer.set_pos(pos - 8 + n_len + b_len);
        true
    }

    fn close_array(&mut self, tos: usize, index: &mut [usize]) {
        // fix the head byte in case a compact array was originally requested
        self.buffer.set(tos, 0x06);

        let pos = self.buffer.pos();
        let n = index.len();
        let mut need_index_table = true;
        let mut need_nr_subs = true;
        if n == 1 {
            need_index_table = false;
            need_nr_subs = false;
        } else if (pos - tos) - index[0] == n * (index[1] - index[0]) {
            // all entries may have the same length, then the offset table
            // can be omitted entirely
            let sub_len = index[1] - index[0];
            let mut no_table = (pos - tos) - index[n - 1] == sub_len;
            if no_table {
                for i in 1..n - 1 {
                    if index[i + 1] - index[i] != sub_len {
                        no_table = false;
                        break;
                    }
                }
            }
            if no_table {
                need_index_table = false;
                need_nr_subs = false;
            }
        }

        // byte width of the offsets, the byte length and the subvalue count.
        // pos - tos includes the reserved 8 header bytes; the 1-byte case
        // wins 6 of them back but spends one table byte per subvalue
        let table = |scale: usize| if need_index_table { scale * n } else { 0 };
        let offset_size: usize = if pos - tos + table(1) - (if need_nr_subs { 6 } else { 7 }) <= 0xff
        {
            1
        } else if pos - tos + table(2) <= 0xffff {
            2
        } else if pos - tos + table(4) <= 0xffff_ffff {
            4
        } else {
            8
        };

        if offset_size == 1 {
            let target_pos = if need_index_table { 3 } else { 2 };
            if pos > tos + 9 {
                let len = pos - (tos + 9);
                self.buffer.memmove(tos + target_pos, tos + 9, len);
            }
            let diff = 9 - target_pos;
            self.buffer.truncate(pos - diff);
            if need_index_table {
                for entry in index.iter_mut() {
                    *entry -= diff;
                }
            }
            // without a table the index entries are stale now, but they are
            // no longer read
        }
        // wider widths keep the payload at tos + 9: the spare header bytes
        // are cheaper than another memmove

        if need_index_table {
            self.buffer
                .reserve(offset_size * n + if offset_size == 8 { 8 } else { 0 });
            let table_base = self.buffer.pos();
            self.buffer.advance(offset_size * n);
            for (i, entry) in index.iter().enumerate() {
                self.buffer
                    .store_length(table_base + offset_size * i, *entry as u64, offset_size);
            }
        } else {
            self.buffer.set(tos, 0x02);
        }

        // fix the byte width in the type byte
        if offset_size > 1 {
            let head = self.buffer.get(tos);
            match offset_size {
                2 => self.buffer.set(tos, head + 1),
                4 => self.buffer.set(tos, head + 2),
                _ => {
                    self.buffer.set(tos, head + 3);
                    if need_nr_subs {
                        self.buffer.append_length(n as u64, 8);
                    }
                }
            }
        }

        let byte_size = self.buffer.pos() - tos;
        self.buffer.store_length(tos + 1, byte_size as u64, offset_size);
        if offset_size < 8 && need_nr_subs {
            self.buffer
                .store_length(tos + 1 + offset_size, n as u64, offset_size);
        }
    }

    fn close_object(&mut self, tos: usize, index: &mut [usize]) -> Result<()> {
        // fix the head byte in case a compact object was originally requested
        self.buffer.set(tos, 0x0b);

        let (mut ht, seed, nr_slots) = self.compute_cuckoo_hash(tos, index)?;

        let pos = self.buffer.pos();
        let n = index.len();
        // the 1-byte case wins 4 header bytes back but spends one table
        // byte per slot
        let offset_size: usize = if pos - tos + nr_slots - 4 <= 0xff {
            1
        } else if pos - tos + 2 * nr_slots <= 0xffff {
            2
        } else if pos - tos + 4 * nr_slots <= 0xffff_ffff {
            4
        } else {
            8
        };

        if offset_size == 1 {
            if pos > tos + 9 {
                let len = pos - (tos + 9);
                self.buffer.memmove(tos + 5, tos + 9, len);
            }
            let diff = 4;
            self.buffer.truncate(pos - diff);
            for entry in index.iter_mut() {
                *entry -= diff;
            }
            for slot in ht.iter_mut() {
                if *slot != 0 {
                    *slot -= diff;
                }
            }
        }

        self.buffer.reserve(
            offset_size * nr_slots
                + if offset_size == 8 { 17 } else { 0 }
                + if offset_size == 4 { 5 } else { 0 },
        );
        let table_base = self.buffer.pos();
        self.buffer.advance(offset_size * nr_slots);
        for (i, slot) in ht.iter().enumerate() {
            self.buffer
                .store_length(table_base + offset_size * i, *slot as u64, offset_size);
        }

        match offset_size {
            1 => {}
            2 => self.buffer.set(tos, 0x0c),
            4 => {
                self.buffer.set(tos, 0x0d);
                self.buffer.append_length(nr_slots as u64, 4);
                self.buffer.append_length(u64::from(seed), 1);
            }
            _ => {
                self.buffer.set(tos, 0x0e);
                self.buffer.append_length(n as u64, 8);
                self.buffer.append_length(nr_slots as u64, 8);
                self.buffer.append_length(u64::from(seed), 1);
            }
        }

        let byte_size = self.buffer.pos() - tos;
        self.buffer.store_length(tos + 1, byte_size as u64, offset_size);

        // subvalue count, slot count and seed when they live in the front
        if offset_size < 8 {
            self.buffer
                .store_length(tos + 1 + offset_size, n as u64, offset_size);
            if offset_size < 4 {
                let base = if offset_size == 1 { 3 } else { 5 };
                self.buffer
                    .store_length(tos + base, nr_slots as u64, offset_size);
                self.buffer.set(tos + base + offset_size, seed);
            }
        }
        Ok(())
    }

    /// Build the slot table for the object ending at the append position.
    ///
    /// Each key gets three candidate slots from XXH64 under three seeds
    /// selected by a one-byte table seed. Keys land in their first free
    /// candidate; when all three are taken, a deterministic coin evicts one
    /// occupant, which is then re-placed the same way. Exhausting the
    /// search limit bumps the table seed; exhausting all 256 seeds grows
    /// the table by a tenth.
    fn compute_cuckoo_hash(
        &self,
        tos: usize,
        index: &[usize],
    ) -> Result<(Vec<usize>, u8, usize)> {
        let mut rng = StdRng::seed_from_u64(123_456_789);
        let n = index.len();
        // one extra slot for sizes 2 to 6, two for sizes 7 to 13, and so on
        let mut nr_slots = n + n * 3 / 20 + 1;
        let mut small = nr_slots <= 0x0100_0000;
        let search_limit = if nr_slots < 400 {
            nr_slots * 3
        } else {
            1200 + (nr_slots as f64).sqrt() as usize
        };
        let buffer = self.buffer.as_slice();

        loop {
            let mut seed: u8 = 0;
            loop {
                let mut ht = vec![0usize; nr_slots];
                let mut failed = false;

                'keys: for &entry in index {
                    let mut offset = entry;
                    // evicted occupants were checked when they first went in
                    let mut check_uniqueness = self.options.check_attribute_uniqueness;
                    let mut count = 0usize;
                    loop {
                        let attr_name = find_attr_name(&buffer[tos + offset..])?;
                        let hashes = hash_triple(attr_name, seed);

                        // a key is always placed into the first free of its
                        // three candidate slots and only ever displaced by
                        // another placement, so a repeated name must meet
                        // its first occurrence before any free slot: probing
                        // the candidates is enough for the duplicate check
                        let mut placed = false;
                        for hash in hashes {
                            let slot = slot_of(hash, nr_slots, small);
                            if ht[slot] == 0 {
                                ht[slot] = offset;
                                placed = true;
                                break;
                            } else if check_uniqueness {
                                let other = find_attr_name(&buffer[tos + ht[slot]..])?;
                                if attr_name == other {
                                    return Err(Error::DuplicateAttributeName);
                                }
                            }
                        }
                        if placed {
                            continue 'keys;
                        }

                        // play cuckoo
                        let pick = rng.gen_range(0..3usize);
                        let slot = slot_of(hashes[pick], nr_slots, small);
                        let evicted = ht[slot];
                        ht[slot] = offset;
                        offset = evicted;
                        check_uniqueness = false;

                        count += 1;
                        if count > search_limit {
                            cold_path();
                            failed = true;
                            break 'keys;
                        }
                    }
                }

                if !failed {
                    return Ok((ht, seed, nr_slots));
                }
                if seed == u8::MAX {
                    break;
                }
                seed += 1;
            }
            nr_slots = nr_slots * 110 / 100;
            small = nr_slots <= 0x0100_0000;
        }
    }

    fn open_compound(&mut self, head: u8) {
        self.buffer.reserve(9);
        let tos = self.buffer.pos();
        self.stack.push(tos);
        let depth = self.stack.len();
        if self.index.len() < depth {
            self.index.push(Vec::new());
        }
        self.index[depth - 1].clear();
        self.buffer.push(head);
        // room for the byte length and subvalue count, patched on close
        self.buffer.append_zeros(8);
    }

    fn report_add(&mut self) {
        let tos = *self.stack.last().unwrap();
        let offset = self.buffer.pos() - tos;
        self.index[self.stack.len() - 1].push(offset);
    }

    fn check_key_is_string(&mut self, is_string: bool) -> Result<()> {
        if let Some(&tos) = self.stack.last() {
            let head = self.buffer.get(tos);
            if head == 0x0b || head == 0x14 {
                if !self.key_written {
                    if !is_string {
                        return Err(Error::KeyMustBeString);
                    }
                    self.key_written = true;
                } else {
                    self.key_written = false;
                }
            }
        }
        Ok(())
    }

    fn write_key(&mut self, key: &str) -> Result<()> {
        let Some(&tos) = self.stack.last() else {
            return Err(Error::NeedOpenObject);
        };
        let head = self.buffer.get(tos);
        if head != 0x0b && head != 0x14 {
            return Err(Error::NeedOpenObject);
        }
        if self.key_written {
            return Err(Error::KeyAlreadyWritten);
        }
        self.report_add();
        if let Some(translator) = attribute_translator() {
            if let Some(id) = translator.key_to_id(key) {
                self.add_uint(id);
                self.key_written = true;
                return Ok(());
            }
        }
        self.append_string(key.as_bytes());
        self.key_written = true;
        Ok(())
    }

    fn append_string(&mut self, bytes: &[u8]) {
        let size = bytes.len();
        if size <= 126 {
            // short string
            self.buffer.reserve(1 + size);
            self.buffer.push(0x40 + size as u8);
        } else {
            // long string
            self.buffer.reserve(1 + 8 + size);
            self.buffer.push(0xbf);
            self.buffer.append_length(size as u64, 8);
        }
        self.buffer.extend_from_slice(bytes);
    }

    fn add_int(&mut self, v: i64) {
        if (0..=9).contains(&v) {
            self.buffer.push(0x30 + v as u8);
        } else if (-6..=-1).contains(&v) {
            self.buffer.push((0x40 + v) as u8);
        } else {
            self.append_int(v, 0x1f);
        }
    }

    fn add_uint(&mut self, v: u64) {
        if v <= 9 {
            self.buffer.push(0x30 + v as u8);
        } else {
            self.append_uint(v, 0x27);
        }
    }

    fn append_int(&mut self, v: i64, base: u8) {
        let v_size = int_length(v);
        self.buffer.reserve(1 + v_size);
        self.buffer.push(base + v_size as u8);
        self.buffer.append_length(v as u64, v_size);
    }

    fn append_uint(&mut self, v: u64, base: u8) {
        let v_size = uint_length(v);
        self.buffer.reserve(1 + v_size);
        self.buffer.push(base + v_size as u8);
        self.buffer.append_length(v, v_size);
    }
}

fn int_length(value: i64) -> usize {
    if (-0x80..=0x7f).contains(&value) {
        1
    } else if (-0x8000..=0x7fff).contains(&value) {
        2
    } else if (-0x0080_0000..=0x007f_ffff).contains(&value) {
        3
    } else if (-0x8000_0000..=0x7fff_ffff).contains(&value) {
        4
    } else if (-0x0080_0000_0000..=0x007f_ffff_ffff).contains(&value) {
        5
    } else if (-0x8000_0000_0000..=0x7fff_ffff_ffff).contains(&value) {
        6
    } else if (-0x0080_0000_0000_0000..=0x007f_ffff_ffff_ffff).contains(&value) {
        7
    } else {
        8
    }
}

fn uint_length(value: u64) -> usize {
    if value <= 0xff {
        1
    } else if value <= 0xffff {
        2
    } else if value <= 0x00ff_ffff {
        3
    } else if value <= 0xffff_ffff {
        4
    } else if value <= 0x00ff_ffff_ffff {
        5
    } else if value <= 0xffff_ffff_ffff {
        6
    } else if value <= 0x00ff_ffff_ffff_ffff {
        7
    } else {
        8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_widths() {
        assert_eq!(int_length(0), 1);
        assert_eq!(int_length(127), 1);
        assert_eq!(int_length(128), 2);
        assert_eq!(int_length(-128), 1);
        assert_eq!(int_length(-129), 2);
        assert_eq!(int_length(i64::MAX), 8);
        assert_eq!(int_length(i64::MIN), 8);
        assert_eq!(uint_length(255), 1);
        assert_eq!(uint_length(256), 2);
        assert_eq!(uint_length(u64::MAX), 8);
    }
}
