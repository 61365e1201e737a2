/// Wire types of the format.
#[repr(u8)]
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum ValueType {
    None,
    Null,
    Bool,
    Double,
    External,
    SmallInt,
    Int,
    UInt,
    UTCDate,
    String,
    Array,
    Object,
    Binary,
    Illegal,
    MinKey,
    MaxKey,
    BCD,
    Custom,
}

impl ValueType {
    /// Classify a head byte.
    pub const fn from_head(head: u8) -> ValueType {
        match head {
            0x00 => ValueType::None,
            0x01..=0x09 => ValueType::Array,
            0x0a..=0x0e => ValueType::Object,
            0x13 => ValueType::Array,
            0x14 => ValueType::Object,
            0x17 => ValueType::Illegal,
            0x18 => ValueType::Null,
            0x19 | 0x1a => ValueType::Bool,
            0x1b => ValueType::Double,
            0x1c => ValueType::UTCDate,
            0x1d => ValueType::External,
            0x1e => ValueType::MinKey,
            0x1f => ValueType::MaxKey,
            0x20..=0x27 => ValueType::Int,
            0x28..=0x2f => ValueType::UInt,
            0x30..=0x3f => ValueType::SmallInt,
            0x40..=0xbf => ValueType::String,
            0xc0..=0xc7 => ValueType::Binary,
            0xc8..=0xcf => ValueType::BCD,
            0xf0..=0xff => ValueType::Custom,
            _ => ValueType::None,
        }
    }

    pub const fn is_number(self) -> bool {
        matches!(
            self,
            Self::Double | Self::SmallInt | Self::Int | Self::UInt
        )
    }

    pub const fn is_composite(self) -> bool {
        matches!(self, Self::Array | Self::Object)
    }
}

/// Scalar carried by a [`Value`], independent of the requested wire type.
#[derive(Clone, Debug)]
pub enum ValueData {
    None,
    Bool(bool),
    Double(f64),
    Int(i64),
    UInt(u64),
    String(String),
    Bytes(Vec<u8>),
    Pointer(*const u8),
}

/// One value to append to a [`Builder`], pairing a wire type with the
/// scalar it is built from.
///
/// Arrays and objects carry no scalar; their `unindexed` flag requests the
/// compact encoding on close.
///
/// [`Builder`]: crate::Builder
#[derive(Clone, Debug)]
pub struct Value {
    t: ValueType,
    data: ValueData,
    unindexed: bool,
}

impl Value {
    /// Pair an arbitrary wire type with an arbitrary scalar.
    ///
    /// The builder validates the combination on append and converts where
    /// the format allows it (for example `ValueData::Int` under
    /// `ValueType::Double`).
    pub fn new(t: ValueType, data: ValueData) -> Value {
        Value {
            t,
            data,
            unindexed: false,
        }
    }

    pub fn null() -> Value {
        Value::new(ValueType::Null, ValueData::None)
    }

    pub fn illegal() -> Value {
        Value::new(ValueType::Illegal, ValueData::None)
    }

    pub fn min_key() -> Value {
        Value::new(ValueType::MinKey, ValueData::None)
    }

    pub fn max_key() -> Value {
        Value::new(ValueType::MaxKey, ValueData::None)
    }

    /// A single-byte integer; the builder rejects values outside `-6..=9`.
    pub fn small_int(value: i64) -> Value {
        Value::new(ValueType::SmallInt, ValueData::Int(value))
    }

    /// Milliseconds since the epoch.
    pub fn utc_date(millis: i64) -> Value {
        Value::new(ValueType::UTCDate, ValueData::Int(millis))
    }

    pub fn binary(bytes: impl Into<Vec<u8>>) -> Value {
        Value::new(ValueType::Binary, ValueData::Bytes(bytes.into()))
    }

    /// A raw pointer embedded verbatim. Not portable; refused unless
    /// [`Options::disallow_externals`] is cleared.
    ///
    /// [`Options::disallow_externals`]: crate::Options::disallow_externals
    pub fn external(pointer: *const u8) -> Value {
        Value::new(ValueType::External, ValueData::Pointer(pointer))
    }

    /// Open an array that closes to one of the indexed encodings.
    pub fn array() -> Value {
        Value::new(ValueType::Array, ValueData::None)
    }

    /// Open an array that prefers the compact encoding on close.
    pub fn array_compact() -> Value {
        let mut value = Value::array();
        value.unindexed = true;
        value
    }

    /// Open an object that closes to the hashed encoding.
    pub fn object() -> Value {
        Value::new(ValueType::Object, ValueData::None)
    }

    /// Open an object that prefers the compact encoding on close.
    pub fn object_compact() -> Value {
        let mut value = Value::object();
        value.unindexed = true;
        value
    }

    #[inline]
    pub fn value_type(&self) -> ValueType {
        self.t
    }

    #[inline]
    pub fn data(&self) -> &ValueData {
        &self.data
    }

    #[inline]
    pub fn is_unindexed(&self) -> bool {
        self.unindexed
    }
}

impl From<bool> for Value {
    #[inline]
    fn from(value: bool) -> Self {
        Value::new(ValueType::Bool, ValueData::Bool(value))
    }
}

impl From<f64> for Value {
    #[inline]
    fn from(value: f64) -> Self {
        Value::new(ValueType::Double, ValueData::Double(value))
    }
}

impl From<i64> for Value {
    #[inline]
    fn from(value: i64) -> Self {
        Value::new(ValueType::Int, ValueData::Int(value))
    }
}

impl From<i32> for Value {
    #[inline]
    fn from(value: i32) -> Self {
        Value::new(ValueType::Int, ValueData::Int(i64::from(value)))
    }
}

impl From<u64> for Value {
    #[inline]
    fn from(value: u64) -> Self {
        Value::new(ValueType::UInt, ValueData::UInt(value))
    }
}

impl From<u32> for Value {
    #[inline]
    fn from(value: u32) -> Self {
        Value::new(ValueType::UInt, ValueData::UInt(u64::from(value)))
    }
}

impl From<&str> for Value {
    #[inline]
    fn from(value: &str) -> Self {
        Value::new(ValueType::String, ValueData::String(value.to_owned()))
    }
}

impl From<String> for Value {
    #[inline]
    fn from(value: String) -> Self {
        Value::new(ValueType::String, ValueData::String(value))
    }
}

/// Borrowed bytes with a wire type, appended without copying into an
/// intermediate [`Value`].
///
/// Only `String`, `Binary` and `Custom` can be built this way.
#[derive(Clone, Copy, Debug)]
pub struct ValuePair<'a> {
    t: ValueType,
    bytes: &'a [u8],
}

impl<'a> ValuePair<'a> {
    pub fn string(bytes: &'a [u8]) -> ValuePair<'a> {
        ValuePair {
            t: ValueType::String,
            bytes,
        }
    }

    pub fn binary(bytes: &'a [u8]) -> ValuePair<'a> {
        ValuePair {
            t: ValueType::Binary,
            bytes,
        }
    }

    /// Reserves `bytes.len()` bytes of custom payload; the caller fills the
    /// head byte and body through the returned offset.
    pub fn custom(bytes: &'a [u8]) -> ValuePair<'a> {
        ValuePair {
            t: ValueType::Custom,
            bytes,
        }
    }

    #[inline]
    pub fn value_type(&self) -> ValueType {
        self.t
    }

    #[inline]
    pub fn bytes(&self) -> &'a [u8] {
        self.bytes
    }
}
