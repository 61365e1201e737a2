use std::fmt::{self, Display};

/// Alias for a `Result` with the error type [`Error`].
///
/// This is used throughout the crate for consistency.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// `close`, `add` or a query was called while no array or object is open.
    NeedOpenCompound,

    /// The operation requires the innermost open container to be an array.
    NeedOpenArray,

    /// The operation requires the innermost open container to be an object.
    NeedOpenObject,

    /// `remove_last` was called on a container with no subvalues.
    NeedSubvalue,

    /// A key was added while the previous key still has no value.
    KeyAlreadyWritten,

    /// A non-string value was appended where an object key is expected.
    KeyMustBeString,

    /// The requested wire type cannot be produced by this operation.
    UnexpectedType(&'static str),

    /// The carried scalar does not fit the requested wire type.
    UnexpectedValue(&'static str),

    /// A number is outside the representable range of the requested type.
    NumberOutOfRange,

    /// The same attribute name occurs twice in one object.
    ///
    /// Only raised when [`Options::check_attribute_uniqueness`] is set, and
    /// only while the object's hash table is built during `close`.
    ///
    /// [`Options::check_attribute_uniqueness`]: crate::Options::check_attribute_uniqueness
    DuplicateAttributeName,

    /// External values are disabled by [`Options::disallow_externals`].
    ///
    /// [`Options::disallow_externals`]: crate::Options::disallow_externals
    ExternalsDisallowed,

    /// The wire type exists but is not supported by this implementation (BCD).
    NotImplemented,

    /// The builder still has open containers, so its buffer is not yet a
    /// complete value.
    NotSealed,

    /// An integer key was found but no attribute translator is installed.
    NeedAttributeTranslator,

    /// The value has no representation in JSON (dates, binary, externals,
    /// min/max keys, illegal).
    NoJsonEquivalent,

    /// Array index past the end of the container.
    IndexOutOfBounds,

    /// A head byte that is reserved or cannot be navigated was encountered.
    InvalidHead(u8),

    /// A string value does not hold valid UTF-8.
    InvalidUtf8,

    /// JSON text could not be parsed; `pos` is the byte offset of the error.
    Parse { msg: &'static str, pos: usize },

    /// A custom error message from serde.
    #[cfg(feature = "serde")]
    Message(String),
}

impl Display for Error {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::NeedOpenCompound => formatter.write_str("need an open array or object"),
            Error::NeedOpenArray => formatter.write_str("need an open array"),
            Error::NeedOpenObject => formatter.write_str("need an open object"),
            Error::NeedSubvalue => formatter.write_str("need a subvalue"),
            Error::KeyAlreadyWritten => {
                formatter.write_str("a key has been written but no value yet")
            }
            Error::KeyMustBeString => formatter.write_str("object keys must be strings"),
            Error::UnexpectedType(message) => {
                write!(formatter, "unexpected type: {message}")
            }
            Error::UnexpectedValue(message) => {
                write!(formatter, "unexpected value: {message}")
            }
            Error::NumberOutOfRange => formatter.write_str("number out of range"),
            Error::DuplicateAttributeName => formatter.write_str("duplicate attribute name"),
            Error::ExternalsDisallowed => formatter.write_str("external values are disallowed"),
            Error::NotImplemented => formatter.write_str("not implemented"),
            Error::NotSealed => formatter.write_str("builder value is not sealed"),
            Error::NeedAttributeTranslator => {
                formatter.write_str("no attribute translator is installed")
            }
            Error::NoJsonEquivalent => formatter.write_str("value has no JSON equivalent"),
            Error::IndexOutOfBounds => formatter.write_str("index out of bounds"),
            Error::InvalidHead(head) => {
                write!(formatter, "invalid head byte: {head:#04x}")
            }
            Error::InvalidUtf8 => formatter.write_str("string is not valid UTF-8"),
            Error::Parse { msg, pos } => {
                write!(formatter, "JSON parse error at byte {pos}: {msg}")
            }
            #[cfg(feature = "serde")]
            Error::Message(message) => formatter.write_str(message),
        }
    }
}

impl std::error::Error for Error {}

#[cfg(feature = "serde")]
impl serde::ser::Error for Error {
    fn custom<T: Display>(msg: T) -> Self {
        Error::Message(msg.to_string())
    }
}
