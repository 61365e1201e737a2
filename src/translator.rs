use std::collections::HashMap;
use std::sync::OnceLock;

/// Process-wide mapping between attribute names and small integer ids.
///
/// When installed, the builder writes known keys as integers and the reader
/// resolves them back through [`Slice::make_key`]. The table is read-only
/// for the whole process lifetime once installed.
///
/// [`Slice::make_key`]: crate::Slice::make_key
pub trait AttributeTranslator: Send + Sync {
    /// The id a name translates to, if any.
    fn key_to_id(&self, name: &str) -> Option<u64>;

    /// The encoded String value for an id, starting at its head byte.
    fn id_to_key(&self, id: u64) -> Option<&[u8]>;
}

static TRANSLATOR: OnceLock<Box<dyn AttributeTranslator>> = OnceLock::new();

/// Install the process attribute translator. Returns `false` if one is
/// already installed.
pub fn set_attribute_translator(translator: Box<dyn AttributeTranslator>) -> bool {
    TRANSLATOR.set(translator).is_ok()
}

#[inline]
pub(crate) fn attribute_translator() -> Option<&'static dyn AttributeTranslator> {
    TRANSLATOR.get().map(|boxed| &**boxed)
}

/// Table-backed [`AttributeTranslator`].
#[derive(Default)]
pub struct BasicAttributeTranslator {
    ids: HashMap<String, u64>,
    keys: HashMap<u64, Vec<u8>>,
}

impl BasicAttributeTranslator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a name under an id. The stored key value is the name's
    /// String encoding, so lookups hand back navigable bytes.
    pub fn add(&mut self, name: &str, id: u64) {
        let bytes = name.as_bytes();
        let mut encoded = Vec::with_capacity(1 + 8 + bytes.len());
        if bytes.len() <= 126 {
            encoded.push(0x40 + bytes.len() as u8);
        } else {
            encoded.push(0xbf);
            encoded.extend_from_slice(&(bytes.len() as u64).to_le_bytes());
        }
        encoded.extend_from_slice(bytes);
        self.ids.insert(name.to_owned(), id);
        self.keys.insert(id, encoded);
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

impl AttributeTranslator for BasicAttributeTranslator {
    fn key_to_id(&self, name: &str) -> Option<u64> {
        self.ids.get(name).copied()
    }

    fn id_to_key(&self, id: u64) -> Option<&[u8]> {
        self.keys.get(&id).map(Vec::as_slice)
    }
}
