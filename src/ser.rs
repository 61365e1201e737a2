use serde::ser::{Error as _, Serialize, SerializeMap, SerializeSeq, Serializer};

use crate::{ArrayIterator, ObjectIterator, Slice, ValueType};

impl Serialize for Slice<'_> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self.value_type() {
            ValueType::Null => serializer.serialize_unit(),
            ValueType::Bool => {
                serializer.serialize_bool(self.get_bool().map_err(S::Error::custom)?)
            }
            ValueType::Double => {
                serializer.serialize_f64(self.get_double().map_err(S::Error::custom)?)
            }
            ValueType::Int | ValueType::SmallInt => {
                serializer.serialize_i64(self.get_int().map_err(S::Error::custom)?)
            }
            ValueType::UInt => {
                serializer.serialize_u64(self.get_uint().map_err(S::Error::custom)?)
            }
            ValueType::UTCDate => {
                serializer.serialize_i64(self.get_utc_date().map_err(S::Error::custom)?)
            }
            ValueType::String => {
                serializer.serialize_str(self.get_str().map_err(S::Error::custom)?)
            }
            ValueType::Binary => {
                serializer.serialize_bytes(self.get_binary().map_err(S::Error::custom)?)
            }
            ValueType::Array => {
                let iter = ArrayIterator::new(*self).map_err(S::Error::custom)?;
                let mut seq = serializer.serialize_seq(Some(iter.len()))?;
                for member in iter {
                    seq.serialize_element(&member.map_err(S::Error::custom)?)?;
                }
                seq.end()
            }
            ValueType::Object => {
                let iter = ObjectIterator::new(*self).map_err(S::Error::custom)?;
                let mut map = serializer.serialize_map(Some(iter.len()))?;
                for pair in iter {
                    let (key, value) = pair.map_err(S::Error::custom)?;
                    let name = key
                        .make_key()
                        .and_then(|k| k.get_str().map(str::to_owned))
                        .map_err(S::Error::custom)?;
                    map.serialize_entry(&name, &value)?;
                }
                map.end()
            }
            other => Err(S::Error::custom(format!(
                "cannot serialize value of type {other:?}"
            ))),
        }
    }
}
