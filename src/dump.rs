use std::fmt::Write;

use crate::{ArrayIterator, Error, ObjectIterator, Result, Slice, ValueType};

/// Render a value as JSON.
pub fn to_json(slice: Slice<'_>) -> Result<String> {
    let mut out = String::new();
    Dumper::new(&mut out, false).dump(slice)?;
    Ok(out)
}

/// Render a value as JSON with two-space indentation.
pub fn to_json_pretty(slice: Slice<'_>) -> Result<String> {
    let mut out = String::new();
    Dumper::new(&mut out, true).dump(slice)?;
    Ok(out)
}

struct Dumper<'o> {
    out: &'o mut String,
    pretty: bool,
    indent: usize,
}

impl<'o> Dumper<'o> {
    fn new(out: &'o mut String, pretty: bool) -> Dumper<'o> {
        Dumper {
            out,
            pretty,
            indent: 0,
        }
    }

    fn dump(&mut self, slice: Slice<'_>) -> Result<()> {
        match slice.value_type() {
            ValueType::Null => self.out.push_str("null"),
            ValueType::Bool => self
                .out
                .push_str(if slice.get_bool()? { "true" } else { "false" }),
            ValueType::Double => {
                let v = slice.get_double()?;
                if !v.is_finite() {
                    return Err(Error::NoJsonEquivalent);
                }
                let _ = write!(self.out, "{v}");
            }
            ValueType::Int | ValueType::SmallInt => {
                let _ = write!(self.out, "{}", slice.get_int()?);
            }
            ValueType::UInt => {
                let _ = write!(self.out, "{}", slice.get_uint()?);
            }
            ValueType::String => self.dump_string(slice.get_str()?),
            ValueType::Array => self.dump_array(slice)?,
            ValueType::Object => self.dump_object(slice)?,
            _ => return Err(Error::NoJsonEquivalent),
        }
        Ok(())
    }

    fn dump_array(&mut self, slice: Slice<'_>) -> Result<()> {
        let iter = ArrayIterator::new(slice)?;
        if iter.is_empty() {
            self.out.push_str("[]");
            return Ok(());
        }
        self.out.push('[');
        self.indent += 1;
        for (i, member) in iter.enumerate() {
            if i > 0 {
                self.out.push(',');
            }
            self.newline();
            self.dump(member?)?;
        }
        self.indent -= 1;
        self.newline();
        self.out.push(']');
        Ok(())
    }

    fn dump_object(&mut self, slice: Slice<'_>) -> Result<()> {
        let iter = ObjectIterator::new(slice)?;
        if iter.is_empty() {
            self.out.push_str("{}");
            return Ok(());
        }
        self.out.push('{');
        self.indent += 1;
        for (i, pair) in iter.enumerate() {
            let (key, value) = pair?;
            if i > 0 {
                self.out.push(',');
            }
            self.newline();
            self.dump_string(key.make_key()?.get_str()?);
            self.out.push(':');
            if self.pretty {
                self.out.push(' ');
            }
            self.dump(value)?;
        }
        self.indent -= 1;
        self.newline();
        self.out.push('}');
        Ok(())
    }

    fn dump_string(&mut self, s: &str) {
        self.out.push('"');
        for ch in s.chars() {
            match ch {
                '"' => self.out.push_str("\\\""),
                '\\' => self.out.push_str("\\\\"),
                '\u{8}' => self.out.push_str("\\b"),
                '\u{c}' => self.out.push_str("\\f"),
                '\n' => self.out.push_str("\\n"),
                '\r' => self.out.push_str("\\r"),
                '\t' => self.out.push_str("\\t"),
                ch if (ch as u32) < 0x20 => {
                    let _ = write!(self.out, "\\u{:04x}", ch as u32);
                }
                ch => self.out.push(ch),
            }
        }
        self.out.push('"');
    }

    fn newline(&mut self) {
        if self.pretty {
            self.out.push('\n');
            for _ in 0..self.indent {
                self.out.push_str("  ");
            }
        }
    }
}
