use crate::{Builder, Error, Options, Result, Value, cold_path};

/// Parse JSON text into a sealed [`Builder`].
pub fn parse_json(input: &str) -> Result<Builder> {
    parse_json_with_options(input, Options::default())
}

/// Parse JSON text into a sealed [`Builder`] using the given options, so
/// compact container encodings can be requested for the whole document.
pub fn parse_json_with_options(input: &str, options: Options) -> Result<Builder> {
    let mut parser = Parser {
        bytes: input.as_bytes(),
        pos: 0,
        builder: Builder::with_options(options),
    };
    parser.skip_whitespace();
    parser.parse_value()?;
    parser.skip_whitespace();
    if parser.pos != parser.bytes.len() {
        return Err(Error::Parse {
            msg: "trailing characters after value",
            pos: parser.pos,
        });
    }
    Ok(parser.builder)
}

struct Parser<'i> {
    bytes: &'i [u8],
    pos: usize,
    builder: Builder,
}

impl Parser<'_> {
    #[inline]
    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn skip_whitespace(&mut self) {
        while let Some(b' ' | b'\t' | b'\n' | b'\r') = self.peek() {
            self.pos += 1;
        }
    }

    fn error<T>(&self, msg: &'static str) -> Result<T> {
        cold_path();
        Err(Error::Parse { msg, pos: self.pos })
    }

    fn expect_literal(&mut self, literal: &'static [u8], msg: &'static str) -> Result<()> {
        if self.bytes[self.pos..].starts_with(literal) {
            self.pos += literal.len();
            Ok(())
        } else {
            self.error(msg)
        }
    }

    fn parse_value(&mut self) -> Result<()> {
        match self.peek() {
            None => self.error("unexpected end of input"),
            Some(b'n') => {
                self.expect_literal(b"null", "expected null")?;
                self.builder.add(Value::null())?;
                Ok(())
            }
            Some(b't') => {
                self.expect_literal(b"true", "expected true")?;
                self.builder.add(true)?;
                Ok(())
            }
            Some(b'f') => {
                self.expect_literal(b"false", "expected false")?;
                self.builder.add(false)?;
                Ok(())
            }
            Some(b'"') => {
                let s = self.parse_string()?;
                self.builder.add(s)?;
                Ok(())
            }
            Some(b'[') => self.parse_array(),
            Some(b'{') => self.parse_object(),
            Some(b'-' | b'0'..=b'9') => self.parse_number(),
            Some(_) => self.error("unexpected character"),
        }
    }

    fn parse_array(&mut self) -> Result<()> {
        self.pos += 1;
        self.builder.add(Value::array())?;
        self.skip_whitespace();
        if self.peek() == Some(b']') {
            self.pos += 1;
            self.builder.close()?;
            return Ok(());
        }
        loop {
            self.parse_value()?;
            self.skip_whitespace();
            match self.peek() {
                Some(b',') => {
                    self.pos += 1;
                    self.skip_whitespace();
                }
                Some(b']') => {
                    self.pos += 1;
                    self.builder.close()?;
                    return Ok(());
                }
                _ => return self.error("expected ',' or ']'"),
            }
        }
    }

    fn parse_object(&mut self) -> Result<()> {
        self.pos += 1;
        self.builder.add(Value::object())?;
        self.skip_whitespace();
        if self.peek() == Some(b'}') {
            self.pos += 1;
            self.builder.close()?;
            return Ok(());
        }
        loop {
            if self.peek() != Some(b'"') {
                return self.error("expected object key");
            }
            let key = self.parse_string()?;
            self.builder.add(key)?;
            self.skip_whitespace();
            if self.peek() != Some(b':') {
                return self.error("expected ':'");
            }
            self.pos += 1;
            self.skip_whitespace();
            self.parse_value()?;
            self.skip_whitespace();
            match self.peek() {
                Some(b',') => {
                    self.pos += 1;
                    self.skip_whitespace();
                }
                Some(b'}') => {
                    self.pos += 1;
                    self.builder.close()?;
                    return Ok(());
                }
                _ => return self.error("expected ',' or '}'"),
            }
        }
    }

    fn parse_number(&mut self) -> Result<()> {
        let start = self.pos;
        if self.peek() == Some(b'-') {
            self.pos += 1;
        }
        let digits_start = self.pos;
        while let Some(b'0'..=b'9') = self.peek() {
            self.pos += 1;
        }
        if self.pos == digits_start {
            return self.error("expected digit");
        }
        if self.bytes[digits_start] == b'0' && self.pos - digits_start > 1 {
            return Err(Error::Parse {
                msg: "leading zero in number",
                pos: digits_start,
            });
        }
        let mut is_integer = true;
        if self.peek() == Some(b'.') {
            is_integer = false;
            self.pos += 1;
            let fraction_start = self.pos;
            while let Some(b'0'..=b'9') = self.peek() {
                self.pos += 1;
            }
            if self.pos == fraction_start {
                return self.error("expected fraction digit");
            }
        }
        if let Some(b'e' | b'E') = self.peek() {
            is_integer = false;
            self.pos += 1;
            if let Some(b'+' | b'-') = self.peek() {
                self.pos += 1;
            }
            let exponent_start = self.pos;
            while let Some(b'0'..=b'9') = self.peek() {
                self.pos += 1;
            }
            if self.pos == exponent_start {
                return self.error("expected exponent digit");
            }
        }

        let text = std::str::from_utf8(&self.bytes[start..self.pos]).unwrap();
        if is_integer {
            if let Ok(v) = text.parse::<i64>() {
                self.builder.add(v)?;
                return Ok(());
            }
            if let Ok(v) = text.parse::<u64>() {
                self.builder.add(v)?;
                return Ok(());
            }
        }
        match text.parse::<f64>() {
            Ok(v) if v.is_finite() => {
                self.builder.add(v)?;
                Ok(())
            }
            _ => Err(Error::Parse {
                msg: "number out of range",
                pos: start,
            }),
        }
    }

    fn parse_string(&mut self) -> Result<String> {
        // opening quote
        self.pos += 1;
        let mut out = String::new();
        let mut run_start = self.pos;
        loop {
            let Some(byte) = self.peek() else {
                return self.error("unterminated string");
            };
            match byte {
                b'"' => {
                    out.push_str(self.run(run_start)?);
                    self.pos += 1;
                    return Ok(out);
                }
                b'\\' => {
                    out.push_str(self.run(run_start)?);
                    self.pos += 1;
                    self.parse_escape(&mut out)?;
                    run_start = self.pos;
                }
                0x00..=0x1f => return self.error("control character in string"),
                _ => self.pos += 1,
            }
        }
    }

    fn run(&self, start: usize) -> Result<&str> {
        // the input is a &str and runs break at ASCII bytes, so the span
        // stays valid UTF-8
        std::str::from_utf8(&self.bytes[start..self.pos]).map_err(|_| Error::Parse {
            msg: "invalid UTF-8 in string",
            pos: start,
        })
    }

    fn parse_escape(&mut self, out: &mut String) -> Result<()> {
        let Some(byte) = self.peek() else {
            return self.error("unterminated escape");
        };
        self.pos += 1;
        match byte {
            b'"' => out.push('"'),
            b'\\' => out.push('\\'),
            b'/' => out.push('/'),
            b'b' => out.push('\u{8}'),
            b'f' => out.push('\u{c}'),
            b'n' => out.push('\n'),
            b'r' => out.push('\r'),
            b't' => out.push('\t'),
            b'u' => {
                let high = self.parse_hex4()?;
                let code = if (0xd800..=0xdbff).contains(&high) {
                    // surrogate pair
                    self.expect_literal(b"\\u", "expected low surrogate")?;
                    let low = self.parse_hex4()?;
                    if !(0xdc00..=0xdfff).contains(&low) {
                        return self.error("invalid low surrogate");
                    }
                    0x10000 + ((high - 0xd800) << 10) + (low - 0xdc00)
                } else if (0xdc00..=0xdfff).contains(&high) {
                    return self.error("unpaired low surrogate");
                } else {
                    high
                };
                match char::from_u32(code) {
                    Some(ch) => out.push(ch),
                    None => return self.error("invalid unicode escape"),
                }
            }
            _ => return self.error("invalid escape"),
        }
        Ok(())
    }

    fn parse_hex4(&mut self) -> Result<u32> {
        let mut code = 0u32;
        for _ in 0..4 {
            let Some(byte) = self.peek() else {
                return self.error("unterminated unicode escape");
            };
            let digit = match byte {
                b'0'..=b'9' => u32::from(byte - b'0'),
                b'a'..=b'f' => u32::from(byte - b'a') + 10,
                b'A'..=b'F' => u32::from(byte - b'A') + 10,
                _ => return self.error("invalid hex digit"),
            };
            code = (code << 4) | digit;
            self.pos += 1;
        }
        Ok(code)
    }
}
