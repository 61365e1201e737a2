use crate::{Error, Result, Slice};

/// Lazy walk over the members of an array.
///
/// Works for every array encoding; members are visited in insertion order.
#[derive(Clone)]
pub struct ArrayIterator<'a> {
    container: Slice<'a>,
    length: usize,
    position: usize,
    current: usize,
}

impl<'a> ArrayIterator<'a> {
    pub fn new(container: Slice<'a>) -> Result<ArrayIterator<'a>> {
        if !container.is_array() {
            return Err(Error::UnexpectedType("need an array"));
        }
        let length = container.length()?;
        let current = if length > 0 {
            container.data_offset()?
        } else {
            0
        };
        Ok(ArrayIterator {
            container,
            length,
            position: 0,
            current,
        })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.length
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }
}

impl<'a> Iterator for ArrayIterator<'a> {
    type Item = Result<Slice<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.position >= self.length {
            return None;
        }
        let value = Slice::new(&self.container.start()[self.current..]);
        match value.byte_size() {
            Ok(size) => self.current += size,
            Err(error) => {
                self.position = self.length;
                return Some(Err(error));
            }
        }
        self.position += 1;
        Some(Ok(value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.length - self.position;
        (remaining, Some(remaining))
    }
}

/// Lazy walk over the key/value pairs of an object, in insertion order.
///
/// Keys are yielded raw; call [`Slice::make_key`] to resolve translated
/// keys to their names.
#[derive(Clone)]
pub struct ObjectIterator<'a> {
    container: Slice<'a>,
    length: usize,
    position: usize,
    current: usize,
}

impl<'a> ObjectIterator<'a> {
    pub fn new(container: Slice<'a>) -> Result<ObjectIterator<'a>> {
        if !container.is_object() {
            return Err(Error::UnexpectedType("need an object"));
        }
        let length = container.length()?;
        let current = if length > 0 {
            container.data_offset()?
        } else {
            0
        };
        Ok(ObjectIterator {
            container,
            length,
            position: 0,
            current,
        })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.length
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }
}

impl<'a> Iterator for ObjectIterator<'a> {
    type Item = Result<(Slice<'a>, Slice<'a>)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.position >= self.length {
            return None;
        }
        let data = self.container.start();
        let key = Slice::new(&data[self.current..]);
        let key_size = match key.byte_size() {
            Ok(size) => size,
            Err(error) => {
                self.position = self.length;
                return Some(Err(error));
            }
        };
        let value = Slice::new(&data[self.current + key_size..]);
        match value.byte_size() {
            Ok(size) => self.current += key_size + size,
            Err(error) => {
                self.position = self.length;
                return Some(Err(error));
            }
        }
        self.position += 1;
        Some(Ok((key, value)))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.length - self.position;
        (remaining, Some(remaining))
    }
}
