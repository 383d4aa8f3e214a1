//! Self-describing reader for response bodies.
//!
//! `serde-json-core` only parses a value once it is told the type, so a field
//! reader has no way to look at what it was given. [`Reader`] walks objects
//! and arrays itself and supports `deserialize_any`. Each string, number and
//! literal is handed to `serde-json-core` as a document of its own, which
//! keeps number parsing and unescaping in that crate.

use serde::{
    de::{self, DeserializeSeed, Deserializer as _, IgnoredAny, MapAccess, SeqAccess, Visitor},
    forward_to_deserialize_any,
};
use serde_json_core::de::{Deserializer as Token, Error};

/// Parse all of `body` as `T`. Escaped strings are unescaped through `scratch`.
pub(crate) fn from_slice<'de, T>(body: &'de [u8], scratch: &mut [u8]) -> Result<T, Error>
where
    T: de::Deserialize<'de>,
{
    let mut reader = Reader::new(body, scratch);
    let value = T::deserialize(&mut reader)?;
    reader.end()?;
    Ok(value)
}

pub(crate) struct Reader<'de, 's> {
    src: &'de [u8],
    pos: usize,
    scratch: &'s mut [u8],
}

impl<'de, 's> Reader<'de, 's> {
    pub fn new(src: &'de [u8], scratch: &'s mut [u8]) -> Self {
        Self {
            src,
            pos: 0,
            scratch,
        }
    }

    /// Fails unless only whitespace is left.
    pub fn end(&mut self) -> Result<(), Error> {
        match self.peek() {
            Some(_) => Err(Error::TrailingCharacters),
            None => Ok(()),
        }
    }

    /// Next byte after any whitespace, not consumed.
    fn peek(&mut self) -> Option<u8> {
        while let Some(b' ' | b'\n' | b'\t' | b'\r') = self.src.get(self.pos) {
            self.pos += 1;
        }
        self.src.get(self.pos).copied()
    }

    fn eat(&mut self) {
        self.pos += 1;
    }

    fn close(&mut self, byte: u8, eof: Error) -> Result<(), Error> {
        match self.peek() {
            Some(b) if b == byte => {
                self.eat();
                Ok(())
            }
            Some(_) => Err(Error::TrailingCharacters),
            None => Err(eof),
        }
    }

    /// One past the closing quote of the string at `pos`.
    fn string_end(&self) -> Result<usize, Error> {
        let mut i = self.pos + 1;
        loop {
            match self.src.get(i) {
                Some(b'"') => return Ok(i + 1),
                Some(b'\\') => i += 2,
                Some(_) => i += 1,
                None => return Err(Error::EofWhileParsingString),
            }
        }
    }

    /// End of the number or literal at `pos`.
    fn bare_end(&self) -> usize {
        self.src[self.pos..]
            .iter()
            .position(|c| matches!(c, b',' | b'}' | b']' | b' ' | b'\n' | b'\t' | b'\r'))
            .map_or(self.src.len(), |n| self.pos + n)
    }

    /// Parse `pos..end` as a single token and step past it.
    fn token<T>(
        &mut self,
        end: usize,
        parse: impl FnOnce(&mut Token<'de, '_>) -> Result<T, Error>,
    ) -> Result<T, Error> {
        let src: &'de [u8] = self.src;
        let text = &src[self.pos..end];
        // Unescaping never makes a string longer. Strings that do not fit
        // are passed on as written.
        let scratch = (text.len() <= self.scratch.len()).then_some(&mut *self.scratch);
        let mut token = Token::new(text, scratch);
        let value = parse(&mut token)?;
        token.end()?;
        self.pos = end;
        Ok(value)
    }
}

impl<'de> de::Deserializer<'de> for &mut Reader<'de, '_> {
    type Error = Error;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
        match self.peek().ok_or(Error::EofWhileParsingValue)? {
            b'{' => {
                self.eat();
                let value = visitor.visit_map(Members {
                    reader: &mut *self,
                    first: true,
                })?;
                self.close(b'}', Error::EofWhileParsingObject)?;
                Ok(value)
            }
            b'[' => {
                self.eat();
                let value = visitor.visit_seq(Elements {
                    reader: &mut *self,
                    first: true,
                })?;
                self.close(b']', Error::EofWhileParsingList)?;
                Ok(value)
            }
            b'"' => {
                let end = self.string_end()?;
                self.token(end, |t| t.deserialize_str(visitor))
            }
            b't' | b'f' => {
                let end = self.bare_end();
                self.token(end, |t| t.deserialize_bool(visitor))
            }
            b'n' => {
                let end = self.bare_end();
                self.token(end, |t| t.deserialize_unit(visitor))
            }
            b'-' | b'0'..=b'9' => {
                let end = self.bare_end();
                self.token(end, |t| t.deserialize_f64(visitor))
            }
            _ => Err(Error::ExpectedSomeValue),
        }
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
        match self.peek() {
            Some(b'n') => {
                let end = self.bare_end();
                self.token(end, |t| t.deserialize_unit(IgnoredAny))?;
                visitor.visit_none()
            }
            _ => visitor.visit_some(self),
        }
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, Error> {
        visitor.visit_newtype_struct(self)
    }

    forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        bytes byte_buf unit unit_struct seq tuple tuple_struct map struct enum
        identifier ignored_any
    }
}

struct Members<'a, 'de, 's> {
    reader: &'a mut Reader<'de, 's>,
    first: bool,
}

impl<'de> MapAccess<'de> for Members<'_, 'de, '_> {
    type Error = Error;

    fn next_key_seed<K>(&mut self, seed: K) -> Result<Option<K::Value>, Error>
    where
        K: DeserializeSeed<'de>,
    {
        match self.reader.peek().ok_or(Error::EofWhileParsingObject)? {
            b'}' => return Ok(None),
            b',' if !self.first => self.reader.eat(),
            _ if !self.first => return Err(Error::ExpectedObjectCommaOrEnd),
            _ => {}
        }
        self.first = false;
        match self.reader.peek().ok_or(Error::EofWhileParsingObject)? {
            b'"' => seed.deserialize(&mut *self.reader).map(Some),
            b'}' => Err(Error::TrailingComma),
            _ => Err(Error::KeyMustBeAString),
        }
    }

    fn next_value_seed<V>(&mut self, seed: V) -> Result<V::Value, Error>
    where
        V: DeserializeSeed<'de>,
    {
        match self.reader.peek().ok_or(Error::EofWhileParsingObject)? {
            b':' => self.reader.eat(),
            _ => return Err(Error::ExpectedColon),
        }
        seed.deserialize(&mut *self.reader)
    }
}

struct Elements<'a, 'de, 's> {
    reader: &'a mut Reader<'de, 's>,
    first: bool,
}

impl<'de> SeqAccess<'de> for Elements<'_, 'de, '_> {
    type Error = Error;

    fn next_element_seed<T>(&mut self, seed: T) -> Result<Option<T::Value>, Error>
    where
        T: DeserializeSeed<'de>,
    {
        match self.reader.peek().ok_or(Error::EofWhileParsingList)? {
            b']' => return Ok(None),
            b',' if !self.first => self.reader.eat(),
            _ if !self.first => return Err(Error::ExpectedListCommaOrEnd),
            _ => {}
        }
        self.first = false;
        match self.reader.peek() {
            Some(b']') => Err(Error::TrailingComma),
            _ => seed.deserialize(&mut *self.reader).map(Some),
        }
    }
}
