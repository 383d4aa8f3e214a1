//! Field readers for upstream JSON that fall back to a default instead of
//! failing the whole document.
//!
//! Every reader asks for `deserialize_any` and looks at what it got: a value
//! of the expected kind is kept, anything else is skipped and read as the
//! default. Numbers arrive as `f64`, so `12` and `12.0` both land in an
//! integer field.

use core::{fmt, marker::PhantomData};

use heapless::{String, Vec};
use serde::de::{
    self, Deserialize, Deserializer, IgnoredAny, MapAccess, SeqAccess, Visitor,
    value::MapAccessDeserializer,
};

use crate::text::truncate_into;

/// Numeric field types that can be produced from a JSON number.
pub trait FromNumber: Default {
    fn from_f64(v: f64) -> Self;
}

macro_rules! from_number {
    ($($t:ty),*) => {
        $(impl FromNumber for $t {
            // `as` saturates at the type's bounds.
            fn from_f64(v: f64) -> Self {
                v as $t
            }
        })*
    };
}

from_number!(f32, f64, i32, u8, u16, u32, u64);

/// Visitor methods that read the listed kinds of value as `Default::default()`.
macro_rules! default_for {
    (@number $de:lifetime) => {
        fn visit_f64<E: de::Error>(self, _: f64) -> Result<Self::Value, E> {
            Ok(Default::default())
        }
    };
    (@str $de:lifetime) => {
        fn visit_str<E: de::Error>(self, _: &str) -> Result<Self::Value, E> {
            Ok(Default::default())
        }
    };
    (@bool $de:lifetime) => {
        fn visit_bool<E: de::Error>(self, _: bool) -> Result<Self::Value, E> {
            Ok(Default::default())
        }
    };
    (@null $de:lifetime) => {
        fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(Default::default())
        }
    };
    (@array $de:lifetime) => {
        fn visit_seq<A: SeqAccess<$de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
            while seq.next_element::<IgnoredAny>()?.is_some() {}
            Ok(Default::default())
        }
    };
    (@object $de:lifetime) => {
        fn visit_map<A: MapAccess<$de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
            while map.next_entry::<IgnoredAny, IgnoredAny>()?.is_some() {}
            Ok(Default::default())
        }
    };
    ($de:lifetime; $($kind:ident),*) => {
        $(default_for!(@$kind $de);)*
    };
}

/// Any number; zero for non-finite values and for anything that is not a number.
pub fn number<'de, D, T>(d: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: FromNumber,
{
    d.deserialize_any(NumberVisitor(PhantomData))
}

/// A string cut to `N` bytes; anything that is not a string reads as empty.
pub fn text<'de, D, const N: usize>(d: D) -> Result<String<N>, D::Error>
where
    D: Deserializer<'de>,
{
    d.deserialize_any(TextVisitor::<N>)
}

/// An object decoded as `T`, or `T::default()` when the value is not an object.
pub fn object<'de, D, T>(d: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(d.deserialize_any(ObjectVisitor(PhantomData))?
        .unwrap_or_default())
}

/// The first element of an array, or `T::default()` for an empty or missing one.
pub fn first<'de, D, T>(d: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    let items: Vec<T, 1> = bounded(d)?;
    Ok(items.into_iter().next().unwrap_or_default())
}

/// Up to `N` leading array elements in order; the rest are skipped.
pub fn bounded<'de, D, T, const N: usize>(d: D) -> Result<Vec<T, N>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(d.deserialize_any(ListVisitor(PhantomData))?
        .unwrap_or_default())
}

/// A top-level object; `None` if the document is some other kind of value.
pub struct Document<T>(pub Option<T>);

impl<'de, T> Deserialize<'de> for Document<T>
where
    T: Deserialize<'de> + Default,
{
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        d.deserialize_any(ObjectVisitor(PhantomData)).map(Document)
    }
}

/// A top-level array of at most `N` objects; `None` if the document is not an array.
pub struct List<T, const N: usize>(pub Option<Vec<T, N>>);

impl<'de, T, const N: usize> Deserialize<'de> for List<T, N>
where
    T: Deserialize<'de> + Default,
{
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        d.deserialize_any(ListVisitor(PhantomData)).map(List)
    }
}

/// Array element that tolerates non-object entries.
struct Element<T>(T);

impl<'de, T> Deserialize<'de> for Element<T>
where
    T: Deserialize<'de> + Default,
{
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        object(d).map(Element)
    }
}

struct NumberVisitor<T>(PhantomData<T>);

impl<'de, T: FromNumber> Visitor<'de> for NumberVisitor<T> {
    type Value = T;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a number")
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<T, E> {
        Ok(if v.is_finite() {
            T::from_f64(v)
        } else {
            T::default()
        })
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<T, E> {
        self.visit_f64(v as f64)
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<T, E> {
        self.visit_f64(v as f64)
    }

    default_for!('de; str, bool, null, array, object);
}

struct TextVisitor<const N: usize>;

impl<'de, const N: usize> Visitor<'de> for TextVisitor<N> {
    type Value = String<N>;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a string")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        Ok(truncate_into(v))
    }

    default_for!('de; number, bool, null, array, object);
}

struct ObjectVisitor<T>(PhantomData<T>);

impl<'de, T> Visitor<'de> for ObjectVisitor<T>
where
    T: Deserialize<'de> + Default,
{
    type Value = Option<T>;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("an object")
    }

    fn visit_map<A: MapAccess<'de>>(self, map: A) -> Result<Self::Value, A::Error> {
        T::deserialize(MapAccessDeserializer::new(map)).map(Some)
    }

    default_for!('de; number, str, bool, null, array);
}

struct ListVisitor<T, const N: usize>(PhantomData<T>);

impl<'de, T, const N: usize> Visitor<'de> for ListVisitor<T, N>
where
    T: Deserialize<'de> + Default,
{
    type Value = Option<Vec<T, N>>;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("an array")
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
        let mut items = Vec::new();
        while !items.is_full() {
            match seq.next_element::<Element<T>>()? {
                Some(Element(item)) => {
                    let _ = items.push(item);
                }
                None => return Ok(Some(items)),
            }
        }
        while seq.next_element::<IgnoredAny>()?.is_some() {}
        Ok(Some(items))
    }

    default_for!('de; number, str, bool, null, object);
}
