//! The dynamic representation of a consent string's content.
//!
//! A [`Record`] maps field names to [`Value`]s and keeps them in insertion order, which is the
//! order of the schema when the record comes out of the decoder.
use crate::core::BitString;
use crate::schema::FieldType;
use num_traits::FromPrimitive;
#[cfg(feature = "serde")]
use serde::ser::SerializeMap;
#[cfg(feature = "serde")]
use serde::{Serialize, Serializer};

/// A single field value.
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize), serde(untagged))]
pub enum Value {
    Int(u64),
    Bool(bool),
    /// Unix timestamp, in seconds.
    Date(u64),
    Bits(BitString),
    Language(String),
    List(Vec<Record>),
}

impl Value {
    pub fn field_type(&self) -> FieldType {
        match self {
            Value::Int(_) => FieldType::Int,
            Value::Bool(_) => FieldType::Bool,
            Value::Date(_) => FieldType::Date,
            Value::Bits(_) => FieldType::Bits,
            Value::Language(_) => FieldType::Language,
            Value::List(_) => FieldType::List,
        }
    }
}

macro_rules! int_value {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(n: $t) -> Self {
                    Value::Int(n.into())
                }
            }
        )*
    };
}

int_value!(u8, u16, u32, u64);

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<BitString> for Value {
    fn from(bits: BitString) -> Self {
        Value::Bits(bits)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Language(s.to_string())
    }
}

impl From<Vec<Record>> for Value {
    fn from(entries: Vec<Record>) -> Self {
        Value::List(entries)
    }
}

/// An insertion-ordered set of named values.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Record {
    fields: Vec<(String, Value)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a field, returning its previous value.
    ///
    /// A field that is already present keeps its position.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        let name = name.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some((_, v)) => Some(std::mem::replace(v, value)),
            None => {
                self.fields.push((name, value));
                None
            }
        }
    }

    /// Builder-style variant of [`Record::insert`].
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        let index = self.fields.iter().position(|(n, _)| n == name)?;
        Some(self.fields.remove(index).1)
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find_map(|(n, v)| (n == name).then_some(v))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn int(&self, name: &str) -> Option<u64> {
        match self.get(name)? {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns an integer field converted to `T`, if it fits.
    pub fn int_as<T: FromPrimitive>(&self, name: &str) -> Option<T> {
        self.int(name).and_then(T::from_u64)
    }

    pub fn bool(&self, name: &str) -> Option<bool> {
        match self.get(name)? {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn date(&self, name: &str) -> Option<u64> {
        match self.get(name)? {
            Value::Date(t) => Some(*t),
            _ => None,
        }
    }

    pub fn bits(&self, name: &str) -> Option<&BitString> {
        match self.get(name)? {
            Value::Bits(b) => Some(b),
            _ => None,
        }
    }

    pub fn language(&self, name: &str) -> Option<&str> {
        match self.get(name)? {
            Value::Language(s) => Some(s),
            _ => None,
        }
    }

    pub fn list(&self, name: &str) -> Option<&[Record]> {
        match self.get(name)? {
            Value::List(l) => Some(l),
            _ => None,
        }
    }

    /// Reads a field as a number: integers as-is, booleans as 0 or 1, anything else as 0.
    pub(crate) fn numeric(&self, name: &str) -> u64 {
        match self.get(name) {
            Some(Value::Int(n)) => *n,
            Some(Value::Bool(b)) => u64::from(*b),
            _ => 0,
        }
    }

    /// Reads a field as a flag: booleans as-is, integers as non-zero, anything else as `false`.
    pub(crate) fn flag(&self, name: &str) -> bool {
        self.numeric(name) != 0
    }
}

impl<K, V> FromIterator<(K, V)> for Record
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut record = Record::new();
        for (k, v) in iter {
            record.insert(k, v);
        }
        record
    }
}

#[cfg(feature = "serde")]
impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (k, v) in self.iter() {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}
