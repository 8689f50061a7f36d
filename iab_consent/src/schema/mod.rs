//! Field schemas and the registry of supported consent string versions.
//!
//! A schema is plain data: an ordered list of [`Field`] descriptors which the
//! [codec](crate::codec) walks to encode or decode a bit string. Widths, presence conditions and
//! list lengths which depend on the content of the string are expressed by naming an earlier
//! field of the same schema.
//!
//! Schemas are registered once and never modified afterwards.
use crate::record::Record;
use fnv::FnvHashMap;
use std::sync::LazyLock;
use strum_macros::Display;
use thiserror::Error;

pub mod v1;

/// Width in bits of the version field which starts every consent string.
pub const VERSION_BITS: usize = 6;

/// Name of the version field, the first field of every schema.
pub const VERSION_FIELD: &str = "version";

/// The kind of value a field holds.
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq, Hash)]
pub enum FieldType {
    Int,
    Bool,
    Date,
    Bits,
    List,
    Language,
}

/// A number of bits or of list entries.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Size {
    Fixed(usize),
    /// The value of an earlier integer field.
    Field(&'static str),
}

impl Size {
    pub fn resolve(&self, record: &Record) -> usize {
        match *self {
            Size::Fixed(n) => n,
            Size::Field(name) => usize::try_from(record.numeric(name)).unwrap_or(usize::MAX),
        }
    }
}

/// Whether a field is present in the string.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Presence {
    Always,
    /// Present when an earlier boolean field is set.
    IfSet(&'static str),
    /// Present when an earlier boolean field is not set.
    IfUnset(&'static str),
}

impl Presence {
    pub fn is_present(&self, record: &Record) -> bool {
        match *self {
            Presence::Always => true,
            Presence::IfSet(name) => record.flag(name),
            Presence::IfUnset(name) => !record.flag(name),
        }
    }
}

/// The nested schema of a list field and its number of entries.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Entries {
    pub fields: &'static [Field],
    pub count: Size,
}

/// The description of a single field.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Field {
    pub name: &'static str,
    pub field_type: FieldType,
    /// Ignored for booleans, which always use one bit, and for lists.
    pub width: Size,
    pub presence: Presence,
    /// Only used by lists.
    pub entries: Option<Entries>,
}

impl Field {
    pub const fn new(name: &'static str, field_type: FieldType, width: usize) -> Self {
        Self {
            name,
            field_type,
            width: Size::Fixed(width),
            presence: Presence::Always,
            entries: None,
        }
    }

    /// A field whose width is the value of an earlier field.
    pub const fn sized_by(name: &'static str, field_type: FieldType, width: &'static str) -> Self {
        Self {
            name,
            field_type,
            width: Size::Field(width),
            presence: Presence::Always,
            entries: None,
        }
    }

    pub const fn list(name: &'static str, fields: &'static [Field], count: Size) -> Self {
        Self {
            name,
            field_type: FieldType::List,
            width: Size::Fixed(0),
            presence: Presence::Always,
            entries: Some(Entries { fields, count }),
        }
    }

    pub const fn when(self, presence: Presence) -> Self {
        Self { presence, ..self }
    }

    /// Resolves the width of the field and checks that it can be handled by its type.
    pub fn resolve_width(&self, record: &Record) -> Result<usize, SchemaError> {
        let width = self.width.resolve(record);
        let valid = match self.field_type {
            FieldType::Bool => return Ok(1),
            FieldType::List => return Ok(0),
            FieldType::Int | FieldType::Date => width <= 64,
            FieldType::Language => width % 2 == 0 && width <= 64,
            FieldType::Bits => true,
        };

        if valid {
            Ok(width)
        } else {
            Err(SchemaError::InvalidWidth {
                field: self.name,
                field_type: self.field_type,
                width,
            })
        }
    }

    pub fn entries(&self) -> Result<&Entries, SchemaError> {
        self.entries
            .as_ref()
            .ok_or(SchemaError::MissingEntries { field: self.name })
    }
}

/// The error type for inconsistent schemas.
///
/// These errors reveal a defect of the schema itself, not of the data being processed.
#[derive(Error, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum SchemaError {
    #[error("list field {field} has no entry schema")]
    MissingEntries { field: &'static str },
    #[error("{field_type} field {field} cannot be {width} bits wide")]
    InvalidWidth {
        field: &'static str,
        field_type: FieldType,
        width: usize,
    },
}

/// The complete layout of one version of the consent string.
#[derive(Debug, Eq, PartialEq)]
pub struct Schema {
    pub version: u8,
    pub fields: &'static [Field],
    /// Names of the fields which make up the metadata string.
    pub metadata_fields: &'static [&'static str],
}

static REGISTRY: LazyLock<FnvHashMap<u64, &'static Schema>> = LazyLock::new(|| {
    [&v1::SCHEMA]
        .into_iter()
        .map(|schema| (u64::from(schema.version), schema))
        .collect()
});

/// Returns the schema registered for a version, if any.
pub fn lookup(version: u64) -> Option<&'static Schema> {
    REGISTRY.get(&version).copied()
}

/// Returns all the registered versions, in ascending order.
pub fn versions() -> Vec<u64> {
    let mut versions = REGISTRY.keys().copied().collect::<Vec<_>>();
    versions.sort_unstable();
    versions
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(1 => Some(1))]
    #[test_case(0 => None)]
    #[test_case(2 => None)]
    #[test_case(63 => None)]
    fn registry(version: u64) -> Option<u8> {
        lookup(version).map(|s| s.version)
    }

    #[test]
    fn registered_versions() {
        assert_eq!(versions(), vec![1]);
    }

    #[test]
    fn computed_size() {
        let r = Record::new().with("n", 12u16);

        assert_eq!(Size::Fixed(3).resolve(&r), 3);
        assert_eq!(Size::Field("n").resolve(&r), 12);
        assert_eq!(Size::Field("missing").resolve(&r), 0);
    }

    #[test]
    fn presence() {
        let r = Record::new().with("yes", true).with("no", false);

        assert!(Presence::Always.is_present(&r));
        assert!(Presence::IfSet("yes").is_present(&r));
        assert!(!Presence::IfSet("no").is_present(&r));
        assert!(!Presence::IfSet("missing").is_present(&r));
        assert!(Presence::IfUnset("no").is_present(&r));
        assert!(Presence::IfUnset("missing").is_present(&r));
    }

    #[test_case(Field::new("b", FieldType::Bool, 7) => Ok(1) ; "bool is one bit")]
    #[test_case(Field::new("i", FieldType::Int, 64) => Ok(64) ; "widest int")]
    #[test_case(Field::new("i", FieldType::Int, 65) => matches Err(SchemaError::InvalidWidth { width: 65, .. }) ; "int too wide")]
    #[test_case(Field::new("d", FieldType::Date, 80) => matches Err(SchemaError::InvalidWidth { .. }) ; "date too wide")]
    #[test_case(Field::new("l", FieldType::Language, 12) => Ok(12) ; "language")]
    #[test_case(Field::new("l", FieldType::Language, 11) => matches Err(SchemaError::InvalidWidth { .. }) ; "odd language")]
    #[test_case(Field::new("x", FieldType::Bits, 1000) => Ok(1000) ; "long bit string")]
    fn width(field: Field) -> Result<usize, SchemaError> {
        field.resolve_width(&Record::new())
    }

    #[test]
    fn list_without_entries() {
        let field = Field::new("l", FieldType::List, 0);

        assert_eq!(
            field.entries(),
            Err(SchemaError::MissingEntries { field: "l" })
        );
    }
}
