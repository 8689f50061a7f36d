//! Schema driven encoding and decoding of records.
//!
//! [`encode_fields`] and [`decode_fields`] walk a list of [`Field`] descriptors in order,
//! converting between a [`Record`] and its bit representation. [`encode_to_base64`] and
//! [`decode_from_base64`] add the version lookup and the base64url framing on top.
use crate::core::base64::{DecodeExt, EncodeExt};
use crate::core::bits::{
    BitsError, bool_to_bit, date_to_bits, int_to_bits, language_to_bits,
};
use crate::core::{BitString, DataReader, OutOfBounds};
use crate::record::{Record, Value};
use crate::schema::{Field, FieldType, SchemaError, VERSION_BITS, VERSION_FIELD, lookup};
use crate::vendors::VendorListError;
use num_traits::FromPrimitive;
use std::io;
use thiserror::Error;
use tracing::trace;

/// The error type for encoding records.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum EncodeError {
    #[error("missing or non integer version")]
    MissingVersion,
    #[error("unknown version {0}")]
    UnknownVersion(u64),
    #[error("field {field} expects a {expected} value, got {found}")]
    FieldType {
        field: &'static str,
        expected: FieldType,
        found: FieldType,
    },
    #[error("list {field} declares {expected} entries but holds {found}")]
    EntryCountMismatch {
        field: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("cannot encode field {field}")]
    Field {
        field: &'static str,
        source: BitsError,
    },
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),
    #[error("invalid vendor list: {0}")]
    VendorList(#[from] VendorListError),
}

/// The error type for decoding consent strings.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum DecodeError {
    #[error("unable to decode base64 string")]
    Base64(#[from] base64::DecodeError),
    #[error("read error")]
    Read(#[from] io::Error),
    #[error("unsupported version {0}")]
    UnsupportedVersion(u64),
    #[error("unexpected end of string while reading {field}")]
    UnexpectedEnd {
        field: &'static str,
        source: OutOfBounds,
    },
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),
    #[error("missing field {0}")]
    MissingField(&'static str),
    #[error("invalid value {value} for field {field}")]
    InvalidFieldValue { field: &'static str, value: u64 },
}

/// Reads a mandatory integer field of a decoded record.
pub(crate) fn required_int<T: FromPrimitive>(
    record: &Record,
    field: &'static str,
) -> Result<T, DecodeError> {
    let value = record.int(field).ok_or(DecodeError::MissingField(field))?;
    T::from_u64(value).ok_or(DecodeError::InvalidFieldValue { field, value })
}

/// Encodes the fields of a record following a schema.
///
/// Fields missing from the record are encoded as zeros. Fields whose presence condition is not
/// met are skipped, whatever the record holds for them.
pub fn encode_fields(record: &Record, fields: &[Field]) -> Result<BitString, EncodeError> {
    let mut bits = BitString::new();

    for field in fields {
        if !field.presence.is_present(record) {
            continue;
        }

        let width = field.resolve_width(record)?;
        let value = record.get(field.name);
        let wrong_type = |found: &Value| EncodeError::FieldType {
            field: field.name,
            expected: field.field_type,
            found: found.field_type(),
        };
        let invalid = |source| EncodeError::Field {
            field: field.name,
            source,
        };

        let encoded = match (field.field_type, value) {
            (FieldType::Int, None) => BitString::zeros(width),
            (FieldType::Int, Some(Value::Int(n))) => int_to_bits(*n, width).map_err(invalid)?,
            (FieldType::Bool, None) => bool_to_bit(false),
            (FieldType::Bool, Some(Value::Bool(b))) => bool_to_bit(*b),
            (FieldType::Date, None) => BitString::zeros(width),
            (FieldType::Date, Some(Value::Date(t))) => date_to_bits(*t, width).map_err(invalid)?,
            (FieldType::Bits, None) => BitString::zeros(width),
            (FieldType::Bits, Some(Value::Bits(b))) => b.clone().fit(width),
            (FieldType::Language, None) => BitString::zeros(width),
            (FieldType::Language, Some(Value::Language(l))) => {
                language_to_bits(l, width).map_err(invalid)?
            }
            (FieldType::List, value) => {
                let entries = field.entries()?;
                let expected = entries.count.resolve(record);
                let items = match value {
                    None => &[][..],
                    Some(Value::List(items)) => items.as_slice(),
                    Some(other) => return Err(wrong_type(other)),
                };
                if items.len() != expected {
                    return Err(EncodeError::EntryCountMismatch {
                        field: field.name,
                        expected,
                        found: items.len(),
                    });
                }

                let mut list = BitString::new();
                for item in items {
                    list.append(&encode_fields(item, entries.fields)?);
                }
                list
            }
            (_, Some(other)) => return Err(wrong_type(other)),
        };

        bits.append(&encoded);
    }

    Ok(bits)
}

/// Decodes fields from `start`, returning the record and the position following the last field.
pub fn decode_fields(
    bits: &[bool],
    fields: &[Field],
    start: usize,
) -> Result<(Record, usize), DecodeError> {
    let mut record = Record::new();
    let mut r = DataReader::at(bits, start);

    for field in fields {
        if !field.presence.is_present(&record) {
            continue;
        }

        let width = field.resolve_width(&record)?;
        let end = |source| DecodeError::UnexpectedEnd {
            field: field.name,
            source,
        };

        let value = match field.field_type {
            FieldType::Int => Value::Int(r.read_fixed_integer(width).map_err(end)?),
            FieldType::Bool => Value::Bool(r.read_bool().map_err(end)?),
            FieldType::Date => Value::Date(r.read_datetime_as_unix_timestamp(width).map_err(end)?),
            FieldType::Bits => Value::Bits(r.read_bit_string(width).map_err(end)?),
            FieldType::Language => Value::Language(r.read_language(width).map_err(end)?),
            FieldType::List => {
                let entries = field.entries()?;
                let count = entries.count.resolve(&record);
                let mut items = Vec::new();
                for _ in 0..count {
                    let (item, position) = decode_fields(bits, entries.fields, r.position())?;
                    r = DataReader::at(bits, position);
                    items.push(item);
                }
                Value::List(items)
            }
        };

        record.insert(field.name, value);
    }

    Ok((record, r.position()))
}

/// Encodes a record into a consent string, using the schema of its version.
///
/// An empty encoding yields an empty string.
pub fn encode_to_base64(record: &Record) -> Result<String, EncodeError> {
    let version = record
        .int(VERSION_FIELD)
        .ok_or(EncodeError::MissingVersion)?;
    let schema = lookup(version).ok_or(EncodeError::UnknownVersion(version))?;
    let bits = encode_fields(record, schema.fields)?;

    Ok(bits.to_bytes().encode_base64_url())
}

/// Decodes a consent string into a record, using the schema matching its leading version field.
pub fn decode_from_base64(s: &str) -> Result<Record, DecodeError> {
    let bytes = s.decode_base64_url()?;
    let bits = BitString::from_bytes(&bytes)?;

    let version = DataReader::new(&bits)
        .read_fixed_integer(VERSION_BITS)
        .map_err(|source| DecodeError::UnexpectedEnd {
            field: VERSION_FIELD,
            source,
        })?;
    trace!(version, "decoding consent string");

    let schema = lookup(version).ok_or(DecodeError::UnsupportedVersion(version))?;
    let (record, _) = decode_fields(&bits, schema.fields, 0)?;

    Ok(record)
}
