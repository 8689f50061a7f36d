//! Typed consent strings.
//!
//! [`encode_consent_string`] builds a version 1 consent string from a vendor list and the user's
//! choices, picking the shortest of the two vendor encodings. [`Consent`] is the typed result
//! of decoding such a string.
use crate::codec::{
    DecodeError, EncodeError, decode_from_base64, encode_to_base64, required_int,
};
use crate::record::{Record, Value};
use crate::schema::v1::*;
use crate::schema::{VERSION_FIELD, lookup};
use crate::vendors::{
    IdSet, VendorList, VendorRange, convert_vendors_to_ranges, decode_bits_to_ids,
    encode_purpose_ids_to_bits, encode_vendor_ids_to_bits, expand_vendor_ranges,
};
#[cfg(feature = "serde")]
use serde::Serialize;
use std::str::FromStr;
use tracing::debug;

/// The user's choices and the CMP information to store in a consent string.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ConsentData {
    /// Unix timestamp, in seconds.
    pub created: u64,
    /// Unix timestamp, in seconds.
    pub last_updated: u64,
    pub cmp_id: u16,
    pub cmp_version: u16,
    pub consent_screen: u8,
    pub consent_language: String,
    pub allowed_purpose_ids: IdSet,
    pub allowed_vendor_ids: IdSet,
    /// `None` or zero default to the highest vendor ID of the vendor list.
    pub max_vendor_id: Option<u16>,
}

impl ConsentData {
    fn header(&self, vendor_list_version: u16) -> Record {
        Record::new()
            .with(VERSION, SCHEMA.version)
            .with(CREATED, Value::Date(self.created))
            .with(LAST_UPDATED, Value::Date(self.last_updated))
            .with(CMP_ID, self.cmp_id)
            .with(CMP_VERSION, self.cmp_version)
            .with(CONSENT_SCREEN, self.consent_screen)
            .with(CONSENT_LANGUAGE, self.consent_language.as_str())
            .with(VENDOR_LIST_VERSION, vendor_list_version)
    }
}

/// Encodes a version 1 consent string.
///
/// Vendor consents are encoded both as a bitmap and as a list of ranges, and the shortest
/// string is returned. The bitmap wins ties, and is also used when the ranges do not fit in
/// their entry count field.
///
/// The vendor list is validated and sorted on a private copy.
pub fn encode_consent_string(
    vendor_list: &VendorList,
    data: &ConsentData,
) -> Result<String, EncodeError> {
    let list = vendor_list.sorted()?;
    let max_vendor_id = data
        .max_vendor_id
        .filter(|&id| id != 0)
        .unwrap_or_else(|| list.max_vendor_id());

    let header = data
        .header(list.vendor_list_version)
        .with(
            PURPOSE_ID_BIT_STRING,
            encode_purpose_ids_to_bits(&list.purposes, &data.allowed_purpose_ids),
        )
        .with(MAX_VENDOR_ID, max_vendor_id);

    let bitmap = encode_to_base64(
        &header
            .clone()
            .with(IS_RANGE, false)
            .with(
                VENDOR_ID_BIT_STRING,
                encode_vendor_ids_to_bits(max_vendor_id, &data.allowed_vendor_ids),
            ),
    )?;

    let ranges = convert_vendors_to_ranges(&list.vendors, &data.allowed_vendor_ids);
    let range = encode_to_base64(
        &header
            .with(IS_RANGE, true)
            .with(DEFAULT_CONSENT, false)
            .with(NUM_ENTRIES, ranges.len() as u64)
            .with(
                VENDOR_RANGE_LIST,
                ranges.iter().map(Record::from).collect::<Vec<_>>(),
            ),
    )
    .inspect_err(|e| debug!(ranges = ranges.len(), error = %e, "range encoding dropped"))
    .ok();

    debug!(
        bitmap = bitmap.len(),
        range = range.as_ref().map(String::len),
        "encoded vendor consent candidates"
    );

    Ok(match range {
        Some(range) if range.len() < bitmap.len() => range,
        _ => bitmap,
    })
}

/// A decoded consent string.
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize), serde(rename_all = "camelCase"))]
pub struct Consent {
    pub version: u8,
    /// Unix timestamp, in seconds.
    pub created: u64,
    /// Unix timestamp, in seconds.
    pub last_updated: u64,
    pub cmp_id: u16,
    pub cmp_version: u16,
    pub consent_screen: u8,
    pub consent_language: String,
    pub vendor_list_version: u16,
    pub max_vendor_id: u16,
    pub allowed_purpose_ids: IdSet,
    pub allowed_vendor_ids: IdSet,
}

impl Consent {
    pub fn metadata(&self) -> Metadata {
        Metadata {
            version: self.version,
            created: self.created,
            last_updated: self.last_updated,
            cmp_id: self.cmp_id,
            cmp_version: self.cmp_version,
            consent_screen: self.consent_screen,
            vendor_list_version: self.vendor_list_version,
        }
    }
}

fn required_date(record: &Record, field: &'static str) -> Result<u64, DecodeError> {
    record.date(field).ok_or(DecodeError::MissingField(field))
}

fn allowed_vendor_ids(record: &Record, max_vendor_id: u16) -> Result<IdSet, DecodeError> {
    let is_range = record
        .bool(IS_RANGE)
        .ok_or(DecodeError::MissingField(IS_RANGE))?;

    if !is_range {
        let bits = record
            .bits(VENDOR_ID_BIT_STRING)
            .ok_or(DecodeError::MissingField(VENDOR_ID_BIT_STRING))?;
        return Ok(decode_bits_to_ids(bits));
    }

    let default_consent = record
        .bool(DEFAULT_CONSENT)
        .ok_or(DecodeError::MissingField(DEFAULT_CONSENT))?;
    let ranges = record
        .list(VENDOR_RANGE_LIST)
        .ok_or(DecodeError::MissingField(VENDOR_RANGE_LIST))?
        .iter()
        .map(VendorRange::from_record)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(expand_vendor_ranges(max_vendor_id, default_consent, &ranges))
}

impl TryFrom<&Record> for Consent {
    type Error = DecodeError;

    fn try_from(record: &Record) -> Result<Self, Self::Error> {
        let max_vendor_id = required_int(record, MAX_VENDOR_ID)?;
        let purposes = record
            .bits(PURPOSE_ID_BIT_STRING)
            .ok_or(DecodeError::MissingField(PURPOSE_ID_BIT_STRING))?;

        Ok(Self {
            version: required_int(record, VERSION)?,
            created: required_date(record, CREATED)?,
            last_updated: required_date(record, LAST_UPDATED)?,
            cmp_id: required_int(record, CMP_ID)?,
            cmp_version: required_int(record, CMP_VERSION)?,
            consent_screen: required_int(record, CONSENT_SCREEN)?,
            consent_language: record
                .language(CONSENT_LANGUAGE)
                .ok_or(DecodeError::MissingField(CONSENT_LANGUAGE))?
                .to_string(),
            vendor_list_version: required_int(record, VENDOR_LIST_VERSION)?,
            max_vendor_id,
            allowed_purpose_ids: decode_bits_to_ids(purposes),
            allowed_vendor_ids: allowed_vendor_ids(record, max_vendor_id)?,
        })
    }
}

impl FromStr for Consent {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_from(&decode_from_base64(s)?)
    }
}

/// The fields of a consent string which describe how and when it was created.
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize), serde(rename_all = "camelCase"))]
pub struct Metadata {
    pub version: u8,
    /// Unix timestamp, in seconds.
    pub created: u64,
    /// Unix timestamp, in seconds.
    pub last_updated: u64,
    pub cmp_id: u16,
    pub cmp_version: u16,
    pub consent_screen: u8,
    pub vendor_list_version: u16,
}

impl From<&Metadata> for Record {
    fn from(m: &Metadata) -> Self {
        Record::new()
            .with(VERSION, m.version)
            .with(CREATED, Value::Date(m.created))
            .with(LAST_UPDATED, Value::Date(m.last_updated))
            .with(CMP_ID, m.cmp_id)
            .with(CMP_VERSION, m.cmp_version)
            .with(CONSENT_SCREEN, m.consent_screen)
            .with(VENDOR_LIST_VERSION, m.vendor_list_version)
    }
}

impl TryFrom<&Record> for Metadata {
    type Error = DecodeError;

    fn try_from(record: &Record) -> Result<Self, Self::Error> {
        Ok(Self {
            version: required_int(record, VERSION)?,
            created: required_date(record, CREATED)?,
            last_updated: required_date(record, LAST_UPDATED)?,
            cmp_id: required_int(record, CMP_ID)?,
            cmp_version: required_int(record, CMP_VERSION)?,
            consent_screen: required_int(record, CONSENT_SCREEN)?,
            vendor_list_version: required_int(record, VENDOR_LIST_VERSION)?,
        })
    }
}

/// Keeps the metadata fields of a record, as listed by the schema of its version.
fn project(record: &Record, metadata_fields: &[&str]) -> Record {
    record
        .iter()
        .filter(|(name, _)| metadata_fields.contains(name))
        .map(|(name, value)| (name, value.clone()))
        .collect()
}

/// Encodes a consent string holding only metadata, all other fields being zeros.
pub fn encode_metadata_string(metadata: &Metadata) -> Result<String, EncodeError> {
    let version = u64::from(metadata.version);
    let schema = lookup(version).ok_or(EncodeError::UnknownVersion(version))?;
    let record = project(&Record::from(metadata), schema.metadata_fields);

    encode_to_base64(&record)
}

/// Decodes the metadata of a consent string.
pub fn decode_metadata_string(s: &str) -> Result<Metadata, DecodeError> {
    let record = decode_from_base64(s)?;
    let version = record
        .int(VERSION_FIELD)
        .ok_or(DecodeError::MissingField(VERSION_FIELD))?;
    let schema = lookup(version).ok_or(DecodeError::UnsupportedVersion(version))?;

    Metadata::try_from(&project(&record, schema.metadata_fields))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vendors::{Purpose, Vendor, VendorListError};
    use test_case::test_case;

    fn vendor_list(vendor_ids: impl IntoIterator<Item = u16>) -> VendorList {
        VendorList {
            vendor_list_version: 14,
            purposes: (1..=5)
                .map(|id| Purpose {
                    id,
                    ..Default::default()
                })
                .collect(),
            vendors: vendor_ids
                .into_iter()
                .map(|id| Vendor {
                    id,
                    ..Default::default()
                })
                .collect(),
            ..Default::default()
        }
    }

    fn data(allowed_vendor_ids: impl IntoIterator<Item = u16>) -> ConsentData {
        ConsentData {
            created: 1531612800,
            last_updated: 1531612800,
            cmp_id: 1,
            cmp_version: 2,
            consent_screen: 3,
            consent_language: "en".to_string(),
            allowed_purpose_ids: [1, 2].into(),
            allowed_vendor_ids: allowed_vendor_ids.into_iter().collect(),
            max_vendor_id: None,
        }
    }

    #[test_case([1, 2, 4].to_vec() => "BOQ6ZEAOQ6ZEAABACDENAOwAAAAHCACgACAAQABA" ; "few vendors use ranges")]
    #[test_case((1..=112).step_by(2).collect() => "BOQ6ZEAOQ6ZEAABACDENAOwAAAAHBVVVVVVVVVVVVVVVVVVQ" ; "scattered vendors use a bitmap")]
    #[test_case((1..=112).collect() => "BOQ6ZEAOQ6ZEAABACDENAOwAAAAHCABgACAOAA" ; "all vendors use a single range")]
    fn format_selection(allowed: Vec<u16>) -> String {
        encode_consent_string(&vendor_list(1..=112), &data(allowed)).unwrap()
    }

    #[test]
    fn ties_keep_the_bitmap() {
        let encoded = encode_consent_string(&vendor_list(1..=46), &data(1..=46)).unwrap();

        // the range encoding, BOQ6ZEAOQ6ZEAABACDENAOwAAAAC6ABgACAFwA, is as long
        assert_eq!(encoded, "BOQ6ZEAOQ6ZEAABACDENAOwAAAAC5_______4A");
    }

    #[test]
    fn explicit_max_vendor_id() {
        let data = ConsentData {
            max_vendor_id: Some(200),
            ..data([1, 2, 4])
        };

        assert_eq!(
            encode_consent_string(&vendor_list(1..=112), &data).unwrap(),
            "BOQ6ZEAOQ6ZEAABACDENAOwAAAAMiACgACAAQABA"
        );
    }

    #[test]
    fn zero_max_vendor_id_uses_vendor_list() {
        let data = ConsentData {
            max_vendor_id: Some(0),
            ..data([1, 2, 4])
        };

        assert_eq!(
            encode_consent_string(&vendor_list(1..=112), &data).unwrap(),
            "BOQ6ZEAOQ6ZEAABACDENAOwAAAAHCACgACAAQABA"
        );
    }

    #[test]
    fn too_many_ranges_keep_the_bitmap() {
        // every other vendor, so each allowed vendor is its own range
        let ids = (1..=5000).map(|i| i * 2).collect::<Vec<u16>>();
        let encoded =
            encode_consent_string(&vendor_list(ids.clone()), &data(ids.clone())).unwrap();

        let record = decode_from_base64(&encoded).unwrap();
        assert_eq!(record.bool(IS_RANGE), Some(false));

        let consent = Consent::from_str(&encoded).unwrap();
        assert_eq!(consent.max_vendor_id, 10000);
        assert_eq!(consent.allowed_vendor_ids, ids.into_iter().collect::<IdSet>());
    }

    #[test]
    fn vendor_list_is_not_modified() {
        let list = vendor_list([3, 1, 2, 7]);

        assert_eq!(
            encode_consent_string(&list, &data([1, 2, 7])).unwrap(),
            "BOQ6ZEAOQ6ZEAABACDENAOwAAAAAdhA"
        );
        assert_eq!(
            list.vendors.iter().map(|v| v.id).collect::<Vec<_>>(),
            vec![3, 1, 2, 7]
        );
    }

    #[test]
    fn invalid_vendor_list() {
        let list = VendorList {
            vendor_list_version: 0,
            ..vendor_list(1..=3)
        };

        assert!(matches!(
            encode_consent_string(&list, &data([1])),
            Err(EncodeError::VendorList(VendorListError::MissingVersion))
        ));
    }

    #[test_case((1..=112).step_by(3).collect() ; "bitmap")]
    #[test_case((1..=40).chain(60..=112).collect() ; "ranges")]
    #[test_case(Vec::new() ; "no vendors")]
    fn round_trip(allowed: Vec<u16>) {
        let data = data(allowed);
        let encoded = encode_consent_string(&vendor_list(1..=112), &data).unwrap();
        let consent = encoded.parse::<Consent>().unwrap();

        assert_eq!(
            consent,
            Consent {
                version: 1,
                created: data.created,
                last_updated: data.last_updated,
                cmp_id: data.cmp_id,
                cmp_version: data.cmp_version,
                consent_screen: data.consent_screen,
                consent_language: data.consent_language.clone(),
                vendor_list_version: 14,
                max_vendor_id: 112,
                allowed_purpose_ids: data.allowed_purpose_ids.clone(),
                allowed_vendor_ids: data.allowed_vendor_ids.clone(),
            }
        );
    }

    #[test]
    fn decode_default_consent() {
        let consent = Consent::from_str("BOEFEAyOEFEAyAHABDENAI4AAAB9vABAASA").unwrap();

        assert_eq!(
            consent,
            Consent {
                version: 1,
                created: 1510082155,
                last_updated: 1510082155,
                cmp_id: 7,
                cmp_version: 1,
                consent_screen: 3,
                consent_language: "en".to_string(),
                vendor_list_version: 8,
                max_vendor_id: 2011,
                allowed_purpose_ids: [1, 2, 3].into(),
                allowed_vendor_ids: (1..=2011).filter(|&id| id != 9).collect(),
            }
        );
    }

    #[test]
    fn decode_bitmap() {
        let consent = Consent::from_str("BOQ7WlgOQ7WlgABACDENAOwAAAAAhQg").unwrap();

        assert_eq!(consent.max_vendor_id, 8);
        assert_eq!(consent.allowed_vendor_ids, [1, 3, 8].into());
        assert_eq!(consent.allowed_purpose_ids, [1, 2].into());
    }

    #[test_case("CA" => matches DecodeError::UnsupportedVersion(2) ; "unsupported version")]
    #[test_case("BOQ7Wlg" => matches DecodeError::UnexpectedEnd { .. } ; "truncated")]
    #[test_case("B!" => matches DecodeError::Base64(_) ; "invalid base64")]
    fn decode_error(s: &str) -> DecodeError {
        Consent::from_str(s).unwrap_err()
    }

    #[test]
    fn missing_field() {
        let record = decode_from_base64("BOQ7WlgOQ7WlgABACDENAOwAAAAAhQg")
            .unwrap()
            .with(CMP_ID, true);

        assert!(matches!(
            Consent::try_from(&record),
            Err(DecodeError::MissingField(CMP_ID))
        ));
    }

    fn metadata() -> Metadata {
        Metadata {
            version: 1,
            created: 1531612800,
            last_updated: 1531612800,
            cmp_id: 1,
            cmp_version: 2,
            consent_screen: 3,
            vendor_list_version: 14,
        }
    }

    #[test]
    fn encode_metadata() {
        assert_eq!(
            encode_metadata_string(&metadata()).unwrap(),
            "BOQ6ZEAOQ6ZEAABACDAAAOAAAAAAAA"
        );
    }

    #[test_case("BOQ6ZEAOQ6ZEAABACDAAAOAAAAAAAA" ; "metadata string")]
    #[test_case("BOQ6ZEAOQ6ZEAABACDENAOwAAAAHCACgACAAQABA" ; "full string")]
    #[test_case("BOQ6ZEAOQ6ZEAABACDENAOwAAAAHBVVVVVVVVVVVVVVVVVVQ" ; "full string with bitmap")]
    fn decode_metadata(s: &str) {
        assert_eq!(decode_metadata_string(s).unwrap(), metadata());
    }

    #[test]
    fn metadata_of_consent() {
        let consent = Consent::from_str("BOQ6ZEAOQ6ZEAABACDENAOwAAAAHCACgACAAQABA").unwrap();
        assert_eq!(consent.metadata(), metadata());
    }

    #[test]
    fn metadata_unknown_version() {
        let metadata = Metadata {
            version: 3,
            ..metadata()
        };

        assert!(matches!(
            encode_metadata_string(&metadata),
            Err(EncodeError::UnknownVersion(3))
        ));
    }
}
