//! Version 1 of the consent string.
use crate::schema::{Field, FieldType, Presence, Schema, Size, VERSION_BITS, VERSION_FIELD};

pub const VERSION: &str = VERSION_FIELD;
pub const CREATED: &str = "created";
pub const LAST_UPDATED: &str = "lastUpdated";
pub const CMP_ID: &str = "cmpId";
pub const CMP_VERSION: &str = "cmpVersion";
pub const CONSENT_SCREEN: &str = "consentScreen";
pub const CONSENT_LANGUAGE: &str = "consentLanguage";
pub const VENDOR_LIST_VERSION: &str = "vendorListVersion";
pub const PURPOSE_ID_BIT_STRING: &str = "purposeIdBitString";
pub const MAX_VENDOR_ID: &str = "maxVendorId";
pub const IS_RANGE: &str = "isRange";
pub const VENDOR_ID_BIT_STRING: &str = "vendorIdBitString";
pub const DEFAULT_CONSENT: &str = "defaultConsent";
pub const NUM_ENTRIES: &str = "numEntries";
pub const VENDOR_RANGE_LIST: &str = "vendorRangeList";
pub const START_VENDOR_ID: &str = "startVendorId";
pub const END_VENDOR_ID: &str = "endVendorId";

pub const PURPOSE_BITS: usize = 24;

const RANGE_ENTRY: &[Field] = &[
    Field::new(IS_RANGE, FieldType::Bool, 1),
    Field::new(START_VENDOR_ID, FieldType::Int, 16),
    Field::new(END_VENDOR_ID, FieldType::Int, 16).when(Presence::IfSet(IS_RANGE)),
];

pub static SCHEMA: Schema = Schema {
    version: 1,
    fields: &[
        Field::new(VERSION, FieldType::Int, VERSION_BITS),
        Field::new(CREATED, FieldType::Date, 36),
        Field::new(LAST_UPDATED, FieldType::Date, 36),
        Field::new(CMP_ID, FieldType::Int, 12),
        Field::new(CMP_VERSION, FieldType::Int, 12),
        Field::new(CONSENT_SCREEN, FieldType::Int, 6),
        Field::new(CONSENT_LANGUAGE, FieldType::Language, 12),
        Field::new(VENDOR_LIST_VERSION, FieldType::Int, 12),
        Field::new(PURPOSE_ID_BIT_STRING, FieldType::Bits, PURPOSE_BITS),
        Field::new(MAX_VENDOR_ID, FieldType::Int, 16),
        Field::new(IS_RANGE, FieldType::Bool, 1),
        Field::sized_by(VENDOR_ID_BIT_STRING, FieldType::Bits, MAX_VENDOR_ID)
            .when(Presence::IfUnset(IS_RANGE)),
        Field::new(DEFAULT_CONSENT, FieldType::Bool, 1).when(Presence::IfSet(IS_RANGE)),
        Field::new(NUM_ENTRIES, FieldType::Int, 12).when(Presence::IfSet(IS_RANGE)),
        Field::list(VENDOR_RANGE_LIST, RANGE_ENTRY, Size::Field(NUM_ENTRIES))
            .when(Presence::IfSet(IS_RANGE)),
    ],
    metadata_fields: &[
        VERSION,
        CREATED,
        LAST_UPDATED,
        CMP_ID,
        CMP_VERSION,
        CONSENT_SCREEN,
        VENDOR_LIST_VERSION,
    ],
};
