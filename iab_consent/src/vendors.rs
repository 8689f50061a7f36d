//! Vendor lists and the two representations of vendor consents.
//!
//! Vendor consents are stored either as a bitmap with one bit per vendor ID, or as a list of
//! [`VendorRange`]s which are exceptions to a default consent.
use crate::codec::{DecodeError, required_int};
use crate::core::BitString;
use crate::record::Record;
use crate::schema::v1::{END_VENDOR_ID, IS_RANGE, START_VENDOR_ID};
use fnv::FnvHashSet;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::ops::RangeInclusive;
use thiserror::Error;

pub type IdSet = BTreeSet<u16>;

/// The error type for invalid vendor list documents.
#[derive(Error, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum VendorListError {
    #[error("vendor list has no version")]
    MissingVersion,
}

/// A Global Vendor List document.
///
/// Only the IDs of purposes and vendors matter to the encoder, the other attributes are kept
/// for display purposes.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "camelCase", default)
)]
pub struct VendorList {
    pub vendor_list_version: u16,
    pub last_updated: Option<String>,
    pub purposes: Vec<Purpose>,
    pub features: Vec<Feature>,
    pub vendors: Vec<Vendor>,
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "camelCase", default)
)]
pub struct Purpose {
    pub id: u16,
    pub name: String,
    pub description: String,
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "camelCase", default)
)]
pub struct Feature {
    pub id: u16,
    pub name: String,
    pub description: String,
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "camelCase", default)
)]
pub struct Vendor {
    pub id: u16,
    pub name: String,
    pub policy_url: Option<String>,
    pub purpose_ids: Vec<u16>,
    pub leg_int_purpose_ids: Vec<u16>,
    pub feature_ids: Vec<u16>,
}

impl VendorList {
    pub fn validate(&self) -> Result<(), VendorListError> {
        if self.vendor_list_version == 0 {
            return Err(VendorListError::MissingVersion);
        }
        Ok(())
    }

    /// Validates the list and returns a copy of it with vendors sorted by ID.
    pub fn sorted(&self) -> Result<Self, VendorListError> {
        self.validate()?;

        let mut list = self.clone();
        list.vendors.sort_by_key(|v| v.id);
        Ok(list)
    }

    /// Highest vendor ID of the list, 0 if it has no vendors.
    pub fn max_vendor_id(&self) -> u16 {
        self.vendors.iter().map(|v| v.id).max().unwrap_or(0)
    }

    /// Highest purpose ID of the list, 0 if it has no purposes.
    pub fn max_purpose_id(&self) -> u16 {
        self.purposes.iter().map(|p| p.id).max().unwrap_or(0)
    }
}

/// A run of consecutive vendor IDs, or a single ID.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize), serde(rename_all = "camelCase"))]
pub struct VendorRange {
    pub is_range: bool,
    pub start_vendor_id: u16,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub end_vendor_id: Option<u16>,
}

impl VendorRange {
    pub fn single(id: u16) -> Self {
        Self {
            is_range: false,
            start_vendor_id: id,
            end_vendor_id: None,
        }
    }

    pub fn range(start: u16, end: u16) -> Self {
        Self {
            is_range: true,
            start_vendor_id: start,
            end_vendor_id: Some(end),
        }
    }

    fn from_run(start: u16, end: u16) -> Self {
        if start == end {
            Self::single(start)
        } else {
            Self::range(start, end)
        }
    }

    /// The IDs covered by this range.
    pub fn ids(&self) -> RangeInclusive<u16> {
        match self.end_vendor_id {
            Some(end) if self.is_range => self.start_vendor_id..=end,
            _ => self.start_vendor_id..=self.start_vendor_id,
        }
    }

    /// Reads a range from an entry of the decoded range list.
    pub fn from_record(record: &Record) -> Result<Self, DecodeError> {
        let is_range = record
            .bool(IS_RANGE)
            .ok_or(DecodeError::MissingField(IS_RANGE))?;
        let start = required_int(record, START_VENDOR_ID)?;

        Ok(if is_range {
            Self::range(start, required_int(record, END_VENDOR_ID)?)
        } else {
            Self::single(start)
        })
    }
}

impl From<&VendorRange> for Record {
    fn from(range: &VendorRange) -> Self {
        let mut record = Record::new()
            .with(IS_RANGE, range.is_range)
            .with(START_VENDOR_ID, range.start_vendor_id);
        if let Some(end) = range.end_vendor_id.filter(|_| range.is_range) {
            record.insert(END_VENDOR_ID, end);
        }
        record
    }
}

/// Builds a bitmap of `max_vendor_id` bits where bit `i` is set if vendor `i + 1` is allowed.
///
/// Allowed IDs above `max_vendor_id` are ignored.
pub fn encode_vendor_ids_to_bits(max_vendor_id: u16, allowed: &IdSet) -> BitString {
    (1..=max_vendor_id).map(|id| allowed.contains(&id)).collect()
}

/// Builds a bitmap of purposes, long enough for both the known and the allowed purposes.
pub fn encode_purpose_ids_to_bits(purposes: &[Purpose], allowed: &IdSet) -> BitString {
    let max = purposes
        .iter()
        .map(|p| p.id)
        .chain(allowed.iter().copied())
        .max()
        .unwrap_or(0);

    (1..=max).map(|id| allowed.contains(&id)).collect()
}

/// Returns the IDs of the set bits of a bitmap, the first bit being ID 1.
pub fn decode_bits_to_ids(bits: &[bool]) -> IdSet {
    bits.iter()
        .enumerate()
        .filter(|(_, set)| **set)
        .filter_map(|(i, _)| u16::try_from(i + 1).ok())
        .collect()
}

/// Compresses the allowed vendors into ranges of consecutive IDs.
///
/// `vendors` must be sorted by ID. A run is closed on a vendor which is not allowed, on the
/// last vendor, and before an ID which is not part of the list.
pub fn convert_vendors_to_ranges(vendors: &[Vendor], allowed: &IdSet) -> Vec<VendorRange> {
    let known = vendors.iter().map(|v| v.id).collect::<FnvHashSet<_>>();
    let mut ranges = Vec::new();
    let mut run: Option<(u16, u16)> = None;

    for (i, vendor) in vendors.iter().enumerate() {
        let id = vendor.id;
        let is_allowed = allowed.contains(&id);
        if is_allowed {
            run = Some(match run {
                Some((start, _)) => (start, id),
                None => (id, id),
            });
        }

        let is_last = i + 1 == vendors.len();
        let gap = id.checked_add(1).is_none_or(|next| !known.contains(&next));
        if !is_allowed || is_last || gap {
            if let Some((start, end)) = run.take() {
                ranges.push(VendorRange::from_run(start, end));
            }
        }
    }

    ranges
}

/// Resolves the allowed vendors of a range encoding.
///
/// Ranges list the exceptions to `default_consent`.
pub fn expand_vendor_ranges(
    max_vendor_id: u16,
    default_consent: bool,
    ranges: &[VendorRange],
) -> IdSet {
    let listed = ranges
        .iter()
        .flat_map(VendorRange::ids)
        .collect::<FnvHashSet<_>>();

    (1..=max_vendor_id)
        .filter(|id| default_consent ^ listed.contains(id))
        .collect()
}
