//! This crate is an implementation of the IAB Europe GDPR
//! [Consent String](https://github.com/InteractiveAdvertisingBureau/GDPR-Transparency-and-Consent-Framework/blob/master/Consent%20string%20and%20vendor%20list%20formats%20v1.1%20Final.md)
//! format, version 1.
//!
//! It can both encode and decode consent strings.
//!
//! NOTE: This is not an official IAB library.
//!
//! # Decoding consent strings
//!
//! A consent string is a base64url encoded sequence of bit fields, starting with a version
//! number. The [`Consent`](consent/struct.Consent.html) type decodes a string into the list of
//! purposes and vendors the user has consented to.
//!
//! ```
//! # use std::error::Error;
//! #
//! # fn main() -> Result<(), Box<dyn Error>> {
//! use std::str::FromStr;
//! use iab_consent::consent::Consent;
//!
//! let consent = Consent::from_str("BOEFEAyOEFEAyAHABDENAI4AAAB9vABAASA")?;
//!
//! assert_eq!(consent.cmp_id, 7);
//! assert_eq!(consent.consent_language, "en");
//! assert!(consent.allowed_purpose_ids.contains(&1));
//! assert!(consent.allowed_vendor_ids.contains(&8));
//! assert!(!consent.allowed_vendor_ids.contains(&9));
//! # Ok(())
//! # }
//! ```
//!
//! The raw fields of a string are available as a [`Record`](record/struct.Record.html):
//!
//! ```
//! # use std::error::Error;
//! #
//! # fn main() -> Result<(), Box<dyn Error>> {
//! use iab_consent::codec::decode_from_base64;
//! use iab_consent::schema::v1::{IS_RANGE, MAX_VENDOR_ID};
//!
//! let record = decode_from_base64("BOEFEAyOEFEAyAHABDENAI4AAAB9vABAASA")?;
//!
//! assert_eq!(record.int(MAX_VENDOR_ID), Some(2011));
//! assert_eq!(record.bool(IS_RANGE), Some(true));
//! # Ok(())
//! # }
//! ```
//!
//! # Encoding consent strings
//!
//! Encoding requires the vendor list the user was presented with. Vendor consents are stored
//! either as a bitmap or as ranges of vendor IDs, whichever yields the shortest string.
//!
//! ```
//! # use std::error::Error;
//! #
//! # fn main() -> Result<(), Box<dyn Error>> {
//! use iab_consent::consent::{ConsentData, encode_consent_string};
//! use iab_consent::vendors::{Vendor, VendorList};
//!
//! let vendor_list = VendorList {
//!     vendor_list_version: 14,
//!     vendors: (1..=112)
//!         .map(|id| Vendor { id, ..Default::default() })
//!         .collect(),
//!     ..Default::default()
//! };
//!
//! let data = ConsentData {
//!     created: 1531612800,
//!     last_updated: 1531612800,
//!     cmp_id: 1,
//!     cmp_version: 2,
//!     consent_screen: 3,
//!     consent_language: "en".to_string(),
//!     allowed_purpose_ids: [1, 2].into(),
//!     allowed_vendor_ids: [1, 2, 4].into(),
//!     max_vendor_id: None,
//! };
//!
//! let s = encode_consent_string(&vendor_list, &data)?;
//! assert_eq!(s, "BOQ6ZEAOQ6ZEAABACDENAOwAAAAHCACgACAAQABA");
//! # Ok(())
//! # }
//! ```
//!
//! # Error handling
//!
//! Every read is bounds checked: a string which is shorter than its fields require is an error,
//! and so is a value which does not fit in its field when encoding.
//!
pub mod codec;
pub mod consent;
pub mod core;
pub mod record;
pub mod schema;
pub mod vendors;
