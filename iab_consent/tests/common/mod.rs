use assert_json_diff::assert_json_eq;
use iab_consent::codec::{decode_from_base64, encode_to_base64};
use iab_consent::consent::Consent;
use serde::Deserialize;
use std::fs::File;
use std::io;
use std::io::ErrorKind;
use std::path::Path;
use std::str::FromStr;

/// A consent string and the JSON form of the consent it holds.
#[derive(Deserialize)]
pub struct ConsentStringFile {
    consent_string: String,
    expected: serde_json::Value,
}

impl ConsentStringFile {
    pub fn load<P: AsRef<Path>>(p: P) -> io::Result<Self> {
        let f = File::open(p)?;
        serde_json::from_reader(&f).map_err(|e| io::Error::new(ErrorKind::InvalidData, e))
    }

    fn consent(s: &str) -> Consent {
        match Consent::from_str(s) {
            Ok(consent) => consent,
            Err(e) => panic!("consent string {s:?} decode error: {e}"),
        }
    }

    pub fn assert_json_matches(&self) {
        assert_json_eq!(Self::consent(&self.consent_string), self.expected);
    }

    /// Dates lose their sub-second part and trailing padding bits are dropped, so the strings
    /// may differ while the consents must not.
    pub fn assert_reencoding_keeps_consent(&self) {
        let record = decode_from_base64(&self.consent_string).unwrap();
        let reencoded = encode_to_base64(&record).unwrap();

        assert_eq!(
            Self::consent(&reencoded),
            Self::consent(&self.consent_string)
        );
    }
}
