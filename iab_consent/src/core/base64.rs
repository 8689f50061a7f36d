use base64::alphabet::URL_SAFE;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::{DecodeError, Engine};

/// URL Safe Base64 with 8-bit groups.
///
/// Output is never padded, while input is accepted with or without `=` padding.
/// Bits past the last full byte are ignored on decode.
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

pub trait DecodeExt {
    fn decode_base64_url(&self) -> Result<Vec<u8>, DecodeError>;
}

impl DecodeExt for str {
    fn decode_base64_url(&self) -> Result<Vec<u8>, DecodeError> {
        URL_SAFE_LENIENT.decode(self)
    }
}

pub trait EncodeExt {
    fn encode_base64_url(&self) -> String;
}

impl EncodeExt for [u8] {
    fn encode_base64_url(&self) -> String {
        URL_SAFE_LENIENT.encode(self)
    }
}
