//! Conversions between plain values and fixed-width bit strings.
//!
//! All functions here work on MSB-first bit strings, the order in which fields are laid out in a
//! consent string.
use crate::core::BitString;
use thiserror::Error;

/// The error type for conversions of values into bits.
#[derive(Error, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum BitsError {
    /// The binary representation of the value is wider than the field.
    #[error("value {value} does not fit in {width} bits")]
    Overflow { value: u64, width: usize },
    /// Only ASCII letters can be encoded.
    #[error("invalid letter {0:?}")]
    InvalidLetter(char),
    /// A language code is made of exactly two letters.
    #[error("invalid language code {0:?}")]
    InvalidLanguage(String),
    /// A textual bit string may only contain `0` and `1`.
    #[error("invalid bit character {0:?}")]
    InvalidDigit(char),
}

/// Renders `value` in binary, left padded with zeros to `width` bits.
pub fn int_to_bits(value: u64, width: usize) -> Result<BitString, BitsError> {
    let natural = (u64::BITS - value.leading_zeros()) as usize;
    if natural > width {
        return Err(BitsError::Overflow { value, width });
    }

    Ok((0..width)
        .rev()
        .map(|i| i < 64 && (value >> i) & 1 == 1)
        .collect())
}

/// Parses bits as an unsigned base-2 integer.
///
/// Only the 64 least significant bits are kept.
pub fn bits_to_int(bits: &[bool]) -> u64 {
    bits.iter().fold(0, |acc, &b| (acc << 1) | u64::from(b))
}

pub fn bool_to_bit(value: bool) -> BitString {
    BitString::from(vec![value])
}

/// Reads the first bit, an empty slice being `false`.
pub fn bit_to_bool(bits: &[bool]) -> bool {
    bits.first().copied().unwrap_or(false)
}

/// Encodes a Unix timestamp (seconds) with decisecond resolution.
pub fn date_to_bits(timestamp: u64, width: usize) -> Result<BitString, BitsError> {
    let deciseconds = timestamp
        .checked_mul(10)
        .ok_or(BitsError::Overflow {
            value: timestamp,
            width,
        })?;
    int_to_bits(deciseconds, width)
}

/// Decodes a decisecond timestamp into Unix seconds.
pub fn bits_to_date(bits: &[bool]) -> u64 {
    bits_to_int(bits) / 10 // seconds
}

/// Encodes a letter as its offset from `A`, ignoring case.
pub fn letter_to_bits(letter: char, width: usize) -> Result<BitString, BitsError> {
    let upper = letter.to_ascii_uppercase();
    if !upper.is_ascii_uppercase() {
        return Err(BitsError::InvalidLetter(letter));
    }
    int_to_bits(u64::from(upper) - u64::from(b'A'), width)
}

/// Decodes a letter offset, always yielding lowercase letters.
///
/// Offsets beyond `Z` are not rejected and map to the following code points.
pub fn bits_to_letter(bits: &[bool]) -> char {
    u32::try_from(bits_to_int(bits))
        .ok()
        .and_then(|n| n.checked_add(u32::from(b'A')))
        .and_then(char::from_u32)
        .map(|c| c.to_ascii_lowercase())
        .unwrap_or(char::REPLACEMENT_CHARACTER)
}

/// Encodes a two-letter language code, each letter using half of `width`.
pub fn language_to_bits(language: &str, width: usize) -> Result<BitString, BitsError> {
    let mut chars = language.chars();
    match (chars.next(), chars.next(), chars.next()) {
        (Some(first), Some(second), None) => {
            let mut bits = letter_to_bits(first, width / 2)?;
            bits.append(&letter_to_bits(second, width / 2)?);
            Ok(bits)
        }
        _ => Err(BitsError::InvalidLanguage(language.to_string())),
    }
}

pub fn bits_to_language(bits: &[bool]) -> String {
    let (first, second) = bits.split_at(bits.len() / 2);
    [bits_to_letter(first), bits_to_letter(second)]
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn s(bits: &str) -> BitString {
        bits.parse().unwrap()
    }

    #[test_case(123, 12 => "000001111011" ; "padded")]
    #[test_case(123, 7 => "1111011" ; "exact width")]
    #[test_case(0, 6 => "000000" ; "zero")]
    #[test_case(0, 0 => "" ; "empty")]
    #[test_case(u64::MAX, 66 => format!("00{}", "1".repeat(64)) ; "wider than u64")]
    fn int(value: u64, width: usize) -> String {
        int_to_bits(value, width).unwrap().to_string()
    }

    #[test_case(123, 6 ; "too narrow")]
    #[test_case(1, 0 ; "no room at all")]
    #[test_case(64, 6 ; "just over")]
    fn int_overflow(value: u64, width: usize) {
        assert_eq!(
            int_to_bits(value, width).unwrap_err(),
            BitsError::Overflow { value, width }
        );
    }

    #[test_case("000001111011" => 123)]
    #[test_case("1111011" => 123 ; "unpadded")]
    #[test_case("" => 0 ; "empty")]
    fn int_from_bits(bits: &str) -> u64 {
        bits_to_int(&s(bits))
    }

    #[test]
    fn int_from_bits_window() {
        let bits = s("111 000001111011 111");
        assert_eq!(bits_to_int(&bits[3..15]), 123);
    }

    #[test_case(true => "1")]
    #[test_case(false => "0")]
    fn bool_bits(value: bool) -> String {
        bool_to_bit(value).to_string()
    }

    #[test_case("1" => true)]
    #[test_case("0" => false)]
    #[test_case("" => false ; "empty")]
    fn bool_from_bits(bits: &str) -> bool {
        bit_to_bool(&s(bits))
    }

    #[test_case(1512661975, 36 => "001110000101100111011110011001100110" ; "padded")]
    #[test_case(1512661975, 34 => "1110000101100111011110011001100110" ; "exact width")]
    fn date(timestamp: u64, width: usize) -> String {
        date_to_bits(timestamp, width).unwrap().to_string()
    }

    #[test]
    fn date_overflow() {
        assert!(matches!(
            date_to_bits(u64::MAX, 64),
            Err(BitsError::Overflow { .. })
        ));
        assert!(matches!(
            date_to_bits(1 << 40, 36),
            Err(BitsError::Overflow { .. })
        ));
    }

    #[test_case("001110000101100111011110011001100110" => 1512661975)]
    #[test_case("001110000101100111011110011001100111" => 1512661975 ; "sub second is dropped")]
    #[test_case("000000000000000000000000000000000000" => 0)]
    fn date_from_bits(bits: &str) -> u64 {
        bits_to_date(&s(bits))
    }

    #[test_case('a', 6 => "000000")]
    #[test_case('K', 6 => "001010")]
    #[test_case('k', 6 => "001010" ; "lowercase k")]
    #[test_case('z', 6 => "011001")]
    #[test_case('z', 5 => "11001" ; "exact width")]
    fn letter(c: char, width: usize) -> String {
        letter_to_bits(c, width).unwrap().to_string()
    }

    #[test_case('1' ; "digit")]
    #[test_case('é' ; "accented")]
    #[test_case(' ' ; "space")]
    fn letter_invalid(c: char) {
        assert_eq!(letter_to_bits(c, 6).unwrap_err(), BitsError::InvalidLetter(c));
    }

    #[test_case("000000" => 'a')]
    #[test_case("001010" => 'k')]
    #[test_case("011001" => 'z')]
    #[test_case("011010" => '[' ; "past z")]
    fn letter_from_bits(bits: &str) -> char {
        bits_to_letter(&s(bits))
    }

    #[test_case("en" => "000100001101")]
    #[test_case("EN" => "000100001101" ; "uppercase en")]
    #[test_case("fr" => "000101010001")]
    #[test_case("FR" => "000101010001" ; "uppercase fr")]
    fn language(code: &str) -> String {
        language_to_bits(code, 12).unwrap().to_string()
    }

    #[test_case("" ; "empty")]
    #[test_case("e" ; "single letter")]
    #[test_case("eng" ; "three letters")]
    #[test_case("e1" ; "digit")]
    fn language_invalid(code: &str) {
        assert!(language_to_bits(code, 12).is_err());
    }

    #[test_case("000100001101" => "en")]
    #[test_case("000101010001" => "fr")]
    #[test_case("0010101101" => "fn" ; "five bits per letter")]
    fn language_from_bits(bits: &str) -> String {
        bits_to_language(&s(bits))
    }
}
