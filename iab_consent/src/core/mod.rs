use crate::core::bits::{
    BitsError, bit_to_bool, bits_to_date, bits_to_int, bits_to_language,
};
use bitstream_io::{BigEndian, BitRead, BitReader};
#[cfg(feature = "serde")]
use serde::{Serialize, Serializer};
use std::fmt;
use std::io;
use std::ops::Deref;
use std::str::FromStr;
use thiserror::Error;

pub mod base64;
pub mod bits;

/// A sequence of bits, most significant first.
///
/// Its textual form is a string of `0` and `1` characters.
#[derive(Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct BitString(Vec<bool>);

impl BitString {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn zeros(len: usize) -> Self {
        Self(vec![false; len])
    }

    pub fn push(&mut self, bit: bool) {
        self.0.push(bit);
    }

    pub fn append(&mut self, other: &BitString) {
        self.0.extend_from_slice(&other.0);
    }

    /// Prepends zeros until the string is `len` bits long.
    pub fn pad_left(self, len: usize) -> Self {
        let missing = len.saturating_sub(self.len());
        let mut bits = vec![false; missing];
        bits.extend(self.0);
        Self(bits)
    }

    /// Appends zeros until the string is `len` bits long.
    pub fn pad_right(mut self, len: usize) -> Self {
        if self.len() < len {
            self.0.resize(len, false);
        }
        self
    }

    /// Right-pads with zeros or cuts the string so that it is exactly `len` bits long.
    pub fn fit(mut self, len: usize) -> Self {
        self.0.resize(len, false);
        self
    }

    /// Unpacks bytes into bits, 8 bits per byte.
    pub fn from_bytes(bytes: &[u8]) -> io::Result<Self> {
        let mut r = BitReader::endian(bytes, BigEndian);
        let bits = (0..bytes.len() * 8)
            .map(|_| r.read_bit())
            .collect::<io::Result<Vec<_>>>()?;

        Ok(Self(bits))
    }

    /// Packs bits into bytes, zero padding the last byte.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.0
            .chunks(8)
            .map(|chunk| {
                chunk
                    .iter()
                    .enumerate()
                    .fold(0u8, |byte, (i, &bit)| byte | (u8::from(bit) << (7 - i)))
            })
            .collect()
    }
}

impl Deref for BitString {
    type Target = [bool];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<Vec<bool>> for BitString {
    fn from(bits: Vec<bool>) -> Self {
        Self(bits)
    }
}

impl From<&[bool]> for BitString {
    fn from(bits: &[bool]) -> Self {
        Self(bits.to_vec())
    }
}

impl FromIterator<bool> for BitString {
    fn from_iter<T: IntoIterator<Item = bool>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl FromStr for BitString {
    type Err = BitsError;

    /// Parses a string of `0` and `1`, whitespace being ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.chars()
            .filter(|c| !c.is_whitespace())
            .map(|c| match c {
                '0' => Ok(false),
                '1' => Ok(true),
                c => Err(BitsError::InvalidDigit(c)),
            })
            .collect()
    }
}

impl fmt::Display for BitString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0
            .iter()
            .try_for_each(|&b| f.write_str(if b { "1" } else { "0" }))
    }
}

#[cfg(feature = "serde")]
impl Serialize for BitString {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// The error returned when reading past the end of a bit string.
#[derive(Error, Debug, Eq, PartialEq)]
#[error("cannot read {requested} bits at position {position}, only {available} left")]
pub struct OutOfBounds {
    pub position: usize,
    pub requested: usize,
    pub available: usize,
}

/// A cursor over a bit string.
///
/// The position only moves forward, and only by the number of bits actually read.
pub struct DataReader<'a> {
    bits: &'a [bool],
    position: usize,
}

impl<'a> DataReader<'a> {
    pub fn new(bits: &'a [bool]) -> Self {
        Self { bits, position: 0 }
    }

    pub fn at(bits: &'a [bool], position: usize) -> Self {
        Self { bits, position }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn remaining(&self) -> usize {
        self.bits.len().saturating_sub(self.position)
    }

    pub fn read_bits(&mut self, width: usize) -> Result<&'a [bool], OutOfBounds> {
        let available = self.remaining();
        if width > available {
            return Err(OutOfBounds {
                position: self.position,
                requested: width,
                available,
            });
        }

        let start = self.position;
        self.position += width;
        Ok(&self.bits[start..self.position])
    }

    pub fn read_bool(&mut self) -> Result<bool, OutOfBounds> {
        self.read_bits(1).map(bit_to_bool)
    }

    pub fn read_fixed_integer(&mut self, width: usize) -> Result<u64, OutOfBounds> {
        self.read_bits(width).map(bits_to_int)
    }

    pub fn read_datetime_as_unix_timestamp(&mut self, width: usize) -> Result<u64, OutOfBounds> {
        self.read_bits(width).map(bits_to_date)
    }

    pub fn read_language(&mut self, width: usize) -> Result<String, OutOfBounds> {
        self.read_bits(width).map(bits_to_language)
    }

    pub fn read_bit_string(&mut self, width: usize) -> Result<BitString, OutOfBounds> {
        self.read_bits(width).map(BitString::from)
    }
}
