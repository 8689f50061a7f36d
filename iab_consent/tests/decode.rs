#![cfg(feature = "serde")]

mod common;

include!(concat!(env!("OUT_DIR"), "/consent_string_tests.rs"));
