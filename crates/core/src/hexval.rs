// LabWired - Device Catalog Sync
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Arbitrary-precision numeric values with a canonical hex spelling.
//!
//! SVD documents write numbers as decimal (`255`), prefixed hex (`0xFF`),
//! prefixed binary (`0b101`), or occasionally bare hex (`FF`); stored
//! columns keep the canonical `0x`-prefixed uppercase spelling with no
//! leading zeros. [`HexValue`] carries "no usable value" in-band, so an
//! unparseable or absent number degrades to an omitted column instead of
//! a write.

use num_bigint::BigUint;

/// A non-negative number of arbitrary width, or the absence of one.
#[derive(Debug, Clone, Default)]
pub struct HexValue(Option<BigUint>);

impl HexValue {
    /// Parses decimal, `0x`/`0X` hex, `0b`/`0B` binary, or bare hex text.
    ///
    /// Anything else, including empty text, signs other than one leading
    /// `+`, and stray characters, yields the absent value.
    pub fn parse(text: &str) -> Self {
        let trimmed = text.trim();
        let trimmed = trimmed.strip_prefix('+').unwrap_or(trimmed);
        if trimmed.is_empty() {
            return Self(None);
        }
        if let Some(digits) = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
        {
            return Self::from_radix(digits, 16);
        }
        if let Some(digits) = trimmed
            .strip_prefix("0b")
            .or_else(|| trimmed.strip_prefix("0B"))
        {
            return Self::from_radix(digits, 2);
        }
        if trimmed.bytes().all(|b| b.is_ascii_digit()) {
            return Self::from_radix(trimmed, 10);
        }
        if trimmed.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Self::from_radix(trimmed, 16);
        }
        Self(None)
    }

    fn from_radix(digits: &str, radix: u32) -> Self {
        if digits.is_empty() {
            return Self(None);
        }
        Self(BigUint::parse_bytes(digits.as_bytes(), radix))
    }

    /// The absent value.
    pub fn none() -> Self {
        Self(None)
    }

    /// Whether a usable number is present.
    pub fn is_some(&self) -> bool {
        self.0.is_some()
    }

    /// Whether no usable number is present.
    pub fn is_none(&self) -> bool {
        self.0.is_none()
    }

    /// Whether the value is present and zero.
    pub fn is_zero(&self) -> bool {
        self.0.as_ref().is_some_and(|value| value.bits() == 0)
    }

    /// Canonical spelling: `0x` plus uppercase hex digits without leading
    /// zeros, zero itself as `0x0`. Absent values have no spelling.
    pub fn canonical(&self) -> Option<String> {
        self.0.as_ref().map(|value| format!("0x{value:X}"))
    }

    /// The value as a machine integer, when it fits one.
    pub fn to_u64(&self) -> Option<u64> {
        self.0.as_ref().and_then(|value| u64::try_from(value).ok())
    }

    /// Sum of two present values; absent when either side is absent.
    pub fn add(&self, other: &HexValue) -> HexValue {
        match (&self.0, &other.0) {
            (Some(a), Some(b)) => HexValue(Some(a + b)),
            _ => HexValue(None),
        }
    }
}

impl From<u64> for HexValue {
    fn from(value: u64) -> Self {
        Self(Some(BigUint::from(value)))
    }
}

impl PartialEq for HexValue {
    /// Present values compare numerically; an absent value equals nothing,
    /// itself included.
    fn eq(&self, other: &Self) -> bool {
        match (&self.0, &other.0) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }
}

impl PartialEq<str> for HexValue {
    fn eq(&self, other: &str) -> bool {
        *self == HexValue::parse(other)
    }
}

impl PartialEq<&str> for HexValue {
    fn eq(&self, other: &&str) -> bool {
        *self == HexValue::parse(other)
    }
}

impl PartialEq<u64> for HexValue {
    fn eq(&self, other: &u64) -> bool {
        *self == HexValue::from(*other)
    }
}
