//! Manual (ad-hoc) formatting detected on paragraphs and spans.
//!
//! `ManualFormat` is a small bit set. It is used both as metadata on a
//! declared style ("this style already encodes BOLD") and as transient state
//! derived while walking a paragraph.

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{BitAnd, BitAndAssign, BitOr, BitOrAssign, Not, Sub};
use std::str::FromStr;
use thiserror::Error;

/// Returned when parsing a formatting name that is not a known flag.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown manual format flag '{0}'")]
pub struct UnknownFormat(pub String);

/// A set of manual formatting flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ManualFormat(u16);

impl ManualFormat {
    pub const NORMAL: Self = Self(0);
    pub const CENTERED: Self = Self(1 << 0);
    pub const JUSTIFIED: Self = Self(1 << 1);
    pub const NEW_PAGE: Self = Self(1 << 2);
    pub const SPACED: Self = Self(1 << 3);
    pub const RTL: Self = Self(1 << 4);
    pub const LTR: Self = Self(1 << 5);
    pub const INDENTED: Self = Self(1 << 6);
    pub const BOLD: Self = Self(1 << 7);
    pub const ITALIC: Self = Self(1 << 8);
    pub const SUBSCRIPT: Self = Self(1 << 9);
    pub const SUPERSCRIPT: Self = Self(1 << 10);
    pub const RAISED: Self = Self(1 << 11);
    pub const LOWERED: Self = Self(1 << 12);
    pub const HIGHLIGHT: Self = Self(1 << 13);

    /// Every named flag, in canonical order.
    pub const NAMED: [(&'static str, ManualFormat); 14] = [
        ("CENTERED", Self::CENTERED),
        ("JUSTIFIED", Self::JUSTIFIED),
        ("NEW_PAGE", Self::NEW_PAGE),
        ("SPACED", Self::SPACED),
        ("RTL", Self::RTL),
        ("LTR", Self::LTR),
        ("INDENTED", Self::INDENTED),
        ("BOLD", Self::BOLD),
        ("ITALIC", Self::ITALIC),
        ("SUBSCRIPT", Self::SUBSCRIPT),
        ("SUPERSCRIPT", Self::SUPERSCRIPT),
        ("RAISED", Self::RAISED),
        ("LOWERED", Self::LOWERED),
        ("HIGHLIGHT", Self::HIGHLIGHT),
    ];

    const ALL_BITS: u16 = (1 << 14) - 1;

    pub const fn from_bits_truncate(bits: u16) -> Self {
        Self(bits & Self::ALL_BITS)
    }

    pub const fn bits(self) -> u16 {
        self.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// True if every flag of `other` is also set here.
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: Self) {
        self.0 &= !other.0;
    }

    /// Names of the set flags, in canonical order.
    pub fn names(self) -> impl Iterator<Item = &'static str> {
        Self::NAMED
            .into_iter()
            .filter(move |(_, flag)| self.contains(*flag))
            .map(|(name, _)| name)
    }

    /// The name used for synthesized styles: set flags joined with `_`, or `NORMAL`.
    pub fn style_suffix(self) -> String {
        if self.is_empty() {
            "NORMAL".to_string()
        } else {
            self.names().join("_")
        }
    }
}

impl BitOr for ManualFormat {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for ManualFormat {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for ManualFormat {
    type Output = Self;
    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl BitAndAssign for ManualFormat {
    fn bitand_assign(&mut self, rhs: Self) {
        self.0 &= rhs.0;
    }
}

impl Not for ManualFormat {
    type Output = Self;
    fn not(self) -> Self {
        Self(!self.0 & Self::ALL_BITS)
    }
}

impl Sub for ManualFormat {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self(self.0 & !rhs.0)
    }
}

impl fmt::Display for ManualFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            f.write_str("NORMAL")
        } else {
            f.write_str(&self.names().join("|"))
        }
    }
}

impl FromStr for ManualFormat {
    type Err = UnknownFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut format = ManualFormat::NORMAL;
        for part in s.split(['|', ',']).map(str::trim).filter(|p| !p.is_empty()) {
            if part.eq_ignore_ascii_case("NORMAL") {
                continue;
            }
            let (_, flag) = Self::NAMED
                .iter()
                .find(|(name, _)| name.eq_ignore_ascii_case(part))
                .ok_or_else(|| UnknownFormat(part.to_string()))?;
            format |= *flag;
        }
        Ok(format)
    }
}

impl TryFrom<String> for ManualFormat {
    type Error = UnknownFormat;
    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ManualFormat> for String {
    fn from(value: ManualFormat) -> Self {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_union_and_intersection() {
        let fmt = ManualFormat::BOLD | ManualFormat::ITALIC;
        assert!(fmt.contains(ManualFormat::BOLD));
        assert_eq!(fmt & ManualFormat::ITALIC, ManualFormat::ITALIC);
        assert_eq!(fmt - ManualFormat::BOLD, ManualFormat::ITALIC);
        assert!((fmt & ManualFormat::CENTERED).is_empty());
    }

    #[test]
    fn test_negation_stays_within_known_flags() {
        let mask = !ManualFormat::LTR;
        assert!(!mask.contains(ManualFormat::LTR));
        assert!(mask.contains(ManualFormat::RTL | ManualFormat::HIGHLIGHT));
        assert_eq!(!ManualFormat::NORMAL & ManualFormat::NORMAL, ManualFormat::NORMAL);
        assert_eq!((!mask).bits(), ManualFormat::LTR.bits());
    }

    #[test]
    fn test_style_suffix_is_canonical() {
        let fmt = ManualFormat::ITALIC | ManualFormat::CENTERED;
        assert_eq!(fmt.style_suffix(), "CENTERED_ITALIC");
        assert_eq!(ManualFormat::NORMAL.style_suffix(), "NORMAL");
    }

    #[rstest]
    #[case("BOLD|ITALIC", ManualFormat::BOLD | ManualFormat::ITALIC)]
    #[case("bold", ManualFormat::BOLD)]
    #[case("NORMAL", ManualFormat::NORMAL)]
    #[case("", ManualFormat::NORMAL)]
    #[case("NEW_PAGE|SPACED", ManualFormat::NEW_PAGE | ManualFormat::SPACED)]
    fn test_parse(#[case] input: &str, #[case] expected: ManualFormat) {
        assert_eq!(input.parse::<ManualFormat>(), Ok(expected));
    }

    #[test]
    fn test_parse_unknown_flag() {
        assert_eq!(
            "BOLD|WIGGLY".parse::<ManualFormat>(),
            Err(UnknownFormat("WIGGLY".to_string()))
        );
    }

    #[test]
    fn test_display_parses_back() {
        let fmt = ManualFormat::NEW_PAGE | ManualFormat::RTL | ManualFormat::SUPERSCRIPT;
        assert_eq!(fmt.to_string().parse::<ManualFormat>(), Ok(fmt));
    }

    #[test]
    fn test_serde_uses_names() {
        let json = serde_json::to_string(&(ManualFormat::BOLD | ManualFormat::RTL)).unwrap();
        assert_eq!(json, "\"RTL|BOLD\"");
        let back: ManualFormat = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ManualFormat::BOLD | ManualFormat::RTL);
    }
}
