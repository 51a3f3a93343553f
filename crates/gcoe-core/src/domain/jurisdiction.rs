//! Jurisdiction identifiers.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Aliases accepted for the built-in jurisdictions, matched case-insensitively.
const ALIASES: &[(&str, &[&str])] = &[
    ("uk", &["uk", "gb", "united_kingdom"]),
    ("us", &["us", "usa", "united_states"]),
    ("ae", &["ae", "uae", "united_arab_emirates"]),
    (
        "eu",
        &["eu", "netherlands", "germany", "austria", "nl", "de", "at"],
    ),
    (
        "ch",
        &["ch", "switzerland", "zug", "zurich", "st_gallen"],
    ),
];

/// Identifier of one pluggable compliance-assessment domain.
///
/// Built-in aliases collapse to their short code; anything else is kept
/// verbatim (after trimming) so callers can register their own providers.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct JurisdictionId(String);

impl JurisdictionId {
    /// Build an identifier, canonicalising known aliases.
    pub fn new(raw: impl AsRef<str>) -> Self {
        let trimmed = raw.as_ref().trim();
        let lowered = trimmed.to_ascii_lowercase();
        for (code, aliases) in ALIASES {
            if aliases.contains(&lowered.as_str()) {
                return Self((*code).to_string());
            }
        }
        Self(trimmed.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0.is_empty()
    }

    /// Short codes of the built-in jurisdictions with their accepted aliases.
    pub fn known_aliases() -> impl Iterator<Item = (&'static str, &'static [&'static str])> {
        ALIASES.iter().copied()
    }
}

impl fmt::Display for JurisdictionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for JurisdictionId {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<String> for JurisdictionId {
    fn from(raw: String) -> Self {
        Self::new(raw)
    }
}

impl From<JurisdictionId> for String {
    fn from(id: JurisdictionId) -> Self {
        id.0
    }
}

/// Unordered pair of jurisdictions, stored in lexicographic order so that
/// `(a, b)` and `(b, a)` compare equal.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "PairFields")]
pub struct JurisdictionPair {
    pub first: JurisdictionId,
    pub second: JurisdictionId,
}

/// Wire shape of a pair; normalised through [`JurisdictionPair::new`].
#[derive(Deserialize)]
struct PairFields {
    first: JurisdictionId,
    second: JurisdictionId,
}

impl From<PairFields> for JurisdictionPair {
    fn from(raw: PairFields) -> Self {
        Self::new(raw.first, raw.second)
    }
}

impl JurisdictionPair {
    pub fn new(a: JurisdictionId, b: JurisdictionId) -> Self {
        if a <= b {
            Self {
                first: a,
                second: b,
            }
        } else {
            Self {
                first: b,
                second: a,
            }
        }
    }

    pub fn contains(&self, id: &JurisdictionId) -> bool {
        &self.first == id || &self.second == id
    }
}

impl fmt::Display for JurisdictionPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.first, self.second)
    }
}
