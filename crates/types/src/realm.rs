use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Returned when a realm name is not one of `character`, `paragraph` or `table`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown style realm '{0}'")]
pub struct UnknownRealm(pub String);

/// One of the three style families, each with its own namespace and base style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Realm {
    Character,
    Paragraph,
    Table,
}

impl Realm {
    pub const ALL: [Realm; 3] = [Realm::Character, Realm::Paragraph, Realm::Table];

    /// The lowercase name used in declarations and logs.
    pub fn as_str(self) -> &'static str {
        match self {
            Realm::Character => "character",
            Realm::Paragraph => "paragraph",
            Realm::Table => "table",
        }
    }

    /// The capitalized name used as a settings section prefix.
    pub fn title(self) -> &'static str {
        match self {
            Realm::Character => "Character",
            Realm::Paragraph => "Paragraph",
            Realm::Table => "Table",
        }
    }
}

impl fmt::Display for Realm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Realm {
    type Err = UnknownRealm;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Realm::ALL
            .into_iter()
            .find(|realm| realm.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownRealm(s.to_string()))
    }
}
