//! Location normalization: turns the free-text LOCATION of a calendar event
//! into a known campus address, a remote marker, or cleaned free text.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::{BUILDING_CODES, REMOTE_KEYWORDS};

static BUILDING_ROOM_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-Z]+)\s(\d+)$").expect("building/room regex"));
static LINE_BREAK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<br\s*/?>").expect("line break regex"));
static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").expect("markup regex"));

/// A building code (or landmark name) that maps straight to a street address
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildingCode {
    pub code: String,
    pub address: String,
}

impl BuildingCode {
    pub fn new(code: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            address: address.into(),
        }
    }
}

/// Lookup tables and policy used by the normalizer
#[derive(Debug, Clone)]
pub struct LocationRules {
    /// Scanned in order; the first code found as a substring wins
    pub building_codes: Vec<BuildingCode>,
    /// Matched case-insensitively as substrings
    pub remote_keywords: Vec<String>,
    /// Treat an empty location as a remote event
    pub empty_is_remote: bool,
}

impl Default for LocationRules {
    fn default() -> Self {
        Self {
            building_codes: BUILDING_CODES
                .iter()
                .map(|(code, address)| BuildingCode::new(*code, *address))
                .collect(),
            remote_keywords: REMOTE_KEYWORDS.iter().map(|k| k.to_string()).collect(),
            empty_is_remote: false,
        }
    }
}

/// Result of normalizing a raw location string
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NormalizedLocation {
    /// Resolved through the building-code table
    KnownAddress {
        street_address: String,
        room: Option<String>,
    },
    /// Online/remote event; `cleaned` is the text that matched
    Remote { cleaned: String },
    /// Markup removed but otherwise unresolved
    FreeText { cleaned: String },
}

impl NormalizedLocation {
    pub fn is_remote(&self) -> bool {
        matches!(self, NormalizedLocation::Remote { .. })
    }

    /// The cleaned location string handed to the geocoder and the report
    pub fn cleaned(&self) -> String {
        match self {
            NormalizedLocation::KnownAddress {
                street_address,
                room: Some(room),
            } => format!("{street_address}, Room {room}"),
            NormalizedLocation::KnownAddress {
                street_address,
                room: None,
            } => street_address.clone(),
            NormalizedLocation::Remote { cleaned } | NormalizedLocation::FreeText { cleaned } => {
                cleaned.clone()
            }
        }
    }
}

impl fmt::Display for NormalizedLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.cleaned())
    }
}

/// Rule-based cleaner for event locations
#[derive(Debug, Clone)]
pub struct LocationNormalizer {
    rules: LocationRules,
    remote_keywords_lower: Vec<String>,
}

impl Default for LocationNormalizer {
    fn default() -> Self {
        Self::new(LocationRules::default())
    }
}

impl LocationNormalizer {
    pub fn new(rules: LocationRules) -> Self {
        let remote_keywords_lower = rules
            .remote_keywords
            .iter()
            .map(|k| k.trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();
        Self {
            rules,
            remote_keywords_lower,
        }
    }

    pub fn rules(&self) -> &LocationRules {
        &self.rules
    }

    /// Normalize a raw LOCATION value.
    ///
    /// Precedence: `CODE 123` building/room form, then any building code as a
    /// substring, then markup stripping. Only the stripped free text is checked
    /// for remote keywords.
    pub fn normalize(&self, raw_location: &str) -> NormalizedLocation {
        let decoded = html_escape::decode_html_entities(raw_location);
        let decoded = decoded.trim();

        if let Some(known) = self.match_building_room(decoded) {
            return known;
        }

        if let Some(entry) = self
            .rules
            .building_codes
            .iter()
            .find(|entry| !entry.code.is_empty() && decoded.contains(entry.code.as_str()))
        {
            return NormalizedLocation::KnownAddress {
                street_address: entry.address.clone(),
                room: None,
            };
        }

        let cleaned = strip_markup(decoded);
        if self.is_remote(&cleaned) {
            NormalizedLocation::Remote { cleaned }
        } else {
            NormalizedLocation::FreeText { cleaned }
        }
    }

    /// Case-insensitive check for remote-event keywords
    pub fn is_remote(&self, cleaned: &str) -> bool {
        if cleaned.trim().is_empty() {
            return self.rules.empty_is_remote;
        }
        let lower = cleaned.to_lowercase();
        self.remote_keywords_lower
            .iter()
            .any(|keyword| lower.contains(keyword.as_str()))
    }

    fn match_building_room(&self, decoded: &str) -> Option<NormalizedLocation> {
        let caps = BUILDING_ROOM_RE.captures(decoded)?;
        let code = caps.get(1)?.as_str();
        let room = caps.get(2)?.as_str();
        self.rules
            .building_codes
            .iter()
            .find(|entry| entry.code == code)
            .map(|entry| NormalizedLocation::KnownAddress {
                street_address: entry.address.clone(),
                room: Some(room.to_string()),
            })
    }
}

/// Replace `<br>` with ", " and drop every other tag.
pub fn strip_markup(text: &str) -> String {
    let with_commas = LINE_BREAK_RE.replace_all(text, ", ");
    TAG_RE.replace_all(&with_commas, "").trim().to_string()
}
