//! Room documents.
//!
//! A room is the unit of content the app loads. Required fields that the
//! loader must enforce are `Option`s here so that a structurally broken room
//! can still be represented, decoded, and rejected by the rules.

use serde::{Deserialize, Serialize};

use crate::error::DocumentError;

/// Text available in English and Vietnamese.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BilingualText {
    /// English text.
    #[serde(default)]
    pub en: String,
    /// Vietnamese text.
    #[serde(default)]
    pub vi: String,
}

/// Entry body copy. Either language may be missing in a broken room.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryCopy {
    /// English copy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub en: Option<String>,
    /// Vietnamese copy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vi: Option<String>,
}

/// A single entry inside a room.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomEntry {
    /// Kebab-case identifier, unique within the room.
    pub slug: String,
    /// English search keywords.
    #[serde(default)]
    pub keywords_en: Vec<String>,
    /// Vietnamese search keywords.
    #[serde(default)]
    pub keywords_vi: Vec<String>,
    /// Body copy.
    #[serde(default)]
    pub copy: EntryCopy,
    /// Audio filename, e.g. `calm_breathing_free_01_en.mp3`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio: Option<String>,
    /// Classification tags.
    #[serde(default)]
    pub tags: Vec<String>,
}

/// A room document as stored at `/data/<id>.json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomDocument {
    /// Snake-case room identifier.
    pub id: String,
    /// Tier label; kept as text so unknown tiers can be represented.
    pub tier: String,
    /// Room title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<BilingualText>,
    /// Entries in display order.
    #[serde(default)]
    pub entries: Vec<RoomEntry>,
}

impl RoomDocument {
    /// Decode a room from JSON text.
    pub fn from_json(json: &str) -> Result<Self, DocumentError> {
        serde_json::from_str(json).map_err(DocumentError::Malformed)
    }

    /// Encode the room as pretty JSON.
    pub fn to_json(&self) -> Result<String, DocumentError> {
        serde_json::to_string_pretty(self).map_err(DocumentError::Encode)
    }

    /// Audio filenames referenced by the entries, in order.
    pub fn audio_files(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().filter_map(|e| e.audio.as_deref())
    }
}
