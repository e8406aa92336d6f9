//! Structural rules for room documents.
//!
//! Errors make a room unloadable; warnings are quality issues the app
//! tolerates. Each corruption strategy in `sim-core` targets exactly one
//! error rule here.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::document::RoomDocument;
use crate::tier::VALID_TIER_LABELS;

static ROOM_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9]+(_[a-z0-9]+)*$").expect("room id pattern"));

static SLUG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9]+(-[a-z0-9]+)*$").expect("slug pattern"));

static AUDIO: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9_]+_\d+_en\.mp3$").expect("audio pattern"));

/// Minimum keywords per language.
pub const KEYWORDS_MIN: usize = 3;
/// Maximum keywords per language.
pub const KEYWORDS_MAX: usize = 5;
/// Minimum words of copy per language.
pub const COPY_MIN_WORDS: usize = 50;
/// Maximum words of copy per language.
pub const COPY_MAX_WORDS: usize = 150;
/// Minimum tags per entry.
pub const TAGS_MIN: usize = 2;
/// Maximum tags per entry.
pub const TAGS_MAX: usize = 4;

/// Tags an entry may carry.
pub const ALLOWED_TAGS: &[&str] = &[
    "emotional",
    "behavioral",
    "mindset",
    "safety",
    "crisis",
    "skill",
    "habit",
    "art",
    "creativity",
    "imagination",
    "games",
    "creative-thinking",
];

/// Identifies the rule a violation came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Rule {
    /// Room id is not lowercase snake_case.
    RoomIdFormat,
    /// Tier label is not one of the canonical labels.
    TierInvalid,
    /// Entry count outside the allowed range.
    EntryCount,
    /// Title or copy missing a language.
    BilingualRequired,
    /// Entry slug is not lowercase kebab-case.
    SlugFormat,
    /// Two entries share a slug.
    DuplicateSlug,
    /// Entry has no audio file.
    AudioRequired,
    /// Audio filename does not follow `<room>_<n>_en.mp3`.
    AudioFormat,
    /// Keyword count outside the allowed range.
    KeywordsCount,
    /// Copy word count outside the allowed range.
    CopyLength,
    /// Tag count outside the allowed range.
    TagsCount,
    /// Tag not in the allowed list.
    TagsInvalid,
}

/// A single rule violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleViolation {
    /// Path to the offending field, e.g. `entries[2].slug`.
    pub field: String,
    /// Which rule fired.
    pub rule: Rule,
    /// Human-readable explanation.
    pub message: String,
}

impl RuleViolation {
    fn new(field: impl Into<String>, rule: Rule, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            rule,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for RuleViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// How strictly to validate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationMode {
    /// Production rules.
    Strict,
    /// Tolerates missing audio, copy and entries.
    Lenient,
}

/// Options passed to the loader's validator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationOptions {
    /// Mode label.
    pub mode: ValidationMode,
    /// Missing audio is an error.
    pub require_audio: bool,
    /// Missing title or copy language is an error.
    pub require_bilingual_copy: bool,
    /// Fewest entries allowed.
    pub min_entries: usize,
    /// Most entries allowed.
    pub max_entries: usize,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self::strict()
    }
}

impl ValidationOptions {
    /// Production rules: 2-8 entries, audio and both languages required.
    pub fn strict() -> Self {
        Self {
            mode: ValidationMode::Strict,
            require_audio: true,
            require_bilingual_copy: true,
            min_entries: 2,
            max_entries: 8,
        }
    }

    /// Draft rules: anything from 0 to 8 entries, audio and copy optional.
    pub fn lenient() -> Self {
        Self {
            mode: ValidationMode::Lenient,
            require_audio: false,
            require_bilingual_copy: false,
            min_entries: 0,
            max_entries: 8,
        }
    }
}

/// Outcome of validating a room.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    /// Violations that make the room unloadable.
    pub errors: Vec<RuleViolation>,
    /// Quality issues.
    pub warnings: Vec<RuleViolation>,
}

impl ValidationReport {
    /// True if there are no errors.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// True if any error came from `rule`.
    pub fn has_error(&self, rule: Rule) -> bool {
        self.errors.iter().any(|v| v.rule == rule)
    }
}

/// Count whitespace-separated words.
pub fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Validate a room against the structural rules.
pub fn validate_room(room: &RoomDocument, options: &ValidationOptions) -> ValidationReport {
    let mut report = ValidationReport::default();

    if !ROOM_ID.is_match(&room.id) {
        report.errors.push(RuleViolation::new(
            "id",
            Rule::RoomIdFormat,
            format!("room id must be lowercase snake_case, got {:?}", room.id),
        ));
    }

    if !VALID_TIER_LABELS.contains(&room.tier.as_str()) {
        report.errors.push(RuleViolation::new(
            "tier",
            Rule::TierInvalid,
            format!("tier must be a canonical tier label, got {:?}", room.tier),
        ));
    }

    let count = room.entries.len();
    if count < options.min_entries || count > options.max_entries {
        report.errors.push(RuleViolation::new(
            "entries",
            Rule::EntryCount,
            format!(
                "room must have {}-{} entries, got {}",
                options.min_entries, options.max_entries, count
            ),
        ));
    }

    if options.require_bilingual_copy {
        let complete = room
            .title
            .as_ref()
            .is_some_and(|t| !t.en.trim().is_empty() && !t.vi.trim().is_empty());
        if !complete {
            report.errors.push(RuleViolation::new(
                "title",
                Rule::BilingualRequired,
                "title must have both EN and VI text",
            ));
        }
    }

    let mut seen_slugs = HashSet::new();
    for (index, entry) in room.entries.iter().enumerate() {
        let field = |name: &str| format!("entries[{index}].{name}");

        if !SLUG.is_match(&entry.slug) {
            report.errors.push(RuleViolation::new(
                field("slug"),
                Rule::SlugFormat,
                format!("slug must be lowercase kebab-case, got {:?}", entry.slug),
            ));
        }
        if !seen_slugs.insert(entry.slug.as_str()) {
            report.errors.push(RuleViolation::new(
                field("slug"),
                Rule::DuplicateSlug,
                format!("slug {:?} is used by an earlier entry", entry.slug),
            ));
        }

        for (name, keywords) in [("keywords_en", &entry.keywords_en), ("keywords_vi", &entry.keywords_vi)] {
            if !(KEYWORDS_MIN..=KEYWORDS_MAX).contains(&keywords.len()) {
                report.warnings.push(RuleViolation::new(
                    field(name),
                    Rule::KeywordsCount,
                    format!(
                        "expected {KEYWORDS_MIN}-{KEYWORDS_MAX} keywords, got {}",
                        keywords.len()
                    ),
                ));
            }
        }

        for (name, copy) in [("copy.en", &entry.copy.en), ("copy.vi", &entry.copy.vi)] {
            let words = copy.as_deref().map(count_words).unwrap_or(0);
            if !(COPY_MIN_WORDS..=COPY_MAX_WORDS).contains(&words) {
                report.warnings.push(RuleViolation::new(
                    field(name),
                    Rule::CopyLength,
                    format!("expected {COPY_MIN_WORDS}-{COPY_MAX_WORDS} words, got {words}"),
                ));
            }
        }

        match entry.audio.as_deref() {
            None | Some("") if options.require_audio => {
                report.errors.push(RuleViolation::new(
                    field("audio"),
                    Rule::AudioRequired,
                    "audio file is required for this entry",
                ));
            }
            Some(audio) if !audio.is_empty() && !AUDIO.is_match(audio) => {
                report.warnings.push(RuleViolation::new(
                    field("audio"),
                    Rule::AudioFormat,
                    format!("audio filename must match <room>_<n>_en.mp3, got {audio:?}"),
                ));
            }
            _ => {}
        }

        if !(TAGS_MIN..=TAGS_MAX).contains(&entry.tags.len()) {
            report.warnings.push(RuleViolation::new(
                field("tags"),
                Rule::TagsCount,
                format!("expected {TAGS_MIN}-{TAGS_MAX} tags, got {}", entry.tags.len()),
            ));
        } else if entry.tags.iter().any(|t| !ALLOWED_TAGS.contains(&t.as_str())) {
            report.warnings.push(RuleViolation::new(
                field("tags"),
                Rule::TagsInvalid,
                "one or more tags are not in the allowed list",
            ));
        }

        if options.require_bilingual_copy {
            let missing = |c: &Option<String>| c.as_deref().map_or(true, |s| s.trim().is_empty());
            if missing(&entry.copy.en) || missing(&entry.copy.vi) {
                report.errors.push(RuleViolation::new(
                    field("copy"),
                    Rule::BilingualRequired,
                    "copy must have both EN and VI text",
                ));
            }
        }
    }

    report
}

/// Apply safe repairs: trim copy and title text, trim and de-duplicate
/// keywords. Ids, slugs, tiers and entry counts are never touched.
///
/// Returns the repaired room and whether anything changed.
pub fn autofix_room(room: &RoomDocument) -> (RoomDocument, bool) {
    let mut fixed = room.clone();

    if let Some(title) = fixed.title.as_mut() {
        title.en = title.en.trim().to_string();
        title.vi = title.vi.trim().to_string();
    }

    for entry in &mut fixed.entries {
        for copy in [&mut entry.copy.en, &mut entry.copy.vi] {
            if let Some(text) = copy.as_mut() {
                *text = text.trim().to_string();
            }
        }
        for keywords in [&mut entry.keywords_en, &mut entry.keywords_vi] {
            let mut seen = HashSet::new();
            *keywords = keywords
                .iter()
                .map(|k| k.trim().to_string())
                .filter(|k| !k.is_empty() && seen.insert(k.clone()))
                .collect();
        }
    }

    let changed = fixed != *room;
    (fixed, changed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::sample_room;

    #[test]
    fn sample_room_is_clean() {
        let room = sample_room("calm_breathing_free", "free", 3);
        let report = validate_room(&room, &ValidationOptions::strict());
        assert!(report.errors.is_empty(), "{:?}", report.errors);
        assert!(report.warnings.is_empty(), "{:?}", report.warnings);
    }

    #[test]
    fn room_id_must_be_snake_case() {
        let mut room = sample_room("calm_breathing_free", "free", 3);
        room.id = "Calm-Breathing".into();
        let report = validate_room(&room, &ValidationOptions::strict());
        assert!(report.has_error(Rule::RoomIdFormat));
        assert_eq!(report.errors.len(), 1);
    }

    #[test]
    fn legacy_tier_labels_are_valid() {
        let mut room = sample_room("calm_breathing_free", "free", 3);
        room.tier = "Free / Miễn phí".into();
        assert!(validate_room(&room, &ValidationOptions::strict()).is_valid());
        room.tier = "gold".into();
        assert!(validate_room(&room, &ValidationOptions::strict()).has_error(Rule::TierInvalid));
    }

    #[test]
    fn entry_count_bounds() {
        let strict = ValidationOptions::strict();
        assert!(validate_room(&sample_room("r", "free", 1), &strict).has_error(Rule::EntryCount));
        assert!(validate_room(&sample_room("r", "free", 2), &strict).is_valid());
        assert!(validate_room(&sample_room("r", "free", 8), &strict).is_valid());
        assert!(validate_room(&sample_room("r", "free", 9), &strict).has_error(Rule::EntryCount));
    }

    #[test]
    fn duplicate_slug_is_an_error() {
        let mut room = sample_room("r", "free", 3);
        room.entries[2].slug = room.entries[0].slug.clone();
        let report = validate_room(&room, &ValidationOptions::strict());
        assert!(report.has_error(Rule::DuplicateSlug));
        assert_eq!(report.errors.len(), 1);
    }

    #[test]
    fn missing_audio_depends_on_mode() {
        let mut room = sample_room("r", "free", 3);
        room.entries[1].audio = None;
        assert!(validate_room(&room, &ValidationOptions::strict()).has_error(Rule::AudioRequired));
        assert!(validate_room(&room, &ValidationOptions::lenient()).is_valid());
    }

    #[test]
    fn badly_named_audio_is_a_warning() {
        let mut room = sample_room("r", "free", 3);
        room.entries[0].audio = Some("Intro.MP3".into());
        let report = validate_room(&room, &ValidationOptions::strict());
        assert!(report.is_valid());
        assert!(report.warnings.iter().any(|w| w.rule == Rule::AudioFormat));
    }

    #[test]
    fn missing_copy_language_is_an_error() {
        let mut room = sample_room("r", "free", 3);
        room.entries[0].copy.vi = None;
        let report = validate_room(&room, &ValidationOptions::strict());
        assert!(report.has_error(Rule::BilingualRequired));
    }

    #[test]
    fn autofix_trims_and_dedupes_only() {
        let mut room = sample_room("r", "free", 2);
        room.entries[0].keywords_en = vec![" calm ".into(), "calm".into(), "breath".into()];
        room.entries[0].slug = "Bad Slug".into();

        let (fixed, changed) = autofix_room(&room);
        assert!(changed);
        assert_eq!(fixed.entries[0].keywords_en, vec!["calm", "breath"]);
        assert_eq!(fixed.entries[0].slug, "Bad Slug");
    }

    #[test]
    fn autofix_leaves_clean_room_alone() {
        let room = sample_room("r", "free", 2);
        let (fixed, changed) = autofix_room(&room);
        assert!(!changed);
        assert_eq!(fixed, room);
    }

    #[test]
    fn count_words_ignores_extra_whitespace() {
        assert_eq!(count_words("  one  two\tthree\n"), 3);
        assert_eq!(count_words(""), 0);
    }
}
