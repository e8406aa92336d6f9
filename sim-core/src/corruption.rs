//! Structural corruption of room documents.
//!
//! Each corruptor takes a well-formed room and returns a new room that breaks
//! exactly one error rule of [`validate_room`](sim_types::validate_room).
//! Keeping every corruption to a single dimension means a rejection by the
//! loader can be attributed to the rule that was exercised.
//!
//! Corruptors never mutate their input and never panic. Several make a random
//! sub-choice, so two calls on the same room may differ; both outputs still
//! break the targeted rule.

use rand::seq::SliceRandom;
use rand::{Rng, RngCore};
use sim_types::fixture::sample_entry;
use sim_types::{RoomDocument, RoomEntry, Rule};

/// Strict upper bound on entries used by [`overflow_entries`].
const STRICT_MAX_ENTRIES: usize = 8;

/// The structural invariant a corruptor attacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dimension {
    /// Casing and separator conventions for ids and slugs.
    NamingConvention,
    /// Membership of an enumerated value.
    EnumMembership,
    /// Number of elements in an array.
    Cardinality,
    /// Presence of a required field.
    RequiredField,
    /// Uniqueness of keys within a collection.
    DuplicateKey,
}

/// A corruption function.
pub type CorruptFn = fn(&RoomDocument, &mut dyn RngCore) -> RoomDocument;

/// A named corruption strategy.
#[derive(Clone, Copy)]
pub struct Corruptor {
    /// Stable strategy name.
    pub name: &'static str,
    /// Invariant attacked.
    pub dimension: Dimension,
    /// Rule the output is guaranteed to break.
    pub targets: Rule,
    apply: CorruptFn,
}

impl Corruptor {
    /// Produce a corrupted copy of `room`.
    pub fn apply(&self, room: &RoomDocument, rng: &mut dyn RngCore) -> RoomDocument {
        (self.apply)(room, rng)
    }
}

impl std::fmt::Debug for Corruptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Corruptor")
            .field("name", &self.name)
            .field("dimension", &self.dimension)
            .field("targets", &self.targets)
            .finish()
    }
}

static CORRUPTORS: [Corruptor; 10] = [
    Corruptor {
        name: "uppercase_room_id",
        dimension: Dimension::NamingConvention,
        targets: Rule::RoomIdFormat,
        apply: uppercase_room_id,
    },
    Corruptor {
        name: "separator_room_id",
        dimension: Dimension::NamingConvention,
        targets: Rule::RoomIdFormat,
        apply: separator_room_id,
    },
    Corruptor {
        name: "malformed_entry_slug",
        dimension: Dimension::NamingConvention,
        targets: Rule::SlugFormat,
        apply: malformed_entry_slug,
    },
    Corruptor {
        name: "unknown_tier",
        dimension: Dimension::EnumMembership,
        targets: Rule::TierInvalid,
        apply: unknown_tier,
    },
    Corruptor {
        name: "blank_tier",
        dimension: Dimension::EnumMembership,
        targets: Rule::TierInvalid,
        apply: blank_tier,
    },
    Corruptor {
        name: "empty_entries",
        dimension: Dimension::Cardinality,
        targets: Rule::EntryCount,
        apply: empty_entries,
    },
    Corruptor {
        name: "overflow_entries",
        dimension: Dimension::Cardinality,
        targets: Rule::EntryCount,
        apply: overflow_entries,
    },
    Corruptor {
        name: "missing_entry_audio",
        dimension: Dimension::RequiredField,
        targets: Rule::AudioRequired,
        apply: missing_entry_audio,
    },
    Corruptor {
        name: "missing_entry_copy",
        dimension: Dimension::RequiredField,
        targets: Rule::BilingualRequired,
        apply: missing_entry_copy,
    },
    Corruptor {
        name: "duplicate_entry_slug",
        dimension: Dimension::DuplicateKey,
        targets: Rule::DuplicateSlug,
        apply: duplicate_entry_slug,
    },
];

/// The fixed list of corruption strategies.
pub fn corruptors() -> &'static [Corruptor] {
    &CORRUPTORS
}

/// Look up a corruptor by name.
pub fn corruptor(name: &str) -> Option<&'static Corruptor> {
    CORRUPTORS.iter().find(|c| c.name == name)
}

/// A corrupted room and the strategy that produced it.
#[derive(Debug, Clone)]
pub struct CorruptedRoom {
    /// Strategy used.
    pub strategy: &'static Corruptor,
    /// The corrupted room.
    pub room: RoomDocument,
}

/// Apply one uniformly chosen corruptor using the thread RNG.
pub fn apply_random_corruption(room: &RoomDocument) -> RoomDocument {
    apply_random_corruption_with(room, &mut rand::thread_rng()).room
}

/// Apply one uniformly chosen corruptor using `rng`.
pub fn apply_random_corruption_with(room: &RoomDocument, rng: &mut dyn RngCore) -> CorruptedRoom {
    let strategy = &CORRUPTORS[rng.gen_range(0..CORRUPTORS.len())];
    tracing::debug!(strategy = strategy.name, room = %room.id, "Applying corruption");
    CorruptedRoom {
        strategy,
        room: strategy.apply(room, rng),
    }
}

fn pick_index(len: usize, rng: &mut dyn RngCore) -> usize {
    rng.gen_range(0..len)
}

/// Ensure there is at least one entry to corrupt. Only degenerate rooms
/// (which are already invalid) take this path.
fn ensure_entry(room: &mut RoomDocument) {
    if room.entries.is_empty() {
        room.entries.push(sample_entry(&room.id, 0));
    }
}

/// Upper-case the room id, either fully or per segment.
pub fn uppercase_room_id(room: &RoomDocument, rng: &mut dyn RngCore) -> RoomDocument {
    let mut out = room.clone();
    let id = if rng.gen_bool(0.5) {
        out.id.to_uppercase()
    } else {
        out.id
            .split('_')
            .map(|segment| {
                let mut chars = segment.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect(),
                    None => String::new(),
                }
            })
            .collect::<Vec<String>>()
            .join("_")
    };
    out.id = if id.chars().any(|c| c.is_ascii_uppercase()) {
        id
    } else {
        format!("{}_ROOM", out.id)
    };
    out
}

/// Replace the snake_case separator with a forbidden one.
pub fn separator_room_id(room: &RoomDocument, rng: &mut dyn RngCore) -> RoomDocument {
    let mut out = room.clone();
    let separator = ["-", " ", "."].choose(rng).copied().unwrap_or("-");
    out.id = if out.id.contains('_') {
        out.id.replace('_', separator)
    } else {
        format!("{}{}copy", out.id, separator)
    };
    out
}

/// Give one entry a slug that is not lowercase kebab-case.
pub fn malformed_entry_slug(room: &RoomDocument, rng: &mut dyn RngCore) -> RoomDocument {
    let mut out = room.clone();
    ensure_entry(&mut out);
    let index = pick_index(out.entries.len(), rng);
    let slug = &out.entries[index].slug;
    let malformed = match rng.gen_range(0..3) {
        0 => format!("{slug}_draft"),
        1 => format!("Draft {slug}"),
        _ => format!("{}!", slug.to_uppercase()),
    };
    out.entries[index].slug = malformed;
    out
}

/// Replace the tier with a label outside the canonical set.
pub fn unknown_tier(room: &RoomDocument, rng: &mut dyn RngCore) -> RoomDocument {
    let mut out = room.clone();
    out.tier = ["premium", "vip10", "gold", "VIP 9", "enterprise"]
        .choose(rng)
        .copied()
        .unwrap_or("premium")
        .to_string();
    out
}

/// Blank out the tier.
pub fn blank_tier(room: &RoomDocument, rng: &mut dyn RngCore) -> RoomDocument {
    let mut out = room.clone();
    out.tier = ["", " ", "\t", "null"]
        .choose(rng)
        .copied()
        .unwrap_or("")
        .to_string();
    out
}

/// Remove every entry.
pub fn empty_entries(room: &RoomDocument, _rng: &mut dyn RngCore) -> RoomDocument {
    RoomDocument {
        entries: Vec::new(),
        ..room.clone()
    }
}

/// Grow the room past the strict entry limit with otherwise valid entries.
pub fn overflow_entries(room: &RoomDocument, rng: &mut dyn RngCore) -> RoomDocument {
    let mut out = room.clone();
    let target = rng.gen_range(STRICT_MAX_ENTRIES + 1..=STRICT_MAX_ENTRIES + 4);
    let mut n = out.entries.len();
    while out.entries.len() < target {
        n += 1;
        let mut entry: RoomEntry = match out.entries.first() {
            Some(first) => first.clone(),
            None => sample_entry(&out.id, n - 1),
        };
        let mut slug = format!("overflow-{n}");
        while out.entries.iter().any(|e| e.slug == slug) {
            slug.push_str("-x");
        }
        entry.slug = slug;
        out.entries.push(entry);
    }
    out
}

/// Drop the audio file from one entry.
pub fn missing_entry_audio(room: &RoomDocument, rng: &mut dyn RngCore) -> RoomDocument {
    let mut out = room.clone();
    ensure_entry(&mut out);
    let index = pick_index(out.entries.len(), rng);
    out.entries[index].audio = None;
    out
}

/// Drop one language of copy from one entry.
pub fn missing_entry_copy(room: &RoomDocument, rng: &mut dyn RngCore) -> RoomDocument {
    let mut out = room.clone();
    ensure_entry(&mut out);
    let index = pick_index(out.entries.len(), rng);
    let copy = &mut out.entries[index].copy;
    if rng.gen_bool(0.5) {
        copy.en = None;
    } else {
        copy.vi = None;
    }
    out
}

/// Copy one entry's slug onto another entry.
pub fn duplicate_entry_slug(room: &RoomDocument, rng: &mut dyn RngCore) -> RoomDocument {
    let mut out = room.clone();
    ensure_entry(&mut out);
    if out.entries.len() == 1 {
        let twin = out.entries[0].clone();
        out.entries.push(twin);
        return out;
    }

    let source = pick_index(out.entries.len(), rng);
    let mut target = pick_index(out.entries.len() - 1, rng);
    if target >= source {
        target += 1;
    }
    out.entries[target].slug = out.entries[source].slug.clone();
    out
}
