//! Bundled content catalog and the origin that serves it.

use sim_env::StaticFetcher;
use sim_types::fixture::sample_room;
use sim_types::{DocumentError, RoomDocument};

/// Size of each fake audio file served by the origin.
const AUDIO_BYTES: usize = 16 * 1024;

const ROOMS: [(&str, &str, usize); 6] = [
    ("calm_breathing_free", "free", 3),
    ("morning_focus_vip1", "vip1", 4),
    ("gratitude_practice_vip2", "VIP2", 2),
    ("stress_reset_vip3ii", "vip3ii", 5),
    ("strategic_foundations_vip9", "vip9", 6),
    ("color_games_kids_1", "kids_1", 3),
];

/// Ids of every bundled room.
pub fn fixture_room_ids() -> impl Iterator<Item = &'static str> {
    ROOMS.iter().map(|(id, _, _)| *id)
}

/// Every bundled room. All pass strict validation.
pub fn fixture_rooms() -> Vec<RoomDocument> {
    ROOMS
        .iter()
        .map(|(id, tier, entries)| sample_room(id, tier, *entries))
        .collect()
}

/// A bundled room by id.
pub fn fixture_room(id: &str) -> Option<RoomDocument> {
    ROOMS
        .iter()
        .find(|(room_id, _, _)| *room_id == id)
        .map(|(id, tier, entries)| sample_room(id, tier, *entries))
}

/// URL a room is served at.
pub fn room_url(id: &str) -> String {
    format!("/data/{id}.json")
}

/// URL an audio file is served at.
pub fn audio_url(file: &str) -> String {
    format!("/audio/{file}")
}

/// An origin serving every bundled room and its audio files.
pub fn fixture_origin() -> Result<StaticFetcher, DocumentError> {
    let mut origin = StaticFetcher::default();
    for room in fixture_rooms() {
        origin = origin.with_resource(room_url(&room.id), room.to_json()?);
        for file in room.audio_files() {
            origin = origin.with_resource(audio_url(file), vec![0u8; AUDIO_BYTES]);
        }
    }
    Ok(origin)
}
