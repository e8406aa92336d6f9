//! Builders for well-formed rooms.
//!
//! Used by the bundled content catalog and by tests that need a room that
//! passes every rule before something is done to it.

use crate::document::{BilingualText, EntryCopy, RoomDocument, RoomEntry};

const EN_SENTENCE: &str = "Take a slow breath and notice how your body feels right now.";
const VI_SENTENCE: &str = "Hãy hít thở chậm và chú ý cơ thể bạn đang cảm thấy thế nào.";

fn repeat_to_words(sentence: &str, min_words: usize) -> String {
    let mut text = String::new();
    while text.split_whitespace().count() < min_words {
        if !text.is_empty() {
            text.push(' ');
        }
        text.push_str(sentence);
    }
    text
}

/// A single well-formed entry at position `index` (zero-based) of `room_id`.
pub fn sample_entry(room_id: &str, index: usize) -> RoomEntry {
    let n = index + 1;
    RoomEntry {
        slug: format!("entry-{n}"),
        keywords_en: vec!["calm".into(), "breath".into(), format!("step{n}")],
        keywords_vi: vec!["bình tĩnh".into(), "hơi thở".into(), format!("bước{n}")],
        copy: EntryCopy {
            en: Some(repeat_to_words(EN_SENTENCE, 60)),
            vi: Some(repeat_to_words(VI_SENTENCE, 60)),
        },
        audio: Some(format!("{room_id}_{n:02}_en.mp3")),
        tags: vec!["mindset".into(), "habit".into()],
    }
}

/// A room with `entry_count` well-formed entries.
///
/// With a valid `id` and `tier` and 2-8 entries the result passes every
/// strict rule without warnings.
pub fn sample_room(id: &str, tier: &str, entry_count: usize) -> RoomDocument {
    RoomDocument {
        id: id.to_string(),
        tier: tier.to_string(),
        title: Some(BilingualText {
            en: format!("Room {id}"),
            vi: format!("Phòng {id}"),
        }),
        entries: (0..entry_count).map(|i| sample_entry(id, i)).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entries_have_unique_slugs_and_audio() {
        let room = sample_room("focus_vip2", "vip2", 5);
        let slugs: std::collections::HashSet<_> = room.entries.iter().map(|e| &e.slug).collect();
        assert_eq!(slugs.len(), 5);
        assert_eq!(room.entries[4].audio.as_deref(), Some("focus_vip2_05_en.mp3"));
    }

    #[test]
    fn copy_is_long_enough() {
        let entry = sample_entry("r", 0);
        let words = entry.copy.en.as_deref().unwrap().split_whitespace().count();
        assert!((60..=150).contains(&words));
    }
}
