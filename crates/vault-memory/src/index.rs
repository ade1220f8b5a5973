//! Recall index construction and rendering.
//!
//! The index is a per-query projection of the notes: one [`IndexEntry`] per
//! note, in listing order, rendered as one prompt line per entry:
//!
//! ```text
//! [3] Groceries | groceries,milk,eggs | Buy milk and eggs for the week
//! ```

use std::cmp::Ordering;

use tracing::debug;

use vault_core::defaults::{INDEX_CHAR_BUDGET, INDEX_TITLE_MAX, PREVIEW_LENGTH, PREVIEW_STEPS};
use vault_core::{preview, truncate_chars, IndexEntry, Note};

/// Listing order: pinned first, then most recently updated, then highest id.
pub fn listing_order(a: &Note, b: &Note) -> Ordering {
    b.pinned
        .cmp(&a.pinned)
        .then_with(|| b.updated_at.cmp(&a.updated_at))
        .then_with(|| b.id.cmp(&a.id))
}

/// Sort notes into listing order in place.
pub fn order_notes(notes: &mut [Note]) {
    notes.sort_by(listing_order);
}

/// Project one note into an index entry.
pub fn index_entry(note: &Note) -> IndexEntry {
    IndexEntry {
        id: note.id,
        title: truncate_chars(note.display_title(), INDEX_TITLE_MAX).to_string(),
        tags: note.tags.clone(),
        preview: preview(&note.content, PREVIEW_LENGTH),
        pinned: note.pinned,
    }
}

/// Build the recall index in listing order. The input order does not matter.
pub fn build_index(notes: &[Note]) -> Vec<IndexEntry> {
    let mut ordered: Vec<&Note> = notes.iter().collect();
    ordered.sort_by(|a, b| listing_order(a, b));
    ordered.into_iter().map(index_entry).collect()
}

/// Render one index line with the preview cut to `preview_len` characters.
/// A zero `preview_len` leaves the preview column out.
pub fn render_line(entry: &IndexEntry, preview_len: usize) -> String {
    let tags = if entry.tags.is_empty() {
        "(none)".to_string()
    } else {
        entry.tags.join(",")
    };
    let mut line = format!("[{}] {} | {}", entry.id, entry.title, tags);
    if preview_len > 0 {
        let text = preview(&entry.preview, preview_len);
        line.push_str(" | ");
        line.push_str(if text.is_empty() { "(empty)" } else { &text });
    }
    line
}

/// Render the whole index as a prompt block.
///
/// Previews shrink step by step until the block fits the character budget.
/// Entries are never dropped, so a very large vault may still exceed it.
pub fn render_index(entries: &[IndexEntry]) -> String {
    render_index_within(entries, INDEX_CHAR_BUDGET)
}

pub(crate) fn render_index_within(entries: &[IndexEntry], budget: usize) -> String {
    let mut block = String::new();
    for preview_len in PREVIEW_STEPS {
        block = entries
            .iter()
            .map(|entry| render_line(entry, preview_len))
            .collect::<Vec<_>>()
            .join("\n");
        if block.chars().count() <= budget {
            return block;
        }
        debug!(
            entries = entries.len(),
            block_chars = block.len(),
            preview_len,
            "Index over budget, shrinking previews"
        );
    }
    block
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use vault_core::NoteColor;

    fn note(id: i64, title: &str, content: &str, pinned: bool, age_mins: i64) -> Note {
        let base = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        Note {
            id,
            title: title.to_string(),
            content: content.to_string(),
            color: NoteColor::Slate,
            pinned,
            tags: vec![],
            created_at: base - Duration::minutes(age_mins),
            updated_at: base - Duration::minutes(age_mins),
        }
    }

    #[test]
    fn test_build_index_orders_pinned_then_recent() {
        let notes = vec![
            note(1, "old", "", false, 30),
            note(2, "pinned old", "", true, 60),
            note(3, "new", "", false, 5),
            note(4, "pinned new", "", true, 1),
        ];
        let ids: Vec<i64> = build_index(&notes).iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![4, 2, 3, 1]);
    }

    #[test]
    fn test_build_index_ties_break_on_id() {
        let notes = vec![
            note(7, "a", "", false, 10),
            note(9, "b", "", false, 10),
            note(8, "c", "", false, 10),
        ];
        let ids: Vec<i64> = build_index(&notes).iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![9, 8, 7]);
    }

    #[test]
    fn test_build_index_is_order_independent() {
        let mut notes = vec![
            note(1, "a", "", false, 3),
            note(2, "b", "", true, 9),
            note(3, "c", "", false, 1),
        ];
        let first = build_index(&notes);
        notes.reverse();
        assert_eq!(build_index(&notes), first);
        order_notes(&mut notes);
        let ids: Vec<i64> = notes.iter().map(|n| n.id).collect();
        assert_eq!(ids, first.iter().map(|e| e.id).collect::<Vec<_>>());
    }

    #[test]
    fn test_entry_truncation() {
        let long_title = "t".repeat(100);
        let long_body = "word ".repeat(100);
        let entry = index_entry(&note(1, &long_title, &long_body, false, 0));
        assert_eq!(entry.title.chars().count(), INDEX_TITLE_MAX);
        assert_eq!(entry.preview.chars().count(), PREVIEW_LENGTH);
        assert!(entry.preview.ends_with("..."));

        let blank = index_entry(&note(2, "  ", "", false, 0));
        assert_eq!(blank.title, "Untitled");
        assert_eq!(blank.preview, "");
    }

    #[test]
    fn test_render_line_format() {
        let mut entry = index_entry(&note(3, "Groceries", "Buy milk\nand eggs", false, 0));
        entry.tags = vec!["groceries".into(), "milk".into()];
        assert_eq!(
            render_line(&entry, PREVIEW_LENGTH),
            "[3] Groceries | groceries,milk | Buy milk and eggs"
        );
        assert_eq!(render_line(&entry, 0), "[3] Groceries | groceries,milk");

        let empty = index_entry(&note(4, "Blank", "", false, 0));
        assert_eq!(render_line(&empty, PREVIEW_LENGTH), "[4] Blank | (none) | (empty)");
    }

    #[test]
    fn test_render_index_shrinks_previews_but_keeps_entries() {
        let body = "lorem ipsum ".repeat(30);
        let entries: Vec<IndexEntry> = (1..=20)
            .map(|id| index_entry(&note(id, "Note", &body, false, id)))
            .collect();

        let full = render_index_within(&entries, usize::MAX);
        assert!(full.lines().all(|l| l.ends_with("...")));

        let tight = render_index_within(&entries, 20 * 40);
        assert_eq!(tight.lines().count(), 20);
        assert!(tight.chars().count() <= 20 * 40);

        let impossible = render_index_within(&entries, 10);
        assert_eq!(impossible.lines().count(), 20);
        assert!(impossible.lines().all(|l| !l.contains("lorem")));
    }
}
