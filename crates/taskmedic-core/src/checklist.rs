//! Pure operations over an item's checklists and progress notes.
//!
//! Every function takes a slice and returns a fresh `Vec`; arguments are
//! never mutated.

use chrono::{DateTime, Utc};

use crate::item::{ChecklistEntry, ProgressNote, new_id};

/// Anything addressable by id inside an item.
pub trait Entry: Clone {
    fn id(&self) -> &str;
    fn set_text(&mut self, text: String);
}

impl Entry for ChecklistEntry {
    fn id(&self) -> &str {
        &self.id
    }

    fn set_text(&mut self, text: String) {
        self.text = text;
    }
}

impl Entry for ProgressNote {
    fn id(&self) -> &str {
        &self.id
    }

    fn set_text(&mut self, text: String) {
        self.text = text;
    }
}

pub fn add_entry(list: &[ChecklistEntry], text: &str, now: DateTime<Utc>) -> Vec<ChecklistEntry> {
    let text = text.trim();
    let mut out = list.to_vec();
    if text.is_empty() {
        return out;
    }
    out.push(ChecklistEntry {
        id: fresh_id(list),
        text: text.to_string(),
        done: false,
        t: now,
    });
    out
}

pub fn add_progress_note(list: &[ProgressNote], text: &str, now: DateTime<Utc>) -> Vec<ProgressNote> {
    let text = text.trim();
    if text.is_empty() {
        return list.to_vec();
    }
    let mut out = Vec::with_capacity(list.len() + 1);
    out.push(ProgressNote {
        id: fresh_id(list),
        text: text.to_string(),
        t: now,
    });
    out.extend_from_slice(list);
    out
}

pub fn toggle_entry(list: &[ChecklistEntry], id: &str) -> Vec<ChecklistEntry> {
    list.iter()
        .map(|entry| {
            if entry.id == id {
                ChecklistEntry {
                    done: !entry.done,
                    ..entry.clone()
                }
            } else {
                entry.clone()
            }
        })
        .collect()
}

pub(crate) fn remove_by_id<T: Entry>(list: &[T], id: &str) -> Vec<T> {
    list.iter().filter(|entry| entry.id() != id).cloned().collect()
}

pub fn update_text<T: Entry>(list: &[T], id: &str, text: &str) -> Vec<T> {
    list.iter()
        .map(|entry| {
            let mut next = entry.clone();
            if next.id() == id {
                next.set_text(text.to_string());
            }
            next
        })
        .collect()
}

// Ids are unique within the owning list.
fn fresh_id<T: Entry>(list: &[T]) -> String {
    loop {
        let id = new_id();
        if !list.iter().any(|entry| entry.id() == id) {
            return id;
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn at(ms: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(ms).single().expect("valid millis")
    }

    fn sample() -> Vec<ChecklistEntry> {
        let list = add_entry(&[], "Bloods", at(1_000));
        let list = add_entry(&list, "Cannula", at(2_000));
        add_entry(&list, "Fluids", at(3_000))
    }

    #[test]
    fn add_entry_appends_open_trimmed_entry() {
        let list = sample();
        let next = add_entry(&list, "  Chase CT  ", at(4_000));

        assert_eq!(next.len(), list.len() + 1);
        let added = next.last().expect("appended entry");
        assert_eq!(added.text, "Chase CT");
        assert!(!added.done);
        assert_eq!(added.t, at(4_000));
        assert!(list.iter().all(|entry| entry.id != added.id));
    }

    #[test]
    fn whitespace_text_is_a_no_op() {
        let list = sample();
        assert_eq!(add_entry(&list, " \t\n ", at(9_000)), list);

        let notes = add_progress_note(&[], "   ", at(9_000));
        assert!(notes.is_empty());
    }

    #[test]
    fn double_toggle_restores_the_list() {
        let list = sample();
        for entry in &list {
            let once = toggle_entry(&list, &entry.id);
            assert_ne!(once, list);
            assert_eq!(toggle_entry(&once, &entry.id), list);
        }
        assert_eq!(toggle_entry(&list, "missing"), list);
    }

    #[test]
    fn progress_notes_are_prepended() {
        let notes = add_progress_note(&[], "Seen by reg", at(1_000));
        let notes = add_progress_note(&notes, "Bloods back", at(2_000));

        assert_eq!(notes[0].text, "Bloods back");
        assert_eq!(notes[1].text, "Seen by reg");
    }

    #[test]
    fn remove_and_update_target_only_the_matching_id() {
        let list = sample();
        let target = list[1].id.clone();

        let removed = remove_by_id(&list, &target);
        assert_eq!(removed.len(), 2);
        assert!(removed.iter().all(|entry| entry.id != target));

        let updated = update_text(&list, &target, " raw text ");
        assert_eq!(updated[1].text, " raw text ");
        assert_eq!(updated[0], list[0]);
        assert_eq!(updated[2], list[2]);
    }
}
