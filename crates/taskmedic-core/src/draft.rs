use chrono::{DateTime, Utc};
use chrono_tz::Tz;

use crate::checklist::add_entry;
use crate::datetime::parse_datetime_local;
use crate::item::{BleepDetails, Item, ItemKind, ItemType, JobDetails, Urgency};

/// In-progress contents of the add sheet. Not persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftAdd {
    pub tab: ItemType,
    pub ward: String,
    pub bed: String,
    pub summary: String,
    pub secondary_summary: String,
    pub urgency: Urgency,
    pub review_by: String,
    pub from: String,
    pub location: String,
    pub bleep_summary: String,
    pub called_back: bool,
    pub draft_task_text: String,
    pub draft_tasks: Vec<String>,
}

impl Default for DraftAdd {
    fn default() -> Self {
        Self {
            tab: ItemType::Job,
            ward: String::new(),
            bed: String::new(),
            summary: String::new(),
            secondary_summary: String::new(),
            urgency: Urgency::Amber,
            review_by: String::new(),
            from: String::new(),
            location: String::new(),
            bleep_summary: String::new(),
            called_back: false,
            draft_task_text: String::new(),
            draft_tasks: vec![],
        }
    }
}

impl DraftAdd {
    /// Applies a form control's value by its `name` attribute. Returns false
    /// for names the add form does not carry.
    pub fn set_field(&mut self, name: &str, value: &str) -> bool {
        let slot = match name {
            "ward" => &mut self.ward,
            "bed" => &mut self.bed,
            "summary" => &mut self.summary,
            "secondarySummary" => &mut self.secondary_summary,
            "reviewBy" => &mut self.review_by,
            "from" => &mut self.from,
            "location" => &mut self.location,
            "bleepSummary" => &mut self.bleep_summary,
            "draftTaskText" => &mut self.draft_task_text,
            "urgency" => {
                return match Urgency::parse(value) {
                    Some(urgency) => {
                        self.urgency = urgency;
                        true
                    }
                    None => false,
                };
            }
            "calledBack" => {
                self.called_back = matches!(value, "true" | "on" | "1");
                return true;
            }
            _ => return false,
        };
        *slot = value.to_string();
        true
    }

    /// Moves the pending task text into the draft task list. Blank text is
    /// left untouched and reported as `false`.
    pub fn push_task(&mut self, text: &str) -> bool {
        let text = text.trim();
        if text.is_empty() {
            return false;
        }
        self.draft_tasks.push(text.to_string());
        self.draft_task_text.clear();
        true
    }

    pub fn remove_task(&mut self, idx: usize) -> bool {
        if idx >= self.draft_tasks.len() {
            return false;
        }
        self.draft_tasks.remove(idx);
        true
    }

    /// Builds the item the draft describes, or `None` when the required
    /// field for the active tab (job summary, bleep caller) is blank.
    pub fn build_item(&self, now: DateTime<Utc>, tz: Tz) -> Option<Item> {
        let kind = match self.tab {
            ItemType::Job => {
                let summary = self.summary.trim();
                if summary.is_empty() {
                    return None;
                }
                ItemKind::Job(JobDetails {
                    ward: non_blank(&self.ward),
                    bed: non_blank(&self.bed),
                    summary: summary.to_string(),
                })
            }
            ItemType::Bleep => {
                let from = self.from.trim();
                if from.is_empty() {
                    return None;
                }
                ItemKind::Bleep(BleepDetails {
                    from: from.to_string(),
                    location: non_blank(&self.location),
                    summary: non_blank(&self.bleep_summary),
                    called_back: self.called_back,
                })
            }
        };

        let mut item = Item::new(kind, now);
        item.urgency = self.urgency;
        item.secondary_summary = non_blank(&self.secondary_summary);
        item.review_by = parse_datetime_local(&self.review_by, tz);
        item.tasks = self
            .draft_tasks
            .iter()
            .fold(Vec::new(), |tasks, text| add_entry(&tasks, text, now));
        Some(item)
    }
}

fn non_blank(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.timestamp_millis_opt(1_754_000_000_000).single().expect("valid")
    }

    #[test]
    fn job_requires_a_summary() {
        let mut draft = DraftAdd::default();
        draft.set_field("ward", "AMU");
        assert!(draft.build_item(now(), chrono_tz::UTC).is_none());

        draft.set_field("summary", "  Test job summary ");
        let item = draft.build_item(now(), chrono_tz::UTC).expect("job item");
        match item.kind {
            ItemKind::Job(job) => {
                assert_eq!(job.summary, "Test job summary");
                assert_eq!(job.ward.as_deref(), Some("AMU"));
                assert_eq!(job.bed, None);
            }
            ItemKind::Bleep(_) => panic!("expected a job"),
        }
    }

    #[test]
    fn bleep_requires_a_caller() {
        let mut draft = DraftAdd {
            tab: ItemType::Bleep,
            ..DraftAdd::default()
        };
        draft.set_field("bleepSummary", "Please review patient");
        assert!(draft.build_item(now(), chrono_tz::UTC).is_none());

        draft.set_field("from", "Bleep 1234");
        draft.set_field("calledBack", "true");
        let item = draft.build_item(now(), chrono_tz::UTC).expect("bleep item");
        assert_eq!(
            item.kind,
            ItemKind::Bleep(BleepDetails {
                from: "Bleep 1234".to_string(),
                location: None,
                summary: Some("Please review patient".to_string()),
                called_back: true,
            })
        );
    }

    #[test]
    fn draft_tasks_become_open_entries() {
        let mut draft = DraftAdd::default();
        draft.set_field("summary", "Chest pain");
        draft.set_field("draftTaskText", "Task A");
        assert!(draft.push_task(&draft.draft_task_text.clone()));
        assert!(!draft.push_task("   "));
        assert!(draft.draft_task_text.is_empty());

        draft.set_field("urgency", "red");
        draft.set_field("reviewBy", "2030-01-01T12:30");
        let item = draft.build_item(now(), chrono_tz::UTC).expect("item");

        assert_eq!(item.urgency, Urgency::Red);
        assert!(item.review_by.is_some());
        assert_eq!(item.tasks.len(), 1);
        assert_eq!(item.tasks[0].text, "Task A");
        assert!(!item.tasks[0].done);
    }

    #[test]
    fn unknown_fields_and_bad_indices_are_rejected() {
        let mut draft = DraftAdd::default();
        assert!(!draft.set_field("colour", "blue"));
        assert!(!draft.set_field("urgency", "purple"));
        assert!(!draft.remove_task(0));
    }
}
