use std::collections::BTreeMap;

use chrono::serde::{ts_milliseconds, ts_milliseconds_option};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const CURRENT_VERSION: u32 = 2;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Red,
    #[default]
    Amber,
    Green,
}

impl Urgency {
    pub const ALL: [Urgency; 3] = [Urgency::Red, Urgency::Amber, Urgency::Green];

    pub fn as_str(self) -> &'static str {
        match self {
            Urgency::Red => "red",
            Urgency::Amber => "amber",
            Urgency::Green => "green",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "red" => Some(Urgency::Red),
            "amber" => Some(Urgency::Amber),
            "green" => Some(Urgency::Green),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemType {
    Job,
    Bleep,
}

impl ItemType {
    pub fn as_str(self) -> &'static str {
        match self {
            ItemType::Job => "job",
            ItemType::Bleep => "bleep",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ItemType::Job => "Job",
            ItemType::Bleep => "Bleep",
        }
    }
}

/// Which of an item's two checklists an entry belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChecklistKind {
    Tasks,
    Actions,
}

impl ChecklistKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ChecklistKind::Tasks => "tasks",
            ChecklistKind::Actions => "actions",
        }
    }

    /// Unknown or missing values fall back to tasks, matching the markup
    /// which always emits one of the two.
    pub fn parse_or_tasks(raw: Option<&str>) -> Self {
        match raw {
            Some("actions") => ChecklistKind::Actions,
            _ => ChecklistKind::Tasks,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChecklistEntry {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub done: bool,
    #[serde(with = "ts_milliseconds")]
    pub t: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProgressNote {
    pub id: String,
    pub text: String,
    #[serde(with = "ts_milliseconds")]
    pub t: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct JobDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ward: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bed: Option<String>,
    #[serde(default)]
    pub summary: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BleepDetails {
    #[serde(default)]
    pub from: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default)]
    pub called_back: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ItemKind {
    Job(JobDetails),
    Bleep(BleepDetails),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: String,

    #[serde(flatten)]
    pub kind: ItemKind,

    #[serde(with = "ts_milliseconds")]
    pub created_at: DateTime<Utc>,

    #[serde(with = "ts_milliseconds")]
    pub updated_at: DateTime<Utc>,

    #[serde(default)]
    pub urgency: Urgency,

    #[serde(default)]
    pub done: bool,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "ts_milliseconds_option"
    )]
    pub review_by: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary_summary: Option<String>,

    #[serde(default)]
    pub tasks: Vec<ChecklistEntry>,

    #[serde(default)]
    pub actions: Vec<ChecklistEntry>,

    #[serde(default)]
    pub progress: Vec<ProgressNote>,
}

impl Item {
    pub fn new(kind: ItemKind, now: DateTime<Utc>) -> Self {
        Self {
            id: new_id(),
            kind,
            created_at: now,
            updated_at: now,
            urgency: Urgency::Amber,
            done: false,
            review_by: None,
            secondary_summary: None,
            tasks: vec![],
            actions: vec![],
            progress: vec![],
        }
    }

    pub fn item_type(&self) -> ItemType {
        match self.kind {
            ItemKind::Job(_) => ItemType::Job,
            ItemKind::Bleep(_) => ItemType::Bleep,
        }
    }

    pub fn checklist(&self, kind: ChecklistKind) -> &[ChecklistEntry] {
        match kind {
            ChecklistKind::Tasks => &self.tasks,
            ChecklistKind::Actions => &self.actions,
        }
    }

    pub fn set_checklist(&mut self, kind: ChecklistKind, entries: Vec<ChecklistEntry>) {
        match kind {
            ChecklistKind::Tasks => self.tasks = entries,
            ChecklistKind::Actions => self.actions = entries,
        }
    }

    pub fn open_entry_count(&self) -> usize {
        self.tasks
            .iter()
            .chain(self.actions.iter())
            .filter(|entry| !entry.done)
            .count()
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    All,
    #[default]
    Open,
    Done,
}

impl StatusFilter {
    pub fn as_str(self) -> &'static str {
        match self {
            StatusFilter::All => "all",
            StatusFilter::Open => "open",
            StatusFilter::Done => "done",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "all" => Some(StatusFilter::All),
            "open" => Some(StatusFilter::Open),
            "done" => Some(StatusFilter::Done),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum KindFilter {
    #[default]
    All,
    Job,
    Bleep,
}

impl KindFilter {
    pub fn as_str(self) -> &'static str {
        match self {
            KindFilter::All => "all",
            KindFilter::Job => "job",
            KindFilter::Bleep => "bleep",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "all" => Some(KindFilter::All),
            "job" => Some(KindFilter::Job),
            "bleep" => Some(KindFilter::Bleep),
            _ => None,
        }
    }

    pub fn admits(self, item_type: ItemType) -> bool {
        match self {
            KindFilter::All => true,
            KindFilter::Job => item_type == ItemType::Job,
            KindFilter::Bleep => item_type == ItemType::Bleep,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SortMode {
    #[default]
    #[serde(alias = "triageTime")]
    Triage,
    Newest,
}

impl SortMode {
    pub fn as_str(self) -> &'static str {
        match self {
            SortMode::Triage => "triage",
            SortMode::Newest => "newest",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "triage" | "triageTime" => Some(SortMode::Triage),
            "newest" => Some(SortMode::Newest),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Preferences {
    #[serde(default)]
    pub filter: StatusFilter,
    #[serde(default)]
    pub kind: KindFilter,
    #[serde(default)]
    pub sort: SortMode,
    #[serde(default)]
    pub search: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Document {
    #[serde(default)]
    pub version: u32,

    #[serde(default)]
    pub items: Vec<Item>,

    #[serde(default, alias = "prefs")]
    pub preferences: Preferences,

    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl Default for Document {
    fn default() -> Self {
        Self {
            version: CURRENT_VERSION,
            items: vec![],
            preferences: Preferences::default(),
            extra: BTreeMap::new(),
        }
    }
}

impl Document {
    pub fn item(&self, id: &str) -> Option<&Item> {
        self.items.iter().find(|item| item.id == id)
    }

    /// Replaces the item with `id` by the result of `f`, bumping `updatedAt`.
    /// Returns false when no such item exists.
    pub fn replace_item<F>(&mut self, id: &str, now: DateTime<Utc>, f: F) -> bool
    where
        F: FnOnce(Item) -> Item,
    {
        let Some(idx) = self.items.iter().position(|item| item.id == id) else {
            return false;
        };
        let mut current = self.items[idx].clone();
        current.updated_at = now;
        self.items[idx] = f(current);
        true
    }

    pub fn remove_item(&mut self, id: &str) -> bool {
        let before = self.items.len();
        self.items.retain(|item| item.id != id);
        self.items.len() != before
    }
}

pub fn new_id() -> String {
    Uuid::new_v4().simple().to_string()
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn at(ms: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(ms).single().expect("valid millis")
    }

    #[test]
    fn item_serializes_flat_with_type_tag() {
        let mut item = Item::new(
            ItemKind::Bleep(BleepDetails {
                from: "Bleep 1234".to_string(),
                ..BleepDetails::default()
            }),
            at(1_700_000_000_000),
        );
        item.id = "abc".to_string();

        let value = serde_json::to_value(&item).expect("serialize item");
        assert_eq!(value["type"], "bleep");
        assert_eq!(value["from"], "Bleep 1234");
        assert_eq!(value["calledBack"], false);
        assert_eq!(value["createdAt"], 1_700_000_000_000_i64);
        assert!(value.get("reviewBy").is_none());
    }

    #[test]
    fn document_backfills_missing_fields_and_keeps_unknown_ones() {
        let raw = r#"{"items":[],"theme":"night","prefs":{"sort":"triageTime"}}"#;
        let doc: Document = serde_json::from_str(raw).expect("parse document");

        assert_eq!(doc.version, 0);
        assert_eq!(doc.preferences.sort, SortMode::Triage);
        assert_eq!(doc.preferences.filter, StatusFilter::Open);
        assert_eq!(doc.extra.get("theme"), Some(&serde_json::json!("night")));
    }

    #[test]
    fn replace_item_bumps_updated_at_and_reports_missing_targets() {
        let mut doc = Document::default();
        let item = Item::new(ItemKind::Job(JobDetails::default()), at(1_000));
        let id = item.id.clone();
        doc.items.push(item);

        assert!(doc.replace_item(&id, at(5_000), |mut it| {
            it.done = true;
            it
        }));
        assert_eq!(doc.items[0].updated_at, at(5_000));
        assert!(doc.items[0].done);
        assert!(!doc.replace_item("missing", at(6_000), |it| it));
    }
}
