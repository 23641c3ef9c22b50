//! Typed interpretation of the `data-action` markup contract.

use crate::item::{ChecklistKind, ItemType, KindFilter, SortMode, StatusFilter, Urgency};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Route {
    #[default]
    List,
    Tools,
}

impl Route {
    pub fn as_str(self) -> &'static str {
        match self {
            Route::List => "list",
            Route::Tools => "tools",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "list" => Some(Route::List),
            "tools" => Some(Route::Tools),
            _ => None,
        }
    }
}

/// Item properties editable through `data-action="editField"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemField {
    Ward,
    Bed,
    Summary,
    From,
    Location,
    SecondarySummary,
}

impl ItemField {
    pub fn as_str(self) -> &'static str {
        match self {
            ItemField::Ward => "ward",
            ItemField::Bed => "bed",
            ItemField::Summary => "summary",
            ItemField::From => "from",
            ItemField::Location => "location",
            ItemField::SecondarySummary => "secondarySummary",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "ward" => Some(ItemField::Ward),
            "bed" => Some(ItemField::Bed),
            "summary" => Some(ItemField::Summary),
            "from" => Some(ItemField::From),
            "location" => Some(ItemField::Location),
            "secondarySummary" => Some(ItemField::SecondarySummary),
            _ => None,
        }
    }
}

/// The `data-*` attributes of the element an event was delegated to, plus
/// the state of the control itself. Hosts fill in what they can read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionAttrs {
    pub action: String,
    pub id: Option<String>,
    pub kind: Option<String>,
    pub xid: Option<String>,
    pub pid: Option<String>,
    pub idx: Option<String>,
    pub route: Option<String>,
    pub text: Option<String>,
    pub field: Option<String>,
    /// Control value, or the paired input's value for add buttons.
    pub value: Option<String>,
    pub checked: Option<bool>,
    pub in_header: bool,
    pub in_expanded_panel: bool,
}

impl ActionAttrs {
    pub fn new(action: &str) -> Self {
        Self {
            action: action.to_string(),
            ..Self::default()
        }
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.id = Some(id.to_string());
        self
    }

    pub fn with_kind(mut self, kind: ChecklistKind) -> Self {
        self.kind = Some(kind.as_str().to_string());
        self
    }

    pub fn with_xid(mut self, xid: &str) -> Self {
        self.xid = Some(xid.to_string());
        self
    }

    pub fn with_pid(mut self, pid: &str) -> Self {
        self.pid = Some(pid.to_string());
        self
    }

    pub fn with_field(mut self, field: &str) -> Self {
        self.field = Some(field.to_string());
        self
    }

    pub fn with_value(mut self, value: &str) -> Self {
        self.value = Some(value.to_string());
        self
    }

    fn required(value: &Option<String>) -> Option<String> {
        value.as_deref().filter(|raw| !raw.is_empty()).map(str::to_string)
    }

    fn id(&self) -> Option<String> {
        Self::required(&self.id)
    }

    fn xid(&self) -> Option<String> {
        Self::required(&self.xid)
    }

    fn pid(&self) -> Option<String> {
        Self::required(&self.pid)
    }

    fn checklist_kind(&self) -> ChecklistKind {
        ChecklistKind::parse_or_tasks(self.kind.as_deref())
    }

    fn value_or_empty(&self) -> String {
        self.value.clone().unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Navigate(Route),
    OpenAdd,
    CloseAdd,
    ToggleFilters,
    DraftTab(ItemType),
    DraftField { name: String, value: String },
    /// `text` overrides the stored draft text (Enter in the input).
    AddDraftTask { text: Option<String> },
    RemoveDraftTask { idx: usize },
    ToggleDraftCalledBack,
    SubmitAdd,
    WipeShift,
    OpenEdit { id: String },
    CloseEdit,
    CardTap { id: String, in_header: bool, in_expanded_panel: bool },
    ToggleExpand { id: String },
    LongPress { id: String },
    ToggleDone { id: String },
    DeleteItem { id: String },
    ToggleInlineCheck { id: String, kind: ChecklistKind, xid: String },
    ToggleCheck { id: String, kind: ChecklistKind, xid: String },
    AddCheck { id: String, kind: ChecklistKind, text: String },
    RemoveCheck { id: String, kind: ChecklistKind, xid: String },
    EditCheckText { id: String, kind: ChecklistKind, xid: String, text: String },
    AddProgress { id: String, text: String },
    RemoveProgress { id: String, pid: String },
    EditProgressText { id: String, pid: String, text: String },
    EditField { id: String, field: ItemField, value: String },
    EditUrgency { id: String, urgency: Urgency },
    EditReviewBy { id: String, value: String },
    ToggleCalledBack { id: String },
    SetSearch(String),
    SetKindFilter(KindFilter),
    SetStatusFilter(StatusFilter),
    SetSort(SortMode),
    ScribeStart,
    ScribePause,
    ScribeReset,
    ScribeQuick(String),
    ScribeAdd(String),
    ScribeClear,
    ScribeCopy,
    Scrolled { y: f64 },
    Tick,
}

impl Action {
    /// Builds the action named by `attrs.action`. Unknown names, missing
    /// identifiers and unparseable values yield `None`.
    pub fn from_attrs(attrs: &ActionAttrs) -> Option<Self> {
        let action = match attrs.action.as_str() {
            "nav" => Action::Navigate(
                attrs
                    .route
                    .as_deref()
                    .and_then(Route::parse)
                    .unwrap_or_default(),
            ),
            "openAdd" => Action::OpenAdd,
            "closeAdd" => Action::CloseAdd,
            "toggleFilters" => Action::ToggleFilters,
            "tabJob" => Action::DraftTab(ItemType::Job),
            "tabBleep" => Action::DraftTab(ItemType::Bleep),
            "draftField" => Action::DraftField {
                name: ActionAttrs::required(&attrs.field)?,
                value: match attrs.checked {
                    Some(checked) => checked.to_string(),
                    None => attrs.value_or_empty(),
                },
            },
            "addDraftTask" => Action::AddDraftTask {
                text: attrs.value.clone(),
            },
            "rmDraftTask" => Action::RemoveDraftTask {
                idx: attrs.idx.as_deref()?.trim().parse().ok()?,
            },
            "toggleDraftCalledBack" => Action::ToggleDraftCalledBack,
            "submitAdd" => Action::SubmitAdd,
            "wipeShift" => Action::WipeShift,
            "openEdit" => Action::OpenEdit { id: attrs.id()? },
            "closeEdit" => Action::CloseEdit,
            "cardTap" => Action::CardTap {
                id: attrs.id()?,
                in_header: attrs.in_header,
                in_expanded_panel: attrs.in_expanded_panel,
            },
            "toggleExpand" => Action::ToggleExpand { id: attrs.id()? },
            "longPress" => Action::LongPress { id: attrs.id()? },
            "toggleDone" => Action::ToggleDone { id: attrs.id()? },
            "deleteItem" => Action::DeleteItem { id: attrs.id()? },
            "toggleInlineCheck" => Action::ToggleInlineCheck {
                id: attrs.id()?,
                kind: attrs.checklist_kind(),
                xid: attrs.xid()?,
            },
            "toggleCheck" => Action::ToggleCheck {
                id: attrs.id()?,
                kind: attrs.checklist_kind(),
                xid: attrs.xid()?,
            },
            "addCheck" => Action::AddCheck {
                id: attrs.id()?,
                kind: attrs.checklist_kind(),
                text: attrs.value_or_empty(),
            },
            "rmCheck" => Action::RemoveCheck {
                id: attrs.id()?,
                kind: attrs.checklist_kind(),
                xid: attrs.xid()?,
            },
            "editCheckText" => Action::EditCheckText {
                id: attrs.id()?,
                kind: attrs.checklist_kind(),
                xid: attrs.xid()?,
                text: attrs.value_or_empty(),
            },
            "addProgress" => Action::AddProgress {
                id: attrs.id()?,
                text: attrs.value_or_empty(),
            },
            "rmProgress" => Action::RemoveProgress {
                id: attrs.id()?,
                pid: attrs.pid()?,
            },
            "editProgressText" => Action::EditProgressText {
                id: attrs.id()?,
                pid: attrs.pid()?,
                text: attrs.value_or_empty(),
            },
            "editField" => Action::EditField {
                id: attrs.id()?,
                field: ItemField::parse(attrs.field.as_deref()?)?,
                value: attrs.value_or_empty(),
            },
            "editUrgency" => Action::EditUrgency {
                id: attrs.id()?,
                urgency: Urgency::parse(attrs.value.as_deref()?)?,
            },
            "editReviewBy" => Action::EditReviewBy {
                id: attrs.id()?,
                value: attrs.value_or_empty(),
            },
            "toggleCalledBack" => Action::ToggleCalledBack { id: attrs.id()? },
            "setSearch" => Action::SetSearch(attrs.value_or_empty()),
            "setKind" => Action::SetKindFilter(KindFilter::parse(attrs.value.as_deref()?)?),
            "setFilter" => Action::SetStatusFilter(StatusFilter::parse(attrs.value.as_deref()?)?),
            "setSort" => Action::SetSort(SortMode::parse(attrs.value.as_deref()?)?),
            "scribeStart" => Action::ScribeStart,
            "scribePause" => Action::ScribePause,
            "scribeReset" => Action::ScribeReset,
            "scribeQuick" => Action::ScribeQuick(attrs.text.clone().unwrap_or_default()),
            "scribeAdd" => Action::ScribeAdd(attrs.value_or_empty()),
            "scribeClear" => Action::ScribeClear,
            "scribeCopy" => Action::ScribeCopy,
            _ => return None,
        };
        Some(action)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Action::Navigate(_) => "nav",
            Action::OpenAdd => "openAdd",
            Action::CloseAdd => "closeAdd",
            Action::ToggleFilters => "toggleFilters",
            Action::DraftTab(ItemType::Job) => "tabJob",
            Action::DraftTab(ItemType::Bleep) => "tabBleep",
            Action::DraftField { .. } => "draftField",
            Action::AddDraftTask { .. } => "addDraftTask",
            Action::RemoveDraftTask { .. } => "rmDraftTask",
            Action::ToggleDraftCalledBack => "toggleDraftCalledBack",
            Action::SubmitAdd => "submitAdd",
            Action::WipeShift => "wipeShift",
            Action::OpenEdit { .. } => "openEdit",
            Action::CloseEdit => "closeEdit",
            Action::CardTap { .. } => "cardTap",
            Action::ToggleExpand { .. } => "toggleExpand",
            Action::LongPress { .. } => "longPress",
            Action::ToggleDone { .. } => "toggleDone",
            Action::DeleteItem { .. } => "deleteItem",
            Action::ToggleInlineCheck { .. } => "toggleInlineCheck",
            Action::ToggleCheck { .. } => "toggleCheck",
            Action::AddCheck { .. } => "addCheck",
            Action::RemoveCheck { .. } => "rmCheck",
            Action::EditCheckText { .. } => "editCheckText",
            Action::AddProgress { .. } => "addProgress",
            Action::RemoveProgress { .. } => "rmProgress",
            Action::EditProgressText { .. } => "editProgressText",
            Action::EditField { .. } => "editField",
            Action::EditUrgency { .. } => "editUrgency",
            Action::EditReviewBy { .. } => "editReviewBy",
            Action::ToggleCalledBack { .. } => "toggleCalledBack",
            Action::SetSearch(_) => "setSearch",
            Action::SetKindFilter(_) => "setKind",
            Action::SetStatusFilter(_) => "setFilter",
            Action::SetSort(_) => "setSort",
            Action::ScribeStart => "scribeStart",
            Action::ScribePause => "scribePause",
            Action::ScribeReset => "scribeReset",
            Action::ScribeQuick(_) => "scribeQuick",
            Action::ScribeAdd(_) => "scribeAdd",
            Action::ScribeClear => "scribeClear",
            Action::ScribeCopy => "scribeCopy",
            Action::Scrolled { .. } => "scrolled",
            Action::Tick => "tick",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_identifiers_yield_no_action() {
        assert_eq!(Action::from_attrs(&ActionAttrs::new("toggleDone")), None);
        assert_eq!(
            Action::from_attrs(&ActionAttrs::new("toggleDone").with_id("")),
            None
        );
        assert_eq!(
            Action::from_attrs(&ActionAttrs::new("toggleInlineCheck").with_id("a")),
            None
        );
        assert_eq!(
            Action::from_attrs(&ActionAttrs::new("rmProgress").with_id("a")),
            None
        );
        assert_eq!(Action::from_attrs(&ActionAttrs::new("launchRocket")), None);
    }

    #[test]
    fn checklist_kind_defaults_to_tasks() {
        let attrs = ActionAttrs::new("toggleCheck").with_id("a").with_xid("x");
        assert_eq!(
            Action::from_attrs(&attrs),
            Some(Action::ToggleCheck {
                id: "a".to_string(),
                kind: ChecklistKind::Tasks,
                xid: "x".to_string(),
            })
        );

        let attrs = attrs.with_kind(ChecklistKind::Actions);
        assert!(matches!(
            Action::from_attrs(&attrs),
            Some(Action::ToggleCheck {
                kind: ChecklistKind::Actions,
                ..
            })
        ));
    }

    #[test]
    fn value_carrying_actions_parse_their_values() {
        let urgency = ActionAttrs::new("editUrgency").with_id("a").with_value("red");
        assert_eq!(
            Action::from_attrs(&urgency),
            Some(Action::EditUrgency {
                id: "a".to_string(),
                urgency: Urgency::Red,
            })
        );

        let bad = ActionAttrs::new("editUrgency").with_id("a").with_value("teal");
        assert_eq!(Action::from_attrs(&bad), None);

        let field = ActionAttrs::new("editField")
            .with_id("a")
            .with_field("secondarySummary")
            .with_value("PMH: COPD");
        assert_eq!(
            Action::from_attrs(&field),
            Some(Action::EditField {
                id: "a".to_string(),
                field: ItemField::SecondarySummary,
                value: "PMH: COPD".to_string(),
            })
        );

        let sort = ActionAttrs::new("setSort").with_value("triageTime");
        assert_eq!(Action::from_attrs(&sort), Some(Action::SetSort(SortMode::Triage)));

        let draft_idx = ActionAttrs {
            idx: Some("2".to_string()),
            ..ActionAttrs::new("rmDraftTask")
        };
        assert_eq!(
            Action::from_attrs(&draft_idx),
            Some(Action::RemoveDraftTask { idx: 2 })
        );
    }

    #[test]
    fn checkbox_state_wins_for_draft_fields() {
        let attrs = ActionAttrs {
            checked: Some(true),
            ..ActionAttrs::new("draftField")
                .with_field("calledBack")
                .with_value("on")
        };
        assert_eq!(
            Action::from_attrs(&attrs),
            Some(Action::DraftField {
                name: "calledBack".to_string(),
                value: "true".to_string(),
            })
        );
    }

    #[test]
    fn names_round_trip_through_attrs() {
        let attrs = ActionAttrs::new("deleteItem").with_id("abc");
        let action = Action::from_attrs(&attrs).expect("action");
        assert_eq!(action.name(), "deleteItem");

        let nav = Action::from_attrs(&ActionAttrs {
            route: Some("tools".to_string()),
            ..ActionAttrs::new("nav")
        })
        .expect("nav");
        assert_eq!(nav, Action::Navigate(Route::Tools));
    }
}
