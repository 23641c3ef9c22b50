//! The single state owner. Front-ends turn events into [`Action`]s, hand
//! them to [`App::dispatch`], and apply the returned [`Effect`].

use std::collections::BTreeSet;

use anyhow::Context;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use tracing::{debug, error, info};

use crate::action::{Action, ItemField, Route};
use crate::checklist::{Entry, add_entry, add_progress_note, remove_by_id, toggle_entry, update_text};
use crate::datastore::{DocumentStore, KvStore};
use crate::datetime::parse_datetime_local;
use crate::draft::DraftAdd;
use crate::gesture::{GestureBoard, GestureCommand, GestureConfig};
use crate::item::{ChecklistKind, Document, Item, ItemKind};
use crate::query::visible_sorted;
use crate::scribe::Scribe;
use crate::view::{self, ViewContext, card};

pub const SAVE_FAILED_NOTICE: &str =
    "Storage is unavailable. Changes are kept on this screen until it is closed.";

/// State that lives only as long as the page does.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UiState {
    pub route: Route,
    pub add_open: bool,
    pub edit_id: Option<String>,
    pub expanded: BTreeSet<String>,
    pub draft: DraftAdd,
    pub filters_open: bool,
    pub list_scroll_y: f64,
    pub notice: Option<String>,
}

impl UiState {
    pub fn dialog_open(&self) -> bool {
        self.add_open || self.edit_id.is_some()
    }
}

/// How a mutation reaches the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    /// Persist, then rebuild the whole page.
    Rerender,
    /// Persist, then patch the affected nodes in place.
    Patch,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomPatch {
    Checklist {
        item_id: String,
        kind: ChecklistKind,
        entry_id: String,
        done: bool,
        stamp: String,
    },
    PillRow {
        item_id: String,
        markup: String,
    },
    Notice(Option<String>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogChange {
    ShowAdd,
    CloseAdd,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Ignored,
    Rerender,
    /// An empty patch list means state changed with nothing to redraw.
    Patch(Vec<DomPatch>),
    Dialog(DialogChange),
    Clipboard(String),
}

impl Effect {
    pub fn label(&self) -> &'static str {
        match self {
            Effect::Ignored => "ignored",
            Effect::Rerender => "rerender",
            Effect::Patch(_) => "patch",
            Effect::Dialog(_) => "dialog",
            Effect::Clipboard(_) => "clipboard",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AppConfig {
    pub tz: Tz,
    pub highlight: bool,
    pub gestures: GestureConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            tz: chrono_tz::UTC,
            highlight: false,
            gestures: GestureConfig::default(),
        }
    }
}

pub struct App<S> {
    store: DocumentStore<S>,
    doc: Document,
    ui: UiState,
    scribe: Scribe,
    gestures: GestureBoard,
    config: AppConfig,
    save_error: Option<String>,
}

impl<S: KvStore> App<S> {
    #[tracing::instrument(skip(backend, config))]
    pub fn open(backend: S, config: AppConfig) -> anyhow::Result<Self> {
        let mut store = DocumentStore::new(backend);
        let doc = store.load().context("failed loading taskmedic document")?;
        info!(items = doc.items.len(), "taskmedic state loaded");

        Ok(Self {
            store,
            doc,
            ui: UiState::default(),
            scribe: Scribe::default(),
            gestures: GestureBoard::new(config.gestures),
            config,
            save_error: None,
        })
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    pub fn ui(&self) -> &UiState {
        &self.ui
    }

    pub fn scribe(&self) -> &Scribe {
        &self.scribe
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn backend(&self) -> &S {
        self.store.backend()
    }

    pub fn backend_mut(&mut self) -> &mut S {
        self.store.backend_mut()
    }

    /// Detail of the most recent failed save, cleared by the next success.
    pub fn save_error(&self) -> Option<&str> {
        self.save_error.as_deref()
    }

    pub fn gestures(&self) -> &GestureBoard {
        &self.gestures
    }

    pub fn gestures_mut(&mut self) -> &mut GestureBoard {
        &mut self.gestures
    }

    pub fn set_reduced_motion(&mut self, reduced: bool) {
        self.gestures.set_reduced_motion(reduced);
    }

    pub fn view_context(&self, now: DateTime<Utc>) -> ViewContext {
        ViewContext {
            now,
            tz: self.config.tz,
            highlight: self.config.highlight,
        }
    }

    pub fn render(&self, now: DateTime<Utc>) -> String {
        view::render_app(&self.doc, &self.ui, &self.scribe, &self.view_context(now))
    }

    pub fn render_page(&self, now: DateTime<Utc>) -> String {
        view::render_page(&self.doc, &self.ui, &self.scribe, &self.view_context(now))
    }

    /// Ids of the cards the list route currently shows, in display order.
    pub fn visible_card_ids(&self) -> Vec<String> {
        if self.ui.route != Route::List {
            return vec![];
        }
        visible_sorted(&self.doc.items, &self.doc.preferences)
            .into_iter()
            .map(|item| item.id.clone())
            .collect()
    }

    /// Resets gesture state to the cards of a fresh render.
    pub fn rebind_gestures(&mut self) -> Vec<GestureCommand> {
        let ids = self.visible_card_ids();
        self.gestures.rebind(ids)
    }

    #[tracing::instrument(level = "debug", skip(self, action, now), fields(action = action.name()))]
    pub fn dispatch(&mut self, action: Action, now: DateTime<Utc>) -> Effect {
        let effect = self.apply(action, now);
        debug!(effect = effect.label(), "dispatched");
        effect
    }

    fn apply(&mut self, action: Action, now: DateTime<Utc>) -> Effect {
        match action {
            Action::Navigate(route) => {
                self.ui.route = route;
                Effect::Rerender
            }
            Action::OpenAdd => {
                self.ui.add_open = true;
                Effect::Dialog(DialogChange::ShowAdd)
            }
            Action::CloseAdd => {
                self.ui.add_open = false;
                Effect::Dialog(DialogChange::CloseAdd)
            }
            Action::ToggleFilters => {
                self.ui.filters_open = !self.ui.filters_open;
                Effect::Rerender
            }
            Action::DraftTab(tab) => {
                self.ui.draft.tab = tab;
                self.ui.add_open = true;
                Effect::Rerender
            }
            Action::DraftField { name, value } => {
                if self.ui.draft.set_field(&name, &value) {
                    Effect::Patch(vec![])
                } else {
                    Effect::Ignored
                }
            }
            Action::AddDraftTask { text } => {
                if let Some(text) = text {
                    self.ui.draft.draft_task_text = text;
                }
                let pending = self.ui.draft.draft_task_text.clone();
                if !self.ui.draft.push_task(&pending) {
                    return Effect::Ignored;
                }
                self.ui.add_open = true;
                Effect::Rerender
            }
            Action::RemoveDraftTask { idx } => {
                if self.ui.draft.remove_task(idx) {
                    Effect::Rerender
                } else {
                    Effect::Ignored
                }
            }
            Action::ToggleDraftCalledBack => {
                self.ui.draft.called_back = !self.ui.draft.called_back;
                Effect::Rerender
            }
            Action::SubmitAdd => self.submit_add(now),
            Action::WipeShift => {
                let removed = self.doc.items.len();
                self.doc.items.clear();
                self.ui.expanded.clear();
                self.ui.edit_id = None;
                info!(removed, "shift ended; all items cleared");
                self.commit(Intent::Rerender)
            }
            Action::OpenEdit { id } => {
                if self.doc.item(&id).is_none() {
                    return Effect::Ignored;
                }
                self.ui.edit_id = Some(id);
                Effect::Rerender
            }
            Action::CloseEdit => {
                self.ui.edit_id = None;
                Effect::Rerender
            }
            Action::CardTap {
                id,
                in_header,
                in_expanded_panel,
            } => self.card_tap(id, in_header, in_expanded_panel, now),
            Action::ToggleExpand { id } => {
                if self.doc.item(&id).is_none() {
                    return Effect::Ignored;
                }
                if !self.ui.expanded.remove(&id) {
                    self.ui.expanded.insert(id);
                }
                Effect::Rerender
            }
            Action::LongPress { id } => {
                if self.doc.item(&id).is_none() || self.ui.expanded.contains(&id) {
                    return Effect::Ignored;
                }
                self.ui.expanded.insert(id);
                Effect::Rerender
            }
            Action::ToggleDone { id } => self.update_item(&id, now, Intent::Rerender, |mut it| {
                it.done = !it.done;
                it
            }),
            Action::DeleteItem { id } => {
                if !self.doc.remove_item(&id) {
                    return Effect::Ignored;
                }
                self.ui.expanded.remove(&id);
                if self.ui.edit_id.as_deref() == Some(id.as_str()) {
                    self.ui.edit_id = None;
                }
                info!(%id, "item deleted");
                self.commit(Intent::Rerender)
            }
            Action::ToggleInlineCheck { id, kind, xid } | Action::ToggleCheck { id, kind, xid } => {
                self.toggle_check(&id, kind, &xid, now)
            }
            Action::AddCheck { id, kind, text } => {
                if text.trim().is_empty() {
                    return Effect::Ignored;
                }
                self.update_item(&id, now, Intent::Rerender, |mut it| {
                    let next = add_entry(it.checklist(kind), &text, now);
                    it.set_checklist(kind, next);
                    it
                })
            }
            Action::RemoveCheck { id, kind, xid } => {
                if !self.has_entry(&id, kind, &xid) {
                    return Effect::Ignored;
                }
                self.update_item(&id, now, Intent::Rerender, |mut it| {
                    let next = remove_by_id(it.checklist(kind), &xid);
                    it.set_checklist(kind, next);
                    it
                })
            }
            Action::EditCheckText { id, kind, xid, text } => {
                if !self.has_entry(&id, kind, &xid) {
                    return Effect::Ignored;
                }
                self.update_item(&id, now, Intent::Patch, |mut it| {
                    let next = update_text(it.checklist(kind), &xid, &text);
                    it.set_checklist(kind, next);
                    it
                })
            }
            Action::AddProgress { id, text } => {
                if text.trim().is_empty() {
                    return Effect::Ignored;
                }
                self.update_item(&id, now, Intent::Rerender, |mut it| {
                    it.progress = add_progress_note(&it.progress, &text, now);
                    it
                })
            }
            Action::RemoveProgress { id, pid } => {
                if !self.has_note(&id, &pid) {
                    return Effect::Ignored;
                }
                self.update_item(&id, now, Intent::Rerender, |mut it| {
                    it.progress = remove_by_id(&it.progress, &pid);
                    it
                })
            }
            Action::EditProgressText { id, pid, text } => {
                if !self.has_note(&id, &pid) {
                    return Effect::Ignored;
                }
                self.update_item(&id, now, Intent::Patch, |mut it| {
                    it.progress = update_text(&it.progress, &pid, &text);
                    it
                })
            }
            Action::EditField { id, field, value } => {
                let Some(item) = self.doc.item(&id) else {
                    return Effect::Ignored;
                };
                if !field_applies(item, field) {
                    return Effect::Ignored;
                }
                self.update_item(&id, now, Intent::Patch, |it| set_field(it, field, &value))
            }
            Action::EditUrgency { id, urgency } => {
                self.update_item(&id, now, Intent::Patch, |mut it| {
                    it.urgency = urgency;
                    it
                })
            }
            Action::EditReviewBy { id, value } => {
                let review_by = if value.trim().is_empty() {
                    None
                } else {
                    match parse_datetime_local(&value, self.config.tz) {
                        Some(at) => Some(at),
                        None => return Effect::Ignored,
                    }
                };
                self.update_item(&id, now, Intent::Patch, |mut it| {
                    it.review_by = review_by;
                    it
                })
            }
            Action::ToggleCalledBack { id } => {
                let Some(ItemKind::Bleep(_)) = self.doc.item(&id).map(|it| &it.kind) else {
                    return Effect::Ignored;
                };
                self.update_item(&id, now, Intent::Rerender, |mut it| {
                    if let ItemKind::Bleep(bleep) = &mut it.kind {
                        bleep.called_back = !bleep.called_back;
                    }
                    it
                })
            }
            Action::SetSearch(search) => {
                self.doc.preferences.search = search;
                self.commit(Intent::Rerender)
            }
            Action::SetKindFilter(kind) => {
                self.doc.preferences.kind = kind;
                self.commit(Intent::Rerender)
            }
            Action::SetStatusFilter(filter) => {
                self.doc.preferences.filter = filter;
                self.commit(Intent::Rerender)
            }
            Action::SetSort(sort) => {
                self.doc.preferences.sort = sort;
                self.commit(Intent::Rerender)
            }
            Action::ScribeStart => rerender_if(self.scribe.start(now)),
            Action::ScribePause => rerender_if(self.scribe.pause(now)),
            Action::ScribeReset => {
                self.scribe.reset();
                Effect::Rerender
            }
            Action::ScribeQuick(text) => {
                self.scribe.tick(now);
                self.scribe.record(&text, now);
                Effect::Rerender
            }
            Action::ScribeAdd(text) => {
                let text = text.trim();
                if text.is_empty() {
                    return Effect::Ignored;
                }
                self.scribe.tick(now);
                self.scribe.record(text, now);
                Effect::Rerender
            }
            Action::ScribeClear => {
                self.scribe.clear_log();
                Effect::Rerender
            }
            Action::ScribeCopy => Effect::Clipboard(self.scribe.export_text()),
            Action::Scrolled { y } => {
                if self.ui.route != Route::List || self.ui.dialog_open() {
                    return Effect::Ignored;
                }
                self.ui.list_scroll_y = y;
                Effect::Patch(vec![])
            }
            Action::Tick => rerender_if(self.scribe.tick(now) && self.ui.route == Route::Tools),
        }
    }

    fn submit_add(&mut self, now: DateTime<Utc>) -> Effect {
        let Some(item) = self.ui.draft.build_item(now, self.config.tz) else {
            debug!("add submitted without its required field");
            return Effect::Ignored;
        };
        info!(id = %item.id, kind = item.item_type().as_str(), "item added");
        self.doc.items.push(item);
        self.ui.draft = DraftAdd::default();
        self.ui.add_open = false;
        self.commit(Intent::Rerender)
    }

    fn card_tap(&mut self, id: String, in_header: bool, in_panel: bool, now: DateTime<Utc>) -> Effect {
        if self.doc.item(&id).is_none() || self.gestures.should_ignore_tap(&id, now) {
            return Effect::Ignored;
        }
        if !self.ui.expanded.contains(&id) {
            self.ui.expanded.insert(id);
            return Effect::Rerender;
        }
        if in_header || !in_panel {
            self.ui.expanded.remove(&id);
            return Effect::Rerender;
        }
        Effect::Ignored
    }

    fn toggle_check(&mut self, id: &str, kind: ChecklistKind, xid: &str, now: DateTime<Utc>) -> Effect {
        if !self.has_entry(id, kind, xid) {
            return Effect::Ignored;
        }
        let effect = self.update_item(id, now, Intent::Patch, |mut it| {
            let next = toggle_entry(it.checklist(kind), xid);
            it.set_checklist(kind, next);
            it
        });
        let Effect::Patch(mut patches) = effect else {
            return effect;
        };

        let ctx = self.view_context(now);
        let entry = self
            .doc
            .item(id)
            .and_then(|it| it.checklist(kind).iter().find(|entry| entry.id == xid));
        if let Some(entry) = entry {
            patches.insert(
                0,
                DomPatch::Checklist {
                    item_id: id.to_string(),
                    kind,
                    entry_id: xid.to_string(),
                    done: entry.done,
                    stamp: card::check_stamp(entry, &ctx),
                },
            );
        }
        Effect::Patch(patches)
    }

    fn has_entry(&self, id: &str, kind: ChecklistKind, xid: &str) -> bool {
        self.doc
            .item(id)
            .is_some_and(|it| it.checklist(kind).iter().any(|entry| entry.id() == xid))
    }

    fn has_note(&self, id: &str, pid: &str) -> bool {
        self.doc
            .item(id)
            .is_some_and(|it| it.progress.iter().any(|note| note.id() == pid))
    }

    fn update_item<F>(&mut self, id: &str, now: DateTime<Utc>, intent: Intent, f: F) -> Effect
    where
        F: FnOnce(Item) -> Item,
    {
        if !self.doc.replace_item(id, now, f) {
            return Effect::Ignored;
        }
        let effect = self.commit(intent);
        let Effect::Patch(mut patches) = effect else {
            return effect;
        };
        if let Some(item) = self.doc.item(id) {
            patches.insert(
                0,
                DomPatch::PillRow {
                    item_id: item.id.clone(),
                    markup: card::pill_row(item, &self.view_context(now)),
                },
            );
        }
        Effect::Patch(patches)
    }

    fn commit(&mut self, intent: Intent) -> Effect {
        let notice_before = self.ui.notice.clone();
        self.persist();
        match intent {
            Intent::Rerender => Effect::Rerender,
            Intent::Patch if self.ui.notice != notice_before => {
                Effect::Patch(vec![DomPatch::Notice(self.ui.notice.clone())])
            }
            Intent::Patch => Effect::Patch(vec![]),
        }
    }

    fn persist(&mut self) {
        match self.store.save(&self.doc) {
            Ok(()) => {
                if self.ui.notice.take().is_some() {
                    info!("storage available again");
                }
                self.save_error = None;
            }
            Err(err) => {
                let detail = format!("{err:#}");
                error!(error = %detail, "failed saving document; keeping in-memory state");
                self.ui.notice = Some(SAVE_FAILED_NOTICE.to_string());
                self.save_error = Some(detail);
            }
        }
    }
}

fn rerender_if(changed: bool) -> Effect {
    if changed {
        Effect::Rerender
    } else {
        Effect::Ignored
    }
}

fn field_applies(item: &Item, field: ItemField) -> bool {
    match (&item.kind, field) {
        (_, ItemField::Summary | ItemField::SecondarySummary) => true,
        (ItemKind::Job(_), ItemField::Ward | ItemField::Bed) => true,
        (ItemKind::Bleep(_), ItemField::From | ItemField::Location) => true,
        _ => false,
    }
}

fn set_field(mut item: Item, field: ItemField, value: &str) -> Item {
    let optional = (!value.is_empty()).then(|| value.to_string());
    match (&mut item.kind, field) {
        (_, ItemField::SecondarySummary) => item.secondary_summary = optional,
        (ItemKind::Job(job), ItemField::Ward) => job.ward = optional,
        (ItemKind::Job(job), ItemField::Bed) => job.bed = optional,
        (ItemKind::Job(job), ItemField::Summary) => job.summary = value.to_string(),
        (ItemKind::Bleep(bleep), ItemField::From) => bleep.from = value.to_string(),
        (ItemKind::Bleep(bleep), ItemField::Location) => bleep.location = optional,
        (ItemKind::Bleep(bleep), ItemField::Summary) => bleep.summary = optional,
        _ => {}
    }
    item
}
