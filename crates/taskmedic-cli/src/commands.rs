use std::fs;
use std::path::Path;

use anyhow::{Context, anyhow, bail};
use chrono::{DateTime, Utc};
use serde::Serialize;
use taskmedic_core::action::Action;
use taskmedic_core::app::{App, Effect};
use taskmedic_core::datastore::KvStore;
use taskmedic_core::datetime::parse_datetime_local;
use taskmedic_core::item::{ChecklistKind, Item, ItemType, KindFilter, SortMode, StatusFilter, Urgency};
use taskmedic_core::query::visible_sorted;
use taskmedic_core::view::card::{headline, secondary};
use tracing::{debug, info, instrument};

use crate::cli::{
    AddBleepArgs, AddCommand, AddJobArgs, CheckCommand, Command, CommonAddArgs, KindArg, ListArgs,
    SortArg, StatusArg, UrgencyArg,
};
use crate::render::{Renderer, short_id};

#[instrument(skip(app, renderer, command, now))]
pub fn dispatch<S: KvStore>(
    app: &mut App<S>,
    renderer: &Renderer,
    command: Option<Command>,
    now: DateTime<Utc>,
) -> anyhow::Result<()> {
    let command = command.unwrap_or(Command::List(ListArgs::default()));
    debug!(?command, "dispatching command");

    match command {
        Command::Add(AddCommand::Job(args)) => cmd_add_job(app, args, now),
        Command::Add(AddCommand::Bleep(args)) => cmd_add_bleep(app, args, now),
        Command::List(args) => cmd_list(app, renderer, &args, now),
        Command::Show { id } => {
            let id = resolve_item(app, &id)?;
            let item = app
                .document()
                .item(&id)
                .ok_or_else(|| anyhow!("item vanished: {id}"))?;
            renderer.print_item_info(item)
        }
        Command::Done { id, undo } => cmd_done(app, &id, undo, now),
        Command::Delete { id } => {
            let id = resolve_item(app, &id)?;
            apply(app, Action::DeleteItem { id }, now)?;
            println!("Deleted 1 item(s).");
            Ok(())
        }
        Command::Check(check) => cmd_check(app, check, now),
        Command::Note { id, text } => {
            let id = resolve_item(app, &id)?;
            let text = text.join(" ");
            if apply(app, Action::AddProgress { id: id.clone(), text }, now)? == Effect::Ignored {
                bail!("note text cannot be empty");
            }
            println!("Added note to item {}.", short_id(&id));
            Ok(())
        }
        Command::Review { id, when } => cmd_review(app, &id, &when, now),
        Command::Urgency { id, urgency } => {
            let id = resolve_item(app, &id)?;
            let urgency = urgency_from(urgency);
            apply(
                app,
                Action::EditUrgency {
                    id: id.clone(),
                    urgency,
                },
                now,
            )?;
            println!("Set urgency of item {} to {}.", short_id(&id), urgency.as_str());
            Ok(())
        }
        Command::Callback { id } => {
            let id = resolve_item(app, &id)?;
            if apply(app, Action::ToggleCalledBack { id: id.clone() }, now)? == Effect::Ignored {
                bail!("item {} is not a bleep", short_id(&id));
            }
            println!("Toggled callback on item {}.", short_id(&id));
            Ok(())
        }
        Command::Wipe { yes } => {
            let count = app.document().items.len();
            if !yes {
                bail!("refusing to remove {count} item(s) without --yes");
            }
            apply(app, Action::WipeShift, now)?;
            println!("Deleted {count} item(s).");
            Ok(())
        }
        Command::Render { out } => {
            let page = app.render_page(now);
            write_output(out.as_deref(), &page)
        }
        Command::Export { out } => {
            let json = serde_json::to_string_pretty(app.document())?;
            write_output(out.as_deref(), &json)
        }
    }
}

#[instrument(skip(app, args, now))]
fn cmd_add_job<S: KvStore>(app: &mut App<S>, args: AddJobArgs, now: DateTime<Utc>) -> anyhow::Result<()> {
    info!("command add job");

    apply(app, Action::DraftTab(ItemType::Job), now)?;
    draft_field(app, "summary", &args.summary, now)?;
    draft_field(app, "ward", args.ward.as_deref().unwrap_or_default(), now)?;
    draft_field(app, "bed", args.bed.as_deref().unwrap_or_default(), now)?;
    submit_draft(app, &args.common, "job summary", now)
}

#[instrument(skip(app, args, now))]
fn cmd_add_bleep<S: KvStore>(app: &mut App<S>, args: AddBleepArgs, now: DateTime<Utc>) -> anyhow::Result<()> {
    info!("command add bleep");

    apply(app, Action::DraftTab(ItemType::Bleep), now)?;
    draft_field(app, "from", &args.from, now)?;
    draft_field(app, "location", args.location.as_deref().unwrap_or_default(), now)?;
    draft_field(app, "bleepSummary", args.summary.as_deref().unwrap_or_default(), now)?;
    draft_field(app, "calledBack", if args.called_back { "true" } else { "false" }, now)?;
    submit_draft(app, &args.common, "bleep caller", now)
}

fn submit_draft<S: KvStore>(
    app: &mut App<S>,
    common: &CommonAddArgs,
    required: &str,
    now: DateTime<Utc>,
) -> anyhow::Result<()> {
    if let Some(review_by) = &common.review_by {
        validate_review_by(app, review_by)?;
        draft_field(app, "reviewBy", review_by, now)?;
    }
    draft_field(app, "urgency", urgency_from(common.urgency).as_str(), now)?;
    draft_field(
        app,
        "secondarySummary",
        common.secondary.as_deref().unwrap_or_default(),
        now,
    )?;
    for task in &common.tasks {
        apply(
            app,
            Action::AddDraftTask {
                text: Some(task.clone()),
            },
            now,
        )?;
    }

    if apply(app, Action::SubmitAdd, now)? == Effect::Ignored {
        bail!("{required} cannot be empty");
    }

    let item = app
        .document()
        .items
        .last()
        .ok_or_else(|| anyhow!("added item missing from document"))?;
    println!("Created {} {}.", item.item_type().as_str(), short_id(&item.id));
    Ok(())
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ListRow<'a> {
    id: &'a str,
    #[serde(rename = "type")]
    kind: &'static str,
    urgency: &'static str,
    done: bool,
    headline: String,
    summary: String,
    open_entries: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    review_by: Option<DateTime<Utc>>,
}

impl<'a> ListRow<'a> {
    fn new(item: &'a Item) -> Self {
        Self {
            id: &item.id,
            kind: item.item_type().as_str(),
            urgency: item.urgency.as_str(),
            done: item.done,
            headline: headline(item),
            summary: secondary(item),
            open_entries: item.open_entry_count(),
            review_by: item.review_by,
        }
    }
}

/// Flags narrow this listing only; the stored preferences stay untouched.
#[instrument(skip(app, renderer, args, now))]
fn cmd_list<S: KvStore>(
    app: &App<S>,
    renderer: &Renderer,
    args: &ListArgs,
    now: DateTime<Utc>,
) -> anyhow::Result<()> {
    info!("command list");

    let mut prefs = app.document().preferences.clone();
    if let Some(status) = args.status {
        prefs.filter = match status {
            StatusArg::All => StatusFilter::All,
            StatusArg::Open => StatusFilter::Open,
            StatusArg::Done => StatusFilter::Done,
        };
    }
    if let Some(kind) = args.kind {
        prefs.kind = match kind {
            KindArg::All => KindFilter::All,
            KindArg::Job => KindFilter::Job,
            KindArg::Bleep => KindFilter::Bleep,
        };
    }
    if let Some(sort) = args.sort {
        prefs.sort = match sort {
            SortArg::Triage => SortMode::Triage,
            SortArg::Newest => SortMode::Newest,
        };
    }
    if let Some(search) = &args.search {
        prefs.search = search.clone();
    }

    let items = visible_sorted(&app.document().items, &prefs);
    debug!(visible = items.len(), ?prefs, "list computed");

    if args.json {
        for item in &items {
            println!("{}", serde_json::to_string(&ListRow::new(item))?);
        }
        return Ok(());
    }

    if items.is_empty() {
        println!("No items match your filters.");
        return Ok(());
    }
    renderer.print_item_table(&items, now)?;
    println!();
    println!("{} item(s)", items.len());
    Ok(())
}

#[instrument(skip(app, now))]
fn cmd_done<S: KvStore>(app: &mut App<S>, id: &str, undo: bool, now: DateTime<Utc>) -> anyhow::Result<()> {
    info!("command done");

    let id = resolve_item(app, id)?;
    let already = app.document().item(&id).is_some_and(|item| item.done != undo);
    if already {
        let state = if undo { "open" } else { "done" };
        println!("Item {} is already {state}.", short_id(&id));
        return Ok(());
    }

    apply(app, Action::ToggleDone { id: id.clone() }, now)?;
    if undo {
        println!("Reopened item {}.", short_id(&id));
    } else {
        println!("Completed item {}.", short_id(&id));
    }
    Ok(())
}

#[instrument(skip(app, check, now))]
fn cmd_check<S: KvStore>(app: &mut App<S>, check: CheckCommand, now: DateTime<Utc>) -> anyhow::Result<()> {
    info!("command check");

    match check {
        CheckCommand::Add { id, text, actions } => {
            let id = resolve_item(app, &id)?;
            let kind = checklist_kind(actions);
            let action = Action::AddCheck {
                id: id.clone(),
                kind,
                text: text.join(" "),
            };
            if apply(app, action, now)? == Effect::Ignored {
                bail!("{} text cannot be empty", singular(kind));
            }
            println!("Added {} to item {}.", singular(kind), short_id(&id));
        }
        CheckCommand::Toggle { id, entry, actions } => {
            let id = resolve_item(app, &id)?;
            let kind = checklist_kind(actions);
            let xid = resolve_entry(app, &id, kind, &entry)?;
            apply(
                app,
                Action::ToggleCheck {
                    id: id.clone(),
                    kind,
                    xid: xid.clone(),
                },
                now,
            )?;
            let done = app
                .document()
                .item(&id)
                .and_then(|item| item.checklist(kind).iter().find(|entry| entry.id == xid))
                .is_some_and(|entry| entry.done);
            println!(
                "Marked {} {} {}.",
                singular(kind),
                short_id(&xid),
                if done { "done" } else { "open" }
            );
        }
        CheckCommand::Rm { id, entry, actions } => {
            let id = resolve_item(app, &id)?;
            let kind = checklist_kind(actions);
            let xid = resolve_entry(app, &id, kind, &entry)?;
            apply(app, Action::RemoveCheck { id, kind, xid }, now)?;
            println!("Removed 1 {}(s).", singular(kind));
        }
    }
    Ok(())
}

#[instrument(skip(app, now))]
fn cmd_review<S: KvStore>(app: &mut App<S>, id: &str, when: &str, now: DateTime<Utc>) -> anyhow::Result<()> {
    info!("command review");

    let id = resolve_item(app, id)?;
    let value = if when.eq_ignore_ascii_case("none") {
        String::new()
    } else {
        validate_review_by(app, when)?;
        when.to_string()
    };
    apply(
        app,
        Action::EditReviewBy {
            id: id.clone(),
            value: value.clone(),
        },
        now,
    )?;

    if value.is_empty() {
        println!("Cleared review-by on item {}.", short_id(&id));
    } else {
        println!("Review item {} by {value}.", short_id(&id));
    }
    Ok(())
}

/// Dispatches one action and turns a failed save into an error.
fn apply<S: KvStore>(app: &mut App<S>, action: Action, now: DateTime<Utc>) -> anyhow::Result<Effect> {
    let effect = app.dispatch(action, now);
    if let Some(err) = app.save_error() {
        return Err(anyhow!("failed to save document: {err}"));
    }
    Ok(effect)
}

fn draft_field<S: KvStore>(app: &mut App<S>, name: &str, value: &str, now: DateTime<Utc>) -> anyhow::Result<()> {
    let action = Action::DraftField {
        name: name.to_string(),
        value: value.to_string(),
    };
    if apply(app, action, now)? == Effect::Ignored {
        bail!("invalid value for {name}: {value}");
    }
    Ok(())
}

fn validate_review_by<S: KvStore>(app: &App<S>, raw: &str) -> anyhow::Result<()> {
    parse_datetime_local(raw, app.config().tz)
        .map(|_| ())
        .ok_or_else(|| anyhow!("invalid review-by time (expected YYYY-MM-DDTHH:MM): {raw}"))
}

/// Resolves an exact id or a unique id prefix.
pub fn resolve_item<S: KvStore>(app: &App<S>, prefix: &str) -> anyhow::Result<String> {
    let ids = app.document().items.iter().map(|item| item.id.as_str());
    resolve_prefix(ids, prefix, "item")
}

fn resolve_entry<S: KvStore>(
    app: &App<S>,
    item_id: &str,
    kind: ChecklistKind,
    prefix: &str,
) -> anyhow::Result<String> {
    let item = app
        .document()
        .item(item_id)
        .ok_or_else(|| anyhow!("no item matches {item_id}"))?;
    let ids = item.checklist(kind).iter().map(|entry| entry.id.as_str());
    resolve_prefix(ids, prefix, singular(kind))
}

fn resolve_prefix<'a, I>(ids: I, prefix: &str, what: &str) -> anyhow::Result<String>
where
    I: Iterator<Item = &'a str>,
{
    let prefix = prefix.trim();
    if prefix.is_empty() {
        bail!("{what} id cannot be empty");
    }

    let mut matches = Vec::new();
    for id in ids {
        if id == prefix {
            return Ok(id.to_string());
        }
        if id.starts_with(prefix) {
            matches.push(id);
        }
    }

    match matches.as_slice() {
        [] => Err(anyhow!("no {what} matches {prefix}")),
        [only] => Ok(only.to_string()),
        many => Err(anyhow!(
            "ambiguous {what} id {prefix}: matches {} {what}s",
            many.len()
        )),
    }
}

fn write_output(out: Option<&Path>, text: &str) -> anyhow::Result<()> {
    match out {
        Some(path) => {
            fs::write(path, text).with_context(|| format!("failed to write {}", path.display()))?;
            println!("Wrote {}.", path.display());
        }
        None => println!("{text}"),
    }
    Ok(())
}

fn checklist_kind(actions: bool) -> ChecklistKind {
    if actions {
        ChecklistKind::Actions
    } else {
        ChecklistKind::Tasks
    }
}

fn singular(kind: ChecklistKind) -> &'static str {
    match kind {
        ChecklistKind::Tasks => "task",
        ChecklistKind::Actions => "action",
    }
}

fn urgency_from(arg: UrgencyArg) -> Urgency {
    match arg {
        UrgencyArg::Red => Urgency::Red,
        UrgencyArg::Amber => Urgency::Amber,
        UrgencyArg::Green => Urgency::Green,
    }
}
