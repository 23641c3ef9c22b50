use super::ViewContext;
use super::markup::{Tone, bool_attr, escape, pill};
use crate::datetime::{fmt_hm, fmt_time};
use crate::item::{ChecklistEntry, ChecklistKind, Item, ItemKind, ProgressNote, Urgency};

const PILL_TASK_LIMIT: usize = 3;
const PROGRESS_LIMIT: usize = 8;

/// `Ward · Bed N` for jobs, `from · location` for bleeps.
pub fn headline(item: &Item) -> String {
    match &item.kind {
        ItemKind::Job(job) => {
            let ward = job.ward.as_deref().map(str::trim).unwrap_or_default();
            let bed = job.bed.as_deref().map(str::trim).unwrap_or_default();
            let ward = if ward.is_empty() { "Ward" } else { ward };
            let bed = if bed.is_empty() { "?" } else { bed };
            format!("{ward} · Bed {bed}")
        }
        ItemKind::Bleep(bleep) => {
            let from = bleep.from.trim();
            let from = if from.is_empty() { "Bleep" } else { from };
            match bleep.location.as_deref().map(str::trim) {
                Some(location) if !location.is_empty() => format!("{from} · {location}"),
                _ => from.to_string(),
            }
        }
    }
}

pub fn secondary(item: &Item) -> String {
    match &item.kind {
        ItemKind::Job(job) => {
            let main = job.summary.trim();
            match item.secondary_summary.as_deref().map(str::trim) {
                Some(extra) if !extra.is_empty() => format!("{main} · {extra}"),
                _ => main.to_string(),
            }
        }
        ItemKind::Bleep(bleep) => {
            let summary = bleep.summary.as_deref().map(str::trim).unwrap_or_default();
            if !summary.is_empty() {
                summary.to_string()
            } else if bleep.called_back {
                "Called back".to_string()
            } else {
                "Awaiting callback".to_string()
            }
        }
    }
}

pub fn urgency_tone(urgency: Urgency) -> Tone {
    match urgency {
        Urgency::Red => Tone::Danger,
        Urgency::Amber => Tone::Amber,
        Urgency::Green => Tone::Success,
    }
}

/// Urgency, up to three open task/action labels, and the review pill.
pub fn pill_row(item: &Item, ctx: &ViewContext) -> String {
    let id = &item.id;
    let mut out = pill(
        &item.urgency.as_str().to_uppercase(),
        urgency_tone(item.urgency),
        Some(&format!("pill-urgency-{id}")),
    );

    let open: Vec<&str> = item
        .tasks
        .iter()
        .chain(item.actions.iter())
        .filter(|entry| !entry.done)
        .map(|entry| entry.text.as_str())
        .take(PILL_TASK_LIMIT)
        .collect();
    if open.is_empty() {
        out.push_str(&pill(
            "No outstanding tasks",
            Tone::Neutral,
            Some(&format!("pill-task-{id}-none")),
        ));
    } else {
        for (idx, label) in open.iter().enumerate() {
            out.push_str(&pill(
                label,
                Tone::Neutral,
                Some(&format!("pill-task-{id}-{idx}")),
            ));
        }
    }

    let (review, tone) = match item.review_by {
        Some(at) => (
            format!("Review by {}", fmt_hm(at, ctx.tz)),
            if at <= ctx.now { Tone::Danger } else { Tone::Info },
        ),
        None => ("No review time".to_string(), Tone::Info),
    };
    out.push_str(&pill(&review, tone, Some(&format!("pill-review-{id}"))));
    out
}

/// Text of a checklist row's completion stamp; empty while open.
pub fn check_stamp(entry: &ChecklistEntry, ctx: &ViewContext) -> String {
    if entry.done {
        format!("Completed {}", fmt_hm(entry.t, ctx.tz))
    } else {
        String::new()
    }
}

pub fn render_card(item: &Item, expanded: bool, ctx: &ViewContext) -> String {
    let id = escape(&item.id);
    let expanded_class = if expanded { " is-expanded" } else { "" };
    let done_class = if item.done { " is-done" } else { "" };
    let done_label = if item.done { "Open" } else { "Done" };

    format!(
        r#"<li class="tm-card-shell" data-testid="card-shell-{id}">
<div class="tm-card-actions" data-testid="card-actions-{id}">
<button type="button" class="tm-swipe-btn tm-swipe-edit" data-action="openEdit" data-id="{id}" data-testid="card-edit-{id}">Edit</button>
<button type="button" class="tm-swipe-btn tm-swipe-done" data-action="toggleDone" data-id="{id}" data-testid="card-done-{id}">{done_label}</button>
</div>
<article class="tm-card-surface{expanded_class}{done_class}" data-card-id="{id}" data-expanded="{expanded_attr}" data-urgency="{urgency}" data-action="cardTap" data-id="{id}" data-testid="item-card-{id}">
{collapsed}
<div class="tm-card-expand-wrap" aria-hidden="{hidden}" data-testid="card-expand-wrap-{id}">
{panel}
</div>
</article>
</li>"#,
        expanded_attr = bool_attr(expanded),
        urgency = item.urgency.as_str(),
        collapsed = render_collapsed(item, ctx),
        hidden = bool_attr(!expanded),
        panel = if expanded {
            render_expanded(item, ctx)
        } else {
            String::new()
        },
    )
}

fn render_collapsed(item: &Item, ctx: &ViewContext) -> String {
    let id = escape(&item.id);
    format!(
        r#"<header class="tm-card-header" data-testid="card-header-{id}">
<h3 class="tm-card-headline">{headline}</h3>
<p class="tm-card-summary">{summary}</p>
<div class="tm-pill-row" data-testid="pill-row-{id}">{pills}</div>
</header>"#,
        headline = escape(&headline(item)),
        summary = escape(&secondary(item)),
        pills = pill_row(item, ctx),
    )
}

fn render_expanded(item: &Item, ctx: &ViewContext) -> String {
    let id = escape(&item.id);
    format!(
        r#"<section class="tm-card-expanded" data-testid="card-expanded-{id}">
<div class="tm-expanded-block">
<h4 class="tm-expanded-title">Tasks</h4>
<div class="tm-expanded-actions"><button class="tm-inline-btn" type="button" data-action="openEdit" data-id="{id}">Edit</button></div>
<div class="tm-expanded-list">{tasks}</div>
</div>
<div class="tm-expanded-divider"></div>
<div class="tm-expanded-block">
<h4 class="tm-expanded-title">Actions</h4>
<div class="tm-expanded-list">{actions}</div>
</div>
<div class="tm-expanded-divider"></div>
<div class="tm-expanded-block">
<h4 class="tm-expanded-title">Progress</h4>
<div class="tm-expanded-list">{progress}</div>
</div>
</section>"#,
        tasks = checklist_rows(item, ChecklistKind::Tasks, ctx),
        actions = checklist_rows(item, ChecklistKind::Actions, ctx),
        progress = progress_rows(&item.progress, ctx),
    )
}

fn checklist_rows(item: &Item, kind: ChecklistKind, ctx: &ViewContext) -> String {
    let entries = item.checklist(kind);
    if entries.is_empty() {
        return r#"<div class="tm-empty-row">None</div>"#.to_string();
    }

    let id = escape(&item.id);
    let kind = kind.as_str();
    entries
        .iter()
        .map(|entry| {
            let xid = escape(&entry.id);
            let done = bool_attr(entry.done);
            let done_class = if entry.done { " is-complete" } else { "" };
            format!(
                r#"<button type="button" class="tm-check-row{done_class}" data-action="toggleInlineCheck" data-id="{id}" data-kind="{kind}" data-xid="{xid}" data-testid="inline-check-{id}-{kind}-{xid}" data-done="{done}" aria-label="{kind} checkbox" aria-checked="{done}" role="checkbox">
<div class="tm-check-copy"><div class="tm-check-text">{text}</div></div>
<div class="tm-check-meta"><div class="tm-check-time" data-testid="check-time-{id}-{kind}-{xid}">{stamp}</div></div>
</button>"#,
                text = escape(&entry.text),
                stamp = check_stamp(entry, ctx),
            )
        })
        .collect()
}

fn progress_rows(progress: &[ProgressNote], ctx: &ViewContext) -> String {
    if progress.is_empty() {
        return r#"<div class="tm-empty-row">None</div>"#.to_string();
    }
    progress
        .iter()
        .take(PROGRESS_LIMIT)
        .map(|note| {
            format!(
                r#"<div class="tm-progress-row">
<div class="tm-progress-marker"></div>
<div class="tm-progress-copy">
<div class="tm-progress-text">{}</div>
<div class="tm-progress-time">Reviewed at {}</div>
</div>
</div>"#,
                escape(&note.text),
                fmt_time(note.t, ctx.tz)
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Duration, TimeZone, Utc};

    use super::*;
    use crate::checklist::{add_entry, add_progress_note, toggle_entry};
    use crate::item::{BleepDetails, JobDetails};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2030, 1, 1, 9, 0, 0).single().expect("valid")
    }

    fn ctx() -> ViewContext {
        ViewContext::new(now(), chrono_tz::UTC)
    }

    fn job(ward: Option<&str>, bed: Option<&str>, summary: &str) -> Item {
        Item::new(
            ItemKind::Job(JobDetails {
                ward: ward.map(str::to_string),
                bed: bed.map(str::to_string),
                summary: summary.to_string(),
            }),
            now(),
        )
    }

    #[test]
    fn headlines_fall_back_to_placeholders() {
        assert_eq!(headline(&job(Some("AMU"), Some("12"), "x")), "AMU · Bed 12");
        assert_eq!(headline(&job(None, Some("  "), "x")), "Ward · Bed ?");

        let bleep = Item::new(
            ItemKind::Bleep(BleepDetails {
                from: "x5678".to_string(),
                location: Some("Ward 5".to_string()),
                ..BleepDetails::default()
            }),
            now(),
        );
        assert_eq!(headline(&bleep), "x5678 · Ward 5");
        assert_eq!(secondary(&bleep), "Awaiting callback");
    }

    #[test]
    fn secondary_joins_the_secondary_summary() {
        let mut item = job(None, None, "?Sepsis");
        item.secondary_summary = Some(" PMH: COPD ".to_string());
        assert_eq!(secondary(&item), "?Sepsis · PMH: COPD");
    }

    #[test]
    fn pill_row_lists_open_work_and_review_state() {
        let mut item = job(None, None, "Chest pain");
        for text in ["ECG", "Troponin", "CXR", "Gas"] {
            item.tasks = add_entry(&item.tasks, text, now());
        }
        item.tasks = toggle_entry(&item.tasks, &item.tasks[0].id.clone());
        item.review_by = Some(now() - Duration::minutes(5));

        let row = pill_row(&item, &ctx());
        assert!(!row.contains(">ECG<"));
        assert!(row.contains(">Troponin<") && row.contains(">CXR<") && row.contains(">Gas<"));
        assert!(row.contains("tm-pill-danger\" data-testid=\"pill-review"));
        assert!(row.contains("Review by 08:55"));

        item.tasks.clear();
        item.review_by = None;
        let row = pill_row(&item, &ctx());
        assert!(row.contains("No outstanding tasks"));
        assert!(row.contains("No review time"));
    }

    #[test]
    fn expanded_card_shows_rows_with_completion_stamps() {
        let mut item = job(None, None, "Falls");
        item.tasks = add_entry(&[], "Lying standing BP", now());
        item.tasks = toggle_entry(&item.tasks, &item.tasks[0].id.clone());
        item.progress = add_progress_note(&[], "Seen by physio", now());

        let collapsed = render_card(&item, false, &ctx());
        assert!(!collapsed.contains("tm-card-expanded"));
        assert!(collapsed.contains(r#"data-expanded="false""#));

        let expanded = render_card(&item, true, &ctx());
        assert!(expanded.contains(r#"data-action="toggleInlineCheck""#));
        assert!(expanded.contains("Completed 09:00"));
        assert!(expanded.contains("Reviewed at 01 Jan 2030, 09:00"));
        assert!(expanded.contains(&format!(r#"data-testid="card-edit-{}""#, item.id)));
    }

    #[test]
    fn user_text_is_escaped() {
        let item = job(Some("<script>"), None, "a & b");
        let card = render_card(&item, false, &ctx());
        assert!(card.contains("&lt;script&gt; · Bed ?"));
        assert!(card.contains("a &amp; b"));
        assert!(!card.contains("<script>"));
    }
}
