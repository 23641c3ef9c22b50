use super::ViewContext;
use super::markup::{checked, escape, selected};
use crate::datetime::{fmt_time, to_datetime_local};
use crate::item::{ChecklistEntry, ChecklistKind, Item, ItemKind, ProgressNote, Urgency};

pub fn render_edit_sheet(item: &Item, ctx: &ViewContext) -> String {
    let id = escape(&item.id);
    let kind_fields = match &item.kind {
        ItemKind::Job(job) => format!(
            r#"<div class="grid2">
{ward}
{bed}
</div>
{summary}"#,
            ward = edit_field(&id, "Ward", "ward", job.ward.as_deref().unwrap_or_default()),
            bed = edit_field(&id, "Bed", "bed", job.bed.as_deref().unwrap_or_default()),
            summary = edit_field(&id, "Summary", "summary", &job.summary),
        ),
        ItemKind::Bleep(bleep) => format!(
            r#"{from}
{location}
{summary}
<label class="row">
<input type="checkbox"{called_back} data-action="toggleCalledBack" data-id="{id}" data-testid="edit-called-back-{id}"/>
<span class="help">Called back</span>
</label>"#,
            from = edit_field(&id, "From", "from", &bleep.from),
            location = edit_field(
                &id,
                "Location",
                "location",
                bleep.location.as_deref().unwrap_or_default()
            ),
            summary = edit_field(
                &id,
                "Summary",
                "summary",
                bleep.summary.as_deref().unwrap_or_default()
            ),
            called_back = checked(bleep.called_back),
        ),
    };

    let review = item
        .review_by
        .map(|at| to_datetime_local(at, ctx.tz))
        .unwrap_or_default();

    format!(
        r#"<dialog id="editSheet" data-testid="edit-sheet-{id}">
<div class="sheetHead">
<h3>Edit</h3>
<div class="row"><button class="btn small ghost" type="button" data-action="closeEdit">Close</button></div>
</div>
<div class="sheetBody">
<div class="notice"><strong>{label}</strong><div class="help">Changes are saved as you type.</div></div>
{kind_fields}
{secondary}
<div class="grid2">
<label>Urgency
<select data-action="editUrgency" data-id="{id}" data-testid="edit-urgency-{id}">
<option value="red"{red}>Red</option>
<option value="amber"{amber}>Amber</option>
<option value="green"{green}>Green</option>
</select>
</label>
<label>Review by (optional)
<input type="datetime-local" value="{review}" data-action="editReviewBy" data-id="{id}" data-testid="edit-review-{id}"/>
</label>
</div>
{tasks}
{actions}
{progress}
<div class="row between">
<button class="btn danger" type="button" data-action="deleteItem" data-id="{id}" data-testid="edit-delete-{id}">Delete</button>
<button class="btn ghost" type="button" data-action="closeEdit" data-testid="edit-done-{id}">Done</button>
</div>
</div>
</dialog>"#,
        label = item.item_type().label(),
        secondary = edit_field(
            &id,
            "Secondary summary (optional)",
            "secondarySummary",
            item.secondary_summary.as_deref().unwrap_or_default()
        ),
        red = selected(item.urgency == Urgency::Red),
        amber = selected(item.urgency == Urgency::Amber),
        green = selected(item.urgency == Urgency::Green),
        review = escape(&review),
        tasks = checklist_block(&id, ChecklistKind::Tasks, &item.tasks),
        actions = checklist_block(&id, ChecklistKind::Actions, &item.actions),
        progress = progress_block(&id, &item.progress, ctx),
    )
}

// `id` arrives escaped.
fn edit_field(id: &str, label: &str, field: &str, value: &str) -> String {
    format!(
        r#"<label>{label} <input value="{value}" data-action="editField" data-id="{id}" data-field="{field}" data-testid="edit-{field}-{id}"/></label>"#,
        value = escape(value),
    )
}

fn checklist_block(id: &str, kind: ChecklistKind, entries: &[ChecklistEntry]) -> String {
    let (title, noun, empty) = match kind {
        ChecklistKind::Tasks => ("Tasks", "task", "No tasks yet."),
        ChecklistKind::Actions => ("Actions", "action", "No actions yet."),
    };
    let kind = kind.as_str();

    let rows = if entries.is_empty() {
        format!(r#"<div class="help">{empty}</div>"#)
    } else {
        entries
            .iter()
            .map(|entry| {
                let xid = escape(&entry.id);
                format!(
                    r#"<div class="miniItem">
<input type="checkbox" data-action="toggleCheck" data-kind="{kind}" data-id="{id}" data-xid="{xid}" data-testid="edit-check-{id}-{kind}-{xid}"{done}/>
<input value="{text}" data-action="editCheckText" data-kind="{kind}" data-id="{id}" data-xid="{xid}"/>
<button class="btn small ghost" type="button" data-action="rmCheck" data-kind="{kind}" data-id="{id}" data-xid="{xid}">Remove</button>
</div>"#,
                    done = checked(entry.done),
                    text = escape(&entry.text),
                )
            })
            .collect()
    };

    format!(
        r#"<div class="notice">
<strong>{title}</strong>
<div class="row">
<input placeholder="Add {noun}…" data-action="newTaskInput" data-id="{id}" data-kind="{kind}" data-testid="new-{noun}-{id}"/>
<button class="btn small primary" type="button" data-action="addCheck" data-id="{id}" data-kind="{kind}" data-testid="add-{noun}-{id}">Add</button>
</div>
<div class="miniList">{rows}</div>
</div>"#
    )
}

fn progress_block(id: &str, progress: &[ProgressNote], ctx: &ViewContext) -> String {
    let rows = if progress.is_empty() {
        r#"<div class="help">No progress yet.</div>"#.to_string()
    } else {
        progress
            .iter()
            .map(|note| {
                let pid = escape(&note.id);
                format!(
                    r#"<div class="miniItem">
<div class="miniTime">{time}</div>
<input value="{text}" data-action="editProgressText" data-id="{id}" data-pid="{pid}"/>
<button class="btn small ghost" type="button" data-action="rmProgress" data-id="{id}" data-pid="{pid}">Remove</button>
</div>"#,
                    time = escape(&fmt_time(note.t, ctx.tz)),
                    text = escape(&note.text),
                )
            })
            .collect()
    };

    format!(
        r#"<div class="notice">
<strong>Progress</strong>
<div class="row">
<input placeholder="Add progress note…" data-action="newProgressInput" data-id="{id}" data-testid="new-progress-{id}"/>
<button class="btn small primary" type="button" data-action="addProgress" data-id="{id}" data-testid="add-progress-{id}">Add</button>
</div>
<div class="miniList">{rows}</div>
</div>"#
    )
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::checklist::{add_entry, add_progress_note};
    use crate::item::{BleepDetails, JobDetails};

    #[test]
    fn job_sheet_carries_every_editable_hook() {
        let now = Utc.with_ymd_and_hms(2030, 6, 1, 14, 15, 0).single().expect("valid");
        let mut item = Item::new(
            ItemKind::Job(JobDetails {
                ward: Some("AMU".to_string()),
                bed: None,
                summary: "Cellulitis".to_string(),
            }),
            now,
        );
        item.review_by = Some(now);
        item.actions = add_entry(&[], "Mark margins", now);
        item.progress = add_progress_note(&[], "Improving", now);

        let ctx = ViewContext::new(now, chrono_tz::Europe::London);
        let html = render_edit_sheet(&item, &ctx);

        assert!(html.contains(r#"data-field="ward""#));
        assert!(html.contains(r#"data-field="bed""#));
        assert!(!html.contains("toggleCalledBack"));
        assert!(html.contains(r#"value="2030-06-01T15:15""#));
        assert!(html.contains(r#"data-kind="actions""#));
        assert!(html.contains("No tasks yet."));
        assert!(html.contains(r#"data-action="rmProgress""#));
        assert!(html.contains(r#"data-action="deleteItem""#));
    }

    #[test]
    fn bleep_sheet_has_called_back_checkbox() {
        let now = Utc.timestamp_millis_opt(0).single().expect("valid");
        let item = Item::new(
            ItemKind::Bleep(BleepDetails {
                from: "Bleep 1234".to_string(),
                called_back: true,
                ..BleepDetails::default()
            }),
            now,
        );
        let html = render_edit_sheet(&item, &ViewContext::new(now, chrono_tz::UTC));
        assert!(html.contains(r#"<input type="checkbox" checked data-action="toggleCalledBack""#));
        assert!(html.contains(r#"value="Bleep 1234""#));
    }
}
