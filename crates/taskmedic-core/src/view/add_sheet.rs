use super::markup::{bool_attr, escape, selected};
use crate::draft::DraftAdd;
use crate::item::{ItemType, Urgency};

pub fn render_add_sheet(draft: &DraftAdd) -> String {
    let form = match draft.tab {
        ItemType::Job => job_form(draft),
        ItemType::Bleep => bleep_form(draft),
    };
    let job_primary = if draft.tab == ItemType::Job { " primary" } else { "" };
    let bleep_primary = if draft.tab == ItemType::Bleep { " primary" } else { "" };

    format!(
        r#"<dialog id="addSheet" data-testid="add-sheet">
<div class="sheetHead">
<h3>Add</h3>
<div class="row"><button class="btn small ghost" data-action="closeAdd" type="button" data-testid="close-add">Close</button></div>
</div>
<div class="sheetBody">
<div class="row tabs">
<button class="btn small{job_primary}" type="button" data-action="tabJob" data-testid="tab-job">Job</button>
<button class="btn small{bleep_primary}" type="button" data-action="tabBleep" data-testid="tab-bleep">Bleep</button>
</div>
{form}
</div>
</dialog>"#
    )
}

fn field(label: &str, name: &str, value: &str, placeholder: &str) -> String {
    format!(
        r#"<label>{label}
<input name="{name}" data-action="draftField" data-field="{name}" data-testid="draft-{name}" value="{value}" placeholder="{placeholder}"/>
</label>"#,
        value = escape(value),
    )
}

fn urgency_and_review(draft: &DraftAdd) -> String {
    format!(
        r#"<div class="grid2">
<label>Urgency
<select name="urgency" data-action="draftField" data-field="urgency" data-testid="draft-urgency">
<option value="red"{red}>Red (Immediate)</option>
<option value="amber"{amber}>Amber (Soon)</option>
<option value="green"{green}>Green (Routine)</option>
</select>
</label>
<label>Review by (optional)
<input name="reviewBy" type="datetime-local" data-action="draftField" data-field="reviewBy" data-testid="draft-reviewBy" value="{review}"/>
</label>
</div>"#,
        red = selected(draft.urgency == Urgency::Red),
        amber = selected(draft.urgency == Urgency::Amber),
        green = selected(draft.urgency == Urgency::Green),
        review = escape(&draft.review_by),
    )
}

fn draft_tasks(draft: &DraftAdd) -> String {
    let list = if draft.draft_tasks.is_empty() {
        r#"<div class="help">No tasks added yet.</div>"#.to_string()
    } else {
        let rows: String = draft
            .draft_tasks
            .iter()
            .enumerate()
            .map(|(idx, text)| {
                format!(
                    r#"<div class="miniItem">
<div class="miniText">{}</div>
<button class="btn small ghost" type="button" data-action="rmDraftTask" data-idx="{idx}" data-testid="draft-task-remove-{idx}">Remove</button>
</div>"#,
                    escape(text)
                )
            })
            .collect();
        format!(r#"<div class="miniList">{rows}</div>"#)
    };

    format!(
        r#"<div class="notice">
<strong>Tasks</strong>
<div class="help">Add as many as you want. Press Enter to add.</div>
<div class="row">
<input name="draftTaskText" data-action="draftField" data-field="draftTaskText" data-testid="draft-task-input" value="{text}" placeholder="Add a task…"/>
<button class="btn small primary" type="button" data-action="addDraftTask" data-testid="draft-task-add">Add</button>
</div>
{list}
</div>"#,
        text = escape(&draft.draft_task_text),
    )
}

fn job_form(draft: &DraftAdd) -> String {
    format!(
        r#"<form id="addJobForm" data-action="submitAdd">
<div class="grid2">
{ward}
{bed}
</div>
{summary}
{secondary}
{urgency}
{tasks}
<div class="row end"><button class="btn primary" type="submit" data-testid="submit-add">Add job</button></div>
</form>"#,
        ward = field("Ward", "ward", &draft.ward, "e.g. AMU"),
        bed = field("Bed (optional)", "bed", &draft.bed, "e.g. 12"),
        summary = field("Summary (anonymised)", "summary", &draft.summary, "e.g. ?Sepsis – improving"),
        secondary = field(
            "Secondary summary (optional)",
            "secondarySummary",
            &draft.secondary_summary,
            "e.g. Background / PMH / context"
        ),
        urgency = urgency_and_review(draft),
        tasks = draft_tasks(draft),
    )
}

fn bleep_form(draft: &DraftAdd) -> String {
    let called_back = if draft.called_back { " primary" } else { "" };
    format!(
        r#"<form id="addBleepForm" data-action="submitAdd">
{from}
{location}
{summary}
{urgency}
<div class="row">
<button class="btn small{called_back}" type="button" data-action="toggleDraftCalledBack" aria-pressed="{pressed}" data-testid="draft-called-back">Called back?</button>
</div>
{tasks}
<div class="row end"><button class="btn primary" type="submit" data-testid="submit-add">Add bleep</button></div>
</form>"#,
        from = field("From (ext/bleep)", "from", &draft.from, "e.g. x5678 / Bleep 1234"),
        location = field("Location (optional)", "location", &draft.location, "e.g. Ward 5"),
        summary = field(
            "Task summary (optional, add after calling back)",
            "bleepSummary",
            &draft.bleep_summary,
            "Job / task"
        ),
        urgency = urgency_and_review(draft),
        pressed = bool_attr(draft.called_back),
        tasks = draft_tasks(draft),
    )
}
