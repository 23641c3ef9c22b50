use super::ViewContext;
use super::markup::escape;
use crate::datetime::{fmt_hm, format_elapsed};
use crate::scribe::{QUICK_EVENTS, Scribe};

pub fn render_tools(scribe: &Scribe, ctx: &ViewContext) -> String {
    let (start_class, start_label) = if scribe.is_running() {
        ("", "Running")
    } else {
        (" primary", "Start")
    };

    let quick: String = QUICK_EVENTS
        .iter()
        .map(|event| {
            let event = escape(event);
            format!(
                r#"<button class="btn small" data-action="scribeQuick" data-text="{event}">{event}</button>"#
            )
        })
        .collect();

    let log = if scribe.log().is_empty() {
        r#"<div class="help">No entries yet.</div>"#.to_string()
    } else {
        scribe
            .log()
            .iter()
            .map(|entry| {
                format!(
                    r#"<div class="miniItem"><div class="miniTime">{}</div><div class="miniText">{}</div></div>"#,
                    fmt_hm(entry.t, ctx.tz),
                    escape(&entry.text)
                )
            })
            .collect()
    };

    format!(
        r#"<div class="wrap" data-testid="tools-view">
<header class="topbar">
<div class="brand"><h1>TaskMedic</h1><div class="tag">Tools</div></div>
<button class="tm-header-chip" data-action="nav" data-route="list" data-testid="nav-list">List</button>
</header>
<section class="section">
<h2>Cardiac arrest scribe</h2>
<div class="card item">
<div class="row between">
<div class="stack"><div class="meta">Elapsed</div><div class="tm-elapsed" data-testid="scribe-elapsed">{elapsed}</div></div>
<div class="row">
<button class="btn small{start_class}" data-action="scribeStart" data-testid="scribe-start">{start_label}</button>
<button class="btn small" data-action="scribePause" data-testid="scribe-pause">Pause</button>
<button class="btn small ghost" data-action="scribeReset" data-testid="scribe-reset">Reset</button>
</div>
</div>
<div class="help">Quick events</div>
<div class="row wrap">{quick}</div>
<div class="help">Custom note</div>
<div class="row">
<input id="scribeText" data-testid="scribe-text" placeholder="e.g. VF → shock, CPR resumed"/>
<button class="btn small primary" data-action="scribeAdd" data-testid="scribe-add">Add</button>
</div>
<div class="notice">
<strong>Log</strong>
<div class="help">Copy creates a newline-separated log.</div>
<div class="miniList" data-testid="scribe-log">{log}</div>
<div class="row end">
<button class="btn small ghost" data-action="scribeClear" data-testid="scribe-clear">Clear</button>
<button class="btn small primary" data-action="scribeCopy" data-testid="scribe-copy">Copy</button>
</div>
</div>
</div>
</section>
</div>"#,
        elapsed = format_elapsed(scribe.elapsed()),
    )
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    #[test]
    fn tools_view_shows_elapsed_quick_events_and_log() {
        let start = Utc.with_ymd_and_hms(2030, 1, 1, 3, 0, 0).single().expect("valid");
        let mut scribe = Scribe::default();
        scribe.start(start);
        scribe.tick(start + chrono::Duration::seconds(75));
        scribe.record("Rhythm check", start + chrono::Duration::seconds(75));

        let html = render_tools(&scribe, &ViewContext::new(start, chrono_tz::UTC));
        assert!(html.contains(">01:15<"));
        assert!(html.contains(">Running<"));
        assert!(html.contains(r#"data-text="Amiodarone 300mg""#));
        assert!(html.contains("01:15 Rhythm check"));
        assert!(!html.contains("No entries yet."));
    }
}
