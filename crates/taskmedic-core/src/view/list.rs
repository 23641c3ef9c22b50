use std::collections::BTreeSet;

use super::ViewContext;
use super::card::{headline, render_card, urgency_tone};
use super::markup::{escape, pill, selected};
use crate::item::{Document, KindFilter, SortMode, StatusFilter};
use crate::query::{top_triage, visible_sorted};

const HIGHLIGHT_COUNT: usize = 3;

pub struct ListState<'a> {
    pub expanded: &'a BTreeSet<String>,
    pub filters_open: bool,
    pub notice: Option<&'a str>,
}

/// The storage notice shown under the list header.
pub fn notice_banner(text: &str) -> String {
    format!(
        r#"<div class="tm-notice" role="status" data-testid="storage-notice">{}</div>"#,
        escape(text)
    )
}

pub fn render_list(doc: &Document, state: &ListState<'_>, ctx: &ViewContext) -> String {
    let prefs = &doc.preferences;
    let visible = visible_sorted(&doc.items, prefs);

    let cards = if visible.is_empty() {
        r#"<li class="tm-empty-card" data-testid="empty-list">No items match your filters.</li>"#
            .to_string()
    } else {
        visible
            .iter()
            .map(|item| render_card(item, state.expanded.contains(&item.id), ctx))
            .collect()
    };

    let filters = if state.filters_open {
        render_filter_panel(doc)
    } else {
        String::new()
    };

    let notice = state.notice.map(notice_banner).unwrap_or_default();

    let highlight = if ctx.highlight {
        render_highlight(doc)
    } else {
        String::new()
    };

    format!(
        r#"<div class="tm-shell" data-testid="list-view">
<header class="tm-header">
<div class="tm-brand-block"><h1 class="tm-brand">TaskMedic</h1></div>
<div class="tm-header-actions">
<button class="tm-header-chip" data-action="nav" data-route="tools" data-testid="nav-tools">Tools</button>
<button class="tm-add-btn" data-action="openAdd" aria-label="Add" data-testid="open-add">+</button>
</div>
</header>
{notice}
<div class="tm-search-wrap">
<div class="tm-search-shell">
<input class="tm-search" id="search" data-action="setSearch" data-testid="search-input" type="search" placeholder="Search tasks..." value="{search}"/>
<button class="tm-filter-btn" type="button" aria-label="Filter" data-action="toggleFilters" data-testid="toggle-filters">Filter</button>
</div>
</div>
{filters}
{highlight}
<section class="tm-list-section">
<ul class="tm-card-list" id="list" data-testid="card-list">{cards}</ul>
</section>
</div>"#,
        search = escape(&prefs.search),
    )
}

fn render_filter_panel(doc: &Document) -> String {
    let prefs = &doc.preferences;
    format!(
        r#"<div class="tm-filter-panel" data-testid="filter-panel">
<select class="tm-select" id="kind" data-action="setKind" data-testid="filter-kind">
<option value="all"{k_all}>All</option>
<option value="job"{k_job}>Jobs</option>
<option value="bleep"{k_bleep}>Bleeps</option>
</select>
<select class="tm-select" id="filter" data-action="setFilter" data-testid="filter-status">
<option value="open"{s_open}>Open</option>
<option value="done"{s_done}>Done</option>
<option value="all"{s_all}>All</option>
</select>
<select class="tm-select" id="sort" data-action="setSort" data-testid="filter-sort">
<option value="triage"{o_triage}>Triage</option>
<option value="newest"{o_newest}>Newest</option>
</select>
<button class="tm-end-shift" type="button" data-action="wipeShift" data-testid="wipe-shift">End shift</button>
</div>"#,
        k_all = selected(prefs.kind == KindFilter::All),
        k_job = selected(prefs.kind == KindFilter::Job),
        k_bleep = selected(prefs.kind == KindFilter::Bleep),
        s_open = selected(prefs.filter == StatusFilter::Open),
        s_done = selected(prefs.filter == StatusFilter::Done),
        s_all = selected(prefs.filter == StatusFilter::All),
        o_triage = selected(prefs.sort == SortMode::Triage),
        o_newest = selected(prefs.sort == SortMode::Newest),
    )
}

fn render_highlight(doc: &Document) -> String {
    let top = top_triage(&doc.items, HIGHLIGHT_COUNT);
    if top.is_empty() {
        return String::new();
    }

    let rows: String = top
        .iter()
        .map(|item| {
            let id = escape(&item.id);
            format!(
                r#"<li><button type="button" class="tm-next-row" data-action="openEdit" data-id="{id}" data-testid="next-up-{id}">{urgency}<span class="tm-next-text">{headline}</span></button></li>"#,
                urgency = pill(
                    &item.urgency.as_str().to_uppercase(),
                    urgency_tone(item.urgency),
                    None
                ),
                headline = escape(&headline(item)),
            )
        })
        .collect();

    format!(
        r#"<section class="tm-next-up" data-testid="next-up">
<h2 class="tm-next-title">Next up</h2>
<ul class="tm-next-list">{rows}</ul>
</section>"#
    )
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, TimeZone, Utc};

    use super::*;
    use crate::item::{Item, ItemKind, JobDetails, Urgency};

    fn now() -> DateTime<Utc> {
        Utc.timestamp_millis_opt(1_900_000_000_000).single().expect("valid")
    }

    fn doc_with(summaries: &[(&str, Urgency)]) -> Document {
        let mut doc = Document::default();
        for (idx, (summary, urgency)) in summaries.iter().enumerate() {
            let mut item = Item::new(
                ItemKind::Job(JobDetails {
                    ward: Some(format!("W{idx}")),
                    summary: summary.to_string(),
                    ..JobDetails::default()
                }),
                now(),
            );
            item.urgency = *urgency;
            doc.items.push(item);
        }
        doc
    }

    fn state(expanded: &BTreeSet<String>) -> ListState<'_> {
        ListState {
            expanded,
            filters_open: false,
            notice: None,
        }
    }

    #[test]
    fn empty_list_renders_the_empty_row() {
        let expanded = BTreeSet::new();
        let html = render_list(&Document::default(), &state(&expanded), &ViewContext::new(now(), chrono_tz::UTC));
        assert!(html.contains("No items match your filters."));
        assert!(!html.contains("filter-panel"));
    }

    #[test]
    fn cards_follow_triage_order() {
        let doc = doc_with(&[("green one", Urgency::Green), ("red one", Urgency::Red)]);
        let expanded = BTreeSet::new();
        let html = render_list(&doc, &state(&expanded), &ViewContext::new(now(), chrono_tz::UTC));

        let red = html.find("red one").expect("red card");
        let green = html.find("green one").expect("green card");
        assert!(red < green);
    }

    #[test]
    fn filter_panel_marks_current_preferences() {
        let mut doc = Document::default();
        doc.preferences.sort = SortMode::Newest;
        doc.preferences.search = "\"quoted\"".to_string();
        let expanded = BTreeSet::new();
        let list_state = ListState {
            filters_open: true,
            notice: Some("Storage unavailable"),
            ..state(&expanded)
        };

        let html = render_list(&doc, &list_state, &ViewContext::new(now(), chrono_tz::UTC));
        assert!(html.contains(r#"<option value="newest" selected>"#));
        assert!(html.contains(r#"<option value="open" selected>"#));
        assert!(html.contains(r#"value="&quot;quoted&quot;""#));
        assert!(html.contains("Storage unavailable"));
    }

    #[test]
    fn highlight_section_shows_top_open_items_when_enabled() {
        let mut doc = doc_with(&[
            ("a", Urgency::Green),
            ("b", Urgency::Red),
            ("c", Urgency::Amber),
            ("d", Urgency::Green),
        ]);
        doc.items[1].done = true;
        let expanded = BTreeSet::new();

        let off = render_list(&doc, &state(&expanded), &ViewContext::new(now(), chrono_tz::UTC));
        assert!(!off.contains("Next up"));

        let ctx = ViewContext {
            highlight: true,
            ..ViewContext::new(now(), chrono_tz::UTC)
        };
        let on = render_list(&doc, &state(&expanded), &ctx);
        assert!(on.contains("Next up"));
        assert!(!on.contains(&format!("next-up-{}", doc.items[1].id)));
        assert!(on.contains(&format!("next-up-{}", doc.items[2].id)));
    }
}
