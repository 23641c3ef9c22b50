//! Pure markup rendering. Every function maps state to an HTML string;
//! nothing here touches storage or the page.

pub mod add_sheet;
pub mod card;
pub mod edit_sheet;
pub mod list;
pub mod markup;
pub mod tools;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;

use crate::action::Route;
use crate::app::UiState;
use crate::item::Document;
use crate::scribe::Scribe;

/// Inputs every view shares besides the state it renders.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewContext {
    pub now: DateTime<Utc>,
    pub tz: Tz,
    pub highlight: bool,
}

impl ViewContext {
    pub fn new(now: DateTime<Utc>, tz: Tz) -> Self {
        Self {
            now,
            tz,
            highlight: false,
        }
    }
}

/// Contents of the `#app` mount: the active route plus both sheets.
#[tracing::instrument(level = "trace", skip_all, fields(route = ui.route.as_str()))]
pub fn render_app(doc: &Document, ui: &UiState, scribe: &Scribe, ctx: &ViewContext) -> String {
    let body = match ui.route {
        Route::List => list::render_list(
            doc,
            &list::ListState {
                expanded: &ui.expanded,
                filters_open: ui.filters_open,
                notice: ui.notice.as_deref(),
            },
            ctx,
        ),
        Route::Tools => tools::render_tools(scribe, ctx),
    };

    let add = add_sheet::render_add_sheet(&ui.draft);
    let edit = ui
        .edit_id
        .as_deref()
        .and_then(|id| doc.item(id))
        .map(|item| edit_sheet::render_edit_sheet(item, ctx))
        .unwrap_or_default();

    format!("{body}{add}{edit}")
}

/// A standalone HTML document wrapping [`render_app`], for export.
pub fn render_page(doc: &Document, ui: &UiState, scribe: &Scribe, ctx: &ViewContext) -> String {
    format!(
        "<!doctype html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\"/>\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\"/>\n\
         <title>TaskMedic</title>\n</head>\n<body>\n<div id=\"app\">{}</div>\n</body>\n</html>\n",
        render_app(doc, ui, scribe, ctx)
    )
}
