use anyhow::anyhow;
use chrono_tz::Tz;
use taskmedic_core::action::ActionAttrs;
use taskmedic_core::app::{
  DialogChange,
  DomPatch,
  UiState
};
use taskmedic_core::datetime::parse_timezone;
use taskmedic_core::view::list::notice_banner;
use tracing::{
  debug,
  warn
};
use wasm_bindgen::{
  JsCast,
  JsValue
};
use web_sys::{
  Element,
  HtmlDialogElement,
  HtmlElement,
  HtmlInputElement,
  HtmlSelectElement,
  HtmlTextAreaElement,
  MediaQueryList
};

use crate::storage::js_error;

pub const ADD_SHEET_ID: &str =
  "addSheet";
pub const EDIT_SHEET_ID: &str =
  "editSheet";
const REDUCED_MOTION_QUERY: &str =
  "(prefers-reduced-motion: reduce)";

pub fn window()
-> anyhow::Result<web_sys::Window> {
  web_sys::window().ok_or_else(|| {
    anyhow!("no window available")
  })
}

pub fn document()
-> anyhow::Result<web_sys::Document> {
  window()?.document().ok_or_else(
    || anyhow!("no document available")
  )
}

pub fn mount() -> anyhow::Result<Element>
{
  document()?
    .get_element_by_id("app")
    .ok_or_else(|| {
      anyhow!("missing #app mount element")
    })
}

/// `[name="value"]` with the value
/// quoted for a CSS attribute selector.
pub fn attr_selector(
  name: &str,
  value: &str
) -> String {
  let escaped = value
    .replace('\\', "\\\\")
    .replace('"', "\\\"");
  format!("[{name}=\"{escaped}\"]")
}

pub fn query(
  root: &Element,
  selector: &str
) -> Option<Element> {
  root
    .query_selector(selector)
    .ok()
    .flatten()
}

pub fn closest(
  el: &Element,
  selector: &str
) -> Option<Element> {
  el.closest(selector).ok().flatten()
}

/// Current value of a form control, and
/// its checked state for checkboxes.
pub fn control_value(
  el: &Element
) -> (Option<String>, Option<bool>) {
  if let Some(input) =
    el.dyn_ref::<HtmlInputElement>()
  {
    let checked = (input.type_()
      == "checkbox")
      .then(|| input.checked());
    return (Some(input.value()), checked);
  }
  if let Some(select) =
    el.dyn_ref::<HtmlSelectElement>()
  {
    return (Some(select.value()), None);
  }
  if let Some(area) =
    el.dyn_ref::<HtmlTextAreaElement>()
  {
    return (Some(area.value()), None);
  }
  (None, None)
}

/// Reads the `data-*` contract of an
/// action element. `target` is the node
/// the event actually hit.
pub fn action_attrs(
  el: &Element,
  target: &Element
) -> Option<ActionAttrs> {
  let action =
    el.get_attribute("data-action")?;
  let mut attrs =
    ActionAttrs::new(&action);
  attrs.id = el.get_attribute("data-id");
  attrs.kind =
    el.get_attribute("data-kind");
  attrs.xid = el.get_attribute("data-xid");
  attrs.pid = el.get_attribute("data-pid");
  attrs.idx = el.get_attribute("data-idx");
  attrs.route =
    el.get_attribute("data-route");
  attrs.text =
    el.get_attribute("data-text");
  attrs.field =
    el.get_attribute("data-field");

  let (value, checked) =
    control_value(el);
  attrs.value = value;
  attrs.checked = checked;

  if action == "cardTap" {
    attrs.in_header = closest(
      target,
      ".tm-card-header"
    )
    .is_some();
    attrs.in_expanded_panel = closest(
      target,
      ".tm-card-expanded"
    )
    .is_some();
  }

  if attrs.value.is_none() {
    attrs.value =
      paired_input(el, &action)
        .and_then(|input| {
          control_value(&input).0
        });
  }

  Some(attrs)
}

/// The text input an "Add" button reads
/// from.
fn paired_input(
  el: &Element,
  action: &str
) -> Option<Element> {
  let doc = document().ok()?;
  let id = el
    .get_attribute("data-id")
    .unwrap_or_default();
  let selector = match action {
    | "addCheck" => format!(
      "[data-action=\"newTaskInput\"]{}{}",
      attr_selector("data-id", &id),
      attr_selector(
        "data-kind",
        &el
          .get_attribute("data-kind")
          .unwrap_or_default()
      )
    ),
    | "addProgress" => format!(
      "[data-action=\"newProgressInput\"]{}",
      attr_selector("data-id", &id)
    ),
    | "scribeAdd" => {
      "#scribeText".to_string()
    }
    | _ => return None
  };
  doc
    .query_selector(&selector)
    .ok()
    .flatten()
}

pub fn apply_patches(
  mount: &Element,
  patches: &[DomPatch]
) {
  for patch in patches {
    match patch {
      | DomPatch::Checklist {
        item_id,
        kind,
        entry_id,
        done,
        stamp
      } => {
        let scope = format!(
          "{}{}{}",
          attr_selector("data-id", item_id),
          attr_selector(
            "data-kind",
            kind.as_str()
          ),
          attr_selector(
            "data-xid", entry_id
          )
        );
        patch_check_row(
          mount, &scope, *done, stamp
        );
      }
      | DomPatch::PillRow {
        item_id,
        markup
      } => {
        let selector = attr_selector(
          "data-testid",
          &format!("pill-row-{item_id}")
        );
        if let Some(row) =
          query(mount, &selector)
        {
          row.set_inner_html(markup);
        }
      }
      | DomPatch::Notice(notice) => {
        patch_notice(
          mount,
          notice.as_deref()
        );
      }
    }
  }
}

fn patch_check_row(
  mount: &Element,
  scope: &str,
  done: bool,
  stamp: &str
) {
  let flag = if done {
    "true"
  } else {
    "false"
  };

  let row_selector = format!(
    "[data-action=\"toggleInlineCheck\"]{scope}"
  );
  if let Some(row) =
    query(mount, &row_selector)
  {
    let _ = row
      .class_list()
      .toggle_with_force(
        "is-complete",
        done
      );
    let _ =
      row.set_attribute("data-done", flag);
    let _ = row
      .set_attribute("aria-checked", flag);
    if let Some(time) =
      query(&row, ".tm-check-time")
    {
      time.set_text_content(Some(stamp));
    }
  }

  let box_selector = format!(
    "[data-action=\"toggleCheck\"]{scope}"
  );
  if let Some(input) =
    query(mount, &box_selector)
      .and_then(|el| {
        el.dyn_into::<HtmlInputElement>()
          .ok()
      })
  {
    input.set_checked(done);
  }
}

fn patch_notice(
  mount: &Element,
  notice: Option<&str>
) {
  let existing = query(
    mount,
    "[data-testid=\"storage-notice\"]"
  );
  match (existing, notice) {
    | (Some(el), Some(text)) => {
      el.set_text_content(Some(text));
    }
    | (Some(el), None) => el.remove(),
    | (None, Some(text)) => {
      if let Some(header) =
        query(mount, ".tm-header")
      {
        let _ = header
          .insert_adjacent_html(
            "afterend",
            &notice_banner(text)
          );
      }
    }
    | (None, None) => {}
  }
}

pub fn translate_card(
  mount: &Element,
  card: &str,
  offset: f64,
  animate: bool
) {
  let selector =
    attr_selector("data-card-id", card);
  let Some(surface) =
    query(mount, &selector).and_then(
      |el| el.dyn_into::<HtmlElement>().ok()
    )
  else {
    return;
  };
  let style = surface.style();
  let transition = if animate {
    "transform 180ms ease-out"
  } else {
    "none"
  };
  let _ = style
    .set_property("transition", transition);
  let _ = style.set_property(
    "transform",
    &format!("translate3d({offset}px, 0, 0)")
  );
}

fn dialog(
  id: &str
) -> Option<HtmlDialogElement> {
  document()
    .ok()?
    .get_element_by_id(id)?
    .dyn_into::<HtmlDialogElement>()
    .ok()
}

pub fn show_dialog(id: &str) {
  let Some(dialog) = dialog(id) else {
    return;
  };
  if dialog.open() {
    return;
  }
  if let Err(err) = dialog.show_modal() {
    warn!(dialog = id, error = ?err, "failed to open dialog");
  }
}

pub fn close_dialog(id: &str) {
  if let Some(dialog) = dialog(id)
    && dialog.open()
  {
    dialog.close();
  }
}

pub fn apply_dialog(change: DialogChange) {
  match change {
    | DialogChange::ShowAdd => {
      show_dialog(ADD_SHEET_ID)
    }
    | DialogChange::CloseAdd => {
      close_dialog(ADD_SHEET_ID)
    }
  }
}

/// Re-opens whichever sheets the state
/// says are open after a full render.
pub fn sync_dialogs(ui: &UiState) {
  if ui.add_open {
    show_dialog(ADD_SHEET_ID);
  }
  if ui.edit_id.is_some() {
    show_dialog(EDIT_SHEET_ID);
  }
}

pub fn scroll_y() -> f64 {
  window()
    .ok()
    .and_then(|w| w.scroll_y().ok())
    .unwrap_or(0.0)
}

pub fn restore_scroll(y: f64) {
  if let Ok(w) = window() {
    w.scroll_to_with_x_and_y(0.0, y);
  }
}

pub fn focus_search() {
  let Some(input) = document()
    .ok()
    .and_then(|doc| {
      doc.get_element_by_id("search")
    })
    .and_then(|el| {
      el.dyn_into::<HtmlInputElement>()
        .ok()
    })
  else {
    return;
  };
  let _ = input.focus();
  let end = input.value().chars().count()
    as u32;
  let _ =
    input.set_selection_range(end, end);
}

/// Writes to the clipboard in the
/// background. Failures are logged and
/// otherwise ignored.
pub fn copy_text(text: String) {
  let Ok(window) = window() else {
    return;
  };
  let promise = window
    .navigator()
    .clipboard()
    .write_text(&text);
  wasm_bindgen_futures::spawn_local(
    async move {
      match wasm_bindgen_futures::JsFuture::from(promise).await {
        | Ok(_) => {
          debug!(
            bytes = text.len(),
            "copied scribe log"
          );
        }
        | Err(err) => {
          debug!(error = ?err, "clipboard write failed");
        }
      }
    }
  );
}

pub fn reduced_motion_query()
-> Option<MediaQueryList> {
  window()
    .ok()?
    .match_media(REDUCED_MOTION_QUERY)
    .ok()
    .flatten()
}

/// Mirrors the preference onto
/// `<html data-reduced-motion>`.
pub fn mirror_reduced_motion(
  reduced: bool
) -> anyhow::Result<()> {
  let root = document()?
    .document_element()
    .ok_or_else(|| {
      anyhow!("document has no root")
    })?;
  root
    .set_attribute(
      "data-reduced-motion",
      if reduced { "true" } else { "false" }
    )
    .map_err(js_error)
}

/// The browser's IANA zone, falling back
/// to UTC when it cannot be read.
pub fn local_timezone() -> Tz {
  let options =
    js_sys::Intl::DateTimeFormat::default()
      .resolved_options();
  let zone = js_sys::Reflect::get(
    &options,
    &JsValue::from_str("timeZone")
  )
  .ok()
  .and_then(|value| value.as_string());

  match zone
    .as_deref()
    .and_then(parse_timezone)
  {
    | Some(tz) => tz,
    | None => {
      warn!(zone = ?zone, "unknown browser timezone; using UTC");
      chrono_tz::UTC
    }
  }
}
