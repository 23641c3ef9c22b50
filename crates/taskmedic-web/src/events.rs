//! Delegated listeners on the `#app`
//! mount. Markup is replaced wholesale on
//! every render, so nothing binds to the
//! rendered nodes themselves except the
//! card gestures.

use std::rc::Rc;

use gloo::events::{
  EventListener,
  EventListenerOptions,
  EventListenerPhase
};
use taskmedic_core::action::Action;
use tracing::{
  debug,
  trace
};
use wasm_bindgen::JsCast;
use web_sys::{
  Element,
  Event,
  KeyboardEvent
};

use crate::dom;
use crate::runtime::{
  self,
  Shared
};

/// Actions delivered on `input`, i.e. on
/// every keystroke.
const INPUT_ACTIONS: [&str; 5] = [
  "editField",
  "editCheckText",
  "editProgressText",
  "setSearch",
  "draftField"
];

/// Actions delivered on `change`.
const CHANGE_ACTIONS: [&str; 7] = [
  "editUrgency",
  "editReviewBy",
  "toggleCheck",
  "toggleCalledBack",
  "setKind",
  "setFilter",
  "setSort"
];

pub fn install(
  shared: &Shared,
  mount: &Element
) -> anyhow::Result<Vec<EventListener>>
{
  let mut listeners = vec![
    on(shared, mount, "click", on_click),
    on(shared, mount, "input", on_input),
    on(shared, mount, "change", on_change),
  ];

  let cancellable =
    EventListenerOptions::enable_prevent_default();
  listeners.push(on_with(
    shared,
    mount,
    "keydown",
    cancellable,
    on_keydown
  ));
  listeners.push(on_with(
    shared,
    mount,
    "submit",
    cancellable,
    on_submit
  ));
  // `cancel` does not bubble.
  listeners.push(on_with(
    shared,
    mount,
    "cancel",
    EventListenerOptions {
      phase:   EventListenerPhase::Capture,
      passive: false
    },
    on_dialog_cancel
  ));

  let window = dom::window()?;
  let weak = Rc::downgrade(shared);
  listeners.push(EventListener::new(
    &window,
    "scroll",
    move |_| {
      if let Some(shared) = weak.upgrade() {
        runtime::dispatch(
          &shared,
          Action::Scrolled {
            y: dom::scroll_y()
          }
        );
      }
    }
  ));

  if let Some(query) =
    dom::reduced_motion_query()
  {
    let weak = Rc::downgrade(shared);
    let source = query.clone();
    listeners.push(EventListener::new(
      &query,
      "change",
      move |_| {
        let reduced = source.matches();
        if let Some(shared) = weak.upgrade()
          && let Ok(mut rt) =
            shared.try_borrow_mut()
        {
          rt.app.set_reduced_motion(reduced);
        }
        if let Err(err) =
          dom::mirror_reduced_motion(reduced)
        {
          debug!(error = %err, "could not mirror reduced motion");
        }
        debug!(reduced, "reduced motion preference changed");
      }
    ));
  }

  Ok(listeners)
}

fn on(
  shared: &Shared,
  mount: &Element,
  name: &'static str,
  handler: fn(&Shared, &Event)
) -> EventListener {
  on_with(
    shared,
    mount,
    name,
    EventListenerOptions::default(),
    handler
  )
}

fn on_with(
  shared: &Shared,
  mount: &Element,
  name: &'static str,
  options: EventListenerOptions,
  handler: fn(&Shared, &Event)
) -> EventListener {
  let weak = Rc::downgrade(shared);
  EventListener::new_with_options(
    mount,
    name,
    options,
    move |event| {
      if let Some(shared) = weak.upgrade() {
        handler(&shared, event);
      }
    }
  )
}

fn target_element(
  event: &Event
) -> Option<Element> {
  event
    .target()?
    .dyn_into::<Element>()
    .ok()
}

/// Maps the element's `data-*` contract
/// to an action and dispatches it.
fn dispatch_from(
  shared: &Shared,
  el: &Element,
  target: &Element
) {
  let Some(attrs) =
    dom::action_attrs(el, target)
  else {
    return;
  };
  match Action::from_attrs(&attrs) {
    | Some(action) => {
      runtime::dispatch(shared, action)
    }
    | None => {
      trace!(action = %attrs.action, "no action for element");
    }
  }
}

fn on_click(
  shared: &Shared,
  event: &Event
) {
  let Some(target) = target_element(event)
  else {
    return;
  };
  let Some(el) =
    dom::closest(&target, "[data-action]")
  else {
    return;
  };
  // Form controls report through input and
  // change; forms through submit.
  if matches!(
    el.tag_name().as_str(),
    "INPUT" | "SELECT" | "TEXTAREA" | "FORM"
  ) {
    return;
  }
  dispatch_from(shared, &el, &target);
}

fn is_toggle_control(el: &Element) -> bool {
  el.tag_name() == "SELECT"
    || el.get_attribute("type").as_deref()
      == Some("checkbox")
}

fn on_input(
  shared: &Shared,
  event: &Event
) {
  let Some(el) = target_element(event)
  else {
    return;
  };
  let Some(action) =
    el.get_attribute("data-action")
  else {
    return;
  };
  if !INPUT_ACTIONS
    .contains(&action.as_str())
  {
    return;
  }
  if action == "draftField"
    && is_toggle_control(&el)
  {
    return;
  }
  dispatch_from(shared, &el, &el);
}

fn on_change(
  shared: &Shared,
  event: &Event
) {
  let Some(el) = target_element(event)
  else {
    return;
  };
  let Some(action) =
    el.get_attribute("data-action")
  else {
    return;
  };
  let wanted = CHANGE_ACTIONS
    .contains(&action.as_str())
    || (action == "draftField"
      && is_toggle_control(&el));
  if wanted {
    dispatch_from(shared, &el, &el);
  }
}

fn on_keydown(
  shared: &Shared,
  event: &Event
) {
  let Some(key) =
    event.dyn_ref::<KeyboardEvent>()
  else {
    return;
  };
  if key.key() != "Enter" {
    return;
  }
  let Some(el) = target_element(event)
  else {
    return;
  };
  if el.get_attribute("data-field").as_deref()
    != Some("draftTaskText")
  {
    return;
  }
  event.prevent_default();
  let (value, _) = dom::control_value(&el);
  runtime::dispatch(
    shared,
    Action::AddDraftTask {
      text: value
    }
  );
}

fn on_submit(
  shared: &Shared,
  event: &Event
) {
  let Some(form) = target_element(event)
  else {
    return;
  };
  if form.get_attribute("data-action").as_deref()
    != Some("submitAdd")
  {
    return;
  }
  event.prevent_default();
  runtime::dispatch(shared, Action::SubmitAdd);
}

/// Escape on an open sheet. The state,
/// not the browser, decides whether it
/// closes.
fn on_dialog_cancel(
  shared: &Shared,
  event: &Event
) {
  let Some(el) = target_element(event)
  else {
    return;
  };
  let action = match el.id().as_str() {
    | dom::ADD_SHEET_ID => Action::CloseAdd,
    | dom::EDIT_SHEET_ID => {
      Action::CloseEdit
    }
    | _ => return
  };
  event.prevent_default();
  runtime::dispatch(shared, action);
}
