use std::cell::RefCell;
use std::rc::{
  Rc,
  Weak
};

use chrono::Duration;
use gloo::events::{
  EventListener,
  EventListenerOptions
};
use gloo::timers::callback::Timeout;
use taskmedic_core::datetime::now_ms;
use taskmedic_core::gesture::PointerSample;
use tracing::trace;
use wasm_bindgen::JsCast;
use web_sys::{
  Element,
  Event,
  PointerEvent
};

use crate::dom;
use crate::runtime::{
  Runtime,
  Shared
};

const INTERACTIVE: &str =
  "button, input, select, textarea, a, \
   label";

#[derive(Debug, Clone, Copy)]
enum Pointer {
  Down,
  Move,
  Up,
  Cancel
}

impl Pointer {
  fn event_name(self) -> &'static str {
    match self {
      | Pointer::Down => "pointerdown",
      | Pointer::Move => "pointermove",
      | Pointer::Up => "pointerup",
      | Pointer::Cancel => "pointercancel"
    }
  }
}

/// Binds pointer listeners to every
/// rendered card surface. Dropping the
/// returned listeners unbinds them.
pub fn attach(
  shared: &Shared,
  mount: &Element,
  ids: &[String]
) -> Vec<EventListener> {
  let mut listeners =
    Vec::with_capacity(ids.len() * 4);

  for id in ids {
    let selector = dom::attr_selector(
      "data-card-id",
      id
    );
    let Some(surface) =
      dom::query(mount, &selector)
    else {
      trace!(card = %id, "card surface not rendered");
      continue;
    };

    for pointer in [
      Pointer::Down,
      Pointer::Move,
      Pointer::Up,
      Pointer::Cancel
    ] {
      let weak = Rc::downgrade(shared);
      let id = id.clone();
      let target = surface.clone();
      listeners.push(
        EventListener::new_with_options(
          &surface,
          pointer.event_name(),
          EventListenerOptions::enable_prevent_default(),
          move |event| {
            on_pointer(
              &weak, &target, &id,
              pointer, event
            );
          }
        )
      );
    }
  }

  listeners
}

fn on_pointer(
  weak: &Weak<RefCell<Runtime>>,
  surface: &Element,
  id: &str,
  pointer: Pointer,
  event: &Event
) {
  let Some(shared) = weak.upgrade() else {
    return;
  };
  let Some(pe) =
    event.dyn_ref::<PointerEvent>()
  else {
    return;
  };
  let sample = PointerSample {
    pointer_id: pe.pointer_id(),
    x:          f64::from(pe.client_x()),
    y:          f64::from(pe.client_y())
  };

  let Ok(mut rt) = shared.try_borrow_mut()
  else {
    return;
  };

  let cmds = match pointer {
    | Pointer::Down => {
      let on_interactive = event
        .target()
        .and_then(|t| {
          t.dyn_into::<Element>().ok()
        })
        .and_then(|el| {
          dom::closest(&el, INTERACTIVE)
        })
        .is_some();
      if !on_interactive {
        let _ = surface.set_pointer_capture(
          sample.pointer_id
        );
      }
      rt.app.gestures_mut().pointer_down(
        id,
        sample,
        on_interactive
      )
    }
    | Pointer::Move => {
      rt.app
        .gestures_mut()
        .pointer_move(id, sample)
    }
    | Pointer::Up => {
      rt.app.gestures_mut().pointer_up(
        id,
        sample,
        now_ms()
      )
    }
    | Pointer::Cancel => {
      rt.app
        .gestures_mut()
        .pointer_cancel(id)
    }
  };

  rt.run_gestures(&shared, cmds, Some(event));
}

/// Starts the long-press countdown for a
/// card. Dropping the handle cancels it.
pub fn arm_long_press(
  shared: &Shared,
  card: String,
  delay: Duration
) -> Timeout {
  let weak = Rc::downgrade(shared);
  let millis = u32::try_from(
    delay.num_milliseconds().max(0)
  )
  .unwrap_or(u32::MAX);

  Timeout::new(millis, move || {
    let Some(shared) = weak.upgrade() else {
      return;
    };
    let Ok(mut rt) = shared.try_borrow_mut()
    else {
      return;
    };
    let cmds = rt
      .app
      .gestures_mut()
      .long_press_elapsed(&card, now_ms());
    rt.run_gestures(&shared, cmds, None);
  })
}
