//! Owns the [`App`] for the lifetime of
//! the page and carries out the effects it
//! returns.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use gloo::events::EventListener;
use gloo::timers::callback::{
  Interval,
  Timeout
};
use taskmedic_core::action::{
  Action,
  Route
};
use taskmedic_core::app::{
  App,
  AppConfig,
  Effect
};
use taskmedic_core::datetime::now_ms;
use taskmedic_core::gesture::GestureCommand;
use taskmedic_core::scribe::REPAINT_INTERVAL_MS;
use tracing::{
  debug,
  info,
  warn
};
use web_sys::{
  Element,
  Event
};

use crate::storage::LocalStore;
use crate::{
  dom,
  events,
  gestures
};

pub type Shared = Rc<RefCell<Runtime>>;

thread_local! {
  static RUNTIME: RefCell<Option<Shared>> =
    const { RefCell::new(None) };
}

pub struct Runtime {
  pub(crate) app:     App<LocalStore>,
  pub(crate) mount:   Element,
  timers:             BTreeMap<String, Timeout>,
  ticker:             Option<Interval>,
  card_listeners:     Vec<EventListener>,
  root_listeners:     Vec<EventListener>
}

#[tracing::instrument]
pub fn start() -> anyhow::Result<()> {
  let mount = dom::mount()?;
  let config = AppConfig {
    tz: dom::local_timezone(),
    ..AppConfig::default()
  };
  let mut app =
    App::open(LocalStore::open(), config)?;

  let reduced =
    dom::reduced_motion_query()
      .is_some_and(|query| query.matches());
  app.set_reduced_motion(reduced);
  dom::mirror_reduced_motion(reduced)?;

  let shared = Rc::new(RefCell::new(
    Runtime {
      app,
      mount: mount.clone(),
      timers: BTreeMap::new(),
      ticker: None,
      card_listeners: vec![],
      root_listeners: vec![]
    }
  ));

  let listeners =
    events::install(&shared, &mount)?;
  {
    let mut rt = shared.borrow_mut();
    rt.root_listeners = listeners;
    rt.render(&shared);
  }

  info!(
    tz = %shared.borrow().app.config().tz,
    reduced_motion = reduced,
    "taskmedic runtime started"
  );
  RUNTIME.with(|slot| {
    *slot.borrow_mut() = Some(shared);
  });
  Ok(())
}

/// Hands one action to the app and applies
/// the resulting effect to the page.
pub fn dispatch(
  shared: &Shared,
  action: Action
) {
  let Ok(mut rt) = shared.try_borrow_mut()
  else {
    warn!(
      action = action.name(),
      "runtime busy; dropping action"
    );
    return;
  };

  let refocus_search =
    matches!(action, Action::SetSearch(_));
  let effect =
    rt.app.dispatch(action, now_ms());

  match effect {
    | Effect::Ignored => {}
    | Effect::Rerender => {
      rt.render(shared);
      if refocus_search {
        dom::focus_search();
      }
    }
    | Effect::Patch(patches) => {
      dom::apply_patches(
        &rt.mount, &patches
      );
    }
    | Effect::Dialog(change) => {
      dom::apply_dialog(change);
    }
    | Effect::Clipboard(text) => {
      dom::copy_text(text);
    }
  }
}

/// Dispatches after the current event
/// handler has returned. Used where the
/// resulting render would drop the
/// listener that is still running.
pub fn dispatch_later(
  shared: &Shared,
  action: Action
) {
  let weak = Rc::downgrade(shared);
  wasm_bindgen_futures::spawn_local(
    async move {
      if let Some(shared) = weak.upgrade()
      {
        dispatch(&shared, action);
      }
    }
  );
}

impl Runtime {
  fn render(&mut self, shared: &Shared) {
    let now = now_ms();
    self.card_listeners.clear();
    self
      .mount
      .set_inner_html(&self.app.render(now));

    let ui = self.app.ui();
    dom::sync_dialogs(ui);
    match ui.route {
      | Route::List if !ui.dialog_open() => {
        dom::restore_scroll(
          ui.list_scroll_y
        );
      }
      | Route::List => {}
      | Route::Tools => {
        dom::restore_scroll(0.0)
      }
    }

    let cmds = self.app.rebind_gestures();
    self.run_gestures(shared, cmds, None);
    self.timers.clear();

    let ids = self.app.visible_card_ids();
    self.card_listeners = gestures::attach(
      shared,
      &self.mount,
      &ids
    );
    debug!(
      cards = ids.len(),
      "rendered and rebound"
    );

    self.sync_ticker(shared);
  }

  /// Runs the scribe ticker only while the
  /// stopwatch is visible and running.
  fn sync_ticker(
    &mut self,
    shared: &Shared
  ) {
    let wanted =
      self.app.scribe().is_running()
        && self.app.ui().route
          == Route::Tools;

    match (wanted, self.ticker.is_some()) {
      | (true, false) => {
        let weak = Rc::downgrade(shared);
        self.ticker = Some(Interval::new(
          REPAINT_INTERVAL_MS,
          move || {
            if let Some(shared) =
              weak.upgrade()
            {
              dispatch(
                &shared,
                Action::Tick
              );
            }
          }
        ));
        debug!("scribe ticker started");
      }
      | (false, true) => {
        self.ticker = None;
        debug!("scribe ticker stopped");
      }
      | _ => {}
    }
  }

  pub(crate) fn run_gestures(
    &mut self,
    shared: &Shared,
    cmds: Vec<GestureCommand>,
    event: Option<&Event>
  ) {
    for cmd in cmds {
      match cmd {
        | GestureCommand::ArmTimer {
          card,
          delay
        } => {
          let timeout = gestures::arm_long_press(
            shared,
            card.clone(),
            delay
          );
          self.timers.insert(card, timeout);
        }
        | GestureCommand::CancelTimer {
          card
        } => {
          self.timers.remove(&card);
        }
        | GestureCommand::Translate {
          card,
          offset,
          animate
        } => {
          dom::translate_card(
            &self.mount,
            &card,
            offset,
            animate
          );
        }
        | GestureCommand::PreventDefault => {
          if let Some(event) = event {
            event.prevent_default();
          }
        }
        | GestureCommand::Expand {
          card
        } => {
          dispatch_later(
            shared,
            Action::LongPress {
              id: card
            }
          );
        }
      }
    }
  }
}
