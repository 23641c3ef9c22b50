//! Swipe-to-reveal and long-press-to-expand for list cards.
//!
//! The machine never touches the page. Each pointer event returns the
//! [`GestureCommand`]s the host must carry out (arm a timer, move a card
//! surface, expand a card), which keeps every transition testable.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GestureConfig {
    pub action_width: f64,
    pub long_press: Duration,
    pub horizontal_slop: f64,
    pub tap_slop: f64,
    pub open_ratio: f64,
    pub ignore_after_long_press: Duration,
    pub ignore_after_tap_close: Duration,
    pub ignore_after_settle: Duration,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            action_width: 148.0,
            long_press: Duration::milliseconds(460),
            horizontal_slop: 10.0,
            tap_slop: 8.0,
            open_ratio: 0.45,
            ignore_after_long_press: Duration::milliseconds(420),
            ignore_after_tap_close: Duration::milliseconds(280),
            ignore_after_settle: Duration::milliseconds(180),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GesturePhase {
    /// Closed with no pointer down.
    Idle,
    /// Pointer down, not (yet) swiping. Vertical scrolling disarms the
    /// long-press timer without leaving this phase.
    PendingLongPress,
    Swiping,
    SettledOpen,
    SettledClosed,
}

#[derive(Debug, Clone, PartialEq)]
pub enum GestureCommand {
    /// Start (or restart) the card's long-press timer.
    ArmTimer { card: String, delay: Duration },
    CancelTimer { card: String },
    Translate { card: String, offset: f64, animate: bool },
    /// Suppress the browser's default handling of the current event.
    PreventDefault,
    Expand { card: String },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerSample {
    pub pointer_id: i32,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone)]
struct CardGesture {
    phase: GesturePhase,
    pointer_id: Option<i32>,
    start_x: f64,
    start_y: f64,
    offset_start: f64,
    offset: f64,
    open: bool,
    timer_armed: bool,
    long_press_fired: bool,
    ignore_tap_until: Option<DateTime<Utc>>,
}

impl Default for CardGesture {
    fn default() -> Self {
        Self {
            phase: GesturePhase::Idle,
            pointer_id: None,
            start_x: 0.0,
            start_y: 0.0,
            offset_start: 0.0,
            offset: 0.0,
            open: false,
            timer_armed: false,
            long_press_fired: false,
            ignore_tap_until: None,
        }
    }
}

/// Gesture state for every card currently on the page.
#[derive(Debug, Clone, Default)]
pub struct GestureBoard {
    config: GestureConfig,
    reduced_motion: bool,
    cards: BTreeMap<String, CardGesture>,
}

impl GestureBoard {
    pub fn new(config: GestureConfig) -> Self {
        Self {
            config,
            reduced_motion: false,
            cards: BTreeMap::new(),
        }
    }

    pub fn config(&self) -> &GestureConfig {
        &self.config
    }

    pub fn set_reduced_motion(&mut self, reduced: bool) {
        self.reduced_motion = reduced;
    }

    pub fn reduced_motion(&self) -> bool {
        self.reduced_motion
    }

    /// Drops every card and cancels any armed timers.
    pub fn unbind_all(&mut self) -> Vec<GestureCommand> {
        let cmds = self
            .cards
            .iter()
            .filter(|(_, card)| card.timer_armed)
            .map(|(id, _)| GestureCommand::CancelTimer { card: id.clone() })
            .collect();
        self.cards.clear();
        cmds
    }

    /// Replaces the card set after a re-render. Freshly rendered cards start
    /// closed; a card that survives the render keeps its ignore-tap window.
    pub fn rebind<I>(&mut self, ids: I) -> Vec<GestureCommand>
    where
        I: IntoIterator<Item = String>,
    {
        let windows: BTreeMap<String, DateTime<Utc>> = self
            .cards
            .iter()
            .filter_map(|(id, card)| card.ignore_tap_until.map(|until| (id.clone(), until)))
            .collect();
        let cmds = self.unbind_all();
        self.cards = ids
            .into_iter()
            .filter(|id| !id.is_empty())
            .map(|id| {
                let card = CardGesture {
                    ignore_tap_until: windows.get(&id).copied(),
                    ..CardGesture::default()
                };
                (id, card)
            })
            .collect();
        trace!(cards = self.cards.len(), "rebound card gestures");
        cmds
    }

    pub fn card_ids(&self) -> impl Iterator<Item = &str> {
        self.cards.keys().map(String::as_str)
    }

    pub fn phase(&self, id: &str) -> Option<GesturePhase> {
        self.cards.get(id).map(|card| card.phase)
    }

    pub fn offset(&self, id: &str) -> Option<f64> {
        self.cards.get(id).map(|card| card.offset)
    }

    pub fn is_open(&self, id: &str) -> bool {
        self.cards.get(id).is_some_and(|card| card.open)
    }

    /// True while a recent gesture wants the follow-up click dropped.
    pub fn should_ignore_tap(&self, id: &str, now: DateTime<Utc>) -> bool {
        self.cards
            .get(id)
            .and_then(|card| card.ignore_tap_until)
            .is_some_and(|until| now < until)
    }

    pub fn pointer_down(
        &mut self,
        id: &str,
        sample: PointerSample,
        on_interactive: bool,
    ) -> Vec<GestureCommand> {
        if on_interactive {
            return vec![];
        }
        let width = self.config.action_width;
        let delay = self.config.long_press;
        let Some(card) = self.cards.get_mut(id) else {
            return vec![];
        };

        card.pointer_id = Some(sample.pointer_id);
        card.start_x = sample.x;
        card.start_y = sample.y;
        card.offset_start = if card.open { -width } else { 0.0 };
        card.offset = card.offset_start;
        card.long_press_fired = false;
        card.timer_armed = true;
        card.phase = GesturePhase::PendingLongPress;

        vec![GestureCommand::ArmTimer {
            card: id.to_string(),
            delay,
        }]
    }

    pub fn pointer_move(&mut self, id: &str, sample: PointerSample) -> Vec<GestureCommand> {
        let config = self.config;
        let Some(card) = self.cards.get_mut(id) else {
            return vec![];
        };
        if card.pointer_id != Some(sample.pointer_id) || card.long_press_fired {
            return vec![];
        }

        let dx = sample.x - card.start_x;
        let dy = sample.y - card.start_y;
        let (abs_dx, abs_dy) = (dx.abs(), dy.abs());
        let mut cmds = Vec::new();

        if card.phase != GesturePhase::Swiping
            && abs_dx > config.horizontal_slop
            && abs_dx > abs_dy
        {
            card.phase = GesturePhase::Swiping;
            if card.timer_armed {
                card.timer_armed = false;
                cmds.push(GestureCommand::CancelTimer {
                    card: id.to_string(),
                });
            }
            cmds.extend(self.close_others(id));
        }

        let Some(card) = self.cards.get_mut(id) else {
            return cmds;
        };

        if card.phase != GesturePhase::Swiping {
            if abs_dy > config.horizontal_slop && abs_dy > abs_dx && card.timer_armed {
                card.timer_armed = false;
                cmds.push(GestureCommand::CancelTimer {
                    card: id.to_string(),
                });
            }
            return cmds;
        }

        card.offset = (card.offset_start + dx).clamp(-config.action_width, 0.0);
        cmds.push(GestureCommand::PreventDefault);
        cmds.push(GestureCommand::Translate {
            card: id.to_string(),
            offset: card.offset,
            animate: false,
        });
        cmds
    }

    pub fn pointer_up(
        &mut self,
        id: &str,
        sample: PointerSample,
        now: DateTime<Utc>,
    ) -> Vec<GestureCommand> {
        let config = self.config;
        let animate = !self.reduced_motion;
        let Some(card) = self.cards.get_mut(id) else {
            return vec![];
        };
        if card.pointer_id != Some(sample.pointer_id) {
            return vec![];
        }
        card.pointer_id = None;

        let mut cmds = Vec::new();
        if card.timer_armed {
            card.timer_armed = false;
            cmds.push(GestureCommand::CancelTimer {
                card: id.to_string(),
            });
        }

        if card.long_press_fired {
            card.phase = settled_phase(card.open);
            return cmds;
        }

        if card.phase != GesturePhase::Swiping {
            let moved_x = (sample.x - card.start_x).abs();
            let moved_y = (sample.y - card.start_y).abs();
            if card.open && moved_x < config.tap_slop && moved_y < config.tap_slop {
                card.ignore_tap_until = Some(now + config.ignore_after_tap_close);
                card.open = false;
                card.offset = 0.0;
                card.phase = GesturePhase::SettledClosed;
                cmds.push(GestureCommand::Translate {
                    card: id.to_string(),
                    offset: 0.0,
                    animate,
                });
            } else if card.open {
                card.phase = GesturePhase::SettledOpen;
            } else {
                card.phase = GesturePhase::Idle;
            }
            return cmds;
        }

        let should_open = card.offset <= -config.action_width * config.open_ratio;
        card.open = should_open;
        card.offset = if should_open { -config.action_width } else { 0.0 };
        card.phase = settled_phase(should_open);
        let ignore = if self.reduced_motion {
            Duration::zero()
        } else {
            config.ignore_after_settle
        };
        card.ignore_tap_until = Some(now + ignore);
        cmds.push(GestureCommand::Translate {
            card: id.to_string(),
            offset: card.offset,
            animate,
        });
        cmds
    }

    pub fn pointer_cancel(&mut self, id: &str) -> Vec<GestureCommand> {
        let animate = !self.reduced_motion;
        let Some(card) = self.cards.get_mut(id) else {
            return vec![];
        };
        card.pointer_id = None;
        card.open = false;
        card.offset = 0.0;
        card.phase = GesturePhase::SettledClosed;

        let mut cmds = Vec::new();
        if card.timer_armed {
            card.timer_armed = false;
            cmds.push(GestureCommand::CancelTimer {
                card: id.to_string(),
            });
        }
        cmds.push(GestureCommand::Translate {
            card: id.to_string(),
            offset: 0.0,
            animate,
        });
        cmds
    }

    /// Called by the host when a long-press timer fires. Stale timers
    /// (already cancelled, or pointer released) are ignored.
    pub fn long_press_elapsed(&mut self, id: &str, now: DateTime<Utc>) -> Vec<GestureCommand> {
        let ignore = self.config.ignore_after_long_press;
        let Some(card) = self.cards.get_mut(id) else {
            return vec![];
        };
        if !card.timer_armed || card.pointer_id.is_none() {
            return vec![];
        }
        card.timer_armed = false;
        card.long_press_fired = true;
        card.ignore_tap_until = Some(now + ignore);
        vec![GestureCommand::Expand {
            card: id.to_string(),
        }]
    }

    fn close_others(&mut self, keep: &str) -> Vec<GestureCommand> {
        let animate = !self.reduced_motion;
        let mut cmds = Vec::new();
        for (id, card) in self.cards.iter_mut() {
            if id == keep || !card.open {
                continue;
            }
            card.open = false;
            card.offset = 0.0;
            card.phase = GesturePhase::SettledClosed;
            cmds.push(GestureCommand::Translate {
                card: id.clone(),
                offset: 0.0,
                animate,
            });
        }
        cmds
    }
}

fn settled_phase(open: bool) -> GesturePhase {
    if open {
        GesturePhase::SettledOpen
    } else {
        GesturePhase::SettledClosed
    }
}
