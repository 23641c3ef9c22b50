use chrono::{DateTime, Duration, Utc};

use crate::datetime::format_elapsed;

pub const QUICK_EVENTS: [&str; 10] = [
    "CPR ongoing",
    "Shock delivered",
    "Rhythm check",
    "Adrenaline 1mg",
    "Amiodarone 300mg",
    "ROSC",
    "Airway secured",
    "IV/IO access",
    "Capnography",
    "Team brief",
];

/// How often a host repaints a running stopwatch. Must stay well under a
/// second so a late tick never skips a displayed second.
pub const REPAINT_INTERVAL_MS: u32 = 500;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScribeEntry {
    pub t: DateTime<Utc>,
    pub text: String,
}

/// Stopwatch and timestamped event log for the tools view.
#[derive(Debug, Clone, Default)]
pub struct Scribe {
    running: bool,
    started_at: Option<DateTime<Utc>>,
    elapsed: Duration,
    log: Vec<ScribeEntry>,
}

impl Scribe {
    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Most recent first.
    pub fn log(&self) -> &[ScribeEntry] {
        &self.log
    }

    pub fn start(&mut self, now: DateTime<Utc>) -> bool {
        if self.running {
            return false;
        }
        self.running = true;
        self.started_at = Some(now - self.elapsed);
        true
    }

    pub fn pause(&mut self, now: DateTime<Utc>) -> bool {
        if !self.running {
            return false;
        }
        self.running = false;
        if let Some(started_at) = self.started_at {
            self.elapsed = now - started_at;
        }
        true
    }

    pub fn reset(&mut self) {
        self.running = false;
        self.started_at = None;
        self.elapsed = Duration::zero();
    }

    /// Advances the elapsed time; returns whether anything changed.
    pub fn tick(&mut self, now: DateTime<Utc>) -> bool {
        match (self.running, self.started_at) {
            (true, Some(started_at)) => {
                self.elapsed = now - started_at;
                true
            }
            _ => false,
        }
    }

    pub fn record(&mut self, text: &str, now: DateTime<Utc>) {
        let line = format!("{} {}", format_elapsed(self.elapsed), text);
        self.log.insert(
            0,
            ScribeEntry {
                t: now,
                text: line.trim().to_string(),
            },
        );
    }

    pub fn clear_log(&mut self) {
        self.log.clear();
    }

    /// Oldest first, one entry per line.
    pub fn export_text(&self) -> String {
        self.log
            .iter()
            .rev()
            .map(|entry| entry.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}
