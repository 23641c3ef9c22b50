use std::io::{self, IsTerminal, Write};

use anyhow::anyhow;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use taskmedic_core::datetime::{fmt_hm, fmt_time};
use taskmedic_core::item::{ChecklistEntry, Item, ItemKind, Urgency};
use taskmedic_core::view::card::{headline, secondary};
use unicode_width::UnicodeWidthStr;

use crate::config::Config;

pub const SHORT_ID_LEN: usize = 8;

#[derive(Debug, Clone)]
pub struct Renderer {
    color: bool,
    tz: Tz,
}

impl Renderer {
    pub fn new(cfg: &Config) -> anyhow::Result<Self> {
        let color_cfg = cfg.get("color").unwrap_or_else(|| "on".to_string());
        let color = match color_cfg.to_ascii_lowercase().as_str() {
            "on" | "yes" | "true" | "1" => true,
            "off" | "no" | "false" | "0" => false,
            other => return Err(anyhow!("invalid color setting: {other}")),
        };

        Ok(Self {
            color,
            tz: cfg.timezone()?,
        })
    }

    #[tracing::instrument(skip(self, items, now), fields(count = items.len()))]
    pub fn print_item_table(&self, items: &[&Item], now: DateTime<Utc>) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();
        self.write_item_table(&mut out, items, now)
    }

    pub fn write_item_table<W: Write>(
        &self,
        out: W,
        items: &[&Item],
        now: DateTime<Utc>,
    ) -> anyhow::Result<()> {
        let headers = ["ID", "Type", "Urgency", "Where", "Summary", "Open", "Review"]
            .iter()
            .map(|h| h.to_string())
            .collect::<Vec<_>>();

        let mut rows = Vec::with_capacity(items.len());

        for item in items {
            let id = self.paint(short_id(&item.id), "33");
            let kind = if item.done {
                format!("{} (done)", item.item_type().as_str())
            } else {
                item.item_type().as_str().to_string()
            };
            let urgency = self.paint(item.urgency.as_str(), urgency_code(item.urgency));

            let review = item
                .review_by
                .map(|at| {
                    let text = fmt_hm(at, self.tz);
                    if at < now && !item.done {
                        self.paint(&text, "31")
                    } else {
                        text
                    }
                })
                .unwrap_or_default();

            let open = match item.open_entry_count() {
                0 => String::new(),
                n => n.to_string(),
            };

            rows.push(vec![
                id,
                kind,
                urgency,
                headline(item),
                secondary(item),
                open,
                review,
            ]);
        }

        write_table(out, headers, rows)?;
        Ok(())
    }

    #[tracing::instrument(skip(self, item), fields(id = %item.id))]
    pub fn print_item_info(&self, item: &Item) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();
        self.write_item_info(&mut out, item)
    }

    pub fn write_item_info<W: Write>(&self, mut out: W, item: &Item) -> anyhow::Result<()> {
        writeln!(out, "id        {}", item.id)?;
        writeln!(out, "type      {}", item.item_type().label())?;
        writeln!(out, "status    {}", if item.done { "done" } else { "open" })?;
        writeln!(out, "urgency   {}", item.urgency.as_str())?;
        writeln!(out, "where     {}", headline(item))?;
        match &item.kind {
            ItemKind::Job(job) => {
                writeln!(out, "summary   {}", job.summary)?;
            }
            ItemKind::Bleep(bleep) => {
                writeln!(out, "summary   {}", bleep.summary.clone().unwrap_or_default())?;
                writeln!(
                    out,
                    "callback  {}",
                    if bleep.called_back { "called back" } else { "awaiting" }
                )?;
            }
        }
        if let Some(extra) = &item.secondary_summary {
            writeln!(out, "more      {extra}")?;
        }
        if let Some(review_by) = item.review_by {
            writeln!(out, "review    {}", fmt_time(review_by, self.tz))?;
        }
        writeln!(out, "created   {}", fmt_time(item.created_at, self.tz))?;
        writeln!(out, "modified  {}", fmt_time(item.updated_at, self.tz))?;

        self.write_checklist(&mut out, "tasks", &item.tasks)?;
        self.write_checklist(&mut out, "actions", &item.actions)?;

        if !item.progress.is_empty() {
            writeln!(out, "progress")?;
            for note in &item.progress {
                writeln!(
                    out,
                    "  {} {} {}",
                    short_id(&note.id),
                    fmt_time(note.t, self.tz),
                    note.text
                )?;
            }
        }

        Ok(())
    }

    fn write_checklist<W: Write>(
        &self,
        out: &mut W,
        label: &str,
        entries: &[ChecklistEntry],
    ) -> anyhow::Result<()> {
        if entries.is_empty() {
            return Ok(());
        }
        writeln!(out, "{label}")?;
        for entry in entries {
            let mark = if entry.done { self.paint("[x]", "32") } else { "[ ]".to_string() };
            writeln!(out, "  {mark} {} {}", short_id(&entry.id), entry.text)?;
        }
        Ok(())
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if !self.color || !io::stdout().is_terminal() {
            return text.to_string();
        }
        format!("\x1b[{code}m{text}\x1b[0m")
    }
}

pub fn short_id(id: &str) -> &str {
    id.get(..SHORT_ID_LEN).unwrap_or(id)
}

fn urgency_code(urgency: Urgency) -> &'static str {
    match urgency {
        Urgency::Red => "31",
        Urgency::Amber => "33",
        Urgency::Green => "32",
    }
}

fn write_table<W: Write>(
    mut writer: W,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
) -> anyhow::Result<()> {
    let column_count = headers.len();
    let mut widths = vec![0usize; column_count];

    for (idx, header) in headers.iter().enumerate() {
        widths[idx] = widths[idx].max(UnicodeWidthStr::width(header.as_str()));
    }

    for row in &rows {
        for (idx, cell) in row.iter().enumerate() {
            widths[idx] = widths[idx].max(UnicodeWidthStr::width(strip_ansi(cell).as_str()));
        }
    }

    for (header, width) in headers.iter().zip(&widths) {
        write!(writer, "{header:width$} ")?;
    }
    writeln!(writer)?;

    for width in &widths {
        write!(writer, "{:-<width$} ", "")?;
    }
    writeln!(writer)?;

    for row in rows {
        for (cell, width) in row.iter().zip(&widths) {
            let visible_width = UnicodeWidthStr::width(strip_ansi(cell).as_str());
            let padding = width.saturating_sub(visible_width);
            write!(writer, "{}{} ", cell, " ".repeat(padding))?;
        }
        writeln!(writer)?;
    }

    Ok(())
}

fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut escaped = false;

    for ch in s.chars() {
        if escaped {
            if ch == 'm' {
                escaped = false;
            }
            continue;
        }

        if ch == '\x1b' {
            escaped = true;
            continue;
        }

        out.push(ch);
    }

    out
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use taskmedic_core::checklist::add_entry;
    use taskmedic_core::item::JobDetails;

    use super::*;

    fn renderer() -> Renderer {
        let mut cfg = Config::default();
        cfg.apply_overrides(vec![("color".to_string(), "off".to_string())]);
        Renderer::new(&cfg).expect("renderer")
    }

    #[test]
    fn table_columns_align_on_display_width() {
        let now = Utc.with_ymd_and_hms(2030, 2, 1, 9, 0, 0).single().expect("valid");
        let mut item = Item::new(
            ItemKind::Job(JobDetails {
                ward: Some("Ward 7·B".to_string()),
                bed: Some("3".to_string()),
                summary: "Fluids review".to_string(),
            }),
            now,
        );
        item.tasks = add_entry(&item.tasks, "U&E", now);
        item.review_by = Some(now - chrono::Duration::minutes(5));

        let mut out = Vec::new();
        renderer()
            .write_item_table(&mut out, &[&item], now)
            .expect("table");
        let text = String::from_utf8(out).expect("utf8");
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("ID "));
        assert!(lines[2].contains("Ward 7·B · Bed 3"));
        assert!(lines[2].contains("08:55"));
        assert_eq!(
            UnicodeWidthStr::width(lines[0].trim_end()),
            UnicodeWidthStr::width(lines[1].trim_end())
        );
    }

    #[test]
    fn invalid_color_setting_is_rejected() {
        let mut cfg = Config::default();
        cfg.apply_overrides(vec![("color".to_string(), "sometimes".to_string())]);
        assert!(Renderer::new(&cfg).is_err());
    }

    #[test]
    fn strip_ansi_removes_escape_sequences() {
        assert_eq!(strip_ansi("\x1b[31mred\x1b[0m"), "red");
    }
}
