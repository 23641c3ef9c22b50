/// Escapes text for use in element content and quoted attribute values.
pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Neutral,
    Info,
    Danger,
    Success,
    Amber,
}

impl Tone {
    pub fn as_str(self) -> &'static str {
        match self {
            Tone::Neutral => "neutral",
            Tone::Info => "info",
            Tone::Danger => "danger",
            Tone::Success => "success",
            Tone::Amber => "amber",
        }
    }
}

pub fn pill(label: &str, tone: Tone, testid: Option<&str>) -> String {
    let testid = testid
        .map(|tid| format!(r#" data-testid="{}""#, escape(tid)))
        .unwrap_or_default();
    format!(
        r#"<span class="tm-pill tm-pill-{}"{testid}>{}</span>"#,
        tone.as_str(),
        escape(label)
    )
}

pub(crate) fn selected(on: bool) -> &'static str {
    if on { " selected" } else { "" }
}

pub(crate) fn checked(on: bool) -> &'static str {
    if on { " checked" } else { "" }
}

pub(crate) fn bool_attr(on: bool) -> &'static str {
    if on { "true" } else { "false" }
}
