//! HTML rendering of execution logs
//!
//! Converts the ANSI-coloured log file into `<pre>` markup with inline
//! styles, for callers that show a live log in a browser.

use once_cell::sync::Lazy;
use regex::Regex;

pub(crate) static ANSI_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\x1b\[(\d*);*(\d*)m").expect("valid ANSI pattern"));

fn color(code: u8) -> Option<&'static str> {
    let color = match code {
        30 => "#000000",
        31 => "#CD0000",
        32 => "#00CD00",
        33 => "#C4A000",
        34 => "#0000EE",
        35 => "#CD00CD",
        36 => "#00CCCC",
        37 => "#AAAAAA",
        _ => return None,
    };
    Some(color)
}

/// Inline style for an escape sequence's codes; `None` resets formatting
fn style(codes: &[u8]) -> Option<String> {
    let bold = codes.contains(&1);
    let color = codes.iter().copied().find_map(color);

    match (color, bold) {
        // bold black is rendered as dark gray, like most terminals do
        (Some("#000000"), true) => Some("color:#555555;font-weight:bold".to_string()),
        (Some(color), true) => Some(format!("color:{color};font-weight:bold")),
        (Some(color), false) => Some(format!("color:{color}")),
        (None, true) => Some("font-weight:bold".to_string()),
        (None, false) => None,
    }
}

fn escape(text: &str, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
}

/// Renders ANSI-coloured log text as HTML
#[must_use]
pub fn render_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 16);
    out.push_str("<pre>");

    let mut open = false;
    let mut last = 0;
    for caps in ANSI_PATTERN.captures_iter(text) {
        let Some(whole) = caps.get(0) else { continue };
        escape(&text[last..whole.start()], &mut out);
        last = whole.end();

        let codes: Vec<u8> = [caps.get(1), caps.get(2)]
            .into_iter()
            .flatten()
            .filter_map(|m| m.as_str().parse().ok())
            .collect();

        if open {
            out.push_str("</span>");
            open = false;
        }
        if let Some(style) = style(&codes) {
            out.push_str(&format!("<span style='{style}'>"));
            open = true;
        }
    }
    escape(&text[last..], &mut out);
    if open {
        out.push_str("</span>");
    }

    out.push_str("</pre>");
    out
}
