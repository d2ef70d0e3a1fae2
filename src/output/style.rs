use std::sync::atomic::{AtomicBool, Ordering};

static COLORS_ENABLED: AtomicBool = AtomicBool::new(true);

pub fn configure(no_color: bool) {
    let mut enabled = !no_color;

    if std::env::var_os("NO_COLOR").is_some() {
        enabled = false;
    }

    if let Ok(term) = std::env::var("TERM")
        && term.eq_ignore_ascii_case("dumb")
    {
        enabled = false;
    }

    if std::env::var("CLICOLOR_FORCE").ok().as_deref() == Some("1") {
        enabled = true;
    }

    COLORS_ENABLED.store(enabled, Ordering::Relaxed);
}

fn style(code: &str, text: &str) -> String {
    if text.is_empty() || !COLORS_ENABLED.load(Ordering::Relaxed) {
        return text.to_string();
    }

    format!("\x1b[{code}m{text}\x1b[0m")
}

// Level tags printed ahead of stderr diagnostics.

pub fn ok() -> String {
    style("32", "ok")
}

pub fn warn() -> String {
    style("33", "warn")
}

pub fn error() -> String {
    style("31", "error")
}

/// Highlights a path, URL, or build number inside a message.
pub fn highlight(text: &str) -> String {
    style("96", text)
}
