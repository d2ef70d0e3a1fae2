use regex::Regex;
use std::sync::LazyLock;

// Four shapes, matched as one alternation: CSI sequences, OSC sequences
// (terminated by BEL), escape-less color remnants like `[0m`, and the
// host's inline annotation markers like `[8mha0]`. The two escape-less
// patterns are heuristic and can strip legitimate bracketed text shaped
// the same way; they are kept as-is for compatibility with existing
// collected logs.
static CONTROL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\x1b\[[;0-9]*[A-Za-z]|\x1b\][0-9]*;[^\x07]*\x07|\[[0-9;]*m|\[[a-z0-9/=+]*\]")
        .expect("valid regex")
});

/// Removes terminal control sequences and host annotations from log text.
/// Every character outside a match is preserved verbatim and in order.
pub fn sanitize(text: &str) -> String {
    CONTROL_RE.replace_all(text, "").into_owned()
}
