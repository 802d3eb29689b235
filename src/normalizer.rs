// ============================================================================
// File: scriptpad/src/normalizer.rs
// ----------------------------------------------------------------------------
// Final clean-up of captured output before it is shown to the user.
// ============================================================================

use std::sync::LazyLock;

use regex::Regex;

/// ANSI / VT escape sequences: CSI and OSC forms, introduced by ESC or the
/// 8-bit CSI byte.
static ANSI_ESCAPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"[\x1b\x{9b}][\[\]()#;?]*(?:(?:(?:(?:;[-a-zA-Z\d/#&.:=?%@~_]+)*|[a-zA-Z\d]+(?:;[-a-zA-Z\d/#&.:=?%@~_]*)*)?\x07)|(?:(?:\d{1,4}(?:;\d{0,4})*)?[\dA-PR-TZcf-nq-uy=><~]))",
    )
    .expect("ANSI escape pattern is valid")
});

/// Normalize raw interpreter output
///
/// Removes escape sequences unless `preserve_color` is set, then trims the
/// trailing run of line terminators.
pub fn normalize(raw: &str, preserve_color: bool) -> String {
    if preserve_color {
        trim_trailing_newlines(raw).to_owned()
    } else {
        let plain = strip_ansi(raw);
        trim_trailing_newlines(&plain).to_owned()
    }
}

/// Remove every ANSI escape sequence
pub fn strip_ansi(text: &str) -> String {
    ANSI_ESCAPE.replace_all(text, "").into_owned()
}

fn trim_trailing_newlines(text: &str) -> &str {
    text.trim_end_matches(['\n', '\r'])
}
