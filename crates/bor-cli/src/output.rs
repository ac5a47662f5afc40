use std::io::{self, Write};
use std::sync::OnceLock;

use serde::Serialize;

static JSON_MODE: OnceLock<bool> = OnceLock::new();

pub fn init(json: bool) {
    let _ = JSON_MODE.set(json);
}

pub fn is_json() -> bool {
    JSON_MODE.get().copied().unwrap_or(false)
}

/// Print `value` as pretty JSON in JSON mode, or `text` otherwise.
pub fn print<T: Serialize>(value: &T, text: impl FnOnce() -> String) -> anyhow::Result<()> {
    if is_json() {
        let s = serde_json::to_string_pretty(value)?;
        println!("{s}");
    } else {
        println!("{}", text());
    }
    Ok(())
}

#[derive(Debug, Serialize)]
struct ErrorOut<'a> {
    ok: bool,
    kind: &'a str,
    error: String,
}

/// Report a failed command: JSON on stdout in JSON mode, a line on stderr
/// otherwise.
pub fn error(kind: &str, err: &anyhow::Error) {
    if is_json() {
        let out = ErrorOut {
            ok: false,
            kind,
            error: format!("{err:#}"),
        };
        if let Ok(s) = serde_json::to_string_pretty(&out) {
            println!("{s}");
            return;
        }
    }
    let _ = writeln!(io::stderr(), "error: {err:#}");
}
