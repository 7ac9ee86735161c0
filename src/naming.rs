//! snake_case ⇄ camelCase equivalence for field lookup.
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde_json::{Map, Value};

use crate::value::is_falsy;

static UPPER: Lazy<Regex> = Lazy::new(|| Regex::new(r"[A-Z]").expect("static regex"));

/// `userName` → `user_name`. Every ASCII uppercase letter except a leading one starts a new word.
pub fn camel_to_snake(s: &str) -> String {
    UPPER
        .replace_all(s, |caps: &Captures| {
            let m = &caps[0];
            let start = caps.get(0).map_or(0, |g| g.start());
            if start == 0 { m.to_string() } else { format!("_{m}") }
        })
        .to_lowercase()
}

/// `user_name` → `userName`. The first word is kept as is.
pub fn snake_to_camel(s: &str) -> String {
    let mut words = s.split('_');
    let mut out = words.next().unwrap_or_default().to_string();
    for word in words {
        out.push_str(&title(word));
    }
    out
}

/// `user_name` → `UserName`.
pub fn snake_to_title(s: &str) -> String {
    s.split('_').map(title).collect()
}

// First char upper, rest lower.
fn title(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// Find the raw value for declared field `name`.
///
/// Tries the exact key, then the snake_case spelling, then the camelCase one.
/// A falsy hit (`0`, `""`, `false`, `null`, empty containers) counts as a miss.
pub fn lookup<'a>(obj: &'a Map<String, Value>, name: &str) -> Option<&'a Value> {
    let truthy = |key: &str| obj.get(key).filter(|v| !is_falsy(v));
    truthy(name)
        .or_else(|| truthy(&camel_to_snake(name)))
        .or_else(|| truthy(&snake_to_camel(name)))
}
