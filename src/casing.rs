//! Attribute key casing
//!
//! Keys are normalized to underscore form first and then rendered in the
//! configured convention, so every convention is idempotent.

use crate::config::{FlattenConfig, KeyCase};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

// "HTMLParser" -> "HTML_Parser"
static ACRONYM_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"([A-Z]+)([A-Z][a-z])").unwrap()
});

// "firstName" -> "first_Name", "line2Total" -> "line2_Total"
static HUMP_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"([a-z\d])([A-Z])").unwrap()
});

static SEPARATOR_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[-_\s]+").unwrap()
});

/// Normalize a key to lowercase underscore form
pub fn underscore(key: &str) -> String {
    let key = ACRONYM_REGEX.replace_all(key, "${1}_${2}");
    let key = HUMP_REGEX.replace_all(&key, "${1}_${2}");
    let key = SEPARATOR_REGEX.replace_all(&key, "_");
    key.to_lowercase()
}

/// Render a key in camel form, keeping any leading underscores
pub fn camelize(key: &str, upper_first: bool) -> String {
    let underscored = underscore(key);
    let body = underscored.trim_start_matches('_');
    let prefix = &underscored[..underscored.len() - body.len()];

    // Rendered words can fuse when read back ("x_y_z" -> "xYZ" -> "x_yz"),
    // so settle on a word list that reads back as itself.
    let mut words = split_words(body);
    let mut rendered = render_camel(&words, upper_first);
    for _ in 0..MAX_SETTLE_PASSES {
        let reread = split_words(&underscore(&rendered));
        if reread == words {
            break;
        }
        words = reread;
        rendered = render_camel(&words, upper_first);
    }

    format!("{}{}", prefix, rendered)
}

const MAX_SETTLE_PASSES: usize = 8;

fn split_words(underscored: &str) -> Vec<String> {
    underscored
        .split('_')
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}

fn render_camel(words: &[String], upper_first: bool) -> String {
    words
        .iter()
        .enumerate()
        .map(|(idx, word)| {
            if idx == 0 && !upper_first {
                word.clone()
            } else {
                capitalize(word)
            }
        })
        .collect()
}

/// Render a key in dash form, keeping any leading underscores
pub fn dasherize(key: &str) -> String {
    let underscored = underscore(key);
    let body = underscored.trim_start_matches('_');
    let prefix = &underscored[..underscored.len() - body.len()];
    format!("{}{}", prefix, body.replace('_', "-"))
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

impl KeyCase {
    /// Apply this convention to a single key
    pub fn apply(self, key: &str) -> String {
        match self {
            KeyCase::Camel => camelize(key, false),
            KeyCase::Pascal => camelize(key, true),
            KeyCase::Kebab => dasherize(key),
            KeyCase::Snake => underscore(key),
        }
    }
}

/// Case-converts keys, recursing through nested objects and arrays
#[derive(Clone, Copy)]
pub struct KeyCaser<'a> {
    config: &'a FlattenConfig,
}

impl<'a> KeyCaser<'a> {
    pub fn new(config: &'a FlattenConfig) -> Self {
        KeyCaser { config }
    }

    /// Convert a single key, preferring the caller's function over the built-in convention
    pub fn key(&self, key: &str) -> String {
        match &self.config.key_for_attribute {
            Some(key_for_attribute) => key_for_attribute(key),
            None => self.config.key_case.apply(key),
        }
    }

    /// Convert every key of a mapping; nested objects and arrays are converted too,
    /// scalar values pass through untouched
    pub fn map(&self, map: &Map<String, Value>) -> Map<String, Value> {
        map.iter()
            .map(|(key, value)| (self.key(key), self.nested(value)))
            .collect()
    }

    /// Convert a value: objects and arrays recursively, a bare string as a key
    pub fn value(&self, value: &Value) -> Value {
        match value {
            Value::String(key) => Value::String(self.key(key)),
            other => self.nested(other),
        }
    }

    fn nested(&self, value: &Value) -> Value {
        match value {
            Value::Object(map) => Value::Object(self.map(map)),
            Value::Array(items) => Value::Array(items.iter().map(|item| self.nested(item)).collect()),
            scalar => scalar.clone(),
        }
    }
}
