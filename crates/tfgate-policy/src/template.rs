//! Finding message templates
//!
//! Templates name values in braces, e.g. `"Deletion of {address}"`.
//! Unknown or unset placeholders are left in place.

use std::collections::BTreeMap;

/// Values available to a message template.
#[derive(Debug, Clone, Default)]
pub struct MessageVars {
    values: BTreeMap<&'static str, String>,
}

impl MessageVars {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, name: &'static str, value: impl ToString) -> Self {
        self.values.insert(name, value.to_string());
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// Substitute every `{name}` in `template`.
    pub fn render(&self, template: &str) -> String {
        let mut out = String::with_capacity(template.len());
        let mut rest = template;
        while let Some(open) = rest.find('{') {
            out.push_str(&rest[..open]);
            let tail = &rest[open..];
            match tail.find('}') {
                Some(close) => {
                    let name = &tail[1..close];
                    match self.get(name) {
                        Some(value) => out.push_str(value),
                        None => out.push_str(&tail[..=close]),
                    }
                    rest = &tail[close + 1..];
                }
                None => {
                    out.push_str(tail);
                    rest = "";
                }
            }
        }
        out.push_str(rest);
        out
    }
}
