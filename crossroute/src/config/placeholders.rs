//! `{{name}}` placeholder substitution applied before configuration parsing.

use crate::config::ConfigurationError;
use std::collections::HashMap;

/// Externally supplied source of placeholder values.
pub trait PropertySource: Send + Sync {
    fn get(&self, name: &str) -> Option<String>;
}

impl PropertySource for HashMap<String, String> {
    fn get(&self, name: &str) -> Option<String> {
        HashMap::get(self, name).cloned()
    }
}

/// Substitutes every `{{name}}` token from `source`.
///
/// An unresolved placeholder is a configuration failure, never a silent
/// empty string.
pub fn resolve_placeholders(
    input: &str,
    source: &dyn PropertySource,
) -> Result<String, ConfigurationError> {
    let mut resolved = String::with_capacity(input.len());
    let mut remainder = input;

    while let Some(open) = remainder.find("{{") {
        resolved.push_str(&remainder[..open]);
        let after_open = &remainder[open + 2..];
        let Some(close) = after_open.find("}}") else {
            // No closing token: the rest is literal text.
            resolved.push_str(&remainder[open..]);
            return Ok(resolved);
        };
        let name = after_open[..close].trim();
        match source.get(name) {
            Some(value) => resolved.push_str(&value),
            None => {
                return Err(ConfigurationError::UnresolvedPlaceholder(name.to_string()));
            }
        }
        remainder = &after_open[close + 2..];
    }

    resolved.push_str(remainder);
    Ok(resolved)
}
