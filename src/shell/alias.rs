use std::collections::HashMap;

use super::tokenize::strip_leading_token;

/// Leading-token text substitutions installed by configuration scripts
#[derive(Debug, Default, Clone)]
pub struct AliasTable {
    entries: HashMap<String, String>,
}

impl AliasTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an alias, replacing any previous expansion for the trigger
    pub fn set(&mut self, trigger: impl Into<String>, expansion: impl Into<String>) {
        self.entries.insert(trigger.into(), expansion.into());
    }

    pub fn lookup(&self, trigger: &str) -> Option<&str> {
        self.entries.get(trigger).map(String::as_str)
    }

    pub fn triggers(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

/// Rewrite a raw line by swapping its first token for `expansion`
///
/// Substitution is single-level: the result is not looked up again.
pub fn substitute(line: &str, expansion: &str) -> String {
    let mut rewritten = String::with_capacity(expansion.len() + line.len());
    rewritten.push_str(expansion);
    rewritten.push_str(strip_leading_token(line));
    rewritten
}
