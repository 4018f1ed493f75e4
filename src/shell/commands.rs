use std::collections::HashSet;

/// Names of commands registered from scripts
///
/// Only presence is tracked here. The handler itself stays inside the script
/// runtime's namespace and is looked up by name when the command runs.
#[derive(Debug, Default, Clone)]
pub struct CommandTable {
    names: HashSet<String>,
}

impl CommandTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a command as present. Re-registering a name is a no-op here.
    pub fn register(&mut self, name: impl Into<String>) {
        let name = name.into();
        tracing::debug!(command = %name, "registered script command");
        self.names.insert(name);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}
