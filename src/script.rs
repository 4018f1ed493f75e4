use std::ffi::NulError;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised by the embedded script engine
#[derive(Debug, Error)]
pub enum ScriptError {
    /// The line parsed but holds nothing the shell treats as a statement
    #[error("not a script statement")]
    NotStatement,
    #[error("{0}")]
    Runtime(String),
    #[error("script text contains a NUL byte")]
    Nul(#[from] NulError),
    #[error("no handler stored for command `{0}`")]
    MissingHandler(String),
    #[error("failed to read {}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },
}

/// The in-process interpreter that runs configuration and command handlers
///
/// Kept free of any particular language so the dispatcher can be driven by
/// a fake in tests.
pub trait ScriptEngine {
    /// Execute a line as script code; an error means "not script code"
    fn eval(&mut self, line: &str) -> Result<(), ScriptError>;

    /// Invoke the handler registered under `name` with `args` as one list value
    fn call_command(&mut self, name: &str, args: &[String]) -> Result<(), ScriptError>;

    /// Execute a whole script file
    fn load_file(&mut self, path: &Path) -> Result<(), ScriptError>;
}
