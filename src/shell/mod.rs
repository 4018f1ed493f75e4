pub mod alias;
pub mod commands;
pub mod env;
pub mod exec;
pub mod tokenize;

use std::cell::RefCell;
use std::rc::Rc;

pub use alias::AliasTable;
pub use commands::CommandTable;
pub use exec::{ExecError, ProcessInvocation, ProcessRunner, SystemRunner};
pub use tokenize::Tokenizer;

pub const DEFAULT_PROMPT: &str = "gil> ";

/// Mutable shell state that configuration scripts can change
#[derive(Debug, Clone)]
pub struct ShellState {
    pub prompt: String,
    pub aliases: AliasTable,
    pub commands: CommandTable,
}

impl Default for ShellState {
    fn default() -> Self {
        Self {
            prompt: DEFAULT_PROMPT.to_string(),
            aliases: AliasTable::new(),
            commands: CommandTable::new(),
        }
    }
}

/// Shell state shared between the dispatcher and the script bridge
///
/// Everything runs on the REPL thread, so a `RefCell` is enough. Borrows must
/// never be held across a script or process call.
pub type SharedState = Rc<RefCell<ShellState>>;

pub fn new_shared_state() -> SharedState {
    Rc::new(RefCell::new(ShellState::default()))
}
