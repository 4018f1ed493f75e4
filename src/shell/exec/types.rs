use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShellResult {
    pub exit_code: u8,
}

impl ShellResult {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// One external program run with the shell's own standard streams
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessInvocation {
    pub program: String,
    pub args: Vec<String>,
}

impl ProcessInvocation {
    /// Build an invocation from an argument vector, `None` if it is empty
    pub fn from_argv(argv: Vec<String>) -> Option<Self> {
        let mut argv = argv.into_iter();
        let program = argv.next()?;
        Some(Self {
            program,
            args: argv.collect(),
        })
    }
}

/// Errors that can occur while resolving, launching or waiting on a program
#[derive(Debug, Error)]
pub enum ExecError {
    /// Command not found in PATH
    #[error("{0}: command not found")]
    NotFound(String),
    /// File doesn't exist (for paths with '/')
    #[error("{0}: No such file or directory")]
    NoSuchFile(String),
    /// File exists but is not executable
    #[error("{0}: Permission denied")]
    PermissionDenied(String),
    #[error("{0}: argument contains a NUL byte")]
    InvalidArgument(String),
    #[error("{program}: fork failed: {source}")]
    Fork {
        program: String,
        source: nix::Error,
    },
    #[error("{program}: waitpid failed: {source}")]
    Wait {
        program: String,
        source: nix::Error,
    },
}
