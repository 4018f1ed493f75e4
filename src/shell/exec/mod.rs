mod resolution;
mod types;

use nix::sys::wait::{WaitStatus, waitpid};
use nix::unistd::{ForkResult, Pid, execv, fork};
use std::ffi::CString;

pub use resolution::resolve_program_path;
pub use types::{ExecError, ProcessInvocation, ShellResult};

/// Runs external programs for the dispatcher
pub trait ProcessRunner {
    /// Run the invocation to completion with the shell's standard streams attached
    fn run(&mut self, invocation: &ProcessInvocation) -> Result<ShellResult, ExecError>;
}

/// Forks and execs real programs, waiting synchronously for each one
#[derive(Debug, Default)]
pub struct SystemRunner;

impl ProcessRunner for SystemRunner {
    fn run(&mut self, invocation: &ProcessInvocation) -> Result<ShellResult, ExecError> {
        let program = invocation.program.as_str();
        let path_var = std::env::var_os("PATH");
        let prog_path = resolve_program_path(program, path_var.as_deref())?;

        // Everything the child needs is allocated before forking
        let prog_cstr = CString::new(prog_path.to_string_lossy().as_ref())
            .map_err(|_| ExecError::InvalidArgument(program.to_string()))?;
        let argv = build_argv(invocation)?;

        match unsafe { fork() } {
            Ok(ForkResult::Parent { child }) => wait_for_child(program, child),
            Ok(ForkResult::Child) => {
                let Err(err) = execv(&prog_cstr, &argv);
                eprintln!("Failed to execute {}: {}", program, err);
                std::process::exit(127);
            }
            Err(source) => Err(ExecError::Fork {
                program: program.to_string(),
                source,
            }),
        }
    }
}

/// Build argv (first arg is the program name as given, not the full path)
fn build_argv(invocation: &ProcessInvocation) -> Result<Vec<CString>, ExecError> {
    std::iter::once(&invocation.program)
        .chain(&invocation.args)
        .map(|arg| {
            CString::new(arg.as_str())
                .map_err(|_| ExecError::InvalidArgument(invocation.program.clone()))
        })
        .collect()
}

/// Wait for a child and convert its status to ShellResult
fn wait_for_child(program: &str, child: Pid) -> Result<ShellResult, ExecError> {
    loop {
        match waitpid(child, None) {
            Ok(WaitStatus::Exited(_pid, exit_code)) => {
                return Ok(ShellResult {
                    exit_code: exit_code as u8,
                });
            }
            Ok(WaitStatus::Signaled(_pid, signal, _core_dump)) => {
                return Ok(ShellResult {
                    exit_code: 128u8.wrapping_add(signal as i32 as u8),
                });
            }
            // Stopped/continued children are still ours to wait on
            Ok(_) | Err(nix::Error::EINTR) => continue,
            Err(source) => {
                return Err(ExecError::Wait {
                    program: program.to_string(),
                    source,
                });
            }
        }
    }
}
