use std::ffi::OsStr;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use super::types::ExecError;

/// Directories searched when PATH is not set
const DEFAULT_PATH: &[&str] = &["/usr/local/bin", "/usr/bin", "/bin"];

/// Resolve a program name to its full path following POSIX command search rules
///
/// POSIX rules:
/// 1. If program contains '/', use it as a literal path (absolute or relative)
/// 2. Otherwise, search the PATH directories in order
/// 3. Return the first executable file found
pub fn resolve_program_path(program: &str, path_var: Option<&OsStr>) -> Result<PathBuf, ExecError> {
    if program.contains('/') {
        let path = PathBuf::from(program);
        if !path.exists() {
            return Err(ExecError::NoSuchFile(program.to_string()));
        }
        if !is_executable(&path) {
            return Err(ExecError::PermissionDenied(program.to_string()));
        }
        return Ok(path);
    }

    let dirs: Vec<PathBuf> = match path_var {
        Some(value) => std::env::split_paths(value).collect(),
        None => DEFAULT_PATH.iter().map(PathBuf::from).collect(),
    };

    dirs.iter()
        .filter(|dir| !dir.as_os_str().is_empty())
        .map(|dir| dir.join(program))
        .find(|candidate| candidate.is_file() && is_executable(candidate))
        .ok_or_else(|| ExecError::NotFound(program.to_string()))
}

/// Check if any execute bit is set
fn is_executable(path: &Path) -> bool {
    std::fs::metadata(path)
        .map(|metadata| metadata.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}
