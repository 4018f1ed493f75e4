use std::path::PathBuf;

/// The user's home directory
///
/// HOME is either inherited from the parent, or retrieved from the user
/// database. An empty value counts as unset.
pub fn home_dir() -> Option<PathBuf> {
    match home::home_dir() {
        Some(path) if !path.as_os_str().is_empty() => Some(path),
        _ => None,
    }
}

/// Advertise this process as the active command shell through `SHELL`
///
/// Must run during startup, before any other thread is spawned.
pub fn mark_active_shell() {
    let shell = std::env::current_exe()
        .ok()
        .map(|path| path.to_string_lossy().into_owned())
        .or_else(|| std::env::args().next())
        .unwrap_or_else(|| env!("CARGO_PKG_NAME").to_string());

    // SAFETY: called from main before the signal listener or any other
    // thread exists, so nothing can read the environment concurrently.
    unsafe {
        std::env::set_var("SHELL", shell);
    }
}
