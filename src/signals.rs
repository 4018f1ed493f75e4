use signal_hook::consts::{SIGINT, SIGTERM};
use signal_hook::iterator::Signals;
use std::io;
use std::thread;

/// Trap SIGINT and SIGTERM so they do not kill the shell
///
/// The listener only logs. A foreground child still receives the signal from
/// the terminal directly, and exec restores default handlers in children.
pub fn spawn_listener() -> io::Result<thread::JoinHandle<()>> {
    let mut signals = Signals::new([SIGINT, SIGTERM])?;
    thread::Builder::new()
        .name("signals".to_string())
        .spawn(move || {
            for signal in signals.forever() {
                tracing::debug!(signal, "trapped signal");
            }
        })
}
