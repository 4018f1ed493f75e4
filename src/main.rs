mod config;
mod dispatch;
mod py_bindings;
mod repl;
mod script;
mod shell;
mod signals;

use anyhow::{Context, Result};
use clap::Parser;
use pyo3::prelude::*;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use config::ConfigPaths;
use dispatch::Dispatcher;
use py_bindings::PyEngine;
use repl::ReedlineReader;
use shell::{SystemRunner, Tokenizer};

/// A command shell configured in Python
#[derive(Debug, Parser)]
#[command(name = "gil", version, about)]
struct Cli {
    /// Load this file instead of ~/.gilrc.py
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Environment changes happen before any other thread exists
    shell::env::mark_active_shell();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let home = shell::env::home_dir();
    let paths = ConfigPaths::new(home.as_deref(), cli.config);
    if let Err(err) = config::seed_user_config(&paths) {
        tracing::warn!(error = %err, "could not create user configuration");
    }

    signals::spawn_listener().context("failed to install signal listener")?;

    Python::initialize();

    let state = shell::new_shared_state();
    let mut engine = PyEngine::new(state.clone(), &paths.lib_dirs)
        .context("failed to start the script engine")?;
    config::load_configuration(&mut engine, &paths)?;

    {
        let state = state.borrow();
        tracing::debug!(
            commands = ?state.commands.names().collect::<Vec<_>>(),
            aliases = ?state.aliases.triggers().collect::<Vec<_>>(),
            "configuration loaded"
        );
    }

    let home_str = home
        .map(|path| path.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mut dispatcher = Dispatcher::new(engine, SystemRunner, state, Tokenizer::new(home_str));
    let mut input = ReedlineReader::new(paths.history);

    dispatcher.run(&mut input).context("line editor failed")?;
    println!();

    Ok(())
}
