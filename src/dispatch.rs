//! Per-line command resolution.
//!
//! Each input line is tried, in order, as script code, an alias, a
//! registered script command, the `exit` builtin and finally an external
//! program. The first interpretation that applies wins.

use crossterm::style::Stylize;
use std::io::{self, IsTerminal, Write};
use thiserror::Error;

use crate::repl::{LineReader, ReadOutcome};
use crate::script::{ScriptEngine, ScriptError};
use crate::shell::alias;
use crate::shell::{ExecError, ProcessInvocation, ProcessRunner, SharedState, Tokenizer};

const EXIT_BUILTIN: &str = "exit";

/// Whether the loop keeps reading after a line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// How one input line was interpreted
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The script engine accepted the line
    Script,
    /// Nothing left after tokenizing
    Empty,
    /// Leading token rewritten by an alias, always run as a program
    Alias(ProcessInvocation),
    /// Handler registered from a script
    Command { name: String, args: Vec<String> },
    Exit,
    External(ProcessInvocation),
}

/// Recoverable per-line failures, reported and then skipped
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("{name}: {source}")]
    Command {
        name: String,
        #[source]
        source: ScriptError,
    },
    #[error(transparent)]
    Exec(#[from] ExecError),
}

/// The REPL dispatcher
///
/// Owns the script engine and process runner and shares the alias, command
/// and prompt state with the script bridge.
pub struct Dispatcher<E, R> {
    engine: E,
    runner: R,
    state: SharedState,
    tokenizer: Tokenizer,
    errors: Box<dyn Write>,
    color: bool,
}

impl<E: ScriptEngine, R: ProcessRunner> Dispatcher<E, R> {
    pub fn new(engine: E, runner: R, state: SharedState, tokenizer: Tokenizer) -> Self {
        Self {
            engine,
            runner,
            state,
            tokenizer,
            errors: Box::new(io::stderr()),
            color: io::stderr().is_terminal(),
        }
    }

    /// Send error reports somewhere other than stderr, unstyled
    #[cfg(test)]
    pub fn with_error_stream(mut self, errors: Box<dyn Write>) -> Self {
        self.errors = errors;
        self.color = false;
        self
    }

    /// Read and dispatch lines until end of input or `exit`
    ///
    /// Only a failing line editor ends the loop with an error.
    pub fn run(&mut self, input: &mut dyn LineReader) -> io::Result<()> {
        loop {
            let prompt = self.state.borrow().prompt.clone();
            let line = match input.read_line(&prompt)? {
                ReadOutcome::Line(line) => line,
                ReadOutcome::Interrupted => continue,
                ReadOutcome::Eof => {
                    tracing::debug!("end of input");
                    return Ok(());
                }
            };

            match self.dispatch_line(&line) {
                Ok(Flow::Continue) => {}
                Ok(Flow::Exit) => return Ok(()),
                Err(err) => self.report(&err),
            }
        }
    }

    /// Resolve and execute a single line
    pub fn dispatch_line(&mut self, line: &str) -> Result<Flow, DispatchError> {
        let resolution = self.resolve(line);
        tracing::debug!(?resolution, "resolved input line");
        self.execute(resolution)
    }

    /// Work out what a line means, running it as script code if it is one
    pub fn resolve(&mut self, line: &str) -> Resolution {
        // A script error only means the line is not script code
        match self.engine.eval(line) {
            Ok(()) => return Resolution::Script,
            Err(err) => tracing::debug!(error = %err, "not script code"),
        }

        let Some(invocation) = ProcessInvocation::from_argv(self.tokenizer.tokenize(line)) else {
            return Resolution::Empty;
        };

        let expansion = self
            .state
            .borrow()
            .aliases
            .lookup(&invocation.program)
            .map(str::to_owned);
        if let Some(expansion) = expansion {
            let rewritten = alias::substitute(line, &expansion);
            return ProcessInvocation::from_argv(self.tokenizer.tokenize(&rewritten))
                .map_or(Resolution::Empty, Resolution::Alias);
        }

        if self.state.borrow().commands.contains(&invocation.program) {
            return Resolution::Command {
                name: invocation.program,
                args: invocation.args,
            };
        }

        if invocation.program == EXIT_BUILTIN {
            return Resolution::Exit;
        }

        Resolution::External(invocation)
    }

    fn execute(&mut self, resolution: Resolution) -> Result<Flow, DispatchError> {
        match resolution {
            Resolution::Script | Resolution::Empty => {}
            Resolution::Alias(invocation) | Resolution::External(invocation) => {
                let result = self.runner.run(&invocation)?;
                if !result.success() {
                    tracing::debug!(
                        program = %invocation.program,
                        exit_code = result.exit_code,
                        "program exited unsuccessfully"
                    );
                }
            }
            Resolution::Command { name, args } => {
                self.engine
                    .call_command(&name, &args)
                    .map_err(|source| DispatchError::Command { name, source })?;
            }
            Resolution::Exit => return Ok(Flow::Exit),
        }

        Ok(Flow::Continue)
    }

    fn report(&mut self, err: &DispatchError) {
        let message = format!("{}: {}", env!("CARGO_PKG_NAME"), err);
        let written = if self.color {
            writeln!(self.errors, "{}", message.as_str().red())
        } else {
            writeln!(self.errors, "{}", message)
        };

        if let Err(write_err) = written {
            tracing::warn!(error = %write_err, "failed to report error: {}", err);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shell::exec::ShellResult;
    use crate::shell::{ShellState, new_shared_state};
    use rstest::rstest;
    use std::cell::RefCell;
    use std::collections::{HashMap, HashSet, VecDeque};
    use std::rc::Rc;

    type Handler = Box<dyn FnMut(&[String]) -> Result<(), ScriptError>>;
    type Script = Box<dyn Fn(&mut ShellState)>;

    /// Engine that accepts a fixed set of lines and keeps handlers in a map
    struct FakeEngine {
        state: SharedState,
        scripts: HashMap<String, Script>,
        handlers: HashMap<String, Handler>,
        calls: Vec<String>,
    }

    impl FakeEngine {
        fn register(&mut self, name: &str, handler: Handler) {
            self.state.borrow_mut().commands.register(name);
            self.handlers.insert(name.to_string(), handler);
        }

        fn script(&mut self, line: &str, effect: Script) {
            self.scripts.insert(line.to_string(), effect);
        }
    }

    impl ScriptEngine for FakeEngine {
        fn eval(&mut self, line: &str) -> Result<(), ScriptError> {
            let effect = self.scripts.get(line).ok_or(ScriptError::NotStatement)?;
            effect(&mut self.state.borrow_mut());
            Ok(())
        }

        fn call_command(&mut self, name: &str, args: &[String]) -> Result<(), ScriptError> {
            self.calls.push(name.to_string());
            let handler = self
                .handlers
                .get_mut(name)
                .ok_or_else(|| ScriptError::MissingHandler(name.to_string()))?;
            handler(args)
        }

        fn load_file(&mut self, _path: &std::path::Path) -> Result<(), ScriptError> {
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingRunner {
        spawned: Vec<ProcessInvocation>,
        missing: HashSet<String>,
    }

    impl ProcessRunner for RecordingRunner {
        fn run(&mut self, invocation: &ProcessInvocation) -> Result<ShellResult, ExecError> {
            if self.missing.contains(&invocation.program) {
                return Err(ExecError::NotFound(invocation.program.clone()));
            }
            self.spawned.push(invocation.clone());
            Ok(ShellResult { exit_code: 0 })
        }
    }

    struct ScriptedInput {
        lines: VecDeque<ReadOutcome>,
        prompts: Vec<String>,
    }

    impl ScriptedInput {
        fn new(lines: Vec<ReadOutcome>) -> Self {
            Self {
                lines: lines.into(),
                prompts: Vec::new(),
            }
        }
    }

    impl LineReader for ScriptedInput {
        fn read_line(&mut self, prompt: &str) -> io::Result<ReadOutcome> {
            self.prompts.push(prompt.to_string());
            Ok(self.lines.pop_front().unwrap_or(ReadOutcome::Eof))
        }
    }

    #[derive(Clone, Default)]
    struct SharedBuf(Rc<RefCell<Vec<u8>>>);

    impl SharedBuf {
        fn contents(&self) -> String {
            String::from_utf8(self.0.borrow().clone()).unwrap()
        }
    }

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.borrow_mut().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn dispatcher() -> (Dispatcher<FakeEngine, RecordingRunner>, SharedBuf) {
        let state = new_shared_state();
        let engine = FakeEngine {
            state: state.clone(),
            scripts: HashMap::new(),
            handlers: HashMap::new(),
            calls: Vec::new(),
        };
        let errors = SharedBuf::default();
        let dispatcher = Dispatcher::new(
            engine,
            RecordingRunner::default(),
            state,
            Tokenizer::new("/home/u"),
        )
        .with_error_stream(Box::new(errors.clone()));
        (dispatcher, errors)
    }

    fn external(program: &str, args: &[&str]) -> ProcessInvocation {
        ProcessInvocation {
            program: program.to_string(),
            args: args.iter().map(|arg| arg.to_string()).collect(),
        }
    }

    fn strings(args: &[&str]) -> Vec<String> {
        args.iter().map(|arg| arg.to_string()).collect()
    }

    #[test]
    fn end_of_input_exits_cleanly() {
        let (mut dispatcher, errors) = dispatcher();
        let mut input = ScriptedInput::new(Vec::new());

        dispatcher.run(&mut input).unwrap();

        assert_eq!(input.prompts.len(), 1);
        assert!(errors.contents().is_empty());
    }

    #[test]
    fn script_code_takes_priority() {
        let (mut dispatcher, _errors) = dispatcher();
        dispatcher.engine.script("ls", Box::new(|_| {}));
        dispatcher.state.borrow_mut().aliases.set("ls", "ls --color");

        assert_eq!(dispatcher.resolve("ls"), Resolution::Script);
        dispatcher.dispatch_line("ls").unwrap();
        assert!(dispatcher.runner.spawned.is_empty());
    }

    #[rstest]
    #[case("")]
    #[case("    ")]
    #[case("\"\"")]
    fn blank_lines_do_nothing(#[case] line: &str) {
        let (mut dispatcher, errors) = dispatcher();

        assert_eq!(dispatcher.dispatch_line(line).unwrap(), Flow::Continue);
        assert!(dispatcher.runner.spawned.is_empty());
        assert!(errors.contents().is_empty());
    }

    #[test]
    fn alias_rewrites_to_external_program() {
        let (mut dispatcher, _errors) = dispatcher();
        dispatcher.state.borrow_mut().aliases.set("ll", "ls -la");

        dispatcher.dispatch_line("ll /tmp").unwrap();

        assert_eq!(dispatcher.runner.spawned, vec![external("ls", &["-la", "/tmp"])]);
    }

    #[test]
    fn alias_shadows_registered_command() {
        let (mut dispatcher, _errors) = dispatcher();
        dispatcher.state.borrow_mut().aliases.set("ll", "ls -la");
        dispatcher.engine.register("ll", Box::new(|_| Ok(())));

        dispatcher.dispatch_line("ll").unwrap();

        assert!(dispatcher.engine.calls.is_empty());
        assert_eq!(dispatcher.runner.spawned, vec![external("ls", &["-la"])]);
    }

    #[rstest]
    #[case("greet")]
    #[case("exit")]
    fn alias_expansion_is_not_resolved_again(#[case] target: &str) {
        let (mut dispatcher, _errors) = dispatcher();
        dispatcher.engine.register("greet", Box::new(|_| Ok(())));
        dispatcher.state.borrow_mut().aliases.set("g", format!("{} now", target));

        let flow = dispatcher.dispatch_line("g ~/x").unwrap();

        assert_eq!(flow, Flow::Continue);
        assert!(dispatcher.engine.calls.is_empty());
        assert_eq!(
            dispatcher.runner.spawned,
            vec![external(target, &["now", "/home/u/x"])]
        );
    }

    #[test]
    fn registered_command_runs_once_and_survives_other_failures() {
        let (mut dispatcher, errors) = dispatcher();
        let output = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&output);
        dispatcher.engine.register(
            "greet",
            Box::new(move |args| {
                sink.borrow_mut().push(format!("hello {}", args.join(" ")));
                Ok(())
            }),
        );
        dispatcher.engine.register(
            "boom",
            Box::new(|_| Err(ScriptError::Runtime("RuntimeError: kaboom".to_string()))),
        );

        let mut input = ScriptedInput::new(vec![
            ReadOutcome::Line("greet world".to_string()),
            ReadOutcome::Line("boom".to_string()),
            ReadOutcome::Line("greet again".to_string()),
        ]);
        dispatcher.run(&mut input).unwrap();

        assert_eq!(*output.borrow(), strings(&["hello world", "hello again"]));
        assert!(errors.contents().contains("boom: RuntimeError: kaboom"));
        assert!(dispatcher.state.borrow().commands.contains("greet"));
        assert!(dispatcher.runner.spawned.is_empty());
    }

    #[test]
    fn registered_command_gets_remaining_tokens() {
        let (mut dispatcher, _errors) = dispatcher();
        dispatcher.engine.register("greet", Box::new(|_| Ok(())));

        assert_eq!(
            dispatcher.resolve("greet \"big world\" ~"),
            Resolution::Command {
                name: "greet".to_string(),
                args: strings(&["big world", "/home/u"]),
            }
        );
    }

    #[test]
    fn command_failure_is_reported_not_fatal() {
        let (mut dispatcher, _errors) = dispatcher();
        dispatcher.engine.register(
            "boom",
            Box::new(|_| Err(ScriptError::Runtime("ValueError: bad".to_string()))),
        );

        let err = dispatcher.dispatch_line("boom").unwrap_err();

        assert!(matches!(err, DispatchError::Command { ref name, .. } if name == "boom"));
    }

    #[test]
    fn exit_builtin_stops_the_loop() {
        let (mut dispatcher, errors) = dispatcher();
        let mut input = ScriptedInput::new(vec![
            ReadOutcome::Line("exit".to_string()),
            ReadOutcome::Line("echo unreachable".to_string()),
        ]);

        dispatcher.run(&mut input).unwrap();

        assert_eq!(input.prompts.len(), 1);
        assert!(dispatcher.runner.spawned.is_empty());
        assert!(errors.contents().is_empty());
    }

    #[test]
    fn registered_exit_shadows_builtin() {
        let (mut dispatcher, _errors) = dispatcher();
        dispatcher.engine.register("exit", Box::new(|_| Ok(())));

        assert_eq!(dispatcher.dispatch_line("exit").unwrap(), Flow::Continue);
        assert_eq!(dispatcher.engine.calls, vec!["exit"]);
    }

    #[test]
    fn unknown_names_run_as_programs() {
        let (mut dispatcher, _errors) = dispatcher();

        dispatcher.dispatch_line("echo hi \"there you\"").unwrap();

        assert_eq!(
            dispatcher.runner.spawned,
            vec![external("echo", &["hi", "there you"])]
        );
    }

    #[test]
    fn launch_failures_are_reported_and_loop_continues() {
        let (mut dispatcher, errors) = dispatcher();
        dispatcher.runner.missing.insert("nope".to_string());
        let mut input = ScriptedInput::new(vec![
            ReadOutcome::Line("nope --flag".to_string()),
            ReadOutcome::Interrupted,
            ReadOutcome::Line("true".to_string()),
        ]);

        dispatcher.run(&mut input).unwrap();

        assert_eq!(errors.contents(), "gil: nope: command not found\n");
        assert_eq!(dispatcher.runner.spawned, vec![external("true", &[])]);
        assert_eq!(input.prompts.len(), 4);
    }

    #[test]
    fn prompt_changes_apply_to_next_read() {
        let (mut dispatcher, _errors) = dispatcher();
        dispatcher.engine.script(
            "prompt('$ ')",
            Box::new(|state| state.prompt = "$ ".to_string()),
        );
        let mut input = ScriptedInput::new(vec![ReadOutcome::Line("prompt('$ ')".to_string())]);

        dispatcher.run(&mut input).unwrap();

        assert_eq!(input.prompts, strings(&["gil> ", "$ "]));
    }
}
