pub mod host;

use pyo3::prelude::*;
use pyo3::types::{PyDict, PyList, PyModule, PyTracebackMethods};
use std::ffi::CString;
use std::path::{Path, PathBuf};

use crate::script::{ScriptEngine, ScriptError};
use crate::shell::SharedState;
use host::HostBridge;

/// Names removed from the script builtins so the shell's own `exit` runs
const SHADOWED_BUILTINS: &[&str] = &["exit", "quit"];

/// Embedded Python interpreter hosting the shell configuration
///
/// Every engine owns a private global namespace. The host functions
/// (`prompt`, `alias`, `commander.register`) and the `commanding` handler
/// table live inside it.
pub struct PyEngine {
    namespace: Py<PyDict>,
}

impl PyEngine {
    /// Build the script namespace and install the host functions
    ///
    /// `lib_dirs` are appended to `sys.path` so configuration scripts can
    /// import shared helpers.
    pub fn new(state: SharedState, lib_dirs: &[PathBuf]) -> Result<Self, ScriptError> {
        Python::attach(|py| {
            Self::build_namespace(py, state, lib_dirs)
                .map(|namespace| Self { namespace })
                .map_err(|err| script_error(py, err))
        })
    }

    fn build_namespace(
        py: Python<'_>,
        state: SharedState,
        lib_dirs: &[PathBuf],
    ) -> PyResult<Py<PyDict>> {
        let namespace = PyDict::new(py);
        namespace.set_item("__name__", "__main__")?;
        namespace.set_item("__builtins__", shell_builtins(py)?)?;

        let bridge = Bound::new(py, HostBridge::new(state, namespace.clone().unbind()))?;
        namespace.set_item("prompt", bridge.getattr("prompt")?)?;
        namespace.set_item("alias", bridge.getattr("alias")?)?;

        // commanding["__commands"] holds the registered handlers
        host::command_handlers(&namespace)?;

        let commander = PyModule::new(py, "commander")?;
        commander.add("register", bridge.getattr("register")?)?;
        py.import("sys")?
            .getattr("modules")?
            .set_item("commander", &commander)?;
        namespace.set_item("commander", &commander)?;

        let sys_path = py.import("sys")?.getattr("path")?;
        for dir in lib_dirs {
            let dir = dir.to_string_lossy();
            if !sys_path.contains(dir.as_ref())? {
                sys_path.call_method1("append", (dir.as_ref(),))?;
            }
        }

        Ok(namespace.unbind())
    }
}

impl ScriptEngine for PyEngine {
    fn eval(&mut self, line: &str) -> Result<(), ScriptError> {
        let code = CString::new(line)?;
        Python::attach(|py| {
            if !is_statement(py, line).map_err(|err| script_error(py, err))? {
                return Err(ScriptError::NotStatement);
            }
            py.run(code.as_c_str(), Some(self.namespace.bind(py)), None)
                .map_err(|err| script_error(py, err))
        })
    }

    fn call_command(&mut self, name: &str, args: &[String]) -> Result<(), ScriptError> {
        Python::attach(|py| {
            let handlers = host::command_handlers(self.namespace.bind(py))
                .map_err(|err| script_error(py, err))?;
            let handler = handlers
                .get_item(name)
                .map_err(|err| script_error(py, err))?
                .ok_or_else(|| ScriptError::MissingHandler(name.to_string()))?;

            let args = PyList::new(py, args).map_err(|err| script_error(py, err))?;
            // Return values are ignored
            handler
                .call1((args,))
                .map(drop)
                .map_err(|err| script_error(py, err))
        })
    }

    fn load_file(&mut self, path: &Path) -> Result<(), ScriptError> {
        let source = std::fs::read_to_string(path).map_err(|source| ScriptError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        Python::attach(|py| {
            let run = || -> PyResult<()> {
                let builtins = py.import("builtins")?;
                let filename = path.to_string_lossy();
                let code =
                    builtins.call_method1("compile", (source.as_str(), filename.as_ref(), "exec"))?;
                builtins.call_method1("exec", (code, self.namespace.bind(py)))?;
                Ok(())
            };
            run().map_err(|err| script_error(py, err))
        })
    }
}

/// Decide whether a line should run as Python at all
///
/// Python accepts a bare name such as `ls` or an expression such as
/// `ls -la` as a complete statement, which would swallow most shell input.
/// A line made only of non-call expressions is not treated as script code;
/// anything else that parses is.
fn is_statement(py: Python<'_>, line: &str) -> PyResult<bool> {
    let ast = py.import("ast")?;
    let tree = ast.call_method1("parse", (line,))?;
    let expr = ast.getattr("Expr")?;
    let call = ast.getattr("Call")?;

    let body = tree.getattr("body")?;
    if body.len()? == 0 {
        return Ok(true);
    }

    for stmt in body.try_iter()? {
        let stmt = stmt?;
        if !stmt.is_instance(&expr)? || stmt.getattr("value")?.is_instance(&call)? {
            return Ok(true);
        }
    }

    Ok(false)
}

/// Copy of the interpreter builtins without the interactive exit helpers
fn shell_builtins(py: Python<'_>) -> PyResult<Bound<'_, PyDict>> {
    let builtins = py.import("builtins")?.dict().copy()?;
    for name in SHADOWED_BUILTINS {
        if builtins.contains(*name)? {
            builtins.del_item(*name)?;
        }
    }
    Ok(builtins)
}

/// Flatten a Python exception, traceback included, into a ScriptError
fn script_error(py: Python<'_>, err: PyErr) -> ScriptError {
    let mut message = String::new();
    if let Some(traceback) = err.traceback(py)
        && let Ok(text) = traceback.format()
    {
        message.push_str(&text);
    }
    message.push_str(&err.to_string());
    ScriptError::Runtime(message.trim_end().to_string())
}
