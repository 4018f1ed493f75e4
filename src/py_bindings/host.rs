use pyo3::exceptions::{PyTypeError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::PyDict;

use crate::shell::SharedState;

/// Global that holds script-side shell data
pub const COMMANDING_GLOBAL: &str = "commanding";
/// Key inside `commanding` that maps command names to handlers
pub const COMMANDS_KEY: &str = "__commands";

/// Host functions exposed to configuration scripts
///
/// Bound methods of this object are installed as the `prompt` and `alias`
/// globals and as `commander.register`. Calls go straight into the shared
/// shell state on the calling thread.
#[pyclass(unsendable)]
pub struct HostBridge {
    state: SharedState,
    namespace: Py<PyDict>,
}

impl HostBridge {
    pub fn new(state: SharedState, namespace: Py<PyDict>) -> Self {
        Self { state, namespace }
    }
}

#[pymethods]
impl HostBridge {
    /// Set the prompt shown on the next read
    fn prompt(&self, value: String) {
        self.state.borrow_mut().prompt = value;
    }

    /// Replace the leading token `trigger` with `expansion`
    fn alias(&self, trigger: String, expansion: String) {
        self.state.borrow_mut().aliases.set(trigger, expansion);
    }

    /// Register `handler` as a shell command called `name`
    ///
    /// The handler is kept in `commanding["__commands"]`; the host only
    /// records that the name exists.
    fn register(&self, py: Python<'_>, name: String, handler: Bound<'_, PyAny>) -> PyResult<()> {
        if name.is_empty() {
            return Err(PyValueError::new_err("command name must not be empty"));
        }
        if !handler.is_callable() {
            return Err(PyTypeError::new_err(format!(
                "handler for command '{}' is not callable",
                name
            )));
        }

        self.state.borrow_mut().commands.register(name.as_str());
        command_handlers(self.namespace.bind(py))?.set_item(name, handler)
    }
}

/// Get the handler table inside the namespace, recreating it if a script removed it
pub fn command_handlers<'py>(namespace: &Bound<'py, PyDict>) -> PyResult<Bound<'py, PyDict>> {
    let commanding = match namespace.get_item(COMMANDING_GLOBAL)? {
        Some(existing) => match existing.cast::<PyDict>() {
            Ok(dict) => dict.clone(),
            Err(_) => fresh_dict(namespace, COMMANDING_GLOBAL)?,
        },
        None => fresh_dict(namespace, COMMANDING_GLOBAL)?,
    };

    match commanding.get_item(COMMANDS_KEY)? {
        Some(existing) => match existing.cast::<PyDict>() {
            Ok(dict) => Ok(dict.clone()),
            Err(_) => fresh_dict(&commanding, COMMANDS_KEY),
        },
        None => fresh_dict(&commanding, COMMANDS_KEY),
    }
}

fn fresh_dict<'py>(parent: &Bound<'py, PyDict>, key: &str) -> PyResult<Bound<'py, PyDict>> {
    let dict = PyDict::new(parent.py());
    parent.set_item(key, &dict)?;
    Ok(dict)
}
