//! Script runtime management
//!
//! Provides a JavaScript runtime whose output functions are routed through a
//! shared [`OutputHandle`].

use crate::error::ScriptError;
use crate::io::{install, SharedHandle};
use herald_core::{Bindings, Emitter, OutputHandle};
use rquickjs::convert::Coerced;
use rquickjs::{Context, Ctx, Function, Runtime, Value};
use std::borrow::Cow;
use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

/// Output captured during one execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedOutput {
    pub bytes: Vec<u8>,
    /// The buffer filled up; later output was truncated or went to the channel.
    pub exhausted: bool,
}

impl CapturedOutput {
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.bytes)
    }
}

/// Script execution context
pub struct ScriptRuntime {
    #[allow(dead_code)] // Kept alive for context lifetime
    runtime: Runtime,
    context: Context,
    output: SharedHandle,
    bindings: Bindings,
}

impl ScriptRuntime {
    pub fn new(emitter: Box<dyn Emitter>, bindings: Bindings) -> Result<Self, ScriptError> {
        Self::with_handle(OutputHandle::from_boxed(emitter), bindings)
    }

    pub fn with_handle(handle: OutputHandle, bindings: Bindings) -> Result<Self, ScriptError> {
        let runtime = Runtime::new().map_err(engine)?;
        let context = Context::full(&runtime).map_err(engine)?;

        let script = Self {
            runtime,
            context,
            output: Rc::new(RefCell::new(handle)),
            bindings,
        };
        script.install_output()?;
        Ok(script)
    }

    /// (Re)install the output functions, e.g. after a script replaced them.
    pub fn install_output(&self) -> Result<(), ScriptError> {
        self.context
            .with(|ctx| install(&ctx, &self.output, &self.bindings))?;
        Ok(())
    }

    pub fn output(&self) -> &SharedHandle {
        &self.output
    }

    pub fn bindings(&self) -> &Bindings {
        &self.bindings
    }

    pub fn execute_file(&self, path: &Path) -> Result<(), ScriptError> {
        let source = std::fs::read_to_string(path).map_err(|source| ScriptError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        self.execute(&source)
    }

    pub fn execute(&self, source: &str) -> Result<(), ScriptError> {
        self.context.with(|ctx| {
            ctx.eval::<(), _>(source)
                .map_err(|err| caught(&ctx, err))
        })
    }

    /// Call a JavaScript function by name with no arguments.
    pub fn call_function(&self, name: &str) -> Result<(), ScriptError> {
        self.context.with(|ctx| {
            let func: Function = ctx.globals().get(name).map_err(|err| caught(&ctx, err))?;
            func.call::<_, ()>(()).map_err(|err| caught(&ctx, err))
        })
    }

    /// Redirect guest output into a fresh buffer of `capacity` bytes.
    pub fn configure_capture(&self, capacity: usize) -> Result<(), ScriptError> {
        self.output
            .try_borrow_mut()
            .map_err(|_| ScriptError::HandleBusy)?
            .configure_capture(capacity);
        Ok(())
    }

    /// Stop capturing and return the captured bytes, if a buffer was set.
    pub fn release_capture(&self) -> Result<Option<Vec<u8>>, ScriptError> {
        Ok(self
            .output
            .try_borrow_mut()
            .map_err(|_| ScriptError::HandleBusy)?
            .release_capture())
    }

    /// Run `source` with its output captured into a buffer of `capacity`
    /// bytes. The buffer is released even when the script throws.
    pub fn execute_captured(
        &self,
        source: &str,
        capacity: usize,
    ) -> Result<CapturedOutput, ScriptError> {
        self.configure_capture(capacity)?;
        let result = self.execute(source);

        let exhausted = self
            .output
            .try_borrow()
            .map_err(|_| ScriptError::HandleBusy)?
            .capture()
            .is_exhausted();
        let bytes = self.release_capture()?.unwrap_or_default();
        result?;

        if exhausted {
            tracing::debug!(capacity, "capture buffer exhausted during execution");
        }
        Ok(CapturedOutput { bytes, exhausted })
    }
}

fn engine(err: rquickjs::Error) -> ScriptError {
    ScriptError::Engine(err.to_string())
}

/// Convert an engine error, pulling the pending exception's message if any.
fn caught(ctx: &Ctx<'_>, err: rquickjs::Error) -> ScriptError {
    if !matches!(err, rquickjs::Error::Exception) {
        return engine(err);
    }
    let value: Value = ctx.catch();
    let message = value
        .as_object()
        .and_then(|object| object.get::<_, Option<String>>("message").ok().flatten())
        .or_else(|| value.get::<Coerced<String>>().ok().map(|text| text.0))
        .unwrap_or_else(|| "unknown exception".to_string());
    ScriptError::Exception { message }
}
