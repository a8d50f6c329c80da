//! Output registrar
//!
//! Installs the emitters of an [`OutputHandle`] over the guest's built-in
//! output functions: `print`, `warn` and `error` as globals, `write` as a
//! member of the output namespace object.

use crate::args::JsArgs;
use crate::error::InstallError;
use herald_core::{Bindings, FormatError, OutputHandle, Severity, WriteOutcome};
use rquickjs::function::Rest;
use rquickjs::{Array, Ctx, Exception, Function, IntoJs, Object, Value};
use std::cell::{RefCell, RefMut};
use std::rc::Rc;

/// Output handle shared between the runtime and the installed functions.
pub type SharedHandle = Rc<RefCell<OutputHandle>>;

/// Replace the guest's output functions with the handle's emitters.
///
/// Safe to call again on the same context; it only rebinds the same names.
pub fn install<'js>(
    ctx: &Ctx<'js>,
    handle: &SharedHandle,
    bindings: &Bindings,
) -> Result<(), InstallError> {
    let globals = ctx.globals();
    let namespace = output_namespace(ctx, &globals, &bindings.output_namespace)?;
    let bindings = Rc::new(bindings.clone());

    globals.set("print", line_fn(ctx, handle, &bindings, Severity::Info)?)?;
    globals.set("warn", line_fn(ctx, handle, &bindings, Severity::Warning)?)?;
    globals.set("error", line_fn(ctx, handle, &bindings, Severity::Error)?)?;
    namespace.set("write", write_fn(ctx, handle, &bindings)?)?;

    tracing::debug!(
        kind = ?handle.borrow().kind(),
        namespace = %bindings.output_namespace,
        "output functions installed"
    );
    Ok(())
}

/// The output namespace object, created when the guest has none yet.
fn output_namespace<'js>(
    ctx: &Ctx<'js>,
    globals: &Object<'js>,
    name: &str,
) -> Result<Object<'js>, InstallError> {
    let existing: Value = globals.get(name)?;
    if existing.is_undefined() || existing.is_null() {
        let namespace = Object::new(ctx.clone())?;
        globals.set(name, namespace.clone())?;
        return Ok(namespace);
    }
    existing
        .into_object()
        .ok_or_else(|| InstallError::BindingUnavailable {
            name: name.to_string(),
        })
}

fn borrow_handle<'a>(
    ctx: &Ctx<'_>,
    handle: &'a SharedHandle,
) -> rquickjs::Result<RefMut<'a, OutputHandle>> {
    // A conversion hook that prints from inside a print lands here.
    handle
        .try_borrow_mut()
        .map_err(|_| Exception::throw_message(ctx, "output handle is busy"))
}

/// Current script location, if the guest has published a non-empty one.
fn read_trace(ctx: &Ctx<'_>, name: &str) -> Option<String> {
    let value: Value = ctx.globals().get(name).ok()?;
    let trace = value.as_string()?.to_string().ok()?;
    (!trace.is_empty()).then_some(trace)
}

fn line_fn<'js>(
    ctx: &Ctx<'js>,
    handle: &SharedHandle,
    bindings: &Rc<Bindings>,
    severity: Severity,
) -> rquickjs::Result<Function<'js>> {
    let handle = handle.clone();
    let bindings = bindings.clone();
    Function::new(
        ctx.clone(),
        move |ctx: Ctx<'js>, values: Rest<Value<'js>>| -> rquickjs::Result<()> {
            let args = JsArgs::new(&ctx, values.0, &bindings.conversion_hook);
            let result: Result<(), FormatError> = {
                let mut output = borrow_handle(&ctx, &handle)?;
                match severity {
                    Severity::Info => output.print(&args),
                    Severity::Warning => output.warn(&args),
                    Severity::Error => {
                        let trace = read_trace(&ctx, &bindings.trace_global);
                        output.error(&args, trace.as_deref())
                    }
                }
            };
            result.map_err(|err| args.into_error(err))
        },
    )
}

fn write_fn<'js>(
    ctx: &Ctx<'js>,
    handle: &SharedHandle,
    bindings: &Rc<Bindings>,
) -> rquickjs::Result<Function<'js>> {
    let handle = handle.clone();
    let bindings = bindings.clone();
    Function::new(
        ctx.clone(),
        move |ctx: Ctx<'js>, values: Rest<Value<'js>>| -> rquickjs::Result<Value<'js>> {
            let args = JsArgs::new(&ctx, values.0, &bindings.conversion_hook);
            let outcome = {
                let mut output = borrow_handle(&ctx, &handle)?;
                output.write(&args)
            };
            match outcome {
                Ok(WriteOutcome::Written) => Ok(Value::new_bool(ctx.clone(), true)),
                Ok(WriteOutcome::Failed(failure)) => {
                    // Mirrors the platform error state: [null, message, code].
                    let triple = Array::new(ctx.clone())?;
                    triple.set(0, Value::new_null(ctx.clone()))?;
                    triple.set(1, failure.message.as_str())?;
                    triple.set(2, failure.code)?;
                    triple.into_js(&ctx)
                }
                Err(err) => Err(args.into_error(err)),
            }
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use herald_core::{DescriptorChannel, EmbeddedStub, MemorySink};
    use rquickjs::{Context, Runtime};

    fn context() -> (Runtime, Context) {
        let runtime = Runtime::new().unwrap();
        let context = Context::full(&runtime).unwrap();
        (runtime, context)
    }

    #[test]
    fn test_install_is_idempotent() {
        let (_runtime, context) = context();
        let out = MemorySink::new();
        let handle: SharedHandle = Rc::new(RefCell::new(OutputHandle::new(
            DescriptorChannel::new(out.clone(), MemorySink::new()),
        )));
        context.with(|ctx| {
            install(&ctx, &handle, &Bindings::default()).unwrap();
            install(&ctx, &handle, &Bindings::default()).unwrap();
            ctx.eval::<(), _>("print('once')").unwrap();
        });
        assert_eq!(out.text(), "once\n");
    }

    #[test]
    fn test_install_keeps_namespace_members() {
        let (_runtime, context) = context();
        let handle: SharedHandle = Rc::new(RefCell::new(OutputHandle::new(EmbeddedStub)));
        context.with(|ctx| {
            ctx.eval::<(), _>("globalThis.io = { read: 7 }; globalThis.keep = 1;")
                .unwrap();
            install(&ctx, &handle, &Bindings::default()).unwrap();
            let ok: bool = ctx
                .eval("io.read === 7 && typeof io.write === 'function' && keep === 1")
                .unwrap();
            assert!(ok);
        });
    }

    #[test]
    fn test_install_rejects_non_object_namespace() {
        let (_runtime, context) = context();
        let handle: SharedHandle = Rc::new(RefCell::new(OutputHandle::new(EmbeddedStub)));
        context.with(|ctx| {
            ctx.eval::<(), _>("globalThis.io = 5;").unwrap();
            let result = install(&ctx, &handle, &Bindings::default());
            assert!(matches!(
                result,
                Err(InstallError::BindingUnavailable { ref name }) if name == "io"
            ));
        });
    }
}
