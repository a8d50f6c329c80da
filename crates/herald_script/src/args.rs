//! Guest argument adapter
//!
//! Wraps the values of one JS call so the core can render them. Rendering
//! goes through the configured conversion hook looked up once per call.

use herald_core::{FormatError, GuestArgs, RawArg};
use rquickjs::convert::Coerced;
use rquickjs::{Ctx, Exception, Function, Value};
use std::borrow::Cow;
use std::cell::RefCell;

pub struct JsArgs<'js> {
    ctx: Ctx<'js>,
    values: Vec<Value<'js>>,
    hook_name: String,
    hook: Option<Function<'js>>,
    /// Guest error raised by the hook, rethrown once the call unwinds.
    pending: RefCell<Option<rquickjs::Error>>,
}

impl<'js> JsArgs<'js> {
    pub fn new(ctx: &Ctx<'js>, values: Vec<Value<'js>>, hook_name: &str) -> Self {
        let hook = ctx
            .globals()
            .get::<_, Value>(hook_name)
            .ok()
            .and_then(|value| value.into_function());
        Self {
            ctx: ctx.clone(),
            values,
            hook_name: hook_name.to_string(),
            hook,
            pending: RefCell::new(None),
        }
    }

    fn value(&self, index: usize) -> Result<&Value<'js>, FormatError> {
        self.values
            .get(index)
            .ok_or(FormatError::MissingArgument { index })
    }

    fn stash(&self, err: rquickjs::Error) -> FormatError {
        *self.pending.borrow_mut() = Some(err);
        FormatError::Raised
    }

    /// Turn a formatting failure into the error the binding returns to QuickJS.
    pub fn into_error(self, err: FormatError) -> rquickjs::Error {
        match (err, self.pending.into_inner()) {
            (FormatError::Raised, Some(pending)) => pending,
            (err, _) => Exception::throw_type(&self.ctx, &err.to_string()),
        }
    }
}

impl GuestArgs for JsArgs<'_> {
    fn len(&self) -> usize {
        self.values.len()
    }

    fn render(&self, index: usize) -> Result<String, FormatError> {
        let value = self.value(index)?.clone();
        let hook = self.hook.as_ref().ok_or_else(|| FormatError::HookUnavailable {
            hook: self.hook_name.clone(),
        })?;
        let rendered: Value = hook.call((value,)).map_err(|err| self.stash(err))?;
        match rendered.as_string() {
            Some(text) => text.to_string().map_err(|err| self.stash(err)),
            None => Err(FormatError::NotText {
                hook: self.hook_name.clone(),
            }),
        }
    }

    fn raw(&self, index: usize) -> Result<RawArg<'_>, FormatError> {
        let value = self.value(index)?;
        if let Some(number) = value.as_number() {
            return Ok(RawArg::Number(number));
        }
        match value.get::<Coerced<String>>() {
            Ok(Coerced(text)) => Ok(RawArg::Text(Cow::Owned(text))),
            Err(err @ rquickjs::Error::Exception) => Err(self.stash(err)),
            Err(_) => Err(FormatError::NoText { index }),
        }
    }
}
