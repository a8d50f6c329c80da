//! Capture spill
//!
//! Once the capture buffer is full, later output falls through to the
//! channel. Writing the captured bytes out at that moment keeps stdout in
//! emission order instead of printing the capture after the run.

use herald_core::{CaptureBuffer, ChannelKind, Emitter, FormatError, GuestArgs, WriteOutcome};
use std::cell::Cell;
use std::io::Write;
use std::rc::Rc;

pub struct SpillOnExhaustion<W> {
    inner: Box<dyn Emitter>,
    out: W,
    spilled: Rc<Cell<bool>>,
}

impl<W: Write> SpillOnExhaustion<W> {
    /// `spilled` is set once the captured bytes have been written to `out`.
    pub fn new(inner: Box<dyn Emitter>, out: W, spilled: Rc<Cell<bool>>) -> Self {
        Self {
            inner,
            out,
            spilled,
        }
    }

    fn spill(&mut self, capture: &CaptureBuffer) {
        if self.spilled.get() || !capture.is_exhausted() {
            return;
        }
        self.spilled.set(true);
        tracing::debug!(bytes = capture.cursor(), "capture exhausted, writing captured output");
        let result = self
            .out
            .write_all(capture.contents())
            .and_then(|()| self.out.flush());
        if let Err(err) = result {
            tracing::warn!("failed to write captured output: {err}");
        }
    }
}

impl<W: Write> Emitter for SpillOnExhaustion<W> {
    fn kind(&self) -> ChannelKind {
        self.inner.kind()
    }

    fn print(
        &mut self,
        capture: &mut CaptureBuffer,
        args: &dyn GuestArgs,
    ) -> Result<(), FormatError> {
        self.spill(capture);
        self.inner.print(capture, args)
    }

    fn warn(
        &mut self,
        capture: &mut CaptureBuffer,
        args: &dyn GuestArgs,
    ) -> Result<(), FormatError> {
        self.spill(capture);
        self.inner.warn(capture, args)
    }

    fn error(
        &mut self,
        capture: &mut CaptureBuffer,
        args: &dyn GuestArgs,
        trace: Option<&str>,
    ) -> Result<(), FormatError> {
        self.spill(capture);
        self.inner.error(capture, args, trace)
    }

    fn write(
        &mut self,
        capture: &mut CaptureBuffer,
        args: &dyn GuestArgs,
    ) -> Result<WriteOutcome, FormatError> {
        self.spill(capture);
        self.inner.write(capture, args)
    }
}
