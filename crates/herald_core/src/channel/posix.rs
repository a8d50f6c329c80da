//! POSIX descriptor channel
//!
//! Writes go to the standard output and error descriptors piece by piece.
//! `print`, `warn` and `error` are best effort; only `write` reports a failed
//! or short write back to the guest.

use super::{ChannelKind, ChannelWriteFailure, Emitter, Severity, WriteOutcome};
use crate::capture::{try_capture, try_capture_raw, CaptureBuffer};
use crate::format::{raw_text, FormatError, GuestArgs};
use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

/// `EPIPE`, reported by a closed [`MemorySink`].
const BROKEN_PIPE: i32 = 32;

pub struct DescriptorChannel<O = io::Stdout, E = io::Stderr> {
    stdout: O,
    stderr: E,
}

impl DescriptorChannel {
    /// Channel bound to the process's stdout and stderr.
    pub fn stdio() -> Self {
        Self::new(io::stdout(), io::stderr())
    }
}

impl<O: Write, E: Write> DescriptorChannel<O, E> {
    pub fn new(stdout: O, stderr: E) -> Self {
        Self { stdout, stderr }
    }

    pub fn into_inner(self) -> (O, E) {
        (self.stdout, self.stderr)
    }
}

/// Write all of `bytes`. Buffered writers such as `Stdout` may accept only
/// part of a buffer per call; only a writer that stops accepting bytes
/// altogether counts as a short write.
fn put(out: &mut impl Write, bytes: &[u8]) -> Result<(), ChannelWriteFailure> {
    let mut written = 0;
    while written < bytes.len() {
        match out.write(&bytes[written..]) {
            Ok(0) => return Err(ChannelWriteFailure::short_write(written, bytes.len())),
            Ok(count) => written += count,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
            Err(err) => return Err(err.into()),
        }
    }
    Ok(())
}

/// Emit one tagged, tab-joined, newline-terminated line. Write failures are
/// noted and skipped; formatting failures abort the line.
fn emit_line(
    out: &mut impl Write,
    severity: Severity,
    args: &dyn GuestArgs,
) -> Result<Option<ChannelWriteFailure>, FormatError> {
    let mut first_failure = None;
    let mut note = |result: Result<(), ChannelWriteFailure>| {
        if let Err(failure) = result {
            first_failure.get_or_insert(failure);
        }
    };

    if let Some(tag) = severity.tag() {
        note(put(out, tag.as_bytes()));
    }
    for index in 0..args.len() {
        let text = args.render(index)?;
        if index > 0 {
            note(put(out, b"\t"));
        }
        note(put(out, text.as_bytes()));
    }
    note(put(out, b"\n"));
    note(out.flush().map_err(ChannelWriteFailure::from));
    Ok(first_failure)
}

fn ignore(failure: Option<ChannelWriteFailure>, operation: &str) {
    if let Some(failure) = failure {
        tracing::warn!(operation, code = failure.code, "ignoring failed write: {}", failure.message);
    }
}

impl<O: Write, E: Write> Emitter for DescriptorChannel<O, E> {
    fn kind(&self) -> ChannelKind {
        ChannelKind::Posix
    }

    fn print(
        &mut self,
        capture: &mut CaptureBuffer,
        args: &dyn GuestArgs,
    ) -> Result<(), FormatError> {
        if try_capture(capture, args)? {
            return Ok(());
        }
        ignore(emit_line(&mut self.stdout, Severity::Info, args)?, "print");
        Ok(())
    }

    fn warn(
        &mut self,
        capture: &mut CaptureBuffer,
        args: &dyn GuestArgs,
    ) -> Result<(), FormatError> {
        if try_capture(capture, args)? {
            return Ok(());
        }
        ignore(emit_line(&mut self.stderr, Severity::Warning, args)?, "warn");
        Ok(())
    }

    fn error(
        &mut self,
        capture: &mut CaptureBuffer,
        args: &dyn GuestArgs,
        trace: Option<&str>,
    ) -> Result<(), FormatError> {
        if try_capture(capture, args)? {
            return Ok(());
        }
        ignore(emit_line(&mut self.stderr, Severity::Error, args)?, "error");

        if let Some(trace) = trace.filter(|trace| !trace.is_empty()) {
            let result = put(&mut self.stderr, b"[!] ")
                .and_then(|()| put(&mut self.stderr, trace.as_bytes()))
                .and_then(|()| put(&mut self.stderr, b"\n"))
                .and_then(|()| self.stderr.flush().map_err(ChannelWriteFailure::from));
            ignore(result.err(), "error");
        }
        Ok(())
    }

    fn write(
        &mut self,
        capture: &mut CaptureBuffer,
        args: &dyn GuestArgs,
    ) -> Result<WriteOutcome, FormatError> {
        if try_capture_raw(capture, args)? {
            return Ok(WriteOutcome::Written);
        }

        for index in 0..args.len() {
            let text = raw_text(args, index)?;
            let result = if index > 0 {
                put(&mut self.stdout, b"\t")
            } else {
                Ok(())
            };
            if let Err(failure) = result.and_then(|()| put(&mut self.stdout, text.as_bytes())) {
                tracing::debug!(index, code = failure.code, "write failed");
                return Ok(WriteOutcome::Failed(failure));
            }
        }
        if let Err(err) = self.stdout.flush() {
            return Ok(WriteOutcome::Failed(err.into()));
        }
        Ok(WriteOutcome::Written)
    }
}

/// In-memory descriptor. Clones share the same bytes, so one clone can be
/// handed to a channel and another kept for reading.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    bytes: Rc<RefCell<Vec<u8>>>,
    closed: bool,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink whose every write fails like a closed pipe.
    pub fn closed() -> Self {
        Self {
            bytes: Rc::default(),
            closed: true,
        }
    }

    pub fn contents(&self) -> Vec<u8> {
        self.bytes.borrow().clone()
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.bytes.borrow()).into_owned()
    }
}

impl Write for MemorySink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.closed {
            return Err(io::Error::from_raw_os_error(BROKEN_PIPE));
        }
        self.bytes.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
