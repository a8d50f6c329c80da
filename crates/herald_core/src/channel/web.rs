//! Web console bridge channel
//!
//! Sandboxed web hosts expose a single console function. Each call is
//! assembled into a bounded local buffer and handed to the bridge once.
//! Nothing is reported back to the guest, not even for `write`.

use super::{ChannelKind, Emitter, Severity, WriteOutcome};
use crate::capture::{try_capture, try_capture_raw, CaptureBuffer};
use crate::format::{raw_text, FormatError, GuestArgs};
use std::io::{self, Write};

/// Upper bound, in bytes, on the text of a single bridge call.
pub const BRIDGE_LIMIT: usize = 20480;

/// The host's console entry point.
pub trait ConsoleBridge {
    fn print(&mut self, text: &str);
}

impl<F: FnMut(&str)> ConsoleBridge for F {
    fn print(&mut self, text: &str) {
        (*self)(text)
    }
}

/// Bridge that hands each console call to a host writer in one piece.
///
/// The bridge has no way to report failures back to the guest, so they are
/// only logged.
#[derive(Debug)]
pub struct HostConsole<W = io::Stdout> {
    out: W,
}

impl HostConsole {
    /// Console bound to the process's stdout.
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> HostConsole<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }
}

impl<W: Write> ConsoleBridge for HostConsole<W> {
    fn print(&mut self, text: &str) {
        let result = self
            .out
            .write_all(text.as_bytes())
            .and_then(|()| self.out.flush());
        if let Err(err) = result {
            tracing::warn!(target: "console", "dropped console output: {err}");
        }
    }
}

/// Fixed-size assembly buffer. Text past the limit is dropped at a character
/// boundary, so the assembled text never exceeds the limit.
struct Assembly {
    text: String,
    limit: usize,
}

impl Assembly {
    fn new(limit: usize) -> Self {
        Self {
            text: String::with_capacity(limit),
            limit,
        }
    }

    fn push(&mut self, text: &str) {
        let room = self.limit - self.text.len();
        let mut end = text.len().min(room);
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        self.text.push_str(&text[..end]);
    }

    fn finish(self) -> String {
        self.text
    }
}

pub struct BridgeChannel<B = HostConsole> {
    bridge: B,
    limit: usize,
}

impl<B: ConsoleBridge> BridgeChannel<B> {
    pub fn new(bridge: B) -> Self {
        Self::with_limit(bridge, BRIDGE_LIMIT)
    }

    /// Bridge channel with a custom assembly bound. The bound includes the
    /// trailing newline, so it is at least one byte.
    pub fn with_limit(bridge: B, limit: usize) -> Self {
        Self {
            bridge,
            limit: limit.max(1),
        }
    }

    pub fn bridge(&self) -> &B {
        &self.bridge
    }

    fn emit_line(&mut self, severity: Severity, args: &dyn GuestArgs) -> Result<(), FormatError> {
        // One byte stays reserved so the line always ends in a newline.
        let mut line = Assembly::new(self.limit - 1);
        if let Some(tag) = severity.tag() {
            line.push(tag);
        }
        for index in 0..args.len() {
            let text = args.render(index)?;
            if index > 0 {
                line.push("\t");
            }
            line.push(&text);
        }
        let mut text = line.finish();
        text.push('\n');
        self.bridge.print(&text);
        Ok(())
    }
}

impl<B: ConsoleBridge> Emitter for BridgeChannel<B> {
    fn kind(&self) -> ChannelKind {
        ChannelKind::Web
    }

    fn print(
        &mut self,
        capture: &mut CaptureBuffer,
        args: &dyn GuestArgs,
    ) -> Result<(), FormatError> {
        if try_capture(capture, args)? {
            return Ok(());
        }
        self.emit_line(Severity::Info, args)
    }

    fn warn(
        &mut self,
        capture: &mut CaptureBuffer,
        args: &dyn GuestArgs,
    ) -> Result<(), FormatError> {
        if try_capture(capture, args)? {
            return Ok(());
        }
        self.emit_line(Severity::Warning, args)
    }

    // The console bridge has no notion of a script location.
    fn error(
        &mut self,
        capture: &mut CaptureBuffer,
        args: &dyn GuestArgs,
        _trace: Option<&str>,
    ) -> Result<(), FormatError> {
        if try_capture(capture, args)? {
            return Ok(());
        }
        self.emit_line(Severity::Error, args)
    }

    fn write(
        &mut self,
        capture: &mut CaptureBuffer,
        args: &dyn GuestArgs,
    ) -> Result<WriteOutcome, FormatError> {
        if try_capture_raw(capture, args)? {
            return Ok(WriteOutcome::Written);
        }
        let mut chunk = Assembly::new(self.limit);
        for index in 0..args.len() {
            let text = raw_text(args, index)?;
            if index > 0 {
                chunk.push("\t");
            }
            chunk.push(&text);
        }
        self.bridge.print(&chunk.finish());
        Ok(WriteOutcome::Written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::MemorySink;
    use crate::format::HostValue;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn recording() -> (impl FnMut(&str), Rc<RefCell<Vec<String>>>) {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let sink = calls.clone();
        (move |text: &str| sink.borrow_mut().push(text.to_string()), calls)
    }

    fn args(items: &[&str]) -> Vec<HostValue> {
        items.iter().map(|item| HostValue::from(*item)).collect()
    }

    #[test]
    fn test_one_bridge_call_per_line() {
        let (bridge, calls) = recording();
        let mut channel = BridgeChannel::new(bridge);
        channel.print(&mut CaptureBuffer::new(), &args(&["a", "b", "c"])).unwrap();
        assert_eq!(*calls.borrow(), vec!["a\tb\tc\n".to_string()]);
    }

    #[test]
    fn test_tags() {
        let (bridge, calls) = recording();
        let mut channel = BridgeChannel::new(bridge);
        let mut capture = CaptureBuffer::new();
        channel.warn(&mut capture, &args(&[])).unwrap();
        channel.error(&mut capture, &args(&["x"]), Some("where")).unwrap();
        assert_eq!(*calls.borrow(), vec!["[W] \n".to_string(), "[!] x\n".to_string()]);
    }

    #[test]
    fn test_line_is_bounded() {
        let (bridge, calls) = recording();
        let mut channel = BridgeChannel::with_limit(bridge, 8);
        channel.print(&mut CaptureBuffer::new(), &args(&["abcdefghij"])).unwrap();
        assert_eq!(*calls.borrow(), vec!["abcdefg\n".to_string()]);
    }

    #[test]
    fn test_line_cut_on_char_boundary() {
        let (bridge, calls) = recording();
        let mut channel = BridgeChannel::with_limit(bridge, 8);
        channel.print(&mut CaptureBuffer::new(), &args(&["abcdef€"])).unwrap();
        assert_eq!(*calls.borrow(), vec!["abcdef\n".to_string()]);

        let (bridge, calls) = recording();
        let mut channel = BridgeChannel::with_limit(bridge, 4);
        let outcome = channel.write(&mut CaptureBuffer::new(), &args(&["ab€"])).unwrap();
        assert!(outcome.is_written());
        assert_eq!(*calls.borrow(), vec!["ab".to_string()]);
    }

    #[test]
    fn test_print_tab_count() {
        for count in 0..5 {
            let (bridge, calls) = recording();
            let mut channel = BridgeChannel::new(bridge);
            let items: Vec<&str> = (0..count).map(|_| "v").collect();
            channel.print(&mut CaptureBuffer::new(), &args(&items)).unwrap();
            let calls = calls.borrow();
            assert_eq!(calls.len(), 1);
            assert_eq!(calls[0].matches('\t').count(), count.max(1) - 1);
            assert_eq!(calls[0].matches('\n').count(), 1);
            assert!(calls[0].ends_with('\n'));
        }
    }

    #[test]
    fn test_host_console_writes_each_call() {
        let out = MemorySink::new();
        let mut channel = BridgeChannel::new(HostConsole::new(out.clone()));
        let mut capture = CaptureBuffer::new();
        channel.print(&mut capture, &args(&["hello web"])).unwrap();
        channel.warn(&mut capture, &args(&["w"])).unwrap();
        channel.write(&mut capture, &args(&["tail"])).unwrap();
        assert_eq!(out.text(), "hello web\n[W] w\ntail");
    }

    #[test]
    fn test_host_console_ignores_failure() {
        let mut channel = BridgeChannel::new(HostConsole::new(MemorySink::closed()));
        let outcome = channel.write(&mut CaptureBuffer::new(), &args(&["x"])).unwrap();
        assert!(outcome.is_written());
        assert!(channel.print(&mut CaptureBuffer::new(), &args(&["x"])).is_ok());
    }

    #[test]
    fn test_write_without_newline() {
        let (bridge, calls) = recording();
        let mut channel = BridgeChannel::new(bridge);
        let values = vec![HostValue::from(2.0), HostValue::from("z")];
        let outcome = channel.write(&mut CaptureBuffer::new(), &values).unwrap();
        assert!(outcome.is_written());
        assert_eq!(*calls.borrow(), vec!["2\tz".to_string()]);
    }

    #[test]
    fn test_capture_bypasses_bridge() {
        let (bridge, calls) = recording();
        let mut channel = BridgeChannel::new(bridge);
        let mut capture = CaptureBuffer::with_capacity(16);
        channel.print(&mut capture, &args(&["kept"])).unwrap();
        assert!(calls.borrow().is_empty());
        assert_eq!(capture.contents(), b"kept");
    }
}
