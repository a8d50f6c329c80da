//! Runtime output handle
//!
//! One per script runtime: the capture buffer the embedding controls plus the
//! channel strategy chosen for the target. Emission calls split the handle so
//! the channel only ever sees the buffer through the capture router.

use crate::capture::CaptureBuffer;
use crate::channel::{ChannelKind, Emitter, WriteOutcome};
use crate::format::{FormatError, GuestArgs};

pub struct OutputHandle {
    capture: CaptureBuffer,
    emitter: Box<dyn Emitter>,
}

impl OutputHandle {
    pub fn new(emitter: impl Emitter + 'static) -> Self {
        Self::from_boxed(Box::new(emitter))
    }

    pub fn from_boxed(emitter: Box<dyn Emitter>) -> Self {
        Self {
            capture: CaptureBuffer::new(),
            emitter,
        }
    }

    pub fn kind(&self) -> ChannelKind {
        self.emitter.kind()
    }

    pub fn capture(&self) -> &CaptureBuffer {
        &self.capture
    }

    /// Redirect all output into a fresh buffer of `capacity` bytes.
    pub fn configure_capture(&mut self, capacity: usize) {
        tracing::debug!(capacity, "capture buffer configured");
        self.capture.configure(capacity);
    }

    /// Stop capturing and hand back what was captured.
    pub fn release_capture(&mut self) -> Option<Vec<u8>> {
        let captured = self.capture.release();
        if let Some(bytes) = &captured {
            tracing::debug!(bytes = bytes.len(), "capture buffer released");
        }
        captured
    }

    pub fn print(&mut self, args: &dyn GuestArgs) -> Result<(), FormatError> {
        self.emitter.print(&mut self.capture, args)
    }

    pub fn warn(&mut self, args: &dyn GuestArgs) -> Result<(), FormatError> {
        self.emitter.warn(&mut self.capture, args)
    }

    pub fn error(&mut self, args: &dyn GuestArgs, trace: Option<&str>) -> Result<(), FormatError> {
        self.emitter.error(&mut self.capture, args, trace)
    }

    pub fn write(&mut self, args: &dyn GuestArgs) -> Result<WriteOutcome, FormatError> {
        self.emitter.write(&mut self.capture, args)
    }
}

impl std::fmt::Debug for OutputHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutputHandle")
            .field("kind", &self.kind())
            .field("capture", &self.capture)
            .finish()
    }
}
