//! Embedded stub channel
//!
//! For targets without any output device. Every operation is accepted and
//! does nothing: no capture, no bytes, no failure.

use super::{ChannelKind, Emitter, WriteOutcome};
use crate::capture::CaptureBuffer;
use crate::format::{FormatError, GuestArgs};

#[derive(Debug, Default, Clone, Copy)]
pub struct EmbeddedStub;

impl Emitter for EmbeddedStub {
    fn kind(&self) -> ChannelKind {
        ChannelKind::Embedded
    }

    fn print(&mut self, _: &mut CaptureBuffer, _: &dyn GuestArgs) -> Result<(), FormatError> {
        Ok(())
    }

    fn warn(&mut self, _: &mut CaptureBuffer, _: &dyn GuestArgs) -> Result<(), FormatError> {
        Ok(())
    }

    fn error(
        &mut self,
        _: &mut CaptureBuffer,
        _: &dyn GuestArgs,
        _: Option<&str>,
    ) -> Result<(), FormatError> {
        Ok(())
    }

    fn write(
        &mut self,
        _: &mut CaptureBuffer,
        _: &dyn GuestArgs,
    ) -> Result<WriteOutcome, FormatError> {
        Ok(WriteOutcome::Written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::HostValue;

    #[test]
    fn test_stub_is_inert() {
        let mut stub = EmbeddedStub;
        let mut capture = CaptureBuffer::with_capacity(8);
        let args = vec![HostValue::from("ignored")];

        stub.print(&mut capture, &args).unwrap();
        stub.warn(&mut capture, &args).unwrap();
        stub.error(&mut capture, &args, Some("trace")).unwrap();
        assert!(stub.write(&mut capture, &args).unwrap().is_written());

        assert_eq!(capture.cursor(), 0);
        assert!(capture.contents().is_empty());
    }
}
