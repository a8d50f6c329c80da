//! Platform output channels
//!
//! Every target implements the same four emission operations behind
//! [`Emitter`]. The embedding picks one per runtime and injects it into the
//! [`OutputHandle`](crate::OutputHandle).

mod posix;
mod stub;
mod web;

pub use posix::{DescriptorChannel, MemorySink};
pub use stub::EmbeddedStub;
pub use web::{BridgeChannel, ConsoleBridge, HostConsole, BRIDGE_LIMIT};

use crate::capture::CaptureBuffer;
use crate::format::{FormatError, GuestArgs};
use serde::{Deserialize, Serialize};
use std::io;
use thiserror::Error;

/// Fallback error code for short writes that carry no OS error (`EIO`).
pub const SHORT_WRITE_CODE: i32 = 5;

/// Which platform back-end an emitter targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelKind {
    #[default]
    Posix,
    Web,
    Embedded,
}

impl ChannelKind {
    /// Emitter for this target wired to the process's own output devices.
    pub fn emitter(self) -> Box<dyn Emitter> {
        match self {
            ChannelKind::Posix => Box::new(DescriptorChannel::stdio()),
            ChannelKind::Web => Box::new(BridgeChannel::new(HostConsole::stdout())),
            ChannelKind::Embedded => Box::new(EmbeddedStub),
        }
    }
}

/// Line severity for `print`, `warn` and `error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl Severity {
    /// Marker written before the first argument, trailing space included.
    pub fn tag(self) -> Option<&'static str> {
        match self {
            Severity::Info => None,
            Severity::Warning => Some("[W] "),
            Severity::Error => Some("[!] "),
        }
    }
}

/// A platform write that did not go through in full.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{message} (code {code})")]
pub struct ChannelWriteFailure {
    pub message: String,
    pub code: i32,
}

impl ChannelWriteFailure {
    pub fn short_write(written: usize, requested: usize) -> Self {
        Self {
            message: format!("short write: {written} of {requested} bytes"),
            code: SHORT_WRITE_CODE,
        }
    }
}

impl From<io::Error> for ChannelWriteFailure {
    fn from(err: io::Error) -> Self {
        Self {
            code: err.raw_os_error().unwrap_or(SHORT_WRITE_CODE),
            message: err.to_string(),
        }
    }
}

/// Result of the `write` primitive as the guest sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    Written,
    Failed(ChannelWriteFailure),
}

impl WriteOutcome {
    pub fn is_written(&self) -> bool {
        matches!(self, WriteOutcome::Written)
    }
}

/// The four guest-facing emission operations of one platform.
///
/// Each call gets the capture buffer explicitly. Implementations hand it to
/// the capture router and never touch its cursor themselves.
pub trait Emitter {
    fn kind(&self) -> ChannelKind;

    fn print(&mut self, capture: &mut CaptureBuffer, args: &dyn GuestArgs)
        -> Result<(), FormatError>;

    fn warn(&mut self, capture: &mut CaptureBuffer, args: &dyn GuestArgs)
        -> Result<(), FormatError>;

    /// `trace` is the current script location, when the guest has one.
    fn error(
        &mut self,
        capture: &mut CaptureBuffer,
        args: &dyn GuestArgs,
        trace: Option<&str>,
    ) -> Result<(), FormatError>;

    fn write(
        &mut self,
        capture: &mut CaptureBuffer,
        args: &dyn GuestArgs,
    ) -> Result<WriteOutcome, FormatError>;
}
