//! Herald Core
//!
//! Output capture and redirection for embedded guest scripts:
//! - Argument formatting through the guest's own conversion
//! - Bounded capture buffer and the router that fills it
//! - Platform channels (POSIX descriptors, web console bridge, embedded stub)
//! - The output handle that ties a capture buffer to one channel
//!
//! Nothing in here knows about a particular script engine. The engine side
//! hands arguments over through [`GuestArgs`] and installs the emitters itself.

pub mod bindings;
pub mod capture;
pub mod channel;
pub mod format;
pub mod handle;

pub use bindings::Bindings;
pub use capture::{try_capture, try_capture_raw, CaptureBuffer};
pub use channel::{
    BridgeChannel, ChannelKind, ChannelWriteFailure, ConsoleBridge, DescriptorChannel,
    EmbeddedStub, Emitter, HostConsole, MemorySink, Severity, WriteOutcome,
};
pub use format::{format_number, FormatError, GuestArgs, HostValue, RawArg};
pub use handle::OutputHandle;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
