//! Capture buffer and router
//!
//! A capture buffer is a fixed-size byte region owned by the embedding for
//! the duration of one script execution. While it is configured and has room
//! left, every emission lands here instead of on the platform channel.
//! Writes are truncated at capacity; the region never grows.

use crate::format::{raw_text, FormatError, GuestArgs};
use std::borrow::Cow;

/// Bounded capture region plus its write cursor.
///
/// Invariant: `cursor <= capacity`. Only the router in this module moves the
/// cursor forward.
#[derive(Debug, Default)]
pub struct CaptureBuffer {
    region: Option<Box<[u8]>>,
    cursor: usize,
}

impl CaptureBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// A configured buffer with room for `capacity` bytes.
    pub fn with_capacity(capacity: usize) -> Self {
        let mut buffer = Self::new();
        buffer.configure(capacity);
        buffer
    }

    /// Replace any previous region with a fresh one of `capacity` bytes.
    pub fn configure(&mut self, capacity: usize) {
        self.region = Some(vec![0u8; capacity].into_boxed_slice());
        self.cursor = 0;
    }

    /// Drop the region, returning the bytes written so far.
    pub fn release(&mut self) -> Option<Vec<u8>> {
        let region = self.region.take()?;
        let written = region[..self.cursor].to_vec();
        self.cursor = 0;
        Some(written)
    }

    pub fn is_configured(&self) -> bool {
        self.region.is_some()
    }

    /// Zero when no region is configured.
    pub fn capacity(&self) -> usize {
        self.region.as_ref().map_or(0, |region| region.len())
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn remaining(&self) -> usize {
        self.capacity() - self.cursor
    }

    /// Configured with room left: emissions go here.
    pub fn is_active(&self) -> bool {
        self.is_configured() && self.cursor < self.capacity()
    }

    /// Configured and full: later output is dropped by truncation, or falls
    /// through to the channel on the next call.
    pub fn is_exhausted(&self) -> bool {
        self.is_configured() && self.cursor >= self.capacity()
    }

    /// Bytes written so far.
    pub fn contents(&self) -> &[u8] {
        match &self.region {
            Some(region) => &region[..self.cursor],
            None => &[],
        }
    }

    fn append(&mut self, bytes: &[u8]) -> usize {
        let Some(region) = self.region.as_mut() else {
            return 0;
        };
        let count = bytes.len().min(region.len() - self.cursor);
        region[self.cursor..self.cursor + count].copy_from_slice(&bytes[..count]);
        self.cursor += count;
        count
    }
}

/// Route one call's arguments into the capture buffer, rendering each through
/// the guest conversion hook.
///
/// Returns `Ok(false)` without touching anything when the buffer is unset or
/// already full, in which case the caller emits on its channel instead. Once
/// it starts, every argument is processed and the call reports handled even
/// if the text was cut short.
pub fn try_capture(buffer: &mut CaptureBuffer, args: &dyn GuestArgs) -> Result<bool, FormatError> {
    capture_with(buffer, args.len(), |index| args.render(index).map(Cow::Owned))
}

/// Same as [`try_capture`], converting arguments the way `write` does.
pub fn try_capture_raw(
    buffer: &mut CaptureBuffer,
    args: &dyn GuestArgs,
) -> Result<bool, FormatError> {
    capture_with(buffer, args.len(), |index| raw_text(args, index))
}

fn capture_with<'a, F>(
    buffer: &mut CaptureBuffer,
    count: usize,
    mut token: F,
) -> Result<bool, FormatError>
where
    F: FnMut(usize) -> Result<Cow<'a, str>, FormatError>,
{
    if !buffer.is_active() {
        return Ok(false);
    }

    let start = buffer.cursor;
    for index in 0..count {
        let text = token(index)?;
        if index > 0 {
            buffer.append(b"\t");
        }
        let written = buffer.append(text.as_bytes());
        if written < text.len() {
            tracing::trace!(
                dropped = text.len() - written,
                capacity = buffer.capacity(),
                "capture buffer full, truncating"
            );
        }
    }
    tracing::trace!(bytes = buffer.cursor - start, cursor = buffer.cursor, "captured output");
    Ok(true)
}
