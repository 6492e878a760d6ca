use bytes::{BufMut, BytesMut};
use tracing::{debug, trace};

use crate::error::{FrameError, Result};

const INITIAL_BUFFER_CAPACITY: usize = 64;

/// Protocol-specific framing rules plugged into a [`FrameAssembler`].
pub trait FrameRules {
    /// Parsed frame type produced by these rules.
    type Frame;

    /// Byte that opens every frame. Anything before it is discarded.
    fn start_marker(&self) -> u8;

    /// Bytes still needed to complete the frame collected so far in `raw`
    /// (which starts with the start marker).
    fn remaining(&self, raw: &[u8]) -> usize;

    /// Parse a complete raw frame.
    ///
    /// `Ok(None)` means the frame is well formed but carries nothing worth
    /// delivering and should be silently dropped.
    fn parse(&self, raw: &[u8]) -> Result<Option<Self::Frame>>;
}

/// Outcome of feeding one byte to a [`FrameAssembler`].
#[derive(Debug)]
pub enum FrameState<F> {
    /// The frame is not complete yet (or no frame is open).
    NeedsMore,
    /// A frame was completed and verified.
    Complete(F),
    /// A frame was completed but failed verification and has been discarded.
    Invalid(FrameError),
}

/// Incrementally assembles frames from a byte stream.
///
/// Bytes are discarded until the start marker arrives. After a frame completes
/// (valid or not) the assembler resets and scans for the next marker; there is
/// no resynchronisation inside a corrupt frame.
#[derive(Debug)]
pub struct FrameAssembler<R> {
    rules: R,
    raw: BytesMut,
}

impl<R: FrameRules> FrameAssembler<R> {
    /// Create an assembler with the given rules.
    pub fn new(rules: R) -> Self {
        Self {
            rules,
            raw: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
        }
    }

    /// Feed one received byte.
    pub fn feed(&mut self, byte: u8) -> FrameState<R::Frame> {
        if self.raw.is_empty() && byte != self.rules.start_marker() {
            trace!(byte, "discarding byte outside frame");
            return FrameState::NeedsMore;
        }

        self.raw.put_u8(byte);
        if self.rules.remaining(&self.raw) > 0 {
            return FrameState::NeedsMore;
        }

        let raw = self.raw.split();
        match self.rules.parse(&raw) {
            Ok(Some(frame)) => FrameState::Complete(frame),
            Ok(None) => {
                debug!(len = raw.len(), "ignoring empty frame");
                FrameState::NeedsMore
            }
            Err(err) => FrameState::Invalid(err),
        }
    }

    /// Whether a frame is currently open (start marker seen, not complete).
    pub fn is_open(&self) -> bool {
        !self.raw.is_empty()
    }

    /// Bytes still needed by the open frame, or 0 when no frame is open.
    pub fn remaining_bytes(&self) -> usize {
        if self.raw.is_empty() {
            return 0;
        }
        self.rules.remaining(&self.raw)
    }

    /// Drop any partially assembled frame.
    pub fn reset(&mut self) {
        self.raw.clear();
    }

    /// Borrow the framing rules.
    pub fn rules(&self) -> &R {
        &self.rules
    }
}

impl<R: FrameRules + Default> Default for FrameAssembler<R> {
    fn default() -> Self {
        Self::new(R::default())
    }
}
