//! Command buffer: result capture for multi/exec and pipelines
//!
//! Two states. In `Immediate` every command returns its own result. In
//! `Buffering` commands still run against the store right away, one by one;
//! only their replies are held back, in call order, until `exec`.
//!
//! ```text
//!  Immediate ──begin()──▶ Buffering ──exec()/discard()──▶ Immediate
//!                           │    ▲
//!                           └────┘ capture(reply)
//! ```

use redshim_core::{Error, Result};

use crate::reply::Reply;

/// Buffer state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BufferState {
    /// Results are returned to the caller
    #[default]
    Immediate,
    /// Results are captured until `exec`
    Buffering,
}

/// Mode flag plus the captured replies
#[derive(Debug, Default)]
pub struct CommandBuffer {
    state: BufferState,
    replies: Vec<Reply>,
}

impl CommandBuffer {
    /// New buffer in `Immediate`
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state
    pub fn state(&self) -> BufferState {
        self.state
    }

    /// Whether replies are being captured
    pub fn is_buffering(&self) -> bool {
        self.state == BufferState::Buffering
    }

    /// Number of captured replies
    pub fn len(&self) -> usize {
        self.replies.len()
    }

    /// Whether no reply has been captured
    pub fn is_empty(&self) -> bool {
        self.replies.is_empty()
    }

    /// Enter `Buffering` with an empty reply list
    ///
    /// Calling it while already buffering starts over.
    pub fn begin(&mut self) {
        self.state = BufferState::Buffering;
        self.replies.clear();
    }

    /// Append one reply
    ///
    /// # Errors
    ///
    /// `InvalidOperation` in `Immediate`.
    pub fn capture(&mut self, reply: Reply) -> Result<()> {
        if !self.is_buffering() {
            return Err(Error::InvalidOperation(
                "reply captured outside multi/pipeline".to_string(),
            ));
        }
        self.replies.push(reply);
        Ok(())
    }

    /// Return to `Immediate`, handing back the replies in call order
    ///
    /// # Errors
    ///
    /// `InvalidOperation` in `Immediate` (exec without multi).
    pub fn exec(&mut self) -> Result<Vec<Reply>> {
        if !self.is_buffering() {
            return Err(Error::InvalidOperation("exec without multi".to_string()));
        }
        self.state = BufferState::Immediate;
        Ok(std::mem::take(&mut self.replies))
    }

    /// Return to `Immediate`, dropping captured replies
    pub fn discard(&mut self) {
        self.state = BufferState::Immediate;
        self.replies.clear();
    }
}
