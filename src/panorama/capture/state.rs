//! Capture lifecycle state.
//!
//! `Idle → Capturing → Completed | Failed`, and back to `Capturing` for the
//! next request. Only one capture runs at a time per pipeline.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use crate::panorama::common::error::{CaptureError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureState {
    Idle,
    Capturing,
    Completed,
    Failed,
}

#[derive(Debug)]
pub struct CaptureStatus {
    state: Mutex<CaptureState>,
}

impl CaptureStatus {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(CaptureState::Idle),
        }
    }

    pub fn current(&self) -> CaptureState {
        *self.state.lock()
    }

    /// Moves to `Capturing`. The ticket marks the capture `Failed` if it is
    /// dropped without [`CaptureTicket::complete`].
    pub fn begin(self: &Arc<Self>) -> Result<CaptureTicket> {
        let mut state = self.state.lock();
        if *state == CaptureState::Capturing {
            return Err(CaptureError::Busy);
        }
        debug!(from = ?*state, "Capture started");
        *state = CaptureState::Capturing;
        Ok(CaptureTicket {
            status: Arc::clone(self),
            finished: false,
        })
    }

    pub fn reset(&self) {
        *self.state.lock() = CaptureState::Idle;
    }

    fn finish(&self, ok: bool) {
        let mut state = self.state.lock();
        if *state == CaptureState::Capturing {
            *state = if ok {
                CaptureState::Completed
            } else {
                CaptureState::Failed
            };
            debug!(to = ?*state, "Capture finished");
        }
    }
}

impl Default for CaptureStatus {
    fn default() -> Self {
        Self::new()
    }
}

/// Proof that a capture is in flight.
#[derive(Debug)]
pub struct CaptureTicket {
    status: Arc<CaptureStatus>,
    finished: bool,
}

impl CaptureTicket {
    pub fn complete(mut self, ok: bool) {
        self.finished = true;
        self.status.finish(ok);
    }
}

impl Drop for CaptureTicket {
    fn drop(&mut self) {
        if !self.finished {
            self.status.finish(false);
        }
    }
}
